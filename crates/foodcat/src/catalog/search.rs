use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use foodcat_core::session::{list_output, Event, ListOutput, LoadState, SortKey};
use indicatif::{ProgressBar, ProgressStyle};

use super::controller::Controller;
use super::{paint_grade, CatalogApi, HttpCatalog};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct SearchOptions {
    /// Product name to search for (empty matches every product)
    #[arg(value_name = "TERM", default_value = "")]
    pub term: String,

    /// Category id to filter by (e.g., "en:dairies"); "all" disables the filter
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Number of pages to accumulate, 24 products each
    #[arg(short, long, env = "FOODCAT_PAGES", default_value = "1")]
    pub pages: usize,

    /// Sort order: none, name_asc, name_desc, grade_asc, grade_desc
    #[arg(short, long, default_value = "none")]
    #[serde(skip, default)]
    pub sort: SortKey,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: SearchOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!(
            "Searching for '{}' in category '{}'...",
            options.term, options.category
        );
    }

    let api = HttpCatalog::from_global(&global)?;

    let spinner = (!options.json).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner.set_message("Fetching products...");
        spinner
    });

    let result = search_data(
        api,
        options.term.clone(),
        options.category.clone(),
        options.pages,
        options.sort,
    )
    .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let output = result?;

    if options.json {
        println!("{}", format_list_json(&output)?);
    } else {
        print!("{}", format_list_text(&output));
    }

    Ok(())
}

/// Runs a search session to completion and returns the list view
///
/// Submits the term and category, loads more until `pages` pages are
/// accumulated or the catalog runs out, then applies the sort.
pub async fn search_data<C: CatalogApi>(
    api: C,
    term: String,
    category: String,
    pages: usize,
    sort: SortKey,
) -> Result<ListOutput> {
    let mut controller = Controller::new(api);

    controller
        .dispatch_all(vec![
            Event::NameSearchSubmitted(term),
            Event::CategoryChanged(category),
        ])
        .await;

    while controller.session().page < pages.max(1) && controller.session().can_load_more() {
        controller.dispatch(Event::LoadMore).await;

        if let Some(error) = &controller.session().error {
            return Err(eyre!("Failed to load page {}: {}", controller.session().page + 1, error));
        }
    }

    controller.dispatch(Event::SortChanged(sort)).await;

    let session = controller.session();
    if let LoadState::Failed(message) = &session.load {
        return Err(eyre!("Search failed: {}", message));
    }

    Ok(list_output(session))
}

/// Convert list output to JSON string
pub fn format_list_json(output: &ListOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

/// Convert list output to formatted text with colors
pub fn format_list_text(output: &ListOutput) -> String {
    let mut result = String::new();

    let category = if output.category.is_empty() {
        "all categories".to_string()
    } else {
        output.category.clone()
    };
    let query = if output.query.is_empty() {
        "everything".to_string()
    } else {
        f!("'{}'", output.query)
    };

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!(
        "{}\n",
        f!(
            "FOOD PRODUCTS: {} in {} ({} shown, {} page(s), sorted: {})",
            query,
            category,
            output.products.len(),
            output.page,
            output.sort.label()
        )
        .bright_cyan()
        .bold()
    ));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    if output.products.is_empty() {
        result.push_str(&f!("\n{}\n", "No products found.".yellow()));
    }

    for (idx, card) in output.products.iter().enumerate() {
        result.push_str(&f!(
            "\n{} {} {}\n",
            f!("[{}]", idx + 1).yellow().bold(),
            card.name.white().bold(),
            paint_grade(&card.grade, card.grade_color)
        ));

        if let Some(code) = &card.code {
            result.push_str(&f!("    {}: {}\n", "Barcode".green(), code.bright_white()));
        }
        if !card.categories.is_empty() {
            result.push_str(&f!(
                "    {}: {}\n",
                "Category".green(),
                card.categories.join(", ")
            ));
        }
        if !card.ingredients.is_empty() {
            result.push_str(&f!(
                "    {}: {}\n",
                "Ingredients".green(),
                card.ingredients.join(", ").bright_black()
            ));
        }
        result.push_str(&f!("    {}: {}\n", "Image".green(), card.image_url.cyan()));
    }

    if let Some(error) = &output.error {
        result.push_str(&f!("\n{}: {}\n", "Error".red().bold(), error));
    }

    result.push_str(&f!("\n{}:\n", "To navigate".bright_white().bold()));
    if output.has_more {
        let mut command = f!(
            "foodcat search {} --pages {}",
            shell_arg(&output.query),
            output.page + 1
        );
        if !output.category.is_empty() {
            command.push_str(&f!(" --category {}", shell_arg(&output.category)));
        }
        result.push_str(&f!("  {}: {}\n", "Load more".green(), command.cyan()));
    }
    result.push_str(&f!(
        "  {}: {}\n",
        "Product detail".green(),
        "foodcat product <barcode>".cyan()
    ));
    result.push_str(&f!(
        "  {}: {}\n",
        "Categories".green(),
        "foodcat categories --filter <text>".cyan()
    ));

    result.push('\n');
    result
}

/// Quote a value so the printed command can be pasted into a shell
fn shell_arg(value: &str) -> String {
    shlex::try_quote(&value.replace('\0', ""))
        .map(|quoted| quoted.into_owned())
        .unwrap_or_default()
}
