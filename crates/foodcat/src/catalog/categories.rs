use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use foodcat_core::product::{filter_categories, Category};
use prettytable::row;
use serde::Serialize;

use super::{CatalogApi, HttpCatalog};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct CategoriesOptions {
    /// Only show categories whose name or id contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Maximum number of categories to show
    #[arg(short, long, env = "FOODCAT_CATEGORY_LIMIT", default_value = "50")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Category listing output
#[derive(Debug, Serialize, Clone)]
pub struct CategoriesOutput {
    pub total: usize,
    pub shown: usize,
    pub categories: Vec<Category>,
}

pub async fn run(options: CategoriesOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Fetching category taxonomy...");
    }

    let api = HttpCatalog::from_global(&global)?;
    let output = categories_data(&api, options.filter.as_deref(), Some(options.limit)).await?;

    if options.json {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{}", json);
    } else {
        print!("{}", format_categories_text(&output));
    }

    Ok(())
}

/// Fetches the sorted taxonomy and applies the filter and limit
pub async fn categories_data<C: CatalogApi>(
    api: &C,
    filter: Option<&str>,
    limit: Option<usize>,
) -> Result<CategoriesOutput> {
    let categories = api.categories().await?;
    let matching = filter_categories(&categories, filter, limit);

    Ok(CategoriesOutput {
        total: categories.len(),
        shown: matching.len(),
        categories: matching,
    })
}

pub fn format_categories_text(output: &CategoriesOutput) -> String {
    if output.categories.is_empty() {
        return f!("\n{}\n\n", "No categories found.".yellow());
    }

    let mut table = new_table();
    table.set_titles(row!["Id".bold().cyan(), "Name".bold().cyan()]);
    for category in &output.categories {
        table.add_row(row![category.id.bright_black(), category.name.bright_white()]);
    }

    f!(
        "\nShowing {} of {} categories:\n\n{}\n{}: {}\n\n",
        output.shown.to_string().bold(),
        output.total,
        table,
        "Filter products".green(),
        "foodcat search <term> --category <id>".cyan()
    )
}
