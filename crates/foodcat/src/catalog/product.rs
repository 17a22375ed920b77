use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use foodcat_core::api::{extract_barcode, Lookup};
use foodcat_core::product::{build_product_view, ProductView};
use prettytable::row;

use super::{paint_grade, CatalogApi, HttpCatalog};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ProductOptions {
    /// Barcode or product page URL (e.g., "3017620422003" or "https://world.openfoodfacts.org/product/3017620422003")
    #[clap(env = "FOODCAT_BARCODE")]
    pub barcode: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ProductOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Looking up product: {}", options.barcode);
    }

    let api = HttpCatalog::from_global(&global)?;
    let view = product_data(&api, &options.barcode).await?;

    if options.json {
        println!("{}", format_product_json(&view)?);
    } else {
        print!("{}", format_product_text(&view));
    }

    Ok(())
}

/// Looks up a product and derives its detail view
///
/// Fails with [`Error::InvalidBarcode`] before any request is made when the
/// input is neither a barcode nor a product URL, and with [`Error::NotFound`]
/// when the catalog has no such product.
pub async fn product_data<C: CatalogApi>(api: &C, input: &str) -> Result<ProductView> {
    let barcode = extract_barcode(input).map_err(|e| Error::InvalidBarcode(e.to_string()))?;

    match api.lookup(&barcode).await? {
        Lookup::Found(detail) => Ok(build_product_view(&detail, &barcode)),
        Lookup::NotFound => Err(Error::NotFound(barcode).into()),
    }
}

pub fn format_product_json(view: &ProductView) -> Result<String> {
    serde_json::to_string_pretty(view).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

/// Convert a product view to formatted text with colors
pub fn format_product_text(view: &ProductView) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!(
        "{} {}\n",
        view.name
            .as_deref()
            .unwrap_or("(No name)")
            .bright_cyan()
            .bold(),
        paint_grade(&view.grade, view.grade_color)
    ));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    result.push_str(&f!("\n{}: {}\n", "Barcode".green(), view.code.bright_white()));
    result.push_str(&f!("{}: {}\n", "Image".green(), view.image_url.cyan()));
    if let Some(modified) = &view.last_modified {
        result.push_str(&f!("{}: {}\n", "Last modified".green(), modified.bright_black()));
    }
    if !view.labels.is_empty() {
        result.push_str(&f!(
            "{}: {}\n",
            "Labels".green(),
            view.labels
                .iter()
                .map(|l| f!("[{l}]"))
                .collect::<Vec<_>>()
                .join(" ")
                .magenta()
        ));
    }
    result.push_str(&f!(
        "{}: {}\n",
        "Categories".green(),
        view.categories.join(", ")
    ));

    result.push_str(&f!("\n{}\n", "INGREDIENTS".bright_yellow().bold()));
    if view.ingredients.is_empty() {
        result.push_str(&f!("{}\n", "No ingredients listed.".yellow()));
    } else {
        result.push_str(&f!("{}\n", view.ingredients.join(", ")));
    }

    result.push_str(&f!(
        "\n{}\n",
        "NUTRITIONAL VALUES (per 100g)".bright_yellow().bold()
    ));
    let mut table = new_table();
    table.set_titles(row!["Nutrient", "Value"]);
    for nutrient in &view.nutrients {
        table.add_row(row![nutrient.label, nutrient.display_value()]);
    }
    result.push_str(&table.to_string());

    result.push_str(&f!("\n{}:\n", "To go back".bright_white().bold()));
    result.push_str(&f!("  {}\n", "foodcat search <term>".cyan()));

    result.push('\n');
    result
}
