use crate::catalog::{categories_data, product_data, search_data, HttpCatalog};
use crate::prelude::{eprintln, *};
use foodcat_core::api::extract_barcode;
use foodcat_core::session::SortKey;
use serde::Deserialize;

use super::{text_result, JsonRpcError};

fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments.unwrap_or(serde_json::json!({})))
        .map_err(|e| JsonRpcError::invalid_params(f!("Invalid arguments: {e}")))
}

fn catalog(global: &crate::Global) -> Result<HttpCatalog, JsonRpcError> {
    HttpCatalog::from_global(global).map_err(|e| JsonRpcError::internal(f!("{e}")))
}

fn tool_error(e: color_eyre::eyre::Report) -> JsonRpcError {
    match e.downcast_ref::<Error>() {
        Some(Error::InvalidBarcode(_)) => JsonRpcError::invalid_params(e.to_string()),
        _ => JsonRpcError::internal(f!("Tool execution error: {e}")),
    }
}

pub async fn handle_catalog_search(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct CatalogSearchArgs {
        term: Option<String>,
        category: Option<String>,
        pages: Option<usize>,
        sort: Option<String>,
    }

    let args: CatalogSearchArgs = parse_arguments(arguments)?;

    let sort = match args.sort.as_deref() {
        Some(sort) => sort.parse::<SortKey>().map_err(JsonRpcError::invalid_params)?,
        None => SortKey::None,
    };

    if global.verbose {
        eprintln!(
            "Calling catalog_search: term={:?}, category={:?}, pages={:?}, sort={}",
            args.term, args.category, args.pages, sort
        );
    }

    let list = search_data(
        catalog(global)?,
        args.term.unwrap_or_default(),
        args.category.unwrap_or_default(),
        args.pages.unwrap_or(1),
        sort,
    )
    .await
    .map_err(tool_error)?;

    text_result(&list)
}

pub async fn handle_catalog_product(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct CatalogProductArgs {
        barcode: String,
    }

    let args: CatalogProductArgs = parse_arguments(arguments)?;
    let barcode = extract_barcode(&args.barcode)
        .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

    if global.verbose {
        eprintln!("Calling catalog_product: barcode={barcode}");
    }

    let view = product_data(&catalog(global)?, &barcode)
        .await
        .map_err(tool_error)?;

    text_result(&view)
}

pub async fn handle_catalog_categories(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct CatalogCategoriesArgs {
        filter: Option<String>,
        limit: Option<usize>,
    }

    let args: CatalogCategoriesArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling catalog_categories: filter={:?}, limit={:?}",
            args.filter, args.limit
        );
    }

    let output = categories_data(
        &catalog(global)?,
        args.filter.as_deref(),
        Some(args.limit.unwrap_or(50)),
    )
    .await
    .map_err(tool_error)?;

    text_result(&output)
}
