//! Request URLs and response shapes for the Open Food Facts API

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::product::{ProductDetail, ProductSummary};

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Number of products the search endpoint returns per page
pub const PAGE_SIZE: usize = 24;

/// Category selector value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

static BARCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid barcode pattern"));

static PRODUCT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/product/([0-9]+)(?:[/?#]|$)").expect("valid product url pattern")
});

/// `{ products: [...] }` from the search endpoint
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub products: Vec<ProductSummary>,
}

/// `{ status, product }` from the single-product endpoint
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LookupResponse {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub product: Option<ProductDetail>,
}

/// Result of looking up a single barcode
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Box<ProductDetail>),
    NotFound,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    #[error("Barcode is empty")]
    Empty,

    #[error("Invalid barcode '{0}': only digits are allowed")]
    InvalidCharacters(String),
}

/// Normalise the category selector value, mapping "all" to the empty filter
pub fn normalize_category(category: &str) -> &str {
    if category == ALL_CATEGORIES {
        ""
    } else {
        category
    }
}

/// Build the search URL for a page of results
pub fn search_url(base_url: &str, page: usize, term: &str, category: &str) -> String {
    format!(
        "{}/cgi/search.pl?action=process&json=true&page={}&page_size={}&search_terms={}&tagtype_0=categories&tag_contains_0=contains&tag_0={}",
        base_url.trim_end_matches('/'),
        page,
        PAGE_SIZE,
        urlencoding::encode(term),
        urlencoding::encode(normalize_category(category)),
    )
}

/// Build the single-product URL for a barcode
pub fn product_url(base_url: &str, barcode: &str) -> String {
    format!(
        "{}/api/v0/product/{}.json",
        base_url.trim_end_matches('/'),
        barcode
    )
}

/// Build the category taxonomy URL
pub fn categories_url(base_url: &str) -> String {
    format!("{}/categories.json", base_url.trim_end_matches('/'))
}

/// Detail-view path a barcode submission navigates to
pub fn detail_path(barcode: &str) -> String {
    format!("/product/{barcode}")
}

/// Validate a barcode before it is used to build a lookup path
///
/// The input is used verbatim. Only ASCII digits are accepted so the value
/// can never alter the request path.
pub fn validate_barcode(input: &str) -> Result<&str, BarcodeError> {
    if input.is_empty() {
        return Err(BarcodeError::Empty);
    }

    if !BARCODE_RE.is_match(input) {
        return Err(BarcodeError::InvalidCharacters(input.to_string()));
    }

    Ok(input)
}

/// Extract a barcode from either a bare code or a product page URL
pub fn extract_barcode(input: &str) -> Result<String, BarcodeError> {
    let trimmed = input.trim();

    if let Ok(code) = validate_barcode(trimmed) {
        return Ok(code.to_string());
    }

    if let Some(caps) = PRODUCT_URL_RE.captures(trimmed) {
        if let Some(code) = caps.get(1) {
            return Ok(code.as_str().to_string());
        }
    }

    validate_barcode(trimmed).map(str::to_string)
}

/// Interpret a lookup response
///
/// The v0 endpoint answers unknown barcodes with `status: 0` and no product.
pub fn interpret_lookup(response: LookupResponse) -> Lookup {
    match (response.status, response.product) {
        (Some(0), _) | (_, None) => Lookup::NotFound,
        (_, Some(product)) => Lookup::Found(Box::new(product)),
    }
}
