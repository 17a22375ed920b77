use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Only tags in this namespace are shown to the user.
pub const ENGLISH_PREFIX: &str = "en:";

/// Image shown when a product carries no image URL
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-image.jpg";

/// Product summary as returned by the search endpoint
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProductSummary {
    #[serde(rename = "product_name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ingredients_tags: Vec<String>,
    #[serde(rename = "nutrition_grades", default)]
    pub nutrition_grade: Option<String>,
    #[serde(default, deserialize_with = "code_as_string")]
    pub code: Option<String>,
}

/// Full product record as returned by the single-product endpoint
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels_tags: Vec<String>,
    #[serde(default)]
    pub nutriments: crate::nutrients::Nutriments,
    #[serde(default)]
    pub last_modified_t: Option<i64>,
}

/// Category from the taxonomy endpoint
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Display colour assigned to a nutrition grade
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GradeColor {
    Green,
    Lime,
    Yellow,
    Orange,
    Red,
}

/// Card shown in the list view for a single product
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductCard {
    pub code: Option<String>,
    pub name: String,
    pub image_url: String,
    pub categories: Vec<String>,
    pub ingredients: Vec<String>,
    pub grade: String,
    pub grade_color: GradeColor,
}

/// Detail view for a single product
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductView {
    pub code: String,
    pub name: Option<String>,
    pub image_url: String,
    pub labels: Vec<String>,
    pub categories: Vec<String>,
    pub ingredients: Vec<String>,
    pub grade: String,
    pub grade_color: GradeColor,
    pub last_modified: Option<String>,
    pub nutrients: Vec<crate::nutrients::NutrientRow>,
}

// Search results sometimes carry `null` where a list is expected.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(text) => text,
        Code::Number(number) => number.to_string(),
    }))
}

/// Keep the English tags and strip their `en:` prefix
///
/// Tags from any other namespace are dropped. The prefix is removed once, so
/// `en:en:foo` becomes `en:foo`.
pub fn english_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| tag.strip_prefix(ENGLISH_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Map a nutrition grade to its display colour
///
/// Total over `a` through `e` (case-insensitive). Anything else falls back to red.
pub fn grade_color(grade: Option<&str>) -> GradeColor {
    match grade.map(|g| g.trim().to_ascii_lowercase()).as_deref() {
        Some("a") => GradeColor::Green,
        Some("b") => GradeColor::Lime,
        Some("c") => GradeColor::Yellow,
        Some("d") => GradeColor::Orange,
        _ => GradeColor::Red,
    }
}

/// Uppercase grade letter, or `?` when the product has none
pub fn display_grade(grade: Option<&str>) -> String {
    match grade.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_uppercase(),
        _ => "?".to_string(),
    }
}

/// A product without a name is an incomplete record and is never rendered
pub fn is_displayable(product: &ProductSummary) -> bool {
    product
        .name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty())
}

/// Convert Unix timestamp to formatted string
pub fn format_timestamp(timestamp: Option<i64>) -> Option<String> {
    timestamp.and_then(|ts| {
        let dt = DateTime::<Utc>::from_timestamp(ts, 0)?;
        Some(dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    })
}

fn image_or_placeholder(image_url: Option<&str>) -> String {
    match image_url {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Build the list-view card for a product, `None` when it should not be rendered
pub fn product_card(product: &ProductSummary) -> Option<ProductCard> {
    if !is_displayable(product) {
        return None;
    }

    Some(ProductCard {
        code: product.code.clone(),
        name: product.name.clone().unwrap_or_default(),
        image_url: image_or_placeholder(product.image_url.as_deref()),
        categories: english_tags(&product.categories_tags),
        ingredients: english_tags(&product.ingredients_tags),
        grade: display_grade(product.nutrition_grade.as_deref()),
        grade_color: grade_color(product.nutrition_grade.as_deref()),
    })
}

/// Transform products into list-view cards, skipping nameless records
pub fn transform_products(products: &[ProductSummary]) -> Vec<ProductCard> {
    products.iter().filter_map(product_card).collect()
}

/// Build the detail view for a looked-up product
///
/// `barcode` is the code the lookup was made with; it is used when the record
/// itself does not echo a code back.
pub fn build_product_view(detail: &ProductDetail, barcode: &str) -> ProductView {
    let summary = &detail.summary;

    ProductView {
        code: summary.code.clone().unwrap_or_else(|| barcode.to_string()),
        name: summary.name.clone(),
        image_url: image_or_placeholder(summary.image_url.as_deref()),
        labels: english_tags(&detail.labels_tags),
        categories: english_tags(&summary.categories_tags),
        ingredients: english_tags(&summary.ingredients_tags),
        grade: display_grade(summary.nutrition_grade.as_deref()),
        grade_color: grade_color(summary.nutrition_grade.as_deref()),
        last_modified: format_timestamp(detail.last_modified_t),
        nutrients: crate::nutrients::visible_rows(&detail.nutriments),
    }
}

/// Sort categories alphabetically by display name
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Parse the taxonomy response into a sorted category list
///
/// A response without a `tags` array degrades to an empty list, and entries
/// missing an `id` or `name` are skipped.
pub fn parse_categories(value: &serde_json::Value) -> Vec<Category> {
    let Some(tags) = value.get("tags").and_then(|t| t.as_array()) else {
        return Vec::new();
    };

    let mut categories: Vec<Category> = tags
        .iter()
        .filter_map(|tag| serde_json::from_value(tag.clone()).ok())
        .collect();

    sort_categories(&mut categories);
    categories
}

/// Case-insensitive substring filter over category names and ids
pub fn filter_categories(
    categories: &[Category],
    needle: Option<&str>,
    limit: Option<usize>,
) -> Vec<Category> {
    let needle = needle.map(|n| n.trim().to_lowercase()).unwrap_or_default();

    categories
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.id.to_lowercase().contains(&needle)
        })
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
