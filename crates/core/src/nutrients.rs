//! Nutrient table derivation for the product detail view
//!
//! The raw `nutriments` object carries dozens of keys. The detail view only
//! shows seven of them, each as a magnitude with a unit. Values that are absent
//! or not numeric are modelled as [`NutrientValue::Unknown`] instead of being
//! coerced into a placeholder.

use serde::{Deserialize, Deserializer, Serialize};

/// The subset of the `nutriments` object used by the detail view
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Nutriments {
    #[serde(default, deserialize_with = "lenient_number")]
    pub energy_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub proteins_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub salt_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sodium_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sugars_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbohydrates_value: Option<f64>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kJ")]
    Kilojoule,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilojoule => "kJ",
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(tag = "kind", content = "amount", rename_all = "lowercase")]
pub enum NutrientValue {
    Known(f64),
    Unknown,
}

/// One row of the nutrient table
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NutrientRow {
    pub label: &'static str,
    pub value: NutrientValue,
    pub unit: Unit,
}

impl NutrientRow {
    /// Rows whose value is zero are hidden. Unknown values stay visible.
    pub fn is_visible(&self) -> bool {
        !matches!(self.value, NutrientValue::Known(v) if v == 0.0)
    }

    /// Rendered value, e.g. `30.9g`, `2252kJ` or `unknown`
    pub fn display_value(&self) -> String {
        match self.value {
            NutrientValue::Known(v) => format!("{}{}", v, self.unit.suffix()),
            NutrientValue::Unknown => "unknown".to_string(),
        }
    }
}

// The API occasionally serialises magnitudes as strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn row(label: &'static str, value: Option<f64>, unit: Unit) -> NutrientRow {
    NutrientRow {
        label,
        value: value.map_or(NutrientValue::Unknown, NutrientValue::Known),
        unit,
    }
}

/// All seven nutrient rows, in display order
pub fn nutrient_rows(nutriments: &Nutriments) -> Vec<NutrientRow> {
    vec![
        row("Carbohydrates", nutriments.carbohydrates_value, Unit::Gram),
        row("Energy", nutriments.energy_value, Unit::Kilojoule),
        row("Fat", nutriments.fat_value, Unit::Gram),
        row("Protein", nutriments.proteins_value, Unit::Gram),
        row("Salt", nutriments.salt_value, Unit::Gram),
        row("Sodium", nutriments.sodium_value, Unit::Gram),
        row("Sugar", nutriments.sugars_value, Unit::Gram),
    ]
}

/// Rows that the detail view renders
pub fn visible_rows(nutriments: &Nutriments) -> Vec<NutrientRow> {
    nutrient_rows(nutriments)
        .into_iter()
        .filter(NutrientRow::is_visible)
        .collect()
}
