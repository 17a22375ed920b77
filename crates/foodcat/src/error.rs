#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidBarcode(String),
}
