mod catalog;

use serde::{Deserialize, Serialize};

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, Tool};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Serialize a tool payload as pretty JSON text content
pub fn text_result<T: Serialize>(payload: &T) -> Result<serde_json::Value, JsonRpcError> {
    let text = serde_json::to_string_pretty(payload)
        .map_err(|e| JsonRpcError::internal(format!("Serialization error: {e}")))?;

    let result = CallToolResult {
        content: vec![Content::Text { text }],
        is_error: None,
    };

    serde_json::to_value(result).map_err(|e| JsonRpcError::internal(format!("Internal error: {e}")))
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "foodcat".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(|e| JsonRpcError::internal(format!("Internal error: {e}")))
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let tools = vec![
        Tool {
            name: "catalog_search".to_string(),
            description: "Search the Open Food Facts product catalog by name and category. Returns product cards (name, barcode, English categories and ingredients, nutrition grade) for the accumulated pages, 24 products per page, plus whether more pages exist.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "term": {
                        "type": "string",
                        "description": "Product name to search for (default: empty, matches everything)"
                    },
                    "category": {
                        "type": "string",
                        "description": "Category id to filter by, e.g. 'en:dairies'. Use catalog_categories to discover ids. 'all' or empty disables the filter."
                    },
                    "pages": {
                        "type": "number",
                        "description": "Number of pages to accumulate (default: 1)"
                    },
                    "sort": {
                        "type": "string",
                        "description": "Sort order applied to the accumulated products (default: none)",
                        "enum": ["none", "name_asc", "name_desc", "grade_asc", "grade_desc"]
                    }
                },
                "required": []
            }),
        },
        Tool {
            name: "catalog_product".to_string(),
            description: "Read a single product by barcode (e.g., '3017620422003') or product page URL. Returns labels, categories, ingredients, nutrition grade and the per-100g nutrient table. Unknown nutrient values are reported as unknown and zero values are omitted.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "barcode": {
                        "type": "string",
                        "description": "Product barcode (digits only) or product page URL"
                    }
                },
                "required": ["barcode"]
            }),
        },
        Tool {
            name: "catalog_categories".to_string(),
            description: "List product categories from the catalog taxonomy, sorted by name. Supports a case-insensitive filter on the name or id.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Only return categories whose name or id contains this text"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of categories to return (default: 50)"
                    }
                },
                "required": []
            }),
        },
    ];

    let result = ToolsList { tools };

    serde_json::to_value(result).map_err(|e| JsonRpcError::internal(format!("Internal error: {e}")))
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

    match params.name.as_str() {
        "catalog_search" => catalog::handle_catalog_search(params.arguments, global).await,
        "catalog_product" => catalog::handle_catalog_product(params.arguments, global).await,
        "catalog_categories" => catalog::handle_catalog_categories(params.arguments, global).await,
        _ => Err(JsonRpcError::invalid_params(format!(
            "Unknown tool: {}",
            params.name
        ))),
    }
}
