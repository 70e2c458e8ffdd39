//! Tool boundary: `{ query }` in, `{ response, data }` out.

use std::sync::Arc;

use lnquery_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::handler::{ChannelQueryHandler, QueryResult};

/// Name the tool is registered under.
pub const TOOL_NAME: &str = "query_channels";

/// Machine-readable description of the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the input.
    pub input_schema: serde_json::Value,
    /// JSON Schema of the output.
    pub output_schema: serde_json::Value,
}

/// Tool input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolInput {
    /// Free-text question.
    pub query: String,
}

/// Tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Human-readable answer.
    pub response: String,
    /// Structured data; `{}` when the answer carries none.
    pub data: serde_json::Value,
}

impl From<QueryResult> for ToolOutput {
    fn from(result: QueryResult) -> Self {
        let data = match (result.data, result.error) {
            (Some(data), _) => data,
            (None, Some(error)) => json!({ "error": error }),
            (None, None) => json!({}),
        };
        Self {
            response: result.response,
            data,
        }
    }
}

/// Exposes a [`ChannelQueryHandler`] as a single callable tool.
#[derive(Clone)]
pub struct ChannelQueryTool {
    handler: Arc<ChannelQueryHandler>,
}

impl ChannelQueryTool {
    /// Wrap a handler.
    pub const fn new(handler: Arc<ChannelQueryHandler>) -> Self {
        Self { handler }
    }

    /// Describe the tool and its schemas.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: "Answer natural-language questions about the Lightning node's \
                          channels: listing, health and liquidity."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Question about the node's channels, e.g. \"how healthy are my channels\""
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "response": {
                        "type": "string",
                        "description": "Natural-language answer"
                    },
                    "data": {
                        "type": "object",
                        "description": "Structured channel data behind the answer"
                    }
                },
                "required": ["response", "data"]
            }),
        }
    }

    /// Validate `input` against the input schema and answer it.
    pub async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let input = parse_input(input)?;
        Ok(self.handler.handle_query(&input.query).await.into())
    }
}

fn parse_input(input: serde_json::Value) -> Result<ToolInput> {
    serde_json::from_value(input).map_err(|e| Error::InvalidInput(e.to_string()))
}
