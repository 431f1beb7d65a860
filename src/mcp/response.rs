//! Tool response envelope
//!
//! Every tool answers with a single text item holding
//! `{"success": bool, "data": any|null, "error": string|null}`.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::error::{FeatureError, McpError, PipedriveApiError, ValidationError};
use crate::mcp::types::CallToolResult;

/// Failure of a tool invocation
#[derive(Error, Debug)]
pub enum ToolError {
    /// Input rejected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// The Pipedrive API reported a failure
    #[error("Pipedrive API error: {0}")]
    Api(PipedriveApiError),

    /// The tool's feature is switched off
    #[error("{0}")]
    Feature(FeatureError),

    /// Anything else; details are logged, never returned
    #[error("An unexpected error occurred")]
    Unexpected(String),
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        ToolError::Validation(err.to_string())
    }
}

impl From<PipedriveApiError> for ToolError {
    fn from(err: PipedriveApiError) -> Self {
        ToolError::Api(err)
    }
}

impl From<FeatureError> for ToolError {
    fn from(err: FeatureError) -> Self {
        ToolError::Feature(err)
    }
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        ToolError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Unexpected(err.to_string())
    }
}

/// Outcome of a tool handler
pub type ToolResult = std::result::Result<Value, ToolError>;

/// The `{success, data, error}` envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }

    /// Render as pretty JSON inside an MCP text result
    pub fn into_call_result(self) -> CallToolResult {
        let text = serde_json::to_string_pretty(&self).unwrap_or_else(|e| {
            error!("Failed to serialize tool response: {}", e);
            r#"{"success": false, "data": null, "error": "An unexpected error occurred"}"#.to_string()
        });

        let mut result = CallToolResult::text(text);
        result.is_error = !self.success;
        result
    }
}

impl From<ToolError> for ToolResponse {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Api(api_err) => {
                let data = api_err.response_data.clone();
                ToolResponse::failure(ToolError::Api(api_err).to_string(), data)
            }
            ToolError::Unexpected(details) => {
                error!("Unexpected tool error: {}", details);
                ToolResponse::failure("An unexpected error occurred", None)
            }
            other => ToolResponse::failure(other.to_string(), None),
        }
    }
}

impl From<ToolResult> for ToolResponse {
    fn from(result: ToolResult) -> Self {
        match result {
            Ok(data) => ToolResponse::success(data),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(result: CallToolResult) -> Value {
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let result = ToolResponse::from(Ok(json!({"id": 5}))).into_call_result();
        assert!(!result.is_error);
        assert_eq!(envelope(result), json!({"success": true, "data": {"id": 5}, "error": null}));
    }

    #[test]
    fn test_validation_envelope() {
        let err: ToolError = ValidationError::constraint("Deal title cannot be empty").into();
        let result = ToolResponse::from(err).into_call_result();
        assert!(result.is_error);
        assert_eq!(
            envelope(result),
            json!({"success": false, "data": null, "error": "Validation error: Deal title cannot be empty"})
        );
    }

    #[test]
    fn test_api_envelope_carries_response_data() {
        let api_err = PipedriveApiError::new("Not found")
            .with_status(404)
            .with_response_data(json!({"success": false, "error": "Not found"}));
        let value = envelope(ToolResponse::from(ToolError::Api(api_err)).into_call_result());

        assert_eq!(value["error"], "Pipedrive API error: Not found (Status: 404)");
        assert_eq!(value["data"]["error"], "Not found");
    }

    #[test]
    fn test_unexpected_hides_details() {
        let value = envelope(ToolResponse::from(ToolError::Unexpected("secret detail".into())).into_call_result());
        assert_eq!(value["error"], "An unexpected error occurred");
    }

    #[test]
    fn test_invalid_arguments_are_validation_errors() {
        let err: ToolError = McpError::InvalidArguments { message: "missing field `subject`".into() }.into();
        assert_eq!(err.to_string(), "Validation error: Invalid tool arguments: missing field `subject`");
    }
}
