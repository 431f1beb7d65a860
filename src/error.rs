//! Error types for the Pipedrive MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Main error type for the Pipedrive MCP Server
#[derive(Error, Debug)]
pub enum PipedriveMcpError {
    /// Pipedrive API errors
    #[error("Pipedrive API error: {0}")]
    Api(#[from] PipedriveApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Feature registry errors
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error returned by the Pipedrive API, or by the transport while talking to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipedriveApiError {
    pub message: String,
    pub status_code: Option<u16>,
    pub error_info: Option<String>,
    /// Raw response body of the failed call, when one was received
    pub response_data: Option<Value>,
}

impl PipedriveApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            error_info: None,
            response_data: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_info(mut self, error_info: impl Into<String>) -> Self {
        let info = error_info.into();
        if !info.is_empty() {
            self.error_info = Some(info);
        }
        self
    }

    pub fn with_response_data(mut self, response_data: Value) -> Self {
        self.response_data = Some(response_data);
        self
    }
}

impl fmt::Display for PipedriveApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        let mut details = Vec::new();
        if let Some(status) = self.status_code {
            details.push(format!("Status: {}", status));
        }
        if let Some(info) = &self.error_info {
            details.push(format!("Info: {}", info));
        }
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for PipedriveApiError {}

impl From<reqwest::Error> for PipedriveApiError {
    fn from(err: reqwest::Error) -> Self {
        let api_err = PipedriveApiError::new(format!("Request failed: {}", err));
        match err.status() {
            Some(status) => api_err.with_status(status.as_u16()),
            None => api_err,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },

    #[error("Failed to create config directory: {path}")]
    DirCreationFailed { path: String },

    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors raised while converting tool input into entities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a numeric string representing a positive integer, got '{value}'")]
    InvalidId { field: String, value: String },

    #[error("{field} must be a valid number, got '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("{field} must be a valid UUID string (e.g. 123e4567-e89b-12d3-a456-426614174000), got '{value}'")]
    InvalidUuid { field: String, value: String },

    #[error("{field} must be a valid date in YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("{field} must be a valid time in HH:MM:SS format, got '{value}'")]
    InvalidTime { field: String, value: String },

    #[error("{field} is required and cannot be empty")]
    MissingField { field: String },

    #[error("Invalid {field}: '{value}'. Must be one of: {allowed}")]
    InvalidChoice {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },

    /// Entity rule violated after the individual fields were accepted
    #[error("{0}")]
    Constraint(String),
}

impl ValidationError {
    pub fn choice(field: &str, value: &str, allowed: &[&str]) -> Self {
        ValidationError::InvalidChoice {
            field: field.to_string(),
            value: value.to_string(),
            allowed: allowed.join(", "),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        ValidationError::Constraint(message.into())
    }
}

/// Feature registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Feature {feature} is not registered")]
    NotRegistered { feature: String },

    #[error("This tool is not available because the '{feature}' feature is disabled. Please contact your administrator.")]
    Disabled { feature: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Result type alias for Pipedrive MCP operations
pub type Result<T> = std::result::Result<T, PipedriveMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::InvalidId {
            field: "owner_id".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("owner_id must be a numeric string"));
    }

    #[test]
    fn test_error_conversion() {
        let err: PipedriveMcpError = ConfigError::MissingEnvVar {
            var: "PIPEDRIVE_API_TOKEN".to_string(),
        }
        .into();
        assert!(matches!(err, PipedriveMcpError::Config(_)));
        assert!(err.to_string().contains("PIPEDRIVE_API_TOKEN"));
    }

    #[test]
    fn test_api_error_display_includes_status_and_info() {
        let err = PipedriveApiError::new("Deal not found")
            .with_status(404)
            .with_info("Please check developers.pipedrive.com");
        assert_eq!(
            err.to_string(),
            "Deal not found (Status: 404, Info: Please check developers.pipedrive.com)"
        );
    }

    #[test]
    fn test_api_error_display_without_details() {
        let err = PipedriveApiError::new("Request failed: timeout").with_info("");
        assert_eq!(err.to_string(), "Request failed: timeout");
        assert!(err.error_info.is_none());
    }

    #[test]
    fn test_disabled_feature_message() {
        let err = FeatureError::Disabled {
            feature: "deals".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "This tool is not available because the 'deals' feature is disabled. Please contact your administrator."
        );
    }
}
