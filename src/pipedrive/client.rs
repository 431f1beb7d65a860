//! Pipedrive API client
//!
//! Transport seam ([`PipedriveApi`]) plus the reqwest-backed implementation
//! talking to `https://<domain>.pipedrive.com/api/<version>`.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{PipedriveApiError, Result};

/// Result of a call against the Pipedrive API
pub type ApiResult<T> = std::result::Result<T, PipedriveApiError>;

/// Pipedrive REST API version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => f.write_str("v1"),
            ApiVersion::V2 => f.write_str("v2"),
        }
    }
}

/// A single request against the API, independent of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub version: ApiVersion,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, version: ApiVersion, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            version,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(version: ApiVersion, endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, version, endpoint)
    }

    pub fn post(version: ApiVersion, endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, version, endpoint)
    }

    pub fn patch(version: ApiVersion, endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, version, endpoint)
    }

    pub fn delete(version: ApiVersion, endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, version, endpoint)
    }

    /// Add a query parameter; `None` values are dropped
    pub fn query<T: ToString>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Add a comma-joined list parameter; empty lists are dropped
    pub fn query_list(self, key: &str, values: Option<&[String]>) -> Self {
        let joined = values.filter(|v| !v.is_empty()).map(|v| v.join(","));
        self.query(key, joined)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport used by every entity client
#[async_trait]
pub trait PipedriveApi: Send + Sync {
    /// Perform the request and return the full response body
    ///
    /// Implementations must turn `success: false` bodies and HTTP error statuses
    /// into [`PipedriveApiError`].
    async fn request(&self, request: ApiRequest) -> ApiResult<Value>;
}

/// A page of list or search results
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl Page {
    /// Read `data` (array) and `additional_data.next_cursor` from a response body
    pub fn from_response(response: &Value) -> Self {
        let items = match response.get("data") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(obj)) => obj
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let next_cursor = response
            .get("additional_data")
            .and_then(|extra| extra.get("next_cursor"))
            .and_then(Value::as_str)
            .map(String::from);

        Self { items, next_cursor }
    }
}

/// `data` of a response body, or `null` when absent
pub fn response_data(response: Value) -> Value {
    match response {
        Value::Object(mut obj) => obj.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// HTTP client for the Pipedrive REST API
pub struct PipedriveClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// `https://<domain>.pipedrive.com/api`
    api_root: String,

    api_token: String,
}

impl PipedriveClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        if !config.verify_ssl {
            warn!("TLS certificate verification is disabled");
        }

        Ok(Self {
            http_client,
            api_root: config.api_root(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, version: ApiVersion, endpoint: &str) -> String {
        format!("{}/{}{}", self.api_root, version, endpoint)
    }
}

#[async_trait]
impl PipedriveApi for PipedriveClient {
    async fn request(&self, request: ApiRequest) -> ApiResult<Value> {
        let url = self.url(request.version, &request.endpoint);
        debug!(method = %request.method, url = %url, "Pipedrive request");

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .query(&[("api_token", self.api_token.as_str())])
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            error!("Request to Pipedrive failed: {}", err);
            PipedriveApiError::from(err)
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), "Pipedrive response");

        if !status.is_success() {
            return Err(http_status_error(status.as_u16(), &text));
        }

        let body = if text.trim().is_empty() {
            json!({ "success": true, "data": Value::Null })
        } else {
            serde_json::from_str::<Value>(&text).map_err(|err| {
                PipedriveApiError::new(format!("Invalid JSON in Pipedrive response: {}", err))
                    .with_status(status.as_u16())
                    .with_response_data(json!({ "raw_error": text }))
            })?
        };

        check_success(body, status.as_u16())
    }
}

/// Map a body with `success: false` into an error
fn check_success(body: Value, status: u16) -> ApiResult<Value> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Pipedrive API error")
        .to_string();
    let info = body
        .get("error_info")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    warn!("Pipedrive API call not successful: {}", message);

    Err(PipedriveApiError::new(message)
        .with_status(status)
        .with_info(info)
        .with_response_data(body))
}

fn http_status_error(status: u16, text: &str) -> PipedriveApiError {
    let (message, info, data) = match serde_json::from_str::<Value>(text) {
        Ok(body) => {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| format!("status {}", status));
            let info = body
                .get("error_info")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (message, info, body)
        }
        Err(_) => (
            format!("status {}", status),
            "Response body was not valid JSON.".to_string(),
            json!({ "raw_error": text }),
        ),
    };

    error!("HTTP error from Pipedrive: {} - {}", status, message);
    PipedriveApiError::new(format!("HTTP error {}: {}", status, message))
        .with_status(status)
        .with_info(info)
        .with_response_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_drops_none() {
        let request = ApiRequest::get(ApiVersion::V2, "/deals")
            .query("limit", Some(100))
            .query::<String>("cursor", None)
            .query_list("include_fields", Some(&["a".to_string(), "b".to_string()]))
            .query_list("custom_fields", Some(&[]));

        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query_value("limit"), Some("100"));
        assert_eq!(request.query_value("include_fields"), Some("a,b"));
        assert_eq!(request.query_value("cursor"), None);
    }

    #[test]
    fn test_page_from_response() {
        let page = Page::from_response(&json!({
            "success": true,
            "data": [{"id": 1}, {"id": 2}],
            "additional_data": {"next_cursor": "xyz"}
        }));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("xyz"));

        let search = Page::from_response(&json!({"success": true, "data": {"items": [{"item": {"id": 1}}]}}));
        assert_eq!(search.items.len(), 1);
        assert_eq!(search.next_cursor, None);
    }

    #[test]
    fn test_check_success() {
        assert!(check_success(json!({"success": true, "data": {}}), 200).is_ok());

        let err = check_success(
            json!({"success": false, "error": "Deal not found", "error_info": "See docs"}),
            200,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Deal not found (Status: 200, Info: See docs)");
        assert!(err.response_data.is_some());
    }

    #[test]
    fn test_http_status_error() {
        let err = http_status_error(404, r#"{"success": false, "error": "Not found"}"#);
        assert_eq!(err.message, "HTTP error 404: Not found");
        assert_eq!(err.status_code, Some(404));

        let err = http_status_error(502, "<html>Bad gateway</html>");
        assert_eq!(err.response_data, Some(json!({"raw_error": "<html>Bad gateway</html>"})));
        assert_eq!(err.error_info.as_deref(), Some("Response body was not valid JSON."));
    }

    #[test]
    fn test_url_building() {
        let config = Config {
            api_token: "token".into(),
            company_domain: "acme".into(),
            timeout: std::time::Duration::from_secs(5),
            verify_ssl: true,
            feature_config_path: "features.json".into(),
        };
        let client = PipedriveClient::new(&config).unwrap();
        assert_eq!(
            client.url(ApiVersion::V1, "/leads"),
            "https://acme.pipedrive.com/api/v1/leads"
        );
    }
}
