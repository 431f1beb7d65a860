//! Pipedrive entity models
//!
//! Each entity validates itself on construction (`validate`), renders the request
//! body the API expects (`to_api_payload`) and can be rebuilt leniently from an API
//! response (`from_api_value`).

pub mod activity;
pub mod activity_type;
pub mod deal;
pub mod deal_product;
pub mod lead;
pub mod lead_label;
pub mod organization;
pub mod person;
pub mod search_result;

pub use activity::{Activity, ActivityUpdate};
pub use activity_type::ActivityType;
pub use deal::{Deal, DealUpdate};
pub use deal_product::{DealProduct, DealProductUpdate};
pub use lead::{Lead, LeadUpdate};
pub use lead_label::LeadLabel;
pub use organization::{Organization, OrganizationFollower, OrganizationUpdate};
pub use person::{ContactInfo, Person, PersonUpdate};
pub use search_result::{FieldSearchResult, FieldSearchResults, ItemSearchResults, SearchItemType, SearchResult};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::pipedrive::DEFAULT_CURRENCY;
use crate::error::ValidationError;

/// Serialize a model into a JSON object, leaving out the given keys
pub(crate) fn payload_without<T: Serialize>(model: &T, excluded: &[&str]) -> Map<String, Value> {
    match serde_json::to_value(model) {
        Ok(Value::Object(mut map)) => {
            for key in excluded {
                map.remove(*key);
            }
            map
        }
        _ => Map::new(),
    }
}

/// Reject zero or negative identifiers
pub(crate) fn positive_id(value: Option<i64>, field: &str) -> Result<Option<i64>, ValidationError> {
    match value {
        Some(id) if id <= 0 => Err(ValidationError::constraint(format!(
            "{} must be a positive integer if provided",
            field
        ))),
        other => Ok(other),
    }
}

/// Trim a required text field, rejecting blank values
pub(crate) fn required_text(value: &str, message: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::constraint(message))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Normalize a three-letter currency code, defaulting to USD
pub(crate) fn currency_code(value: &str) -> Result<String, ValidationError> {
    let code = value.trim().to_uppercase();
    if code.is_empty() {
        return Ok(DEFAULT_CURRENCY.to_string());
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::constraint(format!(
            "Invalid currency code: {}. Must be a 3-letter code (e.g., USD, EUR).",
            code
        )));
    }
    Ok(code)
}

/// Reject negative amounts
pub(crate) fn non_negative(value: Option<f64>, message: &str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if v < 0.0 => Err(ValidationError::constraint(message)),
        other => Ok(other),
    }
}

// Lenient field readers used when rebuilding entities from API responses.

pub(crate) fn str_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer field; also unwraps `{"id": ..}` / `{"value": ..}` objects returned by v1 endpoints
pub(crate) fn i64_field(data: &Value, key: &str) -> Option<i64> {
    as_i64(data.get(key)?)
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get("id").or_else(|| obj.get("value")).and_then(as_i64),
        _ => None,
    }
}

pub(crate) fn f64_field(data: &Value, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn bool_field(data: &Value, key: &str) -> Option<bool> {
    match data.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// Date field; accepts plain dates and timestamps, ignoring anything else
pub(crate) fn date_field(data: &Value, key: &str) -> Option<NaiveDate> {
    let raw = data.get(key)?.as_str()?;
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
