//! Activity type entity (v1 API)

use serde::Serialize;
use serde_json::{Map, Value};

use super::{bool_field, i64_field, payload_without, required_text, str_field};
use crate::error::ValidationError;

/// Icon keys accepted by Pipedrive for activity types
pub const ICON_KEYS: &[&str] = &[
    "task", "email", "meeting", "deadline", "call", "lunch", "calendar", "downarrow",
    "document", "smartphone", "camera", "scissors", "cogs", "bubble", "uparrow", "checkbox",
    "signpost", "shuffle", "addressbook", "linegraph", "picture", "car", "world", "search",
    "clip", "sound", "brush", "key", "padlock", "pricetag", "suitcase", "finish", "plane",
    "loop", "wifi", "truck", "cart", "bulb", "bell", "presentation",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub icon_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_nr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_flag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_custom_flag: Option<bool>,
}

impl ActivityType {
    pub fn new(name: impl Into<String>, icon_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon_key: icon_key.into(),
            ..Default::default()
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text(&self.name, "Activity type name cannot be empty")?;
        self.icon_key = validate_icon_key(&self.icon_key)?;
        self.color = validate_color(self.color.as_deref())?;
        if matches!(self.order_nr, Some(n) if n < 0) {
            return Err(ValidationError::constraint("order_nr must be a positive integer if provided"));
        }
        Ok(self)
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &["id", "key_string", "is_custom_flag", "active_flag"])
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: i64_field(data, "id"),
            name: str_field(data, "name").unwrap_or_default(),
            icon_key: str_field(data, "icon_key").unwrap_or_default(),
            color: str_field(data, "color"),
            order_nr: i64_field(data, "order_nr"),
            key_string: str_field(data, "key_string"),
            active_flag: bool_field(data, "active_flag").or(Some(true)),
            is_custom_flag: bool_field(data, "is_custom_flag"),
        }
    }
}

fn validate_icon_key(icon_key: &str) -> Result<String, ValidationError> {
    let key = required_text(icon_key, "Activity type icon_key cannot be empty")?;
    if ICON_KEYS.contains(&key.as_str()) {
        Ok(key)
    } else {
        Err(ValidationError::constraint(format!(
            "Invalid icon_key: {}. Must be one of the valid Pipedrive icon keys.",
            key
        )))
    }
}

fn validate_color(color: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = color.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let hex = raw.to_uppercase();
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Some(hex))
    } else {
        Err(ValidationError::constraint(format!(
            "Invalid color format: {}. Must be a 6-character HEX color (e.g., FFFFFF)",
            hex
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_activity_type() {
        let kind = ActivityType {
            color: Some("ff00aa".to_string()),
            order_nr: Some(2),
            ..ActivityType::new(" Demo ", "presentation")
        }
        .validate()
        .unwrap();

        assert_eq!(kind.name, "Demo");
        assert_eq!(kind.color.as_deref(), Some("FF00AA"));

        let payload = kind.to_api_payload();
        assert_eq!(payload["icon_key"], "presentation");
        assert!(!payload.contains_key("active_flag"));
    }

    #[test]
    fn test_invalid_icon_and_color() {
        assert!(ActivityType::new("Demo", "rocket").validate().is_err());
        let err = ActivityType {
            color: Some("#FFF".to_string()),
            ..ActivityType::new("Demo", "call")
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("HEX"));
    }

    #[test]
    fn test_from_api_value() {
        let kind = ActivityType::from_api_value(&json!({
            "id": 1, "name": "Call", "icon_key": "call", "key_string": "call", "is_custom_flag": false
        }));
        assert_eq!(kind.id, Some(1));
        assert_eq!(kind.active_flag, Some(true));
        assert_eq!(kind.is_custom_flag, Some(false));
    }
}
