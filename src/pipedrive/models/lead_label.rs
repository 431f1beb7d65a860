//! Lead label entity (v1 API)

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use super::{required_text, str_field};
use crate::error::ValidationError;
use crate::pipedrive::utils::validate_uuid_string;

pub const LABEL_COLORS: &[&str] = &[
    "blue", "brown", "dark-gray", "gray", "green", "orange", "pink", "purple", "red", "yellow",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadLabel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<FixedOffset>>,
}

impl LeadLabel {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.id = validate_uuid_string(self.id.as_deref(), "label_id")?;
        self.name = required_text(&self.name, "Lead label name cannot be empty")?;
        let color = required_text(&self.color, "Lead label color cannot be empty")?.to_lowercase();
        if !LABEL_COLORS.contains(&color.as_str()) {
            return Err(ValidationError::choice("color", &color, LABEL_COLORS));
        }
        self.color = color;
        Ok(self)
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: str_field(data, "id"),
            name: str_field(data, "name").unwrap_or_default(),
            color: str_field(data, "color").unwrap_or_default(),
            add_time: str_field(data, "add_time").as_deref().and_then(parse_timestamp),
            update_time: str_field(data, "update_time").as_deref().and_then(parse_timestamp),
        }
    }
}

/// Timestamps come back as RFC 3339 or as naive `YYYY-MM-DD HH:MM:SS` UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_api_value_parses_timestamps() {
        let label = LeadLabel::from_api_value(&json!({
            "id": "f981f8bb-4c60-4b9e-9d7f-1a2b3c4d5e6f",
            "name": "Hot",
            "color": "red",
            "add_time": "2024-03-01T10:00:00.000Z",
            "update_time": "2024-03-02 11:30:00"
        }));

        assert!(label.add_time.is_some());
        assert!(label.update_time.is_some());
        assert!(label.validate().is_ok());
    }

    #[test]
    fn test_unparseable_timestamp_is_dropped() {
        let label = LeadLabel::from_api_value(&json!({"name": "Hot", "color": "red", "add_time": "yesterday"}));
        assert_eq!(label.add_time, None);
    }

    #[test]
    fn test_color_rules() {
        let label = LeadLabel::from_api_value(&json!({"name": "Warm", "color": "ORANGE"}))
            .validate()
            .unwrap();
        assert_eq!(label.color, "orange");

        let err = LeadLabel::from_api_value(&json!({"name": "Warm", "color": "teal"}))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("teal"));
    }
}
