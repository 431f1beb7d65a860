//! Organization entity and followers

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{i64_field, payload_without, positive_id, required_text, str_field};
use crate::error::ValidationError;

/// Visibility groups accepted for organizations
pub const ORGANIZATION_VISIBILITY: &[i64] = &[1, 2, 3, 4];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<i64>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text(&self.name, "Organization name cannot be empty")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        check_visibility(self.visible_to)?;
        for label_id in &self.label_ids {
            positive_id(Some(*label_id), "label_ids")?;
        }
        Ok(self)
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &["id"])
    }

    pub fn from_api_value(data: &Value) -> Self {
        let label_ids = data
            .get("label_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        Self {
            id: i64_field(data, "id"),
            name: str_field(data, "name").unwrap_or_default(),
            owner_id: i64_field(data, "owner_id"),
            address: address_field(data),
            visible_to: i64_field(data, "visible_to"),
            label_ids,
        }
    }
}

/// Partial organization used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
}

impl OrganizationUpdate {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = &self.name {
            self.name = Some(required_text(name, "Organization name cannot be empty")?);
        }
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        check_visibility(self.visible_to)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.to_api_payload().is_empty()
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &[])
    }
}

/// A user following an organization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationFollower {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_time: Option<String>,
}

impl OrganizationFollower {
    pub fn new(user_id: i64) -> Result<Self, ValidationError> {
        positive_id(Some(user_id), "user_id")?;
        Ok(Self { user_id, add_time: None })
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("user_id".to_string(), json!(self.user_id));
        payload
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            user_id: i64_field(data, "user_id").unwrap_or_default(),
            add_time: str_field(data, "add_time"),
        }
    }
}

fn check_visibility(visible_to: Option<i64>) -> Result<(), ValidationError> {
    match visible_to {
        Some(v) if !ORGANIZATION_VISIBILITY.contains(&v) => Err(ValidationError::constraint(format!(
            "Invalid visibility value: {}. Must be one of: 1, 2, 3, 4",
            v
        ))),
        _ => Ok(()),
    }
}

fn address_field(data: &Value) -> Option<String> {
    match data.get("address")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_rule() {
        for valid in 1..=4 {
            assert!(Organization { visible_to: Some(valid), ..Organization::new("Acme") }.validate().is_ok());
        }
        let err = Organization { visible_to: Some(7), ..Organization::new("Acme") }
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid visibility value: 7"));
    }

    #[test]
    fn test_name_required() {
        assert!(Organization::new(" ").validate().is_err());
        assert!(OrganizationUpdate { name: Some("".into()), ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_payload_and_from_api() {
        let org = Organization {
            id: Some(4),
            label_ids: vec![1, 2],
            address: Some("Main St 1".into()),
            ..Organization::new("Acme")
        };
        let payload = org.to_api_payload();
        assert_eq!(payload["label_ids"], json!([1, 2]));
        assert!(!payload.contains_key("id"));

        let parsed = Organization::from_api_value(&json!({
            "id": 4, "name": "Acme", "address": {"value": "Main St 1"}, "label_ids": [1, 2]
        }));
        assert_eq!(parsed.address.as_deref(), Some("Main St 1"));
        assert_eq!(parsed.label_ids, vec![1, 2]);
    }

    #[test]
    fn test_follower() {
        assert!(OrganizationFollower::new(0).is_err());
        let follower = OrganizationFollower::new(12).unwrap();
        assert_eq!(Value::Object(follower.to_api_payload()), json!({"user_id": 12}));

        let parsed = OrganizationFollower::from_api_value(&json!({"user_id": 12, "add_time": "2025-01-01 10:00:00"}));
        assert_eq!(parsed.add_time.as_deref(), Some("2025-01-01 10:00:00"));
    }
}
