//! Activity entity

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{bool_field, date_field, i64_field, payload_without, positive_id, required_text, str_field};
use crate::error::ValidationError;
use crate::pipedrive::utils::{normalize_duration, validate_time_string, validate_uuid_string};

/// A scheduled activity (call, meeting, task, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Activity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub subject: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Activity {
    pub fn new(subject: impl Into<String>, activity_type: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            activity_type: activity_type.into(),
            ..Default::default()
        }
    }

    /// Check every field in declaration order, normalizing as it goes.
    /// Stops at the first violation.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.subject = required_text(&self.subject, "Activity subject cannot be empty")?;
        self.activity_type = required_text(&self.activity_type, "Activity type cannot be empty")?;
        self.due_time = validate_time_string(self.due_time.as_deref(), "due_time")?;
        self.duration = normalize_duration(self.duration.as_deref(), "duration")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.deal_id = positive_id(self.deal_id, "deal_id")?;
        self.lead_id = validate_uuid_string(self.lead_id.as_deref(), "lead_id")?;
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        self.project_id = positive_id(self.project_id, "project_id")?;
        self.priority = validate_priority(self.priority)?;
        self.id = positive_id(self.id, "id")?;
        Ok(self)
    }

    /// Request body for create calls
    pub fn to_api_payload(&self) -> Map<String, Value> {
        let mut payload = payload_without(self, &["id"]);
        wrap_location(&mut payload);
        payload
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: i64_field(data, "id"),
            subject: str_field(data, "subject").unwrap_or_default(),
            activity_type: str_field(data, "type").unwrap_or_default(),
            due_date: date_field(data, "due_date"),
            due_time: str_field(data, "due_time"),
            duration: str_field(data, "duration"),
            owner_id: i64_field(data, "owner_id").or_else(|| i64_field(data, "user_id")),
            deal_id: i64_field(data, "deal_id"),
            lead_id: str_field(data, "lead_id"),
            person_id: i64_field(data, "person_id"),
            org_id: i64_field(data, "org_id"),
            project_id: i64_field(data, "project_id"),
            busy: bool_field(data, "busy"),
            done: bool_field(data, "done"),
            note: str_field(data, "note"),
            location: location_field(data),
            public_description: str_field(data, "public_description"),
            priority: i64_field(data, "priority"),
        }
    }
}

/// Partial activity used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl ActivityUpdate {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(subject) = &self.subject {
            self.subject = Some(required_text(subject, "Activity subject cannot be empty")?);
        }
        if let Some(kind) = &self.activity_type {
            self.activity_type = Some(required_text(kind, "Activity type cannot be empty")?);
        }
        self.due_time = validate_time_string(self.due_time.as_deref(), "due_time")?;
        self.duration = normalize_duration(self.duration.as_deref(), "duration")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.deal_id = positive_id(self.deal_id, "deal_id")?;
        self.lead_id = validate_uuid_string(self.lead_id.as_deref(), "lead_id")?;
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        self.project_id = positive_id(self.project_id, "project_id")?;
        self.priority = validate_priority(self.priority)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.to_api_payload().is_empty()
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        let mut payload = payload_without(self, &[]);
        wrap_location(&mut payload);
        payload
    }
}

fn validate_priority(priority: Option<i64>) -> Result<Option<i64>, ValidationError> {
    match priority {
        Some(p) if !(0..=999).contains(&p) => Err(ValidationError::constraint(
            "Priority must be between 0 and 999 if provided",
        )),
        other => Ok(other),
    }
}

/// The v2 API takes the location as an object
fn wrap_location(payload: &mut Map<String, Value>) {
    if let Some(Value::String(location)) = payload.remove("location") {
        payload.insert("location".to_string(), json!({ "value": location }));
    }
}

fn location_field(data: &Value) -> Option<String> {
    match data.get("location")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_activity_is_normalized() {
        let activity = Activity {
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            duration: Some("1:30".to_string()),
            lead_id: Some("123E4567-E89B-12D3-A456-426614174000".to_string()),
            owner_id: Some(123),
            ..Activity::new("  Call with client ", " call ")
        }
        .validate()
        .unwrap();

        assert_eq!(activity.subject, "Call with client");
        assert_eq!(activity.activity_type, "call");
        assert_eq!(activity.duration.as_deref(), Some("01:30:00"));
        assert_eq!(activity.lead_id.as_deref(), Some("123e4567-e89b-12d3-a456-426614174000"));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let err = Activity::new("   ", "call").validate().unwrap_err();
        assert_eq!(err.to_string(), "Activity subject cannot be empty");
    }

    #[test]
    fn test_first_failing_field_wins() {
        // Both subject and priority are invalid; subject is declared first
        let err = Activity {
            priority: Some(5000),
            ..Activity::new("", "call")
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn test_duration_forms() {
        for (input, expected) in [("1:00", "01:00:00"), ("01:00", "01:00:00"), ("1:00:00", "01:00:00")] {
            let activity = Activity {
                duration: Some(input.to_string()),
                ..Activity::new("Sync", "meeting")
            }
            .validate()
            .unwrap();
            assert_eq!(activity.duration.as_deref(), Some(expected));
        }

        let err = Activity {
            duration: Some("25:00:00".to_string()),
            ..Activity::new("Sync", "meeting")
        }
        .validate();
        assert!(err.is_err());
    }

    #[test]
    fn test_due_time_must_be_full_form() {
        let result = Activity {
            due_time: Some("9:30".to_string()),
            ..Activity::new("Sync", "meeting")
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_priority_and_ids() {
        assert!(Activity { priority: Some(1000), ..Activity::new("a", "b") }.validate().is_err());
        assert!(Activity { priority: Some(999), ..Activity::new("a", "b") }.validate().is_ok());
        assert!(Activity { deal_id: Some(0), ..Activity::new("a", "b") }.validate().is_err());
        assert!(Activity { lead_id: Some("nope".into()), ..Activity::new("a", "b") }.validate().is_err());
    }

    #[test]
    fn test_to_api_payload() {
        let activity = Activity {
            id: Some(9),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            location: Some("HQ".to_string()),
            ..Activity::new("Call", "call")
        };
        let payload = activity.to_api_payload();

        assert_eq!(payload["subject"], "Call");
        assert_eq!(payload["type"], "call");
        assert_eq!(payload["due_date"], "2025-01-15");
        assert_eq!(payload["location"], json!({"value": "HQ"}));
        assert!(!payload.contains_key("id"));
        assert!(!payload.contains_key("note"));
    }

    #[test]
    fn test_from_api_value_is_lenient() {
        let data = json!({
            "id": 55,
            "subject": "Demo",
            "type": "meeting",
            "owner_id": 3,
            "due_date": "not a date",
            "location": {"value": "Berlin"},
            "done": true,
            "unexpected": [1, 2, 3]
        });
        let activity = Activity::from_api_value(&data);

        assert_eq!(activity.id, Some(55));
        assert_eq!(activity.subject, "Demo");
        assert_eq!(activity.due_date, None);
        assert_eq!(activity.location.as_deref(), Some("Berlin"));
        assert_eq!(activity.done, Some(true));
        assert_eq!(activity.busy, None);
    }

    #[test]
    fn test_update_payload() {
        let update = ActivityUpdate {
            done: Some(true),
            duration: Some("2:00".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let payload = update.to_api_payload();

        assert_eq!(payload.len(), 2);
        assert_eq!(payload["duration"], "02:00:00");
        assert!(ActivityUpdate::default().is_empty());
    }

    #[test]
    fn test_update_project_link() {
        let update = ActivityUpdate { project_id: Some(8), ..Default::default() }.validate().unwrap();
        assert_eq!(Value::Object(update.to_api_payload()), json!({"project_id": 8}));

        let err = ActivityUpdate { project_id: Some(0), ..Default::default() }.validate().unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
