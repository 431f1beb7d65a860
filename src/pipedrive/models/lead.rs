//! Lead entity (v1 API)
//!
//! Leads carry their monetary value as a nested `{amount, currency}` object and
//! use UUIDs for their own id and for label ids.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{bool_field, currency_code, date_field, f64_field, i64_field, non_negative, payload_without, positive_id, required_text, str_field};
use crate::config::pipedrive::DEFAULT_CURRENCY;
use crate::error::ValidationError;
use crate::pipedrive::utils::validate_uuid_string;

/// Visibility groups accepted for leads
pub const LEAD_VISIBILITY: &[i64] = &[1, 3, 5, 7];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_seen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl Lead {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            person_id: None,
            organization_id: None,
            owner_id: None,
            expected_close_date: None,
            visible_to: None,
            label_ids: None,
            source_name: None,
            is_archived: None,
            was_seen: None,
            channel: None,
            channel_id: None,
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.title = required_text(&self.title, "Lead title cannot be empty")?;
        self.amount = non_negative(self.amount, "Lead amount must be non-negative if provided")?;
        self.currency = currency_code(&self.currency)?;
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.organization_id = positive_id(self.organization_id, "organization_id")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        check_visibility(self.visible_to)?;
        self.id = validate_uuid_string(self.id.as_deref(), "lead_id")?;
        self.label_ids = self.label_ids.map(validate_label_ids).transpose()?;
        self.channel = positive_id(self.channel, "channel")?;
        self.source_name = self.source_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if self.person_id.is_none() && self.organization_id.is_none() {
            return Err(ValidationError::constraint(
                "A lead must be linked to either a person, an organization, or both",
            ));
        }
        Ok(self)
    }

    /// Request body for create calls
    pub fn to_api_payload(&self) -> Map<String, Value> {
        let mut payload = payload_without(self, &["id", "amount", "currency"]);
        if let Some(amount) = self.amount {
            payload.insert("value".to_string(), json!({ "amount": amount, "currency": self.currency }));
        }
        payload
    }

    pub fn from_api_value(data: &Value) -> Self {
        let (amount, currency) = match data.get("value") {
            Some(Value::Object(value)) => (
                value.get("amount").and_then(Value::as_f64),
                value.get("currency").and_then(Value::as_str).map(String::from),
            ),
            Some(Value::Number(n)) => (n.as_f64(), str_field(data, "currency")),
            _ => (f64_field(data, "amount"), str_field(data, "currency")),
        };

        let label_ids = match data.get("label_ids") {
            Some(Value::Array(ids)) => Some(ids.iter().filter_map(Value::as_str).map(String::from).collect()),
            Some(Value::String(id)) => Some(vec![id.clone()]),
            _ => None,
        };

        Self {
            id: str_field(data, "id"),
            title: str_field(data, "title").unwrap_or_default(),
            amount,
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            person_id: i64_field(data, "person_id"),
            organization_id: i64_field(data, "organization_id"),
            owner_id: i64_field(data, "owner_id"),
            expected_close_date: date_field(data, "expected_close_date"),
            visible_to: i64_field(data, "visible_to"),
            label_ids,
            source_name: str_field(data, "source_name"),
            is_archived: bool_field(data, "is_archived"),
            was_seen: bool_field(data, "was_seen"),
            channel: i64_field(data, "channel"),
            channel_id: str_field(data, "channel_id"),
        }
    }
}

/// Partial lead used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing)]
    pub amount: Option<f64>,
    #[serde(skip_serializing)]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_seen: Option<bool>,
}

impl LeadUpdate {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = &self.title {
            self.title = Some(required_text(title, "Lead title cannot be empty")?);
        }
        self.amount = non_negative(self.amount, "Lead amount must be non-negative if provided")?;
        if let Some(currency) = &self.currency {
            self.currency = Some(currency_code(currency)?);
        }
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.organization_id = positive_id(self.organization_id, "organization_id")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.label_ids = self.label_ids.map(validate_label_ids).transpose()?;
        check_visibility(self.visible_to)?;
        Ok(self)
    }

    /// A pending currency change counts as a change until it is resolved
    /// against the lead's current amount
    pub fn is_empty(&self) -> bool {
        self.currency.is_none() && self.to_api_payload().is_empty()
    }

    /// Only a currency change needs the lead's current amount to build `value`
    pub fn needs_current_amount(&self) -> bool {
        self.amount.is_none() && self.currency.is_some()
    }

    /// Fill in the stored amount for a currency-only change. Without a stored
    /// amount there is no `value` to send, so the currency change is dropped.
    pub fn with_current_amount(mut self, current: Option<f64>) -> Self {
        match current {
            Some(amount) => self.amount = Some(amount),
            None => self.currency = None,
        }
        self
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        let mut payload = payload_without(self, &[]);
        match (self.amount, &self.currency) {
            (Some(amount), currency) => {
                let currency = currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
                payload.insert("value".to_string(), json!({ "amount": amount, "currency": currency }));
            }
            (None, _) => {}
        }
        payload
    }
}

fn check_visibility(visible_to: Option<i64>) -> Result<(), ValidationError> {
    match visible_to {
        Some(v) if !LEAD_VISIBILITY.contains(&v) => Err(ValidationError::constraint(format!(
            "Invalid visible_to value: {}. Must be one of: 1, 3, 5, 7",
            v
        ))),
        _ => Ok(()),
    }
}

fn validate_label_ids(label_ids: Vec<String>) -> Result<Vec<String>, ValidationError> {
    label_ids
        .iter()
        .map(|id| {
            validate_uuid_string(Some(id.as_str()), "label_ids")?.ok_or_else(|| {
                ValidationError::constraint("label_ids cannot contain empty values")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: &str = "f981f8bb-4c60-4b9e-9d7f-1a2b3c4d5e6f";

    #[test]
    fn test_lead_requires_person_or_organization() {
        let err = Lead::new("Inbound").validate().unwrap_err();
        assert!(err.to_string().contains("either a person, an organization"));

        assert!(Lead { person_id: Some(1), ..Lead::new("Inbound") }.validate().is_ok());
        assert!(Lead { organization_id: Some(1), ..Lead::new("Inbound") }.validate().is_ok());
    }

    #[test]
    fn test_field_rules_run_before_linkage_rule() {
        let err = Lead { amount: Some(-5.0), ..Lead::new("Inbound") }
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_lead_normalization() {
        let lead = Lead {
            amount: Some(2500.0),
            currency: "eur".into(),
            person_id: Some(3),
            label_ids: Some(vec![LABEL.to_uppercase()]),
            ..Lead::new("  Inbound  ")
        }
        .validate()
        .unwrap();

        assert_eq!(lead.title, "Inbound");
        assert_eq!(lead.currency, "EUR");
        assert_eq!(lead.label_ids, Some(vec![LABEL.to_string()]));
    }

    #[test]
    fn test_visibility_and_uuid_rules() {
        assert!(Lead { visible_to: Some(2), person_id: Some(1), ..Lead::new("x") }.validate().is_err());
        assert!(Lead { visible_to: Some(7), person_id: Some(1), ..Lead::new("x") }.validate().is_ok());
        assert!(Lead { id: Some("123".into()), person_id: Some(1), ..Lead::new("x") }.validate().is_err());
        assert!(Lead {
            label_ids: Some(vec!["bad".into()]),
            person_id: Some(1),
            ..Lead::new("x")
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_payload_nests_value() {
        let lead = Lead {
            amount: Some(100.0),
            person_id: Some(1),
            ..Lead::new("Inbound")
        };
        let payload = lead.to_api_payload();
        assert_eq!(payload["value"], json!({"amount": 100.0, "currency": "USD"}));
        assert!(!payload.contains_key("amount"));
        assert!(!payload.contains_key("currency"));
        assert!(!payload.contains_key("is_archived"));
    }

    #[test]
    fn test_from_api_value() {
        let lead = Lead::from_api_value(&json!({
            "id": LABEL,
            "title": "Inbound",
            "value": {"amount": 50, "currency": "GBP"},
            "person_id": 9,
            "label_ids": [LABEL],
            "expected_close_date": null,
            "is_archived": true
        }));
        assert_eq!(lead.amount, Some(50.0));
        assert_eq!(lead.currency, "GBP");
        assert_eq!(lead.is_archived, Some(true));
        assert_eq!(lead.was_seen, None);
        assert_eq!(lead.expected_close_date, None);
    }

    #[test]
    fn test_update_payload() {
        let update = LeadUpdate {
            amount: Some(10.0),
            currency: Some("chf".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(
            Value::Object(update.to_api_payload()),
            json!({"value": {"amount": 10.0, "currency": "CHF"}})
        );

        let currency_only = LeadUpdate { currency: Some("EUR".into()), ..Default::default() };
        assert!(currency_only.needs_current_amount());
        assert!(!currency_only.is_empty());
        assert!(LeadUpdate::default().is_empty());
    }

    #[test]
    fn test_currency_change_without_stored_amount_is_dropped() {
        let currency_only = LeadUpdate { currency: Some("EUR".into()), ..Default::default() };
        assert!(currency_only.to_api_payload().is_empty());

        let resolved = currency_only.clone().with_current_amount(Some(75.0));
        assert_eq!(
            Value::Object(resolved.to_api_payload()),
            json!({"value": {"amount": 75.0, "currency": "EUR"}})
        );

        let dropped = currency_only.with_current_amount(None);
        assert_eq!(dropped.currency, None);
        assert!(dropped.is_empty());

        let with_title = LeadUpdate {
            title: Some("Renamed".into()),
            currency: Some("EUR".into()),
            ..Default::default()
        }
        .with_current_amount(None);
        assert_eq!(Value::Object(with_title.to_api_payload()), json!({"title": "Renamed"}));
    }

    #[test]
    fn test_create_payload_forwards_status_flags() {
        let lead = Lead {
            person_id: Some(1),
            is_archived: Some(false),
            was_seen: Some(true),
            source_name: Some("  Web form ".into()),
            ..Lead::new("Inbound")
        }
        .validate()
        .unwrap();
        let payload = lead.to_api_payload();
        assert_eq!(payload["is_archived"], json!(false));
        assert_eq!(payload["was_seen"], json!(true));
        assert_eq!(payload["source_name"], json!("Web form"));
    }
}
