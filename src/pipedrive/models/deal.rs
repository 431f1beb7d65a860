//! Deal entity

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{currency_code, date_field, f64_field, i64_field, non_negative, payload_without, positive_id, required_text, str_field};
use crate::config::pipedrive::DEFAULT_CURRENCY;
use crate::error::ValidationError;
use crate::pipedrive::utils::validate_choice;

pub const DEAL_STATUSES: &[&str] = &["open", "won", "lost"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_reason: Option<String>,
}

impl Deal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            value: None,
            currency: DEFAULT_CURRENCY.to_string(),
            person_id: None,
            org_id: None,
            status: "open".to_string(),
            owner_id: None,
            stage_id: None,
            pipeline_id: None,
            expected_close_date: None,
            visible_to: None,
            probability: None,
            lost_reason: None,
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.title = required_text(&self.title, "Deal title cannot be empty")?;
        self.value = non_negative(self.value, "Deal value must be non-negative")?;
        self.currency = currency_code(&self.currency)?;
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        validate_choice(&self.status, "status", DEAL_STATUSES)?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.stage_id = positive_id(self.stage_id, "stage_id")?;
        self.pipeline_id = positive_id(self.pipeline_id, "pipeline_id")?;
        self.probability = validate_probability(self.probability)?;

        check_lost_reason(Some(&self.status), self.lost_reason.as_deref())?;
        Ok(self)
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &["id"])
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: i64_field(data, "id"),
            title: str_field(data, "title").unwrap_or_default(),
            value: f64_field(data, "value"),
            currency: str_field(data, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            person_id: i64_field(data, "person_id"),
            org_id: i64_field(data, "org_id"),
            status: str_field(data, "status").unwrap_or_else(|| "open".to_string()),
            owner_id: i64_field(data, "owner_id").or_else(|| i64_field(data, "user_id")),
            stage_id: i64_field(data, "stage_id"),
            pipeline_id: i64_field(data, "pipeline_id"),
            expected_close_date: date_field(data, "expected_close_date"),
            visible_to: i64_field(data, "visible_to"),
            probability: i64_field(data, "probability"),
            lost_reason: str_field(data, "lost_reason"),
        }
    }
}

/// Partial deal used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DealUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_reason: Option<String>,
}

impl DealUpdate {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = &self.title {
            self.title = Some(required_text(title, "Deal title cannot be empty")?);
        }
        self.value = non_negative(self.value, "Deal value must be non-negative")?;
        if let Some(currency) = &self.currency {
            self.currency = Some(currency_code(currency)?);
        }
        self.person_id = positive_id(self.person_id, "person_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        if let Some(status) = &self.status {
            validate_choice(status, "status", DEAL_STATUSES)?;
        }
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.stage_id = positive_id(self.stage_id, "stage_id")?;
        self.pipeline_id = positive_id(self.pipeline_id, "pipeline_id")?;
        self.probability = validate_probability(self.probability)?;

        check_lost_reason(self.status.as_deref(), self.lost_reason.as_deref())?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.to_api_payload().is_empty()
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &[])
    }
}

fn validate_probability(probability: Option<i64>) -> Result<Option<i64>, ValidationError> {
    match probability {
        Some(p) if !(0..=100).contains(&p) => {
            Err(ValidationError::constraint("Deal probability must be between 0 and 100"))
        }
        other => Ok(other),
    }
}

fn check_lost_reason(status: Option<&str>, lost_reason: Option<&str>) -> Result<(), ValidationError> {
    match (status, lost_reason) {
        (Some("lost"), _) | (_, None) => Ok(()),
        _ => Err(ValidationError::constraint(
            "Lost reason can only be set if deal status is 'lost'",
        )),
    }
}
