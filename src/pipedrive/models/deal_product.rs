//! Product attached to a deal

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{bool_field, date_field, f64_field, i64_field, payload_without, positive_id, str_field};
use crate::config::pipedrive::DEFAULT_CURRENCY;
use crate::error::ValidationError;
use crate::pipedrive::utils::validate_choice;

pub const DISCOUNT_TYPES: &[&str] = &["percentage", "amount"];
pub const TAX_METHODS: &[&str] = &["inclusive", "exclusive", "none"];
pub const BILLING_FREQUENCIES: &[&str] = &[
    "one-time",
    "annually",
    "semi-annually",
    "quarterly",
    "monthly",
    "weekly",
];
pub const MAX_BILLING_CYCLES: i64 = 208;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<i64>,
    pub product_id: i64,
    pub item_price: f64,
    pub quantity: i64,
    pub discount: f64,
    pub tax: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub currency: String,
    pub discount_type: String,
    pub tax_method: String,
    pub is_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_variation_id: Option<i64>,
    pub billing_frequency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_frequency_cycles: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_start_date: Option<NaiveDate>,
}

impl DealProduct {
    pub fn new(product_id: i64, item_price: f64, quantity: i64) -> Self {
        Self {
            id: None,
            deal_id: None,
            product_id,
            item_price,
            quantity,
            discount: 0.0,
            tax: 0.0,
            comments: None,
            currency: DEFAULT_CURRENCY.to_string(),
            discount_type: "percentage".to_string(),
            tax_method: "inclusive".to_string(),
            is_enabled: true,
            product_variation_id: None,
            billing_frequency: "one-time".to_string(),
            billing_frequency_cycles: None,
            billing_start_date: None,
        }
    }

    pub fn validate(self) -> Result<Self, ValidationError> {
        positive_id(Some(self.product_id), "product_id")?;
        positive_id(self.product_variation_id, "product_variation_id")?;
        if self.item_price <= 0.0 {
            return Err(ValidationError::constraint("Product price must be greater than zero"));
        }
        if self.quantity <= 0 {
            return Err(ValidationError::constraint("Product quantity must be greater than zero"));
        }
        check_non_negative(Some(self.discount), "Discount")?;
        check_non_negative(Some(self.tax), "Tax")?;
        validate_choice(&self.discount_type, "discount_type", DISCOUNT_TYPES)?;
        validate_choice(&self.tax_method, "tax_method", TAX_METHODS)?;
        validate_choice(&self.billing_frequency, "billing_frequency", BILLING_FREQUENCIES)?;

        check_billing_cycles(&self.billing_frequency, self.billing_frequency_cycles)?;
        Ok(self)
    }

    /// Request body for attaching the product; the deal id travels in the URL
    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &["id", "deal_id"])
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: i64_field(data, "id"),
            deal_id: i64_field(data, "deal_id"),
            product_id: i64_field(data, "product_id").unwrap_or_default(),
            item_price: f64_field(data, "item_price").unwrap_or_default(),
            quantity: i64_field(data, "quantity").unwrap_or_default(),
            discount: f64_field(data, "discount").unwrap_or_default(),
            tax: f64_field(data, "tax").unwrap_or_default(),
            comments: str_field(data, "comments"),
            currency: str_field(data, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            discount_type: str_field(data, "discount_type").unwrap_or_else(|| "percentage".to_string()),
            tax_method: str_field(data, "tax_method").unwrap_or_else(|| "inclusive".to_string()),
            is_enabled: bool_field(data, "is_enabled").unwrap_or(true),
            product_variation_id: i64_field(data, "product_variation_id"),
            billing_frequency: str_field(data, "billing_frequency").unwrap_or_else(|| "one-time".to_string()),
            billing_frequency_cycles: i64_field(data, "billing_frequency_cycles"),
            billing_start_date: date_field(data, "billing_start_date"),
        }
    }
}

/// Partial deal product used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DealProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_variation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_frequency_cycles: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_start_date: Option<NaiveDate>,
}

impl DealProductUpdate {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if matches!(self.item_price, Some(p) if p <= 0.0) {
            return Err(ValidationError::constraint("Product price must be greater than zero"));
        }
        if matches!(self.quantity, Some(q) if q <= 0) {
            return Err(ValidationError::constraint("Product quantity must be greater than zero"));
        }
        check_non_negative(self.discount, "Discount")?;
        check_non_negative(self.tax, "Tax")?;
        if let Some(discount_type) = &self.discount_type {
            validate_choice(discount_type, "discount_type", DISCOUNT_TYPES)?;
        }
        if let Some(tax_method) = &self.tax_method {
            validate_choice(tax_method, "tax_method", TAX_METHODS)?;
        }
        positive_id(self.product_variation_id, "product_variation_id")?;

        match &self.billing_frequency {
            Some(frequency) => {
                validate_choice(frequency, "billing_frequency", BILLING_FREQUENCIES)?;
                check_billing_cycles(frequency, self.billing_frequency_cycles)?;
            }
            None => check_cycle_range(self.billing_frequency_cycles)?,
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.to_api_payload().is_empty()
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &[])
    }
}

fn check_non_negative(value: Option<f64>, label: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0.0 => Err(ValidationError::constraint(format!("{} cannot be negative", label))),
        _ => Ok(()),
    }
}

fn check_billing_cycles(frequency: &str, cycles: Option<i64>) -> Result<(), ValidationError> {
    match (frequency, cycles) {
        ("one-time", Some(_)) => Err(ValidationError::constraint(
            "Billing frequency cycles must be null when billing frequency is 'one-time'",
        )),
        ("weekly", None) => Err(ValidationError::constraint(
            "Billing frequency cycles cannot be null when billing frequency is 'weekly'",
        )),
        _ => check_cycle_range(cycles),
    }
}

fn check_cycle_range(cycles: Option<i64>) -> Result<(), ValidationError> {
    match cycles {
        Some(c) if c <= 0 || c > MAX_BILLING_CYCLES => Err(ValidationError::constraint(format!(
            "Billing frequency cycles must be a positive integer less than or equal to {}",
            MAX_BILLING_CYCLES
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_billing(frequency: &str, cycles: Option<i64>) -> Result<DealProduct, ValidationError> {
        DealProduct {
            billing_frequency: frequency.to_string(),
            billing_frequency_cycles: cycles,
            ..DealProduct::new(5, 100.0, 2)
        }
        .validate()
    }

    #[test]
    fn test_billing_cycle_rules() {
        assert!(with_billing("one-time", None).is_ok());
        assert!(with_billing("one-time", Some(3)).is_err());
        assert!(with_billing("weekly", None).is_err());
        assert!(with_billing("weekly", Some(4)).is_ok());
        assert!(with_billing("monthly", Some(209)).is_err());
        assert!(with_billing("monthly", Some(208)).is_ok());
        assert!(with_billing("monthly", Some(0)).is_err());
        assert!(with_billing("monthly", None).is_ok());
        assert!(with_billing("daily", None).is_err());
    }

    #[test]
    fn test_price_quantity_and_choices() {
        assert!(DealProduct::new(5, 0.0, 1).validate().is_err());
        assert!(DealProduct::new(5, 10.0, 0).validate().is_err());
        assert!(DealProduct::new(0, 10.0, 1).validate().is_err());
        assert!(DealProduct { discount: -1.0, ..DealProduct::new(5, 10.0, 1) }.validate().is_err());
        assert!(DealProduct { tax: -0.5, ..DealProduct::new(5, 10.0, 1) }.validate().is_err());
        assert!(DealProduct { discount_type: "fixed".into(), ..DealProduct::new(5, 10.0, 1) }.validate().is_err());
        assert!(DealProduct { tax_method: "none".into(), ..DealProduct::new(5, 10.0, 1) }.validate().is_ok());
    }

    #[test]
    fn test_payload_excludes_ids() {
        let product = DealProduct {
            id: Some(1),
            deal_id: Some(2),
            ..DealProduct::new(5, 10.0, 1)
        };
        let payload = product.to_api_payload();
        assert_eq!(payload["product_id"], 5);
        assert_eq!(payload["billing_frequency"], "one-time");
        assert!(!payload.contains_key("id"));
        assert!(!payload.contains_key("deal_id"));
        assert!(!payload.contains_key("billing_frequency_cycles"));
    }

    #[test]
    fn test_update_rules() {
        let update = DealProductUpdate {
            billing_frequency: Some("weekly".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = DealProductUpdate {
            quantity: Some(3),
            billing_frequency_cycles: Some(300),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        assert!(DealProductUpdate::default().is_empty());
    }
}
