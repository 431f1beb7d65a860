//! Person entity and its contact details

use serde::Serialize;
use serde_json::{Map, Value};

use super::{i64_field, payload_without, positive_id, required_text, str_field};
use crate::error::ValidationError;

/// Email address or phone number with a label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactInfo {
    pub value: String,
    pub label: String,
    pub primary: bool,
}

impl ContactInfo {
    /// Primary contact entry; blank labels fall back to "work"
    pub fn primary(value: impl Into<String>, label: Option<&str>) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("work");
        Self {
            value: value.into(),
            label: label.to_string(),
            primary: true,
        }
    }

    fn from_api_value(data: &Value) -> Self {
        Self {
            value: str_field(data, "value").unwrap_or_default(),
            label: str_field(data, "label").unwrap_or_else(|| "work".to_string()),
            primary: data.get("primary").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ContactInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<ContactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text(&self.name, "Person name cannot be empty")?;
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        self.emails = validate_emails(self.emails)?;
        self.phones = validate_phones(self.phones)?;
        self.visible_to = positive_id(self.visible_to, "visible_to")?;
        Ok(self)
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &["id"])
    }

    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: i64_field(data, "id"),
            name: str_field(data, "name").unwrap_or_default(),
            owner_id: i64_field(data, "owner_id"),
            org_id: i64_field(data, "org_id"),
            emails: contact_list(data, "emails").or_else(|| contact_list(data, "email")).unwrap_or_default(),
            phones: contact_list(data, "phones").or_else(|| contact_list(data, "phone")).unwrap_or_default(),
            visible_to: i64_field(data, "visible_to"),
        }
    }
}

/// Partial person used for PATCH requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<ContactInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<ContactInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
}

impl PersonUpdate {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = &self.name {
            self.name = Some(required_text(name, "Person name cannot be empty")?);
        }
        self.owner_id = positive_id(self.owner_id, "owner_id")?;
        self.org_id = positive_id(self.org_id, "org_id")?;
        self.emails = self.emails.map(validate_emails).transpose()?;
        self.phones = self.phones.map(validate_phones).transpose()?;
        self.visible_to = positive_id(self.visible_to, "visible_to")?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.to_api_payload().is_empty()
    }

    pub fn to_api_payload(&self) -> Map<String, Value> {
        payload_without(self, &[])
    }
}

fn validate_emails(emails: Vec<ContactInfo>) -> Result<Vec<ContactInfo>, ValidationError> {
    emails
        .into_iter()
        .map(|mut email| {
            email.value = email.value.trim().to_string();
            if looks_like_email(&email.value) {
                Ok(email)
            } else {
                Err(ValidationError::constraint(format!("Invalid email address: {}", email.value)))
            }
        })
        .collect()
}

fn validate_phones(phones: Vec<ContactInfo>) -> Result<Vec<ContactInfo>, ValidationError> {
    phones
        .into_iter()
        .map(|mut phone| {
            phone.value = required_text(&phone.value, "Phone number cannot be empty")?;
            Ok(phone)
        })
        .collect()
}

/// Basic shape check: one `@`, non-empty local part, dotted domain
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !local.contains(' ')
        && !domain.contains(' ')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn contact_list(data: &Value, key: &str) -> Option<Vec<ContactInfo>> {
    let items = data.get(key)?.as_array()?;
    Some(items.iter().map(ContactInfo::from_api_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_with_contacts() {
        let person = Person {
            emails: vec![ContactInfo::primary(" jane@example.com ", None)],
            phones: vec![ContactInfo::primary("+1 555 0100", Some("mobile"))],
            ..Person::new("Jane Doe")
        }
        .validate()
        .unwrap();

        let payload = person.to_api_payload();
        assert_eq!(
            payload["emails"],
            json!([{"value": "jane@example.com", "label": "work", "primary": true}])
        );
        assert_eq!(payload["phones"][0]["label"], "mobile");
    }

    #[test]
    fn test_person_rules() {
        assert!(Person::new("").validate().is_err());
        assert!(Person { org_id: Some(-1), ..Person::new("Jane") }.validate().is_err());
        let err = Person {
            emails: vec![ContactInfo::primary("not-an-email", None)],
            ..Person::new("Jane")
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn test_empty_contact_lists_are_omitted() {
        let payload = Person::new("Jane").to_api_payload();
        assert!(!payload.contains_key("emails"));
        assert!(!payload.contains_key("phones"));
    }

    #[test]
    fn test_from_api_value() {
        let person = Person::from_api_value(&json!({
            "id": 8,
            "name": "Jane",
            "emails": [{"value": "jane@example.com", "primary": true}],
            "phones": [{"value": "123", "label": "home"}]
        }));
        assert_eq!(person.id, Some(8));
        assert_eq!(person.emails[0].label, "work");
        assert!(person.emails[0].primary);
        assert!(!person.phones[0].primary);
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("user.name@domain.co.uk"));
        assert!(!looks_like_email("@domain.com"));
        assert!(!looks_like_email("user@domain."));
        assert!(!looks_like_email("a@b@c.com"));
    }
}
