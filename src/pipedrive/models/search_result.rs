//! Item search results

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{f64_field, i64_field, str_field};
use crate::error::ValidationError;

/// Kinds of items returned by `/itemSearch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchItemType {
    Deal,
    Person,
    Organization,
    Product,
    Lead,
    File,
    MailAttachment,
    Project,
}

impl SearchItemType {
    pub const ALL: [SearchItemType; 8] = [
        SearchItemType::Deal,
        SearchItemType::Person,
        SearchItemType::Organization,
        SearchItemType::Product,
        SearchItemType::Lead,
        SearchItemType::File,
        SearchItemType::MailAttachment,
        SearchItemType::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchItemType::Deal => "deal",
            SearchItemType::Person => "person",
            SearchItemType::Organization => "organization",
            SearchItemType::Product => "product",
            SearchItemType::Lead => "lead",
            SearchItemType::File => "file",
            SearchItemType::MailAttachment => "mail_attachment",
            SearchItemType::Project => "project",
        }
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(SearchItemType::as_str).collect()
    }
}

impl fmt::Display for SearchItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchItemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::choice("item type", s, &Self::names()))
    }
}

/// One hit from an item search; fields present depend on the item type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: SearchItemType,
    pub result_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal: Option<Value>,
}

impl SearchResult {
    /// Build a result from either a flat item or the `{result_score, item}` wrapper
    pub fn from_api_value(data: &Value) -> Result<Self, ValidationError> {
        let item = data.get("item").filter(|v| v.is_object()).unwrap_or(data);
        let score = f64_field(data, "result_score")
            .or_else(|| f64_field(item, "result_score"))
            .unwrap_or_default();

        let raw_type = str_field(item, "type").unwrap_or_default();
        let item_type = raw_type.parse::<SearchItemType>()?;
        let id = i64_field(item, "id").ok_or_else(|| ValidationError::MissingField {
            field: "id".to_string(),
        })?;

        Ok(Self {
            id,
            item_type,
            result_score: score,
            name: str_field(item, "name"),
            title: str_field(item, "title"),
            emails: array_field(item, "emails").or_else(|| array_field(item, "email")),
            phones: array_field(item, "phones").or_else(|| array_field(item, "phone")),
            address: str_field(item, "address"),
            code: str_field(item, "code"),
            visible_to: i64_field(item, "visible_to"),
            notes: array_field(item, "notes"),
            custom_fields: item.get("custom_fields").filter(|v| !v.is_null()).cloned(),
            value: f64_field(item, "value"),
            currency: str_field(item, "currency"),
            status: str_field(item, "status"),
            url: str_field(item, "url"),
            person: related(item, "person", "person_id", "person_name"),
            organization: related(item, "organization", "org_id", "org_name"),
            deal: item.get("deal").filter(|v| v.is_object()).cloned(),
        })
    }
}

/// Search results with per-type counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSearchResults {
    pub items: Vec<SearchResult>,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub counts: BTreeMap<SearchItemType, usize>,
}

impl ItemSearchResults {
    pub fn from_api_items(items: &[Value], next_cursor: Option<String>) -> Result<Self, ValidationError> {
        let items = items
            .iter()
            .map(SearchResult::from_api_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts: BTreeMap<SearchItemType, usize> =
            SearchItemType::ALL.iter().map(|kind| (*kind, 0)).collect();
        for item in &items {
            *counts.entry(item.item_type).or_default() += 1;
        }

        Ok(Self {
            total_count: items.len(),
            items,
            next_cursor,
            counts,
        })
    }

    pub fn count_of(&self, kind: SearchItemType) -> usize {
        self.counts.get(&kind).copied().unwrap_or_default()
    }
}

/// Value match from `/itemSearch/field`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSearchResult {
    pub id: Value,
    pub name: String,
}

impl FieldSearchResult {
    pub fn from_api_value(data: &Value) -> Self {
        Self {
            id: data.get("id").cloned().unwrap_or(Value::Null),
            name: str_field(data, "name").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSearchResults {
    pub items: Vec<FieldSearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl FieldSearchResults {
    pub fn from_api_items(items: &[Value], next_cursor: Option<String>) -> Self {
        Self {
            items: items.iter().map(FieldSearchResult::from_api_value).collect(),
            next_cursor,
        }
    }
}

fn array_field(data: &Value, key: &str) -> Option<Vec<Value>> {
    data.get(key)?.as_array().cloned()
}

/// Related person/organization: either an embedded object or flat `*_id`/`*_name` keys
fn related(item: &Value, key: &str, id_key: &str, name_key: &str) -> Option<Value> {
    if let Some(obj) = item.get(key).filter(|v| v.get("id").is_some()) {
        return Some(obj.clone());
    }
    let id = item.get(id_key).filter(|v| !v.is_null())?;
    let mut related = Map::new();
    related.insert("id".to_string(), id.clone());
    related.insert("name".to_string(), item.get(name_key).cloned().unwrap_or(Value::Null));
    Some(Value::Object(related))
}
