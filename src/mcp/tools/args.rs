//! Argument shapes shared by several tools

use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::mcp::response::ToolError;
use crate::pipedrive::params::{SORT_DIRECTIONS, SORT_FIELDS};
use crate::pipedrive::utils::{
    convert_bool_string, convert_id_string, normalize_optional, parse_limit, safe_split_to_list, validate_choice,
    validate_timestamp_string, validate_uuid_string,
};
use crate::pipedrive::{ListParams, SearchParams};

/// Required numeric ID passed as a string
pub(super) fn required_id(value: &str, field: &str) -> Result<i64, ToolError> {
    convert_id_string(Some(value), field)?
        .ok_or_else(|| missing(field))
}

/// Optional numeric ID passed as a string
pub(super) fn optional_id(value: Option<&str>, field: &str) -> Result<Option<i64>, ToolError> {
    Ok(convert_id_string(value, field)?)
}

/// Required UUID passed as a string
pub(super) fn required_uuid(value: &str, field: &str) -> Result<String, ToolError> {
    validate_uuid_string(Some(value), field)?.ok_or_else(|| missing(field))
}

fn missing(field: &str) -> ToolError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
    .into()
}

/// Flags arrive as JSON booleans or as strings such as `"true"`
#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Text(String),
}

/// `deserialize_with` target for optional flags; use with `#[serde(default)]`
pub(super) fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::Text(text)) => {
            convert_bool_string(Some(&text), "flag").map_err(serde::de::Error::custom)
        }
    }
}

/// Like [`optional_flag`] but an absent or blank value reads as `false`
pub(super) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_flag(deserializer)?.unwrap_or(false))
}

/// Arguments accepted by every cursor-paginated list tool
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListArgs {
    limit_str: Option<String>,
    cursor: Option<String>,
    filter_id_str: Option<String>,
    owner_id_str: Option<String>,
    sort_by: Option<String>,
    sort_direction: Option<String>,
    include_fields_str: Option<String>,
    custom_fields_str: Option<String>,
    updated_since: Option<String>,
    updated_until: Option<String>,
}

impl ListArgs {
    pub(super) fn to_params(&self) -> Result<ListParams, ToolError> {
        let sort_by = normalize_optional(self.sort_by.clone());
        if let Some(sort_by) = &sort_by {
            validate_choice(sort_by, "sort_by", SORT_FIELDS)?;
        }
        let sort_direction = normalize_optional(self.sort_direction.clone()).map(|d| d.to_lowercase());
        if let Some(direction) = &sort_direction {
            validate_choice(direction, "sort_direction", SORT_DIRECTIONS)?;
        }

        Ok(ListParams {
            limit: parse_limit(self.limit_str.as_deref()),
            cursor: normalize_optional(self.cursor.clone()),
            filter_id: convert_id_string(self.filter_id_str.as_deref(), "filter_id")?,
            owner_id: convert_id_string(self.owner_id_str.as_deref(), "owner_id")?,
            sort_by,
            sort_direction,
            include_fields: safe_split_to_list(self.include_fields_str.as_deref()),
            custom_fields: safe_split_to_list(self.custom_fields_str.as_deref()),
            updated_since: validate_timestamp_string(self.updated_since.as_deref(), "updated_since")?,
            updated_until: validate_timestamp_string(self.updated_until.as_deref(), "updated_until")?,
            filters: Vec::new(),
        })
    }
}

/// Arguments accepted by every `/<entity>/search` tool
#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchArgs {
    #[serde(default)]
    term: String,
    fields_str: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    exact_match: bool,
    include_fields_str: Option<String>,
    limit_str: Option<String>,
    cursor: Option<String>,
}

impl SearchArgs {
    /// Validate the term and fields; `allowed_fields` lists what the endpoint searches
    pub(super) fn to_params(&self, allowed_fields: &[&str]) -> Result<SearchParams, ToolError> {
        let term = validate_term(&self.term, self.exact_match)?;

        let fields = safe_split_to_list(self.fields_str.as_deref());
        for field in fields.iter().flatten() {
            validate_choice(field, "search field", allowed_fields)?;
        }

        Ok(SearchParams {
            fields,
            exact_match: self.exact_match,
            include_fields: safe_split_to_list(self.include_fields_str.as_deref()),
            limit: parse_limit(self.limit_str.as_deref()),
            cursor: normalize_optional(self.cursor.clone()),
            ..SearchParams::new(term)
        })
    }
}

/// Trimmed search term: non-empty, and two characters unless matching exactly
pub(super) fn validate_term(term: &str, exact_match: bool) -> Result<String, ToolError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ToolError::Validation("Search term cannot be empty".to_string()));
    }
    if !exact_match && term.chars().count() < 2 {
        return Err(ToolError::Validation(
            "Search term must be at least 2 characters long when exact_match is false".to_string(),
        ));
    }
    Ok(term.to_string())
}

// ==================== Schema Helpers ====================

/// Schema for a list tool: the common paging and sorting options plus `extra`
pub(super) fn list_schema(extra: Value) -> Value {
    let mut properties = object(json!({
        "limit_str": {
            "type": "string",
            "description": "Maximum number of results to return (default 100, max 500)"
        },
        "cursor": {
            "type": "string",
            "description": "Pagination cursor for the next page"
        },
        "filter_id_str": {
            "type": "string",
            "description": "ID of the filter to apply"
        },
        "owner_id_str": {
            "type": "string",
            "description": "Filter by owner user ID"
        },
        "sort_by": {
            "type": "string",
            "enum": SORT_FIELDS,
            "description": "Field to sort by"
        },
        "sort_direction": {
            "type": "string",
            "enum": SORT_DIRECTIONS,
            "description": "Sort direction"
        },
        "include_fields_str": {
            "type": "string",
            "description": "Comma-separated list of additional fields to include"
        },
        "custom_fields_str": {
            "type": "string",
            "description": "Comma-separated list of custom fields to include"
        },
        "updated_since": {
            "type": "string",
            "description": "Only items updated at or after this RFC 3339 time (e.g. 2025-01-01T10:20:00Z)"
        },
        "updated_until": {
            "type": "string",
            "description": "Only items updated before this RFC 3339 time"
        }
    }));
    properties.extend(object(extra));

    json!({
        "type": "object",
        "properties": properties,
        "required": []
    })
}

/// Schema for an entity search tool: the common search options plus `extra`
pub(super) fn search_schema(fields_description: &str, extra: Value) -> Value {
    let mut properties = object(json!({
        "term": {
            "type": "string",
            "description": "Search term (at least 2 characters, or 1 with exact_match)"
        },
        "fields_str": {
            "type": "string",
            "description": fields_description
        },
        "exact_match": {
            "type": "boolean",
            "description": "Only return exact matches of the term"
        },
        "include_fields_str": {
            "type": "string",
            "description": "Comma-separated list of additional fields to include"
        },
        "limit_str": {
            "type": "string",
            "description": "Maximum number of results to return (default 100, max 500)"
        },
        "cursor": {
            "type": "string",
            "description": "Pagination cursor for the next page"
        }
    }));
    properties.extend(object(extra));

    json!({
        "type": "object",
        "properties": properties,
        "required": ["term"]
    })
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(value: Value) -> ListArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_list_args_defaults() {
        let params = list_args(json!({})).to_params().unwrap();
        assert_eq!(params.limit, 100);
        assert!(params.cursor.is_none());
        assert!(params.include_fields.is_none());
    }

    #[test]
    fn test_list_args_conversion() {
        let params = list_args(json!({
            "limit_str": "900",
            "owner_id_str": "12",
            "sort_by": "update_time",
            "sort_direction": "DESC",
            "include_fields_str": "a, b,,",
            "updated_since": "2025-01-01T10:20:00Z"
        }))
        .to_params()
        .unwrap();

        assert_eq!(params.limit, 500);
        assert_eq!(params.owner_id, Some(12));
        assert_eq!(params.sort_direction.as_deref(), Some("desc"));
        assert_eq!(params.include_fields, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_list_args_rejects_bad_values() {
        let err = list_args(json!({"sort_by": "name"})).to_params().unwrap_err();
        assert!(err.to_string().contains("Invalid sort_by"));

        let err = list_args(json!({"owner_id_str": "abc"})).to_params().unwrap_err();
        assert!(err.to_string().contains("owner_id must be a numeric string"));

        assert!(list_args(json!({"updated_until": "yesterday"})).to_params().is_err());
    }

    #[test]
    fn test_search_term_rules() {
        assert_eq!(
            validate_term("  ", false).unwrap_err().to_string(),
            "Validation error: Search term cannot be empty"
        );
        assert!(validate_term("a", false).is_err());
        assert_eq!(validate_term(" a ", true).unwrap(), "a");
        assert_eq!(validate_term("ac", false).unwrap(), "ac");
    }

    #[test]
    fn test_search_args_fields() {
        let args: SearchArgs = serde_json::from_value(json!({"term": "acme", "fields_str": "name,notes"})).unwrap();
        let params = args.to_params(&["name", "notes"]).unwrap();
        assert_eq!(params.term, "acme");
        assert_eq!(params.fields.unwrap().len(), 2);

        let args: SearchArgs = serde_json::from_value(json!({"term": "acme", "fields_str": "phone"})).unwrap();
        assert!(args.to_params(&["name"]).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "optional_flag")]
        done: Option<bool>,
        #[serde(default, deserialize_with = "flag")]
        exact: bool,
    }

    #[test]
    fn test_flags_accept_booleans_and_strings() {
        let flags: Flags = serde_json::from_value(json!({"done": true, "exact": "true"})).unwrap();
        assert_eq!(flags.done, Some(true));
        assert!(flags.exact);

        let flags: Flags = serde_json::from_value(json!({"done": "false", "exact": false})).unwrap();
        assert_eq!(flags.done, Some(false));
        assert!(!flags.exact);

        let flags: Flags = serde_json::from_value(json!({"done": " ", "exact": null})).unwrap();
        assert_eq!(flags.done, None);
        assert!(!flags.exact);

        let flags: Flags = serde_json::from_value(json!({})).unwrap();
        assert_eq!(flags.done, None);
        assert!(!flags.exact);
    }

    #[test]
    fn test_flags_reject_other_values() {
        let err = serde_json::from_value::<Flags>(json!({"done": "maybe"})).unwrap_err();
        assert!(err.to_string().contains("'maybe' is not a boolean"));
        assert!(serde_json::from_value::<Flags>(json!({"exact": 1})).is_err());
    }

    #[test]
    fn test_search_args_exact_match_string() {
        let args: SearchArgs = serde_json::from_value(json!({"term": "a", "exact_match": "true"})).unwrap();
        assert!(args.to_params(&["name"]).unwrap().exact_match);
    }

    #[test]
    fn test_required_helpers() {
        assert_eq!(required_id("42", "deal_id").unwrap(), 42);
        assert!(required_id("", "deal_id").unwrap_err().to_string().contains("deal_id is required"));
        assert!(required_uuid("not-a-uuid", "lead_id").is_err());
    }

    #[test]
    fn test_list_schema_merges_extra() {
        let schema = list_schema(json!({"status": {"type": "string"}}));
        assert!(schema["properties"]["status"].is_object());
        assert!(schema["properties"]["limit_str"].is_object());
    }
}
