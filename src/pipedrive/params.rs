//! Query parameters shared by list and search calls

use serde_json::{Map, Value};

use super::client::ApiRequest;
use crate::config::pipedrive::DEFAULT_LIMIT;

pub const SORT_FIELDS: &[&str] = &["id", "update_time", "add_time"];
pub const SORT_DIRECTIONS: &[&str] = &["asc", "desc"];

/// Options for cursor-paginated list endpoints (v2)
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub limit: u32,
    pub cursor: Option<String>,
    pub filter_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
    /// Entity-specific filters such as `deal_id` or `status`
    pub filters: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor: None,
            filter_id: None,
            owner_id: None,
            sort_by: None,
            sort_direction: None,
            include_fields: None,
            custom_fields: None,
            updated_since: None,
            updated_until: None,
            filters: Vec::new(),
        }
    }
}

impl ListParams {
    pub fn filter<T: ToString>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.filters.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .query("limit", Some(self.limit))
            .query("cursor", self.cursor.as_ref())
            .query("filter_id", self.filter_id)
            .query("owner_id", self.owner_id)
            .query("updated_since", self.updated_since.as_ref())
            .query("updated_until", self.updated_until.as_ref())
            .query("sort_by", self.sort_by.as_ref())
            .query("sort_direction", self.sort_direction.as_ref())
            .query_list("include_fields", self.include_fields.as_deref())
            .query_list("custom_fields", self.custom_fields.as_deref());

        self.filters
            .iter()
            .fold(request, |req, (key, value)| req.query(key, Some(value)))
    }
}

/// Options for `/<entity>/search` endpoints (v2)
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub term: String,
    pub fields: Option<Vec<String>>,
    pub exact_match: bool,
    pub include_fields: Option<Vec<String>>,
    pub limit: u32,
    pub cursor: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            fields: None,
            exact_match: false,
            include_fields: None,
            limit: DEFAULT_LIMIT,
            cursor: None,
            filters: Vec::new(),
        }
    }

    pub fn filter<T: ToString>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.filters.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .query("term", Some(&self.term))
            .query("exact_match", Some(self.exact_match))
            .query_list("fields", self.fields.as_deref())
            .query_list("include_fields", self.include_fields.as_deref())
            .query("limit", Some(self.limit))
            .query("cursor", self.cursor.as_ref());

        self.filters
            .iter()
            .fold(request, |req, (key, value)| req.query(key, Some(value)))
    }
}

/// Unwrap `{result_score, item}` search hits into the item, keeping the score
pub(crate) fn flatten_search_items(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .map(|hit| match hit {
            Value::Object(mut wrapper) if wrapper.get("item").is_some_and(Value::is_object) => {
                let mut item: Map<String, Value> = match wrapper.remove("item") {
                    Some(Value::Object(item)) => item,
                    _ => Map::new(),
                };
                if let Some(score) = wrapper.remove("result_score") {
                    item.insert("result_score".to_string(), score);
                }
                Value::Object(item)
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipedrive::client::ApiVersion;
    use serde_json::json;

    #[test]
    fn test_list_params_apply() {
        let params = ListParams {
            limit: 50,
            sort_by: Some("add_time".into()),
            include_fields: Some(vec!["next_activity_id".into()]),
            ..Default::default()
        }
        .filter("deal_id", Some(7))
        .filter::<i64>("person_id", None);

        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/activities"));
        assert_eq!(request.query_value("limit"), Some("50"));
        assert_eq!(request.query_value("sort_by"), Some("add_time"));
        assert_eq!(request.query_value("include_fields"), Some("next_activity_id"));
        assert_eq!(request.query_value("deal_id"), Some("7"));
        assert_eq!(request.query_value("person_id"), None);
        assert_eq!(request.query_value("cursor"), None);
    }

    #[test]
    fn test_search_params_send_exact_match_as_string() {
        let request = SearchParams::new("acme").apply(ApiRequest::get(ApiVersion::V2, "/deals/search"));
        assert_eq!(request.query_value("exact_match"), Some("false"));
        assert_eq!(request.query_value("term"), Some("acme"));
    }

    #[test]
    fn test_flatten_search_items() {
        let items = flatten_search_items(vec![
            json!({"result_score": 0.7, "item": {"id": 1, "title": "Deal"}}),
            json!({"id": 2}),
        ]);
        assert_eq!(items[0], json!({"id": 1, "title": "Deal", "result_score": 0.7}));
        assert_eq!(items[1], json!({"id": 2}));
    }
}
