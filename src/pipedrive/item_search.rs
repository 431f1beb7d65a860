//! Cross-entity item search (v2)

use tracing::info;

use super::client::{ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use crate::config::pipedrive::DEFAULT_LIMIT;

pub const SEARCH_FIELDS: &[&str] = &[
    "address",
    "code",
    "custom_fields",
    "email",
    "name",
    "notes",
    "organization_name",
    "person_name",
    "phone",
    "title",
    "description",
];

pub const FIELD_SEARCH_ENTITY_TYPES: &[&str] = &["deal", "person", "organization", "product", "lead", "project"];

pub const MATCH_TYPES: &[&str] = &["exact", "beginning", "middle"];

/// Options for `/itemSearch`
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSearchParams {
    pub term: String,
    pub item_types: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub search_for_related_items: bool,
    pub exact_match: bool,
    pub include_fields: Option<Vec<String>>,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl ItemSearchParams {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            item_types: None,
            fields: None,
            search_for_related_items: false,
            exact_match: false,
            include_fields: None,
            limit: DEFAULT_LIMIT,
            cursor: None,
        }
    }
}

/// Options for `/itemSearch/field`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSearchParams {
    pub term: String,
    pub entity_type: String,
    pub field: String,
    pub match_type: String,
    pub limit: u32,
    pub cursor: Option<String>,
}

pub struct ItemSearchManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> ItemSearchManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    /// Raw hits keep their `{result_score, item}` shape
    pub async fn search(&self, params: &ItemSearchParams) -> ApiResult<Page> {
        let request = ApiRequest::get(ApiVersion::V2, "/itemSearch")
            .query("term", Some(&params.term))
            .query_list("item_types", params.item_types.as_deref())
            .query_list("fields", params.fields.as_deref())
            .query("search_for_related_items", Some(params.search_for_related_items))
            .query("exact_match", Some(params.exact_match))
            .query_list("include_fields", params.include_fields.as_deref())
            .query("limit", Some(params.limit))
            .query("cursor", params.cursor.as_ref());

        let page = Page::from_response(&self.api.request(request).await?);
        info!("Item search returned {} hits", page.items.len());
        Ok(page)
    }

    pub async fn search_field(&self, params: &FieldSearchParams) -> ApiResult<Page> {
        let request = ApiRequest::get(ApiVersion::V2, "/itemSearch/field")
            .query("term", Some(&params.term))
            .query("entity_type", Some(&params.entity_type))
            .query("field", Some(&params.field))
            .query("match", Some(&params.match_type))
            .query("limit", Some(params.limit))
            .query("cursor", params.cursor.as_ref());

        let page = Page::from_response(&self.api.request(request).await?);
        info!("Field search returned {} values", page.items.len());
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        last: Mutex<Option<ApiRequest>>,
    }

    #[async_trait]
    impl PipedriveApi for Recorder {
        async fn request(&self, request: ApiRequest) -> ApiResult<Value> {
            *self.last.lock().unwrap() = Some(request);
            Ok(json!({"success": true, "data": {"items": [{"id": 1, "name": "Acme"}]}}))
        }
    }

    #[test]
    fn test_search_query() {
        let api = Recorder::default();
        let params = ItemSearchParams {
            item_types: Some(vec!["deal".into(), "person".into()]),
            exact_match: true,
            ..ItemSearchParams::new("acme")
        };

        let page = tokio_test::block_on(ItemSearchManager::new(&api).search(&params)).unwrap();
        assert_eq!(page.items.len(), 1);

        let request = api.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.endpoint, "/itemSearch");
        assert_eq!(request.query_value("item_types"), Some("deal,person"));
        assert_eq!(request.query_value("exact_match"), Some("true"));
        assert_eq!(request.query_value("fields"), None);
    }

    #[test]
    fn test_field_search_query() {
        let api = Recorder::default();
        let params = FieldSearchParams {
            term: "Ac".into(),
            entity_type: "organization".into(),
            field: "name".into(),
            match_type: "beginning".into(),
            limit: 10,
            cursor: None,
        };

        tokio_test::block_on(ItemSearchManager::new(&api).search_field(&params)).unwrap();
        let request = api.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.endpoint, "/itemSearch/field");
        assert_eq!(request.query_value("match"), Some("beginning"));
        assert_eq!(request.query_value("limit"), Some("10"));
    }
}
