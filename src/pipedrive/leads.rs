//! Lead endpoints
//!
//! Lead CRUD, labels and sources are served by the v1 API; search is v2.

use serde_json::Value;
use tracing::info;

use super::client::{response_data, ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use super::models::{Lead, LeadUpdate};
use super::params::{flatten_search_items, SearchParams};
use crate::config::pipedrive::DEFAULT_LIMIT;

pub const ARCHIVED_STATUSES: &[&str] = &["archived", "not_archived", "all"];

/// Options for the offset-paginated v1 lead listing
#[derive(Debug, Clone, PartialEq)]
pub struct LeadListParams {
    pub limit: u32,
    pub start: Option<i64>,
    pub archived_status: Option<String>,
    pub owner_id: Option<i64>,
    pub person_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub filter_id: Option<i64>,
    pub sort: Option<String>,
}

impl Default for LeadListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            start: None,
            archived_status: None,
            owner_id: None,
            person_id: None,
            organization_id: None,
            filter_id: None,
            sort: None,
        }
    }
}

/// A page of leads with v1 `additional_data.pagination` details
#[derive(Debug, Clone, PartialEq)]
pub struct LeadPage {
    pub items: Vec<Value>,
    pub total_count: i64,
    pub next_start: Option<i64>,
    pub more_items: bool,
}

impl LeadPage {
    fn from_response(response: &Value) -> Self {
        let items = response
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let pagination = response
            .get("additional_data")
            .and_then(|extra| extra.get("pagination"));
        let total_count = pagination
            .and_then(|p| p.get("total_count"))
            .and_then(Value::as_i64)
            .unwrap_or(items.len() as i64);

        Self {
            total_count,
            next_start: pagination.and_then(|p| p.get("next_start")).and_then(Value::as_i64),
            more_items: pagination
                .and_then(|p| p.get("more_items_in_collection"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            items,
        }
    }
}

pub struct LeadManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> LeadManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    pub async fn create(&self, lead: &Lead) -> ApiResult<Value> {
        info!("Creating lead '{}'", lead.title);
        let request = ApiRequest::post(ApiVersion::V1, "/leads").json(Value::Object(lead.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn get(&self, lead_id: &str) -> ApiResult<Value> {
        let request = ApiRequest::get(ApiVersion::V1, format!("/leads/{}", lead_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update(&self, lead_id: &str, update: &LeadUpdate) -> ApiResult<Value> {
        info!("Updating lead {}", lead_id);
        let request = ApiRequest::patch(ApiVersion::V1, format!("/leads/{}", lead_id))
            .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete(&self, lead_id: &str) -> ApiResult<Value> {
        info!("Deleting lead {}", lead_id);
        let request = ApiRequest::delete(ApiVersion::V1, format!("/leads/{}", lead_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn list(&self, params: &LeadListParams) -> ApiResult<LeadPage> {
        let request = ApiRequest::get(ApiVersion::V1, "/leads")
            .query("limit", Some(params.limit))
            .query("start", params.start)
            .query("archived_status", params.archived_status.as_ref())
            .query("owner_id", params.owner_id)
            .query("person_id", params.person_id)
            .query("organization_id", params.organization_id)
            .query("filter_id", params.filter_id)
            .query("sort", params.sort.as_ref());

        let page = LeadPage::from_response(&self.api.request(request).await?);
        info!("Listed {} leads out of {}", page.items.len(), page.total_count);
        Ok(page)
    }

    pub async fn search(&self, params: &SearchParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/leads/search"));
        let mut page = Page::from_response(&self.api.request(request).await?);
        page.items = flatten_search_items(page.items);
        info!("Found {} leads", page.items.len());
        Ok(page)
    }

    pub async fn labels(&self) -> ApiResult<Vec<Value>> {
        let request = ApiRequest::get(ApiVersion::V1, "/leadLabels");
        Ok(Page::from_response(&self.api.request(request).await?).items)
    }

    pub async fn sources(&self) -> ApiResult<Vec<Value>> {
        let request = ApiRequest::get(ApiVersion::V1, "/leadSources");
        Ok(Page::from_response(&self.api.request(request).await?).items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_page_pagination() {
        let page = LeadPage::from_response(&json!({
            "success": true,
            "data": [{"id": "a"}],
            "additional_data": {"pagination": {"total_count": 12, "next_start": 1, "more_items_in_collection": true}}
        }));
        assert_eq!(page.total_count, 12);
        assert_eq!(page.next_start, Some(1));
        assert!(page.more_items);

        let bare = LeadPage::from_response(&json!({"success": true, "data": []}));
        assert_eq!(bare.total_count, 0);
        assert_eq!(bare.next_start, None);
    }
}
