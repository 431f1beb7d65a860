//! Organization and follower endpoints (v2)

use serde_json::Value;
use tracing::info;

use super::client::{response_data, ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use super::models::{Organization, OrganizationFollower, OrganizationUpdate};
use super::params::{flatten_search_items, ListParams, SearchParams};

pub struct OrganizationManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> OrganizationManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    pub async fn create(&self, organization: &Organization) -> ApiResult<Value> {
        info!("Creating organization '{}'", organization.name);
        let request = ApiRequest::post(ApiVersion::V2, "/organizations")
            .json(Value::Object(organization.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn get(
        &self,
        organization_id: i64,
        include_fields: Option<&[String]>,
        custom_fields: Option<&[String]>,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(ApiVersion::V2, format!("/organizations/{}", organization_id))
            .query_list("include_fields", include_fields)
            .query_list("custom_fields", custom_fields);
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update(&self, organization_id: i64, update: &OrganizationUpdate) -> ApiResult<Value> {
        info!("Updating organization {}", organization_id);
        let request = ApiRequest::patch(ApiVersion::V2, format!("/organizations/{}", organization_id))
            .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete(&self, organization_id: i64) -> ApiResult<Value> {
        info!("Deleting organization {}", organization_id);
        let request = ApiRequest::delete(ApiVersion::V2, format!("/organizations/{}", organization_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/organizations"));
        let page = Page::from_response(&self.api.request(request).await?);
        info!("Listed {} organizations", page.items.len());
        Ok(page)
    }

    pub async fn search(&self, params: &SearchParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/organizations/search"));
        let mut page = Page::from_response(&self.api.request(request).await?);
        page.items = flatten_search_items(page.items);
        info!("Found {} organizations", page.items.len());
        Ok(page)
    }

    // ==================== Followers ====================

    pub async fn add_follower(&self, organization_id: i64, follower: &OrganizationFollower) -> ApiResult<Value> {
        info!("Adding follower {} to organization {}", follower.user_id, organization_id);
        let request = ApiRequest::post(ApiVersion::V2, format!("/organizations/{}/followers", organization_id))
            .json(Value::Object(follower.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete_follower(&self, organization_id: i64, follower_id: i64) -> ApiResult<Value> {
        info!("Removing follower {} from organization {}", follower_id, organization_id);
        let request = ApiRequest::delete(
            ApiVersion::V2,
            format!("/organizations/{}/followers/{}", organization_id, follower_id),
        );
        Ok(response_data(self.api.request(request).await?))
    }
}
