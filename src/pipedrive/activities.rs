//! Activity and activity type endpoints

use serde_json::Value;
use tracing::info;

use super::client::{response_data, ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use super::models::{Activity, ActivityType, ActivityUpdate};
use super::params::ListParams;

/// Activity operations (v2; activity types live on v1)
pub struct ActivityManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> ActivityManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    pub async fn create(&self, activity: &Activity) -> ApiResult<Value> {
        info!("Creating activity '{}'", activity.subject);
        let request = ApiRequest::post(ApiVersion::V2, "/activities")
            .json(Value::Object(activity.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn get(&self, activity_id: i64, include_fields: Option<&[String]>) -> ApiResult<Value> {
        let request = ApiRequest::get(ApiVersion::V2, format!("/activities/{}", activity_id))
            .query_list("include_fields", include_fields);
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update(&self, activity_id: i64, update: &ActivityUpdate) -> ApiResult<Value> {
        info!("Updating activity {}", activity_id);
        let request = ApiRequest::patch(ApiVersion::V2, format!("/activities/{}", activity_id))
            .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete(&self, activity_id: i64) -> ApiResult<Value> {
        info!("Deleting activity {}", activity_id);
        let request = ApiRequest::delete(ApiVersion::V2, format!("/activities/{}", activity_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/activities"));
        let page = Page::from_response(&self.api.request(request).await?);
        info!("Listed {} activities", page.items.len());
        Ok(page)
    }

    pub async fn list_types(&self) -> ApiResult<Vec<Value>> {
        let request = ApiRequest::get(ApiVersion::V1, "/activityTypes");
        Ok(Page::from_response(&self.api.request(request).await?).items)
    }

    pub async fn create_type(&self, activity_type: &ActivityType) -> ApiResult<Value> {
        info!("Creating activity type '{}'", activity_type.name);
        let request = ApiRequest::post(ApiVersion::V1, "/activityTypes")
            .json(Value::Object(activity_type.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }
}
