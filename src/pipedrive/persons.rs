//! Person endpoints (v2)

use serde_json::Value;
use tracing::info;

use super::client::{response_data, ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use super::models::{Person, PersonUpdate};
use super::params::{flatten_search_items, ListParams, SearchParams};

pub struct PersonManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> PersonManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    pub async fn create(&self, person: &Person) -> ApiResult<Value> {
        info!("Creating person");
        let request = ApiRequest::post(ApiVersion::V2, "/persons").json(Value::Object(person.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn get(
        &self,
        person_id: i64,
        include_fields: Option<&[String]>,
        custom_fields: Option<&[String]>,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(ApiVersion::V2, format!("/persons/{}", person_id))
            .query_list("include_fields", include_fields)
            .query_list("custom_fields", custom_fields);
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update(&self, person_id: i64, update: &PersonUpdate) -> ApiResult<Value> {
        info!("Updating person {}", person_id);
        let request = ApiRequest::patch(ApiVersion::V2, format!("/persons/{}", person_id))
            .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete(&self, person_id: i64) -> ApiResult<Value> {
        info!("Deleting person {}", person_id);
        let request = ApiRequest::delete(ApiVersion::V2, format!("/persons/{}", person_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/persons"));
        let page = Page::from_response(&self.api.request(request).await?);
        info!("Listed {} persons", page.items.len());
        Ok(page)
    }

    pub async fn search(&self, params: &SearchParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/persons/search"));
        let mut page = Page::from_response(&self.api.request(request).await?);
        page.items = flatten_search_items(page.items);
        info!("Found {} persons", page.items.len());
        Ok(page)
    }
}
