//! Deal and deal product endpoints (v2)

use serde_json::Value;
use tracing::info;

use super::client::{response_data, ApiRequest, ApiResult, ApiVersion, Page, PipedriveApi};
use super::models::{Deal, DealProduct, DealProductUpdate, DealUpdate};
use super::params::{flatten_search_items, ListParams, SearchParams};

pub struct DealManager<'a> {
    api: &'a dyn PipedriveApi,
}

impl<'a> DealManager<'a> {
    pub fn new(api: &'a dyn PipedriveApi) -> Self {
        Self { api }
    }

    pub async fn create(&self, deal: &Deal) -> ApiResult<Value> {
        info!("Creating deal '{}'", deal.title);
        let request = ApiRequest::post(ApiVersion::V2, "/deals").json(Value::Object(deal.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn get(
        &self,
        deal_id: i64,
        include_fields: Option<&[String]>,
        custom_fields: Option<&[String]>,
    ) -> ApiResult<Value> {
        let request = ApiRequest::get(ApiVersion::V2, format!("/deals/{}", deal_id))
            .query_list("include_fields", include_fields)
            .query_list("custom_fields", custom_fields);
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update(&self, deal_id: i64, update: &DealUpdate) -> ApiResult<Value> {
        info!("Updating deal {}", deal_id);
        let request = ApiRequest::patch(ApiVersion::V2, format!("/deals/{}", deal_id))
            .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete(&self, deal_id: i64) -> ApiResult<Value> {
        info!("Deleting deal {}", deal_id);
        let request = ApiRequest::delete(ApiVersion::V2, format!("/deals/{}", deal_id));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/deals"));
        let page = Page::from_response(&self.api.request(request).await?);
        info!("Listed {} deals", page.items.len());
        Ok(page)
    }

    pub async fn search(&self, params: &SearchParams) -> ApiResult<Page> {
        let request = params.apply(ApiRequest::get(ApiVersion::V2, "/deals/search"));
        let mut page = Page::from_response(&self.api.request(request).await?);
        page.items = flatten_search_items(page.items);
        info!("Found {} deals", page.items.len());
        Ok(page)
    }

    // ==================== Products ====================

    pub async fn add_product(&self, deal_id: i64, product: &DealProduct) -> ApiResult<Value> {
        info!("Adding product {} to deal {}", product.product_id, deal_id);
        let request = ApiRequest::post(ApiVersion::V2, format!("/deals/{}/products", deal_id))
            .json(Value::Object(product.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn update_product(
        &self,
        deal_id: i64,
        attachment_id: i64,
        update: &DealProductUpdate,
    ) -> ApiResult<Value> {
        info!("Updating product attachment {} on deal {}", attachment_id, deal_id);
        let request = ApiRequest::patch(
            ApiVersion::V2,
            format!("/deals/{}/products/{}", deal_id, attachment_id),
        )
        .json(Value::Object(update.to_api_payload()));
        Ok(response_data(self.api.request(request).await?))
    }

    pub async fn delete_product(&self, deal_id: i64, attachment_id: i64) -> ApiResult<Value> {
        info!("Removing product attachment {} from deal {}", attachment_id, deal_id);
        let request = ApiRequest::delete(
            ApiVersion::V2,
            format!("/deals/{}/products/{}", deal_id, attachment_id),
        );
        Ok(response_data(self.api.request(request).await?))
    }
}
