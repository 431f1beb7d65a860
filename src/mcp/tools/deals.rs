//! Deal and deal product tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{list_schema, optional_flag, optional_id, required_id, search_schema, ListArgs, SearchArgs};
use super::{deleted, page_data, parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::models::deal::DEAL_STATUSES;
use crate::pipedrive::models::deal_product::{BILLING_FREQUENCIES, DISCOUNT_TYPES, TAX_METHODS};
use crate::pipedrive::models::{Deal, DealProduct, DealProductUpdate, DealUpdate};
use crate::pipedrive::utils::{
    convert_integer_string, convert_number_string, normalize_optional, safe_split_to_list, validate_choice,
    validate_date_string,
};
use crate::pipedrive::DealManager;

const SEARCH_FIELDS: &[&str] = &["custom_fields", "notes", "title"];
const LIST_STATUSES: &[&str] = &["open", "won", "lost", "deleted"];

/// Optional deal fields shared by the create and update tools
#[derive(Debug, Default, Deserialize)]
struct DealFields {
    value: Option<String>,
    person_id_str: Option<String>,
    org_id_str: Option<String>,
    owner_id_str: Option<String>,
    stage_id_str: Option<String>,
    pipeline_id_str: Option<String>,
    expected_close_date: Option<String>,
    visible_to_str: Option<String>,
    probability_str: Option<String>,
    lost_reason: Option<String>,
}

/// Optional deal product fields shared by the add and update tools
#[derive(Debug, Default, Deserialize)]
struct ProductFields {
    tax: Option<String>,
    comments: Option<String>,
    discount: Option<String>,
    discount_type: Option<String>,
    tax_method: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    is_enabled: Option<bool>,
    product_variation_id_str: Option<String>,
    billing_frequency: Option<String>,
    billing_frequency_cycles: Option<String>,
    billing_start_date: Option<String>,
}

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_create_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            title: String,
            currency: Option<String>,
            status: Option<String>,
            #[serde(flatten)]
            fields: DealFields,
        }

        let args: Args = parse_args(args)?;
        let fields = args.fields;
        let defaults = Deal::new(args.title);

        let deal = Deal {
            value: convert_number_string(fields.value.as_deref(), "value")?,
            person_id: optional_id(fields.person_id_str.as_deref(), "person_id")?,
            org_id: optional_id(fields.org_id_str.as_deref(), "org_id")?,
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            stage_id: optional_id(fields.stage_id_str.as_deref(), "stage_id")?,
            pipeline_id: optional_id(fields.pipeline_id_str.as_deref(), "pipeline_id")?,
            expected_close_date: validate_date_string(fields.expected_close_date.as_deref(), "expected_close_date")?,
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
            probability: convert_integer_string(fields.probability_str.as_deref(), "probability")?,
            lost_reason: normalize_optional(fields.lost_reason),
            currency: normalize_optional(args.currency).unwrap_or(defaults.currency.clone()),
            status: normalize_optional(args.status).unwrap_or(defaults.status.clone()),
            ..defaults
        }
        .validate()?;

        Ok(DealManager::new(self.api()).create(&deal).await?)
    }

    pub(super) async fn handle_get_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            include_fields_str: Option<String>,
            custom_fields_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        let include_fields = safe_split_to_list(args.include_fields_str.as_deref());
        let custom_fields = safe_split_to_list(args.custom_fields_str.as_deref());

        Ok(DealManager::new(self.api())
            .get(deal_id, include_fields.as_deref(), custom_fields.as_deref())
            .await?)
    }

    pub(super) async fn handle_update_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            title: Option<String>,
            currency: Option<String>,
            status: Option<String>,
            #[serde(flatten)]
            fields: DealFields,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        let fields = args.fields;

        let update = DealUpdate {
            title: normalize_optional(args.title),
            value: convert_number_string(fields.value.as_deref(), "value")?,
            currency: normalize_optional(args.currency),
            person_id: optional_id(fields.person_id_str.as_deref(), "person_id")?,
            org_id: optional_id(fields.org_id_str.as_deref(), "org_id")?,
            status: normalize_optional(args.status),
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            stage_id: optional_id(fields.stage_id_str.as_deref(), "stage_id")?,
            pipeline_id: optional_id(fields.pipeline_id_str.as_deref(), "pipeline_id")?,
            expected_close_date: validate_date_string(fields.expected_close_date.as_deref(), "expected_close_date")?,
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
            probability: convert_integer_string(fields.probability_str.as_deref(), "probability")?,
            lost_reason: normalize_optional(fields.lost_reason),
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating a deal".to_string(),
            ));
        }

        Ok(DealManager::new(self.api()).update(deal_id, &update).await?)
    }

    pub(super) async fn handle_delete_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        DealManager::new(self.api()).delete(deal_id).await?;
        Ok(deleted(deal_id))
    }

    pub(super) async fn handle_list_deals(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            list: ListArgs,
            person_id_str: Option<String>,
            org_id_str: Option<String>,
            pipeline_id_str: Option<String>,
            stage_id_str: Option<String>,
            status: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let status = normalize_optional(args.status);
        if let Some(status) = &status {
            validate_choice(status, "status", LIST_STATUSES)?;
        }

        let params = args
            .list
            .to_params()?
            .filter("person_id", optional_id(args.person_id_str.as_deref(), "person_id")?)
            .filter("org_id", optional_id(args.org_id_str.as_deref(), "org_id")?)
            .filter("pipeline_id", optional_id(args.pipeline_id_str.as_deref(), "pipeline_id")?)
            .filter("stage_id", optional_id(args.stage_id_str.as_deref(), "stage_id")?)
            .filter("status", status);

        let page = DealManager::new(self.api()).list(&params).await?;
        Ok(page_data(page))
    }

    pub(super) async fn handle_search_deals(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            search: SearchArgs,
            person_id_str: Option<String>,
            organization_id_str: Option<String>,
            status: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let status = normalize_optional(args.status);
        if let Some(status) = &status {
            validate_choice(status, "status", DEAL_STATUSES)?;
        }

        let params = args
            .search
            .to_params(SEARCH_FIELDS)?
            .filter("person_id", optional_id(args.person_id_str.as_deref(), "person_id")?)
            .filter(
                "organization_id",
                optional_id(args.organization_id_str.as_deref(), "organization_id")?,
            )
            .filter("status", status);

        let page = DealManager::new(self.api()).search(&params).await?;
        Ok(page_data(page))
    }

    // ==================== Products ====================

    pub(super) async fn handle_add_product_to_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            #[serde(default)]
            product_id_str: String,
            #[serde(default)]
            item_price: String,
            #[serde(default)]
            quantity: String,
            #[serde(flatten)]
            fields: ProductFields,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        let product_id = required_id(&args.product_id_str, "product_id")?;
        let item_price = required_number(&args.item_price, "item_price")?;
        let quantity = required_integer(&args.quantity, "quantity")?;
        let fields = args.fields;
        let defaults = DealProduct::new(product_id, item_price, quantity);

        let product = DealProduct {
            tax: convert_number_string(fields.tax.as_deref(), "tax")?.unwrap_or(defaults.tax),
            discount: convert_number_string(fields.discount.as_deref(), "discount")?.unwrap_or(defaults.discount),
            comments: normalize_optional(fields.comments),
            discount_type: normalize_optional(fields.discount_type).unwrap_or(defaults.discount_type.clone()),
            tax_method: normalize_optional(fields.tax_method).unwrap_or(defaults.tax_method.clone()),
            is_enabled: fields.is_enabled.unwrap_or(defaults.is_enabled),
            product_variation_id: optional_id(fields.product_variation_id_str.as_deref(), "product_variation_id")?,
            billing_frequency: normalize_optional(fields.billing_frequency)
                .unwrap_or(defaults.billing_frequency.clone()),
            billing_frequency_cycles: convert_integer_string(
                fields.billing_frequency_cycles.as_deref(),
                "billing_frequency_cycles",
            )?,
            billing_start_date: validate_date_string(fields.billing_start_date.as_deref(), "billing_start_date")?,
            ..defaults
        }
        .validate()?;

        Ok(DealManager::new(self.api()).add_product(deal_id, &product).await?)
    }

    pub(super) async fn handle_update_product_in_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            #[serde(default)]
            product_attachment_id_str: String,
            item_price: Option<String>,
            quantity: Option<String>,
            #[serde(flatten)]
            fields: ProductFields,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        let attachment_id = required_id(&args.product_attachment_id_str, "product_attachment_id")?;
        let fields = args.fields;

        let update = DealProductUpdate {
            item_price: convert_number_string(args.item_price.as_deref(), "item_price")?,
            quantity: convert_integer_string(args.quantity.as_deref(), "quantity")?,
            discount: convert_number_string(fields.discount.as_deref(), "discount")?,
            tax: convert_number_string(fields.tax.as_deref(), "tax")?,
            comments: normalize_optional(fields.comments),
            discount_type: normalize_optional(fields.discount_type),
            tax_method: normalize_optional(fields.tax_method),
            is_enabled: fields.is_enabled,
            product_variation_id: optional_id(fields.product_variation_id_str.as_deref(), "product_variation_id")?,
            billing_frequency: normalize_optional(fields.billing_frequency),
            billing_frequency_cycles: convert_integer_string(
                fields.billing_frequency_cycles.as_deref(),
                "billing_frequency_cycles",
            )?,
            billing_start_date: validate_date_string(fields.billing_start_date.as_deref(), "billing_start_date")?,
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating a deal product".to_string(),
            ));
        }

        Ok(DealManager::new(self.api())
            .update_product(deal_id, attachment_id, &update)
            .await?)
    }

    pub(super) async fn handle_delete_product_from_deal(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            #[serde(default)]
            product_attachment_id_str: String,
        }

        let args: Args = parse_args(args)?;
        let deal_id = required_id(&args.id_str, "deal_id")?;
        let attachment_id = required_id(&args.product_attachment_id_str, "product_attachment_id")?;

        DealManager::new(self.api()).delete_product(deal_id, attachment_id).await?;
        Ok(json!({
            "id": attachment_id,
            "deal_id": deal_id,
            "success": true,
        }))
    }
}

fn required_number(value: &str, field: &str) -> Result<f64, ToolError> {
    convert_number_string(Some(value), field)?
        .ok_or_else(|| ToolError::Validation(format!("{} is required and cannot be empty", field)))
}

fn required_integer(value: &str, field: &str) -> Result<i64, ToolError> {
    convert_integer_string(Some(value), field)?
        .ok_or_else(|| ToolError::Validation(format!("{} is required and cannot be empty", field)))
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        tool_def(
            "create_deal_in_pipedrive",
            "Create a new deal in Pipedrive",
            deal_schema(true),
        ),
        tool_def(
            "get_deal_from_pipedrive",
            "Get the details of a deal by its ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the deal"
                    },
                    "include_fields_str": {
                        "type": "string",
                        "description": "Comma-separated list of additional fields to include"
                    },
                    "custom_fields_str": {
                        "type": "string",
                        "description": "Comma-separated list of custom fields to include"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "update_deal_in_pipedrive",
            "Update an existing deal. At least one field besides the ID must be provided.",
            deal_schema(false),
        ),
        tool_def(
            "delete_deal_from_pipedrive",
            "Delete a deal by its ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the deal to delete"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "list_deals_from_pipedrive",
            "List deals with optional filtering, sorting and cursor pagination",
            list_schema(json!({
                "person_id_str": {
                    "type": "string",
                    "description": "Filter by person ID"
                },
                "org_id_str": {
                    "type": "string",
                    "description": "Filter by organization ID"
                },
                "pipeline_id_str": {
                    "type": "string",
                    "description": "Filter by pipeline ID"
                },
                "stage_id_str": {
                    "type": "string",
                    "description": "Filter by stage ID"
                },
                "status": {
                    "type": "string",
                    "enum": LIST_STATUSES,
                    "description": "Filter by deal status"
                }
            })),
        ),
        tool_def(
            "search_deals_in_pipedrive",
            "Search deals by title, notes or custom fields",
            search_schema(
                "Comma-separated list of fields to search in (title, notes, custom_fields)",
                json!({
                    "person_id_str": {
                        "type": "string",
                        "description": "Only deals linked to this person ID"
                    },
                    "organization_id_str": {
                        "type": "string",
                        "description": "Only deals linked to this organization ID"
                    },
                    "status": {
                        "type": "string",
                        "enum": DEAL_STATUSES,
                        "description": "Only deals with this status"
                    }
                }),
            ),
        ),
        tool_def(
            "add_product_to_deal_in_pipedrive",
            "Attach a product to a deal",
            product_schema(true),
        ),
        tool_def(
            "update_product_in_deal_in_pipedrive",
            "Update a product attached to a deal. At least one field besides the IDs must be provided.",
            product_schema(false),
        ),
        tool_def(
            "delete_product_from_deal_in_pipedrive",
            "Remove a product attachment from a deal",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the deal"
                    },
                    "product_attachment_id_str": {
                        "type": "string",
                        "description": "The ID of the product attachment to delete"
                    }
                },
                "required": ["id_str", "product_attachment_id_str"]
            }),
        ),
    ]
}

fn deal_schema(create: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Title of the deal"
            },
            "value": {
                "type": "string",
                "description": "Monetary value of the deal (non-negative number)"
            },
            "currency": {
                "type": "string",
                "description": "3-letter currency code (default USD)"
            },
            "person_id_str": {
                "type": "string",
                "description": "ID of the person linked to the deal"
            },
            "org_id_str": {
                "type": "string",
                "description": "ID of the organization linked to the deal"
            },
            "status": {
                "type": "string",
                "enum": DEAL_STATUSES,
                "description": "Deal status (default open)"
            },
            "owner_id_str": {
                "type": "string",
                "description": "ID of the user who owns the deal"
            },
            "stage_id_str": {
                "type": "string",
                "description": "ID of the pipeline stage"
            },
            "pipeline_id_str": {
                "type": "string",
                "description": "ID of the pipeline"
            },
            "expected_close_date": {
                "type": "string",
                "description": "Expected close date in YYYY-MM-DD format"
            },
            "visible_to_str": {
                "type": "string",
                "description": "Visibility group of the deal"
            },
            "probability_str": {
                "type": "string",
                "description": "Success probability percentage (0-100)"
            },
            "lost_reason": {
                "type": "string",
                "description": "Reason the deal was lost (only with status lost)"
            }
        },
        "required": ["title"]
    });

    if !create {
        schema["properties"]["id_str"] = json!({
            "type": "string",
            "description": "The ID of the deal to update"
        });
        schema["required"] = json!(["id_str"]);
    }
    schema
}

fn product_schema(add: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "id_str": {
                "type": "string",
                "description": "The ID of the deal"
            },
            "item_price": {
                "type": "string",
                "description": "Price of the product (greater than zero)"
            },
            "quantity": {
                "type": "string",
                "description": "Quantity of the product (greater than zero)"
            },
            "tax": {
                "type": "string",
                "description": "Product tax value (default 0)"
            },
            "comments": {
                "type": "string",
                "description": "Additional comments about the product"
            },
            "discount": {
                "type": "string",
                "description": "Discount value (default 0)"
            },
            "discount_type": {
                "type": "string",
                "enum": DISCOUNT_TYPES,
                "description": "How the discount is applied (default percentage)"
            },
            "tax_method": {
                "type": "string",
                "enum": TAX_METHODS,
                "description": "Tax method (default inclusive)"
            },
            "is_enabled": {
                "type": "boolean",
                "description": "Whether the product is enabled on the deal"
            },
            "product_variation_id_str": {
                "type": "string",
                "description": "ID of the product variation"
            },
            "billing_frequency": {
                "type": "string",
                "enum": BILLING_FREQUENCIES,
                "description": "Billing frequency (default one-time)"
            },
            "billing_frequency_cycles": {
                "type": "string",
                "description": "Number of billing cycles (1-208; required for weekly, not allowed for one-time)"
            },
            "billing_start_date": {
                "type": "string",
                "description": "Billing start date in YYYY-MM-DD format"
            }
        },
        "required": ["id_str", "product_id_str", "item_price", "quantity"]
    });

    if add {
        schema["properties"]["product_id_str"] = json!({
            "type": "string",
            "description": "The ID of the product to add"
        });
    } else {
        schema["properties"]["product_attachment_id_str"] = json!({
            "type": "string",
            "description": "The ID of the product attachment on the deal"
        });
        schema["required"] = json!(["id_str", "product_attachment_id_str"]);
    }
    schema
}
