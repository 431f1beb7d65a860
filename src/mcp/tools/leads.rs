//! Lead tools
//!
//! Leads are addressed by UUID and their CRUD endpoints live on the v1 API,
//! so listing uses offset paging instead of cursors.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::args::{optional_flag, optional_id, required_uuid, search_schema, SearchArgs};
use super::{page_data, parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::leads::{LeadListParams, LeadPage, ARCHIVED_STATUSES};
use crate::pipedrive::models::{Lead, LeadLabel, LeadUpdate};
use crate::pipedrive::utils::{
    convert_integer_string, convert_number_string, normalize_optional, parse_limit, safe_split_to_list,
    validate_choice, validate_date_string,
};
use crate::pipedrive::LeadManager;

const SEARCH_FIELDS: &[&str] = &["custom_fields", "notes", "title"];

/// Optional lead fields shared by the create and update tools
#[derive(Debug, Default, Deserialize)]
struct LeadFields {
    value: Option<String>,
    currency: Option<String>,
    person_id_str: Option<String>,
    organization_id_str: Option<String>,
    owner_id_str: Option<String>,
    label_ids_str: Option<String>,
    expected_close_date: Option<String>,
    visible_to_str: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    is_archived: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    was_seen: Option<bool>,
}

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_create_lead(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            title: String,
            source_name: Option<String>,
            #[serde(flatten)]
            fields: LeadFields,
        }

        let args: Args = parse_args(args)?;
        let fields = args.fields;
        let defaults = Lead::new(args.title);

        let lead = Lead {
            amount: convert_number_string(fields.value.as_deref(), "value")?,
            currency: normalize_optional(fields.currency).unwrap_or(defaults.currency.clone()),
            person_id: optional_id(fields.person_id_str.as_deref(), "person_id")?,
            organization_id: optional_id(fields.organization_id_str.as_deref(), "organization_id")?,
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            label_ids: safe_split_to_list(fields.label_ids_str.as_deref()),
            expected_close_date: validate_date_string(fields.expected_close_date.as_deref(), "expected_close_date")?,
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
            source_name: normalize_optional(args.source_name),
            is_archived: fields.is_archived,
            was_seen: fields.was_seen,
            ..defaults
        }
        .validate()?;

        Ok(LeadManager::new(self.api()).create(&lead).await?)
    }

    pub(super) async fn handle_get_lead(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            lead_id: String,
        }

        let args: Args = parse_args(args)?;
        let lead_id = required_uuid(&args.lead_id, "lead_id")?;
        Ok(LeadManager::new(self.api()).get(&lead_id).await?)
    }

    pub(super) async fn handle_update_lead(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            lead_id: String,
            title: Option<String>,
            #[serde(flatten)]
            fields: LeadFields,
        }

        let args: Args = parse_args(args)?;
        let lead_id = required_uuid(&args.lead_id, "lead_id")?;
        let fields = args.fields;

        let mut update = LeadUpdate {
            title: normalize_optional(args.title),
            amount: convert_number_string(fields.value.as_deref(), "value")?,
            currency: normalize_optional(fields.currency),
            person_id: optional_id(fields.person_id_str.as_deref(), "person_id")?,
            organization_id: optional_id(fields.organization_id_str.as_deref(), "organization_id")?,
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            label_ids: safe_split_to_list(fields.label_ids_str.as_deref()),
            expected_close_date: validate_date_string(fields.expected_close_date.as_deref(), "expected_close_date")?,
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
            is_archived: fields.is_archived,
            was_seen: fields.was_seen,
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating a lead".to_string(),
            ));
        }

        let manager = LeadManager::new(self.api());
        if update.needs_current_amount() {
            let current = Lead::from_api_value(&manager.get(&lead_id).await?);
            if current.amount.is_none() {
                debug!("Lead {} has no amount; skipping currency change", lead_id);
            } else {
                debug!("Reusing current amount of lead {} for currency change", lead_id);
            }
            update = update.with_current_amount(current.amount);
            if update.is_empty() {
                return Err(ToolError::Validation(
                    "At least one field must be provided for updating a lead".to_string(),
                ));
            }
        }

        Ok(manager.update(&lead_id, &update).await?)
    }

    pub(super) async fn handle_delete_lead(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            lead_id: String,
        }

        let args: Args = parse_args(args)?;
        let lead_id = required_uuid(&args.lead_id, "lead_id")?;
        LeadManager::new(self.api()).delete(&lead_id).await?;
        Ok(json!({ "id": lead_id, "success": true }))
    }

    pub(super) async fn handle_list_leads(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            limit_str: Option<String>,
            start_str: Option<String>,
            archived_status: Option<String>,
            owner_id_str: Option<String>,
            person_id_str: Option<String>,
            organization_id_str: Option<String>,
            filter_id_str: Option<String>,
            sort: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let archived_status = normalize_optional(args.archived_status);
        if let Some(status) = &archived_status {
            validate_choice(status, "archived_status", ARCHIVED_STATUSES)?;
        }

        let start = convert_integer_string(args.start_str.as_deref(), "start")?;
        if matches!(start, Some(s) if s < 0) {
            return Err(ToolError::Validation("start must be a non-negative integer".to_string()));
        }

        let params = LeadListParams {
            limit: parse_limit(args.limit_str.as_deref()),
            start,
            archived_status,
            owner_id: optional_id(args.owner_id_str.as_deref(), "owner_id")?,
            person_id: optional_id(args.person_id_str.as_deref(), "person_id")?,
            organization_id: optional_id(args.organization_id_str.as_deref(), "organization_id")?,
            filter_id: optional_id(args.filter_id_str.as_deref(), "filter_id")?,
            sort: normalize_optional(args.sort),
        };

        let page = LeadManager::new(self.api()).list(&params).await?;
        Ok(lead_page_data(page))
    }

    pub(super) async fn handle_search_leads(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            search: SearchArgs,
            person_id_str: Option<String>,
            organization_id_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let params = args
            .search
            .to_params(SEARCH_FIELDS)?
            .filter("person_id", optional_id(args.person_id_str.as_deref(), "person_id")?)
            .filter(
                "organization_id",
                optional_id(args.organization_id_str.as_deref(), "organization_id")?,
            );

        let page = LeadManager::new(self.api()).search(&params).await?;
        Ok(page_data(page))
    }

    pub(super) async fn handle_get_lead_labels(&self) -> ToolResult {
        let labels: Vec<LeadLabel> = LeadManager::new(self.api())
            .labels()
            .await?
            .iter()
            .map(LeadLabel::from_api_value)
            .collect();

        Ok(json!({ "items": serde_json::to_value(labels)? }))
    }

    pub(super) async fn handle_get_lead_sources(&self) -> ToolResult {
        let sources = LeadManager::new(self.api()).sources().await?;
        Ok(json!({ "items": sources }))
    }
}

/// Offset-paged listing keeps the v1 pagination details
fn lead_page_data(page: LeadPage) -> Value {
    json!({
        "items": page.items,
        "total_count": page.total_count,
        "next_start": page.next_start,
        "more_items": page.more_items,
    })
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        tool_def(
            "create_lead_in_pipedrive",
            "Create a new lead. A lead must be linked to a person, an organization, or both.",
            lead_schema(true),
        ),
        tool_def(
            "get_lead_from_pipedrive",
            "Get the details of a lead by its UUID",
            lead_id_schema("The UUID of the lead"),
        ),
        tool_def(
            "update_lead_in_pipedrive",
            "Update an existing lead. At least one field besides the ID must be provided.",
            lead_schema(false),
        ),
        tool_def(
            "delete_lead_from_pipedrive",
            "Delete a lead by its UUID",
            lead_id_schema("The UUID of the lead to delete"),
        ),
        tool_def(
            "list_leads_from_pipedrive",
            "List leads with optional filtering and offset pagination",
            json!({
                "type": "object",
                "properties": {
                    "limit_str": {
                        "type": "string",
                        "description": "Maximum number of results to return (default 100, max 500)"
                    },
                    "start_str": {
                        "type": "string",
                        "description": "Pagination offset (use next_start from the previous page)"
                    },
                    "archived_status": {
                        "type": "string",
                        "enum": ARCHIVED_STATUSES,
                        "description": "Filter by archived state"
                    },
                    "owner_id_str": {
                        "type": "string",
                        "description": "Filter by owner user ID"
                    },
                    "person_id_str": {
                        "type": "string",
                        "description": "Filter by linked person ID"
                    },
                    "organization_id_str": {
                        "type": "string",
                        "description": "Filter by linked organization ID"
                    },
                    "filter_id_str": {
                        "type": "string",
                        "description": "ID of the filter to apply"
                    },
                    "sort": {
                        "type": "string",
                        "description": "Field and direction to sort by (e.g. 'add_time DESC')"
                    }
                },
                "required": []
            }),
        ),
        tool_def(
            "search_leads_in_pipedrive",
            "Search leads by title, notes or custom fields",
            search_schema(
                "Comma-separated list of fields to search in (title, notes, custom_fields)",
                json!({
                    "person_id_str": {
                        "type": "string",
                        "description": "Only leads linked to this person ID"
                    },
                    "organization_id_str": {
                        "type": "string",
                        "description": "Only leads linked to this organization ID"
                    }
                }),
            ),
        ),
        tool_def(
            "get_lead_labels_from_pipedrive",
            "List all lead labels",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        tool_def(
            "get_lead_sources_from_pipedrive",
            "List all lead sources",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
    ]
}

fn lead_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "lead_id": {
                "type": "string",
                "description": description
            }
        },
        "required": ["lead_id"]
    })
}

fn lead_schema(create: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Title of the lead"
            },
            "value": {
                "type": "string",
                "description": "Potential value of the lead (non-negative number)"
            },
            "currency": {
                "type": "string",
                "description": "3-letter currency code of the value (default USD)"
            },
            "person_id_str": {
                "type": "string",
                "description": "ID of the linked person"
            },
            "organization_id_str": {
                "type": "string",
                "description": "ID of the linked organization"
            },
            "owner_id_str": {
                "type": "string",
                "description": "ID of the user who owns the lead"
            },
            "label_ids_str": {
                "type": "string",
                "description": "Comma-separated list of lead label UUIDs"
            },
            "expected_close_date": {
                "type": "string",
                "description": "Expected close date in YYYY-MM-DD format"
            },
            "visible_to_str": {
                "type": "string",
                "description": "Visibility group (1, 3, 5 or 7)"
            },
            "is_archived": {
                "type": "boolean",
                "description": "Whether the lead is archived"
            },
            "was_seen": {
                "type": "boolean",
                "description": "Whether the lead was seen"
            }
        },
        "required": ["title"]
    });

    let properties = &mut schema["properties"];
    if create {
        properties["source_name"] = json!({
            "type": "string",
            "description": "Name of the source the lead came from"
        });
    } else {
        properties["lead_id"] = json!({
            "type": "string",
            "description": "The UUID of the lead to update"
        });
        schema["required"] = json!(["lead_id"]);
    }
    schema
}
