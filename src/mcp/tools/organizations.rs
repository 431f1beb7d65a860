//! Organization and follower tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{list_schema, optional_id, required_id, search_schema, ListArgs, SearchArgs};
use super::{deleted, page_data, parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::models::{Organization, OrganizationFollower, OrganizationUpdate};
use crate::pipedrive::utils::{convert_id_string, convert_integer_string, normalize_optional, safe_split_to_list};
use crate::pipedrive::OrganizationManager;

const SEARCH_FIELDS: &[&str] = &["address", "custom_fields", "notes", "name"];

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_create_organization(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            name: String,
            owner_id_str: Option<String>,
            address: Option<String>,
            visible_to_str: Option<String>,
            label_ids_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let label_ids = safe_split_to_list(args.label_ids_str.as_deref())
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| convert_id_string(Some(raw.as_str()), "label_ids").transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let organization = Organization {
            owner_id: optional_id(args.owner_id_str.as_deref(), "owner_id")?,
            address: normalize_optional(args.address),
            visible_to: convert_integer_string(args.visible_to_str.as_deref(), "visible_to")?,
            label_ids,
            ..Organization::new(args.name)
        }
        .validate()?;

        Ok(OrganizationManager::new(self.api()).create(&organization).await?)
    }

    pub(super) async fn handle_get_organization(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            include_fields_str: Option<String>,
            custom_fields_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let organization_id = required_id(&args.id_str, "organization_id")?;
        let include_fields = safe_split_to_list(args.include_fields_str.as_deref());
        let custom_fields = safe_split_to_list(args.custom_fields_str.as_deref());

        Ok(OrganizationManager::new(self.api())
            .get(organization_id, include_fields.as_deref(), custom_fields.as_deref())
            .await?)
    }

    pub(super) async fn handle_update_organization(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            name: Option<String>,
            owner_id_str: Option<String>,
            address: Option<String>,
            visible_to_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let organization_id = required_id(&args.id_str, "organization_id")?;

        let update = OrganizationUpdate {
            name: normalize_optional(args.name),
            owner_id: optional_id(args.owner_id_str.as_deref(), "owner_id")?,
            address: normalize_optional(args.address),
            visible_to: convert_integer_string(args.visible_to_str.as_deref(), "visible_to")?,
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating an organization".to_string(),
            ));
        }

        Ok(OrganizationManager::new(self.api())
            .update(organization_id, &update)
            .await?)
    }

    pub(super) async fn handle_delete_organization(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
        }

        let args: Args = parse_args(args)?;
        let organization_id = required_id(&args.id_str, "organization_id")?;
        OrganizationManager::new(self.api()).delete(organization_id).await?;
        Ok(deleted(organization_id))
    }

    pub(super) async fn handle_list_organizations(&self, args: Value) -> ToolResult {
        let list: ListArgs = parse_args(args)?;
        let page = OrganizationManager::new(self.api())
            .list(&list.to_params()?)
            .await?;
        Ok(page_data(page))
    }

    pub(super) async fn handle_search_organizations(&self, args: Value) -> ToolResult {
        let search: SearchArgs = parse_args(args)?;
        let page = OrganizationManager::new(self.api())
            .search(&search.to_params(SEARCH_FIELDS)?)
            .await?;
        Ok(page_data(page))
    }

    // ==================== Followers ====================

    pub(super) async fn handle_add_follower(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            #[serde(default)]
            user_id_str: String,
        }

        let args: Args = parse_args(args)?;
        let organization_id = required_id(&args.id_str, "organization_id")?;
        let follower = OrganizationFollower::new(required_id(&args.user_id_str, "user_id")?)?;

        let data = OrganizationManager::new(self.api())
            .add_follower(organization_id, &follower)
            .await?;
        Ok(serde_json::to_value(OrganizationFollower::from_api_value(&data))?)
    }

    pub(super) async fn handle_delete_follower(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            #[serde(default)]
            follower_id_str: String,
        }

        let args: Args = parse_args(args)?;
        let organization_id = required_id(&args.id_str, "organization_id")?;
        let follower_id = required_id(&args.follower_id_str, "follower_id")?;

        OrganizationManager::new(self.api())
            .delete_follower(organization_id, follower_id)
            .await?;
        Ok(json!({
            "id": follower_id,
            "organization_id": organization_id,
            "success": true,
        }))
    }
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        tool_def(
            "create_organization_in_pipedrive",
            "Create a new organization in Pipedrive",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the organization"
                    },
                    "owner_id_str": {
                        "type": "string",
                        "description": "ID of the user who owns the organization"
                    },
                    "address": {
                        "type": "string",
                        "description": "Full address of the organization"
                    },
                    "visible_to_str": {
                        "type": "string",
                        "description": "Visibility group (1, 2, 3 or 4)"
                    },
                    "label_ids_str": {
                        "type": "string",
                        "description": "Comma-separated list of label IDs"
                    }
                },
                "required": ["name"]
            }),
        ),
        tool_def(
            "get_organization_from_pipedrive",
            "Get the details of an organization by its ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the organization"
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
            "update_organization_in_pipedrive",
            "Update an existing organization. At least one field besides the ID must be provided.",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the organization to update"
                    },
                    "name": {
                        "type": "string",
                        "description": "New name of the organization"
                    },
                    "owner_id_str": {
                        "type": "string",
                        "description": "ID of the new owner"
                    },
                    "address": {
                        "type": "string",
                        "description": "New address"
                    },
                    "visible_to_str": {
                        "type": "string",
                        "description": "Visibility group (1, 2, 3 or 4)"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "delete_organization_from_pipedrive",
            "Delete an organization by its ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the organization to delete"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "list_organizations_from_pipedrive",
            "List organizations with optional filtering, sorting and cursor pagination",
            list_schema(json!({})),
        ),
        tool_def(
            "search_organizations_in_pipedrive",
            "Search organizations by name, address, notes or custom fields",
            search_schema(
                "Comma-separated list of fields to search in (name, address, notes, custom_fields)",
                json!({}),
            ),
        ),
        tool_def(
            "add_follower_to_organization_in_pipedrive",
            "Add a user as a follower of an organization",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the organization"
                    },
                    "user_id_str": {
                        "type": "string",
                        "description": "The ID of the user to add as follower"
                    }
                },
                "required": ["id_str", "user_id_str"]
            }),
        ),
        tool_def(
            "delete_follower_from_organization_in_pipedrive",
            "Remove a follower from an organization",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the organization"
                    },
                    "follower_id_str": {
                        "type": "string",
                        "description": "The ID of the follower (user) to remove"
                    }
                },
                "required": ["id_str", "follower_id_str"]
            }),
        ),
    ]
}
