//! MCP Tool definitions and handlers
//!
//! Each CRM operation follows the same pipeline: normalize the string inputs,
//! convert and validate them, build the entity model, call the API, and wrap
//! the outcome in the response envelope.

mod activities;
mod args;
mod deals;
mod item_search;
mod leads;
mod organizations;
mod persons;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{FeatureError, McpError};
use crate::features::{builtin_metadata, ids, FeatureRegistry};
use crate::mcp::response::{ToolError, ToolResponse};
use crate::mcp::types::{CallToolResult, Tool};
use crate::pipedrive::{Page, PipedriveApi};

/// Tool handler
pub struct ToolHandler {
    api: Arc<dyn PipedriveApi>,
    registry: FeatureRegistry,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(api: Arc<dyn PipedriveApi>, registry: FeatureRegistry) -> Self {
        Self { api, registry }
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// List the tools of enabled features
    pub fn list_tools(&self) -> Vec<Tool> {
        catalogue()
            .into_iter()
            .filter(|(feature_id, _)| self.registry.is_feature_enabled(feature_id))
            .flat_map(|(_, tools)| tools)
            .collect()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let Some(feature_id) = self.registry.feature_for_tool(name) else {
            return CallToolResult::error(format!("Unknown tool: {}", name));
        };

        if !self.registry.is_feature_enabled(feature_id) {
            warn!("Refusing call to {}: feature '{}' is disabled", name, feature_id);
            let refusal = ToolError::from(FeatureError::Disabled {
                feature: feature_id.to_string(),
            });
            return ToolResponse::from(refusal).into_call_result();
        }

        debug!("Calling tool {}", name);
        let result = match name {
            // Activities
            "create_activity_in_pipedrive" => self.handle_create_activity(args).await,
            "get_activity_from_pipedrive" => self.handle_get_activity(args).await,
            "update_activity_in_pipedrive" => self.handle_update_activity(args).await,
            "delete_activity_from_pipedrive" => self.handle_delete_activity(args).await,
            "list_activities_from_pipedrive" => self.handle_list_activities(args).await,
            "get_activity_types_from_pipedrive" => self.handle_get_activity_types().await,
            "create_activity_type_in_pipedrive" => self.handle_create_activity_type(args).await,

            // Deals
            "create_deal_in_pipedrive" => self.handle_create_deal(args).await,
            "get_deal_from_pipedrive" => self.handle_get_deal(args).await,
            "update_deal_in_pipedrive" => self.handle_update_deal(args).await,
            "delete_deal_from_pipedrive" => self.handle_delete_deal(args).await,
            "list_deals_from_pipedrive" => self.handle_list_deals(args).await,
            "search_deals_in_pipedrive" => self.handle_search_deals(args).await,
            "add_product_to_deal_in_pipedrive" => self.handle_add_product_to_deal(args).await,
            "update_product_in_deal_in_pipedrive" => self.handle_update_product_in_deal(args).await,
            "delete_product_from_deal_in_pipedrive" => self.handle_delete_product_from_deal(args).await,

            // Leads
            "create_lead_in_pipedrive" => self.handle_create_lead(args).await,
            "get_lead_from_pipedrive" => self.handle_get_lead(args).await,
            "update_lead_in_pipedrive" => self.handle_update_lead(args).await,
            "delete_lead_from_pipedrive" => self.handle_delete_lead(args).await,
            "list_leads_from_pipedrive" => self.handle_list_leads(args).await,
            "search_leads_in_pipedrive" => self.handle_search_leads(args).await,
            "get_lead_labels_from_pipedrive" => self.handle_get_lead_labels().await,
            "get_lead_sources_from_pipedrive" => self.handle_get_lead_sources().await,

            // Organizations
            "create_organization_in_pipedrive" => self.handle_create_organization(args).await,
            "get_organization_from_pipedrive" => self.handle_get_organization(args).await,
            "update_organization_in_pipedrive" => self.handle_update_organization(args).await,
            "delete_organization_from_pipedrive" => self.handle_delete_organization(args).await,
            "list_organizations_from_pipedrive" => self.handle_list_organizations(args).await,
            "search_organizations_in_pipedrive" => self.handle_search_organizations(args).await,
            "add_follower_to_organization_in_pipedrive" => self.handle_add_follower(args).await,
            "delete_follower_from_organization_in_pipedrive" => self.handle_delete_follower(args).await,

            // Persons
            "create_person_in_pipedrive" => self.handle_create_person(args).await,
            "get_person_from_pipedrive" => self.handle_get_person(args).await,
            "update_person_in_pipedrive" => self.handle_update_person(args).await,
            "delete_person_from_pipedrive" => self.handle_delete_person(args).await,
            "list_persons_from_pipedrive" => self.handle_list_persons(args).await,
            "search_persons_in_pipedrive" => self.handle_search_persons(args).await,

            // Item search
            "search_items_in_pipedrive" => self.handle_search_items(args).await,
            "search_item_field_in_pipedrive" => self.handle_search_item_field(args).await,

            _ => return CallToolResult::error(format!("Unknown tool: {}", name)),
        };

        if let Err(e) = &result {
            warn!("Tool {} failed: {}", name, e);
        }
        ToolResponse::from(result).into_call_result()
    }

    fn api(&self) -> &dyn PipedriveApi {
        self.api.as_ref()
    }
}

/// Registry with every built-in feature and its tools registered, none enabled
pub fn feature_registry() -> FeatureRegistry {
    let mut registry = FeatureRegistry::new();
    for (feature_id, tools) in catalogue() {
        if let Some(metadata) = builtin_metadata(feature_id) {
            registry.register_feature(feature_id, metadata);
        }
        for tool in tools {
            if let Err(e) = registry.register_tool(feature_id, &tool.name) {
                warn!("Skipping tool {}: {}", tool.name, e);
            }
        }
    }
    registry
}

/// Tool definitions grouped by feature
fn catalogue() -> Vec<(&'static str, Vec<Tool>)> {
    vec![
        (ids::ACTIVITIES, activities::definitions()),
        (ids::DEALS, deals::definitions()),
        (ids::LEADS, leads::definitions()),
        (ids::ORGANIZATIONS, organizations::definitions()),
        (ids::PERSONS, persons::definitions()),
        (ids::ITEM_SEARCH, item_search::definitions()),
    ]
}

/// Deserialize tool arguments; a missing object counts as empty
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| {
        McpError::InvalidArguments {
            message: e.to_string(),
        }
        .into()
    })
}

/// `{items, next_cursor}` payload for list and search tools
fn page_data(page: Page) -> Value {
    json!({
        "items": page.items,
        "next_cursor": page.next_cursor,
    })
}

/// Payload returned by every delete tool
fn deleted(id: impl Into<Value>) -> Value {
    json!({ "id": id.into(), "success": true })
}

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names_are_unique() {
        let registry = feature_registry();
        assert_eq!(registry.tool_count(None), 40);
        assert_eq!(registry.tool_count(Some(ids::ACTIVITIES)), 7);
        assert_eq!(registry.tool_count(Some(ids::DEALS)), 9);
        assert_eq!(registry.tool_count(Some(ids::LEADS)), 8);
        assert_eq!(registry.tool_count(Some(ids::ORGANIZATIONS)), 8);
        assert_eq!(registry.tool_count(Some(ids::PERSONS)), 6);
        assert_eq!(registry.tool_count(Some(ids::ITEM_SEARCH)), 2);
    }

    #[test]
    fn test_schemas_are_objects() {
        for (_, tools) in catalogue() {
            for tool in tools {
                assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
                assert!(tool.description.is_some());
            }
        }
    }

    #[test]
    fn test_parse_args_null_is_empty() {
        #[derive(serde::Deserialize)]
        struct Args {
            #[serde(default)]
            name: String,
        }
        let args: Args = parse_args(Value::Null).unwrap();
        assert!(args.name.is_empty());
    }

    #[test]
    fn test_deleted_payload() {
        assert_eq!(deleted(5), json!({"id": 5, "success": true}));
    }
}
