//! Cross-entity item search tools

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::args::{flag, validate_term};
use super::{parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::item_search::{
    FieldSearchParams, ItemSearchParams, FIELD_SEARCH_ENTITY_TYPES, MATCH_TYPES, SEARCH_FIELDS,
};
use crate::pipedrive::models::{FieldSearchResults, ItemSearchResults, SearchItemType};
use crate::pipedrive::utils::{normalize_optional, parse_limit, safe_split_to_list, validate_choice};
use crate::pipedrive::ItemSearchManager;

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_search_items(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            term: String,
            item_types_str: Option<String>,
            fields_str: Option<String>,
            #[serde(default, deserialize_with = "flag")]
            search_for_related_items: bool,
            #[serde(default, deserialize_with = "flag")]
            exact_match: bool,
            include_fields_str: Option<String>,
            limit_str: Option<String>,
            cursor: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let term = validate_term(&args.term, args.exact_match)?;

        let item_types = safe_split_to_list(args.item_types_str.as_deref());
        for item_type in item_types.iter().flatten() {
            item_type.parse::<SearchItemType>()?;
        }
        let fields = safe_split_to_list(args.fields_str.as_deref());
        for field in fields.iter().flatten() {
            validate_choice(field, "field", SEARCH_FIELDS)?;
        }

        let params = ItemSearchParams {
            item_types,
            fields,
            search_for_related_items: args.search_for_related_items,
            exact_match: args.exact_match,
            include_fields: safe_split_to_list(args.include_fields_str.as_deref()),
            limit: parse_limit(args.limit_str.as_deref()),
            cursor: normalize_optional(args.cursor),
            ..ItemSearchParams::new(term.clone())
        };

        let page = ItemSearchManager::new(self.api()).search(&params).await?;
        if page.items.is_empty() {
            info!("No items found for search term '{}'", term);
            return Ok(json!({
                "items": [],
                "count": 0,
                "message": format!("No items found matching '{}'", term),
            }));
        }

        match ItemSearchResults::from_api_items(&page.items, page.next_cursor.clone()) {
            Ok(results) => {
                info!(
                    "Found {} items matching '{}' (deals: {}, persons: {}, organizations: {})",
                    results.total_count,
                    term,
                    results.count_of(SearchItemType::Deal),
                    results.count_of(SearchItemType::Person),
                    results.count_of(SearchItemType::Organization)
                );
                Ok(serde_json::to_value(results)?)
            }
            Err(e) => {
                warn!("Could not read search results ({}); returning raw items", e);
                Ok(json!({
                    "items": page.items,
                    "count": page.items.len(),
                    "next_cursor": page.next_cursor,
                }))
            }
        }
    }

    pub(super) async fn handle_search_item_field(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            term: String,
            #[serde(default)]
            entity_type: String,
            #[serde(default)]
            field: String,
            #[serde(rename = "match")]
            match_type: Option<String>,
            limit_str: Option<String>,
            cursor: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let match_type = normalize_optional(args.match_type).unwrap_or_else(|| "exact".to_string());
        let term = validate_field_term(&args.term, &match_type)?;

        let entity_type = args.entity_type.trim();
        if entity_type.is_empty() {
            return Err(ToolError::Validation("Entity type cannot be empty".to_string()));
        }
        let field = args.field.trim();
        if field.is_empty() {
            return Err(ToolError::Validation("Field key cannot be empty".to_string()));
        }
        validate_choice(entity_type, "entity type", FIELD_SEARCH_ENTITY_TYPES)?;
        validate_choice(&match_type, "match type", MATCH_TYPES)?;

        let params = FieldSearchParams {
            term: term.clone(),
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            match_type,
            limit: parse_limit(args.limit_str.as_deref()),
            cursor: normalize_optional(args.cursor),
        };

        let page = ItemSearchManager::new(self.api()).search_field(&params).await?;
        if page.items.is_empty() {
            info!("No field values found for search term '{}'", term);
            return Ok(json!({
                "items": [],
                "count": 0,
                "message": format!("No values found for field '{}' matching '{}'", field, term),
            }));
        }

        let results = FieldSearchResults::from_api_items(&page.items, page.next_cursor);
        info!("Found {} values of field '{}' matching '{}'", results.items.len(), field, term);
        Ok(serde_json::to_value(results)?)
    }
}

/// Partial matching needs at least two characters
fn validate_field_term(term: &str, match_type: &str) -> Result<String, ToolError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ToolError::Validation("Search term cannot be empty".to_string()));
    }
    let length = term.chars().count();
    if match_type != "exact" && length < 2 {
        return Err(ToolError::Validation(format!(
            "Search term must be at least 2 characters for '{}' matching (current length: {})",
            match_type, length
        )));
    }
    Ok(term.to_string())
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    let item_types: Vec<&str> = SearchItemType::ALL.iter().map(SearchItemType::as_str).collect();

    vec![
        tool_def(
            "search_items_in_pipedrive",
            "Search across deals, persons, organizations, products, leads, files, mail attachments and projects",
            json!({
                "type": "object",
                "properties": {
                    "term": {
                        "type": "string",
                        "description": "Search term (at least 2 characters, or 1 with exact_match)"
                    },
                    "item_types_str": {
                        "type": "string",
                        "description": format!("Comma-separated list of item types to search ({})", item_types.join(", "))
                    },
                    "fields_str": {
                        "type": "string",
                        "description": format!("Comma-separated list of fields to search in ({})", SEARCH_FIELDS.join(", "))
                    },
                    "search_for_related_items": {
                        "type": "boolean",
                        "description": "Also return items related to the matches"
                    },
                    "exact_match": {
                        "type": "boolean",
                        "description": "Only return exact matches of the term"
                    },
                    "include_fields_str": {
                        "type": "string",
                        "description": "Comma-separated list of additional fields to include"
                    },
                    "limit_str": {
                        "type": "string",
                        "description": "Maximum number of results to return (default 100, max 500)"
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor for the next page"
                    }
                },
                "required": ["term"]
            }),
        ),
        tool_def(
            "search_item_field_in_pipedrive",
            "Search the values of one field of an entity type, e.g. for autocompletion",
            json!({
                "type": "object",
                "properties": {
                    "term": {
                        "type": "string",
                        "description": "Search term (at least 2 characters unless match is exact)"
                    },
                    "entity_type": {
                        "type": "string",
                        "enum": FIELD_SEARCH_ENTITY_TYPES,
                        "description": "Entity type whose field is searched"
                    },
                    "field": {
                        "type": "string",
                        "description": "Key of the field to search in"
                    },
                    "match": {
                        "type": "string",
                        "enum": MATCH_TYPES,
                        "description": "How the term must match (default exact)"
                    },
                    "limit_str": {
                        "type": "string",
                        "description": "Maximum number of results to return (default 100, max 500)"
                    },
                    "cursor": {
                        "type": "string",
                        "description": "Pagination cursor for the next page"
                    }
                },
                "required": ["term", "entity_type", "field"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_term_length_depends_on_match() {
        assert_eq!(validate_field_term(" a ", "exact").unwrap(), "a");
        let err = validate_field_term("a", "beginning").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Search term must be at least 2 characters for 'beginning' matching (current length: 1)"
        );
        assert!(validate_field_term("  ", "exact").is_err());
    }

    #[test]
    fn test_definitions_require_term() {
        let tools = definitions();
        assert_eq!(tools.len(), 2);
        for tool in &tools {
            assert_eq!(tool.input_schema["required"][0], "term");
        }
    }
}
