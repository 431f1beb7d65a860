//! Person tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{list_schema, optional_id, required_id, search_schema, ListArgs, SearchArgs};
use super::{deleted, page_data, parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::models::{ContactInfo, Person, PersonUpdate};
use crate::pipedrive::utils::{convert_integer_string, normalize_optional, safe_split_to_list};
use crate::pipedrive::PersonManager;

const SEARCH_FIELDS: &[&str] = &["custom_fields", "email", "notes", "phone", "name"];

/// Optional person fields shared by the create and update tools
#[derive(Debug, Default, Deserialize)]
struct PersonFields {
    owner_id_str: Option<String>,
    org_id_str: Option<String>,
    email_address: Option<String>,
    email_label: Option<String>,
    phone_number: Option<String>,
    phone_label: Option<String>,
    visible_to_str: Option<String>,
}

impl PersonFields {
    fn email(&self) -> Option<ContactInfo> {
        normalize_optional(self.email_address.clone())
            .map(|address| ContactInfo::primary(address, self.email_label.as_deref()))
    }

    fn phone(&self) -> Option<ContactInfo> {
        normalize_optional(self.phone_number.clone())
            .map(|number| ContactInfo::primary(number, self.phone_label.as_deref()))
    }
}

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_create_person(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            name: String,
            #[serde(flatten)]
            fields: PersonFields,
        }

        let args: Args = parse_args(args)?;
        let fields = args.fields;

        let person = Person {
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            org_id: optional_id(fields.org_id_str.as_deref(), "org_id")?,
            emails: fields.email().into_iter().collect(),
            phones: fields.phone().into_iter().collect(),
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
            ..Person::new(args.name)
        }
        .validate()?;

        Ok(PersonManager::new(self.api()).create(&person).await?)
    }

    pub(super) async fn handle_get_person(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            include_fields_str: Option<String>,
            custom_fields_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let person_id = required_id(&args.id_str, "person_id")?;
        let include_fields = safe_split_to_list(args.include_fields_str.as_deref());
        let custom_fields = safe_split_to_list(args.custom_fields_str.as_deref());

        Ok(PersonManager::new(self.api())
            .get(person_id, include_fields.as_deref(), custom_fields.as_deref())
            .await?)
    }

    pub(super) async fn handle_update_person(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            name: Option<String>,
            #[serde(flatten)]
            fields: PersonFields,
        }

        let args: Args = parse_args(args)?;
        let person_id = required_id(&args.id_str, "person_id")?;
        let fields = args.fields;

        let update = PersonUpdate {
            name: normalize_optional(args.name),
            owner_id: optional_id(fields.owner_id_str.as_deref(), "owner_id")?,
            org_id: optional_id(fields.org_id_str.as_deref(), "org_id")?,
            emails: fields.email().map(|email| vec![email]),
            phones: fields.phone().map(|phone| vec![phone]),
            visible_to: convert_integer_string(fields.visible_to_str.as_deref(), "visible_to")?,
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating a person".to_string(),
            ));
        }

        Ok(PersonManager::new(self.api()).update(person_id, &update).await?)
    }

    pub(super) async fn handle_delete_person(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
        }

        let args: Args = parse_args(args)?;
        let person_id = required_id(&args.id_str, "person_id")?;
        PersonManager::new(self.api()).delete(person_id).await?;
        Ok(deleted(person_id))
    }

    pub(super) async fn handle_list_persons(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            list: ListArgs,
            org_id_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let params = args
            .list
            .to_params()?
            .filter("org_id", optional_id(args.org_id_str.as_deref(), "org_id")?);

        let page = PersonManager::new(self.api()).list(&params).await?;
        Ok(page_data(page))
    }

    pub(super) async fn handle_search_persons(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            search: SearchArgs,
            org_id_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let params = args
            .search
            .to_params(SEARCH_FIELDS)?
            .filter("organization_id", optional_id(args.org_id_str.as_deref(), "org_id")?);

        let page = PersonManager::new(self.api()).search(&params).await?;
        Ok(page_data(page))
    }
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        tool_def(
            "create_person_in_pipedrive",
            "Create a new person (contact) in Pipedrive",
            person_schema(true),
        ),
        tool_def(
            "get_person_from_pipedrive",
            "Get the details of a person by their ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the person"
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
            "update_person_in_pipedrive",
            "Update an existing person. At least one field besides the ID must be provided.",
            person_schema(false),
        ),
        tool_def(
            "delete_person_from_pipedrive",
            "Delete a person by their ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the person to delete"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "list_persons_from_pipedrive",
            "List persons with optional filtering, sorting and cursor pagination",
            list_schema(json!({
                "org_id_str": {
                    "type": "string",
                    "description": "Filter by organization ID"
                }
            })),
        ),
        tool_def(
            "search_persons_in_pipedrive",
            "Search persons by name, email, phone, notes or custom fields",
            search_schema(
                "Comma-separated list of fields to search in (name, email, phone, notes, custom_fields)",
                json!({
                    "org_id_str": {
                        "type": "string",
                        "description": "Only persons from this organization ID"
                    }
                }),
            ),
        ),
    ]
}

fn person_schema(create: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Full name of the person"
            },
            "owner_id_str": {
                "type": "string",
                "description": "ID of the user who owns the person"
            },
            "org_id_str": {
                "type": "string",
                "description": "ID of the person's organization"
            },
            "email_address": {
                "type": "string",
                "description": "Primary email address"
            },
            "email_label": {
                "type": "string",
                "description": "Label of the email address (default work)"
            },
            "phone_number": {
                "type": "string",
                "description": "Primary phone number"
            },
            "phone_label": {
                "type": "string",
                "description": "Label of the phone number (default work)"
            },
            "visible_to_str": {
                "type": "string",
                "description": "Visibility group of the person"
            }
        },
        "required": ["name"]
    });

    if !create {
        schema["properties"]["id_str"] = json!({
            "type": "string",
            "description": "The ID of the person to update"
        });
        schema["required"] = json!(["id_str"]);
    }
    schema
}
