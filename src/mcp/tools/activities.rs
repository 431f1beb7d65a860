//! Activity tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{list_schema, optional_flag, optional_id, required_id, ListArgs};
use super::{deleted, page_data, parse_args, tool_def, ToolHandler};
use crate::mcp::response::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::pipedrive::models::{Activity, ActivityType, ActivityUpdate};
use crate::pipedrive::utils::{
    convert_integer_string, normalize_optional, safe_split_to_list, validate_date_string, validate_uuid_string,
};
use crate::pipedrive::ActivityManager;

/// Fields shared by the create and update tools
#[derive(Debug, Default, Deserialize)]
struct ActivityFields {
    owner_id_str: Option<String>,
    deal_id_str: Option<String>,
    lead_id: Option<String>,
    person_id_str: Option<String>,
    org_id_str: Option<String>,
    project_id_str: Option<String>,
    due_date: Option<String>,
    due_time: Option<String>,
    duration: Option<String>,
    #[serde(default, deserialize_with = "optional_flag")]
    busy: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    done: Option<bool>,
    note: Option<String>,
    location: Option<String>,
    public_description: Option<String>,
    priority_str: Option<String>,
}

/// Converted optional activity fields
struct ConvertedFields {
    owner_id: Option<i64>,
    deal_id: Option<i64>,
    lead_id: Option<String>,
    person_id: Option<i64>,
    org_id: Option<i64>,
    project_id: Option<i64>,
    due_date: Option<chrono::NaiveDate>,
    priority: Option<i64>,
}

impl ActivityFields {
    fn convert(&self) -> Result<ConvertedFields, ToolError> {
        Ok(ConvertedFields {
            owner_id: optional_id(self.owner_id_str.as_deref(), "owner_id")?,
            deal_id: optional_id(self.deal_id_str.as_deref(), "deal_id")?,
            lead_id: validate_uuid_string(self.lead_id.as_deref(), "lead_id")?,
            person_id: optional_id(self.person_id_str.as_deref(), "person_id")?,
            org_id: optional_id(self.org_id_str.as_deref(), "org_id")?,
            project_id: optional_id(self.project_id_str.as_deref(), "project_id")?,
            due_date: validate_date_string(self.due_date.as_deref(), "due_date")?,
            priority: convert_integer_string(self.priority_str.as_deref(), "priority")?,
        })
    }
}

impl ToolHandler {
    // ==================== Tool Handlers ====================

    pub(super) async fn handle_create_activity(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            subject: String,
            #[serde(default, rename = "type")]
            activity_type: String,
            #[serde(flatten)]
            fields: ActivityFields,
        }

        let args: Args = parse_args(args)?;
        let converted = args.fields.convert()?;
        let fields = args.fields;

        let activity = Activity {
            due_date: converted.due_date,
            due_time: normalize_optional(fields.due_time),
            duration: normalize_optional(fields.duration),
            owner_id: converted.owner_id,
            deal_id: converted.deal_id,
            lead_id: converted.lead_id,
            person_id: converted.person_id,
            org_id: converted.org_id,
            project_id: converted.project_id,
            busy: fields.busy,
            done: fields.done,
            note: normalize_optional(fields.note),
            location: normalize_optional(fields.location),
            public_description: normalize_optional(fields.public_description),
            priority: converted.priority,
            ..Activity::new(args.subject, args.activity_type)
        }
        .validate()?;

        Ok(ActivityManager::new(self.api()).create(&activity).await?)
    }

    pub(super) async fn handle_get_activity(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            include_fields_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let activity_id = required_id(&args.id_str, "activity_id")?;
        let include_fields = safe_split_to_list(args.include_fields_str.as_deref());

        Ok(ActivityManager::new(self.api())
            .get(activity_id, include_fields.as_deref())
            .await?)
    }

    pub(super) async fn handle_update_activity(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
            subject: Option<String>,
            #[serde(rename = "type")]
            activity_type: Option<String>,
            #[serde(flatten)]
            fields: ActivityFields,
        }

        let args: Args = parse_args(args)?;
        let activity_id = required_id(&args.id_str, "activity_id")?;
        let converted = args.fields.convert()?;
        let fields = args.fields;

        let update = ActivityUpdate {
            subject: normalize_optional(args.subject),
            activity_type: normalize_optional(args.activity_type),
            due_date: converted.due_date,
            due_time: normalize_optional(fields.due_time),
            duration: normalize_optional(fields.duration),
            owner_id: converted.owner_id,
            deal_id: converted.deal_id,
            lead_id: converted.lead_id,
            person_id: converted.person_id,
            org_id: converted.org_id,
            project_id: converted.project_id,
            busy: fields.busy,
            done: fields.done,
            note: normalize_optional(fields.note),
            location: normalize_optional(fields.location),
            public_description: normalize_optional(fields.public_description),
            priority: converted.priority,
        }
        .validate()?;

        if update.is_empty() {
            return Err(ToolError::Validation(
                "At least one field must be provided for updating an activity".to_string(),
            ));
        }

        Ok(ActivityManager::new(self.api()).update(activity_id, &update).await?)
    }

    pub(super) async fn handle_delete_activity(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            id_str: String,
        }

        let args: Args = parse_args(args)?;
        let activity_id = required_id(&args.id_str, "activity_id")?;
        ActivityManager::new(self.api()).delete(activity_id).await?;
        Ok(deleted(activity_id))
    }

    pub(super) async fn handle_list_activities(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            list: ListArgs,
            deal_id_str: Option<String>,
            lead_id: Option<String>,
            person_id_str: Option<String>,
            org_id_str: Option<String>,
            #[serde(default, deserialize_with = "optional_flag")]
            done: Option<bool>,
        }

        let args: Args = parse_args(args)?;
        let params = args
            .list
            .to_params()?
            .filter("deal_id", optional_id(args.deal_id_str.as_deref(), "deal_id")?)
            .filter("lead_id", validate_uuid_string(args.lead_id.as_deref(), "lead_id")?)
            .filter("person_id", optional_id(args.person_id_str.as_deref(), "person_id")?)
            .filter("org_id", optional_id(args.org_id_str.as_deref(), "org_id")?)
            .filter("done", args.done);

        let page = ActivityManager::new(self.api()).list(&params).await?;
        Ok(page_data(page))
    }

    pub(super) async fn handle_get_activity_types(&self) -> ToolResult {
        let types: Vec<ActivityType> = ActivityManager::new(self.api())
            .list_types()
            .await?
            .iter()
            .map(ActivityType::from_api_value)
            .collect();

        Ok(json!({ "items": serde_json::to_value(types)? }))
    }

    pub(super) async fn handle_create_activity_type(&self, args: Value) -> ToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            name: String,
            #[serde(default)]
            icon_key: String,
            color: Option<String>,
            order_nr_str: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let activity_type = ActivityType {
            color: normalize_optional(args.color),
            order_nr: convert_integer_string(args.order_nr_str.as_deref(), "order_nr")?,
            ..ActivityType::new(args.name, args.icon_key)
        }
        .validate()?;

        Ok(ActivityManager::new(self.api()).create_type(&activity_type).await?)
    }
}

// ==================== Schema Definitions ====================

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        tool_def(
            "create_activity_in_pipedrive",
            "Create a new activity (call, meeting, task, ...) in Pipedrive",
            activity_schema(true),
        ),
        tool_def(
            "get_activity_from_pipedrive",
            "Get the details of an activity by its ID",
            json!({
                "type": "object",
                "properties": {
                    "id_str": {
                        "type": "string",
                        "description": "The ID of the activity"
                    },
                    "include_fields_str": {
                        "type": "string",
                        "description": "Comma-separated list of additional fields to include"
                    }
                },
                "required": ["id_str"]
            }),
        ),
        tool_def(
            "update_activity_in_pipedrive",
            "Update an existing activity. At least one field besides the ID must be provided.",
            activity_schema(false),
        ),
        tool_def(
            "delete_activity_from_pipedrive",
            "Delete an activity by its ID",
            id_schema("The ID of the activity to delete"),
        ),
        tool_def(
            "list_activities_from_pipedrive",
            "List activities with optional filtering, sorting and cursor pagination",
            list_schema(json!({
                "deal_id_str": {
                    "type": "string",
                    "description": "Filter by associated deal ID"
                },
                "lead_id": {
                    "type": "string",
                    "description": "Filter by associated lead ID (UUID)"
                },
                "person_id_str": {
                    "type": "string",
                    "description": "Filter by associated person ID"
                },
                "org_id_str": {
                    "type": "string",
                    "description": "Filter by associated organization ID"
                },
                "done": {
                    "type": "boolean",
                    "description": "Only done (true) or not done (false) activities"
                }
            })),
        ),
        tool_def(
            "get_activity_types_from_pipedrive",
            "List all activity types configured in the company account",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        tool_def(
            "create_activity_type_in_pipedrive",
            "Create a new activity type",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name of the activity type"
                    },
                    "icon_key": {
                        "type": "string",
                        "description": "Icon key for the activity type (e.g. call, meeting, task)"
                    },
                    "color": {
                        "type": "string",
                        "description": "Color in 6-character HEX format (e.g. FFFFFF)"
                    },
                    "order_nr_str": {
                        "type": "string",
                        "description": "Order number used when sorting activity types"
                    }
                },
                "required": ["name", "icon_key"]
            }),
        ),
    ]
}

fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id_str": {
                "type": "string",
                "description": description
            }
        },
        "required": ["id_str"]
    })
}

fn activity_schema(create: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "subject": {
                "type": "string",
                "description": "Subject of the activity"
            },
            "type": {
                "type": "string",
                "description": "Activity type key (e.g. call, meeting, task, deadline, email, lunch)"
            },
            "owner_id_str": {
                "type": "string",
                "description": "ID of the user who owns the activity"
            },
            "deal_id_str": {
                "type": "string",
                "description": "ID of the linked deal"
            },
            "lead_id": {
                "type": "string",
                "description": "UUID of the linked lead"
            },
            "person_id_str": {
                "type": "string",
                "description": "ID of the linked person"
            },
            "org_id_str": {
                "type": "string",
                "description": "ID of the linked organization"
            },
            "project_id_str": {
                "type": "string",
                "description": "ID of the linked project"
            },
            "due_date": {
                "type": "string",
                "description": "Due date in YYYY-MM-DD format"
            },
            "due_time": {
                "type": "string",
                "description": "Due time in HH:MM:SS format"
            },
            "duration": {
                "type": "string",
                "description": "Duration in HH:MM:SS format (HH:MM is also accepted)"
            },
            "busy": {
                "type": "boolean",
                "description": "Whether the activity marks the owner as busy"
            },
            "done": {
                "type": "boolean",
                "description": "Whether the activity is done"
            },
            "note": {
                "type": "string",
                "description": "Note attached to the activity (HTML allowed)"
            },
            "location": {
                "type": "string",
                "description": "Location of the activity"
            },
            "public_description": {
                "type": "string",
                "description": "Description shared with attendees"
            },
            "priority_str": {
                "type": "string",
                "description": "Priority of the activity (0-999)"
            }
        },
        "required": ["subject", "type"]
    });

    if !create {
        schema["properties"]["id_str"] = json!({
            "type": "string",
            "description": "The ID of the activity to update"
        });
        schema["required"] = json!(["id_str"]);
    }
    schema
}
