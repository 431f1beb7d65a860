//! Feature gating
//!
//! Tools are grouped into features that can be switched on or off together.

pub mod config;
pub mod registry;

pub use config::{FeatureConfig, FeatureSource};
pub use registry::{FeatureMetadata, FeatureRegistry};

/// Feature ids
pub mod ids {
    pub const ACTIVITIES: &str = "activities";
    pub const DEALS: &str = "deals";
    pub const LEADS: &str = "leads";
    pub const ORGANIZATIONS: &str = "organizations";
    pub const PERSONS: &str = "persons";
    pub const ITEM_SEARCH: &str = "item_search";
}

/// Metadata for each built-in feature
pub fn builtin_metadata(feature_id: &str) -> Option<FeatureMetadata> {
    let (name, entity) = match feature_id {
        ids::ITEM_SEARCH => {
            return Some(FeatureMetadata::new(
                "Item Search",
                "Tools for searching across different item types in Pipedrive",
            ))
        }
        ids::ACTIVITIES => ("Activities", "activity"),
        ids::DEALS => ("Deals", "deal"),
        ids::LEADS => ("Leads", "lead"),
        ids::ORGANIZATIONS => ("Organizations", "organization"),
        ids::PERSONS => ("Persons", "person"),
        _ => return None,
    };
    Some(FeatureMetadata::new(
        name,
        format!("Tools for managing {} entities in Pipedrive", entity),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_metadata() {
        let deals = builtin_metadata(ids::DEALS).unwrap();
        assert_eq!(deals.name, "Deals");
        assert_eq!(deals.description, "Tools for managing deal entities in Pipedrive");
        assert_eq!(deals.version, "1.0.0");

        let activities = builtin_metadata(ids::ACTIVITIES).unwrap();
        assert_eq!(activities.description, "Tools for managing activity entities in Pipedrive");

        assert_eq!(builtin_metadata(ids::ITEM_SEARCH).unwrap().name, "Item Search");
        assert!(builtin_metadata("projects").is_none());
    }
}
