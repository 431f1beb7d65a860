//! Feature registry
//!
//! Maps feature ids to their metadata and tool names, and tracks which
//! features are currently enabled.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::FeatureError;

/// Descriptive metadata for a feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub dependencies: Vec<String>,
}

impl FeatureMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: "1.0.0".to_string(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }
}

/// Registry of features, their tools and the enabled set
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, FeatureMetadata>,
    tools: BTreeMap<String, BTreeSet<String>>,
    enabled: BTreeSet<String>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_feature(&mut self, feature_id: &str, metadata: FeatureMetadata) {
        debug!("Registering feature: {} ({})", feature_id, metadata.name);
        self.features.insert(feature_id.to_string(), metadata);
        self.tools.entry(feature_id.to_string()).or_default();
    }

    pub fn register_tool(&mut self, feature_id: &str, tool_name: &str) -> Result<(), FeatureError> {
        if !self.features.contains_key(feature_id) {
            return Err(FeatureError::NotRegistered {
                feature: feature_id.to_string(),
            });
        }
        debug!("Registering tool: {} with feature: {}", tool_name, feature_id);
        self.tools
            .entry(feature_id.to_string())
            .or_default()
            .insert(tool_name.to_string());
        Ok(())
    }

    /// Enable a feature together with its registered dependencies
    pub fn enable_feature(&mut self, feature_id: &str) -> Result<(), FeatureError> {
        let metadata = self
            .features
            .get(feature_id)
            .ok_or_else(|| FeatureError::NotRegistered {
                feature: feature_id.to_string(),
            })?;

        info!("Enabling feature: {}", feature_id);
        let dependencies: Vec<String> = metadata
            .dependencies
            .iter()
            .filter(|dep| self.features.contains_key(*dep))
            .cloned()
            .collect();

        self.enabled.insert(feature_id.to_string());
        for dependency in dependencies {
            if self.enabled.insert(dependency.clone()) {
                info!("Enabling dependency: {} for feature: {}", dependency, feature_id);
            }
        }
        Ok(())
    }

    pub fn disable_feature(&mut self, feature_id: &str) {
        if self.enabled.remove(feature_id) {
            info!("Disabling feature: {}", feature_id);
        }
    }

    pub fn enable_all(&mut self) {
        self.enabled = self.features.keys().cloned().collect();
    }

    pub fn is_feature_enabled(&self, feature_id: &str) -> bool {
        self.enabled.contains(feature_id)
    }

    pub fn is_registered(&self, feature_id: &str) -> bool {
        self.features.contains_key(feature_id)
    }

    /// Feature a tool belongs to, if any
    pub fn feature_for_tool(&self, tool_name: &str) -> Option<&str> {
        self.tools
            .iter()
            .find(|(_, tools)| tools.contains(tool_name))
            .map(|(feature_id, _)| feature_id.as_str())
    }

    /// Tools of enabled features, sorted by name
    pub fn enabled_tools(&self) -> BTreeSet<&str> {
        self.enabled
            .iter()
            .filter_map(|feature_id| self.tools.get(feature_id))
            .flat_map(|tools| tools.iter().map(String::as_str))
            .collect()
    }

    pub fn feature_metadata(&self, feature_id: &str) -> Option<&FeatureMetadata> {
        self.features.get(feature_id)
    }

    /// Registered feature ids in sorted order
    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn enabled_features(&self) -> BTreeMap<&str, &FeatureMetadata> {
        self.features
            .iter()
            .filter(|(id, _)| self.enabled.contains(*id))
            .map(|(id, metadata)| (id.as_str(), metadata))
            .collect()
    }

    /// Tools registered for one feature, or in total when `feature_id` is `None`
    pub fn tool_count(&self, feature_id: Option<&str>) -> usize {
        match feature_id {
            Some(id) => self.tools.get(id).map_or(0, BTreeSet::len),
            None => self.tools.values().map(BTreeSet::len).sum(),
        }
    }

    /// Human-readable listing of every feature followed by the enabled tools
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for feature_id in self.feature_ids() {
            let Some(metadata) = self.feature_metadata(feature_id) else {
                continue;
            };
            let mark = if self.is_feature_enabled(feature_id) { "x" } else { " " };
            out.push_str(&format!(
                "[{}] {:<16} {} ({} tools)\n",
                mark,
                feature_id,
                metadata.description,
                self.tool_count(Some(feature_id))
            ));
        }

        let tools = self.enabled_tools();
        out.push_str(&format!("\n{} of {} tools enabled:\n", tools.len(), self.tool_count(None)));
        for tool in tools {
            out.push_str(&format!("  {}\n", tool));
        }
        out
    }
}

impl fmt::Display for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeatureRegistry: {}/{} features enabled, {} tools registered",
            self.enabled.len(),
            self.features.len(),
            self.tool_count(None)
        )
    }
}
