//! Feature configuration
//!
//! Resolves which features are enabled at startup. Sources are tried in order:
//! the JSON config file, `PIPEDRIVE_FEATURE_<ID>` environment variables, and
//! finally a default that enables everything and writes the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::registry::FeatureRegistry;
use crate::config::env::FEATURE_PREFIX;
use crate::error::{ConfigError, PipedriveMcpError, Result};

/// On-disk shape: `{"features": {"<id>": bool}}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct FeatureFile {
    #[serde(default)]
    features: BTreeMap<String, bool>,
}

/// Where the enabled feature set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    File,
    Environment,
    Default,
}

/// Loads and saves the feature configuration file
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    path: PathBuf,
}

impl FeatureConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve features using the process environment
    pub fn load(&self, registry: &mut FeatureRegistry) -> FeatureSource {
        self.load_with(registry, |key| std::env::var(key).ok())
    }

    /// Resolve features using the given environment lookup
    pub fn load_with<F>(&self, registry: &mut FeatureRegistry, lookup: F) -> FeatureSource
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.load_from_file(registry) {
            return FeatureSource::File;
        }
        if load_from_env(registry, lookup) {
            return FeatureSource::Environment;
        }

        info!("Creating default feature configuration (all features enabled)");
        registry.enable_all();
        if let Err(e) = self.save(registry) {
            error!("Error creating default feature config file: {}", e);
        }
        FeatureSource::Default
    }

    /// Apply the config file; true when at least one feature ended up enabled
    fn load_from_file(&self, registry: &mut FeatureRegistry) -> bool {
        if !self.path.exists() {
            debug!("Feature config file not found at {}", self.path.display());
            return false;
        }

        let file: FeatureFile = match std::fs::read_to_string(&self.path)
            .map_err(PipedriveMcpError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(PipedriveMcpError::from))
        {
            Ok(file) => file,
            Err(e) => {
                error!("Error loading feature config from {}: {}", self.path.display(), e);
                return false;
            }
        };

        let mut enabled_any = false;
        for (feature_id, enabled) in &file.features {
            if !registry.is_registered(feature_id) {
                warn!("Feature {} from config is not registered", feature_id);
                continue;
            }
            if *enabled {
                enabled_any |= registry.enable_feature(feature_id).is_ok();
            } else {
                registry.disable_feature(feature_id);
            }
        }

        info!("Loaded feature configuration from {}", self.path.display());
        enabled_any
    }

    /// Pretty JSON of every registered feature's state
    pub fn to_json(registry: &FeatureRegistry) -> Result<String> {
        let file = FeatureFile {
            features: registry
                .feature_ids()
                .map(|id| (id.to_string(), registry.is_feature_enabled(id)))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Write the registry's current state to the config path
    pub fn save(&self, registry: &FeatureRegistry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| ConfigError::DirCreationFailed {
                path: parent.display().to_string(),
            })?;
        }
        std::fs::write(&self.path, Self::to_json(registry)?)?;
        info!("Saved feature configuration to {}", self.path.display());
        Ok(())
    }
}

fn load_from_env<F>(registry: &mut FeatureRegistry, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    debug!("Checking environment variables for feature configuration");
    let feature_ids: Vec<String> = registry.feature_ids().map(String::from).collect();

    let mut enabled_any = false;
    for feature_id in feature_ids {
        let var = format!("{}{}", FEATURE_PREFIX, feature_id.to_uppercase());
        let Some(value) = lookup(&var) else {
            continue;
        };

        if is_truthy(&value) {
            if registry.enable_feature(&feature_id).is_ok() {
                enabled_any = true;
                info!("Enabled feature {} from environment variable {}", feature_id, var);
            }
        } else {
            registry.disable_feature(&feature_id);
            info!("Disabled feature {} from environment variable {}", feature_id, var);
        }
    }
    enabled_any
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::registry::FeatureMetadata;
    use std::collections::HashMap;

    fn registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        for id in ["deals", "persons", "leads"] {
            registry.register_feature(id, FeatureMetadata::new(id, id));
        }
        registry
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"features": {"deals": true, "persons": false, "projects": true}}"#).unwrap();

        let mut registry = registry();
        let source = FeatureConfig::new(&path).load_with(&mut registry, lookup(&[]));

        assert_eq!(source, FeatureSource::File);
        assert!(registry.is_feature_enabled("deals"));
        assert!(!registry.is_feature_enabled("persons"));
        assert!(!registry.is_feature_enabled("leads"));
    }

    #[test]
    fn test_env_source_when_file_enables_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"features": {"deals": false}}"#).unwrap();

        let mut registry = registry();
        let env = lookup(&[
            ("PIPEDRIVE_FEATURE_PERSONS", "yes"),
            ("PIPEDRIVE_FEATURE_LEADS", "off"),
        ]);
        let source = FeatureConfig::new(&path).load_with(&mut registry, env);

        assert_eq!(source, FeatureSource::Environment);
        assert!(registry.is_feature_enabled("persons"));
        assert!(!registry.is_feature_enabled("leads"));
        assert!(!registry.is_feature_enabled("deals"));
    }

    #[test]
    fn test_default_enables_all_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("features.json");

        let mut registry = registry();
        let env = lookup(&[("PIPEDRIVE_FEATURE_DEALS", "false")]);
        let source = FeatureConfig::new(&path).load_with(&mut registry, env);

        assert_eq!(source, FeatureSource::Default);
        assert_eq!(registry.enabled_features().len(), 3);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["features"]["leads"], true);
    }

    #[test]
    fn test_malformed_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, "not json").unwrap();

        let mut registry = registry();
        let source = FeatureConfig::new(&path)
            .load_with(&mut registry, lookup(&[("PIPEDRIVE_FEATURE_DEALS", "1")]));
        assert_eq!(source, FeatureSource::Environment);
    }

    #[test]
    fn test_unregistered_file_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"features": {"projects": true, "goals": false}}"#).unwrap();

        let mut registry = registry();
        let source = FeatureConfig::new(&path)
            .load_with(&mut registry, lookup(&[("PIPEDRIVE_FEATURE_LEADS", "true")]));

        assert_eq!(source, FeatureSource::Environment);
        assert!(!registry.is_registered("projects"));
        assert_eq!(registry.enabled_features().into_keys().collect::<Vec<_>>(), vec!["leads"]);
    }

    #[test]
    fn test_to_json() {
        let mut registry = registry();
        registry.enable_feature("leads").unwrap();
        let json: serde_json::Value = serde_json::from_str(&FeatureConfig::to_json(&registry).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"features": {"deals": false, "leads": true, "persons": false}}));
    }

    #[test]
    fn test_truthy_values() {
        for value in ["true", "1", "YES", "y", "On"] {
            assert!(is_truthy(value));
        }
        for value in ["false", "0", "no", "maybe", ""] {
            assert!(!is_truthy(value));
        }
    }
}
