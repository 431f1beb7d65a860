//! Configuration management for the Pipedrive MCP Server
//!
//! Handles environment variables, paths, and configuration loading.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, PipedriveMcpError, Result};

/// Configuration for the Pipedrive MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Pipedrive API token, sent as the `api_token` query parameter
    pub api_token: String,

    /// Company subdomain (`<domain>.pipedrive.com`)
    pub company_domain: String,

    /// Request timeout applied to every API call
    pub timeout: Duration,

    /// Whether TLS certificates are verified
    pub verify_ssl: bool,

    /// Path of the feature configuration file
    pub feature_config_path: PathBuf,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, env::API_TOKEN)?;
        let company_domain = required(&lookup, env::COMPANY_DOMAIN)?;

        if company_domain.contains('.') || company_domain.contains('/') {
            return Err(PipedriveMcpError::Config(ConfigError::InvalidConfig {
                message: format!(
                    "{} must be the company subdomain only (e.g. 'mycompany'), got '{}'",
                    env::COMPANY_DOMAIN, company_domain
                ),
            }));
        }

        let timeout_secs = match lookup(env::TIMEOUT) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs >= 1 => secs,
                _ => {
                    return Err(PipedriveMcpError::Config(ConfigError::InvalidConfig {
                        message: format!(
                            "{} must be a whole number of seconds (at least 1), got '{}'",
                            env::TIMEOUT, raw
                        ),
                    }))
                }
            },
            None => pipedrive::DEFAULT_TIMEOUT_SECS,
        };

        let verify_ssl = lookup(env::VERIFY_SSL)
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
            .unwrap_or(true);

        let feature_config_path = match lookup(env::FEATURE_CONFIG_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => Self::get_config_dir()?.join("features.json"),
        };

        Ok(Self {
            api_token,
            company_domain,
            timeout: Duration::from_secs(timeout_secs),
            verify_ssl,
            feature_config_path,
        })
    }

    /// Override the feature configuration path (from the command line)
    pub fn with_feature_config_path(mut self, path: PathBuf) -> Self {
        self.feature_config_path = path;
        self
    }

    /// Root of the REST API, without the version segment
    pub fn api_root(&self) -> String {
        format!("https://{}.pipedrive.com/api", self.company_domain)
    }

    /// Get the configuration directory
    fn get_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            PipedriveMcpError::Config(ConfigError::DirNotFound {
                path: "~".to_string(),
            })
        })?;
        Ok(home.join(".pipedrive-mcp"))
    }
}

fn required<F>(lookup: &F, var: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(PipedriveMcpError::Config(ConfigError::MissingEnvVar {
            var: var.to_string(),
        })),
    }
}

/// Environment variable names
pub mod env {
    pub const API_TOKEN: &str = "PIPEDRIVE_API_TOKEN";
    pub const COMPANY_DOMAIN: &str = "PIPEDRIVE_COMPANY_DOMAIN";
    pub const TIMEOUT: &str = "PIPEDRIVE_TIMEOUT";
    pub const VERIFY_SSL: &str = "VERIFY_SSL";
    pub const FEATURE_CONFIG_PATH: &str = "FEATURE_CONFIG_PATH";
    pub const FEATURE_PREFIX: &str = "PIPEDRIVE_FEATURE_";
}

/// Pipedrive API constants
pub mod pipedrive {
    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default page size for list and search calls
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Largest page size the API accepts
    pub const MAX_LIMIT: u32 = 500;

    /// Currency applied when none is given
    pub const DEFAULT_CURRENCY: &str = "USD";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_creation() {
        let config = Config::from_lookup(lookup_from(&[
            (env::API_TOKEN, "abc123def456"),
            (env::COMPANY_DOMAIN, "acme"),
            (env::FEATURE_CONFIG_PATH, "/tmp/features.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_root(), "https://acme.pipedrive.com/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.verify_ssl);
        assert_eq!(config.feature_config_path, PathBuf::from("/tmp/features.json"));
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[(env::COMPANY_DOMAIN, "acme")])).unwrap_err();
        assert!(err.to_string().contains(env::API_TOKEN));
    }

    #[test]
    fn test_missing_domain_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[(env::API_TOKEN, "abc123def456")])).unwrap_err();
        assert!(err.to_string().contains(env::COMPANY_DOMAIN));
    }

    #[test]
    fn test_optional_settings() {
        let config = Config::from_lookup(lookup_from(&[
            (env::API_TOKEN, "abc123def456"),
            (env::COMPANY_DOMAIN, "acme"),
            (env::TIMEOUT, "5"),
            (env::VERIFY_SSL, "false"),
            (env::FEATURE_CONFIG_PATH, "/tmp/features.json"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.verify_ssl);

        for bad in ["0", "-3", "soon"] {
            let err = Config::from_lookup(lookup_from(&[
                (env::API_TOKEN, "abc123def456"),
                (env::COMPANY_DOMAIN, "acme"),
                (env::TIMEOUT, bad),
                (env::FEATURE_CONFIG_PATH, "/tmp/features.json"),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("at least 1"), "{}", bad);
        }
    }

    #[test]
    fn test_full_hostname_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            (env::API_TOKEN, "abc123def456"),
            (env::COMPANY_DOMAIN, "acme.pipedrive.com"),
        ]));
        assert!(result.is_err());
    }
}
