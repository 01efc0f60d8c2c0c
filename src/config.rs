//! Router configuration.
//!
//! All knobs are serde-derived so a deployment can keep them in a YAML file;
//! [`RouterConfig::from_yaml_file`] mirrors how capability bundles are
//! usually shipped. Every field has a default, so an empty document (or
//! `RouterConfig::default()`) is a working configuration.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for one router instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Selector timeouts.
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Response filter policy.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Static context pairs merged into every request by the enrichment
    /// layer.
    #[serde(default)]
    pub static_context: HashMap<String, serde_json::Value>,
}

impl RouterConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Timeout knobs for the two-stage selector.
///
/// `check` runs speculatively against every capability and is bounded
/// tightly; the chosen capability's `execute` and the fallback arbiter call
/// are separately bounded an order of magnitude higher, since those two
/// externals fail independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Per-capability bound on `check`, in milliseconds.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
    /// Bound on the chosen capability's `execute`, in milliseconds.
    #[serde(default = "default_execute_timeout_ms")]
    pub execute_timeout_ms: u64,
    /// Bound on the fallback arbiter call, in milliseconds.
    #[serde(default = "default_arbiter_timeout_ms")]
    pub arbiter_timeout_ms: u64,
}

fn default_check_timeout_ms() -> u64 {
    500
}

fn default_execute_timeout_ms() -> u64 {
    30_000
}

fn default_arbiter_timeout_ms() -> u64 {
    10_000
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: default_check_timeout_ms(),
            execute_timeout_ms: default_execute_timeout_ms(),
            arbiter_timeout_ms: default_arbiter_timeout_ms(),
        }
    }
}

impl SelectorConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_millis(self.execute_timeout_ms)
    }

    pub fn arbiter_timeout(&self) -> Duration {
        Duration::from_millis(self.arbiter_timeout_ms)
    }
}

/// Policy for the reverse-pass response filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Regex patterns whose match replaces the response with the refusal.
    #[serde(default)]
    pub deny_patterns: Vec<String>,
    /// Canned refusal substituted for disallowed output.
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,
}

fn default_refusal_message() -> String {
    "I can't share that.".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            deny_patterns: Vec::new(),
            refusal_message: default_refusal_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RouterConfig::from_yaml("{}").unwrap();
        assert_eq!(config.selector.check_timeout_ms, 500);
        assert_eq!(config.selector.execute_timeout_ms, 30_000);
        assert!(config.filter.deny_patterns.is_empty());
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let yaml = r#"
selector:
  check_timeout_ms: 50
filter:
  deny_patterns:
    - "(?i)secret"
  refusal_message: "redacted"
static_context:
  deployment: "staging"
"#;
        let config = RouterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.selector.check_timeout_ms, 50);
        // untouched fields keep their defaults
        assert_eq!(config.selector.arbiter_timeout_ms, 10_000);
        assert_eq!(config.filter.refusal_message, "redacted");
        assert_eq!(
            config.static_context["deployment"],
            serde_json::Value::from("staging")
        );
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let config = SelectorConfig {
            check_timeout_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.check_timeout(), Duration::from_millis(250));
    }
}
