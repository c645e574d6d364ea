//! File-based stamper settings.
//!
//! TOML by default; `.json` files are read as JSON. Keys may use either
//! snake_case or the camelCase spelling ORM adapters tend to use.
//!
//! ```toml
//! process_nested = true      # default
//! primary_key = "id"         # default
//!
//! [prefix_map]
//! User = "usr_"
//! Post = "post_"
//!
//! [primary_keys]             # per-entity exceptions to primary_key
//! Session = "token"
//!
//! [relation_names.overrides] # relation field -> entity type
//! items = "OrderItem"
//!
//! [relation_names.retry]     # inferred entity type -> one alternative
//! Item = "OrderItem"
//! ```
//!
//! Fallback functions can't live in a file; attach one afterwards with
//! [`StampConfig::with_fallback`].

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::config::{DEFAULT_PRIMARY_KEY, PrimaryKey, StampConfig, validate_prefix_map};
use crate::error::ConfigError;
use crate::relation::RelationNames;

/// Raw settings as read from disk, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct StampSettings {
    /// Left untyped so a wrong shape reports the prefix-table error rather
    /// than a generic parse error.
    #[serde(default, alias = "prefixMap")]
    pub prefix_map: Option<Value>,

    #[serde(default = "default_process_nested", alias = "processNested")]
    pub process_nested: bool,

    #[serde(default = "default_primary_key", alias = "primaryKeyField")]
    pub primary_key: String,

    #[serde(default, alias = "primaryKeys")]
    pub primary_keys: HashMap<String, String>,

    #[serde(default, alias = "relationNames")]
    pub relation_names: RelationNames,
}

fn default_process_nested() -> bool {
    true
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl StampSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read settings from a file, picking the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };

        tracing::debug!(path = %path.display(), "loaded stamp settings");
        Ok(settings)
    }

    /// Validate into a [`StampConfig`].
    pub fn into_config(self) -> Result<StampConfig, ConfigError> {
        let prefix_map = validate_prefix_map(self.prefix_map.as_ref())?;
        StampConfig::builder()
            .prefix_map(prefix_map)
            .process_nested(self.process_nested)
            .primary_key_selector(PrimaryKey::with_overrides(
                self.primary_key,
                self.primary_keys,
            ))
            .relation_names(self.relation_names)
            .build()
    }
}

/// Load and validate a settings file in one step.
pub fn load_config(path: impl AsRef<Path>) -> Result<StampConfig, ConfigError> {
    StampSettings::load(path)?.into_config()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_TOML: &str = r#"
        process_nested = false
        primary_key = "uid"

        [prefix_map]
        User = "usr_"
        OrderItem = "oi_"

        [primary_keys]
        Session = "token"

        [relation_names.overrides]
        items = "OrderItem"

        [relation_names.retry]
        Item = "OrderItem"
    "#;

    #[test]
    fn test_full_toml() {
        let config = StampSettings::from_toml_str(FULL_TOML)
            .unwrap()
            .into_config()
            .unwrap();
        assert!(!config.process_nested());
        assert_eq!(config.prefix_map().get("User"), Some("usr_"));
        assert_eq!(config.primary_key().field_for("User"), "uid");
        assert_eq!(config.primary_key().field_for("Session"), "token");
        assert_eq!(config.relation_names().infer("items"), "OrderItem");
        assert_eq!(config.relation_names().retry_candidate("Item"), Some("OrderItem"));
    }

    #[test]
    fn test_minimal_toml_defaults() {
        let config = StampSettings::from_toml_str("[prefix_map]\nUser = \"usr_\"\n")
            .unwrap()
            .into_config()
            .unwrap();
        assert!(config.process_nested());
        assert_eq!(config.primary_key().field_for("User"), "id");
    }

    #[test]
    fn test_missing_prefix_map() {
        let err = StampSettings::from_toml_str("process_nested = true\n")
            .unwrap()
            .into_config()
            .unwrap_err();
        assert_eq!(err.to_string(), "A valid prefixMap must be provided.");
    }

    #[test]
    fn test_array_prefix_map() {
        let err = StampSettings::from_toml_str("prefix_map = [\"usr_\"]\n")
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefixMap { .. }));
    }

    #[test]
    fn test_non_string_prefix() {
        let err = StampSettings::from_toml_str("[prefix_map]\nUser = 7\n")
            .unwrap()
            .into_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefixMap { .. }));
    }

    #[test]
    fn test_camel_case_json() {
        let json = r#"{ "prefixMap": { "User": "usr_" }, "processNested": false, "primaryKeyField": "key" }"#;
        let config = StampSettings::from_json_str(json).unwrap().into_config().unwrap();
        assert!(!config.process_nested());
        assert_eq!(config.primary_key().field_for("User"), "key");
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = StampSettings::from_toml_str("prefix_map = {").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    // ── Files ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(FULL_TOML.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.prefix_map().get("OrderItem"), Some("oi_"));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{ "prefix_map": { "User": "usr_" } }"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.prefix_map().get("User"), Some("usr_"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
