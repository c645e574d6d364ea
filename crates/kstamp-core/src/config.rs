//! Stamper configuration and its validation.
//!
//! `StampConfig` is only obtainable through a validating path: the builder,
//! [`StampConfig::new`] with a typed table, or [`crate::StampSettings`]. Once
//! built it is read-only and cheap to clone (closures are `Arc`ed).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{BoxError, ConfigError};
use crate::prefix::{FallbackFn, PrefixMap};
use crate::relation::RelationNames;

/// Primary-key field used when nothing else is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Which field holds the identifier of each entity type.
#[derive(Clone)]
pub enum PrimaryKey {
    /// Same field name for every entity type.
    Field(String),
    /// Field name chosen per entity type.
    PerEntity(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl PrimaryKey {
    /// One field name for everything.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Per-entity selector.
    pub fn per_entity(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::PerEntity(Arc::new(f))
    }

    /// A default field plus a table of exceptions.
    pub fn with_overrides(default: impl Into<String>, overrides: HashMap<String, String>) -> Self {
        let default = default.into();
        if overrides.is_empty() {
            return Self::Field(default);
        }
        Self::per_entity(move |entity_type| {
            overrides
                .get(entity_type)
                .cloned()
                .unwrap_or_else(|| default.clone())
        })
    }

    /// The primary-key field for `entity_type`.
    pub fn field_for(&self, entity_type: &str) -> Cow<'_, str> {
        match self {
            Self::Field(name) => Cow::Borrowed(name),
            Self::PerEntity(select) => Cow::Owned(select(entity_type)),
        }
    }
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self::Field(DEFAULT_PRIMARY_KEY.to_string())
    }
}

impl fmt::Debug for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::PerEntity(_) => f.write_str("PerEntity(..)"),
        }
    }
}

/// Validated stamper configuration.
#[derive(Clone)]
pub struct StampConfig {
    pub(crate) prefix_map: PrefixMap,
    pub(crate) fallback: Option<FallbackFn>,
    pub(crate) process_nested: bool,
    pub(crate) primary_key: PrimaryKey,
    pub(crate) relation_names: RelationNames,
}

impl StampConfig {
    /// Defaults around a typed prefix table: nested processing on, `id` key.
    pub fn new(prefix_map: PrefixMap) -> Self {
        Self {
            prefix_map,
            fallback: None,
            process_nested: true,
            primary_key: PrimaryKey::default(),
            relation_names: RelationNames::default(),
        }
    }

    pub fn builder() -> StampConfigBuilder {
        StampConfigBuilder::default()
    }

    /// Attach a fallback prefix function after construction.
    pub fn with_fallback(
        mut self,
        f: impl Fn(&str) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(f));
        self
    }

    pub fn prefix_map(&self) -> &PrefixMap {
        &self.prefix_map
    }

    pub fn fallback(&self) -> Option<&FallbackFn> {
        self.fallback.as_ref()
    }

    pub fn process_nested(&self) -> bool {
        self.process_nested
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn relation_names(&self) -> &RelationNames {
        &self.relation_names
    }
}

impl fmt::Debug for StampConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StampConfig")
            .field("prefix_map", &self.prefix_map)
            .field("fallback", &self.fallback.is_some())
            .field("process_nested", &self.process_nested)
            .field("primary_key", &self.primary_key)
            .field("relation_names", &self.relation_names)
            .finish()
    }
}

/// Builder for [`StampConfig`]. A prefix table is the one required input.
pub struct StampConfigBuilder {
    prefix_map: Option<PrefixMap>,
    fallback: Option<FallbackFn>,
    process_nested: bool,
    primary_key: PrimaryKey,
    relation_names: RelationNames,
}

impl Default for StampConfigBuilder {
    fn default() -> Self {
        Self {
            prefix_map: None,
            fallback: None,
            process_nested: true,
            primary_key: PrimaryKey::default(),
            relation_names: RelationNames::default(),
        }
    }
}

impl StampConfigBuilder {
    pub fn prefix_map(mut self, prefix_map: impl Into<PrefixMap>) -> Self {
        self.prefix_map = Some(prefix_map.into());
        self
    }

    /// Prefix table from an untyped value. Fails fast on a bad shape.
    pub fn prefix_map_value(mut self, value: Option<&Value>) -> Result<Self, ConfigError> {
        self.prefix_map = Some(validate_prefix_map(value)?);
        Ok(self)
    }

    pub fn fallback(
        mut self,
        f: impl Fn(&str) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(f));
        self
    }

    pub fn process_nested(mut self, process_nested: bool) -> Self {
        self.process_nested = process_nested;
        self
    }

    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = PrimaryKey::Field(field.into());
        self
    }

    pub fn primary_key_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.primary_key = PrimaryKey::per_entity(f);
        self
    }

    pub fn primary_key_selector(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn relation_names(mut self, relation_names: RelationNames) -> Self {
        self.relation_names = relation_names;
        self
    }

    /// Validate and finish. Fails if no prefix table was given.
    pub fn build(self) -> Result<StampConfig, ConfigError> {
        let prefix_map = self
            .prefix_map
            .ok_or_else(|| ConfigError::invalid_prefix_map("no prefix table supplied"))?;

        Ok(StampConfig {
            prefix_map,
            fallback: self.fallback,
            process_nested: self.process_nested,
            primary_key: self.primary_key,
            relation_names: self.relation_names,
        })
    }
}

/// Check an untyped prefix table and convert it.
///
/// Accepts only a JSON object whose values are all strings. Empty strings are
/// allowed here; they fail later, at resolution, for that one entity type.
pub fn validate_prefix_map(value: Option<&Value>) -> Result<PrefixMap, ConfigError> {
    let map = match value {
        None | Some(Value::Null) => return Err(ConfigError::invalid_prefix_map("missing")),
        Some(Value::Array(_)) => return Err(ConfigError::invalid_prefix_map("is an array")),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ConfigError::invalid_prefix_map(format!(
                "expected a map, got {}",
                json_kind(other)
            )));
        }
    };

    map.iter()
        .map(|(entity_type, prefix)| match prefix {
            Value::String(prefix) => Ok((entity_type.clone(), prefix.clone())),
            other => Err(ConfigError::invalid_prefix_map(format!(
                "prefix for {entity_type:?} is {}, not a string",
                json_kind(other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
