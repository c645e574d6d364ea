//! Entity-type → prefix resolution.
//!
//! Resolution order:
//! 1. Non-empty entry in the [`PrefixMap`]
//! 2. Non-empty result of the fallback function, if one is configured
//! 3. [`StampError::PrefixNotDefined`]
//!
//! A fallback that fails short-circuits with its own error, untouched.
//! This runs once per creation point, so it does no more than one map lookup
//! and at most one fallback call.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, StampError};

/// Caller-supplied prefix source for entity types missing from the table.
///
/// `Ok(None)` and `Ok(Some(""))` both mean "no prefix".
pub type FallbackFn = Arc<dyn Fn(&str) -> Result<Option<String>, BoxError> + Send + Sync>;

/// Static entity-type → prefix table. Names are case-sensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap(HashMap<String, String>);

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the prefix for an entity type.
    pub fn insert(&mut self, entity_type: impl Into<String>, prefix: impl Into<String>) {
        self.0.insert(entity_type.into(), prefix.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, entity_type: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.insert(entity_type, prefix);
        self
    }

    /// Raw table entry, empty strings included.
    pub fn get(&self, entity_type: &str) -> Option<&str> {
        self.0.get(entity_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for PrefixMap {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<HashMap<&str, &str>> for PrefixMap {
    fn from(map: HashMap<&str, &str>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PrefixMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Resolve the prefix for `entity_type`.
pub fn resolve_prefix<'a>(
    entity_type: &str,
    table: &'a PrefixMap,
    fallback: Option<&FallbackFn>,
) -> Result<Cow<'a, str>, StampError> {
    if let Some(prefix) = table.get(entity_type)
        && !prefix.is_empty()
    {
        return Ok(Cow::Borrowed(prefix));
    }

    if let Some(fallback) = fallback
        && let Some(prefix) = fallback(entity_type).map_err(StampError::Fallback)?
        && !prefix.is_empty()
    {
        tracing::debug!(entity_type, prefix = %prefix, "prefix resolved via fallback");
        return Ok(Cow::Owned(prefix));
    }

    Err(StampError::PrefixNotDefined {
        entity_type: entity_type.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
