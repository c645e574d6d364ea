//! Relation field name → entity type inference.
//!
//! Best effort, in the style of common schema tools: `posts` → `Post`,
//! `categories` → `Category`, `profile` → `Profile`. Irregular names
//! (`people`, `addresses`, `series`) come out wrong; fix those with an
//! explicit override instead of teaching the heuristic more rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Deployment-specific naming rules layered over [`infer_entity_type`].
///
/// - `overrides`: relation field name → entity type, checked first.
/// - `retry`: inferred entity type → one alternative to try if the inferred
///   name has no prefix (e.g. `Item` → `OrderItem`). Only one retry happens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationNames {
    overrides: HashMap<String, String>,
    retry: HashMap<String, String>,
}

impl RelationNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a relation field directly to an entity type.
    pub fn with_override(mut self, field: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.overrides.insert(field.into(), entity_type.into());
        self
    }

    /// Offer `alternative` when `inferred` has no prefix.
    pub fn with_retry(mut self, inferred: impl Into<String>, alternative: impl Into<String>) -> Self {
        self.retry.insert(inferred.into(), alternative.into());
        self
    }

    /// Entity type for a relation field: override if present, else the heuristic.
    pub fn infer(&self, field: &str) -> String {
        match self.overrides.get(field) {
            Some(entity_type) => entity_type.clone(),
            None => infer_entity_type(field),
        }
    }

    /// The single fallback candidate for an inferred name, if configured.
    pub fn retry_candidate(&self, inferred: &str) -> Option<&str> {
        self.retry.get(inferred).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.retry.is_empty()
    }
}

/// Capitalize and singularize a relation field name.
///
/// - `...ies` (longer than 3) → `...y`
/// - trailing `s` (longer than 1) dropped
/// - anything else kept
pub fn infer_entity_type(field: &str) -> String {
    let mut chars = field.chars();
    let mut name: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return String::new(),
    };

    if name.len() > 3 && name.ends_with("ies") {
        name.truncate(name.len() - 3);
        name.push('y');
    } else if name.len() > 1 && name.ends_with('s') {
        name.pop();
    }
    name
}
