//! The nested-create stamper.
//!
//! Walks a record-creation payload and fills in missing primary keys with
//! prefixed KSUIDs. The root is a create target of the entity type the caller
//! names. Below it, a field whose value is a relation write (see
//! [`CreationMarker`]) makes each create-side record a create target of the
//! entity type inferred from the field name.
//!
//! ```text
//! record ──stamp pk──► scan fields
//!                        ├─ relation write ─► create / createMany / connectOrCreate.create
//!                        │                    / upsert.create  → record (related type)
//!                        │                  ─► upsert.update, other keys → scan only
//!                        ├─ other object ───► scan only
//!                        └─ array ──────────► scan object elements
//! ```
//!
//! A primary key counts as missing when absent, `null`, or `""`. Anything else
//! the caller supplied is left alone. The walk follows the payload's own tree
//! and visits each node once.
//!
//! Any resolution failure aborts the whole rewrite. [`Stamper::rewrite`]
//! works on a copy, so callers never see a half-stamped tree.

use serde_json::{Map, Value};

use kstamp_ksuid::generate;

use crate::config::StampConfig;
use crate::error::StampError;
use crate::marker::CreationMarker;
use crate::prefix::resolve_prefix;

/// An entity type together with its resolved prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    entity_type: String,
    prefix: String,
}

/// Stamps identifiers into record-creation payloads.
///
/// Holds only configuration; every call is independent, so one `Stamper`
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct Stamper {
    config: StampConfig,
}

impl Stamper {
    pub fn new(config: StampConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Stamp a copy of `payload`, a create payload for `entity_type`.
    ///
    /// The input is never modified. Arrays are treated as a top-level batch;
    /// scalars come back unchanged.
    #[tracing::instrument(level = "debug", skip(self, payload), name = "stamper.rewrite")]
    pub fn rewrite(&self, payload: &Value, entity_type: &str) -> Result<Value, StampError> {
        let mut stamped = payload.clone();
        self.rewrite_in_place(&mut stamped, entity_type)?;
        Ok(stamped)
    }

    /// Stamp `payload` in place.
    ///
    /// On error the payload may be partially stamped; callers that keep it
    /// after a failure should use [`rewrite`](Self::rewrite) instead.
    pub fn rewrite_in_place(&self, payload: &mut Value, entity_type: &str) -> Result<(), StampError> {
        match payload {
            Value::Object(record) => {
                let target = self.root_target(entity_type)?;
                self.stamp_record(record, &target)
            }
            Value::Array(records) => self.stamp_batch(records, entity_type),
            _ => Ok(()),
        }
    }

    /// Stamp a copy of a top-level batch. `null` entries keep their position.
    #[tracing::instrument(level = "debug", skip(self, records), fields(len = records.len()), name = "stamper.rewrite_batch")]
    pub fn rewrite_batch(&self, records: &[Value], entity_type: &str) -> Result<Vec<Value>, StampError> {
        let mut stamped = records.to_vec();
        self.stamp_batch(&mut stamped, entity_type)?;
        Ok(stamped)
    }

    fn stamp_batch(&self, records: &mut [Value], entity_type: &str) -> Result<(), StampError> {
        if !records.iter().any(Value::is_object) {
            return Ok(());
        }
        let target = self.root_target(entity_type)?;
        for record in records.iter_mut() {
            if let Value::Object(record) = record {
                self.stamp_record(record, &target)?;
            }
        }
        Ok(())
    }

    fn root_target(&self, entity_type: &str) -> Result<Target, StampError> {
        let prefix = self.prefix_for(entity_type)?;
        Ok(Target {
            entity_type: entity_type.to_string(),
            prefix,
        })
    }

    fn prefix_for(&self, entity_type: &str) -> Result<String, StampError> {
        resolve_prefix(entity_type, &self.config.prefix_map, self.config.fallback.as_ref())
            .map(|prefix| prefix.into_owned())
    }

    /// Resolve the related entity type for a relation field.
    ///
    /// Tries the inferred name, then at most one configured retry candidate.
    /// Only a missing prefix triggers the retry; fallback errors propagate.
    fn relation_target(&self, field: &str) -> Result<Target, StampError> {
        let names = &self.config.relation_names;
        let inferred = names.infer(field);

        match self.prefix_for(&inferred) {
            Ok(prefix) => Ok(Target {
                entity_type: inferred,
                prefix,
            }),
            Err(err @ StampError::PrefixNotDefined { .. }) => {
                let Some(candidate) = names.retry_candidate(&inferred) else {
                    return Err(err);
                };
                tracing::debug!(field, inferred = %inferred, candidate, "retrying relation with alternate entity type");
                let prefix = self.prefix_for(candidate)?;
                Ok(Target {
                    entity_type: candidate.to_string(),
                    prefix,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Stamp one create target, then look inside it.
    fn stamp_record(&self, record: &mut Map<String, Value>, target: &Target) -> Result<(), StampError> {
        let field = self.config.primary_key.field_for(&target.entity_type);

        if is_missing(record.get(field.as_ref())) {
            let id = generate(&target.prefix);
            tracing::trace!(entity_type = %target.entity_type, field = %field, id = %id, "stamped identifier");
            record.insert(field.into_owned(), Value::String(id));
        }

        if self.config.process_nested {
            self.scan_record(record)?;
        }
        Ok(())
    }

    /// Look for relation writes among a record's fields without stamping it.
    fn scan_record(&self, record: &mut Map<String, Value>) -> Result<(), StampError> {
        for (field, value) in record.iter_mut() {
            self.scan_field(field, value)?;
        }
        Ok(())
    }

    fn scan_field(&self, field: &str, value: &mut Value) -> Result<(), StampError> {
        match value {
            Value::Object(write) if CreationMarker::any_in(write) => {
                self.apply_relation_write(field, write)
            }
            Value::Object(nested) => self.scan_record(nested),
            Value::Array(items) => self.scan_items(items),
            _ => Ok(()),
        }
    }

    fn scan_items(&self, items: &mut [Value]) -> Result<(), StampError> {
        for item in items.iter_mut() {
            if let Value::Object(nested) = item {
                self.scan_record(nested)?;
            }
        }
        Ok(())
    }

    fn scan_value(&self, value: &mut Value) -> Result<(), StampError> {
        match value {
            Value::Object(nested) => self.scan_record(nested),
            Value::Array(items) => self.scan_items(items),
            _ => Ok(()),
        }
    }

    /// Dispatch every entry of a relation write under `field`.
    ///
    /// The related entity type is resolved on the first record that needs it,
    /// so an empty `create: []` never requires a prefix.
    fn apply_relation_write(&self, field: &str, write: &mut Map<String, Value>) -> Result<(), StampError> {
        let mut target: Option<Target> = None;

        for (key, value) in write.iter_mut() {
            let Some(marker) = CreationMarker::detect(key, value) else {
                self.scan_field(key, value)?;
                continue;
            };

            let parts = marker.targets(value);
            if !parts.creates.is_empty() && target.is_none() {
                target = Some(self.relation_target(field)?);
            }
            if let Some(target) = &target {
                for record in parts.creates {
                    self.stamp_record(record, target)?;
                }
            }
            for subtree in parts.scans {
                self.scan_value(subtree)?;
            }
        }
        Ok(())
    }
}

/// Absent, `null` and `""` all mean "no identifier yet".
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
