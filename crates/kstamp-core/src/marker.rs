//! Creation markers: the shapes inside a relation write that create records.
//!
//! A relation write is the object under a relation field, e.g. the value of
//! `posts` in `{ posts: { create: [...], connect: [...] } }`. Each of its keys
//! is classified once; marker keys are dispatched on the enum, every other
//! key is scanned for deeper writes.
//!
//! ```text
//! create           { create: {..} | [{..}] }
//! createMany       { createMany: { data: [{..} | null] | {..} } }
//! connectOrCreate  { connectOrCreate: { where, create } | [..] }
//! upsert           { upsert: { create, update } | [..] }
//! ```

use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A recognized creation shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum CreationMarker {
    /// One record or a list of records.
    #[strum(serialize = "create")]
    Create,
    /// Batch under `data`. Null entries stay where they are.
    #[strum(serialize = "createMany")]
    CreateMany,
    /// Lookup plus create; only `create` is stamped.
    #[strum(serialize = "connectOrCreate")]
    ConnectOrCreate,
    /// Create plus update; `create` is stamped, `update` is only scanned.
    #[strum(serialize = "upsert")]
    Upsert,
}

/// The parts of a marker's value the stamper acts on.
#[derive(Debug, Default)]
pub(crate) struct MarkerTargets<'v> {
    /// Records to stamp as the related entity type.
    pub creates: Vec<&'v mut Map<String, Value>>,
    /// Subtrees to scan for nested writes without stamping their root.
    pub scans: Vec<&'v mut Value>,
}

impl CreationMarker {
    /// Classify a relation-write entry. `None` for keys that aren't markers
    /// or whose value has the wrong shape to be one.
    pub fn detect(key: &str, value: &Value) -> Option<Self> {
        let marker: Self = key.parse().ok()?;
        let shaped = match marker {
            Self::Create | Self::ConnectOrCreate | Self::Upsert => {
                value.is_object() || value.is_array()
            }
            Self::CreateMany => value
                .get("data")
                .is_some_and(|data| data.is_array() || data.is_object()),
        };
        shaped.then_some(marker)
    }

    /// True if any entry of `write` is a creation marker.
    pub fn any_in(write: &Map<String, Value>) -> bool {
        write.iter().any(|(k, v)| Self::detect(k, v).is_some())
    }

    /// Split a marker's value into the records to stamp and the subtrees to scan.
    ///
    /// Nulls and scalars inside lists are skipped, not removed.
    pub(crate) fn targets(self, value: &mut Value) -> MarkerTargets<'_> {
        let mut targets = MarkerTargets::default();
        match self {
            Self::Create => push_records(value, &mut targets.creates),
            Self::CreateMany => {
                if let Some(data) = value.get_mut("data") {
                    push_records(data, &mut targets.creates);
                }
            }
            Self::ConnectOrCreate | Self::Upsert => {
                let mut entries = Vec::new();
                push_records(value, &mut entries);
                for entry in entries {
                    for (key, part) in entry {
                        match key.as_str() {
                            "create" => push_records(part, &mut targets.creates),
                            "update" if self == Self::Upsert => targets.scans.push(part),
                            // `where` and anything else pass through untouched.
                            _ => {}
                        }
                    }
                }
            }
        }
        targets
    }
}

fn push_records<'v>(value: &'v mut Value, out: &mut Vec<&'v mut Map<String, Value>>) {
    match value {
        Value::Object(record) => out.push(record),
        Value::Array(items) => {
            for item in items {
                if let Value::Object(record) = item {
                    out.push(record);
                }
            }
        }
        _ => {}
    }
}
