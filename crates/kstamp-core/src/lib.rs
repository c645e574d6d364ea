//! # kstamp-core
//!
//! Stamps prefixed KSUIDs into record-creation payloads before they reach
//! storage. A data-access adapter hands over the entity type and the raw
//! create payload; it gets back the same tree with every missing primary key
//! filled in, nested creates included.
//!
//! ```text
//! adapter ──(entity type, payload)──► Stamper ──► payload'
//!                                       │
//!                     PrefixMap / fallback ◄── resolve_prefix
//!                     RelationNames        ◄── infer related entity type
//!                     kstamp_ksuid         ◄── generate(prefix)
//! ```
//!
//! # Example
//!
//! ```
//! use kstamp_core::{PrefixMap, StampConfig, Stamper};
//! use serde_json::json;
//!
//! let config = StampConfig::builder()
//!     .prefix_map(PrefixMap::new().with("User", "usr_").with("Profile", "prof_"))
//!     .build()
//!     .unwrap();
//! let stamper = Stamper::new(config);
//!
//! let out = stamper
//!     .rewrite(&json!({ "email": "a@b.com", "profile": { "create": { "bio": "x" } } }), "User")
//!     .unwrap();
//! assert!(out["id"].as_str().unwrap().starts_with("usr_"));
//! assert!(out["profile"]["create"]["id"].as_str().unwrap().starts_with("prof_"));
//! ```
//!
//! Nothing here blocks, does I/O (settings files aside), or keeps state
//! between calls.

pub mod config;
pub mod error;
pub mod marker;
pub mod prefix;
pub mod relation;
pub mod settings;
pub mod stamper;

pub use config::{DEFAULT_PRIMARY_KEY, PrimaryKey, StampConfig, StampConfigBuilder, validate_prefix_map};
pub use error::{BoxError, ConfigError, StampError};
pub use marker::CreationMarker;
pub use prefix::{FallbackFn, PrefixMap, resolve_prefix};
pub use relation::{RelationNames, infer_entity_type};
pub use settings::{StampSettings, load_config};
pub use stamper::Stamper;

pub use kstamp_ksuid::{Ksuid, MalformedIdentifier, generate, split_prefixed};
