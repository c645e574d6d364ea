//! K-sortable unique identifiers for kstamp.
//!
//! This crate is the leaf of the workspace: a fixed-width base62 codec and a
//! KSUID generator. It has **no internal kstamp dependencies**.
//!
//! # Identifier layout
//!
//! ```text
//! usr_0ujtsYcgvSTl8PAuAdqWYSMnLOv
//! ^^^^ prefix (caller-chosen, may be empty)
//!     ^^^^^^^^^^^^^^^^^^^^^^^^^^^ body (27 base62 chars)
//!
//! body = base62( timestamp:u32be ++ payload:[u8; 16] )
//!        timestamp = seconds since 1_400_000_000 (Unix)
//! ```
//!
//! # Key Types
//!
//! |-------------------------|----------------------------------------|
//! | Item                    | Purpose                                |
//! |-------------------------|----------------------------------------|
//! | [`Ksuid`]               | 20-byte body, ordered by time          |
//! | [`generate`]            | `prefix + body` as a `String`          |
//! | [`split_prefixed`]      | Inverse of `generate`                  |
//! | [`MalformedIdentifier`] | Why a body failed to parse             |
//! |-------------------------|----------------------------------------|

pub mod base62;
pub mod error;
pub mod ksuid;

pub use error::MalformedIdentifier;
pub use ksuid::{EPOCH, Ksuid, PAYLOAD_LEN, TIMESTAMP_LEN, generate, split_prefixed};

/// Length of the base62 body of every identifier.
pub const BODY_CHARS: usize = base62::ENCODED_LEN;

/// Current wall-clock time as Unix seconds.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
