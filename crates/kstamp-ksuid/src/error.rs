//! Error types for identifier parsing.

use thiserror::Error;

/// An identifier body that cannot be decoded back into 20 bytes.
///
/// Only produced by parsing. Generation never fails this way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedIdentifier {
    /// Body is not exactly 27 bytes long.
    #[error("identifier body must be {expected} characters, got {got}")]
    Length { expected: usize, got: usize },

    /// Character outside `0-9A-Za-z`. `pos` is relative to the body.
    #[error("invalid base62 character {ch:?} at position {pos}")]
    Character { ch: char, pos: usize },

    /// Decoded value does not fit in 160 bits.
    #[error("identifier body exceeds 160 bits")]
    Overflow,
}
