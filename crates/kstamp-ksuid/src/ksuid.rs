//! The `Ksuid` value type and the prefixed identifier generator.
//!
//! A KSUID body is 20 bytes: a 4-byte big-endian timestamp counted in seconds
//! from [`EPOCH`], followed by 16 random bytes. It displays as 27 base62
//! characters. Byte order, string order and timestamp order all agree, so
//! identifiers minted in different seconds sort chronologically as plain
//! strings.
//!
//! Prefixed identifiers are just `prefix + body`. There is no separator; a
//! caller wanting `usr_` includes the underscore in the prefix.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::base62::{self, BODY_LEN, ENCODED_LEN};
use crate::error::MalformedIdentifier;

/// Custom epoch in Unix seconds (2014-05-13T16:53:20Z).
///
/// Shared with other KSUID tooling so embedded timestamps stay comparable.
pub const EPOCH: u64 = 1_400_000_000;

/// Bytes of timestamp at the front of the body.
pub const TIMESTAMP_LEN: usize = 4;

/// Bytes of random payload after the timestamp.
pub const PAYLOAD_LEN: usize = 16;

/// A K-sortable unique identifier body.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Ksuid([u8; BODY_LEN]);

impl Ksuid {
    /// Mint a fresh KSUID for the current second.
    pub fn new() -> Self {
        Self::with_timestamp(crate::now_secs())
    }

    /// Mint a KSUID for a given Unix time with a fresh random payload.
    ///
    /// Times before [`EPOCH`] clamp to timestamp 0; times past the 32-bit
    /// range clamp to `u32::MAX`.
    pub fn with_timestamp(unix_secs: u64) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        // thread_rng panics if the OS entropy source fails; there is no
        // recoverable error here.
        rand::thread_rng().fill_bytes(&mut payload);
        Self::from_parts(epoch_offset(unix_secs), payload)
    }

    /// Assemble a KSUID from an epoch-relative timestamp and a payload.
    pub fn from_parts(timestamp: u32, payload: [u8; PAYLOAD_LEN]) -> Self {
        let mut bytes = [0u8; BODY_LEN];
        bytes[..TIMESTAMP_LEN].copy_from_slice(&timestamp.to_be_bytes());
        bytes[TIMESTAMP_LEN..].copy_from_slice(&payload);
        Self(bytes)
    }

    /// Reconstruct from 20 raw bytes.
    pub fn from_bytes(bytes: [u8; BODY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; BODY_LEN] {
        &self.0
    }

    /// Seconds since [`EPOCH`].
    pub fn timestamp(&self) -> u32 {
        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&self.0[..TIMESTAMP_LEN]);
        u32::from_be_bytes(ts)
    }

    /// Seconds since the Unix epoch.
    pub fn unix_timestamp(&self) -> u64 {
        self.timestamp() as u64 + EPOCH
    }

    /// The 16 random bytes.
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&self.0[TIMESTAMP_LEN..]);
        payload
    }

    /// The 27-character base62 body.
    pub fn to_base62(&self) -> String {
        base62::encode(&self.0)
    }

    /// Parse a 27-character base62 body.
    pub fn parse(s: &str) -> Result<Self, MalformedIdentifier> {
        base62::decode(s).map(Self)
    }

    /// The all-zero KSUID, for sentinel values only.
    pub fn nil() -> Self {
        Self([0u8; BODY_LEN])
    }

    /// The largest representable KSUID.
    pub fn max() -> Self {
        Self([0xff; BODY_LEN])
    }

    /// Check if this is the nil KSUID.
    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; BODY_LEN]
    }
}

impl Default for Ksuid {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; BODY_LEN]> for Ksuid {
    fn from(b: [u8; BODY_LEN]) -> Self {
        Self::from_bytes(b)
    }
}

impl From<Ksuid> for [u8; BODY_LEN] {
    fn from(id: Ksuid) -> [u8; BODY_LEN] {
        id.0
    }
}

impl FromStr for Ksuid {
    type Err = MalformedIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Ksuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base62())
    }
}

impl fmt::Debug for Ksuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ksuid({})", self.to_base62())
    }
}

impl Serialize for Ksuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base62())
    }
}

impl<'de> Deserialize<'de> for Ksuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn epoch_offset(unix_secs: u64) -> u32 {
    unix_secs.saturating_sub(EPOCH).min(u32::MAX as u64) as u32
}

// ── Prefixed identifiers ────────────────────────────────────────────────────

/// Generate a prefixed identifier: `prefix` verbatim, then a fresh body.
///
/// The result is always `prefix.len() + 27` bytes long.
pub fn generate(prefix: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + ENCODED_LEN);
    id.push_str(prefix);
    id.push_str(&Ksuid::new().to_base62());
    id
}

/// Split a prefixed identifier into its prefix and parsed body.
///
/// The body is always the trailing 27 characters; whatever precedes it is
/// the prefix, which may be empty.
pub fn split_prefixed(identifier: &str) -> Result<(&str, Ksuid), MalformedIdentifier> {
    let Some(at) = identifier.len().checked_sub(ENCODED_LEN) else {
        return Err(MalformedIdentifier::Length {
            expected: ENCODED_LEN,
            got: identifier.len(),
        });
    };

    if !identifier.is_char_boundary(at) {
        // A multi-byte character straddles the split, so the body can't be base62.
        let ch = identifier
            .char_indices()
            .take_while(|&(i, _)| i < at)
            .last()
            .map(|(_, c)| c)
            .unwrap_or('\u{fffd}');
        return Err(MalformedIdentifier::Character { ch, pos: 0 });
    }

    let (prefix, body) = identifier.split_at(at);
    Ok((prefix, Ksuid::parse(body)?))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn body_pattern() -> regex::Regex {
        regex::Regex::new(r"^[0-9A-Za-z]{27}$").unwrap()
    }

    // ── Basic KSUID operations ──────────────────────────────────────────

    #[test]
    fn test_new_is_unique() {
        let a = Ksuid::new();
        let b = Ksuid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = crate::now_secs();
        let id = Ksuid::new();
        let after = crate::now_secs();
        assert!(id.unix_timestamp() >= before && id.unix_timestamp() <= after);
    }

    #[test]
    fn test_from_parts_layout() {
        let payload = [7u8; PAYLOAD_LEN];
        let id = Ksuid::from_parts(0x0102_0304, payload);
        assert_eq!(&id.as_bytes()[..4], &[1, 2, 3, 4]);
        assert_eq!(id.timestamp(), 0x0102_0304);
        assert_eq!(id.payload(), payload);
    }

    #[test]
    fn test_unix_timestamp_adds_epoch() {
        let id = Ksuid::with_timestamp(EPOCH + 42);
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.unix_timestamp(), EPOCH + 42);
    }

    #[test]
    fn test_timestamp_clamps() {
        assert_eq!(Ksuid::with_timestamp(0).timestamp(), 0);
        assert_eq!(Ksuid::with_timestamp(EPOCH - 1).timestamp(), 0);
        assert_eq!(Ksuid::with_timestamp(u64::MAX).timestamp(), u32::MAX);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = Ksuid::new();
        assert_eq!(Ksuid::parse(&id.to_base62()).unwrap(), id);
        assert_eq!(id.to_string().parse::<Ksuid>().unwrap(), id);
    }

    #[test]
    fn test_nil_and_max() {
        assert!(Ksuid::nil().is_nil());
        assert!(!Ksuid::new().is_nil());
        assert_eq!(Ksuid::nil().to_string(), "0".repeat(27));
        assert_eq!(Ksuid::max().to_string(), "aWgEPTl1tmebfsQzFP4bxwgy80V");
        assert!(Ksuid::nil() < Ksuid::new() && Ksuid::new() < Ksuid::max());
    }

    #[test]
    fn test_debug_shows_type_and_body() {
        let id = Ksuid::nil();
        assert_eq!(format!("{:?}", id), format!("Ksuid({})", "0".repeat(27)));
    }

    // ── Ordering ────────────────────────────────────────────────────────

    #[test]
    fn test_later_second_sorts_after_as_string() {
        for offset in [0u64, 1, 61, 62, 3_600, 86_400 * 365] {
            let a = Ksuid::with_timestamp(EPOCH + 1_000_000 + offset);
            let b = Ksuid::with_timestamp(EPOCH + 1_000_000 + offset + 1);
            assert!(a < b);
            assert!(a.to_base62() < b.to_base62(), "offset {offset}");
        }
    }

    #[test]
    fn test_generated_across_seconds_sort() {
        let a = generate("");
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let b = generate("");
        assert!(a < b, "{a} should sort before {b}");
    }

    // ── generate() ──────────────────────────────────────────────────────

    #[test]
    fn test_generate_length_and_prefix() {
        let long = "p".repeat(300);
        for prefix in ["", "usr_", "ünï_", "\u{0}\n\t", "a-b:c/", long.as_str()] {
            let id = generate(prefix);
            assert_eq!(id.len(), prefix.len() + 27);
            assert!(id.starts_with(prefix));
            assert!(body_pattern().is_match(&id[prefix.len()..]));
        }
    }

    #[test]
    fn test_generate_no_duplicates() {
        let mut seen = HashSet::new();
        for _ in 0..5000 {
            let id = generate("x_");
            assert!(seen.insert(id.clone()), "duplicate: {}", id);
        }
    }

    // ── split_prefixed() ────────────────────────────────────────────────

    #[test]
    fn test_split_prefixed() {
        let id = generate("usr_");
        let (prefix, body) = split_prefixed(&id).unwrap();
        assert_eq!(prefix, "usr_");
        assert_eq!(body.to_string(), &id[4..]);
    }

    #[test]
    fn test_split_unprefixed() {
        let body = Ksuid::new();
        let text = body.to_string();
        assert_eq!(split_prefixed(&text).unwrap(), ("", body));
    }

    #[test]
    fn test_split_too_short() {
        assert!(matches!(
            split_prefixed("usr_abc"),
            Err(MalformedIdentifier::Length { got: 7, .. })
        ));
    }

    #[test]
    fn test_split_multibyte_straddle() {
        let text = format!("é{}", "0".repeat(26));
        assert!(matches!(
            split_prefixed(&text),
            Err(MalformedIdentifier::Character { ch: 'é', .. })
        ));
    }

    // ── Serde ───────────────────────────────────────────────────────────

    #[test]
    fn test_serde_is_body_string() {
        let id = Ksuid::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let parsed: Ksuid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let result: Result<Ksuid, _> = serde_json::from_str("\"not-a-ksuid\"");
        assert!(result.is_err());
    }
}
