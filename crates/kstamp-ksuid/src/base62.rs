//! Fixed-width base62 codec for 20-byte identifier bodies.
//!
//! The body is treated as one unsigned big-endian integer and rewritten in
//! base 62, left-padded with `'0'` to exactly [`ENCODED_LEN`] characters.
//! Because the padding is fixed and the alphabet is in ASCII order, comparing
//! two encoded strings lexicographically gives the same answer as comparing
//! the raw bytes.

use crate::error::MalformedIdentifier;

/// Base-62 charset (0-9, A-Z, a-z).
/// Lexicographically ordered: '0' < '9' < 'A' < 'Z' < 'a' < 'z'.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Size of the raw identifier body in bytes.
pub const BODY_LEN: usize = 20;

/// Length of an encoded body. 62^27 is the smallest power of 62 above 2^160.
pub const ENCODED_LEN: usize = 27;

/// Encode a raw body as exactly [`ENCODED_LEN`] base62 characters.
pub fn encode(bytes: &[u8; BODY_LEN]) -> String {
    let mut digits = [ALPHABET[0]; ENCODED_LEN];
    let mut quotient = *bytes;

    // Every pass peels off the least significant base62 digit. Running the
    // full width also writes the zero padding.
    for slot in digits.iter_mut().rev() {
        let remainder = div_rem_62(&mut quotient);
        *slot = ALPHABET[remainder as usize];
    }

    digits.iter().map(|&b| b as char).collect()
}

/// Decode a [`ENCODED_LEN`]-character base62 string back into a raw body.
pub fn decode(encoded: &str) -> Result<[u8; BODY_LEN], MalformedIdentifier> {
    if encoded.len() != ENCODED_LEN {
        return Err(MalformedIdentifier::Length {
            expected: ENCODED_LEN,
            got: encoded.len(),
        });
    }

    let mut bytes = [0u8; BODY_LEN];
    for (pos, ch) in encoded.chars().enumerate() {
        let digit = digit_value(ch).ok_or(MalformedIdentifier::Character { ch, pos })?;

        // bytes = bytes * 62 + digit
        let mut carry = digit as u32;
        for byte in bytes.iter_mut().rev() {
            let value = (*byte as u32) * 62 + carry;
            *byte = (value & 0xff) as u8;
            carry = value >> 8;
        }
        if carry != 0 {
            return Err(MalformedIdentifier::Overflow);
        }
    }

    Ok(bytes)
}

/// True if every character of `s` is in the base62 alphabet.
pub fn is_base62(s: &str) -> bool {
    s.chars().all(|c| digit_value(c).is_some())
}

/// Divide a big-endian integer in place by 62, returning the remainder.
fn div_rem_62(num: &mut [u8; BODY_LEN]) -> u8 {
    let mut remainder: u32 = 0;
    for byte in num.iter_mut() {
        let acc = (remainder << 8) | *byte as u32;
        *byte = (acc / 62) as u8;
        remainder = acc % 62;
    }
    remainder as u8
}

fn digit_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='Z' => Some(c as u8 - b'A' + 10),
        'a'..='z' => Some(c as u8 - b'a' + 36),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
