//! The 1-byte/4-byte object length-prefix codec.
//!
//! Every variable-length object, whether inlined in a tuple or stored
//! behind a [`crate::varlen::VarlenHandle`], is preceded by a length
//! prefix using this encoding:
//!
//! - `length == -1` (NULL object): single byte `0x40`.
//! - `0..=63`: single byte equal to the length (top two bits zero).
//! - `64..2^30`: four bytes, big-endian, with the continuation bit
//!   (`0x80`) of the first byte set; the remaining 30 bits carry the
//!   length.

use crate::error::{Result, ValueError};
use crate::kind::Kind;

/// High bit: marks a four-byte (long) length prefix.
const CONTINUATION_BIT: u8 = 0x80;
/// Second-highest bit: marks a NULL object, only meaningful on a one-byte
/// prefix (`CONTINUATION_BIT` clear).
const NULL_BIT: u8 = 0x40;
/// Mask removing both tag bits from the first prefix byte.
const TAG_MASK: u8 = !(CONTINUATION_BIT | NULL_BIT);

/// Largest length representable as a one-byte prefix.
pub const SHORT_MAX: usize = 0x3F;
/// Largest length representable at all (30 usable bits in the long form).
pub const LONG_MAX: usize = (1 << 30) - 1;

/// A decoded length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixValue {
    /// The object is NULL; no payload follows.
    Null,
    /// The object has this many bytes of payload following the prefix.
    Length(usize),
}

/// Number of bytes the prefix occupies for a given (non-NULL) length.
#[must_use]
pub fn length_of_length(byte_len: usize) -> u8 {
    if byte_len <= SHORT_MAX { 1 } else { 4 }
}

/// Encode a length prefix into `out`, returning the number of bytes
/// written (1 or 4).
pub fn encode(value: PrefixValue, out: &mut Vec<u8>) -> Result<u8> {
    match value {
        PrefixValue::Null => {
            out.push(NULL_BIT);
            Ok(1)
        }
        PrefixValue::Length(len) if len <= SHORT_MAX => {
            out.push(len as u8);
            Ok(1)
        }
        PrefixValue::Length(len) if len <= LONG_MAX => {
            let tagged = (len as u32) | (u32::from(CONTINUATION_BIT) << 24);
            out.extend_from_slice(&tagged.to_be_bytes());
            Ok(4)
        }
        PrefixValue::Length(len) => Err(ValueError::ObjectTooLarge {
            actual: len,
            max: LONG_MAX,
            kind: Kind::Varchar,
            unit: "bytes",
        }),
    }
}

/// Peek at the first byte of a prefix to determine its total width
/// without consuming anything.
#[must_use]
pub fn peek_width(first_byte: u8) -> u8 {
    if first_byte & CONTINUATION_BIT != 0 { 4 } else { 1 }
}

/// Decode a length prefix from the start of `bytes`, returning the value
/// and the number of bytes the prefix itself occupied.
pub fn decode(bytes: &[u8]) -> Result<(PrefixValue, u8)> {
    let first = *bytes.first().ok_or_else(|| {
        ValueError::UnsupportedOperation("length prefix: empty buffer".to_owned())
    })?;

    if first & CONTINUATION_BIT == 0 {
        if first & NULL_BIT != 0 {
            return Ok((PrefixValue::Null, 1));
        }
        return Ok((PrefixValue::Length((first & TAG_MASK) as usize), 1));
    }

    if bytes.len() < 4 {
        return Err(ValueError::UnsupportedOperation(
            "length prefix: truncated long form".to_owned(),
        ));
    }
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[..4]);
    let raw = u32::from_be_bytes(word);
    let masked = raw & !(u32::from(CONTINUATION_BIT | NULL_BIT) << 24);
    Ok((PrefixValue::Length(masked as usize), 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_length_round_trips() {
        let mut buf = Vec::new();
        let written = encode(PrefixValue::Length(63), &mut buf).unwrap();
        assert_eq!(written, 1);
        assert_eq!(buf, vec![0x3F]);
        assert_eq!(decode(&buf).unwrap(), (PrefixValue::Length(63), 1));
    }

    #[test]
    fn boundary_64_bytes_uses_long_form() {
        let mut buf = Vec::new();
        let written = encode(PrefixValue::Length(64), &mut buf).unwrap();
        assert_eq!(written, 4);
        assert_eq!(buf, vec![0x80, 0x00, 0x00, 0x40]);
        assert_eq!(decode(&buf).unwrap(), (PrefixValue::Length(64), 4));
    }

    #[test]
    fn null_prefix_round_trips() {
        let mut buf = Vec::new();
        encode(PrefixValue::Null, &mut buf).unwrap();
        assert_eq!(buf, vec![0x40]);
        assert_eq!(decode(&buf).unwrap(), (PrefixValue::Null, 1));
    }

    #[test]
    fn length_of_length_matches_boundary() {
        assert_eq!(length_of_length(0), 1);
        assert_eq!(length_of_length(63), 1);
        assert_eq!(length_of_length(64), 4);
    }

    #[test]
    fn too_large_is_rejected() {
        let mut buf = Vec::new();
        assert!(encode(PrefixValue::Length(LONG_MAX + 1), &mut buf).is_err());
    }
}
