//! A deterministic CBOR decoder restricted to the subset WebAuthn actually
//! uses: unsigned/negative integers, byte strings, text strings, arrays,
//! maps, and major type 7 restricted to booleans and null. Indefinite-length
//! encodings and tagged values are rejected outright.
//!
//! The reader is peek-and-consume: [`decode_one`] returns a value and the
//! remaining slice, so callers can track exactly how many bytes a nested
//! value consumed — needed by the authenticator-data parser to find where a
//! trailing extensions block starts after an embedded COSE key.

use std::collections::BTreeMap;

use crate::error::{Result, VerifyError};

/// A decoded CBOR value, restricted to the WebAuthn subset.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    Uint(u64),
    NegInt(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    /// Insertion-ordered key/value pairs, preserved verbatim for canonical
    /// re-serialization.
    Map(Vec<(CborValue, CborValue)>),
    Bool(bool),
    Null,
}

impl CborValue {
    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            CborValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value whether encoded as an unsigned or negative CBOR int.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CborValue::Uint(v) => i64::try_from(*v).ok(),
            CborValue::NegInt(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a map value by an integer key (the convention used by COSE
    /// keys and attestation statement maps).
    #[must_use]
    pub fn map_get_int(&self, key: i64) -> Option<&CborValue> {
        self.as_map()?.iter().find_map(|(k, v)| {
            if k.as_int() == Some(key) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Looks up a map value by a text key (the convention used by
    /// attestation statements and SafetyNet-adjacent maps).
    #[must_use]
    pub fn map_get_text(&self, key: &str) -> Option<&CborValue> {
        self.as_map()?.iter().find_map(|(k, v)| {
            if k.as_text() == Some(key) {
                Some(v)
            } else {
                None
            }
        })
    }
}

/// Decodes exactly one CBOR value from the front of `input`, returning it
/// plus the unconsumed remainder.
pub fn decode_one(input: &[u8]) -> Result<(CborValue, &[u8])> {
    let (&first, rest) = input
        .split_first()
        .ok_or_else(|| VerifyError::MalformedCbor("unexpected end of input".to_string()))?;

    let major = first >> 5;
    let info = first & 0x1f;

    match major {
        0 => {
            let (value, rest) = read_length(info, rest)?;
            Ok((CborValue::Uint(value), rest))
        }
        1 => {
            let (value, rest) = read_length(info, rest)?;
            let signed = i64::try_from(value)
                .map_err(|_| VerifyError::MalformedCbor("negative int out of range".to_string()))?;
            let signed = signed
                .checked_neg()
                .and_then(|v| v.checked_sub(1))
                .ok_or_else(|| VerifyError::MalformedCbor("negative int overflow".to_string()))?;
            Ok((CborValue::NegInt(signed), rest))
        }
        2 => {
            let (len, rest) = read_length(info, rest)?;
            let len = usize::try_from(len)
                .map_err(|_| VerifyError::MalformedCbor("byte string too long".to_string()))?;
            let (bytes, rest) = split_checked(rest, len)?;
            Ok((CborValue::Bytes(bytes.to_vec()), rest))
        }
        3 => {
            let (len, rest) = read_length(info, rest)?;
            let len = usize::try_from(len)
                .map_err(|_| VerifyError::MalformedCbor("text string too long".to_string()))?;
            let (bytes, rest) = split_checked(rest, len)?;
            let text = std::str::from_utf8(bytes)
                .map_err(|e| VerifyError::MalformedCbor(format!("invalid utf-8: {e}")))?
                .to_string();
            Ok((CborValue::Text(text), rest))
        }
        4 => {
            let (len, mut rest) = read_length(info, rest)?;
            let mut items = Vec::with_capacity(usize::try_from(len).unwrap_or(0).min(4096));
            for _ in 0..len {
                let (item, next) = decode_one(rest)?;
                items.push(item);
                rest = next;
            }
            Ok((CborValue::Array(items), rest))
        }
        5 => {
            let (len, mut rest) = read_length(info, rest)?;
            let mut entries = Vec::with_capacity(usize::try_from(len).unwrap_or(0).min(4096));
            let mut seen = BTreeMap::new();
            for _ in 0..len {
                let (key, next) = decode_one(rest)?;
                let (value, next) = decode_one(next)?;
                let key_bytes = canonical_key_bytes(&key);
                if seen.insert(key_bytes, ()).is_some() {
                    return Err(VerifyError::MalformedCbor(
                        "duplicate map key".to_string(),
                    ));
                }
                entries.push((key, value));
                rest = next;
            }
            Ok((CborValue::Map(entries), rest))
        }
        6 => Err(VerifyError::MalformedCbor(
            "tagged values are not supported".to_string(),
        )),
        7 => match info {
            20 => Ok((CborValue::Bool(false), rest)),
            21 => Ok((CborValue::Bool(true), rest)),
            22 => Ok((CborValue::Null, rest)),
            _ => Err(VerifyError::MalformedCbor(format!(
                "unsupported simple value {info}"
            ))),
        },
        _ => unreachable!("major type is a 3-bit field"),
    }
}

/// Decodes a single CBOR value and fails if the input has trailing bytes.
pub fn decode_exact(input: &[u8]) -> Result<CborValue> {
    let (value, rest) = decode_one(input)?;
    if !rest.is_empty() {
        return Err(VerifyError::MalformedCbor(format!(
            "{} trailing byte(s) after top-level value",
            rest.len()
        )));
    }
    Ok(value)
}

/// Interprets the 5-bit "additional information" field, reading any
/// following length bytes. Indefinite length (info == 31) is rejected.
fn read_length(info: u8, rest: &[u8]) -> Result<(u64, &[u8])> {
    match info {
        0..=23 => Ok((u64::from(info), rest)),
        24 => {
            let (b, rest) = split_checked(rest, 1)?;
            Ok((u64::from(b[0]), rest))
        }
        25 => {
            let (b, rest) = split_checked(rest, 2)?;
            Ok((u64::from(u16::from_be_bytes([b[0], b[1]])), rest))
        }
        26 => {
            let (b, rest) = split_checked(rest, 4)?;
            Ok((u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])), rest))
        }
        27 => {
            let (b, rest) = split_checked(rest, 8)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(b);
            Ok((u64::from_be_bytes(buf), rest))
        }
        28..=30 => Err(VerifyError::MalformedCbor(
            "reserved additional info value".to_string(),
        )),
        31 => Err(VerifyError::MalformedCbor(
            "indefinite-length encoding is not supported".to_string(),
        )),
        _ => unreachable!("additional info is a 5-bit field"),
    }
}

fn split_checked(buf: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if buf.len() < n {
        return Err(VerifyError::MalformedCbor(
            "unexpected end of input".to_string(),
        ));
    }
    Ok(buf.split_at(n))
}

/// A byte encoding of a decoded key used purely to detect duplicate map
/// keys; not a re-serialization of the original bytes.
fn canonical_key_bytes(key: &CborValue) -> Vec<u8> {
    match key {
        CborValue::Uint(v) => {
            let mut b = vec![0u8];
            b.extend_from_slice(&v.to_be_bytes());
            b
        }
        CborValue::NegInt(v) => {
            let mut b = vec![1u8];
            b.extend_from_slice(&v.to_be_bytes());
            b
        }
        CborValue::Bytes(v) => {
            let mut b = vec![2u8];
            b.extend_from_slice(v);
            b
        }
        CborValue::Text(v) => {
            let mut b = vec![3u8];
            b.extend_from_slice(v.as_bytes());
            b
        }
        CborValue::Bool(v) => vec![4u8, u8::from(*v)],
        CborValue::Null => vec![5u8],
        CborValue::Array(_) | CborValue::Map(_) => {
            // Not a legal CBOR map key in anything WebAuthn uses; treat each
            // occurrence as distinct rather than failing the whole decode.
            vec![6u8]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_small_uint() {
        let (value, rest) = decode_one(&[0x05]).unwrap();
        assert_eq!(value, CborValue::Uint(5));
        assert!(rest.is_empty());
    }

    #[test]
    fn decodes_negative_int() {
        // -7 is encoded as major type 1, value 6
        let (value, _) = decode_one(&[0x26]).unwrap();
        assert_eq!(value, CborValue::NegInt(-7));
    }

    #[test]
    fn decodes_byte_string() {
        let (value, rest) = decode_one(&[0x43, 1, 2, 3]).unwrap();
        assert_eq!(value, CborValue::Bytes(vec![1, 2, 3]));
        assert!(rest.is_empty());
    }

    #[test]
    fn tracks_exact_bytes_consumed() {
        // a one-element array of a 2-byte string, followed by trailing junk
        let input = [0x81, 0x41, 0xAA, 0xFF, 0xFF];
        let (_, rest) = decode_one(&input).unwrap();
        assert_eq!(rest, &[0xFF, 0xFF]);
    }

    #[test]
    fn rejects_indefinite_length() {
        assert!(decode_one(&[0x5f]).is_err());
    }

    #[test]
    fn rejects_tags() {
        assert!(decode_one(&[0xc0, 0x00]).is_err());
    }

    #[test]
    fn rejects_duplicate_map_keys() {
        // {1: 2, 1: 3}
        let input = [0xa2, 0x01, 0x02, 0x01, 0x03];
        assert!(decode_one(&input).is_err());
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        assert!(decode_exact(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn map_lookup_by_int_key() {
        let (value, _) = decode_one(&[0xa1, 0x01, 0x02]).unwrap();
        assert_eq!(value.map_get_int(1).and_then(CborValue::as_uint), Some(2));
    }
}
