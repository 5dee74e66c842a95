//! Byte-level codecs shared by every higher-level parser: flexible base64
//! decoding and bounded big-endian integer/slice reads.

use base64::{alphabet, engine::general_purpose::NO_PAD, engine::GeneralPurpose, Engine as _};

use crate::error::{Result, VerifyError};

const STANDARD_NO_PAD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, NO_PAD);
const URL_SAFE_NO_PAD: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, NO_PAD);

/// Decodes base64 that may be standard or URL-safe, padded or unpadded.
///
/// Selection rule: the presence of `-` or `_` anywhere in the input picks
/// the URL-safe alphabet; otherwise standard. Padding is stripped before
/// decoding so both padded and unpadded inputs are accepted uniformly.
pub fn decode_base64_flexible(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim_end_matches('=');
    let engine = if input.contains('-') || input.contains('_') {
        &URL_SAFE_NO_PAD
    } else {
        &STANDARD_NO_PAD
    };
    engine
        .decode(trimmed)
        .map_err(|e| VerifyError::MalformedBase64(e.to_string()))
}

/// Reads a big-endian `u16` from the front of `buf`.
pub fn read_u16_be(buf: &[u8]) -> Result<(u16, &[u8])> {
    let (head, rest) = take(buf, 2)?;
    Ok((u16::from_be_bytes([head[0], head[1]]), rest))
}

/// Reads a big-endian `u32` from the front of `buf`.
pub fn read_u32_be(buf: &[u8]) -> Result<(u32, &[u8])> {
    let (head, rest) = take(buf, 4)?;
    Ok((
        u32::from_be_bytes([head[0], head[1], head[2], head[3]]),
        rest,
    ))
}

/// Splits off the first `n` bytes of `buf`, failing if it is too short.
pub fn take(buf: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if buf.len() < n {
        return Err(VerifyError::MalformedAuthData(format!(
            "expected {n} more bytes, got {}",
            buf.len()
        )));
    }
    Ok(buf.split_at(n))
}

/// Compares two byte slices for equality in time independent of where the
/// first differing byte falls, to avoid leaking comparison position through
/// timing when matching challenges and signatures against caller input.
///
/// A length mismatch is itself data an attacker already controls (it's the
/// length of their own forged input), so it may short-circuit safely.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
