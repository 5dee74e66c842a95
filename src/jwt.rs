//! Minimal RS256 JWT parsing and signature verification, used only by the
//! Android SafetyNet attestation statement. Deliberately does not trust the
//! `jwk` or `kid` header parameters — the caller always supplies the x5c
//! chain found in the token itself and validates it independently.

use serde::Deserialize;

use crate::codec::decode_base64_flexible;
use crate::error::{Result, VerifyError};
use crate::x509;

#[derive(Debug, Deserialize)]
struct JwtHeaderRaw {
    alg: String,
    #[serde(default)]
    x5c: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JwtPayloadRaw {
    nonce: String,
    #[serde(rename = "ctsProfileMatch")]
    cts_profile_match: bool,
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
}

/// A verified SafetyNet JWS, split into the parts the android-safetynet
/// verifier needs: the certificate chain from `x5c` (leaf first) and the
/// fields of the payload the spec consults.
#[derive(Debug)]
pub struct VerifiedSafetyNetJwt {
    pub chain_der: Vec<Vec<u8>>,
    pub nonce: Vec<u8>,
    pub cts_profile_match: bool,
    pub timestamp_ms: i64,
}

/// Splits `token` into header/payload/signature, requires `alg == "RS256"`
/// and a non-empty `x5c`, and verifies the signature against the leaf
/// certificate's public key. Does not validate the chain itself, the leaf
/// certificate's subject, or any payload field beyond what's returned —
/// those are the caller's responsibility.
pub fn parse_and_verify(token: &str) -> Result<VerifiedSafetyNetJwt> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(VerifyError::MalformedJson(
            "JWT must have exactly three dot-separated parts".to_string(),
        ));
    };

    let header_bytes = decode_base64_flexible(header_b64)?;
    let header: JwtHeaderRaw = serde_json::from_slice(&header_bytes)
        .map_err(|e| VerifyError::MalformedJson(e.to_string()))?;

    if header.alg != "RS256" {
        return Err(VerifyError::UnsupportedAlgorithm(format!(
            "JWT alg {:?}, only RS256 is supported",
            header.alg
        )));
    }
    if header.x5c.is_empty() {
        return Err(VerifyError::CertificateInvalid(
            "JWT header missing x5c".to_string(),
        ));
    }

    let chain_der = header
        .x5c
        .iter()
        .map(|c| decode_base64_flexible(c))
        .collect::<Result<Vec<_>>>()?;

    let payload_bytes = decode_base64_flexible(payload_b64)?;
    let payload: JwtPayloadRaw = serde_json::from_slice(&payload_bytes)
        .map_err(|e| VerifyError::MalformedJson(e.to_string()))?;
    let nonce = decode_base64_flexible(&payload.nonce)?;

    let signature = decode_base64_flexible(sig_b64)?;
    let signed_input = format!("{header_b64}.{payload_b64}");

    let leaf = x509::parse_certificate(&chain_der[0])?;
    let rsa_key = x509::public_key_as_cose(&leaf)?;
    rsa_key.verify(signed_input.as_bytes(), &signature)?;

    Ok(VerifiedSafetyNetJwt {
        chain_der,
        nonce,
        cts_profile_match: payload.cts_profile_match,
        timestamp_ms: payload.timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_three_part_token() {
        assert!(parse_and_verify("only.two").is_err());
        assert!(parse_and_verify("a.b.c.d").is_err());
    }

    #[test]
    fn rejects_unsupported_alg() {
        let header = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            br#"{"alg":"HS256","x5c":["AA=="]}"#,
        );
        let payload = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            br#"{"nonce":"AA==","ctsProfileMatch":true,"timestampMs":0}"#,
        );
        let token = format!("{header}.{payload}.sig");
        assert!(matches!(
            parse_and_verify(&token),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
    }
}
