//! `android-safetynet` attestation statement verification (Google SafetyNet
//! Attestation API, deprecated by Google in favor of Play Integrity but still
//! found in the wild and required for Level 1 conformance).

use sha2::{Digest, Sha256};

use crate::cbor::CborValue;
use crate::codec::constant_time_eq;
use crate::config::VerifierConfig;
use crate::error::{Result, VerifyError};
use crate::jwt;
use crate::x509;

/// Subject `commonName` SafetyNet responses are signed under.
const SAFETYNET_LEAF_CN: &str = "attest.android.com";

/// Verifies an `android-safetynet` attestation statement and returns the
/// trust path (the JWS's x5c chain, leaf first).
pub fn verify(
    att_stmt: &CborValue,
    raw_auth_data: &[u8],
    client_data_hash: &[u8],
    trust_roots: &[Vec<u8>],
    now_unix: i64,
    config: &VerifierConfig,
) -> Result<Vec<Vec<u8>>> {
    let response = att_stmt
        .map_get_text("response")
        .and_then(CborValue::as_bytes)
        .ok_or_else(|| {
            VerifyError::MalformedCbor("android-safetynet attStmt missing response".to_string())
        })?;
    let token = std::str::from_utf8(response)
        .map_err(|e| VerifyError::MalformedJson(format!("SafetyNet response is not UTF-8: {e}")))?;

    let verified = jwt::parse_and_verify(token)?;

    let leaf = x509::parse_certificate(&verified.chain_der[0])?;
    if x509::common_name(&leaf).as_deref() != Some(SAFETYNET_LEAF_CN) {
        return Err(VerifyError::CertificateInvalid(format!(
            "SafetyNet leaf certificate CN must be {SAFETYNET_LEAF_CN}"
        )));
    }

    if let Err(e) = x509::validate_chain(&verified.chain_der, trust_roots, now_unix) {
        if config.strict_chain_validation {
            return Err(e);
        }
        tracing::warn!(error = %e, "SafetyNet certificate chain did not validate, proceeding under relaxed trust policy");
    }

    let mut hasher = Sha256::new();
    hasher.update(raw_auth_data);
    hasher.update(client_data_hash);
    let expected_nonce = hasher.finalize();
    if !constant_time_eq(&verified.nonce, expected_nonce.as_slice()) {
        return Err(VerifyError::SafetyNetNonceMismatch);
    }

    if !verified.cts_profile_match {
        return Err(VerifyError::SafetyNetProfileFailed);
    }

    let skew_ms = i64::try_from(config.safetynet_skew.as_millis()).unwrap_or(i64::MAX);
    let now_ms = now_unix.saturating_mul(1000);
    if (now_ms - verified.timestamp_ms).abs() > skew_ms {
        return Err(VerifyError::SafetyNetStale);
    }

    tracing::info!(format = "android-safetynet", "attestation statement verified");
    Ok(verified.chain_der)
}
