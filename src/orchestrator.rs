//! The two public entry points tying every component together:
//! [`verify_attestation`] for registration, [`verify_assertion`] for
//! authentication.
//!
//! Both follow the same linear state machine — Parsing, FormatDispatch (or
//! sole assertion-verify step), CrossChecks, Done — with no retries and no
//! fallback between attestation formats: any failure short-circuits to a
//! typed [`VerifyError`].

use sha2::{Digest, Sha256};

use crate::assertion::{self, AssertionOutcome};
use crate::attestation;
use crate::authenticator_data::AuthenticatorData;
use crate::cbor::{self, CborValue};
use crate::client_data::ClientData;
use crate::config::VerifierConfig;
use crate::cose::CoseKey;
use crate::error::{Flag, Result, VerifyError};
use crate::types::{AttestationFormat, AttestationResponse, AttestationResult, PubKeyCredParam};

/// Attestation objects larger than this are rejected before any CBOR work.
pub const MAX_ATTESTATION_OBJECT_BYTES: usize = 64 * 1024;
/// `clientDataJSON` payloads larger than this are rejected before any JSON work.
pub const MAX_CLIENT_DATA_BYTES: usize = 4 * 1024;

/// Trust anchors and wall clock, injected per call rather than held as
/// process-wide configuration.
pub struct VerificationContext<'a> {
    pub config: &'a VerifierConfig,
    /// Trust roots to anchor the attestation format's certificate chain
    /// against. An empty slice defers trust to the caller (the chain is
    /// still returned in [`AttestationResult::trust_path`]).
    pub trust_roots: &'a [Vec<u8>],
    /// Current time as a Unix timestamp, for certificate validity and
    /// SafetyNet freshness checks.
    pub now_unix: i64,
}

/// Verifies a registration ceremony's attestation response.
///
/// `expected_rp_id` is checked as `SHA-256(expectedRPID) == authData.rpIdHash`
/// when non-empty; an empty string skips the check (test-harness convenience
/// carried from the source test suite — production callers must always pass
/// a non-empty RP ID). `acceptable_algs` is the caller's `pubKeyCredParams`;
/// the credential key's declared algorithm must appear in it.
pub fn verify_attestation(
    response: &AttestationResponse,
    expected_challenge: &[u8],
    expected_origin: &str,
    expected_rp_id: &str,
    acceptable_algs: &[PubKeyCredParam],
    ctx: &VerificationContext<'_>,
) -> Result<AttestationResult> {
    if response.attestation_object.len() > MAX_ATTESTATION_OBJECT_BYTES {
        return Err(VerifyError::InputTooLarge {
            limit: MAX_ATTESTATION_OBJECT_BYTES,
            actual: response.attestation_object.len(),
        });
    }
    if response.client_data_json.len() > MAX_CLIENT_DATA_BYTES {
        return Err(VerifyError::InputTooLarge {
            limit: MAX_CLIENT_DATA_BYTES,
            actual: response.client_data_json.len(),
        });
    }

    // Parsing
    let client_data = ClientData::parse(&response.client_data_json)?;
    client_data.verify("webauthn.create", expected_challenge, expected_origin)?;

    let attestation_object = cbor::decode_exact(&response.attestation_object)?;
    let fmt = attestation_object
        .map_get_text("fmt")
        .and_then(CborValue::as_text)
        .ok_or_else(|| VerifyError::MalformedCbor("attestationObject missing fmt".to_string()))?;
    let format = AttestationFormat::parse(fmt)?;

    let raw_auth_data = attestation_object
        .map_get_text("authData")
        .and_then(CborValue::as_bytes)
        .ok_or_else(|| {
            VerifyError::MalformedCbor("attestationObject missing authData".to_string())
        })?;
    let auth_data = AuthenticatorData::parse(raw_auth_data)?;

    let att_stmt = attestation_object
        .map_get_text("attStmt")
        .ok_or_else(|| VerifyError::MalformedCbor("attestationObject missing attStmt".to_string()))?;

    // CrossChecks that gate before any cryptographic work
    if !expected_rp_id.is_empty() {
        let mut rp_id_hasher = Sha256::new();
        rp_id_hasher.update(expected_rp_id.as_bytes());
        if rp_id_hasher.finalize().as_slice() != auth_data.rp_id_hash.as_slice() {
            return Err(VerifyError::RpIdMismatch);
        }
    }
    if !auth_data.flags.user_present {
        return Err(VerifyError::FlagMissing(Flag::UserPresent));
    }
    if !auth_data.flags.attested_credential_data {
        return Err(VerifyError::FlagMissing(Flag::AttestedCredentialData));
    }

    let attested = auth_data
        .attested_credential_data
        .as_ref()
        .expect("AT flag checked above");

    let mut hasher = Sha256::new();
    hasher.update(&response.client_data_json);
    let client_data_hash = hasher.finalize();

    // FormatDispatch / StatementVerified
    let trust_path = attestation::verify(
        format,
        att_stmt,
        &auth_data,
        raw_auth_data,
        client_data_hash.as_slice(),
        ctx.trust_roots,
        ctx.now_unix,
        ctx.config,
    )?;

    if !acceptable_algs
        .iter()
        .any(|param| param.alg == attested.cose_key.alg())
    {
        return Err(VerifyError::UnsupportedAlgorithm(format!(
            "credential key alg {} is not among the caller's pubKeyCredParams",
            attested.cose_key.alg()
        )));
    }

    tracing::info!(
        format = fmt,
        credential_id_len = attested.credential_id.len(),
        "attestation accepted"
    );

    Ok(AttestationResult {
        credential_id: attested.credential_id.clone(),
        public_key: attested.cose_key.raw_bytes().to_vec(),
        aaguid: attested.aaguid,
        sign_count: auth_data.sign_count,
        trust_path,
        format,
    })
}

/// Verifies an authentication ceremony's assertion response against a
/// previously stored credential public key, returning the new sign counter.
pub fn verify_assertion(
    response: &crate::types::AssertionResponse,
    stored_key: &CoseKey,
    stored_sign_count: u32,
    expected_challenge: &[u8],
    expected_origin: &str,
    expected_rp_id: &str,
) -> Result<AssertionOutcome> {
    if response.client_data_json.len() > MAX_CLIENT_DATA_BYTES {
        return Err(VerifyError::InputTooLarge {
            limit: MAX_CLIENT_DATA_BYTES,
            actual: response.client_data_json.len(),
        });
    }

    let outcome = assertion::verify(
        response,
        stored_key,
        stored_sign_count,
        expected_challenge,
        expected_origin,
        expected_rp_id,
    )?;

    tracing::info!(sign_count = outcome.sign_count, "assertion accepted");
    Ok(outcome)
}
