//! Assertion (authentication ceremony) signature verification.

use sha2::{Digest, Sha256};

use crate::authenticator_data::AuthenticatorData;
use crate::client_data::ClientData;
use crate::cose::CoseKey;
use crate::error::{Flag, Result, VerifyError};
use crate::types::AssertionResponse;

/// The outcome of a successful assertion verification: the sign counter the
/// caller should persist, plus whether it actually advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionOutcome {
    pub sign_count: u32,
    pub counter_advanced: bool,
}

/// Verifies an assertion signature against a previously stored credential
/// public key.
///
/// `expected_rp_id` is checked as `SHA-256(expectedRPID) == authData.rpIdHash`
/// when non-empty; an empty string skips the check (test-harness convenience
/// carried from the source test suite — production callers must always pass
/// a non-empty RP ID).
///
/// A regressed sign counter is reported as [`VerifyError::CounterRegressed`]
/// rather than silently accepted — the caller decides whether to invalidate
/// the credential, per the advisory nature of this signal.
pub fn verify(
    response: &AssertionResponse,
    stored_key: &CoseKey,
    stored_sign_count: u32,
    expected_challenge: &[u8],
    expected_origin: &str,
    expected_rp_id: &str,
) -> Result<AssertionOutcome> {
    let auth_data = AuthenticatorData::parse(&response.authenticator_data)?;

    if auth_data.attested_credential_data.is_some() {
        return Err(VerifyError::FlagForbidden(Flag::AttestedCredentialData));
    }
    if !auth_data.flags.user_present {
        return Err(VerifyError::FlagMissing(Flag::UserPresent));
    }

    if !expected_rp_id.is_empty() {
        let mut hasher = Sha256::new();
        hasher.update(expected_rp_id.as_bytes());
        if hasher.finalize().as_slice() != auth_data.rp_id_hash.as_slice() {
            return Err(VerifyError::RpIdMismatch);
        }
    }

    let client_data = ClientData::parse(&response.client_data_json)?;
    client_data.verify("webauthn.get", expected_challenge, expected_origin)?;

    let mut hasher = Sha256::new();
    hasher.update(&response.client_data_json);
    let client_data_hash = hasher.finalize();

    let mut signed_bytes =
        Vec::with_capacity(response.authenticator_data.len() + client_data_hash.len());
    signed_bytes.extend_from_slice(&response.authenticator_data);
    signed_bytes.extend_from_slice(&client_data_hash);

    stored_key.verify(&signed_bytes, &response.signature)?;

    let new = auth_data.sign_count;
    if new > stored_sign_count {
        Ok(AssertionOutcome {
            sign_count: new,
            counter_advanced: true,
        })
    } else if new == 0 && stored_sign_count == 0 {
        Ok(AssertionOutcome {
            sign_count: 0,
            counter_advanced: false,
        })
    } else {
        Err(VerifyError::CounterRegressed {
            stored: stored_sign_count,
            new,
        })
    }
}
