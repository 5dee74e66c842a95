//! `fido-u2f` attestation statement verification (legacy U2F registration).

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::CborValue;
use crate::cose::CoseKey;
use crate::error::{Result, VerifyError};
use crate::x509;

/// Verifies a `fido-u2f` attestation statement and returns the trust path
/// (the single leaf certificate).
pub fn verify(
    att_stmt: &CborValue,
    auth_data: &AuthenticatorData,
    client_data_hash: &[u8],
) -> Result<Vec<Vec<u8>>> {
    let x5c = att_stmt
        .map_get_text("x5c")
        .and_then(CborValue::as_array)
        .filter(|certs| !certs.is_empty())
        .ok_or_else(|| {
            VerifyError::CertificateInvalid("fido-u2f attStmt missing x5c leaf".to_string())
        })?;
    let leaf_der = x5c[0]
        .as_bytes()
        .ok_or_else(|| VerifyError::CertificateInvalid("x5c[0] is not a byte string".to_string()))?;

    let sig = att_stmt
        .map_get_text("sig")
        .and_then(CborValue::as_bytes)
        .ok_or_else(|| VerifyError::MalformedCbor("fido-u2f attStmt missing sig".to_string()))?;

    let attested = auth_data.attested_credential_data.as_ref().ok_or_else(|| {
        VerifyError::MalformedAuthData(
            "fido-u2f attestation requires attestedCredentialData".to_string(),
        )
    })?;
    let (x, y) = match &attested.cose_key {
        CoseKey::Ec2 { x, y, .. } => (x, y),
        CoseKey::Rsa { .. } => {
            return Err(VerifyError::UnsupportedKey(
                "fido-u2f credential key must be EC2/P-256".to_string(),
            ))
        }
    };

    let leaf_cert = x509::parse_certificate(leaf_der)?;
    let leaf_key = x509::public_key_as_cose(&leaf_cert)?;
    if !matches!(leaf_key, CoseKey::Ec2 { .. }) {
        return Err(VerifyError::UnsupportedKey(
            "fido-u2f leaf certificate key must be EC P-256".to_string(),
        ));
    }

    // Legacy U2F registration message: 0x00 || rpIdHash || clientDataHash ||
    // credentialId || rawX || rawY.
    let mut signed_data = Vec::with_capacity(1 + 32 + 32 + attested.credential_id.len() + 64);
    signed_data.push(0x00);
    signed_data.extend_from_slice(&auth_data.rp_id_hash);
    signed_data.extend_from_slice(client_data_hash);
    signed_data.extend_from_slice(&attested.credential_id);
    signed_data.extend_from_slice(x);
    signed_data.extend_from_slice(y);

    leaf_key.verify(&signed_data, sig)?;

    tracing::info!(format = "fido-u2f", "attestation statement verified");
    Ok(vec![leaf_der.to_vec()])
}
