//! `packed` attestation statement verification, covering both the full
//! (x5c-carrying) and self-attestation variants.

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::CborValue;
use crate::cose::CoseKey;
use crate::error::{Result, VerifyError};
use crate::x509;

/// AAGUID attestation extension OID, `1.3.6.1.4.1.45724.1.1.4`.
const AAGUID_EXTENSION_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 45724, 1, 1, 4];

/// Verifies a `packed` attestation statement and returns the trust path (the
/// full x5c chain, leaf first, or empty for self-attestation).
pub fn verify(
    att_stmt: &CborValue,
    auth_data: &AuthenticatorData,
    raw_auth_data: &[u8],
    client_data_hash: &[u8],
) -> Result<Vec<Vec<u8>>> {
    let alg = att_stmt
        .map_get_text("alg")
        .and_then(CborValue::as_int)
        .ok_or_else(|| VerifyError::MalformedCbor("packed attStmt missing alg".to_string()))?;
    let sig = att_stmt
        .map_get_text("sig")
        .and_then(CborValue::as_bytes)
        .ok_or_else(|| VerifyError::MalformedCbor("packed attStmt missing sig".to_string()))?;

    let mut signed_data = Vec::with_capacity(raw_auth_data.len() + client_data_hash.len());
    signed_data.extend_from_slice(raw_auth_data);
    signed_data.extend_from_slice(client_data_hash);

    let attested = auth_data.attested_credential_data.as_ref().ok_or_else(|| {
        VerifyError::MalformedAuthData(
            "packed attestation requires attestedCredentialData".to_string(),
        )
    })?;

    match att_stmt.map_get_text("x5c").and_then(CborValue::as_array) {
        Some(certs) if !certs.is_empty() => {
            verify_full(certs, alg, &signed_data, sig, &attested.aaguid)
        }
        _ => verify_self(alg, &attested.cose_key, &signed_data, sig),
    }
}

fn verify_full(
    certs: &[CborValue],
    alg: i64,
    signed_data: &[u8],
    sig: &[u8],
    aaguid: &[u8; 16],
) -> Result<Vec<Vec<u8>>> {
    let chain_der = certs
        .iter()
        .map(|c| {
            c.as_bytes()
                .map(<[u8]>::to_vec)
                .ok_or_else(|| VerifyError::CertificateInvalid("x5c entry is not bytes".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let leaf = x509::parse_certificate(&chain_der[0])?;

    if leaf.version().0 != 2 {
        // X.509 version field is zero-indexed; v3 certificates carry value 2.
        return Err(VerifyError::CertificateInvalid(
            "packed attestation leaf certificate must be X.509v3".to_string(),
        ));
    }
    if x509::organizational_unit(&leaf).as_deref() != Some("Authenticator Attestation") {
        return Err(VerifyError::CertificateInvalid(
            "packed attestation leaf certificate OU must be \"Authenticator Attestation\""
                .to_string(),
        ));
    }
    let leaf_is_ca = leaf
        .basic_constraints()
        .is_some_and(|(_critical, bc)| bc.ca);
    if leaf_is_ca {
        return Err(VerifyError::CertificateInvalid(
            "packed attestation leaf certificate must not be a CA".to_string(),
        ));
    }
    if let Some(ext_aaguid) = x509::extension_octet_string_value(&leaf, AAGUID_EXTENSION_OID) {
        if ext_aaguid != aaguid.as_slice() {
            return Err(VerifyError::CertificateInvalid(
                "packed attestation certificate AAGUID extension does not match authData"
                    .to_string(),
            ));
        }
    }

    let leaf_key = x509::public_key_as_cose(&leaf)?;
    if leaf_key.alg() != alg {
        return Err(VerifyError::UnsupportedAlgorithm(format!(
            "packed attStmt alg {alg} does not match leaf certificate key type"
        )));
    }

    leaf_key.verify(signed_data, sig)?;

    tracing::info!(format = "packed", self_attestation = false, "attestation statement verified");
    Ok(chain_der)
}

fn verify_self(alg: i64, credential_key: &CoseKey, signed_data: &[u8], sig: &[u8]) -> Result<Vec<Vec<u8>>> {
    if credential_key.alg() != alg {
        return Err(VerifyError::UnsupportedAlgorithm(format!(
            "packed self-attestation alg {alg} does not match credential key"
        )));
    }

    credential_key.verify(signed_data, sig)?;

    tracing::info!(format = "packed", self_attestation = true, "attestation statement verified");
    Ok(Vec::new())
}
