//! Attestation statement verifiers, one per format, dispatched by
//! [`verify`]. Each verifier returns the trust path a caller can persist for
//! later auditing: the x5c chain (leaf first) for formats that attest via a
//! certificate, or an empty vec for self-attestation.

mod android_safetynet;
mod fido_u2f;
mod packed;

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::CborValue;
use crate::config::VerifierConfig;
use crate::error::Result;
use crate::types::AttestationFormat;

/// Dispatches to the verifier matching `format`.
pub fn verify(
    format: AttestationFormat,
    att_stmt: &CborValue,
    auth_data: &AuthenticatorData,
    raw_auth_data: &[u8],
    client_data_hash: &[u8],
    trust_roots: &[Vec<u8>],
    now_unix: i64,
    config: &VerifierConfig,
) -> Result<Vec<Vec<u8>>> {
    match format {
        AttestationFormat::FidoU2f => fido_u2f::verify(att_stmt, auth_data, client_data_hash),
        AttestationFormat::Packed => {
            packed::verify(att_stmt, auth_data, raw_auth_data, client_data_hash)
        }
        AttestationFormat::AndroidSafetyNet => android_safetynet::verify(
            att_stmt,
            raw_auth_data,
            client_data_hash,
            trust_roots,
            now_unix,
            config,
        ),
    }
}
