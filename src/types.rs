//! Input/output data model: the JSON envelopes the core accepts, and the
//! record it hands back to the caller on success.

use serde::Deserialize;

use crate::codec::decode_base64_flexible;
use crate::error::{Result, VerifyError};

/// A `pubKeyCredParams` entry: `{type: "public-key", alg: <COSE alg>}`.
/// Only `alg` is consulted by the core.
#[derive(Debug, Clone, Copy)]
pub struct PubKeyCredParam {
    pub alg: i64,
}

#[derive(Debug, Deserialize)]
struct AttestationResponseInnerJson {
    #[serde(rename = "attestationObject")]
    attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
}

#[derive(Debug, Deserialize)]
struct AttestationResponseJson {
    #[serde(rename = "rawId")]
    raw_id: String,
    response: AttestationResponseInnerJson,
}

/// A registration (`navigator.credentials.create`) response, with its
/// base64-encoded fields already decoded to bytes.
#[derive(Debug, Clone)]
pub struct AttestationResponse {
    pub raw_id: Vec<u8>,
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
}

impl AttestationResponse {
    /// Parses the JSON envelope a client produces via
    /// `PublicKeyCredential.toJSON()`, decoding `rawId`, `attestationObject`,
    /// and `clientDataJSON` with the flexible base64 rules (§4.A).
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let parsed: AttestationResponseJson = serde_json::from_slice(raw)
            .map_err(|e| VerifyError::MalformedJson(e.to_string()))?;
        Ok(Self {
            raw_id: decode_base64_flexible(&parsed.raw_id)?,
            attestation_object: decode_base64_flexible(&parsed.response.attestation_object)?,
            client_data_json: decode_base64_flexible(&parsed.response.client_data_json)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AssertionResponseInnerJson {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    #[serde(rename = "authenticatorData")]
    authenticator_data: String,
    signature: String,
    #[serde(rename = "userHandle", default)]
    user_handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssertionResponseJson {
    #[serde(rename = "rawId")]
    raw_id: String,
    response: AssertionResponseInnerJson,
}

/// An authentication (`navigator.credentials.get`) response, with its
/// base64-encoded fields already decoded to bytes.
#[derive(Debug, Clone)]
pub struct AssertionResponse {
    pub raw_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

impl AssertionResponse {
    /// Parses the JSON envelope a client produces via
    /// `PublicKeyCredential.toJSON()` for an authentication ceremony.
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let parsed: AssertionResponseJson = serde_json::from_slice(raw)
            .map_err(|e| VerifyError::MalformedJson(e.to_string()))?;
        let user_handle = match &parsed.response.user_handle {
            Some(s) if !s.is_empty() => Some(decode_base64_flexible(s)?),
            _ => None,
        };
        Ok(Self {
            raw_id: decode_base64_flexible(&parsed.raw_id)?,
            client_data_json: decode_base64_flexible(&parsed.response.client_data_json)?,
            authenticator_data: decode_base64_flexible(&parsed.response.authenticator_data)?,
            signature: decode_base64_flexible(&parsed.response.signature)?,
            user_handle,
        })
    }
}

/// The record persisted by the caller after a successful attestation.
#[derive(Debug, Clone)]
pub struct AttestationResult {
    pub credential_id: Vec<u8>,
    /// The credential's COSE_Key, exactly as sliced out of `authData` —
    /// re-serializing it is a no-op (spec round-trip property).
    pub public_key: Vec<u8>,
    pub aaguid: [u8; 16],
    pub sign_count: u32,
    /// The X.509 chain the attestation statement presented, leaf first.
    /// Empty for self-attestation.
    pub trust_path: Vec<Vec<u8>>,
    pub format: AttestationFormat,
}

/// The three mutually exclusive attestation statement formats this core
/// understands. A closed tagged union: adding a new format is a new variant
/// plus a new verifier, never a dynamic registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationFormat {
    FidoU2f,
    Packed,
    AndroidSafetyNet,
}

impl AttestationFormat {
    pub(crate) fn parse(fmt: &str) -> Result<Self> {
        match fmt {
            "fido-u2f" => Ok(Self::FidoU2f),
            "packed" => Ok(Self::Packed),
            "android-safetynet" => Ok(Self::AndroidSafetyNet),
            other => Err(VerifyError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attestation_response_json() {
        let json = br#"{"id":"abc","rawId":"AQID","response":{"attestationObject":"AQID","clientDataJSON":"AQID"},"type":"public-key"}"#;
        let parsed = AttestationResponse::from_json(json).unwrap();
        assert_eq!(parsed.raw_id, vec![1, 2, 3]);
    }

    #[test]
    fn parses_assertion_response_json_with_empty_user_handle() {
        let json = br#"{"id":"abc","rawId":"AQID","response":{"clientDataJSON":"AQID","authenticatorData":"AQID","signature":"AQID","userHandle":""},"type":"public-key"}"#;
        let parsed = AssertionResponse::from_json(json).unwrap();
        assert!(parsed.user_handle.is_none());
    }

    #[test]
    fn unsupported_format_is_rejected() {
        assert!(AttestationFormat::parse("tpm").is_err());
    }
}
