//! Decodes and validates `clientDataJSON`, the browser-produced JSON
//! envelope that binds a credential operation to a challenge and origin.

use serde::Deserialize;

use crate::codec::{constant_time_eq, decode_base64_flexible};
use crate::error::{Result, VerifyError};

/// `tokenBinding.status` values the source allows through.
const VALID_TOKEN_BINDING_STATUSES: &[&str] = &["not-supported", "supported", "present"];

#[derive(Debug, Deserialize)]
struct TokenBinding {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    id: Option<String>,
}

/// The subset of `clientDataJSON` the core reads. Any other field present
/// in the JSON (Android's `androidPackageNameHash`, legacy
/// `clientExtensions`/`hashAlgorithm`) is ignored rather than rejected —
/// `serde` drops unrecognized fields by default since this struct does not
/// `deny_unknown_fields`.
#[derive(Debug, Deserialize)]
struct RawClientData {
    #[serde(rename = "type")]
    typ: String,
    challenge: String,
    origin: String,
    #[serde(rename = "tokenBinding", default)]
    token_binding: Option<TokenBinding>,
}

/// Parsed and validated `clientDataJSON`.
#[derive(Debug, Clone)]
pub struct ClientData {
    pub typ: String,
    pub challenge: Vec<u8>,
    pub origin: String,
}

impl ClientData {
    /// Parses raw `clientDataJSON` bytes. Does not yet perform cross-checks
    /// against the expected type/challenge/origin — see [`ClientData::verify`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let parsed: RawClientData = serde_json::from_slice(raw)
            .map_err(|e| VerifyError::MalformedJson(e.to_string()))?;

        if let Some(tb) = &parsed.token_binding {
            if !VALID_TOKEN_BINDING_STATUSES.contains(&tb.status.as_str()) {
                return Err(VerifyError::MalformedJson(format!(
                    "invalid tokenBinding.status {:?}",
                    tb.status
                )));
            }
        }

        let challenge = decode_base64_flexible(&parsed.challenge)?;

        Ok(Self {
            typ: parsed.typ,
            challenge,
            origin: parsed.origin,
        })
    }

    /// Validates `type`, `challenge`, and (when non-empty) `origin` against
    /// the values the caller expects. An empty `expected_origin` skips the
    /// origin check — production callers must always pass a non-empty
    /// value; this convenience exists only for test harnesses.
    pub fn verify(
        &self,
        expected_type: &'static str,
        expected_challenge: &[u8],
        expected_origin: &str,
    ) -> Result<()> {
        if self.typ != expected_type {
            return Err(VerifyError::TypeMismatch {
                expected: expected_type,
                actual: self.typ.clone(),
            });
        }

        if !constant_time_eq(&self.challenge, expected_challenge) {
            return Err(VerifyError::ChallengeMismatch);
        }

        if !expected_origin.is_empty() && self.origin != expected_origin {
            return Err(VerifyError::OriginMismatch);
        }

        Ok(())
    }
}
