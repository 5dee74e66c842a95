//! Verification error taxonomy.
//!
//! Every failure in the core short-circuits to a single typed [`VerifyError`].
//! `safe_message()` is what a caller may return to an end user; the
//! `Display`/`{:?}` form may carry parser internals and raw byte lengths and
//! must never cross the network.

use thiserror::Error;

/// Stable, machine-checkable tag for an error variant, independent of the
/// `Display` wording.
pub mod codes {
    pub const INPUT_TOO_LARGE: &str = "INPUT_TOO_LARGE";
    pub const MALFORMED_BASE64: &str = "MALFORMED_BASE64";
    pub const MALFORMED_JSON: &str = "MALFORMED_JSON";
    pub const MALFORMED_CBOR: &str = "MALFORMED_CBOR";
    pub const MALFORMED_AUTH_DATA: &str = "MALFORMED_AUTH_DATA";
    pub const UNSUPPORTED_ALGORITHM: &str = "UNSUPPORTED_ALGORITHM";
    pub const UNSUPPORTED_KEY: &str = "UNSUPPORTED_KEY";
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const CHALLENGE_MISMATCH: &str = "CHALLENGE_MISMATCH";
    pub const ORIGIN_MISMATCH: &str = "ORIGIN_MISMATCH";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const RPID_MISMATCH: &str = "RPID_MISMATCH";
    pub const FLAG_MISSING: &str = "FLAG_MISSING";
    pub const FLAG_FORBIDDEN: &str = "FLAG_FORBIDDEN";
    pub const SIGNATURE_INVALID: &str = "SIGNATURE_INVALID";
    pub const CERTIFICATE_INVALID: &str = "CERTIFICATE_INVALID";
    pub const CHAIN_UNTRUSTED: &str = "CHAIN_UNTRUSTED";
    pub const SAFETYNET_STALE: &str = "SAFETYNET_STALE";
    pub const SAFETYNET_PROFILE_FAILED: &str = "SAFETYNET_PROFILE_FAILED";
    pub const SAFETYNET_NONCE_MISMATCH: &str = "SAFETYNET_NONCE_MISMATCH";
    pub const COUNTER_REGRESSED: &str = "COUNTER_REGRESSED";
}

/// A named authenticator data flag, referenced by `FlagMissing`/`FlagForbidden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    UserPresent,
    AttestedCredentialData,
    UserVerified,
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flag::UserPresent => write!(f, "UP"),
            Flag::AttestedCredentialData => write!(f, "AT"),
            Flag::UserVerified => write!(f, "UV"),
        }
    }
}

/// The full verification error taxonomy.
///
/// Debug-formatted content (the `{0}` / named-field interpolations below) is
/// safe to log but must never be returned to a caller over the network; use
/// [`VerifyError::safe_message`] for that instead.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("input exceeds the {limit}-byte cap ({actual} bytes)")]
    InputTooLarge { limit: usize, actual: usize },

    #[error("malformed base64: {0}")]
    MalformedBase64(String),

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("malformed CBOR: {0}")]
    MalformedCbor(String),

    #[error("malformed authenticator data: {0}")]
    MalformedAuthData(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("unsupported attestation format: {0}")]
    UnsupportedFormat(String),

    #[error("challenge does not match the server-issued challenge")]
    ChallengeMismatch,

    #[error("origin does not match the expected origin")]
    OriginMismatch,

    #[error("clientData type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("RP-ID hash does not match SHA-256(expected RP ID)")]
    RpIdMismatch,

    #[error("required flag not set: {0}")]
    FlagMissing(Flag),

    #[error("flag must not be set in this context: {0}")]
    FlagForbidden(Flag),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("certificate invalid: {0}")]
    CertificateInvalid(String),

    #[error("certificate chain does not terminate in a trusted root")]
    ChainUntrusted,

    #[error("SafetyNet attestation timestamp outside allowed skew window")]
    SafetyNetStale,

    #[error("SafetyNet ctsProfileMatch was false")]
    SafetyNetProfileFailed,

    #[error("SafetyNet nonce does not match SHA-256(authData || clientDataHash)")]
    SafetyNetNonceMismatch,

    /// Advisory only — the caller decides whether to invalidate the credential.
    #[error("assertion sign counter did not advance ({new} <= {stored})")]
    CounterRegressed { stored: u32, new: u32 },
}

impl VerifyError {
    /// Stable string tag, independent of the `Display` wording.
    #[must_use]
    pub fn code(&self) -> &'static str {
        use codes::*;
        match self {
            VerifyError::InputTooLarge { .. } => INPUT_TOO_LARGE,
            VerifyError::MalformedBase64(_) => MALFORMED_BASE64,
            VerifyError::MalformedJson(_) => MALFORMED_JSON,
            VerifyError::MalformedCbor(_) => MALFORMED_CBOR,
            VerifyError::MalformedAuthData(_) => MALFORMED_AUTH_DATA,
            VerifyError::UnsupportedAlgorithm(_) => UNSUPPORTED_ALGORITHM,
            VerifyError::UnsupportedKey(_) => UNSUPPORTED_KEY,
            VerifyError::UnsupportedFormat(_) => UNSUPPORTED_FORMAT,
            VerifyError::ChallengeMismatch => CHALLENGE_MISMATCH,
            VerifyError::OriginMismatch => ORIGIN_MISMATCH,
            VerifyError::TypeMismatch { .. } => TYPE_MISMATCH,
            VerifyError::RpIdMismatch => RPID_MISMATCH,
            VerifyError::FlagMissing(_) => FLAG_MISSING,
            VerifyError::FlagForbidden(_) => FLAG_FORBIDDEN,
            VerifyError::SignatureInvalid => SIGNATURE_INVALID,
            VerifyError::CertificateInvalid(_) => CERTIFICATE_INVALID,
            VerifyError::ChainUntrusted => CHAIN_UNTRUSTED,
            VerifyError::SafetyNetStale => SAFETYNET_STALE,
            VerifyError::SafetyNetProfileFailed => SAFETYNET_PROFILE_FAILED,
            VerifyError::SafetyNetNonceMismatch => SAFETYNET_NONCE_MISMATCH,
            VerifyError::CounterRegressed { .. } => COUNTER_REGRESSED,
        }
    }

    /// A description safe to surface to an end user. Never includes parser
    /// internals, byte lengths, or raw certificate contents.
    #[must_use]
    pub fn safe_message(&self) -> &'static str {
        match self {
            VerifyError::InputTooLarge { .. } => "request payload too large",
            VerifyError::MalformedBase64(_) => "malformed encoding",
            VerifyError::MalformedJson(_) => "malformed request",
            VerifyError::MalformedCbor(_) => "malformed attestation object",
            VerifyError::MalformedAuthData(_) => "malformed authenticator data",
            VerifyError::UnsupportedAlgorithm(_) => "unsupported algorithm",
            VerifyError::UnsupportedKey(_) => "unsupported key type",
            VerifyError::UnsupportedFormat(_) => "unsupported attestation format",
            VerifyError::ChallengeMismatch => "challenge does not match",
            VerifyError::OriginMismatch => "origin does not match",
            VerifyError::TypeMismatch { .. } => "unexpected credential operation type",
            VerifyError::RpIdMismatch => "relying party ID does not match",
            VerifyError::FlagMissing(_) | VerifyError::FlagForbidden(_) => {
                "authenticator data flags invalid for this operation"
            }
            VerifyError::SignatureInvalid => "signature verification failed",
            VerifyError::CertificateInvalid(_) => "attestation certificate invalid",
            VerifyError::ChainUntrusted => "attestation chain is not trusted",
            VerifyError::SafetyNetStale => "attestation statement is stale",
            VerifyError::SafetyNetProfileFailed => "device integrity check failed",
            VerifyError::SafetyNetNonceMismatch => "attestation nonce does not match",
            VerifyError::CounterRegressed { .. } => "sign counter did not advance",
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
