//! Verifier configuration.
//!
//! Most embedders construct a [`VerifierConfig`] in-process with
//! [`VerifierConfig::default`]; [`VerifierConfig::load`] exists for the same
//! binary-level ergonomics the teacher gives its own server config, reading
//! overrides from the environment with a `.env` file for local development.

use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Tunables for the verification core. None of these affect what a
/// conforming authenticator response looks like; they only affect how
/// strictly borderline attestation statements are treated.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Allowed clock skew between the SafetyNet JWS `timestampMs` and now.
    pub safetynet_skew: Duration,

    /// When `true` (the default), a certificate chain that does not
    /// terminate in a supplied trust anchor is a hard
    /// [`crate::error::VerifyError::ChainUntrusted`]. When `false`, the
    /// failure is logged via `tracing::warn!` and verification proceeds —
    /// useful for staging environments exercising real devices against a
    /// not-yet-complete trust root set. Embedders that need this should
    /// construct the config explicitly rather than relying on the default.
    pub strict_chain_validation: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            safetynet_skew: Duration::from_secs(60),
            strict_chain_validation: true,
        }
    }
}

impl VerifierConfig {
    /// Loads overrides from the environment, falling back to
    /// [`VerifierConfig::default`] values. Loads a `.env` file if present.
    #[must_use]
    pub fn load() -> Self {
        dotenv().ok();

        let default = Self::default();

        let safetynet_skew_secs = env::var("SAFETYNET_SKEW_SECS")
            .unwrap_or_else(|_| default.safetynet_skew.as_secs().to_string())
            .parse()
            .expect("SAFETYNET_SKEW_SECS must be a number");

        let strict_chain_validation = env::var("STRICT_CHAIN_VALIDATION")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(default.strict_chain_validation);

        Self {
            safetynet_skew: Duration::from_secs(safetynet_skew_secs),
            strict_chain_validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_strict_with_a_minute_of_skew() {
        let cfg = VerifierConfig::default();
        assert!(cfg.strict_chain_validation);
        assert_eq!(cfg.safetynet_skew, Duration::from_secs(60));
    }
}
