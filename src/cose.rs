//! COSE_Key (RFC 8152 subset) parsing and signature verification.
//!
//! A [`CoseKey`] is a closed tagged union over the two key types this core
//! accepts; each variant carries both its typed fields and the exact raw
//! CBOR bytes it was decoded from, so the stored credential material is
//! always bit-identical to what the authenticator sent (the round-trip
//! property callers rely on when persisting credentials).

use p256::ecdsa::{signature::Verifier as _, Signature as EcdsaSignature, VerifyingKey};
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::signature::Verifier as _;
use rsa::{BigUint, RsaPublicKey};
use sha2::Sha256;

use crate::cbor::CborValue;
use crate::error::{Result, VerifyError};

const COSE_KTY_EC2: i64 = 2;
const COSE_KTY_RSA: i64 = 3;
const COSE_ALG_ES256: i64 = -7;
const COSE_ALG_RS256: i64 = -257;
const COSE_CRV_P256: i64 = 1;

/// A typed public key decoded from a COSE_Key CBOR map.
#[derive(Debug, Clone)]
pub enum CoseKey {
    Ec2 {
        x: [u8; 32],
        y: [u8; 32],
        raw: Vec<u8>,
    },
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
        raw: Vec<u8>,
    },
}

impl CoseKey {
    /// Parses a decoded COSE_Key CBOR map. `raw` must be exactly the byte
    /// range the map was decoded from, for later canonical re-serialization.
    pub fn from_cbor(value: &CborValue, raw: &[u8]) -> Result<Self> {
        let kty = value
            .map_get_int(1)
            .and_then(CborValue::as_int)
            .ok_or_else(|| VerifyError::UnsupportedKey("missing kty (label 1)".to_string()))?;

        match kty {
            COSE_KTY_EC2 => {
                let alg = value.map_get_int(3).and_then(CborValue::as_int);
                if alg != Some(COSE_ALG_ES256) {
                    return Err(VerifyError::UnsupportedAlgorithm(format!(
                        "EC2 key with alg {alg:?}, only ES256 (-7) is supported"
                    )));
                }
                let crv = value.map_get_int(-1).and_then(CborValue::as_int);
                if crv != Some(COSE_CRV_P256) {
                    return Err(VerifyError::UnsupportedKey(format!(
                        "EC2 key with crv {crv:?}, only P-256 (1) is supported"
                    )));
                }
                let x = value
                    .map_get_int(-2)
                    .and_then(CborValue::as_bytes)
                    .ok_or_else(|| VerifyError::UnsupportedKey("missing EC2 x".to_string()))?;
                let y = value
                    .map_get_int(-3)
                    .and_then(CborValue::as_bytes)
                    .ok_or_else(|| VerifyError::UnsupportedKey("missing EC2 y".to_string()))?;
                let x: [u8; 32] = x
                    .try_into()
                    .map_err(|_| VerifyError::UnsupportedKey("EC2 x is not 32 bytes".to_string()))?;
                let y: [u8; 32] = y
                    .try_into()
                    .map_err(|_| VerifyError::UnsupportedKey("EC2 y is not 32 bytes".to_string()))?;
                Ok(CoseKey::Ec2 {
                    x,
                    y,
                    raw: raw.to_vec(),
                })
            }
            COSE_KTY_RSA => {
                let alg = value.map_get_int(3).and_then(CborValue::as_int);
                if alg != Some(COSE_ALG_RS256) {
                    return Err(VerifyError::UnsupportedAlgorithm(format!(
                        "RSA key with alg {alg:?}, only RS256 (-257) is supported"
                    )));
                }
                let n = value
                    .map_get_int(-1)
                    .and_then(CborValue::as_bytes)
                    .ok_or_else(|| VerifyError::UnsupportedKey("missing RSA n".to_string()))?;
                let e = value
                    .map_get_int(-2)
                    .and_then(CborValue::as_bytes)
                    .ok_or_else(|| VerifyError::UnsupportedKey("missing RSA e".to_string()))?;
                Ok(CoseKey::Rsa {
                    n: n.to_vec(),
                    e: e.to_vec(),
                    raw: raw.to_vec(),
                })
            }
            other => Err(VerifyError::UnsupportedKey(format!(
                "unsupported kty {other}"
            ))),
        }
    }

    /// The exact CBOR bytes this key was decoded from.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            CoseKey::Ec2 { raw, .. } | CoseKey::Rsa { raw, .. } => raw,
        }
    }

    /// The COSE algorithm identifier this key declares (-7 for ES256, -257
    /// for RS256).
    #[must_use]
    pub fn alg(&self) -> i64 {
        match self {
            CoseKey::Ec2 { .. } => COSE_ALG_ES256,
            CoseKey::Rsa { .. } => COSE_ALG_RS256,
        }
    }

    /// Verifies `sig` over `msg` with this key. `sig` is ASN.1 DER
    /// (Ecdsa-Sig-Value) for EC2/ES256 keys, PKCS#1 v1.5 for RSA/RS256 keys.
    /// Any failure — malformed point, malformed modulus, bad signature —
    /// collapses to [`VerifyError::SignatureInvalid`].
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<()> {
        match self {
            CoseKey::Ec2 { x, y, .. } => {
                let encoded_point = p256::EncodedPoint::from_affine_coordinates(
                    x.into(),
                    y.into(),
                    false,
                );
                let verifying_key = VerifyingKey::from_encoded_point(&encoded_point)
                    .map_err(|_| VerifyError::SignatureInvalid)?;
                let signature =
                    EcdsaSignature::from_der(sig).map_err(|_| VerifyError::SignatureInvalid)?;
                verifying_key
                    .verify(msg, &signature)
                    .map_err(|_| VerifyError::SignatureInvalid)
            }
            CoseKey::Rsa { n, e, .. } => {
                let n = BigUint::from_bytes_be(n);
                let e = BigUint::from_bytes_be(e);
                let public_key =
                    RsaPublicKey::new(n, e).map_err(|_| VerifyError::SignatureInvalid)?;
                let verifying_key = RsaVerifyingKey::<Sha256>::new(public_key);
                let signature =
                    RsaSignature::try_from(sig).map_err(|_| VerifyError::SignatureInvalid)?;
                verifying_key
                    .verify(msg, &signature)
                    .map_err(|_| VerifyError::SignatureInvalid)
            }
        }
    }
}
