//! Parses the `authData` blob CTAP2 authenticators produce: a 37-byte fixed
//! prefix, an optional attested-credential-data block, and optional raw
//! extensions CBOR.

use crate::cbor::decode_one;
use crate::codec::{read_u32_be, take};
use crate::cose::CoseKey;
use crate::error::{Result, VerifyError};

const RP_ID_HASH_LEN: usize = 32;
const AAGUID_LEN: usize = 16;
const MAX_CREDENTIAL_ID_LEN: usize = 1023;

/// The named bits of the authenticator data flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub user_present: bool,
    pub user_verified: bool,
    pub attested_credential_data: bool,
    pub extension_data: bool,
}

impl Flags {
    fn from_byte(b: u8) -> Self {
        Self {
            user_present: b & 0x01 != 0,
            user_verified: b & 0x04 != 0,
            attested_credential_data: b & 0x40 != 0,
            extension_data: b & 0x80 != 0,
        }
    }
}

/// The credential registered in an attestation's authData (`AT` flag set).
#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    pub cose_key: CoseKey,
}

/// A parsed authenticator data blob.
#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: Flags,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    /// Raw CBOR bytes of the extensions map, uninterpreted (per spec,
    /// extension semantics beyond "preserve unknown extensions" are out of
    /// scope).
    pub extensions_raw: Option<Vec<u8>>,
}

impl AuthenticatorData {
    /// Parses `buf` as a complete authenticator data blob. `buf` must be
    /// consumed exactly — any trailing bytes not accounted for by the
    /// attested-credential-data or extensions blocks are a format error.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let (rp_id_hash, rest) = take(buf, RP_ID_HASH_LEN)?;
        let rp_id_hash: [u8; 32] = rp_id_hash.try_into().expect("take(32) yields 32 bytes");

        let (flags_byte, rest) = take(rest, 1)?;
        let flags = Flags::from_byte(flags_byte[0]);

        let (sign_count, mut rest) = read_u32_be(rest)?;

        let attested_credential_data = if flags.attested_credential_data {
            let (aaguid, next) = take(rest, AAGUID_LEN)?;
            let aaguid: [u8; 16] = aaguid.try_into().expect("take(16) yields 16 bytes");

            let (cred_len, next) = crate::codec::read_u16_be(next)?;
            let cred_len = usize::from(cred_len);
            if cred_len > MAX_CREDENTIAL_ID_LEN {
                return Err(VerifyError::MalformedAuthData(format!(
                    "credentialId length {cred_len} exceeds {MAX_CREDENTIAL_ID_LEN}"
                )));
            }
            let (credential_id, next) = take(next, cred_len)?;

            let (cose_value, after_key) = decode_one(next)?;
            let consumed = next.len() - after_key.len();
            let cose_key = CoseKey::from_cbor(&cose_value, &next[..consumed])?;

            rest = after_key;
            Some(AttestedCredentialData {
                aaguid,
                credential_id: credential_id.to_vec(),
                cose_key,
            })
        } else {
            None
        };

        let extensions_raw = if flags.extension_data {
            if rest.is_empty() {
                return Err(VerifyError::MalformedAuthData(
                    "ED flag set but no extensions data present".to_string(),
                ));
            }
            let (_, after_ext) = decode_one(rest)?;
            let consumed = rest.len() - after_ext.len();
            let raw = rest[..consumed].to_vec();
            rest = after_ext;
            Some(raw)
        } else {
            None
        };

        if !rest.is_empty() {
            return Err(VerifyError::MalformedAuthData(format!(
                "{} trailing byte(s) not accounted for by AT/ED blocks",
                rest.len()
            )));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions_raw,
        })
    }
}
