//! X.509 chain parsing and validation against caller-supplied trust anchors.
//!
//! Used by the packed (x5c) and Android SafetyNet attestation verifiers.
//! Trust is never implicit: an empty trust-root list means "hand the chain
//! back uninspected, the caller pins it themselves" (spec'd collaborator
//! contract), not "trust anything".

use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::public_key::PublicKey;

use crate::cose::CoseKey;
use crate::error::{Result, VerifyError};

/// Parses a single DER certificate.
pub fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| VerifyError::CertificateInvalid(e.to_string()))
}

/// Extracts a certificate's public key as a [`CoseKey`] (EC P-256 or RSA
/// only, matching the key types this core otherwise accepts), so the same
/// `verify` primitive backs both COSE-key and certificate-carried
/// signatures.
pub fn public_key_as_cose(cert: &X509Certificate<'_>) -> Result<CoseKey> {
    let spki = cert.public_key();
    let parsed = spki
        .parsed()
        .map_err(|e| VerifyError::UnsupportedKey(e.to_string()))?;
    match parsed {
        PublicKey::EC(ec_point) => {
            let data = ec_point.data();
            if data.len() != 65 || data[0] != 0x04 {
                return Err(VerifyError::UnsupportedKey(
                    "certificate EC point is not an uncompressed P-256 point".to_string(),
                ));
            }
            let x: [u8; 32] = data[1..33].try_into().expect("checked length above");
            let y: [u8; 32] = data[33..65].try_into().expect("checked length above");
            Ok(CoseKey::Ec2 {
                x,
                y,
                raw: Vec::new(),
            })
        }
        PublicKey::RSA(rsa) => Ok(CoseKey::Rsa {
            n: rsa.modulus.to_vec(),
            e: rsa.exponent.to_vec(),
            raw: Vec::new(),
        }),
        _ => Err(VerifyError::UnsupportedKey(
            "certificate key is neither EC P-256 nor RSA".to_string(),
        )),
    }
}

/// The first `commonName` attribute of a certificate's subject, if any.
#[must_use]
pub fn common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

/// The first `organizationalUnitName` attribute of a certificate's subject,
/// if any.
#[must_use]
pub fn organizational_unit(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_organizational_unit()
        .next()
        .and_then(|ou| ou.as_str().ok())
        .map(str::to_string)
}

/// The raw extnValue content of an extension identified by a dotted OID arc,
/// if the certificate carries one. This is the DER encoding of whatever
/// ASN.1 type the extension's syntax specifies, not yet unwrapped.
#[must_use]
pub fn extension_value<'a>(cert: &'a X509Certificate<'_>, oid_arc: &[u64]) -> Option<&'a [u8]> {
    let oid = der_parser::oid::Oid::from(oid_arc).ok()?;
    cert.extensions()
        .iter()
        .find(|ext| ext.oid == oid)
        .map(|ext| ext.value)
}

/// An extension's value, unwrapped one level assuming its syntax is `OCTET
/// STRING` (as `id-fido-gen-ce-aaguid` specifies: the extnValue is itself the
/// DER encoding of an `OCTET STRING` wrapping the real payload, so the AAGUID
/// bytes sit behind two layers of octet-string framing, not one).
#[must_use]
pub fn extension_octet_string_value(cert: &X509Certificate<'_>, oid_arc: &[u64]) -> Option<Vec<u8>> {
    unwrap_octet_string(extension_value(cert, oid_arc)?)
}

fn unwrap_octet_string(raw: &[u8]) -> Option<Vec<u8>> {
    let (_, parsed) = der_parser::parse_der(raw).ok()?;
    match parsed.content {
        der_parser::ber::BerObjectContent::OctetString(bytes) => Some(bytes.to_vec()),
        _ => None,
    }
}

/// Validates a leaf-to-root certificate chain:
/// - every certificate's validity period covers `now`,
/// - every non-leaf certificate has the CA basic constraint set,
/// - each certificate in the chain is signed by the next,
/// - the final certificate chains to one of `trust_roots` — unless
///   `trust_roots` is empty, in which case trust is deferred to the caller
///   and only the structural checks above apply.
pub fn validate_chain(chain_der: &[Vec<u8>], trust_roots: &[Vec<u8>], now_unix: i64) -> Result<()> {
    if chain_der.is_empty() {
        return Err(VerifyError::CertificateInvalid(
            "certificate chain is empty".to_string(),
        ));
    }

    let chain: Vec<X509Certificate<'_>> = chain_der
        .iter()
        .map(|der| parse_certificate(der))
        .collect::<Result<_>>()?;

    for (i, cert) in chain.iter().enumerate() {
        let validity = cert.validity();
        if now_unix < validity.not_before.timestamp() || now_unix > validity.not_after.timestamp()
        {
            return Err(VerifyError::CertificateInvalid(format!(
                "certificate {i} is not valid at the reference time"
            )));
        }
        if i > 0 {
            let is_ca = cert
                .basic_constraints()
                .is_some_and(|(_critical, bc)| bc.ca);
            if !is_ca {
                return Err(VerifyError::CertificateInvalid(format!(
                    "intermediate certificate {i} is not a CA"
                )));
            }
        }
    }

    for pair in chain.windows(2) {
        let [subject, issuer] = pair else {
            unreachable!("windows(2) always yields 2-element slices")
        };
        if subject.issuer().to_string() != issuer.subject().to_string() {
            return Err(VerifyError::CertificateInvalid(
                "issuer/subject DN mismatch in chain".to_string(),
            ));
        }
        subject
            .verify_signature(Some(issuer.public_key()))
            .map_err(|_| VerifyError::CertificateInvalid("chain signature invalid".to_string()))?;
    }

    if trust_roots.is_empty() {
        return Ok(());
    }

    let roots: Vec<X509Certificate<'_>> = trust_roots
        .iter()
        .map(|der| parse_certificate(der))
        .collect::<Result<_>>()?;

    let terminal = chain.last().expect("chain_der checked non-empty above");
    let anchored = roots.iter().any(|root| {
        if terminal.raw == root.raw {
            return true;
        }
        terminal.issuer().to_string() == root.subject().to_string()
            && terminal.verify_signature(Some(root.public_key())).is_ok()
    });

    if anchored {
        Ok(())
    } else {
        Err(VerifyError::ChainUntrusted)
    }
}
