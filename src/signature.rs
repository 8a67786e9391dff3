// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Signature verification oracle used for certificates and CRLs.

use crate::cert::{Certificate, PublicKeyInfo};
use crate::crl::Crl;
use crate::oid;
use const_oid::ObjectIdentifier;
use log::debug;
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};

/// Verifies a signature over a message with a public key.
///
/// Implementations return `false` for unsupported algorithms rather than
/// failing, which surfaces as a signature finding on the signed object.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        message: &[u8],
        algorithm: &ObjectIdentifier,
        signature: &[u8],
        signer: &PublicKeyInfo,
    ) -> bool;
}

/// Default verifier backed by ring: RSA PKCS#1 v1.5, ECDSA P-256/P-384 and
/// Ed25519.
#[derive(Clone, Copy, Debug, Default)]
pub struct RingVerifier;

impl SignatureVerifier for RingVerifier {
    fn verify(
        &self,
        message: &[u8],
        algorithm: &ObjectIdentifier,
        sig: &[u8],
        signer: &PublicKeyInfo,
    ) -> bool {
        let Some(alg) = ring_algorithm(algorithm, signer) else {
            debug!("unsupported signature algorithm {algorithm}");
            return false;
        };
        UnparsedPublicKey::new(alg, &signer.key)
            .verify(message, sig)
            .is_ok()
    }
}

fn ring_algorithm(
    algorithm: &ObjectIdentifier,
    signer: &PublicKeyInfo,
) -> Option<&'static dyn VerificationAlgorithm> {
    let alg: &'static dyn VerificationAlgorithm = match *algorithm {
        a if a == oid::SHA1_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        a if a == oid::SHA256_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA256,
        a if a == oid::SHA384_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA384,
        a if a == oid::SHA512_WITH_RSA => &signature::RSA_PKCS1_2048_8192_SHA512,
        // The curve follows from the uncompressed point length
        a if a == oid::ECDSA_WITH_SHA256 => match signer.key.len() {
            65 => &signature::ECDSA_P256_SHA256_ASN1,
            97 => &signature::ECDSA_P384_SHA256_ASN1,
            _ => return None,
        },
        a if a == oid::ECDSA_WITH_SHA384 => match signer.key.len() {
            65 => &signature::ECDSA_P256_SHA384_ASN1,
            97 => &signature::ECDSA_P384_SHA384_ASN1,
            _ => return None,
        },
        a if a == oid::ED25519 && signer.algorithm == oid::ED25519 => &signature::ED25519,
        _ => return None,
    };
    Some(alg)
}

/// Verifies a certificate's signature with the given issuer key.
pub fn verify_certificate(
    verifier: &dyn SignatureVerifier,
    cert: &Certificate,
    issuer: &PublicKeyInfo,
) -> bool {
    verifier.verify(cert.tbs(), cert.signature_algorithm(), cert.signature(), issuer)
}

/// Verifies a CRL's signature with the given issuer key.
pub fn verify_crl(verifier: &dyn SignatureVerifier, crl: &Crl, issuer: &PublicKeyInfo) -> bool {
    verifier.verify(crl.tbs(), crl.signature_algorithm(), crl.signature(), issuer)
}

/// Whether the certificate is self-issued and verifies under its own key.
pub fn is_self_signed(verifier: &dyn SignatureVerifier, cert: &Certificate) -> bool {
    cert.is_self_issued() && verify_certificate(verifier, cert, cert.public_key())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::issue::{CertificateTemplate, Issuer};
    use crate::name::DistinguishedName;

    #[test]
    fn test_self_signed_detection() {
        let root = Issuer::from_seed([1u8; 32], DistinguishedName::new().cn("Root"));
        let cert = root.issue(&root, &CertificateTemplate::ca(None)).unwrap();
        assert!(is_self_signed(&RingVerifier, &cert));

        // Same name, different key: self-issued but not self-signed
        let rollover = Issuer::from_seed([2u8; 32], DistinguishedName::new().cn("Root"));
        let cert = rollover.issue(&root, &CertificateTemplate::ca(None)).unwrap();
        assert!(cert.is_self_issued());
        assert!(!is_self_signed(&RingVerifier, &cert));
    }

    #[test]
    fn test_tampered_message_fails() {
        let root = Issuer::from_seed([1u8; 32], DistinguishedName::new().cn("Root"));
        let cert = root.issue(&root, &CertificateTemplate::ca(None)).unwrap();
        let mut tbs = cert.tbs().to_vec();
        let last = tbs.len() - 1;
        tbs[last] ^= 0x01;
        assert!(!RingVerifier.verify(
            &tbs,
            cert.signature_algorithm(),
            cert.signature(),
            cert.public_key()
        ));
    }

    #[test]
    fn test_unsupported_algorithm_fails() {
        let root = Issuer::from_seed([1u8; 32], DistinguishedName::new().cn("Root"));
        let cert = root.issue(&root, &CertificateTemplate::ca(None)).unwrap();
        let unknown = ObjectIdentifier::new_unwrap("1.2.3.4");
        assert!(!RingVerifier.verify(cert.tbs(), &unknown, cert.signature(), cert.public_key()));

        let p256 = PublicKeyInfo {
            algorithm: ObjectIdentifier::new_unwrap("1.2.840.10045.2.1"),
            key: vec![0x04; 10],
            spki: Vec::new(),
        };
        assert!(!RingVerifier.verify(b"msg", &oid::ECDSA_WITH_SHA256, &[0u8; 64], &p256));
    }
}
