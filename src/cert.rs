// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Immutable certificate model consumed by path building and validation.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-4

use crate::name::{DistinguishedName, name_matches};
use crate::{Error, Result, oid, pem};
use const_oid::ObjectIdentifier;
use der::Decode;
use num_bigint::BigInt;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, CertificatePolicies, CrlDistributionPoints, ExtendedKeyUsage,
    KeyUsage, KeyUsages, NameConstraints as X509NameConstraints, SubjectKeyIdentifier,
};

/// A raw certificate or CRL extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    /// Extension OID.
    pub oid: ObjectIdentifier,
    /// Whether the extension is marked critical.
    pub critical: bool,
    /// DER-encoded extension payload (inside OCTET STRING).
    pub value: Vec<u8>,
}

/// Parsed basicConstraints extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicConstraints {
    /// Whether the subject is a CA.
    pub ca: bool,
    /// Maximum number of non-self-issued intermediates below the subject.
    pub path_len: Option<u8>,
}

/// Directory-name subtrees parsed from a nameConstraints extension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameConstraints {
    /// Permitted directory-name subtrees.
    pub permitted: Vec<DistinguishedName>,
    /// Excluded directory-name subtrees.
    pub excluded: Vec<DistinguishedName>,
    /// Whether any subtree uses a GeneralName form other than directoryName.
    pub unsupported_forms: bool,
}

/// A subject public key with its algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyInfo {
    /// SubjectPublicKeyInfo algorithm OID.
    pub algorithm: ObjectIdentifier,
    /// Raw subjectPublicKey bit string contents.
    pub key: Vec<u8>,
    /// Full DER encoding of the SubjectPublicKeyInfo.
    pub spki: Vec<u8>,
}

#[derive(Debug)]
struct Inner {
    der: Vec<u8>,
    tbs: Vec<u8>,
    serial: BigInt,
    subject: DistinguishedName,
    issuer: DistinguishedName,
    not_before: i64,
    not_after: i64,
    public_key: PublicKeyInfo,
    signature_algorithm: ObjectIdentifier,
    signature: Vec<u8>,
    extensions: Vec<Extension>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
    ext_key_usage: Option<Vec<ObjectIdentifier>>,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    crl_distribution_points: Vec<String>,
    certificate_policies: Option<Vec<ObjectIdentifier>>,
    name_constraints: Option<NameConstraints>,
    undecodable_extensions: Vec<ObjectIdentifier>,
    self_issued: bool,
}

/// An X.509 certificate parsed once and never mutated.
///
/// Identity is the raw DER encoding: two certificates are equal iff their
/// encodings are. Cloning is cheap.
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

impl Certificate {
    /// Parses a DER encoded certificate.
    ///
    /// Only the outer structure must be well formed. Recognised extensions
    /// that fail to decode are recorded and surface as validation findings.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rem, cert) =
            x509_parser::parse_x509_certificate(der).map_err(|e| Error::X509Parse {
                details: e.to_string(),
            })?;
        if !rem.is_empty() {
            return Err(Error::TrailingDerData);
        }
        let tbs = &cert.tbs_certificate;

        let subject = DistinguishedName::from_der(tbs.subject.as_raw())?;
        let issuer = DistinguishedName::from_der(tbs.issuer.as_raw())?;
        let self_issued = name_matches(&subject, &issuer);

        let public_key = PublicKeyInfo {
            algorithm: parse_oid(&tbs.subject_pki.algorithm.algorithm)?,
            key: tbs.subject_pki.subject_public_key.data.to_vec(),
            spki: tbs.subject_pki.raw.to_vec(),
        };

        let mut inner = Inner {
            der: der.to_vec(),
            tbs: tbs.as_ref().to_vec(),
            serial: serial_from_bytes(tbs.raw_serial()),
            subject,
            issuer,
            not_before: tbs.validity.not_before.timestamp(),
            not_after: tbs.validity.not_after.timestamp(),
            public_key,
            signature_algorithm: parse_oid(&cert.signature_algorithm.algorithm)?,
            signature: cert.signature_value.data.to_vec(),
            extensions: Vec::new(),
            basic_constraints: None,
            key_usage: None,
            ext_key_usage: None,
            subject_key_id: None,
            authority_key_id: None,
            crl_distribution_points: Vec::new(),
            certificate_policies: None,
            name_constraints: None,
            undecodable_extensions: Vec::new(),
            self_issued,
        };
        for ext in tbs.extensions() {
            let ext = Extension {
                oid: parse_oid(&ext.oid)?,
                critical: ext.critical,
                value: ext.value.to_vec(),
            };
            if decode_extension(&mut inner, &ext).is_err() {
                inner.undecodable_extensions.push(ext.oid);
            }
            inner.extensions.push(ext);
        }
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Parses a PEM encoded certificate.
    pub fn from_pem(pem_data: &str) -> Result<Self> {
        let der = pem::decode(pem_data.as_bytes(), pem::CERTIFICATE_LABEL)?;
        Self::from_der(&der)
    }

    /// Parses DER or PEM, whichever the data holds.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if pem::is_pem(data) {
            let der = pem::decode(data, pem::CERTIFICATE_LABEL)?;
            return Self::from_der(&der);
        }
        Self::from_der(data)
    }

    /// Returns the PEM encoding of the certificate.
    pub fn to_pem(&self) -> String {
        pem::encode(pem::CERTIFICATE_LABEL, &self.inner.der)
    }

    /// Raw DER encoding; the certificate's identity.
    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    /// DER encoding of the signed TBSCertificate.
    pub fn tbs(&self) -> &[u8] {
        &self.inner.tbs
    }

    /// Serial number as a signed arbitrary-precision integer.
    pub fn serial(&self) -> &BigInt {
        &self.inner.serial
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.inner.subject
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.inner.issuer
    }

    /// NotBefore as a UNIX timestamp (seconds).
    pub fn not_before(&self) -> i64 {
        self.inner.not_before
    }

    /// NotAfter as a UNIX timestamp (seconds).
    pub fn not_after(&self) -> i64 {
        self.inner.not_after
    }

    /// Returns whether `at` falls inside `[not_before, not_after]`.
    pub fn is_valid_at(&self, at: i64) -> bool {
        self.inner.not_before <= at && at <= self.inner.not_after
    }

    pub fn public_key(&self) -> &PublicKeyInfo {
        &self.inner.public_key
    }

    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.inner.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.inner.signature
    }

    /// All extensions in encoding order.
    pub fn extensions(&self) -> &[Extension] {
        &self.inner.extensions
    }

    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.inner.basic_constraints
    }

    /// Whether basicConstraints is present with cA set; absence means false.
    pub fn is_ca(&self) -> bool {
        self.inner.basic_constraints.is_some_and(|bc| bc.ca)
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.inner.key_usage
    }

    /// Whether the key may sign certificates. Absence of keyUsage permits it.
    pub fn allows_cert_sign(&self) -> bool {
        self.inner
            .key_usage
            .is_none_or(|ku| ku.0.contains(KeyUsages::KeyCertSign))
    }

    /// Whether the key may sign CRLs. Absence of keyUsage permits it.
    pub fn allows_crl_sign(&self) -> bool {
        self.inner
            .key_usage
            .is_none_or(|ku| ku.0.contains(KeyUsages::CRLSign))
    }

    /// Extended key usage OIDs, `None` when the extension is absent.
    pub fn ext_key_usage(&self) -> Option<&[ObjectIdentifier]> {
        self.inner.ext_key_usage.as_deref()
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.inner.subject_key_id.as_deref()
    }

    /// The keyIdentifier field of authorityKeyIdentifier, if any.
    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.inner.authority_key_id.as_deref()
    }

    /// URIs listed as full names in cRLDistributionPoints.
    pub fn crl_distribution_points(&self) -> &[String] {
        &self.inner.crl_distribution_points
    }

    /// Certificate policy OIDs, `None` when the extension is absent.
    pub fn certificate_policies(&self) -> Option<&[ObjectIdentifier]> {
        self.inner.certificate_policies.as_deref()
    }

    pub fn name_constraints(&self) -> Option<&NameConstraints> {
        self.inner.name_constraints.as_ref()
    }

    /// Recognised extensions whose payload could not be decoded.
    pub fn undecodable_extensions(&self) -> &[ObjectIdentifier] {
        &self.inner.undecodable_extensions
    }

    /// Critical extensions the validator does not process.
    pub fn unsupported_critical_extensions(&self) -> impl Iterator<Item = &ObjectIdentifier> {
        self.inner
            .extensions
            .iter()
            .filter(|ext| ext.critical && !oid::is_supported_certificate_extension(&ext.oid))
            .map(|ext| &ext.oid)
    }

    /// Whether subject and issuer names match, regardless of signing key.
    pub fn is_self_issued(&self) -> bool {
        self.inner.self_issued
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.der == other.inner.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.inner.subject.to_string())
            .field("issuer", &self.inner.issuer.to_string())
            .field("serial", &self.inner.serial)
            .finish()
    }
}

/// Interprets DER INTEGER content octets as a two's complement big-endian
/// integer.
pub fn serial_from_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_be(bytes)
}

pub(crate) fn parse_oid(oid: &x509_parser::der_parser::oid::Oid<'_>) -> Result<ObjectIdentifier> {
    Ok(ObjectIdentifier::new(oid.to_id_string().as_str())?)
}

/// Decodes the payload of an extension the validator consumes.
fn decode_extension(inner: &mut Inner, ext: &Extension) -> Result<()> {
    let value = ext.value.as_slice();
    match ext.oid {
        oid if oid == oid::BASIC_CONSTRAINTS => {
            let bc = x509_cert::ext::pkix::BasicConstraints::from_der(value)?;
            inner.basic_constraints = Some(BasicConstraints {
                ca: bc.ca,
                path_len: bc.path_len_constraint,
            });
        }
        oid if oid == oid::KEY_USAGE => {
            inner.key_usage = Some(KeyUsage::from_der(value)?);
        }
        oid if oid == oid::EXT_KEY_USAGE => {
            inner.ext_key_usage = Some(ExtendedKeyUsage::from_der(value)?.0);
        }
        oid if oid == oid::SUBJECT_KEY_IDENTIFIER => {
            let ski = SubjectKeyIdentifier::from_der(value)?;
            inner.subject_key_id = Some(ski.0.as_bytes().to_vec());
        }
        oid if oid == oid::AUTHORITY_KEY_IDENTIFIER => {
            let aki = AuthorityKeyIdentifier::from_der(value)?;
            inner.authority_key_id = aki.key_identifier.map(|id| id.as_bytes().to_vec());
        }
        oid if oid == oid::CRL_DISTRIBUTION_POINTS => {
            let dps = CrlDistributionPoints::from_der(value)?;
            for dp in dps.0 {
                if let Some(DistributionPointName::FullName(names)) = dp.distribution_point {
                    for name in names {
                        if let GeneralName::UniformResourceIdentifier(uri) = name {
                            inner.crl_distribution_points.push(uri.to_string());
                        }
                    }
                }
            }
        }
        oid if oid == oid::CERTIFICATE_POLICIES => {
            let policies = CertificatePolicies::from_der(value)?;
            inner.certificate_policies = Some(
                policies
                    .0
                    .into_iter()
                    .map(|info| info.policy_identifier)
                    .collect(),
            );
        }
        oid if oid == oid::NAME_CONSTRAINTS => {
            let nc = X509NameConstraints::from_der(value)?;
            let mut parsed = NameConstraints::default();
            for (subtrees, out) in [
                (nc.permitted_subtrees, &mut parsed.permitted),
                (nc.excluded_subtrees, &mut parsed.excluded),
            ] {
                for subtree in subtrees.unwrap_or_default() {
                    match subtree.base {
                        GeneralName::DirectoryName(name) => {
                            out.push(DistinguishedName::from_x509_name(&name)?)
                        }
                        _ => parsed.unsupported_forms = true,
                    }
                }
            }
            inner.name_constraints = Some(parsed);
        }
        _ => {}
    }
    Ok(())
}
