// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Ed25519 certificate and CRL issuance for building test hierarchies.

use crate::cert::{BasicConstraints, Certificate, Extension, NameConstraints};
use crate::crl::Crl;
use crate::keyid::{KeyIdMethod, key_identifier};
use crate::name::DistinguishedName;
use crate::{Error, Result, oid};
use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, Ia5String, OctetString, UtcTime};
use der::{Decode, Encode};
use ed25519_dalek::{Signer, SigningKey};
use std::collections::HashSet;
use std::time::Duration;
use x509_cert::certificate::{
    Certificate as X509Certificate, TbsCertificate as X509TbsCertificate, Version,
};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::certpolicy::PolicyInformation;
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::crl::dp::{DistributionPoint, ReasonFlags, Reasons};
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, CertificatePolicies, CrlDistributionPoints, ExtendedKeyUsage,
    IssuingDistributionPoint, KeyUsage, KeyUsages, NameConstraints as X509NameConstraints,
    SubjectKeyIdentifier,
};
use x509_cert::ext::{AsExtension, Extension as X509Extension};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

/// 2010-01-01T00:00:00Z, the default start of template validity windows.
pub const DEFAULT_NOT_BEFORE: i64 = 1_262_304_000;
/// 2031-01-01T00:00:00Z, the default end of template validity windows.
pub const DEFAULT_NOT_AFTER: i64 = 1_924_992_000;

/// First instant that must be encoded as GeneralizedTime (2050-01-01).
const GENERALIZED_TIME_CUTOFF: i64 = 2_524_608_000;

/// Certificate contents to issue. Subject and issuer names default to the
/// names of the keys involved.
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    pub subject: Option<DistinguishedName>,
    pub issuer: Option<DistinguishedName>,
    /// Two's complement serial; random positive 16 bytes when `None`.
    pub serial: Option<Vec<u8>>,
    pub not_before: i64,
    pub not_after: i64,
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    pub ext_key_usage: Vec<ObjectIdentifier>,
    /// Whether to emit subjectKeyIdentifier and authorityKeyIdentifier.
    pub key_identifiers: bool,
    pub crl_distribution_points: Vec<String>,
    pub certificate_policies: Vec<ObjectIdentifier>,
    pub name_constraints: Option<NameConstraints>,
    /// Additional raw extensions, appended last.
    pub extensions: Vec<Extension>,
}

impl Default for CertificateTemplate {
    fn default() -> Self {
        Self {
            subject: None,
            issuer: None,
            serial: None,
            not_before: DEFAULT_NOT_BEFORE,
            not_after: DEFAULT_NOT_AFTER,
            basic_constraints: None,
            key_usage: None,
            ext_key_usage: Vec::new(),
            key_identifiers: true,
            crl_distribution_points: Vec::new(),
            certificate_policies: Vec::new(),
            name_constraints: None,
            extensions: Vec::new(),
        }
    }
}

impl CertificateTemplate {
    /// A CA profile: critical basicConstraints with cA set and keyUsage
    /// allowing certificate and CRL signing.
    pub fn ca(path_len: Option<u8>) -> Self {
        Self {
            basic_constraints: Some(BasicConstraints { ca: true, path_len }),
            key_usage: Some(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
            ..Default::default()
        }
    }
}

/// Scope restrictions written into an issuingDistributionPoint extension.
#[derive(Clone, Debug, Default)]
pub struct CrlScope {
    pub only_user_certs: bool,
    pub only_ca_certs: bool,
    pub only_attribute_certs: bool,
    /// Restricts the CRL to keyCompromise revocations.
    pub only_some_reasons: bool,
    pub indirect: bool,
}

/// One revoked certificate in a CRL template.
#[derive(Clone, Debug)]
pub struct RevokedTemplate {
    /// Two's complement serial bytes.
    pub serial: Vec<u8>,
    pub revocation_date: i64,
    pub reason: Option<u8>,
    pub extensions: Vec<Extension>,
}

impl RevokedTemplate {
    pub fn new(serial: Vec<u8>) -> Self {
        Self {
            serial,
            revocation_date: DEFAULT_NOT_BEFORE,
            reason: None,
            extensions: Vec::new(),
        }
    }
}

/// CRL contents to issue.
#[derive(Clone, Debug)]
pub struct CrlTemplate {
    /// Issuer name; the signing key's name when `None`.
    pub issuer: Option<DistinguishedName>,
    pub this_update: i64,
    pub next_update: Option<i64>,
    pub revoked: Vec<RevokedTemplate>,
    pub crl_number: Option<u64>,
    /// Whether to emit authorityKeyIdentifier.
    pub authority_key_id: bool,
    pub scope: Option<CrlScope>,
    /// Marks the CRL as a delta against the given base CRL number.
    pub delta_base: Option<u64>,
    pub extensions: Vec<Extension>,
}

impl Default for CrlTemplate {
    fn default() -> Self {
        Self {
            issuer: None,
            this_update: DEFAULT_NOT_BEFORE,
            next_update: Some(DEFAULT_NOT_AFTER),
            revoked: Vec::new(),
            crl_number: Some(1),
            authority_key_id: true,
            scope: None,
            delta_base: None,
            extensions: Vec::new(),
        }
    }
}

/// An Ed25519 key bound to a distinguished name, able to issue
/// certificates and CRLs.
pub struct Issuer {
    key: SigningKey,
    name: DistinguishedName,
}

impl Issuer {
    /// Creates an issuer from a 32 byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32], name: DistinguishedName) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
            name,
        }
    }

    /// Creates an issuer with a fresh random key.
    pub fn generate(name: DistinguishedName) -> Result<Self> {
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed).map_err(|e| Error::External(Box::new(e)))?;
        Ok(Self::from_seed(seed, name))
    }

    pub fn name(&self) -> &DistinguishedName {
        &self.name
    }

    /// Raw Ed25519 public key bytes.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.key.verifying_key().to_bytes().to_vec()
    }

    /// Issues a certificate binding `subject`'s key and returns its DER.
    pub fn issue_der(&self, subject: &Issuer, template: &CertificateTemplate) -> Result<Vec<u8>> {
        let subject_name = template.subject.as_ref().unwrap_or(&subject.name);
        let issuer_name = template.issuer.as_ref().unwrap_or(&self.name);
        if subject_name.is_empty() {
            return Err(Error::EmptyDistinguishedName { field: "subject" });
        }
        if issuer_name.is_empty() {
            return Err(Error::EmptyDistinguishedName { field: "issuer" });
        }
        if template.not_before >= template.not_after {
            return Err(Error::InvalidValidity);
        }
        let subject_name = subject_name.to_x509_name()?;
        let issuer_name = issuer_name.to_x509_name()?;
        let subject_key = subject.public_key_bytes();

        // Track OIDs so custom extensions cannot shadow generated ones
        let mut extensions = Vec::<X509Extension>::new();
        let mut extension_oids = HashSet::new();
        let mut push = |ext: X509Extension| -> Result<()> {
            if !extension_oids.insert(ext.extn_id) {
                return Err(Error::DuplicateExtensionOid {
                    oid: ext.extn_id.to_string(),
                });
            }
            extensions.push(ext);
            Ok(())
        };

        if let Some(bc) = template.basic_constraints {
            let bc = x509_cert::ext::pkix::BasicConstraints {
                ca: bc.ca,
                path_len_constraint: bc.path_len,
            };
            push(bc.to_extension(&subject_name, &[])?)?;
        }
        if let Some(ku) = template.key_usage {
            push(ku.to_extension(&subject_name, &[])?)?;
        }
        if !template.ext_key_usage.is_empty() {
            let eku = ExtendedKeyUsage(template.ext_key_usage.clone());
            push(eku.to_extension(&subject_name, &[])?)?;
        }
        if template.key_identifiers {
            let ski = SubjectKeyIdentifier(OctetString::new(full_key_id(&subject_key))?);
            push(ski.to_extension(&subject_name, &[])?)?;
            let aki = make_aki(&self.public_key_bytes())?;
            push(aki.to_extension(&subject_name, &[])?)?;
        }
        if !template.crl_distribution_points.is_empty() {
            let mut names = Vec::new();
            for url in &template.crl_distribution_points {
                names.push(GeneralName::UniformResourceIdentifier(Ia5String::new(
                    url.as_str(),
                )?));
            }
            let dps = CrlDistributionPoints(vec![DistributionPoint {
                distribution_point: Some(DistributionPointName::FullName(names)),
                reasons: None,
                crl_issuer: None,
            }]);
            push(dps.to_extension(&subject_name, &[])?)?;
        }
        if !template.certificate_policies.is_empty() {
            let policies = CertificatePolicies(
                template
                    .certificate_policies
                    .iter()
                    .map(|policy| PolicyInformation {
                        policy_identifier: *policy,
                        policy_qualifiers: None,
                    })
                    .collect(),
            );
            push(policies.to_extension(&subject_name, &[])?)?;
        }
        if let Some(nc) = &template.name_constraints {
            let nc = X509NameConstraints {
                permitted_subtrees: subtrees(&nc.permitted)?,
                excluded_subtrees: subtrees(&nc.excluded)?,
            };
            push(nc.to_extension(&subject_name, &[])?)?;
        }
        for custom in &template.extensions {
            push(raw_extension(custom)?)?;
        }

        let signature_alg = AlgorithmIdentifierOwned {
            oid: oid::ED25519,
            parameters: None,
        };
        let tbs_certificate = X509TbsCertificate {
            version: Version::V3,
            serial_number: serial_number(template.serial.as_deref())?,
            signature: signature_alg.clone(),
            issuer: issuer_name,
            validity: Validity {
                not_before: encode_time(template.not_before)?,
                not_after: encode_time(template.not_after)?,
            },
            subject: subject_name,
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: oid::ED25519,
                    parameters: None,
                },
                subject_public_key: BitString::from_bytes(&subject_key)?,
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        };

        // Sign the canonical DER encoding of TBSCertificate
        let tbs_der = tbs_certificate.to_der()?;
        let signature = self.key.sign(&tbs_der);

        let cert = X509Certificate {
            tbs_certificate,
            signature_algorithm: signature_alg,
            signature: BitString::from_bytes(&signature.to_bytes())?,
        };
        Ok(cert.to_der()?)
    }

    /// Issues a certificate binding `subject`'s key and parses it back.
    pub fn issue(&self, subject: &Issuer, template: &CertificateTemplate) -> Result<Certificate> {
        Certificate::from_der(&self.issue_der(subject, template)?)
    }

    /// Signs a CRL and returns its DER.
    pub fn sign_crl_der(&self, template: &CrlTemplate) -> Result<Vec<u8>> {
        let issuer_name = template.issuer.as_ref().unwrap_or(&self.name);
        if issuer_name.is_empty() {
            return Err(Error::EmptyDistinguishedName { field: "issuer" });
        }
        let mut revoked = Vec::with_capacity(template.revoked.len());
        for entry in &template.revoked {
            let mut extensions = Vec::new();
            if let Some(reason) = entry.reason {
                extensions.push(X509Extension {
                    extn_id: oid::CRL_REASON,
                    critical: false,
                    extn_value: OctetString::new(vec![0x0A, 0x01, reason])?,
                });
            }
            for custom in &entry.extensions {
                extensions.push(raw_extension(custom)?);
            }
            let cert: RevokedCert = RevokedCert {
                serial_number: serial_number(Some(&entry.serial))?,
                revocation_date: encode_time(entry.revocation_date)?,
                crl_entry_extensions: (!extensions.is_empty()).then_some(extensions),
            };
            revoked.push(cert);
        }

        let mut extensions = Vec::new();
        if template.authority_key_id {
            let aki = make_aki(&self.public_key_bytes())?;
            extensions.push(X509Extension {
                extn_id: oid::AUTHORITY_KEY_IDENTIFIER,
                critical: false,
                extn_value: OctetString::new(aki.to_der()?)?,
            });
        }
        if let Some(number) = template.crl_number {
            extensions.push(X509Extension {
                extn_id: oid::CRL_NUMBER,
                critical: false,
                extn_value: OctetString::new(number.to_der()?)?,
            });
        }
        if let Some(base) = template.delta_base {
            extensions.push(X509Extension {
                extn_id: oid::DELTA_CRL_INDICATOR,
                critical: true,
                extn_value: OctetString::new(base.to_der()?)?,
            });
        }
        if let Some(scope) = &template.scope {
            let idp = IssuingDistributionPoint {
                distribution_point: None,
                only_contains_user_certs: scope.only_user_certs,
                only_contains_ca_certs: scope.only_ca_certs,
                only_some_reasons: scope
                    .only_some_reasons
                    .then(|| ReasonFlags::from(Reasons::KeyCompromise)),
                indirect_crl: scope.indirect,
                only_contains_attribute_certs: scope.only_attribute_certs,
            };
            extensions.push(X509Extension {
                extn_id: oid::ISSUING_DISTRIBUTION_POINT,
                critical: true,
                extn_value: OctetString::new(idp.to_der()?)?,
            });
        }
        for custom in &template.extensions {
            extensions.push(raw_extension(custom)?);
        }

        let signature_alg = AlgorithmIdentifierOwned {
            oid: oid::ED25519,
            parameters: None,
        };
        let tbs_cert_list: TbsCertList = TbsCertList {
            version: Version::V2,
            signature: signature_alg.clone(),
            issuer: issuer_name.to_x509_name()?,
            this_update: encode_time(template.this_update)?,
            next_update: template.next_update.map(encode_time).transpose()?,
            revoked_certificates: (!revoked.is_empty()).then_some(revoked),
            crl_extensions: (!extensions.is_empty()).then_some(extensions),
        };
        let tbs_der = tbs_cert_list.to_der()?;
        let signature = self.key.sign(&tbs_der);

        let crl: CertificateList = CertificateList {
            tbs_cert_list,
            signature_algorithm: signature_alg,
            signature: BitString::from_bytes(&signature.to_bytes())?,
        };
        Ok(crl.to_der()?)
    }

    /// Signs a CRL and parses it back.
    pub fn sign_crl(&self, template: &CrlTemplate) -> Result<Crl> {
        Crl::from_der(&self.sign_crl_der(template)?)
    }
}

/// Encodes a UNIX timestamp, switching to GeneralizedTime from 2050 on.
fn encode_time(at: i64) -> Result<Time> {
    let secs = u64::try_from(at).map_err(|_| Error::InvalidValidity)?;
    let duration = Duration::from_secs(secs);
    if at < GENERALIZED_TIME_CUTOFF {
        Ok(Time::UtcTime(UtcTime::from_unix_duration(duration)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_unix_duration(duration)?))
    }
}

/// Builds a serial number from two's complement bytes, or a random positive
/// one when none is given.
fn serial_number(bytes: Option<&[u8]>) -> Result<SerialNumber> {
    let bytes = match bytes {
        Some(bytes) => bytes.to_vec(),
        None => {
            let mut random = [0u8; 16];
            getrandom::fill(&mut random).map_err(|e| Error::External(Box::new(e)))?;
            random[0] &= 0x7F; // Ensure positive (MSB = 0)
            random[0] |= 0x01; // Ensure minimal encoding
            random.to_vec()
        }
    };
    if bytes.is_empty() || bytes.len() > 20 {
        return Err(Error::InvalidSerial {
            details: format!("serial must be 1..=20 octets, got {}", bytes.len()),
        });
    }
    // Decode from a full INTEGER TLV to keep the sign of the given bytes.
    let mut tlv = vec![0x02, bytes.len() as u8];
    tlv.extend_from_slice(&bytes);
    SerialNumber::from_der(&tlv).map_err(|e| Error::InvalidSerial {
        details: e.to_string(),
    })
}

fn full_key_id(public_key: &[u8]) -> Vec<u8> {
    let info = crate::cert::PublicKeyInfo {
        algorithm: oid::ED25519,
        key: public_key.to_vec(),
        spki: Vec::new(),
    };
    key_identifier(&info, KeyIdMethod::Full)
}

/// Builds AuthorityKeyIdentifier as SHA-1(issuer subjectPublicKey bytes).
fn make_aki(public_key: &[u8]) -> Result<AuthorityKeyIdentifier> {
    Ok(AuthorityKeyIdentifier {
        key_identifier: Some(OctetString::new(full_key_id(public_key))?),
        authority_cert_issuer: None,
        authority_cert_serial_number: None,
    })
}

fn subtrees(names: &[DistinguishedName]) -> Result<Option<Vec<GeneralSubtree>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        out.push(GeneralSubtree {
            base: GeneralName::DirectoryName(name.to_x509_name()?),
            minimum: 0,
            maximum: None,
        });
    }
    Ok(Some(out))
}

fn raw_extension(ext: &Extension) -> Result<X509Extension> {
    Ok(X509Extension {
        extn_id: ext.oid,
        critical: ext.critical,
        extn_value: OctetString::new(ext.value.clone())?,
    })
}
