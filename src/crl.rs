// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Certificate revocation lists.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-5

use crate::cert::{parse_oid, serial_from_bytes};
use crate::name::DistinguishedName;
use crate::{Error, Result, oid, pem};
use const_oid::ObjectIdentifier;
use der::Decode;
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, IssuingDistributionPoint};

/// CRLReason code for entries removed from a delta CRL; never a revocation.
pub const REASON_REMOVE_FROM_CRL: u8 = 8;

/// Which certificates a CRL claims to cover, per its issuingDistributionPoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrlCoverage {
    /// No onlyContains* restriction.
    All,
    /// onlyContainsUserCerts.
    EndEntityOnly,
    /// onlyContainsCACerts.
    CaOnly,
    /// onlyContainsAttributeCerts, or several onlyContains* fields at once.
    Unsupported,
}

/// A single revoked certificate entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevokedEntry {
    pub serial: BigInt,
    pub revocation_date: i64,
    /// CRLReason code, if the entry carries one.
    pub reason: Option<u8>,
    /// Whether the entry carries a critical extension that is not understood.
    pub unsupported_critical: bool,
}

#[derive(Debug)]
struct Inner {
    der: Vec<u8>,
    tbs: Vec<u8>,
    issuer: DistinguishedName,
    this_update: i64,
    next_update: Option<i64>,
    signature_algorithm: ObjectIdentifier,
    signature: Vec<u8>,
    authority_key_id: Option<Vec<u8>>,
    entries: Vec<RevokedEntry>,
    coverage: CrlCoverage,
    partial_reasons: bool,
    indirect: bool,
    delta: bool,
    unsupported_critical: bool,
}

/// A parsed, immutable CRL. Cloning is cheap.
#[derive(Clone)]
pub struct Crl {
    inner: Arc<Inner>,
}

impl Crl {
    /// Parses a DER encoded CertificateList.
    ///
    /// Critical extensions that cannot be decoded are recorded as
    /// unsupported instead of failing the parse, so the CRL still counts
    /// (fail-closed) during revocation checks.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rem, crl) = x509_parser::parse_x509_crl(der).map_err(|e| Error::CrlParse {
            details: e.to_string(),
        })?;
        if !rem.is_empty() {
            return Err(Error::TrailingDerData);
        }
        let mut inner = Inner {
            der: der.to_vec(),
            tbs: crl.tbs_cert_list.as_ref().to_vec(),
            issuer: DistinguishedName::from_der(crl.issuer().as_raw())?,
            this_update: crl.last_update().timestamp(),
            next_update: crl.next_update().map(|t| t.timestamp()),
            signature_algorithm: parse_oid(&crl.signature_algorithm.algorithm)?,
            signature: crl.signature_value.data.to_vec(),
            authority_key_id: None,
            entries: Vec::new(),
            coverage: CrlCoverage::All,
            partial_reasons: false,
            indirect: false,
            delta: false,
            unsupported_critical: false,
        };
        for ext in crl.extensions() {
            let ext_oid = parse_oid(&ext.oid)?;
            let decoded = match ext_oid {
                o if o == oid::AUTHORITY_KEY_IDENTIFIER => {
                    AuthorityKeyIdentifier::from_der(ext.value).map(|aki| {
                        inner.authority_key_id =
                            aki.key_identifier.map(|id| id.as_bytes().to_vec());
                    })
                }
                o if o == oid::ISSUING_DISTRIBUTION_POINT => {
                    IssuingDistributionPoint::from_der(ext.value).map(|idp| {
                        inner.coverage = coverage_of(&idp);
                        inner.partial_reasons = idp.only_some_reasons.is_some();
                        inner.indirect = idp.indirect_crl;
                    })
                }
                o if o == oid::DELTA_CRL_INDICATOR => {
                    inner.delta = true;
                    Ok(())
                }
                _ => Ok(()),
            };
            if ext.critical && (decoded.is_err() || !oid::is_supported_crl_extension(&ext_oid)) {
                inner.unsupported_critical = true;
            }
        }
        for revoked in crl.iter_revoked_certificates() {
            let mut entry = RevokedEntry {
                serial: serial_from_bytes(revoked.raw_serial()),
                revocation_date: revoked.revocation_date.timestamp(),
                reason: None,
                unsupported_critical: false,
            };
            for ext in revoked.extensions() {
                let ext_oid = parse_oid(&ext.oid)?;
                if ext_oid == oid::CRL_REASON {
                    entry.reason = parse_reason(ext.value);
                }
                if ext.critical && !oid::is_supported_crl_entry_extension(&ext_oid) {
                    entry.unsupported_critical = true;
                }
            }
            inner.entries.push(entry);
        }
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Parses a PEM encoded CRL.
    pub fn from_pem(pem_data: &str) -> Result<Self> {
        let der = pem::decode(pem_data.as_bytes(), pem::CRL_LABEL)?;
        Self::from_der(&der)
    }

    /// Parses DER or PEM, whichever the data holds.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if pem::is_pem(data) {
            let der = pem::decode(data, pem::CRL_LABEL)?;
            return Self::from_der(&der);
        }
        Self::from_der(data)
    }

    /// Returns the PEM encoding of the CRL.
    pub fn to_pem(&self) -> String {
        pem::encode(pem::CRL_LABEL, &self.inner.der)
    }

    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    /// DER encoding of the signed TBSCertList.
    pub fn tbs(&self) -> &[u8] {
        &self.inner.tbs
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.inner.issuer
    }

    pub fn this_update(&self) -> i64 {
        self.inner.this_update
    }

    pub fn next_update(&self) -> Option<i64> {
        self.inner.next_update
    }

    /// Whether the CRL is past its nextUpdate at `at`. A CRL without
    /// nextUpdate never expires.
    pub fn is_expired_at(&self, at: i64) -> bool {
        self.inner.next_update.is_some_and(|next| next < at)
    }

    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.inner.signature_algorithm
    }

    pub fn signature(&self) -> &[u8] {
        &self.inner.signature
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.inner.authority_key_id.as_deref()
    }

    pub fn entries(&self) -> &[RevokedEntry] {
        &self.inner.entries
    }

    pub fn coverage(&self) -> CrlCoverage {
        self.inner.coverage
    }

    /// Whether issuingDistributionPoint restricts the CRL to some reasons.
    pub fn has_partial_reasons(&self) -> bool {
        self.inner.partial_reasons
    }

    pub fn is_indirect(&self) -> bool {
        self.inner.indirect
    }

    pub fn is_delta(&self) -> bool {
        self.inner.delta
    }

    /// Whether a critical CRL extension is not understood.
    pub fn has_unsupported_critical_extension(&self) -> bool {
        self.inner.unsupported_critical
    }

    /// Whether the CRL's scope includes a certificate of the given kind.
    pub fn covers(&self, is_ca: bool) -> bool {
        match self.inner.coverage {
            CrlCoverage::All => true,
            CrlCoverage::EndEntityOnly => !is_ca,
            CrlCoverage::CaOnly => is_ca,
            CrlCoverage::Unsupported => false,
        }
    }

    /// Returns the entry revoking `serial`, skipping removeFromCRL entries.
    pub fn find_revoked(&self, serial: &BigInt) -> Option<&RevokedEntry> {
        self.inner
            .entries
            .iter()
            .find(|entry| &entry.serial == serial && entry.reason != Some(REASON_REMOVE_FROM_CRL))
    }
}

impl PartialEq for Crl {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.der == other.inner.der
    }
}

impl Eq for Crl {}

impl fmt::Debug for Crl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crl")
            .field("issuer", &self.inner.issuer.to_string())
            .field("this_update", &self.inner.this_update)
            .field("next_update", &self.inner.next_update)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

fn coverage_of(idp: &IssuingDistributionPoint) -> CrlCoverage {
    match (
        idp.only_contains_user_certs,
        idp.only_contains_ca_certs,
        idp.only_contains_attribute_certs,
    ) {
        (false, false, false) => CrlCoverage::All,
        (true, false, false) => CrlCoverage::EndEntityOnly,
        (false, true, false) => CrlCoverage::CaOnly,
        _ => CrlCoverage::Unsupported,
    }
}

/// Decodes a CRLReason ENUMERATED payload.
fn parse_reason(value: &[u8]) -> Option<u8> {
    match value {
        [0x0A, 0x01, code] => Some(*code),
        _ => None,
    }
}
