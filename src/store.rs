// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Unordered collections of certificates and CRLs.

use crate::cert::Certificate;
use crate::crl::Crl;
use crate::keyid::key_identifier_matches;
use crate::name::{DistinguishedName, name_matches};
use crate::{Error, Result, pem};

/// An unordered, duplicate-free pool of certificates and CRLs.
#[derive(Clone, Debug, Default)]
pub struct CertificateStore {
    certs: Vec<Certificate>,
    crls: Vec<Crl>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given certificates.
    pub fn from_certificates(certs: impl IntoIterator<Item = Certificate>) -> Self {
        let mut store = Self::new();
        for cert in certs {
            store.add(cert);
        }
        store
    }

    /// Adds a certificate, returning false if it was already present.
    pub fn add(&mut self, cert: Certificate) -> bool {
        if self.contains(&cert) {
            return false;
        }
        self.certs.push(cert);
        true
    }

    /// Adds a CRL, returning false if it was already present.
    pub fn add_crl(&mut self, crl: Crl) -> bool {
        if self.crls.contains(&crl) {
            return false;
        }
        self.crls.push(crl);
        true
    }

    /// Adds every certificate in a concatenation of PEM blocks and returns
    /// how many were new.
    pub fn add_pem_bundle(&mut self, bundle: &str) -> Result<usize> {
        const FOOTER: &str = "-----END CERTIFICATE-----";

        let mut added = 0;
        let mut rest = bundle.trim_start();
        while !rest.is_empty() {
            let end = rest.find(FOOTER).ok_or_else(|| Error::Pem {
                details: "unterminated certificate block".into(),
            })? + FOOTER.len();
            let der = pem::decode(rest[..end].as_bytes(), pem::CERTIFICATE_LABEL)?;
            if self.add(Certificate::from_der(&der)?) {
                added += 1;
            }
            rest = rest[end..].trim_start();
        }
        Ok(added)
    }

    pub fn contains(&self, cert: &Certificate) -> bool {
        self.certs.contains(cert)
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certs
    }

    pub fn crls(&self) -> &[Crl] {
        &self.crls
    }

    /// Certificates whose subject matches `name`.
    pub fn find_by_subject<'a>(
        &'a self,
        name: &'a DistinguishedName,
    ) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.certs
            .iter()
            .filter(move |cert| name_matches(cert.subject(), name))
    }

    /// Certificates whose key matches an authority key identifier, either by
    /// their subjectKeyIdentifier or by a computed identifier.
    pub fn find_by_key_id<'a>(
        &'a self,
        key_id: &'a [u8],
    ) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.certs
            .iter()
            .filter(move |cert| key_identifier_matches(cert, key_id))
    }

    /// CRLs whose issuer matches `name`.
    pub fn crls_for_issuer<'a>(
        &'a self,
        name: &'a DistinguishedName,
    ) -> impl Iterator<Item = &'a Crl> + 'a {
        self.crls
            .iter()
            .filter(move |crl| name_matches(crl.issuer(), name))
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty() && self.crls.is_empty()
    }

    pub fn clear(&mut self) {
        self.certs.clear();
        self.crls.clear();
    }
}
