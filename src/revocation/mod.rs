// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! CRL-based revocation checking.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-6.3

mod cache;
mod fetch;

pub use cache::CrlCache;
pub use fetch::{CrlFetcher, DirectoryFetcher, FetchError};

use crate::cert::Certificate;
use crate::crl::Crl;
use crate::keyid::key_identifier_matches;
use crate::name::name_matches;
use crate::policy::{ChainPolicy, RevocationMode};
use crate::signature::{SignatureVerifier, verify_crl};
use crate::status::ChainStatusFlags;
use log::{debug, warn};
use std::sync::Arc;

/// Revocation verdict for one certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationStatus {
    Good,
    Revoked,
    Unknown,
}

/// Revocation verdict plus side findings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevocationOutcome {
    pub status: RevocationStatus,
    /// The CRL issuer's keyUsage lacks cRLSign.
    pub crl_signer_wrong_usage: bool,
}

impl RevocationOutcome {
    pub fn good() -> Self {
        Self {
            status: RevocationStatus::Good,
            crl_signer_wrong_usage: false,
        }
    }

    pub fn revoked() -> Self {
        Self {
            status: RevocationStatus::Revoked,
            crl_signer_wrong_usage: false,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: RevocationStatus::Unknown,
            crl_signer_wrong_usage: false,
        }
    }

    /// Findings to merge into the checked certificate's element.
    pub fn flags(&self) -> ChainStatusFlags {
        match self.status {
            RevocationStatus::Good => ChainStatusFlags::empty(),
            RevocationStatus::Revoked => ChainStatusFlags::REVOKED,
            RevocationStatus::Unknown => {
                ChainStatusFlags::REVOCATION_STATUS_UNKNOWN | ChainStatusFlags::OFFLINE_REVOCATION
            }
        }
    }
}

/// Answers revocation queries from the policy's extra store, an optional
/// CRL cache and, in online mode, an optional distribution point fetcher.
#[derive(Clone)]
pub struct RevocationOracle {
    verifier: Arc<dyn SignatureVerifier>,
    cache: Option<Arc<CrlCache>>,
    fetcher: Option<Arc<dyn CrlFetcher>>,
}

impl RevocationOracle {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            verifier,
            cache: None,
            fetcher: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CrlCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn CrlFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Checks `cert`, issued by `issuer`, at the policy's verification time.
    pub fn check_revocation(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
        policy: &ChainPolicy,
    ) -> RevocationOutcome {
        self.check_revocation_at(cert, issuer, policy, policy.verification_time.timestamp())
    }

    /// Checks `cert`, issued by `issuer`, at the unix timestamp `at`.
    ///
    /// Every CRL from the issuer is consulted: the certificate is revoked if
    /// any of them lists it, and good only if one of them is current and
    /// complete. Anything else is unknown.
    pub fn check_revocation_at(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
        policy: &ChainPolicy,
        at: i64,
    ) -> RevocationOutcome {
        if policy.revocation_mode == RevocationMode::NoCheck {
            return RevocationOutcome::good();
        }
        if !issuer.allows_crl_sign() {
            debug!("CRL issuer {} lacks cRLSign", issuer.subject());
            return RevocationOutcome {
                status: RevocationStatus::Unknown,
                crl_signer_wrong_usage: true,
            };
        }
        let mut revoked = false;
        let mut fresh = false;

        for crl in self.candidate_crls(cert, issuer, policy, at) {
            if crl.is_delta() {
                debug!("skipping delta CRL from {}", crl.issuer());
                continue;
            }
            if crl.is_indirect() || !crl.covers(cert.is_ca()) {
                debug!("CRL from {} does not cover {}", crl.issuer(), cert.subject());
                continue;
            }
            // CRLs signed by a key other than the certificate signer's are unsupported
            if let Some(aki) = crl.authority_key_id()
                && !key_identifier_matches(issuer, aki)
            {
                debug!("CRL from {} is signed by a separate key", crl.issuer());
                continue;
            }
            if !verify_crl(self.verifier.as_ref(), &crl, issuer.public_key()) {
                debug!("CRL from {} has an invalid signature", crl.issuer());
                continue;
            }
            if crl.this_update() > at {
                debug!("CRL from {} is not yet valid", crl.issuer());
                continue;
            }
            if crl.has_unsupported_critical_extension()
                || crl.entries().iter().any(|entry| entry.unsupported_critical)
            {
                debug!("CRL from {} has unsupported critical extensions", crl.issuer());
                revoked = true;
                continue;
            }
            if crl.find_revoked(cert.serial()).is_some() {
                revoked = true;
                continue;
            }
            if !crl.is_expired_at(at) && !crl.has_partial_reasons() {
                fresh = true;
            }
        }
        if revoked {
            RevocationOutcome::revoked()
        } else if fresh {
            RevocationOutcome::good()
        } else {
            debug!("no current CRL for {}", cert.subject());
            RevocationOutcome::unknown()
        }
    }

    /// Collects CRLs naming the issuer from every source the mode permits.
    ///
    /// Online mode refetches a distribution point unless the cache already
    /// holds a copy that is current at `at`.
    fn candidate_crls(
        &self,
        cert: &Certificate,
        issuer: &Certificate,
        policy: &ChainPolicy,
        at: i64,
    ) -> Vec<Crl> {
        let mut crls: Vec<Crl> = policy
            .extra_store
            .crls_for_issuer(issuer.subject())
            .cloned()
            .collect();
        if let Some(cache) = &self.cache {
            for crl in cache.for_issuer(issuer.subject()) {
                push_unique(&mut crls, crl);
            }
        }
        if policy.revocation_mode != RevocationMode::Online {
            return crls;
        }
        let Some(fetcher) = &self.fetcher else {
            return crls;
        };
        for url in cert.crl_distribution_points() {
            if let Some(cache) = &self.cache
                && cache.get(url).is_some_and(|crl| !crl.is_expired_at(at))
            {
                continue;
            }
            let bytes = match fetch::fetch_with_timeout(
                fetcher.clone(),
                url,
                policy.url_retrieval_timeout,
            ) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("{err}");
                    continue;
                }
            };
            let crl = match Crl::from_bytes(&bytes) {
                Ok(crl) => crl,
                Err(err) => {
                    warn!("discarding unparseable CRL from {url}: {err}");
                    continue;
                }
            };
            if let Some(cache) = &self.cache {
                cache.insert(url.clone(), crl.clone());
            }
            if name_matches(crl.issuer(), issuer.subject()) {
                push_unique(&mut crls, crl);
            }
        }
        crls
    }
}

fn push_unique(crls: &mut Vec<Crl>, crl: Crl) {
    if !crls.contains(&crl) {
        crls.push(crl);
    }
}
