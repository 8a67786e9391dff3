// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chain building entry point tying the builder, validator and revocation
//! oracle to a caller-owned policy.

use crate::Result;
use crate::builder::PathBuilder;
use crate::cert::Certificate;
use crate::policy::ChainPolicy;
use crate::revocation::{CrlCache, CrlFetcher, RevocationOracle};
use crate::signature::{RingVerifier, SignatureVerifier};
use crate::status::ChainStatusFlags;
use crate::store::CertificateStore;
use crate::validator::{ValidationContext, validate};
use log::info;
use std::sync::Arc;

/// One certificate of a validated chain with its findings.
#[derive(Clone, Debug)]
pub struct ChainElement {
    pub certificate: Certificate,
    /// Findings left after verification-flag masking.
    pub status: ChainStatusFlags,
    /// Every finding, before masking.
    pub raw_status: ChainStatusFlags,
}

/// The outcome of a chain build, end entity first.
#[derive(Clone, Debug, Default)]
pub struct ChainResult {
    pub elements: Vec<ChainElement>,
    /// Union of the element statuses and chain-level findings, after masking.
    pub status: ChainStatusFlags,
}

impl ChainResult {
    /// Whether nothing remains after masking.
    pub fn is_valid(&self) -> bool {
        self.status.is_empty()
    }

    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.elements.iter().map(|element| &element.certificate)
    }
}

/// Builds and validates certification paths against a set of trust anchors.
///
/// A chain owns its policy and the result of its latest build. It is not
/// safe to build concurrently on one chain; separate chains may share
/// stores and a CRL cache.
pub struct Chain {
    policy: ChainPolicy,
    trust_anchors: Arc<CertificateStore>,
    intermediates: Arc<CertificateStore>,
    verifier: Arc<dyn SignatureVerifier>,
    crl_cache: Option<Arc<CrlCache>>,
    fetcher: Option<Arc<dyn CrlFetcher>>,
    result: Option<ChainResult>,
}

impl Chain {
    /// Creates a chain with the default policy and signature verifier.
    pub fn new(trust_anchors: Arc<CertificateStore>) -> Self {
        Self {
            policy: ChainPolicy::default(),
            trust_anchors,
            intermediates: Arc::new(CertificateStore::new()),
            verifier: Arc::new(RingVerifier),
            crl_cache: None,
            fetcher: None,
            result: None,
        }
    }

    /// Sets the pool of untrusted candidate issuers.
    pub fn with_intermediates(mut self, intermediates: Arc<CertificateStore>) -> Self {
        self.intermediates = intermediates;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_crl_cache(mut self, cache: Arc<CrlCache>) -> Self {
        self.crl_cache = Some(cache);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn CrlFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn policy(&self) -> &ChainPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ChainPolicy {
        &mut self.policy
    }

    /// Builds and validates a path for `end_entity`, replacing any earlier
    /// result. Returns whether the chain is valid after masking.
    ///
    /// Validation findings never fail the call; errors are reserved for
    /// unusable input.
    pub fn build(&mut self, end_entity: &Certificate) -> Result<bool> {
        self.result = None;

        let path = PathBuilder::new(&self.trust_anchors, self.verifier.as_ref())
            .with_pool(&self.intermediates)
            .with_pool(&self.policy.extra_store)
            .with_max_depth(self.policy.max_depth)
            .build(end_entity)?;

        let mut oracle = RevocationOracle::new(self.verifier.clone());
        if let Some(cache) = &self.crl_cache {
            oracle = oracle.with_cache(cache.clone());
        }
        if let Some(fetcher) = &self.fetcher {
            oracle = oracle.with_fetcher(fetcher.clone());
        }
        let ctx = ValidationContext {
            policy: &self.policy,
            verifier: self.verifier.as_ref(),
            oracle: &oracle,
            time: self.policy.verification_time.timestamp(),
        };
        let result = validate(&path, &ctx);
        let valid = result.is_valid();
        info!(
            "chain for {}: {} elements, status {:?}",
            end_entity.subject(),
            result.elements.len(),
            result.status
        );
        self.result = Some(result);
        Ok(valid)
    }

    /// The latest build result, if any.
    pub fn result(&self) -> Option<&ChainResult> {
        self.result.as_ref()
    }

    /// Elements of the latest build, empty when there is none.
    pub fn elements(&self) -> &[ChainElement] {
        self.result
            .as_ref()
            .map(|result| result.elements.as_slice())
            .unwrap_or_default()
    }

    /// Aggregate status of the latest build.
    pub fn status(&self) -> ChainStatusFlags {
        self.result
            .as_ref()
            .map(|result| result.status)
            .unwrap_or_default()
    }

    /// Discards the latest result. The policy is left untouched.
    pub fn reset(&mut self) {
        self.result = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use crate::cert::Extension;
    use crate::crl::Crl;
    use crate::issue::{CertificateTemplate, CrlTemplate, Issuer, RevokedTemplate};
    use crate::name::DistinguishedName;
    use crate::policy::{RevocationMode, VerificationTime};
    use crate::revocation::DirectoryFetcher;
    use crate::status::VerificationFlags;
    use const_oid::ObjectIdentifier;
    use std::path::PathBuf;

    const AT: i64 = 1_577_836_800; // 2020-01-01

    fn pkits_name(cn: &str) -> DistinguishedName {
        DistinguishedName::new()
            .c("US")
            .o("Test Certificates 2011")
            .cn(cn)
    }

    struct Pkits {
        anchor: Issuer,
        ca: Issuer,
        anchor_cert: Certificate,
        ca_cert: Certificate,
        ee_cert: Certificate,
    }

    fn pkits(ca_template: CertificateTemplate, ee_template: CertificateTemplate) -> Pkits {
        let anchor = Issuer::from_seed([1u8; 32], pkits_name("Trust Anchor"));
        let ca = Issuer::from_seed([2u8; 32], pkits_name("Good CA"));
        let ee = Issuer::from_seed([3u8; 32], pkits_name("Valid Certificate Path Test1 EE"));

        let anchor_cert = anchor.issue(&anchor, &CertificateTemplate::ca(None)).unwrap();
        let ca_cert = anchor
            .issue(
                &ca,
                &CertificateTemplate {
                    serial: Some(vec![0x02]),
                    ..ca_template
                },
            )
            .unwrap();
        let ee_cert = ca
            .issue(
                &ee,
                &CertificateTemplate {
                    serial: Some(vec![0x01]),
                    ..ee_template
                },
            )
            .unwrap();
        Pkits {
            anchor,
            ca,
            anchor_cert,
            ca_cert,
            ee_cert,
        }
    }

    fn standard() -> Pkits {
        pkits(CertificateTemplate::ca(None), CertificateTemplate::default())
    }

    fn chain_for(p: &Pkits, crls: Vec<Crl>) -> Chain {
        let mut store = CertificateStore::new();
        for crl in crls {
            store.add_crl(crl);
        }
        let mut chain = Chain::new(Arc::new(CertificateStore::from_certificates([
            p.anchor_cert.clone(),
        ])))
        .with_intermediates(Arc::new(CertificateStore::from_certificates([
            p.ca_cert.clone(),
        ])));
        let policy = chain.policy_mut();
        policy.revocation_mode = RevocationMode::Offline;
        policy.verification_time = VerificationTime::At(AT);
        policy.extra_store = Arc::new(store);
        chain
    }

    fn clean_crls(p: &Pkits) -> Vec<Crl> {
        vec![
            p.anchor.sign_crl(&CrlTemplate::default()).unwrap(),
            p.ca.sign_crl(&CrlTemplate::default()).unwrap(),
        ]
    }

    fn statuses(chain: &Chain) -> Vec<ChainStatusFlags> {
        chain.elements().iter().map(|e| e.status).collect()
    }

    const UNKNOWN: ChainStatusFlags = ChainStatusFlags::REVOCATION_STATUS_UNKNOWN
        .union(ChainStatusFlags::OFFLINE_REVOCATION);

    #[test]
    fn test_valid_certificate_path() {
        let p = standard();
        let mut chain = chain_for(&p, clean_crls(&p));

        assert!(chain.build(&p.ee_cert).unwrap());
        assert!(chain.status().is_empty());
        assert_eq!(statuses(&chain), vec![ChainStatusFlags::empty(); 3]);
        let certs: Vec<_> = chain.result().unwrap().certificates().cloned().collect();
        assert_eq!(certs, vec![p.ee_cert, p.ca_cert, p.anchor_cert]);
    }

    #[test]
    fn test_intermediate_not_yet_valid() {
        let p = pkits(
            CertificateTemplate {
                not_before: AT + 86_400,
                ..CertificateTemplate::ca(None)
            },
            CertificateTemplate::default(),
        );
        let mut chain = chain_for(&p, clean_crls(&p));

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.status(), ChainStatusFlags::NOT_TIME_VALID);
        assert_eq!(
            statuses(&chain),
            vec![
                ChainStatusFlags::empty(),
                ChainStatusFlags::NOT_TIME_VALID,
                ChainStatusFlags::empty(),
            ]
        );

        chain.policy_mut().verification_flags = VerificationFlags::IGNORE_NOT_TIME_VALID;
        assert!(chain.build(&p.ee_cert).unwrap());
        assert_eq!(
            chain.elements()[1].raw_status,
            ChainStatusFlags::NOT_TIME_VALID
        );
    }

    #[test]
    fn test_revoked_intermediate() {
        let p = standard();
        let crls = vec![
            p.anchor
                .sign_crl(&CrlTemplate {
                    revoked: vec![RevokedTemplate::new(vec![0x02])],
                    ..Default::default()
                })
                .unwrap(),
            p.ca.sign_crl(&CrlTemplate::default()).unwrap(),
        ];
        let mut chain = chain_for(&p, crls);

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(
            statuses(&chain),
            vec![UNKNOWN, ChainStatusFlags::REVOKED, ChainStatusFlags::empty()]
        );
        assert_eq!(chain.status(), ChainStatusFlags::REVOKED | UNKNOWN);
    }

    #[test]
    fn test_missing_crls() {
        let p = standard();
        let mut chain = chain_for(&p, vec![]);

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(
            statuses(&chain),
            vec![UNKNOWN, UNKNOWN, ChainStatusFlags::empty()]
        );

        chain.policy_mut().verification_flags =
            VerificationFlags::IGNORE_END_REVOCATION_UNKNOWN;
        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.status(), UNKNOWN);
        assert!(chain.elements()[0].status.is_empty());

        chain.policy_mut().verification_flags |=
            VerificationFlags::IGNORE_CERTIFICATE_AUTHORITY_REVOCATION_UNKNOWN;
        assert!(chain.build(&p.ee_cert).unwrap());
    }

    #[test]
    fn test_multiple_and_expired_crls() {
        let p = standard();
        let mut crls = clean_crls(&p);
        crls.push(
            p.ca.sign_crl(&CrlTemplate {
                crl_number: Some(2),
                revoked: vec![RevokedTemplate::new(vec![0x01])],
                ..Default::default()
            })
            .unwrap(),
        );
        let mut chain = chain_for(&p, crls);
        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.elements()[0].status, ChainStatusFlags::REVOKED);

        let crls = vec![
            p.anchor.sign_crl(&CrlTemplate::default()).unwrap(),
            p.ca.sign_crl(&CrlTemplate {
                next_update: Some(AT - 86_400),
                ..Default::default()
            })
            .unwrap(),
        ];
        let mut chain = chain_for(&p, crls);
        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.elements()[0].status, UNKNOWN);
        assert!(chain.elements()[1].status.is_empty());
    }

    #[test]
    fn test_path_length_constraint() {
        let anchor = Issuer::from_seed([1u8; 32], pkits_name("Trust Anchor"));
        let ca = Issuer::from_seed([2u8; 32], pkits_name("pathLenConstraint0 CA"));
        let sub = Issuer::from_seed([4u8; 32], pkits_name("pathLenConstraint0 subCA"));
        let ee = Issuer::from_seed([3u8; 32], pkits_name("Invalid pathLenConstraint Test EE"));

        let anchor_cert = anchor.issue(&anchor, &CertificateTemplate::ca(None)).unwrap();
        let ca_cert = anchor.issue(&ca, &CertificateTemplate::ca(Some(0))).unwrap();
        let sub_cert = ca.issue(&sub, &CertificateTemplate::ca(None)).unwrap();
        let ee_cert = sub.issue(&ee, &CertificateTemplate::default()).unwrap();

        let mut chain = Chain::new(Arc::new(CertificateStore::from_certificates([anchor_cert])))
            .with_intermediates(Arc::new(CertificateStore::from_certificates([
                ca_cert, sub_cert,
            ])));
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;
        chain.policy_mut().verification_time = VerificationTime::At(AT);

        assert!(!chain.build(&ee_cert).unwrap());
        assert_eq!(
            statuses(&chain),
            vec![
                ChainStatusFlags::empty(),
                ChainStatusFlags::empty(),
                ChainStatusFlags::INVALID_BASIC_CONSTRAINTS,
                ChainStatusFlags::empty(),
            ]
        );
        chain.policy_mut().verification_flags = VerificationFlags::IGNORE_INVALID_BASIC_CONSTRAINTS;
        assert!(chain.build(&ee_cert).unwrap());
    }

    #[test]
    fn test_self_issued_does_not_consume_path_length() {
        let anchor = Issuer::from_seed([1u8; 32], pkits_name("Trust Anchor"));
        let ca = Issuer::from_seed([2u8; 32], pkits_name("pathLenConstraint0 CA"));
        let rolled = Issuer::from_seed([5u8; 32], pkits_name("pathLenConstraint0 CA"));
        let ee = Issuer::from_seed([3u8; 32], pkits_name("Valid Self-Issued Test EE"));

        let anchor_cert = anchor.issue(&anchor, &CertificateTemplate::ca(None)).unwrap();
        let ca_cert = anchor.issue(&ca, &CertificateTemplate::ca(Some(0))).unwrap();
        let rollover = ca.issue(&rolled, &CertificateTemplate::ca(None)).unwrap();
        let ee_cert = rolled.issue(&ee, &CertificateTemplate::default()).unwrap();

        let mut chain = Chain::new(Arc::new(CertificateStore::from_certificates([anchor_cert])))
            .with_intermediates(Arc::new(CertificateStore::from_certificates([
                ca_cert, rollover,
            ])));
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;
        chain.policy_mut().verification_time = VerificationTime::At(AT);

        assert!(chain.build(&ee_cert).unwrap());
        assert_eq!(chain.elements().len(), 4);
    }

    #[test]
    fn test_name_chaining_failure() {
        let p = pkits(
            CertificateTemplate::ca(None),
            CertificateTemplate {
                issuer: Some(pkits_name("Good CA Renamed")),
                ..Default::default()
            },
        );
        let mut chain = chain_for(&p, vec![]);
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.elements().len(), 3);
        assert_eq!(
            chain.elements()[0].status,
            ChainStatusFlags::INVALID_NAME_CONSTRAINTS
        );
    }

    #[test]
    fn test_bad_signature() {
        let p = standard();
        let impostor = Issuer::from_seed([66u8; 32], pkits_name("Good CA"));
        let ee = Issuer::from_seed([3u8; 32], pkits_name("Invalid EE Signature Test EE"));
        let forged = impostor.issue(&ee, &CertificateTemplate::default()).unwrap();

        let mut chain = chain_for(&p, clean_crls(&p));
        assert!(!chain.build(&forged).unwrap());
        assert_eq!(chain.elements()[1].certificate, p.ca_cert);
        assert!(
            chain.elements()[0]
                .status
                .contains(ChainStatusFlags::NOT_SIGNATURE_VALID)
        );
        assert!(chain.elements()[1].status.is_empty());
    }

    #[test]
    fn test_partial_chain_and_untrusted_root() {
        let p = standard();
        let unrelated = Issuer::from_seed([9u8; 32], pkits_name("Unrelated Anchor"));
        let unrelated_cert = unrelated
            .issue(&unrelated, &CertificateTemplate::ca(None))
            .unwrap();
        let anchors = Arc::new(CertificateStore::from_certificates([unrelated_cert]));

        let mut chain = Chain::new(anchors.clone()).with_intermediates(Arc::new(
            CertificateStore::from_certificates([p.ca_cert.clone()]),
        ));
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;
        chain.policy_mut().verification_time = VerificationTime::At(AT);

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.status(), ChainStatusFlags::PARTIAL_CHAIN);
        assert_eq!(chain.elements().len(), 2);

        chain.policy_mut().verification_flags = VerificationFlags::ALLOW_UNKNOWN_CERTIFICATE_AUTHORITY;
        assert!(chain.build(&p.ee_cert).unwrap());

        let mut chain = Chain::new(anchors).with_intermediates(Arc::new(
            CertificateStore::from_certificates([p.ca_cert.clone(), p.anchor_cert.clone()]),
        ));
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;
        chain.policy_mut().verification_time = VerificationTime::At(AT);

        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.status(), ChainStatusFlags::UNTRUSTED_ROOT);
        assert_eq!(
            chain.elements()[2].status,
            ChainStatusFlags::UNTRUSTED_ROOT
        );
    }

    #[test]
    fn test_cross_certified_loop_is_cyclic() {
        let a = Issuer::from_seed([11u8; 32], pkits_name("Cross CA A"));
        let b = Issuer::from_seed([12u8; 32], pkits_name("Cross CA B"));
        let ee = Issuer::from_seed([13u8; 32], pkits_name("Cross EE"));
        let a_by_b = b.issue(&a, &CertificateTemplate::ca(None)).unwrap();
        let b_by_a = a.issue(&b, &CertificateTemplate::ca(None)).unwrap();
        let ee_cert = a.issue(&ee, &CertificateTemplate::default()).unwrap();

        let p = standard();
        let mut chain = Chain::new(Arc::new(CertificateStore::from_certificates([
            p.anchor_cert,
        ])))
        .with_intermediates(Arc::new(CertificateStore::from_certificates([
            a_by_b, b_by_a,
        ])));
        chain.policy_mut().revocation_mode = RevocationMode::NoCheck;
        chain.policy_mut().verification_time = VerificationTime::At(AT);

        assert!(!chain.build(&ee_cert).unwrap());
        assert_eq!(
            chain.status(),
            ChainStatusFlags::CYCLIC | ChainStatusFlags::PARTIAL_CHAIN
        );
        assert_eq!(chain.elements().len(), 3);
        assert!(chain.elements().iter().all(|e| e.status.is_empty()));
    }

    #[test]
    fn test_unknown_critical_extension() {
        let p = pkits(
            CertificateTemplate::ca(None),
            CertificateTemplate {
                extensions: vec![Extension {
                    oid: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.62253.7.2"),
                    critical: true,
                    value: vec![0x05, 0x00],
                }],
                ..Default::default()
            },
        );
        let mut chain = chain_for(&p, clean_crls(&p));
        assert!(!chain.build(&p.ee_cert).unwrap());
        assert_eq!(
            chain.elements()[0].status,
            ChainStatusFlags::HAS_NOT_SUPPORTED_CRITICAL_EXTENSION
                | ChainStatusFlags::INVALID_EXTENSION
        );
    }

    #[test]
    fn test_rebuild_discards_previous_result() {
        let p = standard();
        let other = Issuer::from_seed([7u8; 32], pkits_name("Orphan EE"));
        let orphan = other.issue(&other, &CertificateTemplate::default()).unwrap();

        let mut chain = chain_for(&p, clean_crls(&p));
        assert!(!chain.build(&orphan).unwrap());
        assert!(!chain.status().is_empty());

        assert!(chain.build(&p.ee_cert).unwrap());
        assert_eq!(chain.elements().len(), 3);
        assert!(chain.status().is_empty());

        chain.reset();
        assert!(chain.result().is_none());
        assert!(chain.elements().is_empty());
        assert_eq!(chain.policy().verification_time, VerificationTime::At(AT));
    }

    #[test]
    fn test_end_entity_anchor_rejected() {
        let p = standard();
        let mut chain = chain_for(&p, vec![]);
        assert!(chain.build(&p.ee_cert).is_ok());
        assert!(matches!(
            chain.build(&p.anchor_cert),
            Err(Error::EndEntityIsTrustAnchor)
        ));
        assert!(chain.result().is_none());
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let mut suffix = [0u8; 8];
        getrandom::fill(&mut suffix).unwrap();
        let dir = std::env::temp_dir().join(format!(
            "certpath-{tag}-{}",
            u64::from_le_bytes(suffix)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_online_distribution_points() {
        let p = pkits(
            CertificateTemplate {
                crl_distribution_points: vec!["http://crl.example.com/TrustAnchorRootCRL.crl".into()],
                ..CertificateTemplate::ca(None)
            },
            CertificateTemplate {
                crl_distribution_points: vec!["http://crl.example.com/GoodCACRL.crl".into()],
                ..Default::default()
            },
        );
        let dir = temp_dir("chain");
        let [anchor_crl, ca_crl] = [
            p.anchor.sign_crl(&CrlTemplate::default()).unwrap(),
            p.ca.sign_crl(&CrlTemplate::default()).unwrap(),
        ];
        std::fs::write(dir.join("TrustAnchorRootCRL.crl"), anchor_crl.der()).unwrap();
        std::fs::write(dir.join("GoodCACRL.crl"), ca_crl.to_pem()).unwrap();

        let cache = Arc::new(CrlCache::new());
        let mut chain = chain_for(&p, vec![])
            .with_crl_cache(cache.clone())
            .with_fetcher(Arc::new(DirectoryFetcher::new(&dir)));
        chain.policy_mut().revocation_mode = RevocationMode::Online;

        assert!(chain.build(&p.ee_cert).unwrap());
        assert_eq!(cache.len(), 2);
        std::fs::remove_dir_all(&dir).unwrap();

        // The cache alone now answers offline builds
        chain.policy_mut().revocation_mode = RevocationMode::Offline;
        assert!(chain.build(&p.ee_cert).unwrap());
    }
}
