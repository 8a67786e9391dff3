// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Certification path discovery.
//!
//! Paths are found by depth-first search with backtracking from the end
//! entity toward a trust anchor. The builder never rejects a path for
//! failing a check; that is the validator's job. When no anchored path
//! exists the best dangling path is returned instead.

use crate::cert::Certificate;
use crate::keyid::key_identifier_matches;
use crate::policy::DEFAULT_MAX_DEPTH;
use crate::signature::{SignatureVerifier, is_self_signed, verify_certificate};
use crate::store::CertificateStore;
use crate::{Error, Result};
use log::debug;

/// How a built path ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The last certificate is a trust anchor.
    TrustAnchor,
    /// The last certificate is self-signed but not trusted.
    UntrustedRoot,
    /// No issuer could be found for the last certificate.
    Partial,
}

/// A candidate certification path, end entity first.
#[derive(Clone, Debug)]
pub struct BuiltPath {
    pub certificates: Vec<Certificate>,
    pub termination: Termination,
    /// Whether the search hit a loop or the depth guard without finding an
    /// anchored path.
    pub cyclic: bool,
}

impl BuiltPath {
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Whether the last element is a root (anchor or self-signed) rather
    /// than a dangling issuer.
    pub fn terminal_is_root(&self) -> bool {
        self.termination != Termination::Partial
    }
}

/// Finds paths from an end entity to one of a set of trust anchors.
pub struct PathBuilder<'a> {
    anchors: &'a CertificateStore,
    pools: Vec<&'a CertificateStore>,
    verifier: &'a dyn SignatureVerifier,
    max_depth: usize,
}

impl<'a> PathBuilder<'a> {
    pub fn new(anchors: &'a CertificateStore, verifier: &'a dyn SignatureVerifier) -> Self {
        Self {
            anchors,
            pools: Vec::new(),
            verifier,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Adds an untrusted pool of candidate issuers.
    pub fn with_pool(mut self, pool: &'a CertificateStore) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Builds the preferred path for `end_entity`.
    ///
    /// The first anchored path found wins. Otherwise a path ending in a
    /// self-signed certificate beats a dangling one, and longer beats
    /// shorter.
    pub fn build(&self, end_entity: &Certificate) -> Result<BuiltPath> {
        if self.anchors.contains(end_entity) {
            return Err(Error::EndEntityIsTrustAnchor);
        }
        let mut search = Search::default();
        let mut path = vec![end_entity.clone()];

        if self.extend(&mut path, &mut search) {
            debug!(
                "anchored path of {} certificates for {}",
                path.len(),
                end_entity.subject()
            );
            return Ok(BuiltPath {
                certificates: path,
                termination: Termination::TrustAnchor,
                cyclic: false,
            });
        }
        let (certificates, termination) = match search.best {
            Some(best) => (best.path, best.termination),
            None => (vec![end_entity.clone()], Termination::Partial),
        };
        debug!(
            "no anchored path for {}; best ends {:?} after {} certificates",
            end_entity.subject(),
            termination,
            certificates.len()
        );
        Ok(BuiltPath {
            certificates,
            termination,
            cyclic: search.cycle_seen || search.depth_exceeded,
        })
    }

    /// Extends `path` from its last certificate. Returns true once the path
    /// reaches a trust anchor, leaving the anchored path in place.
    fn extend(&self, path: &mut Vec<Certificate>, search: &mut Search) -> bool {
        let Some(current) = path.last().cloned() else {
            return false;
        };
        if path.len() > 1 && self.anchors.contains(&current) {
            return true;
        }
        let self_signed = is_self_signed(self.verifier, &current);
        if self_signed {
            search.record(path, Termination::UntrustedRoot);
        }
        if path.len() >= self.max_depth {
            debug!("path depth guard tripped at {}", current.subject());
            search.depth_exceeded = true;
            search.record(path, Termination::Partial);
            return false;
        }
        let mut extended = false;
        for candidate in self.candidates(&current) {
            if path.contains(&candidate) {
                debug!("skipping {}: already on the path", candidate.subject());
                search.cycle_seen = true;
                continue;
            }
            extended = true;
            path.push(candidate);
            if self.extend(path, search) {
                return true;
            }
            path.pop();
        }
        if !extended && !self_signed {
            search.record(path, Termination::Partial);
        }
        false
    }

    /// Potential issuers of `child`, most preferred first: authority key
    /// identifier match, then a verifying signature, then trust anchors,
    /// then non-self-issued certificates.
    fn candidates(&self, child: &Certificate) -> Vec<Certificate> {
        let aki = child.authority_key_id();
        let mut found: Vec<((u8, u8, u8, u8), Certificate)> = Vec::new();

        for store in std::iter::once(self.anchors).chain(self.pools.iter().copied()) {
            let by_name = store.find_by_subject(child.issuer());
            let by_key = aki.into_iter().flat_map(|id| store.find_by_key_id(id));
            for candidate in by_name.chain(by_key) {
                if candidate == child || found.iter().any(|(_, seen)| seen == candidate) {
                    continue;
                }
                let key_match = aki.map(|id| key_identifier_matches(candidate, id));
                let key_rank = match key_match {
                    Some(true) => 0,
                    None => 1,
                    Some(false) => 2,
                };
                let signature_rank =
                    u8::from(!verify_certificate(self.verifier, child, candidate.public_key()));
                let anchor_rank = u8::from(!self.anchors.contains(candidate));
                let self_issued_rank = u8::from(candidate.is_self_issued());
                found.push((
                    (key_rank, signature_rank, anchor_rank, self_issued_rank),
                    candidate.clone(),
                ));
            }
        }
        found.sort_by_key(|(rank, _)| *rank);
        found.into_iter().map(|(_, cert)| cert).collect()
    }
}

struct BestPath {
    rank: (bool, usize),
    path: Vec<Certificate>,
    termination: Termination,
}

#[derive(Default)]
struct Search {
    best: Option<BestPath>,
    cycle_seen: bool,
    depth_exceeded: bool,
}

impl Search {
    fn record(&mut self, path: &[Certificate], termination: Termination) {
        let rank = (termination == Termination::UntrustedRoot, path.len());
        if self.best.as_ref().is_none_or(|best| rank > best.rank) {
            self.best = Some(BestPath {
                rank,
                path: path.to_vec(),
                termination,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::issue::{CertificateTemplate, Issuer};
    use crate::name::DistinguishedName;
    use crate::signature::RingVerifier;

    fn issuer(seed: u8, cn: &str) -> Issuer {
        Issuer::from_seed([seed; 32], DistinguishedName::new().c("US").cn(cn))
    }

    struct Pki {
        root: Issuer,
        ca: Issuer,
        root_cert: Certificate,
        ca_cert: Certificate,
        ee_cert: Certificate,
    }

    fn pki() -> Pki {
        let root = issuer(1, "Trust Anchor");
        let ca = issuer(2, "Good CA");
        let ee = issuer(3, "Valid EE");
        let root_cert = root.issue(&root, &CertificateTemplate::ca(None)).unwrap();
        let ca_cert = root.issue(&ca, &CertificateTemplate::ca(None)).unwrap();
        let ee_cert = ca.issue(&ee, &CertificateTemplate::default()).unwrap();
        Pki {
            root,
            ca,
            root_cert,
            ca_cert,
            ee_cert,
        }
    }

    #[test]
    fn test_builds_anchored_path() {
        let p = pki();
        let anchors = CertificateStore::from_certificates([p.root_cert.clone()]);
        let pool = CertificateStore::from_certificates([p.ca_cert.clone()]);

        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&p.ee_cert)
            .unwrap();
        assert_eq!(path.termination, Termination::TrustAnchor);
        assert!(!path.cyclic);
        assert_eq!(path.certificates, vec![p.ee_cert, p.ca_cert, p.root_cert]);
    }

    #[test]
    fn test_end_entity_anchor_is_error() {
        let p = pki();
        let anchors = CertificateStore::from_certificates([p.root_cert.clone()]);
        assert!(matches!(
            PathBuilder::new(&anchors, &RingVerifier).build(&p.root_cert),
            Err(Error::EndEntityIsTrustAnchor)
        ));
    }

    #[test]
    fn test_missing_issuer_is_partial() {
        let p = pki();
        let anchors = CertificateStore::new();
        let pool = CertificateStore::from_certificates([p.ca_cert.clone()]);

        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&p.ee_cert)
            .unwrap();
        assert_eq!(path.termination, Termination::Partial);
        assert!(!path.terminal_is_root());
        assert_eq!(path.certificates, vec![p.ee_cert, p.ca_cert]);
    }

    #[test]
    fn test_untrusted_self_signed_root() {
        let p = pki();
        let anchors = CertificateStore::new();
        let pool = CertificateStore::from_certificates([p.ca_cert.clone(), p.root_cert.clone()]);

        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&p.ee_cert)
            .unwrap();
        assert_eq!(path.termination, Termination::UntrustedRoot);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_prefers_key_identifier_match() {
        let p = pki();
        // Same subject as the real CA but a different key
        let impostor = issuer(9, "Good CA");
        let impostor_cert = p.root.issue(&impostor, &CertificateTemplate::ca(None)).unwrap();

        let anchors = CertificateStore::from_certificates([p.root_cert.clone()]);
        let pool = CertificateStore::from_certificates([impostor_cert, p.ca_cert.clone()]);
        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&p.ee_cert)
            .unwrap();
        assert_eq!(path.certificates[1], p.ca_cert);
    }

    #[test]
    fn test_prefers_verifying_issuer_without_key_identifiers() {
        let root = issuer(1, "Trust Anchor");
        let ca = issuer(2, "Good CA");
        let impostor = issuer(9, "Good CA");
        let ee = issuer(3, "Valid EE");
        let bare = CertificateTemplate {
            key_identifiers: false,
            ..CertificateTemplate::ca(None)
        };
        let root_cert = root.issue(&root, &bare).unwrap();
        let ca_cert = root.issue(&ca, &bare).unwrap();
        let impostor_cert = root.issue(&impostor, &bare).unwrap();
        let ee_cert = ca
            .issue(
                &ee,
                &CertificateTemplate {
                    key_identifiers: false,
                    ..Default::default()
                },
            )
            .unwrap();

        let anchors = CertificateStore::from_certificates([root_cert]);
        let pool = CertificateStore::from_certificates([impostor_cert, ca_cert.clone()]);
        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&ee_cert)
            .unwrap();
        assert_eq!(path.certificates[1], ca_cert);
    }

    #[test]
    fn test_self_issued_intermediate_hop() {
        let p = pki();
        // Key rollover: the CA's new key certified by its old key
        let rolled = issuer(4, "Good CA");
        let new_with_old = p.ca.issue(&rolled, &CertificateTemplate::ca(None)).unwrap();
        let ee = issuer(5, "Rolled EE");
        let ee_cert = rolled.issue(&ee, &CertificateTemplate::default()).unwrap();

        let anchors = CertificateStore::from_certificates([p.root_cert.clone()]);
        let pool = CertificateStore::from_certificates([p.ca_cert.clone(), new_with_old.clone()]);
        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&ee_cert)
            .unwrap();
        assert_eq!(path.termination, Termination::TrustAnchor);
        assert_eq!(
            path.certificates,
            vec![ee_cert, new_with_old, p.ca_cert, p.root_cert]
        );
    }

    #[test]
    fn test_cross_certified_loop_is_cyclic() {
        let a = issuer(6, "CA A");
        let b = issuer(7, "CA B");
        let ee = issuer(8, "Looping EE");
        let a_by_b = b.issue(&a, &CertificateTemplate::ca(None)).unwrap();
        let b_by_a = a.issue(&b, &CertificateTemplate::ca(None)).unwrap();
        let ee_cert = a.issue(&ee, &CertificateTemplate::default()).unwrap();

        let anchors = CertificateStore::new();
        let pool = CertificateStore::from_certificates([a_by_b.clone(), b_by_a.clone()]);
        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .build(&ee_cert)
            .unwrap();
        assert!(path.cyclic);
        assert_eq!(path.termination, Termination::Partial);
        assert_eq!(path.certificates, vec![ee_cert, a_by_b, b_by_a]);
    }

    #[test]
    fn test_depth_guard_reports_cyclic() {
        let p = pki();
        let anchors = CertificateStore::from_certificates([p.root_cert.clone()]);
        let pool = CertificateStore::from_certificates([p.ca_cert.clone()]);
        let path = PathBuilder::new(&anchors, &RingVerifier)
            .with_pool(&pool)
            .with_max_depth(2)
            .build(&p.ee_cert)
            .unwrap();
        assert!(path.cyclic);
        assert_eq!(path.termination, Termination::Partial);
        assert_eq!(path.len(), 2);
    }
}
