// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::crl::Crl;
use crate::name::{DistinguishedName, name_matches};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Parsed CRLs keyed by distribution point URL.
///
/// The cache is owned by the caller and shared between chains through an
/// `Arc`; nothing in the crate keeps one globally.
#[derive(Debug, Default)]
pub struct CrlCache {
    entries: RwLock<HashMap<String, Crl>>,
}

impl CrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a CRL under its URL, returning the one it replaced.
    pub fn insert(&self, url: impl Into<String>, crl: Crl) -> Option<Crl> {
        self.entries.write().insert(url.into(), crl)
    }

    pub fn get(&self, url: &str) -> Option<Crl> {
        self.entries.read().get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.read().contains_key(url)
    }

    pub fn evict(&self, url: &str) -> Option<Crl> {
        self.entries.write().remove(url)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drops every CRL past its nextUpdate at `now` and returns how many
    /// were removed.
    pub fn evict_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, crl| !crl.is_expired_at(now));
        before - entries.len()
    }

    /// Cached CRLs whose issuer matches `name`.
    pub fn for_issuer(&self, name: &DistinguishedName) -> Vec<Crl> {
        self.entries
            .read()
            .values()
            .filter(|crl| name_matches(crl.issuer(), name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::issue::{CrlTemplate, Issuer};

    #[test]
    fn test_insert_get_evict() {
        let ca = Issuer::from_seed([5u8; 32], DistinguishedName::new().cn("CA"));
        let crl = ca.sign_crl(&CrlTemplate::default()).unwrap();

        let cache = CrlCache::new();
        assert!(cache.is_empty());
        assert!(cache.insert("http://a/ca.crl", crl.clone()).is_none());
        assert!(cache.contains("http://a/ca.crl"));
        assert_eq!(cache.get("http://a/ca.crl"), Some(crl.clone()));
        assert_eq!(cache.for_issuer(ca.name()), vec![crl.clone()]);
        assert!(cache.for_issuer(&DistinguishedName::new().cn("Other")).is_empty());

        assert_eq!(cache.evict("http://a/ca.crl"), Some(crl));
        assert!(cache.get("http://a/ca.crl").is_none());
    }

    #[test]
    fn test_evict_expired() {
        let ca = Issuer::from_seed([5u8; 32], DistinguishedName::new().cn("CA"));
        let short = ca
            .sign_crl(&CrlTemplate {
                next_update: Some(1_300_000_000),
                ..Default::default()
            })
            .unwrap();
        let open = ca
            .sign_crl(&CrlTemplate {
                next_update: None,
                ..Default::default()
            })
            .unwrap();

        let cache = CrlCache::new();
        cache.insert("http://a/short.crl", short);
        cache.insert("http://a/open.crl", open);
        assert_eq!(cache.evict_expired(1_200_000_000), 0);
        assert_eq!(cache.evict_expired(1_400_000_000), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("http://a/open.crl"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
