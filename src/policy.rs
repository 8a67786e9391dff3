// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Caller-controlled configuration for chain building and validation.

use crate::Result;
use crate::status::VerificationFlags;
use crate::store::CertificateStore;
use const_oid::ObjectIdentifier;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default per-fetch deadline for CRL retrieval.
pub const DEFAULT_URL_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(15);

/// Default recursion guard for path building.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Which sources the revocation oracle may consult.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationMode {
    /// Never check revocation.
    NoCheck,
    /// Extra store, cache, and fetched distribution points.
    Online,
    /// Extra store and cache only.
    Offline,
}

/// Which chain elements are checked for revocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationFlag {
    EndCertificateOnly,
    EntireChain,
    ExcludeRoot,
}

/// The instant certificates and CRLs are evaluated at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationTime {
    /// Validate against current wall-clock time.
    Now,
    /// Validate against a specific unix timestamp.
    At(i64),
}

impl VerificationTime {
    /// Resolves to a unix timestamp.
    pub fn timestamp(self) -> i64 {
        match self {
            VerificationTime::Now => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
            VerificationTime::At(ts) => ts,
        }
    }
}

/// Chain building and validation policy.
#[derive(Clone, Debug)]
pub struct ChainPolicy {
    pub revocation_mode: RevocationMode,
    pub revocation_flag: RevocationFlag,
    pub verification_time: VerificationTime,
    pub verification_flags: VerificationFlags,
    /// Extended key usages every non-anchor certificate with an EKU
    /// extension must allow.
    pub application_policy: Vec<ObjectIdentifier>,
    /// Certificate policies the path must be valid for.
    pub certificate_policy: Vec<ObjectIdentifier>,
    /// Additional untrusted certificates and CRLs supplied by the caller.
    pub extra_store: Arc<CertificateStore>,
    /// Hard deadline for each CRL fetch attempt.
    pub url_retrieval_timeout: Duration,
    /// Report `NotTimeNested` when a validity window is not inside its
    /// issuer's.
    pub enforce_time_nesting: bool,
    /// Also flag `NotValidForUsage` on a CRL issuer lacking cRLSign.
    pub strict_crl_sign_usage: bool,
    /// Builder recursion guard; deeper searches report `Cyclic`.
    pub max_depth: usize,
}

impl Default for ChainPolicy {
    /// Online revocation checking of everything but the root, evaluated at
    /// the current wall-clock time, with nothing waived.
    ///
    /// For deterministic tests, set an explicit verification time.
    fn default() -> Self {
        Self {
            revocation_mode: RevocationMode::Online,
            revocation_flag: RevocationFlag::ExcludeRoot,
            verification_time: VerificationTime::Now,
            verification_flags: VerificationFlags::empty(),
            application_policy: Vec::new(),
            certificate_policy: Vec::new(),
            extra_store: Arc::new(CertificateStore::new()),
            url_retrieval_timeout: DEFAULT_URL_RETRIEVAL_TIMEOUT,
            enforce_time_nesting: false,
            strict_crl_sign_usage: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ChainPolicy {
    /// Restores every field to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Sets the verification flags from raw bits, rejecting undefined bits.
    pub fn set_verification_flags_bits(&mut self, bits: u32) -> Result<()> {
        self.verification_flags = VerificationFlags::from_bits_checked(bits)?;
        Ok(())
    }

    /// Whether the element at `index` of a `len` long chain is subject to a
    /// revocation check. `terminal_is_root` says whether the last element is
    /// a self-signed root rather than a dangling issuer.
    pub fn checks_revocation_of(&self, index: usize, len: usize, terminal_is_root: bool) -> bool {
        if self.revocation_mode == RevocationMode::NoCheck {
            return false;
        }
        let is_root = terminal_is_root && index + 1 == len && len > 1;
        match self.revocation_flag {
            RevocationFlag::EndCertificateOnly => index == 0,
            RevocationFlag::EntireChain => true,
            RevocationFlag::ExcludeRoot => !is_root,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let policy = ChainPolicy::default();
        assert_eq!(policy.revocation_mode, RevocationMode::Online);
        assert_eq!(policy.revocation_flag, RevocationFlag::ExcludeRoot);
        assert_eq!(policy.verification_time, VerificationTime::Now);
        assert!(policy.verification_flags.is_empty());
        assert_eq!(policy.url_retrieval_timeout, DEFAULT_URL_RETRIEVAL_TIMEOUT);
        assert!(!policy.enforce_time_nesting);
        assert!(!policy.strict_crl_sign_usage);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut policy = ChainPolicy {
            revocation_mode: RevocationMode::NoCheck,
            verification_time: VerificationTime::At(42),
            verification_flags: VerificationFlags::IGNORE_NOT_TIME_VALID,
            max_depth: 3,
            ..Default::default()
        };
        policy.reset();
        assert_eq!(policy.revocation_mode, RevocationMode::Online);
        assert_eq!(policy.verification_time, VerificationTime::Now);
        assert!(policy.verification_flags.is_empty());
        assert_eq!(policy.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_set_verification_flags_bits() {
        let mut policy = ChainPolicy::default();
        policy.set_verification_flags_bits(0x0001).unwrap();
        assert_eq!(
            policy.verification_flags,
            VerificationFlags::IGNORE_NOT_TIME_VALID
        );
        assert!(matches!(
            policy.set_verification_flags_bits(0x8000_0000),
            Err(Error::UnknownVerificationFlags { .. })
        ));
        assert_eq!(
            policy.verification_flags,
            VerificationFlags::IGNORE_NOT_TIME_VALID
        );
    }

    #[test]
    fn test_revocation_scope() {
        let mut policy = ChainPolicy::default();
        assert!(policy.checks_revocation_of(0, 3, true));
        assert!(policy.checks_revocation_of(1, 3, true));
        assert!(!policy.checks_revocation_of(2, 3, true));
        assert!(policy.checks_revocation_of(2, 3, false));

        policy.revocation_flag = RevocationFlag::EndCertificateOnly;
        assert!(policy.checks_revocation_of(0, 3, true));
        assert!(!policy.checks_revocation_of(1, 3, true));

        policy.revocation_flag = RevocationFlag::EntireChain;
        assert!(policy.checks_revocation_of(2, 3, true));

        policy.revocation_mode = RevocationMode::NoCheck;
        assert!(!policy.checks_revocation_of(0, 3, true));
    }

    #[test]
    fn test_verification_time() {
        assert_eq!(VerificationTime::At(7).timestamp(), 7);
        assert!(VerificationTime::Now.timestamp() > 1_700_000_000);
    }
}
