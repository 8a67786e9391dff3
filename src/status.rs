// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chain status findings and the verification flags that suppress them.

use crate::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Validation findings for a chain element or a whole chain. The empty
    /// set means no error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChainStatusFlags: u32 {
        const NOT_TIME_VALID = 0x0000_0001;
        const NOT_TIME_NESTED = 0x0000_0002;
        const REVOKED = 0x0000_0004;
        const NOT_SIGNATURE_VALID = 0x0000_0008;
        const NOT_VALID_FOR_USAGE = 0x0000_0010;
        const UNTRUSTED_ROOT = 0x0000_0020;
        const REVOCATION_STATUS_UNKNOWN = 0x0000_0040;
        const CYCLIC = 0x0000_0080;
        const INVALID_EXTENSION = 0x0000_0100;
        const INVALID_POLICY_CONSTRAINTS = 0x0000_0200;
        const INVALID_BASIC_CONSTRAINTS = 0x0000_0400;
        const INVALID_NAME_CONSTRAINTS = 0x0000_0800;
        const HAS_NOT_SUPPORTED_NAME_CONSTRAINT = 0x0000_1000;
        const HAS_NOT_DEFINED_NAME_CONSTRAINT = 0x0000_2000;
        const HAS_NOT_PERMITTED_NAME_CONSTRAINT = 0x0000_4000;
        const HAS_EXCLUDED_NAME_CONSTRAINT = 0x0000_8000;
        const PARTIAL_CHAIN = 0x0001_0000;
        const CTL_NOT_TIME_VALID = 0x0002_0000;
        const CTL_NOT_SIGNATURE_VALID = 0x0004_0000;
        const CTL_NOT_VALID_FOR_USAGE = 0x0008_0000;
        const OFFLINE_REVOCATION = 0x0100_0000;
        const NO_ISSUANCE_CHAIN_POLICY = 0x0200_0000;
        const EXPLICIT_DISTRUST = 0x0400_0000;
        const HAS_NOT_SUPPORTED_CRITICAL_EXTENSION = 0x0800_0000;
    }
}

bitflags! {
    /// Findings the caller chooses to tolerate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VerificationFlags: u32 {
        const IGNORE_NOT_TIME_VALID = 0x0001;
        const IGNORE_CTL_NOT_TIME_VALID = 0x0002;
        const IGNORE_NOT_TIME_NESTED = 0x0004;
        const IGNORE_INVALID_BASIC_CONSTRAINTS = 0x0008;
        const ALLOW_UNKNOWN_CERTIFICATE_AUTHORITY = 0x0010;
        const IGNORE_WRONG_USAGE = 0x0020;
        const IGNORE_INVALID_NAME = 0x0040;
        const IGNORE_INVALID_POLICY = 0x0080;
        const IGNORE_END_REVOCATION_UNKNOWN = 0x0100;
        const IGNORE_CTL_SIGNER_REVOCATION_UNKNOWN = 0x0200;
        const IGNORE_CERTIFICATE_AUTHORITY_REVOCATION_UNKNOWN = 0x0400;
        const IGNORE_ROOT_REVOCATION_UNKNOWN = 0x0800;
    }
}

impl VerificationFlags {
    /// Converts raw bits, rejecting bits that name no flag.
    pub fn from_bits_checked(bits: u32) -> Result<Self> {
        Self::from_bits(bits).ok_or(Error::UnknownVerificationFlags {
            bits: bits & !Self::all().bits(),
        })
    }

    /// Returns the findings these flags suppress on an element at the given
    /// position.
    pub fn ignored_status(self, position: ElementPosition) -> ChainStatusFlags {
        let mut ignored = self.ignored_chain_status();

        let revocation_unknown =
            ChainStatusFlags::REVOCATION_STATUS_UNKNOWN | ChainStatusFlags::OFFLINE_REVOCATION;
        let ignore_unknown = match position {
            ElementPosition::EndEntity => Self::IGNORE_END_REVOCATION_UNKNOWN,
            ElementPosition::Intermediate => Self::IGNORE_CERTIFICATE_AUTHORITY_REVOCATION_UNKNOWN,
            ElementPosition::Root => Self::IGNORE_ROOT_REVOCATION_UNKNOWN,
        };
        if self.contains(ignore_unknown) {
            ignored |= revocation_unknown;
        }
        ignored
    }

    /// Returns the findings these flags suppress regardless of position.
    pub fn ignored_chain_status(self) -> ChainStatusFlags {
        let mut ignored = ChainStatusFlags::empty();
        for (flag, status) in [
            (
                Self::ALLOW_UNKNOWN_CERTIFICATE_AUTHORITY,
                ChainStatusFlags::UNTRUSTED_ROOT | ChainStatusFlags::PARTIAL_CHAIN,
            ),
            (Self::IGNORE_NOT_TIME_VALID, ChainStatusFlags::NOT_TIME_VALID),
            (Self::IGNORE_CTL_NOT_TIME_VALID, ChainStatusFlags::CTL_NOT_TIME_VALID),
            (Self::IGNORE_NOT_TIME_NESTED, ChainStatusFlags::NOT_TIME_NESTED),
            (
                Self::IGNORE_INVALID_BASIC_CONSTRAINTS,
                ChainStatusFlags::INVALID_BASIC_CONSTRAINTS,
            ),
            (
                Self::IGNORE_INVALID_NAME,
                ChainStatusFlags::INVALID_NAME_CONSTRAINTS
                    | ChainStatusFlags::HAS_NOT_SUPPORTED_NAME_CONSTRAINT
                    | ChainStatusFlags::HAS_NOT_DEFINED_NAME_CONSTRAINT
                    | ChainStatusFlags::HAS_NOT_PERMITTED_NAME_CONSTRAINT
                    | ChainStatusFlags::HAS_EXCLUDED_NAME_CONSTRAINT,
            ),
            (
                Self::IGNORE_INVALID_POLICY,
                ChainStatusFlags::INVALID_POLICY_CONSTRAINTS,
            ),
            (Self::IGNORE_WRONG_USAGE, ChainStatusFlags::NOT_VALID_FOR_USAGE),
        ] {
            if self.contains(flag) {
                ignored |= status;
            }
        }
        ignored
    }
}

/// Where a certificate sits in the chain, which decides the revocation
/// ignore flag that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPosition {
    EndEntity,
    Intermediate,
    Root,
}

impl ElementPosition {
    /// Position of element `index` in a chain of `len` elements whose last
    /// element is or isn't a root.
    pub fn of(index: usize, len: usize, terminal_is_root: bool) -> Self {
        if index == 0 {
            ElementPosition::EndEntity
        } else if index + 1 == len && terminal_is_root {
            ElementPosition::Root
        } else {
            ElementPosition::Intermediate
        }
    }
}

/// Removes the findings the verification flags suppress.
pub fn mask(status: ChainStatusFlags, ignored: ChainStatusFlags) -> ChainStatusFlags {
    status.difference(ignored)
}
