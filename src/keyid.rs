// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Key identifier derivation for authorityKeyIdentifier matching.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.2

use crate::cert::{Certificate, PublicKeyInfo};
use sha1::{Digest, Sha1};

/// Ways an issuer may have derived a key identifier from its public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyIdMethod {
    /// SHA-1 over the subjectPublicKey bit string contents (RFC 5280 method 1).
    Full,
    /// `0100` followed by the low 60 bits of the Full hash (RFC 5280 method 2).
    Short,
    /// SHA-1 over the whole DER SubjectPublicKeyInfo.
    Capi,
}

impl KeyIdMethod {
    pub const ALL: [KeyIdMethod; 3] = [KeyIdMethod::Full, KeyIdMethod::Short, KeyIdMethod::Capi];
}

/// Computes the key identifier of a public key with the given method.
pub fn key_identifier(key: &PublicKeyInfo, method: KeyIdMethod) -> Vec<u8> {
    match method {
        KeyIdMethod::Full => sha1(&key.key),
        KeyIdMethod::Short => {
            let hash = sha1(&key.key);
            let mut id = hash[hash.len() - 8..].to_vec();
            id[0] = 0x40 | (id[0] & 0x0F);
            id
        }
        KeyIdMethod::Capi => sha1(&key.spki),
    }
}

/// Returns whether an authority key identifier designates the candidate's
/// key, either through its explicit subjectKeyIdentifier or any of the
/// derivation methods.
pub fn key_identifier_matches(candidate: &Certificate, authority_key_id: &[u8]) -> bool {
    if candidate.subject_key_id() == Some(authority_key_id) {
        return true;
    }
    KeyIdMethod::ALL
        .iter()
        .any(|method| key_identifier(candidate.public_key(), *method) == authority_key_id)
}

fn sha1(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}
