// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Certification path validation.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-6.1
//!
//! Every check runs on every element and records findings instead of
//! failing. State that RFC 5280 threads from the anchor toward the leaf is
//! carried in an explicit accumulator rather than on the validator itself.

use crate::builder::{BuiltPath, Termination};
use crate::cert::Certificate;
use crate::chain::{ChainElement, ChainResult};
use crate::name::{DistinguishedName, name_matches, name_within_subtree};
use crate::oid;
use crate::policy::ChainPolicy;
use crate::revocation::RevocationOracle;
use crate::signature::{SignatureVerifier, verify_certificate};
use crate::status::{ChainStatusFlags, ElementPosition, mask};
use const_oid::ObjectIdentifier;
use log::debug;

/// Everything a validation run reads besides the path itself.
pub struct ValidationContext<'a> {
    pub policy: &'a ChainPolicy,
    pub verifier: &'a dyn SignatureVerifier,
    pub oracle: &'a RevocationOracle,
    /// Unix timestamp certificates and CRLs are evaluated at.
    pub time: i64,
}

/// Constraints accumulated while walking from the anchor toward the leaf.
#[derive(Default)]
struct WorkingState {
    /// Remaining non-self-issued intermediates allowed, and the index of the
    /// certificate whose pathLenConstraint set that bound.
    path_budget: Option<(usize, usize)>,
    /// Permitted subtree sets, one per constraining certificate.
    permitted: Vec<Vec<DistinguishedName>>,
    /// Excluded subtrees from every constraining certificate.
    excluded: Vec<DistinguishedName>,
    /// Valid certificate policies so far; `None` is any policy.
    policies: Option<Vec<ObjectIdentifier>>,
}

impl WorkingState {
    /// Counts `index` against the current path length bound, returning the
    /// constraining certificate if the bound is already exhausted.
    fn consume_path_length(&mut self, index: usize) -> Option<usize> {
        match &mut self.path_budget {
            Some((0, constrainer)) => Some(*constrainer),
            Some((remaining, _)) => {
                *remaining -= 1;
                debug!("element {index} consumes path length, {remaining} left");
                None
            }
            None => None,
        }
    }

    /// Tightens the bound with a certificate's own pathLenConstraint.
    fn apply_path_length(&mut self, index: usize, path_len: usize) {
        if self
            .path_budget
            .is_none_or(|(remaining, _)| path_len < remaining)
        {
            self.path_budget = Some((path_len, index));
        }
    }

    /// Name constraint findings for a subject below the constraining CAs.
    fn check_subject(&self, subject: &DistinguishedName) -> ChainStatusFlags {
        let mut flags = ChainStatusFlags::empty();
        if subject.is_empty() {
            return flags;
        }
        if self
            .permitted
            .iter()
            .any(|subtrees| !subtrees.iter().any(|base| name_within_subtree(base, subject)))
        {
            flags |= ChainStatusFlags::HAS_NOT_PERMITTED_NAME_CONSTRAINT;
        }
        if self
            .excluded
            .iter()
            .any(|base| name_within_subtree(base, subject))
        {
            flags |= ChainStatusFlags::HAS_EXCLUDED_NAME_CONSTRAINT;
        }
        flags
    }

    /// Intersects the valid policy set with a certificate's policies.
    fn apply_policies(&mut self, policies: Option<&[ObjectIdentifier]>) {
        let Some(policies) = policies else {
            self.policies = Some(Vec::new());
            return;
        };
        if policies.contains(&oid::ANY_POLICY) {
            return;
        }
        self.policies = Some(match self.policies.take() {
            None => policies.to_vec(),
            Some(valid) => valid.into_iter().filter(|p| policies.contains(p)).collect(),
        });
    }
}

/// Validates a built path and produces per-element and aggregate findings.
pub fn validate(path: &BuiltPath, ctx: &ValidationContext<'_>) -> ChainResult {
    let certs = &path.certificates;
    let len = certs.len();
    if len == 0 {
        return ChainResult::default();
    }
    let anchored = path.termination == Termination::TrustAnchor;
    let terminal_is_root = path.terminal_is_root();

    let mut raw = vec![ChainStatusFlags::empty(); len];
    let mut chain = ChainStatusFlags::empty();

    // Anchor-independent checks on every element
    for (index, cert) in certs.iter().enumerate() {
        raw[index] |= check_signature(path, index, ctx);
        raw[index] |= check_time(certs, index, ctx);
        raw[index] |= check_extensions(cert);

        if let Some(parent) = certs.get(index + 1)
            && !name_matches(cert.issuer(), parent.subject())
        {
            debug!("{} does not chain to {}", cert.issuer(), parent.subject());
            raw[index] |= ChainStatusFlags::INVALID_NAME_CONSTRAINTS;
        }
        let is_anchor = anchored && index + 1 == len;
        if is_anchor {
            continue;
        }
        if index > 0 {
            if !cert.is_ca() {
                raw[index] |= ChainStatusFlags::INVALID_BASIC_CONSTRAINTS;
            }
            if !cert.allows_cert_sign() {
                raw[index] |= ChainStatusFlags::NOT_VALID_FOR_USAGE;
            }
        }
        if !allows_application_policy(cert, &ctx.policy.application_policy) {
            raw[index] |= ChainStatusFlags::NOT_VALID_FOR_USAGE;
        }
    }

    // Accumulated constraints, anchor toward leaf
    let mut state = WorkingState::default();
    let policy_start = if terminal_is_root && len > 1 {
        len - 2
    } else {
        len - 1
    };
    for index in (0..len).rev() {
        let cert = &certs[index];
        let below_terminal = index + 1 < len;

        if below_terminal
            && index > 0
            && !cert.is_self_issued()
            && let Some(constrainer) = state.consume_path_length(index)
        {
            debug!("path length exceeded below element {constrainer}");
            raw[constrainer] |= ChainStatusFlags::INVALID_BASIC_CONSTRAINTS;
        }
        if below_terminal && (index == 0 || !cert.is_self_issued()) {
            raw[index] |= state.check_subject(cert.subject());
        }
        if index <= policy_start {
            state.apply_policies(cert.certificate_policies());
        }
        if index == 0 {
            break;
        }
        if let Some(path_len) = cert.basic_constraints().and_then(|bc| bc.path_len) {
            state.apply_path_length(index, usize::from(path_len));
        }
        if let Some(nc) = cert.name_constraints() {
            if nc.unsupported_forms {
                raw[index] |= ChainStatusFlags::HAS_NOT_SUPPORTED_NAME_CONSTRAINT;
            }
            if !nc.permitted.is_empty() {
                state.permitted.push(nc.permitted.clone());
            }
            state.excluded.extend(nc.excluded.iter().cloned());
        }
    }
    chain |= check_certificate_policy(&certs[0], &state, &ctx.policy.certificate_policy);

    // Revocation, issuers before the certificates they issued
    for index in (0..len).rev() {
        if !ctx.policy.checks_revocation_of(index, len, terminal_is_root) {
            continue;
        }
        let unknown =
            ChainStatusFlags::REVOCATION_STATUS_UNKNOWN | ChainStatusFlags::OFFLINE_REVOCATION;
        let issuer_index = match path.termination {
            Termination::Partial if index + 1 == len => {
                raw[index] |= unknown;
                continue;
            }
            _ if index + 1 == len => index,
            _ => index + 1,
        };
        let untrustworthy = ChainStatusFlags::REVOKED | ChainStatusFlags::NOT_SIGNATURE_VALID;
        if issuer_index != index && raw[issuer_index].intersects(untrustworthy) {
            raw[index] |= unknown;
            continue;
        }
        let outcome = ctx.oracle.check_revocation_at(
            &certs[index],
            &certs[issuer_index],
            ctx.policy,
            ctx.time,
        );
        raw[index] |= outcome.flags();
        if outcome.crl_signer_wrong_usage && ctx.policy.strict_crl_sign_usage {
            raw[issuer_index] |= ChainStatusFlags::NOT_VALID_FOR_USAGE;
        }
    }

    // Structural findings
    match path.termination {
        Termination::TrustAnchor => {}
        Termination::UntrustedRoot => raw[len - 1] |= ChainStatusFlags::UNTRUSTED_ROOT,
        Termination::Partial => chain |= ChainStatusFlags::PARTIAL_CHAIN,
    }
    if path.cyclic {
        chain |= ChainStatusFlags::CYCLIC;
    }

    let flags = ctx.policy.verification_flags;
    let mut status = mask(chain, flags.ignored_chain_status());
    let elements = certs
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (cert, raw_status))| {
            let position = ElementPosition::of(index, len, terminal_is_root);
            let element_status = mask(raw_status, flags.ignored_status(position));
            status |= element_status;
            ChainElement {
                certificate: cert.clone(),
                status: element_status,
                raw_status,
            }
        })
        .collect();
    ChainResult { elements, status }
}

/// Verifies an element's signature with its parent's key. A self-issued
/// root at the end of the path is checked against its own key.
fn check_signature(path: &BuiltPath, index: usize, ctx: &ValidationContext<'_>) -> ChainStatusFlags {
    let cert = &path.certificates[index];
    let signer = match path.certificates.get(index + 1) {
        Some(parent) => parent,
        None if path.termination != Termination::Partial && cert.is_self_issued() => cert,
        None => return ChainStatusFlags::empty(),
    };
    if verify_certificate(ctx.verifier, cert, signer.public_key()) {
        ChainStatusFlags::empty()
    } else {
        debug!("signature on {} does not verify", cert.subject());
        ChainStatusFlags::NOT_SIGNATURE_VALID
    }
}

fn check_time(certs: &[Certificate], index: usize, ctx: &ValidationContext<'_>) -> ChainStatusFlags {
    let cert = &certs[index];
    let mut flags = ChainStatusFlags::empty();
    if !cert.is_valid_at(ctx.time) {
        flags |= ChainStatusFlags::NOT_TIME_VALID;
    }
    if ctx.policy.enforce_time_nesting
        && let Some(parent) = certs.get(index + 1)
        && (cert.not_before() < parent.not_before() || cert.not_after() > parent.not_after())
    {
        flags |= ChainStatusFlags::NOT_TIME_NESTED;
    }
    flags
}

fn check_extensions(cert: &Certificate) -> ChainStatusFlags {
    let mut flags = ChainStatusFlags::empty();
    if cert.unsupported_critical_extensions().next().is_some() {
        flags |= ChainStatusFlags::HAS_NOT_SUPPORTED_CRITICAL_EXTENSION
            | ChainStatusFlags::INVALID_EXTENSION;
    }
    if !cert.undecodable_extensions().is_empty() {
        flags |= ChainStatusFlags::INVALID_EXTENSION;
    }
    flags
}

/// Whether a certificate's extendedKeyUsage admits every requested usage.
/// Certificates without the extension admit everything.
fn allows_application_policy(cert: &Certificate, requested: &[ObjectIdentifier]) -> bool {
    let Some(usages) = cert.ext_key_usage() else {
        return true;
    };
    usages.contains(&oid::ANY_EXTENDED_KEY_USAGE)
        || requested.iter().all(|usage| usages.contains(usage))
}

fn check_certificate_policy(
    end_entity: &Certificate,
    state: &WorkingState,
    requested: &[ObjectIdentifier],
) -> ChainStatusFlags {
    if requested.is_empty() {
        return ChainStatusFlags::empty();
    }
    if end_entity.certificate_policies().is_none() {
        return ChainStatusFlags::NO_ISSUANCE_CHAIN_POLICY;
    }
    let Some(valid) = &state.policies else {
        return ChainStatusFlags::empty();
    };
    let satisfied = if requested.contains(&oid::ANY_POLICY) {
        !valid.is_empty()
    } else {
        requested.iter().any(|p| valid.contains(p))
    };
    if satisfied {
        ChainStatusFlags::empty()
    } else {
        ChainStatusFlags::INVALID_POLICY_CONSTRAINTS
    }
}
