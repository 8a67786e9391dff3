// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Demo: Lab PKI, path building and revocation.
//!
//! This example demonstrates:
//! 1. Creating a trust anchor, an intermediate CA and an end entity
//! 2. Publishing CRLs for the anchor and the CA
//! 3. Building and validating the end entity's chain
//! 4. Revoking the CA and watching the findings propagate
//! 5. Waiving a finding with a verification flag

use darkbio_certpath::issue::{CertificateTemplate, CrlTemplate, Issuer, RevokedTemplate};
use darkbio_certpath::{
    CertificateStore, Chain, ChainStatusFlags, DistinguishedName, RevocationMode,
    VerificationFlags, VerificationTime,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn name(cn: &str) -> DistinguishedName {
    DistinguishedName::new().c("US").o("Demo Lab").cn(cn)
}

fn report(chain: &Chain) {
    for (index, element) in chain.elements().iter().enumerate() {
        println!(
            "   [{index}] {}: {:?}",
            element.certificate.subject(),
            element.status
        );
    }
    println!("   chain status: {:?}", chain.status());
}

fn main() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    // =========================================================================
    // Step 1: Create the lab PKI
    // =========================================================================
    println!("1. Creating anchor, CA and end entity...");
    let anchor = Issuer::generate(name("Demo Anchor")).expect("Failed to create anchor key");
    let ca = Issuer::generate(name("Demo CA")).expect("Failed to create CA key");
    let leaf = Issuer::generate(name("Demo Leaf")).expect("Failed to create leaf key");

    let anchor_cert = anchor
        .issue(&anchor, &CertificateTemplate::ca(None))
        .expect("Failed to issue anchor");
    let ca_cert = anchor
        .issue(
            &ca,
            &CertificateTemplate {
                serial: Some(vec![0x02]),
                ..CertificateTemplate::ca(Some(0))
            },
        )
        .expect("Failed to issue CA");
    let leaf_cert = ca
        .issue(&leaf, &CertificateTemplate::default())
        .expect("Failed to issue leaf");
    println!("   ✓ {}", leaf_cert.subject());

    // =========================================================================
    // Step 2: Publish clean CRLs
    // =========================================================================
    println!("\n2. Publishing CRLs...");
    let mut crls = CertificateStore::new();
    crls.add_crl(anchor.sign_crl(&CrlTemplate::default()).expect("Failed to sign CRL"));
    crls.add_crl(ca.sign_crl(&CrlTemplate::default()).expect("Failed to sign CRL"));

    // =========================================================================
    // Step 3: Build and validate
    // =========================================================================
    println!("\n3. Building the leaf's chain...");
    let anchors = Arc::new(CertificateStore::from_certificates([anchor_cert]));
    let intermediates = Arc::new(CertificateStore::from_certificates([ca_cert]));

    let mut chain = Chain::new(anchors.clone()).with_intermediates(intermediates.clone());
    let policy = chain.policy_mut();
    policy.revocation_mode = RevocationMode::Offline;
    policy.verification_time = VerificationTime::At(now);
    policy.extra_store = Arc::new(crls);

    let valid = chain.build(&leaf_cert).expect("Failed to build chain");
    report(&chain);
    println!("   ✓ valid: {valid}");

    // =========================================================================
    // Step 4: Revoke the CA
    // =========================================================================
    println!("\n4. Revoking the CA...");
    let mut crls = CertificateStore::new();
    crls.add_crl(
        anchor
            .sign_crl(&CrlTemplate {
                revoked: vec![RevokedTemplate::new(vec![0x02])],
                ..Default::default()
            })
            .expect("Failed to sign CRL"),
    );
    crls.add_crl(ca.sign_crl(&CrlTemplate::default()).expect("Failed to sign CRL"));
    chain.policy_mut().extra_store = Arc::new(crls);

    let valid = chain.build(&leaf_cert).expect("Failed to build chain");
    report(&chain);
    assert!(chain.status().contains(ChainStatusFlags::REVOKED));
    println!("   ✓ valid: {valid}");

    // =========================================================================
    // Step 5: Waive missing revocation data for the leaf
    // =========================================================================
    println!("\n5. Dropping CRLs and waiving end revocation checks...");
    chain.policy_mut().extra_store = Arc::new(CertificateStore::new());
    chain.policy_mut().verification_flags = VerificationFlags::IGNORE_END_REVOCATION_UNKNOWN
        | VerificationFlags::IGNORE_CERTIFICATE_AUTHORITY_REVOCATION_UNKNOWN;

    let valid = chain.build(&leaf_cert).expect("Failed to build chain");
    report(&chain);
    println!("   ✓ valid: {valid}");
}
