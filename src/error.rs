// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type used by the path building APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type used by the path building APIs.
///
/// These are programmer or input errors detected before any path work
/// begins. Validation findings are reported as status flags instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("X.509 parse error: {details}")]
    X509Parse { details: String },
    #[error("CRL parse error: {details}")]
    CrlParse { details: String },
    #[error("trailing data after DER structure")]
    TrailingDerData,
    #[error("PEM block is not a {expected}")]
    InvalidPemLabel { expected: &'static str },
    #[error("PEM decoding error: {details}")]
    Pem { details: String },
    #[error("end-entity certificate is itself a trust anchor")]
    EndEntityIsTrustAnchor,
    #[error("unknown verification flag bits: {bits:#x}")]
    UnknownVerificationFlags { bits: u32 },
    #[error("{field} distinguished name must not be empty")]
    EmptyDistinguishedName { field: &'static str },
    #[error("invalid validity window: not_before must be < not_after")]
    InvalidValidity,
    #[error("duplicate extension OID in template: {oid}")]
    DuplicateExtensionOid { oid: String },
    #[error("invalid PrintableString characters")]
    InvalidPrintableString,
    #[error("invalid IA5String characters")]
    InvalidIa5String,
    #[error("raw DN attribute bytes are not allowed for issuance")]
    RawNameValueNotAllowedForIssuance,
    #[error("invalid serial number: {details}")]
    InvalidSerial { details: String },
    #[error(transparent)]
    Der(#[from] der::Error),
    #[error(transparent)]
    Oid(#[from] const_oid::Error),
    #[error(transparent)]
    External(#[from] Box<dyn StdError + Send + Sync>),
}
