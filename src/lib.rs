// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! X.509 certification path building and validation.
//!
//! https://datatracker.ietf.org/doc/html/rfc5280#section-6
//!
//! A [`Chain`] finds a path from an end-entity certificate to one of its
//! trust anchors and reports every validation finding as a set of
//! [`ChainStatusFlags`], per element and for the whole chain. Callers tune
//! the run through a [`ChainPolicy`] and decide which findings to tolerate
//! with [`VerificationFlags`].

pub mod builder;
pub mod cert;
pub mod chain;
pub mod crl;
mod error;
pub mod issue;
pub mod keyid;
pub mod name;
pub mod oid;
pub mod pem;
pub mod policy;
pub mod revocation;
pub mod signature;
pub mod status;
pub mod store;
pub mod validator;

pub use cert::Certificate;
pub use chain::{Chain, ChainElement, ChainResult};
pub use crl::Crl;
pub use error::{Error, Result};
pub use name::{DistinguishedName, name_matches};
pub use policy::{ChainPolicy, RevocationFlag, RevocationMode, VerificationTime};
pub use status::{ChainStatusFlags, VerificationFlags};
pub use store::CertificateStore;
