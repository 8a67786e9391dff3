// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Strict PEM framing for certificates and CRLs.

use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// PEM label of an X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// PEM label of an X.509 CRL.
pub const CRL_LABEL: &str = "X509 CRL";

/// Decodes a single PEM block carrying the expected label.
///
/// The block must start at byte 0, use one line-ending style throughout and
/// carry nothing after the footer except a final line ending.
pub fn decode(data: &[u8], label: &'static str) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(data).map_err(|e| pem_error(e.to_string()))?;
    let crlf = text
        .find('\n')
        .map(|idx| idx > 0 && text.as_bytes()[idx - 1] == b'\r')
        .ok_or_else(|| pem_error("incomplete PEM header"))?;

    let body = match text.strip_suffix(if crlf { "\r\n" } else { "\n" }) {
        Some(trimmed) => trimmed,
        None => text,
    };
    let mut lines: Vec<&str> = body
        .split('\n')
        .map(|line| if crlf { line.strip_suffix('\r').unwrap_or(line) } else { line })
        .collect();
    // Every line but the footer must end in CR when CRLF is in use.
    if crlf && body.split('\n').rev().skip(1).any(|line| !line.ends_with('\r')) {
        return Err(pem_error("mixed line endings"));
    }
    if lines.len() < 3 {
        return Err(pem_error("missing PEM body"));
    }
    let header = lines.remove(0);
    let footer = lines.pop().unwrap_or_default();

    let kind = header
        .strip_prefix("-----BEGIN ")
        .and_then(|rest| rest.strip_suffix("-----"))
        .ok_or_else(|| pem_error("malformed PEM header"))?;
    if footer != format!("-----END {kind}-----") {
        return Err(pem_error("missing or mismatched PEM footer"));
    }
    if kind != label {
        return Err(Error::InvalidPemLabel { expected: label });
    }
    let b64: String = lines.concat();
    if b64.is_empty() {
        return Err(pem_error("empty PEM body"));
    }
    STANDARD.decode(b64).map_err(|e| pem_error(e.to_string()))
}

/// Encodes data as a PEM block with 64-character lines and `\n` endings.
pub fn encode(label: &str, data: &[u8]) -> String {
    let b64 = STANDARD.encode(data);

    let mut buf = format!("-----BEGIN {label}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        // Base64 output is ASCII.
        buf.push_str(&String::from_utf8_lossy(chunk));
        buf.push('\n');
    }
    buf.push_str(&format!("-----END {label}-----\n"));
    buf
}

/// Returns whether the data looks like PEM rather than DER.
pub(crate) fn is_pem(data: &[u8]) -> bool {
    data.starts_with(b"-----BEGIN ")
}

fn pem_error(details: impl Into<String>) -> Error {
    Error::Pem {
        details: details.into(),
    }
}
