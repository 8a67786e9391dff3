// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Distinguished names and the X.500 matching rules used for name chaining.

use crate::{Error, Result, oid};
use const_oid::ObjectIdentifier;
use der::asn1::{Any, SetOfVec};
use der::{Decode, Encode, Tag, Tagged};
use std::fmt;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

/// A DN attribute value encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameValue {
    /// UTF8String value.
    Utf8(String),
    /// PrintableString value (restricted ASCII subset from RFC 5280).
    Printable(String),
    /// IA5String value (7-bit ASCII).
    Ia5(String),
    /// BMPString value (UCS-2).
    Bmp(String),
    /// Full DER encoding of any other value type, compared byte-exact.
    Bytes(Vec<u8>),
}

impl NameValue {
    fn as_any(&self) -> Result<Any> {
        match self {
            NameValue::Utf8(value) => Ok(Any::new(Tag::Utf8String, value.as_bytes())?),
            NameValue::Printable(value) => {
                if !is_printable_string(value) {
                    return Err(Error::InvalidPrintableString);
                }
                Ok(Any::new(Tag::PrintableString, value.as_bytes())?)
            }
            NameValue::Ia5(value) => {
                if !value.is_ascii() {
                    return Err(Error::InvalidIa5String);
                }
                Ok(Any::new(Tag::Ia5String, value.as_bytes())?)
            }
            NameValue::Bmp(value) => {
                let ucs2: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
                Ok(Any::new(Tag::BmpString, ucs2)?)
            }
            NameValue::Bytes(_) => Err(Error::RawNameValueNotAllowedForIssuance),
        }
    }

    fn from_any(value: &Any) -> Result<Self> {
        let text = |bytes: &[u8]| String::from_utf8(bytes.to_vec()).ok();
        let parsed = match value.tag() {
            Tag::Utf8String => text(value.value()).map(NameValue::Utf8),
            Tag::PrintableString => text(value.value()).map(NameValue::Printable),
            Tag::Ia5String => text(value.value()).map(NameValue::Ia5),
            Tag::BmpString => {
                let units: Vec<u16> = value
                    .value()
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).ok().map(NameValue::Bmp)
            }
            _ => None,
        };
        match parsed {
            Some(parsed) => Ok(parsed),
            None => Ok(NameValue::Bytes(value.to_der()?)),
        }
    }

    /// Returns the caseIgnoreMatch form of directory strings: insignificant
    /// whitespace removed, internal runs compressed, lowercased. Values that
    /// are not directory strings have no folded form.
    fn folded(&self) -> Option<String> {
        match self {
            NameValue::Utf8(s) | NameValue::Printable(s) | NameValue::Ia5(s) | NameValue::Bmp(s) => {
                Some(s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            }
            NameValue::Bytes(_) => None,
        }
    }
}

impl fmt::Display for NameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameValue::Utf8(s) | NameValue::Printable(s) | NameValue::Ia5(s) | NameValue::Bmp(s) => {
                f.write_str(s)
            }
            NameValue::Bytes(bytes) => {
                f.write_str("#")?;
                bytes.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
        }
    }
}

fn is_printable_string(value: &str) -> bool {
    value.as_bytes().iter().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                *b,
                b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
            )
    })
}

/// A single DN attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameAttribute {
    /// Attribute OID (for example `2.5.4.3` for CN).
    pub oid: ObjectIdentifier,
    /// Attribute value.
    pub value: NameValue,
}

/// A relative distinguished name: an unordered set of attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rdn {
    pub attrs: Vec<NameAttribute>,
}

/// Distinguished Name represented as an ordered RDN sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    /// Ordered RDNs, most significant (e.g. country) first.
    pub rdns: Vec<Rdn>,
}

impl DistinguishedName {
    /// Creates an empty DN.
    pub fn new() -> Self {
        Self { rdns: Vec::new() }
    }

    /// Appends a PrintableString country RDN.
    pub fn c(self, value: impl Into<String>) -> Self {
        self.push(oid::C, NameValue::Printable(value.into()))
    }

    /// Appends a PrintableString organization RDN.
    pub fn o(self, value: impl Into<String>) -> Self {
        self.push(oid::O, NameValue::Printable(value.into()))
    }

    /// Appends a PrintableString organizational unit RDN.
    pub fn ou(self, value: impl Into<String>) -> Self {
        self.push(oid::OU, NameValue::Printable(value.into()))
    }

    /// Appends a UTF8String CN RDN.
    pub fn cn(self, value: impl Into<String>) -> Self {
        self.push(oid::CN, NameValue::Utf8(value.into()))
    }

    /// Appends a single-valued RDN.
    pub fn push(mut self, oid: ObjectIdentifier, value: NameValue) -> Self {
        self.rdns.push(Rdn {
            attrs: vec![NameAttribute { oid, value }],
        });
        self
    }

    /// Appends a multi-valued RDN.
    pub fn push_rdn(mut self, attrs: Vec<NameAttribute>) -> Self {
        self.rdns.push(Rdn { attrs });
        self
    }

    /// Returns whether the name has no RDNs.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Decodes a DER `Name`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let name = Name::from_der(der)?;
        Self::from_x509_name(&name)
    }

    pub(crate) fn from_x509_name(name: &Name) -> Result<Self> {
        let mut rdns = Vec::with_capacity(name.0.len());
        for rdn in name.0.iter() {
            let mut attrs = Vec::with_capacity(rdn.0.len());
            for atav in rdn.0.iter() {
                attrs.push(NameAttribute {
                    oid: atav.oid,
                    value: NameValue::from_any(&atav.value)?,
                });
            }
            rdns.push(Rdn { attrs });
        }
        Ok(Self { rdns })
    }

    pub(crate) fn to_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::with_capacity(self.rdns.len());
        for rdn in &self.rdns {
            let mut set = SetOfVec::new();
            for attr in &rdn.attrs {
                set.insert(AttributeTypeAndValue {
                    oid: attr.oid,
                    value: attr.value.as_any()?,
                })?;
            }
            rdns.push(RelativeDistinguishedName::from(set));
        }
        Ok(RdnSequence(rdns))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for (j, attr) in rdn.attrs.iter().enumerate() {
                if j > 0 {
                    f.write_str(" + ")?;
                }
                let short = [(oid::CN, "CN"), (oid::C, "C"), (oid::O, "O"), (oid::OU, "OU")]
                    .into_iter()
                    .find(|(known, _)| *known == attr.oid)
                    .map(|(_, short)| short);
                match short {
                    Some(short) => write!(f, "{short}={}", attr.value)?,
                    None => write!(f, "{}={}", attr.oid, attr.value)?,
                }
            }
        }
        Ok(())
    }
}

/// Compares two names under the X.500 distinguishedNameMatch rule.
///
/// RDN order is significant, attributes inside one RDN are not. Directory
/// string values compare case-insensitively with whitespace compressed;
/// anything else compares byte-exact.
pub fn name_matches(a: &DistinguishedName, b: &DistinguishedName) -> bool {
    a.rdns.len() == b.rdns.len() && a.rdns.iter().zip(&b.rdns).all(|(x, y)| rdn_matches(x, y))
}

/// Returns whether `name` lies inside the directory subtree rooted at `base`.
pub fn name_within_subtree(base: &DistinguishedName, name: &DistinguishedName) -> bool {
    base.rdns.len() <= name.rdns.len()
        && base.rdns.iter().zip(&name.rdns).all(|(x, y)| rdn_matches(x, y))
}

fn rdn_matches(a: &Rdn, b: &Rdn) -> bool {
    if a.attrs.len() != b.attrs.len() {
        return false;
    }
    // Each attribute of `b` may pair with only one attribute of `a`
    let mut used = vec![false; b.attrs.len()];
    a.attrs.iter().all(|x| {
        let found = b
            .attrs
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && attribute_matches(x, y));
        if let Some(i) = found {
            used[i] = true;
        }
        found.is_some()
    })
}

fn attribute_matches(a: &NameAttribute, b: &NameAttribute) -> bool {
    if a.oid != b.oid {
        return false;
    }
    match (a.value.folded(), b.value.folded()) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.value == b.value,
        _ => false,
    }
}
