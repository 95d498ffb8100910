//! Distinguished names and the subject string parser.
//!
//! Subjects are accepted in two syntaxes, auto-detected by the leading
//! character:
//!
//! * slash form, as printed by `openssl x509 -subject`: `/O=Org/OU=Unit/CN=name`
//! * comma form: `CN=name,O=Org,OU=Unit`
//!
//! Parsing is lenient. Segments without `=` are skipped and unknown
//! attribute keys are kept in [`DistinguishedName::extra_names`]. A value
//! cannot contain the separator of the syntax in use; there is no escaping.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::{Tag, Tagged};
use der::asn1::{Any, PrintableStringRef, SetOfVec};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use crate::error::Result;

pub const COUNTRY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const PROVINCE_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const LOCALITY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const ORGANIZATION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const COMMON_NAME_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Attribute type recorded for subject keys outside the recognised set.
pub const UNRECOGNIZED_ATTRIBUTE_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9999");

/// An attribute the parser did not recognise, or an attribute of a decoded
/// certificate name with an unfamiliar type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraName {
    /// The key as written by the caller, or the dotted OID when decoded.
    pub key: String,
    pub oid: ObjectIdentifier,
    pub value: String,
}

/// Distinguished name of a certificate subject or issuer.
///
/// All attributes except the common name are ordered lists. The X.509
/// encoding emits one RDN per value in the order C, ST, L, O, OU, CN and
/// then the extra names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
pub struct DistinguishedName {
    #[builder(default)]
    country: Vec<String>,
    #[builder(default)]
    organization: Vec<String>,
    #[builder(default)]
    organizational_unit: Vec<String>,
    #[builder(default)]
    locality: Vec<String>,
    #[builder(default)]
    province: Vec<String>,
    common_name: Option<String>,
    #[builder(default)]
    extra_names: Vec<ExtraName>,
}

/// Parses a subject string in slash or comma form. Never fails.
pub fn parse_subject(subject: &str) -> DistinguishedName {
    let segments: Vec<&str> = match subject.strip_prefix('/') {
        Some(rest) => rest.split('/').collect(),
        None => subject.split(',').collect(),
    };

    let mut name = DistinguishedName::default();
    for segment in segments {
        let Some((key, value)) = segment.trim().split_once('=') else {
            continue;
        };
        let value = value.to_string();
        match key.to_uppercase().as_str() {
            "C" => name.country.push(value),
            "O" => name.organization.push(value),
            "OU" => name.organizational_unit.push(value),
            "CN" => name.common_name = Some(value),
            "L" => name.locality.push(value),
            "ST" => name.province.push(value),
            _ => name.extra_names.push(ExtraName {
                key: key.to_string(),
                oid: UNRECOGNIZED_ATTRIBUTE_OID,
                value,
            }),
        }
    }
    name
}

impl FromStr for DistinguishedName {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(parse_subject(s))
    }
}

impl DistinguishedName {
    pub fn country(&self) -> &[String] {
        &self.country
    }

    pub fn organization(&self) -> &[String] {
        &self.organization
    }

    pub fn organizational_unit(&self) -> &[String] {
        &self.organizational_unit
    }

    pub fn locality(&self) -> &[String] {
        &self.locality
    }

    pub fn province(&self) -> &[String] {
        &self.province
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn extra_names(&self) -> &[ExtraName] {
        &self.extra_names
    }

    pub fn is_empty(&self) -> bool {
        self.attributes().next().is_none()
    }

    /// (oid, key, value) triples in encoding order.
    fn attributes(&self) -> impl Iterator<Item = (ObjectIdentifier, &str, &str)> {
        tagged(COUNTRY_OID, "C", &self.country)
            .chain(tagged(PROVINCE_OID, "ST", &self.province))
            .chain(tagged(LOCALITY_OID, "L", &self.locality))
            .chain(tagged(ORGANIZATION_OID, "O", &self.organization))
            .chain(tagged(ORGANIZATIONAL_UNIT_OID, "OU", &self.organizational_unit))
            .chain(
                self.common_name
                    .iter()
                    .filter(|cn| !cn.is_empty())
                    .map(|cn| (COMMON_NAME_OID, "CN", cn.as_str())),
            )
            .chain(
                self.extra_names
                    .iter()
                    .map(|extra| (extra.oid, extra.key.as_str(), extra.value.as_str())),
            )
    }

    /// Converts the distinguished name to an X.509 `Name`.
    pub fn as_x509_name(&self) -> Result<Name> {
        let rdns = self
            .attributes()
            .map(|(oid, _, value)| -> Result<RelativeDistinguishedName> {
                let atv = AttributeTypeAndValue {
                    oid,
                    value: attribute_value(value)?,
                };
                Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 `Name`.
    ///
    /// Attributes whose value is not a string type are skipped.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut name = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_text(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    COUNTRY_OID => name.country.push(value),
                    PROVINCE_OID => name.province.push(value),
                    LOCALITY_OID => name.locality.push(value),
                    ORGANIZATION_OID => name.organization.push(value),
                    ORGANIZATIONAL_UNIT_OID => name.organizational_unit.push(value),
                    COMMON_NAME_OID => name.common_name = Some(value),
                    oid => name.extra_names.push(ExtraName {
                        key: oid.to_string(),
                        oid,
                        value,
                    }),
                }
            }
        }
        name
    }
}

impl fmt::Display for DistinguishedName {
    /// Comma form, in encoding order. Parses back to the same name when no
    /// value contains a comma.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, key, value)) in self.attributes().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

fn tagged<'a>(
    oid: ObjectIdentifier,
    key: &'static str,
    values: &'a [String],
) -> impl Iterator<Item = (ObjectIdentifier, &'a str, &'a str)> {
    values.iter().map(move |v| (oid, key, v.as_str()))
}

fn attribute_value(value: &str) -> Result<Any> {
    let tag = if PrintableStringRef::new(value).is_ok() {
        Tag::PrintableString
    } else {
        Tag::Utf8String
    };
    Ok(Any::new(tag, value.as_bytes())?)
}

fn attribute_text(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::TeletexString
        | Tag::VisibleString => std::str::from_utf8(value.value()).ok().map(str::to_owned),
        _ => None,
    }
}
