pub mod extensions;
pub mod name;
pub mod params;

use std::net::IpAddr;

use der::{Decode, Encode};
use extensions::{
    BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, FlagSet, KeyUsage, KeyUsages,
    SubjectAltName, ToAndFromX509Extension,
};
use name::DistinguishedName;
use params::CertConfig;
use time::OffsetDateTime;
use x509_cert::name::Name;

use crate::error::{Result, TlsError};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils;

/// Represents an X.509 certificate.
///
/// The DER bytes the certificate was built or decoded from are kept
/// verbatim and define its identity: two certificates are equal iff their
/// DER encodings are byte-for-byte identical.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
    der: Vec<u8>,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Wraps a freshly assembled certificate, encoding it once.
    pub fn from_inner(inner: x509_cert::Certificate) -> Result<Self> {
        let der = inner
            .to_der()
            .map_err(|e| TlsError::SigningError(e.to_string()))?;
        Ok(Self { inner, der })
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    /// The DER encoding of the certificate.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_der(&self) -> Vec<u8> {
        self.der.clone()
    }

    pub fn to_pem(&self) -> String {
        pem_utils::cert_to_pem(self)
    }

    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        pem_utils::pem_to_cert(pem)
    }

    /// Creates a new self-signed certificate for `key`.
    pub fn new_self_signed(cfg: &CertConfig, key: &KeyPair) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: cfg.subject.as_x509_name()?,
            key,
        };
        self_issuer.issue(cfg, &key.public_key())
    }

    /// The encoded subject name, exactly as it appears in the certificate.
    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        to_offset_date_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> OffsetDateTime {
        to_offset_date_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the first extension of type `E`, if present.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    /// The BasicConstraints CA flag; `false` when the extension is absent.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn dns_names(&self) -> Result<Vec<String>> {
        Ok(self
            .extension::<SubjectAltName>()?
            .map(|san| san.dns_names)
            .unwrap_or_default())
    }

    pub fn ip_addresses(&self) -> Result<Vec<IpAddr>> {
        Ok(self
            .extension::<SubjectAltName>()?
            .map(|san| san.ip_addresses)
            .unwrap_or_default())
    }

    pub fn key_usage(&self) -> Result<FlagSet<KeyUsages>> {
        Ok(self
            .extension::<KeyUsage>()?
            .map(|ku| ku.0)
            .unwrap_or_default())
    }

    pub fn ext_key_usages(&self) -> Result<Vec<ExtendedKeyUsageOption>> {
        Ok(self
            .extension::<ExtendedKeyUsage>()?
            .map(|eku| eku.usage)
            .unwrap_or_default())
    }

    /// Verifies the certificate signature against `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| TlsError::EncodingError(e.to_string()))?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            TlsError::DecodeError("signature has unused bits".to_string())
        })?;
        issuer_key.verify(&tbs, signature)
    }
}

fn to_offset_date_time(time: &x509_cert::time::Time) -> OffsetDateTime {
    match time {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// A certificate held together with its private key.
///
/// This is the handle a CA is used through: see
/// [`Issuer`](crate::issuer::Issuer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}
