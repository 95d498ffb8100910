use std::net::IpAddr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use time::Duration;
use time::OffsetDateTime;

use super::extensions::{FlagSet, KeyUsages, ToAndFromX509Extension};
use super::name::{DistinguishedName, parse_subject};
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::TlsError;

/// Modulus size of generated keys unless configured otherwise.
pub const DEFAULT_KEY_SIZE: usize = 2048;
/// Lifetime of issued certificates unless configured otherwise.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;
/// Subject used when the caller supplies none.
pub const DEFAULT_SUBJECT: &str = "C=China, O=OpenShift, OU=Hypershift QE, CN=default-ca";
/// Sole SAN entry used when the caller supplies none.
pub const DEFAULT_DNS_NAME: &str = "openqe.github.io";

/// Template for a certificate about to be issued.
///
/// `dns_names` and `ip_addresses` become the Subject Alternative Name
/// extension. `key_usages` is emitted verbatim; the default is
/// DigitalSignature alone, also for CA certificates.
///
/// # Fields
/// * `key_size` - Bits of the RSA key generated for the subject.
/// * `dns_names` - DNS SAN entries, in order.
/// * `ip_addresses` - IP SAN entries, in order.
/// * `ext_key_usages` - Extended key usage purposes; omitted when empty.
/// * `key_usages` - Key usage bits; omitted when empty.
/// * `subject` - The subject distinguished name.
/// * `validity` - Lifetime counted from the moment of issuance.
/// * `is_ca` - Value of the BasicConstraints CA flag.
#[derive(Clone, Debug, Builder)]
pub struct CertConfig {
    #[builder(default = DEFAULT_KEY_SIZE)]
    pub key_size: usize,
    #[builder(default = vec![DEFAULT_DNS_NAME.to_string()])]
    pub dns_names: Vec<String>,
    #[builder(default)]
    pub ip_addresses: Vec<IpAddr>,
    #[builder(default)]
    pub ext_key_usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default = FlagSet::from(KeyUsages::DigitalSignature))]
    pub key_usages: FlagSet<KeyUsages>,
    #[builder(default = parse_subject(DEFAULT_SUBJECT))]
    pub subject: DistinguishedName,
    #[builder(default = Duration::days(DEFAULT_VALIDITY_DAYS))]
    pub validity: Duration,
    #[builder(default)]
    pub is_ca: bool,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CertConfig {
    /// Applies caller overrides on top of `self`.
    ///
    /// A non-empty `subject` replaces the subject through
    /// [`parse_subject`]. A non-empty `dns_name` becomes the only DNS SAN
    /// entry. `is_ca` is always taken from the caller.
    pub fn with_overrides(&self, subject: &str, dns_name: &str, is_ca: bool) -> Self {
        let mut cfg = self.clone();
        cfg.is_ca = is_ca;
        if !subject.is_empty() {
            cfg.subject = parse_subject(subject);
        }
        if !dns_name.is_empty() {
            cfg.dns_names = vec![dns_name.to_string()];
        }
        cfg
    }

    /// Defaults with overrides, for a CA certificate.
    pub fn ca(subject: &str, dns_name: &str) -> Self {
        Self::default().with_overrides(subject, dns_name, true)
    }

    /// Defaults with overrides, for a leaf certificate.
    pub fn leaf(subject: &str, dns_name: &str) -> Self {
        Self::default().with_overrides(subject, dns_name, false)
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now and lasting `lifetime`.
    ///
    /// Fails with `SigningError` when the end falls outside the
    /// representable date range.
    pub fn starting_now(lifetime: Duration) -> Result<Self, TlsError> {
        let now = OffsetDateTime::now_utc();
        let not_after = now.checked_add(lifetime).ok_or_else(|| {
            TlsError::SigningError(format!("validity of {lifetime} is out of range"))
        })?;
        Ok(Self {
            not_before: now,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, TlsError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, TlsError> {
        E::from_x509_extension_value(&self.value)
    }
}
