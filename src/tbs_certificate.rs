use std::time::SystemTime;

use der::Encode;
use der::asn1::{Any, GeneralizedTime, OctetString, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

use crate::cert::params::ExtensionParam;
use crate::error::{Result, TlsError};
use crate::key::PublicKey;

/// `sha256WithRSAEncryption` with the NULL parameters RFC 4055 requires.
pub fn sha256_with_rsa() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(Any::null()),
    }
}

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial, without a sign byte.
/// * `issuer` - The encoded name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The encoded name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509 extensions, in emission order.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub issuer: Name,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| -> Result<x509_cert::ext::Extension> {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone()).map_err(signing_error)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: x509_time(self.not_before)?,
            not_after: x509_time(self.not_after)?,
        };

        let serial_number =
            SerialNumber::new(self.serial_number.as_slice()).map_err(signing_error)?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: sha256_with_rsa(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(signing_error)
    }
}

/// UTCTime through 2049, GeneralizedTime afterwards (RFC 5280 4.1.2.5).
fn x509_time(at: OffsetDateTime) -> Result<Time> {
    let system = SystemTime::from(at);
    let time = if at.year() < 2050 {
        UtcTime::from_system_time(system).map(Time::UtcTime)
    } else {
        GeneralizedTime::from_system_time(system).map(Time::GeneralTime)
    };
    time.map_err(signing_error)
}

fn signing_error(err: der::Error) -> TlsError {
    TlsError::SigningError(err.to_string())
}
