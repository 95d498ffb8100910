use der::Encode;
use der::asn1::BitString;
use tracing::debug;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::name::Name;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName,
    SubjectKeyIdentifier,
};
use crate::cert::params::{CertConfig, ExtensionParam, Validity};
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::{Result, TlsError};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::{TbsCertificate, sha256_with_rsa};

/// Represents an entity capable of issuing certificates.
///
/// Implementors supply the issuer name and keys; [`Issuer::issue`] does the
/// template-to-certificate work shared by self-signed and CA-signed
/// certificates.
pub trait Issuer {
    /// Returns the encoded name placed in the issuer field.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Public key every issued signature must verify against.
    fn verifying_key(&self) -> Result<PublicKey>;

    /// Key identifier for the Authority Key Identifier extension, if one is emitted.
    fn authority_key_id(&self) -> Result<Option<Vec<u8>>>;

    /// Issues a certificate for `subject_key` described by `cfg`.
    ///
    /// # Arguments
    /// * `cfg` - Subject, SAN entries, usages, validity and CA flag.
    /// * `subject_key` - Public key bound into the certificate.
    ///
    /// # Errors
    /// `SigningError` when the certificate cannot be assembled or signed,
    /// `InvalidCaError` when the signature does not verify under
    /// [`Issuer::verifying_key`].
    fn issue(&self, cfg: &CertConfig, subject_key: &PublicKey) -> Result<Certificate> {
        let serial_number = random_serial();
        let tbs_cert_inner =
            assemble_tbs(self, cfg, subject_key, &serial_number).map_err(as_signing_error)?;
        let tbs_der = tbs_cert_inner
            .to_der()
            .map_err(|e| TlsError::SigningError(e.to_string()))?;
        let signature = self.signing_key().sign_data(&tbs_der)?;

        self.verifying_key()?
            .verify(&tbs_der, &signature)
            .map_err(|e| {
                TlsError::InvalidCaError(format!(
                    "CA key does not match the CA certificate: {e}"
                ))
            })?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: sha256_with_rsa(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| TlsError::SigningError(e.to_string()))?,
        };

        debug!(
            subject = %cfg.subject,
            serial = %hex(&serial_number),
            is_ca = cfg.is_ca,
            "issued certificate"
        );

        Certificate::from_inner(cert_inner)
    }
}

/// Builds the to-be-signed part of a certificate from `cfg`.
fn assemble_tbs<I: Issuer + ?Sized>(
    issuer: &I,
    cfg: &CertConfig,
    subject_key: &PublicKey,
    serial_number: &[u8],
) -> Result<TbsCertificateInner> {
    let subject = cfg.subject.as_x509_name()?;

    let mut extensions = vec![ExtensionParam::from_extension(
        &BasicConstraints {
            is_ca: cfg.is_ca,
            max_path_length: None,
        },
        true,
    )?];

    if !cfg.key_usages.is_empty() {
        extensions.push(ExtensionParam::from_extension(
            &KeyUsage(cfg.key_usages),
            true,
        )?);
    }

    if !cfg.ext_key_usages.is_empty() {
        let eku = ExtendedKeyUsage {
            usage: cfg.ext_key_usages.clone(),
        };
        extensions.push(ExtensionParam::from_extension(&eku, false)?);
    }

    let san = SubjectAltName {
        dns_names: cfg.dns_names.clone(),
        ip_addresses: cfg.ip_addresses.clone(),
    };
    if !san.is_empty() {
        // RFC 5280 4.2.1.6: critical when the subject is empty
        extensions.push(ExtensionParam::from_extension(
            &san,
            cfg.subject.is_empty(),
        )?);
    }

    extensions.push(ExtensionParam::from_extension(
        &SubjectKeyIdentifier(subject_key.key_id()?),
        false,
    )?);

    if let Some(key_identifier) = issuer.authority_key_id()? {
        extensions.push(ExtensionParam::from_extension(
            &AuthorityKeyIdentifier { key_identifier },
            false,
        )?);
    }

    let validity = Validity::starting_now(cfg.validity)?;

    TbsCertificate {
        serial_number: serial_number.to_vec(),
        issuer: issuer.issuer_name(),
        not_before: validity.not_before,
        not_after: validity.not_after,
        subject,
        subject_public_key: subject_key.clone(),
        extensions,
    }
    .to_tbs_certificate_inner()
}

fn as_signing_error(err: TlsError) -> TlsError {
    match err {
        TlsError::SigningError(_) => err,
        other => TlsError::SigningError(other.to_string()),
    }
}

/// Issuer for a self-signed certificate: the subject signs itself.
pub struct SelfIssuer<'a> {
    pub name: Name,
    pub key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn verifying_key(&self) -> Result<PublicKey> {
        Ok(self.key.public_key())
    }

    fn authority_key_id(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Issuer backed by a CA certificate and its private key, which are
/// borrowed separately and may not belong together.
pub struct CaIssuer<'a> {
    pub cert: &'a Certificate,
    pub key: &'a KeyPair,
}

impl Issuer for CaIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.cert.subject_name().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn verifying_key(&self) -> Result<PublicKey> {
        self.cert.public_key().map_err(|e| {
            TlsError::InvalidCaError(format!("CA certificate does not carry an RSA key: {e}"))
        })
    }

    fn authority_key_id(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.key.public_key().key_id()?))
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Name {
        self.cert.subject_name().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn verifying_key(&self) -> Result<PublicKey> {
        CaIssuer {
            cert: &self.cert,
            key: &self.key,
        }
        .verifying_key()
    }

    fn authority_key_id(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.key.public_key().key_id()?))
    }
}

/// Random positive 127-bit serial. The top bit is cleared so the DER
/// integer needs no sign byte and the next bit is set so it is never zero.
pub fn random_serial() -> Vec<u8> {
    let mut bytes: [u8; 16] = rand::random();
    bytes[0] = (bytes[0] & 0x7f) | 0x40;
    bytes.to_vec()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{FlagSet, KeyUsages, ToAndFromX509Extension};
    use crate::cert::name::parse_subject;

    fn small_config() -> CertConfig {
        CertConfig::builder().key_size(1024).build()
    }

    #[test]
    fn serials_are_positive_and_distinct() {
        let a = random_serial();
        let b = random_serial();
        assert_eq!(a.len(), 16);
        assert!(a[0] & 0x80 == 0 && a[0] != 0);
        assert_ne!(a, b);
    }

    #[test]
    fn self_issuer_omits_authority_key_id() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let cfg = small_config();
        let cert = Certificate::new_self_signed(&cfg, &key).unwrap();

        assert!(
            cert.extension::<AuthorityKeyIdentifier>()
                .unwrap()
                .is_none()
        );
        let ski = cert.extension::<SubjectKeyIdentifier>().unwrap().unwrap();
        assert_eq!(ski.0, key.public_key().key_id().unwrap());
        cert.verify_signed_by(&key.public_key()).unwrap();
    }

    #[test]
    fn ca_issuer_links_the_leaf_to_the_ca_key() {
        let ca_key = KeyPair::generate_rsa(1024).unwrap();
        let ca_cert = Certificate::new_self_signed(&CertConfig::ca("CN=root", ""), &ca_key).unwrap();
        let leaf_key = KeyPair::generate_rsa(1024).unwrap();

        let issuer = CaIssuer {
            cert: &ca_cert,
            key: &ca_key,
        };
        let leaf = issuer
            .issue(&CertConfig::leaf("CN=leaf", "leaf.test"), &leaf_key.public_key())
            .unwrap();

        assert_eq!(leaf.inner.tbs_certificate.issuer, *ca_cert.subject_name());
        let aki = leaf.extension::<AuthorityKeyIdentifier>().unwrap().unwrap();
        assert_eq!(aki.key_identifier, ca_key.public_key().key_id().unwrap());
        leaf.verify_signed_by(&ca_key.public_key()).unwrap();
    }

    #[test]
    fn ca_handle_issues_like_a_ca_issuer() {
        let ca_key = KeyPair::generate_rsa(1024).unwrap();
        let ca = CertificateWithPrivateKey {
            cert: Certificate::new_self_signed(&CertConfig::ca("CN=root", ""), &ca_key).unwrap(),
            key: ca_key,
        };
        let leaf_key = KeyPair::generate_rsa(1024).unwrap();

        let leaf = ca
            .issue(&CertConfig::leaf("CN=leaf", ""), &leaf_key.public_key())
            .unwrap();
        assert_eq!(leaf.issuer(), ca.cert.subject());
        assert_eq!(
            ca.authority_key_id().unwrap(),
            Some(ca.key.public_key().key_id().unwrap())
        );
        leaf.verify_signed_by(&ca.key.public_key()).unwrap();
    }

    #[test]
    fn mismatched_ca_key_is_rejected() {
        let ca_key = KeyPair::generate_rsa(1024).unwrap();
        let other_key = KeyPair::generate_rsa(1024).unwrap();
        let ca_cert = Certificate::new_self_signed(&CertConfig::ca("CN=root", ""), &ca_key).unwrap();

        let issuer = CaIssuer {
            cert: &ca_cert,
            key: &other_key,
        };
        let err = issuer
            .issue(&small_config(), &other_key.public_key())
            .unwrap_err();
        assert!(matches!(err, TlsError::InvalidCaError(_)));
    }

    #[test]
    fn empty_key_usage_is_omitted() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let cfg = CertConfig::builder()
            .key_size(1024)
            .key_usages(FlagSet::<KeyUsages>::default())
            .build();
        let cert = Certificate::new_self_signed(&cfg, &key).unwrap();
        assert!(cert.extension::<KeyUsage>().unwrap().is_none());
        assert!(cert.extension::<BasicConstraints>().unwrap().is_some());
    }

    #[test]
    fn san_is_critical_only_for_an_empty_subject() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let cfg = CertConfig::builder()
            .subject(parse_subject(""))
            .build();
        let cert = Certificate::new_self_signed(&cfg, &key).unwrap();
        let san = cert
            .inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == SubjectAltName::OID)
            .unwrap();
        assert!(san.critical);
    }
}
