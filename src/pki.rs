//! Key and certificate generation.
//!
//! Every certificate is signed with SHA-256 and RSA PKCS#1 v1.5. A CA is a
//! self-signed certificate with the CA flag set. Leaves are signed by a CA
//! key and always carry `CA:FALSE`.

use tracing::debug;

use crate::cert::params::CertConfig;
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::Result;
use crate::issuer::{CaIssuer, Issuer};
use crate::key::KeyPair;

/// Generates a fresh key of `cfg.key_size` bits and a self-signed
/// certificate for it. Subject and issuer are both `cfg.subject`.
pub fn generate_self_signed(cfg: &CertConfig) -> Result<CertificateWithPrivateKey> {
    let key = KeyPair::generate_rsa(cfg.key_size)?;
    let cert = Certificate::new_self_signed(cfg, &key)?;
    Ok(CertificateWithPrivateKey { cert, key })
}

/// Generates a fresh leaf key and a certificate for it signed by `ca_key`.
///
/// The issuer field is copied from the subject of `ca_cert` and the CA flag
/// is cleared whatever `cfg.is_ca` says.
///
/// # Errors
/// `InvalidCaError` when `ca_key` is not the key certified by `ca_cert` or
/// `ca_cert` does not hold an RSA key.
pub fn generate_signed(
    ca_key: &KeyPair,
    ca_cert: &Certificate,
    cfg: &CertConfig,
) -> Result<CertificateWithPrivateKey> {
    let mut leaf_cfg = cfg.clone();
    leaf_cfg.is_ca = false;

    let key = KeyPair::generate_rsa(leaf_cfg.key_size)?;
    let issuer = CaIssuer {
        cert: ca_cert,
        key: ca_key,
    };
    let cert = issuer.issue(&leaf_cfg, &key.public_key())?;
    Ok(CertificateWithPrivateKey { cert, key })
}

/// Generates a CA with the default template.
pub fn generate_ca() -> Result<CertificateWithPrivateKey> {
    generate_ca_with("", "")
}

/// Generates a CA from the default template, replacing the subject and the
/// DNS name when they are non-empty.
pub fn generate_ca_with(subject: &str, dns_name: &str) -> Result<CertificateWithPrivateKey> {
    let cfg = CertConfig::ca(subject, dns_name);
    debug!(subject = %cfg.subject, bits = cfg.key_size, "generating CA");
    generate_self_signed(&cfg)
}

/// Generates a leaf key and certificate signed by `ca`, from the default
/// template with the given overrides.
pub fn generate_tls_key_cert_pair(
    subject: &str,
    dns_name: &str,
    ca: &CertificateWithPrivateKey,
) -> Result<CertificateWithPrivateKey> {
    let cfg = CertConfig::leaf(subject, dns_name);
    debug!(subject = %cfg.subject, "generating TLS key/cert pair");
    generate_signed(&ca.key, &ca.cert, &cfg)
}
