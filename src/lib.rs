//! # openqe-tls - Test PKI for TLS scenarios
//!
//! openqe-tls creates throwaway certificate authorities and CA-signed server
//! certificates for test environments, built on the RustCrypto stack. Keys
//! are RSA, signatures SHA-256 with PKCS#1 v1.5, and everything is exchanged
//! as PEM.
//!
//! ## Quick Start
//!
//! ### Generating a CA and a server certificate
//!
//! ```rust,no_run
//! use openqe_tls::pki;
//!
//! # fn main() -> Result<(), openqe_tls::error::TlsError> {
//! let ca = pki::generate_ca_with("/C=US/O=Test/CN=root", "ca.example.test")?;
//! let server = pki::generate_tls_key_cert_pair("CN=server", "example.test", &ca)?;
//!
//! assert_eq!(server.cert.issuer(), ca.cert.subject());
//! server.cert.verify_signed_by(&ca.key.public_key())?;
//!
//! println!("{}", server.cert.to_pem());
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom templates
//!
//! ```rust,no_run
//! use openqe_tls::cert::extensions::ExtendedKeyUsageOption;
//! use openqe_tls::cert::name::parse_subject;
//! use openqe_tls::cert::params::CertConfig;
//! use openqe_tls::pki;
//!
//! # fn main() -> Result<(), openqe_tls::error::TlsError> {
//! let cfg = CertConfig::builder()
//!     .key_size(3072)
//!     .subject(parse_subject("O=Example, CN=client"))
//!     .dns_names(vec!["client.example.test".to_string()])
//!     .ip_addresses(vec!["127.0.0.1".parse().unwrap()])
//!     .ext_key_usages(vec![ExtendedKeyUsageOption::ClientAuth])
//!     .build();
//!
//! let ca = pki::generate_ca()?;
//! let client = pki::generate_signed(&ca.key, &ca.cert, &cfg)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Checking a trust bundle
//!
//! ```rust,no_run
//! # fn main() -> Result<(), openqe_tls::error::TlsError> {
//! let ca = openqe_tls::pki::generate_ca()?;
//! let bundle = std::fs::read_to_string("/etc/pki/tls/certs/ca-bundle.crt").unwrap_or_default();
//! let trusted = openqe_tls::bundle::cert_in_bundle(ca.cert.to_pem(), bundle)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: Certificates, templates, names and extensions
//! - [`key`]: RSA key generation, signing and verification
//! - [`issuer`]: Turning a template into a signed certificate
//! - [`pki`]: CA and leaf generation entry points
//! - [`pem_utils`]: PEM armour for keys and certificates
//! - [`bundle`]: Trust bundle membership
//! - [`files`]: Reading and writing PEM files
//! - [`options`]: Options and configuration file
//! - [`error`]: Error type

pub mod bundle;
pub mod cert;
pub mod error;
pub mod files;
pub mod issuer;
pub mod key;
pub mod options;
pub mod pem_utils;
pub mod pki;
pub mod tbs_certificate;

pub use cert::name::{DistinguishedName, parse_subject};
pub use cert::params::CertConfig;
pub use cert::{Certificate, CertificateWithPrivateKey};
pub use error::{Result, TlsError};
pub use key::{KeyPair, PublicKey};
