//! Options of the file-based operations and the optional TOML file that
//! overrides their defaults.
//!
//! ```toml
//! [ca]
//! subject = "/C=US/O=Test/CN=root"
//! key_file = "~/pki/ca.key"
//!
//! [pki]
//! dns_name = "server.test"
//!
//! [check]
//! bundle_file = "bundle.pem"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cert::params::{DEFAULT_DNS_NAME, DEFAULT_SUBJECT};
use crate::error::{Result, TlsError};

pub const DEFAULT_SERVER_SUBJECT: &str =
    "C=China, O=OpenShift, OU=Hypershift QE, CN=default-server";
pub const DEFAULT_SERVER_DNS_NAME: &str = "server.openqe.github.io";
pub const DEFAULT_CA_KEY_FILE: &str = "ca.key";
pub const DEFAULT_CA_CERT_FILE: &str = "ca.crt";
pub const DEFAULT_TLS_KEY_FILE: &str = "tls.key";
pub const DEFAULT_TLS_CERT_FILE: &str = "tls.crt";
pub const DEFAULT_CA_BUNDLE_FILE: &str = "/etc/pki/tls/certs/ca-bundle.crt";

/// Where and how a CA is generated, or where it is read from when it signs
/// a leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaOptions {
    pub subject: String,
    pub dns_name: String,
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
}

impl Default for CaOptions {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            dns_name: DEFAULT_DNS_NAME.to_string(),
            key_file: PathBuf::from(DEFAULT_CA_KEY_FILE),
            cert_file: PathBuf::from(DEFAULT_CA_CERT_FILE),
        }
    }
}

/// Options of a CA-signed TLS key/cert pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkiOptions {
    pub ca: CaOptions,
    pub subject: String,
    pub dns_name: String,
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
}

impl Default for PkiOptions {
    fn default() -> Self {
        Self {
            ca: CaOptions::default(),
            subject: DEFAULT_SERVER_SUBJECT.to_string(),
            dns_name: DEFAULT_SERVER_DNS_NAME.to_string(),
            key_file: PathBuf::from(DEFAULT_TLS_KEY_FILE),
            cert_file: PathBuf::from(DEFAULT_TLS_CERT_FILE),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaCheckOptions {
    pub cert_file: PathBuf,
    pub bundle_file: PathBuf,
}

impl Default for CaCheckOptions {
    fn default() -> Self {
        Self {
            cert_file: PathBuf::new(),
            bundle_file: PathBuf::from(DEFAULT_CA_BUNDLE_FILE),
        }
    }
}

/// Contents of the configuration file. Every field is optional; absent
/// fields keep the built-in defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TlsConfig {
    pub ca: Section,
    pub pki: Section,
    pub check: CheckSection,
}

/// A `[ca]` or `[pki]` table.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Section {
    pub subject: Option<String>,
    pub dns_name: Option<String>,
    pub key_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckSection {
    pub cert_file: Option<PathBuf>,
    pub bundle_file: Option<PathBuf>,
}

impl TlsConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| TlsError::ConfigError(e.to_string()))
    }

    /// Loads the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TlsError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|e| {
            TlsError::ConfigError(format!("failed to parse {}: {e}", path.display()))
        })
    }

    pub fn ca_options(&self) -> CaOptions {
        let mut opts = CaOptions::default();
        self.ca.apply(
            &mut opts.subject,
            &mut opts.dns_name,
            &mut opts.key_file,
            &mut opts.cert_file,
        );
        opts
    }

    /// PKI options. The nested CA options come from the `[ca]` table.
    pub fn pki_options(&self) -> PkiOptions {
        let mut opts = PkiOptions {
            ca: self.ca_options(),
            ..PkiOptions::default()
        };
        self.pki.apply(
            &mut opts.subject,
            &mut opts.dns_name,
            &mut opts.key_file,
            &mut opts.cert_file,
        );
        opts
    }

    pub fn check_options(&self) -> CaCheckOptions {
        let mut opts = CaCheckOptions::default();
        if let Some(cert_file) = &self.check.cert_file {
            opts.cert_file.clone_from(cert_file);
        }
        if let Some(bundle_file) = &self.check.bundle_file {
            opts.bundle_file.clone_from(bundle_file);
        }
        opts
    }
}

impl Section {
    fn apply(
        &self,
        subject: &mut String,
        dns_name: &mut String,
        key_file: &mut PathBuf,
        cert_file: &mut PathBuf,
    ) {
        if let Some(value) = &self.subject {
            subject.clone_from(value);
        }
        if let Some(value) = &self.dns_name {
            dns_name.clone_from(value);
        }
        if let Some(value) = &self.key_file {
            key_file.clone_from(value);
        }
        if let Some(value) = &self.cert_file {
            cert_file.clone_from(value);
        }
    }
}
