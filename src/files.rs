//! Filesystem front end: generated material is written as PEM files and CA
//! material is read back from them.
//!
//! Paths starting with `~/` are resolved against `$HOME` before use.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bundle;
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::{Result, TlsError};
use crate::key::KeyPair;
use crate::options::{CaOptions, PkiOptions};
use crate::pki;

/// Resolves a leading `~/` against the `HOME` environment variable. Other
/// paths are returned unchanged.
pub fn expand_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    match path.strip_prefix("~") {
        Ok(rest) if path.to_string_lossy().starts_with("~/") => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                TlsError::InvalidInput(format!("cannot expand {}: HOME is not set", path.display()))
            })?;
            Ok(PathBuf::from(home).join(rest))
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn file_exists(path: &Path) -> bool {
    expand_path(path).is_ok_and(|p| p.is_file())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let expanded = expand_path(path)?;
    std::fs::read(&expanded).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TlsError::MissingFile(path.display().to_string()),
        _ => TlsError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let expanded = expand_path(path)?;
    std::fs::write(&expanded, contents).map_err(|e| TlsError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Writes `key` and `cert` as PEM to the given paths, creating or
/// truncating both files.
pub fn write_key_cert_pair(
    key_path: impl AsRef<Path>,
    cert_path: impl AsRef<Path>,
    key: &KeyPair,
    cert: &Certificate,
) -> Result<()> {
    write_file(key_path.as_ref(), key.to_pem()?.as_bytes())?;
    write_file(cert_path.as_ref(), cert.to_pem().as_bytes())
}

/// Reads a CA key and certificate from PEM files.
///
/// # Errors
/// `MissingFile` if either file does not exist, `FileRead` if it cannot be
/// read and `DecodeError` if its content is not the expected PEM.
pub fn read_ca(
    key_path: impl AsRef<Path>,
    cert_path: impl AsRef<Path>,
) -> Result<CertificateWithPrivateKey> {
    let (key_path, cert_path) = (key_path.as_ref(), cert_path.as_ref());
    for path in [key_path, cert_path] {
        if path.as_os_str().is_empty() || !file_exists(path) {
            return Err(TlsError::MissingFile(path.display().to_string()));
        }
    }

    let key = KeyPair::from_pem(read_file(key_path)?).map_err(|e| {
        TlsError::DecodeError(format!("CA private key {}: {e}", key_path.display()))
    })?;
    let cert = Certificate::from_pem(read_file(cert_path)?).map_err(|e| {
        TlsError::DecodeError(format!("CA certificate {}: {e}", cert_path.display()))
    })?;
    Ok(CertificateWithPrivateKey { cert, key })
}

/// CA material already loaded from disk, keyed by its key and certificate
/// paths.
#[derive(Debug, Default)]
pub struct CaCache {
    entries: HashMap<(PathBuf, PathBuf), CertificateWithPrivateKey>,
}

impl CaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the CA stored under the two paths, reading it on first use.
    pub fn get_or_load(
        &mut self,
        key_path: impl AsRef<Path>,
        cert_path: impl AsRef<Path>,
    ) -> Result<&CertificateWithPrivateKey> {
        let id = (key_path.as_ref().to_path_buf(), cert_path.as_ref().to_path_buf());
        match self.entries.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let (key_path, cert_path) = entry.key();
                let ca = read_ca(key_path, cert_path)?;
                debug!(key = %key_path.display(), cert = %cert_path.display(), "loaded CA");
                Ok(entry.insert(ca))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached CA, forcing the next lookup to read the files again.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Generates a CA from `opts` and writes it to `opts.key_file` and
/// `opts.cert_file`.
pub fn generate_ca_to_files(opts: &CaOptions) -> Result<CertificateWithPrivateKey> {
    if opts.key_file.as_os_str().is_empty() {
        return Err(TlsError::InvalidInput(
            "a CA key file is needed to save the CA private key".to_string(),
        ));
    }
    if opts.cert_file.as_os_str().is_empty() {
        return Err(TlsError::InvalidInput(
            "a CA certificate file is needed to save the CA certificate".to_string(),
        ));
    }

    let ca = pki::generate_ca_with(&opts.subject, &opts.dns_name)?;
    write_key_cert_pair(&opts.key_file, &opts.cert_file, &ca.key, &ca.cert)?;
    info!(
        key_file = %opts.key_file.display(),
        cert_file = %opts.cert_file.display(),
        "CA generated"
    );
    Ok(ca)
}

/// Generates a TLS key/cert pair signed by the CA in `opts.ca` and writes it
/// to `opts.key_file` and `opts.cert_file`.
pub fn generate_tls_key_cert_pair_to_files(
    opts: &PkiOptions,
    cache: &mut CaCache,
) -> Result<CertificateWithPrivateKey> {
    if opts.key_file.as_os_str().is_empty() {
        return Err(TlsError::InvalidInput(
            "a TLS key file is needed to save the TLS private key".to_string(),
        ));
    }
    if opts.cert_file.as_os_str().is_empty() {
        return Err(TlsError::InvalidInput(
            "a TLS certificate file is needed to save the TLS certificate".to_string(),
        ));
    }

    let ca = cache.get_or_load(&opts.ca.key_file, &opts.ca.cert_file)?;
    let pair = pki::generate_tls_key_cert_pair(&opts.subject, &opts.dns_name, ca)?;
    write_key_cert_pair(&opts.key_file, &opts.cert_file, &pair.key, &pair.cert)?;
    info!(
        key_file = %opts.key_file.display(),
        cert_file = %opts.cert_file.display(),
        "TLS key/cert pair generated"
    );
    Ok(pair)
}

/// Reports whether the certificate in `cert_path` is part of the bundle in
/// `bundle_path`. Both files must exist.
pub fn check_ca_cert_in_bundle(
    cert_path: impl AsRef<Path>,
    bundle_path: impl AsRef<Path>,
) -> Result<bool> {
    let (cert_path, bundle_path) = (cert_path.as_ref(), bundle_path.as_ref());
    for path in [cert_path, bundle_path] {
        if !file_exists(path) {
            return Err(TlsError::MissingFile(path.display().to_string()));
        }
    }
    bundle::cert_in_bundle(read_file(cert_path)?, read_file(bundle_path)?)
}

/// Reports whether `cert_pem` is part of the bundle in `bundle_path`. A
/// missing bundle holds nothing.
pub fn cert_in_ca_file(cert_pem: impl AsRef<[u8]>, bundle_path: impl AsRef<Path>) -> Result<bool> {
    let bundle_path = bundle_path.as_ref();
    if !file_exists(bundle_path) {
        debug!(bundle = %bundle_path.display(), "bundle file absent");
        return Ok(false);
    }
    bundle::cert_in_bundle(cert_pem, read_file(bundle_path)?)
}
