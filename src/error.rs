//! use openqe_tls::error::TlsError;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TlsError>;

/// Represents errors that can occur while generating, encoding or checking
/// certificates.
///
/// Every variant carries a human readable message. The CLI prints it and
/// exits non-zero; library callers can match on the kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlsError {
    /// The RSA primitive rejected the requested parameters.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Building or signing the certificate failed.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// The CA key and CA certificate do not belong together.
    #[error("Invalid CA: {0}")]
    InvalidCaError(String),

    /// Malformed PEM or DER given to the codec.
    #[error("Failed to decode data: {0}")]
    DecodeError(String),

    /// The certificate under test in a bundle check could not be decoded.
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file that must exist was not found.
    #[error("File does not exist: {0}")]
    MissingFile(String),

    #[error("Failed to read {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    FileWrite { path: String, reason: String },

    /// The configuration file could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<der::Error> for TlsError {
    /// Converts a `der::Error` into a `TlsError`.
    fn from(err: der::Error) -> Self {
        TlsError::DecodeError(err.to_string())
    }
}

impl From<pem::PemError> for TlsError {
    fn from(err: pem::PemError) -> Self {
        TlsError::DecodeError(err.to_string())
    }
}

impl From<rsa::Error> for TlsError {
    fn from(err: rsa::Error) -> Self {
        TlsError::KeyGenerationError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for TlsError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        TlsError::DecodeError(err.to_string())
    }
}

impl From<pkcs8::Error> for TlsError {
    fn from(err: pkcs8::Error) -> Self {
        TlsError::DecodeError(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for TlsError {
    fn from(err: x509_cert::spki::Error) -> Self {
        TlsError::DecodeError(err.to_string())
    }
}
