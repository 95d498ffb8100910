//! PEM armour for keys and certificates.
//!
//! Keys are written as PKCS#1 `RSA PRIVATE KEY` blocks and read back from
//! either PKCS#1 or PKCS#8 (`PRIVATE KEY`). Certificates use the
//! `CERTIFICATE` label. Output always uses LF line endings.

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::cert::Certificate;
use crate::error::{Result, TlsError};
use crate::key::KeyPair;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

static BEGIN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-----BEGIN ([^\r\n-]+)-----").expect("valid PEM marker regex"));

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert the first PEM block in `input` to DER, requiring `label`.
pub fn pem_to_der(input: impl AsRef<[u8]>, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(input)?;
    if pem.tag() != label {
        return Err(TlsError::DecodeError(format!(
            "expected a {label} PEM block, found {}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}

pub fn key_to_pem(key: &KeyPair) -> Result<String> {
    Ok(der_to_pem(&key.to_pkcs1_der()?, RSA_PRIVATE_KEY_LABEL))
}

pub fn pem_to_key(input: impl AsRef<[u8]>) -> Result<KeyPair> {
    let pem = pem::parse(input)?;
    match pem.tag() {
        RSA_PRIVATE_KEY_LABEL => KeyPair::from_pkcs1_der(pem.contents()),
        PRIVATE_KEY_LABEL => KeyPair::from_pkcs8_der(pem.contents()),
        other => Err(TlsError::DecodeError(format!(
            "expected a private key PEM block, found {other}"
        ))),
    }
}

pub fn cert_to_pem(cert: &Certificate) -> String {
    der_to_pem(cert.as_der(), CERTIFICATE_LABEL)
}

pub fn pem_to_cert(input: impl AsRef<[u8]>) -> Result<Certificate> {
    let der = pem_to_der(input, CERTIFICATE_LABEL)?;
    Certificate::from_der(&der)
}

/// Splits concatenated PEM text into the raw text of each complete block.
///
/// Anything between blocks is ignored. A block whose END marker is missing
/// before the next BEGIN marker is dropped. The content of the returned
/// blocks is not validated.
pub fn split_pem_blocks(input: &[u8]) -> Vec<&[u8]> {
    let begins: Vec<_> = BEGIN_MARKER.captures_iter(input).collect();
    let mut blocks = Vec::with_capacity(begins.len());

    for (i, begin) in begins.iter().enumerate() {
        let (Some(marker), Some(label)) = (begin.get(0), begin.get(1)) else {
            continue;
        };
        let limit = begins
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(input.len(), |next| next.start());

        let end_marker = [b"-----END ", label.as_bytes(), b"-----"].concat();
        let Some(offset) = find(&input[marker.end()..limit], &end_marker) else {
            continue;
        };

        let mut end = marker.end() + offset + end_marker.len();
        if input[end..].starts_with(b"\r\n") {
            end += 2;
        } else if input[end..].starts_with(b"\n") {
            end += 1;
        }
        blocks.push(&input[marker.start()..end]);
    }
    blocks
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
