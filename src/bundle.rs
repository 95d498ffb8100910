//! Trust bundle membership.

use tracing::debug;

use crate::cert::Certificate;
use crate::error::{Result, TlsError};
use crate::pem_utils::{self, CERTIFICATE_LABEL};

/// Reports whether the certificate in `target` occurs in `bundle`.
///
/// `target` must start with a decodable `CERTIFICATE` block, anything else
/// is a `ParseError`. The bundle is scanned block by block: blocks with
/// another label, unterminated blocks and blocks whose content does not
/// decode are skipped. A match requires identical DER bytes.
pub fn cert_in_bundle(target: impl AsRef<[u8]>, bundle: impl AsRef<[u8]>) -> Result<bool> {
    let target = pem_utils::pem_to_cert(target)
        .map_err(|e| TlsError::ParseError(e.to_string()))?;

    for (index, block) in pem_utils::split_pem_blocks(bundle.as_ref())
        .into_iter()
        .enumerate()
    {
        let pem = match pem::parse(block) {
            Ok(pem) => pem,
            Err(e) => {
                debug!(index, error = %e, "skipping malformed bundle block");
                continue;
            }
        };
        if pem.tag() != CERTIFICATE_LABEL {
            debug!(index, label = pem.tag(), "skipping non-certificate bundle block");
            continue;
        }
        match Certificate::from_der(pem.contents()) {
            Ok(cert) if cert == target => return Ok(true),
            Ok(_) => {}
            Err(e) => debug!(index, error = %e, "skipping undecodable bundle certificate"),
        }
    }
    Ok(false)
}
