use std::fmt;

use der::Encode;
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{Result, TlsError};
use crate::pem_utils;

/// Smallest modulus accepted by [`KeyPair::generate_rsa`].
pub const MIN_RSA_KEY_SIZE: usize = 512;
/// Largest modulus accepted by [`KeyPair::generate_rsa`].
pub const MAX_RSA_KEY_SIZE: usize = 16384;

/// An RSA key pair.
///
/// Cloning copies the private key material; nothing is shared between
/// clones.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if !(MIN_RSA_KEY_SIZE..=MAX_RSA_KEY_SIZE).contains(&bits) {
            return Err(TlsError::KeyGenerationError(format!(
                "unsupported RSA key size {bits}, expected {MIN_RSA_KEY_SIZE}..={MAX_RSA_KEY_SIZE} bits"
            )));
        }
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        debug!(bits, "generated RSA key pair");
        Ok(Self::from_private_key(private))
    }

    /// Wraps an existing RSA private key.
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    /// Size of the modulus in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.public.clone())
    }

    /// The SubjectPublicKeyInfo structure embedded in certificates.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| TlsError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }

    /// PKCS#1 DER encoding of the private key.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        let doc = self
            .private
            .to_pkcs1_der()
            .map_err(|e| TlsError::EncodingError(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        Ok(Self::from_private_key(RsaPrivateKey::from_pkcs1_der(der)?))
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        Ok(Self::from_private_key(RsaPrivateKey::from_pkcs8_der(der)?))
    }

    /// Encodes the private key as a PKCS#1 `RSA PRIVATE KEY` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        pem_utils::key_to_pem(self)
    }

    /// Decodes a `RSA PRIVATE KEY` or `PRIVATE KEY` PEM block.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        pem_utils::pem_to_key(pem)
    }
}

/// The public half of a [`KeyPair`], or the key found in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Extracts the RSA key from a certificate's SubjectPublicKeyInfo.
    ///
    /// Keys of any other algorithm are rejected.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        Ok(PublicKey(RsaPublicKey::from_public_key_der(&der)?))
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        SubjectPublicKeyInfoOwned::from_key(self.0.clone())
            .map_err(|e| TlsError::EncodingError(e.to_string()))
    }

    /// SHA-1 over the subjectPublicKey bits, as used for key identifiers.
    pub fn key_id(&self) -> Result<Vec<u8>> {
        let spki = self.to_spki()?;
        let digest = <sha1::Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());
        Ok(digest.to_vec())
    }

    /// Checks an RSASSA-PKCS1-v1_5 SHA-256 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)
            .map_err(|e| TlsError::DecodeError(e.to_string()))?;
        verifying_key
            .verify(data, &signature)
            .map_err(|e| TlsError::SigningError(e.to_string()))
    }
}
