//! Credential protection
//!
//! Passwords in the connection store are protected with AES-256-GCM under a
//! key derived from a per-user master key plus an application discriminator
//! and a purpose string. Data protected for one purpose cannot be unprotected
//! for another.
//!
//! Protected form: `base64(nonce || ciphertext || tag)` with a 96-bit random
//! nonce, so protecting the same plaintext twice gives different output.

mod key;

pub use key::MasterKey;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{Error, Result};

/// Application discriminator mixed into every derived key
pub const APPLICATION_DISCRIMINATOR: &str = "cloudcontrol";

/// Purpose under which connection passwords are protected
pub const CONNECTION_CREDENTIALS_PURPOSE: &str = "cloudcontrol.connection.credentials";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric protection of short secrets
///
/// Implementations must round-trip: `unprotect(protect(x)) == x` within the
/// same key scope.
pub trait CredentialProtector: Send + Sync {
    /// Protect a plaintext secret
    fn protect(&self, plaintext: &str) -> Result<String>;

    /// Recover a plaintext secret; [`Error::DecryptionFailed`] on any failure
    fn unprotect(&self, protected: &str) -> Result<String>;
}

/// AES-256-GCM protector bound to one purpose
pub struct AesGcmProtector {
    cipher: Aes256Gcm,
    purpose: String,
}

impl AesGcmProtector {
    /// Create a protector for `purpose` from a master key
    pub fn new(master_key: &MasterKey, purpose: impl Into<String>) -> Self {
        let purpose = purpose.into();
        let derived = derive_key(master_key.as_bytes(), APPLICATION_DISCRIMINATOR, &purpose);

        Self {
            cipher: Aes256Gcm::new(&derived),
            purpose,
        }
    }

    /// Protector for connection passwords
    pub fn for_connection_credentials(master_key: &MasterKey) -> Self {
        Self::new(master_key, CONNECTION_CREDENTIALS_PURPOSE)
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }
}

impl fmt::Debug for AesGcmProtector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmProtector")
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}

impl CredentialProtector for AesGcmProtector {
    fn protect(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| Error::config("Failed to protect credential"))?;

        let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(output))
    }

    fn unprotect(&self, protected: &str) -> Result<String> {
        let data = BASE64
            .decode(protected.trim())
            .map_err(|e| Error::decryption_failed(format!("protected data is not valid Base64: {}", e)))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::decryption_failed("protected data is too short"));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                Error::decryption_failed(format!(
                    "integrity check failed for purpose '{}'",
                    self.purpose
                ))
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::decryption_failed("protected data is not valid UTF-8"))
    }
}

fn derive_key(
    master_key: &[u8],
    discriminator: &str,
    purpose: &str,
) -> aes_gcm::Key<Aes256Gcm> {
    let mut hasher = Sha256::new();
    hasher.update(master_key);
    hasher.update([0u8]);
    hasher.update(discriminator.as_bytes());
    hasher.update([0u8]);
    hasher.update(purpose.as_bytes());
    hasher.finalize()
}
