//! Reversible encryption of the help desk password.
//!
//! The help desk has no API tokens, so its password has to be recoverable for
//! every re-authentication. Passwords are stored as AES-256-CBC ciphertext in
//! the form `<ivHex>:<cipherHex>`:
//! - 256-bit key, the SHA-256 digest of a process-wide secret
//! - 128-bit random IV per encryption
//! - PKCS#7 padding

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

use crate::config::VaultConfig;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Environment variable consulted when no secret is configured.
pub const SECRET_ENV_VAR: &str = "ENCRYPTION_KEY";

const IV_LENGTH: usize = 16;
const BLOCK_SIZE: usize = 16;

/// Errors raised while encrypting or decrypting a stored password.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid ciphertext format: {0}")]
    InvalidFormat(String),

    #[error("Encryption secret is not configured")]
    MissingSecret,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Symmetric vault keyed by a digest of the process-wide secret.
///
/// Changing the secret makes every previously produced ciphertext
/// undecryptable.
pub struct CredentialVault {
    key: [u8; 32],
}

impl CredentialVault {
    /// Create a vault from the raw secret.
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::MissingSecret);
        }

        Ok(Self {
            key: Sha256::digest(secret.as_bytes()).into(),
        })
    }

    /// Create a vault from `ENCRYPTION_KEY`.
    pub fn from_env() -> Result<Self, CryptoError> {
        let mut secret = std::env::var(SECRET_ENV_VAR).map_err(|_| CryptoError::MissingSecret)?;
        let vault = Self::new(&secret);
        secret.zeroize();
        vault
    }

    /// Create a vault from configuration, falling back to the environment.
    pub fn from_config(config: &VaultConfig) -> Result<Self, CryptoError> {
        match config.secret.as_deref() {
            Some(secret) => Self::new(secret),
            None => Self::from_env(),
        }
    }

    /// Encrypt a plaintext into `<ivHex>:<cipherHex>`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(&self.key, &iv)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
    }

    /// Decrypt a `<ivHex>:<cipherHex>` string back into its plaintext.
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CryptoError> {
        let parts: Vec<&str> = encrypted.split(':').collect();
        if parts.len() != 2 {
            return Err(CryptoError::InvalidFormat(format!(
                "expected 2 colon-separated parts, found {}",
                parts.len()
            )));
        }

        let iv = hex::decode(parts[0])
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid IV: {}", e)))?;
        if iv.len() != IV_LENGTH {
            return Err(CryptoError::DecryptionFailed(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                iv.len()
            )));
        }

        let ciphertext = hex::decode(parts[1])
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid ciphertext: {}", e)))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::DecryptionFailed(
                "ciphertext is not a whole number of blocks".to_string(),
            ));
        }

        let cipher = Aes256CbcDec::new_from_slices(&self.key, &iv)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed("bad padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::DecryptionFailed("plaintext is not UTF-8".to_string()))
    }
}

impl Drop for CredentialVault {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
