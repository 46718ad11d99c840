//! PAN crypto service
//!
//! Authenticated encryption and one-way fingerprinting of card numbers.
//! The AES key and hash pepper are injected once at construction from
//! configuration and never mutated afterwards.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

mod pan;

pub use pan::{generate_pan, last_four, PAN_LENGTH};

/// Size of the AES-GCM nonce in bytes (96 bits).
const NONCE_SIZE: usize = 12;

/// AES-256 key length in bytes.
const KEY_SIZE: usize = 32;

/// Crypto failures.
///
/// Key problems are configuration-time errors and abort startup; the
/// per-operation variants indicate a corrupted blob or wrong key and are
/// not recoverable within a request.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid AES key material: {0}")]
    InvalidKey(String),

    #[error("PAN encryption failed")]
    EncryptionFailed,

    #[error("PAN decryption failed: invalid key or corrupted data")]
    DecryptionFailed,
}

/// Encrypts, decrypts and fingerprints card numbers.
///
/// Stored blob layout is `[nonce || ciphertext+tag]`, so decryption is
/// self-contained. A fresh random 96-bit nonce is drawn per encryption.
#[derive(Clone)]
pub struct PanCrypto {
    cipher: Aes256Gcm,
    pepper: String,
}

impl PanCrypto {
    /// Build the service from a base64-encoded 32-byte key and a secret
    /// pepper string.
    pub fn new(key_base64: &str, pepper: &str) -> Result<Self, CryptoError> {
        let key_bytes = BASE64
            .decode(key_base64)
            .map_err(|e| CryptoError::InvalidKey(format!("not valid base64: {e}")))?;

        if key_bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE,
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self {
            cipher,
            pepper: pepper.to_string(),
        })
    }

    /// Encrypt a PAN under the process-wide key with a fresh nonce.
    pub fn encrypt(&self, pan: &str) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, pan.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a stored blob back to the plaintext PAN.
    pub fn decrypt(&self, blob: &[u8]) -> Result<String, CryptoError> {
        if blob.len() <= NONCE_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Deterministic keyed digest of a PAN, used only for uniqueness
    /// checks. hex(SHA-256(pan ++ pepper)), never reversible.
    pub fn fingerprint(&self, pan: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(pan.as_bytes());
        hasher.update(self.pepper.as_bytes());
        hex::encode(hasher.finalize())
    }
}
