// Credential encryption at rest
// AES-256-GCM with a key derived from machine identifiers, so the stored
// bearer token is unreadable when the data directory is copied elsewhere.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const KEY_SALT: &[u8] = b"AidChat-Credential-Key-v1";

/// Sealed token as stored in the credential table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedToken {
    /// Base64 encoded nonce
    pub nonce: String,
    /// Base64 encoded ciphertext
    pub ciphertext: String,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),
    #[error("Encryption error: {0}")]
    Seal(String),
    #[error("Decryption error: {0}")]
    Open(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Identifier stable for this user on this machine
fn machine_identity() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    format!("{}:{}", host, user)
}

fn derive_key(identity: &str) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_SALT);
    hasher.update(identity.as_bytes());
    let digest = hasher.finalize();

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest);
    key
}

fn cipher_for(identity: &str) -> Result<Aes256Gcm, CryptoError> {
    let key = derive_key(identity);
    Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Encrypt a token under the machine key
pub fn seal(token: &str) -> Result<SealedToken, CryptoError> {
    seal_with(&machine_identity(), token)
}

/// Decrypt a token sealed on this machine
pub fn open(sealed: &SealedToken) -> Result<String, CryptoError> {
    open_with(&machine_identity(), sealed)
}

fn seal_with(identity: &str, token: &str) -> Result<SealedToken, CryptoError> {
    let cipher = cipher_for(identity)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, token.as_bytes())
        .map_err(|e| CryptoError::Seal(e.to_string()))?;

    Ok(SealedToken {
        nonce: BASE64.encode(nonce_bytes),
        ciphertext: BASE64.encode(ciphertext),
    })
}

fn open_with(identity: &str, sealed: &SealedToken) -> Result<String, CryptoError> {
    let cipher = cipher_for(identity)?;

    let nonce_bytes = BASE64
        .decode(&sealed.nonce)
        .map_err(|e| CryptoError::InvalidData(format!("nonce: {}", e)))?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "nonce must be {} bytes, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }

    let ciphertext = BASE64
        .decode(&sealed.ciphertext)
        .map_err(|e| CryptoError::InvalidData(format!("ciphertext: {}", e)))?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|e| CryptoError::Open(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::Open(format!("not UTF-8: {}", e)))
}
