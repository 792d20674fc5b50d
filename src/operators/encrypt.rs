//! Encrypt/Decrypt operator pair
//!
//! Symmetric, keyed transform of a span's literal text to an opaque token
//! and back. Uses AES-GCM with the cipher width selected by key length
//! (16, 24, or 32 bytes); any other length is rejected before use. Tokens
//! are framed as base64(nonce || ciphertext), so each call produces a
//! fresh token even for identical input, and decryption under a different
//! key fails authentication instead of yielding wrong plaintext.

use crate::domain::{CloakError, Result};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit},
    AesGcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};

type Aes128Gcm = AesGcm<Aes128, U12>;
type Aes192Gcm = AesGcm<Aes192, U12>;
type Aes256Gcm = AesGcm<Aes256, U12>;

const NONCE_LEN: usize = 12;

/// AES-GCM cipher keyed at one of the three supported widths
enum KeyedCipher {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl KeyedCipher {
    fn new(key: &SecretString) -> Result<Self> {
        let bytes = key.expose_secret().as_bytes();
        match bytes.len() {
            16 => Aes128Gcm::new_from_slice(bytes)
                .map(|c| Self::Aes128(Box::new(c)))
                .map_err(|e| CloakError::InvalidKey(e.to_string())),
            24 => Aes192Gcm::new_from_slice(bytes)
                .map(|c| Self::Aes192(Box::new(c)))
                .map_err(|e| CloakError::InvalidKey(e.to_string())),
            32 => Aes256Gcm::new_from_slice(bytes)
                .map(|c| Self::Aes256(Box::new(c)))
                .map_err(|e| CloakError::InvalidKey(e.to_string())),
            n => Err(CloakError::InvalidKey(format!(
                "key must be 16, 24 or 32 bytes, got {n}"
            ))),
        }
    }

    fn encrypt(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::from(*nonce);
        match self {
            Self::Aes128(c) => c.encrypt(&nonce, plaintext),
            Self::Aes192(c) => c.encrypt(&nonce, plaintext),
            Self::Aes256(c) => c.encrypt(&nonce, plaintext),
        }
        .map_err(|e| CloakError::Crypto(format!("encryption failed: {e}")))
    }

    fn decrypt(&self, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::from(*nonce);
        match self {
            Self::Aes128(c) => c.decrypt(&nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(&nonce, ciphertext),
            Self::Aes256(c) => c.decrypt(&nonce, ciphertext),
        }
        .map_err(|_| {
            CloakError::Crypto("decryption failed: wrong key or corrupted token".to_string())
        })
    }
}

/// Validate key length without constructing a cipher
pub(crate) fn validate_key(key: &SecretString) -> Result<()> {
    match key.expose_secret().len() {
        16 | 24 | 32 => Ok(()),
        n => Err(CloakError::InvalidKey(format!(
            "key must be 16, 24 or 32 bytes, got {n}"
        ))),
    }
}

/// Encrypt a span's text into an opaque token
pub(crate) fn encrypt_value(key: &SecretString, plaintext: &str) -> Result<String> {
    let cipher = KeyedCipher::new(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher.encrypt(&nonce, plaintext.as_bytes())?;

    // Token layout: base64([nonce (12 bytes)][ciphertext])
    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(framed))
}

/// Decrypt a token produced by [`encrypt_value`] back to the original text
pub(crate) fn decrypt_value(key: &SecretString, token: &str) -> Result<String> {
    let cipher = KeyedCipher::new(key)?;

    let framed = BASE64
        .decode(token)
        .map_err(|e| CloakError::Crypto(format!("token is not valid base64: {e}")))?;

    if framed.len() < NONCE_LEN {
        return Err(CloakError::Crypto("token too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| CloakError::Crypto("invalid nonce length in token".to_string()))?;

    let plaintext = cipher.decrypt(&nonce, ciphertext)?;

    String::from_utf8(plaintext)
        .map_err(|e| CloakError::Crypto(format!("decrypted value is not UTF-8: {e}")))
}
