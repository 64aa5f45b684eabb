//! String encryption/decryption using AES-256-GCM.
//!
//! SMS provider API credentials are encrypted with this before they are
//! written to the `provider_settings` table and decrypted on the way out.

use aes_gcm::aead::rand_core::{OsRng, RngCore};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};

#[derive(Debug)]
pub enum CryptoError {
    InvalidKey,
    EncryptionFailed,
    DecryptionFailed,
    InvalidData,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::InvalidKey => write!(f, "Invalid encryption key"),
            CryptoError::EncryptionFailed => write!(f, "Encryption failed"),
            CryptoError::DecryptionFailed => write!(f, "Decryption failed"),
            CryptoError::InvalidData => write!(f, "Invalid data format"),
        }
    }
}

impl std::error::Error for CryptoError {}

/// AES-256-GCM encryption/decryption for strings.
pub struct StringCrypto {
    cipher: Aes256Gcm,
}

impl StringCrypto {
    /// Build a cipher from the configured key string.
    ///
    /// Accepts either a base64-encoded 256-bit key or a raw passphrase,
    /// which is padded/truncated to 32 bytes.
    pub fn new(key_str: &str) -> Result<Self, CryptoError> {
        let key_bytes = if key_str.len() == 44 {
            // Assume base64 encoded key
            general_purpose::STANDARD
                .decode(key_str)
                .map_err(|_| CryptoError::InvalidKey)?
        } else {
            let mut bytes = vec![0u8; 32];
            let input_bytes = key_str.as_bytes();
            let copy_len = std::cmp::min(input_bytes.len(), 32);
            bytes[..copy_len].copy_from_slice(&input_bytes[..copy_len]);
            bytes
        };

        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(StringCrypto {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a string and return base64 encoded result.
    /// Each encryption uses a unique nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        // Combine nonce + ciphertext
        let mut result = Vec::new();
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(result))
    }

    /// Decrypt a base64 encoded string that was encrypted with `encrypt()`.
    pub fn decrypt(&self, encrypted_data: &str) -> Result<String, CryptoError> {
        let data = general_purpose::STANDARD
            .decode(encrypted_data)
            .map_err(|_| CryptoError::InvalidData)?;

        if data.len() < 12 {
            return Err(CryptoError::InvalidData);
        }

        let (nonce_bytes, ciphertext) = data.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidData)
    }
}

/// Generate a new base64-encoded 256-bit encryption key.
pub fn generate_key() -> String {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    general_purpose::STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let crypto = StringCrypto::new("test passphrase").unwrap();
        let original = "api-key-123";

        let encrypted = crypto.encrypt(original).unwrap();
        let decrypted = crypto.decrypt(&encrypted).unwrap();

        assert_ne!(encrypted, original);
        assert_eq!(original, decrypted);
    }

    #[test]
    fn test_unique_nonces() {
        let crypto = StringCrypto::new(&generate_key()).unwrap();
        let msg = "Same message";
        let enc1 = crypto.encrypt(msg).unwrap();
        let enc2 = crypto.encrypt(msg).unwrap();

        // Same message should produce different ciphertext
        assert_ne!(enc1, enc2);

        assert_eq!(crypto.decrypt(&enc1).unwrap(), msg);
        assert_eq!(crypto.decrypt(&enc2).unwrap(), msg);
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = StringCrypto::new("key-a").unwrap();
        let b = StringCrypto::new("key-b").unwrap();

        let encrypted = a.encrypt("secret").unwrap();
        assert!(b.decrypt(&encrypted).is_err());
    }
}
