use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use std::fmt;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// At-rest protection for stored account secrets.
///
/// AES-256-GCM with a key derived by Argon2id from the master password and
/// the installation salt. Sealed form is base64 of `nonce || ciphertext`.
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn derive(master_password: &str, salt: &[u8; 32]) -> Result<Self, CipherError> {
        if master_password.is_empty() {
            return Err(CipherError::KeyDerivation(
                "master password is empty".to_string(),
            ));
        }

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(master_password.as_bytes(), salt, &mut key)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;

        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| CipherError::Seal(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> Result<String, CipherError> {
        let data = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| CipherError::Format(format!("not base64: {e}")))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Format(format!(
                "sealed value is {} bytes, need at least {}",
                data.len(),
                NONCE_LEN + TAG_LEN
            )));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Open)?;

        String::from_utf8(plaintext).map_err(|e| CipherError::Format(e.to_string()))
    }
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretCipher(AES-256-GCM)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Sealing failed: {0}")]
    Seal(String),

    /// Wrong key or tampered data
    #[error("Sealed value could not be authenticated")]
    Open,

    #[error("Invalid sealed value: {0}")]
    Format(String),
}
