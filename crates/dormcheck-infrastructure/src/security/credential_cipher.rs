use base64::{engine::general_purpose, Engine as _};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use dormcheck_domain::platform::PlatformError;

/// Public key the login form encrypts username and password with
const PLATFORM_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQCC0hrRIjb3noDWNtbDpANbjt5I
wu2NFeDwU16Ec87ToqeoIm2KI+cOs81JP9aTDk/jkAlU97mN8wZkEMDr5utAZtMV
ht7GLX33Wx9XjqxUsDfsGkqNL8dXJklWDu9Zh80Ui2Ug+340d5dZtKtd+nv09QZq
GjdnSp9PTfFDBY133QIDAQAB
-----END PUBLIC KEY-----";

/// RSA PKCS#1 v1.5 encryption of login fields, base64 encoded
#[derive(Debug, Clone)]
pub struct CredentialCipher {
    key: RsaPublicKey,
}

impl CredentialCipher {
    pub fn platform() -> Result<Self, PlatformError> {
        Self::from_pem(PLATFORM_PUBLIC_KEY_PEM)
    }

    pub fn from_pem(pem: &str) -> Result<Self, PlatformError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| PlatformError::Encryption(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Padding is randomized, so equal inputs give different outputs
    pub fn encrypt(&self, plaintext: &str) -> Result<String, PlatformError> {
        let mut rng = rand::thread_rng();
        let ciphertext = self
            .key
            .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext.as_bytes())
            .map_err(|e| PlatformError::Encryption(e.to_string()))?;

        Ok(general_purpose::STANDARD.encode(ciphertext))
    }
}
