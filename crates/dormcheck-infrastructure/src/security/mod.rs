mod credential_cipher;
mod salt_store;
mod secret_cipher;

pub use credential_cipher::CredentialCipher;
pub use salt_store::{SaltError, SaltStore};
pub use secret_cipher::{CipherError, SecretCipher};
