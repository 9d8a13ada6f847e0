//! Vault error taxonomy.

use crate::account::Chain;

/// Typed failures returned by every vault operation.
///
/// The decryption failure message is deliberately generic: a wrong password
/// and a tampered vault are indistinguishable to the caller.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("Invalid password or corrupted data")]
    InvalidPassword,

    #[error("Vault is locked")]
    Locked,

    #[error("No {chain} account at index {index}")]
    AccountNotFound { chain: Chain, index: u32 },

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Unsupported vault version {0}; migrate the vault with a newer release")]
    UnsupportedVersion(u32),

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to serialize vault content: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl From<dv_crypto_secp256k1::Error> for VaultError {
    fn from(err: dv_crypto_secp256k1::Error) -> Self {
        match err {
            dv_crypto_secp256k1::Error::InvalidPrivateKey
            | dv_crypto_secp256k1::Error::SigningError(_) => Self::Signing(err.to_string()),
            _ => Self::Derivation(err.to_string()),
        }
    }
}

impl From<dv_crypto_ed25519::Error> for VaultError {
    fn from(err: dv_crypto_ed25519::Error) -> Self {
        match err {
            dv_crypto_ed25519::Error::InvalidSeedLength(_)
            | dv_crypto_ed25519::Error::InvalidIndex(_) => Self::Derivation(err.to_string()),
            _ => Self::Signing(err.to_string()),
        }
    }
}
