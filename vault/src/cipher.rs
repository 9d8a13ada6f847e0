//! Password-Based Encryption
//!
//! Each vault format version pins one key-derivation function and one AEAD:
//!
//! | version | KDF                                  | AEAD              |
//! |---------|--------------------------------------|-------------------|
//! | 1       | PBKDF2-HMAC-SHA256, 600 000 rounds   | AES-256-GCM       |
//! | 2       | Argon2id, 64 MiB, t=3, p=4           | ChaCha20-Poly1305 |
//!
//! Sealed output is `nonce || ciphertext || tag` with a fresh 96-bit nonce
//! per call. Any authentication failure is reported as
//! [`VaultError::InvalidPassword`].

use aes_gcm::Aes256Gcm;
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Format version written by default.
pub const DEFAULT_VERSION: u32 = 1;

/// Length of generated salts.
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted from a stored vault.
pub const MIN_SALT_LEN: usize = 16;

/// AEAD nonce length for both suites.
pub const NONCE_LEN: usize = 12;

const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

const PBKDF2_ROUNDS: u32 = 600_000;

const ARGON2_MEMORY_KB: u32 = 65536; // 64 MB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

/// KDF and AEAD pair selected by a vault's format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    Pbkdf2AesGcm,
    Argon2idChaCha20Poly1305,
}

impl CipherSuite {
    /// Fails closed on any version this build does not know.
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            1 => Ok(Self::Pbkdf2AesGcm),
            2 => Ok(Self::Argon2idChaCha20Poly1305),
            other => Err(VaultError::UnsupportedVersion(other)),
        }
    }

    pub fn version(self) -> u32 {
        match self {
            Self::Pbkdf2AesGcm => 1,
            Self::Argon2idChaCha20Poly1305 => 2,
        }
    }
}

/// A derived symmetric key. Boxed so the bytes keep a stable address for
/// memory locking; wiped on drop.
pub struct EncryptionKey {
    bytes: Box<Zeroizing<[u8; KEY_LEN]>>,
    suite: CipherSuite,
}

impl EncryptionKey {
    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Constant-time comparison against another derived key.
    pub fn matches(&self, other: &EncryptionKey) -> bool {
        self.suite == other.suite && bool::from(self.bytes[..].ct_eq(&other.bytes[..]))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

/// Fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Stretch a password into an [`EncryptionKey`] for `suite`.
pub fn derive_encryption_key(
    password: &str,
    salt: &[u8],
    suite: CipherSuite,
) -> Result<EncryptionKey> {
    if salt.len() < MIN_SALT_LEN {
        return Err(VaultError::InvalidPassword);
    }

    let mut bytes = Box::new(Zeroizing::new([0u8; KEY_LEN]));
    match suite {
        CipherSuite::Pbkdf2AesGcm => {
            pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut bytes[..]);
        }
        CipherSuite::Argon2idChaCha20Poly1305 => {
            let params = Params::new(
                ARGON2_MEMORY_KB,
                ARGON2_ITERATIONS,
                ARGON2_PARALLELISM,
                Some(KEY_LEN),
            )
            .map_err(|e| VaultError::Derivation(format!("argon2 parameters: {e}")))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password_into(password.as_bytes(), salt, &mut bytes[..])
                .map_err(|e| VaultError::Derivation(format!("argon2: {e}")))?;
        }
    }

    Ok(EncryptionKey { bytes, suite })
}

/// Encrypt `plaintext`, returning `nonce || ciphertext`.
pub fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = match key.suite {
        CipherSuite::Pbkdf2AesGcm => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| VaultError::Serialization("failed to create cipher".to_string()))?
            .encrypt(nonce, plaintext),
        CipherSuite::Argon2idChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| VaultError::Serialization("failed to create cipher".to_string()))?
            .encrypt(nonce, plaintext),
    }
    .map_err(|_| VaultError::Serialization("encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt the output of [`seal`].
pub fn unseal(key: &EncryptionKey, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::InvalidPassword);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = match key.suite {
        CipherSuite::Pbkdf2AesGcm => Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| VaultError::InvalidPassword)?
            .decrypt(nonce, ciphertext),
        CipherSuite::Argon2idChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| VaultError::InvalidPassword)?
            .decrypt(nonce, ciphertext),
    }
    .map_err(|_| VaultError::InvalidPassword)?;

    Ok(Zeroizing::new(plaintext))
}
