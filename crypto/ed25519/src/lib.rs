// Copyright (c) 2024 The Duovault Authors

#![deny(unsafe_code)]

//! Ed25519 keys for Solana accounts.
//!
//! Ed25519 has no public (non-hardened) child derivation, so every step of
//! the SLIP-0010 walk is hardened: `m/44'/501'/{index}'/0'`. The 32-byte node
//! secret at the end of the path is used directly as the ed25519 seed, and
//! the Solana address is the bare base58 encoding of the 32-byte public key.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroizing;

/// Errors that can occur during key operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Seed must be 64 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("Account index {0} is outside the hardenable range")]
    InvalidIndex(u32),

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signature")]
    InvalidSignature,
}

/// Length of a BIP-39 seed.
pub const SEED_LEN: usize = 64;

/// BIP-44 purpose and SLIP-0044 coin type for Solana.
const SOL_PURPOSE: u32 = 44;
const SOL_COIN_TYPE: u32 = 501;

const HARDENED: u32 = 0x8000_0000;

/// Human readable derivation path for a Solana account.
pub fn derivation_path(index: u32) -> String {
    format!("m/{SOL_PURPOSE}'/{SOL_COIN_TYPE}'/{index}'/0'")
}

/// Path components; `slip10_ed25519` sets the hardened bit on each.
const fn path_components(index: u32) -> [u32; 4] {
    [SOL_PURPOSE, SOL_COIN_TYPE, index, 0]
}

/// An ed25519 keypair for a Solana account.
#[derive(Clone)]
pub struct Ed25519Keypair {
    signing_key: SigningKey,
}

impl core::fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Ed25519Keypair {{ address: {} }}", self.address())
    }
}

impl Ed25519Keypair {
    /// Derive the keypair for account `index` from a 64-byte BIP-39 seed.
    pub fn from_seed(seed: &[u8], index: u32) -> Result<Self, Error> {
        if seed.len() != SEED_LEN {
            return Err(Error::InvalidSeedLength(seed.len()));
        }
        if index & HARDENED != 0 {
            return Err(Error::InvalidIndex(index));
        }

        let secret = Zeroizing::new(slip10_ed25519::derive_ed25519_private_key(
            seed,
            &path_components(index),
        ));
        Ok(Self::from_bytes(&secret))
    }

    /// Create a keypair from the 32-byte ed25519 seed.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Create a keypair from a hex-encoded 32-byte ed25519 seed.
    pub fn from_hex(private_key: &str) -> Result<Self, Error> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(private_key, &mut bytes[..]).map_err(|_| Error::InvalidPrivateKey)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// The 32-byte ed25519 seed.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 Solana address.
    pub fn address(&self) -> String {
        encode_address(&self.public_key())
    }

    /// Sign the raw message bytes; ed25519 hashes internally, no pre-hash.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Bare base58 (Bitcoin alphabet) of a public key.
pub fn encode_address(public_key: &[u8; 32]) -> String {
    bs58::encode(public_key).into_string()
}

/// Parse a base58 Solana address back into its public key.
pub fn decode_address(address: &str) -> Result<[u8; 32], Error> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::InvalidAddress(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| Error::InvalidAddress(format!("expected 32 bytes, got {}", v.len())))
}

/// Verify an ed25519 signature over `message`.
pub fn verify(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> Result<(), Error> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|e| Error::InvalidAddress(e.to_string()))?;
    verifying_key
        .verify(message, &Signature::from_bytes(signature))
        .map_err(|_| Error::InvalidSignature)
}
