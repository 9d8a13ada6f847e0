// Copyright (c) 2024 The Duovault Authors

#![deny(unsafe_code)]

//! Secp256k1 keys for Ethereum accounts.
//!
//! Walks the fixed BIP-44 path `m/44'/60'/0'/0/{index}` with BIP-32 child
//! derivation, turns the resulting scalar into an Ethereum address and signs
//! with deterministic (RFC 6979) recoverable ECDSA.
//!
//! # Examples
//!
//! ```ignore
//! use dv_crypto_secp256k1::Secp256k1Keypair;
//!
//! let keypair = Secp256k1Keypair::from_seed(&seed, 0)?;
//! assert!(keypair.eth_address().starts_with("0x"));
//!
//! // EIP-191 personal sign
//! let signature = keypair.sign_message(b"Hello, Ethereum!")?;
//! assert_eq!(signature.to_eth_bytes().len(), 65);
//! ```

use hmac::{Hmac, Mac};
use k256::{
    ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey},
    elliptic_curve::PrimeField,
    FieldBytes, Scalar, SecretKey,
};
use sha2::Sha512;
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// Errors that can occur during key operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Seed must be 64 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("Account index {0} is outside the non-hardened range")]
    InvalidIndex(u32),

    #[error("Key derivation failed: {0}")]
    DerivationError(String),

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Signing failed: {0}")]
    SigningError(String),
}

/// Length of a BIP-39 seed.
pub const SEED_LEN: usize = 64;

/// BIP-44 path components for Ethereum
const ETH_PURPOSE: u32 = 44;
const ETH_COIN_TYPE: u32 = 60;

/// Hardened key offset
const HARDENED: u32 = 0x8000_0000;

/// HMAC key for the BIP-32 master node.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Human readable derivation path for an Ethereum account.
pub fn derivation_path(index: u32) -> String {
    format!("m/{ETH_PURPOSE}'/{ETH_COIN_TYPE}'/0'/0/{index}")
}

/// Numeric BIP-32 path for an Ethereum account.
const fn path_components(index: u32) -> [u32; 5] {
    [
        ETH_PURPOSE | HARDENED,   // 44'
        ETH_COIN_TYPE | HARDENED, // 60'
        HARDENED,                 // 0'
        0,                        // external chain
        index,                    // address index
    ]
}

/// A node of the BIP-32 tree: private scalar plus chain code.
struct ExtendedKey {
    secret: SecretKey,
    chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    fn from_hmac_output(output: &[u8; 64]) -> Result<Self, Error> {
        let secret = SecretKey::from_slice(&output[..32])
            .map_err(|_| Error::DerivationError("master key out of range".to_string()))?;
        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(&output[32..]);
        Ok(Self { secret, chain_code })
    }

    fn master(seed: &[u8]) -> Result<Self, Error> {
        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|e| Error::DerivationError(e.to_string()))?;
        mac.update(seed);
        let mut output = Zeroizing::new([0u8; 64]);
        output.copy_from_slice(&mac.finalize().into_bytes());
        Self::from_hmac_output(&output)
    }

    fn child(&self, index: u32) -> Result<Self, Error> {
        let mut mac = HmacSha512::new_from_slice(&self.chain_code[..])
            .map_err(|e| Error::DerivationError(e.to_string()))?;

        if index & HARDENED != 0 {
            // 0x00 || ser256(k_par) || ser32(i)
            let mut parent_bytes = Zeroizing::new([0u8; 32]);
            parent_bytes.copy_from_slice(&self.secret.to_bytes());
            mac.update(&[0x00]);
            mac.update(&parent_bytes[..]);
        } else {
            // serP(K_par) || ser32(i)
            let signing = SigningKey::from(self.secret.clone());
            let point = signing.verifying_key().to_encoded_point(true);
            mac.update(point.as_bytes());
        }
        mac.update(&index.to_be_bytes());

        let mut output = Zeroizing::new([0u8; 64]);
        output.copy_from_slice(&mac.finalize().into_bytes());

        // IL >= n makes the child invalid per BIP-32; so does a zero sum.
        let tweak: Option<Scalar> =
            Scalar::from_repr(FieldBytes::clone_from_slice(&output[..32])).into();
        let tweak = tweak
            .ok_or_else(|| Error::DerivationError(format!("child {index} tweak out of range")))?;
        let child_scalar = tweak + self.secret.to_nonzero_scalar().as_ref();
        let secret = SecretKey::from_bytes(&child_scalar.to_repr())
            .map_err(|_| Error::DerivationError(format!("child {index} is the zero key")))?;

        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(&output[32..]);
        Ok(Self { secret, chain_code })
    }
}

/// A deterministic ECDSA signature with its recovery id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    r_s: [u8; 64],
    recovery_id: u8,
}

impl RecoverableSignature {
    /// `r || s || v` with `v = 27 + recovery_id`, the personal-sign layout.
    pub fn to_eth_bytes(&self) -> [u8; 65] {
        self.with_v(self.recovery_id + 27)
    }

    /// `r || s || y_parity`, the layout typed transactions carry.
    pub fn to_parity_bytes(&self) -> [u8; 65] {
        self.with_v(self.recovery_id)
    }

    /// The `r || s` half of the signature.
    pub fn compact(&self) -> &[u8; 64] {
        &self.r_s
    }

    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    fn with_v(&self, v: u8) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.r_s);
        out[64] = v;
        out
    }
}

/// A secp256k1 keypair for an Ethereum account.
#[derive(Clone)]
pub struct Secp256k1Keypair {
    // SigningKey zeroizes its scalar on drop.
    signing_key: SigningKey,
}

impl core::fmt::Debug for Secp256k1Keypair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Secp256k1Keypair {{ address: {} }}", self.eth_address())
    }
}

impl Secp256k1Keypair {
    /// Derive the keypair for account `index` from a 64-byte BIP-39 seed.
    ///
    /// Path: `m/44'/60'/0'/0/{index}`.
    pub fn from_seed(seed: &[u8], index: u32) -> Result<Self, Error> {
        if seed.len() != SEED_LEN {
            return Err(Error::InvalidSeedLength(seed.len()));
        }
        if index & HARDENED != 0 {
            return Err(Error::InvalidIndex(index));
        }

        let mut node = ExtendedKey::master(seed)?;
        for child_index in path_components(index) {
            node = node.child(child_index)?;
        }

        Ok(Self {
            signing_key: SigningKey::from(node.secret),
        })
    }

    /// Create a keypair from raw 32-byte private key bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, Error> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| Error::InvalidPrivateKey)?;

        Ok(Self {
            signing_key: SigningKey::from(secret_key),
        })
    }

    /// Create a keypair from a hex-encoded private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self, Error> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(private_key.trim_start_matches("0x"), &mut bytes[..])
            .map_err(|_| Error::InvalidPrivateKey)?;
        Self::from_bytes(&bytes)
    }

    /// The raw 32-byte private scalar.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Get the public key as uncompressed bytes (65 bytes: 0x04 || x || y).
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Get the public key as compressed bytes (33 bytes: 0x02/0x03 || x).
    pub fn public_key_compressed(&self) -> [u8; 33] {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// The raw 20-byte Ethereum address.
    pub fn eth_address_bytes(&self) -> [u8; 20] {
        address_from_public_key(&self.public_key_uncompressed())
    }

    /// Lower-case `0x`-prefixed Ethereum address.
    pub fn eth_address(&self) -> String {
        format_address(&self.eth_address_bytes())
    }

    /// EIP-55 mixed-case form of [`Self::eth_address`], for display.
    pub fn checksum_address(&self) -> String {
        checksum_encode(&self.eth_address_bytes())
    }

    /// Sign a message using EIP-191 personal sign format.
    ///
    /// The message is prefixed with "\x19Ethereum Signed Message:\n{length}"
    /// before hashing with Keccak-256.
    pub fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, Error> {
        self.sign_hash(&eip191_hash(message))
    }

    /// Sign Keccak-256 of an already serialized payload.
    pub fn sign_payload(&self, payload: &[u8]) -> Result<RecoverableSignature, Error> {
        self.sign_hash(&keccak256(payload))
    }

    /// Sign a raw 32-byte hash.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature, Error> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| Error::SigningError(e.to_string()))?;

        let mut r_s = [0u8; 64];
        r_s.copy_from_slice(&signature.to_bytes());
        Ok(RecoverableSignature {
            r_s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Compute the EIP-191 personal sign hash for a message.
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Last 20 bytes of Keccak-256 over `x || y` (the 0x04 prefix stripped).
pub fn address_from_public_key(public_key: &[u8; 65]) -> [u8; 20] {
    let hash = keccak256(&public_key[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Lower-case hex with a `0x` prefix.
pub fn format_address(address: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(address))
}

/// EIP-55 checksum encode an address.
pub fn checksum_encode(address: &[u8; 20]) -> String {
    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in hex_addr.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Recover the uncompressed public key from a signature over `hash`.
///
/// Accepts `v` as either 27/28 or a bare recovery id.
pub fn recover_public_key(hash: &[u8; 32], signature: &[u8; 65]) -> Option<[u8; 65]> {
    let v = signature[64];
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })?;

    let sig = K256Signature::from_slice(&signature[..64]).ok()?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id).ok()?;

    let point = verifying_key.to_encoded_point(false);
    let mut result = [0u8; 65];
    result.copy_from_slice(point.as_bytes());
    Some(result)
}

/// Recover the Ethereum address that produced a personal-sign signature.
pub fn recover_address(message: &[u8], signature: &[u8; 65]) -> Option<[u8; 20]> {
    let pubkey = recover_public_key(&eip191_hash(message), signature)?;
    Some(address_from_public_key(&pubkey))
}

/// Check a personal-sign signature against an address string.
pub fn verify_message(address: &str, message: &[u8], signature: &[u8; 65]) -> bool {
    recover_address(message, signature)
        .map(|recovered| format_address(&recovered).eq_ignore_ascii_case(address))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bip39::{Language, Mnemonic, Seed};

    // Standard test mnemonic (DO NOT USE IN PRODUCTION)
    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_seed() -> Vec<u8> {
        let mnemonic = Mnemonic::from_phrase(TEST_MNEMONIC, Language::English).unwrap();
        Seed::new(&mnemonic, "").as_bytes().to_vec()
    }

    #[test]
    fn test_known_address() {
        let keypair = Secp256k1Keypair::from_seed(&test_seed(), 0).unwrap();

        // Verified against MetaMask and other wallets
        assert_eq!(
            keypair.eth_address(),
            "0x9858effd232b4033e47d90003d41ec34ecaeda94"
        );
        assert_eq!(
            keypair.checksum_address(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = test_seed();
        let a = Secp256k1Keypair::from_seed(&seed, 3).unwrap();
        let b = Secp256k1Keypair::from_seed(&seed, 3).unwrap();

        assert_eq!(*a.private_key_bytes(), *b.private_key_bytes());
        assert_eq!(a.public_key_uncompressed(), b.public_key_uncompressed());
        assert_eq!(a.eth_address(), b.eth_address());
    }

    #[test]
    fn test_different_indices() {
        let seed = test_seed();
        let keypair0 = Secp256k1Keypair::from_seed(&seed, 0).unwrap();
        let keypair1 = Secp256k1Keypair::from_seed(&seed, 1).unwrap();

        assert_ne!(keypair0.eth_address(), keypair1.eth_address());
    }

    #[test]
    fn test_rejects_bad_seed_and_index() {
        assert!(matches!(
            Secp256k1Keypair::from_seed(&[0u8; 32], 0),
            Err(Error::InvalidSeedLength(32))
        ));
        assert!(matches!(
            Secp256k1Keypair::from_seed(&test_seed(), HARDENED),
            Err(Error::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_hex_round_trip() {
        let keypair = Secp256k1Keypair::from_seed(&test_seed(), 0).unwrap();
        let hex_key = hex::encode(*keypair.private_key_bytes());
        let restored = Secp256k1Keypair::from_hex(&hex_key).unwrap();

        assert_eq!(restored.eth_address(), keypair.eth_address());
        assert!(Secp256k1Keypair::from_hex("zz").is_err());
        assert!(Secp256k1Keypair::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_sign_and_recover() {
        let keypair = Secp256k1Keypair::from_seed(&test_seed(), 0).unwrap();
        let message = b"Hello, Ethereum!";

        let signature = keypair.sign_message(message).unwrap().to_eth_bytes();
        assert!(signature[64] == 27 || signature[64] == 28);

        let recovered = recover_address(message, &signature).unwrap();
        assert_eq!(recovered, keypair.eth_address_bytes());
        assert!(verify_message(&keypair.eth_address(), message, &signature));
        assert!(!verify_message(&keypair.eth_address(), b"tampered", &signature));
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let keypair = Secp256k1Keypair::from_seed(&test_seed(), 0).unwrap();
        let first = keypair.sign_payload(b"payload").unwrap();
        let second = keypair.sign_payload(b"payload").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_parity_bytes()[64], first.recovery_id());
    }

    #[test]
    fn test_public_key_formats() {
        let keypair = Secp256k1Keypair::from_seed(&test_seed(), 0).unwrap();

        let uncompressed = keypair.public_key_uncompressed();
        assert_eq!(uncompressed[0], 0x04);

        let compressed = keypair.public_key_compressed();
        assert!(compressed[0] == 0x02 || compressed[0] == 0x03);
        assert_eq!(compressed[1..], uncompressed[1..33]);
    }

    #[test]
    fn test_derivation_path() {
        assert_eq!(derivation_path(0), "m/44'/60'/0'/0/0");
        assert_eq!(derivation_path(7), "m/44'/60'/0'/0/7");
    }
}
