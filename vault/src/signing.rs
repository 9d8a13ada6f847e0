//! Chain dispatch for message and transaction signing.
//!
//! The curve-level work lives in the crypto crates; this module decodes the
//! account's hex key, picks the scheme for the chain and formats the output.

use dv_crypto_ed25519::Ed25519Keypair;
use dv_crypto_secp256k1::Secp256k1Keypair;
use serde::{Deserialize, Serialize};

use crate::account::{Account, Chain};
use crate::error::Result;

/// Sign a user-visible message.
///
/// Ethereum uses EIP-191 personal-sign and returns `0x` + hex of
/// `r || s || v` with `v` in {27, 28}. Solana signs the raw bytes and returns
/// the hex of the 64-byte signature.
pub fn sign_message(chain: Chain, account: &Account, message: &[u8]) -> Result<String> {
    match chain {
        Chain::Ethereum => {
            let keypair = Secp256k1Keypair::from_hex(&account.private_key)?;
            let signature = keypair.sign_message(message)?;
            Ok(format!("0x{}", hex::encode(signature.to_eth_bytes())))
        }
        Chain::Solana => {
            let keypair = Ed25519Keypair::from_hex(&account.private_key)?;
            Ok(hex::encode(keypair.sign(message)))
        }
    }
}

/// Raw signature over a caller-serialized transaction payload.
///
/// Ethereum signs Keccak-256 of the payload and returns `r || s || y_parity`;
/// Solana signs the payload bytes directly.
pub fn sign_payload(chain: Chain, account: &Account, payload: &[u8]) -> Result<Vec<u8>> {
    match chain {
        Chain::Ethereum => {
            let keypair = Secp256k1Keypair::from_hex(&account.private_key)?;
            Ok(keypair.sign_payload(payload)?.to_parity_bytes().to_vec())
        }
        Chain::Solana => {
            let keypair = Ed25519Keypair::from_hex(&account.private_key)?;
            Ok(keypair.sign(payload).to_vec())
        }
    }
}

/// Check a signature produced by [`sign_message`] against an address.
///
/// Malformed addresses or signatures verify as `false`.
pub fn verify_message(chain: Chain, address: &str, message: &[u8], signature_hex: &str) -> bool {
    let signature_hex = signature_hex.trim_start_matches("0x");
    match chain {
        Chain::Ethereum => {
            let mut signature = [0u8; 65];
            if hex::decode_to_slice(signature_hex, &mut signature).is_err() {
                return false;
            }
            dv_crypto_secp256k1::verify_message(address, message, &signature)
        }
        Chain::Solana => {
            let mut signature = [0u8; 64];
            if hex::decode_to_slice(signature_hex, &mut signature).is_err() {
                return false;
            }
            dv_crypto_ed25519::decode_address(address)
                .and_then(|public_key| dv_crypto_ed25519::verify(&public_key, message, &signature))
                .is_ok()
        }
    }
}

/// A signature attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub chain: Chain,
    /// Address of the signing account
    pub signer: String,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

/// A transaction object the vault can sign without knowing its wire format.
pub trait SignableTransaction {
    /// Bytes to sign, already serialized by the caller.
    fn signing_payload(&self) -> Vec<u8>;

    /// Store the signature produced over [`Self::signing_payload`].
    fn attach_signature(&mut self, signature: TransactionSignature);
}

/// Opaque payload plus collected signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub signatures: Vec<TransactionSignature>,
}

impl RawTransaction {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            signatures: Vec::new(),
        }
    }

    /// Whether `signer` has already signed.
    pub fn is_signed_by(&self, signer: &str) -> bool {
        self.signatures.iter().any(|s| s.signer == signer)
    }
}

impl SignableTransaction for RawTransaction {
    fn signing_payload(&self) -> Vec<u8> {
        self.payload.clone()
    }

    fn attach_signature(&mut self, signature: TransactionSignature) {
        // a re-sign by the same key replaces the earlier entry
        self.signatures
            .retain(|s| !(s.chain == signature.chain && s.signer == signature.signer));
        self.signatures.push(signature);
    }
}
