//! Per-chain account derivation from a BIP-39 seed.

use dv_crypto_ed25519::Ed25519Keypair;
use dv_crypto_secp256k1::Secp256k1Keypair;
use zeroize::Zeroizing;

use crate::account::{Account, Chain};
use crate::error::{Result, VaultError};
use crate::mnemonic::SEED_LEN;

/// Derive the account at `index` for `chain`.
///
/// Fails with `Derivation` only for a malformed seed or an index outside the
/// hardenable range.
pub fn derive_account(seed: &[u8], chain: Chain, index: u32) -> Result<Account> {
    if seed.len() != SEED_LEN {
        return Err(VaultError::Derivation(format!(
            "seed must be {SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }

    match chain {
        Chain::Ethereum => derive_ethereum(seed, index),
        Chain::Solana => derive_solana(seed, index),
    }
}

fn derive_ethereum(seed: &[u8], index: u32) -> Result<Account> {
    let keypair = Secp256k1Keypair::from_seed(seed, index)?;
    let private_key = Zeroizing::new(hex::encode(*keypair.private_key_bytes()));

    Ok(Account {
        address: keypair.eth_address(),
        public_key: hex::encode(keypair.public_key_uncompressed()),
        private_key: private_key.to_string(),
        derivation_path: dv_crypto_secp256k1::derivation_path(index),
        index,
    })
}

fn derive_solana(seed: &[u8], index: u32) -> Result<Account> {
    let keypair = Ed25519Keypair::from_seed(seed, index)?;
    let private_key = Zeroizing::new(hex::encode(*keypair.private_key_bytes()));

    Ok(Account {
        address: keypair.address(),
        public_key: hex::encode(keypair.public_key()),
        private_key: private_key.to_string(),
        derivation_path: dv_crypto_ed25519::derivation_path(index),
        index,
    })
}
