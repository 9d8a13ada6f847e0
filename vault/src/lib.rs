//! Duovault
//!
//! A key vault for Ethereum and Solana wallets. One BIP-39 phrase yields
//! deterministic accounts on both chains; the phrase and derived keys are
//! sealed at rest under a password and only reachable while the vault is
//! unlocked.
//!
//! ## Security Model
//!
//! - The password is never stored; it only ever exists as a derived key
//! - Sealed vault data is authenticated; a wrong password and a tampered file
//!   look the same
//! - Secrets are zeroized on lock and drop, and page-locked while unlocked
//! - The vault is an owned value, not a process global

pub mod account;
pub mod cipher;
pub mod config;
pub mod content;
pub mod derivation;
pub mod error;
pub mod mnemonic;
pub mod secmem;
pub mod signing;
pub mod storage;
pub mod vault;

pub use account::{Account, AccountInfo, Chain};
pub use config::VaultConfig;
pub use content::{Accounts, VaultContent};
pub use error::{Result, VaultError};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, validate_mnemonic, MnemonicStrength};
pub use signing::{RawTransaction, SignableTransaction, TransactionSignature};
pub use storage::{FileStore, KeyValueStore, MemoryStore, VaultData};
pub use vault::{CreatedVault, Vault, VaultState, VaultStatus};
