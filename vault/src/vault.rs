//! Vault State Machine
//!
//! A [`Vault`] is `Uninitialized` until a phrase is created or imported, then
//! moves between `Unlocked` and `Locked`. The encryption key and decrypted
//! content live in a single boxed session that exists only while unlocked,
//! so every secret-returning operation goes through one gate.
//!
//! The vault never persists anything. Operations that change the sealed form
//! return a fresh [`VaultData`] for the caller to store.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::account::{AccountInfo, Chain};
use crate::cipher::{self, CipherSuite, EncryptionKey};
use crate::config::VaultConfig;
use crate::content::VaultContent;
use crate::derivation::derive_account;
use crate::error::{Result, VaultError};
use crate::mnemonic::{self, MnemonicStrength};
use crate::secmem::{self, LockedRegion};
use crate::signing::{self, SignableTransaction, TransactionSignature};
use crate::storage::VaultData;

/// Result of [`Vault::create`] and [`Vault::import`].
pub struct CreatedVault {
    /// Sealed form to hand to the store
    pub vault_data: VaultData,
    /// The phrase, for the one-time backup display
    pub mnemonic: Zeroizing<String>,
}

impl std::fmt::Debug for CreatedVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedVault")
            .field("vault_data", &self.vault_data)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Uninitialized,
    Locked,
    Unlocked,
}

/// Non-secret snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatus {
    pub state: VaultState,
    pub auto_lock_minutes: u32,
    /// Account counts, zero unless unlocked
    pub ethereum_accounts: usize,
    pub solana_accounts: usize,
}

struct Session {
    // Declared first so the pages are released before the buffers are freed.
    _regions: Vec<LockedRegion>,
    key: EncryptionKey,
    salt: Vec<u8>,
    content: VaultContent,
}

impl Session {
    fn new(key: EncryptionKey, salt: Vec<u8>, content: VaultContent) -> Self {
        // SAFETY: the key bytes are boxed and the mnemonic's heap buffer is
        // never mutated, so both stay put while the session owns them.
        let regions = unsafe {
            vec![
                secmem::lock_bytes(&key.as_bytes()[..]),
                secmem::lock_string(&content.mnemonic),
            ]
        };
        Self {
            _regions: regions,
            key,
            salt,
            content,
        }
    }

    fn seal(&self, content: &VaultContent) -> Result<VaultData> {
        seal_content(&self.key, &self.salt, content)
    }
}

enum State {
    Uninitialized,
    Locked,
    Unlocked(Box<Session>),
}

/// Multi-chain key vault.
pub struct Vault {
    state: State,
    auto_lock_minutes: u32,
    strength: MnemonicStrength,
    suite: CipherSuite,
    last_activity: Option<Instant>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("state", &self.state())
            .field("auto_lock_minutes", &self.auto_lock_minutes)
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Vault with default settings: 12-word phrases, format version 1,
    /// 15-minute auto-lock hint.
    pub fn new() -> Self {
        let defaults = VaultConfig::default();
        Self {
            state: State::Uninitialized,
            auto_lock_minutes: defaults.auto_lock_minutes,
            strength: MnemonicStrength::default(),
            suite: CipherSuite::Pbkdf2AesGcm,
            last_activity: None,
        }
    }

    pub fn with_config(config: &VaultConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            state: State::Uninitialized,
            auto_lock_minutes: config.auto_lock_minutes,
            strength: config.mnemonic_strength()?,
            suite: config.cipher_suite()?,
            last_activity: None,
        })
    }

    /// Create a vault from `mnemonic`, or from a freshly generated phrase.
    ///
    /// Derives index 0 on both chains and leaves the vault unlocked. On
    /// failure the previous state is untouched.
    pub fn create(&mut self, password: &str, mnemonic: Option<&str>) -> Result<CreatedVault> {
        if password.is_empty() {
            return Err(VaultError::EmptyPassword);
        }

        let phrase = match mnemonic {
            Some(phrase) => {
                let phrase = mnemonic::normalize_phrase(phrase);
                if !mnemonic::validate_mnemonic(&phrase) {
                    return Err(VaultError::InvalidMnemonic);
                }
                phrase
            }
            None => mnemonic::generate_mnemonic(self.strength)?,
        };

        let seed = mnemonic::mnemonic_to_seed(&phrase, "")?;
        let mut content = VaultContent::new(phrase.to_string());
        for chain in Chain::ALL {
            content.push_account(chain, derive_account(&seed[..], chain, 0)?)?;
        }

        let salt = cipher::generate_salt().to_vec();
        let key = cipher::derive_encryption_key(password, &salt, self.suite)?;
        let vault_data = seal_content(&key, &salt, &content)?;

        // release the old pages before locking the new ones
        self.drop_session();
        self.state = State::Unlocked(Box::new(Session::new(key, salt, content)));
        self.last_activity = Some(Instant::now());
        info!(
            "Vault created (format version {}, {} words)",
            vault_data.version,
            phrase.split(' ').count()
        );

        Ok(CreatedVault {
            vault_data,
            mnemonic: phrase,
        })
    }

    /// [`Self::create`] with a mandatory phrase.
    pub fn import(&mut self, password: &str, mnemonic: &str) -> Result<CreatedVault> {
        if mnemonic.trim().is_empty() {
            return Err(VaultError::InvalidMnemonic);
        }
        self.create(password, Some(mnemonic))
    }

    /// Decrypt `data` and enter the unlocked state.
    ///
    /// Any existing session is dropped first. Every failure leaves the vault
    /// locked with no key retained.
    pub fn unlock(&mut self, data: &VaultData, password: &str) -> Result<&VaultContent> {
        self.drop_session();
        self.state = State::Locked;

        let suite = CipherSuite::from_version(data.version)?;
        let key = cipher::derive_encryption_key(password, &data.salt, suite)?;
        let plaintext = cipher::unseal(&key, &data.encrypted_content).map_err(|e| {
            warn!("Unlock failed: {}", e);
            e
        })?;

        let content = VaultContent::from_bytes(&plaintext)?;
        if !mnemonic::validate_mnemonic(&content.mnemonic) {
            warn!("Unlock failed: decrypted content holds an invalid phrase");
            return Err(VaultError::InvalidPassword);
        }

        self.state = State::Unlocked(Box::new(Session::new(key, data.salt.clone(), content)));
        self.last_activity = Some(Instant::now());
        debug!("Vault unlocked");

        Ok(&self.session()?.content)
    }

    /// Zeroize the session. No-op unless unlocked.
    pub fn lock(&mut self) {
        if self.drop_session() {
            self.state = State::Locked;
            debug!("Vault locked");
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, State::Unlocked(_))
    }

    pub fn state(&self) -> VaultState {
        match self.state {
            State::Uninitialized => VaultState::Uninitialized,
            State::Locked => VaultState::Locked,
            State::Unlocked(_) => VaultState::Unlocked,
        }
    }

    pub fn status(&self) -> VaultStatus {
        let (ethereum_accounts, solana_accounts) = match &self.state {
            State::Unlocked(session) => (
                session.content.accounts.ethereum.len(),
                session.content.accounts.solana.len(),
            ),
            _ => (0, 0),
        };
        VaultStatus {
            state: self.state(),
            auto_lock_minutes: self.auto_lock_minutes,
            ethereum_accounts,
            solana_accounts,
        }
    }

    pub fn get_mnemonic(&mut self) -> Result<&str> {
        self.touch()?;
        Ok(&self.session()?.content.mnemonic)
    }

    /// Hex private key of an account.
    pub fn get_private_key(&mut self, chain: Chain, index: u32) -> Result<&str> {
        self.touch()?;
        let account = self.session()?.content.account(chain, index)?;
        Ok(&account.private_key)
    }

    /// Sign a message with the account at `index`.
    ///
    /// Ethereum signatures are EIP-191 personal-sign, `0x`-prefixed
    /// `r || s || v`; Solana signatures are the hex of the raw ed25519
    /// signature.
    pub fn sign_message(&mut self, message: &[u8], chain: Chain, index: u32) -> Result<String> {
        self.touch()?;
        let account = self.session()?.content.account(chain, index)?;
        signing::sign_message(chain, account, message)
    }

    /// Sign the caller-serialized payload of `tx` and attach the signature.
    pub fn sign_transaction<T: SignableTransaction>(
        &mut self,
        mut tx: T,
        chain: Chain,
        index: u32,
    ) -> Result<T> {
        self.touch()?;
        let account = self.session()?.content.account(chain, index)?;
        let signature = signing::sign_payload(chain, account, &tx.signing_payload())?;

        tx.attach_signature(TransactionSignature {
            chain,
            signer: account.address.clone(),
            signature,
        });
        Ok(tx)
    }

    /// Hint for the caller's idle timer; 0 disables auto-lock.
    pub fn set_auto_lock_minutes(&mut self, minutes: u32) {
        self.auto_lock_minutes = minutes;
        debug!("Auto-lock set to {} minutes", minutes);
    }

    pub fn auto_lock_minutes(&self) -> u32 {
        self.auto_lock_minutes
    }

    /// Lock if the vault has been idle for the auto-lock period as of `now`.
    /// Returns whether it locked.
    pub fn lock_if_idle(&mut self, now: Instant) -> bool {
        if self.auto_lock_minutes == 0 || !self.is_unlocked() {
            return false;
        }
        let Some(last) = self.last_activity else {
            return false;
        };

        let timeout = Duration::from_secs(u64::from(self.auto_lock_minutes) * 60);
        if now.saturating_duration_since(last) >= timeout {
            info!("Auto-locking after {} idle minutes", self.auto_lock_minutes);
            self.lock();
            true
        } else {
            false
        }
    }

    /// Public view of every derived account on `chain`.
    pub fn accounts(&self, chain: Chain) -> Result<Vec<AccountInfo>> {
        Ok(self
            .session()?
            .content
            .accounts
            .for_chain(chain)
            .iter()
            .map(|account| account.info(chain))
            .collect())
    }

    /// Derive the next index on `chain` and return the re-sealed vault.
    pub fn derive_next_account(&mut self, chain: Chain) -> Result<(AccountInfo, VaultData)> {
        self.touch()?;
        let session = self.session_mut()?;

        let index = session.content.next_index(chain);
        let seed = mnemonic::mnemonic_to_seed(&session.content.mnemonic, "")?;
        let account = derive_account(&seed[..], chain, index)?;
        let info = account.info(chain);

        let mut updated = session.content.clone();
        updated.push_account(chain, account)?;
        let vault_data = session.seal(&updated)?;
        session.content.accounts = updated.accounts.clone();

        info!("Derived {} account {}", chain, index);
        Ok((info, vault_data))
    }

    /// Re-seal under `new_password` with a fresh salt, after checking
    /// `current_password` against the session key.
    ///
    /// New keys use the newer of the vault's own format version and the
    /// configured one, so this migrates older vaults and never downgrades.
    pub fn change_password(
        &mut self,
        current_password: &str,
        new_password: &str,
    ) -> Result<VaultData> {
        if new_password.is_empty() {
            return Err(VaultError::EmptyPassword);
        }
        self.touch()?;
        let configured = self.suite;
        let session = self.session()?;

        let current = session.key.suite();
        let candidate = cipher::derive_encryption_key(current_password, &session.salt, current)?;
        if !candidate.matches(&session.key) {
            warn!("Password change rejected: current password does not match");
            return Err(VaultError::InvalidPassword);
        }

        let suite = if current.version() > configured.version() {
            current
        } else {
            configured
        };
        let salt = cipher::generate_salt().to_vec();
        let key = cipher::derive_encryption_key(new_password, &salt, suite)?;
        let vault_data = seal_content(&key, &salt, &session.content)?;
        let content = session.content.clone();

        // release the old pages before locking the new ones
        self.drop_session();
        self.state = State::Unlocked(Box::new(Session::new(key, salt, content)));
        self.last_activity = Some(Instant::now());

        info!("Vault password changed (format version {})", vault_data.version);
        Ok(vault_data)
    }

    /// Re-seal the current content under the session key with a fresh nonce.
    pub fn export_vault_data(&mut self) -> Result<VaultData> {
        self.touch()?;
        let session = self.session()?;
        session.seal(&session.content)
    }

    fn session(&self) -> Result<&Session> {
        match &self.state {
            State::Unlocked(session) => Ok(session),
            _ => Err(VaultError::Locked),
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        match &mut self.state {
            State::Unlocked(session) => Ok(session),
            _ => Err(VaultError::Locked),
        }
    }

    fn touch(&mut self) -> Result<()> {
        if !self.is_unlocked() {
            return Err(VaultError::Locked);
        }
        self.last_activity = Some(Instant::now());
        Ok(())
    }

    /// Drop the session if there is one. Returns whether one existed.
    fn drop_session(&mut self) -> bool {
        if let State::Unlocked(_) = self.state {
            // dropping the box unlocks the pages and zeroizes key and content
            self.state = State::Locked;
            self.last_activity = None;
            true
        } else {
            false
        }
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        self.lock();
    }
}

fn seal_content(key: &EncryptionKey, salt: &[u8], content: &VaultContent) -> Result<VaultData> {
    let plaintext = content.to_bytes()?;
    Ok(VaultData {
        version: key.suite().version(),
        salt: salt.to_vec(),
        encrypted_content: cipher::seal(key, &plaintext)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::RawTransaction;
    use assert_matches::assert_matches;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const TEST_PASSWORD: &str = "test-password-123";

    fn imported() -> (Vault, VaultData) {
        let mut vault = Vault::new();
        let created = vault.import(TEST_PASSWORD, TEST_MNEMONIC).unwrap();
        (vault, created.vault_data)
    }

    #[test]
    fn test_create_generates_phrase() {
        let mut vault = Vault::new();
        assert_eq!(vault.state(), VaultState::Uninitialized);

        let created = vault.create(TEST_PASSWORD, None).unwrap();
        assert_eq!(created.mnemonic.split(' ').count(), 12);
        assert!(mnemonic::validate_mnemonic(&created.mnemonic));
        assert_eq!(created.vault_data.version, 1);
        assert_eq!(created.vault_data.salt.len(), cipher::SALT_LEN);

        assert!(vault.is_unlocked());
        assert_eq!(vault.get_mnemonic().unwrap(), created.mnemonic.as_str());
    }

    #[test]
    fn test_known_paths_and_addresses() {
        let (mut vault, _) = imported();

        let eth = vault.accounts(Chain::Ethereum).unwrap();
        assert_eq!(eth.len(), 1);
        assert_eq!(eth[0].derivation_path, "m/44'/60'/0'/0/0");
        assert_eq!(eth[0].address, "0x9858effd232b4033e47d90003d41ec34ecaeda94");

        let sol = vault.accounts(Chain::Solana).unwrap();
        assert_eq!(sol[0].derivation_path, "m/44'/501'/0'/0'");
        assert_eq!(sol[0].address, "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");

        assert_eq!(vault.get_private_key(Chain::Ethereum, 0).unwrap().len(), 64);
    }

    #[test]
    fn test_create_lock_unlock() {
        let mut vault = Vault::new();
        let created = vault.create(TEST_PASSWORD, None).unwrap();
        vault.lock();
        assert_eq!(vault.state(), VaultState::Locked);

        let content = vault.unlock(&created.vault_data, TEST_PASSWORD).unwrap();
        assert_eq!(content.accounts.ethereum.len(), 1);
        assert_eq!(content.accounts.solana.len(), 1);
        assert_eq!(content.accounts.ethereum[0].index, 0);
        assert_eq!(content.accounts.solana[0].index, 0);
    }

    #[test]
    fn test_invalid_mnemonic_produces_nothing() {
        let mut vault = Vault::new();
        assert_matches!(
            vault.create(TEST_PASSWORD, Some("invalid mnemonic")),
            Err(VaultError::InvalidMnemonic)
        );
        assert_eq!(vault.state(), VaultState::Uninitialized);

        assert_matches!(vault.import(TEST_PASSWORD, "   "), Err(VaultError::InvalidMnemonic));
        assert_eq!(vault.state(), VaultState::Uninitialized);
    }

    #[test]
    fn test_failed_create_keeps_existing_session() {
        let (mut vault, _) = imported();
        assert!(vault.create(TEST_PASSWORD, Some("invalid mnemonic")).is_err());
        assert!(vault.is_unlocked());
        assert_eq!(vault.get_mnemonic().unwrap(), TEST_MNEMONIC);
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let mut a = Vault::new();
        let mut b = Vault::new();
        let first = a.import(TEST_PASSWORD, TEST_MNEMONIC).unwrap().vault_data;
        let second = b.import(TEST_PASSWORD, TEST_MNEMONIC).unwrap().vault_data;

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.encrypted_content, second.encrypted_content);
    }

    #[test]
    fn test_import_normalizes_phrase() {
        let mut vault = Vault::new();
        let messy = format!("  {}  ", TEST_MNEMONIC.to_uppercase().replace(' ', "   "));
        let created = vault.import(TEST_PASSWORD, &messy).unwrap();
        assert_eq!(created.mnemonic.as_str(), TEST_MNEMONIC);
    }

    #[test]
    fn test_empty_password_rejected() {
        let mut vault = Vault::new();
        assert_matches!(vault.create("", None), Err(VaultError::EmptyPassword));
        assert_matches!(vault.import("", TEST_MNEMONIC), Err(VaultError::EmptyPassword));
    }

    #[test]
    fn test_wrong_password_leaves_locked() {
        let (mut vault, data) = imported();

        assert_matches!(vault.unlock(&data, "wrong"), Err(VaultError::InvalidPassword));
        assert_eq!(vault.state(), VaultState::Locked);
        assert_matches!(vault.get_mnemonic(), Err(VaultError::Locked));
    }

    #[test]
    fn test_corrupted_data_rejected() {
        let (mut vault, mut data) = imported();
        let last = data.encrypted_content.len() - 1;
        data.encrypted_content[last] ^= 0xff;

        assert_matches!(vault.unlock(&data, TEST_PASSWORD), Err(VaultError::InvalidPassword));
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_unknown_version_fails_closed() {
        let (mut vault, mut data) = imported();
        data.version = 3;

        assert_matches!(
            vault.unlock(&data, TEST_PASSWORD),
            Err(VaultError::UnsupportedVersion(3))
        );
        assert_eq!(vault.state(), VaultState::Locked);
    }

    #[test]
    fn test_lock_gating_and_identical_outputs() {
        let (mut vault, data) = imported();
        let tx = RawTransaction::new(b"payload".to_vec());

        let mnemonic = vault.get_mnemonic().unwrap().to_string();
        let key = vault.get_private_key(Chain::Solana, 0).unwrap().to_string();
        let eth_sig = vault.sign_message(b"hello", Chain::Ethereum, 0).unwrap();
        let sol_sig = vault.sign_message(b"hello", Chain::Solana, 0).unwrap();
        let signed = vault.sign_transaction(tx.clone(), Chain::Ethereum, 0).unwrap();

        vault.lock();
        assert_matches!(vault.get_mnemonic(), Err(VaultError::Locked));
        assert_matches!(vault.get_private_key(Chain::Solana, 0), Err(VaultError::Locked));
        assert_matches!(
            vault.sign_message(b"hello", Chain::Ethereum, 0),
            Err(VaultError::Locked)
        );
        assert_matches!(
            vault.sign_transaction(tx.clone(), Chain::Ethereum, 0),
            Err(VaultError::Locked)
        );
        assert_matches!(vault.accounts(Chain::Ethereum), Err(VaultError::Locked));
        assert_matches!(vault.export_vault_data(), Err(VaultError::Locked));

        vault.unlock(&data, TEST_PASSWORD).unwrap();
        assert_eq!(vault.get_mnemonic().unwrap(), mnemonic);
        assert_eq!(vault.get_private_key(Chain::Solana, 0).unwrap(), key);
        assert_eq!(vault.sign_message(b"hello", Chain::Ethereum, 0).unwrap(), eth_sig);
        assert_eq!(vault.sign_message(b"hello", Chain::Solana, 0).unwrap(), sol_sig);
        assert_eq!(vault.sign_transaction(tx, Chain::Ethereum, 0).unwrap(), signed);
    }

    #[test]
    fn test_lock_is_idempotent() {
        let mut vault = Vault::new();
        vault.lock();
        assert_eq!(vault.state(), VaultState::Uninitialized);

        vault.import(TEST_PASSWORD, TEST_MNEMONIC).unwrap();
        vault.lock();
        vault.lock();
        assert_eq!(vault.state(), VaultState::Locked);
    }

    #[test]
    fn test_account_not_found() {
        let (mut vault, _) = imported();
        assert_matches!(
            vault.get_private_key(Chain::Ethereum, 1),
            Err(VaultError::AccountNotFound { chain: Chain::Ethereum, index: 1 })
        );
        assert_matches!(
            vault.sign_message(b"m", Chain::Solana, 5),
            Err(VaultError::AccountNotFound { .. })
        );
    }

    #[test]
    fn test_signatures_verify() {
        let (mut vault, _) = imported();
        for chain in Chain::ALL {
            let address = vault.accounts(chain).unwrap()[0].address.clone();
            let signature = vault.sign_message(b"hello", chain, 0).unwrap();
            assert!(signing::verify_message(chain, &address, b"hello", &signature));
        }
    }

    #[test]
    fn test_sign_transaction_attaches_signer() {
        let (mut vault, _) = imported();
        let tx = vault
            .sign_transaction(RawTransaction::new(b"tx-bytes".to_vec()), Chain::Solana, 0)
            .unwrap();

        assert_eq!(tx.signatures.len(), 1);
        assert_eq!(tx.signatures[0].chain, Chain::Solana);
        assert_eq!(tx.signatures[0].signer, "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");
        assert_eq!(tx.signatures[0].signature.len(), 64);
        assert_eq!(tx.payload, b"tx-bytes");
    }

    #[test]
    fn test_derive_next_account() {
        let (mut vault, _) = imported();

        let (info, data) = vault.derive_next_account(Chain::Ethereum).unwrap();
        assert_eq!(info.index, 1);
        assert_eq!(info.derivation_path, "m/44'/60'/0'/0/1");
        assert_eq!(vault.accounts(Chain::Ethereum).unwrap().len(), 2);
        assert_eq!(vault.accounts(Chain::Solana).unwrap().len(), 1);

        vault.lock();
        let content = vault.unlock(&data, TEST_PASSWORD).unwrap();
        assert_eq!(content.accounts.ethereum.len(), 2);
        assert_eq!(content.accounts.ethereum[1].address, info.address);
        assert!(content.is_dense());
    }

    #[test]
    fn test_change_password() {
        let (mut vault, old_data) = imported();

        assert_matches!(
            vault.change_password("wrong", "new-password"),
            Err(VaultError::InvalidPassword)
        );
        assert_matches!(
            vault.change_password(TEST_PASSWORD, ""),
            Err(VaultError::EmptyPassword)
        );

        let new_data = vault.change_password(TEST_PASSWORD, "new-password").unwrap();
        assert_ne!(new_data.salt, old_data.salt);
        assert!(vault.is_unlocked());

        vault.lock();
        assert_matches!(
            vault.unlock(&new_data, TEST_PASSWORD),
            Err(VaultError::InvalidPassword)
        );
        vault.unlock(&new_data, "new-password").unwrap();
        assert_eq!(vault.get_mnemonic().unwrap(), TEST_MNEMONIC);
    }

    #[test]
    fn test_export_reseals_with_fresh_nonce() {
        let (mut vault, data) = imported();
        let exported = vault.export_vault_data().unwrap();

        assert_eq!(exported.salt, data.salt);
        assert_ne!(exported.encrypted_content, data.encrypted_content);

        vault.lock();
        vault.unlock(&exported, TEST_PASSWORD).unwrap();
    }

    #[test]
    fn test_auto_lock_if_idle() {
        let (mut vault, _) = imported();
        vault.set_auto_lock_minutes(5);
        assert_eq!(vault.auto_lock_minutes(), 5);

        let now = Instant::now();
        assert!(!vault.lock_if_idle(now));
        assert!(vault.lock_if_idle(now + Duration::from_secs(5 * 60 + 1)));
        assert_eq!(vault.state(), VaultState::Locked);

        assert!(!vault.lock_if_idle(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_auto_lock_disabled() {
        let (mut vault, _) = imported();
        vault.set_auto_lock_minutes(0);
        assert!(!vault.lock_if_idle(Instant::now() + Duration::from_secs(86_400)));
        assert!(vault.is_unlocked());
    }

    #[test]
    fn test_status() {
        let (mut vault, _) = imported();
        vault.derive_next_account(Chain::Solana).unwrap();

        let status = vault.status();
        assert_eq!(status.state, VaultState::Unlocked);
        assert_eq!(status.ethereum_accounts, 1);
        assert_eq!(status.solana_accounts, 2);

        vault.lock();
        assert_eq!(vault.status().solana_accounts, 0);
    }

    #[test]
    fn test_version_two_vault() {
        let config = VaultConfig {
            vault_version: 2,
            mnemonic_words: 24,
            ..VaultConfig::default()
        };
        let mut vault = Vault::with_config(&config).unwrap();
        let created = vault.create(TEST_PASSWORD, None).unwrap();
        assert_eq!(created.vault_data.version, 2);
        assert_eq!(created.mnemonic.split(' ').count(), 24);

        vault.lock();
        vault.unlock(&created.vault_data, TEST_PASSWORD).unwrap();
    }

    #[test]
    fn test_change_password_migrates_version() {
        let (mut v1, data) = imported();
        assert_eq!(data.version, 1);
        let phrase = v1.get_mnemonic().unwrap().to_string();
        drop(v1);

        let config = VaultConfig {
            vault_version: 2,
            ..VaultConfig::default()
        };
        let mut vault = Vault::with_config(&config).unwrap();
        vault.unlock(&data, TEST_PASSWORD).unwrap();
        let migrated = vault.change_password(TEST_PASSWORD, TEST_PASSWORD).unwrap();
        assert_eq!(migrated.version, 2);

        vault.lock();
        vault.unlock(&migrated, TEST_PASSWORD).unwrap();
        assert_eq!(vault.get_mnemonic().unwrap(), phrase);
    }

    #[test]
    fn test_change_password_never_downgrades() {
        let config = VaultConfig {
            vault_version: 2,
            ..VaultConfig::default()
        };
        let mut v2 = Vault::with_config(&config).unwrap();
        let created = v2.import(TEST_PASSWORD, TEST_MNEMONIC).unwrap();
        assert_eq!(created.vault_data.version, 2);
        drop(v2);

        let mut vault = Vault::new();
        vault.unlock(&created.vault_data, TEST_PASSWORD).unwrap();
        let changed = vault.change_password(TEST_PASSWORD, "new-password").unwrap();
        assert_eq!(changed.version, 2);

        vault.lock();
        vault.unlock(&changed, "new-password").unwrap();
        assert_eq!(vault.get_mnemonic().unwrap(), TEST_MNEMONIC);
    }

    #[test]
    fn test_create_replaces_unlocked_session() {
        let (mut vault, _) = imported();
        let created = vault.create(TEST_PASSWORD, None).unwrap();

        assert!(vault.is_unlocked());
        assert_eq!(vault.get_mnemonic().unwrap(), created.mnemonic.as_str());
        assert_eq!(vault.status().ethereum_accounts, 1);

        let changed = vault.change_password(TEST_PASSWORD, "new-password").unwrap();
        assert!(vault.is_unlocked());
        assert_eq!(vault.get_mnemonic().unwrap(), created.mnemonic.as_str());
        vault.lock();
        vault.unlock(&changed, "new-password").unwrap();
        assert_eq!(vault.get_mnemonic().unwrap(), created.mnemonic.as_str());
    }

    #[test]
    fn test_debug_has_no_secrets() {
        let (vault, _) = imported();
        let rendered = format!("{vault:?}");
        assert!(!rendered.contains("abandon"));
    }
}
