//! Decrypted vault content.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::account::{Account, Chain};
use crate::error::{Result, VaultError};

/// Accounts per chain. `ethereum[i].index == i`, likewise for solana.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Accounts {
    #[serde(default)]
    pub ethereum: Vec<Account>,
    #[serde(default)]
    pub solana: Vec<Account>,
}

impl Accounts {
    pub fn for_chain(&self, chain: Chain) -> &[Account] {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::Solana => &self.solana,
        }
    }

    pub(crate) fn for_chain_mut(&mut self, chain: Chain) -> &mut Vec<Account> {
        match chain {
            Chain::Ethereum => &mut self.ethereum,
            Chain::Solana => &mut self.solana,
        }
    }
}

/// The full secret bundle sealed inside `VaultData`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct VaultContent {
    pub mnemonic: String,
    pub accounts: Accounts,
}

impl std::fmt::Debug for VaultContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultContent")
            .field("mnemonic", &"<redacted>")
            .field("accounts", &self.accounts)
            .finish()
    }
}

impl VaultContent {
    pub(crate) fn new(mnemonic: String) -> Self {
        Self {
            mnemonic,
            accounts: Accounts::default(),
        }
    }

    /// Look up an account, failing with `AccountNotFound` when `index` was
    /// never derived.
    pub fn account(&self, chain: Chain, index: u32) -> Result<&Account> {
        self.accounts
            .for_chain(chain)
            .get(index as usize)
            .ok_or(VaultError::AccountNotFound { chain, index })
    }

    /// Next index that would keep the chain's list dense.
    pub fn next_index(&self, chain: Chain) -> u32 {
        self.accounts.for_chain(chain).len() as u32
    }

    /// Append an account; it must carry the next dense index.
    pub(crate) fn push_account(&mut self, chain: Chain, account: Account) -> Result<()> {
        let expected = self.next_index(chain);
        if account.index != expected {
            return Err(VaultError::Derivation(format!(
                "{chain} account index {} does not follow {}",
                account.index,
                expected.saturating_sub(1)
            )));
        }
        self.accounts.for_chain_mut(chain).push(account);
        Ok(())
    }

    /// Check that every chain's accounts are dense and zero-based.
    pub fn is_dense(&self) -> bool {
        Chain::ALL.iter().all(|&chain| {
            self.accounts
                .for_chain(chain)
                .iter()
                .enumerate()
                .all(|(i, account)| account.index as usize == i)
        })
    }

    /// JSON encoding sealed by the cipher.
    pub(crate) fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| VaultError::Serialization(e.to_string()))
    }

    /// Decode unsealed bytes. Anything undecodable or non-dense is reported
    /// as the generic decryption failure.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let content: Self =
            serde_json::from_slice(bytes).map_err(|_| VaultError::InvalidPassword)?;
        if !content.is_dense() {
            return Err(VaultError::InvalidPassword);
        }
        Ok(content)
    }
}
