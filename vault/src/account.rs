//! Accounts held inside the vault content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Chains the vault derives keys for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::Solana];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Solana => "solana",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "solana" | "sol" => Ok(Self::Solana),
            other => Err(format!("unknown chain '{other}'")),
        }
    }
}

/// One derived keypair.
///
/// `private_key` is wiped when the account is dropped; the whole struct is
/// wiped field by field so no copy of the hex string outlives it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Chain-native display address
    pub address: String,
    /// Hex-encoded raw public key
    pub public_key: String,
    /// Hex-encoded raw private key (secp256k1 scalar or ed25519 seed)
    pub private_key: String,
    pub derivation_path: String,
    pub index: u32,
}

impl Account {
    /// Public view of this account.
    pub fn info(&self, chain: Chain) -> AccountInfo {
        AccountInfo {
            chain,
            address: self.address.clone(),
            public_key: self.public_key.clone(),
            derivation_path: self.derivation_path.clone(),
            index: self.index,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("derivation_path", &self.derivation_path)
            .field("index", &self.index)
            .finish()
    }
}

/// The non-secret part of an [`Account`], safe to hand to UI code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub chain: Chain,
    pub address: String,
    pub public_key: String,
    pub derivation_path: String,
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account {
            address: "0xabc".to_string(),
            public_key: "04ff".to_string(),
            private_key: "deadbeef".to_string(),
            derivation_path: "m/44'/60'/0'/0/0".to_string(),
            index: 0,
        }
    }

    #[test]
    fn test_chain_parsing() {
        assert_eq!("ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("SOL".parse::<Chain>().unwrap(), Chain::Solana);
        assert!("bitcoin".parse::<Chain>().is_err());
        assert_eq!(Chain::Solana.to_string(), "solana");
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_camel_case_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["publicKey"], "04ff");
        assert_eq!(json["privateKey"], "deadbeef");
        assert_eq!(json["derivationPath"], "m/44'/60'/0'/0/0");
        assert_eq!(serde_json::to_value(Chain::Ethereum).unwrap(), "ethereum");
    }

    #[test]
    fn test_info_omits_secret() {
        let info = sample().info(Chain::Ethereum);
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("deadbeef"));
        assert_eq!(info.index, 0);
    }
}
