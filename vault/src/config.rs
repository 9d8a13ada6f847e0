use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cipher::{CipherSuite, DEFAULT_VERSION};
use crate::mnemonic::MnemonicStrength;

/// Vault configuration, stored as TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Idle minutes before the wallet engine should lock; 0 disables
    #[serde(default = "default_auto_lock_minutes")]
    pub auto_lock_minutes: u32,

    /// Words in newly generated phrases (12 or 24)
    #[serde(default = "default_mnemonic_words")]
    pub mnemonic_words: u32,

    /// Format version used when sealing a vault
    #[serde(default = "default_vault_version")]
    pub vault_version: u32,

    /// Override for the data directory (defaults to ~/.duovault)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_auto_lock_minutes() -> u32 {
    15
}

fn default_mnemonic_words() -> u32 {
    12
}

fn default_vault_version() -> u32 {
    DEFAULT_VERSION
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            auto_lock_minutes: default_auto_lock_minutes(),
            mnemonic_words: default_mnemonic_words(),
            vault_version: default_vault_version(),
            data_dir: None,
        }
    }
}

impl VaultConfig {
    /// Reject values the vault cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.mnemonic_words, 12 | 24) {
            return Err(anyhow!(
                "mnemonic_words must be 12 or 24, got {}",
                self.mnemonic_words
            ));
        }
        CipherSuite::from_version(self.vault_version)
            .map_err(|e| anyhow!("vault_version: {}", e))?;
        Ok(())
    }

    pub fn mnemonic_strength(&self) -> Result<MnemonicStrength> {
        MnemonicStrength::try_from(self.mnemonic_words).map_err(|e| anyhow!(e))
    }

    pub fn cipher_suite(&self) -> Result<CipherSuite> {
        CipherSuite::from_version(self.vault_version).map_err(|e| anyhow!("vault_version: {}", e))
    }

    /// Directory holding the store file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("store.json"))
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// `~/.duovault`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".duovault"))
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// `~/.duovault/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("config.toml"))
}
