//! Configuration display and update command

use anyhow::Result;
use std::path::Path;

use duovault::VaultConfig;

use super::print_success;

/// Run the config command. Without flags it only prints the current values.
pub fn run(
    config_path: &Path,
    auto_lock: Option<u32>,
    words: Option<u32>,
    vault_version: Option<u32>,
) -> Result<()> {
    let mut config = VaultConfig::load(config_path)?;

    let changed = auto_lock.is_some() || words.is_some() || vault_version.is_some();
    if let Some(minutes) = auto_lock {
        config.auto_lock_minutes = minutes;
    }
    if let Some(words) = words {
        config.mnemonic_words = words;
    }
    if let Some(version) = vault_version {
        config.vault_version = version;
    }

    if changed {
        config.save(config_path)?;
        print_success(&format!("Configuration saved to {}", config_path.display()));
    }

    println!();
    println!("Config file:       {}", config_path.display());
    println!("Store file:        {}", config.store_path()?.display());
    if config.auto_lock_minutes == 0 {
        println!("Auto-lock:         disabled");
    } else {
        println!("Auto-lock:         {} minutes", config.auto_lock_minutes);
    }
    println!("Phrase length:     {} words", config.mnemonic_words);
    println!("Vault version:     {}", config.vault_version);

    Ok(())
}
