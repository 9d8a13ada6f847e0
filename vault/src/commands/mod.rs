//! CLI Commands
//!
//! Each command loads the sealed vault from the store file, prompts for the
//! password, and works on an unlocked [`Vault`] that is dropped (and so
//! zeroized) when the command returns.

pub mod accounts;
pub mod config;
pub mod derive;
pub mod export;
pub mod init;
pub mod password;
pub mod sign;

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use duovault::storage::{load_vault_data, save_vault_data};
use duovault::{FileStore, Vault, VaultConfig, VaultData};

/// Resolved configuration and store for one CLI invocation.
pub struct Context {
    pub config: VaultConfig,
    pub store_path: PathBuf,
}

impl Context {
    pub fn load(config_path: &Path, store_override: Option<PathBuf>) -> Result<Self> {
        let config = VaultConfig::load(config_path)?;
        let store_path = match store_override {
            Some(path) => path,
            None => config.store_path()?,
        };
        Ok(Self { config, store_path })
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.store_path)
    }

    pub fn new_vault(&self) -> Result<Vault> {
        Vault::with_config(&self.config)
    }

    pub fn load_vault_data(&self) -> Result<Option<VaultData>> {
        load_vault_data(&self.store())
    }

    pub fn save_vault_data(&self, data: &VaultData) -> Result<()> {
        let mut store = self.store();
        save_vault_data(&mut store, data)
    }

    /// Load the sealed vault and unlock it with a prompted password.
    pub fn unlock(&self) -> Result<(Vault, VaultData)> {
        let data = self
            .load_vault_data()?
            .ok_or_else(|| anyhow!("No vault found. Run 'duovault init' first."))?;

        let password = prompt_password("Enter vault password: ")?;
        let mut vault = self.new_vault()?;
        if let Err(e) = vault.unlock(&data, &password) {
            print_error(&e.to_string());
            return Err(e.into());
        }
        Ok((vault, data))
    }
}

/// Prompt for password input (hidden)
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let password = rpassword::read_password()?;
    Ok(Zeroizing::new(password))
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    loop {
        let password = prompt_password("Enter new vault password: ")?;

        if password.len() < 8 {
            print_error("Password must be at least 8 characters");
            continue;
        }

        let confirm = prompt_password("Confirm password: ")?;

        if *password != *confirm {
            print_error("Passwords do not match");
            continue;
        }

        return Ok(password);
    }
}

/// Prompt for confirmation
pub fn prompt_confirm(message: &str) -> Result<bool> {
    print!("{} [y/N]: ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}

/// Print a phrase in four numbered columns
pub fn print_phrase(phrase: &str) {
    for (i, word) in phrase.split(' ').enumerate() {
        print!("{:>2}. {:<12}", i + 1, word);
        if (i + 1) % 4 == 0 {
            println!();
        }
    }
    println!();
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("\x1b[31mError:\x1b[0m {}", message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("\x1b[32m{}\x1b[0m", message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("\x1b[33mWarning:\x1b[0m {}", message);
}
