//! Password change command

use anyhow::{anyhow, Result};

use duovault::storage::load_vault_data;

use super::{print_error, print_success, prompt_new_password, prompt_password, Context};

/// Run the change-password command
pub fn run(ctx: &Context) -> Result<()> {
    let data = load_vault_data(&ctx.store())?
        .ok_or_else(|| anyhow!("No vault found. Run 'duovault init' first."))?;

    let current = prompt_password("Enter current vault password: ")?;
    let mut vault = ctx.new_vault()?;
    if let Err(e) = vault.unlock(&data, &current) {
        print_error(&e.to_string());
        return Err(e.into());
    }

    println!();
    let new_password = prompt_new_password()?;
    let vault_data = vault.change_password(&current, &new_password)?;
    ctx.save_vault_data(&vault_data)?;

    println!();
    print_success("Password changed.");
    if vault_data.version != data.version {
        println!(
            "Vault format upgraded from version {} to {}.",
            data.version, vault_data.version
        );
    }

    Ok(())
}
