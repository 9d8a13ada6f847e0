//! Derive the next account on a chain

use anyhow::Result;

use duovault::Chain;

use super::init::display_address;
use super::{print_success, Context};

/// Run the derive command
pub fn run(ctx: &Context, chain: Chain) -> Result<()> {
    let (mut vault, _) = ctx.unlock()?;

    let (account, vault_data) = vault.derive_next_account(chain)?;
    ctx.save_vault_data(&vault_data)?;

    println!();
    print_success(&format!("Derived {} account #{}", chain, account.index));
    println!("  Address: {}", display_address(chain, &account.address));
    println!("  Path:    {}", account.derivation_path);

    Ok(())
}
