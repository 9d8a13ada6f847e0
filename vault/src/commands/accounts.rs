//! Account listing command

use anyhow::Result;

use duovault::Chain;

use super::init::display_address;
use super::Context;

/// Run the accounts command
pub fn run(ctx: &Context, only: Option<Chain>) -> Result<()> {
    let (vault, _) = ctx.unlock()?;

    let chains: Vec<Chain> = match only {
        Some(chain) => vec![chain],
        None => Chain::ALL.to_vec(),
    };

    for chain in chains {
        println!();
        println!("{}:", chain);
        for account in vault.accounts(chain)? {
            println!(
                "  #{:<3} {}  ({})",
                account.index,
                display_address(chain, &account.address),
                account.derivation_path
            );
        }
    }

    Ok(())
}
