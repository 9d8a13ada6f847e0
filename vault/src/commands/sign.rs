//! Message signing command

use anyhow::Result;

use duovault::Chain;

use super::Context;

/// Run the sign command
pub fn run(ctx: &Context, chain: Chain, index: u32, message: &str) -> Result<()> {
    let (mut vault, _) = ctx.unlock()?;

    let signature = vault.sign_message(message.as_bytes(), chain, index)?;
    let signer = vault
        .accounts(chain)?
        .into_iter()
        .find(|account| account.index == index)
        .map(|account| account.address)
        .unwrap_or_default();

    println!();
    println!("Signer:    {}", signer);
    println!("Signature: {}", signature);
    if chain == Chain::Ethereum {
        println!("Scheme:    EIP-191 personal_sign");
    }

    Ok(())
}
