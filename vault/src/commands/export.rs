//! Recovery phrase export command

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

use super::{print_phrase, print_success, print_warning, prompt_confirm, Context};

/// Run the export-mnemonic command
pub fn run(ctx: &Context, output: Option<&Path>) -> Result<()> {
    let (mut vault, _) = ctx.unlock()?;
    let ethereum = vault
        .accounts(duovault::Chain::Ethereum)?
        .first()
        .map(|a| a.address.clone())
        .unwrap_or_default();
    let phrase = vault.get_mnemonic()?;

    if let Some(output_path) = output {
        if output_path.exists() && !prompt_confirm("Output file exists. Overwrite?")? {
            println!("Aborted.");
            return Ok(());
        }

        let backup = zeroize::Zeroizing::new(format!(
            "# Duovault Recovery Phrase\n\
             # Ethereum account #0: {}\n\
             #\n\
             # KEEP THIS FILE SAFE AND SECRET!\n\
             # Anyone with this phrase controls your Ethereum and Solana accounts.\n\
             \n\
             {}\n",
            ethereum, phrase
        ));

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(output_path)
                .with_context(|| format!("Failed to open {}", output_path.display()))?;
            file.write_all(backup.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(output_path, backup.as_bytes())
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
        }

        println!();
        print_success(&format!("Recovery phrase saved to: {}", output_path.display()));
        print_warning("Keep this file safe and secret!");
        return Ok(());
    }

    println!();
    print_warning("IMPORTANT: Keep your recovery phrase secret!");
    print_warning("Anyone with these words controls your accounts on both chains.");
    println!();

    if !prompt_confirm("Show recovery phrase on screen?")? {
        println!("Aborted.");
        return Ok(());
    }

    println!();
    println!("Your recovery phrase ({} words):", phrase.split(' ').count());
    println!();
    print_phrase(phrase);

    Ok(())
}
