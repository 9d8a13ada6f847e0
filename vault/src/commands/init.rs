//! Vault creation: `init` generates a phrase, `import` recovers one

use anyhow::{anyhow, Result};
use rand::Rng;
use std::io::{self, Write};
use zeroize::Zeroizing;

use duovault::mnemonic::{is_valid_word, suggest_completions};
use duovault::{Chain, CreatedVault};

use super::{
    print_error, print_phrase, print_success, print_warning, prompt_confirm, prompt_new_password,
    Context,
};

/// Run the init (or, with `recover`, import) command
pub fn run(ctx: &Context, recover: bool) -> Result<()> {
    if ctx.store().exists() && ctx.load_vault_data()?.is_some() {
        print_error("A vault already exists at this location");
        println!("Path: {}", ctx.store_path.display());

        if !prompt_confirm("Overwrite existing vault?")? {
            println!("Aborted.");
            return Ok(());
        }

        print_warning("Existing vault will be overwritten!");
    }

    let mut vault = ctx.new_vault()?;
    let created = if recover {
        let phrase = prompt_mnemonic()?;
        println!();
        let password = prompt_new_password()?;
        vault.import(&password, &phrase)?
    } else {
        let password = prompt_new_password()?;
        let created = vault.create(&password, None)?;
        confirm_backup(&created)?;
        created
    };

    ctx.save_vault_data(&created.vault_data)?;

    println!();
    print_success("Vault created successfully!");
    println!();
    for chain in Chain::ALL {
        for account in vault.accounts(chain)? {
            println!("{:<9} {}", chain.as_str(), display_address(chain, &account.address));
        }
    }
    println!();
    println!("Vault saved to: {}", ctx.store_path.display());

    if !recover {
        println!();
        print_warning("IMPORTANT: Keep your recovery phrase safe and offline!");
        print_warning("Anyone with this phrase can access your funds on both chains.");
    }

    Ok(())
}

/// EIP-55 form for Ethereum, unchanged otherwise.
pub fn display_address(chain: Chain, address: &str) -> String {
    match chain {
        Chain::Ethereum => {
            let mut bytes = [0u8; 20];
            match hex::decode_to_slice(address.trim_start_matches("0x"), &mut bytes) {
                Ok(()) => dv_crypto_secp256k1::checksum_encode(&bytes),
                Err(_) => address.to_string(),
            }
        }
        Chain::Solana => address.to_string(),
    }
}

/// Show the new phrase and have the user prove they wrote it down
fn confirm_backup(created: &CreatedVault) -> Result<()> {
    let words: Vec<&str> = created.mnemonic.split(' ').collect();

    println!();
    println!("Your recovery phrase ({} words):", words.len());
    println!();
    print_phrase(&created.mnemonic);

    println!();
    if !prompt_confirm("Have you written down your recovery phrase?")? {
        return Err(anyhow!("Please write down your recovery phrase before continuing"));
    }

    let verify_index = rand::thread_rng().gen_range(0..words.len());
    println!();
    print!("Verify: Enter word #{}: ", verify_index + 1);
    io::stdout().flush()?;

    let mut input = Zeroizing::new(String::new());
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != words[verify_index] {
        return Err(anyhow!("Verification failed. Please try again."));
    }

    Ok(())
}

/// Prompt for a 12 or 24 word phrase, checking each word as it is entered
fn prompt_mnemonic() -> Result<Zeroizing<String>> {
    println!();
    println!("Enter your 12 or 24 word recovery phrase:");
    println!("(All words on one line, or one word per prompt; empty line to finish)");
    println!();

    let mut words: Vec<String> = Vec::new();

    print!("> ");
    io::stdout().flush()?;

    let mut input = Zeroizing::new(String::new());
    io::stdin().read_line(&mut input)?;
    words.extend(input.split_whitespace().map(str::to_lowercase));

    let complete_line = words.len() == 12 || words.len() == 24;
    while !complete_line && words.len() < 24 {
        print!("Enter word #{}: ", words.len() + 1);
        io::stdout().flush()?;

        input.clear();
        io::stdin().read_line(&mut input)?;

        let word = input.trim().to_lowercase();
        if word.is_empty() {
            break;
        }
        if !is_valid_word(&word) {
            let suggestions = suggest_completions(&word);
            if suggestions.is_empty() {
                print_error(&format!("'{}' is not in the word list", word));
            } else {
                let shown: Vec<&str> = suggestions.into_iter().take(6).collect();
                print_error(&format!("'{}' is not in the word list. Did you mean: {}?", word, shown.join(", ")));
            }
            continue;
        }
        words.push(word);
    }

    if let Some(bad) = words.iter().find(|w| !is_valid_word(w)) {
        return Err(anyhow!("'{}' is not in the word list", bad));
    }
    if words.len() != 12 && words.len() != 24 {
        return Err(anyhow!("Expected 12 or 24 words, got {}", words.len()));
    }

    let phrase = Zeroizing::new(words.join(" "));
    for word in words.iter_mut() {
        zeroize::Zeroize::zeroize(word);
    }
    Ok(phrase)
}
