//! Mnemonic and Seed Handling
//!
//! BIP-39 phrase generation, validation and seed derivation. Entropy comes
//! from the OS CSPRNG; phrases and seeds are returned in `Zeroizing` wrappers
//! so the plaintext is overwritten when the caller drops it.

use bip39::{Language, Mnemonic, Seed};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// Length of a BIP-39 seed in bytes.
pub const SEED_LEN: usize = 64;

/// Supported phrase sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MnemonicStrength {
    /// 128 bits of entropy, 12 words
    #[default]
    Words12,
    /// 256 bits of entropy, 24 words
    Words24,
}

impl MnemonicStrength {
    pub fn entropy_bits(self) -> usize {
        match self {
            Self::Words12 => 128,
            Self::Words24 => 256,
        }
    }

    pub fn word_count(self) -> usize {
        // one checksum bit per 32 bits of entropy, 11 bits per word
        let bits = self.entropy_bits();
        (bits + bits / 32) / 11
    }

    fn from_word_count(count: usize) -> Option<Self> {
        match count {
            12 => Some(Self::Words12),
            24 => Some(Self::Words24),
            _ => None,
        }
    }
}

/// Accepts either an entropy size (128/256) or a word count (12/24).
impl TryFrom<u32> for MnemonicStrength {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            12 | 128 => Ok(Self::Words12),
            24 | 256 => Ok(Self::Words24),
            other => Err(format!(
                "unsupported mnemonic size {other}; expected 12, 24, 128 or 256"
            )),
        }
    }
}

impl From<MnemonicStrength> for u32 {
    fn from(strength: MnemonicStrength) -> Self {
        match strength {
            MnemonicStrength::Words12 => 12,
            MnemonicStrength::Words24 => 24,
        }
    }
}

/// Generate a fresh phrase from OS randomness.
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<Zeroizing<String>> {
    let mut entropy = Zeroizing::new(vec![0u8; strength.entropy_bits() / 8]);
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy, Language::English)
        .map_err(|e| VaultError::Derivation(format!("mnemonic from entropy: {e}")))?;
    Ok(Zeroizing::new(mnemonic.phrase().to_string()))
}

/// Canonical form of a user-entered phrase: lower-case, single spaces.
pub fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    let words: Vec<String> = phrase
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect();
    Zeroizing::new(words.join(" "))
}

/// Returns true for a well-formed 12 or 24 word English phrase with a valid
/// checksum. Never errors.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// Parse a phrase into a checked [`Mnemonic`].
pub(crate) fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let normalized = normalize_phrase(phrase);
    let word_count = normalized.split(' ').filter(|w| !w.is_empty()).count();
    if MnemonicStrength::from_word_count(word_count).is_none() {
        return Err(VaultError::InvalidMnemonic);
    }

    Mnemonic::from_phrase(&normalized, Language::English).map_err(|_| VaultError::InvalidMnemonic)
}

/// BIP-39 seed: PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" + passphrase`.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; SEED_LEN]>> {
    let mnemonic = parse_mnemonic(phrase)?;
    let seed = Seed::new(&mnemonic, passphrase);

    let bytes = seed.as_bytes();
    if bytes.len() != SEED_LEN {
        return Err(VaultError::Derivation(format!(
            "seed has {} bytes",
            bytes.len()
        )));
    }
    let mut out = Zeroizing::new([0u8; SEED_LEN]);
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Check if a word is in the English BIP-39 word list.
pub fn is_valid_word(word: &str) -> bool {
    let word = word.trim().to_lowercase();
    Language::English.wordmap().get_bits(&word).is_ok()
}

/// Word list entries starting with `prefix`, in list order.
pub fn suggest_completions(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    Language::English
        .wordlist()
        .get_words_by_prefix(&prefix)
        .to_vec()
}
