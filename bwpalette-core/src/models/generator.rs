//! Options for `bw generate`

use serde::{Deserialize, Serialize};

/// Shortest password the CLI accepts
pub const MIN_PASSWORD_LENGTH: u32 = 5;
/// Longest password offered
pub const MAX_PASSWORD_LENGTH: u32 = 128;
/// Fewest passphrase words the CLI accepts
pub const MIN_PASSPHRASE_WORDS: u32 = 3;
/// Most passphrase words offered
pub const MAX_PASSPHRASE_WORDS: u32 = 20;

/// Random password options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordOptions {
    /// Length, clamped to 5..=128
    pub length: u32,
    /// Include A-Z
    pub uppercase: bool,
    /// Include a-z
    pub lowercase: bool,
    /// Include 0-9
    pub numbers: bool,
    /// Include special characters
    pub special: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 14,
            uppercase: true,
            lowercase: true,
            numbers: true,
            special: false,
        }
    }
}

impl PasswordOptions {
    /// Effective length after clamping
    #[must_use]
    pub fn effective_length(&self) -> u32 {
        self.length.clamp(MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
    }

    /// Arguments for `bw`
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["generate".to_string()];
        if self.uppercase {
            args.push("-u".to_string());
        }
        if self.lowercase {
            args.push("-l".to_string());
        }
        if self.numbers {
            args.push("-n".to_string());
        }
        if self.special {
            args.push("-s".to_string());
        }
        args.push("--length".to_string());
        args.push(self.effective_length().to_string());
        args
    }
}

/// Passphrase options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseOptions {
    /// Word count, clamped to 3..=20
    pub words: u32,
    /// Separator between words
    pub separator: String,
    /// Capitalize each word
    pub capitalize: bool,
    /// Append a number to one word
    pub include_number: bool,
}

impl Default for PassphraseOptions {
    fn default() -> Self {
        Self {
            words: 3,
            separator: "-".to_string(),
            capitalize: false,
            include_number: false,
        }
    }
}

impl PassphraseOptions {
    /// Effective word count after clamping
    #[must_use]
    pub fn effective_words(&self) -> u32 {
        self.words.clamp(MIN_PASSPHRASE_WORDS, MAX_PASSPHRASE_WORDS)
    }

    /// Arguments for `bw`
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "generate".to_string(),
            "--passphrase".to_string(),
            "--words".to_string(),
            self.effective_words().to_string(),
            "--separator".to_string(),
            self.separator.clone(),
        ];
        if self.capitalize {
            args.push("-c".to_string());
        }
        if self.include_number {
            args.push("--includeNumber".to_string());
        }
        args
    }
}
