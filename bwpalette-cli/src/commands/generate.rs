//! Password and passphrase generation.

use bwpalette_core::{PassphraseOptions, PasswordOptions};
use secrecy::ExposeSecret;

use crate::cli::GenerateCommands;
use crate::error::CliError;
use crate::util::{Context, block_on};

/// Generate command handler
pub fn cmd_generate(ctx: &Context, subcmd: GenerateCommands) -> Result<(), CliError> {
    let store = ctx.store()?;
    let secret = match subcmd {
        GenerateCommands::Password {
            length,
            no_uppercase,
            no_lowercase,
            no_numbers,
            special,
        } => {
            let options = PasswordOptions {
                length,
                uppercase: !no_uppercase,
                lowercase: !no_lowercase,
                numbers: !no_numbers,
                special,
            };
            if !(options.uppercase || options.lowercase || options.numbers || options.special) {
                return Err(CliError::Input(
                    "at least one character set must be enabled".to_string(),
                ));
            }
            block_on(async { Ok(store.generate_password(&options).await?) })?
        }
        GenerateCommands::Passphrase {
            words,
            separator,
            capitalize,
            include_number,
        } => {
            let options = PassphraseOptions {
                words,
                separator,
                capitalize,
                include_number,
            };
            block_on(async { Ok(store.generate_passphrase(&options).await?) })?
        }
    };
    println!("{}", secret.expose_secret());
    Ok(())
}
