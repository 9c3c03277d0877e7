//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `bwpalette` command-line interface for a Bitwarden vault
#[derive(Parser)]
#[command(name = "bwpalette")]
#[command(author, version, about = "Quick access to a Bitwarden vault through the bw CLI")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Session token from a previous `unlock`
    #[arg(long, global = true, env = "BW_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show vault status
    #[command(about = "Show login and lock state reported by bw")]
    Status {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Unlock the vault
    #[command(about = "Unlock the vault and print the session token")]
    Unlock {
        /// Read the master password from this environment variable instead
        /// of prompting
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,

        /// Print an `export BW_SESSION=...` line instead of the bare token
        #[arg(long)]
        export: bool,
    },

    /// Lock the vault
    #[command(about = "Lock the vault and forget the session")]
    Lock,

    /// Sync with the server
    #[command(about = "Pull the latest vault data from the server")]
    Sync,

    /// Log in with a personal API key
    #[command(name = "login-apikey", about = "Log in using a personal API key")]
    LoginApikey {
        /// API key client id (overrides the configured one)
        #[arg(long, env = "BW_CLIENTID")]
        client_id: Option<String>,

        /// API key client secret
        #[arg(long, env = "BW_CLIENTSECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// List vault items
    #[command(about = "List vault items")]
    List {
        /// Filter id (all, favorites, logins, cards, identities, notes,
        /// trash, folder_none, folder_<id>); defaults to the configured one
        #[arg(short = 'F', long)]
        filter: Option<String>,

        /// Case-insensitive search on name, username and URI
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// List folders
    #[command(about = "List vault folders")]
    Folders {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show one item
    #[command(about = "Show a vault item")]
    Get {
        /// Item id
        id: String,

        /// Print a single field instead of the item
        #[arg(long, value_enum)]
        field: Option<FieldArg>,
    },

    /// Show TOTP codes
    #[command(about = "Show current TOTP codes of all login items")]
    Totp {
        /// Only items whose name or username contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Keep running and refresh codes at every 30 second window
        #[arg(short, long)]
        watch: bool,
    },

    /// Create an item
    #[command(about = "Create an item from its JSON representation")]
    Create {
        /// Item JSON, or `-` to read it from stdin
        json: String,
    },

    /// Edit an item
    #[command(about = "Change top-level fields of an item")]
    Edit {
        /// Item id
        id: String,

        /// JSON object with the fields to replace, or `-` for stdin
        json: String,
    },

    /// Delete an item
    #[command(about = "Move an item to the trash")]
    Delete {
        /// Item id
        id: String,

        /// Delete for good instead of moving to the trash
        #[arg(long)]
        permanent: bool,
    },

    /// Restore an item
    #[command(about = "Restore an item from the trash")]
    Restore {
        /// Item id
        id: String,
    },

    /// Generate a password or passphrase
    #[command(subcommand, about = "Generate a password or passphrase")]
    Generate(GenerateCommands),

    /// Show or change settings
    #[command(subcommand, about = "Show or change bwpalette settings")]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate a man page
    #[command(about = "Generate a man page")]
    Manpage,
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

/// Item field selectable by `get --field`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    /// Login username
    Username,
    /// Login password
    Password,
    /// Primary login URI
    Uri,
    /// Current TOTP code
    Totp,
    /// Notes
    Notes,
}

/// Generator subcommands
#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Random password
    #[command(about = "Generate a random password")]
    Password {
        /// Password length (5-128)
        #[arg(short, long, default_value = "14")]
        length: u32,

        /// Leave out uppercase letters
        #[arg(long)]
        no_uppercase: bool,

        /// Leave out lowercase letters
        #[arg(long)]
        no_lowercase: bool,

        /// Leave out numbers
        #[arg(long)]
        no_numbers: bool,

        /// Include special characters
        #[arg(short, long)]
        special: bool,
    },

    /// Passphrase
    #[command(about = "Generate a passphrase")]
    Passphrase {
        /// Number of words (3-20)
        #[arg(short, long, default_value = "3")]
        words: u32,

        /// Word separator
        #[arg(long, default_value = "-")]
        separator: String,

        /// Capitalize each word
        #[arg(short = 'C', long)]
        capitalize: bool,

        /// Append a number to one word
        #[arg(long)]
        include_number: bool,
    },
}

/// Settings subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings
    #[command(about = "Print the current settings")]
    Show,

    /// Change one setting
    #[command(about = "Change one setting")]
    Set {
        /// Setting to change
        #[arg(value_enum)]
        key: SettingKey,

        /// New value; an empty string clears optional settings
        value: String,
    },

    /// Print the settings file location
    #[command(about = "Print the settings file location")]
    Path,
}

/// Keys accepted by `config set`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Path to the bw executable
    Executable,
    /// Extra environment, `KEY=VALUE;KEY=VALUE`
    CustomEnvironment,
    /// API key client id
    ClientId,
    /// Per-call timeout in seconds
    Timeout,
    /// `environment` or `argument`
    UnlockMode,
    /// Filter used by `list` when none is given
    DefaultFilter,
}
