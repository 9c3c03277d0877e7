//! Configuration for `bwpalette`
//!
//! The core only needs to know how to launch the vault CLI. Persisting these
//! settings is the host's business; see `bwpalette-cli` for a TOML-backed
//! implementation.

mod settings;

pub use settings::{
    CLIENT_ID_ENV, CLIENT_SECRET_ENV, DEFAULT_EXECUTABLE, PASSWORD_ENV, ToolSettings, UnlockMode,
    parse_custom_environment,
};
