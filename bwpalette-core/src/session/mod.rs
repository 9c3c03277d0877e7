//! Vault session management
//!
//! [`SessionStore`] owns the unlock token and is the only component that
//! issues session-scoped commands to the Bitwarden CLI. Hosts construct one
//! store at startup and share it through an `Arc`.

mod payload;
mod store;
mod token;

pub use payload::{encode_payload, merge_fields};
pub use store::SessionStore;
pub use token::extract_session_token;
