//! JSON payloads for `bw create` / `bw edit`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// Overlays `updates` on top of the item JSON `current`.
///
/// The CLI only accepts whole-object replacement, so edits are applied to
/// the full current representation: every top-level key present in
/// `updates` replaces the current value entirely (nested objects included),
/// every other key keeps its current value.
///
/// # Errors
/// Returns `ParseError` if `current` is not a JSON object
pub fn merge_fields(current: Value, updates: &Map<String, Value>) -> VaultResult<Value> {
    let Value::Object(mut merged) = current else {
        return Err(VaultError::parse("item", "expected a JSON object"));
    };
    for (key, value) in updates {
        merged.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(merged))
}

/// Serializes `payload` and base64-encodes it the way `bw encode` does.
///
/// The returned buffer is wiped on drop; payloads routinely carry passwords.
///
/// # Errors
/// Returns `Encode` if serialization fails
pub fn encode_payload(payload: &Value) -> VaultResult<Zeroizing<String>> {
    let json = Zeroizing::new(
        serde_json::to_string(payload).map_err(|e| VaultError::Encode(e.to_string()))?,
    );
    Ok(Zeroizing::new(STANDARD.encode(json.as_bytes())))
}
