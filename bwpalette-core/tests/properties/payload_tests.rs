//! Property tests for edit payloads and session token extraction

use std::collections::{BTreeMap, BTreeSet};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bwpalette_core::ToolOutput;
use bwpalette_core::session::{encode_payload, extract_session_token, merge_fields};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn arb_fields() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..8)
}

fn to_object(fields: &BTreeMap<String, String>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Updated keys take the new value; every other key is kept
    #[test]
    fn merge_overwrites_only_updated_keys(current in arb_fields(), updates in arb_fields()) {
        let merged = merge_fields(Value::Object(to_object(&current)), &to_object(&updates))
            .expect("objects always merge");
        let merged = merged.as_object().expect("merge yields an object");

        for (key, value) in &updates {
            prop_assert_eq!(merged.get(key), Some(&Value::String(value.clone())));
        }
        for (key, value) in current.iter().filter(|(k, _)| !updates.contains_key(*k)) {
            prop_assert_eq!(merged.get(key), Some(&Value::String(value.clone())));
        }
        let keys: BTreeSet<&String> = current.keys().chain(updates.keys()).collect();
        prop_assert_eq!(merged.len(), keys.len());
    }

    /// Encoded payloads decode back to the same JSON
    #[test]
    fn payload_is_base64_json(fields in arb_fields()) {
        let value = Value::Object(to_object(&fields));
        let encoded = encode_payload(&value).expect("JSON always encodes");
        let decoded = STANDARD.decode(encoded.as_bytes()).expect("valid base64");
        let parsed: Value = serde_json::from_slice(&decoded).expect("valid JSON");
        prop_assert_eq!(parsed, value);
    }

    /// A bare token on stdout is taken as is
    #[test]
    fn raw_tokens_are_extracted(token in "[A-Za-z0-9+/]{8,64}={0,2}") {
        let output = ToolOutput::ok(format!("{token}\n"));
        prop_assert_eq!(extract_session_token(&output), Some(token));
    }

    /// Exported assignments win over other assignments
    #[test]
    fn exported_session_is_preferred(token in "[A-Za-z0-9+/=]{8,64}", other in "[a-z]{4,12}") {
        let stdout = format!(
            "Your vault is now unlocked!\n$ export OTHER=\"{other}\"\n$ export BW_SESSION=\"{token}\""
        );
        prop_assert_eq!(extract_session_token(&ToolOutput::ok(stdout)), Some(token));
    }

    /// Failed unlocks never yield a raw token
    #[test]
    fn failed_output_has_no_raw_token(token in "[A-Za-z0-9]{8,32}", code in 1i32..128) {
        let output = ToolOutput::new(token, "Invalid master password.", code);
        prop_assert_eq!(extract_session_token(&output), None);
    }
}
