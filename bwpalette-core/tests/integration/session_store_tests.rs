//! Session store behavior against a scripted vault CLI

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bwpalette_core::{
    ScriptedRunner, SessionStore, ToolOutput, ToolSettings, VaultError, VaultState,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

// ============================================================================
// Helpers
// ============================================================================

fn scripted() -> (Arc<ScriptedRunner>, SessionStore) {
    let runner = Arc::new(ScriptedRunner::new());
    let store = SessionStore::with_runner(ToolSettings::default(), runner.clone());
    (runner, store)
}

fn unlocked() -> (Arc<ScriptedRunner>, SessionStore) {
    let (runner, store) = scripted();
    store.adopt_session(SecretString::from("tok"));
    (runner, store)
}

fn token_of(store: &SessionStore) -> Option<String> {
    store
        .session_token()
        .map(|t| t.expose_secret().to_string())
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn locked_store_rejects_every_session_operation_without_spawning() {
    let (runner, store) = scripted();
    let updates = Map::new();

    assert!(matches!(store.sync().await, Err(VaultError::NotUnlocked)));
    assert!(matches!(store.list_items().await, Err(VaultError::NotUnlocked)));
    assert!(matches!(
        store.search_items("git").await,
        Err(VaultError::NotUnlocked)
    ));
    assert!(matches!(
        store.list_items_in_folder(None).await,
        Err(VaultError::NotUnlocked)
    ));
    assert!(matches!(store.list_trash().await, Err(VaultError::NotUnlocked)));
    assert!(matches!(store.list_folders().await, Err(VaultError::NotUnlocked)));
    assert!(matches!(store.get_item("1").await, Err(VaultError::NotUnlocked)));
    assert!(matches!(store.get_totp("1").await, Err(VaultError::NotUnlocked)));
    assert!(matches!(
        store.create_item(&json!({"name": "x"})).await,
        Err(VaultError::NotUnlocked)
    ));
    assert!(matches!(
        store.edit_item("1", &updates).await,
        Err(VaultError::NotUnlocked)
    ));
    assert!(matches!(
        store.delete_item("1", false).await,
        Err(VaultError::NotUnlocked)
    ));
    assert!(matches!(
        store.restore_item("1").await,
        Err(VaultError::NotUnlocked)
    ));

    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn session_operations_carry_redacted_token() {
    let (runner, store) = unlocked();
    runner.respond(["list", "items"], ToolOutput::ok("[]"));

    let items = store.list_items().await.expect("list should succeed");
    assert!(items.is_empty());

    let call = &runner.invocations()[0];
    assert_eq!(call.args, vec!["list", "items", "--session", "tok"]);
    assert!(call.is_sensitive(3));
    assert!(!format!("{call:?}").contains("tok\""));
}

#[tokio::test]
async fn status_runs_without_session() {
    let (runner, store) = unlocked();
    runner.respond(
        ["status"],
        ToolOutput::ok(
            r#"{"serverUrl":null,"lastSync":"2024-01-01T00:00:00.000Z","userEmail":"me@example.com","status":"locked"}"#,
        ),
    );

    let status = store.status().await.expect("status should parse");
    assert_eq!(status.state, VaultState::Locked);
    assert_eq!(status.user_email.as_deref(), Some("me@example.com"));
    assert!(!runner.invocations()[0].has_session());
}

#[tokio::test]
async fn missing_tool_is_reported_as_unavailable() {
    let (runner, store) = scripted();
    runner.respond_with(["status"], |_| {
        Err(VaultError::ToolUnavailable("bw: not found".to_string()))
    });

    let err = store.status().await.unwrap_err();
    assert!(err.is_unavailable());
}

// ============================================================================
// Unlock and lock
// ============================================================================

#[tokio::test]
async fn unlock_stores_raw_token() {
    let (runner, store) = scripted();
    runner.respond(["unlock"], ToolOutput::ok("AbC123+/xyz==\n"));

    store
        .unlock(&SecretString::from("correct horse"))
        .await
        .expect("unlock should succeed");

    assert!(store.is_unlocked());
    assert_eq!(token_of(&store).as_deref(), Some("AbC123+/xyz=="));
}

#[tokio::test]
async fn unlock_falls_back_to_exported_assignment() {
    let (runner, store) = scripted();
    runner.respond(
        ["unlock"],
        ToolOutput::ok(
            "Your vault is now unlocked!\n\n\
             To unlock your vault, set your session key:\n\
             $ export BW_SESSION=\"sess42\"\n\
             > $env:BW_SESSION=\"sess42\"",
        ),
    );

    store.unlock(&SecretString::from("pw")).await.unwrap();
    assert_eq!(token_of(&store).as_deref(), Some("sess42"));
}

#[tokio::test]
async fn rejected_password_keeps_previous_token() {
    let (runner, store) = unlocked();
    runner.respond(
        ["unlock"],
        ToolOutput::failed("Invalid master password.", 1),
    );

    let err = store.unlock(&SecretString::from("wrong")).await.unwrap_err();
    assert!(matches!(err, VaultError::WrongSecret(_)));
    assert_eq!(token_of(&store).as_deref(), Some("tok"));
}

#[tokio::test]
async fn other_unlock_failures_are_tool_errors() {
    let (runner, store) = scripted();
    runner.respond(["unlock"], ToolOutput::failed("You are not logged in.", 1));

    let err = store.unlock(&SecretString::from("pw")).await.unwrap_err();
    assert!(matches!(err, VaultError::ToolError(ref m) if m.contains("not logged in")));
    assert!(!store.is_unlocked());
}

#[tokio::test]
async fn lock_clears_token_on_success() {
    let (runner, store) = unlocked();
    runner.respond(["lock"], ToolOutput::ok("Your vault is locked."));

    store.lock().await.expect("lock should succeed");

    assert!(!store.is_unlocked());
    assert!(store.session_token().is_none());
    assert!(matches!(store.list_items().await, Err(VaultError::NotUnlocked)));
}

#[tokio::test]
async fn failed_lock_keeps_token() {
    let (runner, store) = unlocked();
    runner.respond(["lock"], ToolOutput::failed("Something went wrong", 1));

    assert!(matches!(store.lock().await, Err(VaultError::ToolError(_))));
    assert_eq!(token_of(&store).as_deref(), Some("tok"));
}

#[tokio::test]
async fn unlock_and_lock_never_overlap() {
    let (runner, store) = scripted();
    let store = Arc::new(store);
    runner.respond(["unlock"], ToolOutput::ok("sessABC"));
    runner.hold();

    let unlock = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.unlock(&SecretString::from("hunter2")).await }
    });
    tokio::time::timeout(Duration::from_secs(5), async {
        while runner.in_flight() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("unlock reaches the CLI");

    let lock = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.lock().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    // lock waits for the unlock transition instead of spawning
    assert_eq!(runner.call_count(), 1);
    assert_eq!(runner.in_flight(), 1);

    runner.release();
    unlock.await.expect("unlock task").unwrap();
    lock.await.expect("lock task").unwrap();

    assert_eq!(runner.peak_concurrency(), 1);
    let commands: Vec<String> = runner
        .invocations()
        .iter()
        .map(|inv| inv.args[0].clone())
        .collect();
    assert_eq!(commands, vec!["unlock", "lock"]);
    assert!(!store.is_unlocked());
}

#[tokio::test]
async fn login_with_api_key_passes_credentials_in_environment() {
    let runner = Arc::new(ScriptedRunner::new());
    let settings = ToolSettings::default()
        .with_api_key("user.1234", SecretString::from("s3cret"));
    let store = SessionStore::with_runner(settings, runner.clone());

    store.login_with_api_key().await.unwrap();

    let call = &runner.invocations()[0];
    assert_eq!(call.args, vec!["login", "--apikey"]);
    assert_eq!(call.env.get("BW_CLIENTID").map(String::as_str), Some("user.1234"));
    assert_eq!(call.env.get("BW_CLIENTSECRET").map(String::as_str), Some("s3cret"));
    assert!(!call.has_session());
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn edit_merges_updates_into_current_item() {
    let (runner, store) = unlocked();
    runner.respond(
        ["get", "item", "42"],
        ToolOutput::ok(r#"{"id":"42","type":1,"name":"A","notes":"n"}"#),
    );

    let mut updates = Map::new();
    updates.insert("name".to_string(), json!("B"));
    store.edit_item("42", &updates).await.expect("edit should succeed");

    let calls = runner.invocations();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args[..3], ["get", "item", "42"]);
    assert_eq!(calls[1].args[..3], ["edit", "item", "42"]);

    let payload = calls[1].args.last().expect("edit carries a payload");
    assert!(calls[1].is_sensitive(calls[1].args.len() - 1));
    let decoded = STANDARD.decode(payload).expect("payload is base64");
    let written: Value = serde_json::from_slice(&decoded).expect("payload is JSON");
    assert_eq!(
        written,
        json!({"id": "42", "type": 1, "name": "B", "notes": "n"})
    );
}

#[tokio::test]
async fn edit_does_not_write_when_read_fails() {
    let (runner, store) = unlocked();
    runner.respond(["get", "item"], ToolOutput::failed("Not found.", 1));

    let mut updates = Map::new();
    updates.insert("name".to_string(), json!("B"));
    let err = store.edit_item("404", &updates).await.unwrap_err();

    assert!(matches!(err, VaultError::ToolError(_)));
    assert!(runner.invocations_of(&["edit"]).is_empty());
}

#[tokio::test]
async fn create_sends_encoded_item() {
    let (runner, store) = unlocked();
    let item = json!({"type": 2, "name": "Note", "secureNote": {"type": 0}});

    store.create_item(&item).await.unwrap();

    let call = &runner.invocations_of(&["create", "item"])[0];
    let decoded = STANDARD.decode(call.args.last().unwrap()).unwrap();
    let sent: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(sent, item);
}

#[tokio::test]
async fn get_item_parses_login() {
    let (runner, store) = unlocked();
    runner.respond(
        ["get", "item"],
        ToolOutput::ok(
            r#"{"id":"1","type":1,"name":"GitHub","favorite":true,
                "login":{"username":"octocat","password":"pw","totp":"JBSWY3DP",
                         "uris":[{"match":null,"uri":"https://github.com/login"}]}}"#,
        ),
    );

    let item = store.get_item("1").await.unwrap();
    assert_eq!(item.name, "GitHub");
    assert!(item.has_totp());
    assert_eq!(item.username(), Some("octocat"));
}

#[tokio::test]
async fn malformed_output_is_parse_error() {
    let (runner, store) = unlocked();
    runner.respond(["list", "items"], ToolOutput::ok("You are not logged in."));

    let err = store.list_items().await.unwrap_err();
    assert!(matches!(err, VaultError::ParseError { what: "items", .. }));
}

#[tokio::test]
async fn get_totp_returns_trimmed_code() {
    let (runner, store) = unlocked();
    runner.respond(["get", "totp", "1"], ToolOutput::ok("123456\n"));

    assert_eq!(store.get_totp("1").await.unwrap(), "123456");
}
