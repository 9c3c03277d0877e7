//! Vault view loading, filtering and display rows

use std::sync::Arc;

use bwpalette_core::palette::{Glyph, IconRef, TimeUrgency, totp_display_items};
use bwpalette_core::{
    ItemAction, ManualClock, ScriptedRunner, SessionStore, ToolOutput, ToolSettings,
    TotpRefreshScheduler, VaultError, VaultFilter, VaultView, ViewEvent,
};
use secrecy::SecretString;

const ITEMS: &str = r#"[
    {"object":"item","id":"gh","folderId":"f1","type":1,"name":"GitHub","favorite":true,
     "login":{"username":"octocat","password":"pw","totp":"JBSWY3DP",
              "uris":[{"match":null,"uri":"https://github.com/login"}]}},
    {"object":"item","id":"visa","folderId":null,"type":3,"name":"Visa",
     "card":{"brand":"Visa","number":"4111111111111111","code":"123"}},
    {"object":"item","id":"wifi","folderId":null,"type":2,"name":"Home WiFi",
     "notes":"hunter2","secureNote":{"type":0}}
]"#;

const FOLDERS: &str = r#"[
    {"object":"folder","id":"f1","name":"Work"},
    {"object":"folder","id":null,"name":"No Folder"}
]"#;

const TRASH: &str = r#"[
    {"object":"item","id":"old","type":1,"name":"Old Login",
     "deletedDate":"2024-03-01T10:00:00.000Z","login":{"username":"gone"}}
]"#;

fn view() -> (Arc<ScriptedRunner>, VaultView) {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["list", "items"], ToolOutput::ok(ITEMS));
    runner.respond(["list", "items", "--trash"], ToolOutput::ok(TRASH));
    runner.respond(["list", "folders"], ToolOutput::ok(FOLDERS));
    let store = SessionStore::with_runner(ToolSettings::default(), runner.clone());
    store.adopt_session(SecretString::from("tok"));
    (runner, VaultView::new(Arc::new(store)))
}

fn titles(view: &VaultView) -> Vec<String> {
    view.display_items().into_iter().map(|row| row.title).collect()
}

#[tokio::test]
async fn refresh_loads_items_and_folders() {
    let (_runner, view) = view();
    let mut events = view.subscribe();

    view.refresh().await.expect("refresh should succeed");

    assert_eq!(view.all_items().len(), 3);
    assert_eq!(view.folders().len(), 2);
    assert_eq!(titles(&view), vec!["GitHub", "Visa", "Home WiFi"]);
    assert_eq!(events.recv().await.unwrap(), ViewEvent::ItemsChanged);
}

#[tokio::test]
async fn type_filters_are_applied_locally() {
    let (runner, view) = view();

    view.apply_filter(VaultFilter::Cards).await.unwrap();
    assert_eq!(titles(&view), vec!["Visa"]);

    view.apply_filter(VaultFilter::Favorites).await.unwrap();
    assert_eq!(titles(&view), vec!["GitHub"]);

    assert!(runner.invocations_of(&["list", "items", "--trash"]).is_empty());
    assert!(runner.invocations_of(&["list", "items", "--folderid"]).is_empty());
}

#[tokio::test]
async fn trash_filter_lists_deleted_items() {
    let (runner, view) = view();

    view.apply_filter(VaultFilter::Trash).await.unwrap();

    assert_eq!(runner.invocations_of(&["list", "items", "--trash"]).len(), 1);
    let rows = view.display_items();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Old Login");
    assert_eq!(
        rows[0].actions,
        vec![ItemAction::Restore, ItemAction::DeletePermanently]
    );
}

#[tokio::test]
async fn folder_filters_pass_folder_id() {
    let (runner, view) = view();

    view.apply_filter(VaultFilter::Folder("f1".to_string()))
        .await
        .unwrap();
    let call = &runner.invocations_of(&["list", "items", "--folderid"])[0];
    assert_eq!(call.args[3], "f1");
    assert_eq!(titles(&view), vec!["GitHub"]);
    assert_eq!(view.filter().label(&view.folders()), "Folder: Work");

    view.apply_filter(VaultFilter::NoFolder).await.unwrap();
    let calls = runner.invocations_of(&["list", "items", "--folderid"]);
    assert_eq!(calls[1].args[3], "null");
}

#[tokio::test]
async fn search_narrows_rows_and_shows_placeholder() {
    let (runner, view) = view();
    view.refresh().await.unwrap();
    let calls = runner.call_count();

    view.set_search("OCTO");
    assert_eq!(titles(&view), vec!["GitHub"]);

    view.set_search("nothing like this");
    let rows = view.display_items();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_placeholder());
    assert_eq!(rows[0].title, "No items found");
    assert_eq!(runner.call_count(), calls);
}

#[tokio::test]
async fn rows_carry_icons_tags_and_actions() {
    let (_runner, view) = view();
    view.refresh().await.unwrap();

    let rows = view.display_items();
    let github = &rows[0];
    assert_eq!(
        github.icon,
        IconRef::Url("https://icons.bitwarden.net/github.com/icon.png".to_string())
    );
    assert_eq!(github.default_action(), Some(ItemAction::CopyPassword));
    assert!(github.actions.contains(&ItemAction::CopyTotp));
    assert!(github.tags.iter().any(|t| t.text == "Favorite"));

    let visa = &rows[1];
    assert_eq!(visa.icon, IconRef::Glyph(Glyph::Card));
    assert_eq!(visa.default_action(), Some(ItemAction::CopyCardNumber));
}

#[tokio::test]
async fn failed_refresh_keeps_cached_items() {
    let (_runner, view) = view();
    view.refresh().await.unwrap();

    view.store().clear_session();
    let err = view.refresh().await.unwrap_err();

    assert!(matches!(err, VaultError::NotUnlocked));
    assert_eq!(view.all_items().len(), 3);

    view.clear();
    assert!(view.all_items().is_empty());
}

#[tokio::test]
async fn totp_rows_follow_scheduler_state() {
    let (runner, view) = view();
    runner.respond(["get", "totp"], ToolOutput::ok("123456"));
    view.refresh().await.unwrap();

    let items = view.all_items();
    // 3 seconds left in the window
    let clock = Arc::new(ManualClock::new(1_700_000_037));
    let scheduler = TotpRefreshScheduler::with_clock(view.store().clone(), &items, clock);

    scheduler.load().await;
    let rows = totp_display_items(&scheduler, &items, "");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "GitHub");
    assert_eq!(rows[0].subtitle, "octocat • 123 456 • 3s");
    assert_eq!(rows[0].tags[0].urgency, Some(TimeUrgency::Critical));

    let none = totp_display_items(&scheduler, &items, "gitlab");
    assert!(none[0].is_placeholder());
    assert_eq!(none[0].title, "No matching TOTP items");
}
