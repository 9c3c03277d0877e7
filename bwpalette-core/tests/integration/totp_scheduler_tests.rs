//! TOTP refresh scheduling against a session store backed by a scripted CLI

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bwpalette_core::{
    ManualClock, SchedulerPhase, ScriptedRunner, SessionStore, ToolOutput, ToolSettings,
    TotpEvent, TotpRefreshScheduler, VaultItem,
};
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

/// 1_700_000_010 is a window boundary
const BOUNDARY: i64 = 1_700_000_010;

// ============================================================================
// Helpers
// ============================================================================

fn login(id: &str, name: &str) -> VaultItem {
    serde_json::from_value(json!({
        "id": id,
        "type": 1,
        "name": name,
        "login": {"username": format!("{id}@example.com"), "totp": "JBSWY3DPEHPK3PXP"}
    }))
    .expect("valid login item")
}

fn logins(count: usize) -> Vec<VaultItem> {
    (0..count)
        .map(|i| login(&format!("item-{i}"), &format!("Service {i:02}")))
        .collect()
}

fn unlocked_store(runner: &Arc<ScriptedRunner>) -> Arc<SessionStore> {
    let store = SessionStore::with_runner(ToolSettings::default(), runner.clone());
    store.adopt_session(SecretString::from("tok"));
    Arc::new(store)
}

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect(&format!("timed out waiting for {what}"));
}

fn code_of(scheduler: &TotpRefreshScheduler, id: &str) -> Option<String> {
    scheduler.entry(id).and_then(|e| e.current_code)
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn load_fetches_each_entry_once() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("123456"));
    let scheduler = TotpRefreshScheduler::new(unlocked_store(&runner), &logins(4));

    assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    scheduler.load().await;

    assert_eq!(scheduler.phase(), SchedulerPhase::Ready);
    assert!(!scheduler.is_fetching());
    assert_eq!(runner.invocations_of(&["get", "totp"]).len(), 4);
    assert!(
        scheduler
            .snapshot()
            .iter()
            .all(|e| e.current_code.as_deref() == Some("123456"))
    );
}

#[tokio::test]
async fn locked_source_leaves_codes_empty() {
    let runner = Arc::new(ScriptedRunner::new());
    let store = Arc::new(SessionStore::with_runner(
        ToolSettings::default(),
        runner.clone(),
    ));
    let scheduler = TotpRefreshScheduler::new(store, &logins(3));

    scheduler.load().await;

    assert_eq!(scheduler.phase(), SchedulerPhase::Ready);
    assert_eq!(runner.call_count(), 0);
    assert!(scheduler.snapshot().iter().all(|e| e.current_code.is_none()));
}

#[tokio::test]
async fn items_without_totp_never_reach_the_cli() {
    let runner = Arc::new(ScriptedRunner::new());
    let note: VaultItem =
        serde_json::from_value(json!({"id": "n", "type": 2, "name": "Note"})).unwrap();
    let plain: VaultItem = serde_json::from_value(
        json!({"id": "p", "type": 1, "name": "Plain", "login": {"username": "u"}}),
    )
    .unwrap();
    let scheduler = TotpRefreshScheduler::new(unlocked_store(&runner), &[note, plain]);
    let mut events = scheduler.subscribe();

    scheduler.start();

    assert!(scheduler.is_empty());
    assert_eq!(scheduler.phase(), SchedulerPhase::Ready);
    assert_eq!(events.recv().await.unwrap(), TotpEvent::Loaded);
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn fetches_are_bounded_to_three_in_flight() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("654321"));
    runner.hold();
    let scheduler = Arc::new(TotpRefreshScheduler::new(
        unlocked_store(&runner),
        &logins(8),
    ));

    let loader = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.load().await }
    });

    wait_until("three fetches", || runner.in_flight() == 3).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runner.in_flight(), 3);
    assert_eq!(runner.call_count(), 3);
    assert!(scheduler.is_loading());

    runner.release();
    loader.await.expect("loader task");

    assert_eq!(runner.call_count(), 8);
    assert_eq!(runner.peak_concurrency(), 3);
    assert!(
        scheduler
            .snapshot()
            .iter()
            .all(|e| e.current_code.as_deref() == Some("654321"))
    );
}

// ============================================================================
// Ticking
// ============================================================================

#[tokio::test]
async fn refresh_happens_only_at_window_boundary() {
    let runner = Arc::new(ScriptedRunner::new());
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        runner.respond_with(["get", "totp"], move |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::ok(format!("{n:06}")))
        });
    }
    let clock = Arc::new(ManualClock::new(BOUNDARY - 2));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &[login("a", "Alpha")],
        clock.clone(),
    );

    scheduler.load().await;
    assert_eq!(code_of(&scheduler, "a").as_deref(), Some("000000"));

    assert!(!scheduler.tick());
    assert_eq!(scheduler.last_remaining(), Some(2));
    clock.advance(1);
    assert!(!scheduler.tick());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(1);
    assert!(scheduler.tick());
    assert_eq!(scheduler.last_remaining(), Some(30));
    // Same second again: nothing changes
    assert!(!scheduler.tick());

    wait_until("refresh round", || scheduler.phase() == SchedulerPhase::Ready).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(code_of(&scheduler, "a").as_deref(), Some("000001"));
}

#[tokio::test]
async fn refresh_happens_when_the_boundary_second_is_missed() {
    let runner = Arc::new(ScriptedRunner::new());
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        runner.respond_with(["get", "totp"], move |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::ok(format!("{n:06}")))
        });
    }
    let clock = Arc::new(ManualClock::new(BOUNDARY - 1));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &[login("a", "Alpha")],
        clock.clone(),
    );
    scheduler.load().await;
    assert!(!scheduler.tick());

    // Jitter: the tick lands one second past the boundary
    clock.advance(2);
    assert!(scheduler.tick());
    assert_eq!(scheduler.last_remaining(), Some(29));
    wait_until("first refresh", || !scheduler.is_fetching()).await;
    assert_eq!(code_of(&scheduler, "a").as_deref(), Some("000001"));

    // Suspend and resume: many windows pass between two ticks
    clock.advance(600);
    assert!(scheduler.tick());
    wait_until("second refresh", || !scheduler.is_fetching()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(code_of(&scheduler, "a").as_deref(), Some("000002"));

    // A jump of exactly one window leaves the countdown unchanged
    clock.advance(30);
    assert!(scheduler.tick());
    wait_until("third refresh", || !scheduler.is_fetching()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn refresh_is_skipped_while_a_round_is_in_flight() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("111111"));
    let clock = Arc::new(ManualClock::new(BOUNDARY - 1));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &logins(2),
        clock.clone(),
    );
    scheduler.load().await;
    assert!(!scheduler.tick());

    runner.hold();
    clock.advance(1);
    assert!(scheduler.tick());
    wait_until("refresh fetches", || runner.in_flight() == 2).await;

    // Next boundary arrives while the first round is still stuck
    clock.advance(29);
    assert!(!scheduler.tick());
    clock.advance(1);
    assert!(!scheduler.tick());
    assert_eq!(scheduler.last_remaining(), Some(30));
    assert!(scheduler.is_fetching());

    runner.release();
    wait_until("refresh round", || !scheduler.is_fetching()).await;
    assert_eq!(runner.invocations_of(&["get", "totp"]).len(), 4);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_code() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("111111"));
    let clock = Arc::new(ManualClock::new(BOUNDARY - 1));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &[login("a", "Alpha"), login("b", "Beta")],
        clock.clone(),
    );
    scheduler.load().await;
    assert!(!scheduler.tick());

    runner.respond(["get", "totp"], ToolOutput::ok("222222"));
    runner.respond(["get", "totp", "b"], ToolOutput::failed("Not found.", 1));
    clock.advance(1);
    assert!(scheduler.tick());
    wait_until("refresh round", || scheduler.phase() == SchedulerPhase::Ready).await;

    assert_eq!(code_of(&scheduler, "a").as_deref(), Some("222222"));
    assert_eq!(code_of(&scheduler, "b").as_deref(), Some("111111"));
}

#[tokio::test]
async fn events_follow_countdown_and_updates() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("999999"));
    let clock = Arc::new(ManualClock::new(BOUNDARY + 20));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &[login("a", "Alpha")],
        clock.clone(),
    );
    let mut events = scheduler.subscribe();

    scheduler.load().await;
    scheduler.tick();

    assert_eq!(
        events.recv().await.unwrap(),
        TotpEvent::CodeUpdated {
            item_id: "a".to_string()
        }
    );
    assert_eq!(events.recv().await.unwrap(), TotpEvent::Loaded);
    assert_eq!(
        events.recv().await.unwrap(),
        TotpEvent::RemainingChanged { remaining: 10 }
    );
}

// ============================================================================
// Disposal
// ============================================================================

#[tokio::test]
async fn dispose_discards_codes_arriving_late() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("123456"));
    runner.hold();
    let scheduler = Arc::new(TotpRefreshScheduler::new(
        unlocked_store(&runner),
        &logins(2),
    ));
    let mut events = scheduler.subscribe();

    let loader = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.load().await }
    });
    wait_until("both fetches", || runner.in_flight() == 2).await;

    scheduler.dispose();
    scheduler.dispose();
    runner.release();
    loader.await.expect("loader task");

    assert_eq!(scheduler.phase(), SchedulerPhase::Disposed);
    assert!(scheduler.snapshot().iter().all(|e| e.current_code.is_none()));
    assert_eq!(events.recv().await.unwrap(), TotpEvent::Disposed);
    assert!(matches!(events.recv().await, Err(RecvError::Closed)));
}

#[tokio::test]
async fn disposed_scheduler_stays_inert() {
    let runner = Arc::new(ScriptedRunner::new());
    let clock = Arc::new(ManualClock::new(BOUNDARY - 1));
    let scheduler = TotpRefreshScheduler::with_clock(
        unlocked_store(&runner),
        &logins(2),
        clock.clone(),
    );

    scheduler.dispose();
    scheduler.start();
    clock.advance(1);

    assert!(!scheduler.tick());
    assert_eq!(scheduler.phase(), SchedulerPhase::Disposed);
    assert_eq!(runner.call_count(), 0);

    let mut late = scheduler.subscribe();
    assert!(matches!(late.recv().await, Err(RecvError::Closed)));
}

#[tokio::test]
async fn started_scheduler_loads_in_background() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(["get", "totp"], ToolOutput::ok("424242"));
    let scheduler = TotpRefreshScheduler::new(unlocked_store(&runner), &logins(2));

    scheduler.start();
    scheduler.start();

    wait_until("initial load", || scheduler.phase() == SchedulerPhase::Ready).await;
    // The ticker may already have started a refresh at a real boundary
    assert!(runner.invocations_of(&["get", "totp"]).len() >= 2);
    assert_eq!(code_of(&scheduler, "item-0").as_deref(), Some("424242"));

    scheduler.dispose();
    assert!(code_of(&scheduler, "item-0").is_none());
}
