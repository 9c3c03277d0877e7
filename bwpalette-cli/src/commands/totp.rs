//! TOTP code listing, optionally refreshed live.

use std::sync::Arc;

use bwpalette_core::palette::totp_display_items;
use bwpalette_core::{DisplayItem, TotpEvent, TotpRefreshScheduler, TotpSource, VaultItem};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::error::CliError;
use crate::util::{Context, block_on};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// TOTP command handler.
///
/// Prints one line per login with a TOTP secret. With `watch` the codes are
/// redrawn at every countdown step until Ctrl+C.
pub fn cmd_totp(ctx: &Context, search: Option<&str>, watch: bool) -> Result<(), CliError> {
    let store = Arc::new(ctx.store()?);
    let query = search.unwrap_or_default();

    block_on(async {
        let items = store.list_items().await?;
        let source: Arc<dyn TotpSource> = store.clone();
        let scheduler = TotpRefreshScheduler::new(source, &items);

        if watch {
            watch_codes(&scheduler, &items, query).await?;
        } else {
            scheduler.load().await;
            print!("{}", format_rows(&totp_display_items(&scheduler, &items, query)));
        }
        scheduler.dispose();
        Ok(())
    })
}

async fn watch_codes(
    scheduler: &TotpRefreshScheduler,
    items: &[VaultItem],
    query: &str,
) -> Result<(), CliError> {
    let mut events = scheduler.subscribe();
    scheduler.start();
    redraw(scheduler, items, query);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(TotpEvent::Disposed) | Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => redraw(scheduler, items, query),
            },
            result = tokio::signal::ctrl_c() => {
                result?;
                debug!("Interrupted, stopping TOTP watch");
                break;
            }
        }
    }
    Ok(())
}

fn redraw(scheduler: &TotpRefreshScheduler, items: &[VaultItem], query: &str) {
    print!(
        "{CLEAR_SCREEN}{}",
        format_rows(&totp_display_items(scheduler, items, query))
    );
}

/// One line per row: title, then the code and countdown
#[must_use]
pub fn format_rows(rows: &[DisplayItem]) -> String {
    let width = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            if row.is_placeholder() {
                format!("{}\n", row.title)
            } else {
                format!("{:<width$}  {}\n", row.title, row.subtitle)
            }
        })
        .collect()
}
