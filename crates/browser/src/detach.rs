use std::time::Duration;

use chromiumoxide::Page;
use tokio::sync::watch;

/// Spawns a periodic "is the page still attached?" probe (§4.6, 4 Hz
/// default). The returned receiver flips to `true` the moment a probe
/// observes a dead page, so callers can race it against their normal work
/// instead of waiting out the full soft timeout on a page that already died.
pub fn spawn_crash_probe(page: Page, hz: f64) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    let interval = Duration::from_secs_f64(1.0 / hz.max(0.1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                return;
            }
            if page.evaluate("1").await.is_err() {
                let _ = tx.send(true);
                return;
            }
        }
    });

    rx
}
