use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::watch;

/// Tracks the HTTP status of the main document response so the page task
/// can check it before running the extraction payload (§9 resolved Open
/// Question: navigation completing with status ≥400 is always `Error`).
pub async fn spawn_main_document_status(page: &Page) -> Result<watch::Receiver<Option<u16>>, chromiumoxide::error::CdpError> {
    let (tx, rx) = watch::channel(None);
    let mut events = page.event_listener::<EventResponseReceived>().await?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if matches!(event.r#type, ResourceType::Document) && tx.borrow().is_none() {
                let _ = tx.send(Some(event.response.status as u16));
            }
        }
    });

    Ok(rx)
}
