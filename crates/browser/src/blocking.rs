use chromiumoxide::cdp::browser_protocol::fetch;
use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use chromiumoxide::Page;
use futures::StreamExt;

use crate::error::BrowserError;

/// Resource types refused per §4.6: image, font, media, texttrack,
/// eventsource, manifest, other. Scripts, stylesheets, XHR, WebSocket pass.
fn is_blocked(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image
            | ResourceType::Font
            | ResourceType::Media
            | ResourceType::TextTrack
            | ResourceType::EventSource
            | ResourceType::Manifest
            | ResourceType::Other
    )
}

/// Enable CDP Fetch interception and spawn a task that fails requests for
/// blocked resource types, continuing everything else unmodified.
pub async fn enable_resource_blocking(page: &Page) -> Result<(), BrowserError> {
    page.execute(fetch::EnableParams {
        patterns: Some(vec![fetch::RequestPattern {
            url_pattern: Some("*".to_string()),
            resource_type: None,
            request_stage: Some(fetch::RequestStage::Request),
        }]),
        handle_auth_requests: Some(false),
    })
    .await
    .map_err(|e| BrowserError::Other(anyhow::anyhow!("failed to enable fetch interception: {e}")))?;

    let mut paused = page
        .event_listener::<fetch::EventRequestPaused>()
        .await
        .map_err(|e| BrowserError::Other(anyhow::anyhow!("failed to subscribe to requestPaused: {e}")))?;
    let page = page.clone();

    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let blocked = event
                .resource_type
                .as_ref()
                .map(is_blocked)
                .unwrap_or(false);

            let result = if blocked {
                page.execute(fetch::FailRequestParams {
                    request_id: event.request_id.clone(),
                    error_reason: chromiumoxide::cdp::browser_protocol::network::ErrorReason::BlockedByClient,
                })
                .await
                .map(|_| ())
            } else {
                page.execute(fetch::ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };

            if let Err(e) = result {
                tracing::trace!("fetch interception response failed (page likely closed): {e}");
            }
        }
    });

    Ok(())
}
