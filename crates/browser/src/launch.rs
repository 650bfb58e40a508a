use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{error, trace};

use crate::error::BrowserError;

/// Launch one browser instance per spec.md §4.6's "fresh browser context
/// per worker lifetime". Stealth args mirror a real desktop Chrome.
pub async fn launch(headless: bool, user_agent: &str) -> Result<Browser, BrowserError> {
    let mut builder = BrowserConfig::builder()
        .window_size(1920, 1080)
        .arg(format!("--user-agent={user_agent}"))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--mute-audio");

    builder = if headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let browser_config = builder
        .build()
        .map_err(|e| BrowserError::Launch(format!("failed to configure browser: {e}")))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                error!("browser handler error: {e}");
            }
        }
        trace!("browser handler task exiting");
    });

    Ok(browser)
}

/// Remove `navigator.webdriver` and set a consistent user agent before any
/// navigation (§4.6 stealth requirement).
pub async fn apply_stealth(page: &Page, user_agent: &str) -> Result<(), BrowserError> {
    page.evaluate(
        r#"Object.defineProperty(navigator, 'webdriver', { get: () => false });"#,
    )
    .await
    .map_err(|e| BrowserError::Other(anyhow::anyhow!("stealth injection failed: {e}")))?;

    page.evaluate(format!(
        "Object.defineProperty(navigator, 'userAgent', {{ get: () => '{user_agent}' }});"
    ))
    .await
    .map_err(|e| BrowserError::Other(anyhow::anyhow!("user-agent spoof failed: {e}")))?;

    Ok(())
}
