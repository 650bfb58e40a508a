use std::time::Duration;

use adscan_classify::{classify, classify_http_status};
use adscan_core::{ErrorPhase, PayloadOptions, PayloadResult, TaskResult};
use chromiumoxide::browser::Browser;
use chrono::Utc;
use tokio::sync::watch;

use crate::fatal::classify_fatal;
use crate::{blocking, detach, launch, payload, status};

#[derive(Debug, Clone)]
pub struct PageTaskConfig {
    pub soft_timeout: Duration,
    pub settle: Duration,
    pub crash_probe_hz: f64,
    pub user_agent: String,
}

/// Runs one URL through the page-task contract of §4.7. Callers are
/// expected to wrap this in their own hard-timeout race (§4.6); this
/// function only owns the soft timeout around navigation+settle.
pub async fn run(browser: &Browser, url: &str, options: &PayloadOptions, config: &PageTaskConfig) -> TaskResult {
    let page = match browser.new_page("about:blank").await {
        Ok(p) => p,
        Err(e) => return error_result(url, ErrorPhase::Navigation, &e.to_string()),
    };

    if let Err(e) = launch::apply_stealth(&page, &config.user_agent).await {
        return error_result(url, ErrorPhase::Navigation, &e.to_string());
    }
    if let Err(e) = blocking::enable_resource_blocking(&page).await {
        return error_result(url, ErrorPhase::Navigation, &e.to_string());
    }

    let mut status_rx = match status::spawn_main_document_status(&page).await {
        Ok(rx) => rx,
        Err(e) => return error_result(url, ErrorPhase::Navigation, &e.to_string()),
    };
    let mut crash_rx = detach::spawn_crash_probe(page.clone(), config.crash_probe_hz);

    let settle = config.settle;
    let nav_url = url.to_string();
    let navigate_and_settle = async move {
        page.goto(&nav_url).await.map_err(|e| e.to_string())?;
        page.wait_for_navigation().await.map_err(|e| e.to_string())?;
        tokio::time::sleep(settle).await;
        Ok::<_, String>(page)
    };

    let page = tokio::select! {
        res = tokio::time::timeout(config.soft_timeout, navigate_and_settle) => {
            match res {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => return error_result(url, ErrorPhase::Navigation, &e),
                Err(_) => {
                    return error_result(url, ErrorPhase::Navigation, "Navigation timeout exceeded");
                }
            }
        }
        _ = wait_for_crash(&mut crash_rx) => {
            return error_result(url, ErrorPhase::Navigation, "Target closed");
        }
    };

    if let Some(status_code) = *status_rx.borrow() {
        if status_code >= 400 {
            let detailed = classify_http_status(status_code, url, ErrorPhase::Navigation);
            let _ = page.close().await;
            return TaskResult::Error {
                url: url.to_string(),
                code: detailed.code.clone(),
                message: detailed.message.clone(),
                stack: None,
                detailed: Some(detailed),
            };
        }
    }

    let script = match payload::render(options) {
        Ok(s) => s,
        Err(e) => {
            let _ = page.close().await;
            return error_result(url, ErrorPhase::Extraction, &format!("failed to build extraction payload: {e}"));
        }
    };

    let eval_result = page.evaluate(script.as_str()).await;
    let _ = page.close().await;

    let eval_result = match eval_result {
        Ok(v) => v,
        Err(e) => return error_result(url, ErrorPhase::Extraction, &e.to_string()),
    };

    let payload_result: PayloadResult = match eval_result.into_value() {
        Ok(v) => v,
        Err(e) => {
            return error_result(url, ErrorPhase::Extraction, &format!("payload returned unparseable result: {e}"));
        }
    };

    let date = Utc::now().format("%Y-%m-%d").to_string();
    let data = payload_result.into_page_data(url.to_string(), date);

    if data.is_success() {
        TaskResult::Success { data }
    } else {
        TaskResult::NoData { url: url.to_string() }
    }
}

async fn wait_for_crash(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn error_result(url: &str, phase: ErrorPhase, raw: &str) -> TaskResult {
    let detailed = classify_fatal(raw, url, phase).unwrap_or_else(|| classify(raw, url, phase));
    TaskResult::Error {
        url: url.to_string(),
        code: detailed.code.clone(),
        message: detailed.message.clone(),
        stack: None,
        detailed: Some(detailed),
    }
}
