use std::collections::HashMap;
use std::str::FromStr;

use adscan_core::{canonicalize_url, RecordStatus, UrlRecord};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::TrackerError;
use crate::types::{Outcome, RangeAnalysis, RangeSuggestion, VerifyResult};

const MAX_MISSING_URLS: usize = 50;

/// Persistent, single-writer key-value store of canonical_url → UrlRecord
/// (§4.3). Backed by an embedded SQLite file rather than a networked
/// database, matching §6's "opaque single-file key-value/SQL DB" contract.
pub struct Tracker {
    pool: SqlitePool,
    // Serializes write operations at the application level on top of
    // SQLite's own single-writer semantics, so a bulk `filter_unprocessed`
    // read never interleaves with a `mark_result` write mid-transaction.
    write_lock: Mutex<()>,
}

impl Tracker {
    pub async fn open(db_path: &str) -> Result<Self, TrackerError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))
            .map_err(|e| TrackerError::Unopenable(e.to_string()))?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| TrackerError::Unopenable(e.to_string()))?;

        sqlx::raw_sql("PRAGMA journal_mode=WAL;").execute(&pool).await?;
        sqlx::raw_sql(include_str!("../migrations/001_init.sql"))
            .execute(&pool)
            .await?;

        info!(db_path, "tracker store ready");
        Ok(Self { pool, write_lock: Mutex::new(()) })
    }

    pub async fn is_processed(&self, url: &str) -> Result<bool, TrackerError> {
        let canonical = canonicalize_url(url).unwrap_or_else(|_| url.to_string());
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM url_records WHERE url = ?")
                .bind(&canonical)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row
            .and_then(|(s,)| parse_status(&s))
            .map(RecordStatus::is_processed)
            .unwrap_or(false))
    }

    /// Order-preserving filter; executes as a single bulk read.
    pub async fn filter_unprocessed(&self, urls: &[String]) -> Result<Vec<String>, TrackerError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let canonical: Vec<String> = urls
            .iter()
            .map(|u| canonicalize_url(u).unwrap_or_else(|_| u.clone()))
            .collect();

        let placeholders = std::iter::repeat("?").take(canonical.len()).collect::<Vec<_>>().join(",");
        let query = format!("SELECT url, status FROM url_records WHERE url IN ({placeholders})");
        let mut q = sqlx::query_as::<_, (String, String)>(&query);
        for c in &canonical {
            q = q.bind(c);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let processed: std::collections::HashSet<String> = rows
            .into_iter()
            .filter_map(|(url, status)| parse_status(&status).filter(|s| s.is_processed()).map(|_| url))
            .collect();

        Ok(urls
            .iter()
            .zip(canonical.iter())
            .filter(|(_, c)| !processed.contains(*c))
            .map(|(orig, _)| orig.clone())
            .collect())
    }

    pub async fn mark_result(&self, url: &str, outcome: Outcome) -> Result<(), TrackerError> {
        let canonical = canonicalize_url(url).unwrap_or_else(|_| url.to_string());
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();

        let (status, error_code) = match outcome {
            Outcome::Success => (RecordStatus::Success, None),
            Outcome::NoData => (RecordStatus::NoData, None),
            Outcome::Error { code, permanent } => {
                let status = if permanent {
                    RecordStatus::ErrorPermanent
                } else {
                    RecordStatus::ErrorTransient
                };
                (status, Some(code))
            }
        };

        sqlx::query(
            r#"
            INSERT INTO url_records (url, status, error_code, attempts, first_seen, last_attempt)
            VALUES (?, ?, ?, 1, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                error_code = excluded.error_code,
                attempts = url_records.attempts + 1,
                last_attempt = excluded.last_attempt
            "#,
        )
        .bind(&canonical)
        .bind(status.as_str())
        .bind(&error_code)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_stats(&self) -> Result<HashMap<String, i64>, TrackerError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM url_records GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn analyze_range(
        &self,
        start: u64,
        end: u64,
        full_list: &[String],
    ) -> Result<RangeAnalysis, TrackerError> {
        let len = full_list.len() as u64;
        let start = start.max(1);
        let end = end.min(len);
        if start > end || full_list.is_empty() {
            return Ok(RangeAnalysis {
                total_in_range: 0,
                processed_count: 0,
                unprocessed_count: 0,
                processed_percentage: 0.0,
                is_fully_processed: true,
            });
        }
        let slice = &full_list[(start - 1) as usize..end as usize];
        let unprocessed = self.filter_unprocessed(slice).await?;
        let total = slice.len() as u64;
        let unprocessed_count = unprocessed.len() as u64;
        let processed_count = total - unprocessed_count;
        let processed_percentage = if total == 0 {
            0.0
        } else {
            (processed_count as f64 / total as f64) * 100.0
        };
        Ok(RangeAnalysis {
            total_in_range: total,
            processed_count,
            unprocessed_count,
            processed_percentage,
            is_fully_processed: unprocessed_count == 0,
        })
    }

    pub async fn suggest_next_ranges(
        &self,
        full_list: &[String],
        window_size: usize,
        k: usize,
    ) -> Result<Vec<RangeSuggestion>, TrackerError> {
        if window_size == 0 || full_list.is_empty() {
            return Ok(Vec::new());
        }
        let mut suggestions = Vec::new();
        let mut pos = 0usize;
        while pos < full_list.len() {
            let end = (pos + window_size).min(full_list.len());
            let window = &full_list[pos..end];
            let unprocessed = self.filter_unprocessed(window).await?;
            let fraction = unprocessed.len() as f64 / window.len() as f64;
            suggestions.push(RangeSuggestion {
                start: (pos + 1) as u64,
                end: end as u64,
                unprocessed_fraction: fraction,
            });
            pos += window_size;
        }
        suggestions.sort_by(|a, b| b.unprocessed_fraction.partial_cmp(&a.unprocessed_fraction).unwrap());
        suggestions.truncate(k);
        Ok(suggestions)
    }

    pub async fn verify_urls(&self, urls: &[String]) -> Result<VerifyResult, TrackerError> {
        let unprocessed_or_absent = self.filter_unprocessed(urls).await?;
        // filter_unprocessed tells us what's NOT processed; absence from the
        // tracker entirely is a stronger signal we check explicitly below.
        let canonical: Vec<String> = urls
            .iter()
            .map(|u| canonicalize_url(u).unwrap_or_else(|_| u.clone()))
            .collect();
        if canonical.is_empty() {
            return Ok(VerifyResult { found_in_db: 0, missing_from_db: 0, missing_urls: Vec::new() });
        }
        let placeholders = std::iter::repeat("?").take(canonical.len()).collect::<Vec<_>>().join(",");
        let query = format!("SELECT url FROM url_records WHERE url IN ({placeholders})");
        let mut q = sqlx::query_as::<_, (String,)>(&query);
        for c in &canonical {
            q = q.bind(c);
        }
        let present: std::collections::HashSet<String> =
            q.fetch_all(&self.pool).await?.into_iter().map(|(u,)| u).collect();

        let missing: Vec<String> = urls
            .iter()
            .zip(canonical.iter())
            .filter(|(_, c)| !present.contains(*c))
            .map(|(orig, _)| orig.clone())
            .collect();

        let _ = unprocessed_or_absent;
        Ok(VerifyResult {
            found_in_db: (urls.len() - missing.len()) as u64,
            missing_from_db: missing.len() as u64,
            missing_urls: missing.into_iter().take(MAX_MISSING_URLS).collect(),
        })
    }

    pub async fn reset(&self) -> Result<(), TrackerError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("DELETE FROM url_records").execute(&self.pool).await?;
        Ok(())
    }

    /// Bulk-insert helper used by `importExistingResults` (§4.3) and by
    /// tests. Marks every URL as `success` in one transaction.
    pub async fn mark_all_success(&self, urls: &[String]) -> Result<u64, TrackerError> {
        if urls.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut count = 0u64;
        for url in urls {
            let canonical = canonicalize_url(url).unwrap_or_else(|_| url.clone());
            sqlx::query(
                r#"
                INSERT INTO url_records (url, status, error_code, attempts, first_seen, last_attempt)
                VALUES (?, 'success', NULL, 1, ?, ?)
                ON CONFLICT(url) DO UPDATE SET
                    status = 'success',
                    error_code = NULL,
                    last_attempt = excluded.last_attempt
                "#,
            )
            .bind(&canonical)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            count += 1;
        }
        tx.commit().await?;
        Ok(count)
    }

    /// Read back a single record, e.g. for the browser pool's per-URL retry
    /// ceiling (§4.6: a URL that has failed `maxRetries` times this run is
    /// skipped with `MAX_RETRIES_EXCEEDED` without further work).
    pub async fn get_record(&self, url: &str) -> Result<Option<UrlRecord>, TrackerError> {
        let canonical = canonicalize_url(url).unwrap_or_else(|_| url.to_string());
        let row: Option<(String, String, Option<String>, i64, String, String)> = sqlx::query_as(
            "SELECT url, status, error_code, attempts, first_seen, last_attempt FROM url_records WHERE url = ?",
        )
        .bind(&canonical)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(url, status, error_code, attempts, first_seen, last_attempt)| {
            Some(UrlRecord {
                url,
                status: parse_status(&status)?,
                error_code,
                attempts: attempts as u32,
                first_seen: first_seen.parse().ok()?,
                last_attempt: last_attempt.parse().ok()?,
            })
        }))
    }
}

fn parse_status(s: &str) -> Option<RecordStatus> {
    match s {
        "success" => Some(RecordStatus::Success),
        "no_data" => Some(RecordStatus::NoData),
        "error_transient" => Some(RecordStatus::ErrorTransient),
        "error_permanent" => Some(RecordStatus::ErrorPermanent),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_tracker() -> Tracker {
        let path = std::env::temp_dir().join(format!("adscan-tracker-test-{}.db", uuid_like()));
        Tracker::open(path.to_str().unwrap()).await.unwrap()
    }

    fn uuid_like() -> String {
        format!("{}-{:?}", std::process::id(), std::time::Instant::now())
    }

    #[tokio::test]
    async fn mark_success_then_is_processed() {
        let tracker = temp_tracker().await;
        assert!(!tracker.is_processed("https://a.com").await.unwrap());
        tracker.mark_result("https://a.com", Outcome::Success).await.unwrap();
        assert!(tracker.is_processed("https://a.com").await.unwrap());
    }

    #[tokio::test]
    async fn transient_is_not_processed_permanent_is() {
        let tracker = temp_tracker().await;
        tracker
            .mark_result("https://a.com", Outcome::Error { code: "HARD_TIMEOUT".into(), permanent: false })
            .await
            .unwrap();
        assert!(!tracker.is_processed("https://a.com").await.unwrap());

        tracker
            .mark_result("https://b.com", Outcome::Error { code: "DNS_RESOLUTION_FAILED".into(), permanent: true })
            .await
            .unwrap();
        assert!(tracker.is_processed("https://b.com").await.unwrap());
    }

    #[tokio::test]
    async fn transient_erasable_by_later_success() {
        let tracker = temp_tracker().await;
        tracker
            .mark_result("https://a.com", Outcome::Error { code: "HARD_TIMEOUT".into(), permanent: false })
            .await
            .unwrap();
        tracker.mark_result("https://a.com", Outcome::Success).await.unwrap();
        let record = tracker.get_record("https://a.com").await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Success);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn filter_unprocessed_preserves_order() {
        let tracker = temp_tracker().await;
        tracker.mark_result("https://b.com", Outcome::Success).await.unwrap();
        let input = vec!["https://a.com".to_string(), "https://b.com".to_string(), "https://c.com".to_string()];
        let unprocessed = tracker.filter_unprocessed(&input).await.unwrap();
        assert_eq!(unprocessed, vec!["https://a.com".to_string(), "https://c.com".to_string()]);
    }

    #[tokio::test]
    async fn reset_clears_all_records() {
        let tracker = temp_tracker().await;
        tracker.mark_result("https://a.com", Outcome::Success).await.unwrap();
        tracker.reset().await.unwrap();
        assert!(!tracker.is_processed("https://a.com").await.unwrap());
    }
}
