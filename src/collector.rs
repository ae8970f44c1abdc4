//! Review collection from the external store.
//!
//! The source is an external collaborator returning paginated review
//! records; the collector inserts a courtesy delay between pages and treats
//! every per-app failure as recoverable. Reviews receive their stable
//! sequential identifiers here, at collection time.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{BankApp, ScraperConfig};
use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::models::Review;
use crate::validation::InputValidator;

/// Store metadata for a configured app, used as a pre-flight probe
#[derive(Debug, Clone)]
pub struct AppInfo {
    /// App title as listed in the store
    pub title: String,
}

/// One review as returned by the source, before id assignment
#[derive(Debug, Clone)]
pub struct RawReviewEntry {
    /// Source-side review identifier
    pub source_id: String,
    /// Reviewer display name
    pub user_name: String,
    /// Review text
    pub text: String,
    /// Star rating
    pub rating: i64,
    /// Unix timestamp of the review, seconds
    pub timestamp_secs: i64,
    /// Helpfulness votes
    pub thumbs_up: i64,
}

/// One page of source results
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    /// Reviews on this page
    pub entries: Vec<RawReviewEntry>,
    /// Token for the next page, absent on the last page
    pub continuation: Option<String>,
}

/// External review source, paginated per app identifier
#[async_trait]
pub trait ReviewSource {
    /// Probe the store for app metadata; `None` when the app is not found
    async fn app_info(&self, app_id: &str) -> Result<Option<AppInfo>>;

    /// Fetch one page of reviews, newest first
    async fn fetch_page(
        &self,
        app_id: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<ReviewPage>;
}

/// Google Play implementation of the review source
pub struct GooglePlaySource {
    client: reqwest::Client,
    language: String,
    country: String,
}

/// Batch endpoint serving the store's review listings
const BATCH_URL: &str = "https://play.google.com/_/PlayStoreUi/data/batchexecute";
/// Store page used for the app-info probe
const DETAILS_URL: &str = "https://play.google.com/store/apps/details";
/// Sort order 2 = newest first
const SORT_NEWEST: u8 = 2;

impl GooglePlaySource {
    /// Build a source for the configured store locale
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .map_err(PipelineError::from)?;

        Ok(Self {
            client,
            language: config.language.clone(),
            country: config.country.clone(),
        })
    }

    /// Inner request payload for the review listing RPC
    fn review_request_body(app_id: &str, count: usize, token: Option<&str>) -> String {
        let paging = match token {
            Some(token) => format!("[{count},null,\"{token}\"]"),
            None => format!("[{count},null,null]"),
        };
        let inner = format!(
            "[null,null,[2,{SORT_NEWEST},{paging},null,[]],[\"{app_id}\",7]]"
        );
        let envelope = serde_json::json!([[["UsvDTd", inner, Value::Null, "generic"]]]);
        format!("f.req={}", urlencoding::encode(&envelope.to_string()))
    }
}

/// Parse the anti-JSON-hijacking envelope of a batch response into the
/// review entries and the continuation token.
///
/// The payload is deeply nested and undocumented, so every access is
/// defensive: malformed entries are skipped, not fatal.
pub fn parse_review_page(body: &str) -> Result<ReviewPage> {
    let stripped = body.trim_start_matches(")]}'").trim_start();
    let envelope: Value = serde_json::from_str(stripped)
        .map_err(|e| PipelineError::Source(format!("Unparseable batch envelope: {e}")))?;

    // envelope[0][2] is a JSON string holding the actual result
    let inner_raw = envelope
        .get(0)
        .and_then(|v| v.get(2))
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::Source("Batch envelope missing payload".to_string()))?;

    let inner: Value = serde_json::from_str(inner_raw)
        .map_err(|e| PipelineError::Source(format!("Unparseable review payload: {e}")))?;

    let mut page = ReviewPage::default();

    if let Some(items) = inner.get(0).and_then(Value::as_array) {
        for item in items {
            if let Some(entry) = parse_review_entry(item) {
                page.entries.push(entry);
            }
        }
    }

    page.continuation = inner
        .as_array()
        .and_then(|arr| arr.last())
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.last())
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Ok(page)
}

/// Field positions within one review item of the batch payload
fn parse_review_entry(item: &Value) -> Option<RawReviewEntry> {
    let source_id = item.get(0)?.as_str()?.to_string();
    let user_name = item
        .get(1)
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("Anonymous")
        .to_string();
    let rating = item.get(2)?.as_i64()?;
    let text = item.get(4).and_then(Value::as_str).unwrap_or("").to_string();
    let timestamp_secs = item
        .get(5)
        .and_then(|v| v.get(0))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let thumbs_up = item.get(6).and_then(Value::as_i64).unwrap_or(0);

    Some(RawReviewEntry {
        source_id,
        user_name,
        text,
        rating,
        timestamp_secs,
        thumbs_up,
    })
}

#[async_trait]
impl ReviewSource for GooglePlaySource {
    async fn app_info(&self, app_id: &str) -> Result<Option<AppInfo>> {
        let response = self
            .client
            .get(DETAILS_URL)
            .query(&[("id", app_id), ("hl", self.language.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let body = response.text().await?;
        let title_regex = Regex::new(r"<title[^>]*>([^<]+)</title>")
            .map_err(|e| anyhow::anyhow!("Failed to compile title regex: {e}"))?;

        let title = title_regex
            .captures(&body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches(" - Apps on Google Play").trim().to_string());

        Ok(title.map(|title| AppInfo { title }))
    }

    async fn fetch_page(
        &self,
        app_id: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<ReviewPage> {
        let body = Self::review_request_body(app_id, count, token);

        let response = self
            .client
            .post(BATCH_URL)
            .query(&[
                ("hl", self.language.as_str()),
                ("gl", self.country.as_str()),
            ])
            .header(
                "content-type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Source(format!(
                "Review listing for {app_id} returned HTTP {}",
                response.status()
            )));
        }

        parse_review_page(&response.text().await?)
    }
}

/// Collect reviews for every configured app.
///
/// Per-app failures are recorded and skipped; the pipeline continues with
/// whatever was fetched. Errors only when no app yielded any review at all.
pub async fn collect_reviews(
    source: &dyn ReviewSource,
    config: &ScraperConfig,
    metrics: &PipelineMetrics,
    today: NaiveDate,
) -> Result<Vec<Review>> {
    let mut all_reviews = Vec::new();
    let mut next_id = 1;

    for app in &config.apps {
        InputValidator::validate_app_id(&app.app_id)?;

        match source.app_info(&app.app_id).await {
            Ok(Some(info)) => info!(bank = %app.bank_name, title = %info.title, "App found"),
            Ok(None) => warn!(bank = %app.bank_name, app_id = %app.app_id, "Could not verify app, continuing anyway"),
            Err(e) => warn!(bank = %app.bank_name, error = %e, "App info probe failed, continuing anyway"),
        }

        let entries = collect_app_reviews(source, config, app, metrics).await;
        if entries.is_empty() {
            warn!(bank = %app.bank_name, "No reviews collected");
            continue;
        }

        for entry in entries {
            all_reviews.push(entry_to_review(entry, app, config, next_id, today));
            next_id += 1;
        }
    }

    if all_reviews.is_empty() {
        return Err(PipelineError::Source(
            "No reviews were collected from any configured app".to_string(),
        ));
    }

    info!(total = all_reviews.len(), "Collection complete");
    Ok(all_reviews)
}

/// Paginate one app up to the configured target, with the courtesy delay
/// between pages
async fn collect_app_reviews(
    source: &dyn ReviewSource,
    config: &ScraperConfig,
    app: &BankApp,
    metrics: &PipelineMetrics,
) -> Vec<RawReviewEntry> {
    let mut entries: Vec<RawReviewEntry> = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;

    info!(bank = %app.bank_name, app_id = %app.app_id, "Scraping reviews");

    while entries.len() < config.target_reviews_per_bank {
        let remaining = config.target_reviews_per_bank - entries.len();
        let batch = remaining.min(config.batch_size);

        let page = match source.fetch_page(&app.app_id, batch, token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(bank = %app.bank_name, error = %e, "Page fetch failed, keeping what we have");
                break;
            }
        };

        pages += 1;

        if page.entries.is_empty() {
            info!(bank = %app.bank_name, "No more reviews available");
            break;
        }

        entries.extend(page.entries);
        info!(bank = %app.bank_name, collected = entries.len(), "Collected reviews so far");

        match page.continuation {
            Some(next) => token = Some(next),
            None => break,
        }

        // Rate limiting - be respectful
        sleep(Duration::from_secs(config.page_delay_secs)).await;
    }

    entries.truncate(config.target_reviews_per_bank);
    metrics.record_collection(&app.bank_name, entries.len(), pages);
    entries
}

/// Assign the run-stable identifier and map a source entry onto the
/// pipeline's review record
fn entry_to_review(
    entry: RawReviewEntry,
    app: &BankApp,
    config: &ScraperConfig,
    review_id: i32,
    today: NaiveDate,
) -> Review {
    let review_date = DateTime::from_timestamp(entry.timestamp_secs, 0)
        .map_or(today, |dt| dt.date_naive());

    Review {
        review_id,
        bank: app.bank_name.clone(),
        app_name: app.app_name.clone(),
        text: entry.text,
        rating: i32::try_from(entry.rating).unwrap_or(0),
        review_date,
        source: config.source_label.clone(),
        user_name: InputValidator::sanitize_text(&entry.user_name),
        thumbs_up: entry.thumbs_up,
        sentiment_label: None,
        sentiment_score: None,
        theme: None,
        keywords: Vec::new(),
    }
}
