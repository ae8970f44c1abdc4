//! Data models for review handling and analysis
//!
//! This module contains all data structures used throughout the pipeline,
//! including reviews, banks, stage reports and derived insight structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way sentiment classification for a review.
///
/// Serialized as the uppercase labels used in the CSV snapshots and the
/// `reviews.sentiment_label` database column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    /// Clearly positive wording
    #[serde(rename = "POSITIVE")]
    Positive,
    /// Clearly negative wording
    #[serde(rename = "NEGATIVE")]
    Negative,
    /// Everything in between, including unscoreable text
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

impl SentimentLabel {
    /// Label as stored in snapshots and the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single app review as it moves through the pipeline.
///
/// One struct covers every stage snapshot: analysis fields stay `None`/empty
/// until the corresponding stage has run, so each CSV is a superset of the
/// previous one by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Stable identifier assigned at collection time, unique per run
    pub review_id: i32,
    /// Name of the bank the reviewed app belongs to
    pub bank: String,
    /// Display name of the reviewed app
    pub app_name: String,
    /// Review text (raw at collection, cleaned after preprocessing)
    pub text: String,
    /// Star rating, 1-5
    pub rating: i32,
    /// Calendar date of the review
    pub review_date: NaiveDate,
    /// Provenance of the record
    pub source: String,
    /// Reviewer display name as reported by the source
    pub user_name: String,
    /// Helpfulness votes reported by the source
    pub thumbs_up: i64,
    /// Sentiment classification, populated by the scoring stage
    pub sentiment_label: Option<SentimentLabel>,
    /// Scorer confidence, populated together with the label
    pub sentiment_score: Option<f64>,
    /// Theme bucket, populated by the theming stage
    pub theme: Option<String>,
    /// Extracted keywords in descending relevance order
    #[serde(with = "keyword_list", default)]
    pub keywords: Vec<String>,
}

impl Review {
    /// Signed sentiment in [-1, 1] for aggregation, independent of whether
    /// the active scorer reports a signed compound or a [0, 1] confidence.
    #[must_use]
    pub fn signed_sentiment(&self) -> f64 {
        match (self.sentiment_label, self.sentiment_score) {
            (Some(SentimentLabel::Positive), Some(score)) => score.abs().min(1.0),
            (Some(SentimentLabel::Negative), Some(score)) => -score.abs().max(-1.0),
            _ => 0.0,
        }
    }

    /// Theme bucket name, with unthemed reviews absorbed into `Other`
    #[must_use]
    pub fn theme_or_other(&self) -> &str {
        self.theme.as_deref().filter(|t| !t.is_empty()).unwrap_or(OTHER_THEME)
    }
}

/// Bucket name for reviews matching no configured theme
pub const OTHER_THEME: &str = "Other";

/// Serialize the keyword sequence as one comma-joined CSV column,
/// the format used by the snapshots and the `reviews.keywords` column.
mod keyword_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(keywords: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&keywords.join(", "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToString::to_string)
            .collect())
    }
}

/// Database representation of a bank
#[derive(Debug, Clone)]
pub struct Bank {
    /// Database primary key
    pub bank_id: i32,
    /// Unique bank name
    pub bank_name: String,
    /// Display name of the bank's mobile app
    pub app_name: String,
}

/// Drop tallies produced by the cleaning stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    /// Records entering the stage
    pub input: usize,
    /// Duplicate (text, bank) pairs removed
    pub duplicates: usize,
    /// Records with empty text after cleaning
    pub empty_text: usize,
    /// Records with a rating outside 1-5
    pub invalid_rating: usize,
    /// Records in a confidently non-English language
    pub non_english: usize,
    /// Records surviving the stage
    pub output: usize,
}

impl CleaningReport {
    /// Total records dropped by the stage
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.duplicates + self.empty_text + self.invalid_rating + self.non_english
    }

    /// Fraction of the input that was dropped
    #[must_use]
    pub fn drop_rate(&self) -> f64 {
        if self.input == 0 {
            0.0
        } else {
            self.dropped() as f64 / self.input as f64
        }
    }

    /// Data quality KPI from the original study: under 5% of records dropped
    #[must_use]
    pub fn meets_kpi(&self) -> bool {
        self.drop_rate() < 0.05
    }
}

/// Aggregate statistics for one theme bucket within one bank
#[derive(Debug, Clone, Serialize)]
pub struct ThemeStat {
    /// Theme bucket name
    pub theme: String,
    /// Number of reviews in the bucket
    pub count: usize,
    /// Mean signed sentiment of the bucket
    pub mean_sentiment: f64,
    /// Mean star rating of the bucket
    pub mean_rating: f64,
}

/// Per-label review counts for one bank
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SentimentBreakdown {
    /// Reviews labelled positive
    pub positive: usize,
    /// Reviews labelled negative
    pub negative: usize,
    /// Reviews labelled neutral (or not yet scored)
    pub neutral: usize,
}

impl SentimentBreakdown {
    /// Total scored reviews in the breakdown
    #[must_use]
    pub const fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Full derived summary for one bank, recomputed on every insight run
#[derive(Debug, Clone, Serialize)]
pub struct BankInsights {
    /// Bank name
    pub bank: String,
    /// Total reviews analysed for the bank
    pub review_count: usize,
    /// Mean star rating
    pub avg_rating: f64,
    /// Mean signed sentiment across all reviews
    pub avg_sentiment: f64,
    /// Counts per sentiment label
    pub sentiment: SentimentBreakdown,
    /// Per-theme statistics, descending by count
    pub themes: Vec<ThemeStat>,
    /// Themes users praise: highest mean sentiment with enough support
    pub drivers: Vec<ThemeStat>,
    /// Themes users complain about: lowest mean sentiment with enough support
    pub pain_points: Vec<ThemeStat>,
}

/// One row of the per-bank sentiment aggregate snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BankSentimentRow {
    /// Bank name
    pub bank: String,
    /// Mean signed sentiment
    pub avg_sentiment: f64,
    /// Mean star rating
    pub avg_rating: f64,
    /// Number of reviews
    pub review_count: usize,
}

/// One row of the per-rating sentiment aggregate snapshot
#[derive(Debug, Clone, Serialize)]
pub struct RatingSentimentRow {
    /// Star rating, 1-5
    pub rating: i32,
    /// Mean signed sentiment at this rating
    pub avg_sentiment: f64,
    /// Number of reviews at this rating
    pub review_count: usize,
}

/// One row of the per-bank theme summary snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ThemeSummaryRow {
    /// Bank name
    pub bank: String,
    /// Theme bucket name
    pub theme: String,
    /// Number of reviews in the bucket
    pub count: usize,
    /// Share of the bank's reviews, in percent
    pub percentage: f64,
}

/// Outcome of a persistence batch
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistReport {
    /// Bank rows upserted
    pub banks: usize,
    /// Review rows upserted successfully
    pub inserted: usize,
    /// Review rows skipped after a per-row failure
    pub failed: usize,
}
