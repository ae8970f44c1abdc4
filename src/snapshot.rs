//! CSV snapshots written at every stage boundary.
//!
//! Each stage consumes the previous stage's snapshot and writes its own,
//! so any stage can be re-run in isolation. The shared `Review` record keeps
//! every snapshot a column superset of the one before it.

use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::Review;

/// Snapshot written by the collection stage
pub const RAW_SNAPSHOT: &str = "all_reviews_raw.csv";
/// Snapshot written by the cleaning stage
pub const PROCESSED_SNAPSHOT: &str = "reviews_processed.csv";
/// Snapshot written by the sentiment stage
pub const SENTIMENT_SNAPSHOT: &str = "reviews_with_sentiment.csv";
/// Snapshot written by the theming stage
pub const THEMES_SNAPSHOT: &str = "reviews_with_themes.csv";
/// Per-bank sentiment aggregate written by the sentiment stage
pub const SENTIMENT_BY_BANK: &str = "sentiment_by_bank.csv";
/// Per-rating sentiment aggregate written by the sentiment stage
pub const SENTIMENT_BY_RATING: &str = "sentiment_by_rating.csv";
/// Per-bank theme summary written by the theming stage
pub const THEMES_BY_BANK: &str = "themes_by_bank.csv";

/// Write a review snapshot, creating the parent directory if needed
pub fn write_reviews(path: &Path, reviews: &[Review]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    for review in reviews {
        writer.serialize(review)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = reviews.len(), "Wrote snapshot");
    Ok(())
}

/// Read a review snapshot.
///
/// A missing file is reported as a descriptive error pointing at the stage
/// that should have produced it.
pub fn read_reviews(path: &Path) -> Result<Vec<Review>> {
    if !path.exists() {
        return Err(PipelineError::SnapshotNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut reviews = Vec::new();

    for record in reader.deserialize() {
        let review: Review = record?;
        reviews.push(review);
    }

    info!(path = %path.display(), rows = reviews.len(), "Read snapshot");
    Ok(reviews)
}

/// Read the newest available review snapshot from the candidate list.
///
/// Later stages prefer the richest snapshot but can fall back to an earlier
/// one, matching the original pipeline's loading order.
pub fn read_first_available<P: AsRef<Path>>(candidates: &[P]) -> Result<Vec<Review>> {
    for path in candidates {
        if path.as_ref().exists() {
            return read_reviews(path.as_ref());
        }
    }

    let tried = candidates
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(PipelineError::SnapshotNotFound(tried))
}

/// Write a generic aggregate table (theme summaries, sentiment rollups)
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote aggregate table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn review(id: i32) -> Review {
        Review {
            review_id: id,
            bank: "Dashen Bank".to_string(),
            app_name: "Dashen Mobile".to_string(),
            text: "Fast transfers, occasional login issues".to_string(),
            rating: 4,
            review_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            source: "Google Play Store".to_string(),
            user_name: "Anonymous".to_string(),
            thumbs_up: 3,
            sentiment_label: Some(SentimentLabel::Positive),
            sentiment_score: Some(0.62),
            theme: Some("Transaction Performance".to_string()),
            keywords: vec!["transfers".to_string(), "login issues".to_string()],
        }
    }

    #[test]
    fn test_round_trip_preserves_analysis_fields() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join(THEMES_SNAPSHOT);

        let original = vec![review(1), review(2)];
        write_reviews(&path, &original).expect("write failed");
        let loaded = read_reviews(&path).expect("read failed");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].review_id, 1);
        assert_eq!(loaded[0].sentiment_label, Some(SentimentLabel::Positive));
        assert_eq!(loaded[0].theme.as_deref(), Some("Transaction Performance"));
        // Keyword order survives the comma-joined column
        assert_eq!(loaded[0].keywords, original[0].keywords);
    }

    #[test]
    fn test_raw_snapshot_reads_back_with_empty_analysis_fields() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join(RAW_SNAPSHOT);

        let mut raw = review(1);
        raw.sentiment_label = None;
        raw.sentiment_score = None;
        raw.theme = None;
        raw.keywords = Vec::new();

        write_reviews(&path, &[raw]).expect("write failed");
        let loaded = read_reviews(&path).expect("read failed");

        assert!(loaded[0].sentiment_label.is_none());
        assert!(loaded[0].sentiment_score.is_none());
        assert!(loaded[0].theme.is_none());
        assert!(loaded[0].keywords.is_empty());
    }

    #[test]
    fn test_missing_snapshot_is_a_descriptive_error() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("missing.csv");

        let err = read_reviews(&path).expect_err("expected an error");
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_fallback_chain_prefers_richer_snapshot() {
        let dir = tempdir().expect("Failed to create temp directory");
        let themed = dir.path().join(THEMES_SNAPSHOT);
        let processed = dir.path().join(PROCESSED_SNAPSHOT);

        write_reviews(&processed, &[review(1)]).expect("write failed");
        let loaded = read_first_available(&[&themed, &processed]).expect("read failed");
        assert_eq!(loaded.len(), 1);

        write_reviews(&themed, &[review(1), review(2)]).expect("write failed");
        let loaded = read_first_available(&[&themed, &processed]).expect("read failed");
        assert_eq!(loaded.len(), 2);
    }
}
