use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics collection and management for pipeline stages
#[derive(Debug, Clone, Copy)]
pub struct PipelineMetrics {
    // Collection metrics
    pub reviews_collected_total: &'static str,
    pub collection_pages_total: &'static str,

    // Cleaning metrics
    pub reviews_dropped_total: &'static str,
    pub reviews_cleaned_total: &'static str,

    // Analysis metrics
    pub reviews_scored_total: &'static str,
    pub sentiment_scores: &'static str,
    pub reviews_themed_total: &'static str,

    // Persistence metrics
    pub db_upserts_total: &'static str,
    pub db_row_failures_total: &'static str,

    // Reporting metrics
    pub artifacts_written_total: &'static str,
    pub artifact_failures_total: &'static str,

    // Stage timing
    pub stage_duration: &'static str,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            reviews_collected_total: "bank_reviews_collected_total",
            collection_pages_total: "bank_reviews_collection_pages_total",

            reviews_dropped_total: "bank_reviews_dropped_total",
            reviews_cleaned_total: "bank_reviews_cleaned_total",

            reviews_scored_total: "bank_reviews_scored_total",
            sentiment_scores: "bank_reviews_sentiment_scores",
            reviews_themed_total: "bank_reviews_themed_total",

            db_upserts_total: "bank_reviews_db_upserts_total",
            db_row_failures_total: "bank_reviews_db_row_failures_total",

            artifacts_written_total: "bank_reviews_artifacts_written_total",
            artifact_failures_total: "bank_reviews_artifact_failures_total",

            stage_duration: "bank_reviews_stage_duration_seconds",
        }
    }
}

impl PipelineMetrics {
    /// Record reviews fetched from the external source
    pub fn record_collection(&self, bank: &str, reviews: usize, pages: usize) {
        counter!(self.reviews_collected_total, "bank" => bank.to_string())
            .increment(reviews as u64);
        counter!(self.collection_pages_total, "bank" => bank.to_string()).increment(pages as u64);
    }

    /// Record a dropped record with the reason it was excluded
    pub fn record_drop(&self, reason: &'static str, count: usize) {
        counter!(self.reviews_dropped_total, "reason" => reason).increment(count as u64);
    }

    /// Record cleaned output size
    pub fn record_cleaned(&self, count: usize) {
        counter!(self.reviews_cleaned_total).increment(count as u64);
    }

    /// Record a sentiment score produced by the active scorer
    pub fn record_sentiment(&self, scorer: &'static str, score: f64) {
        counter!(self.reviews_scored_total, "scorer" => scorer).increment(1);
        histogram!(self.sentiment_scores).record(score);
    }

    /// Record themed reviews
    pub fn record_themed(&self, count: usize) {
        counter!(self.reviews_themed_total).increment(count as u64);
    }

    /// Record a persistence batch outcome
    pub fn record_persistence(&self, inserted: usize, failed: usize) {
        counter!(self.db_upserts_total, "status" => "success").increment(inserted as u64);
        counter!(self.db_upserts_total, "status" => "error").increment(failed as u64);
        if failed > 0 {
            counter!(self.db_row_failures_total).increment(failed as u64);
        }
    }

    /// Record a report artifact outcome
    pub fn record_artifact(&self, artifact: &str, success: bool) {
        if success {
            counter!(self.artifacts_written_total, "artifact" => artifact.to_string())
                .increment(1);
        } else {
            counter!(self.artifact_failures_total, "artifact" => artifact.to_string())
                .increment(1);
        }
    }

    /// Record how long a stage took
    pub fn record_stage(&self, stage: &'static str, duration: Duration) {
        histogram!(self.stage_duration, "stage" => stage).record(duration.as_secs_f64());
    }

    /// Record the size of the active connection pool
    pub fn record_pool_size(&self, size: u32) {
        gauge!("bank_reviews_db_connection_pool_size").set(f64::from(size));
    }
}

/// Timer that reports a stage duration when finished
pub struct StageTimer {
    metrics: PipelineMetrics,
    stage: &'static str,
    start: std::time::Instant,
}

impl StageTimer {
    #[must_use]
    pub fn new(metrics: PipelineMetrics, stage: &'static str) -> Self {
        Self {
            metrics,
            stage,
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self) {
        self.metrics.record_stage(self.stage, self.start.elapsed());
    }
}
