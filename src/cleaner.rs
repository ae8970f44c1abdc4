//! Review preprocessing: normalization, deduplication and validation.
//!
//! Every record that fails a check is dropped and tallied, never propagated
//! as an error; the stage reports its drop rate against the <5% quality KPI.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;
use whatlang::{detect, Lang};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{CleaningReport, Review};

/// Date formats accepted from the review source, tried in order
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Text cleaner and record validator for raw reviews
pub struct Cleaner {
    markup_regex: Regex,
    extra_spaces_regex: Regex,
    language_confidence: f64,
}

impl Cleaner {
    /// Create a new cleaner from the analysis configuration
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let markup_regex = Regex::new(r"<[^>]+>")
            .map_err(|e| anyhow::anyhow!("Failed to compile markup regex: {e}"))?;
        let extra_spaces_regex = Regex::new(r"\s+")
            .map_err(|e| anyhow::anyhow!("Failed to compile spaces regex: {e}"))?;

        Ok(Self {
            markup_regex,
            extra_spaces_regex,
            language_confidence: config.language_confidence,
        })
    }

    /// Normalize a single review text.
    ///
    /// Strips markup and control characters and collapses whitespace. Case is
    /// preserved for display; matching stages lowercase on their own.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        // Normalize Unicode characters
        let normalized = text.nfc().collect::<String>();

        // Remove HTML tags and entities left over from the source payload
        let no_markup = self.markup_regex.replace_all(&normalized, " ");

        // Replace control characters with spaces
        let no_control: String = no_markup
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        // Normalize whitespace
        let collapsed = self.extra_spaces_regex.replace_all(&no_control, " ");

        collapsed.trim().to_string()
    }

    /// Parse a review date from the formats the source emits.
    ///
    /// Unparseable dates fall back to the supplied date, matching the
    /// behaviour of the collection run itself.
    #[must_use]
    pub fn parse_review_date(raw: &str, fallback: NaiveDate) -> NaiveDate {
        let trimmed = raw.trim();

        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return dt.date();
            }
        }

        let first_token = trimmed.split_whitespace().next().unwrap_or(trimmed);
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(first_token, fmt) {
                return date;
            }
        }

        fallback
    }

    /// True unless the text is confidently written in a non-English language
    fn is_probably_english(&self, text: &str) -> bool {
        match detect(text) {
            Some(info) if info.lang() != Lang::Eng => {
                info.confidence() < self.language_confidence
            }
            _ => true,
        }
    }

    /// Clean a raw review set.
    ///
    /// Returns the validated set plus the drop tallies. The surviving records
    /// keep the identifier space of the input minus dropped records.
    #[must_use]
    pub fn clean(&self, reviews: Vec<Review>, today: NaiveDate) -> (Vec<Review>, CleaningReport) {
        let mut report = CleaningReport {
            input: reviews.len(),
            ..CleaningReport::default()
        };

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut cleaned = Vec::with_capacity(reviews.len());

        for mut review in reviews {
            review.text = self.clean_text(&review.text);

            if review.text.is_empty() {
                report.empty_text += 1;
                debug!(review_id = review.review_id, "Dropping empty review");
                continue;
            }

            if !(1..=5).contains(&review.rating) {
                report.invalid_rating += 1;
                debug!(
                    review_id = review.review_id,
                    rating = review.rating,
                    "Dropping review with invalid rating"
                );
                continue;
            }

            if !self.is_probably_english(&review.text) {
                report.non_english += 1;
                debug!(review_id = review.review_id, "Dropping non-English review");
                continue;
            }

            let key = (review.text.to_lowercase(), review.bank.clone());
            if !seen.insert(key) {
                report.duplicates += 1;
                continue;
            }

            // Dates from the future are normalized to the run date
            if review.review_date > today {
                review.review_date = today;
            }

            cleaned.push(review);
        }

        report.output = cleaned.len();
        info!(
            input = report.input,
            output = report.output,
            duplicates = report.duplicates,
            empty_text = report.empty_text,
            invalid_rating = report.invalid_rating,
            non_english = report.non_english,
            "Cleaning complete"
        );

        (cleaned, report)
    }
}
