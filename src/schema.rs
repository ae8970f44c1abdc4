//! Database schema definitions
//!
//! This module provides constants for table and column names used when
//! building SQL statements, keeping the queries in `db` aligned with the
//! persisted PostgreSQL schema.

/// Banks table schema
pub mod banks {
    /// Table name
    pub const TABLE: &str = "banks";
    /// Primary key column
    pub const BANK_ID: &str = "bank_id";
    /// Unique bank name column
    pub const BANK_NAME: &str = "bank_name";
    /// App display name column
    pub const APP_NAME: &str = "app_name";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Reviews table schema
pub mod reviews {
    /// Table name
    pub const TABLE: &str = "reviews";
    /// Primary key column
    pub const REVIEW_ID: &str = "review_id";
    /// Foreign key to banks table
    pub const BANK_ID: &str = "bank_id";
    /// Review text column
    pub const REVIEW_TEXT: &str = "review_text";
    /// Star rating column
    pub const RATING: &str = "rating";
    /// Review date column
    pub const REVIEW_DATE: &str = "review_date";
    /// Sentiment label column
    pub const SENTIMENT_LABEL: &str = "sentiment_label";
    /// Sentiment score column
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    /// Theme bucket column
    pub const THEME: &str = "theme";
    /// Comma-joined keywords column
    pub const KEYWORDS: &str = "keywords";
    /// Provenance column
    pub const SOURCE: &str = "source";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}
