//! Bank Review Analytics - Review Collection and Insight Pipeline
//!
//! A Rust library for collecting mobile-banking app reviews, cleaning them,
//! scoring sentiment, extracting themes and turning the results into
//! persisted rows, charts and a narrative report.
//!
//! # Features
//!
//! - Paginated review collection from the app store
//! - Cleaning with duplicate, language and rating validation
//! - Lexicon sentiment scoring with an optional transformer fallback
//! - Per-bank TF-IDF keyword extraction and rule-based theming
//! - Driver / pain-point insight aggregation
//! - Idempotent PostgreSQL persistence
//! - Chart and markdown report rendering

/// Review preprocessing and validation
pub mod cleaner;
/// Review collection from the external source
pub mod collector;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Per-bank aggregation and insight generation
pub mod insights;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Chart and report artifact rendering
pub mod report;
/// Database schema definitions
pub mod schema;
/// Sentiment scoring strategies
pub mod sentiment;
/// CSV stage snapshots
pub mod snapshot;
/// Keyword extraction and theme assignment
pub mod themes;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use cleaner::Cleaner;
pub use config::AppConfig;
pub use db::Database;
pub use models::{Bank, BankInsights, Review, SentimentLabel};
pub use sentiment::{resolve_scorer, SentimentScorer};
pub use themes::ThemeExtractor;
