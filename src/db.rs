//! PostgreSQL persistence for banks and analysed reviews.
//!
//! The adapter is the sole writer in the pipeline. Bank upserts are
//! idempotent on the unique bank name, review upserts on the collection-time
//! review id, so re-persisting a snapshot leaves one row per review with the
//! latest values. A failure on one row is counted and skipped, never fatal
//! to the batch.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{Bank, PersistReport, Review};
use crate::schema::{banks, reviews};

/// Database manager for handling the connection pool and operations
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(&config.url())
            .await?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they don't exist
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                {id} SERIAL PRIMARY KEY,
                {name} VARCHAR(100) UNIQUE NOT NULL,
                {app} VARCHAR(100) NOT NULL,
                {created} TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            table = banks::TABLE,
            id = banks::BANK_ID,
            name = banks::BANK_NAME,
            app = banks::APP_NAME,
            created = banks::CREATED_AT,
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                {id} SERIAL PRIMARY KEY,
                {bank_id} INTEGER NOT NULL REFERENCES {banks_table}({banks_id}) ON DELETE CASCADE,
                {text} TEXT NOT NULL,
                {rating} INTEGER CHECK ({rating} >= 1 AND {rating} <= 5),
                {date} DATE NOT NULL,
                {label} VARCHAR(20),
                {score} DECIMAL(5,3),
                {theme} VARCHAR(100),
                {keywords} TEXT,
                {source} VARCHAR(50) DEFAULT 'Google Play Store',
                {created} TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            table = reviews::TABLE,
            id = reviews::REVIEW_ID,
            bank_id = reviews::BANK_ID,
            banks_table = banks::TABLE,
            banks_id = banks::BANK_ID,
            text = reviews::REVIEW_TEXT,
            rating = reviews::RATING,
            date = reviews::REVIEW_DATE,
            label = reviews::SENTIMENT_LABEL,
            score = reviews::SENTIMENT_SCORE,
            theme = reviews::THEME,
            keywords = reviews::KEYWORDS,
            source = reviews::SOURCE,
            created = reviews::CREATED_AT,
        ))
        .execute(&self.pool)
        .await?;

        for column in [
            reviews::BANK_ID,
            reviews::RATING,
            reviews::SENTIMENT_LABEL,
            reviews::THEME,
            reviews::REVIEW_DATE,
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column});",
                table = reviews::TABLE,
            ))
            .execute(&self.pool)
            .await?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    /// Insert or refresh a bank row, idempotent on the unique bank name
    pub async fn upsert_bank(&self, bank_name: &str, app_name: &str) -> Result<Bank> {
        let row = sqlx::query(&format!(
            "INSERT INTO {table} ({name}, {app}) VALUES ($1, $2)
             ON CONFLICT ({name}) DO UPDATE SET {app} = EXCLUDED.{app}
             RETURNING {id}, {name}, {app}",
            table = banks::TABLE,
            id = banks::BANK_ID,
            name = banks::BANK_NAME,
            app = banks::APP_NAME,
        ))
        .bind(bank_name)
        .bind(app_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(Bank {
            bank_id: row.try_get(banks::BANK_ID)?,
            bank_name: row.try_get(banks::BANK_NAME)?,
            app_name: row.try_get(banks::APP_NAME)?,
        })
    }

    /// Look up a bank by its unique name
    pub async fn get_bank(&self, bank_name: &str) -> Result<Option<Bank>> {
        let row = sqlx::query(&format!(
            "SELECT {id}, {name}, {app} FROM {table} WHERE {name} = $1",
            table = banks::TABLE,
            id = banks::BANK_ID,
            name = banks::BANK_NAME,
            app = banks::APP_NAME,
        ))
        .bind(bank_name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Bank {
                bank_id: row.try_get(banks::BANK_ID)?,
                bank_name: row.try_get(banks::BANK_NAME)?,
                app_name: row.try_get(banks::APP_NAME)?,
            })),
            None => Ok(None),
        }
    }

    /// Upsert one review row, keyed by the collection-time review id
    async fn upsert_review(&self, review: &Review, bank_id: i32) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {table} ({id}, {bank}, {text}, {rating}, {date}, {label}, {score}, {theme}, {keywords}, {source})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT ({id}) DO UPDATE SET
                {bank} = EXCLUDED.{bank},
                {text} = EXCLUDED.{text},
                {rating} = EXCLUDED.{rating},
                {date} = EXCLUDED.{date},
                {label} = EXCLUDED.{label},
                {score} = EXCLUDED.{score},
                {theme} = EXCLUDED.{theme},
                {keywords} = EXCLUDED.{keywords},
                {source} = EXCLUDED.{source}",
            table = reviews::TABLE,
            id = reviews::REVIEW_ID,
            bank = reviews::BANK_ID,
            text = reviews::REVIEW_TEXT,
            rating = reviews::RATING,
            date = reviews::REVIEW_DATE,
            label = reviews::SENTIMENT_LABEL,
            score = reviews::SENTIMENT_SCORE,
            theme = reviews::THEME,
            keywords = reviews::KEYWORDS,
            source = reviews::SOURCE,
        ))
        .bind(review.review_id)
        .bind(bank_id)
        .bind(&review.text)
        .bind(review.rating)
        .bind(review.review_date)
        .bind(review.sentiment_label.map(|label| label.as_str()))
        .bind(review.sentiment_score)
        .bind(review.theme.as_deref())
        .bind(keywords_column(review))
        .bind(&review.source)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a full batch of reviews.
    ///
    /// Banks referenced by the batch are upserted first; a review whose bank
    /// row could not be established fails individually and the batch keeps
    /// going.
    pub async fn persist_reviews(&self, batch: &[Review]) -> Result<PersistReport> {
        let mut report = PersistReport::default();
        let mut bank_ids: HashMap<String, i32> = HashMap::new();

        for review in batch {
            if bank_ids.contains_key(&review.bank) {
                continue;
            }
            match self.upsert_bank(&review.bank, &review.app_name).await {
                Ok(bank) => {
                    info!(bank = %bank.bank_name, bank_id = bank.bank_id, "Bank row ready");
                    bank_ids.insert(review.bank.clone(), bank.bank_id);
                    report.banks += 1;
                }
                Err(e) => {
                    warn!(bank = %review.bank, error = %e, "Failed to upsert bank, its reviews will be skipped");
                }
            }
        }

        for review in batch {
            let Some(&bank_id) = bank_ids.get(&review.bank) else {
                report.failed += 1;
                continue;
            };

            match self.upsert_review(review, bank_id).await {
                Ok(()) => report.inserted += 1,
                Err(e) => {
                    warn!(review_id = review.review_id, error = %e, "Failed to upsert review");
                    report.failed += 1;
                }
            }
        }

        info!(
            banks = report.banks,
            inserted = report.inserted,
            failed = report.failed,
            "Persistence batch complete"
        );
        Ok(report)
    }

    /// Total rows in the reviews table
    pub async fn count_reviews(&self) -> Result<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) FROM {}", reviews::TABLE))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }

    /// Review counts per bank, descending, banks without reviews included
    pub async fn reviews_per_bank(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(&format!(
            "SELECT b.{name}, COUNT(r.{review_id}) AS review_count
             FROM {banks_table} b
             LEFT JOIN {reviews_table} r ON b.{bank_id} = r.{bank_id}
             GROUP BY b.{name}
             ORDER BY review_count DESC",
            name = banks::BANK_NAME,
            review_id = reviews::REVIEW_ID,
            banks_table = banks::TABLE,
            reviews_table = reviews::TABLE,
            bank_id = banks::BANK_ID,
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            counts.push((row.try_get(banks::BANK_NAME)?, row.try_get("review_count")?));
        }
        Ok(counts)
    }
}

/// Keywords as stored in the TEXT column: comma-joined, NULL when absent
fn keywords_column(review: &Review) -> Option<String> {
    if review.keywords.is_empty() {
        None
    } else {
        Some(review.keywords.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_keywords_column_null_when_empty() {
        let mut review = Review {
            review_id: 1,
            bank: "Dashen Bank".to_string(),
            app_name: "Dashen Mobile".to_string(),
            text: "text".to_string(),
            rating: 4,
            review_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            source: "Google Play Store".to_string(),
            user_name: "Anonymous".to_string(),
            thumbs_up: 0,
            sentiment_label: None,
            sentiment_score: None,
            theme: None,
            keywords: Vec::new(),
        };

        assert!(keywords_column(&review).is_none());

        review.keywords = vec!["login".to_string(), "crash".to_string()];
        assert_eq!(keywords_column(&review).as_deref(), Some("login, crash"));
    }
}
