//! Persistence tests against a live PostgreSQL instance.
//!
//! These are ignored by default because they need a reachable server. Run
//! them with the database configured through the usual configuration
//! sources, e.g.:
//!
//! ```text
//! BANK_REVIEWS__DATABASE__HOST=localhost cargo test -- --ignored
//! ```

use chrono::NaiveDate;

use bank_review_analytics::config::AppConfig;
use bank_review_analytics::db::Database;
use bank_review_analytics::models::{Review, SentimentLabel};

fn review(id: i32, bank: &str, app: &str, text: &str) -> Review {
    Review {
        review_id: id,
        bank: bank.to_string(),
        app_name: app.to_string(),
        text: text.to_string(),
        rating: 4,
        review_date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
        source: "Google Play Store".to_string(),
        user_name: "Tester".to_string(),
        thumbs_up: 1,
        sentiment_label: Some(SentimentLabel::Positive),
        sentiment_score: Some(0.42),
        theme: Some("Transaction Performance".to_string()),
        keywords: vec!["transfer".to_string(), "fast".to_string()],
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_upsert_is_idempotent() {
    let config = AppConfig::load().expect("config failed");
    let db = Database::connect(&config.database).await.expect("connect failed");
    db.init_schema().await.expect("schema failed");

    let first = vec![review(9_001, "Dashen Bank", "Dashen Mobile", "Quick transfers")];
    let report = db.persist_reviews(&first).await.expect("persist failed");
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 0);

    let before = db.count_reviews().await.expect("count failed");

    // Same review id with updated values: still exactly one row
    let mut updated = first.clone();
    updated[0].text = "Quick transfers, still happy".to_string();
    updated[0].sentiment_score = Some(0.9);
    let report = db.persist_reviews(&updated).await.expect("persist failed");
    assert_eq!(report.inserted, 1);

    let after = db.count_reviews().await.expect("count failed");
    assert_eq!(before, after, "upsert must not create a second row");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_three_banks_thirty_rows() {
    let config = AppConfig::load().expect("config failed");
    let db = Database::connect(&config.database).await.expect("connect failed");
    db.init_schema().await.expect("schema failed");

    let banks = [
        ("Commercial Bank of Ethiopia", "Commercial Bank of Ethiopia Mobile"),
        ("Bank of Abyssinia", "BoA Mobile"),
        ("Dashen Bank", "Dashen Mobile"),
    ];

    let mut batch = Vec::new();
    let mut id = 10_000;
    for (bank, app) in banks {
        for n in 0..10 {
            batch.push(review(id, bank, app, &format!("Review number {n} for {bank}")));
            id += 1;
        }
    }

    let report = db.persist_reviews(&batch).await.expect("persist failed");
    assert_eq!(report.banks, 3);
    assert_eq!(report.inserted, 30);
    assert_eq!(report.failed, 0);

    // Every configured bank resolves to a row with a matching foreign key
    for (bank, _) in banks {
        let stored = db.get_bank(bank).await.expect("lookup failed");
        assert!(stored.is_some(), "{bank} missing");
    }

    let counts = db.reviews_per_bank().await.expect("counts failed");
    for (bank, _) in banks {
        let count = counts
            .iter()
            .find(|(name, _)| name == bank)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        assert!(count >= 10, "{bank} has {count} rows");
    }
}
