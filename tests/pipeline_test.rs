//! End-to-end pipeline test over an in-memory fixture:
//! 3 banks, 10 reviews each, half positive-worded and half negative-worded,
//! plus one record that becomes empty after cleaning.

use chrono::NaiveDate;
use std::path::Path;
use tempfile::tempdir;

use bank_review_analytics::cleaner::Cleaner;
use bank_review_analytics::config::AppConfig;
use bank_review_analytics::insights::generate_insights;
use bank_review_analytics::models::{Review, SentimentLabel};
use bank_review_analytics::sentiment::{resolve_scorer, score_reviews};
use bank_review_analytics::snapshot::{read_reviews, write_reviews};
use bank_review_analytics::themes::ThemeExtractor;

const BANKS: [(&str, &str); 3] = [
    ("Commercial Bank of Ethiopia", "Commercial Bank of Ethiopia Mobile"),
    ("Bank of Abyssinia", "BoA Mobile"),
    ("Dashen Bank", "Dashen Mobile"),
];

const POSITIVE_TEXTS: [&str; 5] = [
    "Excellent app, transfer is fast and smooth",
    "I love the quick transfer feature, great app",
    "Great transfer speed, very convenient and helpful",
    "Transfer completed fast, perfect banking app",
    "Best banking app, transfer money fast and easy",
];

const NEGATIVE_TEXTS: [&str; 5] = [
    "Terrible app, crashes every single time",
    "App crashes constantly, absolutely horrible",
    "Worst app, always crashes and freezes",
    "The app crashes daily, totally useless",
    "Awful, the app crashes and hangs all the time",
];

fn fixture() -> Vec<Review> {
    let mut reviews = Vec::new();
    let mut id = 1;
    let date = NaiveDate::from_ymd_opt(2024, 4, 10).expect("valid date");

    for (bank, app) in BANKS {
        for text in POSITIVE_TEXTS {
            reviews.push(review(id, bank, app, text, 5, date));
            id += 1;
        }
        for text in NEGATIVE_TEXTS {
            reviews.push(review(id, bank, app, text, 1, date));
            id += 1;
        }
    }

    // One record that is empty once markup is stripped and must vanish
    reviews.push(review(id, BANKS[0].0, BANKS[0].1, "<br/> <p> </p>", 5, date));
    reviews
}

fn review(id: i32, bank: &str, app: &str, text: &str, rating: i32, date: NaiveDate) -> Review {
    Review {
        review_id: id,
        bank: bank.to_string(),
        app_name: app.to_string(),
        text: text.to_string(),
        rating,
        review_date: date,
        source: "Google Play Store".to_string(),
        user_name: "Tester".to_string(),
        thumbs_up: 0,
        sentiment_label: None,
        sentiment_score: None,
        theme: None,
        keywords: Vec::new(),
    }
}

#[test]
fn test_full_pipeline_on_three_banks() {
    let config = AppConfig::default();
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

    // Clean
    let cleaner = Cleaner::new(&config.analysis).expect("Failed to create cleaner");
    let (mut reviews, report) = cleaner.clean(fixture(), today);

    assert_eq!(report.input, 31);
    assert_eq!(report.empty_text, 1);
    assert_eq!(reviews.len(), 30, "the empty record must not reach any later stage");

    // Score
    let scorer = resolve_scorer(&config.analysis);
    let breakdown = score_reviews(scorer.as_ref(), &mut reviews).expect("scoring failed");
    assert_eq!(breakdown.total(), 30);

    // Theme
    let extractor = ThemeExtractor::new(&config.analysis).expect("Failed to create extractor");
    extractor.extract(&mut reviews).expect("theming failed");

    // Aggregate
    let insights =
        generate_insights(&reviews, config.analysis.min_theme_support).expect("insights failed");
    assert_eq!(insights.len(), 3);

    for bank in &insights {
        assert_eq!(bank.review_count, 10);

        // Wording splits roughly five against five
        assert_eq!(bank.sentiment.positive, 5, "{}", bank.bank);
        assert_eq!(bank.sentiment.negative, 5, "{}", bank.bank);

        // Theme bucket counts conserve the bank's review count
        let theme_total: usize = bank.themes.iter().map(|t| t.count).sum();
        assert_eq!(theme_total, bank.review_count);

        // At least one driver and one pain point with 5-review support
        assert!(!bank.drivers.is_empty(), "{} has no driver", bank.bank);
        assert!(!bank.pain_points.is_empty(), "{} has no pain point", bank.bank);
        assert_eq!(bank.drivers[0].theme, "Transaction Performance");
        assert_eq!(bank.pain_points[0].theme, "App Reliability");
        assert!(bank.drivers[0].mean_sentiment > bank.pain_points[0].mean_sentiment);
    }
}

#[test]
fn test_pipeline_through_snapshots_on_disk() {
    let config = AppConfig::default();
    let dir = tempdir().expect("Failed to create temp directory");
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

    // Collection stage output
    let raw_path = dir.path().join("all_reviews_raw.csv");
    write_reviews(&raw_path, &fixture()).expect("raw write failed");

    // Cleaning stage reads raw, writes processed
    let cleaner = Cleaner::new(&config.analysis).expect("Failed to create cleaner");
    let raw = read_reviews(&raw_path).expect("raw read failed");
    let (cleaned, _) = cleaner.clean(raw, today);
    let processed_path = dir.path().join("reviews_processed.csv");
    write_reviews(&processed_path, &cleaned).expect("processed write failed");

    // Scoring stage reads processed, writes scored
    let mut scored = read_reviews(&processed_path).expect("processed read failed");
    let scorer = resolve_scorer(&config.analysis);
    score_reviews(scorer.as_ref(), &mut scored).expect("scoring failed");
    let sentiment_path = dir.path().join("reviews_with_sentiment.csv");
    write_reviews(&sentiment_path, &scored).expect("sentiment write failed");

    // Theming stage reads scored, writes themed
    let mut themed = read_reviews(&sentiment_path).expect("sentiment read failed");
    let extractor = ThemeExtractor::new(&config.analysis).expect("Failed to create extractor");
    extractor.extract(&mut themed).expect("theming failed");
    let themes_path = dir.path().join("reviews_with_themes.csv");
    write_reviews(&themes_path, &themed).expect("themes write failed");

    // The final snapshot is a complete, self-consistent superset
    let final_set = read_reviews(&themes_path).expect("themes read failed");
    assert_eq!(final_set.len(), 30);
    for review in &final_set {
        assert!(!review.text.is_empty());
        assert!(review.sentiment_label.is_some());
        assert!(review.sentiment_score.is_some());
        assert!(review.theme.is_some());
    }

    // Scored labels survive the CSV boundary unchanged
    let positives = final_set
        .iter()
        .filter(|r| r.sentiment_label == Some(SentimentLabel::Positive))
        .count();
    assert_eq!(positives, 15);

    assert!(Path::new(&themes_path).exists());
}

#[test]
fn test_rerunning_theme_stage_is_idempotent() {
    let config = AppConfig::default();
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

    let cleaner = Cleaner::new(&config.analysis).expect("Failed to create cleaner");
    let (mut reviews, _) = cleaner.clean(fixture(), today);

    let extractor = ThemeExtractor::new(&config.analysis).expect("Failed to create extractor");
    extractor.extract(&mut reviews).expect("first run failed");
    let first: Vec<(Vec<String>, Option<String>)> = reviews
        .iter()
        .map(|r| (r.keywords.clone(), r.theme.clone()))
        .collect();

    extractor.extract(&mut reviews).expect("second run failed");
    let second: Vec<(Vec<String>, Option<String>)> = reviews
        .iter()
        .map(|r| (r.keywords.clone(), r.theme.clone()))
        .collect();

    assert_eq!(first, second);
}
