//! Renderer integration tests: artifacts are isolated from each other and
//! the textual artifacts always land on disk.

use chrono::NaiveDate;
use tempfile::tempdir;

use bank_review_analytics::insights::generate_insights;
use bank_review_analytics::metrics::PipelineMetrics;
use bank_review_analytics::models::{Review, SentimentLabel};
use bank_review_analytics::report::ReportRenderer;

fn fixture() -> Vec<Review> {
    let date = NaiveDate::from_ymd_opt(2024, 5, 5).expect("valid date");
    let mut reviews = Vec::new();

    for i in 0..6 {
        reviews.push(Review {
            review_id: i,
            bank: "Dashen Bank".to_string(),
            app_name: "Dashen Mobile".to_string(),
            text: "Transfer is fast and smooth".to_string(),
            rating: 5,
            review_date: date,
            source: "Google Play Store".to_string(),
            user_name: "Tester".to_string(),
            thumbs_up: 0,
            sentiment_label: Some(SentimentLabel::Positive),
            sentiment_score: Some(0.7),
            theme: Some("Transaction Performance".to_string()),
            keywords: vec!["transfer".to_string()],
        });
    }
    for i in 6..12 {
        reviews.push(Review {
            review_id: i,
            bank: "Dashen Bank".to_string(),
            app_name: "Dashen Mobile".to_string(),
            text: "App crashes constantly".to_string(),
            rating: 1,
            review_date: date,
            source: "Google Play Store".to_string(),
            user_name: "Tester".to_string(),
            thumbs_up: 0,
            sentiment_label: Some(SentimentLabel::Negative),
            sentiment_score: Some(0.8),
            theme: Some("App Reliability".to_string()),
            keywords: vec!["crashes".to_string()],
        });
    }

    reviews
}

#[test]
fn test_render_all_attempts_every_artifact() {
    let dir = tempdir().expect("Failed to create temp directory");
    let reviews = fixture();
    let insights = generate_insights(&reviews, 5).expect("insights failed");

    let renderer =
        ReportRenderer::new(dir.path(), PipelineMetrics::default()).expect("renderer failed");
    let report = renderer.render_all(&insights, &reviews);

    // Six artifacts are always attempted; chart rendering may fail on
    // machines without fonts, but that must not abort the textual artifacts
    assert_eq!(report.written.len() + report.failed.len(), 6);

    let markdown = dir.path().join("insights_report.md");
    let json = dir.path().join("insights_data.json");
    assert!(markdown.exists(), "markdown report missing");
    assert!(json.exists(), "json export missing");

    let content = std::fs::read_to_string(&markdown).expect("read failed");
    assert!(content.contains("## Dashen Bank"));
    assert!(content.contains("### Satisfaction Drivers"));
    assert!(content.contains("### Pain Points"));

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).expect("read failed"))
            .expect("parse failed");
    assert_eq!(parsed[0]["bank"], "Dashen Bank");
    assert_eq!(parsed[0]["review_count"], 12);
}

#[test]
fn test_driver_and_pain_point_land_in_report() {
    let dir = tempdir().expect("Failed to create temp directory");
    let reviews = fixture();
    let insights = generate_insights(&reviews, 5).expect("insights failed");

    // Six positive transaction reviews vs six negative reliability reviews
    assert_eq!(insights[0].drivers[0].theme, "Transaction Performance");
    assert_eq!(insights[0].pain_points[0].theme, "App Reliability");

    let renderer =
        ReportRenderer::new(dir.path(), PipelineMetrics::default()).expect("renderer failed");
    let _ = renderer.render_all(&insights, &reviews);

    let content = std::fs::read_to_string(dir.path().join("insights_report.md")).expect("read");
    assert!(content.contains("Transaction Performance"));
    assert!(content.contains("App Reliability"));
    // The pain point triggers the stability recommendation
    assert!(content.contains("[Critical Priority] Stability"));
}
