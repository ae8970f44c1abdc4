//! Configuration behaviour tests.

use bank_review_analytics::config::AppConfig;

#[test]
fn test_default_configuration_is_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_bank_table() {
    let config = AppConfig::default();

    let codes: Vec<&str> = config.scraper.apps.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["CBE", "BOA", "Dashen"]);

    for app in &config.scraper.apps {
        assert!(app.app_id.contains('.'), "{} has no package id", app.code);
        assert!(!app.bank_name.is_empty());
    }
}

#[test]
fn test_database_url_shape() {
    let config = AppConfig::default();
    let url = config.database.url();
    assert!(url.starts_with("postgres://"));
    assert!(url.ends_with("/bank_reviews"));
}

#[test]
fn test_sentiment_thresholds_straddle_zero() {
    let config = AppConfig::default();
    assert!(config.analysis.negative_threshold < 0.0);
    assert!(config.analysis.positive_threshold > 0.0);

    let mut broken = config.clone();
    broken.analysis.negative_threshold = 0.1;
    assert!(broken.validate().is_err());
}

#[test]
fn test_theme_rules_are_bounded_per_bank() {
    let config = AppConfig::default();
    for app in &config.scraper.apps {
        let themes = config.themes_for_bank(&app.bank_name);
        assert!(
            (3..=5).contains(&themes.len()),
            "{} has {} themes",
            app.bank_name,
            themes.len()
        );
    }

    // Stripping all rules fails validation outright
    let mut broken = config;
    broken.analysis.theme_rules.clear();
    assert!(broken.validate().is_err());
}

#[test]
fn test_empty_app_table_is_rejected() {
    let mut config = AppConfig::default();
    config.scraper.apps.clear();
    assert!(config.validate().is_err());
}
