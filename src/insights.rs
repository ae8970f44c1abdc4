//! Aggregation of scored and themed reviews into per-bank insights.
//!
//! All aggregates are recomputed from the review set on every call; nothing
//! is cached between runs. The input is never mutated.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{
    BankInsights, BankSentimentRow, RatingSentimentRow, Review, SentimentBreakdown,
    SentimentLabel, ThemeStat, OTHER_THEME,
};

/// How many driver / pain-point themes to surface per bank
const SHORTLIST_LEN: usize = 3;

/// Build per-bank summaries with driver and pain-point themes.
///
/// Themes qualify for the shortlists only with at least `min_theme_support`
/// reviews behind them; the Other bucket never qualifies. Fewer than two
/// qualifying themes is not an error: as many as exist are reported.
pub fn generate_insights(reviews: &[Review], min_theme_support: usize) -> Result<Vec<BankInsights>> {
    if reviews.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: "insight generation",
        });
    }

    // Deterministic bank ordering
    let mut by_bank: BTreeMap<&str, Vec<&Review>> = BTreeMap::new();
    for review in reviews {
        by_bank.entry(review.bank.as_str()).or_default().push(review);
    }

    let mut insights = Vec::with_capacity(by_bank.len());

    for (bank, bank_reviews) in &by_bank {
        let review_count = bank_reviews.len();
        let avg_rating =
            bank_reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / review_count as f64;
        let avg_sentiment =
            bank_reviews.iter().map(|r| r.signed_sentiment()).sum::<f64>() / review_count as f64;

        let mut sentiment = SentimentBreakdown::default();
        for review in bank_reviews {
            match review.sentiment_label {
                Some(SentimentLabel::Positive) => sentiment.positive += 1,
                Some(SentimentLabel::Negative) => sentiment.negative += 1,
                // Unscored reviews count as neutral so totals stay conserved
                Some(SentimentLabel::Neutral) | None => sentiment.neutral += 1,
            }
        }

        let themes = theme_stats(bank_reviews);

        let mut qualifying: Vec<&ThemeStat> = themes
            .iter()
            .filter(|t| t.theme != OTHER_THEME && t.count >= min_theme_support)
            .collect();

        qualifying.sort_by(|a, b| {
            b.mean_sentiment
                .partial_cmp(&a.mean_sentiment)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        let drivers: Vec<ThemeStat> =
            qualifying.iter().take(SHORTLIST_LEN).map(|t| (*t).clone()).collect();

        qualifying.sort_by(|a, b| {
            a.mean_sentiment
                .partial_cmp(&b.mean_sentiment)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        let pain_points: Vec<ThemeStat> =
            qualifying.iter().take(SHORTLIST_LEN).map(|t| (*t).clone()).collect();

        insights.push(BankInsights {
            bank: (*bank).to_string(),
            review_count,
            avg_rating,
            avg_sentiment,
            sentiment,
            themes,
            drivers,
            pain_points,
        });
    }

    info!(banks = insights.len(), reviews = reviews.len(), "Insight generation complete");
    Ok(insights)
}

/// Per-theme statistics for one bank, descending by count.
///
/// Every review lands in exactly one bucket (unthemed ones in Other), so the
/// bucket counts always sum to the bank's review count.
fn theme_stats(bank_reviews: &[&Review]) -> Vec<ThemeStat> {
    let mut buckets: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();

    for review in bank_reviews {
        let entry = buckets.entry(review.theme_or_other()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += review.signed_sentiment();
        entry.2 += f64::from(review.rating);
    }

    let mut stats: Vec<ThemeStat> = buckets
        .into_iter()
        .map(|(theme, (count, sentiment_sum, rating_sum))| ThemeStat {
            theme: theme.to_string(),
            count,
            mean_sentiment: sentiment_sum / count as f64,
            mean_rating: rating_sum / count as f64,
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));
    stats
}

/// Per-bank sentiment aggregate rows for the snapshot written after scoring
#[must_use]
pub fn sentiment_by_bank(reviews: &[Review]) -> Vec<BankSentimentRow> {
    let mut by_bank: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();

    for review in reviews {
        let entry = by_bank.entry(review.bank.as_str()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += review.signed_sentiment();
        entry.2 += f64::from(review.rating);
    }

    by_bank
        .into_iter()
        .map(|(bank, (count, sentiment_sum, rating_sum))| BankSentimentRow {
            bank: bank.to_string(),
            avg_sentiment: sentiment_sum / count as f64,
            avg_rating: rating_sum / count as f64,
            review_count: count,
        })
        .collect()
}

/// Per-rating sentiment aggregate rows
#[must_use]
pub fn sentiment_by_rating(reviews: &[Review]) -> Vec<RatingSentimentRow> {
    let mut by_rating: BTreeMap<i32, (usize, f64)> = BTreeMap::new();

    for review in reviews {
        let entry = by_rating.entry(review.rating).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += review.signed_sentiment();
    }

    by_rating
        .into_iter()
        .map(|(rating, (count, sentiment_sum))| RatingSentimentRow {
            rating,
            avg_sentiment: sentiment_sum / count as f64,
            review_count: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn review(
        id: i32,
        bank: &str,
        rating: i32,
        label: SentimentLabel,
        score: f64,
        theme: &str,
    ) -> Review {
        Review {
            review_id: id,
            bank: bank.to_string(),
            app_name: format!("{bank} Mobile"),
            text: "text".to_string(),
            rating,
            review_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            source: "Google Play Store".to_string(),
            user_name: "Anonymous".to_string(),
            thumbs_up: 0,
            sentiment_label: Some(label),
            sentiment_score: Some(score),
            theme: Some(theme.to_string()),
            keywords: vec!["keyword".to_string()],
        }
    }

    /// Ten reviews for one bank: a praised theme, a criticized theme and
    /// two stragglers below the support threshold
    fn fixture(bank: &str) -> Vec<Review> {
        let mut reviews = Vec::new();
        for i in 0..5 {
            reviews.push(review(i, bank, 5, SentimentLabel::Positive, 0.8, "Transaction Performance"));
        }
        for i in 5..10 {
            reviews.push(review(i, bank, 1, SentimentLabel::Negative, 0.7, "App Reliability"));
        }
        reviews.push(review(10, bank, 3, SentimentLabel::Neutral, 0.0, "Other"));
        reviews.push(review(11, bank, 4, SentimentLabel::Positive, 0.5, "Customer Support"));
        reviews
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(generate_insights(&[], 5).is_err());
    }

    #[test]
    fn test_counts_are_conserved() {
        let reviews = fixture("Commercial Bank of Ethiopia");
        let insights = generate_insights(&reviews, 5).expect("insights failed");
        assert_eq!(insights.len(), 1);

        let bank = &insights[0];
        assert_eq!(bank.review_count, 12);
        let theme_total: usize = bank.themes.iter().map(|t| t.count).sum();
        assert_eq!(theme_total, bank.review_count);
        assert_eq!(bank.sentiment.total(), bank.review_count);
    }

    #[test]
    fn test_drivers_and_pain_points() {
        let reviews = fixture("Commercial Bank of Ethiopia");
        let insights = generate_insights(&reviews, 5).expect("insights failed");
        let bank = &insights[0];

        assert_eq!(bank.drivers.first().map(|t| t.theme.as_str()), Some("Transaction Performance"));
        assert_eq!(bank.pain_points.first().map(|t| t.theme.as_str()), Some("App Reliability"));

        // Customer Support has one review, below the support threshold
        assert!(bank.drivers.iter().all(|t| t.theme != "Customer Support"));
        assert!(bank.pain_points.iter().all(|t| t.theme != "Customer Support"));
        // The Other bucket never reaches a shortlist
        assert!(bank.drivers.iter().all(|t| t.theme != OTHER_THEME));
    }

    #[test]
    fn test_fewer_qualifying_themes_is_not_an_error() {
        let reviews: Vec<Review> = (0..6)
            .map(|i| review(i, "Dashen Bank", 5, SentimentLabel::Positive, 0.9, "Customer Support"))
            .collect();
        let insights = generate_insights(&reviews, 5).expect("insights failed");

        assert_eq!(insights[0].drivers.len(), 1);
        assert_eq!(insights[0].pain_points.len(), 1);
    }

    #[test]
    fn test_negative_confidence_scores_rank_low() {
        // Scorer reporting [0, 1] confidence: negative reviews still drag the
        // theme's mean signed sentiment below the praised one
        let reviews = fixture("Bank of Abyssinia");
        let insights = generate_insights(&reviews, 5).expect("insights failed");
        let bank = &insights[0];

        let reliability = bank.themes.iter().find(|t| t.theme == "App Reliability").unwrap();
        let transactions = bank
            .themes
            .iter()
            .find(|t| t.theme == "Transaction Performance")
            .unwrap();
        assert!(reliability.mean_sentiment < 0.0);
        assert!(transactions.mean_sentiment > 0.0);
    }

    #[test]
    fn test_aggregates_by_bank_and_rating() {
        let reviews = fixture("Dashen Bank");
        let by_bank = sentiment_by_bank(&reviews);
        assert_eq!(by_bank.len(), 1);
        assert_eq!(by_bank[0].review_count, 12);

        let by_rating = sentiment_by_rating(&reviews);
        let total: usize = by_rating.iter().map(|r| r.review_count).sum();
        assert_eq!(total, 12);
        let five_star = by_rating.iter().find(|r| r.rating == 5).unwrap();
        assert!(five_star.avg_sentiment > 0.0);
    }

    #[test]
    fn test_input_not_mutated() {
        let reviews = fixture("Dashen Bank");
        let before = reviews.len();
        let _ = generate_insights(&reviews, 5).expect("insights failed");
        assert_eq!(reviews.len(), before);
        assert!(reviews.iter().all(|r| r.theme.is_some()));
    }
}
