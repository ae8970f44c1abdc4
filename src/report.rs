//! Report and chart artifact generation.
//!
//! The renderer consumes the aggregated insight structure and writes a fixed
//! set of chart images plus a markdown report and a JSON export. Artifacts
//! are independent: a failure to write one is recorded and the remaining
//! artifacts are still produced.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::models::{BankInsights, Review, SentimentLabel};

/// Chart canvas size
const CHART_SIZE: (u32, u32) = (1280, 720);

/// Outcome of one rendering run
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Artifacts written successfully
    pub written: Vec<PathBuf>,
    /// Artifact name plus failure reason, in attempt order
    pub failed: Vec<(String, String)>,
}

/// Renders every report artifact into a target directory
pub struct ReportRenderer {
    output_dir: PathBuf,
    metrics: PipelineMetrics,
}

/// One recommendation derived from a bank's shortlists
struct Recommendation {
    category: &'static str,
    priority: &'static str,
    text: &'static str,
}

impl ReportRenderer {
    /// Create a renderer writing into `output_dir`
    pub fn new(output_dir: &Path, metrics: PipelineMetrics) -> Result<Self> {
        create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            metrics,
        })
    }

    /// Render the full artifact set.
    ///
    /// Never fails as a whole: each artifact's outcome lands in the report.
    #[must_use]
    pub fn render_all(&self, insights: &[BankInsights], reviews: &[Review]) -> RenderReport {
        let mut report = RenderReport::default();

        let artifacts: Vec<(&str, Result<()>)> = vec![
            (
                "sentiment_distribution.png",
                self.sentiment_distribution_chart(insights, reviews),
            ),
            ("rating_distribution.png", self.rating_distribution_chart(reviews)),
            ("theme_distribution.png", self.theme_distribution_chart(reviews)),
            ("bank_comparison.png", self.bank_comparison_chart(insights)),
            ("insights_report.md", self.write_markdown_report(insights)),
            ("insights_data.json", self.write_json_export(insights)),
        ];

        for (name, outcome) in artifacts {
            match outcome {
                Ok(()) => {
                    self.metrics.record_artifact(name, true);
                    report.written.push(self.output_dir.join(name));
                }
                Err(e) => {
                    self.metrics.record_artifact(name, false);
                    warn!(artifact = name, error = %e, "Failed to write artifact");
                    report.failed.push((name.to_string(), e.to_string()));
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            output_dir = %self.output_dir.display(),
            "Report rendering complete"
        );
        report
    }

    /// Overall sentiment counts plus the per-bank positive share
    fn sentiment_distribution_chart(
        &self,
        insights: &[BankInsights],
        reviews: &[Review],
    ) -> Result<()> {
        let path = self.output_dir.join("sentiment_distribution.png");
        let mut positive = 0.0;
        let mut negative = 0.0;
        let mut neutral = 0.0;
        for review in reviews {
            match review.sentiment_label {
                Some(SentimentLabel::Positive) => positive += 1.0,
                Some(SentimentLabel::Negative) => negative += 1.0,
                _ => neutral += 1.0,
            }
        }

        let upper_labels = vec![
            "POSITIVE".to_string(),
            "NEGATIVE".to_string(),
            "NEUTRAL".to_string(),
        ];
        let upper_values = vec![positive, negative, neutral];

        let lower_labels: Vec<String> = insights.iter().map(|b| b.bank.clone()).collect();
        let lower_values: Vec<f64> = insights
            .iter()
            .map(|b| {
                if b.review_count == 0 {
                    0.0
                } else {
                    b.sentiment.positive as f64 / b.review_count as f64 * 100.0
                }
            })
            .collect();

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let (upper, lower) = root.split_vertically(CHART_SIZE.1 / 2);
        draw_bars(
            &upper,
            "Overall Sentiment Distribution",
            "Reviews",
            &upper_labels,
            &upper_values,
            &GREEN,
        )
        .map_err(boxed_err)?;
        draw_bars(
            &lower,
            "Positive Sentiment % by Bank",
            "Percent",
            &lower_labels,
            &lower_values,
            &BLUE,
        )
        .map_err(boxed_err)?;
        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Review counts per star rating
    fn rating_distribution_chart(&self, reviews: &[Review]) -> Result<()> {
        let path = self.output_dir.join("rating_distribution.png");

        let mut counts = [0.0f64; 5];
        for review in reviews {
            if (1..=5).contains(&review.rating) {
                counts[(review.rating - 1) as usize] += 1.0;
            }
        }

        let labels: Vec<String> = (1..=5).map(|r| format!("{r} star")).collect();
        let values = counts.to_vec();

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw_bars(&root, "Rating Distribution", "Reviews", &labels, &values, &BLUE)
            .map_err(boxed_err)?;
        root.present().map_err(render_err)?;
        Ok(())
    }

    /// The most frequent theme buckets across all banks
    fn theme_distribution_chart(&self, reviews: &[Review]) -> Result<()> {
        let path = self.output_dir.join("theme_distribution.png");

        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        for review in reviews {
            *counts.entry(review.theme_or_other()).or_insert(0.0) += 1.0;
        }

        let mut entries: Vec<(&str, f64)> = counts.into_iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        entries.truncate(10);

        let labels: Vec<String> = entries.iter().map(|(t, _)| (*t).to_string()).collect();
        let values: Vec<f64> = entries.iter().map(|(_, c)| *c).collect();

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw_bars(&root, "Top Themes", "Reviews", &labels, &values, &MAGENTA)
            .map_err(boxed_err)?;
        root.present().map_err(render_err)?;
        Ok(())
    }

    /// Average rating and average sentiment side by side per bank
    fn bank_comparison_chart(&self, insights: &[BankInsights]) -> Result<()> {
        let path = self.output_dir.join("bank_comparison.png");

        let labels: Vec<String> = insights.iter().map(|b| b.bank.clone()).collect();
        let ratings: Vec<f64> = insights.iter().map(|b| b.avg_rating).collect();
        let sentiments: Vec<f64> = insights.iter().map(|b| b.avg_sentiment).collect();

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let (upper, lower) = root.split_vertically(CHART_SIZE.1 / 2);
        draw_bars(&upper, "Average Rating by Bank", "Rating", &labels, &ratings, &BLUE)
            .map_err(boxed_err)?;
        draw_bars(
            &lower,
            "Average Sentiment by Bank",
            "Sentiment",
            &labels,
            &sentiments,
            &GREEN,
        )
        .map_err(boxed_err)?;
        root.present().map_err(render_err)?;
        Ok(())
    }

    /// The narrative insights report
    fn write_markdown_report(&self, insights: &[BankInsights]) -> Result<()> {
        let path = self.output_dir.join("insights_report.md");
        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);

        let total_reviews: usize = insights.iter().map(|b| b.review_count).sum();
        let bank_names: Vec<&str> = insights.iter().map(|b| b.bank.as_str()).collect();

        writeln!(w, "# Bank Review Analysis - Insights and Recommendations")?;
        writeln!(w)?;
        writeln!(w, "## Executive Summary")?;
        writeln!(w)?;
        writeln!(w, "Total Reviews Analyzed: {total_reviews}")?;
        writeln!(w, "Banks Analyzed: {}", bank_names.join(", "))?;
        writeln!(w)?;

        writeln!(w, "Overall Sentiment Distribution:")?;
        let mut positive = 0;
        let mut negative = 0;
        let mut neutral = 0;
        for bank in insights {
            positive += bank.sentiment.positive;
            negative += bank.sentiment.negative;
            neutral += bank.sentiment.neutral;
        }
        for (label, count) in [("POSITIVE", positive), ("NEGATIVE", negative), ("NEUTRAL", neutral)]
        {
            let pct = if total_reviews == 0 {
                0.0
            } else {
                count as f64 / total_reviews as f64 * 100.0
            };
            writeln!(w, "- {label}: {count} ({pct:.1}%)")?;
        }
        writeln!(w)?;

        writeln!(w, "## Bank Comparison")?;
        writeln!(w)?;
        writeln!(w, "| Bank | Reviews | Avg Rating | Avg Sentiment | Positive % | Negative % |")?;
        writeln!(w, "|------|---------|------------|---------------|------------|------------|")?;
        for bank in insights {
            let positive_pct = bank.sentiment.positive as f64 / bank.review_count as f64 * 100.0;
            let negative_pct = bank.sentiment.negative as f64 / bank.review_count as f64 * 100.0;
            writeln!(
                w,
                "| {} | {} | {:.2} | {:.3} | {:.1}% | {:.1}% |",
                bank.bank, bank.review_count, bank.avg_rating, bank.avg_sentiment, positive_pct,
                negative_pct
            )?;
        }
        writeln!(w)?;

        for bank in insights {
            writeln!(w, "## {}", bank.bank)?;
            writeln!(w)?;

            writeln!(w, "### Satisfaction Drivers")?;
            writeln!(w)?;
            if bank.drivers.is_empty() {
                writeln!(w, "- No clear drivers identified")?;
            } else {
                for driver in &bank.drivers {
                    writeln!(
                        w,
                        "- **{}**: {} reviews, mean sentiment {:.3}",
                        driver.theme, driver.count, driver.mean_sentiment
                    )?;
                }
            }
            writeln!(w)?;

            writeln!(w, "### Pain Points")?;
            writeln!(w)?;
            if bank.pain_points.is_empty() {
                writeln!(w, "- No clear pain points identified")?;
            } else {
                for pain_point in &bank.pain_points {
                    writeln!(
                        w,
                        "- **{}**: {} reviews, mean sentiment {:.3}",
                        pain_point.theme, pain_point.count, pain_point.mean_sentiment
                    )?;
                }
            }
            writeln!(w)?;

            writeln!(w, "### Recommendations")?;
            writeln!(w)?;
            let recommendations = recommendations_for(bank);
            if recommendations.is_empty() {
                writeln!(w, "- Continue monitoring user feedback")?;
            } else {
                for rec in recommendations.iter().take(3) {
                    writeln!(
                        w,
                        "- **[{} Priority] {}**: {}",
                        rec.priority, rec.category, rec.text
                    )?;
                }
            }
            writeln!(w)?;
        }

        w.flush()?;
        Ok(())
    }

    /// Machine-readable export of the same insight structure
    fn write_json_export(&self, insights: &[BankInsights]) -> Result<()> {
        let path = self.output_dir.join("insights_data.json");
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), insights)?;
        Ok(())
    }
}

/// Map shortlisted themes onto the study's recommendation catalogue
fn recommendations_for(bank: &BankInsights) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for pain_point in &bank.pain_points {
        let theme = pain_point.theme.as_str();
        if theme.contains("Account Access") {
            recommendations.push(Recommendation {
                category: "Account Access",
                priority: "High",
                text: "Improve login and authentication flows; add biometric sign-in and better password recovery.",
            });
        } else if theme.contains("Transaction Performance") {
            recommendations.push(Recommendation {
                category: "Performance",
                priority: "High",
                text: "Optimize transaction processing speed; investigate server response times.",
            });
        } else if theme.contains("Interface") || theme.contains("Experience") {
            recommendations.push(Recommendation {
                category: "UX/UI",
                priority: "Medium",
                text: "Redesign the interface for usability; run user testing on the main flows.",
            });
        } else if theme.contains("Customer Support") {
            recommendations.push(Recommendation {
                category: "Support",
                priority: "High",
                text: "Expand support channels and cut first-response times.",
            });
        } else if theme.contains("Reliability") {
            recommendations.push(Recommendation {
                category: "Stability",
                priority: "Critical",
                text: "Fix crashes and stability issues; expand error handling and regression testing.",
            });
        }
    }

    for driver in &bank.drivers {
        if driver.theme.contains("Transaction Performance") {
            recommendations.push(Recommendation {
                category: "Enhancement",
                priority: "Low",
                text: "Market fast transaction processing as a competitive advantage.",
            });
        }
    }

    recommendations
}

/// Shorten plotters' generic error types into the pipeline error
fn render_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Render(e.to_string())
}

fn boxed_err(e: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::Render(e.to_string())
}

/// Vertical bar chart over labelled categories
fn draw_bars(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    y_label: &str,
    labels: &[String],
    values: &[f64],
    color: &RGBColor,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let max_value = values.iter().copied().fold(0.0f64, f64::max);
    let min_value = values.iter().copied().fold(0.0f64, f64::min);
    let y_upper = if max_value <= 0.0 { 1.0 } else { max_value * 1.1 };
    let y_lower = if min_value < 0.0 { min_value * 1.1 } else { 0.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..labels.len() as i32, y_lower..y_upper)?;

    let label_names: Vec<String> = labels.to_vec();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_label)
        .x_labels(labels.len())
        .x_label_formatter(&move |index: &i32| {
            label_names
                .get(*index as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &value)| {
        Rectangle::new(
            [(i as i32, 0.0), (i as i32 + 1, value)],
            color.mix(0.6).filled(),
        )
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentBreakdown, ThemeStat};

    fn insights() -> Vec<BankInsights> {
        vec![BankInsights {
            bank: "Dashen Bank".to_string(),
            review_count: 10,
            avg_rating: 3.2,
            avg_sentiment: 0.1,
            sentiment: SentimentBreakdown {
                positive: 5,
                negative: 4,
                neutral: 1,
            },
            themes: vec![ThemeStat {
                theme: "App Reliability".to_string(),
                count: 6,
                mean_sentiment: -0.4,
                mean_rating: 2.1,
            }],
            drivers: vec![ThemeStat {
                theme: "Transaction Performance".to_string(),
                count: 5,
                mean_sentiment: 0.6,
                mean_rating: 4.4,
            }],
            pain_points: vec![ThemeStat {
                theme: "App Reliability".to_string(),
                count: 6,
                mean_sentiment: -0.4,
                mean_rating: 2.1,
            }],
        }]
    }

    #[test]
    fn test_recommendations_cover_shortlists() {
        let bank = &insights()[0];
        let recommendations = recommendations_for(bank);

        assert!(recommendations.iter().any(|r| r.category == "Stability"));
        assert!(recommendations.iter().any(|r| r.category == "Enhancement"));
    }

    #[test]
    fn test_markdown_report_mentions_every_bank() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let renderer = ReportRenderer::new(dir.path(), PipelineMetrics::default())
            .expect("Failed to create renderer");

        renderer
            .write_markdown_report(&insights())
            .expect("report failed");

        let content =
            std::fs::read_to_string(dir.path().join("insights_report.md")).expect("read failed");
        assert!(content.contains("# Bank Review Analysis"));
        assert!(content.contains("## Dashen Bank"));
        assert!(content.contains("Transaction Performance"));
        assert!(content.contains("[Critical Priority] Stability"));
    }

    #[test]
    fn test_json_export_round_trips() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let renderer = ReportRenderer::new(dir.path(), PipelineMetrics::default())
            .expect("Failed to create renderer");

        renderer.write_json_export(&insights()).expect("export failed");

        let raw = std::fs::read_to_string(dir.path().join("insights_data.json")).expect("read");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed[0]["bank"], "Dashen Bank");
        assert_eq!(parsed[0]["drivers"][0]["theme"], "Transaction Performance");
    }
}
