//! Pipeline command-line interface.
//!
//! One subcommand per stage plus `run` for the whole pipeline. Every stage
//! reads the previous stage's snapshot and writes its own, so stages can be
//! re-run individually.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use bank_review_analytics::cleaner::Cleaner;
use bank_review_analytics::collector::{collect_reviews, GooglePlaySource};
use bank_review_analytics::config::AppConfig;
use bank_review_analytics::db::Database;
use bank_review_analytics::insights::{generate_insights, sentiment_by_bank, sentiment_by_rating};
use bank_review_analytics::logging::init_logging;
use bank_review_analytics::metrics::{PipelineMetrics, StageTimer};
use bank_review_analytics::report::ReportRenderer;
use bank_review_analytics::sentiment::{resolve_scorer, score_reviews};
use bank_review_analytics::snapshot::{
    read_first_available, read_reviews, write_reviews, write_rows, PROCESSED_SNAPSHOT,
    RAW_SNAPSHOT, SENTIMENT_BY_BANK, SENTIMENT_BY_RATING, SENTIMENT_SNAPSHOT, THEMES_BY_BANK,
    THEMES_SNAPSHOT,
};
use bank_review_analytics::themes::ThemeExtractor;
use bank_review_analytics::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape reviews for the configured bank apps
    Scrape,
    /// Clean and validate the raw review snapshot
    Preprocess,
    /// Score sentiment for the cleaned reviews
    Sentiment,
    /// Extract keywords and assign themes
    Themes,
    /// Summarize drivers and pain points per bank
    Insights,
    /// Upsert banks and reviews into PostgreSQL
    Persist,
    /// Render charts and the narrative report
    Report {
        /// Output directory for the artifacts
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Run the full pipeline end to end
    Run {
        /// Also persist the final review set to PostgreSQL
        #[arg(long)]
        with_db: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard must outlive the run
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting bank-review-analytics pipeline");

    // Parse command line arguments
    let cli = Cli::parse();
    let metrics = PipelineMetrics::default();

    match cli.command {
        Commands::Scrape => cmd_scrape(&config, metrics).await?,
        Commands::Preprocess => cmd_preprocess(&config, metrics)?,
        Commands::Sentiment => cmd_sentiment(&config, metrics)?,
        Commands::Themes => cmd_themes(&config, metrics)?,
        Commands::Insights => cmd_insights(&config)?,
        Commands::Persist => cmd_persist(&config, metrics).await?,
        Commands::Report { output_dir } => cmd_report(&config, metrics, output_dir.as_deref())?,
        Commands::Run { with_db } => cmd_run(&config, metrics, with_db).await?,
    }

    Ok(())
}

/// Collect reviews from the store and write the raw snapshot
async fn cmd_scrape(config: &AppConfig, metrics: PipelineMetrics) -> Result<()> {
    let timer = StageTimer::new(metrics, "scrape");
    let source = GooglePlaySource::new(&config.scraper)?;
    let today = Local::now().date_naive();

    let reviews = collect_reviews(&source, &config.scraper, &metrics, today).await?;

    let path = Path::new(&config.output.raw_dir).join(RAW_SNAPSHOT);
    write_reviews(&path, &reviews)?;

    info!(reviews = reviews.len(), "Scraping complete");
    timer.finish();
    Ok(())
}

/// Clean the raw snapshot and write the processed one
fn cmd_preprocess(config: &AppConfig, metrics: PipelineMetrics) -> Result<()> {
    let timer = StageTimer::new(metrics, "preprocess");
    let raw_path = Path::new(&config.output.raw_dir).join(RAW_SNAPSHOT);
    let reviews = read_reviews(&raw_path)?;

    let cleaner = Cleaner::new(&config.analysis)?;
    let (cleaned, report) = cleaner.clean(reviews, Local::now().date_naive());

    metrics.record_drop("duplicates", report.duplicates);
    metrics.record_drop("empty_text", report.empty_text);
    metrics.record_drop("invalid_rating", report.invalid_rating);
    metrics.record_drop("non_english", report.non_english);
    metrics.record_cleaned(report.output);

    let path = Path::new(&config.output.processed_dir).join(PROCESSED_SNAPSHOT);
    write_reviews(&path, &cleaned)?;

    if report.meets_kpi() {
        info!(drop_rate = report.drop_rate(), "Data quality meets KPI (<5% drops)");
    } else {
        warn!(drop_rate = report.drop_rate(), "Data quality does not meet KPI (<5% drops)");
    }

    timer.finish();
    Ok(())
}

/// Score sentiment and write the scored snapshot plus its aggregates
fn cmd_sentiment(config: &AppConfig, metrics: PipelineMetrics) -> Result<()> {
    let timer = StageTimer::new(metrics, "sentiment");
    let processed_path = Path::new(&config.output.processed_dir).join(PROCESSED_SNAPSHOT);
    let mut reviews = read_reviews(&processed_path)?;

    // The scoring strategy is resolved once per run
    let scorer = resolve_scorer(&config.analysis);
    let breakdown = score_reviews(scorer.as_ref(), &mut reviews)?;

    for review in &reviews {
        metrics.record_sentiment(scorer.name(), review.sentiment_score.unwrap_or(0.0));
    }

    let processed_dir = Path::new(&config.output.processed_dir);
    write_reviews(&processed_dir.join(SENTIMENT_SNAPSHOT), &reviews)?;
    write_rows(&processed_dir.join(SENTIMENT_BY_BANK), &sentiment_by_bank(&reviews))?;
    write_rows(&processed_dir.join(SENTIMENT_BY_RATING), &sentiment_by_rating(&reviews))?;

    info!(
        positive = breakdown.positive,
        negative = breakdown.negative,
        neutral = breakdown.neutral,
        "Sentiment stage complete"
    );
    timer.finish();
    Ok(())
}

/// Extract keywords, assign themes and write the themed snapshot
fn cmd_themes(config: &AppConfig, metrics: PipelineMetrics) -> Result<()> {
    let timer = StageTimer::new(metrics, "themes");
    let processed_dir = Path::new(&config.output.processed_dir);
    let mut reviews = read_first_available(&[
        &processed_dir.join(SENTIMENT_SNAPSHOT),
        &processed_dir.join(PROCESSED_SNAPSHOT),
    ])?;

    let extractor = ThemeExtractor::new(&config.analysis)?;
    extractor.extract(&mut reviews)?;
    metrics.record_themed(reviews.len());

    write_reviews(&processed_dir.join(THEMES_SNAPSHOT), &reviews)?;

    let summary = ThemeExtractor::theme_summary(&reviews);
    write_rows(&processed_dir.join(THEMES_BY_BANK), &summary)?;

    // Coverage KPI from the original study: at least 3 themes per bank
    for app in &config.scraper.apps {
        let unique = summary.iter().filter(|row| row.bank == app.bank_name).count();
        if unique >= 3 {
            info!(bank = %app.bank_name, themes = unique, "Theme coverage meets KPI (3+)");
        } else {
            warn!(bank = %app.bank_name, themes = unique, "Theme coverage below KPI (3+)");
        }
    }

    timer.finish();
    Ok(())
}

/// Compute and log the per-bank insight summary
fn cmd_insights(config: &AppConfig) -> Result<()> {
    let reviews = load_richest_snapshot(config)?;
    let insights = generate_insights(&reviews, config.analysis.min_theme_support)?;

    for bank in &insights {
        info!(
            bank = %bank.bank,
            reviews = bank.review_count,
            avg_rating = bank.avg_rating,
            positive = bank.sentiment.positive,
            negative = bank.sentiment.negative,
            neutral = bank.sentiment.neutral,
            "Bank summary"
        );
        for driver in &bank.drivers {
            info!(bank = %bank.bank, theme = %driver.theme, mean_sentiment = driver.mean_sentiment, "Driver");
        }
        for pain_point in &bank.pain_points {
            info!(bank = %bank.bank, theme = %pain_point.theme, mean_sentiment = pain_point.mean_sentiment, "Pain point");
        }
    }

    Ok(())
}

/// Upsert the final review set into PostgreSQL
async fn cmd_persist(config: &AppConfig, metrics: PipelineMetrics) -> Result<()> {
    let timer = StageTimer::new(metrics, "persist");
    InputValidator::validate_database_params(
        &config.database.host,
        config.database.port,
        &config.database.database,
    )?;

    let reviews = load_richest_snapshot(config)?;

    let db = Database::connect(&config.database).await?;
    db.init_schema().await?;
    metrics.record_pool_size(config.database.max_connections);

    let report = db.persist_reviews(&reviews).await?;
    metrics.record_persistence(report.inserted, report.failed);

    for (bank, count) in db.reviews_per_bank().await? {
        info!(bank = %bank, reviews = count, "Rows in store");
    }

    if report.failed > 0 {
        warn!(failed = report.failed, "Some reviews could not be persisted");
    }

    timer.finish();
    Ok(())
}

/// Recompute insights and render every artifact
fn cmd_report(config: &AppConfig, metrics: PipelineMetrics, output_dir: Option<&str>) -> Result<()> {
    let timer = StageTimer::new(metrics, "report");
    let reviews = load_richest_snapshot(config)?;

    // Aggregates are recomputed fresh on every report run
    let insights = generate_insights(&reviews, config.analysis.min_theme_support)?;

    let out_dir = PathBuf::from(output_dir.unwrap_or(&config.output.reports_dir));
    InputValidator::validate_output_dir(&out_dir)?;

    let renderer = ReportRenderer::new(&out_dir, metrics)?;
    let render_report = renderer.render_all(&insights, &reviews);

    for path in &render_report.written {
        info!(artifact = %path.display(), "Artifact written");
    }
    for (artifact, reason) in &render_report.failed {
        warn!(artifact = %artifact, reason = %reason, "Artifact failed");
    }

    timer.finish();
    Ok(())
}

/// Run every stage in order.
///
/// A scraping failure downgrades to a warning so existing raw data can still
/// flow through the pipeline; any later stage failure aborts the run.
async fn cmd_run(config: &AppConfig, metrics: PipelineMetrics, with_db: bool) -> Result<()> {
    if let Err(e) = cmd_scrape(config, metrics).await {
        warn!(error = %e, "Scraping failed, continuing with existing raw data if available");
    }

    cmd_preprocess(config, metrics)?;
    cmd_sentiment(config, metrics)?;
    cmd_themes(config, metrics)?;
    cmd_insights(config)?;

    if with_db {
        cmd_persist(config, metrics).await?;
    }

    cmd_report(config, metrics, None)?;

    info!("Pipeline complete");
    Ok(())
}

/// Prefer the richest snapshot available, falling back stage by stage
fn load_richest_snapshot(
    config: &AppConfig,
) -> Result<Vec<bank_review_analytics::models::Review>> {
    let processed_dir = Path::new(&config.output.processed_dir);
    Ok(read_first_available(&[
        &processed_dir.join(THEMES_SNAPSHOT),
        &processed_dir.join(SENTIMENT_SNAPSHOT),
        &processed_dir.join(PROCESSED_SNAPSHOT),
    ])?)
}
