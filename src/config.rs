use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
///
/// Everything that was a module-level constant in earlier iterations of the
/// study (bank/app table, thresholds, theme rules, credentials) lives here and
/// is passed explicitly into each pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scraper: ScraperConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Connection URL in the form sqlx expects
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

/// One entry of the bank -> app identifier table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankApp {
    /// Short bank code used in file names and logs
    pub code: String,
    /// Full bank name, unique in the store
    pub bank_name: String,
    /// Display name of the mobile app
    pub app_name: String,
    /// Store identifier of the app package
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub apps: Vec<BankApp>,
    pub target_reviews_per_bank: usize,
    pub batch_size: usize,
    /// Courtesy delay between result pages, in seconds
    pub page_delay_secs: u64,
    pub language: String,
    pub country: String,
    pub source_label: String,
}

/// A hand-curated keyword -> theme mapping rule.
///
/// The rule content is a business decision, not a derived computation, which
/// is why it ships as configuration with overridable defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeRule {
    /// Theme bucket this rule assigns
    pub theme: String,
    /// Keyword patterns that select the theme
    pub patterns: Vec<String>,
    /// Banks the rule applies to; empty means all banks
    pub banks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Compound score above which a review is labelled positive
    pub positive_threshold: f64,
    /// Compound score below which a review is labelled negative
    pub negative_threshold: f64,
    /// Keywords kept per review, descending relevance
    pub max_keywords: usize,
    /// Minimum documents a term must appear in to be ranked
    pub min_document_frequency: usize,
    /// Minimum reviews behind a theme before it can be a driver or pain point
    pub min_theme_support: usize,
    /// Language-detection confidence above which non-English text is dropped
    pub language_confidence: f64,
    /// Prefer the transformer scorer when the advanced-nlp feature is built in
    pub use_transformer: bool,
    pub theme_rules: Vec<ThemeRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub raw_dir: String,
    pub processed_dir: String,
    pub reports_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                database: "bank_reviews".to_string(),
                max_connections: 5,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            scraper: ScraperConfig {
                apps: vec![
                    BankApp {
                        code: "CBE".to_string(),
                        bank_name: "Commercial Bank of Ethiopia".to_string(),
                        app_name: "Commercial Bank of Ethiopia Mobile".to_string(),
                        app_id: "com.combanketh.mobilebanking".to_string(),
                    },
                    BankApp {
                        code: "BOA".to_string(),
                        bank_name: "Bank of Abyssinia".to_string(),
                        app_name: "BoA Mobile".to_string(),
                        app_id: "com.boa.boaMobileBanking".to_string(),
                    },
                    BankApp {
                        code: "Dashen".to_string(),
                        bank_name: "Dashen Bank".to_string(),
                        app_name: "Dashen Mobile".to_string(),
                        app_id: "com.dashen.dashensuperapp".to_string(),
                    },
                ],
                target_reviews_per_bank: 400,
                batch_size: 200,
                page_delay_secs: 2,
                language: "en".to_string(),
                country: "et".to_string(),
                source_label: "Google Play Store".to_string(),
            },
            analysis: AnalysisConfig {
                positive_threshold: 0.05,
                negative_threshold: -0.05,
                max_keywords: 5,
                min_document_frequency: 2,
                min_theme_support: 5,
                language_confidence: 0.8,
                use_transformer: true,
                theme_rules: default_theme_rules(),
            },
            output: OutputConfig {
                raw_dir: "data/raw".to_string(),
                processed_dir: "data/processed".to_string(),
                reports_dir: "reports".to_string(),
            },
        }
    }
}

/// Default keyword -> theme table, carried over from the manual clustering
/// rules of the original study. Applies to every configured bank.
fn default_theme_rules() -> Vec<ThemeRule> {
    let rule = |theme: &str, patterns: &[&str]| ThemeRule {
        theme: theme.to_string(),
        patterns: patterns.iter().map(ToString::to_string).collect(),
        banks: Vec::new(),
    };

    vec![
        rule(
            "Account Access Issues",
            &[
                "login", "password", "access", "account", "sign", "authentication", "verify",
                "security", "locked", "blocked",
            ],
        ),
        rule(
            "Transaction Performance",
            &[
                "transfer", "transaction", "payment", "slow", "fast", "speed", "timeout", "delay",
                "processing", "complete", "failed",
            ],
        ),
        rule(
            "User Interface & Experience",
            &[
                "ui", "interface", "design", "layout", "navigation", "button", "screen",
                "display", "experience", "easy", "simple",
            ],
        ),
        rule(
            "Customer Support",
            &[
                "support", "help", "service", "customer", "contact", "response", "assistance",
                "complaint", "resolve",
            ],
        ),
        rule(
            "App Reliability",
            &[
                "crash", "error", "bug", "glitch", "freeze", "hang", "restart", "unstable",
                "reliable", "stable", "update",
            ],
        ),
    ]
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {e}"))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("BANK_REVIEWS").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {e}"))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.port == 0 {
            return Err(anyhow::anyhow!("database port must be set"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate scraper config
        if self.scraper.apps.is_empty() {
            return Err(anyhow::anyhow!("At least one bank app must be configured"));
        }
        if self.scraper.batch_size == 0 {
            return Err(anyhow::anyhow!("batch_size must be greater than 0"));
        }
        if self.scraper.target_reviews_per_bank == 0 {
            return Err(anyhow::anyhow!(
                "target_reviews_per_bank must be greater than 0"
            ));
        }

        // Validate analysis config
        if self.analysis.negative_threshold >= 0.0 || self.analysis.positive_threshold <= 0.0 {
            return Err(anyhow::anyhow!(
                "Sentiment thresholds must straddle zero: negative {} / positive {}",
                self.analysis.negative_threshold,
                self.analysis.positive_threshold
            ));
        }
        if self.analysis.max_keywords == 0 {
            return Err(anyhow::anyhow!("max_keywords must be greater than 0"));
        }
        if self.analysis.theme_rules.is_empty() {
            return Err(anyhow::anyhow!("theme_rules must not be empty"));
        }
        for app in &self.scraper.apps {
            let themes = self.themes_for_bank(&app.bank_name).len();
            if !(3..=5).contains(&themes) {
                return Err(anyhow::anyhow!(
                    "Bank {} must have between 3 and 5 themes, found {themes}",
                    app.bank_name
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.analysis.language_confidence) {
            return Err(anyhow::anyhow!(
                "language_confidence must be between 0 and 1"
            ));
        }

        // Validate output config
        if self.output.processed_dir.trim().is_empty()
            || self.output.raw_dir.trim().is_empty()
            || self.output.reports_dir.trim().is_empty()
        {
            return Err(anyhow::anyhow!("Output directories must not be empty"));
        }

        Ok(())
    }

    /// Theme bucket names configured for a bank, excluding the implicit Other
    #[must_use]
    pub fn themes_for_bank(&self, bank_name: &str) -> Vec<&str> {
        let mut themes = Vec::new();
        for rule in &self.analysis.theme_rules {
            let applies = rule.banks.is_empty() || rule.banks.iter().any(|b| b == bank_name);
            if applies && !themes.contains(&rule.theme.as_str()) {
                themes.push(rule.theme.as_str());
            }
        }
        themes
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
