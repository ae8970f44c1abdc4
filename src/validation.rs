use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a bank code used in file names and logs
    pub fn validate_bank_code(code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(anyhow!("Bank code cannot be empty"));
        }

        if code.len() > 30 {
            return Err(anyhow!("Bank code too long (max 30 characters)"));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("Bank code contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a store app identifier (reverse-domain package name)
    pub fn validate_app_id(app_id: &str) -> Result<()> {
        if app_id.trim().is_empty() {
            return Err(anyhow!("App id cannot be empty"));
        }

        if !app_id.contains('.') {
            return Err(anyhow!("App id must be a package name like com.example.app"));
        }

        let valid = app_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
        if !valid {
            return Err(anyhow!("App id contains invalid characters: {app_id}"));
        }

        if app_id.starts_with('.') || app_id.ends_with('.') {
            return Err(anyhow!("App id cannot start or end with a dot"));
        }

        Ok(())
    }

    /// Validate a star rating
    pub fn validate_rating(rating: i32) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(anyhow!("Rating must be between 1 and 5, got {rating}"));
        }
        Ok(())
    }

    /// Validate a review date: parseable and not in the future
    pub fn validate_review_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date > today {
            return Err(anyhow!("Review date {date} is in the future"));
        }

        // App-store reviews older than the platform itself are suspect
        let floor = NaiveDate::from_ymd_opt(2008, 1, 1).unwrap_or(NaiveDate::MIN);
        if date < floor {
            return Err(anyhow!("Review date {date} predates app stores"));
        }

        Ok(())
    }

    /// Validate an output directory path
    pub fn validate_output_dir(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.is_empty() {
            return Err(anyhow!("Output path cannot be empty"));
        }

        // Check for path traversal attempts
        if path_str.contains("..") || path_str.contains('~') {
            return Err(anyhow!(
                "Output path contains potentially dangerous characters"
            ));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("Output path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate the requested collection size
    pub fn validate_target_count(count: usize) -> Result<()> {
        if count == 0 {
            return Err(anyhow!("Target review count must be greater than 0"));
        }

        if count > 100_000 {
            return Err(anyhow!("Target review count too large (max 100,000)"));
        }

        Ok(())
    }

    /// Sanitize text input: strip control characters, keep line structure
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate database connection parameters
    pub fn validate_database_params(host: &str, port: u16, database: &str) -> Result<()> {
        if host.trim().is_empty() {
            return Err(anyhow!("Database host cannot be empty"));
        }

        if port == 0 {
            return Err(anyhow!("Database port must be set"));
        }

        if database.trim().is_empty() {
            return Err(anyhow!("Database name cannot be empty"));
        }

        if !database
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(anyhow!("Database name contains invalid characters"));
        }

        Ok(())
    }
}
