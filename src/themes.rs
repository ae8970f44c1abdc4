//! Keyword extraction and theme assignment.
//!
//! Keywords are ranked per review with a TF-IDF weighting computed over the
//! full review corpus of the same bank, so a term's weight reflects
//! corpus-wide rarity. Themes come from the hand-curated keyword rules in the
//! configuration; a review matching no rule lands in the Other bucket.
//! The whole stage is deterministic: identical corpus in, identical
//! keyword sequences and themes out.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use stop_words::{get, LANGUAGE};
use tracing::info;

use crate::config::{AnalysisConfig, ThemeRule};
use crate::error::{PipelineError, Result};
use crate::models::{Review, ThemeSummaryRow, OTHER_THEME};

/// TF-IDF keyword extractor and rule-based theme assigner
pub struct ThemeExtractor {
    letters_regex: Regex,
    stopwords: HashSet<String>,
    stemmer: Stemmer,
    rules: Vec<ThemeRule>,
    max_keywords: usize,
    min_document_frequency: usize,
}

impl ThemeExtractor {
    /// Create an extractor from the analysis configuration
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let letters_regex = Regex::new(r"[^a-z\s]")
            .map_err(|e| anyhow::anyhow!("Failed to compile letters regex: {e}"))?;

        let stopwords: HashSet<String> = get(LANGUAGE::English)
            .iter()
            .map(ToString::to_string)
            .collect();

        let stemmer = Stemmer::create(Algorithm::English);

        Ok(Self {
            letters_regex,
            stopwords,
            stemmer,
            rules: config.theme_rules.clone(),
            max_keywords: config.max_keywords,
            min_document_frequency: config.min_document_frequency,
        })
    }

    /// Terms of a review text: stopword-free unigrams plus adjacent bigrams
    fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let letters_only = self.letters_regex.replace_all(&lowered, "");

        let unigrams: Vec<String> = letters_only
            .split_whitespace()
            .filter(|token| token.len() > 2 && !self.stopwords.contains(*token))
            .map(ToString::to_string)
            .collect();

        let mut terms = unigrams.clone();
        for pair in unigrams.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }

        terms
    }

    /// Extract keywords and assign a theme for every review, in place.
    ///
    /// The TF-IDF statistics are computed separately per bank so that the
    /// rarity of a term is judged against that bank's own corpus.
    pub fn extract(&self, reviews: &mut [Review]) -> Result<()> {
        if reviews.is_empty() {
            return Err(PipelineError::EmptyInput {
                stage: "theme extraction",
            });
        }

        // Deterministic bank ordering
        let mut by_bank: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, review) in reviews.iter().enumerate() {
            by_bank.entry(review.bank.clone()).or_default().push(idx);
        }

        for (bank, indices) in &by_bank {
            let term_lists: Vec<Vec<String>> = indices
                .iter()
                .map(|&idx| self.terms(&reviews[idx].text))
                .collect();

            // Document frequency: one count per review a term appears in
            let mut document_frequency: HashMap<&str, usize> = HashMap::new();
            for terms in &term_lists {
                let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
                for term in unique {
                    *document_frequency.entry(term).or_insert(0) += 1;
                }
            }

            let doc_count = term_lists.len();

            for (&idx, terms) in indices.iter().zip(&term_lists) {
                let keywords = self.rank_keywords(terms, &document_frequency, doc_count);
                let theme = self.assign_theme(&keywords, bank);

                reviews[idx].keywords = keywords;
                reviews[idx].theme = Some(theme);
            }
        }

        info!(reviews = reviews.len(), banks = by_bank.len(), "Theme extraction complete");
        Ok(())
    }

    /// Rank a review's terms by tf-idf, highest first, lexicographic
    /// tie-break so equal weights order identically across runs
    fn rank_keywords(
        &self,
        terms: &[String],
        document_frequency: &HashMap<&str, usize>,
        doc_count: usize,
    ) -> Vec<String> {
        if terms.is_empty() {
            return Vec::new();
        }

        let mut term_frequency: HashMap<&str, usize> = HashMap::new();
        for term in terms {
            *term_frequency.entry(term.as_str()).or_insert(0) += 1;
        }

        let total_terms = terms.len() as f64;
        let mut weighted: Vec<(f64, &str)> = term_frequency
            .into_iter()
            .filter(|(term, _)| {
                document_frequency
                    .get(term)
                    .is_some_and(|&df| df >= self.min_document_frequency)
            })
            .map(|(term, tf)| {
                let df = document_frequency[term] as f64;
                // Smoothed inverse document frequency
                let idf = ((1.0 + doc_count as f64) / (1.0 + df)).ln() + 1.0;
                (tf as f64 / total_terms * idf, term)
            })
            .collect();

        weighted.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        weighted
            .into_iter()
            .take(self.max_keywords)
            .map(|(_, term)| term.to_string())
            .collect()
    }

    /// Map extracted keywords to the first matching configured theme.
    ///
    /// A keyword matches a rule pattern on substring containment or when a
    /// keyword token stems to the same root as the pattern.
    #[must_use]
    pub fn assign_theme(&self, keywords: &[String], bank: &str) -> String {
        for rule in &self.rules {
            let applies = rule.banks.is_empty() || rule.banks.iter().any(|b| b == bank);
            if !applies {
                continue;
            }

            for pattern in &rule.patterns {
                let pattern_lower = pattern.to_lowercase();
                let pattern_stem = self.stemmer.stem(&pattern_lower).to_string();

                let matched = keywords.iter().any(|keyword| {
                    keyword.contains(&pattern_lower)
                        || keyword
                            .split_whitespace()
                            .any(|token| self.stemmer.stem(token) == pattern_stem.as_str())
                });

                if matched {
                    return rule.theme.clone();
                }
            }
        }

        OTHER_THEME.to_string()
    }

    /// Per-bank theme distribution rows for the theme summary snapshot
    #[must_use]
    pub fn theme_summary(reviews: &[Review]) -> Vec<ThemeSummaryRow> {
        let mut by_bank: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut bank_totals: BTreeMap<&str, usize> = BTreeMap::new();

        for review in reviews {
            let bank = review.bank.as_str();
            *by_bank
                .entry(bank)
                .or_default()
                .entry(review.theme_or_other())
                .or_insert(0) += 1;
            *bank_totals.entry(bank).or_insert(0) += 1;
        }

        let mut rows = Vec::new();
        for (bank, themes) in &by_bank {
            let total = bank_totals[bank];
            let mut theme_counts: Vec<(&str, usize)> =
                themes.iter().map(|(t, c)| (*t, *c)).collect();
            theme_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            for (theme, count) in theme_counts {
                rows.push(ThemeSummaryRow {
                    bank: (*bank).to_string(),
                    theme: theme.to_string(),
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                });
            }
        }

        rows
    }
}
