//! Sentiment scoring for cleaned reviews.
//!
//! The primary scorer is a weighted lexicon with intensifier and negation
//! handling. When the `advanced-nlp` feature is enabled a transformer model
//! is preferred; if it cannot be loaded the pipeline silently falls back to
//! the lexicon. The strategy is resolved once at startup, not per call.

use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{PipelineError, Result};
use crate::models::{Review, SentimentBreakdown, SentimentLabel};

/// Weighted positive terms, tuned for app-store review vocabulary
const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("good", 1.0),
    ("great", 1.5),
    ("excellent", 2.0),
    ("amazing", 2.0),
    ("wonderful", 1.8),
    ("fantastic", 1.8),
    ("love", 2.0),
    ("like", 1.0),
    ("best", 1.5),
    ("better", 1.2),
    ("awesome", 1.8),
    ("perfect", 2.0),
    ("nice", 1.0),
    ("helpful", 1.2),
    ("easy", 1.2),
    ("simple", 1.0),
    ("fast", 1.2),
    ("quick", 1.2),
    ("smooth", 1.3),
    ("convenient", 1.4),
    ("reliable", 1.3),
    ("secure", 1.2),
    ("satisfied", 1.0),
    ("pleased", 1.2),
    ("works", 0.8),
    ("improved", 1.0),
];

/// Weighted negative terms
const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bad", -1.0),
    ("terrible", -2.0),
    ("awful", -2.0),
    ("horrible", -2.0),
    ("worst", -2.0),
    ("hate", -2.0),
    ("poor", -1.2),
    ("disappointing", -1.5),
    ("disappointed", -1.5),
    ("annoying", -1.2),
    ("frustrating", -1.5),
    ("frustrated", -1.5),
    ("useless", -1.5),
    ("worthless", -1.8),
    ("slow", -1.0),
    ("unreliable", -1.5),
    ("broken", -1.5),
    ("crash", -1.8),
    ("crashes", -1.8),
    ("crashing", -1.8),
    ("error", -1.0),
    ("errors", -1.0),
    ("bug", -1.2),
    ("buggy", -1.5),
    ("freeze", -1.3),
    ("freezes", -1.3),
    ("stuck", -1.2),
    ("failed", -1.3),
    ("fails", -1.3),
    ("scam", -2.0),
    ("waste", -1.5),
];

/// Intensifiers that scale the following sentiment word
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("incredibly", 2.0),
    ("absolutely", 2.0),
    ("completely", 1.8),
    ("totally", 1.8),
    ("really", 1.3),
    ("so", 1.2),
    ("quite", 1.2),
    ("rather", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.7),
    ("barely", 0.5),
    ("hardly", 0.5),
];

/// Negation words that flip the following sentiment word
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "nowhere", "neither", "nor", "dont",
    "doesnt", "cant", "wont", "isnt",
];

/// Contract shared by every sentiment scoring strategy
pub trait SentimentScorer {
    /// Short name for logs and metrics
    fn name(&self) -> &'static str;

    /// Score a single review text. Never fails: unscoreable text is neutral.
    fn score(&self, text: &str) -> (SentimentLabel, f64);
}

/// Lexicon-based scorer producing a signed compound score in [-1, 1]
pub struct LexiconScorer {
    positive_threshold: f64,
    negative_threshold: f64,
}

impl LexiconScorer {
    /// Create a scorer with the configured label thresholds
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
        }
    }

    /// Compound sentiment of a text, averaged over matched lexicon words
    /// and clamped to [-1, 1]
    #[must_use]
    pub fn compound(&self, text: &str) -> f64 {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut total = 0.0;
        let mut matched = 0.0;

        for (i, word) in words.iter().enumerate() {
            let weight = POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS.iter())
                .find(|(w, _)| *w == word.as_str())
                .map(|(_, weight)| *weight);

            let Some(mut sentiment) = weight else {
                continue;
            };

            // Intensifier directly before the sentiment word scales it
            if i > 0 {
                if let Some((_, intensity)) =
                    INTENSIFIERS.iter().find(|(w, _)| *w == words[i - 1])
                {
                    sentiment *= intensity;
                }
            }

            // Negation within the two preceding words flips and dampens it
            let negated = (i >= 1 && NEGATIONS.contains(&words[i - 1].as_str()))
                || (i >= 2 && NEGATIONS.contains(&words[i - 2].as_str()));
            if negated {
                sentiment = -sentiment * 0.8;
            }

            total += sentiment;
            matched += 1.0;
        }

        if matched == 0.0 {
            0.0
        } else {
            (total / matched).clamp(-1.0, 1.0)
        }
    }

    /// Deterministic label banding over the compound score
    #[must_use]
    pub fn label_for(&self, compound: f64) -> SentimentLabel {
        if compound > self.positive_threshold {
            SentimentLabel::Positive
        } else if compound < self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn score(&self, text: &str) -> (SentimentLabel, f64) {
        if text.trim().is_empty() {
            return (SentimentLabel::Neutral, 0.0);
        }

        let compound = self.compound(text);
        (self.label_for(compound), compound)
    }
}

/// Transformer-backed scorer, preferred when the model is available.
/// Confidence is the model's class probability in [0, 1].
#[cfg(feature = "advanced-nlp")]
pub struct TransformerScorer {
    model: rust_bert::pipelines::sentiment::SentimentModel,
}

#[cfg(feature = "advanced-nlp")]
impl TransformerScorer {
    /// Load the default SST-2 sentiment model. Downloads weights on first use,
    /// so this can fail on machines without the model cached.
    pub fn new() -> anyhow::Result<Self> {
        let model = rust_bert::pipelines::sentiment::SentimentModel::new(Default::default())?;
        Ok(Self { model })
    }
}

#[cfg(feature = "advanced-nlp")]
impl SentimentScorer for TransformerScorer {
    fn name(&self) -> &'static str {
        "transformer"
    }

    fn score(&self, text: &str) -> (SentimentLabel, f64) {
        use rust_bert::pipelines::sentiment::SentimentPolarity;

        if text.trim().is_empty() {
            return (SentimentLabel::Neutral, 0.0);
        }

        // The model has a token limit; long reviews are truncated
        let truncated: String = text.chars().take(512).collect();
        let predictions = self.model.predict(&[truncated.as_str()]);

        match predictions.first() {
            Some(prediction) => {
                let label = match prediction.polarity {
                    SentimentPolarity::Positive => SentimentLabel::Positive,
                    SentimentPolarity::Negative => SentimentLabel::Negative,
                };
                (label, prediction.score)
            }
            None => (SentimentLabel::Neutral, 0.0),
        }
    }
}

/// Pick the scoring strategy once at startup.
///
/// The transformer is preferred when it is compiled in, enabled by
/// configuration and loads successfully; any failure falls back to the
/// lexicon without surfacing an error.
#[must_use]
pub fn resolve_scorer(config: &AnalysisConfig) -> Box<dyn SentimentScorer> {
    #[cfg(feature = "advanced-nlp")]
    if config.use_transformer {
        match TransformerScorer::new() {
            Ok(scorer) => {
                info!("Using transformer sentiment scorer");
                return Box::new(scorer);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transformer model unavailable, falling back to lexicon scorer");
            }
        }
    }

    info!("Using lexicon sentiment scorer");
    Box::new(LexiconScorer::new(config))
}

/// Score every review in place.
///
/// Errors only when the input set is empty, which indicates a broken
/// upstream stage rather than a scoring problem.
pub fn score_reviews(
    scorer: &dyn SentimentScorer,
    reviews: &mut [Review],
) -> Result<SentimentBreakdown> {
    if reviews.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: "sentiment scoring",
        });
    }

    let mut breakdown = SentimentBreakdown::default();

    for review in reviews.iter_mut() {
        let (label, score) = scorer.score(&review.text);
        review.sentiment_label = Some(label);
        review.sentiment_score = Some(score);

        match label {
            SentimentLabel::Positive => breakdown.positive += 1,
            SentimentLabel::Negative => breakdown.negative += 1,
            SentimentLabel::Neutral => breakdown.neutral += 1,
        }
    }

    info!(
        scorer = scorer.name(),
        positive = breakdown.positive,
        negative = breakdown.negative,
        neutral = breakdown.neutral,
        "Sentiment scoring complete"
    );

    Ok(breakdown)
}
