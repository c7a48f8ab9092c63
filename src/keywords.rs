//! Tokenizing competitor text and accumulating weighted keyword frequencies.

use std::collections::HashMap;

use crate::config::ScoringConfig;
use crate::detail::CompetitorRecord;

/// Low-signal words skipped when scoring competitor text.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "are", "from", "this", "that", "these", "those",
    "our", "all", "any", "can", "will", "not", "but", "has", "have", "had", "was", "were", "its",
    "it's", "into", "out", "more", "most", "than", "then", "also", "just", "only", "very", "get",
    "use", "using", "via", "per", "one", "new", "now", "app", "apps", "free", "best", "top",
    "what", "when", "where", "which", "who", "why", "how", "let", "lets", "let's", "each",
    "every", "other", "over", "about", "like", "make", "may", "need", "off", "own", "some",
    "such", "there", "their", "they", "them", "too", "way", "yours", "you're", "you'll", "don't",
    "can't", "won't", "here", "again", "even", "much", "many", "ever", "well", "both", "being",
    "been", "does", "did", "doing",
];

/// Lowercase, fold curly quotes, replace anything outside `[a-z0-9' ]` with a
/// space and split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
            'a'..='z' | '0'..='9' | '\'' => c,
            c if c.is_whitespace() => c,
            _ => ' ',
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Token frequency map, filled competitor by competitor.
#[derive(Debug)]
pub struct KeywordAggregator<'a> {
    config: &'a ScoringConfig,
    scores: HashMap<String, u64>,
}

impl<'a> KeywordAggregator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self {
            config,
            scores: HashMap::new(),
        }
    }

    fn qualifies(&self, token: &str) -> bool {
        token.chars().count() >= self.config.min_token_len && !self.config.stopwords.contains(token)
    }

    fn add_text(&mut self, text: &str, weight: u64) {
        for token in tokenize(text) {
            if self.qualifies(&token) {
                let score = self.scores.entry(token).or_insert(0);
                *score = score.saturating_add(weight);
            }
        }
    }

    /// Title tokens get the title boost, description tokens weigh 1.
    pub fn add_competitor(&mut self, record: &CompetitorRecord) {
        self.add_text(&record.title, self.config.title_boost);
        self.add_text(&record.description, 1);
    }

    /// Seed keyword tokens are split on whitespace only and bypass the stopword list.
    pub fn add_seed(&mut self, keyword: &str) {
        let weight = self.config.seed_weight();
        for token in keyword.split_whitespace().map(str::to_lowercase) {
            if token.chars().count() >= self.config.min_token_len {
                let score = self.scores.entry(token).or_insert(0);
                *score = score.saturating_add(weight);
            }
        }
    }

    pub fn score(&self, token: &str) -> Option<u64> {
        self.scores.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Entries by descending score; equal scores are ordered alphabetically.
    pub fn into_sorted(self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self.scores.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Aggregate every competitor's text plus the seed keyword.
pub fn aggregate(
    config: &ScoringConfig,
    competitors: &[CompetitorRecord],
    seed_keyword: &str,
) -> Vec<(String, u64)> {
    let mut aggregator = KeywordAggregator::new(config);
    for record in competitors {
        aggregator.add_competitor(record);
    }
    aggregator.add_seed(seed_keyword);
    tracing::debug!(tokens = aggregator.len(), "keyword frequencies aggregated");
    aggregator.into_sorted()
}
