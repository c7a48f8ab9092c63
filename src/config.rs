//! Analyzer configuration.
//!
//! Built once at startup (usually from `ASO_*` environment variables after
//! `dotenv` has run) and handed to the pipeline by value. Nothing reads
//! process-wide state after that.

use std::collections::HashSet;
use std::time::Duration;

use crate::keywords::DEFAULT_STOPWORDS;

/// Scoring constants.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Weight of a token found in a competitor title (descriptions weigh 1).
    pub title_boost: u64,
    /// Tokens shorter than this (in chars) are ignored.
    pub min_token_len: usize,
    /// How many top keywords get a difficulty score.
    pub keyword_limit: usize,
    pub stopwords: HashSet<String>,
}

impl ScoringConfig {
    /// Seed keyword tokens always weigh twice a title token.
    pub fn seed_weight(&self) -> u64 {
        self.title_boost.saturating_mul(2)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_boost: 3,
            min_token_len: 3,
            keyword_limit: 120,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Delay between consecutive detail fetches: `base + uniform(0..=jitter)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingConfig {
    pub base: Duration,
    pub jitter: Duration,
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1200),
            jitter: Duration::from_millis(800),
        }
    }
}

/// Where and how the store is reached.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub language: String,
    pub suggest_url: String,
    pub navigation_timeout: Duration,
    pub default_country: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.google.com".to_string(),
            language: "en".to_string(),
            suggest_url: "https://suggestqueries.google.com/complete/search?client=firefox&ds=apps"
                .to_string(),
            navigation_timeout: Duration::from_secs(20),
            default_country: "us".to_string(),
        }
    }
}

/// Everything the analyzer needs, immutable after construction.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub scoring: ScoringConfig,
    pub pacing: PacingConfig,
    pub store: StoreConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            scoring: ScoringConfig::default(),
            pacing: PacingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

impl AnalyzerConfig {
    /// Read `ASO_*` variables, falling back to defaults for anything unset or malformed.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let stopwords = match std::env::var("ASO_EXTRA_STOPWORDS") {
            Ok(extra) => {
                let mut set = defaults.scoring.stopwords.clone();
                set.extend(
                    extra
                        .split(',')
                        .map(|w| w.trim().to_lowercase())
                        .filter(|w| !w.is_empty()),
                );
                set
            }
            Err(_) => defaults.scoring.stopwords.clone(),
        };

        let max_limit = env_parse("ASO_MAX_LIMIT", defaults.max_limit).clamp(1, 50);

        Self {
            default_limit: env_parse("ASO_DEFAULT_LIMIT", defaults.default_limit).clamp(1, max_limit),
            max_limit,
            scoring: ScoringConfig {
                title_boost: env_parse("ASO_TITLE_BOOST", defaults.scoring.title_boost),
                min_token_len: defaults.scoring.min_token_len,
                keyword_limit: env_parse("ASO_KEYWORD_LIMIT", defaults.scoring.keyword_limit),
                stopwords,
            },
            pacing: PacingConfig {
                base: Duration::from_millis(env_parse(
                    "ASO_DELAY_BASE_MS",
                    defaults.pacing.base.as_millis() as u64,
                )),
                jitter: Duration::from_millis(env_parse(
                    "ASO_DELAY_JITTER_MS",
                    defaults.pacing.jitter.as_millis() as u64,
                )),
            },
            store: StoreConfig {
                base_url: env_string("ASO_STORE_BASE_URL", defaults.store.base_url)
                    .trim_end_matches('/')
                    .to_string(),
                language: env_string("ASO_STORE_LANG", defaults.store.language),
                suggest_url: env_string("ASO_SUGGEST_URL", defaults.store.suggest_url),
                navigation_timeout: Duration::from_secs(env_parse(
                    "ASO_NAV_TIMEOUT_SECS",
                    defaults.store.navigation_timeout.as_secs(),
                )),
                default_country: env_string("ASO_DEFAULT_COUNTRY", defaults.store.default_country)
                    .to_lowercase(),
            },
        }
    }

    /// Clamp a requested competitor limit into `1..=max_limit`.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Config with no pacing delay, for tests and offline fixtures.
    pub fn without_pacing(mut self) -> Self {
        self.pacing = PacingConfig::none();
        self
    }
}
