//! The analysis pipeline: search, per-candidate detail extraction, scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::extract_candidates;
use crate::config::{AnalyzerConfig, ScoringConfig};
use crate::detail::{CompetitorRecord, DetailExtractor};
use crate::error::{AnalyzeError, AnalyzeResult};
use crate::keywords::aggregate;
use crate::pacing::Pacer;
use crate::scoring::{average_installs, score_keywords, ScoredKeyword};
use crate::source::{StoreSession, StoreSource};
use crate::suggest::parse_suggestions;

/// A competitor with its 1-based position in candidate-discovery order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankedCompetitor {
    pub rank: usize,
    #[serde(flatten)]
    pub record: CompetitorRecord,
}

/// Final output of one keyword analysis.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisResult {
    pub keyword: String,
    pub country: String,
    pub limit: usize,
    pub competitor_count: usize,
    pub average_installs: u64,
    pub competitors: Vec<RankedCompetitor>,
    pub keywords: Vec<ScoredKeyword>,
    pub generated_at: DateTime<Utc>,
}

/// Combine extracted competitors into the scored result.
///
/// Ranks follow the order of `competitors`, which is candidate-discovery order.
pub fn assemble_result(
    keyword: &str,
    country: &str,
    limit: usize,
    competitors: Vec<CompetitorRecord>,
    scoring: &ScoringConfig,
) -> AnalysisResult {
    let installs: Vec<u64> = competitors.iter().filter_map(|c| c.installs).collect();
    let average = average_installs(&installs);

    let frequencies = aggregate(scoring, &competitors, keyword);
    let keywords = score_keywords(&frequencies, average, scoring.keyword_limit);

    let competitors: Vec<RankedCompetitor> = competitors
        .into_iter()
        .enumerate()
        .map(|(idx, record)| RankedCompetitor {
            rank: idx + 1,
            record,
        })
        .collect();

    AnalysisResult {
        keyword: keyword.to_string(),
        country: country.to_string(),
        limit,
        competitor_count: competitors.len(),
        average_installs: average.round() as u64,
        competitors,
        keywords,
        generated_at: Utc::now(),
    }
}

/// Runs analyses against a [`StoreSource`].
pub struct Analyzer<S> {
    source: S,
    config: AnalyzerConfig,
    extractor: DetailExtractor,
    pacer: Pacer,
}

impl<S: StoreSource> Analyzer<S> {
    pub fn new(source: S, config: AnalyzerConfig) -> Self {
        let pacer = Pacer::new(config.pacing);
        Self {
            source,
            config,
            extractor: DetailExtractor::default(),
            pacer,
        }
    }

    /// Swap in custom field chains, e.g. for a different store layout.
    pub fn with_extractor(mut self, extractor: DetailExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze `keyword` in `country` against at most `limit` competitors.
    ///
    /// `limit` is clamped into `1..=max_limit`; a blank `country` falls back
    /// to the configured default.
    pub async fn analyze(
        &self,
        keyword: &str,
        country: &str,
        limit: usize,
    ) -> AnalyzeResult<AnalysisResult> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AnalyzeError::Input("keyword is required".to_string()));
        }

        let country = match country.trim() {
            "" => self.config.store.default_country.clone(),
            c => c.to_lowercase(),
        };
        let limit = self.config.effective_limit(Some(limit));

        info!(keyword, country = %country, limit, "starting analysis");

        let mut session = self
            .source
            .open_session()
            .await
            .map_err(|e| AnalyzeError::collaborator("could not open store session", &e))?;

        let search_html = session
            .search_page(keyword, &country)
            .await
            .map_err(|e| AnalyzeError::collaborator("search page unavailable", &e))?;

        let candidates = extract_candidates(&search_html, limit);
        info!(found = candidates.len(), "candidates discovered");

        let mut competitors = Vec::with_capacity(candidates.len());
        for (idx, package_id) in candidates.iter().enumerate() {
            if idx > 0 {
                self.pacer.pause().await;
            }

            let record = match session.detail_page(package_id, &country).await {
                Ok(page) => self.extractor.extract(package_id, &page),
                Err(e) => {
                    warn!(package_id = %package_id, error = %e, "detail extraction failed, keeping degraded record");
                    CompetitorRecord::degraded(package_id)
                }
            };
            competitors.push(record);
        }
        drop(session);

        let result = assemble_result(keyword, &country, limit, competitors, &self.config.scoring);
        info!(
            competitors = result.competitor_count,
            keywords = result.keywords.len(),
            average_installs = result.average_installs,
            "analysis finished"
        );
        Ok(result)
    }

    /// Autocomplete suggestions for `query`; a blank query yields no suggestions.
    pub async fn suggest(&self, query: &str) -> AnalyzeResult<Vec<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self
            .source
            .suggestion_text(query)
            .await
            .map_err(|e| AnalyzeError::collaborator("suggestion source unavailable", &e))?;

        Ok(parse_suggestions(&raw))
    }
}
