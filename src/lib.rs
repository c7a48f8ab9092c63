//! App-store keyword research: competitor extraction and keyword difficulty scoring.
//!
//! The pipeline is `search page -> candidate ids -> detail pages ->
//! competitor records -> keyword frequencies -> difficulty`. Page fetching
//! lives behind [`source::StoreSource`]; everything else is pure and
//! testable against fixture markup.

pub mod analyzer;
pub mod candidates;
pub mod config;
pub mod crawler;
pub mod detail;
pub mod error;
pub mod keywords;
pub mod numeric;
pub mod pacing;
pub mod scoring;
pub mod source;
pub mod suggest;
pub mod text;

pub use analyzer::{assemble_result, AnalysisResult, Analyzer, RankedCompetitor};
pub use config::AnalyzerConfig;
pub use detail::{CompetitorRecord, DetailExtractor, DetailPage};
pub use error::{AnalyzeError, ErrorBody, ErrorKind};
pub use scoring::ScoredKeyword;
pub use source::{StoreSession, StoreSource};
