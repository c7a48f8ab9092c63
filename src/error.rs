//! Errors reported to callers of the analyzer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier for each user-visible failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputError,
    CollaboratorError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputError => "input_error",
            ErrorKind::CollaboratorError => "collaborator_error",
        }
    }
}

/// Failure of a whole `analyze` or `suggest` call.
///
/// Per-candidate extraction failures and malformed suggestion payloads are
/// recovered inside the pipeline and never surface here.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// The request itself is unusable; no collaborator was contacted.
    #[error("invalid input: {0}")]
    Input(String),

    /// The store could not be reached or its top-level response was unusable.
    #[error("store collaborator failed: {0}")]
    Collaborator(String),
}

impl AnalyzeError {
    pub fn collaborator(context: &str, err: &anyhow::Error) -> Self {
        AnalyzeError::Collaborator(format!("{context}: {err:#}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzeError::Input(_) => ErrorKind::InputError,
            AnalyzeError::Collaborator(_) => ErrorKind::CollaboratorError,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AnalyzeError::Input(detail) | AnalyzeError::Collaborator(detail) => detail,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            detail: self.detail().to_string(),
        }
    }
}

/// Serializable form of an [`AnalyzeError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub detail: String,
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;
