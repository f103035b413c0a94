use thiserror::Error;

/// Failures of the scoring pipeline. None of them is recoverable locally; the
/// caller decides how to present them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("answers incomplete for groups {groups:?}")]
    IncompleteAnswers { groups: Vec<u32> },

    #[error("group {group}: adjective {adjective_id} chosen as both most and least")]
    DuplicateSelection { group: u32, adjective_id: u32 },

    #[error("group {group}: adjective {adjective_id} is not part of this group")]
    InvalidAdjectiveReference { group: u32, adjective_id: u32 },

    #[error("no profile pattern for segno {segno}")]
    UnknownProfilePattern { segno: String },
}

impl ScoringError {
    pub fn code(&self) -> &'static str {
        match self {
            ScoringError::IncompleteAnswers { .. } => "incomplete_answers",
            ScoringError::DuplicateSelection { .. } => "duplicate_selection",
            ScoringError::InvalidAdjectiveReference { .. } => "invalid_adjective_reference",
            ScoringError::UnknownProfilePattern { .. } => "unknown_profile_pattern",
        }
    }
}

/// Problems found while loading the reference tables.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("failed to parse {table}: {source}")]
    Parse {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("question bank: {0}")]
    Bank(String),

    #[error("segment ranges ({graph}/{dimension}): {message}")]
    Ranges {
        graph: &'static str,
        dimension: char,
        message: String,
    },

    #[error("profile catalog: {0}")]
    Catalog(String),
}
