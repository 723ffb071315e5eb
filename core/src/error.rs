use crate::types::Strategy;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("query has {tokens} tokens, fuzzy matching accepts at most {max}")]
    QueryTooLong { tokens: usize, max: usize },

    #[error("image search needs a reference: {0}")]
    MissingReference(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{strategy} strategy failed: {source}")]
    StrategyFailed {
        strategy: Strategy,
        #[source]
        source: Box<SearchError>,
    },
}

/// Non-fatal problems reported alongside results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWarning {
    InvalidQuery { message: String },
    StrategyFailed { strategy: Strategy, message: String },
}

impl SearchWarning {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        SearchWarning::InvalidQuery { message: message.into() }
    }
}

impl fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchWarning::InvalidQuery { message } => write!(f, "invalid query: {message}"),
            SearchWarning::StrategyFailed { strategy, message } => write!(f, "{strategy} strategy skipped: {message}"),
        }
    }
}
