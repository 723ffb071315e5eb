pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod fuzzy;
pub mod index;
pub mod query;
pub mod semantic;
pub mod similarity;
pub mod tokenizer;
pub mod types;
pub mod vector;

pub use config::{EngineConfig, IdfMode, StrategyWeights};
pub use engine::{IndexStats, SearchEngine, SearchOptions, SearchOutcome, SearchType};
pub use error::{Result, SearchError, SearchWarning};
pub use index::IndexSnapshot;
pub use query::{Query, QueryParser};
pub use types::{CatalogItem, FusedResult, ItemId, ScoredResult, Strategy};
