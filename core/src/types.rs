use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

pub type ItemId = u64;

/// Immutable artwork snapshot as supplied by the catalog store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "creationYear", alias = "creation_year")]
    pub year: Option<i32>,
    /// Dominant colors, most prominent first, as `#rrggbb` / `#rgb` codes.
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl CatalogItem {
    /// Text fields that feed the inverted index.
    pub fn indexed_text(&self) -> String {
        format!("{} {} {} {}", self.title, self.description, self.artist, self.category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Vector,
    Semantic,
    Fuzzy,
    Image,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::Vector, Strategy::Semantic, Strategy::Fuzzy, Strategy::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Vector => "vector",
            Strategy::Semantic => "semantic",
            Strategy::Fuzzy => "fuzzy",
            Strategy::Image => "image",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub item_id: ItemId,
    pub score: f32,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedResult {
    pub item_id: ItemId,
    pub score: f32,
    pub matched_strategies: BTreeSet<Strategy>,
}

impl From<ScoredResult> for FusedResult {
    fn from(r: ScoredResult) -> Self {
        FusedResult { item_id: r.item_id, score: r.score, matched_strategies: BTreeSet::from([r.strategy]) }
    }
}

/// Descending score, then ascending item id.
pub(crate) fn rank_order(a: (f32, ItemId), b: (f32, ItemId)) -> Ordering {
    b.0.total_cmp(&a.0).then(a.1.cmp(&b.1))
}

pub(crate) fn sort_and_truncate(results: &mut Vec<ScoredResult>, limit: usize) {
    results.sort_by(|a, b| rank_order((a.score, a.item_id), (b.score, b.item_id)));
    results.truncate(limit);
}
