//! Typo-tolerant matching by normalized Levenshtein similarity.
//!
//! Cost is O(|q|·|t|) per token pair, so only title and artist tokens are
//! compared and the query length is capped by `max_query_tokens`.

use crate::error::{Result, SearchError};
use crate::index::{IndexSnapshot, IndexedItem};
use crate::types::{sort_and_truncate, ScoredResult, Strategy};
use rayon::prelude::*;

/// Absorbs f32 rounding when a similarity sits exactly on the threshold.
const THRESHOLD_EPSILON: f32 = 1e-6;

/// Minimum single-character insertions, deletions and substitutions turning `a` into `b`.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ac) in a.chars().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, bc) in b_chars.iter().enumerate() {
            let above = row[j + 1];
            let cost = if ac == *bc { 0 } else { 1 };
            row[j + 1] = (above + 1).min(row[j] + 1).min(prev + cost);
            prev = above;
        }
    }
    row[b_chars.len()]
}

/// `1 - distance / max(len)`, in characters; two empty strings are identical.
pub fn levenshtein_similarity(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f32 / longest as f32
}

pub struct FuzzyMatcher<'a> {
    snapshot: &'a IndexSnapshot,
    threshold: f32,
    max_query_tokens: usize,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(snapshot: &'a IndexSnapshot, threshold: f32, max_query_tokens: usize) -> Self {
        Self { snapshot, threshold, max_query_tokens }
    }

    /// Best pairwise similarity between any query token and the item's title/artist tokens.
    pub fn item_score(tokens: &[String], item: &IndexedItem) -> f32 {
        let mut best = 0.0f32;
        for q in tokens {
            for t in &item.fuzzy_vocab {
                let s = levenshtein_similarity(q, t);
                if s > best {
                    best = s;
                    if best >= 1.0 {
                        return best;
                    }
                }
            }
        }
        best
    }

    pub fn rank<F>(&self, tokens: &[String], admit: F, limit: usize) -> Result<Vec<ScoredResult>>
    where
        F: Fn(&IndexedItem) -> bool + Sync,
    {
        if tokens.len() > self.max_query_tokens {
            return Err(SearchError::QueryTooLong { tokens: tokens.len(), max: self.max_query_tokens });
        }
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut results: Vec<ScoredResult> = self
            .snapshot
            .items()
            .par_iter()
            .filter(|&item| admit(item))
            .filter_map(|item| {
                let score = Self::item_score(tokens, item);
                (score > 0.0 && score + THRESHOLD_EPSILON >= self.threshold)
                    .then(|| ScoredResult { item_id: item.id(), score, strategy: Strategy::Fuzzy })
            })
            .collect();
        sort_and_truncate(&mut results, limit);
        tracing::debug!(tokens = tokens.len(), threshold = self.threshold, hits = results.len(), "fuzzy ranking");
        Ok(results)
    }
}
