use crate::index::{IndexSnapshot, IndexedItem, TermVector};
use crate::tokenizer::count_terms;
use crate::types::{sort_and_truncate, ItemId, ScoredResult, Strategy};
use std::collections::HashMap;

/// Cosine of the angle between two sparse vectors; 0 when either has zero magnitude.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f32 {
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().filter_map(|(t, wa)| b.get(t).map(|wb| wa * wb)).sum();
    dot / (norm_a * norm_b)
}

pub fn magnitude(v: &TermVector) -> f32 {
    v.values().map(|w| w * w).sum::<f32>().sqrt()
}

/// Lexical TF-IDF ranking over a snapshot.
pub struct VectorRanker<'a> {
    snapshot: &'a IndexSnapshot,
}

impl<'a> VectorRanker<'a> {
    pub fn new(snapshot: &'a IndexSnapshot) -> Self {
        Self { snapshot }
    }

    /// Score items admitted by `admit` against already-normalized query tokens.
    pub fn rank<F>(&self, tokens: &[String], admit: F, limit: usize) -> Vec<ScoredResult>
    where
        F: Fn(&IndexedItem) -> bool,
    {
        let index = &self.snapshot.index;
        let query = index.weigh(&count_terms(tokens.iter().cloned()));
        let q_norm = magnitude(&query);
        if q_norm == 0.0 || limit == 0 {
            return Vec::new();
        }

        // Only items sharing a weighted term can score above zero.
        let mut dots: HashMap<ItemId, f32> = HashMap::new();
        for (term, q_w) in query.iter().filter(|(_, w)| **w != 0.0) {
            if let Some(postings) = index.postings.get(term) {
                for p in postings {
                    *dots.entry(p.item_id).or_insert(0.0) += p.weight * q_w;
                }
            }
        }

        let mut results: Vec<ScoredResult> = dots
            .into_iter()
            .filter_map(|(item_id, dot)| {
                let d_norm = index.docs.get(&item_id)?.norm;
                if d_norm == 0.0 {
                    return None;
                }
                let score = dot / (q_norm * d_norm);
                let item = self.snapshot.get(item_id)?;
                (score > 0.0 && admit(item)).then_some(ScoredResult { item_id, score, strategy: Strategy::Vector })
            })
            .collect();
        sort_and_truncate(&mut results, limit);
        tracing::debug!(terms = query.len(), hits = results.len(), "vector ranking");
        results
    }
}
