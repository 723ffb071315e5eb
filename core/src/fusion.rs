use crate::types::{rank_order, FusedResult, ItemId, ScoredResult, Strategy};
use std::collections::{BTreeSet, HashMap};

/// One strategy's raw output and the weight it carries into the merge.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub strategy: Strategy,
    pub weight: f32,
    pub results: Vec<ScoredResult>,
}

/// Weighted score aggregation: items found by several strategies accumulate
/// every weighted score, so agreement outranks a single strong signal.
pub fn fuse(runs: &[StrategyRun], limit: usize) -> Vec<FusedResult> {
    let mut merged: HashMap<ItemId, (f32, BTreeSet<Strategy>)> = HashMap::new();
    for run in runs {
        for r in &run.results {
            let entry = merged.entry(r.item_id).or_insert_with(|| (0.0, BTreeSet::new()));
            entry.0 += r.score * run.weight;
            entry.1.insert(run.strategy);
        }
    }

    let mut fused: Vec<FusedResult> = merged
        .into_iter()
        .map(|(item_id, (score, matched_strategies))| FusedResult { item_id, score, matched_strategies })
        .collect();
    fused.sort_by(|a, b| rank_order((a.score, a.item_id), (b.score, b.item_id)));
    fused.truncate(limit);
    fused
}
