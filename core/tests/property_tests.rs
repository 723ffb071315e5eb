//! Algebraic properties of the scoring primitives.

mod common;

use artsearch_core::fusion::{fuse, StrategyRun};
use artsearch_core::fuzzy::{levenshtein_distance, levenshtein_similarity};
use artsearch_core::index::TermVector;
use artsearch_core::vector::cosine_similarity;
use artsearch_core::{EngineConfig, ItemId, ScoredResult, SearchEngine, SearchOptions, Strategy as Tag};
use proptest::prelude::*;

fn term_vector() -> impl Strategy<Value = TermVector> {
    prop::collection::btree_map("[a-z]{2,8}", 0.01f32..50.0, 1..12)
}

fn hits(strategy: Tag) -> impl Strategy<Value = Vec<ScoredResult>> {
    prop::collection::btree_map(0u64..40, 0.01f32..1.0, 0..15).prop_map(move |m| {
        m.into_iter().map(|(item_id, score)| ScoredResult { item_id, score, strategy }).collect()
    })
}

fn rank_of(runs: &[StrategyRun], id: ItemId) -> Option<usize> {
    fuse(runs, usize::MAX).iter().position(|r| r.item_id == id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_cosine_self_similarity_is_one(v in term_vector()) {
        let s = cosine_similarity(&v, &v);
        prop_assert!((s - 1.0).abs() < 1e-4, "cosine(v, v) = {}", s);
    }

    #[test]
    fn prop_cosine_is_symmetric_and_bounded(a in term_vector(), b in term_vector()) {
        let ab = cosine_similarity(&a, &b);
        prop_assert!((ab - cosine_similarity(&b, &a)).abs() < 1e-5);
        prop_assert!((0.0..=1.0 + 1e-5).contains(&ab));
    }

    #[test]
    fn prop_levenshtein_identity(a in "\\PC{0,24}") {
        prop_assert_eq!(levenshtein_distance(&a, &a), 0);
        prop_assert_eq!(levenshtein_similarity(&a, &a), 1.0);
    }

    #[test]
    fn prop_levenshtein_symmetric_and_bounded(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
        let d = levenshtein_distance(&a, &b);
        prop_assert_eq!(d, levenshtein_distance(&b, &a));
        prop_assert!(d <= a.len().max(b.len()));
        prop_assert!(d >= a.len().abs_diff(b.len()));
    }

    /// Raising the weight of the only strategy that found an item never lowers its rank.
    #[test]
    fn prop_fusion_weight_monotonic(
        vector in hits(Tag::Vector),
        fuzzy in hits(Tag::Fuzzy),
        solo_score in 0.01f32..1.0,
        w in 0.0f32..1.0,
        bump in 0.0f32..1.0,
    ) {
        let solo: ItemId = 1_000;
        let semantic = vec![ScoredResult { item_id: solo, score: solo_score, strategy: Tag::Semantic }];
        let runs = |sw: f32| vec![
            StrategyRun { strategy: Tag::Vector, weight: 0.4, results: vector.clone() },
            StrategyRun { strategy: Tag::Semantic, weight: sw, results: semantic.clone() },
            StrategyRun { strategy: Tag::Fuzzy, weight: 0.2, results: fuzzy.clone() },
        ];
        let before = rank_of(&runs(w), solo).unwrap();
        let after = rank_of(&runs(w + bump), solo).unwrap();
        prop_assert!(after <= before, "rank went from {} to {}", before, after);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_search_is_deterministic(query in "(blue|kim|harbor|sunset|ocean|moreau|bule|lady) {0,1}(green|dusk|abstract)?") {
        let engine = SearchEngine::new(EngineConfig::default()).unwrap();
        engine.index_corpus(&common::gallery());
        let options = SearchOptions::default();
        let first = engine.search(query.as_str(), &options).unwrap().results;
        let second = engine.search(query.as_str(), &options).unwrap().results;
        prop_assert_eq!(first, second);
    }
}
