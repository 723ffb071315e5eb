mod common;

use artsearch_core::config::IdfMode;
use artsearch_core::query::SortOrder;
use artsearch_core::{
    CatalogItem, EngineConfig, ItemId, Query, SearchEngine, SearchError, SearchOptions, SearchType, SearchWarning,
    Strategy, StrategyWeights,
};
use common::{art, blue_pair, gallery};
use std::collections::BTreeSet;
use std::sync::Arc;

fn engine_with(items: &[CatalogItem]) -> SearchEngine {
    let engine = SearchEngine::new(EngineConfig::default()).unwrap();
    engine.index_corpus(items);
    engine
}

fn ids(engine: &SearchEngine, query: &str, options: &SearchOptions) -> Vec<ItemId> {
    engine.search(query, options).unwrap().results.iter().map(|r| r.item_id).collect()
}

#[test]
fn vector_search_finds_both_blue_items_with_smoothed_idf() {
    let cfg = EngineConfig { idf: IdfMode::Smoothed, ..EngineConfig::default() };
    let engine = SearchEngine::new(cfg).unwrap();
    engine.index_corpus(&blue_pair());
    let out = engine.search("blue", &SearchOptions::of(SearchType::Vector, 10)).unwrap();
    let got: Vec<ItemId> = out.results.iter().map(|r| r.item_id).collect();
    // item 2 repeats "abstract", diluting its share of the "blue" weight
    assert_eq!(got, vec![1, 2]);
    assert!(out.results[0].score > out.results[1].score);
}

#[test]
fn plain_idf_gives_ubiquitous_terms_no_weight() {
    let engine = engine_with(&blue_pair());
    assert!(ids(&engine, "blue", &SearchOptions::of(SearchType::Vector, 10)).is_empty());

    let mut items = blue_pair();
    items.push(art(3, "Red Harbor", "Park", "seascape"));
    let engine = engine_with(&items);
    assert_eq!(ids(&engine, "blue", &SearchOptions::of(SearchType::Vector, 10)), vec![1, 2]);
}

#[test]
fn typo_at_half_similarity_misses_default_fuzzy_threshold() {
    let engine = engine_with(&blue_pair());
    assert!(ids(&engine, "bule", &SearchOptions::of(SearchType::Fuzzy, 10)).is_empty());
    // the hybrid threshold is 0.5, so the same typo is admitted there
    let hybrid = engine.search("bule", &SearchOptions::default()).unwrap();
    let got: BTreeSet<ItemId> = hybrid.results.iter().map(|r| r.item_id).collect();
    assert_eq!(got, BTreeSet::from([1, 2]));
    assert!(hybrid.results.iter().all(|r| r.matched_strategies == BTreeSet::from([Strategy::Fuzzy])));
}

#[test]
fn similarity_exactly_at_fuzzy_threshold_is_kept() {
    let engine = engine_with(&blue_pair());
    let out = engine.search("bluxy", &SearchOptions::of(SearchType::Fuzzy, 10)).unwrap();
    let got: Vec<ItemId> = out.results.iter().map(|r| r.item_id).collect();
    assert_eq!(got, vec![1, 2]);
    assert!(out.results.iter().all(|r| (r.score - 0.6).abs() < 1e-6));
}

#[test]
fn words_resembling_stripped_contractions_stay_searchable() {
    let engine = engine_with(&[
        art(1, "Sea Shell", "Ito", "photograph"),
        art(2, "Garden Shed", "Ruiz", "painting"),
        art(3, "River", "Ito", "painting"),
    ]);
    for search_type in [SearchType::Vector, SearchType::Fuzzy, SearchType::Hybrid] {
        let options = SearchOptions::of(search_type, 10);
        assert_eq!(ids(&engine, "shell", &options).first(), Some(&1), "{search_type:?}");
        assert_eq!(ids(&engine, "shed", &options).first(), Some(&2), "{search_type:?}");
    }
}

#[test]
fn fuzzy_tolerates_single_typo() {
    let engine = engine_with(&gallery());
    let out = engine.search("moreu", &SearchOptions::of(SearchType::Fuzzy, 10)).unwrap();
    assert_eq!(out.results[0].item_id, 4);
    assert!((out.results[0].score - (1.0 - 1.0 / 6.0)).abs() < 1e-6);
}

#[test]
fn item_ranks_first_for_its_own_text() {
    let items = gallery();
    let engine = engine_with(&items);
    for item in items.iter().filter(|i| !i.description.is_empty()) {
        let got = engine.search(Query::free_text(item.indexed_text()), &SearchOptions::of(SearchType::Vector, 3)).unwrap();
        assert_eq!(got.results[0].item_id, item.id, "item {} should rank itself first", item.id);
        assert!((got.results[0].score - 1.0).abs() < 1e-4);
    }
}

#[test]
fn semantic_search_reaches_synonyms_and_boosts() {
    let engine = engine_with(&gallery());
    // "ocean" only appears in item 5; "sea" -> ocean/marine/seascape
    assert!(ids(&engine, "sea", &SearchOptions::of(SearchType::Vector, 10)).is_empty());
    let out = engine.search("sea", &SearchOptions::of(SearchType::Semantic, 10)).unwrap();
    assert_eq!(out.results[0].item_id, 5);

    let vector = engine.search("harbor", &SearchOptions::of(SearchType::Vector, 1)).unwrap();
    let semantic = engine.search("harbor", &SearchOptions::of(SearchType::Semantic, 1)).unwrap();
    assert!((semantic.results[0].score - vector.results[0].score * 1.2).abs() < 1e-5);
}

#[test]
fn similar_to_never_returns_the_reference() {
    let engine = engine_with(&gallery());
    let similar = engine.similar_to(1, 5).unwrap();
    assert!(!similar.is_empty());
    assert!(similar.iter().all(|r| r.item_id != 1));
    // same artist, category, close price and palette
    assert_eq!(similar[0].item_id, 3);
    assert!(similar.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn similar_to_unknown_item_is_not_found() {
    let engine = engine_with(&gallery());
    assert!(engine.similar_to(999, 5).is_none());
}

#[test]
fn image_search_by_reference_and_palette() {
    let engine = engine_with(&gallery());
    let like = ids(&engine, "like:1", &SearchOptions::of(SearchType::Image, 3));
    assert_eq!(like.first(), Some(&3));
    assert!(!like.contains(&1));

    let palette = ids(&engine, "colors:#0ea5e9,#f1f5f9", &SearchOptions::of(SearchType::Image, 3));
    assert_eq!(palette.first(), Some(&5));

    let err = engine.search("blue", &SearchOptions::of(SearchType::Image, 3)).unwrap_err();
    assert!(matches!(err, SearchError::MissingReference(_)));
}

#[test]
fn hybrid_respects_limit_with_overfetch() {
    let mut items: Vec<CatalogItem> = (0..30).map(|i| art(i, &format!("Blue study {i}"), "Anon", "drawing")).collect();
    items.extend((30..35).map(|i| art(i, "Charcoal figure", "Anon", "drawing")));
    let engine = engine_with(&items);
    let out = engine.search("blue", &SearchOptions::of(SearchType::Hybrid, 10)).unwrap();
    assert_eq!(out.results.len(), 10);
    assert!(out.warnings.is_empty());
    assert!(out.results.iter().all(|r| r.matched_strategies.len() == 3));
}

#[test]
fn failing_strategy_becomes_a_warning() {
    let engine = engine_with(&gallery());
    let options = SearchOptions {
        strategies: BTreeSet::from([Strategy::Vector, Strategy::Image]),
        ..SearchOptions::of(SearchType::Hybrid, 5)
    };
    let out = engine.search("harbor", &options).unwrap();
    assert_eq!(out.results[0].item_id, 3);
    assert!(matches!(
        out.warnings.as_slice(),
        [SearchWarning::StrategyFailed { strategy: Strategy::Image, .. }]
    ));

    let strict = SearchOptions { strict: true, ..options };
    let err = engine.search("harbor", &strict).unwrap_err();
    assert!(matches!(err, SearchError::StrategyFailed { strategy: Strategy::Image, .. }));
}

#[test]
fn overlong_query_fails_fuzzy_only() {
    let engine = engine_with(&gallery());
    let long: String = (0..20).map(|i| format!("word{i} ")).collect::<String>() + "harbor";
    let err = engine.search(Query::free_text(long.clone()), &SearchOptions::of(SearchType::Fuzzy, 5)).unwrap_err();
    assert!(matches!(err, SearchError::QueryTooLong { tokens: 21, max: 16 }));

    let out = engine.search(Query::free_text(long), &SearchOptions::default()).unwrap();
    assert!(out.warnings.iter().any(|w| matches!(w, SearchWarning::StrategyFailed { strategy: Strategy::Fuzzy, .. })));
}

#[test]
fn boolean_clauses_and_filters_constrain_results() {
    let engine = engine_with(&gallery());
    let vector = SearchOptions::of(SearchType::Vector, 10);
    assert_eq!(ids(&engine, "kim OR harbor", &vector), vec![3, 1]);
    assert_eq!(ids(&engine, "kim NOT harbor", &vector), vec![1]);
    assert_eq!(ids(&engine, "kim price:1150-2000", &vector), vec![1]);
    assert_eq!(ids(&engine, "kim category:Landscape year:2001", &vector), vec![3]);
    assert_eq!(ids(&engine, r#""boats at anchor""#, &vector), vec![3]);
    assert!(ids(&engine, r#""anchor boats""#, &vector).is_empty());
}

#[test]
fn invalid_filter_is_dropped_not_fatal() {
    let engine = engine_with(&gallery());
    let out = engine.search("kim price:lots", &SearchOptions::of(SearchType::Vector, 10)).unwrap();
    assert_eq!(out.results.len(), 2);
    assert!(matches!(out.warnings.as_slice(), [SearchWarning::InvalidQuery { .. }]));
}

#[test]
fn sort_order_reorders_final_list() {
    let engine = engine_with(&gallery());
    let out = engine.search("kim sort:price_asc", &SearchOptions::of(SearchType::Vector, 10)).unwrap();
    let got: Vec<ItemId> = out.results.iter().map(|r| r.item_id).collect();
    assert_eq!(got, vec![3, 1]);
    assert_eq!(Query::from("sort:year_desc").filters.sort, SortOrder::YearDesc);
}

#[test]
fn empty_corpus_yields_empty_results_everywhere() {
    let engine = SearchEngine::new(EngineConfig::default()).unwrap();
    for t in [SearchType::Vector, SearchType::Semantic, SearchType::Fuzzy, SearchType::Hybrid] {
        assert!(engine.search("blue", &SearchOptions::of(t, 10)).unwrap().results.is_empty());
    }
    assert!(engine.similar_to(1, 5).is_none());
}

#[test]
fn repeated_queries_are_identical() {
    let engine = engine_with(&gallery());
    let options = SearchOptions::default();
    let first = engine.search("blue landscape sunset", &options).unwrap().results;
    for _ in 0..10 {
        assert_eq!(engine.search("blue landscape sunset", &options).unwrap().results, first);
    }
}

#[test]
fn per_call_weights_override_config() {
    let engine = engine_with(&gallery());
    let only_fuzzy = StrategyWeights { vector: 0.0, semantic: 0.0, fuzzy: 1.0, image: 0.0 };
    let options = SearchOptions { weights: Some(only_fuzzy), ..SearchOptions::default() };
    let out = engine.search("harbor", &options).unwrap();
    assert_eq!(out.results[0].item_id, 3);
    assert!((out.results[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn readers_never_see_a_partial_index() {
    let engine = Arc::new(engine_with(&gallery()));
    let replacement: Vec<CatalogItem> = (100..140)
        .map(|i| {
            let title = if i % 2 == 0 { format!("Harbor view {i}") } else { format!("Quiet field {i}") };
            art(i, &title, "Park", "seascape")
        })
        .collect();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let engine = Arc::clone(&engine);
            s.spawn(move || {
                for _ in 0..50 {
                    let snapshot = engine.snapshot();
                    let got = engine.search("harbor", &SearchOptions::of(SearchType::Vector, 50)).unwrap();
                    assert!(!got.results.is_empty());
                    let from_old = got.results.iter().all(|r| r.item_id == 3);
                    let from_new = got.results.iter().all(|r| r.item_id >= 100 && r.item_id % 2 == 0);
                    assert!(from_old || from_new, "results mixed two index generations");
                    assert!(snapshot.len() == 6 || snapshot.len() == 40);
                }
            });
        }
        let writer = Arc::clone(&engine);
        let items = replacement.clone();
        s.spawn(move || {
            for _ in 0..10 {
                writer.index_corpus(&items);
            }
        });
    });
    assert_eq!(engine.stats().items, 40);
    assert_eq!(engine.stats().generation, 11);
}
