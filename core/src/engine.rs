use crate::config::{EngineConfig, StrategyWeights};
use crate::error::{Result, SearchError, SearchWarning};
use crate::fusion::{fuse, StrategyRun};
use crate::fuzzy::FuzzyMatcher;
use crate::index::{IndexSnapshot, IndexedItem};
use crate::query::{ImageReference, Query, QueryPlan, SortOrder};
use crate::semantic::{SemanticExpander, SynonymTable};
use crate::similarity::{Rgb, SimilarityRanker};
use crate::tokenizer::Tokenizer;
use crate::types::{CatalogItem, FusedResult, ItemId, ScoredResult, Strategy};
use crate::vector::VectorRanker;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Vector,
    Semantic,
    Fuzzy,
    Image,
    #[default]
    Hybrid,
}

impl FromStr for SearchType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Ok(SearchType::Vector),
            "semantic" => Ok(SearchType::Semantic),
            "fuzzy" => Ok(SearchType::Fuzzy),
            "image" => Ok(SearchType::Image),
            "hybrid" => Ok(SearchType::Hybrid),
            other => Err(SearchError::InvalidQuery(format!("unknown search type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub search_type: SearchType,
    pub limit: usize,
    /// Overrides the configured fusion weights for this call.
    pub weights: Option<StrategyWeights>,
    /// Strategies fused by a hybrid search; defaults to vector, semantic and fuzzy.
    pub strategies: BTreeSet<Strategy>,
    /// Fail the whole hybrid call when any strategy fails.
    pub strict: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_type: SearchType::Hybrid,
            limit: 10,
            weights: None,
            strategies: BTreeSet::from([Strategy::Vector, Strategy::Semantic, Strategy::Fuzzy]),
            strict: false,
        }
    }
}

impl SearchOptions {
    pub fn of(search_type: SearchType, limit: usize) -> Self {
        Self { search_type, limit, ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<FusedResult>,
    pub warnings: Vec<SearchWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub items: usize,
    pub terms: usize,
    pub colored_items: usize,
    pub generation: u64,
    pub built_at: String,
}

impl IndexStats {
    fn of(snapshot: &IndexSnapshot) -> Self {
        Self {
            items: snapshot.len(),
            terms: snapshot.index.num_terms(),
            colored_items: snapshot.colors.len(),
            generation: snapshot.generation,
            built_at: snapshot.built_at.clone(),
        }
    }
}

/// Owned by the host application; share it behind an `Arc` for concurrent readers.
pub struct SearchEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    synonyms: SynonymTable,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    /// Serializes rebuilds so generations follow call order; readers never take it.
    rebuild: Mutex<()>,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.tokenizer);
        let synonyms = SynonymTable::new(&config.synonyms, &tokenizer);
        Ok(Self {
            config,
            tokenizer,
            synonyms,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::default())),
            rebuild: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuild from a full corpus and publish it in one swap. In-flight queries
    /// keep the snapshot they started with. Concurrent rebuilds run one at a
    /// time, so the corpus published last carries the highest generation.
    pub fn index_corpus(&self, items: &[CatalogItem]) -> IndexStats {
        let _rebuilding = self.rebuild.lock();
        let start = Instant::now();
        let mut next = IndexSnapshot::build(items, &self.tokenizer, self.config.idf);
        next.built_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

        let mut current = self.snapshot.write();
        next.generation = current.generation + 1;
        let stats = IndexStats::of(&next);
        *current = Arc::new(next);
        drop(current);

        tracing::info!(
            items = stats.items,
            terms = stats.terms,
            generation = stats.generation,
            took_ms = start.elapsed().as_millis() as u64,
            "index published"
        );
        stats
    }

    /// The snapshot current at call time; never changes underneath the caller.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats::of(&self.snapshot())
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// `None` when the item is not in the current snapshot.
    pub fn similar_to(&self, item_id: ItemId, limit: usize) -> Option<Vec<ScoredResult>> {
        let snapshot = self.snapshot();
        SimilarityRanker::new(&snapshot, &self.config.similarity).similar_to(item_id, |_| true, limit)
    }

    pub fn search<Q: Into<Query>>(&self, query: Q, options: &SearchOptions) -> Result<SearchOutcome> {
        let query: Query = query.into();
        let snapshot = self.snapshot();
        let plan = QueryPlan::new(&query, &self.tokenizer);
        let mut warnings = query.warnings.clone();
        let limit = options.limit;

        let mut results = match options.search_type {
            SearchType::Hybrid => self.hybrid(&snapshot, &query, &plan, options, &mut warnings)?,
            single => {
                let strategy = match single {
                    SearchType::Vector => Strategy::Vector,
                    SearchType::Semantic => Strategy::Semantic,
                    SearchType::Fuzzy => Strategy::Fuzzy,
                    _ => Strategy::Image,
                };
                let threshold = self.config.fuzzy.threshold;
                self.run_strategy(&snapshot, strategy, &query, &plan, limit, threshold, &mut warnings)?
                    .into_iter()
                    .map(FusedResult::from)
                    .collect()
            }
        };
        apply_sort(&mut results, plan.filters.sort, &snapshot);
        Ok(SearchOutcome { results, warnings })
    }

    fn hybrid(
        &self,
        snapshot: &IndexSnapshot,
        query: &Query,
        plan: &QueryPlan,
        options: &SearchOptions,
        warnings: &mut Vec<SearchWarning>,
    ) -> Result<Vec<FusedResult>> {
        let weights = options.weights.unwrap_or(self.config.fusion.weights);
        let fetch = options.limit.saturating_mul(self.config.fusion.overfetch);
        let threshold = self.config.fuzzy.hybrid_threshold;
        let mut runs = Vec::with_capacity(options.strategies.len());
        for &strategy in &options.strategies {
            let start = Instant::now();
            match self.run_strategy(snapshot, strategy, query, plan, fetch, threshold, warnings) {
                Ok(results) => {
                    tracing::debug!(%strategy, hits = results.len(), took_us = start.elapsed().as_micros() as u64, "strategy finished");
                    runs.push(StrategyRun { strategy, weight: weights.get(strategy), results });
                }
                Err(err) if options.strict => {
                    return Err(SearchError::StrategyFailed { strategy, source: Box::new(err) });
                }
                Err(err) => {
                    tracing::warn!(%strategy, error = %err, "strategy failed, fusing the rest");
                    warnings.push(SearchWarning::StrategyFailed { strategy, message: err.to_string() });
                }
            }
        }
        Ok(fuse(&runs, options.limit))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_strategy(
        &self,
        snapshot: &IndexSnapshot,
        strategy: Strategy,
        query: &Query,
        plan: &QueryPlan,
        limit: usize,
        fuzzy_threshold: f32,
        warnings: &mut Vec<SearchWarning>,
    ) -> Result<Vec<ScoredResult>> {
        let admit = |item: &IndexedItem| plan.admits(item);
        match strategy {
            Strategy::Vector => Ok(VectorRanker::new(snapshot).rank(
                &plan.tokens,
                |item| admit(item) && plan.satisfies_must(item, None),
                limit,
            )),
            Strategy::Semantic => {
                let expander = SemanticExpander::new(snapshot, &self.synonyms, self.config.semantic_boost);
                Ok(expander.rank(&plan.tokens, |item| admit(item) && plan.satisfies_must(item, Some(&self.synonyms)), limit))
            }
            Strategy::Fuzzy => {
                FuzzyMatcher::new(snapshot, fuzzy_threshold, self.config.fuzzy.max_query_tokens).rank(&plan.tokens, admit, limit)
            }
            Strategy::Image => {
                let ranker = SimilarityRanker::new(snapshot, &self.config.similarity);
                match &query.reference {
                    Some(ImageReference::Item(id)) => Ok(ranker.similar_to(*id, admit, limit).unwrap_or_else(|| {
                        warnings.push(SearchWarning::invalid_query(format!("like: item {id} is not in the catalog")));
                        Vec::new()
                    })),
                    Some(ImageReference::Palette(codes)) => {
                        let palette: Vec<Rgb> = codes.iter().filter_map(|c| Rgb::parse(c)).collect();
                        if palette.is_empty() {
                            return Err(SearchError::MissingReference("colors: has no valid color codes"));
                        }
                        Ok(ranker.rank_palette(&palette, admit, limit))
                    }
                    None => Err(SearchError::MissingReference("use like:<item id> or colors:<#hex,...>")),
                }
            }
        }
    }
}

/// Reorders an already ranked list; items missing the sort key go last, ties by id.
fn apply_sort(results: &mut [FusedResult], order: SortOrder, snapshot: &IndexSnapshot) {
    if order == SortOrder::Relevance {
        return;
    }
    let key = |r: &FusedResult| -> Option<f64> {
        let item = &snapshot.get(r.item_id)?.item;
        match order {
            SortOrder::PriceAsc | SortOrder::PriceDesc => item.price,
            SortOrder::YearAsc | SortOrder::YearDesc => item.year.map(f64::from),
            SortOrder::Relevance => None,
        }
    };
    let descending = matches!(order, SortOrder::PriceDesc | SortOrder::YearDesc);
    results.sort_by(|a, b| {
        let ord = match (key(a), key(b)) {
            (Some(x), Some(y)) if descending => y.total_cmp(&x),
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then(a.item_id.cmp(&b.item_id))
    });
}
