use crate::index::{IndexSnapshot, IndexedItem};
use crate::tokenizer::Tokenizer;
use crate::types::{ScoredResult, Strategy};
use crate::vector::VectorRanker;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Canonical term -> equivalents, normalized into the tokenizer's term space.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    groups: Vec<Vec<String>>, // canonical first, then siblings
    membership: HashMap<String, Vec<usize>>,
}

impl SynonymTable {
    pub fn new(raw: &BTreeMap<String, Vec<String>>, tokenizer: &Tokenizer) -> Self {
        let mut groups = Vec::with_capacity(raw.len());
        let mut membership: HashMap<String, Vec<usize>> = HashMap::new();
        for (key, values) in raw {
            let mut group: Vec<String> = Vec::new();
            for term in std::iter::once(key).chain(values).flat_map(|s| tokenizer.tokenize(s)) {
                if !group.contains(&term) {
                    group.push(term);
                }
            }
            if group.is_empty() {
                continue;
            }
            let idx = groups.len();
            for term in &group {
                membership.entry(term.clone()).or_default().push(idx);
            }
            groups.push(group);
        }
        Self { groups, membership }
    }

    /// Every term sharing a group with `token`, including the canonical key and `token` itself.
    pub fn equivalents(&self, token: &str) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        if let Some(idxs) = self.membership.get(token) {
            for &i in idxs {
                out.extend(self.groups[i].iter().map(String::as_str));
            }
        }
        out
    }

    /// Original tokens followed by each newly introduced equivalent, once.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut seen: HashSet<String> = tokens.iter().cloned().collect();
        let mut expanded = tokens.to_vec();
        for token in tokens {
            for term in self.equivalents(token) {
                if seen.insert(term.to_string()) {
                    expanded.push(term.to_string());
                }
            }
        }
        expanded
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Vector ranking over a synonym-expanded query with a flat score boost.
pub struct SemanticExpander<'a> {
    ranker: VectorRanker<'a>,
    synonyms: &'a SynonymTable,
    boost: f32,
}

impl<'a> SemanticExpander<'a> {
    pub fn new(snapshot: &'a IndexSnapshot, synonyms: &'a SynonymTable, boost: f32) -> Self {
        Self { ranker: VectorRanker::new(snapshot), synonyms, boost }
    }

    pub fn rank<F>(&self, tokens: &[String], admit: F, limit: usize) -> Vec<ScoredResult>
    where
        F: Fn(&IndexedItem) -> bool,
    {
        let expanded = self.synonyms.expand(tokens);
        tracing::debug!(original = tokens.len(), expanded = expanded.len(), "semantic expansion");
        self.ranker
            .rank(&expanded, admit, limit)
            .into_iter()
            .map(|r| ScoredResult { score: r.score * self.boost, strategy: Strategy::Semantic, ..r })
            .collect()
    }
}
