use crate::config::IdfMode;
use crate::similarity::Rgb;
use crate::tokenizer::{count_terms, TermCounts, Tokenizer};
use crate::types::{CatalogItem, ItemId};
use std::collections::{BTreeMap, HashMap};

/// Term -> weight, ordered so dot products sum in a fixed order.
pub type TermVector = BTreeMap<String, f32>;

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub item_id: ItemId,
    pub weight: f32, // raw count * idf
}

#[derive(Debug, Clone, Default)]
pub struct DocVector {
    pub weights: TermVector,
    pub norm: f32,
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub postings: HashMap<String, Vec<Posting>>, // postings sorted by item_id
    pub idf: HashMap<String, f32>,
    pub docs: HashMap<ItemId, DocVector>,
    pub num_docs: usize,
}

impl InvertedIndex {
    /// `docs` must be sorted by item id.
    pub fn build(docs: &[(ItemId, TermCounts)], mode: IdfMode) -> Self {
        let num_docs = docs.len();
        let mut df: HashMap<&str, u32> = HashMap::new();
        for (_, counts) in docs {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        let idf: HashMap<String, f32> =
            df.iter().map(|(term, d)| (term.to_string(), mode.idf(num_docs, *d))).collect();

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut vectors = HashMap::with_capacity(num_docs);
        for (item_id, counts) in docs {
            let mut weights = TermVector::new();
            for (term, raw) in counts {
                let weight = *raw as f32 * idf.get(term).copied().unwrap_or(0.0);
                postings.entry(term.clone()).or_default().push(Posting { item_id: *item_id, weight });
                weights.insert(term.clone(), weight);
            }
            let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
            vectors.insert(*item_id, DocVector { weights, norm });
        }
        Self { postings, idf, docs: vectors, num_docs }
    }

    /// Terms never seen in the corpus have idf 0.
    pub fn idf(&self, term: &str) -> f32 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize {
        self.idf.len()
    }

    /// Raw query counts weighted by corpus idf.
    pub fn weigh(&self, counts: &TermCounts) -> TermVector {
        counts.iter().map(|(t, c)| (t.clone(), *c as f32 * self.idf(t))).collect()
    }
}

/// Per-item ordered dominant colors, consumed only by similarity ranking.
#[derive(Debug, Default)]
pub struct ColorIndex {
    colors: HashMap<ItemId, Vec<Rgb>>,
}

impl ColorIndex {
    pub fn build<'a, I: IntoIterator<Item = &'a CatalogItem>>(items: I) -> Self {
        let mut colors = HashMap::new();
        for item in items {
            let mut palette = Vec::with_capacity(item.colors.len());
            for code in &item.colors {
                match Rgb::parse(code) {
                    Some(rgb) => palette.push(rgb),
                    None => tracing::warn!(item_id = item.id, code = %code, "skipping malformed color code"),
                }
            }
            if !palette.is_empty() {
                colors.insert(item.id, palette);
            }
        }
        Self { colors }
    }

    pub fn get(&self, id: ItemId) -> &[Rgb] {
        self.colors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IndexedItem {
    pub item: CatalogItem,
    /// Normalized full-text token sequence, used for phrase and exclusion checks.
    pub tokens: Vec<String>,
    /// Distinct title + artist tokens for fuzzy matching.
    pub fuzzy_vocab: Vec<String>,
}

impl IndexedItem {
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn contains_run(&self, run: &[String]) -> bool {
        match run.len() {
            0 => true,
            1 => self.tokens.iter().any(|t| t == &run[0]),
            n => self.tokens.windows(n).any(|w| w == run),
        }
    }
}

/// One immutable, fully built view of the corpus. Published whole, never mutated.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    items: Vec<IndexedItem>, // sorted by id
    positions: HashMap<ItemId, usize>,
    pub index: InvertedIndex,
    pub colors: ColorIndex,
    pub generation: u64,
    pub built_at: String,
}

impl IndexSnapshot {
    /// Pure function of the item list; duplicate ids keep the last occurrence.
    pub fn build(items: &[CatalogItem], tokenizer: &Tokenizer, mode: IdfMode) -> Self {
        let mut by_id: BTreeMap<ItemId, &CatalogItem> = BTreeMap::new();
        for item in items {
            if by_id.insert(item.id, item).is_some() {
                tracing::warn!(item_id = item.id, "duplicate item id in corpus, keeping last occurrence");
            }
        }

        let mut indexed = Vec::with_capacity(by_id.len());
        let mut docs = Vec::with_capacity(by_id.len());
        for item in by_id.into_values() {
            let tokens = tokenizer.tokenize(&item.indexed_text());
            let mut fuzzy_vocab = tokenizer.tokenize(&format!("{} {}", item.title, item.artist));
            fuzzy_vocab.sort();
            fuzzy_vocab.dedup();
            docs.push((item.id, count_terms(tokens.iter().cloned())));
            indexed.push(IndexedItem { item: item.clone(), tokens, fuzzy_vocab });
        }

        let index = InvertedIndex::build(&docs, mode);
        let colors = ColorIndex::build(indexed.iter().map(|i| &i.item));
        let positions = indexed.iter().enumerate().map(|(pos, i)| (i.id(), pos)).collect();
        Self { items: indexed, positions, index, colors, generation: 0, built_at: String::new() }
    }

    pub fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&IndexedItem> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
