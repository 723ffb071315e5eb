//! Flat boolean query language.
//!
//! `AND` / `OR` / `NOT` switch the clause that following terms join (must by
//! default). `"quoted text"` is one atomic phrase. `field:value` tokens set
//! filters; a repeated field overwrites the earlier value. There is no
//! grouping or nesting.

use crate::error::SearchWarning;
use crate::index::IndexedItem;
use crate::semantic::SynonymTable;
use crate::similarity::Rgb;
use crate::tokenizer::Tokenizer;
use crate::types::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    YearAsc,
    YearDesc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "price_asc" | "price" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "year_asc" | "year" => Ok(SortOrder::YearAsc),
            "year_desc" => Ok(SortOrder::YearDesc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Inclusive bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |m| price >= m) && self.max.map_or(true, |m| price <= m)
    }
}

impl FromStr for PriceRange {
    type Err = String;

    /// `min-max`, `min-`, `-max`, or a single exact value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bound = |raw: &str| -> Result<Option<f64>, String> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
                _ => Err(format!("price bound '{raw}' is not a number")),
            }
        };
        let range = match s.split_once('-') {
            Some((lo, hi)) => PriceRange { min: bound(lo)?, max: bound(hi)? },
            None => {
                let exact = bound(s)?;
                PriceRange { min: exact, max: exact }
            }
        };
        match (range.min, range.max) {
            (None, None) => Err(format!("price range '{s}' has no bounds")),
            (Some(lo), Some(hi)) if lo > hi => Err(format!("price range '{s}' has min above max")),
            _ => Ok(range),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldFilters {
    pub category: Option<String>,
    pub price: Option<PriceRange>,
    pub sort: SortOrder,
}

/// Reference for visual search: an existing item or a probe palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageReference {
    Item(ItemId),
    Palette(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub must: Vec<String>,
    pub should: Vec<String>,
    pub must_not: Vec<String>,
    pub filters: FieldFilters,
    /// Unrecognized `field:value` pairs, kept verbatim.
    pub fields: BTreeMap<String, String>,
    pub reference: Option<ImageReference>,
    /// The raw input, fallback ranking text when no clause was parsed.
    pub text: String,
    #[serde(skip)]
    pub warnings: Vec<SearchWarning>,
}

impl Query {
    /// Plain free text with no structure; ranked as-is.
    pub fn free_text(text: impl Into<String>) -> Self {
        Query { text: text.into(), ..Query::default() }
    }

    fn has_clauses(&self) -> bool {
        !(self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty())
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        QueryParser::parse(raw)
    }
}

impl From<String> for Query {
    fn from(raw: String) -> Self {
        QueryParser::parse(&raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Must,
    Should,
    MustNot,
}

#[derive(Debug, PartialEq)]
enum Lexeme {
    Word(String),
    Phrase(String),
}

pub struct QueryParser;

impl QueryParser {
    pub fn parse(raw: &str) -> Query {
        let mut query = Query { text: raw.to_string(), ..Query::default() };
        let mut clause = Clause::Must;
        for lexeme in lex(raw) {
            match lexeme {
                Lexeme::Phrase(p) => push_term(&mut query, clause, p),
                Lexeme::Word(w) => match w.as_str() {
                    "AND" => clause = Clause::Must,
                    "OR" => clause = Clause::Should,
                    "NOT" => clause = Clause::MustNot,
                    _ => match w.split_once(':') {
                        Some((name, value)) => apply_field(&mut query, name, value),
                        None => push_term(&mut query, clause, w),
                    },
                },
            }
        }
        for w in &query.warnings {
            tracing::warn!(query = raw, "{w}");
        }
        query
    }
}

fn push_term(query: &mut Query, clause: Clause, term: String) {
    let term = term.trim().to_string();
    if term.is_empty() {
        return;
    }
    match clause {
        Clause::Must => query.must.push(term),
        Clause::Should => query.should.push(term),
        Clause::MustNot => query.must_not.push(term),
    }
}

fn apply_field(query: &mut Query, name: &str, value: &str) {
    let name = name.trim().to_lowercase();
    let value = value.trim();
    if name.is_empty() || value.is_empty() {
        query.warnings.push(SearchWarning::invalid_query(format!("field assignment '{name}:{value}' is incomplete")));
        return;
    }
    match name.as_str() {
        "category" => query.filters.category = Some(value.to_string()),
        "price" => match value.parse::<PriceRange>() {
            Ok(range) => query.filters.price = Some(range),
            Err(msg) => query.warnings.push(SearchWarning::invalid_query(msg)),
        },
        "sort" => match value.parse::<SortOrder>() {
            Ok(order) => query.filters.sort = order,
            Err(msg) => query.warnings.push(SearchWarning::invalid_query(msg)),
        },
        "like" => match value.parse::<ItemId>() {
            Ok(id) => query.reference = Some(ImageReference::Item(id)),
            Err(_) => query.warnings.push(SearchWarning::invalid_query(format!("like: expects an item id, got '{value}'"))),
        },
        "colors" | "color" => {
            let mut palette = Vec::new();
            for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                if Rgb::parse(code).is_some() {
                    palette.push(code.to_string());
                } else {
                    query.warnings.push(SearchWarning::invalid_query(format!("'{code}' is not a color code")));
                }
            }
            if !palette.is_empty() {
                query.reference = Some(ImageReference::Palette(palette));
            }
        }
        "year" if value.parse::<i32>().is_err() => {
            query.warnings.push(SearchWarning::invalid_query(format!("year '{value}' is not a number")));
        }
        _ => {
            query.fields.insert(name, value.to_string());
        }
    }
}

/// Splits on whitespace outside quotes. A token opening with a quote is a phrase;
/// quotes inside a token (`artist:"van gogh"`) only group its value.
fn lex(raw: &str) -> Vec<Lexeme> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut phrase = false;
    let mut flush = |current: &mut String, phrase: &mut bool| {
        if !current.is_empty() {
            let text = std::mem::take(current);
            out.push(if *phrase { Lexeme::Phrase(text) } else { Lexeme::Word(text) });
        }
        *phrase = false;
    };
    for c in raw.chars() {
        if c == '"' {
            if !in_quotes && current.is_empty() {
                phrase = true;
            }
            in_quotes = !in_quotes;
        } else if c.is_whitespace() && !in_quotes {
            flush(&mut current, &mut phrase);
        } else {
            current.push(c);
        }
    }
    flush(&mut current, &mut phrase);
    out
}

/// A query resolved against the tokenizer, ready to rank and filter with.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    /// Ranking input for lexical and fuzzy strategies.
    pub tokens: Vec<String>,
    pub must: Vec<Vec<String>>,
    pub must_not: Vec<Vec<String>>,
    pub filters: FieldFilters,
    pub fields: BTreeMap<String, String>,
}

impl QueryPlan {
    pub fn new(query: &Query, tokenizer: &Tokenizer) -> Self {
        let runs = |terms: &[String]| -> Vec<Vec<String>> {
            terms.iter().map(|t| tokenizer.tokenize(t)).filter(|r| !r.is_empty()).collect()
        };
        let must = runs(&query.must);
        let should = runs(&query.should);
        let tokens = if query.has_clauses() {
            must.iter().chain(&should).flatten().cloned().collect()
        } else if query.filters == FieldFilters::default() && query.fields.is_empty() && query.reference.is_none() {
            tokenizer.tokenize(&query.text)
        } else {
            Vec::new()
        };
        Self { tokens, must, must_not: runs(&query.must_not), filters: query.filters.clone(), fields: query.fields.clone() }
    }

    /// Field filters and must-not exclusion; applied to every strategy.
    pub fn admits(&self, entry: &IndexedItem) -> bool {
        let item = &entry.item;
        if let Some(category) = &self.filters.category {
            if item.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(range) = &self.filters.price {
            if !item.price.is_some_and(|p| range.contains(p)) {
                return false;
            }
        }
        for (name, value) in &self.fields {
            let ok = match name.as_str() {
                "artist" => item.artist.to_lowercase() == value.to_lowercase(),
                "title" => item.title.to_lowercase() == value.to_lowercase(),
                "tag" | "tags" => item.tags.iter().any(|t| t.to_lowercase() == value.to_lowercase()),
                "year" => value.parse::<i32>().ok() == item.year,
                _ => true,
            };
            if !ok {
                return false;
            }
        }
        !self.must_not.iter().any(|run| entry.contains_run(run))
    }

    /// Every must clause present; single-token clauses may be satisfied by a synonym.
    pub fn satisfies_must(&self, entry: &IndexedItem, synonyms: Option<&SynonymTable>) -> bool {
        self.must.iter().all(|run| {
            if entry.contains_run(run) {
                return true;
            }
            match (synonyms, run.as_slice()) {
                (Some(table), [single]) => {
                    table.equivalents(single).into_iter().any(|alt| entry.tokens.iter().any(|t| t == alt))
                }
                _ => false,
            }
        })
    }
}
