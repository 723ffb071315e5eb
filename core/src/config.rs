use crate::error::SearchError;
use crate::tokenizer::DEFAULT_STOPWORDS;
use crate::types::Strategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfMode {
    /// ln(N / df)
    #[default]
    Plain,
    /// ln(1 + N / df)
    Smoothed,
}

impl IdfMode {
    pub fn idf(&self, num_docs: usize, df: u32) -> f32 {
        if df == 0 || num_docs == 0 {
            return 0.0;
        }
        let ratio = num_docs as f32 / df as f32;
        match self {
            IdfMode::Plain => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub stopwords: Vec<String>,
    /// Apply English Snowball stemming after stop-word removal.
    pub stem: bool,
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(), stem: false, min_token_len: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    pub threshold: f32,
    pub hybrid_threshold: f32,
    pub max_query_tokens: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self { threshold: 0.6, hybrid_threshold: 0.5, max_query_tokens: 16 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub vector: f32,
    pub semantic: f32,
    pub fuzzy: f32,
    pub image: f32,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self { vector: 0.4, semantic: 0.4, fuzzy: 0.2, image: 0.2 }
    }
}

impl StrategyWeights {
    pub fn get(&self, strategy: Strategy) -> f32 {
        match strategy {
            Strategy::Vector => self.vector,
            Strategy::Semantic => self.semantic,
            Strategy::Fuzzy => self.fuzzy,
            Strategy::Image => self.image,
        }
    }

    pub fn with(mut self, strategy: Strategy, weight: f32) -> Self {
        match strategy {
            Strategy::Vector => self.vector = weight,
            Strategy::Semantic => self.semantic = weight,
            Strategy::Fuzzy => self.fuzzy = weight,
            Strategy::Image => self.image = weight,
        }
        self
    }

    fn validate(&self) -> Result<(), SearchError> {
        for s in Strategy::ALL {
            let w = self.get(s);
            if !w.is_finite() || w < 0.0 {
                return Err(SearchError::InvalidConfig(format!("{s} weight must be a non-negative number, got {w}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: StrategyWeights,
    /// Each strategy is asked for `limit * overfetch` candidates before merging.
    pub overfetch: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { weights: StrategyWeights::default(), overfetch: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub color_weight: f32,
    pub content_weight: f32,
    pub artist_weight: f32,
    pub category_weight: f32,
    pub price_weight: f32,
    /// Relative price difference beyond which prices stop contributing.
    pub price_tolerance: f32,
    pub year_weight: f32,
    pub year_window: u32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            color_weight: 0.6,
            content_weight: 0.4,
            artist_weight: 0.4,
            category_weight: 0.3,
            price_weight: 0.15,
            price_tolerance: 0.3,
            year_weight: 0.15,
            year_window: 10,
        }
    }
}

/// Everything the engine needs at construction; there is no global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tokenizer: TokenizerConfig,
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub idf: IdfMode,
    /// Flat multiplier on semantic scores, applied whether or not expansion added terms.
    pub semantic_boost: f32,
    pub fuzzy: FuzzyConfig,
    pub fusion: FusionConfig,
    pub similarity: SimilarityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            synonyms: default_synonyms(),
            idf: IdfMode::Plain,
            semantic_boost: 1.2,
            fuzzy: FuzzyConfig::default(),
            fusion: FusionConfig::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig =
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        self.fusion.weights.validate()?;
        if !self.semantic_boost.is_finite() || self.semantic_boost < 0.0 {
            return Err(SearchError::InvalidConfig(format!("semantic_boost must be non-negative, got {}", self.semantic_boost)));
        }
        for (name, t) in [("fuzzy.threshold", self.fuzzy.threshold), ("fuzzy.hybrid_threshold", self.fuzzy.hybrid_threshold)] {
            if !(0.0..=1.0).contains(&t) {
                return Err(SearchError::InvalidConfig(format!("{name} must be within [0, 1], got {t}")));
            }
        }
        if self.fusion.overfetch == 0 {
            return Err(SearchError::InvalidConfig("fusion.overfetch must be at least 1".into()));
        }
        let s = &self.similarity;
        let weights = [s.color_weight, s.content_weight, s.artist_weight, s.category_weight, s.price_weight, s.year_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SearchError::InvalidConfig("similarity weights must be non-negative".into()));
        }
        if s.price_tolerance.is_nan() || s.price_tolerance <= 0.0 {
            return Err(SearchError::InvalidConfig("similarity.price_tolerance must be positive".into()));
        }
        Ok(())
    }
}

fn default_synonyms() -> BTreeMap<String, Vec<String>> {
    let groups: &[(&str, &[&str])] = &[
        ("painting", &["artwork", "canvas", "picture"]),
        ("abstract", &["nonrepresentational", "nonfigurative"]),
        ("landscape", &["scenery", "vista", "countryside"]),
        ("portrait", &["likeness", "headshot"]),
        ("sculpture", &["statue", "carving", "bust"]),
        ("photograph", &["photo", "photography", "snapshot"]),
        ("sea", &["ocean", "marine", "seascape"]),
        ("sunset", &["dusk", "twilight", "sundown"]),
        ("blue", &["azure", "cobalt", "navy"]),
        ("red", &["crimson", "scarlet", "vermilion"]),
        ("modern", &["contemporary"]),
        ("mountain", &["peak", "alpine"]),
    ];
    groups.iter().map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect())).collect()
}
