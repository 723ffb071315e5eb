use crate::config::SimilarityConfig;
use crate::index::{IndexSnapshot, IndexedItem};
use crate::types::{sort_and_truncate, CatalogItem, ItemId, ScoredResult, Strategy};
use rayon::prelude::*;

/// Euclidean distance between black and white in RGB space.
pub const MAX_RGB_DISTANCE: f32 = 441.67;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Accepts `#rrggbb` or `#rgb`, the leading `#` optional.
    pub fn parse(code: &str) -> Option<Rgb> {
        let hex = code.trim().trim_start_matches('#');
        // from_str_radix alone would take "+f" as a channel
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Rgb { r: channel(&hex[0..2])?, g: channel(&hex[2..4])?, b: channel(&hex[4..6])? }),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Some(Rgb { r: short(0)?, g: short(1)?, b: short(2)? })
            }
            _ => None,
        }
    }

    pub fn distance(&self, other: &Rgb) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Average pairwise distance over the overlapping prefix, mapped to [0, 1].
/// `None` when either palette is empty.
pub fn color_similarity(a: &[Rgb], b: &[Rgb]) -> Option<f32> {
    let overlap = a.len().min(b.len());
    if overlap == 0 {
        return None;
    }
    let total: f32 = a.iter().zip(b).map(|(x, y)| x.distance(y)).sum();
    let avg = total / overlap as f32;
    Some((1.0 - avg / MAX_RGB_DISTANCE).max(0.0))
}

/// Weighted artist/category/price/year proximity, normalized to [0, 1].
pub fn content_similarity(a: &CatalogItem, b: &CatalogItem, cfg: &SimilarityConfig) -> f32 {
    let total = cfg.artist_weight + cfg.category_weight + cfg.price_weight + cfg.year_weight;
    if total <= 0.0 {
        return 0.0;
    }
    let mut score = 0.0;
    if same_label(&a.artist, &b.artist) {
        score += cfg.artist_weight;
    }
    if same_label(&a.category, &b.category) {
        score += cfg.category_weight;
    }
    if let (Some(pa), Some(pb)) = (a.price, b.price) {
        let high = pa.abs().max(pb.abs());
        let diff = if high == 0.0 { 0.0 } else { ((pa - pb).abs() / high) as f32 };
        if diff < cfg.price_tolerance {
            score += cfg.price_weight * (1.0 - diff / cfg.price_tolerance);
        }
    }
    if let (Some(ya), Some(yb)) = (a.year, b.year) {
        let gap = (ya - yb).unsigned_abs();
        if cfg.year_window > 0 && gap < cfg.year_window {
            score += cfg.year_weight * (1.0 - gap as f32 / cfg.year_window as f32);
        } else if gap == 0 {
            score += cfg.year_weight;
        }
    }
    (score / total).clamp(0.0, 1.0)
}

fn same_label(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

/// Item-to-item ranking by visual and metadata proximity.
pub struct SimilarityRanker<'a> {
    snapshot: &'a IndexSnapshot,
    config: &'a SimilarityConfig,
}

impl<'a> SimilarityRanker<'a> {
    pub fn new(snapshot: &'a IndexSnapshot, config: &'a SimilarityConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn score_pair(&self, a: &IndexedItem, b: &IndexedItem) -> f32 {
        let content = content_similarity(&a.item, &b.item, self.config);
        match color_similarity(self.snapshot.colors.get(a.id()), self.snapshot.colors.get(b.id())) {
            Some(color) => self.config.color_weight * color + self.config.content_weight * content,
            None => content,
        }
    }

    /// `None` when `id` is not in the snapshot. The reference item never appears in its own results.
    pub fn similar_to<F>(&self, id: ItemId, admit: F, limit: usize) -> Option<Vec<ScoredResult>>
    where
        F: Fn(&IndexedItem) -> bool + Sync,
    {
        let reference = self.snapshot.get(id)?;
        let mut results: Vec<ScoredResult> = self
            .snapshot
            .items()
            .par_iter()
            .filter(|&other| other.id() != id && admit(other))
            .filter_map(|other| {
                let score = self.score_pair(reference, other);
                (score > 0.0).then(|| ScoredResult { item_id: other.id(), score, strategy: Strategy::Image })
            })
            .collect();
        sort_and_truncate(&mut results, limit);
        Some(results)
    }

    /// Color-only ranking against a probe palette.
    pub fn rank_palette<F>(&self, palette: &[Rgb], admit: F, limit: usize) -> Vec<ScoredResult>
    where
        F: Fn(&IndexedItem) -> bool + Sync,
    {
        let mut results: Vec<ScoredResult> = self
            .snapshot
            .items()
            .par_iter()
            .filter(|&item| admit(item))
            .filter_map(|item| {
                let score = color_similarity(palette, self.snapshot.colors.get(item.id()))?;
                (score > 0.0).then(|| ScoredResult { item_id: item.id(), score, strategy: Strategy::Image })
            })
            .collect();
        sort_and_truncate(&mut results, limit);
        results
    }
}
