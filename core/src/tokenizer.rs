use crate::config::TokenizerConfig;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeMap, HashSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
];

/// Bag of normalized terms with raw counts, ordered for deterministic iteration.
pub type TermCounts = BTreeMap<String, u32>;

/// Shared normalizer for indexing and querying so both sides land in one term space.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    stem: bool,
    min_len: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        // Case-folded only: stripping "she'll" would turn it into "shell".
        let stopwords = config.stopwords.iter().map(|w| fold(w)).filter(|w| !w.is_empty()).collect();
        Self { stopwords, stem: config.stem, min_len: config.min_token_len.max(1) }
    }

    /// NFKC, lowercase, split on whitespace, strip punctuation, drop short tokens and stop-words.
    /// Stop-words are matched on the word as written (edge punctuation trimmed) and on the stripped form.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let folded = fold(text);
        let mut tokens = Vec::new();
        for word in folded.split_whitespace() {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            if self.stopwords.contains(bare) {
                continue;
            }
            let token = PUNCT.replace_all(bare, "");
            let token = token.as_ref();
            if token.is_empty() || token.chars().count() < self.min_len || self.stopwords.contains(token) {
                continue;
            }
            if self.stem {
                tokens.push(STEMMER.stem(token).to_string());
            } else {
                tokens.push(token.to_string());
            }
        }
        tokens
    }

    pub fn term_counts(&self, text: &str) -> TermCounts {
        count_terms(self.tokenize(text))
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

pub fn count_terms<I: IntoIterator<Item = String>>(tokens: I) -> TermCounts {
    let mut counts = TermCounts::new();
    for t in tokens {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}

/// NFKC and lowercase, with typographic apostrophes folded to ASCII.
fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase().replace('\u{2019}', "'")
}
