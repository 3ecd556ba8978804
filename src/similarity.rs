//! Nearest-neighbor category inference over TF-IDF vectors.
//!
//! Descriptions with a known category are vectorized (unigrams and bigrams,
//! smoothed IDF, L2-normalized rows) and kept in a brute-force index. A new
//! description is vectorized the same way and its category is decided by a
//! similarity-weighted vote among the closest training rows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Record;
use crate::normalize::normalize;

pub const NEIGHBORS: usize = 5;
const MIN_DOC_FREQ: usize = 2;
const MAX_DOC_RATIO: f64 = 0.9;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sparse row: (term index, weight), sorted by term index.
type SparseVector = Vec<(usize, f64)>;

fn terms(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let tokens: Vec<&str> = TOKEN.find_iter(&normalized).map(|m| m.as_str()).collect();
    let mut out: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    out.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    out
}

// ---------------------------------------------------------------------------
// Vectorizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights, returning the fitted vectorizer and
    /// the training matrix. `None` when pruning leaves no terms.
    fn fit_transform(docs: &[String]) -> Option<(Self, Vec<SparseVector>)> {
        let n_docs = docs.len();
        let doc_terms: Vec<Vec<String>> = docs.iter().map(|d| terms(d)).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for t in &doc_terms {
            let unique: HashSet<&str> = t.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = MAX_DOC_RATIO * n_docs as f64;
        let mut kept: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|&(_, df)| df >= MIN_DOC_FREQ && df as f64 <= max_doc_count)
            .collect();
        if kept.is_empty() {
            return None;
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (i, (term, df)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), i);
            idf.push(((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0);
        }

        let vectorizer = Self { vocabulary, idf };
        let matrix = doc_terms.iter().map(|t| vectorizer.weigh(t)).collect();
        Some((vectorizer, matrix))
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&terms(text))
    }

    fn weigh(&self, doc_terms: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in doc_terms {
            if let Some(&i) = self.vocabulary.get(term) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }
        let mut row: SparseVector = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i]))
            .collect();
        row.sort_by_key(|&(i, _)| i);

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

fn dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

// ---------------------------------------------------------------------------
// Neighbor index
// ---------------------------------------------------------------------------

/// Brute-force cosine index. Rows are L2-normalized (or all-zero), so the
/// cosine distance is `1 - dot`.
#[derive(Debug, Clone)]
struct NeighborIndex {
    rows: Vec<SparseVector>,
}

impl NeighborIndex {
    /// The `k` closest rows as (row, distance), nearest first; equal
    /// distances keep training order.
    fn nearest(&self, query: &[(usize, f64)], k: usize) -> Vec<(usize, f64)> {
        let mut scored: Vec<(usize, f64)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, (1.0 - dot(query, row)).clamp(0.0, 2.0)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimilarityModel {
    vectorizer: TfidfVectorizer,
    index: NeighborIndex,
    categories: Vec<String>,
}

/// A category that can teach the model: present, not the catch-all marker
/// and not a stringified missing value.
pub fn is_known_category(category: &str, marker: &str) -> bool {
    let c = category.trim();
    !c.is_empty() && !c.eq_ignore_ascii_case("nan") && c.to_lowercase() != marker.to_lowercase()
}

impl SimilarityModel {
    /// Train on every record with a known category. Returns `None` when there
    /// is nothing to learn from; callers skip similarity in that case.
    pub fn train<'a>(records: impl IntoIterator<Item = Record<'a>>, marker: &str) -> Option<Self> {
        let (docs, categories): (Vec<String>, Vec<String>) = records
            .into_iter()
            .filter(|r| is_known_category(r.category, marker))
            .map(|r| (r.description.to_string(), r.category.to_string()))
            .unzip();

        if docs.is_empty() {
            tracing::warn!("no records with a known category; similarity model disabled");
            return None;
        }
        let Some((vectorizer, rows)) = TfidfVectorizer::fit_transform(&docs) else {
            tracing::warn!(
                documents = docs.len(),
                "no shared vocabulary after pruning; similarity model disabled"
            );
            return None;
        };
        tracing::info!(
            documents = docs.len(),
            vocabulary = vectorizer.vocabulary_size(),
            "trained similarity model"
        );

        Some(Self {
            vectorizer,
            index: NeighborIndex { rows },
            categories,
        })
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Vote among the nearest training rows. Confidence is the winner's share
    /// of the total neighbor similarity.
    pub fn classify(&self, description: &str) -> (Option<&str>, f64) {
        if description.trim().is_empty() {
            return (None, 0.0);
        }
        let query = self.vectorizer.transform(description);
        let neighbors = self.index.nearest(&query, NEIGHBORS.min(self.len()));

        let mut votes: Vec<(&str, f64)> = Vec::new();
        let mut total = 0.0;
        for (row, distance) in neighbors {
            let similarity = 1.0 - distance;
            total += similarity;
            let category = self.categories[row].as_str();
            match votes.iter_mut().find(|(c, _)| *c == category) {
                Some((_, weight)) => *weight += similarity,
                None => votes.push((category, similarity)),
            }
        }
        if total <= 0.0 {
            return (None, 0.0);
        }

        let mut best: Option<(&str, f64)> = None;
        for (category, weight) in votes {
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((category, weight));
            }
        }
        match best {
            Some((category, weight)) => (Some(category), (weight / total).clamp(0.0, 1.0)),
            None => (None, 0.0),
        }
    }
}
