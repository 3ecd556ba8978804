use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::catalog::{load_catalog, ReferenceCatalog};
use crate::error::Result;
use crate::models::{Classification, ClassificationMethod, Record, Table};
use crate::normalize::{normalize, words};
use crate::rules::RuleSet;
use crate::similarity::{is_known_category, SimilarityModel};

pub const DEFAULT_MARKER: &str = "Other";
pub const DEFAULT_CATEGORY: &str = "Makeup";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.4;
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.7;

pub const CORRECTED_COLUMN: &str = "category_corrected";
pub const METHOD_COLUMN: &str = "classification_method";
pub const CONFIDENCE_COLUMN: &str = "confidence";

#[derive(Debug, Clone)]
pub struct CategorizeOptions {
    pub description_column: String,
    pub category_column: String,
    pub confidence_threshold: f64,
    pub reference_file: Option<PathBuf>,
    pub generic_marker: String,
    pub default_category: String,
}

impl Default for CategorizeOptions {
    fn default() -> Self {
        Self {
            description_column: "Product description".to_string(),
            category_column: "Product category".to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            reference_file: None,
            generic_marker: DEFAULT_MARKER.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl CategorizeOptions {
    /// The last-resort category; a blank or catch-all setting would break
    /// the guarantee that every row ends up categorized.
    fn fallback_category(&self) -> &str {
        if is_known_category(&self.default_category, &self.generic_marker) {
            &self.default_category
        } else {
            DEFAULT_CATEGORY
        }
    }

    fn is_marker(&self, category: &str) -> bool {
        category.trim().to_lowercase() == self.generic_marker.to_lowercase()
    }

    /// Missing, blank, the catch-all marker, or a stringified NaN.
    pub fn is_unresolved(&self, category: &str) -> bool {
        !is_known_category(category, &self.generic_marker)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategorizeStats {
    pub total_unresolved: usize,
    pub direct_mapped: usize,
    pub fuzzy_mapped: usize,
    pub rules: usize,
    pub similarity: usize,
    pub aggressive_rules: usize,
    pub most_common: usize,
    pub reference_default: usize,
    pub no_match: usize,
    pub scrubbed: usize,
}

impl CategorizeStats {
    fn record(&mut self, method: ClassificationMethod) {
        let counter = match method {
            ClassificationMethod::DirectMap => &mut self.direct_mapped,
            ClassificationMethod::FuzzyMap => &mut self.fuzzy_mapped,
            ClassificationMethod::Rules => &mut self.rules,
            ClassificationMethod::Similarity => &mut self.similarity,
            ClassificationMethod::AggressiveRules => &mut self.aggressive_rules,
            ClassificationMethod::MostCommon => &mut self.most_common,
            ClassificationMethod::ReferenceDefault => &mut self.reference_default,
            ClassificationMethod::NoMatch => &mut self.no_match,
        };
        *counter += 1;
    }

    pub fn catalog_mapped(&self) -> usize {
        self.direct_mapped + self.fuzzy_mapped
    }

    pub fn resolved_by_rules(&self) -> usize {
        self.rules + self.aggressive_rules
    }

    pub fn resolved_by_similarity(&self) -> usize {
        self.similarity
    }

    pub fn resolved_by_fallback(&self) -> usize {
        self.most_common + self.reference_default + self.no_match
    }
}

pub struct CategorizeOutcome {
    /// Copy of the input with the corrected, method and confidence columns.
    pub table: Table,
    pub classifications: Vec<Classification>,
    pub stats: CategorizeStats,
}

/// Case-insensitive closeness of two category labels: 0.9 when either
/// contains the other, else the Jaccard index of their word sets.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.contains(&b) || b.contains(&a) {
        return 0.9;
    }
    let wa: HashSet<&str> = a.split_whitespace().collect();
    let wb: HashSet<&str> = b.split_whitespace().collect();
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let common = wa.intersection(&wb).count();
    common as f64 / (wa.len() + wb.len() - common) as f64
}

// ---------------------------------------------------------------------------
// Running category counts for the most-common fallback
// ---------------------------------------------------------------------------

/// Counts of the corrected column as it is being rewritten. Ties between
/// equally frequent categories go to the one seen first.
#[derive(Debug, Default)]
struct CategoryFrequencies {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl CategoryFrequencies {
    fn counted(category: &str) -> bool {
        let c = category.trim();
        !c.is_empty() && !c.eq_ignore_ascii_case("nan")
    }

    fn add(&mut self, category: &str) {
        if !Self::counted(category) {
            return;
        }
        match self.index.get(category) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(category.to_string(), self.counts.len());
                self.counts.push((category.to_string(), 1));
            }
        }
    }

    fn remove(&mut self, category: &str) {
        if let Some(&i) = self.index.get(category) {
            self.counts[i].1 = self.counts[i].1.saturating_sub(1);
        }
    }

    fn replace(&mut self, old: &str, new: &str) {
        self.remove(old);
        self.add(new);
    }

    fn most_common(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (category, count) in &self.counts {
            if *count > 0 && best.map_or(true, |(_, c)| *count > c) {
                best = Some((category.as_str(), *count));
            }
        }
        best.map(|(category, _)| category)
    }
}

// ---------------------------------------------------------------------------
// Strategy chain
// ---------------------------------------------------------------------------

struct Context<'a> {
    options: &'a CategorizeOptions,
    rules: &'a RuleSet,
    catalog: &'a ReferenceCatalog,
    model: Option<&'a SimilarityModel>,
    frequencies: &'a CategoryFrequencies,
}

struct Resolution {
    category: String,
    method: ClassificationMethod,
    confidence: Option<f64>,
}

impl Resolution {
    fn new(category: impl Into<String>, method: ClassificationMethod) -> Self {
        Self {
            category: category.into(),
            method,
            confidence: None,
        }
    }
}

/// Applied to every row before deciding which rows still need work.
const CATALOG_PHASE: &[ClassificationMethod] =
    &[ClassificationMethod::DirectMap, ClassificationMethod::FuzzyMap];

/// Tried in order on unresolved rows. `NoMatch` is the unconditional tail
/// applied when all of these miss.
const CASCADE: &[ClassificationMethod] = &[
    ClassificationMethod::Rules,
    ClassificationMethod::Similarity,
    ClassificationMethod::AggressiveRules,
    ClassificationMethod::MostCommon,
    ClassificationMethod::ReferenceDefault,
];

fn apply_strategy(
    strategy: ClassificationMethod,
    record: &Record,
    ctx: &Context,
) -> Option<Resolution> {
    use ClassificationMethod::*;

    match strategy {
        DirectMap => ctx
            .catalog
            .lookup(&record.category.to_lowercase())
            .map(|target| Resolution::new(target, DirectMap)),
        FuzzyMap => {
            let current = record.category.to_lowercase();
            if !current.contains(&ctx.options.generic_marker.to_lowercase()) {
                return None;
            }
            let mut best: Option<(&str, f64)> = None;
            for (key, target) in ctx.catalog.mappings() {
                let score = string_similarity(&current, key);
                if score > best.map_or(0.0, |(_, s)| s) {
                    best = Some((target.as_str(), score));
                }
            }
            best.filter(|&(_, score)| score > FUZZY_MATCH_THRESHOLD)
                .map(|(target, _)| Resolution::new(target, FuzzyMap))
        }
        Rules => ctx
            .rules
            .classify(record.description)
            .map(|category| Resolution::new(category, Rules)),
        Similarity => {
            let model = ctx.model?;
            match model.classify(record.description) {
                (Some(category), confidence) if confidence >= ctx.options.confidence_threshold => {
                    Some(Resolution {
                        category: category.to_string(),
                        method: Similarity,
                        confidence: Some(confidence),
                    })
                }
                _ => None,
            }
        }
        AggressiveRules => {
            let desc = normalize(record.description);
            let mut best: Option<(&str, usize)> = None;
            for category in ctx.catalog.extracted_categories() {
                let score = words(category)
                    .iter()
                    .filter(|w| desc.contains(w.as_str()))
                    .count();
                if score > best.map_or(0, |(_, s)| s) {
                    best = Some((category.as_str(), score));
                }
            }
            best.map(|(category, _)| Resolution::new(category, AggressiveRules))
        }
        MostCommon => ctx
            .frequencies
            .most_common()
            .filter(|top| !ctx.options.is_marker(top))
            .map(|top| Resolution::new(top, MostCommon)),
        ReferenceDefault => ctx
            .catalog
            .first_extracted()
            .map(|first| Resolution::new(first, ReferenceDefault)),
        NoMatch => Some(Resolution::new(ctx.options.fallback_category(), NoMatch)),
    }
}

/// First strategy that yields a usable category. A strategy answering with a
/// blank, `nan` or the marker itself (possible with a user rules file) counts
/// as declining.
fn run_chain(chain: &[ClassificationMethod], record: &Record, ctx: &Context) -> Option<Resolution> {
    chain.iter().find_map(|&strategy| {
        apply_strategy(strategy, record, ctx).filter(|r| {
            let usable = !ctx.options.is_unresolved(&r.category);
            if !usable {
                tracing::debug!(?strategy, category = %r.category, "discarded unusable category");
            }
            usable
        })
    })
}

/// Per-row results plus the counters that later steps read.
struct Progress {
    classifications: Vec<Classification>,
    frequencies: CategoryFrequencies,
    stats: CategorizeStats,
}

impl Progress {
    fn new(records: &[Record]) -> Self {
        let classifications: Vec<Classification> = records
            .iter()
            .map(|r| Classification {
                category: r.category.to_string(),
                method: None,
                confidence: None,
            })
            .collect();
        let mut frequencies = CategoryFrequencies::default();
        for c in &classifications {
            frequencies.add(&c.category);
        }
        Self {
            classifications,
            frequencies,
            stats: CategorizeStats::default(),
        }
    }

    fn settle(&mut self, row: usize, resolution: Resolution) {
        tracing::debug!(
            row,
            category = %resolution.category,
            method = resolution.method.as_str(),
            "categorized"
        );
        self.stats.record(resolution.method);
        self.frequencies
            .replace(&self.classifications[row].category, &resolution.category);
        self.classifications[row] = Classification {
            category: resolution.category,
            method: Some(resolution.method),
            confidence: resolution.confidence,
        };
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Correct the category column of `table`, loading the reference catalog
/// named in `options` first. A missing or unreadable reference file only
/// disables the catalog-driven steps.
pub fn categorize(table: &Table, options: &CategorizeOptions, rules: &RuleSet) -> Result<CategorizeOutcome> {
    let catalog = match &options.reference_file {
        Some(path) if path.exists() => load_catalog(path, &options.generic_marker),
        Some(path) => {
            tracing::warn!(path = %path.display(), "reference file not found; continuing without it");
            ReferenceCatalog::default()
        }
        None => ReferenceCatalog::default(),
    };
    categorize_with_catalog(table, options, rules, &catalog)
}

pub fn categorize_with_catalog(
    table: &Table,
    options: &CategorizeOptions,
    rules: &RuleSet,
    catalog: &ReferenceCatalog,
) -> Result<CategorizeOutcome> {
    let desc_idx = table.require_column(&options.description_column)?;
    let cat_idx = table.require_column(&options.category_column)?;
    let records: Vec<Record> = table
        .rows
        .iter()
        .map(|row| Record {
            description: &row[desc_idx],
            category: &row[cat_idx],
        })
        .collect();

    let mut progress = Progress::new(&records);
    let rules = rules.with_catalog_categories(catalog.extracted_categories());
    let model = SimilarityModel::train(records.iter().copied(), &options.generic_marker);

    if !catalog.mappings().is_empty() {
        for (i, record) in records.iter().enumerate() {
            let resolved = {
                let ctx = Context {
                    options,
                    rules: &rules,
                    catalog,
                    model: model.as_ref(),
                    frequencies: &progress.frequencies,
                };
                run_chain(CATALOG_PHASE, record, &ctx)
            };
            if let Some(resolution) = resolved {
                progress.settle(i, resolution);
            }
        }
    }

    let unresolved: Vec<usize> = (0..records.len())
        .filter(|&i| options.is_unresolved(&progress.classifications[i].category))
        .collect();
    progress.stats.total_unresolved = unresolved.len();

    for i in unresolved {
        let resolution = {
            let ctx = Context {
                options,
                rules: &rules,
                catalog,
                model: model.as_ref(),
                frequencies: &progress.frequencies,
            };
            run_chain(CASCADE, &records[i], &ctx)
                .unwrap_or_else(|| Resolution::new(options.fallback_category(), ClassificationMethod::NoMatch))
        };
        progress.settle(i, resolution);
    }
    let Progress {
        mut classifications,
        mut stats,
        ..
    } = progress;

    // Nothing above should leave the marker behind; scrub it if it did.
    if let Some(first) = catalog.first_extracted() {
        for c in classifications.iter_mut().filter(|c| options.is_marker(&c.category)) {
            c.category = first.to_string();
            stats.scrubbed += 1;
        }
    }
    if stats.scrubbed > 0 {
        tracing::warn!(rows = stats.scrubbed, replacement = ?catalog.first_extracted(), "replaced leftover catch-all categories");
    }

    tracing::info!(
        unresolved = stats.total_unresolved,
        catalog = stats.catalog_mapped(),
        rules = stats.resolved_by_rules(),
        similarity = stats.resolved_by_similarity(),
        fallback = stats.resolved_by_fallback(),
        "categorization finished"
    );

    let mut out = table.clone();
    out.set_column(
        CORRECTED_COLUMN,
        classifications.iter().map(|c| c.category.clone()).collect(),
    );
    out.set_column(
        METHOD_COLUMN,
        classifications
            .iter()
            .map(|c| c.method.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    );
    out.set_column(
        CONFIDENCE_COLUMN,
        classifications
            .iter()
            .map(|c| c.confidence.map(|v| format!("{v:.4}")).unwrap_or_default())
            .collect(),
    );

    Ok(CategorizeOutcome {
        table: out,
        classifications,
        stats,
    })
}
