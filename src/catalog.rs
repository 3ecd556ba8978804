use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{ProdcatError, Result};
use crate::importer::{file_extension, read_first_column};

pub const HIERARCHY_SEPARATOR: char = '>';

/// Category reference derived from an external list of category names.
///
/// `extracted` keeps first-seen order; `mapping` keeps insertion order so the
/// fuzzy scan in the categorizer is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    extracted: Vec<String>,
    seen: HashSet<String>,
    mapping: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// Build from raw category strings such as `Other > Lipstick > Makeup`
    /// or `Hair Other`, using `marker` as the catch-all label.
    pub fn from_entries<S: AsRef<str>>(entries: &[S], marker: &str) -> Self {
        let mut catalog = Self::default();
        let marker_lower = marker.to_lowercase();
        let is_marker = |part: &str| part.to_lowercase() == marker_lower;

        for raw in entries {
            let category = raw.as_ref().trim();
            if !category.contains(HIERARCHY_SEPARATOR) {
                continue;
            }
            for part in category.split(HIERARCHY_SEPARATOR).map(str::trim) {
                if !part.is_empty() && !is_marker(part) {
                    catalog.add_extracted(part);
                }
            }
        }

        let suffix = format!(" {marker_lower}");
        for raw in entries {
            let category = raw.as_ref().trim();
            let key = category.to_lowercase();

            if category.contains(HIERARCHY_SEPARATOR) {
                let parts: Vec<&str> = category.split(HIERARCHY_SEPARATOR).map(str::trim).collect();
                let usable = |part: &str| !part.is_empty() && !is_marker(part);

                let target: Option<&str> = if is_marker(parts[0]) {
                    parts.iter().rev().copied().find(|p| usable(p))
                } else if is_marker(parts[parts.len() - 1]) {
                    let second_last = parts[parts.len() - 2];
                    if usable(second_last) {
                        Some(second_last)
                    } else {
                        parts.iter().copied().find(|p| usable(p))
                    }
                } else {
                    None
                };
                if let Some(target) = target {
                    catalog.insert_mapping(key, target.to_string());
                }
            } else if key.ends_with(&suffix) && key.len() > suffix.len() {
                let principal = category
                    .len()
                    .checked_sub(suffix.len())
                    .and_then(|cut| category.get(..cut))
                    .map(str::trim)
                    .unwrap_or_default();
                if !principal.is_empty() {
                    catalog.insert_mapping(key, principal.to_string());
                }
            }
        }

        if !catalog.index.contains_key(&marker_lower) {
            if let Some(first) = catalog.extracted.first().cloned() {
                catalog.insert_mapping(marker_lower, first);
            }
        }

        catalog
    }

    fn add_extracted(&mut self, category: &str) {
        if self.seen.insert(category.to_string()) {
            self.extracted.push(category.to_string());
        }
    }

    fn insert_mapping(&mut self, key: String, target: String) {
        match self.index.get(&key) {
            Some(&i) => self.mapping[i].1 = target,
            None => {
                self.index.insert(key.clone(), self.mapping.len());
                self.mapping.push((key, target));
            }
        }
    }

    pub fn extracted_categories(&self) -> &[String] {
        &self.extracted
    }

    pub fn first_extracted(&self) -> Option<&str> {
        self.extracted.first().map(String::as_str)
    }

    /// Exact lookup by an already-lowercased composite key.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.mapping[i].1.as_str())
    }

    pub fn mappings(&self) -> &[(String, String)] {
        &self.mapping
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty() && self.extracted.is_empty()
    }
}

fn read_entries(path: &Path) -> Result<Vec<String>> {
    match file_extension(path).as_str() {
        "md" | "txt" => {
            let content = std::fs::read_to_string(path)?;
            Ok(content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect())
        }
        "csv" | "xlsx" | "xls" | "xlsm" | "ods" => read_first_column(path),
        other => Err(ProdcatError::UnsupportedFormat(format!(".{other}"))),
    }
}

/// Load a reference catalog. Any failure is logged and yields an empty
/// catalog; the categorizer then runs without reference data.
pub fn load_catalog(path: &Path, marker: &str) -> ReferenceCatalog {
    let entries = match read_entries(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not load reference catalog");
            return ReferenceCatalog::default();
        }
    };
    tracing::info!(entries = entries.len(), "loaded reference categories");

    let catalog = ReferenceCatalog::from_entries(&entries, marker);
    tracing::info!(
        extracted = catalog.extracted_categories().len(),
        mappings = catalog.mappings().len(),
        "built category map"
    );
    for (key, target) in catalog.mappings().iter().take(10) {
        tracing::debug!(key = %key, target = %target, "category mapping");
    }
    catalog
}
