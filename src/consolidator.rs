use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::Table;

/// Literal fragments that settle a category on sight, checked in order
/// against the lowercased name. The first hit wins, so more specific
/// phrases sit before the short ones that would also match.
const DIRECT_TERMS: &[(&str, &str)] = &[
    ("máscara de cílios", "Makeup"),
    ("mascara de cilios", "Makeup"),
    ("rímel", "Makeup"),
    ("rimel", "Makeup"),
    ("delineador", "Makeup"),
    ("batom", "Makeup"),
    ("base", "Makeup"),
    ("pó", "Makeup"),
    ("po compacto", "Makeup"),
    ("blush", "Makeup"),
    ("primer", "Makeup"),
    ("corretivo", "Makeup"),
    ("iluminador", "Makeup"),
    ("contorno", "Makeup"),
    ("sombra", "Makeup"),
    ("paleta", "Makeup"),
    ("gloss", "Makeup"),
    ("labial", "Makeup"),
    ("lipstick", "Makeup"),
    ("eyeliner", "Makeup"),
    ("concealer", "Makeup"),
    ("shampoo", "Hair"),
    ("condicionador", "Hair"),
    ("máscara capilar", "Hair"),
    ("mascara capilar", "Hair"),
    ("tratamento capilar", "Hair"),
    ("tintura", "Hair"),
    ("coloração", "Hair"),
    ("coloracao", "Hair"),
    ("finalizador", "Hair"),
    ("modelador", "Hair"),
    ("gel", "Hair"),
    ("ativador de cachos", "Hair"),
    ("creme para pentear", "Hair"),
    ("conditioner", "Hair"),
    ("hidratante facial", "Skincare"),
    ("limpeza facial", "Skincare"),
    ("tônico", "Skincare"),
    ("tonico", "Skincare"),
    ("sérum", "Skincare"),
    ("serum", "Skincare"),
    ("protetor solar", "Skincare"),
    ("esfoliante", "Skincare"),
    ("máscara facial", "Skincare"),
    ("mascara facial", "Skincare"),
    ("anti-idade", "Skincare"),
    ("antiidade", "Skincare"),
    ("acne", "Skincare"),
    ("sunscreen", "Skincare"),
    ("perfume", "Fragrance"),
    ("colônia", "Fragrance"),
    ("colonia", "Fragrance"),
    ("eau de parfum", "Fragrance"),
    ("eau de toilette", "Fragrance"),
    ("fragrância", "Fragrance"),
    ("fragrancia", "Fragrance"),
    ("sabonete", "Body"),
    ("hidratante corporal", "Body"),
    ("loção corporal", "Body"),
    ("locao corporal", "Body"),
    ("desodorante", "Body"),
    ("óleo corporal", "Body"),
    ("oleo corporal", "Body"),
    ("esfoliante corporal", "Body"),
    ("body lotion", "Body"),
    ("esmalte", "Nails"),
    ("base para unhas", "Nails"),
    ("top coat", "Nails"),
    ("acetona", "Nails"),
    ("removedor", "Nails"),
    ("nail polish", "Nails"),
    ("pincel", "Accessories"),
    ("escova", "Accessories"),
    ("esponja", "Accessories"),
    ("aplicador", "Accessories"),
    ("necessaire", "Accessories"),
    ("estojo", "Accessories"),
];

/// Fallback scoring: a category goes to the target whose keywords appear
/// most often in its name. Ties keep the earlier target.
const TARGET_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Hair",
        &[
            "cabelo", "capilar", "shampoo", "condicionador", "máscara", "mascara", "tratamento",
            "hidratante", "cachos", "alisamento", "coloração", "coloracao", "tintura", "hair",
            "cabeleira", "cabeleireiro", "permanente", "alisante", "relaxante", "progressiva",
            "queratina", "proteína", "proteina",
        ],
    ),
    (
        "Makeup",
        &[
            "batom", "base", "pó", "po", "blush", "sombra", "rímel", "rimel", "cílios", "cilios",
            "delineador", "corretivo", "primer", "maquiagem", "makeup", "labial", "lábios",
            "labios", "gloss", "contorno", "iluminador", "paleta", "olhos", "boca", "face", "rosto",
            "sobrancelha", "brow", "lash", "lip", "eye", "foundation", "concealer", "fixador",
        ],
    ),
    (
        "Skincare",
        &[
            "facial", "rosto", "pele", "hidratante", "limpeza", "esfoliante", "tônico", "tonico",
            "sérum", "serum", "máscara", "mascara", "skincare", "anti-idade", "antiidade", "acne",
            "protetor solar", "fps", "antirrugas", "anti-rugas", "vitamina c", "ácido", "acido",
            "hialurônico", "hialuronico", "retinol", "peeling", "demaquilante", "cleansing",
            "toner", "moisturizer",
        ],
    ),
    (
        "Fragrance",
        &[
            "perfume", "colônia", "colonia", "eau de parfum", "eau de toilette", "fragrância",
            "fragrancia", "aroma", "body splash", "parfum", "cologne", "deo parfum", "deo colônia",
            "deo colonia", "essência", "essencia",
        ],
    ),
    (
        "Body",
        &[
            "corporal", "corpo", "banho", "sabonete", "loção", "locao", "hidratante",
            "desodorante", "óleo", "oleo", "esfoliante", "massagem", "shower", "body", "talco",
            "pés", "pes", "mãos", "maos", "hand", "foot", "anticelulite", "anti-celulite",
            "firmador", "redutor", "gel", "creme",
        ],
    ),
    (
        "Nails",
        &[
            "esmalte", "unha", "nail", "manicure", "pedicure", "acetona", "removedor", "base coat",
            "top coat", "fortalecedor", "endurecedor", "cutícula", "cuticula", "alicate", "lixa",
            "palito", "polish", "verniz",
        ],
    ),
    (
        "Accessories",
        &[
            "pincel", "escova", "esponja", "aplicador", "necessaire", "estojo", "espelho",
            "organizador", "kit", "bolsa", "acessório", "acessorio", "beauty blender", "espátula",
            "espatula", "pente", "cerdas", "case", "mirror", "suporte", "conjunto", "set",
            "travel", "viagem", "sacola",
        ],
    ),
];

/// Result of a consolidation pass over one category column.
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    principals: Vec<String>,
    mapping: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Consolidation {
    /// Categories that occur more often than the mean category frequency.
    pub fn principals(&self) -> &[String] {
        &self.principals
    }

    /// `(category, principal)` pairs in first-seen order.
    pub fn mappings(&self) -> &[(String, String)] {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.index.get(category).map(|&i| self.mapping[i].1.as_str())
    }

    /// The consolidated name, or `category` itself when it has no mapping.
    pub fn apply<'a>(&'a self, category: &'a str) -> &'a str {
        self.get(category).unwrap_or(category)
    }

    /// Rewrite `column` in place and return how many cells changed.
    pub fn apply_to_column(&self, table: &mut Table, column: &str) -> Result<usize> {
        let idx = table.require_column(column)?;
        let mut changed = 0;
        for row in &mut table.rows {
            let mapped = self.apply(&row[idx]);
            if mapped != row[idx] {
                let mapped = mapped.to_string();
                row[idx] = mapped;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn insert(&mut self, category: &str, target: &str) {
        if !self.index.contains_key(category) {
            self.index.insert(category.to_string(), self.mapping.len());
            self.mapping.push((category.to_string(), target.to_string()));
        }
    }
}

fn is_target_name(category: &str) -> bool {
    let lower = category.trim().to_lowercase();
    DIRECT_TERMS
        .iter()
        .map(|(_, target)| *target)
        .chain(TARGET_KEYWORDS.iter().map(|(target, _)| *target))
        .any(|target| target.to_lowercase() == lower)
}

fn direct_target(lower: &str) -> Option<&'static str> {
    DIRECT_TERMS
        .iter()
        .find(|(term, _)| lower.contains(term))
        .map(|(_, target)| *target)
}

fn keyword_target(lower: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (target, keywords) in TARGET_KEYWORDS {
        let hits = keywords.iter().filter(|k| lower.contains(*k)).count();
        if hits > best.map_or(0, |(_, h)| h) {
            best = Some((*target, hits));
        }
    }
    best.map(|(target, _)| target)
}

/// Merge the long tail of `column` into frequent categories.
///
/// Principal categories and categories already named like a consolidation
/// target are left alone. Everything else is mapped by the direct term
/// table first and the keyword table second; names that match neither stay
/// unmapped.
pub fn consolidate(table: &Table, column: &str) -> Result<Consolidation> {
    let values = table.column(column)?;

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().copied().filter(|v| !v.trim().is_empty()) {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut result = Consolidation::default();
    if order.is_empty() {
        return Ok(result);
    }

    let mean = counts.values().sum::<usize>() as f64 / counts.len() as f64;
    let principal_set: HashSet<&str> = order
        .iter()
        .copied()
        .filter(|c| counts[c] as f64 > mean)
        .collect();
    result.principals = order
        .iter()
        .filter(|c| principal_set.contains(*c))
        .map(|c| c.to_string())
        .collect();

    for category in &order {
        if principal_set.contains(category) || is_target_name(category) {
            continue;
        }
        let lower = category.to_lowercase();
        if let Some(target) = direct_target(&lower).or_else(|| keyword_target(&lower)) {
            tracing::debug!(from = %category, to = target, "consolidated category");
            result.insert(category, target);
        }
    }

    tracing::info!(
        categories = order.len(),
        principals = result.principals.len(),
        mapped = result.len(),
        "consolidated categories"
    );
    Ok(result)
}
