use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProdcatError, Result};
use crate::normalize::{normalize, words};

/// One category and the keyword phrases that vote for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword rules. Iteration order is insertion order and doubles as
/// the tie-break: when two categories score the same, the earlier one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build from raw (category, keywords) pairs. Keywords are normalized
    /// here so they compare against normalized descriptions; phrases that
    /// normalize to nothing are dropped.
    pub fn new(raw: Vec<Rule>) -> Self {
        let mut set = Self::default();
        for rule in raw {
            set.push(&rule.category, rule.keywords.iter().map(String::as_str));
        }
        set
    }

    fn push<'a>(&mut self, category: &str, keywords: impl Iterator<Item = &'a str>) {
        let normalized = keywords
            .map(normalize)
            .filter(|k| !k.is_empty());
        match self.rules.iter_mut().find(|r| r.category == category) {
            Some(existing) => existing.keywords.extend(normalized),
            None => self.rules.push(Rule {
                category: category.to_string(),
                keywords: normalized.collect(),
            }),
        }
    }

    /// Load rules from a JSON array of `{"category": .., "keywords": [..]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Vec<Rule> = serde_json::from_str(&content)
            .map_err(|e| ProdcatError::Rules(format!("{}: {e}", path.display())))?;
        Ok(Self::new(raw))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.rules.iter().any(|r| r.category == category)
    }

    /// A copy extended with reference categories that have no rule of their
    /// own; each such category's words become its keywords.
    pub fn with_catalog_categories(&self, categories: &[String]) -> Self {
        let mut extended = self.clone();
        for category in categories {
            if extended.contains_category(category) {
                continue;
            }
            let own_words = words(category);
            if !own_words.is_empty() {
                extended.push(category, own_words.iter().map(String::as_str));
            }
        }
        extended
    }

    /// Score the description against every category: +2 for a keyword that
    /// appears as a whole word, +1 for one that only appears inside a word.
    pub fn classify(&self, description: &str) -> Option<&str> {
        let desc = normalize(description);
        if desc.is_empty() {
            return None;
        }
        let padded = format!(" {desc} ");

        let mut best: Option<(&str, u32)> = None;
        for rule in &self.rules {
            let score: u32 = rule
                .keywords
                .iter()
                .filter(|k| desc.contains(k.as_str()))
                .map(|k| if padded.contains(&format!(" {k} ")) { 2 } else { 1 })
                .sum();
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((rule.category.as_str(), score));
            }
        }
        best.map(|(category, _)| category)
    }
}

/// Built-in cosmetics rules. Descriptions in this market mix English and
/// Portuguese, so both vocabularies are listed.
pub fn default_rules() -> RuleSet {
    let raw: &[(&str, &[&str])] = &[
        (
            "Makeup",
            &[
                "batom", "lip", "labial", "gloss", "boca", "labios", "lip stick", "lipstick",
                "base", "po", "compacto", "foundation", "bb cream", "cc cream", "corretivo",
                "concealer", "primer", "pre base", "fixador", "setting spray", "finalizador",
                "sombra", "paleta", "palette", "delineador", "eyeliner", "lapis", "olho", "eye",
                "rimel", "mascara", "cilios", "sobrancelha", "brow",
                "blush", "rouge", "iluminador", "highlighter", "contorno", "bronzer", "bronzeador",
                "maquiagem", "makeup", "make up", "make-up", "cosmetico",
            ],
        ),
        (
            "Skincare",
            &[
                "limpeza", "facial", "demaquilante", "removedor", "sabonete", "gel", "mousse",
                "espuma", "cleansing", "cleanser", "micellar", "micelar", "agua", "tonico", "toner",
                "serum", "ampola", "tratamento", "acido", "vitamina c", "retinol",
                "anti-idade", "antiidade", "anti idade", "antirrugas", "anti-rugas", "anti rugas",
                "hidratante", "moisturizer", "creme", "locao", "oil free",
                "protetor solar", "filtro solar", "sunscreen", "fps", "spf", "protecao",
                "esfoliante", "peeling", "scrub", "renovador", "renovacao",
                "mascara facial", "sheet mask", "mask", "argila", "clay",
                "skincare", "skin care", "pele", "rosto", "face", "dermatologico",
            ],
        ),
        (
            "Hair",
            &[
                "shampoo", "xampu", "champu", "anti caspa", "anticaspa", "anti-caspa",
                "condicionador", "conditioner", "mascara capilar", "hair mask",
                "tratamento", "reparador", "reparacao", "reconstrutor", "reconstrucao",
                "finalizador", "modelador", "leave-in", "leave in", "creme para pentear",
                "sem enxague", "oleo", "serum", "spray", "mousse", "espuma", "gel", "pomada",
                "tintura", "coloracao", "color", "tonalizante", "descolorante", "oxidante",
                "matizador", "matizante", "desamarelador",
                "cabelo", "capilar", "hair", "cabeleira", "cabeleireiro", "cabeleireira",
            ],
        ),
        (
            "Fragrance",
            &[
                "perfume", "eau de parfum", "eau de toilette", "eau de cologne", "colonia",
                "parfum", "fragrance", "fragrancia", "body splash", "body spray",
                "deo parfum", "deo colonia", "essencia", "aroma",
            ],
        ),
        (
            "Body",
            &[
                "hidratante corporal", "locao corporal", "creme corporal", "body lotion",
                "body cream", "manteiga corporal", "oleo corporal", "body oil",
                "esfoliante corporal", "body scrub", "sabonete corporal", "body wash",
                "shower gel", "gel de banho", "desodorante", "antitranspirante",
                "antiperspirante", "desodorante roll-on", "desodorante aerosol",
                "desodorante spray", "talco", "po corporal", "creme para maos", "hand cream",
                "creme para pes", "foot cream", "massagem", "anticelulite", "anti-celulite",
                "firmador", "redutor de medidas", "corpo", "body",
            ],
        ),
        (
            "Nails",
            &[
                "esmalte", "nail polish", "base para esmalte", "base coat", "top coat",
                "finalizador", "fortalecedor", "endurecedor", "removedor", "acetona",
                "cuticula", "unha", "unhas", "nail", "nails", "manicure", "pedicure", "alicate",
                "lixa", "palito",
            ],
        ),
        (
            "Accessories",
            &[
                "pincel", "brush", "esponja", "beauty blender", "aplicador", "espatula",
                "pente", "escova", "cerdas", "necessaire", "porta", "estojo", "case",
                "espelho", "mirror", "organizador", "suporte", "kit", "conjunto", "set",
                "travel", "viagem", "bolsa", "sacola", "acessorio", "accessory",
            ],
        ),
        (
            "Personal Care",
            &[
                "higiene", "sabonete", "soap", "desodorante", "deodorant", "antitranspirante",
                "antiperspirant", "depilacao", "depilador", "cera", "wax", "lamina", "barbear",
                "shaving", "pos-barba", "after shave", "intima", "absorvente", "protetor",
                "lenco", "tissue", "papel", "algodao", "cotonete", "hastes", "escova dental",
                "creme dental", "pasta de dente", "enxaguante", "fio dental", "dental", "oral",
                "bucal",
            ],
        ),
    ];

    let mut set = RuleSet::default();
    for (category, keywords) in raw {
        set.push(category, keywords.iter().copied());
    }
    set
}

/// The rules file named in settings or on the command line, else the
/// built-in set.
pub fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(p) => {
            let set = RuleSet::from_file(p)?;
            tracing::info!(path = %p.display(), categories = set.len(), "loaded rules file");
            Ok(set)
        }
        None => Ok(default_rules()),
    }
}
