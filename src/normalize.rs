use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Fold a description or keyword into the comparison form shared by every
/// matcher: accents stripped, lowercase, letters only, single-spaced.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let folded: String = text
        .nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase();
    let letters = NON_ALPHA.replace_all(&folded, " ");
    WHITESPACE.replace_all(&letters, " ").trim().to_string()
}

/// Normalized text split into words.
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_accents_and_lowercases() {
        assert_eq!(normalize("Máscara de Cílios"), "mascara de cilios");
        assert_eq!(normalize("PRÉ BASE"), "pre base");
    }

    #[test]
    fn test_replaces_digits_and_punctuation() {
        assert_eq!(normalize("Batom  matte-24h (3,5g)"), "batom matte h g");
        assert_eq!(normalize("leave-in"), "leave in");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        assert_eq!(normalize("123 !!"), "");
    }

    #[test]
    fn test_drops_non_latin_residue() {
        assert_eq!(normalize("perfume 香水 floral"), "perfume floral");
    }

    #[test]
    fn test_idempotent() {
        for sample in [
            "Sérum Vitamina C 30ml",
            "  Eau de Parfum — 100 ML ",
            "Ḉrème\u{00A0}Corporal",
            "Lip Stick",
            "",
        ] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_words() {
        assert_eq!(words("Body Splash, 200ml"), vec!["body", "splash", "ml"]);
        assert!(words("").is_empty());
    }
}
