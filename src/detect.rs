//! Lightweight heuristic language classifier.
//!
//! Scores Spanish and English by counting characteristic words (case-insensitive
//! substring match) plus one point for Spanish diacritics. Short or ambiguous
//! text may be misclassified.

use crate::language::LanguageTag;

const SPANISH_HINTS: &[&str] = &[
    "hola", "gracias", "por favor", "buenos", "buenas", "disculpa", "envío", "precio", "lps",
    "honduras", "enviar", "comprar", "venta", "servicio", "producto", "pastel", "teléfono",
    "ciudad",
];

const ENGLISH_HINTS: &[&str] = &[
    "hello", "thanks", "please", "good", "sorry", "ship", "price", "usd", "send", "buy", "sale",
    "service", "product", "cake", "phone", "city",
];

const SPANISH_DIACRITICS: &[char] = &['á', 'é', 'í', 'ó', 'ú', 'ñ'];

/// Classify text into a language tag. Ties and zero scores yield `Other`.
pub fn classify(text: &str) -> LanguageTag {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() {
        return LanguageTag::Other;
    }

    let spanish = hint_score(&lowered, SPANISH_HINTS) + diacritic_bonus(&lowered);
    let english = hint_score(&lowered, ENGLISH_HINTS);

    if spanish > english {
        LanguageTag::Es
    } else if english > spanish {
        LanguageTag::En
    } else {
        LanguageTag::Other
    }
}

fn hint_score(text: &str, hints: &[&str]) -> usize {
    hints.iter().filter(|hint| text.contains(*hint)).count()
}

fn diacritic_bonus(text: &str) -> usize {
    usize::from(text.contains(SPANISH_DIACRITICS))
}
