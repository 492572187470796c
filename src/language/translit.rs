//! Built-in transliteration tables for languages with near-phonemic spelling.
//!
//! Each table maps graphemes (longest first) to IPA units. Languages without
//! a table fall back to the script-family rules in `analysis::phonemize`.

/// Returns the transliteration table for a language, if one is registered.
pub fn transliteration_table(code: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match code {
        "es" => Some(SPANISH),
        "it" => Some(ITALIAN),
        "ru" => Some(RUSSIAN),
        _ => None,
    }
}

const SPANISH: &[(&str, &str)] = &[
    ("ch", "tʃ"),
    ("ll", "ʝ"),
    ("rr", "r"),
    ("qu", "k"),
    ("gu", "g"),
    ("ñ", "ɲ"),
    ("j", "x"),
    ("z", "s"),
    ("v", "b"),
    ("a", "a"),
    ("b", "b"),
    ("c", "k"),
    ("d", "d"),
    ("e", "e"),
    ("f", "f"),
    ("g", "g"),
    ("h", ""),
    ("i", "i"),
    ("k", "k"),
    ("l", "l"),
    ("m", "m"),
    ("n", "n"),
    ("o", "o"),
    ("p", "p"),
    ("r", "ɾ"),
    ("s", "s"),
    ("t", "t"),
    ("u", "u"),
    ("w", "w"),
    ("x", "ks"),
    ("y", "ʝ"),
];

const ITALIAN: &[(&str, &str)] = &[
    ("gli", "ʎ"),
    ("gn", "ɲ"),
    ("sc", "ʃ"),
    ("ch", "k"),
    ("gh", "g"),
    ("zz", "ts"),
    ("a", "a"),
    ("b", "b"),
    ("c", "tʃ"),
    ("d", "d"),
    ("e", "e"),
    ("f", "f"),
    ("g", "dʒ"),
    ("h", ""),
    ("i", "i"),
    ("l", "l"),
    ("m", "m"),
    ("n", "n"),
    ("o", "o"),
    ("p", "p"),
    ("q", "k"),
    ("r", "r"),
    ("s", "s"),
    ("t", "t"),
    ("u", "u"),
    ("v", "v"),
    ("z", "ts"),
];

const RUSSIAN: &[(&str, &str)] = &[
    ("а", "a"),
    ("б", "b"),
    ("в", "v"),
    ("г", "g"),
    ("д", "d"),
    ("е", "je"),
    ("ё", "jo"),
    ("ж", "ʒ"),
    ("з", "z"),
    ("и", "i"),
    ("й", "j"),
    ("к", "k"),
    ("л", "l"),
    ("м", "m"),
    ("н", "n"),
    ("о", "o"),
    ("п", "p"),
    ("р", "r"),
    ("с", "s"),
    ("т", "t"),
    ("у", "u"),
    ("ф", "f"),
    ("х", "x"),
    ("ц", "ts"),
    ("ч", "tʃ"),
    ("ш", "ʃ"),
    ("щ", "ʃ"),
    ("ъ", ""),
    ("ы", "ɨ"),
    ("ь", ""),
    ("э", "e"),
    ("ю", "ju"),
    ("я", "ja"),
];

#[cfg(test)]
mod tests {
    use super::transliteration_table;

    #[test]
    fn digraphs_precede_single_letters() {
        for code in ["es", "it", "ru"] {
            let table = transliteration_table(code).unwrap();
            let first_single = table
                .iter()
                .position(|(g, _)| g.chars().count() == 1)
                .unwrap();
            assert!(
                table[first_single..]
                    .iter()
                    .all(|(g, _)| g.chars().count() == 1),
                "multi-character graphemes must sort first for {code}"
            );
        }
    }

    #[test]
    fn unregistered_language_has_no_table() {
        assert!(transliteration_table("en").is_none());
    }
}
