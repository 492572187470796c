//! Language metadata registry.
//!
//! One lookup surface for everything the engine needs to know about a
//! language: script, tonality, family, and the formality markers used for
//! register analysis. Populated once at process start and immutable after.

mod translit;

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub use translit::transliteration_table;

/// Writing system of a language, used to pick a grapheme-to-phoneme rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Latin,
    Cyrillic,
    Arabic,
    Devanagari,
    Han,
    Kana,
    Hangul,
    Thai,
    Hebrew,
}

/// Static metadata for a single supported language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub script: ScriptType,
    pub is_tonal: bool,
    pub family: &'static str,
    pub formal_markers: &'static [&'static str],
    pub informal_markers: &'static [&'static str],
}

static SHARED_REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::with_builtin);

/// Registry of supported languages keyed by code.
#[derive(Debug)]
pub struct LanguageRegistry {
    entries: HashMap<&'static str, LanguageProfile>,
}

impl LanguageRegistry {
    /// Returns a handle to the globally shared registry.
    pub fn shared() -> &'static Self {
        &SHARED_REGISTRY
    }

    fn with_builtin() -> Self {
        let mut entries = HashMap::new();
        for profile in BUILTIN_LANGUAGES {
            entries.insert(profile.code, *profile);
        }
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<&LanguageProfile> {
        self.entries.get(code)
    }

    pub fn supports(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

macro_rules! profile {
    ($code:literal, $name:literal, $script:ident, $tonal:literal, $family:literal) => {
        LanguageProfile {
            code: $code,
            name: $name,
            script: ScriptType::$script,
            is_tonal: $tonal,
            family: $family,
            formal_markers: &[],
            informal_markers: &[],
        }
    };
    ($code:literal, $name:literal, $script:ident, $tonal:literal, $family:literal,
     formal: $formal:expr, informal: $informal:expr) => {
        LanguageProfile {
            code: $code,
            name: $name,
            script: ScriptType::$script,
            is_tonal: $tonal,
            family: $family,
            formal_markers: $formal,
            informal_markers: $informal,
        }
    };
}

const BUILTIN_LANGUAGES: &[LanguageProfile] = &[
    profile!("en", "English", Latin, false, "indo_european"),
    profile!("es", "Spanish", Latin, false, "indo_european"),
    profile!("fr", "French", Latin, false, "indo_european"),
    profile!("de", "German", Latin, false, "indo_european"),
    profile!("it", "Italian", Latin, false, "indo_european"),
    profile!("pt", "Portuguese", Latin, false, "indo_european"),
    profile!("tr", "Turkish", Latin, false, "turkic"),
    profile!("ru", "Russian", Cyrillic, false, "indo_european"),
    profile!(
        "ar",
        "Arabic",
        Arabic,
        false,
        "afro_asiatic",
        formal: &["حضرة", "سيد", "أستاذ"],
        informal: &["انت", "حبيبي"]
    ),
    profile!("he", "Hebrew", Hebrew, false, "afro_asiatic"),
    profile!(
        "ur",
        "Urdu",
        Arabic,
        false,
        "indo_european",
        formal: &["آپ", "جناب", "صاحب"],
        informal: &["تم", "یار", "بھائی"]
    ),
    profile!(
        "hi",
        "Hindi",
        Devanagari,
        false,
        "indo_european",
        formal: &["आप", "जी", "साहब"],
        informal: &["तू", "यार", "भाई"]
    ),
    profile!(
        "ja",
        "Japanese",
        Kana,
        false,
        "japonic",
        formal: &["です", "ます", "さん"],
        informal: &["だ", "よ", "ね"]
    ),
    profile!(
        "ko",
        "Korean",
        Hangul,
        false,
        "koreanic",
        formal: &["습니다", "세요", "님"],
        informal: &["어", "야", "이야"]
    ),
    profile!("zh-CN", "Mandarin Chinese", Han, true, "sino_tibetan"),
    profile!(
        "th",
        "Thai",
        Thai,
        true,
        "tai_kadai",
        formal: &["คะ", "ครับ", "คุณ"],
        informal: &["เธอ", "กู", "มึง"]
    ),
    profile!(
        "vi",
        "Vietnamese",
        Latin,
        true,
        "austro_asiatic",
        formal: &["anh", "chị", "ạ"],
        informal: &["tao", "mày"]
    ),
];
