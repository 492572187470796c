//! Accentor - pronunciation assessment engine for language learners.
//!
//! Takes decoded mono PCM audio plus a reference text and produces phoneme-,
//! word-, and utterance-level accuracy scores together with an FSI proficiency
//! estimate on the 0-5 scale.

pub mod analysis;
pub mod language;

pub use analysis::{
    AnalysisError, AnalysisReport, AnalysisRequest, Analyzer, QualityRating, Result,
};
pub use language::{LanguageRegistry, ScriptType};
