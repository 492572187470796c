//! Weighted global alignment between reference and actual phonetic sequences.
//!
//! Generalized Levenshtein over discrete symbols: substitution costs
//! `1 - sim(ref, act)`, insertions and deletions cost 1. Ties prefer
//! substitution over insertion over deletion so the path favors 1:1 pairing.
//! A failing similarity computation drops the request to a naive positional
//! pairing instead of aborting it.

use tracing::warn;

use super::similarity::similarity;
use super::{AlignmentEntry, AnalysisError, PhoneticUnit, Result};

/// Cap on either sequence length; keeps the O(|ref|·|act|) cost predictable.
const MAX_UNITS: usize = 2_000;

/// Fixed similarity assigned by the naive positional fallback.
const FALLBACK_SIMILARITY: f32 = 0.5;

const COST_EPSILON: f32 = 1e-6;

type SimilarityFn = dyn Fn(&str, &str) -> Result<f32>;

/// Aligns reference phonetics against classified actual phonetics.
#[derive(Debug, Default)]
pub struct PhoneticAligner {}

impl PhoneticAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn align(
        &self,
        reference: &[PhoneticUnit],
        actual: &[PhoneticUnit],
    ) -> Result<Vec<AlignmentEntry>> {
        self.align_with(reference, actual, &|a, b| similarity(a, b))
    }

    /// Alignment with an injectable similarity function; exercised directly by
    /// tests of the degraded path.
    pub fn align_with(
        &self,
        reference: &[PhoneticUnit],
        actual: &[PhoneticUnit],
        sim: &SimilarityFn,
    ) -> Result<Vec<AlignmentEntry>> {
        let longest = reference.len().max(actual.len());
        if longest > MAX_UNITS {
            return Err(AnalysisError::SequenceTooLong {
                length: longest,
                cap: MAX_UNITS,
            });
        }
        match weighted_alignment(reference, actual, sim) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(error = %err, "similarity computation failed; using naive 1:1 pairing");
                Ok(naive_alignment(reference, actual))
            }
        }
    }
}

fn weighted_alignment(
    reference: &[PhoneticUnit],
    actual: &[PhoneticUnit],
    sim: &SimilarityFn,
) -> Result<Vec<AlignmentEntry>> {
    let ref_len = reference.len();
    let act_len = actual.len();

    let mut sims = vec![0.0_f32; ref_len * act_len];
    for i in 0..ref_len {
        for j in 0..act_len {
            sims[i * act_len + j] = sim(&reference[i].symbol, &actual[j].symbol)?;
        }
    }

    let mut cost = vec![vec![0.0_f32; act_len + 1]; ref_len + 1];
    for (i, row) in cost.iter_mut().enumerate() {
        row[0] = i as f32;
    }
    for j in 0..=act_len {
        cost[0][j] = j as f32;
    }
    for i in 1..=ref_len {
        for j in 1..=act_len {
            let substitution = cost[i - 1][j - 1] + (1.0 - sims[(i - 1) * act_len + (j - 1)]);
            let insertion = cost[i][j - 1] + 1.0;
            let deletion = cost[i - 1][j] + 1.0;
            // Tie-break order: substitution, then insertion, then deletion.
            let mut best = substitution;
            if insertion < best {
                best = insertion;
            }
            if deletion < best {
                best = deletion;
            }
            cost[i][j] = best;
        }
    }

    let mut entries = Vec::with_capacity(ref_len.max(act_len));
    let mut i = ref_len;
    let mut j = act_len;
    while i > 0 && j > 0 {
        let here = cost[i][j];
        let pair_sim = sims[(i - 1) * act_len + (j - 1)];
        if (here - (cost[i - 1][j - 1] + 1.0 - pair_sim)).abs() < COST_EPSILON {
            entries.push(AlignmentEntry::matched(
                reference[i - 1].clone(),
                actual[j - 1].clone(),
                pair_sim,
            ));
            i -= 1;
            j -= 1;
        } else if (here - (cost[i][j - 1] + 1.0)).abs() < COST_EPSILON {
            entries.push(AlignmentEntry::insertion(actual[j - 1].clone()));
            j -= 1;
        } else {
            entries.push(AlignmentEntry::deletion(reference[i - 1].clone()));
            i -= 1;
        }
    }
    while i > 0 {
        entries.push(AlignmentEntry::deletion(reference[i - 1].clone()));
        i -= 1;
    }
    while j > 0 {
        entries.push(AlignmentEntry::insertion(actual[j - 1].clone()));
        j -= 1;
    }
    entries.reverse();
    Ok(entries)
}

/// Positional 1:1 pairing with fixed similarity over the overlapping range,
/// deletions/insertions for the remainder.
fn naive_alignment(reference: &[PhoneticUnit], actual: &[PhoneticUnit]) -> Vec<AlignmentEntry> {
    let overlap = reference.len().min(actual.len());
    let mut entries = Vec::with_capacity(reference.len().max(actual.len()));
    for index in 0..overlap {
        entries.push(AlignmentEntry::matched(
            reference[index].clone(),
            actual[index].clone(),
            FALLBACK_SIMILARITY,
        ));
    }
    for unit in &reference[overlap..] {
        entries.push(AlignmentEntry::deletion(unit.clone()));
    }
    for unit in &actual[overlap..] {
        entries.push(AlignmentEntry::insertion(unit.clone()));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(symbols: &[&str]) -> Vec<PhoneticUnit> {
        symbols
            .iter()
            .map(|s| PhoneticUnit::reference(s.to_string()))
            .collect()
    }

    fn acts(symbols: &[&str]) -> Vec<PhoneticUnit> {
        symbols
            .iter()
            .enumerate()
            .map(|(i, s)| PhoneticUnit::actual(s.to_string(), i))
            .collect()
    }

    #[test]
    fn caps_sequence_length() {
        let long = refs(&vec!["a"; MAX_UNITS + 1]);
        let err = PhoneticAligner::new().align(&long, &acts(&["a"])).unwrap_err();
        assert!(matches!(err, AnalysisError::SequenceTooLong { .. }));
    }

    #[test]
    fn naive_fallback_pairs_overlap_at_half_similarity() {
        let entries = naive_alignment(&refs(&["a", "b", "c"]), &acts(&["x", "y"]));
        assert_eq!(entries.len(), 3);
        assert!(entries[..2]
            .iter()
            .all(|e| (e.similarity - FALLBACK_SIMILARITY).abs() < 1e-6));
        assert!(entries[2].is_deletion());
    }
}
