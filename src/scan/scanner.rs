//! Guide RNA candidate scanning
//!
//! Exhaustive forward-strand windowed scan: at every offset `i` the window
//! `seq[i..i + guide_length]` must be pure A/C/G/T and
//! `seq[i + guide_length..i + guide_length + pam.len()]` must match the PAM.
//! Overlapping windows are all reported.
//!
//! # Scoring
//!
//! The ranking score is a cyclic function of the start offset only:
//! `0.9 - 0.02 * (start mod 10)`, rounded to two decimals. It ignores sequence
//! content, GC fraction and off-target risk. It is kept for output
//! compatibility and carries no biological meaning.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GrnaError;
use crate::scan::pam::{is_concrete_base, PamPattern};

/// Default guide (protospacer) length for SpCas9
pub const DEFAULT_GUIDE_LENGTH: usize = 20;

/// Default number of ranked candidates returned
pub const DEFAULT_TOP_K: usize = 3;

/// Upper bound on the guide length accepted by [`ScanParams::new`]
pub const MAX_GUIDE_LENGTH: usize = 100;

/// Strand a candidate was found on
///
/// Only the forward strand is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
        }
    }
}

/// One ranked guide RNA target site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideCandidate {
    /// Protospacer bases, `guide_length` long
    pub sequence: String,
    /// Bases matched by the PAM pattern
    pub pam: String,
    /// 0-based offset of the first guide base in the scanned sequence
    #[serde(rename = "start")]
    pub start_offset: usize,
    pub strand: Strand,
    pub score: f64,
}

impl GuideCandidate {
    /// 0-based exclusive end of the guide + PAM window
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.sequence.len() + self.pam.len()
    }
}

/// Parameters of one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParams {
    pub pam: PamPattern,
    pub guide_length: usize,
    pub top_k: usize,
}

impl ScanParams {
    /// Build validated scan parameters
    pub fn new(pam: PamPattern, guide_length: usize, top_k: usize) -> Result<Self, GrnaError> {
        if guide_length == 0 {
            return Err(GrnaError::InvalidGuideLength {
                length: guide_length,
                reason: "guide length must be at least 1".to_string(),
            });
        }
        if guide_length > MAX_GUIDE_LENGTH {
            return Err(GrnaError::InvalidGuideLength {
                length: guide_length,
                reason: format!("guide length must not exceed {}", MAX_GUIDE_LENGTH),
            });
        }
        Ok(Self {
            pam,
            guide_length,
            top_k,
        })
    }

    /// Total window width (guide + PAM)
    pub fn window_len(&self) -> usize {
        self.guide_length + self.pam.len()
    }
}

impl Default for ScanParams {
    /// NGG, 20 nt guides, top 3
    fn default() -> Self {
        Self {
            pam: PamPattern::ngg(),
            guide_length: DEFAULT_GUIDE_LENGTH,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Ranking score for a candidate starting at `start_offset`
///
/// Computed in integer hundredths so the result is bit-identical to the
/// two-decimal literal (e.g. offset 15 gives exactly `0.80`).
pub fn position_score(start_offset: usize) -> f64 {
    let hundredths = 90 - 2 * (start_offset % 10) as i64;
    hundredths as f64 / 100.0
}

/// Enumerate every forward-strand candidate in scan order (unranked, untruncated)
///
/// The sequence is upper-cased before matching, so soft-masked (lower-case)
/// bases are eligible.
pub fn find_candidates(
    sequence: &str,
    pam: &PamPattern,
    guide_length: usize,
) -> Vec<GuideCandidate> {
    let seq = sequence.as_bytes().to_ascii_uppercase();
    let window = guide_length + pam.len();
    if guide_length == 0 || seq.len() < window {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    // Length of the run of concrete bases ending at the current index
    let mut run = 0usize;
    for end_of_guide in 0..=(seq.len() - pam.len()) {
        if end_of_guide > 0 {
            run = if is_concrete_base(seq[end_of_guide - 1]) {
                run + 1
            } else {
                0
            };
        }
        if end_of_guide < guide_length || run < guide_length {
            continue;
        }
        let pam_window = &seq[end_of_guide..end_of_guide + pam.len()];
        if !pam.matches(pam_window) {
            continue;
        }
        let start = end_of_guide - guide_length;
        candidates.push(GuideCandidate {
            sequence: String::from_utf8_lossy(&seq[start..end_of_guide]).into_owned(),
            pam: String::from_utf8_lossy(pam_window).into_owned(),
            start_offset: start,
            strand: Strand::Forward,
            score: position_score(start),
        });
    }
    candidates
}

/// Sort candidates by descending score, keeping scan order among ties, and keep the first `top_k`
pub fn rank_candidates(mut candidates: Vec<GuideCandidate>, top_k: usize) -> Vec<GuideCandidate> {
    // Vec::sort_by is stable
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_k);
    candidates
}

/// Scan, rank and truncate in one step
///
/// An empty result is valid output, not an error.
pub fn scan(sequence: &str, params: &ScanParams) -> Vec<GuideCandidate> {
    let candidates = find_candidates(sequence, &params.pam, params.guide_length);
    tracing::debug!(
        sequence_length = sequence.len(),
        pam = %params.pam,
        guide_length = params.guide_length,
        matches = candidates.len(),
        "scanned sequence for guide candidates"
    );
    rank_candidates(candidates, params.top_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(guide_length: usize, top_k: usize) -> ScanParams {
        ScanParams::new(PamPattern::ngg(), guide_length, top_k).unwrap()
    }

    #[test]
    fn test_position_score_cycle() {
        assert_eq!(position_score(0), 0.9);
        assert_eq!(position_score(1), 0.88);
        assert_eq!(position_score(9), 0.72);
        assert_eq!(position_score(10), 0.9);
        assert_eq!(position_score(15), 0.8);
        assert_eq!(position_score(1234567), 0.76);
    }

    #[test]
    fn test_find_candidates_small_example() {
        let found = find_candidates("ATGACCTGGAAATGGCCTGG", &PamPattern::ngg(), 3);
        let summary: Vec<(usize, &str, &str)> = found
            .iter()
            .map(|c| (c.start_offset, c.sequence.as_str(), c.pam.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(3, "ACC", "TGG"), (9, "AAA", "TGG"), (14, "GCC", "TGG")]
        );
    }

    #[test]
    fn test_overlapping_windows_are_all_kept() {
        // Every window whose PAM lands on GGG matches
        let found = find_candidates("AGGGGG", &PamPattern::ngg(), 1);
        let starts: Vec<usize> = found.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_guide_with_ambiguous_base_is_skipped() {
        let found = find_candidates("ANATGG", &PamPattern::ngg(), 3);
        assert!(found.is_empty());
        let found = find_candidates("ANACTTGG", &PamPattern::ngg(), 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sequence, "ACT");
        assert_eq!(found[0].start_offset, 2);
    }

    #[test]
    fn test_lowercase_input_is_uppercased() {
        let found = find_candidates("aaacgg", &PamPattern::ngg(), 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sequence, "AAA");
        assert_eq!(found[0].pam, "CGG");
    }

    #[test]
    fn test_sequence_shorter_than_window() {
        assert!(find_candidates("AGG", &PamPattern::ngg(), 3).is_empty());
        assert!(find_candidates("", &PamPattern::ngg(), 20).is_empty());
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        // Offsets 0 and 10 both score 0.9
        let ranked = scan("AAGGTTTTTTAAGG", &params(1, 10));
        let starts: Vec<usize> = ranked.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![0, 10]);
    }

    #[test]
    fn test_rank_orders_by_descending_score() {
        let ranked = scan("TAAGGTTTTTAAGG", &params(1, 10));
        let starts: Vec<usize> = ranked.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![10, 1]);
        assert_eq!(ranked[0].score, 0.9);
        assert_eq!(ranked[1].score, 0.88);
    }

    #[test]
    fn test_scan_truncates_to_top_k() {
        let seq = "AGGAGGAGGAGGAGGAGGAGG";
        let all = find_candidates(seq, &PamPattern::ngg(), 1);
        let ranked = scan(seq, &params(1, 3));
        assert!(all.len() > 3);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_end_offset() {
        let found = find_candidates("ATGACCTGGAAATGGCCTGG", &PamPattern::ngg(), 3);
        assert_eq!(found[0].end_offset(), 9);
    }

    #[test]
    fn test_scan_params_validation() {
        assert!(ScanParams::new(PamPattern::ngg(), 0, 3).is_err());
        assert!(ScanParams::new(PamPattern::ngg(), MAX_GUIDE_LENGTH + 1, 3).is_err());
        let p = ScanParams::default();
        assert_eq!(p.guide_length, 20);
        assert_eq!(p.top_k, 3);
        assert_eq!(p.window_len(), 23);
    }

    #[test]
    fn test_candidate_serialization_shape() {
        let candidate = GuideCandidate {
            sequence: "AAA".to_string(),
            pam: "TGG".to_string(),
            start_offset: 9,
            strand: Strand::Forward,
            score: 0.72,
        };
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["start"], 9);
        assert_eq!(json["strand"], "+");
        assert_eq!(json["score"], 0.72);
    }
}
