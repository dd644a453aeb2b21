//! CRISPR-Cas9 guide RNA candidate scanning
//!
//! - [`pam`]: PAM motif compilation and wildcard matching
//! - [`scanner`]: windowed forward-strand scan, positional scoring and ranking

pub mod pam;
pub mod scanner;

pub use pam::PamPattern;
pub use scanner::{
    find_candidates, position_score, rank_candidates, scan, GuideCandidate, ScanParams, Strand,
    DEFAULT_GUIDE_LENGTH, DEFAULT_TOP_K, MAX_GUIDE_LENGTH,
};
