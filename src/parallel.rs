//! Parallel guide scanning using rayon
//!
//! Enable with the `parallel` feature. Each record is scanned independently;
//! output order matches input order.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "parallel")]
//! # fn main() {
//! use agro_grna::parallel::scan_parallel;
//! use agro_grna::scan::ScanParams;
//!
//! let sequences = vec!["ATGACCTGGAAATGGCCTGG", "TTTTTTTTTTTTTTTTTTTTAGG"];
//! let results = scan_parallel(&sequences, &ScanParams::default());
//! assert_eq!(results.len(), 2);
//! # }
//! # #[cfg(not(feature = "parallel"))]
//! # fn main() {}
//! ```

use rayon::prelude::*;

use crate::fasta::FastaRecord;
use crate::scan::{scan, GuideCandidate, ScanParams};

/// Scan multiple sequences in parallel
pub fn scan_parallel<S: AsRef<str> + Sync>(
    sequences: &[S],
    params: &ScanParams,
) -> Vec<Vec<GuideCandidate>> {
    sequences
        .par_iter()
        .map(|s| scan(s.as_ref(), params))
        .collect()
}

/// Scan FASTA records in parallel
pub fn scan_records_parallel(
    records: &[FastaRecord],
    params: &ScanParams,
) -> Vec<Vec<GuideCandidate>> {
    records
        .par_iter()
        .map(|record| scan(&record.sequence, params))
        .collect()
}
