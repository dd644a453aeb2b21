// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! agro-grna: CRISPR-Cas9 guide RNA design for crop traits
//!
//! Maps a crop/trait pair to a registered gene, resolves the gene's genomic
//! sequence from Ensembl with NCBI as fallback, and scans it for ranked
//! guide RNA candidates adjacent to a PAM.
//!
//! # Example
//!
//! ```
//! use agro_grna::{scan, LocusRegistry, PamPattern, ScanParams};
//!
//! // Resolve a crop/trait pair to its gene
//! let registry = LocusRegistry::embedded().unwrap();
//! let locus = registry.lookup("Rice", "drought resistance").unwrap();
//! assert_eq!(locus.symbol, "DREB1A");
//!
//! // Scan a sequence for NGG-adjacent guides
//! let params = ScanParams::new(PamPattern::ngg(), 20, 3).unwrap();
//! let guides = scan("TTTTTTTTTTTTTTTTTTTTAGG", &params);
//! assert_eq!(guides[0].start_offset, 0);
//! assert_eq!(guides[0].pam, "AGG");
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod explain;
pub mod fasta;
pub mod locus;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod resolve;
pub mod scan;
#[cfg(feature = "web-service")]
pub mod service;

// Re-export commonly used types
pub use analysis::{AnalysisError, AnalysisReport, Analyzer};
pub use error::{ErrorCode, GrnaError};
pub use explain::{ExplanationFailure, ExplanationGenerator, ExplanationRequest};
pub use locus::{GeneLocus, GeneRef, LocusRegistry, LookupError};
pub use resolve::{
    ResolutionFailure, ResolvedSequence, SequenceResolver, SequenceSource, SourceError, SourceTag,
};
pub use scan::{scan, GuideCandidate, PamPattern, ScanParams, Strand};

/// Result type alias for agro-grna operations
pub type Result<T> = std::result::Result<T, GrnaError>;
