//! CLI utilities for agro-grna
//!
//! Testable functions used by the `grna` binary.

pub mod format;

pub use format::{write_guides, write_locus, write_registry, OutputFormat, TSV_HEADER};

/// UTF-8 BOM (Byte Order Mark) constant
const UTF8_BOM: &str = "\u{feff}";

/// Strip UTF-8 BOM from the beginning of a string if present.
///
/// This is common when files are exported from Windows applications.
///
/// # Examples
///
/// ```
/// use agro_grna::cli::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}>seq1"), ">seq1");
/// assert_eq!(strip_bom(">seq1"), ">seq1");
/// ```
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(UTF8_BOM).unwrap_or(s)
}
