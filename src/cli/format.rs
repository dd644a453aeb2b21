//! Output formatting utilities for CLI operations

use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::locus::{GeneLocus, LocusRegistry};
use crate::scan::GuideCandidate;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// JSON lines, one object per record
    Json,
    /// Tab-separated, one row per guide
    Tsv,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    /// Parse an output format from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use agro_grna::cli::OutputFormat;
    /// use std::str::FromStr;
    ///
    /// assert!(matches!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json));
    /// assert!(matches!(OutputFormat::from_str("TSV").unwrap(), OutputFormat::Tsv));
    /// assert!(matches!(OutputFormat::from_str("other").unwrap(), OutputFormat::Text));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "tsv" => OutputFormat::Tsv,
            _ => OutputFormat::Text,
        })
    }
}

/// Column header for [`OutputFormat::Tsv`]
pub const TSV_HEADER: &str = "record\trank\tsequence\tpam\tstart\tstrand\tscore";

#[derive(Serialize)]
struct RecordGuides<'a> {
    record: &'a str,
    sequence_length: usize,
    top_grnas: &'a [GuideCandidate],
}

/// Write the ranked guides of one scanned record
///
/// # Examples
///
/// ```
/// use agro_grna::cli::{write_guides, OutputFormat};
/// use agro_grna::scan::{scan, ScanParams, PamPattern};
/// use std::io::Cursor;
///
/// let params = ScanParams::new(PamPattern::ngg(), 3, 3).unwrap();
/// let guides = scan("ATGACCTGG", &params);
/// let mut buffer = Cursor::new(Vec::new());
/// write_guides(&mut buffer, "demo", 9, &guides, OutputFormat::Tsv).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert_eq!(result, "demo\t1\tACC\tTGG\t3\t+\t0.84\n");
/// ```
pub fn write_guides<W: Write>(
    writer: &mut W,
    record: &str,
    sequence_length: usize,
    guides: &[GuideCandidate],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(&RecordGuides {
                record,
                sequence_length,
                top_grnas: guides,
            })
            .map_err(io::Error::other)?;
            writeln!(writer, "{}", line)
        }
        OutputFormat::Tsv => {
            for (rank, guide) in guides.iter().enumerate() {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
                    record,
                    rank + 1,
                    guide.sequence,
                    guide.pam,
                    guide.start_offset,
                    guide.strand,
                    guide.score
                )?;
            }
            Ok(())
        }
        OutputFormat::Text => {
            writeln!(
                writer,
                ">{} ({} bp, {} guides)",
                record,
                sequence_length,
                guides.len()
            )?;
            for (rank, guide) in guides.iter().enumerate() {
                writeln!(
                    writer,
                    "{:>3}  {} {}  start={} strand={} score={:.2}",
                    rank + 1,
                    guide.sequence,
                    guide.pam,
                    guide.start_offset,
                    guide.strand,
                    guide.score
                )?;
            }
            Ok(())
        }
    }
}

/// Write one resolved registry locus
pub fn write_locus<W: Write>(
    writer: &mut W,
    locus: &GeneLocus,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(locus).map_err(io::Error::other)?;
            writeln!(writer, "{}", line)
        }
        OutputFormat::Tsv => writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            locus.crop, locus.trait_name, locus.organism_id, locus.external_id, locus.symbol
        ),
        OutputFormat::Text => {
            writeln!(writer, "crop:      {}", locus.crop)?;
            writeln!(writer, "trait:     {}", locus.trait_name)?;
            writeln!(writer, "organism:  {}", locus.organism_name())?;
            writeln!(writer, "gene:      {} ({})", locus.symbol, locus.external_id)
        }
    }
}

/// Write every crop and its traits
pub fn write_registry<W: Write>(
    writer: &mut W,
    registry: &LocusRegistry,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = serde_json::to_string_pretty(registry).map_err(io::Error::other)?;
            writeln!(writer, "{}", doc)
        }
        OutputFormat::Tsv => {
            for (crop, entry) in registry.entries() {
                for (trait_name, gene) in &entry.traits {
                    writeln!(
                        writer,
                        "{}\t{}\t{}\t{}",
                        crop, trait_name, gene.external_id, gene.symbol
                    )?;
                }
            }
            Ok(())
        }
        OutputFormat::Text => {
            for (crop, entry) in registry.entries() {
                writeln!(writer, "{} ({})", crop, entry.scientific_name)?;
                for (trait_name, gene) in &entry.traits {
                    writeln!(writer, "  {:<28} {} ({})", trait_name, gene.symbol, gene.external_id)?;
                }
            }
            Ok(())
        }
    }
}
