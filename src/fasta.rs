//! Flat-text FASTA handling
//!
//! Used for NCBI `efetch` responses (`rettype=fasta`), for user-supplied
//! sequences on the custom scan endpoint, and for CLI input files.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::GrnaError;

/// One FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Header line without the leading `>`
    pub header: String,
    /// Concatenated sequence lines, whitespace removed
    pub sequence: String,
}

impl FastaRecord {
    /// First whitespace-delimited token of the header (the accession)
    pub fn id(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }
}

/// Parse all records from FASTA text
///
/// Blank lines and `;` comment lines are ignored. Sequence text before the
/// first header is an error.
pub fn parse_fasta(text: &str) -> Result<Vec<FastaRecord>, GrnaError> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(FastaRecord {
                header: header.trim().to_string(),
                sequence: String::new(),
            });
        } else {
            match current.as_mut() {
                Some(record) => record
                    .sequence
                    .extend(line.chars().filter(|c| !c.is_whitespace())),
                None => {
                    return Err(GrnaError::InvalidSequence {
                        msg: format!("sequence data before first FASTA header at line {}", line_no + 1),
                    })
                }
            }
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }
    Ok(records)
}

/// Extract the first record's sequence from a FASTA document
pub fn first_sequence(text: &str) -> Result<String, GrnaError> {
    parse_fasta(text)?
        .into_iter()
        .next()
        .map(|r| r.sequence)
        .ok_or_else(|| GrnaError::InvalidSequence {
            msg: "no FASTA records found".to_string(),
        })
}

/// Accept either raw sequence text or a FASTA document and return the bare sequence
///
/// Whitespace (including line breaks) is dropped. Characters other than
/// ASCII letters are rejected; ambiguity codes are kept and simply never
/// match a guide window.
pub fn normalize_sequence_text(text: &str) -> Result<String, GrnaError> {
    let trimmed = text.trim_start();
    let sequence = if trimmed.starts_with('>') {
        first_sequence(trimmed)?
    } else {
        trimmed.chars().filter(|c| !c.is_whitespace()).collect()
    };

    if let Some((pos, c)) = sequence
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
    {
        return Err(GrnaError::InvalidSequence {
            msg: format!("unexpected character '{}' at position {}", c, pos + 1),
        });
    }
    Ok(sequence)
}

/// Check if a file is gzip-compressed by reading its magic bytes
fn is_gzip_file(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == [0x1f, 0x8b]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Open a FASTA source: `-` for stdin, plain or gzip-compressed files otherwise
pub fn open_fasta(path: &Path) -> Result<Box<dyn BufRead>, GrnaError> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)?;
    if is_gzip_file(path)? {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read and parse every record from a FASTA path
pub fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>, GrnaError> {
    let mut reader = open_fasta(path)?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_fasta(&text)
}
