//! Protospacer-adjacent motif patterns
//!
//! A PAM is a short fixed-length motif over {A,C,G,T,N}. `N` is a wildcard
//! that matches any one of the four concrete bases; it does not match an
//! ambiguous base (`N`) in the scanned sequence itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GrnaError;

/// Longest motif accepted by [`PamPattern::new`]
pub const MAX_PAM_LENGTH: usize = 12;

/// One compiled motif position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PamBase {
    Exact(u8),
    Any,
}

impl PamBase {
    #[inline]
    fn matches(self, base: u8) -> bool {
        match self {
            PamBase::Exact(expected) => base == expected,
            PamBase::Any => is_concrete_base(base),
        }
    }
}

/// True for an upper-case A, C, G or T
#[inline]
pub fn is_concrete_base(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

/// A compiled PAM motif
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PamPattern {
    motif: String,
    positions: Vec<PamBase>,
}

impl PamPattern {
    /// Compile a motif such as `"NGG"`; input is case-insensitive.
    pub fn new(motif: &str) -> Result<Self, GrnaError> {
        let motif = motif.trim().to_ascii_uppercase();
        if motif.is_empty() {
            return Err(GrnaError::InvalidPam {
                motif,
                reason: "motif is empty".to_string(),
            });
        }
        if motif.len() > MAX_PAM_LENGTH {
            return Err(GrnaError::InvalidPam {
                reason: format!("motif longer than {} bases", MAX_PAM_LENGTH),
                motif,
            });
        }

        let mut positions = Vec::with_capacity(motif.len());
        for (i, c) in motif.bytes().enumerate() {
            let position = match c {
                b'N' => PamBase::Any,
                b if is_concrete_base(b) => PamBase::Exact(b),
                _ => {
                    return Err(GrnaError::InvalidPam {
                        reason: format!(
                            "unsupported character '{}' at position {}",
                            c as char,
                            i + 1
                        ),
                        motif: motif.clone(),
                    })
                }
            };
            positions.push(position);
        }

        Ok(Self { motif, positions })
    }

    /// The standard SpCas9 motif
    pub fn ngg() -> Self {
        Self {
            motif: "NGG".to_string(),
            positions: vec![PamBase::Any, PamBase::Exact(b'G'), PamBase::Exact(b'G')],
        }
    }

    /// Number of bases in the motif
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a compiled pattern; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The normalized (upper-case) motif text
    pub fn as_str(&self) -> &str {
        &self.motif
    }

    /// Number of wildcard positions in the motif
    pub fn wildcard_count(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| matches!(p, PamBase::Any))
            .count()
    }

    /// Position-for-position match against a window of exactly `len()` upper-case bases
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.positions.len()
            && self
                .positions
                .iter()
                .zip(window)
                .all(|(p, &b)| p.matches(b))
    }

    /// Convenience wrapper over [`PamPattern::matches`] for string input
    pub fn matches_str(&self, window: &str) -> bool {
        self.matches(window.to_ascii_uppercase().as_bytes())
    }
}

impl Default for PamPattern {
    fn default() -> Self {
        Self::ngg()
    }
}

impl fmt::Display for PamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.motif)
    }
}

impl FromStr for PamPattern {
    type Err = GrnaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PamPattern {
    type Error = GrnaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PamPattern> for String {
    fn from(value: PamPattern) -> Self {
        value.motif
    }
}
