//! Input validation for web service requests
//!
//! Crop and trait selections are bounded and restricted to the characters
//! registry keys use; custom sequences are bounded by the configured maximum.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum allowed length for crop or trait names
const MAX_SELECTION_LENGTH: usize = 100;

/// Maximum number of guides a caller may request
pub const MAX_TOP_K: usize = 1000;

/// Letters, digits, spaces and the punctuation registry names use
static SELECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N} _\-.,'()/]*$").unwrap());

/// Validation errors for user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// Input string is too long
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Input contains characters no registry name uses
    InvalidCharacters { field: String },
    /// Sequence is empty after whitespace removal
    EmptySequence,
    /// Sequence exceeds the configured maximum
    SequenceTooLong { max: usize, actual: usize },
    /// top_k outside 1..=MAX_TOP_K
    InvalidTopK { max: usize, actual: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} too long: {} characters (max: {})", field, actual, max)
            }
            ValidationError::InvalidCharacters { field } => {
                write!(f, "{} contains invalid characters", field)
            }
            ValidationError::EmptySequence => write!(f, "Sequence cannot be empty"),
            ValidationError::SequenceTooLong { max, actual } => {
                write!(f, "Sequence too long: {} bases (max: {})", actual, max)
            }
            ValidationError::InvalidTopK { max, actual } => {
                write!(f, "top_k {} is out of valid range (1-{})", actual, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a crop or trait selection
///
/// Empty values pass: they fail the registry lookup with the usual
/// "not supported" error.
pub fn validate_selection(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_SELECTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_SELECTION_LENGTH,
            actual: value.chars().count(),
        });
    }
    if !SELECTION_PATTERN.is_match(value) {
        return Err(ValidationError::InvalidCharacters {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validate a normalized custom sequence length
pub fn validate_sequence_length(length: usize, max: usize) -> Result<(), ValidationError> {
    if length == 0 {
        return Err(ValidationError::EmptySequence);
    }
    if length > max {
        return Err(ValidationError::SequenceTooLong {
            max,
            actual: length,
        });
    }
    Ok(())
}

/// Validate a requested guide count
pub fn validate_top_k(top_k: usize) -> Result<(), ValidationError> {
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(ValidationError::InvalidTopK {
            max: MAX_TOP_K,
            actual: top_k,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::LocusRegistry;

    #[test]
    fn test_registry_names_are_valid_selections() {
        let registry = LocusRegistry::embedded().unwrap();
        for crop in registry.crops() {
            assert!(validate_selection("crop", crop).is_ok(), "{}", crop);
            for trait_name in registry.traits(crop).unwrap_or_default() {
                assert!(validate_selection("trait", trait_name).is_ok(), "{}", trait_name);
            }
        }
    }

    #[test]
    fn test_selection_rejections() {
        assert!(validate_selection("crop", "").is_ok());
        assert!(validate_selection("crop", "Drought Resistance").is_ok());
        assert_eq!(
            validate_selection("crop", "rice; drop table"),
            Err(ValidationError::InvalidCharacters {
                field: "crop".to_string()
            })
        );
        assert!(validate_selection("trait", "<script>").is_err());
        assert!(matches!(
            validate_selection("trait", &"a".repeat(101)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_sequence_length() {
        assert!(validate_sequence_length(10, 10).is_ok());
        assert_eq!(
            validate_sequence_length(0, 10),
            Err(ValidationError::EmptySequence)
        );
        assert!(validate_sequence_length(11, 10).is_err());
    }

    #[test]
    fn test_top_k() {
        assert!(validate_top_k(1).is_ok());
        assert!(validate_top_k(MAX_TOP_K).is_ok());
        assert!(validate_top_k(0).is_err());
        assert!(validate_top_k(MAX_TOP_K + 1).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::SequenceTooLong { max: 5, actual: 9 }.to_string(),
            "Sequence too long: 9 bases (max: 5)"
        );
        assert_eq!(
            ValidationError::InvalidTopK {
                max: 1000,
                actual: 0
            }
            .to_string(),
            "top_k 0 is out of valid range (1-1000)"
        );
    }
}
