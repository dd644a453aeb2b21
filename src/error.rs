//! Error types for agro-grna
//!
//! Core library errors carry a stable error code so that callers (the CLI,
//! the web service) can categorise failures without matching on messages.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Input errors (E1xxx)
    /// PAM motif contains characters outside {A,C,G,T,N}
    InvalidPam = 1001,
    /// Guide length is zero or out of range
    InvalidGuideLength = 1002,
    /// Sequence text could not be interpreted
    InvalidSequence = 1003,
    /// Ranking limit is out of range
    InvalidTopK = 1004,

    // Registry errors (E2xxx)
    /// Registry artifact could not be parsed
    RegistryFormat = 2001,
    /// Registry artifact has no usable entries
    RegistryEmpty = 2002,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPam => "invalid PAM motif",
            ErrorCode::InvalidGuideLength => "invalid guide length",
            ErrorCode::InvalidSequence => "invalid nucleotide sequence",
            ErrorCode::InvalidTopK => "invalid ranking limit",
            ErrorCode::RegistryFormat => "malformed gene registry",
            ErrorCode::RegistryEmpty => "empty gene registry",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for agro-grna
#[derive(Debug, Error)]
pub enum GrnaError {
    #[error("invalid PAM motif '{motif}': {reason}")]
    InvalidPam { motif: String, reason: String },

    #[error("invalid guide length {length}: {reason}")]
    InvalidGuideLength { length: usize, reason: String },

    #[error("invalid sequence: {msg}")]
    InvalidSequence { msg: String },

    #[error("invalid top_k {top_k}: {reason}")]
    InvalidTopK { top_k: usize, reason: String },

    #[error("malformed gene registry: {msg}")]
    RegistryFormat { msg: String },

    #[error("gene registry contains no crops")]
    RegistryEmpty,

    #[error("IO error: {msg}")]
    Io { msg: String },

    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl GrnaError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            GrnaError::InvalidPam { .. } => ErrorCode::InvalidPam,
            GrnaError::InvalidGuideLength { .. } => ErrorCode::InvalidGuideLength,
            GrnaError::InvalidSequence { .. } => ErrorCode::InvalidSequence,
            GrnaError::InvalidTopK { .. } => ErrorCode::InvalidTopK,
            GrnaError::RegistryFormat { .. } => ErrorCode::RegistryFormat,
            GrnaError::RegistryEmpty => ErrorCode::RegistryEmpty,
            GrnaError::Io { .. } => ErrorCode::IoError,
            GrnaError::Json { .. } => ErrorCode::JsonError,
        }
    }

    /// True for errors caused by caller-supplied input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(self.code() as u16 / 1000, 1)
    }

    /// Render the error with its code prefix (e.g. "error[E1001]: ...")
    pub fn detailed_message(&self) -> String {
        format!("error[{}]: {}", self.code(), self)
    }
}

impl From<std::io::Error> for GrnaError {
    fn from(err: std::io::Error) -> Self {
        GrnaError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GrnaError {
    fn from(err: serde_json::Error) -> Self {
        GrnaError::Json {
            msg: err.to_string(),
        }
    }
}
