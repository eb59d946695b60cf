//! Error types for the styled text engine.

use std::fmt;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for engine operations.
///
/// Engine-internal invariant violations are debug assertions, not variants
/// here; these are the failures a caller can observe and handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid color format (e.g., malformed hex string).
    InvalidColor(String),
    /// Character offset range outside the content.
    OffsetOutOfRange { offset: usize, len: usize },
    /// Line index outside the content.
    LineOutOfRange { line: usize, line_count: usize },
    /// The measurement primitive failed to shape a line.
    Shape { line: usize, reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor(s) => write!(f, "invalid color format: {s}"),
            Self::OffsetOutOfRange { offset, len } => {
                write!(f, "offset {offset} out of range for content of {len} chars")
            }
            Self::LineOutOfRange { line, line_count } => {
                write!(f, "line {line} out of range for content of {line_count} lines")
            }
            Self::Shape { line, reason } => {
                write!(f, "failed to shape line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
