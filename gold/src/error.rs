//! Error types for golden-file operations.

use std::path::PathBuf;

/// Signals that stored golden content and the content under test differ.
///
/// Deliberately carries no positional information about the difference.
#[derive(thiserror::Error, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[error("output and file are different")]
pub struct ComparisonError;

/// Monolithic error type for the golden-file runner and its filters.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The golden directory could not be removed while preparing it.
    #[error("could not remove directory {}: {}", .0.display(), .1)]
    RemoveDirectory(PathBuf, #[source] std::io::Error),

    /// A directory could not be created.
    #[error("could not create directory {}: {}", .0.display(), .1)]
    CreateDirectory(PathBuf, #[source] std::io::Error),

    /// A golden file could not be written in update mode.
    #[error("could not write file {}: {}", .0.display(), .1)]
    WriteFile(PathBuf, #[source] std::io::Error),

    /// A golden file could not be read in check mode.
    #[error("could not read file {}: {}", .0.display(), .1)]
    ReadFile(PathBuf, #[source] std::io::Error),

    /// The filtered content does not match the stored golden file.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// Content handed to the JSON formatter was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A custom filter pattern failed to compile.
    #[error("invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    /// Returns whether this error reports differing content rather than a
    /// storage or setup failure.
    pub const fn is_comparison(&self) -> bool {
        matches!(self, Self::Comparison(_))
    }
}
