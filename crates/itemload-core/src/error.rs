//! Error taxonomy for a single load. Every variant is terminal for the call.

use thiserror::Error;

/// Result type used by the loader pipeline.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors produced while fetching, decoding, or validating remote content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The request could not be issued or completed at the transport level.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something other than 200 OK.
    #[error("invalid file url: HTTP {status}")]
    InvalidUrl { status: u32 },

    /// The response body stream failed after a 200 status was received.
    #[error("failed to read response body: {0}")]
    Read(String),

    /// `Content-Type` matched neither the CSV nor the spreadsheet patterns.
    #[error("invalid file type: {content_type:?}")]
    UnsupportedType { content_type: String },

    /// The workbook could not be opened, has no sheets, or its first sheet
    /// could not be traversed.
    #[error("invalid file content: {0}")]
    InvalidContent(String),

    #[error("empty file")]
    EmptyContent,

    #[error("file with too many items: {count} > {limit}")]
    TooManyItems { count: usize, limit: usize },

    #[error("file has too few items: {count}")]
    TooFewItems { count: usize },
}

/// Category of a [`LoadError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    Network,
    InvalidUrl,
    Read,
    UnsupportedType,
    InvalidContent,
    EmptyContent,
    TooManyItems,
    TooFewItems,
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Network(_) => LoadErrorKind::Network,
            LoadError::InvalidUrl { .. } => LoadErrorKind::InvalidUrl,
            LoadError::Read(_) => LoadErrorKind::Read,
            LoadError::UnsupportedType { .. } => LoadErrorKind::UnsupportedType,
            LoadError::InvalidContent(_) => LoadErrorKind::InvalidContent,
            LoadError::EmptyContent => LoadErrorKind::EmptyContent,
            LoadError::TooManyItems { .. } => LoadErrorKind::TooManyItems,
            LoadError::TooFewItems { .. } => LoadErrorKind::TooFewItems,
        }
    }

    pub(crate) fn invalid_content<E: std::fmt::Display>(e: E) -> Self {
        LoadError::InvalidContent(e.to_string())
    }
}
