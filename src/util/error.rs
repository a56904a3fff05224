//! Error types for the levelmesh library.

use thiserror::Error;

/// Everything that can go wrong while loading a level or building a submesh.
#[derive(Error, Debug)]
pub enum Error {
    /// A lightmap tile could not be placed on any atlas page
    #[error("Lightmap atlas full: cannot place {width}x{height} tile (page size {page_size}, {pages} pages in use)")]
    AtlasFull {
        width: u32,
        height: u32,
        page_size: u32,
        pages: usize,
    },

    /// A surface or draw range points outside its buffer
    #[error("Invalid {what} range: start {start}, count {count} exceeds buffer length {len}")]
    InvalidRange {
        what: &'static str,
        start: usize,
        count: usize,
        len: usize,
    },

    /// Level data refers to an element that does not exist
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid level error.
    pub fn level(msg: impl Into<String>) -> Self {
        Self::InvalidLevel(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type alias for levelmesh operations.
pub type Result<T> = std::result::Result<T, Error>;
