//! Error types for classref-l10n operations.

use thiserror::Error;

/// Errors that can occur while loading inputs or writing output.
///
/// Per-record failures (a malformed XML file, a missing translation) are
/// recovered inside the batch and never surface here; only corpus loading
/// and filesystem faults are fatal for a run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid PO entry: {0}")]
    Po(String),

    #[error("invalid template file '{path}': {message}")]
    Templates { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
