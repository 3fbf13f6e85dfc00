//! Error types for eval-reporter operations.

use thiserror::Error;

/// Result type alias for eval-reporter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while accumulating a run or writing its report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The three parallel batch sequences don't have the same length.
    #[error(
        "Batch length mismatch: {images} images, {predicted} predicted labels, {expected} expected labels"
    )]
    BatchLengthMismatch {
        /// Number of images in the batch.
        images: usize,
        /// Number of predicted labels in the batch.
        predicted: usize,
        /// Number of expected labels in the batch.
        expected: usize,
    },

    /// A pixel array has a shape that can't be read as an image.
    #[error("Invalid array shape {shape:?}: {reason}")]
    InvalidShape {
        /// Shape of the offending array.
        shape: Vec<usize>,
        /// Reason for the rejection.
        reason: String,
    },

    /// Image data is unusable (zero-sized, too large, bad buffer).
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// JPEG or base64 encoding/decoding failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A sample in a batch failed; carries its index within the batch.
    #[error("Sample {index} failed: {source}")]
    Sample {
        /// Index of the sample within its batch.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Index of the failing sample, if this error came out of a batch.
    #[must_use]
    pub fn sample_index(&self) -> Option<usize> {
        match self {
            Self::Sample { index, .. } => Some(*index),
            _ => None,
        }
    }
}
