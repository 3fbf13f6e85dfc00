//! # eval-reporter
//!
//! Correct/incorrect prediction reports for model evaluation runs.
//!
//! The host evaluation loop feeds batches of images with their predicted and
//! expected labels into an [`Accumulator`], which returns each batch's
//! accuracy and files every sample, JPEG-encoded, under its predicted class.
//! At the end of the run a [`Reporter`] writes the collected samples out as a
//! single HTML page with the images inlined.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eval_reporter::{Accumulator, Reporter, SampleImage};
//!
//! let mut acc = Accumulator::default();
//!
//! // Once per evaluation step:
//! let images: Vec<SampleImage> = load_batch();
//! let accuracy = acc.process_batch(&images, &[3, 1], &[3, 7])?;
//! println!("batch accuracy: {accuracy:.3}");
//!
//! // At the end of the run:
//! Reporter::default().write_to_path(
//!     acc.success_histogram(),
//!     acc.failure_histogram(),
//!     "report.html",
//! )?;
//! # fn load_batch() -> Vec<SampleImage> { Vec::new() }
//! # Ok::<(), eval_reporter::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`sample`]: Input image representations
//! - [`encode`]: JPEG + base64 encoding
//! - [`eval`]: Accumulator, histograms, summaries and the HTML reporter
//! - [`html`]: Typed HTML document builder

pub mod encode;
pub mod error;
pub mod eval;
pub mod html;
pub mod sample;

// Re-export commonly used types
pub use encode::{EncodedImage, JpegEncoder};
pub use error::{Error, Result};
pub use eval::{
    accumulator::{Accumulator, AccumulatorConfig, BatchFn},
    histogram::{FailureHistogram, Histogram, Label, Mismatch, SuccessHistogram},
    report::{ReportConfig, Reporter},
    summary::{ClassSummary, Confusion, RunSummary},
};
pub use sample::SampleImage;
