//! HTML report generation.
//!
//! [`Reporter`] turns the two histograms into a single portable HTML page:
//! a "Correct Predictions" section and an "Incorrect Predictions" section,
//! each with one heading per predicted class followed by that class's sample
//! images inlined as base64 JPEG data URIs.

use std::path::Path;

use crate::error::Result;
use crate::eval::histogram::{FailureHistogram, Label, SuccessHistogram};
use crate::html::HtmlDocument;

/// Default page title.
pub const DEFAULT_TITLE: &str = "Prediction Analyzer";

/// Configuration for a [`Reporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Page title.
    pub title: String,

    /// Add a sample count line under each class heading.
    pub show_counts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            show_counts: false,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    title: Option<String>,
    show_counts: Option<bool>,
}

impl ReportConfigBuilder {
    /// Set the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Show per-class sample counts.
    #[must_use]
    pub fn show_counts(mut self, show: bool) -> Self {
        self.show_counts = Some(show);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ReportConfig {
        ReportConfig {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            show_counts: self.show_counts.unwrap_or(false),
        }
    }
}

/// Renders accumulated predictions as HTML.
///
/// # Example
///
/// ```rust
/// use eval_reporter::{EncodedImage, Histogram, Mismatch, Reporter};
///
/// let mut success = Histogram::new();
/// success.record("cat", EncodedImage::from_base64("imgA"));
///
/// let mut failure = Histogram::new();
/// failure.record("dog", Mismatch { image: EncodedImage::from_base64("imgB"), expected: "cat" });
///
/// let html = Reporter::default().render(&success, &failure);
/// assert!(html.contains(r#"title="pred:dog exp:cat""#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    /// Create a reporter.
    #[must_use]
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Build the report document without serialising it.
    #[must_use]
    pub fn document<L: Label>(
        &self,
        success: &SuccessHistogram<L>,
        failure: &FailureHistogram<L>,
    ) -> HtmlDocument {
        let mut doc = HtmlDocument::new(self.config.title.as_str());

        doc.heading(1, "Correct Predictions");
        for (class, images) in success.iter() {
            doc.heading(3, format!("Class {class}"));
            self.count_line(&mut doc, images.len());
            let title = format!("class:{class}");
            for image in images {
                doc.image(image.data_uri(), title.as_str());
            }
        }

        doc.separator();

        doc.heading(1, "Incorrect Predictions");
        for (class, mismatches) in failure.iter() {
            doc.heading(3, format!("Class {class}"));
            self.count_line(&mut doc, mismatches.len());
            for m in mismatches {
                doc.image(
                    m.image.data_uri(),
                    format!("pred:{class} exp:{}", m.expected),
                );
            }
        }

        doc
    }

    /// Render the report as HTML text.
    #[must_use]
    pub fn render<L: Label>(
        &self,
        success: &SuccessHistogram<L>,
        failure: &FailureHistogram<L>,
    ) -> String {
        self.document(success, failure).to_html()
    }

    /// Render and write the report to `path`, replacing any existing file.
    pub fn write_to_path<L: Label>(
        &self,
        success: &SuccessHistogram<L>,
        failure: &FailureHistogram<L>,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        let html = self.render(success, failure);
        std::fs::write(path, &html)?;
        tracing::info!(
            path = %path.display(),
            bytes = html.len(),
            correct = success.sample_count(),
            incorrect = failure.sample_count(),
            "wrote prediction report"
        );
        Ok(())
    }

    fn count_line(&self, doc: &mut HtmlDocument, count: usize) {
        if self.config.show_counts {
            let noun = if count == 1 { "image" } else { "images" };
            doc.paragraph(format!("{count} {noun}"));
        }
    }
}
