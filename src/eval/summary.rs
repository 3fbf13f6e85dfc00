//! Run-level summaries derived from the accumulated histograms.
//!
//! Nothing here is accumulated separately: every count is read off the two
//! histograms, so a summary always agrees with the report built from the same
//! state.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::histogram::{FailureHistogram, Label, SuccessHistogram};

/// How often a predicted class was given to samples of another class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confusion {
    /// Ground-truth label of the misclassified samples.
    pub expected: String,
    /// Number of such samples.
    pub count: usize,
}

/// Counts for a single predicted class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    /// Predicted class label.
    pub label: String,
    /// Samples predicted as this class that were correct.
    pub correct: usize,
    /// Samples predicted as this class that were wrong.
    pub incorrect: usize,
    /// `correct / (correct + incorrect)`.
    pub precision: f64,
    /// Breakdown of `incorrect` by expected label, most frequent first.
    #[serde(default)]
    pub confusions: Vec<Confusion>,
}

/// Summary of an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When this summary was generated.
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// Number of batches processed since the last reset.
    pub batches: usize,
    /// Total recorded samples.
    pub total: usize,
    /// Correctly predicted samples.
    pub correct: usize,
    /// Incorrectly predicted samples.
    pub incorrect: usize,
    /// `correct / total`, or 0 when nothing was recorded.
    pub accuracy: f64,
    /// Per predicted class, in first-seen order.
    pub classes: Vec<ClassSummary>,
}

impl RunSummary {
    /// Build a summary from the two histograms.
    #[must_use]
    pub fn from_histograms<L: Label>(
        success: &SuccessHistogram<L>,
        failure: &FailureHistogram<L>,
        batches: usize,
    ) -> Self {
        let mut classes: IndexMap<String, ClassSummary> = IndexMap::new();

        for (label, images) in success.iter() {
            class_entry(&mut classes, label).correct += images.len();
        }
        for (label, mismatches) in failure.iter() {
            let mut by_expected: IndexMap<String, usize> = IndexMap::new();
            for m in mismatches {
                *by_expected.entry(m.expected.to_string()).or_default() += 1;
            }
            let mut confusions: Vec<Confusion> = by_expected
                .into_iter()
                .map(|(expected, count)| Confusion { expected, count })
                .collect();
            confusions.sort_by(|a, b| b.count.cmp(&a.count));

            let entry = class_entry(&mut classes, label);
            entry.incorrect += mismatches.len();
            entry.confusions = confusions;
        }

        let classes: Vec<ClassSummary> = classes
            .into_values()
            .map(|mut c| {
                c.precision = ratio(c.correct, c.correct + c.incorrect);
                c
            })
            .collect();

        let correct = success.sample_count();
        let incorrect = failure.sample_count();
        let total = correct + incorrect;

        Self {
            generated_at: chrono::Utc::now(),
            batches,
            total,
            correct,
            incorrect,
            accuracy: ratio(correct, total),
            classes,
        }
    }

    /// Look up a class by its label text.
    #[must_use]
    pub fn class(&self, label: &str) -> Option<&ClassSummary> {
        self.classes.iter().find(|c| c.label == label)
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "wrote run summary JSON");
        Ok(())
    }

    /// Write one CSV row per class.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record(["class", "correct", "incorrect", "precision", "top_confusion"])?;

        for class in &self.classes {
            wtr.write_record([
                &class.label,
                &class.correct.to_string(),
                &class.incorrect.to_string(),
                &format!("{:.4}", class.precision),
                &class
                    .confusions
                    .first()
                    .map_or(String::new(), |c| format!("{}:{}", c.expected, c.count)),
            ])?;
        }

        wtr.flush()?;
        tracing::info!(path = %path.display(), "wrote run summary CSV");
        Ok(())
    }
}

fn class_entry<'a, L: Label>(
    classes: &'a mut IndexMap<String, ClassSummary>,
    label: &L,
) -> &'a mut ClassSummary {
    let key = label.to_string();
    classes.entry(key.clone()).or_insert_with(|| ClassSummary {
        label: key,
        correct: 0,
        incorrect: 0,
        precision: 0.0,
        confusions: Vec::new(),
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
