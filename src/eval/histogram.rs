//! Label-keyed histograms of recorded samples.
//!
//! "Histogram" here means a mapping from class label to the ordered list of
//! samples recorded under it, not a frequency table. Keys keep the order in
//! which they were first seen, and samples under a key keep evaluation order.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::encode::EncodedImage;

/// Anything usable as a class label.
pub trait Label: Eq + Hash + Clone + fmt::Display {}

impl<T: Eq + Hash + Clone + fmt::Display> Label for T {}

/// A misclassified sample: its image and the label it should have had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch<L> {
    /// Encoded sample image.
    pub image: EncodedImage,
    /// Ground-truth label.
    pub expected: L,
}

/// Correct predictions, keyed by predicted (= expected) label.
pub type SuccessHistogram<L> = Histogram<L, EncodedImage>;

/// Incorrect predictions, keyed by predicted label.
pub type FailureHistogram<L> = Histogram<L, Mismatch<L>>;

/// Ordered mapping from label to the records collected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram<L: Label, R> {
    entries: IndexMap<L, Vec<R>>,
}

impl<L: Label, R> Default for Histogram<L, R> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<L: Label, R> Histogram<L, R> {
    /// Create an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under `label`, creating the entry on first use.
    pub fn record(&mut self, label: L, record: R) {
        self.entries.entry(label).or_default().push(record);
    }

    /// Records for `label`, in insertion order.
    #[must_use]
    pub fn get(&self, label: &L) -> Option<&[R]> {
        self.entries.get(label).map(Vec::as_slice)
    }

    /// Iterate over `(label, records)` in first-seen label order.
    pub fn iter(&self) -> impl Iterator<Item = (&L, &[R])> {
        self.entries.iter().map(|(label, records)| (label, records.as_slice()))
    }

    /// Labels in first-seen order.
    pub fn labels(&self) -> impl Iterator<Item = &L> {
        self.entries.keys()
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of records across all labels.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only the accumulator clears, and it clears both histograms at once.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creates_then_appends() {
        let mut hist: SuccessHistogram<u32> = Histogram::new();
        assert!(hist.get(&3).is_none());

        hist.record(3, EncodedImage::from_base64("x"));
        hist.record(3, EncodedImage::from_base64("y"));

        let records = hist.get(&3).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_str(), "x");
        assert_eq!(records[1].as_str(), "y");
        assert_eq!(hist.class_count(), 1);
        assert_eq!(hist.sample_count(), 2);
    }

    #[test]
    fn test_labels_keep_first_seen_order() {
        let mut hist: FailureHistogram<&str> = Histogram::new();
        for (pred, exp) in [("dog", "cat"), ("bird", "cat"), ("dog", "fox")] {
            hist.record(
                pred,
                Mismatch {
                    image: EncodedImage::from_base64(pred),
                    expected: exp,
                },
            );
        }

        let labels: Vec<_> = hist.labels().copied().collect();
        assert_eq!(labels, vec!["dog", "bird"]);

        let dog = hist.get(&"dog").unwrap();
        assert_eq!(dog[1].expected, "fox");
    }

    #[test]
    fn test_clear() {
        let mut hist: SuccessHistogram<i64> = Histogram::new();
        hist.record(1, EncodedImage::from_base64("a"));
        hist.clear();
        assert!(hist.is_empty());
        assert_eq!(hist.sample_count(), 0);
    }
}
