//! Batch accumulator with a callback-shaped entry point.
//!
//! [`Accumulator`] is the stateful half of the crate. The host evaluation loop
//! hands it one batch at a time (images, predicted labels, expected labels)
//! and gets back that batch's accuracy as an `f32`. Along the way every sample
//! is JPEG-encoded and filed into the success or failure histogram under its
//! predicted label.

use rayon::prelude::*;

use crate::encode::{DEFAULT_JPEG_QUALITY, EncodedImage, JpegEncoder};
use crate::error::{Error, Result};
use crate::eval::histogram::{FailureHistogram, Label, Mismatch, SuccessHistogram};
use crate::eval::summary::RunSummary;
use crate::sample::SampleImage;

/// Per-batch callback handed to the host evaluation loop.
///
/// Called with materialised arrays at execution time; returns the batch
/// accuracy as a 32-bit float.
pub type BatchFn<'a, L> = Box<dyn FnMut(&[SampleImage], &[L], &[L]) -> Result<f32> + 'a>;

/// Configuration for an [`Accumulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// JPEG quality for embedded sample images.
    pub jpeg_quality: u8,

    /// Encode a batch's images on the rayon pool before recording them.
    pub parallel_encode: bool,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            parallel_encode: false,
        }
    }
}

impl AccumulatorConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AccumulatorConfigBuilder {
        AccumulatorConfigBuilder::default()
    }
}

/// Builder for [`AccumulatorConfig`].
#[derive(Debug, Default)]
pub struct AccumulatorConfigBuilder {
    jpeg_quality: Option<u8>,
    parallel_encode: Option<bool>,
}

impl AccumulatorConfigBuilder {
    /// Set the JPEG quality (clamped to 1..=100).
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    /// Enable or disable parallel encoding within a batch.
    #[must_use]
    pub fn parallel_encode(mut self, parallel: bool) -> Self {
        self.parallel_encode = Some(parallel);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AccumulatorConfig {
        let defaults = AccumulatorConfig::default();
        AccumulatorConfig {
            jpeg_quality: self.jpeg_quality.unwrap_or(defaults.jpeg_quality),
            parallel_encode: self.parallel_encode.unwrap_or(defaults.parallel_encode),
        }
    }
}

/// Collects correct and incorrect predictions across the batches of one run.
///
/// Not synchronised: callers sharing an accumulator across threads must
/// serialise access themselves.
///
/// # Example
///
/// ```rust
/// use eval_reporter::{Accumulator, SampleImage};
///
/// let mut acc = Accumulator::default();
/// let images = vec![
///     SampleImage::Bytes { data: vec![0; 4], shape: vec![2, 2] },
///     SampleImage::Bytes { data: vec![255; 4], shape: vec![2, 2] },
/// ];
///
/// let accuracy = acc.process_batch(&images, &[1, 2], &[1, 1]).unwrap();
/// assert_eq!(accuracy, 0.5);
/// assert_eq!(acc.success_histogram().sample_count(), 1);
/// assert_eq!(acc.failure_histogram().sample_count(), 1);
/// ```
#[derive(Debug)]
pub struct Accumulator<L: Label> {
    config: AccumulatorConfig,
    encoder: JpegEncoder,
    success: SuccessHistogram<L>,
    failure: FailureHistogram<L>,
    batches: usize,
}

impl<L: Label> Default for Accumulator<L> {
    fn default() -> Self {
        Self::new(AccumulatorConfig::default())
    }
}

impl<L: Label> Accumulator<L> {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new(config: AccumulatorConfig) -> Self {
        Self {
            encoder: JpegEncoder::new(config.jpeg_quality),
            config,
            success: SuccessHistogram::new(),
            failure: FailureHistogram::new(),
            batches: 0,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Discard everything recorded so far. Both histograms are cleared together.
    pub fn reset(&mut self) {
        self.success.clear();
        self.failure.clear();
        self.batches = 0;
        tracing::debug!("accumulator reset");
    }

    /// Correct predictions recorded so far.
    #[must_use]
    pub fn success_histogram(&self) -> &SuccessHistogram<L> {
        &self.success
    }

    /// Incorrect predictions recorded so far.
    #[must_use]
    pub fn failure_histogram(&self) -> &FailureHistogram<L> {
        &self.failure
    }

    /// Number of non-empty batches processed since the last reset.
    #[must_use]
    pub fn batches_processed(&self) -> usize {
        self.batches
    }

    /// Summarise the current state.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_histograms(&self.success, &self.failure, self.batches)
    }

    /// Record one batch and return its accuracy.
    ///
    /// The three slices are parallel and must have the same length; a
    /// mismatch is rejected before anything is recorded. Each sample is
    /// encoded and filed under its predicted label, in batch order. If a
    /// sample fails to encode, the samples before it stay recorded and the
    /// error is returned with its index.
    ///
    /// Returns `(n - errors) / n`, or `0.0` for an empty batch. The value is
    /// per batch; nothing is carried over between calls.
    pub fn process_batch(
        &mut self,
        images: &[SampleImage],
        predicted: &[L],
        expected: &[L],
    ) -> Result<f32> {
        if images.len() != predicted.len() || images.len() != expected.len() {
            return Err(Error::BatchLengthMismatch {
                images: images.len(),
                predicted: predicted.len(),
                expected: expected.len(),
            });
        }

        let total = images.len();
        if total == 0 {
            return Ok(0.0);
        }

        let mut errors = 0usize;
        if self.config.parallel_encode {
            let encoder = self.encoder;
            let encoded: Vec<Result<EncodedImage>> =
                images.par_iter().map(|img| encoder.encode(img)).collect();
            for (index, (image, (pred, exp))) in encoded
                .into_iter()
                .zip(predicted.iter().zip(expected))
                .enumerate()
            {
                let image = image.map_err(|e| sample_error(index, e))?;
                errors += usize::from(!self.file(image, pred, exp));
            }
        } else {
            for (index, (image, (pred, exp))) in images
                .iter()
                .zip(predicted.iter().zip(expected))
                .enumerate()
            {
                let image = self
                    .encoder
                    .encode(image)
                    .map_err(|e| sample_error(index, e))?;
                errors += usize::from(!self.file(image, pred, exp));
            }
        }

        self.batches += 1;
        let accuracy = (total - errors) as f32 / total as f32;
        tracing::debug!(
            batch = self.batches,
            total,
            errors,
            accuracy,
            "processed batch"
        );
        Ok(accuracy)
    }

    /// Box this accumulator up as a host callback.
    pub fn batch_fn(&mut self) -> BatchFn<'_, L> {
        Box::new(
            move |images: &[SampleImage], predicted: &[L], expected: &[L]| {
                self.process_batch(images, predicted, expected)
            },
        )
    }

    /// File one encoded sample. Returns whether the prediction was correct.
    fn file(&mut self, image: EncodedImage, predicted: &L, expected: &L) -> bool {
        if predicted == expected {
            tracing::trace!(class = %predicted, "correct");
            self.success.record(predicted.clone(), image);
            true
        } else {
            tracing::trace!(predicted = %predicted, expected = %expected, "incorrect");
            self.failure.record(
                predicted.clone(),
                Mismatch {
                    image,
                    expected: expected.clone(),
                },
            );
            false
        }
    }
}

fn sample_error(index: usize, source: Error) -> Error {
    tracing::warn!(index, error = %source, "sample failed to encode");
    Error::Sample {
        index,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> SampleImage {
        SampleImage::Bytes {
            data: vec![value; 8 * 8 * 3],
            shape: vec![8, 8, 3],
        }
    }

    fn broken() -> SampleImage {
        SampleImage::Bytes {
            data: vec![0; 3],
            shape: vec![8, 8, 3],
        }
    }

    #[test]
    fn test_config_builder() {
        let config = AccumulatorConfig::builder()
            .jpeg_quality(90)
            .parallel_encode(true)
            .build();
        assert_eq!(config.jpeg_quality, 90);
        assert!(config.parallel_encode);

        let defaults = AccumulatorConfig::builder().build();
        assert_eq!(defaults, AccumulatorConfig::default());

        let acc: Accumulator<u8> = Accumulator::new(config.clone());
        assert_eq!(acc.config(), &config);
    }

    #[test]
    fn test_end_to_end_example() {
        let mut acc = Accumulator::default();
        let encoder = JpegEncoder::default();
        let images = vec![solid(10), solid(120), solid(240)];

        let accuracy = acc.process_batch(&images, &[1, 1, 2], &[1, 2, 2]).unwrap();
        assert!((accuracy - 2.0 / 3.0).abs() < 1e-6);

        let success = acc.success_histogram();
        assert_eq!(
            success.get(&1).unwrap(),
            &[encoder.encode(&images[0]).unwrap()]
        );
        assert_eq!(
            success.get(&2).unwrap(),
            &[encoder.encode(&images[2]).unwrap()]
        );

        let failure = acc.failure_histogram();
        assert_eq!(failure.class_count(), 1);
        let mismatch = &failure.get(&1).unwrap()[0];
        assert_eq!(mismatch.image, encoder.encode(&images[1]).unwrap());
        assert_eq!(mismatch.expected, 2);
    }

    #[test]
    fn test_empty_batch() {
        let mut acc: Accumulator<u32> = Accumulator::default();
        assert_eq!(acc.process_batch(&[], &[], &[]).unwrap(), 0.0);
        assert!(acc.success_histogram().is_empty());
        assert!(acc.failure_histogram().is_empty());
        assert_eq!(acc.batches_processed(), 0);
    }

    #[test]
    fn test_length_mismatch_fails_without_mutation() {
        let mut acc = Accumulator::default();
        let err = acc
            .process_batch(&[solid(1), solid(2)], &[1, 2], &[1])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BatchLengthMismatch {
                images: 2,
                predicted: 2,
                expected: 1
            }
        ));
        assert!(acc.success_histogram().is_empty());
        assert!(acc.failure_histogram().is_empty());
    }

    #[test]
    fn test_encode_failure_keeps_earlier_samples() {
        for parallel in [false, true] {
            let config = AccumulatorConfig::builder().parallel_encode(parallel).build();
            let mut acc = Accumulator::new(config);
            let err = acc
                .process_batch(&[solid(1), broken(), solid(3)], &[0, 0, 0], &[0, 1, 0])
                .unwrap_err();

            assert_eq!(err.sample_index(), Some(1));
            assert_eq!(acc.success_histogram().sample_count(), 1);
            assert!(acc.failure_histogram().is_empty());
            assert_eq!(acc.batches_processed(), 0);
        }
    }

    #[test]
    fn test_order_within_key() {
        let mut acc = Accumulator::default();
        let x = solid(30);
        let y = solid(200);
        acc.process_batch(&[x.clone(), y.clone()], &["3", "3"], &["3", "3"])
            .unwrap();

        let encoder = JpegEncoder::default();
        assert_eq!(
            acc.success_histogram().get(&"3").unwrap(),
            &[encoder.encode(&x).unwrap(), encoder.encode(&y).unwrap()]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let images: Vec<_> = (0..12).map(|i| solid(i * 20)).collect();
        let predicted: Vec<u8> = (0..12).map(|i| i % 3).collect();
        let expected: Vec<u8> = (0..12).map(|i| i % 2).collect();

        let mut seq = Accumulator::default();
        let mut par = Accumulator::new(AccumulatorConfig::builder().parallel_encode(true).build());

        let a = seq.process_batch(&images, &predicted, &expected).unwrap();
        let b = par.process_batch(&images, &predicted, &expected).unwrap();

        assert_eq!(a, b);
        assert_eq!(seq.success_histogram(), par.success_histogram());
        assert_eq!(seq.failure_histogram(), par.failure_histogram());
    }

    #[test]
    fn test_reset_clears_both() {
        let mut acc = Accumulator::default();
        acc.process_batch(&[solid(1), solid(2)], &[1, 2], &[1, 3])
            .unwrap();
        acc.reset();

        assert!(acc.success_histogram().is_empty());
        assert!(acc.failure_histogram().is_empty());
        assert_eq!(acc.batches_processed(), 0);

        acc.reset();
        assert!(acc.success_histogram().is_empty());
    }

    #[test]
    fn test_batch_fn_records_into_accumulator() {
        let mut acc = Accumulator::default();
        {
            let mut callback = acc.batch_fn();
            assert_eq!(callback(&[solid(5)], &[7u16], &[7u16]).unwrap(), 1.0);
            assert_eq!(callback(&[solid(6)], &[7u16], &[8u16]).unwrap(), 0.0);
        }
        assert_eq!(acc.batches_processed(), 2);
        assert_eq!(acc.summary().total, 2);
    }
}
