//! Render command: predictions CSV in, HTML report out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eval_reporter::{
    Accumulator, AccumulatorConfig, ReportConfig, Reporter, RunSummary, SampleImage,
};
use serde::Deserialize;

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub predictions: PathBuf,
    pub images_dir: Option<PathBuf>,
    pub output: PathBuf,
    pub batch_size: usize,
    pub quality: u8,
    pub title: String,
    pub show_counts: bool,
    pub parallel: bool,
    pub summary_json: Option<PathBuf>,
    pub summary_csv: Option<PathBuf>,
}

/// One line of the predictions log.
#[derive(Debug, Clone, Deserialize)]
struct PredictionRow {
    image: PathBuf,
    predicted: String,
    expected: String,
}

pub fn run(args: RenderArgs) -> Result<()> {
    anyhow::ensure!(args.batch_size > 0, "Batch size must be at least 1");

    tracing::info!(path = %args.predictions.display(), "loading predictions");
    let rows = load_rows(&args.predictions)?;
    let base_dir = args
        .images_dir
        .clone()
        .or_else(|| args.predictions.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    tracing::info!(
        rows = rows.len(),
        base_dir = %base_dir.display(),
        "loaded predictions"
    );

    let config = AccumulatorConfig::builder()
        .jpeg_quality(args.quality)
        .parallel_encode(args.parallel)
        .build();
    let mut acc: Accumulator<String> = Accumulator::new(config);

    // Per-batch progress is logged by the accumulator itself.
    for (i, chunk) in rows.chunks(args.batch_size).enumerate() {
        let images = chunk
            .iter()
            .map(|row| load_image(&base_dir.join(&row.image)))
            .collect::<Result<Vec<_>>>()?;
        let predicted: Vec<String> = chunk.iter().map(|row| row.predicted.clone()).collect();
        let expected: Vec<String> = chunk.iter().map(|row| row.expected.clone()).collect();

        acc.process_batch(&images, &predicted, &expected)
            .with_context(|| format!("Failed to process batch {}", i + 1))?;
    }

    let reporter = Reporter::new(
        ReportConfig::builder()
            .title(args.title)
            .show_counts(args.show_counts)
            .build(),
    );
    reporter
        .write_to_path(acc.success_histogram(), acc.failure_histogram(), &args.output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;
    println!("Report written to: {}", args.output.display());

    let summary = acc.summary();
    print_summary(&summary);

    if let Some(path) = &args.summary_json {
        summary
            .write_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Summary JSON: {}", path.display());
    }
    if let Some(path) = &args.summary_csv {
        summary
            .write_csv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Summary CSV: {}", path.display());
    }

    Ok(())
}

fn load_rows(path: &Path) -> Result<Vec<PredictionRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    rdr.deserialize::<PredictionRow>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Bad row {} in {}", i + 2, path.display())))
        .collect()
}

fn load_image(path: &Path) -> Result<SampleImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(SampleImage::Bytes {
        data: img.into_raw(),
        shape: vec![height as usize, width as usize, 3],
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "Samples: {} ({} correct, {} incorrect), accuracy {:.4}",
        summary.total, summary.correct, summary.incorrect, summary.accuracy
    );
    if summary.classes.is_empty() {
        return;
    }

    println!("{:-<60}", "");
    println!(
        "{:<20} {:>8} {:>10} {:>10}",
        "class", "correct", "incorrect", "precision"
    );
    for class in &summary.classes {
        println!(
            "{:<20} {:>8} {:>10} {:>10.4}",
            class.label, class.correct, class.incorrect, class.precision
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Collects formatted tracing output for assertions.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn write_three_samples(dir: &Path) {
        for (name, shade) in [("a.png", 10), ("b.png", 90), ("c.png", 200)] {
            write_png(&dir.join(name), shade);
        }
        std::fs::write(
            dir.join("preds.csv"),
            "image,predicted,expected\na.png,cat,cat\nb.png, dog ,cat\nc.png,dog,dog\n",
        )
        .unwrap();
    }

    fn write_png(path: &Path, shade: u8) {
        image::RgbImage::from_pixel(6, 4, image::Rgb([shade, shade / 2, 255 - shade]))
            .save(path)
            .unwrap();
    }

    fn args(dir: &Path) -> RenderArgs {
        RenderArgs {
            predictions: dir.join("preds.csv"),
            images_dir: None,
            output: dir.join("report.html"),
            batch_size: 2,
            quality: 80,
            title: "Test run".to_string(),
            show_counts: false,
            parallel: false,
            summary_json: Some(dir.join("summary.json")),
            summary_csv: None,
        }
    }

    #[test]
    fn test_render_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        write_three_samples(dir.path());

        run(args(dir.path())).unwrap();

        let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
        assert!(html.contains("<title>Test run</title>"));
        assert_eq!(html.matches(r#"title="class:cat""#).count(), 1);
        assert_eq!(html.matches(r#"title="class:dog""#).count(), 1);
        assert_eq!(html.matches(r#"title="pred:dog exp:cat""#).count(), 1);

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["total"], 3);
        assert_eq!(summary["batches"], 2);
    }

    #[test]
    fn test_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("preds.csv"),
            "image,predicted,expected\nnope.png,1,1\n",
        )
        .unwrap();

        let err = run(args(dir.path())).unwrap_err();
        assert!(err.to_string().contains("nope.png"));
        assert!(!dir.path().join("report.html").exists());
    }

    #[test]
    fn test_progress_goes_through_tracing() {
        let dir = tempfile::tempdir().unwrap();
        write_three_samples(dir.path());

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || run(args(dir.path()))).unwrap();

        let logs = captured.text();
        assert!(logs.contains("loading predictions"));
        assert!(logs.contains("loaded predictions"));
        // Three rows at batch size 2: one event per batch, from the accumulator only.
        assert_eq!(logs.matches("processed batch").count(), 2);
        assert!(logs.contains("wrote prediction report"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_three_samples(dir.path());

        let err = run(RenderArgs {
            batch_size: 0,
            ..args(dir.path())
        })
        .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
        assert!(!dir.path().join("report.html").exists());
    }
}
