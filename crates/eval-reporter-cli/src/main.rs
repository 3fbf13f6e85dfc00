//! eval-reporter CLI - replay a predictions log into a prediction report

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Correct/incorrect prediction report generator.
#[derive(Parser)]
#[command(name = "eval-reporter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a predictions CSV through the accumulator and write the HTML report
    Render {
        /// CSV with `image,predicted,expected` columns
        #[arg(short, long)]
        predictions: PathBuf,

        /// Directory image paths are relative to (default: the CSV's directory)
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Output HTML file
        #[arg(short, long, default_value = "report.html")]
        output: PathBuf,

        /// Samples per evaluation batch
        #[arg(long, default_value_t = 32, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        batch_size: usize,

        /// JPEG quality for embedded images (1-100)
        #[arg(long, default_value_t = eval_reporter::encode::DEFAULT_JPEG_QUALITY)]
        quality: u8,

        /// Report page title
        #[arg(long, default_value = eval_reporter::eval::report::DEFAULT_TITLE)]
        title: String,

        /// Show sample counts under each class heading
        #[arg(long)]
        show_counts: bool,

        /// Encode each batch's images in parallel
        #[arg(long)]
        parallel: bool,

        /// Also write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// Also write the per-class summary as CSV
        #[arg(long)]
        summary_csv: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render {
            predictions,
            images_dir,
            output,
            batch_size,
            quality,
            title,
            show_counts,
            parallel,
            summary_json,
            summary_csv,
        } => commands::render::run(commands::render::RenderArgs {
            predictions,
            images_dir,
            output,
            batch_size,
            quality,
            title,
            show_counts,
            parallel,
            summary_json,
            summary_csv,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_batch_size(value: &str) -> Result<usize, clap::Error> {
        let cli = Cli::try_parse_from([
            "eval-reporter",
            "render",
            "-p",
            "preds.csv",
            "--batch-size",
            value,
        ])?;
        match cli.command {
            Commands::Render { batch_size, .. } => Ok(batch_size),
        }
    }

    #[test]
    fn test_batch_size_must_be_positive() {
        assert!(parse_batch_size("0").is_err());
        assert_eq!(parse_batch_size("1").unwrap(), 1);
        assert_eq!(parse_batch_size("64").unwrap(), 64);
    }
}
