mod collector;
mod error;
mod fetcher;
mod output;
mod parser;
mod quote;
mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use collector::{Collector, ThreadSleep};
use fetcher::HttpFetcher;
use parser::Extractor;
use settings::{MissingFieldPolicy, OutputFormat, Settings};

#[derive(Parser)]
#[command(
    name = "quotes_scraper",
    about = "Collect every quote from a paginated listing site into a CSV file"
)]
struct Cli {
    /// Output file (default: quotes.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Listing root; page N is fetched from <base-url>page/N/
    #[arg(long)]
    base_url: Option<String>,
    /// Wait between page fetches, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Stop after this many pages even if more are advertised
    #[arg(long)]
    max_pages: Option<u32>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Abort on a listing item without text or author instead of skipping it
    #[arg(long)]
    strict: bool,
    /// Hide the progress spinner
    #[arg(long)]
    no_progress: bool,
    /// Read the written CSV back and check it matches what was collected
    #[arg(long)]
    verify: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            settings.delay_ms = delay_ms;
        }
        if let Some(max_pages) = self.max_pages {
            settings.max_pages = max_pages;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if self.strict {
            settings.on_missing = MissingFieldPolicy::Fail;
        }
    }

    /// Layer the flags over env-derived settings and reject unsupported combinations.
    fn resolve(&self, mut settings: Settings) -> Result<Settings> {
        self.apply(&mut settings);
        anyhow::ensure!(
            !self.verify || settings.format == OutputFormat::Csv,
            "--verify only supports CSV output, not {:?}",
            settings.format
        );
        Ok(settings)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = cli.resolve(Settings::load().context("Failed to load QUOTES_* settings")?)?;
    let base_url = settings.validate()?;
    info!(?settings, "Starting quotes scraper");

    let t0 = Instant::now();
    let mut fetcher = HttpFetcher::new(base_url, &settings)?;
    let extractor = Extractor::new(settings.on_missing)?;
    let collector = Collector::new(settings.collect_options(), extractor)
        .with_progress(progress_bar(cli.no_progress)?);

    let collection = collector.run(&mut fetcher, &mut ThreadSleep)?;
    output::write_quotes(&settings.output, &collection.quotes, settings.format)
        .with_context(|| format!("Failed to save quotes to {}", settings.output.display()))?;

    if cli.verify {
        let written = output::read_csv(&settings.output)?;
        anyhow::ensure!(
            written == collection.quotes,
            "{} does not match the collected quotes",
            settings.output.display()
        );
        info!("Verified {} rows in {}", written.len(), settings.output.display());
    }

    let s = collection.summary;
    println!(
        "Saved {} quotes from {} pages ({} skipped, stop: {:?}) to {} in {:.1}s",
        s.records,
        s.pages,
        s.skipped,
        s.stop,
        settings.output.display(),
        t0.elapsed().as_secs_f64()
    );
    Ok(())
}
