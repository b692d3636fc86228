use std::thread;
use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{debug, info, info_span, warn};

use crate::error::ScrapeError;
use crate::fetcher::PageSource;
use crate::parser::Extractor;
use crate::quote::Quote;

/// Politeness wait between consecutive page fetches.
pub trait Throttle {
    fn pause(&mut self, delay: Duration);
}

pub struct ThreadSleep;

impl Throttle for ThreadSleep {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub delay: Duration,
    pub max_pages: u32,
    /// Consecutive pages without listing items before giving up; 0 disables.
    pub max_empty_pages: u32,
}

/// Why the collection loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    LastPage,
    MaxPages,
    EmptyPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub pages: u32,
    pub records: usize,
    pub skipped: usize,
    pub stop: StopReason,
}

#[derive(Debug)]
pub struct Collection {
    pub quotes: Vec<Quote>,
    pub summary: Summary,
}

/// Drives the page loop: fetch, extract, append, follow the next-page flag.
pub struct Collector {
    options: CollectOptions,
    extractor: Extractor,
    progress: ProgressBar,
}

impl Collector {
    pub fn new(options: CollectOptions, extractor: Extractor) -> Self {
        Collector {
            options,
            extractor,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn run<S, T>(&self, source: &mut S, throttle: &mut T) -> Result<Collection, ScrapeError>
    where
        S: PageSource,
        T: Throttle,
    {
        let span = info_span!("collect", max_pages = self.options.max_pages);
        let _guard = span.enter();
        info!("Start collecting quotes");

        let mut quotes = Vec::new();
        let mut skipped = 0;
        let mut empty_run = 0;
        let mut page = 1u32;

        let stop = loop {
            if page > 1 {
                throttle.pause(self.options.delay);
            }

            let html = source.fetch(page)?;
            let parsed = self.extractor.extract(page, &html)?;
            debug!(
                "Page #{}: {} items, {} kept, next={}",
                page,
                parsed.items,
                parsed.quotes.len(),
                parsed.has_next
            );

            skipped += parsed.skipped;
            empty_run = if parsed.items == 0 { empty_run + 1 } else { 0 };
            quotes.extend(parsed.quotes);

            self.progress
                .set_message(format!("page {} | {} quotes", page, quotes.len()));
            self.progress.inc(1);

            if !parsed.has_next {
                break StopReason::LastPage;
            }
            if page >= self.options.max_pages {
                warn!("Stopping at page #{}: max_pages reached", page);
                break StopReason::MaxPages;
            }
            if self.options.max_empty_pages > 0 && empty_run >= self.options.max_empty_pages {
                warn!("Stopping at page #{}: {} empty pages in a row", page, empty_run);
                break StopReason::EmptyPages;
            }
            page += 1;
        };

        self.progress.finish_and_clear();
        info!("Total quotes collected: {}", quotes.len());

        let summary = Summary {
            pages: page,
            records: quotes.len(),
            skipped,
            stop,
        };
        Ok(Collection { quotes, summary })
    }
}

// ── Tests ──
