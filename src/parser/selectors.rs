use scraper::Selector;

use crate::error::ScrapeError;

pub const QUOTE: &str = ".quote";
pub const TEXT: &str = ".text";
pub const AUTHOR: &str = ".author";
pub const TAG: &str = ".tags a.tag";
pub const NEXT: &str = ".pager .next";

/// Compiled CSS selectors for the quote listing markup.
pub struct Selectors {
    pub quote: Selector,
    pub text: Selector,
    pub author: Selector,
    pub tag: Selector,
    pub next: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            quote: parse(QUOTE)?,
            text: parse(TEXT)?,
            author: parse(AUTHOR)?,
            tag: parse(TAG)?,
            next: parse(NEXT)?,
        })
    }
}

fn parse(selector: &'static str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector,
        message: e.to_string(),
    })
}
