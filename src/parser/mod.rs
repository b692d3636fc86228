pub mod selectors;

use scraper::{ElementRef, Html};
use tracing::warn;

use crate::error::ScrapeError;
use crate::quote::Quote;
use crate::settings::MissingFieldPolicy;
use selectors::Selectors;

/// Everything kept from one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub quotes: Vec<Quote>,
    /// Listing items seen, including skipped ones.
    pub items: usize,
    pub skipped: usize,
    pub has_next: bool,
}

/// Turns listing HTML into quotes plus the next-page flag.
pub struct Extractor {
    selectors: Selectors,
    policy: MissingFieldPolicy,
}

impl Extractor {
    pub fn new(policy: MissingFieldPolicy) -> Result<Self, ScrapeError> {
        Ok(Extractor {
            selectors: Selectors::new()?,
            policy,
        })
    }

    /// Extract every quote on `page` in document order.
    pub fn extract(&self, page: u32, html: &str) -> Result<ParsedPage, ScrapeError> {
        let document = Html::parse_document(html);

        let mut quotes = Vec::new();
        let mut items = 0;
        let mut skipped = 0;

        for (index, element) in document.select(&self.selectors.quote).enumerate() {
            items += 1;
            match self.extract_quote(element) {
                Ok(quote) => quotes.push(quote),
                Err(field) => match self.policy {
                    MissingFieldPolicy::Fail => {
                        return Err(ScrapeError::MissingField { page, index, field })
                    }
                    MissingFieldPolicy::Skip => {
                        warn!("Skipping item {} on page #{}: missing {}", index, page, field);
                        skipped += 1;
                    }
                },
            }
        }

        // Presence is enough; a disabled-looking control still counts.
        let has_next = document.select(&self.selectors.next).next().is_some();

        Ok(ParsedPage {
            quotes,
            items,
            skipped,
            has_next,
        })
    }

    /// Err carries the name of the first missing field.
    fn extract_quote(&self, element: ElementRef<'_>) -> Result<Quote, &'static str> {
        let text = first_text(element, &self.selectors.text).ok_or("text")?;
        let author = first_text(element, &self.selectors.author).ok_or("author")?;
        let tags = element.select(&self.selectors.tag).map(text_content).collect();
        Ok(Quote { text, author, tags })
    }
}

fn first_text(element: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(text_content)
        .filter(|t| !t.is_empty())
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn skip() -> Extractor {
        Extractor::new(MissingFieldPolicy::Skip).unwrap()
    }

    #[test]
    fn first_page() {
        let page = skip().extract(1, &fixture("first_page")).unwrap();
        assert_eq!(page.items, 3);
        assert_eq!(page.quotes.len(), 3);
        assert!(page.has_next);

        let q = &page.quotes[0];
        assert_eq!(
            q.text,
            "\u{201c}The world as we have created it is a process of our thinking. It cannot be changed without changing our thinking.\u{201d}"
        );
        assert_eq!(q.author, "Albert Einstein");
        assert_eq!(q.tags, vec!["change", "deep-thoughts", "thinking", "world"]);
    }

    #[test]
    fn keeps_document_order() {
        let page = skip().extract(1, &fixture("first_page")).unwrap();
        let authors: Vec<&str> = page.quotes.iter().map(|q| q.author.as_str()).collect();
        assert_eq!(authors, vec!["Albert Einstein", "J.K. Rowling", "Marilyn Monroe"]);
    }

    #[test]
    fn quote_without_tags() {
        let page = skip().extract(1, &fixture("first_page")).unwrap();
        let monroe = &page.quotes[2];
        assert_eq!(monroe.author, "Marilyn Monroe");
        assert!(monroe.tags.is_empty());
    }

    #[test]
    fn last_page_has_no_next() {
        let page = skip().extract(10, &fixture("last_page")).unwrap();
        assert_eq!(page.quotes.len(), 2);
        assert!(!page.has_next);
    }

    #[test]
    fn empty_page_is_not_an_error() {
        let page = skip().extract(11, &fixture("empty_page")).unwrap();
        assert!(page.quotes.is_empty());
        assert_eq!(page.items, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn tags_keep_duplicates_and_case() {
        let html = r#"
            <div class="quote">
              <span class="text">  Again  </span>
              <small class="author">Someone</small>
              <div class="tags">
                <a class="tag" href="/tag/Echo/">Echo</a>
                <a class="tag" href="/tag/echo/">echo</a>
                <a class="tag" href="/tag/Echo/"> Echo </a>
                <a href="/tag/ignored/">not a tag</a>
              </div>
            </div>"#;
        let page = skip().extract(1, html).unwrap();
        assert_eq!(page.quotes[0].text, "Again");
        assert_eq!(page.quotes[0].tags, vec!["Echo", "echo", "Echo"]);
    }

    #[test]
    fn disabled_next_still_counts() {
        let html = r#"<ul class="pager"><li class="next disabled"><a>Next</a></li></ul>"#;
        let page = skip().extract(1, html).unwrap();
        assert!(page.has_next);
    }

    #[test]
    fn previous_only_pager_has_no_next() {
        let html = r#"<ul class="pager"><li class="previous"><a href="/page/1/">Previous</a></li></ul>"#;
        assert!(!skip().extract(2, html).unwrap().has_next);
    }

    #[test]
    fn skip_policy_drops_broken_items() {
        let page = skip().extract(3, &fixture("missing_author")).unwrap();
        assert_eq!(page.items, 3);
        assert_eq!(page.skipped, 1);
        let texts: Vec<&str> = page.quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Third"]);
    }

    #[test]
    fn fail_policy_names_the_field() {
        let strict = Extractor::new(MissingFieldPolicy::Fail).unwrap();
        let err = strict.extract(3, &fixture("missing_author")).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingField { page: 3, index: 1, field: "author" }
        ));
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let html = r#"
            <div class="quote">
              <span class="text">   </span>
              <small class="author">Nobody</small>
            </div>"#;
        let strict = Extractor::new(MissingFieldPolicy::Fail).unwrap();
        assert!(matches!(
            strict.extract(1, html),
            Err(ScrapeError::MissingField { field: "text", .. })
        ));
    }
}
