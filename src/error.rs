use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching, extracting or writing quotes.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid base URL `{url}`: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid selector `{selector}`: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
    #[error("page {page}, item {index}: missing `{field}`")]
    MissingField {
        page: u32,
        index: usize,
        field: &'static str,
    },
    #[error("failed to write `{}`: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("malformed tags cell `{0}`")]
    InvalidTags(String),
}

impl ScrapeError {
    /// Connect, timeout and mid-request transport failures, 429 and 5xx are
    /// worth another attempt. Builder, redirect and decode errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Request { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request() || source.is_body()
            }
            ScrapeError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ScrapeError {
        ScrapeError::Status {
            url: "https://quotes.toscrape.com/".into(),
            status: code,
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn extraction_errors_are_final() {
        let err = ScrapeError::MissingField {
            page: 2,
            index: 4,
            field: "author",
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "page 2, item 4: missing `author`");
    }
}
