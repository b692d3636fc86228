use serde::{Deserialize, Serialize};

/// One listing item: quote text, its author and the tag links under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
    pub tags: Vec<String>,
}
