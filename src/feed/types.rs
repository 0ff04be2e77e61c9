use chrono::{DateTime, Utc};
use serde::Serialize;

/// A paper record normalized from one `<entry>` of an arXiv Atom feed.
///
/// Immutable once constructed. `authors` is never empty and keeps citation
/// order. `pdf` is only set when the feed exposes a link titled `pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// The feed's own entry id, e.g. `http://arxiv.org/abs/2005.11401v4`.
    pub id: String,
    pub updated: DateTime<Utc>,
    pub published: DateTime<Utc>,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
}

impl Article {
    /// First author, used for compact list rendering.
    pub fn first_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or_default()
    }
}

/// Output of normalizing a feed tree.
///
/// Entries that could not be turned into an [`Article`] (bad timestamp,
/// missing required field) are dropped and counted in `skipped`.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub articles: Vec<Article>,
    pub skipped: usize,
}
