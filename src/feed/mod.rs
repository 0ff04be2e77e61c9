//! arXiv lookup: identifier extraction, feed decoding and the query client.
//!
//! Data flows leaf-first through the submodules:
//!
//! - [`identifier`] - Pulls a bare arXiv id out of an abstract/PDF URL
//! - [`tree`] - Decodes Atom XML into a generic `serde_json::Value` tree
//! - [`parser`] - Normalizes the tree into [`Article`] records
//! - [`fetcher`] - Builds query URLs, performs the request, runs the two steps above
//!
//! # Example
//!
//! ```ignore
//! use arxiv_getter::feed::{extract_arxiv_id, ArxivClient};
//!
//! let id = extract_arxiv_id("https://arxiv.org/abs/2005.11401v4", true).unwrap();
//! let articles = ArxivClient::new(reqwest::Client::new()).search_by_id(&id).await?;
//! ```

mod fetcher;
mod identifier;
mod parser;
mod tree;
mod types;

pub use fetcher::{
    ArticleSource, ArxivClient, FetchError, Query, SearchParams, SortBy, SortOrder,
    DEFAULT_ENDPOINT, DEFAULT_MAX_RESULTS,
};
pub use identifier::extract_arxiv_id;
pub use parser::{article_from_entry, normalize_feed, one_or_many, parse_timestamp, FeedError};
pub use tree::{parse_tree, TreeError, ATTR_KEY, TEXT_KEY};
pub use types::{Article, ParseResult};
