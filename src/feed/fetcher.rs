use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::parser::{normalize_feed, FeedError};
use super::tree::{parse_tree, TreeError};
use super::types::{Article, ParseResult};

/// Default arXiv API query endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://export.arxiv.org/api/query";
/// Default page size when the caller does not override it.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

const MAX_FEED_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors that can occur while querying the arXiv API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The configured endpoint could not be combined into a query URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Response body exceeded the 5MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// Feed XML could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] TreeError),
    /// Decoded feed could not be normalized, or arXiv reported an error
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// `sortBy` values accepted by the arXiv API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// `sortOrder` values accepted by the arXiv API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// What is sent as `search_query`.
///
/// `Id` carries an extracted identifier or, for input that is not an arXiv
/// URL, the raw input itself. `Text` is the opt-in full-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Id(String),
    Text(String),
}

impl Query {
    /// The `search_query` value sent to arXiv.
    pub fn search_query(&self) -> String {
        match self {
            Query::Id(id) => format!("id:{}", id),
            Query::Text(text) => format!("all:{}", text),
        }
    }
}

/// Parameters of one API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Query,
    pub start: u32,
    pub max_results: u32,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

impl SearchParams {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            start: 0,
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: None,
            sort_order: None,
        }
    }

    /// Builds the request URL. Pairs are form-encoded in a fixed order so the
    /// same parameters always yield the same URL.
    pub fn url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .clear()
                .append_pair("search_query", &self.query.search_query())
                .append_pair("start", &self.start.to_string())
                .append_pair("max_results", &self.max_results.to_string());
            if let Some(sort_by) = self.sort_by {
                pairs.append_pair("sortBy", sort_by.as_str());
            }
            if let Some(sort_order) = self.sort_order {
                pairs.append_pair("sortOrder", sort_order.as_str());
            }
        }
        Ok(url)
    }
}

/// Anything that can answer a [`Query`] with articles.
///
/// The returned future owns everything it needs so it can be spawned.
pub trait ArticleSource: Send + Sync + 'static {
    fn search(&self, query: Query) -> BoxFuture<'static, Result<Vec<Article>, FetchError>>;
}

/// Client for the arXiv Atom query API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: reqwest::Client,
    endpoint: String,
    max_results: u32,
    sort_by: Option<SortBy>,
    sort_order: Option<SortOrder>,
}

impl ArxivClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: None,
            sort_order: None,
        }
    }

    /// Point the client at another endpoint (used by tests against a mock server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_sort(mut self, sort_by: Option<SortBy>, sort_order: Option<SortOrder>) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    fn params(&self, query: Query) -> SearchParams {
        SearchParams {
            max_results: self.max_results,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            ..SearchParams::new(query)
        }
    }

    /// Looks up papers by arXiv identifier.
    pub async fn search_by_id(&self, id: &str) -> Result<Vec<Article>, FetchError> {
        self.search(&self.params(Query::Id(id.to_string()))).await
    }

    /// Performs exactly one request and normalizes the returned feed.
    ///
    /// An empty feed is `Ok(vec![])`, not an error. Failures are not retried.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 5MB
    /// - [`FetchError::Parse`] - Body is not well-formed XML
    /// - [`FetchError::Feed`] - Body is not an Atom feed, or arXiv reported an error
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Article>, FetchError> {
        let url = params.url(&self.endpoint)?;
        tracing::debug!(url = %url, "Querying arXiv");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        let body = String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)?;

        let tree = parse_tree(&body)?;
        let ParseResult { articles, skipped } = normalize_feed(&tree)?;

        if skipped > 0 {
            tracing::warn!(
                url = %url,
                skipped = skipped,
                "Malformed feed entries skipped"
            );
        }
        tracing::debug!(url = %url, count = articles.len(), "arXiv query complete");

        Ok(articles)
    }
}

impl ArticleSource for ArxivClient {
    fn search(&self, query: Query) -> BoxFuture<'static, Result<Vec<Article>, FetchError>> {
        let client = self.clone();
        let params = self.params(query);
        async move { client.search(&params).await }.boxed()
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
