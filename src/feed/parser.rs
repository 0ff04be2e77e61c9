use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::tree::{ATTR_KEY, TEXT_KEY};
use super::types::{Article, ParseResult};

/// Prefix of entry ids arXiv uses to report query errors inside a feed.
const API_ERROR_PREFIX: &str = "http://arxiv.org/api/errors";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Document is not an Atom feed")]
    NotAFeed,
    #[error("Entry is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid timestamp in '{field}': {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("arXiv API error: {0}")]
    Api(String),
}

/// Coerces a field that may be absent, a single value, or an array into a sequence.
///
/// Applied to every multiplicity-ambiguous field (`entry`, `author`, `link`).
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Text content of an element, whether it decoded as a bare string or an
/// object carrying attributes.
fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get(TEXT_KEY).and_then(Value::as_str),
        _ => None,
    }
}

fn attr<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(ATTR_KEY)?.get(name)?.as_str()
}

fn required_text<'a>(entry: &'a Value, field: &'static str) -> Result<&'a str, FeedError> {
    entry
        .get(field)
        .and_then(text_of)
        .ok_or(FeedError::MissingField(field))
}

/// Parses feed timestamps: RFC 3339, falling back to a naive ISO-8601 form read as UTC.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, FeedError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| FeedError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}

/// Builds an [`Article`] from one decoded `<entry>`.
pub fn article_from_entry(entry: &Value) -> Result<Article, FeedError> {
    let id = required_text(entry, "id")?.trim().to_string();

    let authors = one_or_many(entry.get("author"))
        .into_iter()
        .map(|author| {
            author
                .get("name")
                .and_then(text_of)
                .map(str::to_string)
                .ok_or(FeedError::MissingField("author.name"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if authors.is_empty() {
        return Err(FeedError::MissingField("author"));
    }

    let pdf = one_or_many(entry.get("link"))
        .into_iter()
        .find(|link| attr(link, "title") == Some("pdf"))
        .and_then(|link| attr(link, "href"))
        .map(str::to_string);

    Ok(Article {
        updated: parse_timestamp("updated", required_text(entry, "updated")?)?,
        published: parse_timestamp("published", required_text(entry, "published")?)?,
        title: required_text(entry, "title")?.to_string(),
        abstract_text: entry
            .get("summary")
            .and_then(text_of)
            .unwrap_or_default()
            .to_string(),
        id,
        authors,
        pdf,
    })
}

/// Normalizes a decoded Atom feed into articles, preserving entry order.
///
/// Entries that fail construction are skipped and counted; the rest are kept.
///
/// # Errors
///
/// - [`FeedError::NotAFeed`] if the tree has no `feed` root
/// - [`FeedError::Api`] if arXiv reported a query error in place of results
pub fn normalize_feed(tree: &Value) -> Result<ParseResult, FeedError> {
    let feed = tree.get("feed").ok_or(FeedError::NotAFeed)?;
    // An empty <feed/> decodes to a bare string
    if !feed.is_object() {
        return Ok(ParseResult::default());
    }

    let entries = one_or_many(feed.get("entry"));

    if let [entry] = entries.as_slice() {
        if let Some(id) = entry.get("id").and_then(text_of) {
            if id.trim().starts_with(API_ERROR_PREFIX) {
                let message = entry
                    .get("summary")
                    .and_then(text_of)
                    .unwrap_or(id)
                    .trim()
                    .to_string();
                return Err(FeedError::Api(message));
            }
        }
    }

    let mut result = ParseResult::default();
    for entry in entries {
        match article_from_entry(entry) {
            Ok(article) => result.articles.push(article),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed feed entry");
                result.skipped += 1;
            }
        }
    }

    Ok(result)
}
