use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

use crate::feed::{Article, FetchError};

/// Signals published to whoever renders the suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionEvent {
    /// The latest query returned articles (possibly truncated to the limit).
    Results(Vec<Article>),
    /// The latest query was non-empty but nothing matched (or the lookup failed).
    NoResults { query: String },
    /// The input was cleared; nothing is being searched for.
    Cleared,
}

/// A query the debounce window released for a specific generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub generation: u64,
    pub text: String,
}

/// Interactive query state for one open suggestion surface.
///
/// Every keystroke bumps `generation`. A completion is only accepted when it
/// carries the current generation, so out-of-order arrivals can never replace
/// a fresher result.
#[derive(Debug, Default)]
pub struct Session {
    text: String,
    generation: u64,
    deadline: Option<Instant>,
    /// `None`: nothing queried (or input cleared). `Some(empty)`: query ran, zero results.
    published: Option<Vec<Article>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn published(&self) -> Option<&[Article]> {
        self.published.as_deref()
    }

    /// Records a keystroke and (re)arms the trailing-edge debounce.
    pub fn on_input(&mut self, text: String, now: Instant, window: Duration) -> u64 {
        self.text = text;
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(now + window);
        self.generation
    }

    /// Releases the pending query once the quiescence window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<Dispatch> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                Some(Dispatch {
                    generation: self.generation,
                    text: self.text.clone(),
                })
            }
            _ => None,
        }
    }

    /// Handles cleared input for `generation` without any lookup.
    pub fn clear(&mut self, generation: u64) -> Option<SuggestionEvent> {
        if generation != self.generation {
            return None;
        }
        self.published = None;
        Some(SuggestionEvent::Cleared)
    }

    /// Applies a finished lookup.
    ///
    /// Returns `None` for stale generations. Failures count as an empty result.
    /// Repeated article ids keep their first occurrence; a `limit` of 0 keeps
    /// every remaining article.
    pub fn complete(
        &mut self,
        generation: u64,
        text: &str,
        outcome: Result<Vec<Article>, FetchError>,
        limit: usize,
    ) -> Option<SuggestionEvent> {
        if generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = generation,
                query = %text,
                "Ignoring stale suggestion result (generation mismatch)"
            );
            return None;
        }

        let mut articles = match outcome {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(query = %text, error = %e, "Suggestion lookup failed");
                Vec::new()
            }
        };

        if articles.is_empty() {
            self.published = Some(Vec::new());
            return Some(if text.is_empty() {
                SuggestionEvent::Cleared
            } else {
                SuggestionEvent::NoResults {
                    query: text.to_string(),
                }
            });
        }

        let mut seen = HashSet::with_capacity(articles.len());
        articles.retain(|article| seen.insert(article.id.clone()));

        if limit > 0 {
            articles.truncate(limit);
        }
        self.published = Some(articles.clone());
        Some(SuggestionEvent::Results(articles))
    }
}
