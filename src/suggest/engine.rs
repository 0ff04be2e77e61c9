use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::session::{Dispatch, Session, SuggestionEvent};
use crate::feed::{extract_arxiv_id, ArticleSource, Article, FetchError, Query};

/// Default quiescence window between the last keystroke and the lookup.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestConfig {
    pub debounce: Duration,
    /// Maximum suggestions published per result; 0 = unlimited.
    pub limit: usize,
    /// Send input that is not an arXiv URL as a full-text search instead of
    /// an identifier lookup.
    pub free_text: bool,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            limit: 0,
            free_text: false,
        }
    }
}

/// Turns a settled input into the query sent to the source.
///
/// arXiv URLs become identifier lookups (version kept). Anything else is
/// sent verbatim, as an identifier unless `free_text` is set.
pub fn query_for_input(text: &str, free_text: bool) -> Query {
    match extract_arxiv_id(text, true) {
        Some(id) => Query::Id(id),
        None if free_text => Query::Text(text.to_string()),
        None => Query::Id(text.to_string()),
    }
}

/// Result of one dispatched lookup, tagged with the generation that issued it.
struct Completion {
    generation: u64,
    text: String,
    outcome: Result<Vec<Article>, FetchError>,
}

/// Keystroke entry point for a running [`SuggestionEngine`].
///
/// Dropping the handle closes the session.
pub struct SuggestionHandle {
    input_tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SuggestionHandle {
    /// Delivers the full current input text. Never blocks.
    pub fn input(&self, text: impl Into<String>) {
        if self.input_tx.send(text.into()).is_err() {
            tracing::debug!("Suggestion engine stopped, dropping input");
        }
    }

    /// Closes the session and waits for the engine task to finish.
    pub async fn close(self) {
        let SuggestionHandle { input_tx, task } = self;
        drop(input_tx);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Suggestion engine task ended abnormally");
        }
    }
}

/// Debounced, stale-safe "search as you type" engine.
///
/// Runs as a single task that exclusively owns the [`Session`]. Keystrokes,
/// the debounce deadline and lookup completions are multiplexed with
/// `tokio::select!`; lookups themselves run in their own tasks and are never
/// cancelled. A result whose generation is no longer current is discarded on
/// arrival.
pub struct SuggestionEngine<S> {
    source: Arc<S>,
    config: SuggestConfig,
    session: Session,
    events: mpsc::Sender<SuggestionEvent>,
    completion_tx: mpsc::UnboundedSender<Completion>,
}

impl<S: ArticleSource> SuggestionEngine<S> {
    /// Starts a session. Published signals are sent to `events`.
    pub fn spawn(
        source: Arc<S>,
        config: SuggestConfig,
        events: mpsc::Sender<SuggestionEvent>,
    ) -> SuggestionHandle {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let engine = SuggestionEngine {
            source,
            config,
            session: Session::new(),
            events,
            completion_tx,
        };
        let task = tokio::spawn(engine.run(input_rx, completion_rx));

        SuggestionHandle { input_tx, task }
    }

    async fn run(
        mut self,
        mut input_rx: mpsc::UnboundedReceiver<String>,
        mut completion_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let deadline = self.session.deadline();

            tokio::select! {
                biased;

                maybe_text = input_rx.recv() => {
                    let Some(text) = maybe_text else {
                        tracing::debug!("Suggestion session closed");
                        break;
                    };
                    let generation = self.session.on_input(text, Instant::now(), self.config.debounce);
                    tracing::trace!(generation, "Input received, debounce armed");
                }

                Some(done) = completion_rx.recv() => {
                    let event = self.session.complete(
                        done.generation,
                        &done.text,
                        done.outcome,
                        self.config.limit,
                    );
                    if let Some(event) = event {
                        if !self.publish(event).await {
                            break;
                        }
                    }
                }

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(dispatch) = self.session.take_due(Instant::now()) {
                        if !self.dispatch(dispatch).await {
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Returns false once the consumer has gone away.
    async fn publish(&self, event: SuggestionEvent) -> bool {
        if let Err(e) = self.events.send(event).await {
            tracing::debug!(error = %e, "Suggestion consumer dropped, stopping session");
            return false;
        }
        true
    }

    async fn dispatch(&mut self, Dispatch { generation, text }: Dispatch) -> bool {
        if text.is_empty() {
            return match self.session.clear(generation) {
                Some(event) => self.publish(event).await,
                None => true,
            };
        }

        let query = query_for_input(&text, self.config.free_text);
        tracing::debug!(generation, query = ?query, "Dispatching suggestion lookup");

        let lookup = self.source.search(query);
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = lookup.await;
            // Receiver is gone once the session closed; the result is moot then
            let _ = tx.send(Completion {
                generation,
                text,
                outcome,
            });
        });
        true
    }
}
