//! Incremental "search as you type" suggestions.
//!
//! - [`session`] - Per-surface state: input text, generation counter, last published list
//! - [`engine`] - The task that debounces input, dispatches lookups and drops stale results
//!
//! Keystrokes go in through a [`SuggestionHandle`]; the consumer receives
//! [`SuggestionEvent`]s on an mpsc channel:
//!
//! ```ignore
//! let (tx, mut rx) = tokio::sync::mpsc::channel(32);
//! let handle = SuggestionEngine::spawn(Arc::new(client), SuggestConfig::default(), tx);
//! handle.input("https://arxiv.org/abs/2005.11401v4");
//! while let Some(event) = rx.recv().await { /* render */ }
//! ```

mod engine;
mod session;

pub use engine::{
    query_for_input, SuggestConfig, SuggestionEngine, SuggestionHandle, DEFAULT_DEBOUNCE,
};
pub use session::{Dispatch, Session, SuggestionEvent};
