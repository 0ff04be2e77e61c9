use std::borrow::Cow;
use std::path::PathBuf;
use tokio::time::Instant;

use crate::feed::Article;
use crate::note::NoteWriter;
use crate::suggest::SuggestionEvent;
use crate::util::MAX_INPUT_LENGTH;

/// How long a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

/// What the suggestion list currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SuggestionState {
    /// Nothing typed yet, or the input was cleared.
    #[default]
    Idle,
    Results(Vec<Article>),
    NoResults {
        query: String,
    },
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    NoteCreated { path: PathBuf },
    NoteFailed { error: String },
    /// The system opener could not launch the created note.
    OpenFailed { path: PathBuf, error: String },
}

pub struct App {
    pub input: String,
    pub suggestions: SuggestionState,
    pub selected: usize,

    // Status message with timestamp for auto-expiry
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    pub notes: NoteWriter,
    pub open_after_create: bool,
    /// Set while a note is being written, so repeated Enter does nothing.
    pub creating_note: bool,

    // PERF-010: Only redraw when state changed
    pub needs_redraw: bool,
}

impl App {
    pub fn new(notes: NoteWriter, open_after_create: bool) -> Self {
        Self {
            input: String::new(),
            suggestions: SuggestionState::Idle,
            selected: 0,
            status_message: None,
            notes,
            open_after_create,
            creating_note: false,
            needs_redraw: true,
        }
    }

    /// Appends a typed character. Control characters and overlong input are ignored.
    pub fn insert_char(&mut self, c: char) -> bool {
        if c.is_control() || self.input.len() + c.len_utf8() > MAX_INPUT_LENGTH {
            return false;
        }
        self.input.push(c);
        true
    }

    /// Appends pasted text, dropping control characters and newlines.
    pub fn insert_str(&mut self, text: &str) -> bool {
        let mut changed = false;
        for c in text.chars() {
            changed |= self.insert_char(c);
        }
        changed
    }

    pub fn delete_char(&mut self) -> bool {
        self.input.pop().is_some()
    }

    pub fn clear_input(&mut self) -> bool {
        if self.input.is_empty() {
            return false;
        }
        self.input.clear();
        true
    }

    /// Replaces the list with a published suggestion signal.
    pub fn apply_suggestions(&mut self, event: SuggestionEvent) {
        self.suggestions = match event {
            SuggestionEvent::Results(articles) => SuggestionState::Results(articles),
            SuggestionEvent::NoResults { query } => SuggestionState::NoResults { query },
            SuggestionEvent::Cleared => SuggestionState::Idle,
        };
        self.selected = 0;
    }

    pub fn articles(&self) -> &[Article] {
        match &self.suggestions {
            SuggestionState::Results(articles) => articles,
            _ => &[],
        }
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.articles().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.articles().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was cleared (indicating redraw needed)
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
