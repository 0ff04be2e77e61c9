//! Keyboard and paste input handling.

use crate::app::{App, AppEvent};
use crate::suggest::SuggestionHandle;
use crate::util::validate_url_for_open;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use super::loop_runner::Action;

pub(super) fn handle_input(
    app: &mut App,
    key: KeyEvent,
    suggest: &SuggestionHandle,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Windows reports releases too
    if key.kind == KeyEventKind::Release {
        return Action::Continue;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Char('c') if ctrl => return Action::Quit,
        KeyCode::Char('u') if ctrl => {
            if app.clear_input() {
                suggest.input(app.input.clone());
            }
        }
        KeyCode::Char('o') if ctrl => open_selected_pdf(app),
        KeyCode::Char('n') if ctrl => app.select_next(),
        KeyCode::Char('p') if ctrl => app.select_prev(),
        KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            if app.insert_char(c) {
                suggest.input(app.input.clone());
            }
        }
        KeyCode::Backspace => {
            if app.delete_char() {
                suggest.input(app.input.clone());
            }
        }
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Enter => spawn_create_note(app, event_tx),
        _ => {}
    }
    Action::Continue
}

/// Inserts bracketed-paste text, forwarding the new input when it changed.
pub(super) fn handle_paste(app: &mut App, text: &str, suggest: &SuggestionHandle) {
    if app.insert_str(text) {
        suggest.input(app.input.clone());
    }
}

fn open_selected_pdf(app: &mut App) {
    let Some(article) = app.selected_article() else {
        app.set_status("No paper selected");
        return;
    };
    let Some(pdf) = article.pdf.clone() else {
        app.set_status("No PDF link for this paper");
        return;
    };
    // SEC: Validate URL before open::that() to prevent command injection
    if let Err(e) = validate_url_for_open(&pdf) {
        app.set_status(e.to_string());
    } else if let Err(e) = open::that(&pdf) {
        app.set_status(format!("Failed to open browser: {}", e));
    } else {
        app.set_status("Opening PDF...");
    }
}

/// Writes a note for the selected suggestion in the background.
fn spawn_create_note(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.creating_note {
        return;
    }
    let Some(article) = app.selected_article().cloned() else {
        app.set_status("No paper selected");
        return;
    };

    app.creating_note = true;
    app.set_status("Creating note...");

    let writer = app.notes.clone();
    let open_after = app.open_after_create;
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let path = match writer.create(&article).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(id = %article.id, error = %e, "Failed to create note");
                let _ = tx.send(AppEvent::NoteFailed { error: e.to_string() }).await;
                return;
            }
        };

        if tx.send(AppEvent::NoteCreated { path: path.clone() }).await.is_err() {
            return;
        }

        if open_after {
            let target = path.clone();
            let opened = tokio::task::spawn_blocking(move || open::that(&target)).await;
            let error = match opened {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
            };
            tracing::warn!(path = %path.display(), error = %error, "Failed to open note");
            let _ = tx.send(AppEvent::OpenFailed { path, error }).await;
        }
    });
}
