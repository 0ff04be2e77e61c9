//! Background task event processing.

use crate::app::{App, AppEvent};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::NoteCreated { path } => {
            app.creating_note = false;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            app.set_status(format!("Created {}", name));
        }
        AppEvent::NoteFailed { error } => {
            app.creating_note = false;
            app.set_status(format!("Error: {}", error));
        }
        AppEvent::OpenFailed { path, error } => {
            app.set_status(format!("Failed to open {}: {}", path.display(), error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteWriter;
    use std::path::PathBuf;

    fn status(app: &App) -> &str {
        app.status_message.as_ref().map(|(m, _)| m.as_ref()).unwrap_or("")
    }

    #[tokio::test]
    async fn test_note_created_releases_guard() {
        let mut app = App::new(NoteWriter::new(".", "", "{{id}}"), false);
        app.creating_note = true;
        handle_app_event(
            &mut app,
            AppEvent::NoteCreated {
                path: PathBuf::from("/notes/2005.11401.md"),
            },
        );
        assert!(!app.creating_note);
        assert_eq!(status(&app), "Created 2005.11401.md");
    }

    #[tokio::test]
    async fn test_note_failed_reports_error() {
        let mut app = App::new(NoteWriter::new(".", "", "{{id}}"), false);
        app.creating_note = true;
        handle_app_event(
            &mut app,
            AppEvent::NoteFailed {
                error: "Note already exists: /notes/x.md".into(),
            },
        );
        assert!(!app.creating_note);
        assert!(status(&app).starts_with("Error: Note already exists"));
    }
}
