//! Paper notes: template fields, title/body rendering and file creation.
//!
//! Templates use Handlebars syntax (`{{title}}`, `{{#each authors}}{{this}}{{/each}}`)
//! with HTML escaping disabled, since the output is Markdown. Mustache sections
//! are accepted as well: `{{#authors}}- {{.}}{{/authors}}` iterates a list,
//! `{{#pdf}}...{{/pdf}}` renders only when the field is set and
//! `{{^pdf}}...{{/pdf}}` only when it is not.

use chrono::{DateTime, NaiveDate, Utc};
use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output,
    RenderContext, Renderable,
};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::feed::{extract_arxiv_id, Article};

const NOTE_EXTENSION: &str = ".md";

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
    #[error("Invalid note title: {0:?}")]
    InvalidTitle(String),
    #[error("Note already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Failed to write note: {0}")]
    Io(#[from] std::io::Error),
}

/// Values exposed to the title and body templates.
///
/// Mirrors [`Article`], except `id` is the bare arXiv id (version stripped)
/// and the original entry id moves to `url`.
#[derive(Debug, Serialize)]
pub struct TemplateFields<'a> {
    pub id: String,
    pub url: &'a str,
    pub date: String,
    pub title: &'a str,
    #[serde(rename = "abstract")]
    pub abstract_text: &'a str,
    pub authors: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<&'a str>,
    pub updated: DateTime<Utc>,
    pub published: DateTime<Utc>,
}

impl<'a> TemplateFields<'a> {
    pub fn new(article: &'a Article, today: NaiveDate) -> Self {
        Self {
            id: extract_arxiv_id(&article.id, false).unwrap_or_else(|| article.id.clone()),
            url: &article.id,
            date: today.format("%Y-%m-%d").to_string(),
            title: &article.title,
            abstract_text: &article.abstract_text,
            authors: &article.authors,
            pdf: article.pdf.as_deref(),
            updated: article.updated,
            published: article.published,
        }
    }
}

/// Renders `{{#name}}...{{/name}}` when `name` is a field rather than a helper.
///
/// Lists render the block once per element, other truthy values once with the
/// value in scope, and falsy or missing values render the `{{else}}` block.
struct SectionHelper;

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = rc.evaluate(ctx, h.name())?;
        let path = value.context_path().cloned();
        let json = value.as_json().clone();

        if !json.is_truthy(false) {
            return match h.inverse() {
                Some(inverse) => inverse.render(r, ctx, rc, out),
                None => Ok(()),
            };
        }
        let Some(template) = h.template() else {
            return Ok(());
        };

        let scopes: Vec<BlockContext<'rc>> = match &json {
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let mut block = BlockContext::new();
                    match &path {
                        Some(path) => {
                            let base = block.base_path_mut();
                            base.clone_from(path);
                            base.push(index.to_string());
                        }
                        None => block.set_base_value(item.clone()),
                    }
                    block
                })
                .collect(),
            _ => {
                let mut block = BlockContext::new();
                match path {
                    Some(path) => *block.base_path_mut() = path,
                    None => block.set_base_value(json.clone()),
                }
                vec![block]
            }
        };

        for block in scopes {
            rc.push_block(block);
            let rendered = template.render(r, ctx, rc, out);
            rc.pop_block();
            rendered?;
        }
        Ok(())
    }
}

/// `{{.}}` and `{{{.}}}`, Mustache's name for the current item.
fn current_item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{(\{?~?)\s*\.\s*(~?\}?)\}\}")
            .expect("current item pattern is a valid regex")
    })
}

/// Opening, inverted and closing section tags. Capture 2 is the sigil,
/// capture 3 the name and capture 4 any arguments.
fn section_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{(~?)\s*([#^/])\s*([^\s}~]+)([^}]*)\}\}")
            .expect("section tag pattern is a valid regex")
    })
}

/// Rewrites the Mustache forms Handlebars has no syntax for.
///
/// `{{.}}` becomes `{{this}}`, and an inverted section `{{^name}}...{{/name}}`
/// becomes `{{#unless name}}...{{/unless}}`. Everything else passes through.
fn mustache_compat(template: &str) -> String {
    let template = current_item_pattern().replace_all(template, "{{${1}this${2}}}");

    let mut open: Vec<(String, bool)> = Vec::new();
    section_tag_pattern()
        .replace_all(&template, |caps: &Captures<'_>| {
            let (tilde, sigil, name, rest) = (&caps[1], &caps[2], &caps[3], &caps[4]);
            match sigil {
                "^" => {
                    open.push((name.to_string(), true));
                    format!("{{{{{tilde}#unless {name}{rest}}}}}")
                }
                "#" => {
                    open.push((name.to_string(), false));
                    caps[0].to_string()
                }
                _ => match open.pop() {
                    Some((opened, true)) if opened == name => {
                        format!("{{{{{tilde}/unless{rest}}}}}")
                    }
                    _ => caps[0].to_string(),
                },
            }
        })
        .into_owned()
}

fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    // Mustache sections resolve outer fields from inside the section
    registry.set_recursive_lookup(true);
    registry.register_helper("blockHelperMissing", Box::new(SectionHelper));
    registry
}

fn render(template: &str, fields: &TemplateFields<'_>) -> Result<String, NoteError> {
    Ok(registry().render_template(&mustache_compat(template), fields)?)
}

/// Renders the note file name, appending `.md` when missing.
///
/// The result must be a plain file name: empty names, `.`/`..` and path
/// separators are rejected so a feed title can never escape the notes directory.
pub fn render_title(template: &str, fields: &TemplateFields<'_>) -> Result<String, NoteError> {
    let mut title = render(template, fields)?;
    let trimmed = title.trim();
    if matches!(trimmed, "" | "." | ".." | NOTE_EXTENSION) || title.contains(['/', '\\', '\0']) {
        return Err(NoteError::InvalidTitle(title));
    }
    if !title.ends_with(NOTE_EXTENSION) {
        title.push_str(NOTE_EXTENSION);
    }
    Ok(title)
}

/// Renders the note body.
pub fn render_body(template: &str, fields: &TemplateFields<'_>) -> Result<String, NoteError> {
    render(template, fields)
}

/// Reads `<notes_dir>/<paper_template>.md`.
///
/// An empty setting or a missing file yields an empty template.
pub async fn load_template(notes_dir: &Path, paper_template: &str) -> Result<String, NoteError> {
    if paper_template.trim().is_empty() {
        return Ok(String::new());
    }

    let path = notes_dir.join(format!("{}{}", paper_template, NOTE_EXTENSION));
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Paper template not found, using empty template");
            Ok(String::new())
        }
        Err(e) => Err(NoteError::Io(e)),
    }
}

/// Creates paper notes in a notes directory.
#[derive(Debug, Clone)]
pub struct NoteWriter {
    notes_dir: PathBuf,
    paper_template: String,
    title_template: String,
}

impl NoteWriter {
    pub fn new(
        notes_dir: impl Into<PathBuf>,
        paper_template: impl Into<String>,
        title_template: impl Into<String>,
    ) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            paper_template: paper_template.into(),
            title_template: title_template.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.notes_dir.clone(),
            config.paper_template.clone(),
            config.title_template.clone(),
        )
    }

    /// Writes a new note for `article` and returns its path.
    ///
    /// # Errors
    ///
    /// - [`NoteError::AlreadyExists`] if a note with the rendered title exists
    /// - [`NoteError::InvalidTitle`] if the title template renders an unusable name
    /// - [`NoteError::Template`] for template syntax errors
    pub async fn create(&self, article: &Article) -> Result<PathBuf, NoteError> {
        self.create_on(article, Utc::now().date_naive()).await
    }

    /// As [`create`](Self::create) with an explicit date for `{{date}}`.
    pub async fn create_on(&self, article: &Article, today: NaiveDate) -> Result<PathBuf, NoteError> {
        let fields = TemplateFields::new(article, today);
        let title = render_title(&self.title_template, &fields)?;
        let template = load_template(&self.notes_dir, &self.paper_template).await?;
        let body = render_body(&template, &fields)?;

        let path = self.notes_dir.join(&title);
        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true) // Fails atomically if the note exists
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(NoteError::AlreadyExists(path));
            }
            Err(e) => return Err(NoteError::Io(e)),
        };

        write_note(&path, file, &body).await?;

        tracing::info!(path = %path.display(), id = %article.id, "Created paper note");
        Ok(path)
    }
}

/// Writes `body` to a freshly created note, removing the note if the write fails.
async fn write_note<W: AsyncWrite + Unpin>(path: &Path, mut file: W, body: &str) -> Result<(), NoteError> {
    let written = async {
        file.write_all(body.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %remove_err, "Failed to remove partial note");
        }
        return Err(NoteError::Io(e));
    }
    Ok(())
}
