//! Configuration file parser for ~/.config/arxiv-getter/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::{SortBy, SortOrder, DEFAULT_ENDPOINT, DEFAULT_MAX_RESULTS};
use crate::suggest::SuggestConfig;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory new paper notes are written to.
    pub notes_dir: PathBuf,

    /// Note used as the body template, relative to `notes_dir`, without `.md`.
    /// Empty = notes start empty.
    pub paper_template: String,

    /// Template for the note file name. `.md` is appended when missing.
    pub title_template: String,

    /// Open a note with the system handler right after creating it.
    pub open_after_create: bool,

    /// Quiet period after the last keystroke before a lookup is sent.
    pub debounce_ms: u64,

    /// Maximum suggestions shown (0 = unlimited).
    pub max_suggestions: usize,

    /// Search all fields for input that is not an arXiv URL, instead of
    /// looking it up as an identifier.
    pub free_text_search: bool,

    /// arXiv API query endpoint.
    pub endpoint: String,

    /// Page size requested from arXiv.
    pub max_results: u32,

    pub sort_by: Option<SortBy>,

    pub sort_order: Option<SortOrder>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_dir: PathBuf::from("."),
            paper_template: String::new(),
            title_template: "{{id}}".to_string(),
            open_after_create: true,
            debounce_ms: 250,
            max_suggestions: 10,
            free_text_search: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: None,
            sort_order: None,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "notes_dir",
                "paper_template",
                "title_template",
                "open_after_create",
                "debounce_ms",
                "max_suggestions",
                "free_text_search",
                "endpoint",
                "max_results",
                "sort_by",
                "sort_order",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            notes_dir = %config.notes_dir.display(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Engine settings derived from this configuration.
    pub fn suggest_config(&self) -> SuggestConfig {
        SuggestConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            limit: self.max_suggestions,
            free_text: self.free_text_search,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
