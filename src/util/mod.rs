//! Small helpers shared by the TUI.
//!
//! - **Text**: Unicode-aware width, truncation and control-character stripping
//! - **URLs**: Validation before opening feed-supplied links

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};

/// Maximum length of the lookup input line.
pub const MAX_INPUT_LENGTH: usize = 256;
