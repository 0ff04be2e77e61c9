//! Terminal User Interface.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and the input line
//! - `suggestions` - Suggestion list widget
//! - `status` - Status bar widget

mod events;
mod input;
mod loop_runner;
mod render;
mod status;
mod suggestions;

pub use loop_runner::{run, Action};
