//! arXiv paper lookup: identifier extraction, Atom feed normalization,
//! a remote query client and a debounced suggestion engine, plus the
//! note writer and terminal UI built on them.

pub mod app;
pub mod config;
pub mod feed;
pub mod note;
pub mod suggest;
pub mod ui;
pub mod util;
