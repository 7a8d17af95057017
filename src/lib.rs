//! teller - terminal explorer for blockchain indexer APIs
//!
//! Pulls complete result sets from paginated Hiro, ord and Blockscout
//! endpoints, then browses, sorts, drills into and exports them in a TUI.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod keymap;
pub mod project;
pub mod store;
pub mod tui;
pub mod ui;

// Re-export commonly used types
pub use app::{Browser, Command, Event, ViewMode};
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{CancelToken, FetchOptions, FetchResult, Fetcher};
