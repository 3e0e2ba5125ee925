//! # Profanity Capture
//!
//! A web page capture service that redacts profane words before anything is
//! persisted. A shared headless Chrome renders the page; profanity is masked
//! in the live DOM (length-preserving, word-boundary-safe); the redacted page
//! is then snapshotted as a self-contained MHTML archive plus a full-page
//! screenshot, and profanity statistics are computed from the original
//! rendered text.
//!
//! ## Pipeline
//!
//! ```text
//! link -> validity probe -> navigate -> extract text -> stats (original)
//!      -> extract markup -> redact -> re-apply to live DOM
//!      -> MHTML snapshot -> screenshot -> artifact store
//! ```
//!
//! Every capture gets its own isolated page on the shared browser; pages are
//! closed on all exit paths and failed captures leave no partial artifacts.
//! Stored artifacts expire after a configurable retention window.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use profanity_capture::{CaptureRequest, CaptureService, Config, Dictionary, Metrics};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let dictionary = Dictionary::load(&config.dictionary_path).await?;
//!     let service = CaptureService::new(config, dictionary, Arc::new(Metrics::new())).await?;
//!
//!     let outcome = service
//!         .capture(CaptureRequest::new("https://example.com", "clone"))
//!         .await?;
//!     println!(
//!         "{} words, {}% profane",
//!         outcome.stats.word_count, outcome.stats.profanity_makeup
//!     );
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run the HTTP service
//! profanity-capture serve
//!
//! # One-shot capture
//! profanity-capture capture --url https://example.com --id clone
//! ```

/// Configuration and request types
pub mod config;

/// Error types and the capture circuit breaker
pub mod error;

/// Prohibited-word dictionary loading
pub mod dictionary;

/// Length-preserving profanity redaction
pub mod redaction;

/// Profanity statistics over rendered text
pub mod stats;

/// Shared browser session and per-request pages
pub mod browser;

/// Capture pipeline orchestration
pub mod service;

/// Artifact persistence and retention sweep
pub mod store;

/// URL reachability probe
pub mod probe;

/// HTTP surface over the pipeline
pub mod server;

/// Command-line interface implementation
pub mod cli;

/// Performance metrics collection
pub mod metrics;

/// Utility functions and helpers
pub mod utils;

#[cfg(test)]
mod tests;

pub use browser::*;
pub use cli::*;
pub use config::*;
pub use dictionary::*;
pub use error::*;
pub use metrics::*;
pub use probe::*;
pub use redaction::*;
pub use service::*;
pub use stats::*;
pub use store::*;
pub use utils::*;
