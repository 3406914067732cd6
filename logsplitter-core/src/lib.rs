//! # logsplitter-core
//!
//! Client-side data-sync and permission-gating layer for the LogSplitter
//! REST API.
//!
//! This library provides:
//! - An authenticated API client that normalizes every response into one envelope
//! - An auth/permissions context answering feature and usage-limit questions
//! - One store per resource (uploads, search, analytics, API keys, webhooks,
//!   profile, dashboard, billing) that keeps local state in sync with the server
//! - Configuration and logging infrastructure
//!
//! Log parsing, grouping, analytics aggregation, billing and webhook delivery
//! all happen server-side; this crate only consumes them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logsplitter_core::identity::StaticIdentity;
//! use logsplitter_core::{Config, LogSplitter};
//!
//! # async fn run() -> logsplitter_core::Result<()> {
//! let config = Config::load()?;
//! let identity = Arc::new(StaticIdentity::from_config(&config.identity));
//! let client = LogSplitter::connect(&config, identity).await?;
//!
//! let uploads = client.uploads();
//! uploads.ensure_loaded().await;
//! for upload in uploads.state().uploads.items {
//!     println!("{} ({} lines)", upload.filename, upload.total_lines);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use client::LogSplitter;
pub use config::Config;
pub use error::{Error, Result};
pub use store::Outcome;
pub use types::*;

// Public modules
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod identity;
pub mod logging;
pub mod store;
pub mod types;
pub mod validation;
