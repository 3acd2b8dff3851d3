//! # LunaTransfer
//!
//! Authorization, session and sharing engine for a self-hosted file-transfer
//! service, usable as a library behind any HTTP front end or through the
//! bundled `lunatransfer` administration binary.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! lunatransfer = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lunatransfer::auth::RequireSession;
//! use lunatransfer::config::CoreConfig;
//! use lunatransfer::engine::Engine;
//!
//! let config = CoreConfig::load(None)?;
//! let engine = Arc::new(Engine::open(&config)?);
//!
//! async fn download(RequireSession(actor): RequireSession) {
//!     // engine.files().has_file_access(&actor.username, path)
//! }
//! let router = axum::Router::new()
//!     .route("/files/{*path}", axum::routing::get(download))
//!     .with_state(engine);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

pub mod access;
pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;
