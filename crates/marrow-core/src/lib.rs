//! marrow-core library.
//!
//! Data model, SQLite store, and the mutation engine behind the `mw`
//! binary. The store handle is always an explicit [`rusqlite::Connection`]
//! passed in by the caller; nothing here holds global state.
//!
//! # Conventions
//!
//! - Engine mutations return [`error::EngineError`] so callers can react
//!   to conflicts and missing rows; store-open and query paths use
//!   [`anyhow::Result`] with context instead.
//! - Non-critical degradation (a corrupt store, a skipped import line) is
//!   reported through the `tracing` macros, never by panicking.
//! - Timestamps are i64 microseconds since the Unix epoch, column-suffixed
//!   `_us`.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
