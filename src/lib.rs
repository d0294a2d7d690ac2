//! Core library surface for the verse-keeper TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the verse model, the text normalizer, the two persistence
//! backends, and the interactive application itself.
pub mod models;
pub mod normalize;
pub mod session;
pub mod store;
pub mod ui;

/// The sole domain type that every layer manipulates.
pub use models::Verse;

/// Canonical text normalization for diacritic-insensitive search.
pub use normalize::normalize;

/// Durable "last viewed" cursor slot and its file-backed implementation.
pub use session::{CursorSlot, FileCursorSlot};

/// Persistence layer: the store contract, its two backends, and the
/// environment-driven backend selection used by `main.rs`.
pub use store::{open_default_store, SqliteStore, StoreError, VerseStore, YamlStore};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
