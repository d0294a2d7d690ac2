//! Persistence layer for the verse collection, split across one submodule per
//! backing strategy. Both strategies expose the same trait so the TUI never
//! cares whether records live in a flat YAML document or a SQLite table.

use std::error::Error as StdError;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use thiserror::Error;

use crate::models::Verse;

mod sqlite;
mod yaml;

pub use sqlite::SqliteStore;
pub use yaml::YamlStore;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".verse-keeper";
/// YAML document name for the bulk-document strategy.
const YAML_FILE_NAME: &str = "verses.yaml";
/// SQLite file name for the row-addressed strategy.
const DB_FILE_NAME: &str = "verses.sqlite";
/// Environment variable selecting the backend. This is the only
/// environment-driven behavior in the crate.
const BACKEND_ENV: &str = "VERSE_BACKEND";

/// Failures surfaced by either backend. The variants map onto the HTTP-style
/// split the store contract promises: `Validation` is the 4xx-equivalent
/// (bad addressing information, nothing written), `Persistence` the
/// 5xx-equivalent, and `Parse` an unrecoverable load failure with no
/// partial-list recovery.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or unknown addressing information, e.g. an update without an
    /// id. The backing store is guaranteed untouched.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The backing document could not be parsed into a verse list.
    #[error("malformed verse document: {0}")]
    Parse(String),
    /// The backend read or write itself failed. The caller decides whether to
    /// retry; the store never retries internally.
    #[error("persistence failure")]
    Persistence(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(Box::new(err))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Persistence(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The two interchangeable backing strategies behind one contract.
///
/// `create` and `update` take ownership of the candidate record, fill in the
/// normalized-verse cache when it is missing, and echo the persisted record
/// (with its assigned id) so callers can refresh in-memory state without a
/// reload. Field-level validation (non-empty first citation, verse, and
/// translation) is the caller's job; the store only validates addressing.
pub trait VerseStore {
    /// Read the full ordered collection. Side-effect-free: repairing records
    /// is the job of [`VerseStore::backfill`], never of a load.
    fn load(&mut self) -> StoreResult<Vec<Verse>>;

    /// Persist a new record, assigning it an identifier.
    fn create(&mut self, verse: Verse) -> StoreResult<Verse>;

    /// Replace the record whose id matches `verse.id`. Fails with
    /// [`StoreError::Validation`] when the id is absent or unknown, in which
    /// case nothing is written.
    fn update(&mut self, verse: Verse) -> StoreResult<Verse>;

    /// Deliberate migration pass: fill in missing `normalizedVerse` caches
    /// (and, for the document strategy, missing ids) and persist the repairs.
    /// Returns how many records changed.
    fn backfill(&mut self) -> StoreResult<usize>;
}

/// Open the backend selected by the `VERSE_BACKEND` environment variable:
/// `table` or `sqlite` picks the row-addressed SQLite store, anything else
/// (including unset) the YAML document in the data directory.
pub fn open_default_store() -> Result<Box<dyn VerseStore>> {
    let backend = std::env::var(BACKEND_ENV).unwrap_or_default();
    match backend.trim().to_lowercase().as_str() {
        "table" | "sqlite" => {
            let store = SqliteStore::open(data_dir()?.join(DB_FILE_NAME))
                .context("failed to open the verse table")?;
            Ok(Box::new(store))
        }
        _ => Ok(Box::new(YamlStore::new(data_dir()?.join(YAML_FILE_NAME)))),
    }
}

/// Resolve the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
