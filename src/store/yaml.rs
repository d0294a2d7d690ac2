//! Bulk-document strategy: the entire collection is one YAML sequence that is
//! read in full and replaced in full on every mutation. There is no partial
//! write path; a mutation either produces a complete new document or leaves
//! the old one in place.

use std::fs;
use std::path::PathBuf;

use crate::models::Verse;

use super::{StoreError, StoreResult, VerseStore};

/// Verse store backed by a single YAML document on disk.
///
/// Updates are addressed by record id rather than list position. Ids are
/// assigned locally on create (and by [`YamlStore::backfill`] for legacy
/// records), so a concurrent reorder of the document between load and save
/// cannot silently retarget an update.
pub struct YamlStore {
    path: PathBuf,
}

impl YamlStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse the whole document. A missing file is an empty collection, not
    /// an error, so first runs work without a seed step.
    fn read_document(&self) -> StoreResult<Vec<Verse>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml::from_str(&text).map_err(|err| StoreError::Parse(err.to_string()))
    }

    /// Serialize and replace the document wholesale. The write goes to a
    /// sibling temp file first and is renamed over the target, so a crash
    /// mid-write cannot leave a truncated document behind.
    fn write_document(&self, verses: &[Verse]) -> StoreResult<()> {
        let text = serde_yaml::to_string(verses)
            .map_err(|err| StoreError::Persistence(Box::new(err)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("yaml.tmp");
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Smallest id not yet taken. Ids are locally generated and never reused
    /// within a document, but they only need to be unique, not dense.
    fn next_id(verses: &[Verse]) -> i64 {
        verses
            .iter()
            .filter_map(|verse| verse.id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl VerseStore for YamlStore {
    fn load(&mut self) -> StoreResult<Vec<Verse>> {
        self.read_document()
    }

    fn create(&mut self, mut verse: Verse) -> StoreResult<Verse> {
        let mut verses = self.read_document()?;
        verse.id = Some(Self::next_id(&verses));
        verse.ensure_normalized();
        verses.push(verse.clone());
        self.write_document(&verses)?;
        Ok(verse)
    }

    fn update(&mut self, mut verse: Verse) -> StoreResult<Verse> {
        let id = verse
            .id
            .ok_or_else(|| StoreError::Validation("update requires a verse id".to_string()))?;

        let mut verses = self.read_document()?;
        let position = verses
            .iter()
            .position(|existing| existing.id == Some(id))
            .ok_or_else(|| StoreError::Validation(format!("no verse with id {id}")))?;

        verse.ensure_normalized();
        verses[position] = verse.clone();
        self.write_document(&verses)?;
        Ok(verse)
    }

    fn backfill(&mut self) -> StoreResult<usize> {
        let mut verses = self.read_document()?;
        let mut next_id = Self::next_id(&verses);
        let mut repaired = 0;

        for verse in &mut verses {
            let mut changed = verse.ensure_normalized();
            if verse.id.is_none() {
                verse.id = Some(next_id);
                next_id += 1;
                changed = true;
            }
            if changed {
                repaired += 1;
            }
        }

        if repaired > 0 {
            self.write_document(&verses)?;
        }
        Ok(repaired)
    }
}
