//! Durable "last viewed" cursor. The slot is deliberately modeled as an
//! injected trait instead of a global so the navigation logic can be tested
//! against an in-memory implementation, and so a failed write never takes the
//! application down: remembering the reading position is best-effort.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::store::data_dir;

/// File name holding the last viewed index inside the data directory.
const CURSOR_FILE_NAME: &str = "last-viewed";

/// A device-scoped slot remembering the index of the last viewed verse.
/// Read once at startup; written on every successful navigation step.
pub trait CursorSlot {
    /// The stored index, if one exists and is readable. Bounds checking is
    /// the caller's job since only the caller knows the list length.
    fn read(&self) -> Option<usize>;

    /// Store a new index. Must not fail the caller: implementations swallow
    /// their own errors.
    fn write(&mut self, index: usize);
}

/// Cursor slot persisted as a tiny text file in the application data
/// directory.
pub struct FileCursorSlot {
    path: PathBuf,
}

impl FileCursorSlot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Slot at the conventional location next to the verse data.
    pub fn in_data_dir() -> Result<Self> {
        Ok(Self::new(data_dir()?.join(CURSOR_FILE_NAME)))
    }
}

impl CursorSlot for FileCursorSlot {
    fn read(&self) -> Option<usize> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    fn write(&mut self, index: usize) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(&self.path, index.to_string());
    }
}

/// In-memory slot for tests and headless use. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCursorSlot {
    value: Option<usize>,
}

impl MemoryCursorSlot {
    pub fn with_value(value: usize) -> Self {
        Self { value: Some(value) }
    }
}

impl CursorSlot for MemoryCursorSlot {
    fn read(&self) -> Option<usize> {
        self.value
    }

    fn write(&mut self, index: usize) {
        self.value = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_slot_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let mut slot = FileCursorSlot::new(dir.path().join("last-viewed"));
        assert_eq!(slot.read(), None);

        slot.write(7);
        assert_eq!(slot.read(), Some(7));

        slot.write(0);
        assert_eq!(slot.read(), Some(0));
    }

    #[test]
    fn file_slot_creates_missing_directories() {
        let dir = TempDir::new().expect("tempdir");
        let mut slot = FileCursorSlot::new(dir.path().join("nested").join("last-viewed"));
        slot.write(3);
        assert_eq!(slot.read(), Some(3));
    }

    #[test]
    fn garbage_content_reads_as_absent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("last-viewed");
        fs::write(&path, "not a number").expect("write");
        let slot = FileCursorSlot::new(path);
        assert_eq!(slot.read(), None);
    }

    #[test]
    fn memory_slot_round_trips() {
        let mut slot = MemoryCursorSlot::default();
        assert_eq!(slot.read(), None);
        slot.write(12);
        assert_eq!(slot.read(), Some(12));
    }
}
