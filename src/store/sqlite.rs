//! Row-addressed strategy: each verse is one row in a `verses` table and
//! mutations touch exactly one row. The list-valued fields (`numbers`,
//! `insights`) are stored as JSON text so the column set matches the document
//! format field for field.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::models::Verse;

use super::{StoreError, StoreResult, VerseStore};

/// Verse store backed by an embedded SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Wrap an existing connection. Tests use this with an in-memory
    /// database so no filesystem state is involved.
    pub fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS verses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                numbers TEXT NOT NULL,
                link TEXT,
                verse TEXT NOT NULL,
                normalizedVerse TEXT,
                translation TEXT NOT NULL,
                insights TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    fn row_to_verse(
        id: i64,
        numbers: String,
        link: Option<String>,
        verse: String,
        normalized_verse: Option<String>,
        translation: String,
        insights: String,
    ) -> StoreResult<Verse> {
        let numbers: Vec<String> = serde_json::from_str(&numbers)
            .map_err(|err| StoreError::Parse(format!("numbers column for id {id}: {err}")))?;
        let insights: Vec<String> = serde_json::from_str(&insights)
            .map_err(|err| StoreError::Parse(format!("insights column for id {id}: {err}")))?;
        Ok(Verse {
            id: Some(id),
            numbers,
            link,
            verse,
            normalized_verse,
            translation,
            insights,
        })
    }

    fn encode_list(list: &[String]) -> StoreResult<String> {
        serde_json::to_string(list).map_err(|err| StoreError::Persistence(Box::new(err)))
    }
}

impl VerseStore for SqliteStore {
    fn load(&mut self) -> StoreResult<Vec<Verse>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, numbers, link, verse, normalizedVerse, translation, insights
             FROM verses
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, numbers, link, verse, normalized, translation, insights)| {
                Self::row_to_verse(id, numbers, link, verse, normalized, translation, insights)
            })
            .collect()
    }

    fn create(&mut self, mut verse: Verse) -> StoreResult<Verse> {
        verse.ensure_normalized();
        self.conn.execute(
            "INSERT INTO verses (numbers, link, verse, normalizedVerse, translation, insights)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Self::encode_list(&verse.numbers)?,
                verse.link,
                verse.verse,
                verse.normalized_verse,
                verse.translation,
                Self::encode_list(&verse.insights)?,
            ],
        )?;
        verse.id = Some(self.conn.last_insert_rowid());
        Ok(verse)
    }

    fn update(&mut self, mut verse: Verse) -> StoreResult<Verse> {
        let id = verse
            .id
            .ok_or_else(|| StoreError::Validation("update requires a verse id".to_string()))?;

        verse.ensure_normalized();
        let updated = self.conn.execute(
            "UPDATE verses
             SET numbers = ?1, link = ?2, verse = ?3, normalizedVerse = ?4,
                 translation = ?5, insights = ?6
             WHERE id = ?7",
            params![
                Self::encode_list(&verse.numbers)?,
                verse.link,
                verse.verse,
                verse.normalized_verse,
                verse.translation,
                Self::encode_list(&verse.insights)?,
                id,
            ],
        )?;

        if updated == 0 {
            Err(StoreError::Validation(format!("no verse with id {id}")))
        } else {
            Ok(verse)
        }
    }

    fn backfill(&mut self) -> StoreResult<usize> {
        let mut stmt = self.conn.prepare(
            "SELECT id, verse FROM verses
             WHERE (normalizedVerse IS NULL OR normalizedVerse = '') AND verse <> ''
             ORDER BY id ASC",
        )?;
        let pending = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        for (id, verse) in &pending {
            self.conn.execute(
                "UPDATE verses SET normalizedVerse = ?1 WHERE id = ?2",
                params![crate::normalize::normalize(verse), id],
            )?;
        }
        Ok(pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> SqliteStore {
        let conn = Connection::open_in_memory().expect("in-memory db");
        SqliteStore::with_connection(conn).expect("schema")
    }

    fn candidate(number: &str) -> Verse {
        Verse {
            id: None,
            numbers: vec![number.to_string()],
            link: Some("https://example.org".to_string()),
            verse: "paritrāṇāya sādhūnām".to_string(),
            normalized_verse: None,
            translation: "To deliver the pious".to_string(),
            insights: vec!["Spoken in chapter four".to_string()],
        }
    }

    #[test]
    fn create_assigns_id_and_normalizes() {
        let mut store = memory_store();
        let created = store.create(candidate("BG 4.8")).expect("create");
        assert_eq!(created.id, Some(1));
        assert_eq!(
            created.normalized_verse.as_deref(),
            Some("paritranaya sadhunam")
        );
    }

    #[test]
    fn load_returns_rows_ascending_by_id() {
        let mut store = memory_store();
        store.create(candidate("BG 4.8")).expect("create");
        store.create(candidate("BG 4.7")).expect("create");
        store.create(candidate("BG 2.7")).expect("create");

        let loaded = store.load().expect("load");
        let ids: Vec<_> = loaded.iter().map(|verse| verse.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(loaded[2].numbers, vec!["BG 2.7".to_string()]);
    }

    #[test]
    fn list_fields_round_trip_through_json_columns() {
        let mut store = memory_store();
        let mut verse = candidate("BG 2.7");
        verse.numbers.push("Gītā 2.7".to_string());
        verse.insights.push("A second note".to_string());
        let created = store.create(verse).expect("create");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, vec![created]);
    }

    #[test]
    fn update_without_id_fails_and_writes_nothing() {
        let mut store = memory_store();
        store.create(candidate("BG 4.8")).expect("create");

        let err = store.update(candidate("BG 9.9")).expect_err("must fail");
        assert!(matches!(err, StoreError::Validation(_)));

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].numbers, vec!["BG 4.8".to_string()]);
    }

    #[test]
    fn update_with_unknown_id_fails() {
        let mut store = memory_store();
        store.create(candidate("BG 4.8")).expect("create");

        let mut missing = candidate("BG 9.9");
        missing.id = Some(99);
        let err = store.update(missing).expect_err("must fail");
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn update_replaces_single_row() {
        let mut store = memory_store();
        store.create(candidate("BG 4.7")).expect("create");
        let mut target = store.create(candidate("BG 4.8")).expect("create");

        target.translation = "revised".to_string();
        store.update(target).expect("update");

        let loaded = store.load().expect("load");
        assert_eq!(loaded[0].translation, "To deliver the pious");
        assert_eq!(loaded[1].translation, "revised");
    }

    #[test]
    fn backfill_fills_missing_normalized_rows() {
        let mut store = memory_store();
        store
            .conn
            .execute(
                "INSERT INTO verses (numbers, verse, translation, insights)
                 VALUES ('[\"BG 2.7\"]', 'kārpaṇya-doṣopahata', 'Now I am confused', '[]')",
                [],
            )
            .expect("raw insert");

        assert_eq!(store.backfill().expect("backfill"), 1);
        let loaded = store.load().expect("load");
        assert_eq!(
            loaded[0].normalized_verse.as_deref(),
            Some("karpanya dosopahata")
        );

        assert_eq!(store.backfill().expect("backfill"), 0);
    }
}
