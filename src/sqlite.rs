//! SQLite-backed catalog.
//!
//! Phonetic codes are stored beside each title and indexed. The matching
//! functions are registered on the connection as `dmetaphone(text)`,
//! `strict_similarity(a, b)` and `strict_match(a, b, threshold)`, so
//! refinement runs as one SQL filter.

use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::StoreError;
use crate::models::{CandidateSummary, CatalogEntry, EntryId, Resource};
use crate::phonetic::DoubleMetaphone;
use crate::similarity::{reaches_threshold, strict_similarity_opt};
use crate::store::{BatchFetch, PhoneticLookup, SimilarityProbe, SimilarityQuery};

/// Ids bound per statement.
pub const SQL_CHUNK_SIZE: usize = 500;

const SCHEMA: &str = "
    PRAGMA synchronous = NORMAL;
    PRAGMA cache_size = -64000;
    PRAGMA temp_store = MEMORY;

    CREATE TABLE IF NOT EXISTS datasets (
        id TEXT PRIMARY KEY,
        title TEXT,
        notes TEXT,
        original_name TEXT,
        duplicate_score REAL NOT NULL DEFAULT 1.0,
        extras TEXT NOT NULL DEFAULT '{}',
        title_phonetic TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_datasets_title_phonetic ON datasets(title_phonetic);

    CREATE TABLE IF NOT EXISTS resources (
        dataset_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        format TEXT,
        PRIMARY KEY (dataset_id, position)
    );

    CREATE TABLE IF NOT EXISTS catalog_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );";

const ENTRY_COLUMNS: &str = "id, title, notes, original_name, duplicate_score, extras";

type EntryRow = (String, Option<String>, Option<String>, Option<String>, f64, String);

pub struct SqliteCatalog {
    conn: Connection,
    encoder: DoubleMetaphone,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_encoder(path, DoubleMetaphone::default())
    }

    pub fn open_with_encoder(path: &Path, encoder: DoubleMetaphone) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn, encoder)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, DoubleMetaphone::default())
    }

    fn init(conn: Connection, encoder: DoubleMetaphone) -> Result<Self, StoreError> {
        register_functions(&conn, encoder)?;
        conn.execute_batch(SCHEMA)?;
        let catalog = Self { conn, encoder };
        catalog.sync_phonetic_codes()?;
        Ok(catalog)
    }

    /// Re-encode stored titles when the catalog was built with a different
    /// code length than this connection uses.
    fn sync_phonetic_codes(&self) -> Result<(), StoreError> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM catalog_meta WHERE key = 'phonetic_code_len'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let current = self.encoder.max_len().to_string();
        if stored.as_deref() == Some(current.as_str()) {
            return Ok(());
        }
        let updated = self.conn.execute(
            "UPDATE datasets SET title_phonetic = COALESCE(dmetaphone(title), '')",
            [],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO catalog_meta (key, value) VALUES ('phonetic_code_len', ?1)",
            [&current],
        )?;
        if updated > 0 {
            tracing::info!(updated, code_len = self.encoder.max_len(), "re-encoded phonetic codes");
        }
        Ok(())
    }

    /// Insert or replace entries in one transaction.
    pub fn insert_entries(&mut self, entries: &[CatalogEntry]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut clear = tx.prepare_cached("DELETE FROM resources WHERE dataset_id = ?1")?;
            let mut insert = tx.prepare_cached(
                "INSERT OR REPLACE INTO datasets
                    (id, title, notes, original_name, duplicate_score, extras, title_phonetic)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(dmetaphone(?2), ''))",
            )?;
            let mut resource = tx.prepare_cached(
                "INSERT INTO resources (dataset_id, position, format) VALUES (?1, ?2, ?3)",
            )?;

            for entry in entries {
                let extras = serde_json::to_string(&entry.extras)?;
                clear.execute(params![entry.id])?;
                insert.execute(params![
                    entry.id,
                    entry.title,
                    entry.notes,
                    entry.original_name,
                    entry.duplicate_score,
                    extras,
                ])?;
                for (position, r) in entry.resources.iter().enumerate() {
                    resource.execute(params![entry.id, position as i64, r.format])?;
                }
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    pub fn entry(&self, id: &str) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(self.by_ids(&[id.to_string()])?.into_iter().next())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM datasets", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Every entry, ordered by id.
    pub fn all_entries(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let sql = format!("SELECT {} FROM datasets ORDER BY id", ENTRY_COLUMNS);
        let mut entries = self.read_entries(&sql, &[])?;
        let mut resources = self.read_resources(
            "SELECT dataset_id, format FROM resources ORDER BY dataset_id, position",
            &[],
        )?;
        for entry in &mut entries {
            entry.resources = resources.remove(&entry.id).unwrap_or_default();
        }
        Ok(entries)
    }

    pub fn optimize(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("ANALYZE;")?;
        Ok(())
    }

    fn read_entries(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| -> rusqlite::Result<EntryRow> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, title, notes, original_name, duplicate_score, extras) = row?;
            entries.push(CatalogEntry {
                id,
                title,
                notes,
                original_name,
                resources: Vec::new(),
                duplicate_score,
                extras: serde_json::from_str(&extras)?,
            });
        }
        Ok(entries)
    }

    fn read_resources(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<FxHashMap<EntryId, Vec<Resource>>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut by_entry: FxHashMap<EntryId, Vec<Resource>> = FxHashMap::default();
        for row in rows {
            let (id, format) = row?;
            by_entry.entry(id).or_default().push(Resource { format });
        }
        Ok(by_entry)
    }

    fn summaries_for_chunk(
        &self,
        chunk: &[&EntryId],
        probe: &SimilarityProbe<'_>,
    ) -> Result<Vec<CandidateSummary>, StoreError> {
        let sql = format!(
            "WITH matched AS (
                 SELECT id FROM datasets
                 WHERE id IN ({}) AND id <> ?1
                   AND strict_match(title, ?2, ?5)
                   AND strict_match(notes, ?3, ?5)
                   AND strict_match(original_name, ?4, ?5)
             )
             SELECT m.id, r.position, r.format
             FROM matched m LEFT JOIN resources r ON r.dataset_id = m.id
             ORDER BY m.id, r.position",
            placeholders(6, chunk.len())
        );

        let mut params: Vec<&dyn ToSql> = vec![
            &probe.exclude,
            &probe.title,
            &probe.notes,
            &probe.original_name,
            &probe.threshold,
        ];
        for id in chunk {
            params.push(*id);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut summaries: Vec<CandidateSummary> = Vec::new();
        for row in rows {
            let (id, position, format) = row?;
            if summaries.last().map_or(true, |last| last.id != id) {
                summaries.push(CandidateSummary {
                    id,
                    resource_count: 0,
                    resource_formats: Vec::new(),
                });
            }
            // position is NULL when the candidate has no resources
            if let (Some(summary), Some(_)) = (summaries.last_mut(), position) {
                summary.resource_count += 1;
                summary.resource_formats.push(format.unwrap_or_default());
            }
        }
        Ok(summaries)
    }
}

impl PhoneticLookup for SqliteCatalog {
    fn by_phonetic_code(&self, title: &str) -> Result<Vec<EntryId>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id FROM datasets
             WHERE title_phonetic = dmetaphone(?1) AND title_phonetic <> ''
             ORDER BY id",
        )?;
        let ids = stmt
            .query_map([title], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<EntryId>>>()?;
        Ok(ids)
    }
}

impl SimilarityQuery for SqliteCatalog {
    fn by_ids_with_similarity(
        &self,
        ids: &BTreeSet<EntryId>,
        probe: &SimilarityProbe<'_>,
    ) -> Result<Vec<CandidateSummary>, StoreError> {
        let ids: Vec<&EntryId> = ids.iter().collect();
        let mut summaries = Vec::new();
        for chunk in ids.chunks(SQL_CHUNK_SIZE) {
            summaries.extend(self.summaries_for_chunk(chunk, probe)?);
        }
        Ok(summaries)
    }
}

impl BatchFetch for SqliteCatalog {
    fn by_ids(&self, ids: &[EntryId]) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut entries = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(SQL_CHUNK_SIZE) {
            let params: Vec<&dyn ToSql> = chunk.iter().map(|id| id as &dyn ToSql).collect();
            let marks = placeholders(1, chunk.len());

            let sql = format!("SELECT {} FROM datasets WHERE id IN ({})", ENTRY_COLUMNS, marks);
            let mut fetched = self.read_entries(&sql, &params)?;

            let sql = format!(
                "SELECT dataset_id, format FROM resources
                 WHERE dataset_id IN ({}) ORDER BY dataset_id, position",
                marks
            );
            let mut resources = self.read_resources(&sql, &params)?;
            for entry in &mut fetched {
                entry.resources = resources.remove(&entry.id).unwrap_or_default();
            }
            entries.extend(fetched);
        }
        Ok(entries)
    }
}

/// `?start, ?start+1, ...` for `n` parameters.
fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn register_functions(conn: &Connection, encoder: DoubleMetaphone) -> Result<(), StoreError> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("dmetaphone", 1, flags, move |ctx| {
        let text: Option<String> = ctx.get(0)?;
        Ok(text.map(|t| encoder.primary(&t)))
    })?;

    conn.create_scalar_function("strict_similarity", 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(strict_similarity_opt(a.as_deref(), b.as_deref()))
    })?;

    conn.create_scalar_function("strict_match", 3, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        let threshold: f64 = ctx.get(2)?;
        Ok(reaches_threshold(a.as_deref(), b.as_deref(), threshold))
    })?;

    Ok(())
}
