//! SQLite-backed content store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{ContentStore, StoreError};
use crate::content::Content;

/// SQLite-backed content store.
///
/// Each record is kept as a JSON document with a few indexed columns next
/// to it; episode keys are mirrored into `content_episodes` for season
/// queries.
pub struct SqliteContentStore {
    conn: Mutex<Connection>,
}

impl SqliteContentStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS content (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                num_seasons INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                document TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_content_slug ON content(slug);
            CREATE INDEX IF NOT EXISTS idx_content_kind ON content(kind);

            CREATE TABLE IF NOT EXISTS content_episodes (
                content_id TEXT NOT NULL REFERENCES content(id) ON DELETE CASCADE,
                season INTEGER NOT NULL,
                episode INTEGER NOT NULL,
                PRIMARY KEY (content_id, season, episode)
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }
}

impl ContentStore for SqliteContentStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Content>, StoreError> {
        let conn = self.conn()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM content WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        document
            .map(|doc| {
                serde_json::from_str(&doc).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    fn upsert(&self, id: &str, content: &Content) -> Result<Content, StoreError> {
        if content.id() != id {
            return Err(StoreError::IdMismatch {
                expected: id.to_string(),
                actual: content.id().to_string(),
            });
        }

        let mut stored = content.clone();
        if let Content::Show(show) = &mut stored {
            show.recount_seasons();
        }
        let num_seasons = match &stored {
            Content::Show(show) => show.num_seasons,
            Content::Movie(_) => 0,
        };
        let document =
            serde_json::to_string(&stored).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let info = stored.info();
        tx.execute(
            "INSERT INTO content (id, kind, slug, title, num_seasons, updated_at, document)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                slug = excluded.slug,
                title = excluded.title,
                num_seasons = excluded.num_seasons,
                updated_at = excluded.updated_at,
                document = excluded.document",
            params![
                id,
                info.kind.as_str(),
                info.slug,
                info.title,
                num_seasons,
                Utc::now().to_rfc3339(),
                document
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "DELETE FROM content_episodes WHERE content_id = ?",
            params![id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        if let Content::Show(show) = &stored {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO content_episodes (content_id, season, episode)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;
            for episode in &show.episodes {
                stmt.execute(params![id, episode.season, episode.episode])
                    .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(stored)
    }

    fn distinct_seasons(&self, id: &str) -> Result<Vec<u32>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT season FROM content_episodes
                 WHERE content_id = ? ORDER BY season",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![id], |row| row.get::<_, u32>(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut seasons = Vec::new();
        for row in rows {
            seasons.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(seasons)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get::<_, i64>(0))
            .map(|n| n.max(0) as u64)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
