use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{ScrapeLogEntry, ScrapeLogError, ScrapeLogFilter, ScrapeLogStore};

/// SQLite-backed scrape log
pub struct SqliteScrapeLogStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS scrape_errors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        run_id TEXT NOT NULL,
        source TEXT NOT NULL,
        slug TEXT,
        kind TEXT NOT NULL,
        message TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_scrape_errors_timestamp ON scrape_errors(timestamp);
    CREATE INDEX IF NOT EXISTS idx_scrape_errors_run_id ON scrape_errors(run_id);
    CREATE INDEX IF NOT EXISTS idx_scrape_errors_source ON scrape_errors(source);
"#;

impl SqliteScrapeLogStore {
    /// Open (or create) the log tables in the database file
    pub fn new(path: &Path) -> Result<Self, ScrapeLogError> {
        let conn = Connection::open(path).map_err(|e| ScrapeLogError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ScrapeLogError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory log (useful for testing)
    pub fn in_memory() -> Result<Self, ScrapeLogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ScrapeLogError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ScrapeLogError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ScrapeLogError> {
        self.conn
            .lock()
            .map_err(|_| ScrapeLogError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &ScrapeLogFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref run_id) = filter.run_id {
            conditions.push("run_id = ?");
            params.push(Box::new(run_id.clone()));
        }

        if let Some(ref source) = filter.source {
            conditions.push("source = ?");
            params.push(Box::new(source.clone()));
        }

        if let Some(ref kind) = filter.kind {
            conditions.push("kind = ?");
            params.push(Box::new(kind.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl ScrapeLogStore for SqliteScrapeLogStore {
    fn insert(&self, entry: &ScrapeLogEntry) -> Result<i64, ScrapeLogError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO scrape_errors (timestamp, run_id, source, slug, kind, message) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.timestamp.to_rfc3339(),
                entry.run_id,
                entry.source,
                entry.slug,
                entry.kind,
                entry.message,
            ],
        )
        .map_err(|e| ScrapeLogError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &ScrapeLogFilter) -> Result<Vec<ScrapeLogEntry>, ScrapeLogError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "SELECT id, timestamp, run_id, source, slug, kind, message FROM scrape_errors {} ORDER BY id DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ScrapeLogError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(|e| ScrapeLogError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, timestamp, run_id, source, slug, kind, message) =
                row.map_err(|e| ScrapeLogError::Database(e.to_string()))?;
            let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| ScrapeLogError::Database(format!("Invalid timestamp: {}", e)))?
                .into();
            entries.push(ScrapeLogEntry {
                id,
                timestamp,
                run_id,
                source,
                slug,
                kind,
                message,
            });
        }

        Ok(entries)
    }

    fn count(&self, filter: &ScrapeLogFilter) -> Result<i64, ScrapeLogError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM scrape_errors {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ScrapeLogError::Database(e.to_string()))
    }
}
