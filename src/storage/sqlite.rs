use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::debug;

use super::Storage;
use crate::error::Result;
use crate::normalize::JobRecord;

/// SQLite-backed job store. One connection per invocation; each
/// `insert_jobs` call runs inside its own transaction.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS jobs (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                title     TEXT NOT NULL,
                salary    REAL NOT NULL,
                currency  TEXT NOT NULL,
                country   TEXT NOT NULL,
                seniority TEXT NOT NULL,
                stack     TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn insert_jobs(&self, records: &[JobRecord]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO jobs (title, salary, currency, country, seniority, stack)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.title,
                    record.salary,
                    record.currency,
                    record.country,
                    record.seniority,
                    record.stack,
                ])?;
            }
        }
        tx.commit()?;

        debug!("committed batch of {} job records", records.len());
        Ok(())
    }

    async fn count_jobs(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, salary: f64) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            salary,
            currency: "USD".to_string(),
            country: "BR".to_string(),
            seniority: "Senior".to_string(),
            stack: "Rust".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_count_roundtrip() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.count_jobs().await.unwrap(), 0);

        storage
            .insert_jobs(&[record("Dev", 1000.0), record("Ops", 2000.0)])
            .await
            .unwrap();
        storage.insert_jobs(&[record("QA", 1500.0)]).await.unwrap();

        assert_eq!(storage.count_jobs().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/store/jobs.db");
        let storage = SqliteStorage::open(&path).unwrap();
        storage.insert_jobs(&[record("Dev", 1.0)]).await.unwrap();
        assert!(path.exists());
    }
}
