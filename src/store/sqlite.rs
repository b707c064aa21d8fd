use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{UserRecord, UserSummary};

use super::{StoreError, UserStore, BLOCK_THRESHOLD};

/// SQLite-backed user store.
///
/// A single `Mutex<Connection>` serializes every operation, which also
/// linearizes the per-id read-modify-write in `record_attempt`.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories for file-backed databases
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT,
                registration TEXT NOT NULL,
                blocked INTEGER NOT NULL DEFAULT 0,
                attempts INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn now() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl UserStore for SqliteUserStore {
    fn get(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.query_row(
            "SELECT id, username, registration, blocked, attempts FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    registered_at: row.get(2)?,
                    blocked: row.get::<_, i64>(3)? != 0,
                    attempts: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn upsert_registered(&self, id: i64, username: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO users (id, username, registration, blocked, attempts)
             VALUES (?1, ?2, ?3, 0, 0)",
            params![id, username, Self::now()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!(user_id = id, username, "user registered");
        Ok(())
    }

    fn record_attempt(
        &self,
        id: i64,
        username: Option<&str>,
        success: bool,
    ) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let existing: Option<(u32, bool)> = tx
            .query_row(
                "SELECT attempts, blocked FROM users WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let (attempts, blocked) = match existing {
            Some(row) => row,
            None => {
                tx.execute(
                    "INSERT INTO users (id, username, registration, blocked, attempts)
                     VALUES (?1, ?2, ?3, 0, 0)",
                    params![id, username.unwrap_or("unknown"), Self::now()],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;
                (0, false)
            }
        };

        if success {
            tx.execute(
                "UPDATE users SET attempts = 0 WHERE id = ?1",
                params![id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        } else {
            let attempts = attempts + 1;
            tx.execute(
                "UPDATE users SET attempts = ?1 WHERE id = ?2",
                params![attempts, id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

            if attempts >= BLOCK_THRESHOLD && !blocked {
                tx.execute(
                    "UPDATE users SET blocked = 1 WHERE id = ?1",
                    params![id],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;
                tracing::warn!(user_id = id, attempts, "user blocked after repeated failures");
            }
        }

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_all(&self) -> Result<Vec<UserSummary>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT id, username, registration, blocked FROM users")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    registered_at: row.get(2)?,
                    blocked: row.get::<_, i64>(3)? != 0,
                })
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
