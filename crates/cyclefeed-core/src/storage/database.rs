//! SQLite-backed persistence.
//!
//! Provides:
//! - Key-value store (dismissal list and other viewer state)
//! - An ordered schedule-item table served page by page to the feed

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::StoreError;
use crate::feed::{FeedFilters, ItemPage, KeyValueStore, PagedItemSource};
use crate::item::ScheduleItem;

/// SQLite database holding the kv table and the feed item table.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open `<data_dir>/<file_name>`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(file_name: &str) -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join(file_name))
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schedule_items (
                position INTEGER PRIMARY KEY AUTOINCREMENT,
                id       TEXT NOT NULL UNIQUE,
                body     TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Replace the feed item table with `items`, in order.
    pub fn import_items(&self, items: &[ScheduleItem]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM schedule_items", [])?;
        for item in items {
            let body = serde_json::to_string(item).map_err(|source| StoreError::Corrupt {
                key: item.id.clone(),
                source,
            })?;
            tx.execute(
                "INSERT OR REPLACE INTO schedule_items (id, body) VALUES (?1, ?2)",
                params![item.id, body],
            )?;
        }
        tx.commit()?;
        Ok(items.len())
    }

    pub fn item_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM schedule_items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Up to `limit` items stored after `position`, with their positions.
    pub fn items_after(
        &self,
        position: i64,
        limit: usize,
    ) -> Result<Vec<(i64, ScheduleItem)>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT position, id, body FROM schedule_items
             WHERE position > ?1
             ORDER BY position
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![position, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (position, id, body) = row?;
            let item = serde_json::from_str(&body)
                .map_err(|source| StoreError::Corrupt { key: id, source })?;
            items.push((position, item));
        }
        Ok(items)
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.kv_get(key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv_set(key, value)
    }
}

/// Feed source paging through the `schedule_items` table.
pub struct SqliteItemSource {
    db: Arc<Database>,
    /// Position of the last row handed out.
    cursor: i64,
}

impl SqliteItemSource {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, cursor: 0 }
    }
}

#[async_trait]
impl PagedItemSource for SqliteItemSource {
    async fn fetch_next(
        &mut self,
        count: usize,
        filters: &FeedFilters,
    ) -> Result<ItemPage, StoreError> {
        let mut items = Vec::with_capacity(count);
        while items.len() < count {
            let batch = self.db.items_after(self.cursor, count - items.len())?;
            if batch.is_empty() {
                break;
            }
            for (position, item) in batch {
                self.cursor = position;
                if filters.matches(&item) {
                    items.push(item);
                }
            }
        }
        let has_more = !self.db.items_after(self.cursor, 1)?.is_empty();
        Ok(ItemPage { items, has_more })
    }

    async fn reset(&mut self) -> Result<(), StoreError> {
        self.cursor = 0;
        Ok(())
    }
}
