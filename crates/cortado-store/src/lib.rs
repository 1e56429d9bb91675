pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod realtime;
pub mod store;

pub use error::StoreError;
pub use realtime::ChangeFeed;
pub use store::Store;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

/// SQLite-backed implementation of the [`Store`] boundary. Stands in for the
/// remote relational backend; owns the change feed its writes publish to.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("store opened at {}", path.display());
        Ok(Self::from_conn(conn))
    }

    /// Private in-memory database. Used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self::from_conn(conn))
    }

    fn from_conn(conn: Connection) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                feed: ChangeFeed::new(),
            }),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.inner.feed
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.inner.conn.lock().map_err(|_| StoreError::Lock)?;
        f(&conn)
    }

    /// Run a blocking query off the async runtime.
    pub(crate) async fn blocking<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f)).await?
    }
}
