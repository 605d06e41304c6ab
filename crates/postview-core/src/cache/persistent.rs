// On-disk cache backend.
//
// A single redb table keyed by the canonical request key, values stored as
// JSON-encoded `CacheEntry` bytes. redb is synchronous, so every operation
// runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use tokio::sync::OnceCell;
use tokio::task::spawn_blocking;
use tracing::debug;

use super::{CACHE_NAME, CacheEntry, CacheError, CacheKey, DataCache};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new(CACHE_NAME);

/// Persistent page cache stored in a redb database file.
pub struct RedbCache {
    path: PathBuf,
    db: OnceCell<Arc<Database>>,
}

impl RedbCache {
    /// Describe a cache at `path`. Nothing touches disk until `init()`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn database(&self) -> Result<Arc<Database>, CacheError> {
        self.db.get().cloned().ok_or(CacheError::NotInitialized)
    }
}

impl std::fmt::Debug for RedbCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCache")
            .field("path", &self.path)
            .field("ready", &self.db.initialized())
            .finish()
    }
}

fn open_database(path: &Path) -> Result<Database, CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::create(path).map_err(redb::Error::from)?;

    // Create the table up front so read transactions never see it missing.
    let txn = db.begin_write().map_err(redb::Error::from)?;
    txn.open_table(TABLE).map_err(redb::Error::from)?;
    txn.commit().map_err(redb::Error::from)?;

    Ok(db)
}

#[async_trait]
impl DataCache for RedbCache {
    async fn init(&self) -> Result<(), CacheError> {
        self.db
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let db = spawn_blocking(move || open_database(&path)).await??;
                debug!(path = %self.path.display(), "page cache opened");
                Ok::<_, CacheError>(Arc::new(db))
            })
            .await?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.db.initialized()
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let db = self.database()?;
        let key = key.as_str().to_owned();

        let bytes = spawn_blocking(move || -> Result<Option<Vec<u8>>, redb::Error> {
            let txn = db.begin_read()?;
            let table = txn.open_table(TABLE)?;
            let value = table.get(key.as_str())?.map(|guard| guard.value().to_vec());
            Ok(value)
        })
        .await??;

        bytes
            .map(|b| serde_json::from_slice::<CacheEntry>(&b))
            .transpose()
            .map_err(CacheError::from)
    }

    async fn set(&self, key: &CacheKey, value: serde_json::Value) -> Result<(), CacheError> {
        let db = self.database()?;
        let key = key.as_str().to_owned();
        let bytes = serde_json::to_vec(&CacheEntry::new(value))?;

        spawn_blocking(move || -> Result<(), redb::Error> {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(TABLE)?;
                table.insert(key.as_str(), bytes.as_slice())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await??;

        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let db = self.database()?;

        spawn_blocking(move || -> Result<(), redb::Error> {
            let txn = db.begin_write()?;
            txn.delete_table(TABLE)?;
            txn.open_table(TABLE)?;
            txn.commit()?;
            Ok(())
        })
        .await??;

        Ok(())
    }

    async fn entry_count(&self) -> Result<usize, CacheError> {
        let db = self.database()?;

        let count = spawn_blocking(move || -> Result<u64, redb::Error> {
            let txn = db.begin_read()?;
            let table = txn.open_table(TABLE)?;
            Ok(table.len()?)
        })
        .await??;

        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}
