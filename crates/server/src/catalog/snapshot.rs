//! Persistence for the catalog snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use super::cache::{CATALOG_CACHE_KEY, CachedCatalogSnapshot};

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Local persistent storage for the catalog snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Load the stored snapshot, if any.
    async fn load(&self) -> Result<Option<CachedCatalogSnapshot>, SnapshotError>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &CachedCatalogSnapshot) -> Result<(), SnapshotError>;
}

/// Stores the snapshot as JSON in `<dir>/catalog-cache.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CATALOG_CACHE_KEY}.json")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<CachedCatalogSnapshot>, SnapshotError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, snapshot: &CachedCatalogSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(snapshot)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the snapshot in memory only.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<CachedCatalogSnapshot>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a snapshot already stored.
    #[must_use]
    pub fn with_snapshot(snapshot: CachedCatalogSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<CachedCatalogSnapshot>, SnapshotError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &CachedCatalogSnapshot) -> Result<(), SnapshotError> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use card_ledger_core::{CardDefinition, CardId, UnitPrice};
    use rust_decimal::Decimal;

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("card-ledger-test-{}", uuid::Uuid::new_v4()))
    }

    fn snapshot() -> CachedCatalogSnapshot {
        CachedCatalogSnapshot {
            cards: vec![CardDefinition::new(
                CardId::parse("OP01-001").unwrap(),
                None,
                Some("Luffy".to_owned()),
                UnitPrice::Known(Decimal::new(150, 2)),
            )],
            fetched_at_epoch_ms: 42,
        }
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_none() {
        let store = FileSnapshotStore::new(temp_dir());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_save_then_load() {
        let dir = temp_dir();
        let store = FileSnapshotStore::new(&dir);
        assert!(store.path().ends_with("catalog-cache.json"));

        store.save(&snapshot()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(snapshot()));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = temp_dir();
        let store = FileSnapshotStore::new(&dir);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(store.path(), b"{not json").await.unwrap();

        assert!(matches!(store.load().await, Err(SnapshotError::Corrupt(_))));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_memory_store_replaces_wholesale() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&snapshot()).await.unwrap();
        let mut newer = snapshot();
        newer.cards.clear();
        newer.fetched_at_epoch_ms = 99;
        store.save(&newer).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(newer));
    }
}
