use std::path::Path;

use sled::Db;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Disk-based translation cache using sled
pub struct DiskCache {
    db: Db,
}

impl DiskCache {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::CacheInit(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::CacheInit(format!("Failed to open cache at {}: {}", path.display(), e)))?;

        debug!("Opened disk cache at {}", path.display());

        Ok(Self { db })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(value)) => String::from_utf8(value.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read error: {}", e);
                None
            }
        }
    }

    pub fn insert(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| Error::CacheWrite(e.to_string()))?;

        // Flush to ensure persistence
        self.db
            .flush()
            .map_err(|e| Error::CacheWrite(format!("Flush failed: {e}")))?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.db.clear().map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| Error::CacheWrite(format!("Flush failed: {e}")))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}
