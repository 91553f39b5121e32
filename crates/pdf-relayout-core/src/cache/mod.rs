mod disk;
mod key;
mod memory;

pub use disk::DiskCache;
pub use key::CacheKey;
pub use memory::MemoryCache;

use crate::config::CacheConfig;
use crate::error::Result;

/// Combined translation cache with memory and disk layers.
///
/// Values are translated unit texts, keyed by source text, provider and
/// language pair. Read-through state keyed purely by inputs; it carries no
/// document state across runs.
pub struct TranslationCache {
    memory: Option<MemoryCache>,
    disk: Option<DiskCache>,
}

impl TranslationCache {
    /// Create a new translation cache from configuration
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let memory = if config.memory_enabled {
            Some(MemoryCache::new(
                config.memory_max_entries,
                config.memory_ttl_seconds,
            ))
        } else {
            None
        };

        let disk = if config.disk_enabled {
            let path = config
                .disk_path
                .clone()
                .unwrap_or_else(crate::util::translation_cache_path);
            Some(DiskCache::new(path)?)
        } else {
            None
        };

        Ok(Self { memory, disk })
    }

    /// A cache with both layers disabled; every lookup misses.
    pub const fn disabled() -> Self {
        Self {
            memory: None,
            disk: None,
        }
    }

    /// Get a cached translation
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let key_str = key.to_string();

        if let Some(ref memory) = self.memory
            && let Some(value) = memory.get(&key_str).await
        {
            return Some(value);
        }

        if let Some(ref disk) = self.disk
            && let Some(value) = disk.get(&key_str)
        {
            // Populate memory cache on disk hit
            if let Some(ref memory) = self.memory {
                memory.insert(key_str, value.clone()).await;
            }
            return Some(value);
        }

        None
    }

    /// Store a translation in cache
    pub async fn insert(&self, key: &CacheKey, value: String) {
        let key_str = key.to_string();

        if let Some(ref memory) = self.memory {
            memory.insert(key_str.clone(), value.clone()).await;
        }

        if let Some(ref disk) = self.disk {
            let _ = disk.insert(&key_str, &value);
        }
    }

    /// Clear all caches
    pub fn clear(&self) {
        if let Some(ref memory) = self.memory {
            memory.clear();
        }

        if let Some(ref disk) = self.disk {
            let _ = disk.clear();
        }
    }
}
