use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::shard::{in_folder, validate_name, StoredShard};
use crate::traits::ShardStore;

/// In-memory, `BTreeMap`-based shard store.
///
/// Intended for tests and embedding. Shards are held behind a `RwLock` and
/// cloned on read/write.
pub struct InMemoryShardStore {
    shards: RwLock<BTreeMap<String, StoredShard>>,
}

impl InMemoryShardStore {
    pub fn new() -> Self {
        Self {
            shards: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of shards currently stored.
    pub fn len(&self) -> usize {
        self.shards.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored shards.
    pub fn total_bytes(&self) -> u64 {
        self.shards
            .read()
            .expect("lock poisoned")
            .values()
            .map(|shard| shard.size)
            .sum()
    }

    pub fn clear(&self) {
        self.shards.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryShardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardStore for InMemoryShardStore {
    fn read(&self, name: &str) -> StoreResult<Option<StoredShard>> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.get(name).cloned())
    }

    fn write(&self, shard: &StoredShard) -> StoreResult<()> {
        validate_name(&shard.name)?;
        let mut map = self.shards.write().expect("lock poisoned");
        map.insert(shard.name.clone(), shard.clone());
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.contains_key(name))
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut map = self.shards.write().expect("lock poisoned");
        Ok(map.remove(name).is_some())
    }

    fn list(&self, folder: &str) -> StoreResult<Vec<String>> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(map
            .keys()
            .filter(|name| in_folder(name, folder))
            .cloned()
            .collect())
    }

    fn write_batch(&self, shards: &[StoredShard]) -> StoreResult<()> {
        for shard in shards {
            validate_name(&shard.name)?;
        }
        let mut map = self.shards.write().expect("lock poisoned");
        for shard in shards {
            map.insert(shard.name.clone(), shard.clone());
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryShardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryShardStore")
            .field("shard_count", &count)
            .finish()
    }
}
