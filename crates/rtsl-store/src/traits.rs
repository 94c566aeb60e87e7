use crate::error::StoreResult;
use crate::shard::StoredShard;

/// Named shard store.
///
/// All implementations must satisfy these invariants:
/// - A write replaces the whole shard; partial shards are never visible.
/// - `write_batch` publishes either every shard or, on failure, none of
///   them. The filesystem backend can only undo a failed publish on a best
///   effort basis; a crash mid-publish may leave part of a batch.
/// - `list` returns names in ascending order.
pub trait ShardStore: Send + Sync {
    /// Read a shard by name.
    ///
    /// Returns `Ok(None)` if the shard does not exist.
    fn read(&self, name: &str) -> StoreResult<Option<StoredShard>>;

    /// Write (or overwrite) a shard.
    fn write(&self, shard: &StoredShard) -> StoreResult<()>;

    /// Check whether a shard exists.
    fn exists(&self, name: &str) -> StoreResult<bool>;

    /// Delete a shard. Returns `true` if it existed.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Names of every shard under `folder`, sorted. `""` lists everything.
    fn list(&self, folder: &str) -> StoreResult<Vec<String>>;

    /// Read several shards.
    fn read_batch(&self, names: &[String]) -> StoreResult<Vec<Option<StoredShard>>> {
        names.iter().map(|name| self.read(name)).collect()
    }

    /// Write several shards as one commit.
    ///
    /// The default writes one by one; backends override it to stage first.
    fn write_batch(&self, shards: &[StoredShard]) -> StoreResult<()> {
        shards.iter().try_for_each(|shard| self.write(shard))
    }
}
