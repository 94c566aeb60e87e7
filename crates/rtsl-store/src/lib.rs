//! Named shard storage for the runtime save/load codec.
//!
//! A shard store is a flat key-value store of encoded shard containers
//! keyed by `folder/name` paths. It never interprets shard contents.
//!
//! # Storage Backends
//!
//! All backends implement the [`ShardStore`] trait:
//!
//! - [`InMemoryShardStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FsShardStore`] -- one `<name>.rtsl` file per shard under a root directory
//!
//! # Design Rules
//!
//! 1. Writes are atomic per shard: readers see the old bytes or the new ones.
//! 2. `write_batch` stages every shard before publishing any of them.
//! 3. Names are validated before anything touches the backend.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod shard;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsShardStore;
pub use memory::InMemoryShardStore;
pub use shard::{validate_name, StoredShard};
pub use traits::ShardStore;
