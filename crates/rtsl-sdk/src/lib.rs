//! Save/load facade for the runtime save/load codec.
//!
//! [`SaveLoad`] is the main entry point for applications: it ties the codec,
//! dependency collection, sharding and a shard store together into two
//! operations, [`collect_and_save`](SaveLoad::collect_and_save) and
//! [`load_shards`](SaveLoad::load_shards).

pub mod config;
pub mod error;
pub mod saveload;

pub use config::SaveLoadConfig;
pub use error::{ErrorKind, SdkError, SdkResult};
pub use saveload::{SaveLoad, VerifyReport};

// Re-export key types
pub use rtsl_codec::{Codec, CodecBuilder};
pub use rtsl_collect::TraversalOrder;
pub use rtsl_library::{LibrarySet, ShardHandle};
pub use rtsl_scene::{BuiltinAssets, InstanceId, World};
pub use rtsl_store::{FsShardStore, InMemoryShardStore, ShardStore};
pub use rtsl_types::Identity;
