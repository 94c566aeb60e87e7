//! Asset-library shards for the runtime save/load codec.
//!
//! A shard ("asset library") is a capacity-bounded container of surrogate
//! records written to a [`rtsl_store::ShardStore`] under `folder/name`.
//!
//! # Architecture
//!
//! - **Container** (`RTSL`): header + CRC-checked bincode entries + BLAKE3 trailer
//! - **LibrarySharder**: places units of live objects into shards and allocates their identities
//! - **LibrarySet**: the records of several shards, indexed by identity, for loading
//! - **write_libraries**: encode everything first, then commit in one batch

pub mod error;
pub mod library;
pub mod manager;
pub mod reader;
pub mod sharder;
pub mod writer;

pub use error::{LibraryError, LibraryResult};
pub use library::{library_key, shard_index, shard_name, AssetLibrary, ShardHandle};
pub use manager::{
    is_shard_of, max_ordinal, read_folder, read_library, scan, write_libraries, LibrarySet,
};
pub use reader::{decode_library, decode_ordinal, stored_checksum};
pub use sharder::{LibrarySharder, PlannedShard, ShardLayout, ShardState};
pub use writer::{encode_library, EncodedLibrary, FORMAT_VERSION, MAGIC};
