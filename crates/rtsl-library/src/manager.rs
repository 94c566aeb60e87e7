use std::collections::HashMap;

use tracing::{debug, info, warn};

use rtsl_codec::RecordSource;
use rtsl_store::ShardStore;
use rtsl_types::{Identity, SurrogateRecord};

use crate::error::{LibraryError, LibraryResult};
use crate::library::{shard_index, AssetLibrary, ShardHandle};
use crate::reader::{decode_library, decode_ordinal, stored_checksum};
use crate::writer::encode_library;

/// Whether `name` is one of the sequential shards of `library`
/// (`Lib`, `Lib2`, `Lib3`, ...).
pub fn is_shard_of(name: &str, library: &str) -> bool {
    shard_index(name, library).is_some()
}

/// Read and decode one shard, returning it with its handle.
pub fn read_library(
    store: &dyn ShardStore,
    key: &str,
) -> LibraryResult<Option<(AssetLibrary, ShardHandle)>> {
    let Some(shard) = store.read(key)? else {
        return Ok(None);
    };
    let library = decode_library(&shard.data).map_err(|err| match err {
        LibraryError::ChecksumMismatch { .. } => LibraryError::ChecksumMismatch {
            key: key.to_string(),
        },
        other => other,
    })?;
    let handle = ShardHandle {
        key: key.to_string(),
        ordinal: library.ordinal,
        records: library.len(),
        checksum: stored_checksum(&shard.data).unwrap_or_default(),
    };
    Ok(Some((library, handle)))
}

/// Every shard of `library` under `folder`, ordered by ordinal.
///
/// Strict: a corrupt shard fails the read.
pub fn read_folder(
    store: &dyn ShardStore,
    folder: &str,
    library: &str,
) -> LibraryResult<Vec<(AssetLibrary, ShardHandle)>> {
    let mut found = Vec::new();
    for key in store.list(folder)? {
        let name = key.rsplit_once('/').map(|(_, n)| n).unwrap_or(&key);
        if !is_shard_of(name, library) {
            continue;
        }
        if let Some(entry) = read_library(store, &key)? {
            found.push(entry);
        }
    }
    found.sort_by_key(|(lib, _)| lib.ordinal);
    Ok(found)
}

/// Every decodable shard under `folder`; corrupt shards are logged and
/// skipped.
pub fn scan(store: &dyn ShardStore, folder: &str) -> LibraryResult<Vec<(AssetLibrary, ShardHandle)>> {
    let mut found = Vec::new();
    for key in store.list(folder)? {
        match read_library(store, &key) {
            Ok(Some(entry)) => found.push(entry),
            Ok(None) => {}
            Err(err) => warn!(shard = %key, error = %err, "skipping corrupt shard"),
        }
    }
    Ok(found)
}

/// Highest shard ordinal in the store, if any shard exists.
///
/// Reads headers only, so shards with a damaged body still count. A shard
/// whose header is unreadable fails the call.
pub fn max_ordinal(store: &dyn ShardStore) -> LibraryResult<Option<u32>> {
    let mut max = None;
    for key in store.list("")? {
        let Some(shard) = store.read(&key)? else {
            continue;
        };
        let ordinal = decode_ordinal(&shard.data).map_err(|err| {
            warn!(shard = %key, error = %err, "unreadable shard header");
            err
        })?;
        max = max.max(Some(ordinal));
    }
    Ok(max)
}

/// Encode every library, then write them in one batch.
///
/// Nothing is written if any library fails to encode.
pub fn write_libraries(
    store: &dyn ShardStore,
    libraries: &[AssetLibrary],
) -> LibraryResult<Vec<ShardHandle>> {
    let encoded = libraries
        .iter()
        .map(encode_library)
        .collect::<LibraryResult<Vec<_>>>()?;
    let shards: Vec<_> = encoded.iter().map(|e| e.to_shard()).collect();
    store.write_batch(&shards)?;
    let bytes: u64 = shards.iter().map(|s| s.size).sum();
    info!(shards = shards.len(), bytes, "committed shards");
    Ok(encoded.iter().map(|e| e.handle()).collect())
}

/// The records of several shards, indexed by identity.
#[derive(Debug, Default)]
pub struct LibrarySet {
    libraries: Vec<AssetLibrary>,
    index: HashMap<Identity, (usize, usize)>,
}

impl LibrarySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `libraries`; the same identity in two shards is an error.
    pub fn from_libraries(libraries: Vec<AssetLibrary>) -> LibraryResult<Self> {
        let mut set = Self::new();
        for library in libraries {
            set.insert(library)?;
        }
        Ok(set)
    }

    /// Read the shards behind `handles`, checking each is unchanged.
    pub fn load(store: &dyn ShardStore, handles: &[ShardHandle]) -> LibraryResult<Self> {
        let mut set = Self::new();
        for handle in handles {
            let (library, current) = read_library(store, &handle.key)?
                .ok_or_else(|| LibraryError::NotFound(handle.key.clone()))?;
            if current.checksum != handle.checksum {
                return Err(LibraryError::ChecksumMismatch {
                    key: handle.key.clone(),
                });
            }
            set.insert(library)?;
        }
        debug!(shards = set.library_count(), records = set.len(), "loaded shard set");
        Ok(set)
    }

    pub fn insert(&mut self, library: AssetLibrary) -> LibraryResult<()> {
        library.validate()?;
        let slot = self.libraries.len();
        for (i, record) in library.entries.iter().enumerate() {
            if let Some((other, _)) = self.index.get(&record.identity) {
                return Err(LibraryError::DuplicateIdentity {
                    identity: record.identity,
                    first: self.libraries[*other].key(),
                    second: library.key(),
                });
            }
            self.index.insert(record.identity, (slot, i));
        }
        self.libraries.push(library);
        Ok(())
    }

    pub fn get(&self, identity: Identity) -> Option<&SurrogateRecord> {
        let (lib, entry) = self.index.get(&identity)?;
        self.libraries.get(*lib)?.entries.get(*entry)
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.index.contains_key(&identity)
    }

    /// Key of the shard holding `identity`.
    pub fn shard_of(&self, identity: Identity) -> Option<String> {
        let (lib, _) = self.index.get(&identity)?;
        Some(self.libraries[*lib].key())
    }

    pub fn libraries(&self) -> &[AssetLibrary] {
        &self.libraries
    }

    pub fn records(&self) -> impl Iterator<Item = &SurrogateRecord> {
        self.libraries.iter().flat_map(|l| l.entries.iter())
    }

    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl RecordSource for LibrarySet {
    fn record(&self, identity: Identity) -> Option<&SurrogateRecord> {
        self.get(identity)
    }
}
