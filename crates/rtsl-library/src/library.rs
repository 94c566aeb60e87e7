use serde::{Deserialize, Serialize};

use rtsl_types::{Identity, SurrogateRecord};

use crate::error::{LibraryError, LibraryResult};

/// Storage key of a library: `folder/name`, or `name` at the top level.
pub fn library_key(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Name of the `index`-th shard of a library: `Lib`, `Lib2`, `Lib3`, ...
pub fn shard_name(library: &str, index: usize) -> String {
    if index == 0 {
        library.to_string()
    } else {
        format!("{library}{}", index + 1)
    }
}

/// Inverse of [`shard_name`]: the index of `name` among the shards of
/// `library`, if it is one of them.
pub fn shard_index(name: &str, library: &str) -> Option<usize> {
    match name.strip_prefix(library)? {
        "" => Some(0),
        suffix if suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit()) => None,
        suffix => suffix.parse::<usize>().ok().filter(|n| *n >= 2).map(|n| n - 1),
    }
}

/// One persisted shard: a bounded, ordered list of surrogate records.
///
/// Every entry carries the library's `ordinal` in its identity and a local
/// part below `next_identity`, which is where allocation resumes when the
/// shard is appended to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetLibrary {
    pub folder: String,
    pub name: String,
    pub ordinal: u32,
    pub next_identity: u32,
    pub entries: Vec<SurrogateRecord>,
}

impl AssetLibrary {
    /// An empty library allocating from `ordinal:initial_id`.
    pub fn new(folder: impl Into<String>, name: impl Into<String>, ordinal: u32, initial_id: u32) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
            ordinal,
            next_identity: initial_id.max(1),
            entries: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        library_key(&self.folder, &self.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identity: Identity) -> Option<&SurrogateRecord> {
        self.entries.iter().find(|r| r.identity == identity)
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.get(identity).is_some()
    }

    /// Append a record allocated in this shard.
    pub fn push(&mut self, record: SurrogateRecord) -> LibraryResult<()> {
        self.check_entry(&record)?;
        self.next_identity = self.next_identity.max(record.identity.local().saturating_add(1));
        self.entries.push(record);
        Ok(())
    }

    /// Replace the entry with the same identity, keeping its position.
    ///
    /// Returns `false`, leaving the shard untouched, when the stored entry
    /// is already equal to `record`.
    pub fn replace(&mut self, record: SurrogateRecord) -> LibraryResult<bool> {
        let key = self.key();
        let slot = self
            .entries
            .iter_mut()
            .find(|r| r.identity == record.identity)
            .ok_or_else(|| LibraryError::NotFound(format!("{} in {key}", record.identity)))?;
        if *slot == record {
            return Ok(false);
        }
        *slot = record;
        Ok(true)
    }

    /// Lowest and highest identity held, if any.
    pub fn identity_range(&self) -> Option<(Identity, Identity)> {
        let min = self.entries.iter().map(|r| r.identity).min()?;
        let max = self.entries.iter().map(|r| r.identity).max()?;
        Some((min, max))
    }

    /// Check every entry against the header.
    pub fn validate(&self) -> LibraryResult<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for record in &self.entries {
            self.check_entry(record)?;
            if record.identity.local() >= self.next_identity {
                return Err(self.corrupt(format!(
                    "identity {} is not below next identity {}",
                    record.identity, self.next_identity
                )));
            }
            if !seen.insert(record.identity) {
                return Err(self.corrupt(format!("identity {} stored twice", record.identity)));
            }
        }
        Ok(())
    }

    fn check_entry(&self, record: &SurrogateRecord) -> LibraryResult<()> {
        if record.identity.is_null() {
            return Err(self.corrupt("null identity".into()));
        }
        if record.identity.ordinal() != self.ordinal {
            return Err(self.corrupt(format!(
                "identity {} does not belong to shard ordinal {}",
                record.identity, self.ordinal
            )));
        }
        Ok(())
    }

    fn corrupt(&self, reason: String) -> LibraryError {
        LibraryError::Corrupt {
            offset: 0,
            reason: format!("{}: {reason}", self.key()),
        }
    }
}

/// Reference to a shard that has been written to a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardHandle {
    /// `folder/name` storage key.
    pub key: String,
    pub ordinal: u32,
    /// Number of records in the shard.
    pub records: usize,
    /// Hex BLAKE3 checksum of the encoded container.
    pub checksum: String,
}
