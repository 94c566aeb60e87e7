use crate::error::{StoreError, StoreResult};

/// An encoded shard: name + bytes + cached size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredShard {
    /// `folder/name` key.
    pub name: String,
    /// The encoded container.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredShard {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self {
            name: name.into(),
            data,
            size,
        }
    }

    /// The folder part of the name (empty for top-level shards).
    pub fn folder(&self) -> &str {
        self.name.rsplit_once('/').map(|(f, _)| f).unwrap_or("")
    }
}

/// Check that `name` is a relative `/`-separated path of plain segments.
pub fn validate_name(name: &str) -> StoreResult<()> {
    let invalid = |reason| {
        Err(StoreError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return invalid("empty");
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return invalid("empty path segment");
        }
        if segment == "." || segment == ".." {
            return invalid("relative path segment");
        }
        if segment
            .chars()
            .any(|c| c == '\\' || c == ':' || c.is_control())
        {
            return invalid("reserved character");
        }
    }
    Ok(())
}

/// Whether `name` lies under `folder` (every name lies under `""`).
pub(crate) fn in_folder(name: &str, folder: &str) -> bool {
    let folder = folder.trim_end_matches('/');
    folder.is_empty()
        || name
            .strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
}
