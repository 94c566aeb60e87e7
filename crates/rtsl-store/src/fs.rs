use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::shard::{in_folder, validate_name, StoredShard};
use crate::traits::ShardStore;

const EXTENSION: &str = "rtsl";

/// Filesystem shard store: `<root>/<folder>/<name>.rtsl`.
///
/// Each write is staged into a temporary file in the destination directory
/// and renamed into place, so a crash mid-write never leaves a truncated
/// shard behind.
#[derive(Clone, Debug)]
pub struct FsShardStore {
    root: PathBuf,
}

impl FsShardStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of shard `name`.
    pub fn path_of(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        let mut path = self.root.clone();
        path.extend(name.split('/'));
        let mut file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        file_name.push(".");
        file_name.push(EXTENSION);
        path.set_file_name(file_name);
        Ok(path)
    }

    /// Write `shard` into a temporary file next to its destination.
    fn stage(&self, shard: &StoredShard) -> StoreResult<(NamedTempFile, PathBuf)> {
        let path = self.path_of(&shard.name)?;
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&shard.data)?;
        tmp.as_file().sync_all()?;
        Ok((tmp, path))
    }

    fn publish(tmp: NamedTempFile, path: &Path) -> StoreResult<()> {
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn undo(published: &[(PathBuf, Option<Vec<u8>>)]) {
        for (path, previous) in published.iter().rev() {
            let result = match previous {
                Some(data) => Self::restore(path, data),
                None => fs::remove_file(path).map_err(StoreError::from),
            };
            if let Err(err) = result {
                warn!(path = %path.display(), error = %err, "could not undo shard write");
            }
        }
    }

    fn restore(path: &Path, data: &[u8]) -> StoreResult<()> {
        let dir = path.parent().ok_or_else(|| {
            StoreError::Io(io::Error::new(io::ErrorKind::Other, "shard path has no parent"))
        })?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        Self::publish(tmp, path)
    }

    fn name_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if relative.extension()? != EXTENSION {
            return None;
        }
        let stem = relative.with_extension("");
        let parts: Option<Vec<&str>> = stem
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        Some(parts?.join("/"))
    }
}

impl ShardStore for FsShardStore {
    fn read(&self, name: &str) -> StoreResult<Option<StoredShard>> {
        let path = self.path_of(name)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(StoredShard::new(name, data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, shard: &StoredShard) -> StoreResult<()> {
        let (tmp, path) = self.stage(shard)?;
        Self::publish(tmp, &path)?;
        debug!(name = %shard.name, bytes = shard.size, "wrote shard");
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.path_of(name)?.is_file())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        match fs::remove_file(self.path_of(name)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, folder: &str) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "filesystem loop while listing shards")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.name_of(entry.path()) {
                Some(name) if in_folder(&name, folder) => names.push(name),
                Some(_) => {}
                None => {
                    if entry.path().extension().is_some_and(|e| e == EXTENSION) {
                        warn!(path = %entry.path().display(), "skipping shard with non-UTF-8 name");
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Stage every shard, then rename them all into place.
    ///
    /// A failed rename undoes the renames before it: overwritten shards get
    /// their previous bytes back and new ones are removed. A crash between
    /// renames, or a failing undo, can still leave part of the batch in
    /// place; undo failures are logged.
    fn write_batch(&self, shards: &[StoredShard]) -> StoreResult<()> {
        let mut staged = Vec::with_capacity(shards.len());
        for shard in shards {
            let (tmp, path) = self.stage(shard)?;
            let previous = if path.is_file() {
                Some(fs::read(&path)?)
            } else {
                None
            };
            staged.push((tmp, path, previous));
        }
        let mut published = Vec::with_capacity(staged.len());
        for (tmp, path, previous) in staged {
            if let Err(err) = Self::publish(tmp, &path) {
                warn!(path = %path.display(), error = %err, "rename failed, undoing batch");
                Self::undo(&published);
                return Err(err);
            }
            published.push((path, previous));
        }
        debug!(count = shards.len(), "committed shard batch");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsShardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsShardStore::open(dir.path().join("shards")).unwrap();
        (dir, store)
    }

    #[test]
    fn write_then_read_from_disk() {
        let (_dir, store) = store();
        let shard = StoredShard::new("Scenes/Level1/SceneAssetLibrary", b"payload".to_vec());
        store.write(&shard).unwrap();
        let path = store.path_of(&shard.name).unwrap();
        assert!(path.ends_with("Scenes/Level1/SceneAssetLibrary.rtsl"));
        assert_eq!(store.read(&shard.name).unwrap(), Some(shard));
    }

    #[test]
    fn missing_and_delete() {
        let (_dir, store) = store();
        assert_eq!(store.read("a/b").unwrap(), None);
        store.write(&StoredShard::new("a/b", vec![1])).unwrap();
        assert!(store.exists("a/b").unwrap());
        assert!(store.delete("a/b").unwrap());
        assert!(!store.delete("a/b").unwrap());
    }

    #[test]
    fn list_walks_nested_folders() {
        let (_dir, store) = store();
        store
            .write_batch(&[
                StoredShard::new("BuiltInAssets/BuiltInAssetLibrary", vec![0]),
                StoredShard::new("Scenes/S/SceneAssetLibrary2", vec![2]),
                StoredShard::new("Scenes/S/SceneAssetLibrary", vec![1]),
            ])
            .unwrap();
        fs::write(store.root().join("notes.txt"), b"ignored").unwrap();
        assert_eq!(
            store.list("Scenes/S").unwrap(),
            vec!["Scenes/S/SceneAssetLibrary", "Scenes/S/SceneAssetLibrary2"]
        );
        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn rejected_batch_leaves_no_files() {
        let (_dir, store) = store();
        let err = store
            .write_batch(&[
                StoredShard::new("Scenes/ok", vec![1]),
                StoredShard::new("Scenes/../escape", vec![2]),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName { .. }));
        assert!(store.list("").unwrap().is_empty());
        // no stray temporaries either
        let leftovers = WalkDir::new(store.root())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn failed_rename_undoes_earlier_shards() {
        let (_dir, store) = store();
        store.write(&StoredShard::new("Scenes/a", vec![1])).unwrap();
        // a non-empty directory where a shard file should go makes its rename fail
        let blocker = store.path_of("Scenes/b").unwrap();
        fs::create_dir_all(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        let result = store.write_batch(&[
            StoredShard::new("Scenes/a", vec![2]),
            StoredShard::new("Scenes/c", vec![3]),
            StoredShard::new("Scenes/b", vec![4]),
        ]);
        assert!(result.is_err());
        assert_eq!(store.read("Scenes/a").unwrap().unwrap().data, vec![1]);
        assert!(!store.exists("Scenes/c").unwrap());
        assert_eq!(store.list("").unwrap(), vec!["Scenes/a"]);
    }

    #[test]
    fn overwrite_replaces_content() {
        let (_dir, store) = store();
        store.write(&StoredShard::new("x", vec![1, 2, 3])).unwrap();
        store.write(&StoredShard::new("x", vec![9])).unwrap();
        assert_eq!(store.read("x").unwrap().unwrap().data, vec![9]);
    }
}
