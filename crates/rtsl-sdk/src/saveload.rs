use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use rtsl_codec::{Codec, CodecError, IdentityStore, Materializer};
use rtsl_collect::{DependencyCollector, LiveClosure};
use rtsl_library::{
    library_key, max_ordinal, read_folder, scan, write_libraries, AssetLibrary, LibrarySet,
    LibrarySharder, ShardHandle,
};
use rtsl_scene::{BuiltinAssets, InstanceId, World};
use rtsl_store::{validate_name, ShardStore};
use rtsl_types::{FieldValue, Identity, Primitive};

use crate::config::SaveLoadConfig;
use crate::error::{SdkError, SdkResult};

/// Outcome of [`SaveLoad::verify_shards`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub shards: usize,
    pub records: usize,
    pub references: usize,
}

/// Saves live object graphs into capacity-bounded shards and loads them
/// back.
///
/// A save pass collects the dependency closure of its roots, places it into
/// shards, extracts one record per object and commits every shard in one
/// batch. Any failure aborts the pass before the store is touched.
///
/// Identities handed out by earlier passes are remembered per folder for the
/// lifetime of this value. Saving into the same folder again appends the
/// objects that were not saved before and rewrites the stored entries of
/// those that changed. Objects bound to the built-in shard are referenced
/// instead of re-embedded.
pub struct SaveLoad<S: ShardStore> {
    codec: Arc<Codec>,
    store: S,
    config: SaveLoadConfig,
    bindings: BTreeMap<String, HashMap<InstanceId, Identity>>,
}

impl<S: ShardStore> SaveLoad<S> {
    pub fn new(codec: Arc<Codec>, store: S, config: SaveLoadConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            codec,
            store,
            config,
            bindings: BTreeMap::new(),
        })
    }

    /// A facade over the built-in surrogates with default configuration.
    pub fn with_defaults(store: S) -> SdkResult<Self> {
        Self::new(
            Arc::new(Codec::with_builtin_surrogates()?),
            store,
            SaveLoadConfig::default(),
        )
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SaveLoadConfig {
        &self.config
    }

    /// Identity bound to `instance` by an earlier pass into `folder`.
    pub fn identity_of(&self, folder: &str, instance: InstanceId) -> Option<Identity> {
        self.bindings.get(folder)?.get(&instance).copied()
    }

    /// Forget every identity bound in this session.
    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    // ---------------------------------------------------------------
    // Save
    // ---------------------------------------------------------------

    /// Save the well-known built-in set into the built-in shard.
    ///
    /// Built-ins already stored there are bound by name and not written
    /// again, so calling this against an existing store is cheap.
    pub fn save_builtins(
        &mut self,
        world: &World,
        builtins: &BuiltinAssets,
    ) -> SdkResult<Vec<ShardHandle>> {
        let folder = self.config.builtin_folder.clone();
        let library = self.config.builtin_library.clone();
        self.attach_builtins(builtins)?;
        self.save_into(world, &builtins.ids(), &folder, &library)
    }

    /// Bind `builtins` to the records of an existing built-in shard, matching
    /// by name. Returns the number of newly bound built-ins.
    pub fn attach_builtins(&mut self, builtins: &BuiltinAssets) -> SdkResult<usize> {
        let folder = self.config.builtin_folder.clone();
        let existing = read_folder(&self.store, &folder, &self.config.builtin_library)?;
        let mut by_name = HashMap::new();
        for (library, _) in &existing {
            for record in &library.entries {
                if let Some(FieldValue::Primitive(Primitive::Str(name))) = record.get("name") {
                    by_name.entry(name.clone()).or_insert(record.identity);
                }
            }
        }
        let bound = self.bindings.entry(folder).or_default();
        let mut attached = 0;
        for (name, instance) in builtins.iter() {
            if bound.contains_key(&instance) {
                continue;
            }
            if let Some(identity) = by_name.get(name) {
                bound.insert(instance, *identity);
                attached += 1;
            }
        }
        debug!(attached, "attached built-in assets");
        Ok(attached)
    }

    /// Save `roots` and everything they reach into `destination`.
    ///
    /// Returns handles to every shard of the scene library in the folder,
    /// existing and newly written, in ordinal order. Nothing is written when
    /// the pass fails.
    pub fn collect_and_save(
        &mut self,
        world: &World,
        roots: &[InstanceId],
        destination: &str,
    ) -> SdkResult<Vec<ShardHandle>> {
        let library = self.config.scene_library.clone();
        self.save_into(world, roots, destination, &library)
    }

    fn save_into(
        &mut self,
        world: &World,
        roots: &[InstanceId],
        folder: &str,
        library: &str,
    ) -> SdkResult<Vec<ShardHandle>> {
        validate_name(&library_key(folder, library))?;
        let existing = read_folder(&self.store, folder, library)?;

        let mut identities = IdentityStore::new();
        identities.seed_known(self.external_for(folder));
        let rebound = self.rebind_saved(world, folder, &existing, &mut identities)?;

        let collector = DependencyCollector::new(&self.codec).with_order(self.config.traversal);
        let closure = collector.collect_live(world, roots, &identities)?;
        let units = placement_units(&self.codec, world, &closure)?;

        let first_ordinal = match max_ordinal(&self.store)? {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| SdkError::Internal("shard ordinals exhausted".into()))?,
            None => 0,
        };
        let mut sharder = LibrarySharder::resume(
            self.config.layout(folder, library),
            existing.iter().map(|(lib, _)| lib.clone()).collect(),
            first_ordinal,
        )?;
        for unit in &units {
            sharder.accept(unit, &mut identities)?;
        }
        let planned = sharder.finish();

        let allocated = identities.allocated();
        let mut libraries: BTreeMap<u32, AssetLibrary> = BTreeMap::new();
        for shard in planned {
            let key = shard.library.key();
            if !shard.resumed && self.store.exists(&key)? {
                return Err(SdkError::Internal(format!(
                    "new shard {key} would overwrite an existing shard"
                )));
            }
            let mut library = shard.library;
            for member in &shard.members {
                library.push(self.codec.extract(world, *member, &mut identities)?)?;
            }
            libraries.insert(library.ordinal, library);
        }

        // objects saved by earlier passes keep their identity; their entries
        // are re-extracted and rewritten in place when they changed
        let mut updated = 0;
        for instance in closure.order() {
            let Some(identity) = rebound.get(instance) else {
                continue;
            };
            let record = self.codec.extract(world, *instance, &mut identities)?;
            let ordinal = identity.ordinal();
            let library = match libraries.entry(ordinal) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let (stored, _) = existing
                        .iter()
                        .find(|(lib, _)| lib.ordinal == ordinal)
                        .ok_or_else(|| {
                            SdkError::Internal(format!("no shard holds identity {identity}"))
                        })?;
                    if stored.get(*identity) == Some(&record) {
                        continue;
                    }
                    entry.insert(stored.clone())
                }
            };
            if library.replace(record)? {
                updated += 1;
            }
        }

        if identities.allocated() != allocated {
            return Err(SdkError::Internal(format!(
                "extraction reached {} objects outside the collected closure",
                identities.allocated() - allocated
            )));
        }

        let libraries: Vec<AssetLibrary> = libraries.into_values().collect();
        let written = if libraries.is_empty() {
            Vec::new()
        } else {
            write_libraries(&self.store, &libraries)?
        };

        let mut handles: BTreeMap<String, ShardHandle> = existing
            .into_iter()
            .map(|(_, handle)| (handle.key.clone(), handle))
            .collect();
        for handle in &written {
            handles.insert(handle.key.clone(), handle.clone());
        }
        let mut handles: Vec<ShardHandle> = handles.into_values().collect();
        handles.sort_by_key(|h| h.ordinal);

        self.bindings
            .entry(folder.to_string())
            .or_default()
            .extend(identities.bindings());

        info!(
            folder,
            library,
            roots = roots.len(),
            collected = closure.len(),
            external = closure.external().len(),
            updated,
            written = written.len(),
            shards = handles.len(),
            "saved"
        );
        Ok(handles)
    }

    /// Instances referenced but never written by a save into `folder`: the
    /// built-ins, unless the built-in shard itself is being saved.
    fn external_for(&self, folder: &str) -> Vec<(InstanceId, Identity)> {
        if folder == self.config.builtin_folder {
            return Vec::new();
        }
        self.bindings
            .get(&self.config.builtin_folder)
            .map(|b| b.iter().map(|(i, id)| (*i, *id)).collect())
            .unwrap_or_default()
    }

    /// Bind the live instances this session already saved into `folder` to
    /// their stored identities, so a new pass re-extracts them instead of
    /// allocating again.
    fn rebind_saved(
        &self,
        world: &World,
        folder: &str,
        existing: &[(AssetLibrary, ShardHandle)],
        identities: &mut IdentityStore,
    ) -> SdkResult<HashMap<InstanceId, Identity>> {
        let Some(bound) = self.bindings.get(folder) else {
            return Ok(HashMap::new());
        };
        let stored: HashSet<Identity> = existing
            .iter()
            .flat_map(|(lib, _)| lib.entries.iter().map(|r| r.identity))
            .collect();
        let mut candidates: Vec<(InstanceId, Identity)> = bound
            .iter()
            .filter(|(instance, identity)| {
                world.contains(**instance)
                    && stored.contains(*identity)
                    && !identities.is_known(**instance)
            })
            .map(|(i, id)| (*i, *id))
            .collect();
        candidates.sort();

        let mut rebound = HashMap::with_capacity(candidates.len());
        for (instance, identity) in candidates {
            // a later load may have bound a second instance to the same identity
            if identities.instance_for(identity).is_some() {
                continue;
            }
            identities.bind(identity, instance)?;
            rebound.insert(instance, identity);
        }
        Ok(rebound)
    }

    // ---------------------------------------------------------------
    // Load
    // ---------------------------------------------------------------

    /// Materialize `roots` and everything they reference from the shards
    /// behind `handles` into `world`.
    ///
    /// Every reference must resolve inside the given shard set; on failure
    /// every instance created by this call is removed again.
    pub fn load_shards(
        &mut self,
        world: &mut World,
        handles: &[ShardHandle],
        roots: &[Identity],
    ) -> SdkResult<Vec<InstanceId>> {
        let set = LibrarySet::load(&self.store, handles)?;
        let collector = DependencyCollector::new(&self.codec).with_order(self.config.traversal);
        let closure = collector.collect_records(&set, roots)?;

        let mut materializer = Materializer::new(&self.codec, &set);
        let instances = match materializer.materialize(roots, world) {
            Ok(instances) => instances,
            Err(err) => {
                materializer.rollback(world);
                return Err(err.into());
            }
        };

        let folder_of: HashMap<Identity, &str> = set
            .libraries()
            .iter()
            .flat_map(|lib| lib.entries.iter().map(move |r| (r.identity, lib.folder.as_str())))
            .collect();
        let created = materializer.created().len();
        for (instance, identity) in materializer.identities().bindings() {
            if let Some(folder) = folder_of.get(&identity) {
                self.bindings
                    .entry(folder.to_string())
                    .or_default()
                    .insert(instance, identity);
            }
        }

        info!(
            shards = set.library_count(),
            roots = roots.len(),
            closure = closure.len(),
            created,
            "loaded"
        );
        Ok(instances)
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    /// Handles of every decodable shard under `folder` (`""` for all),
    /// ordered by ordinal.
    pub fn shards(&self, folder: &str) -> SdkResult<Vec<ShardHandle>> {
        let mut handles: Vec<ShardHandle> =
            scan(&self.store, folder)?.into_iter().map(|(_, h)| h).collect();
        handles.sort_by_key(|h| h.ordinal);
        Ok(handles)
    }

    /// Handles of the built-in shard set.
    pub fn builtin_handles(&self) -> SdkResult<Vec<ShardHandle>> {
        Ok(read_folder(&self.store, &self.config.builtin_folder, &self.config.builtin_library)?
            .into_iter()
            .map(|(_, h)| h)
            .collect())
    }

    /// Decoded shards behind `handles`.
    pub fn open_shards(&self, handles: &[ShardHandle]) -> SdkResult<LibrarySet> {
        Ok(LibrarySet::load(&self.store, handles)?)
    }

    /// Check that every record in the shard set has a registered type and
    /// every reference resolves inside the set.
    pub fn verify_shards(&self, handles: &[ShardHandle]) -> SdkResult<VerifyReport> {
        let set = LibrarySet::load(&self.store, handles)?;
        let mut references = 0;
        for record in set.records() {
            for identity in self.codec.dependencies_of(record)? {
                if !set.contains(identity) {
                    return Err(CodecError::DanglingReference {
                        identity,
                        referrer: Some(record.identity),
                    }
                    .into());
                }
                references += 1;
            }
        }
        Ok(VerifyReport {
            shards: set.library_count(),
            records: set.len(),
            references,
        })
    }
}

/// Split a closure into placement units: each object in discovery order
/// together with its transitive parts that are not placed yet.
fn placement_units(
    codec: &Codec,
    world: &World,
    closure: &LiveClosure,
) -> SdkResult<Vec<Vec<InstanceId>>> {
    let mut placed = HashSet::with_capacity(closure.len());
    let mut units = Vec::new();
    for &instance in closure.order() {
        if !placed.insert(instance) {
            continue;
        }
        let mut unit = vec![instance];
        let mut next = 0;
        while next < unit.len() {
            for part in codec.parts_of(world, unit[next])? {
                if closure.contains(part) && placed.insert(part) {
                    unit.push(part);
                }
            }
            next += 1;
        }
        units.push(unit);
    }
    Ok(units)
}
