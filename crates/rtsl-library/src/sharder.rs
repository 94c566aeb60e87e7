use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use rtsl_codec::IdentityStore;
use rtsl_scene::InstanceId;

use crate::error::{LibraryError, LibraryResult};
use crate::library::{shard_index, shard_name, AssetLibrary};

/// Where and how large the shards of one save pass are.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardLayout {
    pub folder: String,
    /// Base name; later shards get a numeric suffix.
    pub library_name: String,
    pub max_assets: usize,
    /// First local identity of every fresh shard.
    pub initial_id: u32,
}

/// Lifecycle of the shard currently being filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardState {
    /// Has room for more objects.
    Open,
    /// Reached `max_assets`; sealed when the next unit arrives.
    Full,
    /// No shard is being filled.
    Closed,
}

/// A shard to be (re)written: its header and existing entries plus the
/// live instances placed into it during this pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedShard {
    pub library: AssetLibrary,
    pub members: Vec<InstanceId>,
    /// Whether the shard existed before this pass.
    pub resumed: bool,
}

impl PlannedShard {
    /// Existing entries plus placed members.
    pub fn len(&self) -> usize {
        self.library.len() + self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Places units of live instances into capacity-bounded shards and
/// allocates their identities.
///
/// A unit is placed whole. When it does not fit the remaining room of the
/// current shard, that shard is sealed and a fresh one is opened with the
/// next ordinal and a local counter reset to `initial_id`.
#[derive(Debug)]
pub struct LibrarySharder {
    layout: ShardLayout,
    next_ordinal: u32,
    next_index: usize,
    current: Option<PlannedShard>,
    state: ShardState,
    sealed: Vec<PlannedShard>,
}

impl LibrarySharder {
    /// A sharder with no existing shards; the first one gets `first_ordinal`.
    pub fn new(layout: ShardLayout, first_ordinal: u32) -> LibraryResult<Self> {
        if layout.max_assets == 0 {
            return Err(LibraryError::InvalidState("max_assets must be positive".into()));
        }
        Ok(Self {
            layout: ShardLayout {
                initial_id: layout.initial_id.max(1),
                ..layout
            },
            next_ordinal: first_ordinal,
            next_index: 0,
            current: None,
            state: ShardState::Closed,
            sealed: Vec::new(),
        })
    }

    /// Continue after `existing` shards of the same library, in ordinal
    /// order.
    ///
    /// The last existing shard is filled further if it has room; new shards
    /// take ordinals from `next_ordinal` and names after the highest existing
    /// one, so gaps in the sequence are never refilled.
    pub fn resume(
        layout: ShardLayout,
        existing: Vec<AssetLibrary>,
        next_ordinal: u32,
    ) -> LibraryResult<Self> {
        let mut sharder = Self::new(layout, next_ordinal)?;
        sharder.next_index = existing
            .iter()
            .filter_map(|lib| shard_index(&lib.name, &sharder.layout.library_name))
            .max()
            .map_or(existing.len(), |index| (index + 1).max(existing.len()));
        if let Some(last) = existing.into_iter().last() {
            sharder.state = if last.len() >= sharder.layout.max_assets {
                ShardState::Full
            } else {
                ShardState::Open
            };
            sharder.current = Some(PlannedShard {
                library: last,
                members: Vec::new(),
                resumed: true,
            });
        }
        Ok(sharder)
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    pub fn state(&self) -> ShardState {
        self.state
    }

    /// Shards that received members so far, including the current one.
    pub fn shard_count(&self) -> usize {
        self.sealed.len()
            + usize::from(self.current.as_ref().is_some_and(|c| !c.members.is_empty()))
    }

    /// Place `unit` and allocate identities for its members.
    ///
    /// Members that already have an identity are skipped. Fails with
    /// `CapacityExceeded` when the unit alone exceeds `max_assets`; nothing
    /// is allocated in that case.
    pub fn accept(&mut self, unit: &[InstanceId], identities: &mut IdentityStore) -> LibraryResult<()> {
        let mut seen = HashSet::with_capacity(unit.len());
        let fresh: Vec<InstanceId> = unit
            .iter()
            .copied()
            .filter(|member| identities.peek(*member).is_none() && seen.insert(*member))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let max = self.layout.max_assets;
        if fresh.len() > max {
            return Err(LibraryError::CapacityExceeded {
                unit: fresh.len(),
                max,
            });
        }
        if !self.has_room(fresh.len()) {
            self.seal();
            self.open()?;
        }

        let shard = self
            .current
            .as_mut()
            .ok_or_else(|| LibraryError::InvalidState("no open shard".into()))?;
        identities.open_shard(shard.library.ordinal, shard.library.next_identity);
        for member in fresh {
            identities.identity_of(member)?;
            shard.members.push(member);
        }
        shard.library.next_identity = identities.next_local();
        if shard.len() >= max {
            self.state = ShardState::Full;
        }
        Ok(())
    }

    /// Seal the current shard and return every shard that got members.
    pub fn finish(mut self) -> Vec<PlannedShard> {
        self.seal();
        self.sealed
    }

    fn has_room(&self, n: usize) -> bool {
        self.state == ShardState::Open
            && self
                .current
                .as_ref()
                .is_some_and(|c| c.len() + n <= self.layout.max_assets)
    }

    fn seal(&mut self) {
        if let Some(shard) = self.current.take() {
            if !shard.members.is_empty() {
                debug!(
                    shard = %shard.library.key(),
                    ordinal = shard.library.ordinal,
                    records = shard.len(),
                    "sealed shard"
                );
                self.sealed.push(shard);
            }
        }
        self.state = ShardState::Closed;
    }

    fn open(&mut self) -> LibraryResult<()> {
        let ordinal = self.next_ordinal;
        self.next_ordinal = ordinal
            .checked_add(1)
            .ok_or_else(|| LibraryError::InvalidState("shard ordinals exhausted".into()))?;
        let name = shard_name(&self.layout.library_name, self.next_index);
        self.next_index += 1;
        debug!(%name, ordinal, "opened shard");
        self.current = Some(PlannedShard {
            library: AssetLibrary::new(
                self.layout.folder.clone(),
                name,
                ordinal,
                self.layout.initial_id,
            ),
            members: Vec::new(),
            resumed: false,
        });
        self.state = ShardState::Open;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtsl_scene::{Mesh, World};
    use rtsl_types::{Identity, SurrogateRecord, SurrogateType};

    fn layout(max: usize) -> ShardLayout {
        ShardLayout {
            folder: "Scenes/Level1".into(),
            library_name: "SceneAssetLibrary".into(),
            max_assets: max,
            initial_id: 1,
        }
    }

    fn meshes(world: &mut World, n: usize) -> Vec<InstanceId> {
        (0..n).map(|_| world.insert(Mesh::default())).collect()
    }

    #[test]
    fn exactly_full_stays_one_shard() {
        let mut world = World::new();
        let ids = meshes(&mut world, 3);
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::new(layout(3), 0).unwrap();
        for id in &ids {
            sharder.accept(&[*id], &mut identities).unwrap();
        }
        assert_eq!(sharder.state(), ShardState::Full);
        let shards = sharder.finish();
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].members, ids);
        assert_eq!(shards[0].library.name, "SceneAssetLibrary");
    }

    #[test]
    fn one_more_rolls_over_to_a_second_shard() {
        let mut world = World::new();
        let ids = meshes(&mut world, 4);
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::new(layout(3), 5).unwrap();
        for id in &ids {
            sharder.accept(&[*id], &mut identities).unwrap();
        }
        let shards = sharder.finish();
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].members.len(), 3);
        assert_eq!(shards[1].members.len(), 1);
        assert_eq!(shards[1].library.name, "SceneAssetLibrary2");
        assert_eq!(shards[0].library.ordinal, 5);
        assert_eq!(shards[1].library.ordinal, 6);
        // local counters restart, ordinals keep identities distinct
        assert_eq!(identities.peek(ids[0]), Some(Identity::compose(5, 1)));
        assert_eq!(identities.peek(ids[3]), Some(Identity::compose(6, 1)));
        assert_eq!(shards[1].library.next_identity, 2);
    }

    #[test]
    fn unit_that_does_not_fit_opens_a_fresh_shard() {
        let mut world = World::new();
        let ids = meshes(&mut world, 5);
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::new(layout(3), 0).unwrap();
        sharder.accept(&ids[0..2], &mut identities).unwrap();
        sharder.accept(&ids[2..5], &mut identities).unwrap();
        let shards = sharder.finish();
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].members, ids[0..2].to_vec());
        assert_eq!(shards[1].members, ids[2..5].to_vec());
    }

    #[test]
    fn oversized_unit_fails_without_allocating() {
        let mut world = World::new();
        let ids = meshes(&mut world, 4);
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::new(layout(3), 0).unwrap();
        let err = sharder.accept(&ids, &mut identities).unwrap_err();
        assert!(matches!(err, LibraryError::CapacityExceeded { unit: 4, max: 3 }));
        assert_eq!(identities.allocated(), 0);
        assert!(sharder.finish().is_empty());
    }

    #[test]
    fn known_and_repeated_members_are_skipped() {
        let mut world = World::new();
        let ids = meshes(&mut world, 2);
        let mut identities = IdentityStore::new();
        identities.seed_known([(ids[0], Identity::compose(9, 1))]);
        let mut sharder = LibrarySharder::new(layout(3), 0).unwrap();
        sharder.accept(&[ids[0], ids[1], ids[1]], &mut identities).unwrap();
        let shards = sharder.finish();
        assert_eq!(shards[0].members, vec![ids[1]]);
        assert_eq!(identities.allocated(), 1);
    }

    #[test]
    fn resume_appends_to_last_shard_with_room() {
        let mut world = World::new();
        let ids = meshes(&mut world, 2);
        let mut existing = AssetLibrary::new("Scenes/Level1", "SceneAssetLibrary", 2, 1);
        existing
            .push(SurrogateRecord::new(
                Identity::compose(2, 1),
                SurrogateType::from_static("PersistentMesh"),
            ))
            .unwrap();
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::resume(layout(2), vec![existing], 3).unwrap();
        assert_eq!(sharder.state(), ShardState::Open);
        sharder.accept(&[ids[0]], &mut identities).unwrap();
        sharder.accept(&[ids[1]], &mut identities).unwrap();
        let shards = sharder.finish();
        assert_eq!(shards.len(), 2);
        assert!(shards[0].resumed);
        assert_eq!(identities.peek(ids[0]), Some(Identity::compose(2, 2)));
        assert!(!shards[1].resumed);
        assert_eq!(shards[1].library.ordinal, 3);
        assert_eq!(shards[1].library.name, "SceneAssetLibrary2");
    }

    #[test]
    fn resume_names_new_shards_after_the_highest_existing_one() {
        let mut world = World::new();
        let ids = meshes(&mut world, 1);
        let existing = ["SceneAssetLibrary", "SceneAssetLibrary3"]
            .iter()
            .enumerate()
            .map(|(ordinal, name)| {
                let ordinal = ordinal as u32;
                let mut lib = AssetLibrary::new("Scenes/Level1", *name, ordinal, 1);
                lib.push(SurrogateRecord::new(
                    Identity::compose(ordinal, 1),
                    SurrogateType::from_static("PersistentMesh"),
                ))
                .unwrap();
                lib
            })
            .collect();
        let mut identities = IdentityStore::new();
        let mut sharder = LibrarySharder::resume(layout(1), existing, 2).unwrap();
        assert_eq!(sharder.state(), ShardState::Full);
        sharder.accept(&ids, &mut identities).unwrap();
        let shards = sharder.finish();
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].library.name, "SceneAssetLibrary4");
        assert_eq!(shards[0].library.ordinal, 2);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            LibrarySharder::new(layout(0), 0),
            Err(LibraryError::InvalidState(_))
        ));
    }
}
