//! Closure traversal in both directions.
//!
//! # Invariants
//!
//! - Every object reachable from the roots through reference fields is in
//!   the closure, and none twice.
//! - Membership does not depend on [`TraversalOrder`]; layout order does.
//! - Dependencies are expanded in field declaration order, base layers
//!   first, so the order is reproducible for a given graph.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use rtsl_codec::{Codec, IdentityStore, RecordSource};
use rtsl_scene::{InstanceId, World};
use rtsl_types::Identity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CollectError, CollectResult};

/// Order in which the closure is discovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    #[default]
    BreadthFirst,
    DepthFirst,
}

/// Closure of live instances.
#[derive(Clone, Debug, Default)]
pub struct LiveClosure {
    order: Vec<InstanceId>,
    members: HashSet<InstanceId>,
    external: Vec<InstanceId>,
}

impl LiveClosure {
    /// Members in discovery order.
    pub fn order(&self) -> &[InstanceId] {
        &self.order
    }

    /// Already-known instances that were referenced but not traversed.
    pub fn external(&self) -> &[InstanceId] {
        &self.external
    }

    pub fn contains(&self, instance: InstanceId) -> bool {
        self.members.contains(&instance)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Closure of record identities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordClosure {
    order: Vec<Identity>,
}

impl RecordClosure {
    pub fn order(&self) -> &[Identity] {
        &self.order
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.order.contains(&identity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Computes dependency closures using the codec's dependency enumeration.
#[derive(Clone, Copy, Debug)]
pub struct DependencyCollector<'a> {
    codec: &'a Codec,
    order: TraversalOrder,
}

impl<'a> DependencyCollector<'a> {
    pub fn new(codec: &'a Codec) -> Self {
        Self {
            codec,
            order: TraversalOrder::default(),
        }
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    // ---------------------------------------------------------------
    // Live direction
    // ---------------------------------------------------------------

    /// Everything reachable from `roots` in `world`.
    ///
    /// Instances known to `identities` (persisted by an earlier pass) are
    /// recorded as external and not traversed.
    pub fn collect_live(
        &self,
        world: &World,
        roots: &[InstanceId],
        identities: &IdentityStore,
    ) -> CollectResult<LiveClosure> {
        let mut external = Vec::new();
        let mut external_seen = HashSet::new();
        let mut start = Vec::with_capacity(roots.len());
        for &root in roots {
            if !world.contains(root) {
                return Err(CollectError::MissingInstance {
                    instance: root,
                    referrer: None,
                });
            }
            if identities.is_known(root) {
                if external_seen.insert(root) {
                    external.push(root);
                }
            } else {
                start.push(root);
            }
        }

        let order = traverse(self.order, &start, |instance| {
            let mut next = Vec::new();
            for dep in self.codec.live_dependencies_of(world, instance)? {
                if !world.contains(dep) {
                    return Err(CollectError::MissingInstance {
                        instance: dep,
                        referrer: Some(instance),
                    });
                }
                if identities.is_known(dep) {
                    if external_seen.insert(dep) {
                        external.push(dep);
                    }
                } else {
                    next.push(dep);
                }
            }
            Ok(next)
        })?;

        debug!(
            roots = roots.len(),
            collected = order.len(),
            external = external.len(),
            order = ?self.order,
            "collected live closure"
        );
        Ok(LiveClosure {
            members: order.iter().copied().collect(),
            order,
            external,
        })
    }

    // ---------------------------------------------------------------
    // Record direction
    // ---------------------------------------------------------------

    /// Everything reachable from `roots` through record reference fields.
    ///
    /// Fails on the first identity that has no record in `source`.
    pub fn collect_records<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        roots: &[Identity],
    ) -> CollectResult<RecordClosure> {
        for &root in roots {
            if source.record(root).is_none() {
                return Err(CollectError::DanglingReference {
                    identity: root,
                    referrer: None,
                });
            }
        }

        let order = traverse(self.order, roots, |identity| {
            let record = source
                .record(identity)
                .ok_or(CollectError::DanglingReference {
                    identity,
                    referrer: None,
                })?;
            let deps = self.codec.dependencies_of(record)?;
            if let Some(missing) = deps.iter().find(|d| source.record(**d).is_none()) {
                return Err(CollectError::DanglingReference {
                    identity: *missing,
                    referrer: Some(identity),
                });
            }
            Ok(deps)
        })?;

        debug!(roots = roots.len(), collected = order.len(), "collected record closure");
        Ok(RecordClosure { order })
    }
}

/// Visit every node reachable from `roots` once. Breadth-first marks nodes
/// when queued; depth-first marks them when visited (preorder).
fn traverse<N, F>(order: TraversalOrder, roots: &[N], mut expand: F) -> CollectResult<Vec<N>>
where
    N: Copy + Eq + Hash,
    F: FnMut(N) -> CollectResult<Vec<N>>,
{
    let mut visited = HashSet::new();
    let mut out = Vec::new();

    match order {
        TraversalOrder::BreadthFirst => {
            let mut queue = VecDeque::new();
            for &root in roots {
                if visited.insert(root) {
                    queue.push_back(root);
                }
            }
            while let Some(node) = queue.pop_front() {
                out.push(node);
                for dep in expand(node)? {
                    if visited.insert(dep) {
                        queue.push_back(dep);
                    }
                }
            }
        }
        TraversalOrder::DepthFirst => {
            let mut stack: Vec<N> = roots.iter().rev().copied().collect();
            while let Some(node) = stack.pop() {
                if !visited.insert(node) {
                    continue;
                }
                out.push(node);
                let deps = expand(node)?;
                stack.extend(deps.into_iter().rev().filter(|d| !visited.contains(d)));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use rtsl_codec::CodecError;
    use rtsl_scene::{
        impl_runtime_object, GameObject, Material, Mesh, MeshFilter, MeshRenderer, ObjectBase,
    };
    use rtsl_types::{FieldValue, SurrogateRecord, SurrogateType};

    fn codec() -> Codec {
        Codec::with_builtin_surrogates().unwrap()
    }

    /// A game object with two filters sharing one mesh. Returns the game
    /// object, the mesh and the first filter.
    fn diamond(world: &mut World) -> (InstanceId, InstanceId, InstanceId) {
        let root = world.spawn_game_object("root");
        let mesh = world.insert(Mesh::default());
        let first = world.add_component(root, MeshFilter::with_mesh(mesh)).unwrap();
        world.add_component(root, MeshFilter::with_mesh(mesh)).unwrap();
        (root, mesh, first)
    }

    #[test]
    fn shared_dependency_collected_once() {
        let codec = codec();
        let mut world = World::new();
        let (root, mesh, _) = diamond(&mut world);
        let closure = DependencyCollector::new(&codec)
            .collect_live(&world, &[root, root], &IdentityStore::new())
            .unwrap();
        // root, transform, two filters, mesh
        assert_eq!(closure.len(), 5);
        assert_eq!(closure.order()[0], root);
        assert_eq!(closure.order().iter().filter(|i| **i == mesh).count(), 1);
    }

    #[test]
    fn breadth_and_depth_first_differ_in_order_only() {
        let codec = codec();
        let mut world = World::new();
        let root = world.spawn_game_object("root");
        let child = world.spawn_game_object("child");
        world.set_parent(child, Some(root)).unwrap();
        let mesh = world.insert(Mesh::default());
        world.add_component(root, MeshFilter::with_mesh(mesh)).unwrap();

        let bfs = DependencyCollector::new(&codec)
            .collect_live(&world, &[root], &IdentityStore::new())
            .unwrap();
        let dfs = DependencyCollector::new(&codec)
            .with_order(TraversalOrder::DepthFirst)
            .collect_live(&world, &[root], &IdentityStore::new())
            .unwrap();
        assert_ne!(bfs.order(), dfs.order());
        let a: HashSet<_> = bfs.order().iter().collect();
        let b: HashSet<_> = dfs.order().iter().collect();
        assert_eq!(a, b);

        // depth first reaches the mesh (through the filter) before the child
        let pos = |order: &[InstanceId], id| order.iter().position(|i| *i == id).unwrap();
        assert!(pos(dfs.order(), mesh) < pos(dfs.order(), child));
        assert!(pos(bfs.order(), child) < pos(bfs.order(), mesh));
    }

    #[test]
    fn repeated_collection_is_deterministic() {
        let codec = codec();
        let mut world = World::new();
        let (root, _, _) = diamond(&mut world);
        let collector = DependencyCollector::new(&codec);
        let first = collector
            .collect_live(&world, &[root], &IdentityStore::new())
            .unwrap();
        let second = collector
            .collect_live(&world, &[root], &IdentityStore::new())
            .unwrap();
        assert_eq!(first.order(), second.order());
    }

    #[test]
    fn known_instances_are_external() {
        let codec = codec();
        let mut world = World::new();
        let (root, mesh, _) = diamond(&mut world);
        let mut ids = IdentityStore::new();
        ids.seed_known([(mesh, Identity::compose(0, 4))]);
        let closure = DependencyCollector::new(&codec)
            .collect_live(&world, &[root], &ids)
            .unwrap();
        assert!(!closure.contains(mesh));
        assert_eq!(closure.external(), &[mesh]);
        assert_eq!(closure.len(), 4);
    }

    #[test]
    fn removed_target_is_missing_instance() {
        let codec = codec();
        let mut world = World::new();
        let (root, mesh, filter) = diamond(&mut world);
        world.remove(mesh);
        let err = DependencyCollector::new(&codec)
            .collect_live(&world, &[root], &IdentityStore::new())
            .unwrap_err();
        assert_eq!(
            err,
            CollectError::MissingInstance {
                instance: mesh,
                referrer: Some(filter),
            }
        );
    }

    #[derive(Debug, Default)]
    struct Unregistered {
        base: ObjectBase,
    }

    impl_runtime_object!(Unregistered);

    #[test]
    fn unregistered_type_fails_collection() {
        let codec = codec();
        let mut world = World::new();
        let odd = world.insert(Unregistered::default());
        let err = DependencyCollector::new(&codec)
            .collect_live(&world, &[odd], &IdentityStore::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CollectError::Codec(CodecError::UnregisteredType(_))
        ));
    }

    fn renderer_record(local: u32, materials: &[u32]) -> SurrogateRecord {
        SurrogateRecord::new(
            Identity::compose(0, local),
            SurrogateType::from_static("PersistentMeshRenderer"),
        )
        .with_field(
            "shared_materials",
            FieldValue::RefList(materials.iter().map(|m| Identity::compose(0, *m)).collect()),
        )
    }

    fn material_record(local: u32) -> SurrogateRecord {
        SurrogateRecord::new(
            Identity::compose(0, local),
            SurrogateType::from_static("PersistentMaterial"),
        )
    }

    #[test]
    fn record_closure_follows_references() {
        let codec = codec();
        let source: BTreeMap<_, _> = [
            renderer_record(1, &[2, 3, 2]),
            material_record(2),
            material_record(3),
            material_record(4),
        ]
        .into_iter()
        .map(|r| (r.identity, r))
        .collect();
        let closure = DependencyCollector::new(&codec)
            .collect_records(&source, &[Identity::compose(0, 1)])
            .unwrap();
        assert_eq!(
            closure.order(),
            &[
                Identity::compose(0, 1),
                Identity::compose(0, 2),
                Identity::compose(0, 3)
            ]
        );
        assert!(!closure.contains(Identity::compose(0, 4)));
    }

    #[test]
    fn record_closure_reports_dangling_with_referrer() {
        let codec = codec();
        let source: BTreeMap<_, _> = [renderer_record(1, &[2]), material_record(3)]
            .into_iter()
            .map(|r| (r.identity, r))
            .collect();
        let err = DependencyCollector::new(&codec)
            .collect_records(&source, &[Identity::compose(0, 1)])
            .unwrap_err();
        assert_eq!(
            err,
            CollectError::DanglingReference {
                identity: Identity::compose(0, 2),
                referrer: Some(Identity::compose(0, 1)),
            }
        );
        let err = DependencyCollector::new(&codec)
            .collect_records(&source, &[Identity::compose(0, 8)])
            .unwrap_err();
        assert!(matches!(err, CollectError::DanglingReference { referrer: None, .. }));
    }

    #[test]
    fn traversal_order_serializes_snake_case() {
        let json = serde_json::to_string(&TraversalOrder::DepthFirst).unwrap();
        assert_eq!(json, "\"depth_first\"");
    }

    proptest! {
        /// Random renderer -> material graphs: both orders visit the same set.
        #[test]
        fn membership_independent_of_order(
            links in proptest::collection::vec(proptest::collection::vec(0usize..6, 0..4), 1..6)
        ) {
            let codec = codec();
            let mut world = World::new();
            let materials: Vec<_> = (0..6).map(|_| world.insert(Material::default())).collect();
            let holder = world.spawn_game_object("holder");
            for targets in &links {
                let mats = targets.iter().map(|i| materials[*i]).collect();
                world.add_component(holder, MeshRenderer::with_materials(mats)).unwrap();
            }
            let ids = IdentityStore::new();
            let bfs = DependencyCollector::new(&codec).collect_live(&world, &[holder], &ids).unwrap();
            let dfs = DependencyCollector::new(&codec)
                .with_order(TraversalOrder::DepthFirst)
                .collect_live(&world, &[holder], &ids)
                .unwrap();
            let a: HashSet<_> = bfs.order().iter().copied().collect();
            let b: HashSet<_> = dfs.order().iter().copied().collect();
            prop_assert_eq!(a.len(), bfs.len());
            prop_assert_eq!(a, b);
            let go = world.get_as::<GameObject>(holder).unwrap();
            prop_assert!(go.components.iter().all(|c| bfs.contains(*c)));
        }
    }
}
