use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use rtsl_types::RuntimeType;
use tracing::debug;

use crate::components::{GameObject, Transform};
use crate::error::{SceneError, SceneResult};
use crate::object::{Component, InstanceId, RuntimeObject};

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// Arena of live runtime objects.
///
/// Instance indices are handed out monotonically and never reused, so a
/// removed object's handle stays dangling instead of aliasing a newer object.
/// Iteration is in handle order.
#[derive(Debug)]
pub struct World {
    id: u32,
    next_index: u32,
    objects: BTreeMap<InstanceId, Box<dyn RuntimeObject>>,
}

impl World {
    /// Create an empty world with a fresh world id.
    pub fn new() -> Self {
        Self {
            id: NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed),
            next_index: 1,
            objects: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ---------------------------------------------------------------
    // Arena access
    // ---------------------------------------------------------------

    pub fn insert<T: RuntimeObject>(&mut self, object: T) -> InstanceId {
        self.insert_boxed(Box::new(object))
    }

    pub fn insert_boxed(&mut self, object: Box<dyn RuntimeObject>) -> InstanceId {
        let id = InstanceId::new(self.id, self.next_index);
        self.next_index += 1;
        self.objects.insert(id, object);
        id
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&dyn RuntimeObject> {
        self.objects.get(&id).map(|obj| obj.as_ref())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut dyn RuntimeObject> {
        match self.objects.get_mut(&id) {
            Some(obj) => Some(obj.as_mut()),
            None => None,
        }
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<Box<dyn RuntimeObject>> {
        self.objects.remove(&id)
    }

    /// Typed access; `None` if absent or of another type.
    pub fn downcast<T: RuntimeObject>(&self, id: InstanceId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: RuntimeObject>(&mut self, id: InstanceId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Typed access that distinguishes "missing" from "wrong type".
    pub fn get_as<T: RuntimeObject>(&self, id: InstanceId) -> SceneResult<&T> {
        let obj = self.get(id).ok_or(SceneError::NotFound(id))?;
        let actual = obj.runtime_type().short_name();
        obj.as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| SceneError::WrongType {
                id,
                expected: RuntimeType::of::<T>().short_name(),
                actual,
            })
    }

    pub fn get_as_mut<T: RuntimeObject>(&mut self, id: InstanceId) -> SceneResult<&mut T> {
        let actual = self
            .get(id)
            .ok_or(SceneError::NotFound(id))?
            .runtime_type()
            .short_name();
        self.downcast_mut::<T>(id).ok_or(SceneError::WrongType {
            id,
            expected: RuntimeType::of::<T>().short_name(),
            actual,
        })
    }

    pub fn runtime_type(&self, id: InstanceId) -> Option<RuntimeType> {
        self.get(id).map(|obj| obj.runtime_type())
    }

    /// All handles in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.objects.keys().copied()
    }

    // ---------------------------------------------------------------
    // Scene building
    // ---------------------------------------------------------------

    /// Create a game object with its transform attached.
    pub fn spawn_game_object(&mut self, name: impl Into<String>) -> InstanceId {
        let go = self.insert(GameObject::new(name));
        let transform = self.insert(Transform {
            game_object: Some(go),
            ..Transform::default()
        });
        if let Some(obj) = self.downcast_mut::<GameObject>(go) {
            obj.transform = Some(transform);
            obj.components.push(transform);
        }
        debug!(%go, %transform, "spawned game object");
        go
    }

    /// Attach a component to a game object.
    pub fn add_component<C: Component>(
        &mut self,
        game_object: InstanceId,
        mut component: C,
    ) -> SceneResult<InstanceId> {
        self.get_as::<GameObject>(game_object)?;
        component.set_game_object(Some(game_object));
        let id = self.insert(component);
        self.get_as_mut::<GameObject>(game_object)?.components.push(id);
        Ok(id)
    }

    /// The first attached component of type `C`.
    pub fn component<C: Component>(&self, game_object: InstanceId) -> Option<InstanceId> {
        let go = self.downcast::<GameObject>(game_object)?;
        go.components
            .iter()
            .copied()
            .find(|c| self.downcast::<C>(*c).is_some())
    }

    /// Re-parent `child` under `parent` (or make it a root with `None`).
    pub fn set_parent(&mut self, child: InstanceId, parent: Option<InstanceId>) -> SceneResult<()> {
        self.get_as::<GameObject>(child)?;
        if let Some(parent) = parent {
            self.get_as::<GameObject>(parent)?;
            if parent == child || self.is_ancestor(child, parent) {
                return Err(SceneError::HierarchyCycle { child, parent });
            }
        }

        let old = self.get_as::<GameObject>(child)?.parent;
        if let Some(old) = old {
            if let Some(old_parent) = self.downcast_mut::<GameObject>(old) {
                old_parent.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            self.get_as_mut::<GameObject>(parent)?.children.push(child);
        }
        self.get_as_mut::<GameObject>(child)?.parent = parent;
        Ok(())
    }

    /// Returns `true` if `ancestor` is above `node` in the hierarchy.
    pub fn is_ancestor(&self, ancestor: InstanceId, node: InstanceId) -> bool {
        let mut current = self.downcast::<GameObject>(node).and_then(|go| go.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.downcast::<GameObject>(id).and_then(|go| go.parent);
        }
        false
    }

    /// Game objects without a parent, in handle order.
    pub fn root_game_objects(&self) -> Vec<InstanceId> {
        self.objects
            .iter()
            .filter_map(|(id, obj)| {
                obj.as_any()
                    .downcast_ref::<GameObject>()
                    .filter(|go| go.parent.is_none())
                    .map(|_| *id)
            })
            .collect()
    }

    /// First object (in handle order) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<InstanceId> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name() == name)
            .map(|(id, _)| *id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
