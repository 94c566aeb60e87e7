use rtsl_types::{Quaternion, Vector3};

use crate::object::{InstanceId, ObjectBase};
use crate::{impl_component, impl_runtime_object};

/// A node in the scene hierarchy.
///
/// Hierarchy links are held here rather than on the transform: `parent` and
/// `children` point at other game objects, `components` at the components
/// attached to this one (the transform included).
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    pub base: ObjectBase,
    pub active: bool,
    pub layer: i32,
    pub tag: String,
    pub transform: Option<InstanceId>,
    pub components: Vec<InstanceId>,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
}

impl GameObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::named(name),
            ..Self::default()
        }
    }
}

impl Default for GameObject {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            active: true,
            layer: 0,
            tag: "Untagged".into(),
            transform: None,
            components: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub base: ObjectBase,
    pub game_object: Option<InstanceId>,
    pub local_position: Vector3,
    pub local_rotation: Quaternion,
    pub local_scale: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            game_object: None,
            local_position: Vector3::ZERO,
            local_rotation: Quaternion::IDENTITY,
            local_scale: Vector3::ONE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshFilter {
    pub base: ObjectBase,
    pub game_object: Option<InstanceId>,
    pub shared_mesh: Option<InstanceId>,
}

impl MeshFilter {
    pub fn with_mesh(mesh: InstanceId) -> Self {
        Self {
            shared_mesh: Some(mesh),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshRenderer {
    pub base: ObjectBase,
    pub game_object: Option<InstanceId>,
    pub enabled: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub shared_materials: Vec<InstanceId>,
}

impl MeshRenderer {
    pub fn with_materials(materials: Vec<InstanceId>) -> Self {
        Self {
            shared_materials: materials,
            ..Self::default()
        }
    }
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            game_object: None,
            enabled: true,
            cast_shadows: true,
            receive_shadows: true,
            shared_materials: Vec::new(),
        }
    }
}

/// Plays one of a list of clips.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeAnimation {
    pub base: ObjectBase,
    pub game_object: Option<InstanceId>,
    pub clips: Vec<InstanceId>,
    pub clip_index: i32,
    pub play_on_awake: bool,
    pub looping: bool,
}

impl RuntimeAnimation {
    /// Replace the clip list, clamping the index into range.
    pub fn set_clips(&mut self, clips: Vec<InstanceId>, clip_index: i32) {
        let last = clips.len() as i32 - 1;
        self.clip_index = if last < 0 { 0 } else { clip_index.clamp(0, last) };
        self.clips = clips;
    }

    pub fn current_clip(&self) -> Option<InstanceId> {
        usize::try_from(self.clip_index)
            .ok()
            .and_then(|i| self.clips.get(i).copied())
    }
}

impl_runtime_object!(GameObject);
impl_component!(Transform, MeshFilter, MeshRenderer, RuntimeAnimation);
