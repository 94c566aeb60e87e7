use rtsl_types::{Color, Vector2, Vector3, Vector4};

use crate::impl_runtime_object;
use crate::object::{InstanceId, ObjectBase};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub base: ObjectBase,
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub triangles: Vec<i32>,
    pub bounds_center: Vector3,
    pub bounds_size: Vector3,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vector3>, triangles: Vec<i32>) -> Self {
        let mut mesh = Self {
            base: ObjectBase::named(name),
            vertices,
            triangles,
            ..Self::default()
        };
        mesh.recalculate_bounds();
        mesh
    }

    /// Axis-aligned bounds of the vertex set.
    pub fn recalculate_bounds(&mut self) {
        let Some(first) = self.vertices.first().copied() else {
            self.bounds_center = Vector3::ZERO;
            self.bounds_size = Vector3::ZERO;
            return;
        };
        let (min, max) = self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Vector3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Vector3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        });
        self.bounds_center = Vector3::new(
            (min.x + max.x) * 0.5,
            (min.y + max.y) * 0.5,
            (min.z + max.z) * 0.5,
        );
        self.bounds_size = Vector3::new(max.x - min.x, max.y - min.y, max.z - min.z);
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub base: ObjectBase,
    pub shader: String,
    pub color: Color,
    pub main_texture: Option<InstanceId>,
    pub render_queue: i32,
    pub keywords: Vec<String>,
}

impl Material {
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::named(name),
            shader: shader.into(),
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            shader: "Standard".into(),
            color: Color::WHITE,
            main_texture: None,
            render_queue: 2000,
            keywords: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture2D {
    pub base: ObjectBase,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A rectangular region of a texture, drawn by UI and sprite renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub base: ObjectBase,
    pub texture: Option<InstanceId>,
    /// Region of the texture in pixels: x, y, width, height.
    pub rect: Vector4,
    /// Pivot relative to the rect, `(0.5, 0.5)` is the center.
    pub pivot: Vector2,
    pub pixels_per_unit: f32,
    /// Nine-slice border in pixels: left, bottom, right, top.
    pub border: Vector4,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            texture: None,
            rect: Vector4::default(),
            pivot: Vector2 { x: 0.5, y: 0.5 },
            pixels_per_unit: 100.0,
            border: Vector4::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub base: ObjectBase,
    pub font_size: i32,
    pub line_height: f32,
    pub font_names: Vec<String>,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            font_size: 16,
            line_height: 18.0,
            font_names: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeAnimationClip {
    pub base: ObjectBase,
    pub length: f32,
    pub frame_rate: f32,
    pub properties: Vec<String>,
}

impl Default for RuntimeAnimationClip {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            length: 1.0,
            frame_rate: 60.0,
            properties: Vec::new(),
        }
    }
}

impl_runtime_object!(Mesh, Material, Texture2D, Sprite, Font, RuntimeAnimationClip);
