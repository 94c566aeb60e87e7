//! The fixed set of engine built-in assets.
//!
//! Every scene may reference these, so they are saved once into a dedicated
//! shard and never re-embedded into scene shards.

use rtsl_types::{Color, Vector3, Vector4};
use tracing::debug;

use crate::assets::{Font, Material, Mesh, Sprite};
use crate::object::{InstanceId, ObjectBase};
use crate::world::World;

/// Built-in primitive meshes, in installation order.
pub const BUILTIN_MESHES: &[&str] = &[
    "New-Sphere",
    "New-Capsule",
    "New-Cylinder",
    "Cube",
    "New-Plane",
    "Quad",
];

/// Built-in materials, in installation order.
pub const BUILTIN_MATERIALS: &[&str] = &[
    "Default-Line",
    "Default-Material",
    "Default-Particle",
    "Default-Skybox",
    "Sprites-Default",
    "Sprites-Mask",
];

/// Built-in UI skin sprites, in installation order.
pub const BUILTIN_SPRITES: &[&str] = &[
    "Background",
    "Checkmark",
    "DropdownArrow",
    "InputFieldBackground",
    "Knob",
    "UIMask",
    "UISprite",
];

/// Built-in fonts, in installation order.
pub const BUILTIN_FONTS: &[&str] = &["Arial"];

/// Handles of the built-in assets installed into one world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltinAssets {
    entries: Vec<(&'static str, InstanceId)>,
}

impl BuiltinAssets {
    /// Create every built-in asset in `world`.
    pub fn install(world: &mut World) -> Self {
        let mut entries = Vec::new();
        for &name in BUILTIN_MESHES {
            entries.push((name, world.insert(primitive_mesh(name))));
        }
        for &name in BUILTIN_MATERIALS {
            entries.push((name, world.insert(builtin_material(name))));
        }
        for &name in BUILTIN_SPRITES {
            entries.push((name, world.insert(builtin_sprite(name))));
        }
        for &name in BUILTIN_FONTS {
            entries.push((
                name,
                world.insert(Font {
                    base: ObjectBase::named(name),
                    font_names: vec![name.to_string()],
                    ..Font::default()
                }),
            ));
        }
        debug!(world = world.id(), count = entries.len(), "installed built-in assets");
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<InstanceId> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| *id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.iter().any(|(_, i)| *i == id)
    }

    /// Handles in installation order.
    pub fn ids(&self) -> Vec<InstanceId> {
        self.entries.iter().map(|(_, id)| *id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, InstanceId)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cube(&self) -> Option<InstanceId> {
        self.get("Cube")
    }

    pub fn default_material(&self) -> Option<InstanceId> {
        self.get("Default-Material")
    }
}

fn builtin_material(name: &str) -> Material {
    let shader = match name {
        "Default-Line" | "Default-Particle" => "Particles/Standard Unlit",
        "Default-Skybox" => "Skybox/Procedural",
        "Sprites-Default" => "Sprites/Default",
        "Sprites-Mask" => "Sprites/Mask",
        _ => "Standard",
    };
    Material {
        color: Color::WHITE,
        ..Material::new(name, shader)
    }
}

/// UI skin sprites carry their nine-slice layout; the skin atlas texture
/// itself is engine-owned and not part of the built-in set.
fn builtin_sprite(name: &str) -> Sprite {
    let (size, border) = match name {
        "Checkmark" | "DropdownArrow" => (32.0, 0.0),
        "Knob" => (20.0, 0.0),
        _ => (32.0, 10.0),
    };
    Sprite {
        base: ObjectBase::named(name),
        rect: Vector4 {
            x: 0.0,
            y: 0.0,
            z: size,
            w: size,
        },
        border: Vector4 {
            x: border,
            y: border,
            z: border,
            w: border,
        },
        ..Sprite::default()
    }
}

fn primitive_mesh(name: &str) -> Mesh {
    let (vertices, triangles) = match name {
        "Cube" => cube(),
        "Quad" => quad(),
        "New-Plane" => plane(),
        "New-Cylinder" => ring_prism(8, 1.0),
        "New-Capsule" => ring_prism(8, 2.0),
        _ => octahedron(),
    };
    Mesh::new(name, vertices, triangles)
}

fn cube() -> (Vec<Vector3>, Vec<i32>) {
    let mut vertices = Vec::with_capacity(8);
    for &x in &[-0.5, 0.5] {
        for &y in &[-0.5, 0.5] {
            for &z in &[-0.5, 0.5] {
                vertices.push(Vector3::new(x, y, z));
            }
        }
    }
    let triangles = vec![
        0, 1, 3, 0, 3, 2, // -x
        4, 6, 7, 4, 7, 5, // +x
        0, 4, 5, 0, 5, 1, // -y
        2, 3, 7, 2, 7, 6, // +y
        0, 2, 6, 0, 6, 4, // -z
        1, 5, 7, 1, 7, 3, // +z
    ];
    (vertices, triangles)
}

fn quad() -> (Vec<Vector3>, Vec<i32>) {
    let vertices = vec![
        Vector3::new(-0.5, -0.5, 0.0),
        Vector3::new(0.5, -0.5, 0.0),
        Vector3::new(-0.5, 0.5, 0.0),
        Vector3::new(0.5, 0.5, 0.0),
    ];
    (vertices, vec![0, 2, 1, 2, 3, 1])
}

fn plane() -> (Vec<Vector3>, Vec<i32>) {
    let vertices = vec![
        Vector3::new(-5.0, 0.0, -5.0),
        Vector3::new(5.0, 0.0, -5.0),
        Vector3::new(-5.0, 0.0, 5.0),
        Vector3::new(5.0, 0.0, 5.0),
    ];
    (vertices, vec![0, 2, 1, 2, 3, 1])
}

fn octahedron() -> (Vec<Vector3>, Vec<i32>) {
    let vertices = vec![
        Vector3::new(0.5, 0.0, 0.0),
        Vector3::new(-0.5, 0.0, 0.0),
        Vector3::new(0.0, 0.5, 0.0),
        Vector3::new(0.0, -0.5, 0.0),
        Vector3::new(0.0, 0.0, 0.5),
        Vector3::new(0.0, 0.0, -0.5),
    ];
    let triangles = vec![
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, //
        2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
    ];
    (vertices, triangles)
}

/// Side walls of an n-gon prism of the given height, centered on the origin.
fn ring_prism(segments: usize, height: f32) -> (Vec<Vector3>, Vec<i32>) {
    let half = height * 0.5;
    let mut vertices = Vec::with_capacity(segments * 2);
    for i in 0..segments {
        let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
        let (s, c) = angle.sin_cos();
        vertices.push(Vector3::new(c * 0.5, -half, s * 0.5));
        vertices.push(Vector3::new(c * 0.5, half, s * 0.5));
    }
    let n = segments as i32;
    let mut triangles = Vec::with_capacity(segments * 6);
    for i in 0..n {
        let a = 2 * i;
        let b = 2 * ((i + 1) % n);
        triangles.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
    }
    (vertices, triangles)
}
