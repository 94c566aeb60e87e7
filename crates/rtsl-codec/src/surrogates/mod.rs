//! Surrogate adapters for the built-in scene and asset types.
//!
//! Each adapter is a schema built from `Object` (and for components
//! `Component`) base layers plus the type's own fields.

mod assets;
mod scene;

use rtsl_types::{Color, Quaternion, SurrogateType, Vector2, Vector3, Vector4};

use crate::codec::CodecBuilder;
use crate::error::CodecResult;

pub const GAME_OBJECT: SurrogateType = SurrogateType::from_static("PersistentGameObject");
pub const TRANSFORM: SurrogateType = SurrogateType::from_static("PersistentTransform");
pub const MESH_FILTER: SurrogateType = SurrogateType::from_static("PersistentMeshFilter");
pub const MESH_RENDERER: SurrogateType = SurrogateType::from_static("PersistentMeshRenderer");
pub const RUNTIME_ANIMATION: SurrogateType =
    SurrogateType::from_static("PersistentRuntimeAnimation");
pub const MESH: SurrogateType = SurrogateType::from_static("PersistentMesh");
pub const MATERIAL: SurrogateType = SurrogateType::from_static("PersistentMaterial");
pub const TEXTURE_2D: SurrogateType = SurrogateType::from_static("PersistentTexture2D");
pub const SPRITE: SurrogateType = SurrogateType::from_static("PersistentSprite");
pub const FONT: SurrogateType = SurrogateType::from_static("PersistentFont");
pub const RUNTIME_ANIMATION_CLIP: SurrogateType =
    SurrogateType::from_static("PersistentRuntimeAnimationClip");

/// Register every built-in object schema and value type.
pub fn register_builtin(builder: &mut CodecBuilder) -> CodecResult<()> {
    builder
        .register_value::<Vector2>("PersistentVector2")?
        .register_value::<Vector3>("PersistentVector3")?
        .register_value::<Vector4>("PersistentVector4")?
        .register_value::<Quaternion>("PersistentQuaternion")?
        .register_value::<Color>("PersistentColor")?
        .register_value::<Vec<Vector3>>("PersistentVector3Array")?;

    builder
        .register(scene::game_object()?)?
        .register(scene::transform()?)?
        .register(scene::mesh_filter()?)?
        .register(scene::mesh_renderer()?)?
        .register(scene::runtime_animation()?)?;

    builder
        .register(assets::mesh()?)?
        .register(assets::material()?)?
        .register(assets::texture_2d()?)?
        .register(assets::sprite()?)?
        .register(assets::font()?)?
        .register(assets::runtime_animation_clip()?)?;
    Ok(())
}
