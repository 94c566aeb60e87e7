use rtsl_scene::{GameObject, MeshFilter, MeshRenderer, RuntimeAnimation, Transform};

use super::{GAME_OBJECT, MESH_FILTER, MESH_RENDERER, RUNTIME_ANIMATION, TRANSFORM};
use crate::error::CodecResult;
use crate::schema::{component_layer, object_layer, Layer, SchemaBuilder, SurrogateSchema};

/// Components and children are parts: a hierarchy is placed in one shard.
pub(super) fn game_object() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<GameObject>::new(GAME_OBJECT)
        .layer(object_layer())
        .layer(
            Layer::new("GameObject")
                .primitive("active", |g: &GameObject| g.active, |g: &mut GameObject, v| g.active = v)
                .primitive("layer", |g: &GameObject| g.layer, |g: &mut GameObject, v| g.layer = v)
                .primitive(
                    "tag",
                    |g: &GameObject| g.tag.clone(),
                    |g: &mut GameObject, v| g.tag = v,
                )
                .reference(
                    "transform",
                    |g: &GameObject| g.transform,
                    |g: &mut GameObject, v| g.transform = v,
                )
                .parts(
                    "components",
                    |g: &GameObject| g.components.clone(),
                    |g: &mut GameObject, v| g.components = v,
                )
                .parts(
                    "children",
                    |g: &GameObject| g.children.clone(),
                    |g: &mut GameObject, v| g.children = v,
                )
                .reference(
                    "parent",
                    |g: &GameObject| g.parent,
                    |g: &mut GameObject, v| g.parent = v,
                ),
        )
        .build()
}

pub(super) fn transform() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Transform>::new(TRANSFORM)
        .layer(object_layer())
        .layer(component_layer())
        .layer(
            Layer::new("Transform")
                .value(
                    "local_position",
                    |t: &Transform| t.local_position,
                    |t: &mut Transform, v| t.local_position = v,
                )
                .value(
                    "local_rotation",
                    |t: &Transform| t.local_rotation,
                    |t: &mut Transform, v| t.local_rotation = v,
                )
                .value(
                    "local_scale",
                    |t: &Transform| t.local_scale,
                    |t: &mut Transform, v| t.local_scale = v,
                ),
        )
        .build()
}

pub(super) fn mesh_filter() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<MeshFilter>::new(MESH_FILTER)
        .layer(object_layer())
        .layer(component_layer())
        .layer(Layer::new("MeshFilter").reference(
            "shared_mesh",
            |f: &MeshFilter| f.shared_mesh,
            |f: &mut MeshFilter, v| f.shared_mesh = v,
        ))
        .build()
}

pub(super) fn mesh_renderer() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<MeshRenderer>::new(MESH_RENDERER)
        .layer(object_layer())
        .layer(component_layer())
        .layer(
            Layer::new("MeshRenderer")
                .primitive(
                    "enabled",
                    |r: &MeshRenderer| r.enabled,
                    |r: &mut MeshRenderer, v| r.enabled = v,
                )
                .primitive(
                    "cast_shadows",
                    |r: &MeshRenderer| r.cast_shadows,
                    |r: &mut MeshRenderer, v| r.cast_shadows = v,
                )
                .primitive(
                    "receive_shadows",
                    |r: &MeshRenderer| r.receive_shadows,
                    |r: &mut MeshRenderer, v| r.receive_shadows = v,
                )
                .references(
                    "shared_materials",
                    |r: &MeshRenderer| r.shared_materials.clone(),
                    |r: &mut MeshRenderer, v| r.shared_materials = v,
                ),
        )
        .build()
}

/// Clips are stored before the index so the index is applied last.
pub(super) fn runtime_animation() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<RuntimeAnimation>::new(RUNTIME_ANIMATION)
        .layer(object_layer())
        .layer(component_layer())
        .layer(
            Layer::new("RuntimeAnimation")
                .references(
                    "clips",
                    |a: &RuntimeAnimation| a.clips.clone(),
                    |a: &mut RuntimeAnimation, v| a.clips = v,
                )
                .primitive(
                    "clip_index",
                    |a: &RuntimeAnimation| a.clip_index,
                    |a: &mut RuntimeAnimation, v| a.clip_index = v,
                )
                .primitive(
                    "play_on_awake",
                    |a: &RuntimeAnimation| a.play_on_awake,
                    |a: &mut RuntimeAnimation, v| a.play_on_awake = v,
                )
                .primitive(
                    "looping",
                    |a: &RuntimeAnimation| a.looping,
                    |a: &mut RuntimeAnimation, v| a.looping = v,
                ),
        )
        .build()
}
