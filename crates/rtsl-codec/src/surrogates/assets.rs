use rtsl_scene::{Font, Material, Mesh, RuntimeAnimationClip, Sprite, Texture2D};

use super::{FONT, MATERIAL, MESH, RUNTIME_ANIMATION_CLIP, SPRITE, TEXTURE_2D};
use crate::error::CodecResult;
use crate::schema::{object_layer, Layer, SchemaBuilder, SurrogateSchema};

pub(super) fn mesh() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Mesh>::new(MESH)
        .layer(object_layer())
        .layer(
            Layer::new("Mesh")
                .value(
                    "vertices",
                    |m: &Mesh| m.vertices.clone(),
                    |m: &mut Mesh, v| m.vertices = v,
                )
                .value(
                    "normals",
                    |m: &Mesh| m.normals.clone(),
                    |m: &mut Mesh, v| m.normals = v,
                )
                .primitive(
                    "triangles",
                    |m: &Mesh| m.triangles.clone(),
                    |m: &mut Mesh, v| m.triangles = v,
                )
                .value(
                    "bounds_center",
                    |m: &Mesh| m.bounds_center,
                    |m: &mut Mesh, v| m.bounds_center = v,
                )
                .value(
                    "bounds_size",
                    |m: &Mesh| m.bounds_size,
                    |m: &mut Mesh, v| m.bounds_size = v,
                ),
        )
        .build()
}

pub(super) fn material() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Material>::new(MATERIAL)
        .layer(object_layer())
        .layer(
            Layer::new("Material")
                .primitive(
                    "shader",
                    |m: &Material| m.shader.clone(),
                    |m: &mut Material, v| m.shader = v,
                )
                .value("color", |m: &Material| m.color, |m: &mut Material, v| m.color = v)
                .reference(
                    "main_texture",
                    |m: &Material| m.main_texture,
                    |m: &mut Material, v| m.main_texture = v,
                )
                .primitive(
                    "render_queue",
                    |m: &Material| m.render_queue,
                    |m: &mut Material, v| m.render_queue = v,
                )
                .primitive(
                    "keywords",
                    |m: &Material| m.keywords.clone(),
                    |m: &mut Material, v| m.keywords = v,
                ),
        )
        .build()
}

pub(super) fn texture_2d() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Texture2D>::new(TEXTURE_2D)
        .layer(object_layer())
        .layer(
            Layer::new("Texture2D")
                .primitive("width", |t: &Texture2D| t.width, |t: &mut Texture2D, v| t.width = v)
                .primitive("height", |t: &Texture2D| t.height, |t: &mut Texture2D, v| t.height = v)
                .primitive(
                    "pixels",
                    |t: &Texture2D| t.pixels.clone(),
                    |t: &mut Texture2D, v| t.pixels = v,
                ),
        )
        .build()
}

pub(super) fn sprite() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Sprite>::new(SPRITE)
        .layer(object_layer())
        .layer(
            Layer::new("Sprite")
                .reference(
                    "texture",
                    |s: &Sprite| s.texture,
                    |s: &mut Sprite, v| s.texture = v,
                )
                .value("rect", |s: &Sprite| s.rect, |s: &mut Sprite, v| s.rect = v)
                .value("pivot", |s: &Sprite| s.pivot, |s: &mut Sprite, v| s.pivot = v)
                .primitive(
                    "pixels_per_unit",
                    |s: &Sprite| s.pixels_per_unit,
                    |s: &mut Sprite, v| s.pixels_per_unit = v,
                )
                .value("border", |s: &Sprite| s.border, |s: &mut Sprite, v| s.border = v),
        )
        .build()
}

pub(super) fn font() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<Font>::new(FONT)
        .layer(object_layer())
        .layer(
            Layer::new("Font")
                .primitive("font_size", |f: &Font| f.font_size, |f: &mut Font, v| f.font_size = v)
                .primitive(
                    "line_height",
                    |f: &Font| f.line_height,
                    |f: &mut Font, v| f.line_height = v,
                )
                .primitive(
                    "font_names",
                    |f: &Font| f.font_names.clone(),
                    |f: &mut Font, v| f.font_names = v,
                ),
        )
        .build()
}

pub(super) fn runtime_animation_clip() -> CodecResult<SurrogateSchema> {
    SchemaBuilder::<RuntimeAnimationClip>::new(RUNTIME_ANIMATION_CLIP)
        .layer(object_layer())
        .layer(
            Layer::new("RuntimeAnimationClip")
                .primitive(
                    "length",
                    |c: &RuntimeAnimationClip| c.length,
                    |c: &mut RuntimeAnimationClip, v| c.length = v,
                )
                .primitive(
                    "frame_rate",
                    |c: &RuntimeAnimationClip| c.frame_rate,
                    |c: &mut RuntimeAnimationClip, v| c.frame_rate = v,
                )
                .primitive(
                    "properties",
                    |c: &RuntimeAnimationClip| c.properties.clone(),
                    |c: &mut RuntimeAnimationClip, v| c.properties = v,
                ),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityStore;
    use crate::Codec;
    use rtsl_scene::World;
    use rtsl_types::{Color, FieldValue, Vector2, Vector3, Vector4};

    #[test]
    fn asset_records_round_trip_through_apply() {
        let codec = Codec::with_builtin_surrogates().unwrap();
        let mut world = World::new();
        let tex = world.insert(Texture2D {
            width: 2,
            height: 1,
            pixels: vec![1, 2, 3, 4, 5, 6, 7, 8],
            ..Texture2D::default()
        });
        let mat = world.insert(Material {
            color: Color::rgba(0.5, 0.25, 1.0, 1.0),
            main_texture: Some(tex),
            keywords: vec!["_EMISSION".into()],
            ..Material::new("Glow", "Standard")
        });
        let mut ids = IdentityStore::new();
        let mat_record = codec.extract(&world, mat, &mut ids).unwrap();
        let tex_record = codec.extract(&world, tex, &mut ids).unwrap();

        let mut fresh = World::new();
        let mut bound = IdentityStore::new();
        let tex2 = codec.apply(&tex_record, None, &mut fresh, &mut bound).unwrap();
        let mat2 = codec.apply(&mat_record, None, &mut fresh, &mut bound).unwrap();
        let restored = fresh.get_as::<Material>(mat2).unwrap();
        assert_eq!(restored.main_texture, Some(tex2));
        assert_eq!(restored.keywords, vec!["_EMISSION".to_string()]);
        assert_eq!(restored.color, Color::rgba(0.5, 0.25, 1.0, 1.0));
        assert_eq!(fresh.get_as::<Texture2D>(tex2).unwrap().pixels.len(), 8);
    }

    #[test]
    fn mesh_geometry_survives() {
        let codec = Codec::with_builtin_surrogates().unwrap();
        let mut world = World::new();
        let mesh = world.insert(Mesh::new(
            "tri",
            vec![Vector3::ZERO, Vector3::ONE, Vector3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        ));
        let record = codec.extract(&world, mesh, &mut IdentityStore::new()).unwrap();
        let mut fresh = World::new();
        let id = codec
            .apply(&record, None, &mut fresh, &mut IdentityStore::new())
            .unwrap();
        assert_eq!(
            fresh.get_as::<Mesh>(id).unwrap(),
            world.get_as::<Mesh>(mesh).unwrap()
        );
    }

    #[test]
    fn sprite_keeps_its_texture_reference() {
        let codec = Codec::with_builtin_surrogates().unwrap();
        let mut world = World::new();
        let atlas = world.insert(Texture2D {
            width: 64,
            height: 64,
            ..Texture2D::default()
        });
        let sprite = world.insert(Sprite {
            texture: Some(atlas),
            rect: Vector4 {
                x: 0.0,
                y: 32.0,
                z: 32.0,
                w: 32.0,
            },
            pivot: Vector2 { x: 0.0, y: 1.0 },
            ..Sprite::default()
        });
        let mut ids = IdentityStore::new();
        let record = codec.extract(&world, sprite, &mut ids).unwrap();
        let atlas_id = ids.peek(atlas).unwrap();
        assert_eq!(record.get("texture"), Some(&FieldValue::Ref(atlas_id)));
        assert_eq!(codec.dependencies_of(&record).unwrap(), vec![atlas_id]);
        assert_eq!(codec.live_dependencies_of(&world, sprite).unwrap(), vec![atlas]);

        let atlas_record = codec.extract(&world, atlas, &mut ids).unwrap();
        let mut fresh = World::new();
        let mut bound = IdentityStore::new();
        let atlas2 = codec.apply(&atlas_record, None, &mut fresh, &mut bound).unwrap();
        let sprite2 = codec.apply(&record, None, &mut fresh, &mut bound).unwrap();
        let restored = fresh.get_as::<Sprite>(sprite2).unwrap();
        assert_eq!(restored.texture, Some(atlas2));
        assert_eq!(restored.pivot, Vector2 { x: 0.0, y: 1.0 });
        assert_eq!(restored.rect.y, 32.0);
    }
}
