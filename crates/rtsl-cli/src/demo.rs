//! Sample scene for `rtsl demo`.

use rtsl_scene::{
    BuiltinAssets, InstanceId, Material, Mesh, MeshFilter, MeshRenderer, ObjectBase,
    RuntimeAnimation, RuntimeAnimationClip, SceneResult, Texture2D, World,
};
use rtsl_types::{Color, Vector3};

/// Build a small scene referencing the built-ins; returns its root game
/// objects.
pub fn build_scene(
    world: &mut World,
    builtins: &BuiltinAssets,
    objects: usize,
) -> SceneResult<Vec<InstanceId>> {
    let ground = world.spawn_game_object("Ground");
    world.add_component(
        ground,
        MeshFilter {
            shared_mesh: builtins.get("New-Plane"),
            ..MeshFilter::default()
        },
    )?;
    world.add_component(ground, renderer(builtins.default_material().into_iter().collect()))?;

    let texture = world.insert(Texture2D {
        base: ObjectBase::named("CrateTexture"),
        width: 2,
        height: 2,
        pixels: vec![
            0x80, 0x50, 0x20, 0xFF, 0x60, 0x40, 0x10, 0xFF, 0x60, 0x40, 0x10, 0xFF, 0x80, 0x50,
            0x20, 0xFF,
        ],
    });
    let mut crate_material = Material::new("CrateMaterial", "Standard");
    crate_material.main_texture = Some(texture);
    crate_material.color = Color::rgba(0.9, 0.8, 0.6, 1.0);
    let crate_material = world.insert(crate_material);

    let crates = world.spawn_game_object("Crates");
    for i in 0..objects {
        let item = world.spawn_game_object(format!("Crate{i}"));
        world.add_component(
            item,
            MeshFilter {
                shared_mesh: builtins.cube(),
                ..MeshFilter::default()
            },
        )?;
        world.add_component(item, renderer(vec![crate_material]))?;
        world.set_parent(item, Some(crates))?;
    }

    let hero = world.spawn_game_object("Hero");
    let body = world.insert(Mesh::new(
        "HeroBody",
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.5, 2.0, 0.0),
            Vector3::new(-0.5, 2.0, 0.0),
        ],
        vec![0, 1, 2],
    ));
    world.add_component(
        hero,
        MeshFilter {
            shared_mesh: Some(body),
            ..MeshFilter::default()
        },
    )?;
    let clips = ["Idle", "Run"]
        .into_iter()
        .map(|name| {
            world.insert(RuntimeAnimationClip {
                base: ObjectBase::named(name),
                length: 1.5,
                ..RuntimeAnimationClip::default()
            })
        })
        .collect();
    world.add_component(
        hero,
        RuntimeAnimation {
            clips,
            play_on_awake: true,
            looping: true,
            ..RuntimeAnimation::default()
        },
    )?;

    Ok(vec![ground, crates, hero])
}

fn renderer(materials: Vec<InstanceId>) -> MeshRenderer {
    MeshRenderer {
        shared_materials: materials,
        ..MeshRenderer::default()
    }
}
