use easel_common::{EntityId, SceneError, Transform};
use easel_ecs::{ComponentStore, Light, Line, LineGenerator, LineRenderer, Mesh, MeshRenderer, QuadRenderer};
use glam::{Vec3, Vec4};

/// Spawn a lit unit cube at `position`.
pub fn spawn_cube(
    store: &mut ComponentStore,
    name: &str,
    position: Vec3,
    color: Vec4,
) -> Result<EntityId, SceneError> {
    let id = store.create_entity(name);
    store.get_mut::<Transform>(id)?.translation = position;
    store.attach(id, Mesh::cube())?;
    store.attach(
        id,
        MeshRenderer {
            color,
            is_transparent: color.w < 1.0,
        },
    )?;
    tracing::info!(entity = %id, name, "spawned cube");
    Ok(id)
}

/// Fill `store` with the starter scene: an opaque cube, a glass cube behind
/// it, a floor quad, a rectangle outline and one light. No scene camera is
/// added, so the editor camera stays in control.
pub fn populate_sample_scene(store: &mut ComponentStore) -> Result<Vec<EntityId>, SceneError> {
    let cube = spawn_cube(store, "Cube", Vec3::ZERO, Vec4::new(0.2, 0.6, 1.0, 1.0))?;
    let glass = spawn_cube(
        store,
        "Glass",
        Vec3::new(1.5, 0.0, -2.0),
        Vec4::new(1.0, 0.3, 0.3, 0.4),
    )?;

    let floor = store.create_entity("Floor");
    {
        let transform = store.get_mut::<Transform>(floor)?;
        transform.translation = Vec3::new(0.0, -1.0, 0.0);
        transform.rotation = Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        transform.scale = Vec3::splat(8.0);
    }
    store.attach(
        floor,
        QuadRenderer {
            color: Vec4::new(0.3, 0.3, 0.3, 1.0),
        },
    )?;

    let outline = store.create_entity("Outline");
    store.get_mut::<Transform>(outline)?.translation = Vec3::new(0.0, 0.0, 0.6);
    store.attach(outline, Line::new(Vec::new()))?;
    store.attach(
        outline,
        LineGenerator::Rectangle {
            width: 1.5,
            height: 1.5,
        },
    )?;
    store.attach(
        outline,
        LineRenderer {
            color: Vec4::new(1.0, 0.8, 0.0, 1.0),
            is_looped: true,
        },
    )?;

    let light = store.create_entity("Key Light");
    store.get_mut::<Transform>(light)?.translation = Vec3::new(3.0, 4.0, 5.0);
    store.attach(light, Light { intensity: 1.0 })?;

    Ok(vec![cube, glass, floor, outline, light])
}
