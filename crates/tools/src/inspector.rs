use easel_common::{EntityId, SceneError, Transform};
use easel_ecs::{
    Camera, Component, ComponentStore, Light, Line, LineGenerator, LineRenderer, Mesh,
    MeshRenderer, ObjMesh, QuadRenderer, Tag,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum InspectorError {
    #[error("entity {0} has no Mesh or ObjMesh to render")]
    NoGeometry(EntityId),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against the store for the hierarchy panel and
/// the CLI, plus the editing policies those surfaces share.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(store: &ComponentStore) -> SceneSummary {
        SceneSummary {
            entity_count: store.entity_count(),
            cameras: store.iter::<Camera>().count(),
            primary_cameras: store.iter::<Camera>().filter(|(_, c)| c.primary).count(),
            quads: store.iter::<QuadRenderer>().count(),
            lines: store.iter::<Line>().count(),
            opaque_meshes: store
                .iter::<MeshRenderer>()
                .filter(|(_, r)| !r.is_transparent)
                .count(),
            transparent_meshes: store
                .iter::<MeshRenderer>()
                .filter(|(_, r)| r.is_transparent)
                .count(),
            lights: store.iter::<Light>().count(),
        }
    }

    pub fn inspect_entity(store: &ComponentStore, id: EntityId) -> Option<EntityInfo> {
        let transform = store.try_get::<Transform>(id)?;
        Some(EntityInfo {
            id: id.0,
            name: store
                .try_get::<Tag>(id)
                .map_or_else(|| Tag::DEFAULT_NAME.to_string(), |t| t.tag.clone()),
            position: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
            scale: transform.scale.to_array(),
            components: Self::component_names(store, id),
        })
    }

    /// Names of the components attached to `id`, in a fixed order.
    pub fn component_names(store: &ComponentStore, id: EntityId) -> Vec<&'static str> {
        fn has<T: Component>(store: &ComponentStore, id: EntityId, out: &mut Vec<&'static str>) {
            if store.contains::<T>(id) {
                out.push(T::NAME);
            }
        }
        let mut names = Vec::new();
        has::<Tag>(store, id, &mut names);
        has::<Transform>(store, id, &mut names);
        has::<Camera>(store, id, &mut names);
        has::<QuadRenderer>(store, id, &mut names);
        has::<Line>(store, id, &mut names);
        has::<LineRenderer>(store, id, &mut names);
        has::<LineGenerator>(store, id, &mut names);
        has::<Mesh>(store, id, &mut names);
        has::<ObjMesh>(store, id, &mut names);
        has::<MeshRenderer>(store, id, &mut names);
        has::<Light>(store, id, &mut names);
        names
    }

    /// All entities with their display names, in ascending id order.
    pub fn list_entities(store: &ComponentStore) -> Vec<(EntityId, String)> {
        store
            .iter::<Tag>()
            .map(|(id, tag)| (id, tag.tag.clone()))
            .collect()
    }

    /// Attach a `MeshRenderer`, refusing entities that have nothing to render.
    pub fn attach_mesh_renderer(
        store: &mut ComponentStore,
        id: EntityId,
        renderer: MeshRenderer,
    ) -> Result<(), InspectorError> {
        if !store.contains::<Mesh>(id) && !store.contains::<ObjMesh>(id) {
            tracing::warn!(entity = %id, "MeshRenderer needs a Mesh or ObjMesh first");
            return Err(InspectorError::NoGeometry(id));
        }
        store.attach(id, renderer)?;
        Ok(())
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub entity_count: usize,
    pub cameras: usize,
    pub primary_cameras: usize,
    pub quads: usize,
    pub lines: usize,
    pub opaque_meshes: usize,
    pub transparent_meshes: usize,
    pub lights: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: entities={} cameras={} (primary={}) quads={} lines={} meshes={} (transparent={}) lights={}",
            self.entity_count,
            self.cameras,
            self.primary_cameras,
            self.quads,
            self.lines,
            self.opaque_meshes + self.transparent_meshes,
            self.transparent_meshes,
            self.lights,
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityInfo {
    pub id: u32,
    pub name: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub components: Vec<&'static str>,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity #{} \"{}\" pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) [{}]",
            self.id,
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.components.join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&ComponentStore::new());
        assert_eq!(summary.entity_count, 0);
        assert_eq!(summary.cameras, 0);
    }

    #[test]
    fn summary_counts_components() {
        let mut store = ComponentStore::new();
        let cam = store.create_entity("Camera");
        store.attach(cam, Camera::default()).unwrap();
        let glass = store.create_entity("Glass");
        store.attach(glass, Mesh::cube()).unwrap();
        store
            .attach(
                glass,
                MeshRenderer {
                    is_transparent: true,
                    ..MeshRenderer::default()
                },
            )
            .unwrap();

        let summary = SceneInspector::summary(&store);
        assert_eq!(summary.entity_count, 2);
        assert_eq!(summary.primary_cameras, 1);
        assert_eq!(summary.transparent_meshes, 1);
        assert_eq!(summary.opaque_meshes, 0);
    }

    #[test]
    fn inspect_entity_found() {
        let mut store = ComponentStore::new();
        let id = store.create_entity("Mover");
        store.get_mut::<Transform>(id).unwrap().translation = Vec3::new(1.0, 2.0, 3.0);

        let info = SceneInspector::inspect_entity(&store, id).unwrap();
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(info.name, "Mover");
        assert_eq!(info.components, vec!["TagComponent", "TransformComponent"]);
    }

    #[test]
    fn inspect_entity_not_found() {
        let mut store = ComponentStore::new();
        let id = store.create_entity("Gone");
        store.destroy_entity(id);
        assert!(SceneInspector::inspect_entity(&store, id).is_none());
    }

    #[test]
    fn list_entities() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("A");
        let b = store.create_entity("");
        let list = SceneInspector::list_entities(&store);
        assert_eq!(list, vec![(a, "A".to_string()), (b, Tag::DEFAULT_NAME.to_string())]);
    }

    #[test]
    fn mesh_renderer_requires_geometry() {
        let mut store = ComponentStore::new();
        let bare = store.create_entity("Bare");
        let err = SceneInspector::attach_mesh_renderer(&mut store, bare, MeshRenderer::default())
            .unwrap_err();
        assert!(matches!(err, InspectorError::NoGeometry(id) if id == bare));
        assert!(!store.contains::<MeshRenderer>(bare));

        let cube = store.create_entity("Cube");
        store.attach(cube, Mesh::cube()).unwrap();
        SceneInspector::attach_mesh_renderer(&mut store, cube, MeshRenderer::default()).unwrap();
        assert!(store.contains::<MeshRenderer>(cube));

        let obj = store.create_entity("Obj");
        store.attach(obj, ObjMesh::new("teapot.obj")).unwrap();
        assert!(SceneInspector::attach_mesh_renderer(&mut store, obj, MeshRenderer::default()).is_ok());
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", SceneInspector::summary(&ComponentStore::new()));
        assert!(s.contains("entities=0"));
    }
}
