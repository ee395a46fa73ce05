use std::path::Path;

use easel_assets::{MeshCache, reload_obj_mesh};
use easel_common::{EntityId, Transform};
use easel_ecs::{
    Camera, ComponentStore, Light, Line, LineGenerator, LineRenderer, Mesh, MeshRenderer, ObjMesh,
    QuadRenderer, Tag,
};

use crate::document::{EntityDocument, LineDocument, MeshDocument, ObjMeshDocument, SceneDocument};
use crate::error::PersistError;

/// Converts between a [`ComponentStore`] and its YAML document.
pub struct SceneSerializer;

impl SceneSerializer {
    /// Snapshot the store into a document, entities in ascending id order.
    pub fn to_document(store: &ComponentStore, scene_name: &str) -> SceneDocument {
        let entities = store
            .entities()
            .filter_map(|entity| {
                let uuid = store.uuid(entity)?;
                let mut doc = EntityDocument::new(uuid);
                doc.tag = store.try_get::<Tag>(entity).cloned();
                doc.transform = store.try_get::<Transform>(entity).copied();
                doc.camera = store.try_get::<Camera>(entity).cloned();
                doc.quad_renderer = store.try_get::<QuadRenderer>(entity).copied();
                doc.line = store.try_get::<Line>(entity).map(|line| LineDocument {
                    vertices: line.points().to_vec(),
                });
                doc.line_renderer = store.try_get::<LineRenderer>(entity).copied();
                doc.line_generator = store.try_get::<LineGenerator>(entity).cloned();
                doc.mesh = store.try_get::<Mesh>(entity).map(|mesh| MeshDocument {
                    positions: mesh.positions().collect(),
                    indices: mesh.indices().to_vec(),
                });
                doc.obj_mesh = store.try_get::<ObjMesh>(entity).map(|obj| ObjMeshDocument {
                    path: obj.path.clone(),
                });
                doc.mesh_renderer = store.try_get::<MeshRenderer>(entity).copied();
                doc.light = store.try_get::<Light>(entity).copied();
                Some(doc)
            })
            .collect();
        SceneDocument {
            scene: scene_name.to_string(),
            entities,
        }
    }

    pub fn serialize(store: &ComponentStore, scene_name: &str) -> Result<String, PersistError> {
        Ok(serde_yaml::to_string(&Self::to_document(store, scene_name))?)
    }

    /// Rebuild the entities of `document` inside `store`.
    ///
    /// Entities are appended; existing ones are left alone. OBJ meshes are
    /// loaded through `cache`, and a failed load leaves that mesh empty.
    pub fn apply_document(
        document: SceneDocument,
        store: &mut ComponentStore,
        cache: &mut MeshCache,
    ) -> Result<Vec<EntityId>, PersistError> {
        let mut created = Vec::with_capacity(document.entities.len());
        for doc in document.entities {
            let name = doc.tag.as_ref().map_or("", |t| t.tag.as_str());
            let entity = store.create_entity_with_uuid(name, doc.uuid);
            created.push(entity);

            if let Some(transform) = doc.transform {
                *store.get_mut::<Transform>(entity)? = transform;
            }
            if let Some(camera) = doc.camera {
                store.attach(entity, camera)?;
            }
            if let Some(quad) = doc.quad_renderer {
                store.attach(entity, quad)?;
            }
            if let Some(line) = doc.line {
                store.attach(entity, Line::new(line.vertices))?;
            }
            if let Some(renderer) = doc.line_renderer {
                store.attach(entity, renderer)?;
            }
            if let Some(generator) = doc.line_generator {
                store.attach(entity, generator)?;
            }
            if let Some(mesh) = doc.mesh {
                validate_mesh(&doc.uuid.0.to_string(), &mesh)?;
                store.attach(entity, Mesh::new(mesh.positions, mesh.indices))?;
            }
            if let Some(obj) = doc.obj_mesh {
                store.attach(entity, ObjMesh::new(obj.path))?;
                reload_obj_mesh(store, entity, cache);
            }
            if let Some(renderer) = doc.mesh_renderer {
                store.attach(entity, renderer)?;
            }
            if let Some(light) = doc.light {
                store.attach(entity, light)?;
            }
        }
        Ok(created)
    }

    /// Parse YAML and rebuild its entities in `store`. Returns the scene name.
    pub fn deserialize(
        text: &str,
        store: &mut ComponentStore,
        cache: &mut MeshCache,
    ) -> Result<String, PersistError> {
        let document: SceneDocument = serde_yaml::from_str(text)?;
        let name = document.scene.clone();
        let created = Self::apply_document(document, store, cache)?;
        tracing::info!(scene = %name, entities = created.len(), "scene deserialized");
        Ok(name)
    }

    pub fn save(
        store: &ComponentStore,
        scene_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), PersistError> {
        let text = Self::serialize(store, scene_name)?;
        std::fs::write(path.as_ref(), text)?;
        tracing::info!(path = %path.as_ref().display(), entities = store.entity_count(), "scene saved");
        Ok(())
    }

    /// Load a scene file into a fresh store. Returns the scene name and the store.
    pub fn load(
        path: impl AsRef<Path>,
        cache: &mut MeshCache,
    ) -> Result<(String, ComponentStore), PersistError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut store = ComponentStore::new();
        let name = Self::deserialize(&text, &mut store, cache)?;
        Ok((name, store))
    }
}

fn validate_mesh(entity: &str, mesh: &MeshDocument) -> Result<(), PersistError> {
    let invalid = |message: String| PersistError::InvalidMesh {
        entity: entity.to_string(),
        message,
    };
    if mesh.indices.len() % 3 != 0 {
        return Err(invalid(format!("{} indices is not a triangle list", mesh.indices.len())));
    }
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
        return Err(invalid(format!(
            "index {bad} out of range for {} positions",
            mesh.positions.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_ecs::SceneCamera;
    use glam::{Vec3, Vec4};

    fn round_trip(store: &ComponentStore) -> ComponentStore {
        let yaml = SceneSerializer::serialize(store, "Test").unwrap();
        let mut loaded = ComponentStore::new();
        let name = SceneSerializer::deserialize(&yaml, &mut loaded, &mut MeshCache::new()).unwrap();
        assert_eq!(name, "Test");
        loaded
    }

    #[test]
    fn transform_round_trips_through_file() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Mover");
        store.get_mut::<Transform>(e).unwrap().translation = Vec3::new(1.0, 2.0, 3.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        SceneSerializer::save(&store, "Untitled", &path).unwrap();
        let (name, loaded) = SceneSerializer::load(&path, &mut MeshCache::new()).unwrap();

        assert_eq!(name, "Untitled");
        assert_eq!(loaded.entity_count(), 1);
        let (loaded_e, transform) = loaded.iter::<Transform>().next().unwrap();
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(loaded.uuid(loaded_e), store.uuid(e));
        assert_eq!(loaded.get::<Tag>(loaded_e).unwrap().tag, "Mover");
    }

    #[test]
    fn awkward_floats_are_exact() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Precise");
        let t = Transform {
            translation: Vec3::new(0.1, 1.0 / 3.0, -7.000_001),
            rotation: Vec3::new(std::f32::consts::PI, 1e-7, 0.0),
            scale: Vec3::new(1e10, 2.5, 0.333),
        };
        *store.get_mut::<Transform>(e).unwrap() = t;
        let loaded = round_trip(&store);
        assert_eq!(loaded.iter::<Transform>().next().unwrap().1, &t);
    }

    #[test]
    fn document_uses_component_keys() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Cam");
        store
            .attach(e, Camera::new(SceneCamera::perspective(0.8, 0.1, 100.0), true))
            .unwrap();
        let yaml = SceneSerializer::serialize(&store, "Keys").unwrap();
        for key in [
            "Scene: Keys",
            "Entities:",
            "Entity:",
            "TagComponent:",
            "TransformComponent:",
            "Translation:",
            "CameraComponent:",
            "ProjectionType: Perspective",
            "PerspectiveFOV:",
            "OrthographicSize:",
            "Primary: true",
            "FixedAspectRatio: false",
        ] {
            assert!(yaml.contains(key), "missing `{key}` in\n{yaml}");
        }
        assert!(!yaml.contains("QuadRendererComponent"));
    }

    #[test]
    fn every_component_survives() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Kitchen sink");
        store
            .attach(e, Camera::new(SceneCamera::orthographic(8.0, -2.0, 2.0), false))
            .unwrap();
        store
            .attach(e, QuadRenderer { color: Vec4::new(0.2, 0.4, 0.6, 0.8) })
            .unwrap();
        store.attach(e, Line::new(vec![Vec3::ZERO, Vec3::X])).unwrap();
        store
            .attach(e, LineRenderer { color: Vec4::ONE, is_looped: true })
            .unwrap();
        store
            .attach(e, LineGenerator::Ngon { num_sides: 6, radius: 2.0 })
            .unwrap();
        store.attach(e, Mesh::cube()).unwrap();
        store
            .attach(e, MeshRenderer { color: Vec4::splat(0.5), is_transparent: true })
            .unwrap();
        store.attach(e, Light { intensity: 3.5 }).unwrap();

        let loaded = round_trip(&store);
        let (l, _) = loaded.iter::<Tag>().next().unwrap();
        let cam = loaded.get::<Camera>(l).unwrap();
        assert!(!cam.primary);
        assert_eq!(cam.camera.orthographic_size(), 8.0);
        assert_eq!(cam.camera.projection(), store.get::<Camera>(e).unwrap().camera.projection());
        assert_eq!(loaded.get::<QuadRenderer>(l).unwrap(), store.get::<QuadRenderer>(e).unwrap());
        assert_eq!(loaded.get::<Line>(l).unwrap().points(), &[Vec3::ZERO, Vec3::X]);
        assert!(loaded.get::<LineRenderer>(l).unwrap().is_looped);
        assert_eq!(
            loaded.get::<LineGenerator>(l).unwrap(),
            &LineGenerator::Ngon { num_sides: 6, radius: 2.0 }
        );
        assert_eq!(loaded.get::<Mesh>(l).unwrap().triangle_count(), 12);
        assert!(loaded.get::<MeshRenderer>(l).unwrap().is_transparent);
        assert_eq!(loaded.get::<Light>(l).unwrap().intensity, 3.5);
    }

    #[test]
    fn loaded_meshes_are_stamped_with_new_ids() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Cube");
        store.attach(e, Mesh::cube()).unwrap();

        let yaml = SceneSerializer::serialize(&store, "Ids").unwrap();
        let mut loaded = ComponentStore::new();
        loaded.create_entity("Already here");
        SceneSerializer::deserialize(&yaml, &mut loaded, &mut MeshCache::new()).unwrap();

        let (l, mesh) = loaded.iter::<Mesh>().next().unwrap();
        assert_ne!(l, e);
        assert!(mesh.vertices().iter().all(|v| v.entity_id == l.pick_id()));
    }

    #[test]
    fn missing_obj_file_leaves_mesh_empty() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Teapot");
        store.attach(e, ObjMesh::new("/no/such/teapot.obj")).unwrap();
        let loaded = round_trip(&store);
        let (_, obj) = loaded.iter::<ObjMesh>().next().unwrap();
        assert_eq!(obj.path, "/no/such/teapot.obj");
        assert!(obj.mesh().is_empty());
    }

    #[test]
    fn obj_mesh_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("tri.obj");
        std::fs::write(&obj_path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut store = ComponentStore::new();
        let e = store.create_entity("Tri");
        store
            .attach(e, ObjMesh::new(obj_path.to_string_lossy()))
            .unwrap();
        let loaded = round_trip(&store);
        let (l, obj) = loaded.iter::<ObjMesh>().next().unwrap();
        assert_eq!(obj.mesh().triangle_count(), 1);
        assert!(obj.mesh().vertices().iter().all(|v| v.entity_id == l.pick_id()));
    }

    #[test]
    fn malformed_mesh_is_rejected() {
        let yaml = "\
Scene: Broken
Entities:
  - Entity: 67e55044-10b1-426f-9247-bb680e5fe0c8
    MeshComponent:
      Positions: [[0, 0, 0]]
      Indices: [0, 0, 5]
";
        let err = SceneSerializer::deserialize(yaml, &mut ComponentStore::new(), &mut MeshCache::new())
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidMesh { .. }));
    }

    #[test]
    fn garbage_is_a_yaml_error() {
        let err = SceneSerializer::deserialize("- [unbalanced", &mut ComponentStore::new(), &mut MeshCache::new())
            .unwrap_err();
        assert!(matches!(err, PersistError::Yaml(_)));
    }

    #[test]
    fn entity_without_tag_gets_default_name() {
        let yaml = "\
Scene: Bare
Entities:
  - Entity: 67e55044-10b1-426f-9247-bb680e5fe0c8
";
        let mut store = ComponentStore::new();
        SceneSerializer::deserialize(yaml, &mut store, &mut MeshCache::new()).unwrap();
        let (_, tag) = store.iter::<Tag>().next().unwrap();
        assert_eq!(tag.tag, Tag::DEFAULT_NAME);
        let (_, t) = store.iter::<Transform>().next().unwrap();
        assert_eq!(t, &Transform::default());
    }
}
