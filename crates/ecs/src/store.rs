use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use easel_common::{EntityId, EntityUuid, SceneError, Transform};

use crate::components::{Camera, Light, LineRenderer, MeshRenderer, QuadRenderer, Tag};
use crate::generator::LineGenerator;
use crate::geometry::{Line, Mesh, ObjMesh};

/// State available to post-attach fix-ups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachContext {
    /// Last viewport size reported by the host, if any.
    pub viewport: Option<(u32, u32)>,
}

/// A component type that the store knows how to hold.
///
/// `on_attach` runs right after the value is inserted; it is how cameras pick
/// up the viewport size and meshes learn their owner's id.
pub trait Component: Sized + 'static {
    /// Component type name, as used in persisted scenes.
    const NAME: &'static str;

    fn storage(storages: &Storages) -> &BTreeMap<EntityId, Self>;
    fn storage_mut(storages: &mut Storages) -> &mut BTreeMap<EntityId, Self>;

    fn on_attach(&mut self, _entity: EntityId, _ctx: &AttachContext) {}
}

/// Per-type component maps.
#[derive(Debug, Clone, Default)]
pub struct Storages {
    transforms: BTreeMap<EntityId, Transform>,
    tags: BTreeMap<EntityId, Tag>,
    cameras: BTreeMap<EntityId, Camera>,
    quads: BTreeMap<EntityId, QuadRenderer>,
    lines: BTreeMap<EntityId, Line>,
    line_renderers: BTreeMap<EntityId, LineRenderer>,
    line_generators: BTreeMap<EntityId, LineGenerator>,
    meshes: BTreeMap<EntityId, Mesh>,
    obj_meshes: BTreeMap<EntityId, ObjMesh>,
    mesh_renderers: BTreeMap<EntityId, MeshRenderer>,
    lights: BTreeMap<EntityId, Light>,
}

impl Storages {
    /// Remove every component of `entity`, returning the names of those removed.
    fn remove_all(&mut self, entity: EntityId) -> Vec<&'static str> {
        let mut removed = Vec::new();
        remove_from(&mut self.transforms, entity, &mut removed);
        remove_from(&mut self.tags, entity, &mut removed);
        remove_from(&mut self.cameras, entity, &mut removed);
        remove_from(&mut self.quads, entity, &mut removed);
        remove_from(&mut self.lines, entity, &mut removed);
        remove_from(&mut self.line_renderers, entity, &mut removed);
        remove_from(&mut self.line_generators, entity, &mut removed);
        remove_from(&mut self.meshes, entity, &mut removed);
        remove_from(&mut self.obj_meshes, entity, &mut removed);
        remove_from(&mut self.mesh_renderers, entity, &mut removed);
        remove_from(&mut self.lights, entity, &mut removed);
        removed
    }
}

fn remove_from<T: Component>(
    map: &mut BTreeMap<EntityId, T>,
    entity: EntityId,
    removed: &mut Vec<&'static str>,
) {
    if map.remove(&entity).is_some() {
        removed.push(T::NAME);
    }
}

macro_rules! component {
    ($ty:ty, $field:ident, $name:literal) => {
        impl Component for $ty {
            const NAME: &'static str = $name;

            fn storage(storages: &Storages) -> &BTreeMap<EntityId, Self> {
                &storages.$field
            }

            fn storage_mut(storages: &mut Storages) -> &mut BTreeMap<EntityId, Self> {
                &mut storages.$field
            }
        }
    };
}

component!(Transform, transforms, "TransformComponent");
component!(Tag, tags, "TagComponent");
component!(QuadRenderer, quads, "QuadRendererComponent");
component!(Line, lines, "LineComponent");
component!(LineRenderer, line_renderers, "LineRendererComponent");
component!(LineGenerator, line_generators, "LineGeneratorComponent");
component!(MeshRenderer, mesh_renderers, "MeshRendererComponent");
component!(Light, lights, "LightComponent");

impl Component for Camera {
    const NAME: &'static str = "CameraComponent";

    fn storage(storages: &Storages) -> &BTreeMap<EntityId, Self> {
        &storages.cameras
    }

    fn storage_mut(storages: &mut Storages) -> &mut BTreeMap<EntityId, Self> {
        &mut storages.cameras
    }

    fn on_attach(&mut self, _entity: EntityId, ctx: &AttachContext) {
        match ctx.viewport {
            Some((width, height)) if !self.fixed_aspect_ratio => {
                self.camera.set_viewport_size(width, height)
            }
            _ => self.camera.recalculate_projection(),
        }
    }
}

impl Component for Mesh {
    const NAME: &'static str = "MeshComponent";

    fn storage(storages: &Storages) -> &BTreeMap<EntityId, Self> {
        &storages.meshes
    }

    fn storage_mut(storages: &mut Storages) -> &mut BTreeMap<EntityId, Self> {
        &mut storages.meshes
    }

    fn on_attach(&mut self, entity: EntityId, _ctx: &AttachContext) {
        self.stamp(entity);
    }
}

impl Component for ObjMesh {
    const NAME: &'static str = "ObjMeshComponent";

    fn storage(storages: &Storages) -> &BTreeMap<EntityId, Self> {
        &storages.obj_meshes
    }

    fn storage_mut(storages: &mut Storages) -> &mut BTreeMap<EntityId, Self> {
        &mut storages.obj_meshes
    }

    fn on_attach(&mut self, entity: EntityId, _ctx: &AttachContext) {
        self.stamp(entity);
    }
}

/// Events produced by store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    Created { entity: EntityId },
    Destroyed { entity: EntityId },
    Attached { entity: EntityId, component: &'static str },
    Removed { entity: EntityId, component: &'static str },
}

/// Owner of all entities and their components.
///
/// Uses BTreeMap storage for canonical iteration order: every query visits
/// entities in ascending `EntityId`, i.e. creation order.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    entities: BTreeMap<EntityId, EntityUuid>,
    next_id: u32,
    storages: Storages,
    context: AttachContext,
    events: Vec<ComponentEvent>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with an identity `Transform` and a `Tag`.
    pub fn create_entity(&mut self, name: &str) -> EntityId {
        self.create_entity_with_uuid(name, EntityUuid::new())
    }

    /// Create an entity with a known persistent identity (used when loading scenes).
    pub fn create_entity_with_uuid(&mut self, name: &str, uuid: EntityUuid) -> EntityId {
        let entity = EntityId(self.next_id);
        self.next_id += 1;
        if !entity.is_pickable() {
            tracing::warn!(%entity, "entity id exceeds the id attachment range; it cannot be picked");
        }
        self.entities.insert(entity, uuid);
        self.events.push(ComponentEvent::Created { entity });
        self.insert(entity, Transform::default());
        self.insert(entity, Tag::new(name));
        tracing::debug!(%entity, name, "entity created");
        entity
    }

    /// Remove an entity and every component attached to it.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if self.entities.remove(&entity).is_none() {
            return false;
        }
        let removed = self.storages.remove_all(entity);
        tracing::debug!(%entity, components = removed.len(), "entity destroyed");
        self.events.push(ComponentEvent::Destroyed { entity });
        true
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn uuid(&self, entity: EntityId) -> Option<EntityUuid> {
        self.entities.get(&entity).copied()
    }

    /// Attach a component and run its post-attach fix-up.
    pub fn attach<T: Component>(&mut self, entity: EntityId, value: T) -> Result<&mut T, SceneError> {
        if !self.is_alive(entity) {
            return Err(SceneError::NoSuchEntity(entity));
        }
        if T::storage(&self.storages).contains_key(&entity) {
            return Err(SceneError::DuplicateComponent {
                entity,
                component: T::NAME,
            });
        }
        Ok(self.insert(entity, value))
    }

    fn insert<T: Component>(&mut self, entity: EntityId, value: T) -> &mut T {
        self.events.push(ComponentEvent::Attached {
            entity,
            component: T::NAME,
        });
        let slot = match T::storage_mut(&mut self.storages).entry(entity) {
            Entry::Vacant(v) => v.insert(value),
            Entry::Occupied(o) => {
                let slot = o.into_mut();
                *slot = value;
                slot
            }
        };
        slot.on_attach(entity, &self.context);
        slot
    }

    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let removed = T::storage_mut(&mut self.storages).remove(&entity);
        if removed.is_some() {
            self.events.push(ComponentEvent::Removed {
                entity,
                component: T::NAME,
            });
        }
        removed
    }

    pub fn contains<T: Component>(&self, entity: EntityId) -> bool {
        T::storage(&self.storages).contains_key(&entity)
    }

    /// Fetch a component the caller guarantees is present.
    pub fn get<T: Component>(&self, entity: EntityId) -> Result<&T, SceneError> {
        T::storage(&self.storages)
            .get(&entity)
            .ok_or(SceneError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, SceneError> {
        T::storage_mut(&mut self.storages)
            .get_mut(&entity)
            .ok_or(SceneError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Fetch an optional component.
    pub fn try_get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        T::storage(&self.storages).get(&entity)
    }

    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        T::storage(&self.storages).iter().map(|(e, c)| (*e, c))
    }

    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        T::storage_mut(&mut self.storages)
            .iter_mut()
            .map(|(e, c)| (*e, c))
    }

    /// Entities holding both `A` and `B`, in ascending id order.
    pub fn query2<A: Component, B: Component>(&self) -> impl Iterator<Item = (EntityId, &A, &B)> + '_ {
        let second = B::storage(&self.storages);
        A::storage(&self.storages)
            .iter()
            .filter_map(move |(e, a)| second.get(e).map(|b| (*e, a, b)))
    }

    /// Record the viewport size handed to post-attach fix-ups. Zero sizes are clamped to 1.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.context.viewport = Some((width.max(1), height.max(1)));
    }

    pub fn viewport_size(&self) -> Option<(u32, u32)> {
        self.context.viewport
    }

    /// Read-only access to pending events.
    pub fn events(&self) -> &[ComponentEvent] {
        &self.events
    }

    /// Drain and return all pending events.
    pub fn drain_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn factory_attaches_transform_and_tag() {
        let mut store = ComponentStore::new();
        let named = store.create_entity("Cube");
        let unnamed = store.create_entity("");

        assert_eq!(store.get::<Transform>(named).unwrap(), &Transform::default());
        assert_eq!(store.get::<Tag>(named).unwrap().tag, "Cube");
        assert_eq!(store.get::<Tag>(unnamed).unwrap().tag, Tag::DEFAULT_NAME);
        assert!(store.uuid(named).is_some());
    }

    #[test]
    fn duplicate_attach_fails() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Quad");
        store.attach(e, QuadRenderer::default()).unwrap();
        let err = store.attach(e, QuadRenderer::default()).unwrap_err();
        assert_eq!(
            err,
            SceneError::DuplicateComponent {
                entity: e,
                component: "QuadRendererComponent"
            }
        );
        // The factory components count as present too.
        assert!(store.attach(e, Transform::default()).is_err());
    }

    #[test]
    fn missing_component_is_reported() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Empty");
        let err = store.get::<Camera>(e).unwrap_err();
        assert_eq!(
            err,
            SceneError::MissingComponent {
                entity: e,
                component: "CameraComponent"
            }
        );
        assert!(store.try_get::<Camera>(e).is_none());
    }

    #[test]
    fn attach_to_dead_entity_fails() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Gone");
        store.destroy_entity(e);
        assert_eq!(
            store.attach(e, Light::default()).unwrap_err(),
            SceneError::NoSuchEntity(e)
        );
    }

    #[test]
    fn destroy_entity_clears_all() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Everything");
        store.attach(e, Camera::default()).unwrap();
        store.attach(e, Mesh::cube()).unwrap();
        store.attach(e, MeshRenderer::default()).unwrap();
        store.attach(e, Light::default()).unwrap();

        assert!(store.destroy_entity(e));
        assert!(!store.is_alive(e));
        assert!(store.try_get::<Transform>(e).is_none());
        assert!(store.try_get::<Tag>(e).is_none());
        assert!(store.try_get::<Camera>(e).is_none());
        assert!(store.try_get::<Mesh>(e).is_none());
        assert!(store.try_get::<MeshRenderer>(e).is_none());
        assert!(store.try_get::<Light>(e).is_none());
        assert!(!store.destroy_entity(e));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("A");
        store.destroy_entity(a);
        let b = store.create_entity("B");
        assert!(b > a);
    }

    #[test]
    fn mesh_is_stamped_on_attach() {
        let mut store = ComponentStore::new();
        let _first = store.create_entity("Padding");
        let e = store.create_entity("Cube");
        store.attach(e, Mesh::cube()).unwrap();
        let mesh = store.get::<Mesh>(e).unwrap();
        assert_eq!(mesh.owner(), Some(e));
        assert!(mesh.vertices().iter().all(|v| v.entity_id == e.pick_id()));
    }

    #[test]
    fn mesh_recompute_keeps_ids_consistent() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Tri");
        store.attach(e, Mesh::cube()).unwrap();
        store
            .get_mut::<Mesh>(e)
            .unwrap()
            .set_geometry(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        let mesh = store.get::<Mesh>(e).unwrap();
        assert!(mesh.vertices().iter().all(|v| v.entity_id == e.pick_id()));
    }

    #[test]
    fn entities_beyond_attachment_range_stamp_the_sentinel() {
        let mut store = ComponentStore::new();
        store.next_id = EntityId::MAX_PICKABLE;
        let last = store.create_entity("Last");
        let beyond = store.create_entity("Beyond");
        assert!(last.is_pickable());
        assert!(!beyond.is_pickable());

        store.attach(beyond, Mesh::cube()).unwrap();
        let mesh = store.get::<Mesh>(beyond).unwrap();
        assert!(mesh.vertices().iter().all(|v| v.entity_id == EntityId::NO_PICK));
    }

    #[test]
    fn camera_attach_picks_up_viewport() {
        let mut store = ComponentStore::new();
        store.set_viewport_size(800, 400);
        let free = store.create_entity("Free");
        let fixed = store.create_entity("Fixed");
        store.attach(free, Camera::default()).unwrap();
        store
            .attach(
                fixed,
                Camera {
                    fixed_aspect_ratio: true,
                    ..Camera::default()
                },
            )
            .unwrap();
        assert_eq!(store.get::<Camera>(free).unwrap().camera.aspect_ratio(), 2.0);
        assert_eq!(store.get::<Camera>(fixed).unwrap().camera.aspect_ratio(), 1.0);
    }

    #[test]
    fn viewport_size_is_clamped() {
        let mut store = ComponentStore::new();
        store.set_viewport_size(0, 0);
        assert_eq!(store.viewport_size(), Some((1, 1)));
    }

    #[test]
    fn query2_iterates_in_id_order() {
        let mut store = ComponentStore::new();
        let ids: Vec<EntityId> = (0..5).map(|i| store.create_entity(&format!("q{i}"))).collect();
        for id in ids.iter().rev() {
            store
                .attach(
                    *id,
                    QuadRenderer {
                        color: Vec4::splat(0.5),
                    },
                )
                .unwrap();
        }
        let seen: Vec<EntityId> = store
            .query2::<Transform, QuadRenderer>()
            .map(|(e, _, _)| e)
            .collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn remove_component_produces_event() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Light");
        store.attach(e, Light::default()).unwrap();
        store.drain_events();

        assert!(store.remove::<Light>(e).is_some());
        assert!(store.remove::<Light>(e).is_none());
        assert_eq!(
            store.events(),
            &[ComponentEvent::Removed {
                entity: e,
                component: "LightComponent"
            }]
        );
    }

    #[test]
    fn drain_events() {
        let mut store = ComponentStore::new();
        store.create_entity("Test");
        let events = store.drain_events();
        // created + transform + tag
        assert_eq!(events.len(), 3);
        assert!(store.events().is_empty());
    }
}
