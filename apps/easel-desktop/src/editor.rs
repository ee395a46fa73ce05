use std::path::PathBuf;

use easel_assets::{MeshCache, reload_obj_mesh};
use easel_common::EntityId;
use easel_ecs::{ComponentStore, apply_line_generators};
use easel_input::{Action, Bindings, InputEvent, InputState, Key, MouseButton};
use easel_persist::{PersistError, SceneSerializer};
use easel_render::{
    EditorCamera, FrameStats, GraphicsDevice, HoverState, PickingTarget, RenderError,
    RenderPipeline, RenderSettings, ResourceContext, ViewportRect, on_viewport_resize,
};
use easel_tools::{populate_sample_scene, spawn_cube};
use glam::Vec4;

const SPAWN_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);

/// Editor state that outlives a single frame. Owns the scene store; panels
/// and the serializer borrow it per call.
pub struct EditorState {
    pub store: ComponentStore,
    pub scene_name: String,
    pub scene_path: PathBuf,
    pub camera: EditorCamera,
    pub selected: Option<EntityId>,
    pub show_hierarchy: bool,
    /// Last save/load outcome, shown in the hierarchy panel.
    pub status: Option<String>,
    pub viewport: Option<ViewportRect>,
    pipeline: RenderPipeline,
    resources: ResourceContext,
    cache: MeshCache,
    input: InputState,
    bindings: Bindings,
    hover: HoverState,
    spawned: usize,
}

impl EditorState {
    pub fn new(settings: RenderSettings, scene_path: PathBuf) -> Self {
        let mut state = Self {
            store: ComponentStore::new(),
            scene_name: "Untitled".to_string(),
            scene_path,
            camera: EditorCamera::from_settings(&settings.editor_camera),
            selected: None,
            show_hierarchy: true,
            status: None,
            viewport: None,
            pipeline: RenderPipeline::new(settings),
            resources: ResourceContext::default(),
            cache: MeshCache::new(),
            input: InputState::new(),
            bindings: Bindings::default(),
            hover: HoverState::default(),
            spawned: 0,
        };
        if state.scene_path.exists() {
            state.load_scene();
        } else {
            match populate_sample_scene(&mut state.store) {
                Ok(ids) => tracing::info!(entities = ids.len(), "starter scene created"),
                Err(e) => tracing::error!("failed to build starter scene: {e}"),
            }
        }
        state
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hover.hovered()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.pipeline.frames_rendered()
    }

    /// Re-read an entity's OBJ file. Failed loads keep the old geometry.
    pub fn reload_obj(&mut self, id: EntityId) -> bool {
        reload_obj_mesh(&mut self.store, id, &mut self.cache)
    }

    fn cursor_in_viewport(&self) -> bool {
        match (self.input.cursor(), &self.viewport) {
            (Some(cursor), Some(rect)) => rect.contains(cursor),
            _ => false,
        }
    }

    /// Single dispatch path for editor input. `keyboard_free` is false while
    /// a UI widget holds keyboard focus.
    pub fn handle_input(&mut self, event: InputEvent, keyboard_free: bool) {
        self.input.apply(&event);

        match event {
            InputEvent::KeyPressed { .. } | InputEvent::KeyReleased { .. } if !keyboard_free => {
                return;
            }
            _ => {}
        }

        if let Some(action) = self.bindings.action_for(&event, &self.input) {
            self.run_action(action);
            return;
        }

        let dragging = [MouseButton::Right, MouseButton::Middle, MouseButton::Left]
            .into_iter()
            .any(|b| self.input.is_button_down(b));
        if self.cursor_in_viewport() || (dragging && matches!(event, InputEvent::MouseMoved { .. })) {
            self.camera.on_event(&event, &self.input);
        }

        if let InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        } = event
        {
            if self.cursor_in_viewport() && !self.input.is_key_down(Key::Alt) {
                self.selected = self.hover.hovered();
            }
        }
    }

    pub fn run_action(&mut self, action: Action) {
        match action {
            Action::SaveScene => self.save_scene(),
            Action::LoadScene => self.load_scene(),
            Action::SpawnCube => self.spawn_cube(),
            Action::DeleteSelected => self.delete_selected(),
            Action::Deselect => self.selected = None,
            Action::ToggleHierarchy => self.show_hierarchy = !self.show_hierarchy,
        }
    }

    pub fn spawn_cube(&mut self) {
        self.spawned += 1;
        let name = format!("Cube {}", self.spawned);
        match spawn_cube(&mut self.store, &name, self.camera.focal_point, SPAWN_COLOR) {
            Ok(id) => self.selected = Some(id),
            Err(e) => tracing::error!("failed to spawn cube: {e}"),
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected.take() {
            if self.store.destroy_entity(id) {
                tracing::info!(entity = %id, "deleted entity");
            }
            if self.hover.hovered() == Some(id) {
                self.hover.clear();
            }
        }
    }

    pub fn save_scene(&mut self) {
        let result = SceneSerializer::save(&self.store, &self.scene_name, &self.scene_path);
        self.report("saved", result);
    }

    pub fn load_scene(&mut self) {
        let result = SceneSerializer::load(&self.scene_path, &mut self.cache).map(|(name, store)| {
            self.scene_name = name;
            self.store = store;
            self.selected = None;
            self.hover.clear();
            if let Some(rect) = &self.viewport {
                let (w, h) = rect.pixel_size();
                on_viewport_resize(&mut self.store, w, h);
            }
        });
        self.report("loaded", result);
    }

    fn report(&mut self, verb: &str, result: Result<(), PersistError>) {
        let path = self.scene_path.display();
        let message = match result {
            Ok(()) => {
                tracing::info!("scene {verb}: {path}");
                format!("Scene {verb}: {path}")
            }
            Err(e) => {
                tracing::error!("scene not {verb} ({path}): {e}");
                format!("Error: {e}")
            }
        };
        self.status = Some(message);
    }

    /// Track the viewport panel. Returns the new pixel size when it changed.
    pub fn set_viewport(&mut self, rect: ViewportRect) -> Option<(u32, u32)> {
        let size = rect.pixel_size();
        let changed = self.viewport.map(|r| r.pixel_size()) != Some(size);
        self.viewport = Some(rect);
        if !changed {
            return None;
        }
        on_viewport_resize(&mut self.store, size.0, size.1);
        self.camera.set_viewport_size(size.0, size.1);
        Some(size)
    }

    /// Between-frame scene updates.
    pub fn prepare_frame(&mut self) {
        apply_line_generators(&mut self.store);
        for event in self.store.drain_events() {
            tracing::debug!(?event, "scene change");
        }
    }

    /// Render the scene, then refresh the hovered entity from the id target.
    pub fn render<D: GraphicsDevice + PickingTarget>(
        &mut self,
        device: &mut D,
    ) -> Result<FrameStats, RenderError> {
        let stats =
            self.pipeline
                .render_frame(&self.store, &self.camera, device, &self.resources)?;
        match &self.viewport {
            Some(rect) => {
                self.hover
                    .update(self.input.cursor(), rect, &*device, &self.store);
            }
            None => self.hover.clear(),
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_input::Modifiers;
    use easel_render::SoftwareDevice;
    use easel_tools::SceneInspector;
    use glam::Vec2;

    fn editor(dir: &tempfile::TempDir) -> EditorState {
        EditorState::new(RenderSettings::default(), dir.path().join("scene.yaml"))
    }

    fn press(key: Key, ctrl: bool) -> InputEvent {
        InputEvent::KeyPressed {
            key,
            modifiers: Modifiers {
                ctrl,
                ..Modifiers::default()
            },
        }
    }

    #[test]
    fn starts_with_sample_scene_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let state = editor(&dir);
        assert_eq!(state.store.entity_count(), 5);
        assert!(state.status.is_none());
    }

    #[test]
    fn shortcuts_spawn_delete_and_deselect() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        let before = state.store.entity_count();

        state.handle_input(press(Key::Character('n'), false), true);
        assert_eq!(state.store.entity_count(), before + 1);
        let spawned = state.selected.unwrap();

        state.handle_input(press(Key::Delete, false), true);
        assert!(!state.store.is_alive(spawned));
        assert!(state.selected.is_none());

        state.selected = Some(EntityId(0));
        state.handle_input(press(Key::Escape, false), true);
        assert!(state.selected.is_none());

        state.handle_input(press(Key::F1, false), true);
        assert!(!state.show_hierarchy);
    }

    #[test]
    fn prepare_frame_drains_store_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        state.spawn_cube();
        assert!(!state.store.events().is_empty());
        state.prepare_frame();
        assert!(state.store.events().is_empty());
    }

    #[test]
    fn focused_widgets_swallow_shortcuts() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        let before = state.store.entity_count();
        state.handle_input(press(Key::Character('n'), false), false);
        assert_eq!(state.store.entity_count(), before);
    }

    #[test]
    fn save_then_load_restores_the_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        state.scene_name = "Saved".into();
        state.handle_input(press(Key::Character('s'), true), true);
        assert!(dir.path().join("scene.yaml").exists());
        let summary = SceneInspector::summary(&state.store);

        state.spawn_cube();
        state.handle_input(press(Key::Character('o'), true), true);
        assert_eq!(SceneInspector::summary(&state.store), summary);
        assert_eq!(state.scene_name, "Saved");
        assert!(state.selected.is_none());

        let reopened = editor(&dir);
        assert_eq!(reopened.scene_name, "Saved");
    }

    #[test]
    fn load_failure_keeps_current_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        std::fs::write(dir.path().join("scene.yaml"), "Scene: [unterminated").unwrap();
        state.load_scene();
        assert_eq!(state.store.entity_count(), 5);
        assert!(state.status.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn hover_and_click_select_through_the_viewport() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = editor(&dir);
        let resources = ResourceContext::default();
        let mut device = SoftwareDevice::new(64, 64, &resources.shaders);

        let rect = ViewportRect::new(Vec2::new(100.0, 50.0), Vec2::new(64.0, 64.0));
        assert_eq!(state.set_viewport(rect), Some((64, 64)));
        assert_eq!(state.set_viewport(rect), None);

        state.handle_input(
            InputEvent::MouseMoved {
                position: Vec2::new(132.0, 82.0),
            },
            true,
        );
        state.prepare_frame();
        state.render(&mut device).unwrap();
        let cube = state
            .store
            .entities()
            .find(|&id| {
                SceneInspector::inspect_entity(&state.store, id).is_some_and(|i| i.name == "Cube")
            })
            .unwrap();
        assert_eq!(state.hovered(), Some(cube));

        state.handle_input(
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed: true,
            },
            true,
        );
        assert_eq!(state.selected, Some(cube));

        // Outside the panel nothing is hovered.
        state.handle_input(
            InputEvent::MouseMoved {
                position: Vec2::new(10.0, 10.0),
            },
            true,
        );
        state.render(&mut device).unwrap();
        assert_eq!(state.hovered(), None);
    }
}
