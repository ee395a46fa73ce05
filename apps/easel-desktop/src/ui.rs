//! egui panels: hierarchy with inspector on the left, viewport in the centre.

use easel_common::{EntityId, Transform};
use easel_ecs::{Camera, Light, LineRenderer, MeshRenderer, ObjMesh, QuadRenderer, Tag};
use easel_input::Action;
use easel_render::ViewportRect;
use easel_tools::SceneInspector;
use egui::Context as EguiContext;
use glam::{Vec3, Vec4};

use crate::editor::EditorState;

/// Draw every panel. Returns the viewport panel in physical pixels.
pub fn draw_ui(
    state: &mut EditorState,
    ctx: &EguiContext,
    viewport_texture: Option<egui::TextureId>,
) -> ViewportRect {
    if state.show_hierarchy {
        egui::SidePanel::left("hierarchy")
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| hierarchy_panel(state, ui));
            });
    }

    let mut panel = egui::Rect::NOTHING;
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            panel = ui.available_rect_before_wrap();
            match viewport_texture {
                Some(id) => {
                    ui.put(
                        panel,
                        egui::Image::new(egui::load::SizedTexture::new(id, panel.size())),
                    );
                }
                None => {
                    ui.allocate_rect(panel, egui::Sense::hover());
                }
            }
        });

    let ppp = ctx.pixels_per_point();
    ViewportRect::new(
        glam::Vec2::new(panel.min.x, panel.min.y) * ppp,
        glam::Vec2::new(panel.width(), panel.height()).max(glam::Vec2::ONE) * ppp,
    )
}

fn hierarchy_panel(state: &mut EditorState, ui: &mut egui::Ui) {
    let summary = SceneInspector::summary(&state.store);
    ui.heading(&state.scene_name);
    ui.label(summary.to_string());
    ui.label(format!("Frames: {}", state.frames_rendered()));
    let hovered = state
        .hovered()
        .map_or_else(|| "-".to_string(), |id| entity_label(state, id));
    ui.label(format!("Hovered: {hovered}"));
    ui.separator();

    ui.horizontal(|ui| {
        if ui.button("Spawn Cube (N)").clicked() {
            state.run_action(Action::SpawnCube);
        }
        if ui.button("Delete (Del)").clicked() {
            state.run_action(Action::DeleteSelected);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("Save (Ctrl+S)").clicked() {
            state.run_action(Action::SaveScene);
        }
        if ui.button("Load (Ctrl+O)").clicked() {
            state.run_action(Action::LoadScene);
        }
    });
    if let Some(status) = &state.status {
        ui.small(status);
    }

    ui.separator();
    ui.heading("Entities");
    for (id, name) in SceneInspector::list_entities(&state.store) {
        let is_selected = state.selected == Some(id);
        if ui
            .selectable_label(is_selected, format!("{name}  {id}"))
            .clicked()
        {
            state.selected = Some(id);
        }
    }

    if let Some(id) = state.selected.filter(|id| state.store.is_alive(*id)) {
        ui.separator();
        ui.heading("Inspector");
        inspector(state, id, ui);
    }

    ui.separator();
    ui.small("F1: Hierarchy | RMB: Orbit | MMB: Pan | Wheel: Zoom | Esc: Deselect");
}

fn entity_label(state: &EditorState, id: EntityId) -> String {
    state
        .store
        .try_get::<Tag>(id)
        .map_or_else(|| id.to_string(), |t| format!("{} {id}", t.tag))
}

fn inspector(state: &mut EditorState, id: EntityId, ui: &mut egui::Ui) {
    if let Ok(tag) = state.store.get_mut::<Tag>(id) {
        ui.text_edit_singleline(&mut tag.tag);
    }

    if let Ok(transform) = state.store.get_mut::<Transform>(id) {
        transform_editor(transform, ui);
    }

    if let Ok(camera) = state.store.get_mut::<Camera>(id) {
        ui.label("Camera");
        ui.checkbox(&mut camera.primary, "Primary");
        ui.checkbox(&mut camera.fixed_aspect_ratio, "Fixed aspect ratio");
    }
    if let Ok(quad) = state.store.get_mut::<QuadRenderer>(id) {
        ui.label("Quad");
        color_editor(&mut quad.color, ui);
    }
    if let Ok(line) = state.store.get_mut::<LineRenderer>(id) {
        ui.label("Line");
        color_editor(&mut line.color, ui);
        ui.checkbox(&mut line.is_looped, "Looped");
    }
    if let Ok(renderer) = state.store.get_mut::<MeshRenderer>(id) {
        ui.label("Mesh renderer");
        color_editor(&mut renderer.color, ui);
        ui.checkbox(&mut renderer.is_transparent, "Transparent");
    } else if ui.button("Add Mesh Renderer").clicked() {
        if let Err(e) =
            SceneInspector::attach_mesh_renderer(&mut state.store, id, MeshRenderer::default())
        {
            state.status = Some(format!("Error: {e}"));
        }
    }
    if let Some(path) = state.store.try_get::<ObjMesh>(id).map(|obj| obj.path.clone()) {
        ui.label(format!("OBJ: {path}"));
        if ui.button("Reload OBJ").clicked() && !state.reload_obj(id) {
            state.status = Some(format!("Error: could not load {path}"));
        }
    }
    if let Ok(light) = state.store.get_mut::<Light>(id) {
        ui.label("Light");
        ui.add(
            egui::DragValue::new(&mut light.intensity)
                .prefix("Intensity: ")
                .speed(0.05)
                .range(0.0..=10.0),
        );
    }

    ui.label(SceneInspector::component_names(&state.store, id).join(", "));
}

fn transform_editor(transform: &mut Transform, ui: &mut egui::Ui) {
    ui.label("Translation:");
    vec3_editor(&mut transform.translation, 0.1, ui);

    let mut degrees = Vec3::new(
        transform.rotation.x.to_degrees(),
        transform.rotation.y.to_degrees(),
        transform.rotation.z.to_degrees(),
    );
    ui.label("Rotation:");
    if vec3_editor(&mut degrees, 1.0, ui) {
        transform.rotation = Vec3::new(
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
    }

    ui.label("Scale:");
    vec3_editor(&mut transform.scale, 0.1, ui);
}

fn vec3_editor(value: &mut Vec3, speed: f64, ui: &mut egui::Ui) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        for (prefix, component) in [("X: ", &mut value.x), ("Y: ", &mut value.y), ("Z: ", &mut value.z)] {
            changed |= ui
                .add(egui::DragValue::new(component).prefix(prefix).speed(speed))
                .changed();
        }
    });
    changed
}

fn color_editor(color: &mut Vec4, ui: &mut egui::Ui) {
    let mut rgba = color.to_array();
    if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
        *color = Vec4::from_array(rgba);
    }
}
