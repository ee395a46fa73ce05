//! Cursor-to-entity resolution against the id attachment.

use easel_common::EntityId;
use easel_ecs::ComponentStore;
use glam::Vec2;

use crate::error::PickError;
use crate::framebuffer::{FramebufferSpec, PickingTarget};

/// On-screen rectangle of the viewport panel, in UI pixels (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl ViewportRect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_corners(min: Vec2, max: Vec2) -> Self {
        Self {
            min,
            size: max - min,
        }
    }

    /// Panel size in whole pixels, never below 1.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.size.x.max(1.0)) as u32,
            (self.size.y.max(1.0)) as u32,
        )
    }

    pub fn contains(&self, cursor: Vec2) -> bool {
        let rel = cursor - self.min;
        rel.x >= 0.0 && rel.y >= 0.0 && rel.x < self.size.x && rel.y < self.size.y
    }

    /// Translate a UI cursor into attachment coordinates (bottom-left origin).
    ///
    /// The cursor is snapped to the centre of the UI pixel it falls in, then
    /// flipped with `attachment_y = panel_height - ui_relative_y`.
    pub fn to_attachment(&self, cursor: Vec2) -> Option<(i32, i32)> {
        if !self.contains(cursor) {
            return None;
        }
        let rel = (cursor - self.min).floor() + Vec2::splat(0.5);
        let x = rel.x.floor() as i32;
        let y = (self.size.y.floor() - rel.y).floor() as i32;
        Some((x, y))
    }
}

/// Read the entity under `cursor`.
///
/// Returns `Ok(None)` for the sentinel, for ids that do not decode, and for
/// entities that are no longer alive.
pub fn pick_entity(
    cursor: Vec2,
    rect: &ViewportRect,
    target: &dyn PickingTarget,
    store: &ComponentStore,
) -> Result<Option<EntityId>, PickError> {
    let Some((x, y)) = rect.to_attachment(cursor) else {
        return Ok(None);
    };
    let value = target.read_pixel(FramebufferSpec::ID_ATTACHMENT, x, y)?;
    Ok(EntityId::from_pick_id(value).filter(|e| store.is_alive(*e)))
}

/// Entity currently under the cursor, refreshed once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    hovered: Option<EntityId>,
}

impl HoverState {
    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn clear(&mut self) {
        self.hovered = None;
    }

    /// Re-pick under `cursor`. Every failure mode resolves to "nothing hovered".
    pub fn update(
        &mut self,
        cursor: Option<Vec2>,
        rect: &ViewportRect,
        target: &dyn PickingTarget,
        store: &ComponentStore,
    ) -> Option<EntityId> {
        self.hovered = cursor.and_then(|cursor| {
            if target.size() != rect.pixel_size() {
                tracing::debug!("picking target not yet resized, skipping readback");
                return None;
            }
            match pick_entity(cursor, rect, target, store) {
                Ok(hit) => hit,
                Err(err) => {
                    tracing::debug!(%err, "pick failed");
                    None
                }
            }
        });
        self.hovered
    }
}
