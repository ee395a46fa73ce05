use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Store-assigned identifier for an entity.
///
/// Identifiers are allocated monotonically and double as the payload written
/// into the picking attachment, hence the `i32` conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Largest id that fits the `i32` id attachment.
    pub const MAX_PICKABLE: u32 = i32::MAX as u32;

    /// Id-attachment value that means "no entity".
    pub const NO_PICK: i32 = -1;

    /// The value written into the id attachment for this entity.
    ///
    /// Ids above [`EntityId::MAX_PICKABLE`] are written as [`EntityId::NO_PICK`]
    /// so they can never read back as another entity.
    pub fn pick_id(self) -> i32 {
        i32::try_from(self.0).unwrap_or_else(|_| {
            tracing::warn!(entity = self.0, "entity id exceeds the id attachment range");
            Self::NO_PICK
        })
    }

    pub fn is_pickable(self) -> bool {
        self.0 <= Self::MAX_PICKABLE
    }

    /// Recover an entity id from an id-attachment value. Negative values
    /// (the clear sentinel) mean "no entity".
    pub fn from_pick_id(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persistent identity of an entity, stable across save/load cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityUuid(pub Uuid);

impl EntityUuid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityUuid {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform: translation, Euler rotation (radians), scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians, applied X first, then Y, then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_z(self.rotation.z)
            * Quat::from_rotation_y(self.rotation.y)
            * Quat::from_rotation_x(self.rotation.x)
    }

    /// World matrix = translate × rotate × scale.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(self.orientation())
            * Mat4::from_scale(self.scale)
    }
}
