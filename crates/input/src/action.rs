use serde::{Deserialize, Serialize};

/// A high-level editor command produced by a shortcut.
///
/// The host and the panels consume actions, never raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Write the scene to its current path.
    SaveScene,
    /// Reload the scene from its current path.
    LoadScene,
    /// Create a cube entity with a mesh renderer.
    SpawnCube,
    /// Destroy the selected entity.
    DeleteSelected,
    /// Clear the current selection.
    Deselect,
    /// Show or hide the hierarchy panel.
    ToggleHierarchy,
}
