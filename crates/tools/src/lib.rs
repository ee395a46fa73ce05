//! Developer tooling: the scene inspector behind the hierarchy panel and the CLI.
//!
//! # Invariants
//! - Queries are read-only; edits go through explicit policy functions.

mod inspector;
mod sample;

pub use inspector::{EntityInfo, InspectorError, SceneInspector, SceneSummary};
pub use sample::{populate_sample_scene, spawn_cube};
