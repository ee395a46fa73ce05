//! Backend-agnostic rendering core of the editor.
//!
//! Reads the component store, resolves the frame camera, and issues draw
//! commands through [`GraphicsDevice`]. Ships a software device so frames can
//! be rendered and picked without a GPU.
//!
//! # Invariants
//! - The pipeline never mutates component data.
//! - The id attachment is cleared to the sentinel before any draw that writes ids.
//! - Transparent triangles are drawn farthest first with depth writes off.
//! - Camera selection is deterministic: the lowest-id primary camera wins.

pub mod camera;
pub mod device;
mod error;
pub mod framebuffer;
pub mod picking;
pub mod pipeline;
pub mod resources;
pub mod software;
pub mod transparency;

pub use camera::{
    CameraResolver, CameraSource, EditorCamera, InteractiveCamera, ResolvedCamera,
    on_viewport_resize,
};
pub use device::{
    Command, DrawCall, DrawKind, Geometry, GraphicsDevice, LightInfo, MAX_LIGHTS, RecordedDraw,
    RecordingDevice, SceneUniforms,
};
pub use error::{PickError, RenderError, SettingsError};
pub use framebuffer::{AttachmentFormat, Framebuffer, FramebufferSpec, PickingTarget};
pub use picking::{HoverState, ViewportRect, pick_entity};
pub use pipeline::{FramePhase, FrameStats, RenderPipeline};
pub use resources::{
    EditorCameraSettings, RenderSettings, ResourceContext, ShaderHandle, ShaderLibrary,
};
pub use software::SoftwareDevice;
pub use transparency::{TransparencySorter, TransparentTriangle};
