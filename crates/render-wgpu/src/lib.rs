//! wgpu backend for the editor viewport.
//!
//! [`WgpuDevice`] renders pipeline frames into off-screen color, entity id
//! and depth targets. The color target is sampled by the UI; the id target is
//! read back one texel at a time for picking.
//!
//! # Invariants
//! - Draw order within a frame is submission order.
//! - Line geometry never writes the id target.
//! - Read-back coordinates use a bottom-left origin, like the software device.

mod batch;
mod device;
mod shaders;
mod target;

pub use device::WgpuDevice;
pub use target::{COLOR_FORMAT, DEPTH_FORMAT, ID_FORMAT};
