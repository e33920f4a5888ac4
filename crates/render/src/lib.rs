//! Rendering: render pool, batching pass, projection math and a
//! backend-agnostic engine driving a [`GraphicsDevice`].
//!
//! # Invariants
//! - The pool is a strict tree (owned vectors) iterated in insertion order.
//! - The renderer borrows texture handles for one frame and never frees them.
//! - A frame with nothing to draw issues no device calls; otherwise exactly
//!   one clear per frame.
//! - Projection updates replace the matrix; nothing accumulates across calls.

pub mod batch;
pub mod device;
pub mod engine;
pub mod pool;
pub mod projection;
pub mod recording;

pub use batch::{DrawBatch, DrawState, FramePlan, build_frame_plan};
pub use device::{Capabilities, GraphicsDevice, RenderError};
pub use engine::{FrameStats, RenderingEngine};
pub use pool::{
    BlendMode, Quad, RenderObject, RenderPass, RenderPool, ShaderGroup, Texture, TextureHandle,
};
pub use projection::Viewport;
pub use recording::{DeviceCommand, RecordingDevice};

pub fn crate_info() -> &'static str {
    "tessera-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
