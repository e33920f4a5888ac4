//! wgpu graphics device for the tessera renderer.
//!
//! Brings up an adapter and device, reports their capabilities and draws
//! batched textured quads with one instanced pipeline per blend mode.
//!
//! # Invariants
//! - No adapter or no device is a [`RenderError::Init`]; nothing renders.
//! - Each frame is one render pass with one colour and depth clear.
//! - Texture handles stay valid for the life of the device.

mod device;
mod probe;
mod shaders;

pub use device::WgpuDevice;
pub use probe::{probe, request_adapter, request_device};
pub use tessera_render::RenderError;

pub fn crate_info() -> &'static str {
    "tessera-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }
}
