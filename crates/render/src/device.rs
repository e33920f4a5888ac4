use crate::batch::DrawState;
use crate::pool::Quad;
use crate::projection::Viewport;
use glam::Mat4;
use serde::Serialize;

/// What the graphics backend reported when it was initialised.
///
/// The engine only logs these today. A renderer that needs a fallback path
/// (for example, no instancing) should branch on this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Backend name, e.g. `vulkan` or `gl`.
    pub backend: String,
    /// The adapter meets the baseline feature set.
    pub baseline: bool,
    /// Instanced drawing is available.
    pub instancing: bool,
    pub max_texture_size: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            backend: "none".into(),
            baseline: true,
            instancing: true,
            max_texture_size: 8192,
        }
    }
}

/// Errors from graphics backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The graphics context could not be brought up. Rendering cannot start.
    #[error("graphics initialisation failed: {0}")]
    Init(String),
    #[error("unknown texture handle {0}")]
    UnknownTexture(u32),
    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureSize { expected: usize, actual: usize },
}

/// The calls the rendering engine makes against a graphics API.
///
/// Calls arrive as `begin_frame`, then any number of `apply_state` +
/// `draw_quads` pairs, then `end_frame`. Per-draw calls are not checked for
/// errors; a device is assumed usable once constructed.
pub trait GraphicsDevice {
    fn capabilities(&self) -> &Capabilities;

    fn set_viewport(&mut self, viewport: Viewport);

    /// Start a frame: clear colour and depth once and upload the projection.
    fn begin_frame(&mut self, projection: &Mat4, clear_color: [f32; 4]);

    /// Back-face culling, texturing, blend mode, shader and texture binding.
    fn apply_state(&mut self, state: &DrawState);

    fn draw_quads(&mut self, quads: &[Quad]);

    fn end_frame(&mut self);
}
