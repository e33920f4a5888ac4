//! Recording device: stores every call instead of drawing.
//!
//! Used by tests and by tooling that wants to show what a frame would do
//! without a GPU.

use crate::batch::DrawState;
use crate::device::{Capabilities, GraphicsDevice};
use crate::pool::Quad;
use crate::projection::Viewport;
use glam::Mat4;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    SetViewport(Viewport),
    Clear { color: [f32; 4] },
    ApplyState(DrawState),
    DrawQuads(Vec<Quad>),
    EndFrame,
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::SetViewport(v) => {
                write!(f, "viewport {}x{} at ({}, {})", v.width, v.height, v.x, v.y)
            }
            DeviceCommand::Clear { color } => write!(
                f,
                "clear color=({:.2}, {:.2}, {:.2}, {:.2}) depth",
                color[0], color[1], color[2], color[3]
            ),
            DeviceCommand::ApplyState(s) => write!(
                f,
                "state shader={} blend={:?} texture={}",
                s.shader, s.blend, s.texture.0
            ),
            DeviceCommand::DrawQuads(quads) => write!(f, "draw {} quad(s)", quads.len()),
            DeviceCommand::EndFrame => write!(f, "end frame"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    capabilities: Capabilities,
    commands: Vec<DeviceCommand>,
    projection: Option<Mat4>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Projection uploaded by the last `begin_frame`.
    pub fn last_projection(&self) -> Option<Mat4> {
        self.projection
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::Clear { .. }))
            .count()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DrawQuads(_)))
            .count()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(DeviceCommand::SetViewport(viewport));
    }

    fn begin_frame(&mut self, projection: &Mat4, clear_color: [f32; 4]) {
        self.projection = Some(*projection);
        self.commands.push(DeviceCommand::Clear { color: clear_color });
    }

    fn apply_state(&mut self, state: &DrawState) {
        self.commands.push(DeviceCommand::ApplyState(state.clone()));
    }

    fn draw_quads(&mut self, quads: &[Quad]) {
        self.commands.push(DeviceCommand::DrawQuads(quads.to_vec()));
    }

    fn end_frame(&mut self) {
        self.commands.push(DeviceCommand::EndFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{BlendMode, TextureHandle};

    #[test]
    fn records_in_call_order() {
        let mut dev = RecordingDevice::new();
        dev.set_viewport(Viewport::full(640, 480));
        dev.begin_frame(&Mat4::IDENTITY, [0.0, 0.0, 0.0, 1.0]);
        dev.apply_state(&DrawState {
            shader: "sprite".into(),
            blend: BlendMode::Opaque,
            texture: TextureHandle(7),
        });
        dev.draw_quads(&[Quad::default()]);
        dev.end_frame();

        assert_eq!(dev.commands().len(), 5);
        assert_eq!(dev.clear_count(), 1);
        assert_eq!(dev.draw_count(), 1);
        assert_eq!(dev.last_projection(), Some(Mat4::IDENTITY));
        assert_eq!(dev.commands()[2].to_string(), "state shader=sprite blend=Opaque texture=7");
        assert_eq!(dev.take_commands().len(), 5);
        assert!(dev.commands().is_empty());
    }
}
