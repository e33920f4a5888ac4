use crate::batch::build_frame_plan;
use crate::device::{Capabilities, GraphicsDevice};
use crate::pool::RenderPool;
use crate::projection::{self, Viewport};
use glam::Mat4;

/// Counters for one `update` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub clears: usize,
    pub batches: usize,
    pub quads: usize,
}

/// Drives a [`GraphicsDevice`] from a render pool once per engine tick.
///
/// Holds the current projection matrix and viewport; the pool is borrowed
/// for the duration of each `update` only.
pub struct RenderingEngine<D: GraphicsDevice> {
    device: D,
    projection: Mat4,
    viewport: Viewport,
    clear_color: [f32; 4],
}

impl<D: GraphicsDevice> RenderingEngine<D> {
    pub fn new(device: D) -> Self {
        let caps = device.capabilities();
        tracing::info!(
            "rendering engine on {} backend (baseline: {}, instancing: {}, max texture {})",
            caps.backend,
            caps.baseline,
            caps.instancing,
            caps.max_texture_size
        );
        if !caps.baseline {
            tracing::warn!("graphics adapter is below the baseline feature set");
        }
        Self {
            device,
            projection: Mat4::IDENTITY,
            viewport: Viewport::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.device.capabilities()
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    /// Replace the projection with an orthographic one for a framebuffer of
    /// `width`×`height` and resize the viewport to match.
    pub fn update_orthographic_projection(&mut self, width: u32, height: u32) {
        tracing::debug!("updating orthographic projection for {width}x{height}");
        self.projection = projection::orthographic(width, height);
        self.set_viewport(width, height);
    }

    /// Replace the projection with a perspective one and resize the viewport.
    pub fn update_perspective_projection(
        &mut self,
        fovy_degrees: f32,
        width: u32,
        height: u32,
        near: f32,
        far: f32,
    ) {
        tracing::debug!("updating perspective projection for {width}x{height}, fov {fovy_degrees}");
        self.projection = projection::perspective(fovy_degrees, width, height, near, far);
        self.set_viewport(width, height);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::full(width, height);
        self.device.set_viewport(self.viewport);
    }

    /// Draw everything in `pool`.
    ///
    /// The pool is batched first; a frame with nothing to draw touches the
    /// device not at all. Otherwise the framebuffer is cleared once and each
    /// batch costs one state change and one draw.
    pub fn update(&mut self, pool: &RenderPool) -> FrameStats {
        let plan = build_frame_plan(pool);
        if plan.is_empty() {
            return FrameStats::default();
        }

        self.device.begin_frame(&self.projection, self.clear_color);
        for batch in &plan.batches {
            self.device.apply_state(&batch.state);
            self.device.draw_quads(&batch.quads);
        }
        self.device.end_frame();

        FrameStats {
            clears: 1,
            batches: plan.batches.len(),
            quads: plan.quad_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{BlendMode, RenderObject, Texture, TextureHandle};
    use crate::recording::{DeviceCommand, RecordingDevice};

    fn engine() -> RenderingEngine<RecordingDevice> {
        RenderingEngine::new(RecordingDevice::new())
    }

    fn textured(name: &str, handle: u32) -> RenderObject {
        RenderObject::new(name).with_texture(Texture::new(name, TextureHandle(handle)))
    }

    #[test]
    fn empty_at_every_tier_issues_nothing() {
        let mut pools = Vec::new();
        pools.push(RenderPool::new());

        let mut pass_only = RenderPool::new();
        pass_only.add_pass("main");
        pools.push(pass_only);

        let mut group_only = RenderPool::new();
        group_only.add_pass("main").add_group("sprite");
        pools.push(group_only);

        let mut object_only = RenderPool::new();
        object_only
            .add_pass("main")
            .add_group("sprite")
            .add_object(RenderObject::new("bare"));
        pools.push(object_only);

        for pool in &pools {
            let mut e = engine();
            let stats = e.update(pool);
            assert_eq!(stats, FrameStats::default());
            assert!(e.device().commands().is_empty());
        }
    }

    #[test]
    fn one_clear_per_frame_regardless_of_texture_count() {
        let mut pool = RenderPool::new();
        let group = pool.add_pass("main").add_group("sprite");
        for i in 0..5 {
            group.add_object(textured(&format!("o{i}"), i));
        }
        let mut e = engine();
        let stats = e.update(&pool);
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.batches, 5);
        assert_eq!(stats.quads, 5);
        assert_eq!(e.device().clear_count(), 1);
        assert_eq!(e.device().draw_count(), 5);
    }

    #[test]
    fn shared_texture_is_one_draw() {
        let mut pool = RenderPool::new();
        let group = pool.add_pass("main").add_group("sprite");
        for i in 0..4 {
            group.add_object(textured(&format!("tile{i}"), 1));
        }
        let mut e = engine();
        let stats = e.update(&pool);
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.quads, 4);
        let cmds = e.device().commands();
        assert!(matches!(cmds[0], DeviceCommand::Clear { .. }));
        assert!(matches!(cmds[1], DeviceCommand::ApplyState(_)));
        assert!(matches!(&cmds[2], DeviceCommand::DrawQuads(q) if q.len() == 4));
        assert_eq!(cmds[3], DeviceCommand::EndFrame);
    }

    #[test]
    fn frame_uses_current_projection_and_clear_color() {
        let mut pool = RenderPool::new();
        pool.add_pass("main")
            .add_group("sprite")
            .add_object(textured("a", 1).with_blend(BlendMode::Alpha));
        let mut e = engine();
        e.update_orthographic_projection(800, 600);
        e.set_clear_color([0.2, 0.3, 0.4, 1.0]);
        e.device_mut().take_commands();
        e.update(&pool);
        assert_eq!(
            e.device().commands()[0],
            DeviceCommand::Clear {
                color: [0.2, 0.3, 0.4, 1.0]
            }
        );
        assert_eq!(
            e.device().last_projection(),
            Some(projection::orthographic(800, 600))
        );
    }

    #[test]
    fn orthographic_updates_do_not_accumulate() {
        let mut a = engine();
        a.update_orthographic_projection(800, 600);
        a.update_orthographic_projection(400, 300);

        let mut b = engine();
        b.update_orthographic_projection(400, 300);

        assert_eq!(a.projection(), b.projection());
        assert_eq!(a.projection(), projection::orthographic(400, 300));

        a.update_orthographic_projection(800, 600);
        assert_eq!(a.projection(), projection::orthographic(800, 600));
        assert_eq!(a.viewport(), Viewport::full(800, 600));

        let device = a.into_device();
        assert_eq!(device.commands().len(), 3);
    }

    #[test]
    fn projection_updates_set_viewport() {
        let mut e = engine();
        e.update_perspective_projection(45.0, 1280, 720, 0.1, 100.0);
        assert_eq!(
            e.device().commands(),
            [DeviceCommand::SetViewport(Viewport::full(1280, 720))]
        );
        assert_eq!(
            e.projection(),
            projection::perspective(45.0, 1280, 720, 0.1, 100.0)
        );
    }

    #[test]
    fn capabilities_are_queryable() {
        let caps = Capabilities {
            backend: "test".into(),
            baseline: false,
            instancing: false,
            max_texture_size: 2048,
        };
        let e = RenderingEngine::new(RecordingDevice::with_capabilities(caps.clone()));
        assert_eq!(e.capabilities(), &caps);
    }
}
