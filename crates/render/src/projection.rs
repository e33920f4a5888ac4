//! Projection matrices and viewports. Pure functions of their inputs.

use glam::Mat4;
use serde::Serialize;

/// Framebuffer region drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Whole framebuffer of the given size.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Width over height. Zero dimensions (minimised window) count as 1.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Orthographic projection covering `±width/2·aspect` by `±height/2·aspect`
/// with depth -1..1, in GL clip conventions. Zero dimensions count as 1.
pub fn orthographic(width: u32, height: u32) -> Mat4 {
    let (width, height) = (width.max(1), height.max(1));
    let aspect = aspect_ratio(width, height);
    let half_w = width as f32 / 2.0 * aspect;
    let half_h = height as f32 / 2.0 * aspect;
    Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
}

/// Perspective projection from a vertical field of view in degrees.
pub fn perspective(fovy_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(
        fovy_degrees.to_radians(),
        aspect_ratio(width, height),
        near,
        far,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn orthographic_scale_follows_formula() {
        let m = orthographic(800, 600);
        let aspect = 800.0 / 600.0;
        assert!((m.x_axis.x - 2.0 / (800.0 * aspect)).abs() < 1e-7);
        assert!((m.y_axis.y - 2.0 / (600.0 * aspect)).abs() < 1e-7);
    }

    #[test]
    fn orthographic_maps_bounds_to_clip_edges() {
        let m = orthographic(400, 300);
        let half_w = 200.0 * (400.0 / 300.0);
        let corner = m * Vec4::new(half_w, 0.0, 0.0, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_uses_aspect() {
        let wide = perspective(60.0, 1600, 900, 0.1, 100.0);
        let square = perspective(60.0, 900, 900, 0.1, 100.0);
        assert!((wide.y_axis.y - square.y_axis.y).abs() < 1e-6);
        assert!((square.x_axis.x / wide.x_axis.x - 16.0 / 9.0).abs() < 1e-4);
    }

    #[test]
    fn zero_dimensions_keep_matrices_finite() {
        for (w, h) in [(800, 0), (0, 600), (0, 0)] {
            assert!(perspective(45.0, w, h, 0.1, 10.0).is_finite(), "perspective {w}x{h}");
            assert!(orthographic(w, h).is_finite(), "orthographic {w}x{h}");
        }
        assert_eq!(aspect_ratio(0, 600), 1.0 / 600.0);
    }
}
