//! The render pool: passes own shader groups, groups own render objects,
//! objects own textures. Iteration everywhere follows insertion order.

use glam::Vec2;
use serde::Serialize;

/// Opaque graphics-API texture id. The renderer borrows it for one frame and
/// never frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Texture {
    pub name: String,
    pub handle: TextureHandle,
}

impl Texture {
    pub fn new(name: impl Into<String>, handle: TextureHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }
}

/// How a draw combines with what is already in the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BlendMode {
    #[default]
    Opaque,
    Alpha,
    Additive,
}

impl BlendMode {
    /// Blended draws depend on what was drawn before them.
    pub fn is_order_dependent(self) -> bool {
        !matches!(self, BlendMode::Opaque)
    }
}

/// Axis-aligned textured quad in model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quad {
    pub center: Vec2,
    pub size: Vec2,
}

impl Default for Quad {
    /// Unit quad around the origin, spanning -0.5..0.5 on both axes.
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }
}

impl Quad {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Corners with texture coordinates, counter-clockwise from top-left.
    pub fn corners(&self) -> [(Vec2, Vec2); 4] {
        let h = self.size * 0.5;
        let c = self.center;
        [
            (Vec2::new(c.x - h.x, c.y + h.y), Vec2::new(0.0, 0.0)),
            (Vec2::new(c.x - h.x, c.y - h.y), Vec2::new(0.0, 1.0)),
            (Vec2::new(c.x + h.x, c.y - h.y), Vec2::new(1.0, 1.0)),
            (Vec2::new(c.x + h.x, c.y + h.y), Vec2::new(1.0, 0.0)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderObject {
    pub name: String,
    pub blend: BlendMode,
    pub quad: Quad,
    pub textures: Vec<Texture>,
}

impl RenderObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend: BlendMode::default(),
            quad: Quad::default(),
            textures: Vec::new(),
        }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_quad(mut self, quad: Quad) -> Self {
        self.quad = quad;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.textures.push(texture);
        self
    }
}

/// Render objects drawn with the same shader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaderGroup {
    pub shader: String,
    pub objects: Vec<RenderObject>,
}

impl ShaderGroup {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            objects: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: RenderObject) -> &mut Self {
        self.objects.push(object);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPass {
    pub name: String,
    pub groups: Vec<ShaderGroup>,
}

impl RenderPass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Append a shader group and return it for filling.
    pub fn add_group(&mut self, shader: impl Into<String>) -> &mut ShaderGroup {
        self.groups.push(ShaderGroup::new(shader));
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }
}

/// Everything scheduled for drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderPool {
    passes: Vec<RenderPass>,
}

impl RenderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass and return it for filling.
    pub fn add_pass(&mut self, name: impl Into<String>) -> &mut RenderPass {
        self.passes.push(RenderPass::new(name));
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn clear(&mut self) {
        self.passes.clear();
    }

    /// Number of textures across all leaves, i.e. the number of quads drawn.
    pub fn texture_count(&self) -> usize {
        self.passes
            .iter()
            .flat_map(|p| &p.groups)
            .flat_map(|g| &g.objects)
            .map(|o| o.textures.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_keep_insertion_order() {
        let mut pool = RenderPool::new();
        let pass = pool.add_pass("main");
        pass.add_group("sprite")
            .add_object(RenderObject::new("a").with_texture(Texture::new("a", TextureHandle(1))))
            .add_object(RenderObject::new("b"));
        pass.add_group("ui");
        pool.add_pass("overlay");

        let names: Vec<_> = pool.passes().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["main", "overlay"]);
        assert_eq!(pool.passes()[0].groups[0].objects[1].name, "b");
        assert_eq!(pool.texture_count(), 1);

        pool.clear();
        assert!(pool.passes().is_empty());
        assert_eq!(pool.texture_count(), 0);
    }

    #[test]
    fn default_quad_spans_unit_square() {
        let corners = Quad::default().corners();
        assert_eq!(corners[0].0, Vec2::new(-0.5, 0.5));
        assert_eq!(corners[2].0, Vec2::new(0.5, -0.5));
        assert_eq!(corners[2].1, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn only_blended_modes_are_order_dependent() {
        assert!(!BlendMode::Opaque.is_order_dependent());
        assert!(BlendMode::Alpha.is_order_dependent());
        assert!(BlendMode::Additive.is_order_dependent());
    }
}
