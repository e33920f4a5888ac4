//! Batching pass: turns the render pool into a frame plan of draw batches.
//!
//! # Rules
//! - Passes are never merged; batches of pass N come before those of pass N+1.
//! - Within a pass, opaque draws sharing a [`DrawState`] form one batch,
//!   ordered by first appearance.
//! - Blended draws follow the pass's opaque batches in submission order and
//!   only join the immediately preceding blended batch when the state matches.

use crate::pool::{BlendMode, Quad, RenderPool, TextureHandle};
use serde::Serialize;
use std::collections::HashMap;

/// Graphics state that must be bound before a batch is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DrawState {
    pub shader: String,
    pub blend: BlendMode,
    pub texture: TextureHandle,
}

/// Quads drawn with one state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawBatch {
    /// Index of the render pass the batch belongs to.
    pub pass: usize,
    pub state: DrawState,
    pub quads: Vec<Quad>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FramePlan {
    pub batches: Vec<DrawBatch>,
}

impl FramePlan {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(|b| b.quads.len()).sum()
    }
}

/// Build the frame plan for `pool`.
pub fn build_frame_plan(pool: &RenderPool) -> FramePlan {
    let mut batches = Vec::new();

    for (pass_index, pass) in pool.passes().iter().enumerate() {
        let mut opaque: Vec<DrawBatch> = Vec::new();
        let mut opaque_index: HashMap<DrawState, usize> = HashMap::new();
        let mut blended: Vec<DrawBatch> = Vec::new();

        for group in &pass.groups {
            for object in &group.objects {
                for texture in &object.textures {
                    let state = DrawState {
                        shader: group.shader.clone(),
                        blend: object.blend,
                        texture: texture.handle,
                    };

                    if object.blend.is_order_dependent() {
                        match blended.last_mut() {
                            Some(last) if last.state == state => last.quads.push(object.quad),
                            _ => blended.push(DrawBatch {
                                pass: pass_index,
                                state,
                                quads: vec![object.quad],
                            }),
                        }
                    } else if let Some(&i) = opaque_index.get(&state) {
                        opaque[i].quads.push(object.quad);
                    } else {
                        opaque_index.insert(state.clone(), opaque.len());
                        opaque.push(DrawBatch {
                            pass: pass_index,
                            state,
                            quads: vec![object.quad],
                        });
                    }
                }
            }
        }

        batches.append(&mut opaque);
        batches.append(&mut blended);
    }

    FramePlan { batches }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{RenderObject, Texture};
    use glam::Vec2;

    fn tex(id: u32) -> Texture {
        Texture::new(format!("t{id}"), TextureHandle(id))
    }

    fn object(name: &str, blend: BlendMode, textures: &[u32]) -> RenderObject {
        let mut o = RenderObject::new(name).with_blend(blend);
        for &t in textures {
            o = o.with_texture(tex(t));
        }
        o
    }

    #[test]
    fn empty_pool_gives_empty_plan() {
        assert!(build_frame_plan(&RenderPool::new()).is_empty());
    }

    #[test]
    fn opaque_draws_with_same_state_merge() {
        let mut pool = RenderPool::new();
        let group = pool.add_pass("main").add_group("sprite");
        group
            .add_object(object("a", BlendMode::Opaque, &[1]))
            .add_object(object("b", BlendMode::Opaque, &[2]))
            .add_object(object("c", BlendMode::Opaque, &[1]));

        let plan = build_frame_plan(&pool);
        assert_eq!(plan.batches.len(), 2);
        assert_eq!(plan.batches[0].state.texture, TextureHandle(1));
        assert_eq!(plan.batches[0].quads.len(), 2);
        assert_eq!(plan.batches[1].state.texture, TextureHandle(2));
        assert_eq!(plan.quad_count(), 3);
    }

    #[test]
    fn same_texture_under_different_shaders_stays_apart() {
        let mut pool = RenderPool::new();
        let pass = pool.add_pass("main");
        pass.add_group("sprite").add_object(object("a", BlendMode::Opaque, &[1]));
        pass.add_group("outline").add_object(object("b", BlendMode::Opaque, &[1]));
        assert_eq!(build_frame_plan(&pool).batches.len(), 2);
    }

    #[test]
    fn blended_draws_keep_submission_order() {
        let mut pool = RenderPool::new();
        pool.add_pass("main")
            .add_group("sprite")
            .add_object(object("glass1", BlendMode::Alpha, &[1]))
            .add_object(object("glass2", BlendMode::Alpha, &[1]))
            .add_object(object("smoke", BlendMode::Alpha, &[2]))
            .add_object(object("wall", BlendMode::Opaque, &[3]))
            .add_object(object("glass3", BlendMode::Alpha, &[1]));

        let plan = build_frame_plan(&pool);
        let order: Vec<_> = plan
            .batches
            .iter()
            .map(|b| (b.state.texture.0, b.quads.len()))
            .collect();
        // opaque first, then blended runs: [1,1] [2] [1]
        assert_eq!(order, [(3, 1), (1, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn passes_are_not_merged() {
        let mut pool = RenderPool::new();
        pool.add_pass("world")
            .add_group("sprite")
            .add_object(object("a", BlendMode::Opaque, &[1]));
        pool.add_pass("ui")
            .add_group("sprite")
            .add_object(object("b", BlendMode::Opaque, &[1]));

        let plan = build_frame_plan(&pool);
        assert_eq!(plan.batches.len(), 2);
        assert_eq!(plan.batches[0].pass, 0);
        assert_eq!(plan.batches[1].pass, 1);
    }

    #[test]
    fn multi_texture_object_contributes_one_quad_per_texture() {
        let mut pool = RenderPool::new();
        let quad = Quad::new(Vec2::new(2.0, 0.0), Vec2::splat(3.0));
        pool.add_pass("main")
            .add_group("sprite")
            .add_object(object("a", BlendMode::Opaque, &[1, 2]).with_quad(quad));

        let plan = build_frame_plan(&pool);
        assert_eq!(plan.batches.len(), 2);
        assert!(plan.batches.iter().all(|b| b.quads == [quad]));
    }
}
