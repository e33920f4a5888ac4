/// WGSL shader for instanced textured quads.
///
/// Group 0 holds the projection, group 1 the bound texture and its sampler.
/// Each instance is a quad centre and size; the unit-quad vertex buffer
/// supplies corner offsets in -0.5..0.5 and texture coordinates.
pub const QUAD_SHADER: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var quad_texture: texture_2d<f32>;
@group(1) @binding(1)
var quad_sampler: sampler;

struct VertexInput {
    @location(0) corner: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct InstanceInput {
    @location(2) center: vec2<f32>,
    @location(3) size: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    let world = instance.center + vertex.corner * instance.size;
    out.clip_position = uniforms.projection * vec4<f32>(world, 0.0, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(quad_texture, quad_sampler, in.uv);
}
"#;
