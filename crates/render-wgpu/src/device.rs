use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::HashMap;
use std::ops::Range;
use tessera_render::{
    BlendMode, Capabilities, DrawState, GraphicsDevice, Quad, RenderError, TextureHandle, Viewport,
};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const INITIAL_INSTANCES: u32 = 1024;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct CornerVertex {
    corner: [f32; 2],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct QuadInstance {
    center: [f32; 2],
    size: [f32; 2],
}

impl From<&Quad> for QuadInstance {
    fn from(quad: &Quad) -> Self {
        Self {
            center: quad.center.to_array(),
            size: quad.size.to_array(),
        }
    }
}

/// Two counter-clockwise triangles over the unit quad.
#[rustfmt::skip]
const UNIT_QUAD: [CornerVertex; 6] = [
    CornerVertex { corner: [-0.5,  0.5], uv: [0.0, 0.0] },
    CornerVertex { corner: [-0.5, -0.5], uv: [0.0, 1.0] },
    CornerVertex { corner: [ 0.5, -0.5], uv: [1.0, 1.0] },
    CornerVertex { corner: [ 0.5, -0.5], uv: [1.0, 1.0] },
    CornerVertex { corner: [ 0.5,  0.5], uv: [1.0, 0.0] },
    CornerVertex { corner: [-0.5,  0.5], uv: [0.0, 0.0] },
];

fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Opaque => wgpu::BlendState::REPLACE,
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        },
    }
}

/// Keep the viewport inside a `width`×`height` target; wgpu rejects
/// viewports that extend past the attachment.
fn clamp_viewport(viewport: Viewport, width: u32, height: u32) -> Viewport {
    let x = viewport.x.min(width);
    let y = viewport.y.min(height);
    Viewport {
        x,
        y,
        width: viewport.width.min(width - x),
        height: viewport.height.min(height - y),
    }
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

struct PendingDraw {
    state: Option<DrawState>,
    instances: Range<u32>,
}

struct Target {
    view: wgpu::TextureView,
    depth: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// [`GraphicsDevice`] over a wgpu device and queue.
///
/// Draw calls between `begin_frame` and `end_frame` are recorded, then
/// encoded into a single render pass that clears colour and depth once.
/// Every shader group is drawn with the built-in textured-quad shader; the
/// group name only separates batches.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    capabilities: Capabilities,
    pipelines: HashMap<BlendMode, wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<TextureHandle, GpuTexture>,
    next_handle: u32,
    corner_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    target: Option<Target>,
    viewport: Option<Viewport>,
    projection: Mat4,
    clear_color: [f32; 4],
    current: Option<DrawState>,
    instances: Vec<QuadInstance>,
    draws: Vec<PendingDraw>,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        capabilities: Capabilities,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::QUAD_SHADER.into()),
        });

        let pipelines = [BlendMode::Opaque, BlendMode::Alpha, BlendMode::Additive]
            .into_iter()
            .map(|mode| {
                let pipeline =
                    Self::create_pipeline(&device, &pipeline_layout, &shader, target_format, mode);
                (mode, pipeline)
            })
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let corner_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_corner_buffer"),
            contents: bytemuck::cast_slice(&UNIT_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_buffer = Self::create_instance_buffer(&device, INITIAL_INSTANCES);

        Self {
            device,
            queue,
            capabilities,
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            sampler,
            textures: HashMap::new(),
            next_handle: 1,
            corner_buffer,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCES,
            target: None,
            viewport: None,
            projection: Mat4::IDENTITY,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            current: None,
            instances: Vec::new(),
            draws: Vec::new(),
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        mode: BlendMode,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad_pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<CornerVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x2,
                            1 => Float32x2,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x2,
                            3 => Float32x2,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend_state(mode)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            // Quads are ordered by submission, so depth is cleared but never tested.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_instance_buffer"),
            size: capacity as u64 * std::mem::size_of::<QuadInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Upload RGBA8 pixels and return the handle render objects refer to.
    pub fn register_texture(
        &mut self,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, RenderError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::TextureSize {
                expected,
                actual: rgba.len(),
            });
        }
        let max = self.capabilities.max_texture_size;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::Init(format!(
                "texture `{label}` is {width}x{height}, limit is {max}x{max}"
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&Default::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(
            handle,
            GpuTexture {
                bind_group,
                _texture: texture,
            },
        );
        tracing::debug!("registered texture `{label}` ({width}x{height}) as {}", handle.0);
        Ok(handle)
    }

    /// Set the view the next frame renders into. The depth buffer follows
    /// the target's size.
    pub fn set_target(&mut self, view: wgpu::TextureView, width: u32, height: u32) {
        let depth = match self.target.take() {
            Some(old) if old.width == width && old.height == height => old.depth,
            _ => Self::create_depth_texture(&self.device, width, height),
        };
        self.target = Some(Target {
            view,
            depth,
            width,
            height,
        });
    }

    fn ensure_instance_capacity(&mut self, needed: u32) {
        if needed <= self.instance_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        tracing::debug!("growing quad instance buffer to {capacity}");
        self.instance_buffer = Self::create_instance_buffer(&self.device, capacity);
        self.instance_capacity = capacity;
    }

    fn submit(&mut self) {
        let Some(target) = self.target.as_ref() else {
            tracing::warn!("no render target set; dropping frame");
            return;
        };

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                projection: self.projection.to_cols_array_2d(),
            }),
        );
        if !self.instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let [r, g, b, a] = self.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(viewport) = self.viewport {
                let v = clamp_viewport(viewport, target.width, target.height);
                if v.width > 0 && v.height > 0 {
                    pass.set_viewport(
                        v.x as f32,
                        v.y as f32,
                        v.width as f32,
                        v.height as f32,
                        0.0,
                        1.0,
                    );
                }
            }
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.corner_buffer.slice(..));
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for draw in &self.draws {
                let Some(state) = draw.state.as_ref() else {
                    tracing::warn!("draw issued before any state was applied; skipping");
                    continue;
                };
                let Some(texture) = self.textures.get(&state.texture) else {
                    tracing::warn!("{}; skipping draw", RenderError::UnknownTexture(state.texture.0));
                    continue;
                };
                let Some(pipeline) = self.pipelines.get(&state.blend) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &texture.bind_group, &[]);
                pass.draw(0..UNIT_QUAD.len() as u32, draw.instances.clone());
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl GraphicsDevice for WgpuDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn begin_frame(&mut self, projection: &Mat4, clear_color: [f32; 4]) {
        self.projection = *projection;
        self.clear_color = clear_color;
        self.current = None;
        self.instances.clear();
        self.draws.clear();
    }

    fn apply_state(&mut self, state: &DrawState) {
        self.current = Some(state.clone());
    }

    fn draw_quads(&mut self, quads: &[Quad]) {
        if quads.is_empty() {
            return;
        }
        let start = self.instances.len() as u32;
        self.instances.extend(quads.iter().map(QuadInstance::from));
        let end = self.instances.len() as u32;
        self.draws.push(PendingDraw {
            state: self.current.clone(),
            instances: start..end,
        });
    }

    fn end_frame(&mut self) {
        self.ensure_instance_capacity(self.instances.len() as u32);
        self.submit();
        self.draws.clear();
        self.instances.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn signed_area(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
        (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
    }

    #[test]
    fn unit_quad_triangles_face_forward() {
        for tri in UNIT_QUAD.chunks(3) {
            let area = signed_area(tri[0].corner, tri[1].corner, tri[2].corner);
            assert!(area > 0.0, "triangle is clockwise: {tri:?}");
        }
    }

    #[test]
    fn unit_quad_matches_pool_corners() {
        let corners = Quad::default().corners();
        for (pos, uv) in corners {
            assert!(
                UNIT_QUAD
                    .iter()
                    .any(|v| Vec2::from(v.corner) == pos && Vec2::from(v.uv) == uv),
                "missing corner {pos:?} {uv:?}"
            );
        }
    }

    #[test]
    fn instance_from_quad() {
        let q = Quad::new(Vec2::new(3.0, -1.0), Vec2::new(2.0, 4.0));
        assert_eq!(
            QuadInstance::from(&q),
            QuadInstance {
                center: [3.0, -1.0],
                size: [2.0, 4.0],
            }
        );
    }

    #[test]
    fn blend_states_per_mode() {
        assert_eq!(blend_state(BlendMode::Opaque), wgpu::BlendState::REPLACE);
        assert_eq!(blend_state(BlendMode::Alpha), wgpu::BlendState::ALPHA_BLENDING);
        let additive = blend_state(BlendMode::Additive);
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn viewport_is_clamped_to_target() {
        let v = clamp_viewport(Viewport::full(1920, 1080), 800, 600);
        assert_eq!(v, Viewport::full(800, 600));

        let offset = Viewport {
            x: 700,
            y: 0,
            width: 400,
            height: 100,
        };
        assert_eq!(clamp_viewport(offset, 800, 600).width, 100);

        let outside = Viewport {
            x: 900,
            y: 900,
            width: 10,
            height: 10,
        };
        let clamped = clamp_viewport(outside, 800, 600);
        assert_eq!((clamped.width, clamped.height), (0, 0));
    }
}
