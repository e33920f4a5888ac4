//! Adapter and device bring-up.
//!
//! Failing to get an adapter or a device is fatal: callers must stop before
//! creating a renderer.

use tessera_render::{Capabilities, RenderError};

/// Ask `instance` for an adapter, optionally one that can present to `surface`.
pub async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter, RenderError> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| RenderError::Init("no compatible graphics adapter".into()))
}

/// Open a device with the adapter's own limits.
pub async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tessera_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .map_err(|e| RenderError::Init(e.to_string()))
}

/// Query what the adapter supports.
///
/// `baseline` is full WebGPU compliance; downlevel adapters (GLES, WebGL2)
/// still render but report `false`. Instancing is part of core wgpu.
pub fn probe(adapter: &wgpu::Adapter) -> Capabilities {
    let info = adapter.get_info();
    let downlevel = adapter.get_downlevel_capabilities();
    let caps = Capabilities {
        backend: info.backend.to_str().to_string(),
        baseline: downlevel.is_webgpu_compliant(),
        instancing: true,
        max_texture_size: adapter.limits().max_texture_dimension_2d,
    };
    tracing::info!(
        "adapter {} ({}): baseline {}, max texture {}",
        info.name,
        caps.backend,
        if caps.baseline { "supported" } else { "not supported" },
        caps.max_texture_size
    );
    caps
}
