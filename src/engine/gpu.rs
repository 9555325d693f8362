// wgpu device / surface setup and the small helpers every pipeline uses.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::error::GraphicsSetupError;
use super::mesh::Mesh;

pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, GraphicsSetupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GraphicsSetupError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("npr_viewer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats).ok_or(GraphicsSetupError::NoSurfaceFormat)?;
        let present_mode = caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface configured: {}x{} {:?}", config.width, config.height, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the surface. Zero-sized requests (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

/// Shaders write display-ready values, so prefer a non-sRGB format to avoid
/// a second gamma encode. Falls back to the first reported format.
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Create a WGSL module inside a validation error scope.
pub fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, GraphicsSetupError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(module),
        Some(err) => Err(GraphicsSetupError::ShaderCompile {
            label: label.to_string(),
            diagnostic: err.to_string(),
        }),
    }
}

/// Create a render pipeline inside a validation error scope.
pub fn create_pipeline(
    device: &wgpu::Device,
    desc: &wgpu::RenderPipelineDescriptor<'_>,
) -> Result<wgpu::RenderPipeline, GraphicsSetupError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(desc);
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(pipeline),
        Some(err) => Err(GraphicsSetupError::PipelineLink {
            label: desc.label.unwrap_or("unnamed").to_string(),
            diagnostic: err.to_string(),
        }),
    }
}

// ============================================================================
// MESH BUFFERS
// ============================================================================

/// GPU copy of the current mesh: one interleaved vertex buffer plus the
/// triangle and wireframe index buffers.
pub struct MeshBuffers {
    vertex: wgpu::Buffer,
    triangles: wgpu::Buffer,
    wires: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    triangle_index_count: u32,
    wire_index_count: u32,
}

fn index_buffer(device: &wgpu::Device, label: &str, indices: &[u32], format: wgpu::IndexFormat) -> wgpu::Buffer {
    let narrowed: Vec<u16>;
    let contents: &[u8] = match format {
        wgpu::IndexFormat::Uint16 => {
            narrowed = indices.iter().map(|&i| i as u16).collect();
            bytemuck::cast_slice(&narrowed)
        }
        wgpu::IndexFormat::Uint32 => bytemuck::cast_slice(indices),
    };
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::INDEX,
    })
}

impl MeshBuffers {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let index_format = mesh.index_format();
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&mesh.gpu_vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let triangles = index_buffer(device, "mesh_triangles", mesh.triangle_indices(), index_format);
        let wires = index_buffer(device, "mesh_wires", mesh.wireframe_indices(), index_format);

        log::debug!(
            "Uploaded mesh: {} vertices, {} triangles, {:?} indices",
            mesh.vertex_count(),
            mesh.triangle_count(),
            index_format
        );

        Self {
            vertex,
            triangles,
            wires,
            index_format,
            triangle_index_count: mesh.triangle_indices().len() as u32,
            wire_index_count: mesh.wireframe_indices().len() as u32,
        }
    }

    pub fn draw_triangles(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_index_buffer(self.triangles.slice(..), self.index_format);
        pass.draw_indexed(0..self.triangle_index_count, 0, 0..1);
    }

    pub fn draw_wires(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_index_buffer(self.wires.slice(..), self.index_format);
        pass.draw_indexed(0..self.wire_index_count, 0, 0..1);
    }

    /// Release the GPU memory now rather than when the handles drop.
    pub fn destroy(self) {
        self.vertex.destroy();
        self.triangles.destroy();
        self.wires.destroy();
    }
}
