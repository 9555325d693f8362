// Render pipelines for the mesh passes and the scissored clear, plus the
// uniform slots each pass writes before its viewport is submitted.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::error::GraphicsSetupError;
use super::frame::FrameTransforms;
use super::gbuffer::{DEPTH_FORMAT, GBUFFER_FORMAT};
use super::gpu;
use super::mesh::GpuVertex;
use super::shading::{ShadingParams, ToonRampTexture};

/// Uniform block shared by every entry point of shaders/mesh.wgsl (224 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SceneUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub cool_color: [f32; 4],
    pub warm_color: [f32; 4],
    /// Output color of fs_flat (hull, wireframe).
    pub flat_color: [f32; 4],
    /// scale, width, strength, unused
    pub hatch: [f32; 4],
    pub mode: u32,
    pub _pad: [u32; 3],
}

fn rgba(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}

impl SceneUniforms {
    /// Transforms only; used by the geometry pass.
    pub fn transforms(transforms: &FrameTransforms) -> Self {
        Self {
            model: transforms.model.to_cols_array_2d(),
            view_proj: transforms.view_proj.to_cols_array_2d(),
            ..Self::zeroed()
        }
    }

    pub fn flat(transforms: &FrameTransforms, color: [f32; 3]) -> Self {
        Self {
            flat_color: rgba(color),
            ..Self::transforms(transforms)
        }
    }

    pub fn shaded(transforms: &FrameTransforms, shading: &ShadingParams) -> Self {
        Self {
            base_color: rgba(shading.base_color),
            cool_color: rgba(shading.gooch.cool),
            warm_color: rgba(shading.gooch.warm),
            hatch: [shading.hatch.scale, shading.hatch.width, shading.hatch.strength, 0.0],
            mode: shading.mode.shader_index(),
            ..Self::transforms(transforms)
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ClearUniforms {
    pub color: [f32; 4],
}

/// One uniform buffer plus its bind group.
pub struct UniformSlot {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new<T: Pod>(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, initial: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }

    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }
}

/// Uniform slots written once per viewport. Every pass that draws in the
/// same submission needs its own buffer.
pub struct UniformSlots {
    pub geometry: UniformSlot,
    pub hull: UniformSlot,
    pub shaded: UniformSlot,
    pub wire: UniformSlot,
    pub clear: UniformSlot,
}

pub struct MeshPipelines {
    pub geometry: wgpu::RenderPipeline,
    pub hull: wgpu::RenderPipeline,
    pub shaded: wgpu::RenderPipeline,
    pub wire: wgpu::RenderPipeline,
    pub clear: wgpu::RenderPipeline,
    pub ramp_layout: wgpu::BindGroupLayout,
    pub uniforms: UniformSlots,
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// Render state knobs that differ between the mesh pipelines.
struct MeshPassState<'a> {
    label: &'a str,
    fragment_entry: &'a str,
    target: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
    bias: wgpu::DepthBiasState,
}

fn mesh_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    state: MeshPassState<'_>,
) -> Result<wgpu::RenderPipeline, GraphicsSetupError> {
    gpu::create_pipeline(
        device,
        &wgpu::RenderPipelineDescriptor {
            label: Some(state.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(state.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: state.target,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: state.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: state.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: state.depth_write,
                depth_compare: state.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: state.bias,
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        },
    )
}

impl MeshPipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self, GraphicsSetupError> {
        let mesh_shader = gpu::compile_shader(device, "mesh", include_str!("shaders/mesh.wgsl"))?;
        let clear_shader = gpu::compile_shader(device, "clear", include_str!("shaders/clear.wgsl"))?;

        let scene_layout = uniform_layout(device, "scene_uniform_bgl");
        let clear_layout = uniform_layout(device, "clear_uniform_bgl");
        let ramp_layout = ToonRampTexture::bind_group_layout(device);

        let flat_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_flat_layout"),
            bind_group_layouts: &[&scene_layout],
            push_constant_ranges: &[],
        });
        let shaded_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_shaded_layout"),
            bind_group_layouts: &[&scene_layout, &ramp_layout],
            push_constant_ranges: &[],
        });
        let clear_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("clear_layout"),
            bind_group_layouts: &[&clear_layout],
            push_constant_ranges: &[],
        });

        let geometry = mesh_pipeline(
            device,
            &mesh_shader,
            &flat_pipeline_layout,
            MeshPassState {
                label: "geometry",
                fragment_entry: "fs_geometry",
                target: GBUFFER_FORMAT,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
                bias: wgpu::DepthBiasState::default(),
            },
        )?;

        // Front faces culled: only the far side of the inflated shell shows.
        // No depth write, so the main pass still lands on top of it.
        let hull = mesh_pipeline(
            device,
            &mesh_shader,
            &flat_pipeline_layout,
            MeshPassState {
                label: "outline_hull",
                fragment_entry: "fs_flat",
                target: surface_format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
                bias: wgpu::DepthBiasState::default(),
            },
        )?;

        // Pushed back slightly so the wireframe overlay wins the depth test.
        let shaded = mesh_pipeline(
            device,
            &mesh_shader,
            &shaded_pipeline_layout,
            MeshPassState {
                label: "shaded",
                fragment_entry: "fs_shaded",
                target: surface_format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
                bias: wgpu::DepthBiasState {
                    constant: 1,
                    slope_scale: 1.0,
                    clamp: 0.0,
                },
            },
        )?;

        let wire = mesh_pipeline(
            device,
            &mesh_shader,
            &flat_pipeline_layout,
            MeshPassState {
                label: "wireframe",
                fragment_entry: "fs_flat",
                target: surface_format,
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                bias: wgpu::DepthBiasState::default(),
            },
        )?;

        let clear = gpu::create_pipeline(
            device,
            &wgpu::RenderPipelineDescriptor {
                label: Some("viewport_clear"),
                layout: Some(&clear_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &clear_shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &clear_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                // Writes far depth everywhere inside the scissor.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        let blank = SceneUniforms::zeroed();
        let uniforms = UniformSlots {
            geometry: UniformSlot::new(device, &scene_layout, "geometry_uniforms", &blank),
            hull: UniformSlot::new(device, &scene_layout, "hull_uniforms", &blank),
            shaded: UniformSlot::new(device, &scene_layout, "shaded_uniforms", &blank),
            wire: UniformSlot::new(device, &scene_layout, "wire_uniforms", &blank),
            clear: UniformSlot::new(device, &clear_layout, "clear_uniforms", &ClearUniforms::zeroed()),
        };

        log::info!("Pipelines ready ({:?} target)", surface_format);

        Ok(Self {
            geometry,
            hull,
            shaded,
            wire,
            clear,
            ramp_layout,
            uniforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::shading::ShadingMode;
    use glam::Mat4;

    #[test]
    fn scene_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 224);
        assert_eq!(std::mem::size_of::<ClearUniforms>(), 16);
    }

    #[test]
    fn shaded_uniforms_carry_mode_and_hatch() {
        let t = FrameTransforms { model: Mat4::IDENTITY, view_proj: Mat4::IDENTITY };
        let params = ShadingParams { mode: ShadingMode::Hatch, ..ShadingParams::default() };
        let u = SceneUniforms::shaded(&t, &params);
        assert_eq!(u.mode, 3);
        assert_eq!(u.hatch, [12.0, 0.10, 0.75, 0.0]);
        assert_eq!(u.base_color, [0.20, 0.85, 0.55, 1.0]);
        assert_eq!(u.model, Mat4::IDENTITY.to_cols_array_2d());
    }
}
