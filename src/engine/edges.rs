// Screen-space edge detector.
//
// Composites outline ink over an already shaded viewport by comparing each
// geometry-buffer texel with its four axis neighbors:
//   - Depth:  sum of absolute depth differences
//   - Normal: sum of Euclidean distances between decoded unit normals
// Strength is mapped to alpha by smoothstep(threshold, 2.5 * threshold).
//
// The CPU functions below mirror shaders/edges.wgsl.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::error::GraphicsSetupError;
use super::frame::Viewport;
use super::gbuffer::{GeometryBuffer, DEPTH_FORMAT};
use super::gpu;

const EDGES_WGSL: &str = include_str!("shaders/edges.wgsl");

/// Fragments with less alpha than this are discarded.
pub const ALPHA_CUTOFF: f32 = 0.001;
/// Strength at which alpha saturates, relative to the threshold.
pub const SATURATION_RATIO: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Depth,
    Normal,
}

impl EdgeKind {
    pub fn shader_index(self) -> u32 {
        match self {
            EdgeKind::Depth => 0,
            EdgeKind::Normal => 1,
        }
    }
}

// ============================================================================
// CPU REFERENCE
// ============================================================================

/// Map an encoded normal from [0, 1] back to a unit vector in [-1, 1].
pub fn decode_normal(encoded: [f32; 3]) -> Vec3 {
    (Vec3::from_array(encoded) * 2.0 - Vec3::ONE).normalize_or_zero()
}

/// Encode a unit normal into [0, 1] per channel.
pub fn encode_normal(normal: Vec3) -> [f32; 3] {
    (normal * 0.5 + Vec3::splat(0.5)).to_array()
}

/// Edge strength at a texel. Texels are geometry-buffer samples:
/// encoded normal in rgb, depth in a. Neighbors are +x, -x, +y, -y.
pub fn edge_strength(kind: EdgeKind, center: [f32; 4], neighbors: &[[f32; 4]; 4]) -> f32 {
    match kind {
        EdgeKind::Depth => neighbors.iter().map(|n| (n[3] - center[3]).abs()).sum(),
        EdgeKind::Normal => {
            let c = decode_normal([center[0], center[1], center[2]]);
            neighbors
                .iter()
                .map(|n| (decode_normal([n[0], n[1], n[2]]) - c).length())
                .sum()
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Ink alpha for a given strength, or `None` where the fragment is discarded.
pub fn edge_alpha(strength: f32, threshold: f32) -> Option<f32> {
    let a = smoothstep(threshold, threshold * SATURATION_RATIO, strength).clamp(0.0, 1.0);
    (a > ALPHA_CUTOFF).then_some(a)
}

// ============================================================================
// GPU COMPOSITE
// ============================================================================

/// Uniform block for shaders/edges.wgsl (64 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct EdgeUniforms {
    /// Viewport rectangle in pixels: x, y, width, height.
    pub rect: [f32; 4],
    /// 1 / geometry buffer size.
    pub texel: [f32; 2],
    pub threshold: f32,
    /// Neighbor tap distance in pixels.
    pub thickness: f32,
    pub color: [f32; 4],
    pub mode: u32,
    pub _pad: [u32; 3],
}

impl EdgeUniforms {
    pub fn new(
        kind: EdgeKind,
        viewport: Viewport,
        target_size: (u32, u32),
        thickness: f32,
        threshold: f32,
        color: [f32; 3],
    ) -> Self {
        Self {
            rect: [
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
            ],
            texel: [1.0 / target_size.0.max(1) as f32, 1.0 / target_size.1.max(1) as f32],
            threshold,
            thickness,
            color: [color[0], color[1], color[2], 1.0],
            mode: kind.shader_index(),
            _pad: [0; 3],
        }
    }
}

pub struct EdgeDetector {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    bind_group: Option<wgpu::BindGroup>,
    /// Geometry buffer generation the bind group was built against.
    bound_generation: u64,
}

impl EdgeDetector {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, GraphicsSetupError> {
        let shader = gpu::compile_shader(device, "edges", EDGES_WGSL)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edges_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("edges_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = gpu::create_pipeline(
            device,
            &wgpu::RenderPipelineDescriptor {
                label: Some("edges"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                // Shares the viewport's render pass, so the depth attachment
                // must be declared even though it is neither tested nor written.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("edges_uniforms"),
            size: std::mem::size_of::<EdgeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("edges_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            bind_group: None,
            bound_generation: 0,
        })
    }

    /// Rebuild the bind group if the geometry buffer was reallocated.
    pub fn bind(&mut self, device: &wgpu::Device, gbuffer: &GeometryBuffer) {
        if self.bind_group.is_some() && self.bound_generation == gbuffer.generation() {
            return;
        }
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("edges_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(gbuffer.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        }));
        self.bound_generation = gbuffer.generation();
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &EdgeUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Draw the full-screen composite. The caller sets viewport and scissor.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(bind_group) = &self.bind_group else {
            log::warn!("Edge composite skipped: geometry buffer not bound");
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(normal: Vec3, depth: f32) -> [f32; 4] {
        let [x, y, z] = encode_normal(normal);
        [x, y, z, depth]
    }

    #[test]
    fn shader_uses_the_same_band_and_cutoff() {
        assert!(EDGES_WGSL.contains(&format!("const ALPHA_CUTOFF: f32 = {ALPHA_CUTOFF};")));
        assert!(EDGES_WGSL.contains(&format!("const SATURATION_RATIO: f32 = {SATURATION_RATIO};")));
        assert!(EDGES_WGSL.contains("smoothstep(edges.threshold, edges.threshold * SATURATION_RATIO, strength)"));
        assert!(EDGES_WGSL.contains("if a <= ALPHA_CUTOFF {"));
    }

    #[test]
    fn flat_region_has_no_edge() {
        let t = texel(Vec3::Z, 0.5);
        for kind in [EdgeKind::Depth, EdgeKind::Normal] {
            let s = edge_strength(kind, t, &[t; 4]);
            assert!(s.abs() < 1e-6);
            assert_eq!(edge_alpha(s, 0.18), None);
        }
    }

    #[test]
    fn depth_strength_sums_absolute_differences() {
        let c = texel(Vec3::Z, 0.5);
        let n = [
            texel(Vec3::Z, 0.6),
            texel(Vec3::Z, 0.4),
            texel(Vec3::Z, 0.5),
            texel(Vec3::Z, 1.0),
        ];
        assert!((edge_strength(EdgeKind::Depth, c, &n) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn normal_strength_at_right_angle_crease() {
        let c = texel(Vec3::Z, 0.5);
        let n = [texel(Vec3::X, 0.5), texel(Vec3::Z, 0.5), texel(Vec3::Z, 0.5), texel(Vec3::Z, 0.5)];
        let s = edge_strength(EdgeKind::Normal, c, &n);
        assert!((s - std::f32::consts::SQRT_2).abs() < 1e-5);
        assert_eq!(edge_alpha(s, 0.18), Some(1.0));
    }

    #[test]
    fn alpha_ramps_between_threshold_and_saturation() {
        let t = 0.2;
        assert_eq!(edge_alpha(t, t), None);
        let mid = edge_alpha(t * 1.75, t).unwrap();
        assert!((mid - 0.5).abs() < 1e-5);
        assert_eq!(edge_alpha(t * SATURATION_RATIO, t), Some(1.0));
    }

    #[test]
    fn uniforms_are_64_bytes() {
        assert_eq!(std::mem::size_of::<EdgeUniforms>(), 64);
        let u = EdgeUniforms::new(
            EdgeKind::Normal,
            Viewport::new(10, 0, 100, 50),
            (200, 50),
            2.0,
            0.18,
            [0.0; 3],
        );
        assert_eq!(u.rect, [10.0, 0.0, 100.0, 50.0]);
        assert_eq!(u.texel, [1.0 / 200.0, 1.0 / 50.0]);
        assert_eq!(u.mode, 1);
    }
}
