// Offscreen render targets: the normal/depth geometry buffer read by the
// edge detector, and the depth attachment of the surface passes.
//
// Both are reallocated only from `ensure_size`, which is called at the top
// of a frame, never mid-pass. Color and depth of the geometry buffer are
// always torn down and rebuilt together.

pub const GBUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Cleared value: encoded normal (0, 0, 0) with far depth.
pub const GBUFFER_CLEAR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    (width, height): (u32, u32),
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn clamp_size(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

/// Encoded world normal in rgb, non-linear depth in a, plus its own depth
/// attachment. Sized to the whole surface; each viewport renders into its
/// own sub-rectangle.
pub struct GeometryBuffer {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    size: (u32, u32),
    generation: u64,
}

impl GeometryBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = clamp_size(width, height);
        let (color, color_view) = create_target(
            device,
            "gbuffer_color",
            GBUFFER_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            size,
        );
        let (depth, depth_view) = create_target(
            device,
            "gbuffer_depth",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            size,
        );
        Self {
            color,
            color_view,
            depth,
            depth_view,
            size,
            generation: 1,
        }
    }

    /// Reallocate if the requested size differs. Returns true when the
    /// textures were replaced (views held elsewhere are then stale).
    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if clamp_size(width, height) == self.size {
            return false;
        }
        let generation = self.generation + 1;
        let next = Self::new(device, width, height);
        let old = std::mem::replace(self, next);
        old.color.destroy();
        old.depth.destroy();
        self.generation = generation;
        log::debug!(
            "Geometry buffer reallocated to {}x{} (generation {})",
            self.size.0,
            self.size.1,
            self.generation
        );
        true
    }

    pub fn generation(&self) -> u64 { self.generation }
    pub fn color_view(&self) -> &wgpu::TextureView { &self.color_view }
    pub fn depth_view(&self) -> &wgpu::TextureView { &self.depth_view }
}

/// Depth attachment shared by the surface passes.
pub struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = clamp_size(width, height);
        let (texture, view) = create_target(
            device,
            "surface_depth",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            size,
        );
        Self { texture, view, size }
    }

    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if clamp_size(width, height) == self.size {
            return;
        }
        let old = std::mem::replace(self, Self::new(device, width, height));
        old.texture.destroy();
        log::debug!("Depth target reallocated to {}x{}", self.size.0, self.size.1);
    }

    pub fn view(&self) -> &wgpu::TextureView { &self.view }
}
