// Shading models and their parameters, plus the toon ramp lookup texture.

use std::str::FromStr;

pub const TOON_RAMP_SIZE: usize = 256;
pub const DEFAULT_TOON_STEPS: f32 = 3.0;

/// Stripe width bounds; the shader's smoothstep needs a non-zero width.
pub const HATCH_WIDTH_MIN: f32 = 0.01;
pub const HATCH_WIDTH_MAX: f32 = 0.5;

/// Which lighting model the main pass evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingMode {
    Lambert,
    Gooch,
    Toon,
    Hatch,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 4] = [
        ShadingMode::Lambert,
        ShadingMode::Gooch,
        ShadingMode::Toon,
        ShadingMode::Hatch,
    ];

    /// Value of the `mode` uniform the shader switches on.
    pub fn shader_index(self) -> u32 {
        match self {
            ShadingMode::Lambert => 0,
            ShadingMode::Gooch => 1,
            ShadingMode::Toon => 2,
            ShadingMode::Hatch => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShadingMode::Lambert => "lambert",
            ShadingMode::Gooch => "gooch",
            ShadingMode::Toon => "toon",
            ShadingMode::Hatch => "hatch",
        }
    }
}

impl std::fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShadingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShadingMode::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| format!("unknown shading mode `{s}` (expected lambert, gooch, toon or hatch)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoochParams {
    pub cool: [f32; 3],
    pub warm: [f32; 3],
}

impl Default for GoochParams {
    fn default() -> Self {
        Self {
            cool: [0x33 as f32 / 255.0, 0x66 as f32 / 255.0, 0xcc as f32 / 255.0],
            warm: [0xff as f32 / 255.0, 0xcc as f32 / 255.0, 0x66 as f32 / 255.0],
        }
    }
}

/// Procedural cross-hatching controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HatchParams {
    /// Stripe density (stripes per world unit).
    pub scale: f32,
    /// Stripe half-width in the stripe domain (0..0.5).
    pub width: f32,
    /// Ink opacity, 0..1.
    pub strength: f32,
}

impl Default for HatchParams {
    fn default() -> Self {
        Self {
            scale: 12.0,
            width: 0.10,
            strength: 0.75,
        }
    }
}

/// Everything the main pass needs besides the toon ramp texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    pub mode: ShadingMode,
    pub base_color: [f32; 3],
    pub gooch: GoochParams,
    pub toon_steps: f32,
    pub hatch: HatchParams,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            mode: ShadingMode::Lambert,
            base_color: [0.20, 0.85, 0.55],
            gooch: GoochParams::default(),
            toon_steps: DEFAULT_TOON_STEPS,
            hatch: HatchParams::default(),
        }
    }
}

// ============================================================================
// TOON RAMP
// ============================================================================

/// Effective band count: floored, at least 2.
pub fn effective_steps(steps: f32) -> u32 {
    if steps.is_finite() { steps.floor().max(2.0) as u32 } else { 2 }
}

/// Quantized ramp of `size` texels. Texel i holds
/// `round(clamp(floor(i/(size-1) * steps) / (steps-1), 0, 1) * 255)`.
pub fn toon_ramp(steps: f32, size: usize) -> Vec<u8> {
    let s = effective_steps(steps) as f32;
    let last = (size.max(2) - 1) as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / last;
            let q = ((x * s).floor() / (s - 1.0)).clamp(0.0, 1.0);
            (q * 255.0).round() as u8
        })
        .collect()
}

/// GPU copy of the toon ramp: an N×1 RGBA8 texture sampled with nearest
/// filtering so bands stay crisp.
pub struct ToonRampTexture {
    texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

impl ToonRampTexture {
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("toon_ramp_bgl"),
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
            ],
        })
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        steps: f32,
    ) -> Self {
        let levels = toon_ramp(steps, TOON_RAMP_SIZE);
        let texels: Vec<u8> = levels.iter().flat_map(|&v| [v, v, v, 255]).collect();

        let size = wgpu::Extent3d {
            width: TOON_RAMP_SIZE as u32,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("toon_ramp"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(TOON_RAMP_SIZE as u32 * 4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("toon_ramp_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("toon_ramp_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        log::info!("Toon ramp built with {} bands", effective_steps(steps));
        Self { texture, bind_group }
    }

    /// Replace the ramp with one for `steps` bands, releasing the old texture.
    pub fn regenerate(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        steps: f32,
    ) {
        let next = Self::new(device, queue, layout, steps);
        let old = std::mem::replace(self, next);
        old.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct(levels: &[u8]) -> Vec<u8> {
        let mut d = levels.to_vec();
        d.dedup();
        d
    }

    #[test]
    fn three_steps_give_three_monotonic_levels() {
        let ramp = toon_ramp(3.0, 256);
        assert_eq!(ramp.len(), 256);
        assert!(ramp.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(distinct(&ramp), vec![0, 128, 255]);
    }

    #[test]
    fn steps_are_floored_and_at_least_two() {
        assert_eq!(toon_ramp(3.9, 256), toon_ramp(3.0, 256));
        assert_eq!(toon_ramp(0.5, 256), toon_ramp(2.0, 256));
        assert_eq!(distinct(&toon_ramp(1.0, 256)), vec![0, 255]);
        assert_eq!(effective_steps(f32::NAN), 2);
    }

    #[test]
    fn ramp_spans_full_range() {
        for steps in 2..8 {
            let ramp = toon_ramp(steps as f32, 256);
            assert_eq!(ramp[0], 0);
            assert_eq!(ramp[255], 255);
            assert_eq!(distinct(&ramp).len(), steps as usize);
        }
    }

    #[test]
    fn shading_mode_round_trips_through_labels() {
        for mode in ShadingMode::ALL {
            assert_eq!(mode.to_string().parse::<ShadingMode>(), Ok(mode));
        }
        assert!("phong".parse::<ShadingMode>().is_err());
        assert_eq!(ShadingMode::Hatch.shader_index(), 3);
    }
}
