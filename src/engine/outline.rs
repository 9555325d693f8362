// Outline / edge overlay configuration.

use std::str::FromStr;

use super::edges::EdgeKind;

pub const DEFAULT_THICKNESS: f32 = 2.0;
pub const THICKNESS_MIN: f32 = 1.0;
pub const THICKNESS_MAX: f32 = 5.0;

pub const DEFAULT_THRESHOLD: f32 = 0.18;
pub const THRESHOLD_MIN: f32 = 0.02;
pub const THRESHOLD_MAX: f32 = 0.6;

/// Hull inflation per unit of thickness.
pub const HULL_SCALE_PER_THICKNESS: f32 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineMode {
    Off,
    /// Inflated, front-culled shell drawn before the main pass.
    ObjectHull,
    /// Screen-space gradient of the geometry buffer's depth channel.
    ScreenDepth,
    /// Screen-space gradient of the geometry buffer's encoded normals.
    ScreenNormal,
}

impl OutlineMode {
    pub const ALL: [OutlineMode; 4] = [
        OutlineMode::Off,
        OutlineMode::ObjectHull,
        OutlineMode::ScreenDepth,
        OutlineMode::ScreenNormal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutlineMode::Off => "off",
            OutlineMode::ObjectHull => "object-hull",
            OutlineMode::ScreenDepth => "screen-depth",
            OutlineMode::ScreenNormal => "screen-normal",
        }
    }

    /// Screen-space modes need the geometry buffer pass and the composite.
    pub fn uses_geometry_buffer(self) -> bool {
        self.edge_kind().is_some()
    }

    pub fn edge_kind(self) -> Option<EdgeKind> {
        match self {
            OutlineMode::ScreenDepth => Some(EdgeKind::Depth),
            OutlineMode::ScreenNormal => Some(EdgeKind::Normal),
            OutlineMode::Off | OutlineMode::ObjectHull => None,
        }
    }
}

impl std::fmt::Display for OutlineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutlineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutlineMode::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| {
                format!("unknown outline mode `{s}` (expected off, object-hull, screen-depth or screen-normal)")
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineSettings {
    pub mode: OutlineMode,
    /// Hull inflation factor, or neighbor tap distance in texels for the
    /// screen-space modes.
    pub thickness: f32,
    /// Edge strength at which the composite starts to show.
    pub threshold: f32,
    pub color: [f32; 3],
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            mode: OutlineMode::Off,
            thickness: DEFAULT_THICKNESS,
            threshold: DEFAULT_THRESHOLD,
            color: [0.0, 0.0, 0.0],
        }
    }
}

impl OutlineSettings {
    /// Uniform scale applied to the model for the hull pass.
    pub fn hull_scale(&self) -> f32 {
        1.0 + self.thickness * HULL_SCALE_PER_THICKNESS
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        if thickness.is_finite() {
            self.thickness = thickness.clamp(THICKNESS_MIN, THICKNESS_MAX);
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        if threshold.is_finite() {
            self.threshold = threshold.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_screen_modes_need_geometry_buffer() {
        assert!(!OutlineMode::Off.uses_geometry_buffer());
        assert!(!OutlineMode::ObjectHull.uses_geometry_buffer());
        assert_eq!(OutlineMode::ScreenDepth.edge_kind(), Some(EdgeKind::Depth));
        assert_eq!(OutlineMode::ScreenNormal.edge_kind(), Some(EdgeKind::Normal));
    }

    #[test]
    fn labels_parse() {
        for mode in OutlineMode::ALL {
            assert_eq!(mode.label().parse::<OutlineMode>(), Ok(mode));
        }
        assert!("sobel".parse::<OutlineMode>().is_err());
    }

    #[test]
    fn thickness_and_threshold_are_clamped() {
        let mut s = OutlineSettings::default();
        s.set_thickness(40.0);
        assert_eq!(s.thickness, THICKNESS_MAX);
        s.set_thickness(f32::NAN);
        assert_eq!(s.thickness, THICKNESS_MAX);
        s.set_threshold(0.0);
        assert_eq!(s.threshold, THRESHOLD_MIN);
    }

    #[test]
    fn hull_scale_grows_with_thickness() {
        let mut s = OutlineSettings::default();
        s.set_thickness(2.0);
        assert!((s.hull_scale() - 1.06).abs() < 1e-6);
    }
}
