// Per-frame render plan.
//
// A FramePlan is rebuilt from the viewer state every frame. Each pass carries
// exactly the transforms and parameters it needs, so the GPU renderer only
// executes plans and holds no "current pass" state between frames.

use glam::Mat4;

use super::edges::EdgeKind;
use super::shading::ShadingParams;

/// Pixel rectangle on the surface, origin top-left. Never smaller than 1×1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub model: Mat4,
    pub view_proj: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    GeometryBuffer,
    Clear,
    OutlineHull,
    Shaded,
    EdgeComposite,
}

impl PassKind {
    pub fn label(self) -> &'static str {
        match self {
            PassKind::GeometryBuffer => "geometry-buffer",
            PassKind::Clear => "clear",
            PassKind::OutlineHull => "outline-hull",
            PassKind::Shaded => "shaded",
            PassKind::EdgeComposite => "edge-composite",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    /// Encoded normal + depth into the offscreen buffer.
    GeometryBuffer { transforms: FrameTransforms },
    /// Scissored color clear of the viewport.
    Clear { color: [f32; 3] },
    /// Inflated front-culled shell, `transforms.model` already scaled.
    OutlineHull { transforms: FrameTransforms, color: [f32; 3] },
    /// Main shading; `wireframe` carries the overlay color when enabled.
    Shaded {
        transforms: FrameTransforms,
        shading: ShadingParams,
        wireframe: Option<[f32; 3]>,
    },
    /// Screen-space edges blended over the viewport.
    EdgeComposite {
        kind: EdgeKind,
        thickness: f32,
        threshold: f32,
        color: [f32; 3],
    },
}

impl Pass {
    pub fn kind(&self) -> PassKind {
        match self {
            Pass::GeometryBuffer { .. } => PassKind::GeometryBuffer,
            Pass::Clear { .. } => PassKind::Clear,
            Pass::OutlineHull { .. } => PassKind::OutlineHull,
            Pass::Shaded { .. } => PassKind::Shaded,
            Pass::EdgeComposite { .. } => PassKind::EdgeComposite,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportPlan {
    pub viewport: Viewport,
    pub passes: Vec<Pass>,
}

impl ViewportPlan {
    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(Pass::kind).collect()
    }

    pub fn find(&self, kind: PassKind) -> Option<&Pass> {
        self.passes.iter().find(|p| p.kind() == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    /// Full surface size in pixels.
    pub surface_size: (u32, u32),
    pub viewports: Vec<ViewportPlan>,
}

impl FramePlan {
    /// Pass kinds per viewport, in execution order.
    pub fn kinds(&self) -> Vec<Vec<PassKind>> {
        self.viewports.iter().map(ViewportPlan::kinds).collect()
    }

    pub fn needs_geometry_buffer(&self) -> bool {
        self.viewports
            .iter()
            .any(|v| v.find(PassKind::GeometryBuffer).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_at_least_one_pixel() {
        let v = Viewport::new(5, 0, 0, 0);
        assert_eq!((v.width, v.height), (1, 1));
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn plan_reports_geometry_buffer_use() {
        let transforms = FrameTransforms { model: Mat4::IDENTITY, view_proj: Mat4::IDENTITY };
        let plan = FramePlan {
            surface_size: (4, 4),
            viewports: vec![ViewportPlan {
                viewport: Viewport::new(0, 0, 4, 4),
                passes: vec![Pass::GeometryBuffer { transforms }, Pass::Clear { color: [0.0; 3] }],
            }],
        };
        assert!(plan.needs_geometry_buffer());
        assert_eq!(plan.kinds(), vec![vec![PassKind::GeometryBuffer, PassKind::Clear]]);
    }
}
