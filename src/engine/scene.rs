// Viewer state: camera, shading, outline and overlay settings plus the
// current mesh. Everything here is GPU-free; `plan_frame` turns it into the
// ordered pass list the renderer executes.

use glam::{Mat4, Vec3};

use super::camera::{DragState, OrbitCamera};
use super::frame::{FramePlan, FrameTransforms, Pass, Viewport, ViewportPlan};
use super::input::PointerEvent;
use super::mesh::Mesh;
use super::outline::{OutlineMode, OutlineSettings};
use super::shading::{ShadingMode, ShadingParams, HATCH_WIDTH_MAX, HATCH_WIDTH_MIN};

pub const BACKGROUND_COLOR: [f32; 3] = [0.7, 0.5, 0.5];
pub const WIRE_COLOR: [f32; 3] = [0.2, 0.9, 1.0];
/// Left half of compare mode always uses this model.
pub const COMPARE_BASELINE: ShadingMode = ShadingMode::Lambert;

fn clamp_color(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 })
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    pub camera: OrbitCamera,
    shading: ShadingParams,
    outline: OutlineSettings,
    wireframe: bool,
    compare: bool,
    mesh: Option<Mesh>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            camera: OrbitCamera::new(),
            shading: ShadingParams::default(),
            outline: OutlineSettings::default(),
            wireframe: false,
            compare: false,
            mesh: None,
        }
    }

    pub fn shading(&self) -> &ShadingParams { &self.shading }
    pub fn outline(&self) -> &OutlineSettings { &self.outline }
    pub fn wireframe(&self) -> bool { self.wireframe }
    pub fn compare(&self) -> bool { self.compare }
    pub fn auto_rotate(&self) -> bool { self.camera.auto_rotate }
    pub fn mesh(&self) -> Option<&Mesh> { self.mesh.as_ref() }

    /// Replace the current mesh wholesale.
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.shading.mode = mode;
    }

    pub fn set_base_color(&mut self, rgb: [f32; 3]) {
        self.shading.base_color = clamp_color(rgb);
    }

    pub fn set_gooch_cool(&mut self, rgb: [f32; 3]) {
        self.shading.gooch.cool = clamp_color(rgb);
    }

    pub fn set_gooch_warm(&mut self, rgb: [f32; 3]) {
        self.shading.gooch.warm = clamp_color(rgb);
    }

    /// Returns true when the value changed and the toon ramp must be rebuilt.
    pub fn set_toon_steps(&mut self, steps: f32) -> bool {
        if !steps.is_finite() || steps == self.shading.toon_steps {
            return false;
        }
        self.shading.toon_steps = steps;
        true
    }

    pub fn set_hatch_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.shading.hatch.scale = scale.max(0.0);
        }
    }

    pub fn set_hatch_width(&mut self, width: f32) {
        if width.is_finite() {
            self.shading.hatch.width = width.clamp(HATCH_WIDTH_MIN, HATCH_WIDTH_MAX);
        }
    }

    pub fn set_hatch_strength(&mut self, strength: f32) {
        if strength.is_finite() {
            self.shading.hatch.strength = strength.clamp(0.0, 1.0);
        }
    }

    pub fn set_outline_mode(&mut self, mode: OutlineMode) {
        self.outline.mode = mode;
    }

    pub fn set_outline_thickness(&mut self, thickness: f32) {
        self.outline.set_thickness(thickness);
    }

    pub fn set_edge_threshold(&mut self, threshold: f32) {
        self.outline.set_threshold(threshold);
    }

    pub fn set_wireframe(&mut self, on: bool) {
        self.wireframe = on;
    }

    pub fn set_auto_rotate(&mut self, on: bool) {
        self.camera.auto_rotate = on;
    }

    pub fn set_compare(&mut self, on: bool) {
        self.compare = on;
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.camera.drag_state(), DragState::Dragging { .. })
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.camera.handle(event);
    }

    /// Build the pass list for one frame on a `width`×`height` surface.
    /// `None` when no mesh is loaded.
    pub fn plan_frame(&self, time_ms: f64, width: u32, height: u32) -> Option<FramePlan> {
        self.mesh.as_ref()?;

        let width = width.max(1);
        let height = height.max(1);
        let model = self.camera.model_matrix(time_ms);

        let halves = if self.compare {
            let half = width / 2;
            vec![
                (Viewport::new(0, 0, half, height), COMPARE_BASELINE),
                (Viewport::new(half, 0, width - half, height), self.shading.mode),
            ]
        } else {
            vec![(Viewport::new(0, 0, width, height), self.shading.mode)]
        };

        let viewports = halves
            .into_iter()
            .map(|(viewport, mode)| self.plan_viewport(viewport, mode, model))
            .collect();

        Some(FramePlan {
            surface_size: (width, height),
            viewports,
        })
    }

    fn plan_viewport(&self, viewport: Viewport, mode: ShadingMode, model: Mat4) -> ViewportPlan {
        let transforms = FrameTransforms {
            model,
            view_proj: self.camera.view_projection(viewport.aspect()),
        };
        let edge_kind = self.outline.mode.edge_kind();
        let mut passes = Vec::with_capacity(5);

        if edge_kind.is_some() {
            passes.push(Pass::GeometryBuffer { transforms });
        }

        passes.push(Pass::Clear { color: BACKGROUND_COLOR });

        if self.outline.mode == OutlineMode::ObjectHull {
            let scale = Mat4::from_scale(Vec3::splat(self.outline.hull_scale()));
            passes.push(Pass::OutlineHull {
                transforms: FrameTransforms {
                    model: model * scale,
                    view_proj: transforms.view_proj,
                },
                color: self.outline.color,
            });
        }

        passes.push(Pass::Shaded {
            transforms,
            shading: ShadingParams { mode, ..self.shading },
            wireframe: self.wireframe.then_some(WIRE_COLOR),
        });

        if let Some(kind) = edge_kind {
            passes.push(Pass::EdgeComposite {
                kind,
                thickness: self.outline.thickness,
                threshold: self.outline.threshold,
                color: self.outline.color,
            });
        }

        ViewportPlan { viewport, passes }
    }
}
