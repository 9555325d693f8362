// Frame executor: turns a FramePlan into wgpu render passes.
//
// Per viewport, in one submission:
//   1. geometry buffer pass     (own render pass, offscreen)
//   2. clear / hull / shaded / edge composite
//                               (one render pass on the surface, scissored)
// Uniforms for a viewport are written just before its submission, so two
// viewports in a frame never overwrite each other's values.

use std::path::Path;
use std::sync::Arc;

use winit::event::WindowEvent;
use winit::window::Window;

use super::edges::{EdgeDetector, EdgeUniforms};
use super::error::{GraphicsSetupError, ImportError};
use super::frame::{FramePlan, Pass, PassKind, ViewportPlan};
use super::gbuffer::{DepthTarget, GeometryBuffer, GBUFFER_CLEAR};
use super::gpu::{GpuContext, MeshBuffers};
use super::input::PointerTracker;
use super::mesh::Mesh;
use super::obj::{self, ImportOptions};
use super::overlay::{ControlPanel, FrameStats, PanelCommand};
use super::pipelines::{ClearUniforms, MeshPipelines, SceneUniforms};
use super::primitives::Primitive;
use super::scene::{ViewerState, BACKGROUND_COLOR};
use super::shading::ToonRampTexture;

pub struct Renderer {
    window: Arc<Window>,
    gpu: GpuContext,
    pipelines: MeshPipelines,
    ramp: ToonRampTexture,
    depth: DepthTarget,
    gbuffer: GeometryBuffer,
    edges: EdgeDetector,
    mesh_buffers: Option<MeshBuffers>,
    pointer: PointerTracker,
    panel: ControlPanel,
    import_options: ImportOptions,
    state: ViewerState,
    stats: FrameStats,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        state: ViewerState,
        import_options: ImportOptions,
    ) -> Result<Self, GraphicsSetupError> {
        let gpu = GpuContext::new(window.clone()).await?;
        let format = gpu.config.format;
        let (width, height) = gpu.size();

        let pipelines = MeshPipelines::new(&gpu.device, format)?;
        let edges = EdgeDetector::new(&gpu.device, format)?;
        let ramp = ToonRampTexture::new(
            &gpu.device,
            &gpu.queue,
            &pipelines.ramp_layout,
            state.shading().toon_steps,
        );
        let depth = DepthTarget::new(&gpu.device, width, height);
        let gbuffer = GeometryBuffer::new(&gpu.device, width, height);
        let panel = ControlPanel::new(&window, &gpu.device, format);

        let mut renderer = Self {
            window,
            gpu,
            pipelines,
            ramp,
            depth,
            gbuffer,
            edges,
            mesh_buffers: None,
            pointer: PointerTracker::new(),
            panel,
            import_options,
            state,
            stats: FrameStats::default(),
        };
        // A mesh handed in with the initial state still needs its GPU copy.
        if let Some(mesh) = renderer.state.mesh().cloned() {
            renderer.set_mesh(mesh);
        }
        Ok(renderer)
    }

    /// Read-only view of the settings. Mutations go through the methods
    /// below so GPU resources follow them.
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn reset_view(&mut self) {
        self.state.reset_view();
    }

    pub fn toggle_panel(&mut self) {
        self.panel.toggle();
    }

    /// Replace the current mesh, releasing the previous GPU buffers.
    pub fn set_mesh(&mut self, mesh: Mesh) {
        let buffers = MeshBuffers::upload(&self.gpu.device, &mesh);
        if let Some(old) = self.mesh_buffers.replace(buffers) {
            old.destroy();
        }
        log::info!(
            "Mesh loaded: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.state.set_mesh(mesh);
    }

    /// Import an OBJ file. On failure the current mesh stays in place.
    pub fn load_obj(&mut self, path: &Path) -> Result<(), ImportError> {
        let mesh = obj::load_obj_file(path, &self.import_options)?;
        self.set_mesh(mesh);
        Ok(())
    }

    pub fn load_primitive(&mut self, primitive: Primitive) {
        self.set_mesh(primitive.build(self.import_options.target_size));
    }

    pub fn set_toon_steps(&mut self, steps: f32) {
        if self.state.set_toon_steps(steps) {
            self.ramp.regenerate(
                &self.gpu.device,
                &self.gpu.queue,
                &self.pipelines.ramp_layout,
                self.state.shading().toon_steps,
            );
        }
    }

    pub fn set_frame_timing(&mut self, fps: u32, frame_time_ms: f32) {
        self.stats.fps = fps;
        self.stats.frame_time_ms = frame_time_ms;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn reconfigure(&mut self) {
        self.gpu.reconfigure();
    }

    /// Feed a window event to the panel first, then to the camera.
    /// Returns true when the panel consumed it.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.panel.handle_window_event(&self.window, event);
        if let WindowEvent::Resized(size) = event {
            self.resize(size.width, size.height);
        }
        if let Some(pointer) = self.pointer.translate(event) {
            if pointer.reaches_camera(response.consumed, self.state.is_dragging()) {
                self.state.handle_pointer(pointer);
            }
        }
        response.consumed
    }

    pub fn apply(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::SetShadingMode(mode) => self.state.set_shading_mode(mode),
            PanelCommand::SetBaseColor(rgb) => self.state.set_base_color(rgb),
            PanelCommand::SetGoochCool(rgb) => self.state.set_gooch_cool(rgb),
            PanelCommand::SetGoochWarm(rgb) => self.state.set_gooch_warm(rgb),
            PanelCommand::SetToonSteps(steps) => self.set_toon_steps(steps),
            PanelCommand::SetHatchScale(v) => self.state.set_hatch_scale(v),
            PanelCommand::SetHatchWidth(v) => self.state.set_hatch_width(v),
            PanelCommand::SetHatchStrength(v) => self.state.set_hatch_strength(v),
            PanelCommand::SetOutlineMode(mode) => self.state.set_outline_mode(mode),
            PanelCommand::SetOutlineThickness(v) => self.state.set_outline_thickness(v),
            PanelCommand::SetEdgeThreshold(v) => self.state.set_edge_threshold(v),
            PanelCommand::SetWireframe(on) => self.state.set_wireframe(on),
            PanelCommand::SetAutoRotate(on) => self.state.set_auto_rotate(on),
            PanelCommand::SetCompare(on) => self.state.set_compare(on),
            PanelCommand::ResetView => self.reset_view(),
            PanelCommand::LoadPrimitive(primitive) => {
                self.load_primitive(primitive);
                self.panel.set_import_status(Ok(format!("Loaded {primitive}")));
            }
            PanelCommand::LoadObj(path) => match self.load_obj(&path) {
                Ok(()) => {
                    self.panel.set_import_status(Ok(format!("Loaded {}", path.display())));
                }
                Err(e) => {
                    log::warn!("Import of {} failed: {e}", path.display());
                    self.panel.set_import_status(Err(e.to_string()));
                }
            },
        }
    }

    /// Draw one frame at `time_ms` (milliseconds since start).
    pub fn render(&mut self, time_ms: f64) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (width, height) = self.gpu.size();

        // Resources are resized here, never mid-pass.
        self.depth.ensure_size(&self.gpu.device, width, height);
        let plan = self.state.plan_frame(time_ms, width, height);

        match (&plan, &self.mesh_buffers) {
            (Some(plan), Some(mesh)) => {
                if plan.needs_geometry_buffer() {
                    self.gbuffer.ensure_size(&self.gpu.device, width, height);
                    self.edges.bind(&self.gpu.device, &self.gbuffer);
                }
                for viewport in &plan.viewports {
                    self.draw_viewport(&view, plan, viewport, mesh);
                }
            }
            _ => self.clear_surface(&view),
        }

        self.stats.resolution = (width, height);
        self.stats.passes = plan.as_ref().map(FramePlan::kinds).unwrap_or_default();
        if let Some(mesh) = self.state.mesh() {
            self.stats.vertices = mesh.vertex_count();
            self.stats.triangles = mesh.triangle_count();
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Overlay Encoder"),
            });
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let commands = self.panel.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            &self.state,
            &self.stats,
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for command in commands {
            self.apply(command);
        }
        Ok(())
    }

    fn clear_surface(&self, view: &wgpu::TextureView) {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let [r, g, b] = BACKGROUND_COLOR.map(f64::from);
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn write_uniforms(&self, plan: &FramePlan, viewport: &ViewportPlan) {
        let queue = &self.gpu.queue;
        let slots = &self.pipelines.uniforms;
        for pass in &viewport.passes {
            match pass {
                Pass::GeometryBuffer { transforms } => {
                    slots.geometry.write(queue, &SceneUniforms::transforms(transforms));
                }
                Pass::Clear { color } => {
                    slots.clear.write(queue, &ClearUniforms { color: [color[0], color[1], color[2], 1.0] });
                }
                Pass::OutlineHull { transforms, color } => {
                    slots.hull.write(queue, &SceneUniforms::flat(transforms, *color));
                }
                Pass::Shaded { transforms, shading, wireframe } => {
                    slots.shaded.write(queue, &SceneUniforms::shaded(transforms, shading));
                    if let Some(color) = wireframe {
                        slots.wire.write(queue, &SceneUniforms::flat(transforms, *color));
                    }
                }
                Pass::EdgeComposite { kind, thickness, threshold, color } => {
                    self.edges.write_uniforms(
                        queue,
                        &EdgeUniforms::new(
                            *kind,
                            viewport.viewport,
                            plan.surface_size,
                            *thickness,
                            *threshold,
                            *color,
                        ),
                    );
                }
            }
        }
    }

    fn draw_viewport(
        &self,
        view: &wgpu::TextureView,
        plan: &FramePlan,
        viewport: &ViewportPlan,
        mesh: &MeshBuffers,
    ) {
        self.write_uniforms(plan, viewport);

        let vp = viewport.viewport;
        let (x, y, w, h) = (vp.x as f32, vp.y as f32, vp.width as f32, vp.height as f32);
        let slots = &self.pipelines.uniforms;

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewport Encoder"),
            });

        if viewport.find(PassKind::GeometryBuffer).is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Geometry Buffer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.gbuffer.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(GBUFFER_CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gbuffer.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_viewport(x, y, w, h, 0.0, 1.0);
            pass.set_pipeline(&self.pipelines.geometry);
            pass.set_bind_group(0, &slots.geometry.bind_group, &[]);
            mesh.draw_triangles(&mut pass);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_viewport(x, y, w, h, 0.0, 1.0);
            pass.set_scissor_rect(vp.x, vp.y, vp.width, vp.height);

            for step in &viewport.passes {
                match step {
                    Pass::GeometryBuffer { .. } => {}
                    Pass::Clear { .. } => {
                        pass.set_pipeline(&self.pipelines.clear);
                        pass.set_bind_group(0, &slots.clear.bind_group, &[]);
                        pass.draw(0..3, 0..1);
                    }
                    Pass::OutlineHull { .. } => {
                        pass.set_pipeline(&self.pipelines.hull);
                        pass.set_bind_group(0, &slots.hull.bind_group, &[]);
                        mesh.draw_triangles(&mut pass);
                    }
                    Pass::Shaded { wireframe, .. } => {
                        pass.set_pipeline(&self.pipelines.shaded);
                        pass.set_bind_group(0, &slots.shaded.bind_group, &[]);
                        pass.set_bind_group(1, &self.ramp.bind_group, &[]);
                        mesh.draw_triangles(&mut pass);
                        if wireframe.is_some() {
                            pass.set_pipeline(&self.pipelines.wire);
                            pass.set_bind_group(0, &slots.wire.bind_group, &[]);
                            mesh.draw_wires(&mut pass);
                        }
                    }
                    Pass::EdgeComposite { .. } => self.edges.draw(&mut pass),
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
