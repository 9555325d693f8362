// egui control panel: every viewer setting as a widget, plus frame stats.
//
// Widgets never mutate the viewer directly. Each change becomes a
// PanelCommand the renderer applies after the frame is presented.

use std::path::PathBuf;

use egui::epaint::Shadow;

use super::frame::PassKind;
use super::outline::{OutlineMode, THICKNESS_MAX, THICKNESS_MIN, THRESHOLD_MAX, THRESHOLD_MIN};
use super::primitives::Primitive;
use super::scene::ViewerState;
use super::shading::{ShadingMode, HATCH_WIDTH_MAX, HATCH_WIDTH_MIN};

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    SetShadingMode(ShadingMode),
    SetBaseColor([f32; 3]),
    SetGoochCool([f32; 3]),
    SetGoochWarm([f32; 3]),
    SetToonSteps(f32),
    SetHatchScale(f32),
    SetHatchWidth(f32),
    SetHatchStrength(f32),
    SetOutlineMode(OutlineMode),
    SetOutlineThickness(f32),
    SetEdgeThreshold(f32),
    SetWireframe(bool),
    SetAutoRotate(bool),
    SetCompare(bool),
    ResetView,
    LoadPrimitive(Primitive),
    LoadObj(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub fps: u32,
    pub frame_time_ms: f32,
    pub resolution: (u32, u32),
    pub vertices: usize,
    pub triangles: usize,
    /// Pass kinds per viewport of the last frame.
    pub passes: Vec<Vec<PassKind>>,
}

pub struct ControlPanel {
    pub visible: bool,
    obj_path: String,
    import_status: Option<Result<String, String>>,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl ControlPanel {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 200);
        visuals.window_shadow = Shadow::NONE;
        egui_ctx.set_visuals(visuals);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: true,
            obj_path: String::new(),
            import_status: None,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Result of the last mesh load, shown under the path field.
    pub fn set_import_status(&mut self, status: Result<String, String>) {
        self.import_status = Some(status);
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Run one egui frame and paint it over `view`. Returns the commands the
    /// user issued this frame.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        state: &ViewerState,
        stats: &FrameStats,
    ) -> Vec<PanelCommand> {
        let raw_input = self.egui_state.take_egui_input(window);
        let mut commands = Vec::new();
        let visible = self.visible;
        let obj_path = &mut self.obj_path;
        let import_status = &self.import_status;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !visible {
                return;
            }
            egui::Window::new("NPR Viewer")
                .default_pos(egui::pos2(10.0, 10.0))
                .resizable(false)
                .show(ctx, |ui| {
                    shading_section(ui, state, &mut commands);
                    ui.separator();
                    outline_section(ui, state, &mut commands);
                    ui.separator();
                    view_section(ui, state, &mut commands);
                    ui.separator();
                    mesh_section(ui, obj_path, import_status, &mut commands);
                    ui.separator();
                    stats_section(ui, stats);
                });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        commands
    }
}

// ── sections ─────────────────────────────────────────────────────────────────

fn shading_section(ui: &mut egui::Ui, state: &ViewerState, commands: &mut Vec<PanelCommand>) {
    let params = state.shading();

    let mut mode = params.mode;
    egui::ComboBox::from_label("Shading")
        .selected_text(mode.label())
        .show_ui(ui, |ui| {
            for m in ShadingMode::ALL {
                ui.selectable_value(&mut mode, m, m.label());
            }
        });
    if mode != params.mode {
        commands.push(PanelCommand::SetShadingMode(mode));
    }

    let mut base = params.base_color;
    ui.horizontal(|ui| {
        if ui.color_edit_button_rgb(&mut base).changed() {
            commands.push(PanelCommand::SetBaseColor(base));
        }
        ui.label("Base color");
    });

    match params.mode {
        ShadingMode::Gooch => {
            let (mut cool, mut warm) = (params.gooch.cool, params.gooch.warm);
            ui.horizontal(|ui| {
                if ui.color_edit_button_rgb(&mut cool).changed() {
                    commands.push(PanelCommand::SetGoochCool(cool));
                }
                ui.label("Cool");
                if ui.color_edit_button_rgb(&mut warm).changed() {
                    commands.push(PanelCommand::SetGoochWarm(warm));
                }
                ui.label("Warm");
            });
        }
        ShadingMode::Toon => {
            let mut steps = params.toon_steps;
            if ui
                .add(egui::Slider::new(&mut steps, 2.0..=8.0).step_by(1.0).text("Steps"))
                .changed()
            {
                commands.push(PanelCommand::SetToonSteps(steps));
            }
        }
        ShadingMode::Hatch => {
            let mut hatch = params.hatch;
            if ui.add(egui::Slider::new(&mut hatch.scale, 2.0..=40.0).text("Density")).changed() {
                commands.push(PanelCommand::SetHatchScale(hatch.scale));
            }
            if ui
                .add(egui::Slider::new(&mut hatch.width, HATCH_WIDTH_MIN..=HATCH_WIDTH_MAX).text("Line width"))
                .changed()
            {
                commands.push(PanelCommand::SetHatchWidth(hatch.width));
            }
            if ui.add(egui::Slider::new(&mut hatch.strength, 0.0..=1.0).text("Strength")).changed() {
                commands.push(PanelCommand::SetHatchStrength(hatch.strength));
            }
        }
        ShadingMode::Lambert => {}
    }
}

fn outline_section(ui: &mut egui::Ui, state: &ViewerState, commands: &mut Vec<PanelCommand>) {
    let outline = state.outline();

    let mut mode = outline.mode;
    egui::ComboBox::from_label("Outline")
        .selected_text(mode.label())
        .show_ui(ui, |ui| {
            for m in OutlineMode::ALL {
                ui.selectable_value(&mut mode, m, m.label());
            }
        });
    if mode != outline.mode {
        commands.push(PanelCommand::SetOutlineMode(mode));
    }

    if outline.mode != OutlineMode::Off {
        let mut thickness = outline.thickness;
        if ui
            .add(egui::Slider::new(&mut thickness, THICKNESS_MIN..=THICKNESS_MAX).text("Thickness"))
            .changed()
        {
            commands.push(PanelCommand::SetOutlineThickness(thickness));
        }
    }
    if outline.mode.uses_geometry_buffer() {
        let mut threshold = outline.threshold;
        if ui
            .add(egui::Slider::new(&mut threshold, THRESHOLD_MIN..=THRESHOLD_MAX).text("Threshold"))
            .changed()
        {
            commands.push(PanelCommand::SetEdgeThreshold(threshold));
        }
    }
}

fn view_section(ui: &mut egui::Ui, state: &ViewerState, commands: &mut Vec<PanelCommand>) {
    let mut wireframe = state.wireframe();
    if ui.checkbox(&mut wireframe, "Wireframe overlay").changed() {
        commands.push(PanelCommand::SetWireframe(wireframe));
    }
    let mut auto_rotate = state.auto_rotate();
    if ui.checkbox(&mut auto_rotate, "Auto-rotate").changed() {
        commands.push(PanelCommand::SetAutoRotate(auto_rotate));
    }
    let mut compare = state.compare();
    if ui.checkbox(&mut compare, "Compare (lambert | current)").changed() {
        commands.push(PanelCommand::SetCompare(compare));
    }
    if ui.button("Reset view").clicked() {
        commands.push(PanelCommand::ResetView);
    }
}

fn mesh_section(
    ui: &mut egui::Ui,
    obj_path: &mut String,
    import_status: &Option<Result<String, String>>,
    commands: &mut Vec<PanelCommand>,
) {
    ui.horizontal(|ui| {
        for p in Primitive::ALL {
            if ui.button(p.label()).clicked() {
                commands.push(PanelCommand::LoadPrimitive(p));
            }
        }
    });
    ui.horizontal(|ui| {
        ui.text_edit_singleline(obj_path);
        if ui.button("Load OBJ").clicked() && !obj_path.trim().is_empty() {
            commands.push(PanelCommand::LoadObj(PathBuf::from(obj_path.trim())));
        }
    });
    match import_status {
        Some(Ok(msg)) => {
            ui.label(msg.as_str());
        }
        Some(Err(msg)) => {
            ui.colored_label(egui::Color32::from_rgb(255, 110, 110), msg.as_str());
        }
        None => {}
    }
}

fn stats_section(ui: &mut egui::Ui, stats: &FrameStats) {
    ui.monospace(format!("FPS: {}  ({:.2} ms)", stats.fps, stats.frame_time_ms));
    ui.monospace(format!("Resolution: {} x {}", stats.resolution.0, stats.resolution.1));
    ui.monospace(format!("Mesh: {} verts, {} tris", stats.vertices, stats.triangles));
    for (i, passes) in stats.passes.iter().enumerate() {
        let names: Vec<&str> = passes.iter().map(|p| p.label()).collect();
        ui.monospace(format!("Viewport {i}: {}", names.join(" > ")));
    }
}
