// Interactive NPR mesh viewer.
// F1 toggles the control panel, R resets the view, Escape quits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use npr_viewer::engine::{
    obj, ImportOptions, IndexWidth, OutlineMode, Primitive, Renderer, ShadingMode, ViewerState,
};

#[derive(Parser, Debug)]
#[command(name = "npr_viewer", about = "Non-photorealistic mesh viewer")]
struct Cli {
    /// OBJ file to load instead of a primitive
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Built-in mesh: sphere, cube or smooth-cube
    #[arg(long, default_value = "smooth-cube")]
    primitive: Primitive,

    /// Longest bounding-box edge of the loaded mesh
    #[arg(long, default_value_t = obj::DEFAULT_TARGET_SIZE)]
    size: f32,

    /// lambert, gooch, toon or hatch
    #[arg(long, default_value = "lambert")]
    shading: ShadingMode,

    /// off, object-hull, screen-depth or screen-normal
    #[arg(long, default_value = "off")]
    outline: OutlineMode,

    /// Number of toon bands
    #[arg(long)]
    toon_steps: Option<f32>,

    /// Split view: lambert on the left, the selected shading on the right
    #[arg(long)]
    compare: bool,

    /// Overlay the triangle edges
    #[arg(long)]
    wireframe: bool,

    #[arg(long)]
    no_auto_rotate: bool,

    /// Allow imports beyond 65535 vertices (32-bit indices)
    #[arg(long)]
    wide_indices: bool,
}

impl Cli {
    fn import_options(&self) -> ImportOptions {
        ImportOptions {
            target_size: self.size,
            index_width: if self.wide_indices { IndexWidth::U32 } else { IndexWidth::U16 },
        }
    }

    fn initial_state(&self) -> anyhow::Result<ViewerState> {
        let mut state = ViewerState::new();
        state.set_shading_mode(self.shading);
        state.set_outline_mode(self.outline);
        state.set_compare(self.compare);
        state.set_wireframe(self.wireframe);
        state.set_auto_rotate(!self.no_auto_rotate);
        if let Some(steps) = self.toon_steps {
            state.set_toon_steps(steps);
        }

        let mesh = match &self.obj {
            Some(path) => obj::load_obj_file(path, &self.import_options())
                .with_context(|| format!("could not import {}", path.display()))?,
            None => self.primitive.build(self.size),
        };
        state.set_mesh(mesh);
        Ok(state)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let state = cli.initial_state()?;

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("NPR Viewer")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), state, cli.import_options()))?;
    log::info!(
        "Shading: {}, outline: {}",
        renderer.state().shading().mode,
        renderer.state().outline().mode.label()
    );

    let start = Instant::now();
    let mut frame_count = 0;
    let mut last_fps_update = Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                if renderer.handle_window_event(event) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(code),
                                repeat: false,
                                ..
                            },
                        ..
                    } => match code {
                        KeyCode::Escape => control_flow.exit(),
                        KeyCode::F1 => renderer.toggle_panel(),
                        KeyCode::KeyR => renderer.reset_view(),
                        _ => {}
                    },
                    WindowEvent::RedrawRequested => {
                        let time_ms = start.elapsed().as_secs_f64() * 1000.0;
                        match renderer.render(time_ms) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                log::warn!("Surface lost, reconfiguring");
                                renderer.reconfigure();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory");
                                control_flow.exit();
                            }
                            Err(e) => log::warn!("Frame skipped: {e:?}"),
                        }

                        frame_count += 1;
                        let now = Instant::now();
                        let elapsed = (now - last_fps_update).as_secs_f32();
                        if elapsed >= 1.0 {
                            let frame_ms = elapsed * 1000.0 / frame_count as f32;
                            log::info!("FPS: {} | Frame: {:.2} ms", frame_count, frame_ms);
                            renderer.set_frame_timing(frame_count, frame_ms);
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
