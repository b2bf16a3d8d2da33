use eframe::egui;
use instant::Instant;
use vantage_engine::wgpu;
use vantage_engine::{AbstractKey, Engine, EngineOptions, InputEvent, SceneData};

/// Exponential smoothing factor for the frame-time readout.
const FRAME_TIME_ALPHA: f32 = 0.1;

pub fn run(scene: SceneData, options: EngineOptions) -> anyhow::Result<()> {
    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(options.width as f32, options.height as f32)),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };
    // The app name keys the egui layout storage, so it must stay stable
    // across scenes.
    eframe::run_native(
        "vantage",
        native_options,
        Box::new(move |cc| Box::new(ViewerApp::new(cc, scene, &options))),
    );
    Ok(())
}

pub struct ViewerApp {
    render_state: egui_wgpu::RenderState,
    engine: Engine,
    /// The engine's color target, registered with the egui renderer.
    scene_texture: egui::TextureId,
    last_frame: Instant,
    smoothed_frame_time: f32,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        scene: SceneData,
        options: &EngineOptions,
    ) -> Self {
        let render_state = cc
            .wgpu_render_state
            .as_ref()
            .expect("the viewer only runs on the wgpu backend")
            .clone();

        let engine = Engine::new(&render_state.device, scene, options);
        let scene_texture = render_state.renderer.write().register_native_texture(
            &render_state.device,
            engine.color_texture_view(),
            wgpu::FilterMode::Linear,
        );

        Self {
            render_state,
            engine,
            scene_texture,
            last_frame: Instant::now(),
            smoothed_frame_time: 0.0,
        }
    }

    fn forward_key_events(&mut self, ctx: &egui::Context) {
        for event in &ctx.input().events {
            let egui::Event::Key { key, pressed, .. } = event else { continue };
            let key = match key {
                egui::Key::ArrowUp | egui::Key::W => AbstractKey::CameraMoveForward,
                egui::Key::ArrowDown | egui::Key::S => AbstractKey::CameraMoveBackward,
                egui::Key::ArrowLeft | egui::Key::A => AbstractKey::CameraMoveLeft,
                egui::Key::ArrowRight | egui::Key::D => AbstractKey::CameraMoveRight,
                egui::Key::Q => AbstractKey::CameraMoveDown,
                egui::Key::E => AbstractKey::CameraMoveUp,
                _ => continue,
            };
            let event = if *pressed {
                InputEvent::KeyPressing(key)
            } else {
                InputEvent::KeyUp(key)
            };
            self.engine.input(&event);
        }
    }

    fn scene_view(&mut self, ui: &mut egui::Ui) {
        let size = ui.available_size();
        let scale = ui.ctx().pixels_per_point();
        let width = (size.x * scale) as u32;
        let height = (size.y * scale) as u32;

        if self.engine.resize(width, height, &self.render_state.device) {
            self.render_state
                .renderer
                .write()
                .update_egui_texture_from_wgpu_texture(
                    &self.render_state.device,
                    self.engine.color_texture_view(),
                    wgpu::FilterMode::Linear,
                    self.scene_texture,
                );
        }

        let response = ui
            .add(egui::Image::new(self.scene_texture, size))
            .interact(egui::Sense::drag());

        if response.drag_started() && response.dragged_by(egui::PointerButton::Primary) {
            self.engine.input(&InputEvent::MouseLeftDown);
        }
        if response.dragged() && response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.engine.input(&InputEvent::MouseMove {
                delta_x: delta.x,
                delta_y: delta.y,
            });
            ui.output().cursor_icon = egui::CursorIcon::Move;
        }
        // NOTE: Response::drag_released misses a release that happens outside
        // the window, so the raw pointer events are watched instead.
        for event in &ui.ctx().input().events {
            if let egui::Event::PointerButton {
                button: egui::PointerButton::Primary,
                pressed: false,
                ..
            } = event
            {
                self.engine.input(&InputEvent::MouseLeftUp);
            }
        }

        if response.hovered() {
            let scroll = ui.ctx().input().scroll_delta;
            if scroll != egui::Vec2::ZERO {
                self.engine.input(&InputEvent::MouseWheel {
                    delta_x: scroll.x,
                    delta_y: scroll.y,
                });
            }
        }
    }

    fn diagnostics_window(&self, ctx: &egui::Context) {
        let camera = self.engine.camera();
        let stats = self.engine.stats();
        let frame_ms = self.smoothed_frame_time * 1000.0;
        let fps = if self.smoothed_frame_time > 0.0 {
            1.0 / self.smoothed_frame_time
        } else {
            0.0
        };

        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("{frame_ms:.2} ms/frame ({fps:.0} FPS)"));
                ui.separator();

                egui::CollapsingHeader::new("Camera")
                    .default_open(true)
                    .show(ui, |ui| {
                        vector_row(ui, "eye", camera.eye().into());
                        vector_row(ui, "center", camera.center().into());
                        vector_row(ui, "up", camera.up().into());
                        vector_row(ui, "front", camera.front().into());
                        vector_row(ui, "left", camera.left().into());
                        if ui.button("Copy as --lookat").clicked() {
                            ui.output().copied_text = look_at_argument(camera);
                        }
                    });

                egui::CollapsingHeader::new("Scene").show(ui, |ui| {
                    ui.label(format!("nodes visited: {}", stats.nodes_visited));
                    ui.label(format!("draw calls: {}", stats.draw_calls));
                    ui.label(format!("meshes: {}", stats.meshes));
                    ui.label(format!("primitives: {}", stats.primitives));
                    ui.label(format!("device buffers: {}", stats.buffers));
                    ui.label(format!("pipelines: {}", stats.pipelines));
                });
            });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let now = Instant::now();
        let frame_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.smoothed_frame_time = if self.smoothed_frame_time == 0.0 {
            frame_time
        } else {
            self.smoothed_frame_time + FRAME_TIME_ALPHA * (frame_time - self.smoothed_frame_time)
        };

        if ctx.input().key_pressed(egui::Key::Escape) {
            frame.close();
            return;
        }

        if ctx.wants_keyboard_input() {
            // A widget owns the keyboard, so release events may never arrive.
            self.engine.reset_movement();
        } else {
            self.forward_key_events(ctx);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.scene_view(ui);
            });

        self.diagnostics_window(ctx);

        self.engine.update(&self.render_state.queue);
        self.render_state
            .queue
            .submit(std::iter::once(self.engine.render(&self.render_state.device)));

        ctx.request_repaint();
    }

    // Window geometry follows --width/--height, not the previous run; only
    // the egui layout memory is kept.
    fn persist_native_window(&self) -> bool {
        false
    }
}

/// Formats the camera pose so it can be pasted straight back on the
/// command line.
fn look_at_argument(camera: &vantage_engine::Camera) -> String {
    let eye = camera.eye();
    let center = camera.center();
    let up = camera.up();
    format!(
        "--lookat {},{},{},{},{},{},{},{},{}",
        eye.x, eye.y, eye.z, center.x, center.y, center.z, up.x, up.y, up.z,
    )
}

fn vector_row(ui: &mut egui::Ui, label: &str, v: [f32; 3]) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.monospace(format!("{:>8.3} {:>8.3} {:>8.3}", v[0], v[1], v[2]));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_engine::cgmath::{Deg, Point3};
    use vantage_engine::Camera;

    #[test]
    fn test_look_at_argument_round_trips() {
        let camera = Camera::new(Point3::new(1.0, 2.0, 3.0), Deg(-90.0), Deg(0.0));
        let argument = look_at_argument(&camera);
        let values: Vec<f32> = argument
            .strip_prefix("--lookat ")
            .unwrap()
            .split(',')
            .map(|part| part.parse().unwrap())
            .collect();
        assert_eq!(values.len(), 9);
        assert_eq!(&values[0..3], &[1.0, 2.0, 3.0]);
        // Facing -z, so the center sits one unit in front of the eye.
        assert!((values[3] - 1.0).abs() < 1e-5);
        assert!((values[5] - 2.0).abs() < 1e-5);
        assert_eq!(&values[6..9], &[0.0, 1.0, 0.0]);
    }
}
