use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::canvas::Canvas;
use crate::config::{
    Config, BACKGROUND, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DENSITY_STEP, DOT_SIZE_STEP,
};
use crate::error::BorealisError;
use crate::gpu::{GpuContext, Presenter};
use crate::instance::Borealis;
use crate::surface::DrawSurface;

/// Window host: owns the field, the GPU presenter and the frame loop
pub struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    presenter: Option<Presenter>,
    borealis: Option<Borealis<Canvas>>,
    epoch: Instant,
    fps_counter: FpsCounter,
    error: Option<BorealisError>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            presenter: None,
            borealis: None,
            epoch: Instant::now(),
            fps_counter: FpsCounter::new(),
            error: None,
        }
    }

    /// Initialization failure that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<BorealisError> {
        self.error.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), BorealisError> {
        log::info!("Initializing Borealis...");

        let mut window_attrs = Window::default_attributes()
            .with_title("Borealis - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width.unwrap_or(DEFAULT_WINDOW_WIDTH),
                self.config.height.unwrap_or(DEFAULT_WINDOW_HEIGHT),
            ));
        if self.config.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let size = window.inner_size();
        let presenter = Presenter::new(&gpu.device, gpu.format(), size.width, size.height);

        let canvas = Canvas::new(size.width, size.height, BACKGROUND);
        let mut borealis = Borealis::new(self.config.clone(), canvas);
        borealis.on_hide(|| log::info!("Field hidden, press Space to show"));
        borealis.on_show(|| log::info!("Field shown"));
        if !borealis.is_running() {
            borealis.force_frame();
        }

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Space: Toggle show/hide");
        log::info!("  P: Pause/resume");
        log::info!("  F: Draw a single frame");
        log::info!("  E: Cycle effect");
        log::info!("  A/B: Toggle pattern/effect aurora");
        log::info!("  O: Toggle solid pattern");
        log::info!("  +/-: Density");
        log::info!("  [/]: Dot size");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        self.presenter = Some(presenter);
        self.borealis = Some(borealis);
        Ok(())
    }

    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn render(&mut self) {
        let now = self.now_ms();
        let Some(borealis) = self.borealis.as_mut() else {
            return;
        };
        let advanced = borealis.advance_and_render(now);
        self.present();

        if advanced {
            if let Some(fps) = self.fps_counter.tick() {
                self.update_title(Some(fps));
            }
        }
    }

    fn present(&self) {
        let (Some(gpu), Some(presenter), Some(borealis)) =
            (&self.gpu, &self.presenter, &self.borealis)
        else {
            return;
        };

        let canvas = borealis.surface();
        let (width, height) = canvas.size();
        if !presenter.upload(&gpu.queue, width, height, canvas.as_bytes()) {
            return;
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        presenter.draw(&mut encoder, &view);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn update_title(&self, fps: Option<f64>) {
        let (Some(window), Some(borealis)) = (&self.window, &self.borealis) else {
            return;
        };
        let state = if borealis.is_running() { "" } else { " [Paused]" };
        let fps = fps.map(|f| format!(" - {:.0} FPS", f)).unwrap_or_default();
        window.set_title(&format!(
            "Borealis{} - {:?}{}",
            fps,
            borealis.effect().kind,
            state
        ));
    }

    /// Apply a config edit through the instance so regeneration rules hold
    fn reconfigure(&mut self, edit: impl FnOnce(&mut Config)) {
        let Some(borealis) = self.borealis.as_mut() else {
            return;
        };
        let mut config = borealis.config().clone();
        edit(&mut config);
        borealis.update_config(config);
        if !borealis.is_running() {
            borealis.force_frame();
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Space => {
                if let Some(borealis) = self.borealis.as_mut() {
                    borealis.toggle(None);
                    let target = if borealis.is_collapsing() { "Hiding" } else { "Showing" };
                    log::info!("{} (progress {:.2})", target, borealis.progress());
                }
            }

            KeyCode::KeyP => {
                if let Some(borealis) = self.borealis.as_mut() {
                    if borealis.is_running() {
                        borealis.stop();
                        log::info!("Paused");
                    } else {
                        borealis.start();
                        log::info!("Resumed");
                    }
                }
                self.update_title(None);
            }

            KeyCode::KeyF => {
                if let Some(borealis) = self.borealis.as_mut() {
                    borealis.force_frame();
                }
            }

            KeyCode::KeyE => {
                if let Some(borealis) = self.borealis.as_mut() {
                    let mut effect = borealis.effect().clone();
                    effect.kind = effect.kind.next();
                    borealis.set_effect(effect);
                    if !borealis.is_running() {
                        borealis.force_frame();
                    }
                }
                self.update_title(None);
            }

            KeyCode::KeyA => self.reconfigure(|c| {
                c.pattern_aurora = !c.pattern_aurora;
                log::info!("Pattern aurora: {}", if c.pattern_aurora { "ON" } else { "OFF" });
            }),
            KeyCode::KeyB => self.reconfigure(|c| {
                c.effect.aurora = !c.effect.aurora;
                log::info!("Effect aurora: {}", if c.effect.aurora { "ON" } else { "OFF" });
            }),
            KeyCode::KeyO => self.reconfigure(|c| {
                c.solid_pattern = !c.solid_pattern;
                log::info!("Solid pattern: {}", if c.solid_pattern { "ON" } else { "OFF" });
            }),

            KeyCode::Equal | KeyCode::NumpadAdd => self.reconfigure(|c| {
                c.density = (c.density + DENSITY_STEP).min(100.0);
                log::info!("Density: {:.0}", c.density);
            }),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.reconfigure(|c| {
                c.density = (c.density - DENSITY_STEP).max(10.0);
                log::info!("Density: {:.0}", c.density);
            }),

            KeyCode::BracketLeft => self.reconfigure(|c| {
                c.dot_size = (c.dot_size - DOT_SIZE_STEP).max(0.0);
                log::info!("Dot size: {:.0}", c.dot_size);
            }),
            KeyCode::BracketRight => self.reconfigure(|c| {
                c.dot_size = (c.dot_size + DOT_SIZE_STEP).min(10.0);
                log::info!("Dot size: {:.0}", c.dot_size);
            }),

            _ => return,
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Initialization failed: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                if let (Some(gpu), Some(presenter)) = (&mut self.gpu, &mut self.presenter) {
                    gpu.resize(new_size);
                    presenter.resize(&gpu.device, new_size.width, new_size.height);
                }
                if let Some(borealis) = self.borealis.as_mut() {
                    borealis.resize(new_size.width, new_size.height);
                    if !borealis.is_running() {
                        borealis.force_frame();
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                // Keep the loop going only while the field animates
                let running = self.borealis.as_ref().is_some_and(|b| b.is_running());
                if running {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
