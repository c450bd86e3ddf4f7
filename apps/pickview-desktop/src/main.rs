use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use glam::Vec3;
use pickview_common::Viewport;
use pickview_input::{Action, ControlScheme, Dispatch, Key};
use pickview_render::{RenderConfig, RenderOrchestrator};
use pickview_render_wgpu::SceneRenderer;
use pickview_scene::Scene;
use pickview_scene::demo::build_demo_scene;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{self, KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "pickview-desktop", about = "pickview desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML render config; defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width, overrides the config
    #[arg(long)]
    width: Option<u32>,

    /// Window height, overrides the config
    #[arg(long)]
    height: Option<u32>,

    /// How arrow keys and WASD move the camera
    #[arg(long, value_enum, default_value_t = Controls::Orbit)]
    controls: Controls,

    /// Skip the pick pass; clicks never hit
    #[arg(long)]
    no_pick: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Controls {
    Orbit,
    Pan,
}

impl From<Controls> for ControlScheme {
    fn from(c: Controls) -> Self {
        match c {
            Controls::Orbit => ControlScheme::Orbit,
            Controls::Pan => ControlScheme::Pan,
        }
    }
}

fn map_keycode(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyR => Key::R,
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        _ => return None,
    };
    Some(key)
}

fn map_key_event(event: &KeyEvent) -> Option<Key> {
    if let PhysicalKey::Code(code) = event.physical_key {
        if let Some(key) = map_keycode(code) {
            return Some(key);
        }
    }
    match &event.logical_key {
        keyboard::Key::Character(text) => text.chars().next().map(Key::Char),
        _ => None,
    }
}

/// Scroll in lines; pixel deltas are scaled to roughly one line per notch.
fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => (p.y / 40.0) as f32,
    }
}

/// Window, surface and device, created once the event loop resumes.
struct GpuContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
}

struct App {
    settings: RenderConfig,
    scheme: ControlScheme,
    orchestrator: RenderOrchestrator,
    gpu: Option<GpuContext>,
    scene: Option<Scene>,
    cursor: (f64, f64),
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(settings: RenderConfig, scheme: ControlScheme) -> Self {
        let viewport = Viewport::new(settings.window.width, settings.window.height);
        Self {
            orchestrator: RenderOrchestrator::new(&settings, viewport),
            settings,
            scheme,
            gpu: None,
            scene: None,
            cursor: (0.0, 0.0),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_cfg = &self.settings.window;
        let attrs = Window::default_attributes()
            .with_title(window_cfg.title.clone())
            .with_inner_size(PhysicalSize::new(window_cfg.width, window_cfg.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let optional = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pickview_device"),
                required_features: optional,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if self.settings.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let viewport = Viewport::new(config.width, config.height);
        let mut renderer = SceneRenderer::new(&device, surface_format, viewport)?;
        self.orchestrator.resize(viewport);
        self.orchestrator.set_pick_available(renderer.pick_ready());

        let mut scene = build_demo_scene(&mut renderer.loader(&device, &queue))?;
        scene.sky_colour = Vec3::from_array(self.settings.sky_colour);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            line_mode = !optional.is_empty(),
            "GPU initialized"
        );

        self.scene = Some(scene);
        self.gpu = Some(GpuContext {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
        });
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.config.width = size.width.max(1);
        gpu.config.height = size.height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.config);

        let viewport = Viewport::new(size.width, size.height);
        self.orchestrator.resize(viewport);
        match gpu.renderer.resize(&gpu.device, viewport) {
            Ok(()) => self.orchestrator.set_pick_available(true),
            Err(err) => {
                tracing::error!(%err, "pick buffer resize failed");
                self.orchestrator.set_pick_available(false);
            }
        }
    }

    fn handle(&mut self, action: Action) {
        let Some(scene) = &mut self.scene else {
            return;
        };
        match pickview_input::apply(action, scene, self.orchestrator.toggles_mut()) {
            Dispatch::Pick { x, y } => self.pick(x, y),
            Dispatch::Handled | Dispatch::Ignored => {}
        }
    }

    fn pick(&mut self, x: u32, y: u32) {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return;
        };
        let Some(mut target) = gpu.renderer.pick_target(&gpu.device, &gpu.queue) else {
            tracing::debug!("no pick target");
            return;
        };
        let entity = match self.orchestrator.pick_at(&mut target, x, y) {
            Ok(hit) => hit.map(|instance| instance.entity),
            Err(err) => {
                tracing::warn!(%err, "pick failed");
                return;
            }
        };
        match entity {
            Some(id) => match scene.trigger(id) {
                Some(action) => tracing::info!(entity = %id.short(), ?action, "picked"),
                None => tracing::info!(entity = %id.short(), "picked, no action"),
            },
            None => tracing::debug!(x, y, "background"),
        }
    }

    fn redraw(&mut self) {
        let (Some(gpu), Some(scene)) = (&mut self.gpu, &mut self.scene) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        scene.step();
        self.orchestrator.submit_scene(scene);
        let plan = self.orchestrator.plan_frame(scene);
        gpu.renderer.render(&gpu.device, &gpu.queue, &view, &plan);
        output.present();
        self.orchestrator.finish_frame();

        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            tracing::error!("startup failed: {err:#}");
            self.failure = Some(err);
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
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if let Some(key) = map_key_event(&event) {
                    self.handle(self.scheme.map_key(key));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.handle(Action::pick_at(self.cursor.0, self.cursor.1));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle(self.scheme.map_scroll(scroll_lines(delta)));
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut settings = RenderConfig::load_or_default(cli.config.as_deref())?;
    if let Some(width) = cli.width {
        settings.window.width = width;
    }
    if let Some(height) = cli.height {
        settings.window.height = height;
    }
    if cli.no_pick {
        settings.picking = false;
    }
    settings.validate()?;

    tracing::info!("pickview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings, cli.controls.into());
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_are_mapped() {
        assert_eq!(map_keycode(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_keycode(KeyCode::KeyD), Some(Key::D));
        assert_eq!(map_keycode(KeyCode::F3), Some(Key::F3));
        assert_eq!(map_keycode(KeyCode::KeyN), None);
    }

    #[test]
    fn scroll_pixels_scale_to_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let px = MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 80.0));
        assert_eq!(scroll_lines(px), 2.0);
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from(["pickview-desktop", "--width", "320", "--controls", "pan"])
            .unwrap();
        assert_eq!(cli.width, Some(320));
        assert_eq!(ControlScheme::from(cli.controls), ControlScheme::Pan);
        assert!(!cli.no_pick);
    }
}
