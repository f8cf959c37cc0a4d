use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tableau_assets::{ResourceRegistry, SceneManifest};
use tableau_input::KeyBindings;
use tableau_render::{
    CameraController, CameraSignal, LookupMode, SceneCompositor, upload_lights,
};
use tableau_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "tableau-desktop", about = "Interactive still-life viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene manifest (JSON). Defaults to the built-in still life.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Key bindings file (JSON map of key name to action)
    #[arg(long)]
    bindings: Option<PathBuf>,

    #[arg(long, default_value = "1000")]
    width: u32,

    #[arg(long, default_value = "800")]
    height: u32,

    /// Fail draws that reference unknown textures or materials
    #[arg(long)]
    strict: bool,
}

/// Everything the frame loop owns apart from the GPU objects.
struct AppState {
    manifest: SceneManifest,
    registry: ResourceRegistry,
    camera: CameraController,
    bindings: KeyBindings,
    keys_held: BTreeSet<String>,
    mode: LookupMode,
    last_frame: Instant,
}

impl AppState {
    fn new(manifest: SceneManifest, bindings: KeyBindings, mode: LookupMode) -> Self {
        Self {
            manifest,
            registry: ResourceRegistry::new(),
            camera: CameraController::default(),
            bindings,
            keys_held: BTreeSet::new(),
            mode,
            last_frame: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: String, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    /// Forget held keys and the pointer anchor. Key releases that happen
    /// while another window has focus are never delivered.
    fn focus_lost(&mut self) {
        self.keys_held.clear();
        self.camera.reset_pointer();
    }

    /// Sample held keys and step the camera.
    fn update(&mut self, dt: f32) -> CameraSignal {
        let snapshot = self
            .bindings
            .snapshot(self.keys_held.iter().map(String::as_str));
        self.camera.update(&snapshot, dt)
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    compositor: SceneCompositor,
}

struct GpuApp {
    state: AppState,
    size: PhysicalSize<u32>,
    gpu: Option<Gpu>,
}

impl GpuApp {
    fn new(state: AppState, size: PhysicalSize<u32>) -> Self {
        Self {
            state,
            size,
            gpu: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Tableau")
            .with_inner_size(self.size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tableau_device"),
                required_features: wgpu::Features::empty(),
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
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut backend =
            WgpuBackend::new(device, queue, surface_format, config.width, config.height)?;

        let report = self
            .state
            .manifest
            .apply(&mut self.state.registry, &mut backend);
        for (tag, err) in &report.failed {
            tracing::warn!(tag, "texture unavailable: {err}");
        }
        let compositor = SceneCompositor::new(backend.mesh_table()).with_mode(self.state.mode);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            textures = report.loaded.len(),
            materials = report.materials_defined,
            "GPU initialized"
        );

        self.gpu = Some(Gpu {
            window,
            surface,
            config,
            backend,
            compositor,
        });
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &mut self.gpu {
            self.state.registry.destroy_all(&mut gpu.backend);
        }
        tracing::info!("tableau-desktop shutting down");
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;

        if self.state.update(dt) == CameraSignal::Shutdown {
            self.shutdown(event_loop);
            return;
        }

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(gpu.backend.device(), &gpu.config);
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

        let state = &self.state;
        let aspect = gpu.config.width as f32 / gpu.config.height.max(1) as f32;
        let view_projection = state.camera.build_view_projection(aspect);

        gpu.compositor.begin_frame(&state.registry, &mut gpu.backend);
        gpu.compositor
            .set_view(&mut gpu.backend, &view_projection, state.camera.position());
        upload_lights(&mut gpu.backend, &state.manifest.lights);
        if let Err(e) =
            gpu.compositor
                .draw_all(&state.registry, &mut gpu.backend, &state.manifest.draws)
        {
            tracing::error!("draw list aborted: {e}");
        }
        match gpu.compositor.end_frame() {
            Ok(stats) => tracing::trace!(?stats, "frame"),
            Err(e) => tracing::error!("{e}"),
        }

        gpu.backend.render(&view);
        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize GPU: {e:#}");
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
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(gpu.backend.device(), &gpu.config);
                    gpu.backend.resize(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(format!("{key:?}"), key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .camera
                    .on_pointer_move(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                tracing::debug!("focus lost, releasing held keys");
                self.state.focus_lost();
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.camera.reset_pointer();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                self.state.camera.on_scroll(dy);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn load_bindings(path: Option<&PathBuf>) -> Result<KeyBindings> {
    let Some(path) = path else {
        return Ok(KeyBindings::default());
    };
    let file = std::fs::File::open(path)
        .with_context(|| format!("open bindings {}", path.display()))?;
    let bindings = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parse bindings {}", path.display()))?;
    Ok(bindings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("tableau-desktop starting");

    let manifest = match &cli.scene {
        Some(path) => SceneManifest::load(path)?,
        None => SceneManifest::still_life(),
    };
    let bindings = load_bindings(cli.bindings.as_ref())?;
    let mode = if cli.strict {
        LookupMode::Strict
    } else {
        LookupMode::Compatible
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let state = AppState::new(manifest, bindings, mode);
    let mut app = GpuApp::new(state, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(
            SceneManifest::still_life(),
            KeyBindings::default(),
            LookupMode::Compatible,
        )
    }

    #[test]
    fn held_key_moves_the_camera() {
        let mut state = state();
        let start = state.camera.position();
        state.handle_key("KeyW".to_string(), true);
        assert_eq!(state.update(0.1), CameraSignal::Continue);
        assert_ne!(state.camera.position(), start);
    }

    #[test]
    fn losing_focus_releases_held_keys() {
        let mut state = state();
        state.handle_key("KeyW".to_string(), true);
        state.camera.on_pointer_move(100.0, 100.0);
        state.focus_lost();
        assert!(state.keys_held.is_empty());

        let start = state.camera.position();
        state.update(0.1);
        assert_eq!(state.camera.position(), start);

        // the first move after refocus only re-anchors the pointer
        let front = state.camera.front();
        state.camera.on_pointer_move(400.0, 300.0);
        assert_eq!(state.camera.front(), front);
    }
}
