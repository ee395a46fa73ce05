mod editor;
mod input_map;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use easel_input::Modifiers;
use easel_render::{PickingTarget, RenderSettings};
use easel_render_wgpu::WgpuDevice;
use egui::Context as EguiContext;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::editor::EditorState;

#[derive(Parser)]
#[command(name = "easel-desktop", about = "Easel scene editor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file to open; also the target of Save and Load
    #[arg(long, default_value = "scene.yaml")]
    scene: PathBuf,

    /// Render settings YAML
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value = "1280")]
    width: u32,

    #[arg(long, default_value = "720")]
    height: u32,
}

/// GPU objects created once the window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    scene: WgpuDevice,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    viewport_texture: egui::TextureId,
    viewport_generation: u64,
}

struct App {
    state: EditorState,
    window_size: PhysicalSize<u32>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    modifiers: Modifiers,
}

impl App {
    fn new(state: EditorState, width: u32, height: u32) -> Self {
        Self {
            state,
            window_size: PhysicalSize::new(width, height),
            gpu: None,
            egui_ctx: EguiContext::default(),
            modifiers: Modifiers::default(),
        }
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("Easel")
            .with_inner_size(self.window_size);
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
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("easel_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        let (device, queue) = (Arc::new(device), Arc::new(queue));

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
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

        let scene = WgpuDevice::new(
            device.clone(),
            queue.clone(),
            size.width,
            size.height,
            &easel_render::ShaderLibrary::default(),
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let mut egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);
        let viewport_texture = egui_renderer.register_native_texture(
            &device,
            scene.color_view(),
            wgpu::FilterMode::Linear,
        );

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            viewport_generation: scene.generation(),
            window,
            surface,
            device,
            queue,
            config,
            scene,
            egui_winit,
            egui_renderer,
            viewport_texture,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let texture = gpu.viewport_texture;
        let mut viewport = None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            viewport = Some(ui::draw_ui(&mut self.state, ctx, Some(texture)));
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        if let Some(rect) = viewport {
            if let Some((width, height)) = self.state.set_viewport(rect) {
                gpu.scene.resize(width, height);
            }
        }
        if gpu.scene.generation() != gpu.viewport_generation {
            gpu.egui_renderer.update_egui_texture_from_wgpu_texture(
                &gpu.device,
                gpu.scene.color_view(),
                wgpu::FilterMode::Linear,
                gpu.viewport_texture,
            );
            gpu.viewport_generation = gpu.scene.generation();
        }

        self.state.prepare_frame();
        if let Err(e) = self.state.render(&mut gpu.scene) {
            tracing::error!("frame failed: {e}");
            event_loop.exit();
            return;
        }

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

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        // The viewport is an egui panel too, so egui's `consumed` flag cannot
        // decide routing; the editor checks the viewport rect instead.
        let _ = gpu.egui_winit.on_window_event(&gpu.window, &event);

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(new_size) => {
                gpu.config.width = new_size.width.max(1);
                gpu.config.height = new_size.height.max(1);
                gpu.surface.configure(&gpu.device, &gpu.config);
                self.window_size = *new_size;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = input_map::modifiers_from(modifiers.state());
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }
            _ => {}
        }

        if let Some(input) = input_map::translate(&event, self.modifiers) {
            let keyboard_free = !self.egui_ctx.wants_keyboard_input();
            self.state.handle_input(input, keyboard_free);
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
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("easel-desktop starting");

    let settings = match &cli.settings {
        Some(path) => RenderSettings::load(path)
            .with_context(|| format!("loading settings {}", path.display()))?,
        None => RenderSettings::default(),
    };
    let state = EditorState::new(settings, cli.scene);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(state, cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    Ok(())
}
