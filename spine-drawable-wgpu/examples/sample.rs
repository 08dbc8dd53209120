//! Opens a window and plays a skeleton: "walk" looped, then "death" queued two seconds in.
//!
//! ```text
//! cargo run -p spine-drawable-wgpu --example sample -- [--wireframe] <atlas> <skeleton.json> [resource dir...]
//! ```
//!
//! `--wireframe` overlays the triangle edges of the skeleton.

use glam::Mat4;
use spine_drawable::{DrawableConfig, EventKind, FileSystem, SpineDrawable};
use spine_drawable_wgpu::{FrameRecorder, GpuTexture, SpineRenderer, WgpuTextureLoader};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

struct Args {
    atlas: String,
    skeleton: String,
    resource_paths: Vec<String>,
    wireframe: bool,
}

impl Args {
    fn parse() -> Option<Self> {
        let (flags, mut args): (Vec<String>, Vec<String>) =
            std::env::args().skip(1).partition(|arg| arg.starts_with("--"));
        if args.len() < 2 || flags.iter().any(|flag| flag != "--wireframe") {
            return None;
        }
        let resource_paths = args.split_off(2);
        let skeleton = args.pop()?;
        let atlas = args.pop()?;
        Some(Self {
            atlas,
            skeleton,
            resource_paths,
            wireframe: !flags.is_empty(),
        })
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SpineRenderer,
}

struct App {
    args: Args,
    gpu: Option<Gpu>,
    drawable: Option<SpineDrawable<GpuTexture>>,
    frame: FrameRecorder,
    last_frame: Instant,
}

impl App {
    fn new(args: Args) -> Self {
        Self {
            args,
            gpu: None,
            drawable: None,
            frame: FrameRecorder::new(),
            last_frame: Instant::now(),
        }
    }

    fn load_drawable(&self, gpu: &Gpu) -> Result<SpineDrawable<GpuTexture>, spine_drawable::Error> {
        let mut assets = FileSystem::new();
        for path in &self.args.resource_paths {
            assets.add_resource_path(path);
        }

        let mut textures = WgpuTextureLoader::new(
            &gpu.device,
            &gpu.queue,
            gpu.renderer.texture_bind_group_layout(),
            &assets,
        );
        let mut drawable = SpineDrawable::load(
            &assets,
            &mut textures,
            &self.args.atlas,
            &self.args.skeleton,
            &DrawableConfig::default(),
        )?;

        drawable.set_event_callback(|track, event| match event.kind {
            EventKind::Event => log::info!(
                "track {track}: event '{}' (int {}, float {}, string '{}')",
                event.name,
                event.int_value,
                event.float_value,
                event.string_value
            ),
            kind => log::info!("track {track}: {kind:?} {}", event.animation_name),
        });
        drawable.set_animation(0, "walk", true)?;
        drawable.add_animation(0, "death", false, 2.0)?;
        Ok(drawable)
    }

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame.clear();
        if let Some(drawable) = self.drawable.as_mut() {
            drawable.update(delta);
            drawable.draw(Mat4::IDENTITY, [1.0; 4], &mut self.frame);
            if self.args.wireframe {
                drawable.draw_wireframe(Mat4::IDENTITY, [0.2, 1.0, 0.4, 1.0], &mut self.frame);
            }
        }
        gpu.renderer.prepare(&gpu.device, &gpu.queue, &self.frame);

        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("surface lost ({err}), reconfiguring");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sample encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sample pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.12,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gpu.renderer.render(&mut pass, &self.frame);
        }

        gpu.queue.submit(Some(encoder.finish()));
        surface_texture.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let gpu = match create_gpu(event_loop) {
            Ok(gpu) => gpu,
            Err(err) => {
                log::error!("failed to initialise wgpu: {err}");
                event_loop.exit();
                return;
            }
        };

        match self.load_drawable(&gpu) {
            Ok(drawable) => self.drawable = Some(drawable),
            Err(err) => {
                log::error!("failed to load skeleton: {err}");
                event_loop.exit();
                return;
            }
        }

        self.last_frame = Instant::now();
        gpu.window.request_redraw();
        self.gpu = Some(gpu);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return;
                };
                gpu.config.width = size.width.max(1);
                gpu.config.height = size.height.max(1);
                gpu.surface.configure(&gpu.device, &gpu.config);
                gpu.renderer.update_globals_ortho_centered(
                    &gpu.queue,
                    gpu.config.width as f32,
                    gpu.config.height as f32,
                );
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn create_gpu(event_loop: &ActiveEventLoop) -> Result<Gpu, Box<dyn std::error::Error>> {
    let window = Arc::new(
        event_loop.create_window(Window::default_attributes().with_title("spine-drawable sample"))?,
    );

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window.clone())?;
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        compatible_surface: Some(&surface),
        power_preference: wgpu::PowerPreference::HighPerformance,
        force_fallback_adapter: false,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("sample device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        experimental_features: Default::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: Default::default(),
    }))?;

    let size = window.inner_size().max(PhysicalSize::new(1, 1));
    let format = surface
        .get_capabilities(&adapter)
        .formats
        .first()
        .copied()
        .ok_or("surface reports no formats")?;
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &config);

    let renderer = SpineRenderer::new(&device, &queue, config.format);
    renderer.update_globals_ortho_centered(&queue, config.width as f32, config.height as f32);

    Ok(Gpu {
        window,
        surface,
        device,
        queue,
        config,
        renderer,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = Args::parse() else {
        eprintln!("usage: sample [--wireframe] <atlas> <skeleton.json> [resource dir...]");
        std::process::exit(2);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;
    Ok(())
}
