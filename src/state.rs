use crate::camera::{Camera, CameraController, CameraUniform};
use crate::controls::ParameterPanel;
use crate::export::save_ply;
use crate::gui::Gui;
use crate::initialize::{generate, PointCloud};
use crate::render::Render;
use crate::{CameraParams, GalaxyParameters};
use anyhow::{Context, Result};
use rand::{rngs::SmallRng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::keyboard::*;
use winit::{
  application::ApplicationHandler,
  dpi::{LogicalSize, PhysicalSize},
  event::{ElementState, KeyEvent, WindowEvent},
  event_loop::{ActiveEventLoop, EventLoop},
  window::{Window, WindowId},
};

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn new(
    surface: wgpu::Surface<'static>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
  ) -> Result<Self> {
    let mut config = surface
      .get_default_config(adapter, size.width.max(1), size.height.max(1))
      .context("Surface is not supported by the adapter")?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
    if size.width == 0 || size.height == 0 {
      return;
    }
    self.config.width = size.width;
    self.config.height = size.height;
    self.surface.configure(device, &self.config);
  }

  fn acquire(&mut self, device: &wgpu::Device) -> Result<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Ok(frame),
      Err(wgpu::SurfaceError::Timeout) => self
        .surface
        .get_current_texture()
        .context("Timed out acquiring frame"),
      Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
        self.surface.configure(device, &self.config);
        self
          .surface
          .get_current_texture()
          .context("Failed to acquire frame after reconfiguring")
      }
      Err(e) => Err(e).context("Failed to acquire frame"),
    }
  }

  fn view_format(&self) -> wgpu::TextureFormat {
    self.config.view_formats[0]
  }
}

/// GPU device plus the camera that feeds the shared camera bind group.
struct State {
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  camera_bind_group_layout: wgpu::BindGroupLayout,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  fn update(&mut self) {
    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    if size.height > 0 {
      self.camera.aspect = size.width as f32 / size.height as f32;
    }
  }

  async fn init(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'static>,
    size: &PhysicalSize<u32>,
    camera_params: &CameraParams,
  ) -> Result<Self> {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(surface),
        force_fallback_adapter: false,
      })
      .await
      .context("No suitable GPU adapter")?;

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await
      .context("Failed to create GPU device")?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let camera = Camera::looking_at_origin(
      (3.0, 3.0, 3.0).into(),
      size.width.max(1) as f32 / size.height.max(1) as f32,
      camera_params.fovy,
    );
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = CameraController::init(camera_params);

    Ok(Self {
      adapter,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      camera_bind_group_layout,
    })
  }
}

/// Parameters, the panel editing them and the RNG the generator draws from.
pub struct Galaxy {
  pub params: GalaxyParameters,
  pub panel: ParameterPanel,
  rng: SmallRng,
  generation: u64,
}

impl Galaxy {
  pub fn new(params: GalaxyParameters, seed: Option<u64>) -> Self {
    Self {
      params,
      panel: ParameterPanel::init(),
      rng: make_rng(seed),
      generation: 0,
    }
  }

  pub fn generate(&mut self) -> PointCloud {
    let started = Instant::now();
    let cloud = generate(&self.params, &mut self.rng);
    self.generation += 1;
    log::info!(
      "generated {} points in {:.1?}, max planar radius {:.3}, {} non-finite",
      cloud.len(),
      started.elapsed(),
      cloud.max_planar_radius(),
      cloud.non_finite_count()
    );
    cloud
  }

  /// Drains the committed changes and rebuilds once if there were any.
  pub fn rebuild_if_changed(&mut self) -> Option<PointCloud> {
    let changes = self.panel.drain_changes();
    if changes.is_empty() {
      return None;
    }
    log::debug!("committed changes: {changes:?}");
    Some(self.generate())
  }

  /// How many clouds have been generated so far.
  pub fn generation(&self) -> u64 {
    self.generation
  }
}

pub fn make_rng(seed: Option<u64>) -> SmallRng {
  match seed {
    Some(seed) => SmallRng::seed_from_u64(seed),
    None => SmallRng::from_entropy(),
  }
}

/// Everything that needs a window: surface, device, point renderer and gui.
struct Viewer {
  window: Arc<Window>,
  surface: SurfaceWrapper,
  context: State,
  render: Render,
  gui: Gui,
}

impl Viewer {
  async fn init(event_loop: &ActiveEventLoop, galaxy: &mut Galaxy) -> Result<Self> {
    let attributes = Window::default_attributes()
      .with_title("Galaxy")
      .with_inner_size(LogicalSize::new(1280.0, 800.0));
    let window = Arc::new(
      event_loop
        .create_window(attributes)
        .context("Failed to open window")?,
    );
    let camera_params = CameraParams::default();
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let size = window.inner_size();
    let raw_surface = instance
      .create_surface(window.clone())
      .context("Failed to create surface")?;
    let context = State::init(&instance, &raw_surface, &size, &camera_params).await?;
    let surface = SurfaceWrapper::new(raw_surface, &context.adapter, &context.device, size)?;
    let mut render = Render::init(
      &surface.config,
      &context.device,
      &context.camera_bind_group_layout,
      camera_params.fovy,
    );
    let gui = Gui::init(&window, &context.device, surface.view_format());

    let cloud = galaxy.generate();
    render.upload(&context.device, &context.queue, &cloud, &galaxy.params);

    Ok(Self {
      window,
      surface,
      context,
      render,
      gui,
    })
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.surface.resize(&self.context.device, size);
    self.context.resize(size);
  }

  fn redraw(&mut self, galaxy: &mut Galaxy) -> Result<()> {
    let gui_frame = self
      .gui
      .run(&self.window, |ctx| galaxy.panel.show(ctx, &mut galaxy.params));
    if let Some(cloud) = galaxy.rebuild_if_changed() {
      self.render.upload(
        &self.context.device,
        &self.context.queue,
        &cloud,
        &galaxy.params,
      );
    }
    self.context.update();

    let frame = self.surface.acquire(&self.context.device)?;
    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.surface.view_format()),
      ..wgpu::TextureViewDescriptor::default()
    });
    self.render.render(
      &view,
      &self.context.device,
      &self.context.queue,
      &self.context.camera_bind_group,
    );
    self.gui.paint(
      &self.context.device,
      &self.context.queue,
      &view,
      [self.surface.config.width, self.surface.config.height],
      gui_frame,
    );
    frame.present();
    Ok(())
  }
}

struct App {
  galaxy: Galaxy,
  viewer: Option<Viewer>,
  error: Option<anyhow::Error>,
}

impl App {
  fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
    log::error!("{error:#}");
    self.error = Some(error);
    event_loop.exit();
  }
}

impl ApplicationHandler for App {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if self.viewer.is_some() {
      return;
    }
    match pollster::block_on(Viewer::init(event_loop, &mut self.galaxy)) {
      Ok(viewer) => self.viewer = Some(viewer),
      Err(e) => self.fail(event_loop, e),
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
    let Some(viewer) = self.viewer.as_mut() else {
      return;
    };
    if window_id != viewer.window.id() {
      return;
    }
    if viewer.gui.on_window_event(&viewer.window, &event) {
      return;
    }
    if viewer.context.input(&event) {
      return;
    }
    match event {
      WindowEvent::CloseRequested
      | WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(KeyCode::Escape),
            ..
          },
        ..
      } => event_loop.exit(),
      WindowEvent::Resized(size) => viewer.resize(size),
      WindowEvent::RedrawRequested => {
        if let Err(e) = viewer.redraw(&mut self.galaxy) {
          self.fail(event_loop, e);
        }
      }
      _ => {}
    }
  }

  fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
    if let Some(viewer) = &self.viewer {
      viewer.window.request_redraw();
    }
  }
}

/// Opens the viewer window. Blocks until it is closed.
pub fn run(params: GalaxyParameters, seed: Option<u64>) -> Result<()> {
  let event_loop = EventLoop::new().context("Failed to create event loop")?;
  let mut app = App {
    galaxy: Galaxy::new(params, seed),
    viewer: None,
    error: None,
  };
  event_loop.run_app(&mut app).context("Event loop failed")?;
  match app.error {
    Some(e) => Err(e),
    None => Ok(()),
  }
}

/// Generates once without a window, optionally writing the points as PLY.
pub fn run_headless(params: GalaxyParameters, seed: Option<u64>, output: Option<&Path>) -> Result<()> {
  let cloud = Galaxy::new(params, seed).generate();
  if let Some(path) = output {
    save_ply(path, &cloud)?;
    log::info!("wrote {}", path.display());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::controls::Control;

  fn small_galaxy() -> Galaxy {
    let params = GalaxyParameters {
      count: 200,
      ..Default::default()
    };
    Galaxy::new(params, Some(7))
  }

  #[test]
  fn nothing_committed_means_no_rebuild() {
    let mut galaxy = small_galaxy();
    galaxy.panel.mark_edited(Control::Spin);
    // still dragging
    galaxy.panel.finish_frame(true, &galaxy.params);
    assert!(galaxy.rebuild_if_changed().is_none());
    assert_eq!(galaxy.generation(), 0);
  }

  #[test]
  fn several_commits_in_one_frame_rebuild_once() {
    let mut galaxy = small_galaxy();
    galaxy.params.branches = 6;
    galaxy.panel.mark_edited(Control::Branches);
    galaxy.params.count = 300;
    galaxy.panel.mark_edited(Control::Count);
    galaxy.panel.finish_frame(false, &galaxy.params);
    galaxy.params.spin = -2.0;
    galaxy.panel.mark_edited(Control::Spin);
    galaxy.panel.finish_frame(false, &galaxy.params);

    let cloud = galaxy.rebuild_if_changed().expect("changes were committed");
    assert_eq!(cloud.len(), 300);
    assert_eq!(galaxy.generation(), 1);
    assert!(galaxy.rebuild_if_changed().is_none());
    assert_eq!(galaxy.generation(), 1);
  }

  #[test]
  fn rebuild_uses_the_edited_parameters() {
    let mut galaxy = small_galaxy();
    galaxy.generate();
    galaxy.params.radius = 2.0;
    galaxy.panel.mark_edited(Control::Radius);
    galaxy.panel.finish_frame(false, &galaxy.params);
    let cloud = galaxy.rebuild_if_changed().expect("radius was committed");
    // jitter adds at most `randomness` on each planar axis
    let bound = 2.0 + 0.2 * std::f32::consts::SQRT_2;
    assert!(cloud.max_planar_radius() <= bound + 1e-4);
    assert_eq!(galaxy.generation(), 2);
  }
}
