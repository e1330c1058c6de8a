use winit::{event::WindowEvent, window::Window};

/// One tessellated egui frame waiting to be painted.
pub struct GuiFrame {
  paint_jobs: Vec<egui::ClippedPrimitive>,
  textures_delta: egui::TexturesDelta,
  pixels_per_point: f32,
}

/// egui input state and the wgpu renderer that draws it over the galaxy.
pub struct Gui {
  state: egui_winit::State,
  renderer: egui_wgpu::Renderer,
}

impl Gui {
  pub fn init(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
    let state = egui_winit::State::new(
      egui::Context::default(),
      egui::ViewportId::ROOT,
      window,
      Some(window.scale_factor() as f32),
      Some(winit::window::Theme::Dark),
      Some(device.limits().max_texture_dimension_2d as usize),
    );
    let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
    Self { state, renderer }
  }

  /// Returns true when egui wants the event for itself.
  pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
    self.state.on_window_event(window, event).consumed
  }

  pub fn run(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) -> GuiFrame {
    let raw_input = self.state.take_egui_input(window);
    let egui::FullOutput {
      platform_output,
      textures_delta,
      shapes,
      pixels_per_point,
      ..
    } = self.state.egui_ctx().run(raw_input, ui);
    self.state.handle_platform_output(window, platform_output);
    let paint_jobs = self.state.egui_ctx().tessellate(shapes, pixels_per_point);
    GuiFrame {
      paint_jobs,
      textures_delta,
      pixels_per_point,
    }
  }

  /// Draws on top of whatever is already in `view`.
  pub fn paint(
    &mut self,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
    size_in_pixels: [u32; 2],
    frame: GuiFrame,
  ) {
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
      size_in_pixels,
      pixels_per_point: frame.pixels_per_point,
    };
    for (id, image_delta) in &frame.textures_delta.set {
      self
        .renderer
        .update_texture(device, queue, *id, image_delta);
    }

    let mut encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("gui") });
    let callbacks = self.renderer.update_buffers(
      device,
      queue,
      &mut encoder,
      &frame.paint_jobs,
      &screen_descriptor,
    );
    {
      let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("gui"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
          view,
          resolve_target: None,
          ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
          },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
      });
      self.renderer.render(
        &mut render_pass.forget_lifetime(),
        &frame.paint_jobs,
        &screen_descriptor,
      );
    }
    queue.submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));

    for id in &frame.textures_delta.free {
      self.renderer.free_texture(id);
    }
  }
}
