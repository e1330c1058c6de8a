use crate::initialize::PointCloud;
use crate::resource::{Release, ResourceSlot};
use crate::GalaxyParameters;
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
  size: [f32; 4],
}

// two triangles, corners of a unit quad centred on the point
#[rustfmt::skip]
const QUAD_CORNERS: [[f32; 2]; 6] = [
  [-0.5, -0.5], [0.5, -0.5], [0.5, 0.5],
  [-0.5, -0.5], [0.5, 0.5], [-0.5, 0.5],
];

/// World-space edge length of a sprite so that it matches a size-attenuated
/// point of `size` under a perspective camera with vertical fov `fovy_deg`.
pub fn sprite_size(size: f32, fovy_deg: f32) -> f32 {
  size * (fovy_deg.to_radians() * 0.5).tan()
}

/// GPU copy of one generated galaxy.
pub struct PointBuffers {
  positions: wgpu::Buffer,
  colors: wgpu::Buffer,
  count: u32,
}

impl PointBuffers {
  pub fn upload(device: &wgpu::Device, cloud: &PointCloud) -> Self {
    let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Point Position Buffer"),
      contents: bytemuck::cast_slice(&cloud.positions),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Point Color Buffer"),
      contents: bytemuck::cast_slice(&cloud.colors),
      usage: wgpu::BufferUsages::VERTEX,
    });
    Self {
      positions,
      colors,
      count: cloud.len() as u32,
    }
  }

  pub fn count(&self) -> u32 {
    self.count
  }
}

impl Release for PointBuffers {
  fn release(&mut self) {
    self.positions.destroy();
    self.colors.destroy();
  }
}

pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  corners_buffer: wgpu::Buffer,
  material_buffer: wgpu::Buffer,
  material_bind_group: wgpu::BindGroup,
  points: ResourceSlot<PointBuffers>,
  fovy: f32,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    fovy: f32,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("points"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/points.wgsl"))),
    });

    let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Material Buffer"),
      contents: bytemuck::cast_slice(&[MaterialUniform { size: [0.0; 4] }]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let material_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<MaterialUniform>() as _),
          },
          count: None,
        }],
        label: Some("material_bind_group_layout"),
      });
    let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &material_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: material_buffer.as_entire_binding(),
      }],
      label: Some("material_bind_group"),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[camera_bind_group_layout, &material_bind_group_layout],
      push_constant_ranges: &[],
    });
    let position_buffer = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
    let color_buffer = wgpu::VertexBufferLayout {
      array_stride: 3 * 4,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![1 => Float32x3],
    };
    let corner_buffer = wgpu::VertexBufferLayout {
      array_stride: 2 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![2 => Float32x2],
    };
    let additive = wgpu::BlendComponent {
      src_factor: wgpu::BlendFactor::SrcAlpha,
      dst_factor: wgpu::BlendFactor::One,
      operation: wgpu::BlendOperation::Add,
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Point Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[position_buffer, color_buffer, corner_buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format: config.view_formats[0],
          blend: Some(wgpu::BlendState {
            color: additive,
            alpha: additive,
          }),
          write_mask: wgpu::ColorWrites::ALL,
        })],
      }),
      primitive: wgpu::PrimitiveState::default(),
      // points blend into each other, nothing is depth sorted
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let corners_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Corner Buffer"),
      contents: bytemuck::cast_slice(&QUAD_CORNERS),
      usage: wgpu::BufferUsages::VERTEX,
    });

    Render {
      render_pipeline,
      corners_buffer,
      material_buffer,
      material_bind_group,
      points: ResourceSlot::new(),
      fovy,
    }
  }

  /// Swaps in a freshly generated galaxy; the previous GPU buffers are
  /// destroyed first.
  pub fn upload(
    &mut self,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cloud: &PointCloud,
    params: &GalaxyParameters,
  ) {
    let material = MaterialUniform {
      size: [sprite_size(params.size, self.fovy), 0.0, 0.0, 0.0],
    };
    queue.write_buffer(&self.material_buffer, 0, bytemuck::cast_slice(&[material]));

    if cloud.is_empty() {
      self.points.clear();
      return;
    }
    let buffers = self.points.replace(|| PointBuffers::upload(device, cloud));
    log::debug!("uploaded {} points", buffers.count());
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      if let Some(points) = self.points.get() {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_bind_group(1, &self.material_bind_group, &[]);
        rpass.set_vertex_buffer(0, points.positions.slice(..));
        rpass.set_vertex_buffer(1, points.colors.slice(..));
        rpass.set_vertex_buffer(2, self.corners_buffer.slice(..));
        rpass.draw(0..QUAD_CORNERS.len() as u32, 0..points.count);
      }
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
