pub mod camera;
pub mod color;
pub mod controls;
pub mod export;
pub mod gui;
pub mod initialize;
pub mod render;
pub mod resource;
pub mod state;

pub use color::Color;

/// Everything the point generator reads. Owned by the application state and
/// edited in place by the parameter panel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GalaxyParameters {
  pub count: u32,
  pub size: f32,
  pub radius: f32,
  pub branches: u32,
  /// Extra rotation in radians per unit of radius.
  pub spin: f32,
  /// Maximum jitter on each axis.
  pub randomness: f32,
  /// Exponent applied to the jitter draw, higher keeps points closer to the arm.
  pub randomness_power: f32,
  pub inside_color: Color,
  pub outside_color: Color,
}

impl Default for GalaxyParameters {
  fn default() -> Self {
    Self {
      count: 100_000,
      size: 0.01,
      radius: 5.0,
      branches: 3,
      spin: 1.0,
      randomness: 0.2,
      randomness_power: 3.0,
      // #ff6030
      inside_color: Color::from_srgb8([0xff, 0x60, 0x30]),
      // #1b3984
      outside_color: Color::from_srgb8([0x1b, 0x39, 0x84]),
    }
  }
}

pub struct CameraParams {
  pub fovy: f32,
  pub zoom_speed: f32,
  pub rotational_speed: f32,
  /// Fraction of orbit velocity lost every frame.
  pub damping: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      fovy: 75.0,
      zoom_speed: 0.005,
      rotational_speed: 0.003,
      damping: 0.1,
    }
  }
}
