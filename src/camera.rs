use crate::CameraParams;
use cgmath::{InnerSpace, Point3, SquareMatrix, Vector3};
use std::f32::consts::FRAC_PI_2;
use winit::{
  event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 60.0;
// keeps the view from flipping over the poles
const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
const DRAG_SENSITIVITY: f32 = 0.005;

/// Perspective camera orbiting `target` on a sphere.
pub struct Camera {
  pub target: Point3<f32>,
  pub distance: f32,
  /// Angle around the y axis, radians.
  pub yaw: f32,
  /// Elevation above the xz plane, radians.
  pub pitch: f32,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  /// Looks at the origin from `eye`.
  pub fn looking_at_origin(eye: Point3<f32>, aspect: f32, fovy: f32) -> Self {
    let offset = eye - Point3::new(0.0, 0.0, 0.0);
    let distance = offset.magnitude();
    Self {
      target: Point3::new(0.0, 0.0, 0.0),
      distance,
      yaw: offset.z.atan2(offset.x),
      pitch: (offset.y / distance).asin(),
      aspect,
      fovy,
      znear: 0.1,
      zfar: 100.0,
    }
  }

  pub fn eye(&self) -> Point3<f32> {
    let horizontal = self.distance * self.pitch.cos();
    self.target
      + Vector3::new(
        horizontal * self.yaw.cos(),
        self.distance * self.pitch.sin(),
        horizontal * self.yaw.sin(),
      )
  }

  fn build_view_matrix(&self) -> cgmath::Matrix4<f32> {
    cgmath::Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
  }

  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * self.build_view_matrix()
  }

  /// Camera-space right and up axes in world coordinates, used to face sprites.
  fn billboard_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
    let forward = (self.target - self.eye()).normalize();
    let right = forward.cross(Vector3::unit_y()).normalize();
    let up = right.cross(forward);
    (right, up)
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
  right: [f32; 4],
  up: [f32; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
      right: [1.0, 0.0, 0.0, 0.0],
      up: [0.0, 1.0, 0.0, 0.0],
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
    let (right, up) = camera.billboard_axes();
    self.right = right.extend(0.0).into();
    self.up = up.extend(0.0).into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Orbit controls with damping: input adds angular and zoom velocity which
/// decays every frame.
pub struct CameraController {
  zoom_speed: f32,
  rotation_speed: f32,
  damping: f32,
  yaw_velocity: f32,
  pitch_velocity: f32,
  zoom_velocity: f32,
  is_zoom_in_pressed: bool,
  is_zoom_out_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
  is_dragging: bool,
  last_cursor: Option<(f64, f64)>,
}

impl CameraController {
  pub fn init(params: &CameraParams) -> Self {
    Self {
      zoom_speed: params.zoom_speed,
      rotation_speed: params.rotational_speed,
      damping: params.damping,
      yaw_velocity: 0.0,
      pitch_velocity: 0.0,
      zoom_velocity: 0.0,
      is_zoom_in_pressed: false,
      is_zoom_out_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
      is_dragging: false,
      last_cursor: None,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => {
        let is_pressed = *state == ElementState::Pressed;
        match keycode {
          KeyCode::KeyW | KeyCode::ArrowUp => {
            self.is_zoom_in_pressed = is_pressed;
            true
          }
          KeyCode::KeyS | KeyCode::ArrowDown => {
            self.is_zoom_out_pressed = is_pressed;
            true
          }
          KeyCode::KeyA | KeyCode::ArrowLeft => {
            self.is_left_pressed = is_pressed;
            true
          }
          KeyCode::KeyD | KeyCode::ArrowRight => {
            self.is_right_pressed = is_pressed;
            true
          }
          KeyCode::KeyQ => {
            self.is_rotate_up_pressed = is_pressed;
            true
          }
          KeyCode::KeyE => {
            self.is_rotate_down_pressed = is_pressed;
            true
          }
          _ => false,
        }
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.is_dragging = *state == ElementState::Pressed;
        true
      }
      WindowEvent::CursorMoved { position, .. } => {
        let current = (position.x, position.y);
        if let (true, Some(last)) = (self.is_dragging, self.last_cursor) {
          self.drag((current.0 - last.0) as f32, (current.1 - last.1) as f32);
        }
        self.last_cursor = Some(current);
        self.is_dragging
      }
      WindowEvent::MouseWheel { delta, .. } => {
        let lines = match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
        };
        self.zoom(lines);
        true
      }
      _ => false,
    }
  }

  /// Pixel drag turns into orbit velocity.
  pub fn drag(&mut self, dx: f32, dy: f32) {
    self.yaw_velocity += dx * DRAG_SENSITIVITY;
    self.pitch_velocity += dy * DRAG_SENSITIVITY;
  }

  /// Positive steps move closer.
  pub fn zoom(&mut self, steps: f32) {
    self.zoom_velocity -= steps * self.zoom_speed;
  }

  pub fn update_camera(&mut self, camera: &mut Camera) {
    if self.is_left_pressed {
      self.yaw_velocity -= self.rotation_speed;
    }
    if self.is_right_pressed {
      self.yaw_velocity += self.rotation_speed;
    }
    if self.is_rotate_up_pressed {
      self.pitch_velocity += self.rotation_speed;
    }
    if self.is_rotate_down_pressed {
      self.pitch_velocity -= self.rotation_speed;
    }
    if self.is_zoom_in_pressed {
      self.zoom_velocity -= self.zoom_speed;
    }
    if self.is_zoom_out_pressed {
      self.zoom_velocity += self.zoom_speed;
    }

    camera.yaw += self.yaw_velocity;
    camera.pitch = (camera.pitch + self.pitch_velocity).clamp(-MAX_PITCH, MAX_PITCH);
    camera.distance = (camera.distance * (1.0 + self.zoom_velocity)).clamp(MIN_DISTANCE, MAX_DISTANCE);

    let keep = 1.0 - self.damping.clamp(0.0, 1.0);
    self.yaw_velocity *= keep;
    self.pitch_velocity *= keep;
    self.zoom_velocity *= keep;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn approx(a: Point3<f32>, b: Point3<f32>) -> bool {
    (a - b).magnitude() < 1e-4
  }

  #[test]
  fn orbit_round_trips_the_starting_eye() {
    let camera = Camera::looking_at_origin(Point3::new(3.0, 3.0, 3.0), 1.5, 75.0);
    assert!(approx(camera.eye(), Point3::new(3.0, 3.0, 3.0)), "{:?}", camera.eye());
    assert!((camera.distance - 27.0_f32.sqrt()).abs() < 1e-5);
  }

  #[test]
  fn billboard_axes_are_orthonormal_and_face_the_camera() {
    let camera = Camera::looking_at_origin(Point3::new(3.0, 3.0, 3.0), 1.0, 75.0);
    let (right, up) = camera.billboard_axes();
    let forward = (camera.target - camera.eye()).normalize();
    assert!((right.magnitude() - 1.0).abs() < 1e-5);
    assert!((up.magnitude() - 1.0).abs() < 1e-5);
    assert!(right.dot(up).abs() < 1e-5);
    assert!(right.dot(forward).abs() < 1e-5);
    assert!(up.dot(forward).abs() < 1e-5);
    assert!(up.y > 0.0);
  }

  #[test]
  fn drag_rotates_then_settles() {
    let params = CameraParams::default();
    let mut controller = CameraController::init(&params);
    let mut camera = Camera::looking_at_origin(Point3::new(3.0, 3.0, 3.0), 1.0, params.fovy);
    let start_yaw = camera.yaw;
    controller.drag(100.0, 0.0);
    controller.update_camera(&mut camera);
    let after_one = camera.yaw - start_yaw;
    assert!(after_one > 0.0);
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    let settled = camera.yaw;
    controller.update_camera(&mut camera);
    assert!((camera.yaw - settled).abs() < 1e-6);
  }

  #[test]
  fn pitch_and_distance_stay_clamped() {
    let params = CameraParams::default();
    let mut controller = CameraController::init(&params);
    let mut camera = Camera::looking_at_origin(Point3::new(3.0, 3.0, 3.0), 1.0, params.fovy);
    controller.drag(0.0, 10_000.0);
    controller.zoom(1_000.0);
    for _ in 0..10 {
      controller.update_camera(&mut camera);
    }
    assert!(camera.pitch <= MAX_PITCH);
    assert!(camera.distance >= MIN_DISTANCE);
  }
}
