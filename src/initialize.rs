use crate::{Color, GalaxyParameters};
use rand::Rng;
use std::f32::consts::TAU;

/// Flat per-point attribute arrays, three floats per point.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
  pub positions: Vec<f32>,
  pub colors: Vec<f32>,
}

impl PointCloud {
  pub fn len(&self) -> usize {
    self.positions.len() / 3
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn position(&self, i: usize) -> [f32; 3] {
    [
      self.positions[i * 3],
      self.positions[i * 3 + 1],
      self.positions[i * 3 + 2],
    ]
  }

  pub fn color(&self, i: usize) -> Color {
    Color::new(self.colors[i * 3], self.colors[i * 3 + 1], self.colors[i * 3 + 2])
  }

  /// Largest distance from the y axis, ignoring NaN points.
  pub fn max_planar_radius(&self) -> f32 {
    self
      .positions
      .chunks_exact(3)
      .map(|p| (p[0] * p[0] + p[2] * p[2]).sqrt())
      .filter(|r| !r.is_nan())
      .fold(0.0, f32::max)
  }

  /// Number of points with a NaN or infinite position or colour component.
  pub fn non_finite_count(&self) -> usize {
    self
      .positions
      .chunks_exact(3)
      .zip(self.colors.chunks_exact(3))
      .filter(|(p, c)| p.iter().chain(c.iter()).any(|v| !v.is_finite()))
      .count()
  }
}

/// Builds the whole galaxy from scratch.
///
/// Inputs are trusted: a zero radius produces NaN colours and zero branches
/// produce NaN positions, the same degenerate picture you would get on screen.
#[must_use]
pub fn generate<R: Rng + ?Sized>(params: &GalaxyParameters, rng: &mut R) -> PointCloud {
  let count = params.count as usize;
  let mut positions = Vec::with_capacity(count * 3);
  let mut colors = Vec::with_capacity(count * 3);

  for i in 0..params.count {
    // uniform in radius, so density piles up near the core
    let radius = rng.gen::<f32>() * params.radius;
    let spin_angle = radius * params.spin;
    let angle = branch_angle(i, params.branches) + spin_angle;

    let jitter_x = jitter(rng, params.randomness, params.randomness_power);
    let jitter_y = jitter(rng, params.randomness, params.randomness_power);
    let jitter_z = jitter(rng, params.randomness, params.randomness_power);

    positions.extend_from_slice(&[
      angle.cos() * radius + jitter_x,
      jitter_y,
      angle.sin() * radius + jitter_z,
    ]);

    let color = params
      .inside_color
      .lerp(params.outside_color, radius / params.radius);
    colors.extend_from_slice(&color.to_array());
  }

  PointCloud { positions, colors }
}

/// Angle of the arm point `i` belongs to; arms are evenly spaced.
pub fn branch_angle(i: u32, branches: u32) -> f32 {
  if branches == 0 {
    return f32::NAN;
  }
  (i % branches) as f32 / branches as f32 * TAU
}

/// Signed offset in `(-randomness, randomness)`, biased towards zero by `power`.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, randomness: f32, power: f32) -> f32 {
  let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
  rng.gen::<f32>().powf(power) * sign * randomness
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::SmallRng, SeedableRng};

  fn tight(count: u32) -> GalaxyParameters {
    GalaxyParameters {
      count,
      radius: 5.0,
      branches: 5,
      spin: 1.0,
      randomness: 0.0,
      randomness_power: 3.0,
      inside_color: Color::RED,
      outside_color: Color::BLUE,
      ..Default::default()
    }
  }

  #[test]
  fn array_lengths_follow_count() {
    let mut rng = SmallRng::seed_from_u64(7);
    for count in [0, 1, 100, 12_345] {
      let cloud = generate(&GalaxyParameters { count, ..Default::default() }, &mut rng);
      assert_eq!(cloud.positions.len(), count as usize * 3);
      assert_eq!(cloud.colors.len(), count as usize * 3);
      assert_eq!(cloud.len(), count as usize);
    }
  }

  #[test]
  fn branch_angle_repeats_every_branch_count() {
    for branches in 1..=20 {
      for i in 0..200 {
        assert_eq!(branch_angle(i, branches), branch_angle(i + branches, branches));
      }
    }
    assert_eq!(branch_angle(0, 4), 0.0);
    assert!((branch_angle(1, 4) - TAU / 4.0).abs() < 1e-6);
    assert!((branch_angle(3, 4) - 3.0 * TAU / 4.0).abs() < 1e-6);
  }

  #[test]
  fn zero_branches_degrade_to_nan_instead_of_panicking() {
    let mut rng = SmallRng::seed_from_u64(1);
    let params = GalaxyParameters { count: 10, branches: 0, ..Default::default() };
    let cloud = generate(&params, &mut rng);
    assert_eq!(cloud.len(), 10);
    assert!(cloud.positions.iter().any(|v| v.is_nan()));
  }

  #[test]
  fn zero_radius_gives_nan_colours() {
    let mut rng = SmallRng::seed_from_u64(1);
    let params = GalaxyParameters { count: 10, radius: 0.0, ..Default::default() };
    let cloud = generate(&params, &mut rng);
    assert!(cloud.colors.iter().all(|c| c.is_nan()));
    assert_eq!(cloud.non_finite_count(), 10);
  }

  #[test]
  fn summary_helpers_skip_degenerate_points() {
    let cloud = PointCloud {
      positions: vec![3.0, 9.0, 4.0, f32::NAN, 0.0, 0.0, 1.0, 0.0, 0.0],
      colors: vec![0.0; 9],
    };
    assert_eq!(cloud.max_planar_radius(), 5.0);
    assert_eq!(cloud.non_finite_count(), 1);
    assert_eq!(PointCloud::default().max_planar_radius(), 0.0);
  }

  #[test]
  fn without_jitter_points_stay_inside_the_disk() {
    let mut rng = SmallRng::seed_from_u64(3);
    let params = GalaxyParameters { randomness: 0.0, ..Default::default() };
    let cloud = generate(&params, &mut rng);
    for i in 0..cloud.len() {
      let [x, y, z] = cloud.position(i);
      assert_eq!(y, 0.0);
      assert!((x * x + z * z).sqrt() <= params.radius + 1e-4);
    }
  }

  #[test]
  fn jitter_is_bounded_and_symmetric() {
    let mut rng = SmallRng::seed_from_u64(11);
    let samples: Vec<f32> = (0..10_000).map(|_| jitter(&mut rng, 0.5, 3.0)).collect();
    assert!(samples.iter().all(|v| v.abs() < 0.5));
    let positive = samples.iter().filter(|v| **v > 0.0).count();
    assert!((4_000..6_000).contains(&positive), "positive = {positive}");
    assert_eq!(jitter(&mut rng, 0.0, 3.0), 0.0);
  }

  #[test]
  fn higher_power_pulls_jitter_towards_zero() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mean_abs = |rng: &mut SmallRng, power: f32| {
      (0..10_000).map(|_| jitter(rng, 1.0, power).abs()).sum::<f32>() / 10_000.0
    };
    let loose = mean_abs(&mut rng, 1.0);
    let tight = mean_abs(&mut rng, 8.0);
    // expectations are 1/2 and 1/9
    assert!(loose > 0.45 && loose < 0.55, "loose = {loose}");
    assert!(tight < 0.15, "tight = {tight}");
  }

  #[test]
  fn colour_follows_distance_from_centre() {
    let mut rng = SmallRng::seed_from_u64(9);
    let params = tight(2_000);
    let cloud = generate(&params, &mut rng);
    for i in 0..cloud.len() {
      let [x, _, z] = cloud.position(i);
      let t = (x * x + z * z).sqrt() / params.radius;
      let expected = Color::RED.lerp(Color::BLUE, t);
      let got = cloud.color(i);
      assert!((got.r - expected.r).abs() < 1e-3, "{got:?} vs {expected:?}");
      assert!((got.b - expected.b).abs() < 1e-3, "{got:?} vs {expected:?}");
      assert_eq!(got.g, 0.0);
    }
  }

  #[test]
  fn same_seed_same_galaxy() {
    let params = GalaxyParameters { count: 500, ..Default::default() };
    let a = generate(&params, &mut SmallRng::seed_from_u64(42));
    let b = generate(&params, &mut SmallRng::seed_from_u64(42));
    assert_eq!(a.positions, b.positions);
    assert_eq!(a.colors, b.colors);
  }
}
