use anyhow::{bail, Context};
use std::fmt;
use std::str::FromStr;

/// RGB colour in linear space. Hex strings are sRGB-encoded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Color {
  pub const RED: Color = Color::new(1.0, 0.0, 0.0);
  pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

  pub const fn new(r: f32, g: f32, b: f32) -> Self {
    Self { r, g, b }
  }

  /// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
  pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
      3 => digits.chars().flat_map(|c| [c, c]).collect(),
      6 => digits.to_string(),
      _ => bail!("expected a colour like #ff6030, got {hex:?}"),
    };
    let value =
      u32::from_str_radix(&expanded, 16).with_context(|| format!("invalid hex colour {hex:?}"))?;
    Ok(Self::from_srgb8([
      (value >> 16) as u8,
      (value >> 8) as u8,
      value as u8,
    ]))
  }

  pub fn from_srgb8(rgb: [u8; 3]) -> Self {
    Self {
      r: srgb_to_linear(f32::from(rgb[0]) / 255.0),
      g: srgb_to_linear(f32::from(rgb[1]) / 255.0),
      b: srgb_to_linear(f32::from(rgb[2]) / 255.0),
    }
  }

  pub fn to_srgb8(self) -> [u8; 3] {
    let encode = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
    [encode(self.r), encode(self.g), encode(self.b)]
  }

  pub fn to_hex(self) -> String {
    let [r, g, b] = self.to_srgb8();
    format!("#{r:02x}{g:02x}{b:02x}")
  }

  #[must_use]
  pub fn lerp(self, other: Color, t: f32) -> Color {
    Color {
      r: self.r + (other.r - self.r) * t,
      g: self.g + (other.g - self.g) * t,
      b: self.b + (other.b - self.b) * t,
    }
  }

  pub fn to_array(self) -> [f32; 3] {
    [self.r, self.g, self.b]
  }
}

impl FromStr for Color {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Color::from_hex(s)
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

fn srgb_to_linear(c: f32) -> f32 {
  if c < 0.04045 {
    c * 0.077_399_38
  } else {
    (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
  }
}

fn linear_to_srgb(c: f32) -> f32 {
  if c < 0.003_130_8 {
    c * 12.92
  } else {
    1.055 * c.powf(1.0 / 2.4) - 0.055
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: Color, b: Color) -> bool {
    (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
  }

  #[test]
  fn hex_parses_into_linear_space() {
    let c = Color::from_hex("#ff6030").unwrap();
    assert!((c.r - 1.0).abs() < 1e-4);
    // 0x60 / 255 is about 0.376 in sRGB, much darker once linearised
    assert!(c.g > 0.11 && c.g < 0.12, "g = {}", c.g);
    assert_eq!(c.to_hex(), "#ff6030");
  }

  #[test]
  fn short_form_and_missing_hash_are_accepted() {
    assert!(close("f00".parse::<Color>().unwrap(), Color::RED));
    assert!(close("#0000FF".parse::<Color>().unwrap(), Color::BLUE));
  }

  #[test]
  fn malformed_hex_is_rejected() {
    assert!(Color::from_hex("#12345").is_err());
    assert!(Color::from_hex("#gggggg").is_err());
    assert!(Color::from_hex("").is_err());
  }

  #[test]
  fn lerp_hits_both_endpoints() {
    assert_eq!(Color::RED.lerp(Color::BLUE, 0.0), Color::RED);
    assert_eq!(Color::RED.lerp(Color::BLUE, 1.0), Color::BLUE);
    let mid = Color::RED.lerp(Color::BLUE, 0.5);
    assert!(close(mid, Color::new(0.5, 0.0, 0.5)));
  }
}
