use crate::initialize::PointCloud;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the cloud as binary little-endian PLY: float `x y z`, uchar `red green blue`.
pub fn write_ply<W: Write>(out: &mut W, cloud: &PointCloud) -> Result<()> {
  write!(
    out,
    "ply\n\
     format binary_little_endian 1.0\n\
     comment galaxy-gen point cloud\n\
     element vertex {}\n\
     property float x\n\
     property float y\n\
     property float z\n\
     property uchar red\n\
     property uchar green\n\
     property uchar blue\n\
     end_header\n",
    cloud.len()
  )?;

  for i in 0..cloud.len() {
    for v in cloud.position(i) {
      out.write_all(&v.to_le_bytes())?;
    }
    out.write_all(&cloud.color(i).to_srgb8())?;
  }
  Ok(())
}

pub fn save_ply(path: &Path, cloud: &PointCloud) -> Result<()> {
  let file =
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
  let mut out = BufWriter::new(file);
  write_ply(&mut out, cloud).with_context(|| format!("Failed to write {}", path.display()))?;
  out
    .flush()
    .with_context(|| format!("Failed to flush {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ply_has_header_and_fixed_size_records() {
    let cloud = PointCloud {
      positions: vec![1.0, 2.0, 3.0, -1.0, 0.0, 0.5],
      colors: vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    };
    let mut bytes = Vec::new();
    write_ply(&mut bytes, &cloud).unwrap();

    let marker = b"end_header\n";
    let header_end = bytes
      .windows(marker.len())
      .position(|w| w == marker)
      .unwrap()
      + marker.len();
    let header = std::str::from_utf8(&bytes[..header_end]).unwrap();
    assert!(header.starts_with("ply\nformat binary_little_endian 1.0\n"));
    assert!(header.contains("element vertex 2\n"));

    let body = &bytes[header_end..];
    assert_eq!(body.len(), 2 * 15);
    assert_eq!(f32::from_le_bytes(body[0..4].try_into().unwrap()), 1.0);
    assert_eq!(f32::from_le_bytes(body[8..12].try_into().unwrap()), 3.0);
    assert_eq!(&body[12..15], &[255, 0, 0]);
    assert_eq!(f32::from_le_bytes(body[15..19].try_into().unwrap()), -1.0);
    assert_eq!(&body[27..30], &[0, 0, 255]);
  }

  #[test]
  fn empty_cloud_writes_only_a_header() {
    let mut bytes = Vec::new();
    write_ply(&mut bytes, &PointCloud::default()).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("element vertex 0\n"));
    assert!(text.ends_with("end_header\n"));
  }
}
