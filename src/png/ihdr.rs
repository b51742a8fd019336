use super::*;

use bytemuck::{Pod, Zeroable};

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(PngError::BadIHDR),
    })
  }
}

/// The `IHDR` payload exactly as it sits in the file.
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct IhdrBytes {
  width: [u8; 4],
  height: [u8; 4],
  bit_depth: u8,
  color_type: u8,
  compression_method: u8,
  filter_method: u8,
  interlace_method: u8,
}

/// Image Header
///
/// Only the fields that say how big the decoded stream should be are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced.
  pub is_interlaced: bool,
}
impl IHDR {
  /// Bits per pixel, all channels together.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes the decoded stream of a non-interlaced image holds: each line is a
  /// filter byte followed by the packed pixels.
  ///
  /// `None` for interlaced images.
  #[must_use]
  pub const fn filtered_len(&self) -> Option<usize> {
    if self.is_interlaced {
      return None;
    }
    if self.width == 0 {
      return Some(0);
    }
    let bits_per_line = self.bits_per_pixel().saturating_mul(self.width as usize);
    let bytes_per_filterline = 1 + bits_per_line.div_ceil(8);
    Some(bytes_per_filterline.saturating_mul(self.height as usize))
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  fn try_from(data: &[u8]) -> PngResult<Self> {
    let (raw, rest) = try_pull_pod::<IhdrBytes>(data).ok_or(PngError::BadIHDR)?;
    if !rest.is_empty() || raw.compression_method != 0 || raw.filter_method != 0 {
      return Err(PngError::BadIHDR);
    }
    let color_type = PngColorType::try_from(raw.color_type)?;
    let bit_depth = raw.bit_depth;
    let depth_ok = match color_type {
      PngColorType::Y => [1, 2, 4, 8, 16].contains(&bit_depth),
      PngColorType::Index => [1, 2, 4, 8].contains(&bit_depth),
      _ => [8, 16].contains(&bit_depth),
    };
    if !depth_ok {
      return Err(PngError::BadIHDR);
    }
    Ok(Self {
      width: u32::from_be_bytes(raw.width),
      height: u32::from_be_bytes(raw.height),
      bit_depth,
      color_type,
      is_interlaced: match raw.interlace_method {
        0 => false,
        1 => true,
        _ => return Err(PngError::BadIHDR),
      },
    })
  }
}

#[test]
fn test_ihdr_parse() {
  let data: [u8; 13] = [0, 0, 0, 24, 0, 0, 0, 8, 8, 0, 0, 0, 0];
  let ihdr = IHDR::try_from(&data[..]).unwrap();
  assert_eq!(ihdr.width, 24);
  assert_eq!(ihdr.height, 8);
  assert_eq!(ihdr.color_type, PngColorType::Y);
  assert_eq!(ihdr.filtered_len(), Some(200));

  let rgb1: [u8; 13] = [0, 0, 0, 3, 0, 0, 0, 2, 1, 3, 0, 0, 0];
  assert_eq!(IHDR::try_from(&rgb1[..]).unwrap().filtered_len(), Some(2 * 2));

  // too short, too long, bad depth for the color type, bad interlace method
  assert_eq!(IHDR::try_from(&data[..12]), Err(PngError::BadIHDR));
  assert_eq!(IHDR::try_from(&[0_u8; 14][..]), Err(PngError::BadIHDR));
  assert_eq!(IHDR::try_from(&[0_u8, 0, 0, 1, 0, 0, 0, 1, 4, 2, 0, 0, 0][..]), Err(PngError::BadIHDR));
  assert_eq!(IHDR::try_from(&[0_u8, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 2][..]), Err(PngError::BadIHDR));
}
