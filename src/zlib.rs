//! The zlib wrapper around a DEFLATE stream (RFC 1950).
//!
//! ```txt
//! +-----+-----+================+---------------------+
//! | CMF | FLG | DEFLATE blocks | Adler-32 (big end.) |
//! +-----+-----+================+---------------------+
//! ```

use super::*;

/// Compression method 8, the only one zlib defines.
pub const ZLIB_METHOD_DEFLATE: u8 = 8;

/// The two byte zlib header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZlibHeader {
  pub cmf: u8,
  pub flg: u8,
}
impl ZlibHeader {
  /// Checks the method, the window size, and the check bits.
  pub fn parse(bytes: [u8; 2]) -> InflateResult<Self> {
    let [cmf, flg] = bytes;
    let check = (u16::from(cmf) << 8) | u16::from(flg);
    if cmf & 0x0F != ZLIB_METHOD_DEFLATE || cmf >> 4 > 7 || check % 31 != 0 {
      return Err(InflateError::BadZlibHeader { cmf, flg });
    }
    let header = Self { cmf, flg };
    if header.has_preset_dictionary() {
      return Err(InflateError::PresetDictionary);
    }
    Ok(header)
  }

  /// The LZ77 window the encoder used, in bytes.
  #[inline]
  #[must_use]
  pub const fn window_size(&self) -> usize {
    1 << ((self.cmf >> 4) + 8)
  }

  #[inline]
  #[must_use]
  pub const fn has_preset_dictionary(&self) -> bool {
    (self.flg & 0b0010_0000) != 0
  }

  /// The encoder's self-reported effort, 0 (fastest) through 3 (smallest).
  #[inline]
  #[must_use]
  pub const fn compression_level(&self) -> u8 {
    self.flg >> 6
  }

  #[inline]
  #[must_use]
  pub const fn to_bytes(self) -> [u8; 2] {
    [self.cmf, self.flg]
  }
}

/// The result of fully decoding a zlib stream.
///
/// The Adler-32 values aren't compared here, that's up to the caller's
/// policy. See [`Inflated::checksum_matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflated {
  pub header: ZlibHeader,
  pub data: Vec<u8>,
  /// The trailer's value.
  pub declared_adler: u32,
  /// The value of `data`.
  pub computed_adler: u32,
  pub blocks: BlockStats,
}
impl Inflated {
  #[inline]
  #[must_use]
  pub const fn checksum_matches(&self) -> bool {
    self.declared_adler == self.computed_adler
  }
}

/// Decodes a zlib stream.
///
/// The trailer is taken as the last 4 bytes of `stream`, and the DEFLATE
/// blocks as everything between the header and the trailer.
pub fn inflate_zlib(stream: &[u8]) -> InflateResult<Inflated> {
  if stream.len() < 6 {
    return Err(InflateError::ZlibTooShort { len: stream.len() });
  }
  let (head, rest) = try_split_off_byte_array::<2>(stream)
    .ok_or(InflateError::ZlibTooShort { len: stream.len() })?;
  let header = ZlibHeader::parse(head)?;
  let (deflate_bytes, trailer) = rest.split_at(rest.len() - 4);
  let (declared_adler, _) =
    try_split_off_u32_be(trailer).ok_or(InflateError::ZlibTooShort { len: stream.len() })?;

  let mut inflater = Inflater::new(deflate_bytes);
  inflater.run()?;
  let blocks = inflater.stats();
  let data = inflater.into_output();
  let computed_adler = adler32(&data);
  debug!(
    window = header.window_size(),
    level = header.compression_level(),
    decoded = data.len(),
    declared_adler,
    computed_adler,
    "inflated zlib stream"
  );
  Ok(Inflated { header, data, declared_adler, computed_adler, blocks })
}

#[test]
fn test_header_checks() {
  assert_eq!(ZlibHeader::parse([0x78, 0x9C]).unwrap().window_size(), 32 * 1024);
  assert_eq!(ZlibHeader::parse([0x78, 0xDA]).unwrap().compression_level(), 3);
  assert_eq!(ZlibHeader::parse([0x08, 0x1D]).unwrap().window_size(), 256);
  assert_eq!(
    ZlibHeader::parse([0x78, 0x9D]),
    Err(InflateError::BadZlibHeader { cmf: 0x78, flg: 0x9D })
  );
  // method 15 with valid check bits
  assert_eq!(
    ZlibHeader::parse([0x7F, 0x07]),
    Err(InflateError::BadZlibHeader { cmf: 0x7F, flg: 0x07 })
  );
  // a 64K window (CINFO = 8) with valid check bits
  assert_eq!(
    ZlibHeader::parse([0x88, 0x1C]),
    Err(InflateError::BadZlibHeader { cmf: 0x88, flg: 0x1C })
  );
  // FDICT set, check bits still fine
  assert_eq!(ZlibHeader::parse([0x78, 0xBB]), Err(InflateError::PresetDictionary));
}

#[cfg(test)]
pub(crate) const DYNAMIC_NOISE_ZLIB: [u8; 58] = [
  0x78, 0xDA, 0x95, 0x8E, 0xD1, 0x0E, 0x00, 0x50, 0x04, 0x42, 0xCF, 0xFF, 0xFF, 0xB4, 0x8B, 0x62,
  0x5E, 0x2F, 0x9B, 0xD2, 0xCA, 0x00, 0x91, 0x45, 0x14, 0x8A, 0x27, 0xD0, 0x8A, 0x98, 0x16, 0x89,
  0x47, 0xC3, 0xE6, 0xE6, 0xAD, 0xAA, 0x94, 0xB4, 0x79, 0xA2, 0x71, 0x7A, 0x00, 0x8F, 0x35, 0xF9,
  0xEE, 0x7E, 0xF0, 0xF5, 0xD5, 0x03, 0x3C, 0xA2, 0x62, 0x9E,
];

#[test]
fn test_inflate_zlib_dynamic_block() {
  let inflated = inflate_zlib(&DYNAMIC_NOISE_ZLIB).unwrap();
  assert_eq!(inflated.data.len(), 200);
  assert_eq!(inflated.declared_adler, 0x3CA2_629E);
  assert!(inflated.checksum_matches());
  assert_eq!(inflated.blocks, BlockStats { stored: 0, fixed: 0, dynamic: 1 });
  // 8 scanlines of 24 gray pixels, each led by its filter type byte
  for line in inflated.data.chunks(25) {
    assert_eq!(line[0], 0);
    assert!(line[1..].iter().all(|&px| px == 0x00 || px == 0xFF));
  }
}

#[test]
fn test_inflate_zlib_framing_errors() {
  assert_eq!(inflate_zlib(&[0x78, 0x9C, 0x03]), Err(InflateError::ZlibTooShort { len: 3 }));

  let mut bad_trailer = DYNAMIC_NOISE_ZLIB;
  bad_trailer[57] ^= 0xFF;
  let inflated = inflate_zlib(&bad_trailer).unwrap();
  assert!(!inflated.checksum_matches());
  assert_eq!(inflated.computed_adler, 0x3CA2_629E);
  assert_eq!(inflated.declared_adler, 0x3CA2_6261);
}
