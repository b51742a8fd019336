//! CRC-32 as used by PNG chunks (and zlib, gzip, etc).
//!
//! Reflected polynomial `0xEDB88320`, register starts as all 1s and is
//! inverted at the end.

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// A running CRC-32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32 {
  register: u32,
}
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl Crc32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { register: u32::MAX }
  }

  #[inline]
  pub fn reset(&mut self) {
    *self = Self::new();
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      let i = (self.register ^ u32::from(byte)) as u8 as usize;
      self.register = CRC_TABLE[i] ^ (self.register >> 8);
    }
  }

  /// The finished checksum. The accumulator itself is unchanged, so more
  /// bytes can still be fed in afterwards.
  #[inline]
  #[must_use]
  pub const fn finalize(&self) -> u32 {
    self.register ^ u32::MAX
  }
}

/// CRC-32 of a single byte slice.
#[inline]
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(bytes);
  crc.finalize()
}

/// The CRC a PNG chunk stores: computed over the chunk type then the chunk
/// data, but not the length.
#[inline]
#[must_use]
pub fn png_chunk_crc(chunk_ty: [u8; 4], data: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(&chunk_ty);
  crc.update(data);
  crc.finalize()
}

#[test]
fn test_crc32_reference_values() {
  assert_eq!(crc32(b""), 0);
  assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
  assert_eq!(crc32(b"The quick brown fox jumps over the lazy dog"), 0x414F_A339);
}

#[test]
fn test_crc32_incremental_matches_one_shot() {
  let mut crc = Crc32::default();
  crc.update(b"1234");
  crc.update(b"");
  crc.update(b"56789");
  assert_eq!(crc.finalize(), 0xCBF4_3926);
  crc.reset();
  assert_eq!(crc.finalize(), 0);
}

#[test]
fn test_png_chunk_crc() {
  // every IEND chunk in every PNG ends with these bytes.
  assert_eq!(png_chunk_crc(*b"IEND", &[]), 0xAE42_6082);
}
