//! Adler-32, the checksum trailing every zlib stream.

/// Largest prime smaller than 65536.
const BASE: u32 = 65521;

/// Largest `n` such that `255 * n * (n + 1) / 2 + (n + 1) * (BASE - 1)`
/// still fits in a `u32`, so the sums only need reducing once per `NMAX`
/// bytes.
const NMAX: usize = 5552;

/// A running Adler-32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Adler32 {
  s1: u32,
  s2: u32,
}
impl Default for Adler32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl Adler32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { s1: 1, s2: 0 }
  }

  #[inline]
  pub fn reset(&mut self) {
    *self = Self::new();
  }

  pub fn update(&mut self, bytes: &[u8]) {
    let Self { mut s1, mut s2 } = *self;
    for run in bytes.chunks(NMAX) {
      for &byte in run {
        s1 += u32::from(byte);
        s2 += s1;
      }
      s1 %= BASE;
      s2 %= BASE;
    }
    *self = Self { s1, s2 };
  }

  #[inline]
  #[must_use]
  pub const fn finalize(&self) -> u32 {
    (self.s2 << 16) | self.s1
  }
}

/// Adler-32 of a single byte slice.
#[inline]
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  let mut adler = Adler32::new();
  adler.update(bytes);
  adler.finalize()
}

#[test]
fn test_adler32_reference_values() {
  assert_eq!(adler32(b""), 1);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
  assert_eq!(adler32(b"a"), 0x0062_0062);
}

#[test]
fn test_adler32_long_runs_stay_reduced() {
  // 0xFF is the worst case for the unreduced sums.
  let bytes = vec![0xFF_u8; NMAX * 3 + 17];
  let mut slow_s1 = 1_u32;
  let mut slow_s2 = 0_u32;
  for &b in bytes.iter() {
    slow_s1 = (slow_s1 + u32::from(b)) % BASE;
    slow_s2 = (slow_s2 + slow_s1) % BASE;
  }
  assert_eq!(adler32(&bytes), (slow_s2 << 16) | slow_s1);

  let mut split = Adler32::default();
  let (a, b) = bytes.split_at(1000);
  split.update(a);
  split.update(b);
  assert_eq!(split.finalize(), adler32(&bytes));
}
