use super::*;

/// The four ASCII bytes naming a chunk's type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkTy(pub [u8; 4]);
#[allow(nonstandard_style)]
impl PngChunkTy {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const cHRM: Self = Self(*b"cHRM");
  pub const gAMA: Self = Self(*b"gAMA");
  pub const iCCP: Self = Self(*b"iCCP");
  pub const sBIT: Self = Self(*b"sBIT");
  pub const sRGB: Self = Self(*b"sRGB");
  pub const bKGD: Self = Self(*b"bKGD");
  pub const hIST: Self = Self(*b"hIST");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const pHYs: Self = Self(*b"pHYs");
  pub const tIME: Self = Self(*b"tIME");

  #[inline]
  #[must_use]
  pub const fn as_bytes(&self) -> &[u8; 4] {
    &self.0
  }

  /// Critical chunks have an uppercase first letter.
  #[inline]
  #[must_use]
  pub const fn is_critical(&self) -> bool {
    (self.0[0] & 0b0010_0000) == 0
  }
}
impl core::fmt::Debug for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Display::fmt(self, f)
  }
}
impl core::fmt::Display for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    use core::fmt::Write;
    for &b in self.0.iter() {
      f.write_char(if b.is_ascii_alphabetic() { b as char } else { '?' })?;
    }
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPngChunk<'b> {
  pub ty: PngChunkTy,
  pub data: &'b [u8],
  pub declared_crc: u32,
}
impl core::fmt::Debug for RawPngChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl RawPngChunk<'_> {
  /// The CRC-32 of the type and data, which should equal `declared_crc`.
  #[inline]
  #[must_use]
  pub fn compute_actual_crc(&self) -> u32 {
    png_chunk_crc(self.ty.0, self.data)
  }

  pub fn check_crc(&self) -> PngResult<()> {
    let actual = self.compute_actual_crc();
    if actual == self.declared_crc {
      Ok(())
    } else {
      Err(PngError::ChunkCrcMismatch { ty: self.ty, declared: self.declared_crc, actual })
    }
  }

  /// Bytes this chunk takes up in the file.
  #[inline]
  #[must_use]
  pub const fn framed_len(&self) -> usize {
    4 + 4 + self.data.len() + 4
  }
}

/// Iterates the chunks following the signature of a PNG.
///
/// Each chunk is only split off, the CRC isn't checked here. Once a chunk
/// fails to fit in the bytes left, that's an error and the iterator ends.
#[derive(Debug, Clone)]
pub struct PngChunkIter<'b> {
  spare: &'b [u8],
  offset: usize,
}
impl<'b> PngChunkIter<'b> {
  /// Pass the full PNG bytes, the signature is skipped without being checked.
  #[inline]
  #[must_use]
  pub fn new(png: &'b [u8]) -> Self {
    let skip = png.len().min(PNG_SIGNATURE.len());
    Self { spare: &png[skip..], offset: skip }
  }

  /// Offset within the PNG of the next chunk.
  #[inline]
  #[must_use]
  pub const fn offset(&self) -> usize {
    self.offset
  }

  fn pull(&mut self) -> Option<RawPngChunk<'b>> {
    let (len, rest) = try_split_off_u32_be(self.spare)?;
    let (ty, rest) = try_split_off_byte_array::<4>(rest)?;
    let len = usize::try_from(len).ok()?;
    if rest.len() < len {
      return None;
    }
    let (data, rest) = rest.split_at(len);
    let (declared_crc, rest) = try_split_off_u32_be(rest)?;
    self.spare = rest;
    Some(RawPngChunk { ty: PngChunkTy(ty), data, declared_crc })
  }
}
impl<'b> Iterator for PngChunkIter<'b> {
  type Item = PngResult<RawPngChunk<'b>>;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.spare.is_empty() {
      return None;
    }
    match self.pull() {
      Some(chunk) => {
        trace!(ty = %chunk.ty, len = chunk.data.len(), offset = self.offset, "read chunk");
        self.offset += chunk.framed_len();
        Some(Ok(chunk))
      }
      None => {
        self.spare = &[];
        Some(Err(PngError::UnexpectedEndOfInput { offset: self.offset }))
      }
    }
  }
}
impl core::iter::FusedIterator for PngChunkIter<'_> {}

/// Appends one framed chunk: length, type, data, CRC.
///
/// The data must be at most `2^31 - 1` bytes.
pub fn write_chunk(out: &mut Vec<u8>, ty: PngChunkTy, data: &[u8]) {
  debug_assert!(data.len() <= PNG_MAX_CHUNK_LEN as usize);
  out.reserve(12 + data.len());
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(ty.as_bytes());
  out.extend_from_slice(data);
  out.extend_from_slice(&png_chunk_crc(ty.0, data).to_be_bytes());
}

#[test]
fn test_chunk_ty_display() {
  assert_eq!(format!("{}", PngChunkTy::hIST), "hIST");
  assert_eq!(format!("{:?}", PngChunkTy([b'I', 0, b'A', 0xFF])), "I?A?");
  assert!(PngChunkTy::IDAT.is_critical());
  assert!(!PngChunkTy::tRNS.is_critical());
}

#[test]
fn test_write_then_iterate_chunks() {
  let mut png = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut png, PngChunkTy::IDAT, b"abc");
  write_chunk(&mut png, PngChunkTy::IEND, b"");
  // IEND's framing never changes
  assert_eq!(&png[png.len() - 12..], &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);

  let mut it = PngChunkIter::new(&png);
  let idat = it.next().unwrap().unwrap();
  assert_eq!(idat.ty, PngChunkTy::IDAT);
  assert_eq!(idat.data, b"abc");
  assert!(idat.check_crc().is_ok());
  assert_eq!(it.offset(), 8 + 15);
  let iend = it.next().unwrap().unwrap();
  assert_eq!(iend.ty, PngChunkTy::IEND);
  assert!(it.next().is_none());
}

#[test]
fn test_truncated_chunk_is_an_error() {
  let mut png = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut png, PngChunkTy::IDAT, b"abcdef");
  png.truncate(png.len() - 2);
  let mut it = PngChunkIter::new(&png);
  assert_eq!(it.next(), Some(Err(PngError::UnexpectedEndOfInput { offset: 8 })));
  assert!(it.next().is_none());
}

#[test]
fn test_crc_mismatch_reports_both_values() {
  let mut png = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut png, PngChunkTy::IEND, b"");
  let last = png.len() - 1;
  png[last] ^= 1;
  let chunk = PngChunkIter::new(&png).next().unwrap().unwrap();
  assert_eq!(
    chunk.check_crc(),
    Err(PngError::ChunkCrcMismatch { ty: PngChunkTy::IEND, declared: 0xAE42_6083, actual: 0xAE42_6082 })
  );
}
