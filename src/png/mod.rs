#![forbid(unsafe_code)]

//! The PNG container around the zlib stream.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! A PNG is an 8 byte signature followed by "chunks". Each chunk is a
//! big-endian length, a 4 byte type, that many bytes of data, and a CRC-32 of
//! the type and data. The image's pixels are a single zlib stream split
//! across one or more consecutive `IDAT` chunks.
//!
//! Only as much of the format as recoding needs is understood here:
//! * Every chunk's CRC is checked.
//! * The ordering rules for the critical chunks are enforced, along with the
//!   at-most-once rule of the standard ancillary chunks.
//! * `IHDR` is parsed, and checked against `tRNS`. `hIST` is checked
//!   against `PLTE`. Everything else is carried along as opaque bytes.
//!
//! Pixel data is never unfiltered or de-interlaced.

use super::*;

mod chunk;
pub use chunk::*;

mod ihdr;
pub use ihdr::*;

mod rules;
use rules::*;

use core::ops::Range;

/// The first 8 bytes of every PNG.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Largest chunk payload the format allows.
pub const PNG_MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// A PNG that passed every container check, borrowing the file's bytes.
#[derive(Debug, Clone)]
pub struct Png<'b> {
  ihdr: IHDR,
  chunks: Vec<RawPngChunk<'b>>,
  idat: Range<usize>,
}
impl<'b> Png<'b> {
  /// Splits the file into chunks and checks them.
  ///
  /// Fails on the first problem found: the signature, a truncated chunk, a
  /// CRC mismatch, or a chunk breaking the ordering rules.
  pub fn parse(bytes: &'b [u8]) -> PngResult<Self> {
    if !is_png_header_correct(bytes) {
      return Err(PngError::BadSignature);
    }
    let mut rules = ChunkRules::default();
    let mut chunks = Vec::new();
    for chunk in PngChunkIter::new(bytes) {
      let chunk = chunk?;
      chunk.check_crc()?;
      rules.see(chunk.ty)?;
      chunks.push(chunk);
    }
    let idat = rules.finish()?;
    let ihdr = IHDR::try_from(chunks[0].data)?;
    check_ancillary(&ihdr, &chunks)?;
    debug!(chunks = chunks.len(), idat_chunks = idat.len(), ?ihdr, "parsed PNG");
    Ok(Self { ihdr, chunks, idat })
  }

  #[inline]
  #[must_use]
  pub const fn ihdr(&self) -> &IHDR {
    &self.ihdr
  }

  /// Every chunk, in file order.
  #[inline]
  #[must_use]
  pub fn chunks(&self) -> &[RawPngChunk<'b>] {
    &self.chunks
  }

  /// The `IDAT` chunks, in file order.
  #[inline]
  #[must_use]
  pub fn idat_chunks(&self) -> &[RawPngChunk<'b>] {
    &self.chunks[self.idat.clone()]
  }

  /// All the `IDAT` payloads joined into the one zlib stream they form.
  #[must_use]
  pub fn idat_stream(&self) -> Vec<u8> {
    let idat = self.idat_chunks();
    let mut out = Vec::with_capacity(idat.iter().map(|c| c.data.len()).sum());
    for chunk in idat {
      out.extend_from_slice(chunk.data);
    }
    out
  }

  /// Writes the PNG back out with the `IDAT` run replaced by one `IDAT` chunk
  /// per payload.
  ///
  /// Every other chunk keeps its place, data, and CRC.
  #[must_use]
  pub fn write_with_idat(&self, payloads: &[&[u8]]) -> Vec<u8> {
    let kept: usize = self.chunks.iter().map(RawPngChunk::framed_len).sum();
    let new: usize = payloads.iter().map(|p| 12 + p.len()).sum();
    let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + kept + new);
    out.extend_from_slice(&PNG_SIGNATURE);
    let write_raw = |out: &mut Vec<u8>, chunk: &RawPngChunk<'_>| {
      out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
      out.extend_from_slice(chunk.ty.as_bytes());
      out.extend_from_slice(chunk.data);
      out.extend_from_slice(&chunk.declared_crc.to_be_bytes());
    };
    for chunk in &self.chunks[..self.idat.start] {
      write_raw(&mut out, chunk);
    }
    for payload in payloads {
      write_chunk(&mut out, PngChunkTy::IDAT, payload);
    }
    for chunk in &self.chunks[self.idat.end..] {
      write_raw(&mut out, chunk);
    }
    debug!(idat_chunks = payloads.len(), len = out.len(), "wrote PNG");
    out
  }
}

/// A recoded PNG file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecodedPng {
  /// The complete new file.
  pub bytes: Vec<u8>,
  pub ihdr: IHDR,
  pub idat_chunks_in: usize,
  pub idat_chunks_out: usize,
  pub report: RecodeReport,
}

/// Recodes the image data of a PNG file as stored DEFLATE blocks.
pub fn recode_png(bytes: &[u8], options: &RecodeOptions) -> PngResult<RecodedPng> {
  if options.idat_chunk_limit.get() > PNG_MAX_CHUNK_LEN {
    return Err(PngError::ChunkTooLarge { limit: options.idat_chunk_limit.get() });
  }
  let png = Png::parse(bytes)?;
  let stream = png.idat_stream();
  let (stored, report) = recode_zlib(&stream, options)?;
  if let Some(expected) = png.ihdr().filtered_len() {
    if expected != report.decoded_len {
      warn!(expected, decoded = report.decoded_len, "decoded size doesn't match IHDR");
    }
  }
  let payloads = split_payload(&stored, options.idat_chunk_limit);
  let out = png.write_with_idat(&payloads);
  Ok(RecodedPng {
    bytes: out,
    ihdr: *png.ihdr(),
    idat_chunks_in: png.idat_chunks().len(),
    idat_chunks_out: payloads.len(),
    report,
  })
}

#[cfg(test)]
fn tiny_png(idat: &[&[u8]], extra: &[(PngChunkTy, &[u8])]) -> Vec<u8> {
  let mut png = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut png, PngChunkTy::IHDR, &[0, 0, 0, 24, 0, 0, 0, 8, 8, 0, 0, 0, 0]);
  for (ty, data) in extra {
    write_chunk(&mut png, *ty, data);
  }
  for part in idat {
    write_chunk(&mut png, PngChunkTy::IDAT, part);
  }
  write_chunk(&mut png, PngChunkTy::IEND, &[]);
  png
}

#[test]
fn test_parse_and_rewrite() {
  let stream = crate::zlib::DYNAMIC_NOISE_ZLIB;
  let text = PngChunkTy(*b"tEXt");
  let bytes = tiny_png(&[&stream[..20], &stream[20..]], &[(text, b"Comment\0hi".as_slice())]);
  let png = Png::parse(&bytes).unwrap();
  assert_eq!(png.ihdr().width, 24);
  assert_eq!(png.chunks().len(), 5);
  assert_eq!(png.idat_chunks().len(), 2);
  assert_eq!(png.idat_stream(), stream);

  // writing the same payloads back gives the same file
  let same = png.write_with_idat(&[&stream[..20], &stream[20..]]);
  assert_eq!(same, bytes);

  let one = png.write_with_idat(&[&stream[..]]);
  let reparsed = Png::parse(&one).unwrap();
  assert_eq!(reparsed.idat_chunks().len(), 1);
  assert_eq!(reparsed.chunks()[1].ty, text);
  assert_eq!(reparsed.idat_stream(), stream);
}

#[test]
fn test_recode_png() {
  let stream = crate::zlib::DYNAMIC_NOISE_ZLIB;
  let bytes = tiny_png(&[&stream[..]], &[]);
  let options = RecodeOptions::default()
    .with_stored_block_limit(NonZeroU16::new(64).unwrap())
    .with_idat_chunk_limit(NonZeroU32::new(100).unwrap());
  let recoded = recode_png(&bytes, &options).unwrap();
  assert_eq!(recoded.idat_chunks_in, 1);
  // 2 + 4 * 5 + 200 + 4 stream bytes
  assert_eq!(recoded.report.stored_len, 226);
  assert_eq!(recoded.idat_chunks_out, 3);

  let png = Png::parse(&recoded.bytes).unwrap();
  assert!(png.idat_chunks().iter().all(|c| c.data.len() <= 100));
  let inflated = inflate_zlib(&png.idat_stream()).unwrap();
  assert_eq!(inflated.blocks.stored, 4);
  assert_eq!(inflated.data, inflate_zlib(&stream).unwrap().data);
}

#[test]
fn test_recode_png_errors() {
  let options = RecodeOptions::default();
  assert_eq!(recode_png(b"GIF89a", &options).unwrap_err(), PngError::BadSignature);

  let huge = options.with_idat_chunk_limit(NonZeroU32::new(0x8000_0000).unwrap());
  assert_eq!(
    recode_png(&tiny_png(&[b"".as_slice()], &[]), &huge).unwrap_err(),
    PngError::ChunkTooLarge { limit: 0x8000_0000 }
  );

  // an IDAT that isn't a zlib stream
  assert_eq!(
    recode_png(&tiny_png(&[b"\x78\x9D\x00\x00\x00\x00".as_slice()], &[]), &options).unwrap_err(),
    PngError::Inflate(InflateError::BadZlibHeader { cmf: 0x78, flg: 0x9D })
  );

  // a 2 entry palette with a 5 entry histogram
  let stream = crate::zlib::DYNAMIC_NOISE_ZLIB;
  let hist = tiny_png(
    &[stream.as_slice()],
    &[(PngChunkTy::PLTE, [0_u8; 6].as_slice()), (PngChunkTy::hIST, [0_u8; 10].as_slice())],
  );
  assert_eq!(
    recode_png(&hist, &options).unwrap_err(),
    PngError::HistLenMismatch { hist: 5, palette: 2 }
  );

  // tRNS on an RGBA image
  let mut rgba = Vec::from(PNG_SIGNATURE);
  write_chunk(&mut rgba, PngChunkTy::IHDR, &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
  write_chunk(&mut rgba, PngChunkTy::tRNS, &[0, 0]);
  write_chunk(&mut rgba, PngChunkTy::IDAT, &stream);
  write_chunk(&mut rgba, PngChunkTy::IEND, &[]);
  assert_eq!(
    recode_png(&rgba, &options).unwrap_err(),
    PngError::TrnsNotAllowed(PngColorType::RGBA)
  );

  let mut bad_crc = tiny_png(&[crate::zlib::DYNAMIC_NOISE_ZLIB.as_slice()], &[]);
  // the last byte of the IHDR CRC
  bad_crc[8 + 8 + 13 + 3] ^= 0x10;
  assert!(matches!(
    recode_png(&bad_crc, &options),
    Err(PngError::ChunkCrcMismatch { ty: PngChunkTy::IHDR, .. })
  ));
}
