use super::*;

use bytemuck::{Pod, Zeroable};

/// Most bytes a stored block can hold (`LEN` is a `u16`).
pub const MAX_STORED_BLOCK_LEN: usize = u16::MAX as usize;

/// The header of a stored block, once it's been byte aligned.
///
/// The `BFINAL` bit and the `00` block type share the first byte, the rest of
/// that byte is padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct StoredBlockHeader {
  pub bfinal: u8,
  pub len: [u8; 2],
  pub nlen: [u8; 2],
}
impl StoredBlockHeader {
  #[inline]
  #[must_use]
  pub const fn new(is_final: bool, len: u16) -> Self {
    Self { bfinal: is_final as u8, len: len.to_le_bytes(), nlen: (!len).to_le_bytes() }
  }
}

/// Frames `decoded` as a zlib stream made only of stored blocks.
///
/// * `zlib_header` goes in front unchanged.
/// * `decoded.len() / block_limit` full blocks come first, all non-final.
/// * Then one final block with whatever is left over, which can be empty.
/// * The big-endian Adler-32 of all of `decoded` goes last.
#[must_use]
pub fn repack_stored(zlib_header: [u8; 2], decoded: &[u8], block_limit: NonZeroU16) -> Vec<u8> {
  let limit = usize::from(block_limit.get());
  let full_blocks = decoded.len() / limit;
  let header_size = core::mem::size_of::<StoredBlockHeader>();
  let mut out = Vec::with_capacity(2 + (full_blocks + 1) * header_size + decoded.len() + 4);
  out.extend_from_slice(&zlib_header);

  let (full, remainder) = decoded.split_at(full_blocks * limit);
  for block in full.chunks_exact(limit) {
    let header = StoredBlockHeader::new(false, block.len() as u16);
    out.extend_from_slice(bytemuck::bytes_of(&header));
    out.extend_from_slice(block);
  }
  let header = StoredBlockHeader::new(true, remainder.len() as u16);
  out.extend_from_slice(bytemuck::bytes_of(&header));
  out.extend_from_slice(remainder);

  out.extend_from_slice(&adler32(decoded).to_be_bytes());
  debug!(decoded = decoded.len(), blocks = full_blocks + 1, stream = out.len(), "repacked as stored");
  out
}

/// Cuts a stream into consecutive payloads of at most `chunk_limit` bytes.
///
/// An empty stream gives no payloads at all.
#[must_use]
pub fn split_payload(stream: &[u8], chunk_limit: NonZeroU32) -> Vec<&[u8]> {
  stream.chunks(chunk_limit.get() as usize).collect()
}

#[cfg(test)]
fn nz16(n: u16) -> NonZeroU16 {
  NonZeroU16::new(n).unwrap()
}

#[test]
fn test_stored_header_layout() {
  let header = StoredBlockHeader::new(true, 0x1234);
  assert_eq!(bytemuck::bytes_of(&header), &[1, 0x34, 0x12, 0xCB, 0xED]);
  let header = StoredBlockHeader::new(false, 0);
  assert_eq!(bytemuck::bytes_of(&header), &[0, 0, 0, 0xFF, 0xFF]);
}

#[test]
fn test_repack_empty_input() {
  let stream = repack_stored([0x78, 0x01], &[], nz16(65500));
  assert_eq!(stream, [0x78, 0x01, 1, 0, 0, 0xFF, 0xFF, 0, 0, 0, 1]);
  let inflated = inflate_zlib(&stream).unwrap();
  assert!(inflated.data.is_empty());
  assert!(inflated.checksum_matches());
}

#[test]
fn test_repack_is_idempotent() {
  let inflated = inflate_zlib(&crate::zlib::DYNAMIC_NOISE_ZLIB).unwrap();
  let once = repack_stored(inflated.header.to_bytes(), &inflated.data, nz16(64));
  let reinflated = inflate_zlib(&once).unwrap();
  assert_eq!(reinflated.data, inflated.data);
  assert!(reinflated.checksum_matches());
  // 200 bytes at 64 per block: three full blocks, then 8 bytes
  assert_eq!(reinflated.blocks, BlockStats { stored: 4, fixed: 0, dynamic: 0 });
  let twice = repack_stored(reinflated.header.to_bytes(), &reinflated.data, nz16(64));
  assert_eq!(once, twice);
}

#[test]
fn test_repack_block_boundaries() {
  // an exact multiple still gets a trailing empty final block
  let data = vec![0xA5_u8; 131000];
  let stream = repack_stored([0x78, 0x9C], &data, nz16(65500));
  assert_eq!(stream.len(), 2 + 3 * 5 + data.len() + 4);
  assert_eq!(&stream[2..7], &[0, 0xDC, 0xFF, 0x23, 0x00]);
  let last_header = 2 + 2 * (5 + 65500);
  assert_eq!(&stream[last_header..last_header + 5], &[1, 0, 0, 0xFF, 0xFF]);
  let inflated = inflate_zlib(&stream).unwrap();
  assert_eq!(inflated.data, data);
  assert_eq!(inflated.blocks.stored, 3);

  // one past the limit
  let data = vec![7_u8; 65501];
  let stream = repack_stored([0x78, 0x9C], &data, nz16(65500));
  let inflated = inflate_zlib(&stream).unwrap();
  assert_eq!(inflated.data, data);
  assert_eq!(inflated.blocks.stored, 2);

  // the format's own maximum works as a limit too
  let data = vec![1_u8; MAX_STORED_BLOCK_LEN + 1];
  let stream = repack_stored([0x78, 0x9C], &data, nz16(u16::MAX));
  assert_eq!(inflate_zlib(&stream).unwrap().data, data);
}

#[test]
fn test_split_payload() {
  let stream: Vec<u8> = (0..=255).collect();
  let limit = NonZeroU32::new(100).unwrap();
  let parts = split_payload(&stream, limit);
  assert_eq!(parts.len(), 3);
  assert_eq!(parts[0], &stream[..100]);
  assert_eq!(parts[2], &stream[200..]);
  assert_eq!(parts.concat(), stream);
  assert!(split_payload(&stream[..200], limit).iter().all(|p| p.len() == 100));
  assert!(split_payload(&[], limit).is_empty());
}
