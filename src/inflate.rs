use super::*;

/// The three kinds of DEFLATE block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
  /// `BTYPE = 00`, raw bytes.
  Stored,
  /// `BTYPE = 01`, Huffman coded with the fixed tables.
  StaticHuffman,
  /// `BTYPE = 10`, Huffman coded with tables sent in the block header.
  DynamicHuffman,
}
impl TryFrom<u32> for BlockKind {
  type Error = InflateError;
  #[inline]
  fn try_from(btype: u32) -> InflateResult<Self> {
    Ok(match btype {
      0 => BlockKind::Stored,
      1 => BlockKind::StaticHuffman,
      2 => BlockKind::DynamicHuffman,
      _ => return Err(InflateError::ReservedBlockType),
    })
  }
}

/// The 3 bits at the start of every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHeader {
  pub is_final: bool,
  pub kind: BlockKind,
}

/// How many blocks of each kind a stream held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockStats {
  pub stored: usize,
  pub fixed: usize,
  pub dynamic: usize,
}
impl BlockStats {
  #[inline]
  #[must_use]
  pub const fn total(&self) -> usize {
    self.stored + self.fixed + self.dynamic
  }

  #[inline]
  fn count(&mut self, kind: BlockKind) {
    match kind {
      BlockKind::Stored => self.stored += 1,
      BlockKind::StaticHuffman => self.fixed += 1,
      BlockKind::DynamicHuffman => self.dynamic += 1,
    }
  }
}

/// Decodes one raw DEFLATE stream, block by block.
///
/// The output buffer doubles as the LZ77 window, back-references can reach
/// anywhere into what was decoded so far.
#[derive(Debug, Clone)]
pub struct Inflater<'b> {
  cursor: BitCursor<'b>,
  out: Vec<u8>,
  stats: BlockStats,
  done: bool,
}
impl<'b> Inflater<'b> {
  #[inline]
  #[must_use]
  pub fn new(deflate_bytes: &'b [u8]) -> Self {
    Self { cursor: BitCursor::new(deflate_bytes), out: Vec::new(), stats: BlockStats::default(), done: false }
  }

  /// If the final block has been decoded.
  #[inline]
  #[must_use]
  pub const fn is_done(&self) -> bool {
    self.done
  }

  #[inline]
  #[must_use]
  pub const fn stats(&self) -> BlockStats {
    self.stats
  }

  /// Everything decoded so far.
  #[inline]
  #[must_use]
  pub fn output(&self) -> &[u8] {
    &self.out
  }

  #[inline]
  #[must_use]
  pub fn into_output(self) -> Vec<u8> {
    self.out
  }

  /// Bit position of the cursor within the DEFLATE bytes.
  #[inline]
  #[must_use]
  pub const fn bit_position(&self) -> usize {
    self.cursor.position()
  }

  fn read_block_header(&mut self) -> InflateResult<BlockHeader> {
    let is_final = self.cursor.get_bfinal()?;
    let kind = BlockKind::try_from(self.cursor.get_btype()?)?;
    Ok(BlockHeader { is_final, kind })
  }

  /// Decodes the next block, appending to the output.
  ///
  /// Returns the header of the block that was decoded. Calling this after the
  /// final block does nothing and gives `None`.
  pub fn inflate_block(&mut self) -> InflateResult<Option<BlockHeader>> {
    if self.done {
      return Ok(None);
    }
    let header = self.read_block_header()?;
    let start = self.out.len();
    match header.kind {
      BlockKind::Stored => self.stored_block()?,
      BlockKind::StaticHuffman => self.huffman_block(&FIXED_LIT_LEN, &FIXED_DIST)?,
      BlockKind::DynamicHuffman => {
        let (lit_len, dist) = read_dynamic_tables(&mut self.cursor)?;
        self.huffman_block(&lit_len, &dist)?
      }
    }
    self.stats.count(header.kind);
    self.done = header.is_final;
    debug!(
      kind = ?header.kind,
      is_final = header.is_final,
      decoded = self.out.len() - start,
      "inflated block"
    );
    Ok(Some(header))
  }

  /// Decodes blocks until the final one.
  pub fn run(&mut self) -> InflateResult<()> {
    while self.inflate_block()?.is_some() {}
    Ok(())
  }

  fn stored_block(&mut self) -> InflateResult<()> {
    self.cursor.align_to_byte();
    let len = self.cursor.next_reversed_u16()?;
    let nlen = self.cursor.next_reversed_u16()?;
    if nlen != !len {
      return Err(InflateError::StoredLengthMismatch { len, nlen });
    }
    let bytes = self.cursor.take_aligned_bytes(usize::from(len))?;
    self.out.extend_from_slice(bytes);
    Ok(())
  }

  fn huffman_block(&mut self, lit_len: &HuffmanTable, dist: &HuffmanTable) -> InflateResult<()> {
    loop {
      match HuffSymbol::pull(&mut self.cursor, lit_len, dist)? {
        HuffSymbol::Literal(byte) => self.out.push(byte),
        HuffSymbol::EndOfBlock => return Ok(()),
        HuffSymbol::BackRef { len, dist } => {
          let available = self.out.len();
          if dist > available {
            return Err(InflateError::DistanceTooFar { distance: dist, available });
          }
          // the source range can run into the bytes this copy is writing, so
          // it has to go one byte at a time.
          self.out.reserve(len);
          let mut from = available - dist;
          for _ in 0..len {
            let byte = self.out[from];
            self.out.push(byte);
            from += 1;
          }
        }
      }
    }
  }
}

/// Decodes a complete raw DEFLATE stream.
///
/// Any bytes after the final block are ignored.
pub fn inflate(deflate_bytes: &[u8]) -> InflateResult<Vec<u8>> {
  let mut inflater = Inflater::new(deflate_bytes);
  inflater.run()?;
  Ok(inflater.into_output())
}

#[cfg(test)]
use crate::bit_packer::BitPacker;

#[test]
fn test_stored_block() {
  let mut bp = BitPacker::default();
  bp.push_lsb(1, 1);
  bp.push_lsb(0, 2);
  bp.push_bytes(&[5, 0, !5, !0]);
  bp.push_bytes(b"hello");
  let bytes = bp.finish();
  assert_eq!(inflate(&bytes).unwrap(), b"hello");

  let mut bad = bytes.clone();
  bad[3] = 0;
  bad[4] = 0;
  assert_eq!(inflate(&bad), Err(InflateError::StoredLengthMismatch { len: 5, nlen: 0 }));

  // LEN says 5, but only 4 bytes follow
  assert!(matches!(
    inflate(&bytes[..bytes.len() - 1]),
    Err(InflateError::TruncatedStream { .. })
  ));
}

#[test]
fn test_empty_stored_block() {
  let bytes = [0b001, 0, 0, 0xFF, 0xFF];
  assert_eq!(inflate(&bytes).unwrap(), b"");
}

#[test]
fn test_static_single_literal() {
  assert_eq!(inflate(&[0x73, 0x04, 0x00]).unwrap(), b"A");
}

#[test]
fn test_static_back_reference() {
  // "ABC" then length 3 distance 3
  assert_eq!(inflate(&[115, 116, 114, 6, 34, 0]).unwrap(), b"ABCABC");
}

#[test]
fn test_overlapping_back_reference() {
  // "z" then length 5 distance 1
  assert_eq!(inflate(&[171, 2, 3, 0]).unwrap(), b"zzzzzz");
}

#[test]
fn test_distance_too_far() {
  // "A" then length 3 distance 2
  assert_eq!(
    inflate(&[115, 4, 66, 0]),
    Err(InflateError::DistanceTooFar { distance: 2, available: 1 })
  );
}

#[test]
fn test_multiple_blocks() {
  // non-final fixed block "H", then a final stored block "i!"
  let bytes = [242, 0, 4, 2, 0, 253, 255, 105, 33];
  let mut inflater = Inflater::new(&bytes);
  assert_eq!(
    inflater.inflate_block().unwrap(),
    Some(BlockHeader { is_final: false, kind: BlockKind::StaticHuffman })
  );
  assert_eq!(inflater.output(), b"H");
  assert!(!inflater.is_done());
  assert_eq!(
    inflater.inflate_block().unwrap(),
    Some(BlockHeader { is_final: true, kind: BlockKind::Stored })
  );
  assert!(inflater.is_done());
  assert_eq!(inflater.inflate_block().unwrap(), None);
  assert_eq!(inflater.stats(), BlockStats { stored: 1, fixed: 1, dynamic: 0 });
  assert_eq!(inflater.into_output(), b"Hi!");
}

#[test]
fn test_reserved_block_type() {
  assert_eq!(inflate(&[0b111]), Err(InflateError::ReservedBlockType));
}

#[test]
fn test_truncated_streams() {
  assert!(matches!(inflate(&[]), Err(InflateError::TruncatedStream { bit_position: 0 })));
  // a fixed block that never reaches end-of-block
  assert!(matches!(inflate(&[115, 116]), Err(InflateError::TruncatedStream { .. })));
  // a non-final block with nothing after it
  assert!(matches!(inflate(&[242, 0]), Err(InflateError::TruncatedStream { .. })));
}

#[test]
fn test_longest_match() {
  // "a", then length 258 (symbol 285) distance 1
  let mut bp = BitPacker::default();
  bp.push_lsb(1, 1);
  bp.push_lsb(1, 2);
  bp.push_fixed_lit_len(u16::from(b'a'));
  bp.push_fixed_lit_len(285);
  bp.push_msb(0, 5);
  bp.push_fixed_lit_len(256);
  let bytes = bp.finish();
  let out = inflate(&bytes).unwrap();
  assert_eq!(out.len(), 259);
  assert!(out.iter().all(|&b| b == b'a'));
}

#[test]
fn test_dynamic_block_without_distance_codes() {
  // HDIST = 1 with that one distance length being 0, and 'A' / end-of-block
  // as the only two literal/length codes.
  let bytes = [5, 192, 129, 8, 0, 0, 0, 0, 32, 182, 253, 165, 142];
  let mut inflater = Inflater::new(&bytes);
  assert_eq!(inflater.run(), Err(InflateError::NoCodes { code: CodeKind::Distance }));
  assert!(inflater.output().is_empty());

  // same header, with a length symbol in the data
  let bytes = [13, 192, 129, 12, 0, 0, 0, 192, 32, 182, 252, 165, 254, 25, 0, 0];
  assert_eq!(inflate(&bytes), Err(InflateError::NoCodes { code: CodeKind::Distance }));
}
