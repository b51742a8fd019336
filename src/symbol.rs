use super::*;

/// Base copy length for length symbols 257 through 285.
const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];

/// Extra bits after length symbols 257 through 285.
const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distance for distance symbols 0 through 29.
const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537, 2049,
  3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits after distance symbols 0 through 29.
const DIST_EXTRA: [u8; 30] =
  [0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13];

const END_OF_BLOCK: u16 = 256;

/// One fully decoded step of a Huffman block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HuffSymbol {
  Literal(u8),
  EndOfBlock,
  /// Copy `len` bytes starting `dist` bytes back from the end of the output.
  BackRef { len: usize, dist: usize },
}

impl HuffSymbol {
  /// Decodes a literal/length symbol, and if it's a length also the distance
  /// that must follow it.
  pub(crate) fn pull(
    bc: &mut BitCursor<'_>, lit_len: &HuffmanTable, dist: &HuffmanTable,
  ) -> InflateResult<Self> {
    let symbol = lit_len.decode(bc, CodeKind::LitLen)?;
    if symbol < END_OF_BLOCK {
      return Ok(HuffSymbol::Literal(symbol as u8));
    }
    if symbol == END_OF_BLOCK {
      return Ok(HuffSymbol::EndOfBlock);
    }
    let i = usize::from(symbol - 257);
    if i >= LENGTH_BASE.len() {
      return Err(InflateError::InvalidLengthSymbol { symbol });
    }
    let len = u32::from(LENGTH_BASE[i]) + bc.next_bits_lsb(u32::from(LENGTH_EXTRA[i]))?;

    let symbol = dist.decode(bc, CodeKind::Distance)?;
    let d = usize::from(symbol);
    if d >= DIST_BASE.len() {
      return Err(InflateError::InvalidDistanceSymbol { symbol });
    }
    let dist = u32::from(DIST_BASE[d]) + bc.next_bits_lsb(u32::from(DIST_EXTRA[d]))?;

    Ok(HuffSymbol::BackRef { len: len as usize, dist: dist as usize })
  }
}

#[test]
fn test_length_and_distance_tables_are_contiguous() {
  // each base picks up right where the previous symbol's range ended
  for i in 1..LENGTH_BASE.len() - 1 {
    assert_eq!(LENGTH_BASE[i], LENGTH_BASE[i - 1] + (1 << LENGTH_EXTRA[i - 1]));
  }
  // 284 with all extra bits set would be 258, but 285 is its own symbol
  assert_eq!(LENGTH_BASE[27] + (1 << LENGTH_EXTRA[27]) - 1, 258);
  for i in 1..DIST_BASE.len() {
    assert_eq!(DIST_BASE[i], DIST_BASE[i - 1] + (1 << DIST_EXTRA[i - 1]));
  }
  assert_eq!(DIST_BASE[29] + (1 << DIST_EXTRA[29]) - 1, 32768);
}

#[test]
fn test_pull_back_ref_with_extra_bits() {
  use crate::bit_packer::BitPacker;
  // length symbol 269: base 19, 2 extra bits. distance symbol 9: base 25, 3
  // extra bits.
  let mut bp = BitPacker::default();
  bp.push_fixed_lit_len(269);
  bp.push_lsb(0b10, 2);
  bp.push_msb(9, 5);
  bp.push_lsb(0b101, 3);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    HuffSymbol::pull(&mut bc, &FIXED_LIT_LEN, &FIXED_DIST).unwrap(),
    HuffSymbol::BackRef { len: 21, dist: 30 }
  );
}

#[test]
fn test_pull_rejects_symbols_past_the_tables() {
  use crate::bit_packer::BitPacker;
  let mut bp = BitPacker::default();
  bp.push_fixed_lit_len(286);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    HuffSymbol::pull(&mut bc, &FIXED_LIT_LEN, &FIXED_DIST),
    Err(InflateError::InvalidLengthSymbol { symbol: 286 })
  );

  // the fixed distance table only has 30 symbols, so use a dynamic-style one
  // that reaches 31.
  let wide_dist = HuffmanTable::new(&[5_u8; 32], CodeKind::Distance).unwrap();
  let mut bp = BitPacker::default();
  bp.push_fixed_lit_len(257);
  bp.push_msb(31, 5);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    HuffSymbol::pull(&mut bc, &FIXED_LIT_LEN, &wide_dist),
    Err(InflateError::InvalidDistanceSymbol { symbol: 31 })
  );
}
