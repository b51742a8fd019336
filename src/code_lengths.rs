use super::*;

/// Most literal/length codes a dynamic header may declare.
pub const MAX_LIT_LEN_CODES: usize = 286;

/// Most distance codes a dynamic header may declare.
pub const MAX_DIST_CODES: usize = 30;

/// The order the code length code lengths are stored in.
const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// The 19 symbol alphabet that a dynamic block header uses to compress its
/// own literal/length and distance code lengths.
#[derive(Debug, Clone)]
pub(crate) struct CodeLengthAlphabet {
  table: HuffmanTable,
}
impl CodeLengthAlphabet {
  /// Reads `hclen` 3-bit lengths in the permuted order, the rest are 0.
  ///
  /// This code has to be complete, there's no single-code exemption for it.
  pub fn read(bc: &mut BitCursor<'_>, hclen: usize) -> InflateResult<Self> {
    debug_assert!((4..=19).contains(&hclen));
    let mut lengths = [0_u8; 19];
    for &sym in CODE_LENGTH_ORDER.iter().take(hclen) {
      lengths[sym] = bc.next_bits_lsb(3)? as u8;
    }
    let table = HuffmanTable::new(&lengths, CodeKind::CodeLength)?;
    table.require_complete(CodeKind::CodeLength)?;
    Ok(Self { table })
  }

  /// Decodes code lengths until all of `lengths` is filled.
  ///
  /// * 0 through 15 are literal lengths.
  /// * 16 repeats the previous length 3 to 6 times (2 extra bits).
  /// * 17 repeats a 0 length 3 to 10 times (3 extra bits).
  /// * 18 repeats a 0 length 11 to 138 times (7 extra bits).
  ///
  /// A repeat may cross from the literal/length part into the distance part,
  /// which is why both are filled as one run.
  pub fn fill_lengths(&self, lengths: &mut [u8], bc: &mut BitCursor<'_>) -> InflateResult<()> {
    let declared = lengths.len();
    let mut acquired = 0_usize;
    while acquired < declared {
      let symbol = self.table.decode(bc, CodeKind::CodeLength)?;
      let (value, repeat) = match symbol {
        0..=15 => {
          lengths[acquired] = symbol as u8;
          acquired += 1;
          continue;
        }
        16 => {
          if acquired == 0 {
            return Err(InflateError::RepeatWithoutPrevious);
          }
          (lengths[acquired - 1], 3 + bc.next_bits_lsb(2)? as usize)
        }
        17 => (0, 3 + bc.next_bits_lsb(3)? as usize),
        18 => (0, 11 + bc.next_bits_lsb(7)? as usize),
        _ => unreachable!("the code length alphabet only has 19 symbols"),
      };
      if acquired + repeat > declared {
        return Err(InflateError::TooManyCodeLengths { declared, requested: acquired + repeat });
      }
      lengths[acquired..acquired + repeat].fill(value);
      acquired += repeat;
    }
    Ok(())
  }
}

/// Reads a dynamic block's header and builds its literal/length and distance
/// tables.
pub(crate) fn read_dynamic_tables(
  bc: &mut BitCursor<'_>,
) -> InflateResult<(HuffmanTable, HuffmanTable)> {
  let hlit = bc.next_bits_lsb(5)? as usize + 257;
  let hdist = bc.next_bits_lsb(5)? as usize + 1;
  let hclen = bc.next_bits_lsb(4)? as usize + 4;
  trace!(hlit, hdist, hclen, "dynamic block header");
  if hlit > MAX_LIT_LEN_CODES {
    return Err(InflateError::TooManyLengthCodes { count: hlit });
  }
  if hdist > MAX_DIST_CODES {
    return Err(InflateError::TooManyDistanceCodes { count: hdist });
  }

  let alphabet = CodeLengthAlphabet::read(bc, hclen)?;
  let mut lengths = [0_u8; MAX_LIT_LEN_CODES + MAX_DIST_CODES];
  let lengths = &mut lengths[..hlit + hdist];
  alphabet.fill_lengths(lengths, bc)?;

  let (lit_len_lengths, dist_lengths) = lengths.split_at(hlit);
  if lit_len_lengths[256] == 0 {
    return Err(InflateError::MissingEndOfBlock);
  }
  let lit_len = HuffmanTable::new(lit_len_lengths, CodeKind::LitLen)?;
  lit_len.require_complete_or_single(CodeKind::LitLen)?;
  let dist = HuffmanTable::new(dist_lengths, CodeKind::Distance)?;
  dist.require_complete_or_single(CodeKind::Distance)?;
  Ok((lit_len, dist))
}

#[cfg(test)]
use crate::bit_packer::BitPacker;

/// Starts a dynamic header whose code length code only has symbols 0, 16, 17
/// and 18, each 2 bits long: 0=00, 16=01, 17=10, 18=11.
#[cfg(test)]
fn packer_with_simple_header(hlit: u32, hdist: u32) -> BitPacker {
  let mut bp = BitPacker::default();
  bp.push_lsb(hlit - 257, 5);
  bp.push_lsb(hdist - 1, 5);
  // HCLEN = 4 covers order[..4] = 16, 17, 18, 0
  bp.push_lsb(0, 4);
  for _ in 0..4 {
    bp.push_lsb(2, 3);
  }
  bp
}

#[test]
fn test_repeat_without_previous_is_rejected() {
  let mut bp = packer_with_simple_header(257, 1);
  bp.push_msb(0b01, 2); // symbol 16 first
  bp.push_lsb(0, 2);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut bc).unwrap_err(), InflateError::RepeatWithoutPrevious);
}

#[test]
fn test_repeat_overrunning_the_total_is_rejected() {
  // 258 lengths declared, then two runs of 138 zeros
  let mut bp = packer_with_simple_header(257, 1);
  bp.push_msb(0b11, 2);
  bp.push_lsb(127, 7);
  bp.push_msb(0b11, 2);
  bp.push_lsb(127, 7);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    read_dynamic_tables(&mut bc).unwrap_err(),
    InflateError::TooManyCodeLengths { declared: 258, requested: 276 }
  );
}

#[test]
fn test_missing_end_of_block_is_rejected() {
  // all 258 lengths are 0: 138 + 120 zeros
  let mut bp = packer_with_simple_header(257, 1);
  bp.push_msb(0b11, 2);
  bp.push_lsb(127, 7);
  bp.push_msb(0b11, 2);
  bp.push_lsb(120 - 11, 7);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(read_dynamic_tables(&mut bc).unwrap_err(), InflateError::MissingEndOfBlock);
}

#[test]
fn test_declared_counts_are_bounded() {
  let mut bp = BitPacker::default();
  bp.push_lsb(30, 5); // 287 literal/length codes
  bp.push_lsb(0, 5);
  bp.push_lsb(0, 4);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    read_dynamic_tables(&mut bc).unwrap_err(),
    InflateError::TooManyLengthCodes { count: 287 }
  );

  let mut bp = BitPacker::default();
  bp.push_lsb(0, 5);
  bp.push_lsb(31, 5); // 32 distance codes
  bp.push_lsb(0, 4);
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    read_dynamic_tables(&mut bc).unwrap_err(),
    InflateError::TooManyDistanceCodes { count: 32 }
  );
}

#[test]
fn test_incomplete_code_length_code_is_rejected() {
  let mut bp = BitPacker::default();
  bp.push_lsb(0, 5);
  bp.push_lsb(0, 5);
  bp.push_lsb(0, 4);
  // 16, 17, 18 get 2 bits, 0 gets nothing: one 2-bit code left over
  for len in [2, 2, 2, 0] {
    bp.push_lsb(len, 3);
  }
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(
    read_dynamic_tables(&mut bc).unwrap_err(),
    InflateError::IncompleteCode { code: CodeKind::CodeLength }
  );
}
