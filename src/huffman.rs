use super::*;

/// Longest code DEFLATE allows.
pub const MAX_BITS: usize = 15;

/// The biggest alphabet: the 288 fixed literal/length codes.
pub const MAX_SYMBOLS: usize = 288;

/// A canonical Huffman code, in the counts-and-symbols form.
///
/// * `counts[len]` is how many symbols have a code `len` bits long (index 0
///   counts the unused symbols).
/// * `symbols` lists the used symbols ordered by code length, ties broken by
///   symbol value. That's the canonical code order, so the `k`th code of a
///   given length belongs to the `k`th symbol of that length here.
///
/// Tables are immutable once built. Dynamic blocks build fresh ones, the fixed
/// tables are [`FIXED_LIT_LEN`] and [`FIXED_DIST`].
#[derive(Clone, PartialEq, Eq)]
pub struct HuffmanTable {
  counts: [u16; MAX_BITS + 1],
  symbols: [u16; MAX_SYMBOLS],
  symbol_count: u16,
  left: u32,
}
impl core::fmt::Debug for HuffmanTable {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let used = usize::from(self.symbol_count) - usize::from(self.counts[0]);
    f.debug_struct("HuffmanTable")
      .field("counts", &self.counts)
      .field("symbols", &&self.symbols[..used])
      .field("left", &self.left)
      .finish()
  }
}

impl HuffmanTable {
  /// Builds the table for `lengths`, where `lengths[sym]` is the code length
  /// of `sym` (0 for unused).
  ///
  /// Fails if no symbol has a code, or if the lengths ask for more codes than
  /// the bit space has room for. An *incomplete* set is not an error here, use
  /// [`require_complete`](Self::require_complete) or
  /// [`require_complete_or_single`](Self::require_complete_or_single)
  /// depending on what the caller can accept.
  pub fn new(lengths: &[u8], kind: CodeKind) -> InflateResult<Self> {
    debug_assert!(lengths.len() <= MAX_SYMBOLS);
    debug_assert!(lengths.iter().all(|&len| usize::from(len) <= MAX_BITS));
    let counts = count_lengths(lengths);
    if usize::from(counts[0]) == lengths.len() {
      return Err(InflateError::NoCodes { code: kind });
    }
    let left = match codes_left(&counts) {
      Some(left) => left,
      None => return Err(InflateError::OversubscribedCode { code: kind }),
    };
    let table = Self::build(lengths, counts, left);
    trace!(?kind, counts = ?table.counts, left, "built huffman table");
    Ok(table)
  }

  /// Builds a table from lengths already known to be valid.
  const fn build(lengths: &[u8], counts: [u16; MAX_BITS + 1], left: u32) -> Self {
    // offsets[len] is where the first symbol of that length goes
    let mut offsets = [0_u16; MAX_BITS + 1];
    let mut len = 1;
    while len < MAX_BITS {
      offsets[len + 1] = offsets[len] + counts[len];
      len += 1;
    }
    let mut symbols = [0_u16; MAX_SYMBOLS];
    let mut sym = 0;
    while sym < lengths.len() {
      let len = lengths[sym] as usize;
      if len != 0 {
        symbols[offsets[len] as usize] = sym as u16;
        offsets[len] += 1;
      }
      sym += 1;
    }
    Self { counts, symbols, symbol_count: lengths.len() as u16, left }
  }

  /// How many codes of the longest length are still unassigned. Zero means
  /// the code is complete.
  #[inline]
  #[must_use]
  pub const fn codes_left(&self) -> u32 {
    self.left
  }

  #[inline]
  #[must_use]
  pub const fn is_complete(&self) -> bool {
    self.left == 0
  }

  /// If the only code in use is one code of length 1.
  ///
  /// That's the one incomplete shape DEFLATE encoders are allowed to emit,
  /// for an alphabet where only a single symbol ever occurs.
  #[inline]
  #[must_use]
  pub const fn is_single_code(&self) -> bool {
    self.counts[0] + self.counts[1] == self.symbol_count
  }

  pub fn require_complete(&self, kind: CodeKind) -> InflateResult<()> {
    if self.is_complete() {
      Ok(())
    } else {
      Err(InflateError::IncompleteCode { code: kind })
    }
  }

  pub fn require_complete_or_single(&self, kind: CodeKind) -> InflateResult<()> {
    if self.is_complete() || self.is_single_code() {
      Ok(())
    } else {
      Err(InflateError::IncompleteCode { code: kind })
    }
  }

  /// Number of symbols with each code length, index 0 being unused symbols.
  #[inline]
  #[must_use]
  pub const fn counts(&self) -> &[u16; MAX_BITS + 1] {
    &self.counts
  }

  /// Pulls one code from the cursor and gives the symbol it stands for.
  ///
  /// The code is read one bit at a time, each new bit pushed onto the bottom
  /// of the code so far. After `len` bits, the codes of that length are the
  /// `counts[len]` consecutive values starting at `first`. At most 15 bits are
  /// read.
  pub fn decode(&self, bc: &mut BitCursor<'_>, kind: CodeKind) -> InflateResult<u16> {
    let mut code = 0_u32;
    let mut first = 0_u32;
    let mut index = 0_u32;
    for len in 1..=MAX_BITS {
      code |= bc.next_one_bit()?;
      let count = u32::from(self.counts[len]);
      if code < first + count {
        return Ok(self.symbols[(index + (code - first)) as usize]);
      }
      index += count;
      first += count;
      first <<= 1;
      code <<= 1;
    }
    Err(InflateError::InvalidCode { code: kind })
  }
}

const fn count_lengths(lengths: &[u8]) -> [u16; MAX_BITS + 1] {
  let mut counts = [0_u16; MAX_BITS + 1];
  let mut i = 0;
  while i < lengths.len() {
    counts[lengths[i] as usize] += 1;
    i += 1;
  }
  counts
}

/// Walks the code lengths short to long. Each extra bit doubles the codes
/// available, then the codes of that length are spent. `None` if that ever
/// goes negative.
const fn codes_left(counts: &[u16; MAX_BITS + 1]) -> Option<u32> {
  let mut left: i32 = 1;
  let mut len = 1;
  while len <= MAX_BITS {
    left <<= 1;
    left -= counts[len] as i32;
    if left < 0 {
      return None;
    }
    len += 1;
  }
  Some(left as u32)
}

const fn fixed_lit_len_lengths() -> [u8; 288] {
  let mut out = [0_u8; 288];
  let mut i = 0;
  while i < 288 {
    out[i] = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    i += 1;
  }
  out
}

const fn fixed_table(lengths: &[u8]) -> HuffmanTable {
  let counts = count_lengths(lengths);
  let left = match codes_left(&counts) {
    Some(left) => left,
    None => panic!("fixed code lengths are over-subscribed"),
  };
  HuffmanTable::build(lengths, counts, left)
}

/// The literal/length code of `BTYPE = 01` blocks.
pub static FIXED_LIT_LEN: HuffmanTable = fixed_table(&fixed_lit_len_lengths());

/// The distance code of `BTYPE = 01` blocks: every distance symbol is 5 bits.
pub static FIXED_DIST: HuffmanTable = fixed_table(&[5; 30]);

#[cfg(test)]
use crate::bit_packer::BitPacker;

#[test]
fn test_canonical_codes_of_the_rfc_example() {
  // RFC 1951, 3.2.2: lengths (3, 3, 3, 3, 3, 2, 4, 4) for A..H give
  // F=00 A=010 B=011 C=100 D=101 E=110 G=1110 H=1111
  let lengths = [3, 3, 3, 3, 3, 2, 4, 4];
  let table = HuffmanTable::new(&lengths, CodeKind::LitLen).unwrap();
  assert!(table.is_complete());
  assert_eq!(table.counts()[..5], [0_u16, 0, 1, 5, 2]);

  let codes: [(u32, u32); 8] =
    [(0b010, 3), (0b011, 3), (0b100, 3), (0b101, 3), (0b110, 3), (0b00, 2), (0b1110, 4), (0b1111, 4)];
  let message = [5_u16, 0, 7, 6, 1, 2, 3, 4, 5, 5, 7];
  let mut bp = BitPacker::default();
  for &sym in message.iter() {
    let (code, len) = codes[usize::from(sym)];
    bp.push_msb(code, len);
  }
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  for &expected in message.iter() {
    assert_eq!(table.decode(&mut bc, CodeKind::LitLen).unwrap(), expected);
  }
}

#[test]
fn test_fixed_tables_decode_known_codes() {
  assert!(FIXED_LIT_LEN.is_complete());
  // 286 and 287 get codes even though they never appear in valid data.
  assert_eq!(FIXED_LIT_LEN.counts()[7..10], [24_u16, 152, 112]);
  assert_eq!(FIXED_DIST.codes_left(), 2 << 10);

  // (symbol, code, len) from the table in RFC 1951, 3.2.6
  let samples: [(u16, u32, u32); 8] = [
    (0, 0b0011_0000, 8),
    (143, 0b1011_1111, 8),
    (144, 0b1_1001_0000, 9),
    (255, 0b1_1111_1111, 9),
    (256, 0b000_0000, 7),
    (279, 0b001_0111, 7),
    (280, 0b1100_0000, 8),
    (287, 0b1100_0111, 8),
  ];
  let mut bp = BitPacker::default();
  for &(_, code, len) in samples.iter() {
    bp.push_msb(code, len);
  }
  let bytes = bp.finish();
  let mut bc = BitCursor::new(&bytes);
  for &(sym, _, _) in samples.iter() {
    assert_eq!(FIXED_LIT_LEN.decode(&mut bc, CodeKind::LitLen).unwrap(), sym);
  }
}

#[test]
fn test_random_complete_codes_round_trip() {
  // Kraft-complete length sets built by repeatedly splitting a leaf.
  let mut seed = 0x2545_F491_u32;
  let mut next = move || {
    seed ^= seed << 13;
    seed ^= seed >> 17;
    seed ^= seed << 5;
    seed
  };
  for _ in 0..64 {
    let mut lengths: Vec<u8> = vec![1, 1];
    let target = 2 + (next() % 40) as usize;
    while lengths.len() < target {
      let candidates: Vec<usize> =
        (0..lengths.len()).filter(|&i| usize::from(lengths[i]) < MAX_BITS).collect();
      let i = candidates[next() as usize % candidates.len()];
      lengths[i] += 1;
      let len = lengths[i];
      lengths.push(len);
    }
    // shuffle the symbol order, the codes are canonical either way
    for i in (1..lengths.len()).rev() {
      lengths.swap(i, next() as usize % (i + 1));
    }
    let table = HuffmanTable::new(&lengths, CodeKind::LitLen).unwrap();
    assert!(table.is_complete());

    // canonical code assignment, straight out of RFC 1951 3.2.2
    let mut bl_count = [0_u32; MAX_BITS + 1];
    for &len in lengths.iter() {
      bl_count[usize::from(len)] += 1;
    }
    let mut next_code = [0_u32; MAX_BITS + 1];
    let mut code = 0;
    for bits in 1..=MAX_BITS {
      code = (code + bl_count[bits - 1]) << 1;
      next_code[bits] = code;
    }
    let mut codes = vec![0_u32; lengths.len()];
    for (sym, &len) in lengths.iter().enumerate() {
      codes[sym] = next_code[usize::from(len)];
      next_code[usize::from(len)] += 1;
    }

    let message: Vec<usize> = (0..200).map(|_| next() as usize % lengths.len()).collect();
    let mut bp = BitPacker::default();
    for &sym in message.iter() {
      bp.push_msb(codes[sym], u32::from(lengths[sym]));
    }
    let bytes = bp.finish();
    let mut bc = BitCursor::new(&bytes);
    for &sym in message.iter() {
      assert_eq!(usize::from(table.decode(&mut bc, CodeKind::LitLen).unwrap()), sym);
    }
  }
}

#[test]
fn test_oversubscribed_lengths_are_rejected() {
  assert_eq!(
    HuffmanTable::new(&[1, 1, 1], CodeKind::CodeLength),
    Err(InflateError::OversubscribedCode { code: CodeKind::CodeLength })
  );
  assert_eq!(
    HuffmanTable::new(&[2, 2, 2, 2, 2], CodeKind::Distance),
    Err(InflateError::OversubscribedCode { code: CodeKind::Distance })
  );
  let mut deep = [15_u8; 288];
  deep[0] = 1;
  deep[1] = 1;
  assert!(HuffmanTable::new(&deep, CodeKind::LitLen).is_err());
}

#[test]
fn test_no_codes_is_rejected() {
  assert_eq!(
    HuffmanTable::new(&[0; 19], CodeKind::CodeLength),
    Err(InflateError::NoCodes { code: CodeKind::CodeLength })
  );
}

#[test]
fn test_incomplete_codes() {
  let single = HuffmanTable::new(&[0, 1, 0], CodeKind::Distance).unwrap();
  assert_eq!(single.codes_left(), 1 << 14);
  assert!(single.is_single_code());
  assert!(single.require_complete_or_single(CodeKind::Distance).is_ok());
  assert_eq!(
    single.require_complete(CodeKind::CodeLength),
    Err(InflateError::IncompleteCode { code: CodeKind::CodeLength })
  );

  let gappy = HuffmanTable::new(&[2, 2, 2], CodeKind::LitLen).unwrap();
  assert!(!gappy.is_complete());
  assert!(!gappy.is_single_code());
  assert_eq!(
    gappy.require_complete_or_single(CodeKind::LitLen),
    Err(InflateError::IncompleteCode { code: CodeKind::LitLen })
  );

  // the single code decodes from a `0` bit, and `1` matches nothing
  let bytes = [0b10, 0];
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(single.decode(&mut bc, CodeKind::Distance).unwrap(), 1);
  assert_eq!(
    single.decode(&mut bc, CodeKind::Distance),
    Err(InflateError::InvalidCode { code: CodeKind::Distance })
  );
}
