use super::*;

/// Reads a byte slice one bit at a time, least significant bit of each byte
/// first.
///
/// DEFLATE mixes two conventions for multi-bit values on top of that bit
/// order:
/// * Header fields and extra bits put the first bit read in the *lowest*
///   position of the value ([`next_bits_lsb`](Self::next_bits_lsb)).
/// * Huffman codes put the first bit read in the *highest* position of the
///   code ([`next_bits_msb`](Self::next_bits_msb)).
///
/// Mixing these up silently produces garbage, so both live here and nowhere
/// else.
#[derive(Clone)]
pub struct BitCursor<'b> {
  source: &'b [u8],
  position: usize,
}

impl core::fmt::Debug for BitCursor<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let byte = self.position / 8;
    let current = match self.source.get(byte) {
      Some(b) => format!("{b:08b}"),
      None => format!("||"),
    };
    f.debug_struct("BitCursor")
      .field("position", &self.position)
      .field("bits_remaining", &self.bits_remaining())
      .field("current", &current)
      .finish()
  }
}

impl<'b> BitCursor<'b> {
  #[inline]
  #[must_use]
  pub const fn new(source: &'b [u8]) -> Self {
    Self { source, position: 0 }
  }

  /// Position in bits from the start of the source.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.position
  }

  #[inline]
  #[must_use]
  pub const fn bits_remaining(&self) -> usize {
    self.source.len() * 8 - self.position
  }

  /// Goes back to the first bit of the source.
  #[inline]
  pub fn rewind(&mut self) {
    self.position = 0;
  }

  #[inline]
  fn ensure(&self, count: usize) -> InflateResult<()> {
    if count > self.bits_remaining() {
      Err(InflateError::TruncatedStream { bit_position: self.position })
    } else {
      Ok(())
    }
  }

  /// Reads one bit.
  #[inline]
  pub fn next_one_bit(&mut self) -> InflateResult<u32> {
    self.ensure(1)?;
    let byte = self.source[self.position / 8];
    let bit = (byte >> (self.position % 8)) & 1;
    self.position += 1;
    Ok(u32::from(bit))
  }

  /// Reads `count` bits, each new bit pushed onto the bottom of the value.
  ///
  /// This is the order Huffman codes are packed in.
  pub fn next_bits_msb(&mut self, count: u32) -> InflateResult<u32> {
    debug_assert!(count <= 32);
    self.ensure(count as usize)?;
    let mut value = 0_u32;
    for _ in 0..count {
      value = (value << 1) | self.next_one_bit()?;
    }
    Ok(value)
  }

  /// Reads `count` bits, the `i`th bit read landing at bit `i` of the value.
  ///
  /// This is the order of every other multi-bit DEFLATE field.
  pub fn next_bits_lsb(&mut self, count: u32) -> InflateResult<u32> {
    debug_assert!(count <= 32);
    self.ensure(count as usize)?;
    let mut value = 0_u32;
    for i in 0..count {
      value |= self.next_one_bit()? << i;
    }
    Ok(value)
  }

  /// Two LSB-first bytes, low byte first.
  pub fn next_reversed_u16(&mut self) -> InflateResult<u16> {
    let low = self.next_bits_lsb(8)? as u16;
    let high = self.next_bits_lsb(8)? as u16;
    Ok((high << 8) | low)
  }

  /// Skips whatever is left of the current byte.
  #[inline]
  pub fn align_to_byte(&mut self) {
    self.position = (self.position + 7) & !7;
  }

  /// Takes `len` whole bytes. The cursor must already be byte aligned.
  pub fn take_aligned_bytes(&mut self, len: usize) -> InflateResult<&'b [u8]> {
    debug_assert_eq!(self.position % 8, 0);
    self.ensure(len * 8)?;
    let start = self.position / 8;
    self.position += len * 8;
    Ok(&self.source[start..start + len])
  }

  /// The 1 bit `BFINAL` field of a block header.
  #[inline]
  pub fn get_bfinal(&mut self) -> InflateResult<bool> {
    Ok(self.next_bits_lsb(1)? != 0)
  }

  /// The 2 bit `BTYPE` field of a block header.
  #[inline]
  pub fn get_btype(&mut self) -> InflateResult<u32> {
    self.next_bits_lsb(2)
  }
}

#[test]
fn test_bit_orders() {
  // 0b1011_0010 read LSB first is 0,1,0,0,1,1,0,1
  let bytes = [0b1011_0010_u8, 0b0000_0001];
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(bc.next_bits_msb(4).unwrap(), 0b0100);
  bc.rewind();
  assert_eq!(bc.next_bits_lsb(4).unwrap(), 0b0010);
  assert_eq!(bc.position(), 4);
  assert_eq!(bc.next_one_bit().unwrap(), 1);
  assert_eq!(bc.next_bits_lsb(3).unwrap(), 0b101);
  assert_eq!(bc.next_bits_lsb(8).unwrap(), 1);
  assert_eq!(bc.bits_remaining(), 0);
}

#[test]
fn test_reversed_u16_is_little_endian() {
  let bytes = [0x34, 0x12];
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(bc.next_reversed_u16().unwrap(), 0x1234);
}

#[test]
fn test_reading_past_the_end_is_an_error() {
  let bytes = [0xFF];
  let mut bc = BitCursor::new(&bytes);
  assert_eq!(bc.next_bits_lsb(5).unwrap(), 0b11111);
  assert_eq!(bc.next_bits_lsb(4), Err(InflateError::TruncatedStream { bit_position: 5 }));
  // a failed read doesn't move the cursor
  assert_eq!(bc.position(), 5);
  assert_eq!(bc.next_bits_msb(3).unwrap(), 0b111);
  assert!(bc.next_one_bit().is_err());
}

#[test]
fn test_align_and_take() {
  let bytes = [0b0000_0101, 0xAA, 0xBB, 0xCC];
  let mut bc = BitCursor::new(&bytes);
  assert!(bc.get_bfinal().unwrap());
  assert_eq!(bc.get_btype().unwrap(), 0b10);
  bc.align_to_byte();
  assert_eq!(bc.position(), 8);
  bc.align_to_byte();
  assert_eq!(bc.position(), 8);
  assert_eq!(bc.take_aligned_bytes(2).unwrap(), &[0xAA, 0xBB]);
  assert!(bc.take_aligned_bytes(2).is_err());
  assert_eq!(bc.take_aligned_bytes(1).unwrap(), &[0xCC]);
}
