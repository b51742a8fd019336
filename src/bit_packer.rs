//! Test-only bit writer, the mirror image of [`BitCursor`](crate::BitCursor).

use super::*;

#[derive(Debug, Default)]
pub(crate) struct BitPacker {
  bytes: Vec<u8>,
  bit_count: usize,
}
impl BitPacker {
  fn push_bit(&mut self, bit: u32) {
    if self.bit_count % 8 == 0 {
      self.bytes.push(0);
    }
    if bit != 0 {
      *self.bytes.last_mut().unwrap() |= 1 << (self.bit_count % 8);
    }
    self.bit_count += 1;
  }

  /// Header fields and extra bits: low bit first.
  pub(crate) fn push_lsb(&mut self, value: u32, count: u32) {
    for i in 0..count {
      self.push_bit((value >> i) & 1);
    }
  }

  /// Huffman codes: high bit first.
  pub(crate) fn push_msb(&mut self, code: u32, count: u32) {
    for i in (0..count).rev() {
      self.push_bit((code >> i) & 1);
    }
  }

  /// Pads with 0 bits up to the next byte.
  pub(crate) fn align(&mut self) {
    self.bit_count = (self.bit_count + 7) & !7;
  }

  pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
    self.align();
    self.bytes.extend_from_slice(bytes);
    self.bit_count += bytes.len() * 8;
  }

  /// A code from the fixed literal/length table.
  pub(crate) fn push_fixed_lit_len(&mut self, symbol: u16) {
    let symbol = u32::from(symbol);
    match symbol {
      0..=143 => self.push_msb(0x30 + symbol, 8),
      144..=255 => self.push_msb(0x190 + (symbol - 144), 9),
      256..=279 => self.push_msb(symbol - 256, 7),
      _ => self.push_msb(0xC0 + (symbol - 280), 8),
    }
  }

  pub(crate) fn finish(self) -> Vec<u8> {
    self.bytes
  }
}

#[test]
fn test_packer_matches_a_known_stream() {
  // final fixed block holding just "A", as produced by zlib
  let mut bp = BitPacker::default();
  bp.push_lsb(1, 1);
  bp.push_lsb(1, 2);
  bp.push_fixed_lit_len(u16::from(b'A'));
  bp.push_fixed_lit_len(256);
  assert_eq!(bp.finish(), [0x73, 0x04, 0x00]);
}
