#![forbid(unsafe_code)]

//! Shorthands for pulling fixed size values off the front of a byte slice.

use bytemuck::{checked::pod_read_unaligned, Pod};
use core::mem::size_of;

#[inline]
#[must_use]
pub(crate) fn try_split_off_byte_array<const N: usize>(bytes: &[u8]) -> Option<([u8; N], &[u8])> {
  if bytes.len() >= N {
    let (head, tail) = bytes.split_at(N);
    let mut a = [0_u8; N];
    a.copy_from_slice(head);
    Some((a, tail))
  } else {
    None
  }
}

/// Reads a `T` from the front of `bytes`, no matter the alignment.
#[inline]
#[must_use]
pub(crate) fn try_pull_pod<T: Pod>(bytes: &[u8]) -> Option<(T, &[u8])> {
  let position = size_of::<T>();
  if bytes.len() >= position {
    let (head, tail) = bytes.split_at(position);
    let a: T = pod_read_unaligned(head);
    Some((a, tail))
  } else {
    None
  }
}

/// Splits off a big-endian `u32`, the way PNG stores lengths and CRCs.
#[inline]
#[must_use]
pub(crate) fn try_split_off_u32_be(bytes: &[u8]) -> Option<(u32, &[u8])> {
  try_split_off_byte_array::<4>(bytes).map(|(a, rest)| (u32::from_be_bytes(a), rest))
}

#[test]
fn test_split_helpers() {
  let bytes = [0x00, 0x00, 0x01, 0x02, 0xAA];
  assert_eq!(try_split_off_u32_be(&bytes), Some((0x0102, &bytes[4..])));
  assert_eq!(try_split_off_byte_array::<6>(&bytes), None);
  let (pair, rest) = try_pull_pod::<[u8; 2]>(&bytes[3..]).unwrap();
  assert_eq!(pair, [0x02, 0xAA]);
  assert!(rest.is_empty());
  assert_eq!(try_pull_pod::<[u8; 3]>(&bytes[3..]), None);
}
