use miniz_oxide::deflate::{compress_to_vec, compress_to_vec_zlib};
use pngstore::*;

use std::num::NonZeroU16;

#[test]
fn test_inflate_matches_reference_at_every_level() {
  for level in 0..=10 {
    for len in [0, 1, 2, 257, 5000, 70_000] {
      let data = super::rand_compressible(len, 5);
      let stream = compress_to_vec_zlib(&data, level);
      let inflated = inflate_zlib(&stream)
        .unwrap_or_else(|e| panic!("level {level}, len {len}: {e}"));
      assert_eq!(inflated.data, data, "level {level}, len {len}");
      assert!(inflated.checksum_matches());
    }
  }
}

#[test]
fn test_inflate_raw_deflate() {
  let data = super::rand_bytes(40_000);
  assert_eq!(inflate(&compress_to_vec(&data, 6)).unwrap(), data);
  let text = b"how much wood would a woodchuck chuck if a woodchuck could chuck wood".repeat(100);
  assert_eq!(inflate(&compress_to_vec(&text, 9)).unwrap(), text);
}

#[test]
fn test_long_distance_matches() {
  // a random prefix repeated after a gap, to push distances near 32K
  let prefix = super::rand_bytes(2000);
  let mut data = prefix.clone();
  data.extend(super::rand_bytes(29_000));
  data.extend_from_slice(&prefix);
  let stream = compress_to_vec_zlib(&data, 9);
  let inflated = inflate_zlib(&stream).unwrap();
  assert_eq!(inflated.data, data);
}

#[test]
fn test_repack_round_trips_through_reference() {
  let data = super::rand_compressible(200_000, 3);
  let stream = compress_to_vec_zlib(&data, 6);
  for limit in [1, 1000, 65500, u16::MAX] {
    let options =
      RecodeOptions::default().with_stored_block_limit(NonZeroU16::new(limit).unwrap());
    let (stored, report) = recode_zlib(&stream, &options).unwrap();
    assert_eq!(report.decoded_len, data.len());
    assert_eq!(miniz_oxide::inflate::decompress_to_vec_zlib(&stored).unwrap(), data);
    let again = inflate_zlib(&stored).unwrap();
    assert_eq!(again.blocks.stored, report.output_blocks);
    assert_eq!(again.blocks.stored, data.len() / usize::from(limit) + 1);
  }
}

#[test]
fn test_inflate_random_bytes_no_panics() {
  for _ in 0..200 {
    let v = super::rand_bytes(512);
    let _ = inflate(&v);
    let _ = inflate_zlib(&v);
  }
  // a valid header in front gets past the framing checks more often
  for _ in 0..200 {
    let mut v = vec![0x78, 0x9C];
    v.extend(super::rand_bytes(256));
    let _ = inflate_zlib(&v);
  }
}

#[test]
fn test_corrupted_streams_are_caught() {
  let data = super::rand_compressible(10_000, 7);
  let stream = compress_to_vec_zlib(&data, 6);
  for i in 2..stream.len() - 4 {
    let mut bad = stream.clone();
    bad[i] ^= 0x55;
    // an error is fine, but a stream that decodes with a good checksum has to
    // be the original data (the flip can land in padding bits)
    if let Ok(inflated) = inflate_zlib(&bad) {
      if inflated.checksum_matches() {
        assert_eq!(inflated.data, data, "flipped byte {i}");
      }
    }
  }
}
