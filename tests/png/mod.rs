use miniz_oxide::inflate::decompress_to_vec_zlib;
use pngstore::{png::*, *};
use walkdir::WalkDir;

use std::num::{NonZeroU16, NonZeroU32};

fn fixture(name: &str) -> Vec<u8> {
  std::fs::read(format!("tests/png/{name}")).unwrap()
}

#[test]
fn test_PngChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in PngChunkIter::new(&v) {
      //
    }
    let _ = recode_png(&v, &RecodeOptions::default());
  }
  // even totally random data should never panic!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in PngChunkIter::new(&v) {
      //
    }
    let mut with_signature = Vec::from(PNG_SIGNATURE);
    with_signature.extend_from_slice(&v);
    let _ = recode_png(&with_signature, &RecodeOptions::default());
  }
}

#[test]
fn test_every_fixture_recodes_to_the_same_pixels() {
  let mut seen = 0;
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    if entry.path().extension().map_or(true, |ext| ext != "png") {
      continue;
    }
    let path = entry.path().display().to_string();
    let bytes = std::fs::read(entry.path()).unwrap();
    let original = Png::parse(&bytes).unwrap_or_else(|e| panic!("{path}: {e}"));
    let expected = decompress_to_vec_zlib(&original.idat_stream()).unwrap();

    let recoded =
      recode_png(&bytes, &RecodeOptions::default()).unwrap_or_else(|e| panic!("{path}: {e}"));
    let new = Png::parse(&recoded.bytes).unwrap_or_else(|e| panic!("{path}: {e}"));
    assert_eq!(new.ihdr(), original.ihdr(), "{path}");
    assert_eq!(decompress_to_vec_zlib(&new.idat_stream()).unwrap(), expected, "{path}");
    assert_eq!(recoded.report.decoded_len, expected.len(), "{path}");

    let inflated = inflate_zlib(&new.idat_stream()).unwrap();
    assert_eq!(inflated.blocks.fixed + inflated.blocks.dynamic, 0, "{path}");
    assert!(inflated.checksum_matches(), "{path}");

    // non-IDAT chunks come through untouched
    let others = |png: &Png<'_>| -> Vec<(PngChunkTy, Vec<u8>)> {
      png
        .chunks()
        .iter()
        .filter(|c| c.ty != PngChunkTy::IDAT)
        .map(|c| (c.ty, c.data.to_vec()))
        .collect()
    };
    assert_eq!(others(&new), others(&original), "{path}");
    seen += 1;
  }
  assert!(seen >= 4);
}

#[test]
fn test_fixture_block_kinds() {
  let options = RecodeOptions::default();
  let fixed = recode_png(&fixture("checker_8x4_fixed.png"), &options).unwrap();
  assert!(fixed.report.input_blocks.fixed > 0);
  assert_eq!(fixed.report.input_blocks.dynamic, 0);

  let dynamic = recode_png(&fixture("noise_24x8.png"), &options).unwrap();
  assert_eq!(dynamic.report.input_blocks.dynamic, 1);
  assert_eq!(dynamic.report.decoded_len, 200);
  assert_eq!(dynamic.report.computed_adler, 0x3CA2_629E);

  let stored = recode_png(&fixture("noise_24x8_stored.png"), &options).unwrap();
  assert!(stored.report.input_blocks.stored > 0);
  assert_eq!(stored.report.input_blocks.total(), stored.report.input_blocks.stored);

  let split = recode_png(&fixture("noise_24x8_split.png"), &options).unwrap();
  assert_eq!(split.idat_chunks_in, 3);
  assert_eq!(split.idat_chunks_out, 1);
}

#[test]
fn test_recoding_twice_is_stable() {
  let options = RecodeOptions::default();
  let once = recode_png(&fixture("noise_24x8.png"), &options).unwrap();
  let twice = recode_png(&once.bytes, &options).unwrap();
  assert_eq!(once.bytes, twice.bytes);
  assert_eq!(twice.report.input_blocks.stored, 1);
}

#[test]
fn test_small_limits_split_everything() {
  let options = RecodeOptions::default()
    .with_stored_block_limit(NonZeroU16::new(7).unwrap())
    .with_idat_chunk_limit(NonZeroU32::new(16).unwrap());
  let recoded = recode_png(&fixture("noise_24x8_split.png"), &options).unwrap();
  // 200 bytes in blocks of 7: 28 full ones and a final one of 4
  assert_eq!(recoded.report.output_blocks, 29);
  let stream_len = 2 + 29 * 5 + 200 + 4;
  assert_eq!(recoded.report.stored_len, stream_len);
  assert_eq!(recoded.idat_chunks_out, stream_len.div_ceil(16));

  let png = Png::parse(&recoded.bytes).unwrap();
  let idat = png.idat_chunks();
  assert!(idat[..idat.len() - 1].iter().all(|c| c.data.len() == 16));
  assert_eq!(png.chunks()[1].ty, PngChunkTy(*b"tEXt"));
  let expected = decompress_to_vec_zlib(&Png::parse(&fixture("noise_24x8.png")).unwrap().idat_stream());
  assert_eq!(decompress_to_vec_zlib(&png.idat_stream()).unwrap(), expected.unwrap());
}

#[test]
fn test_container_errors() {
  let options = RecodeOptions::default();
  let good = fixture("noise_24x8.png");

  let mut bad_sig = good.clone();
  bad_sig[1] = b'Q';
  assert_eq!(recode_png(&bad_sig, &options).unwrap_err(), PngError::BadSignature);

  // flip a bit in the IDAT data, the CRC catches it before the inflater sees it
  let mut bad_data = good.clone();
  bad_data[8 + 25 + 8 + 10] ^= 0x04;
  match recode_png(&bad_data, &options).unwrap_err() {
    PngError::ChunkCrcMismatch { ty, declared, actual } => {
      assert_eq!(ty, PngChunkTy::IDAT);
      assert_ne!(declared, actual);
    }
    other => panic!("unexpected {other:?}"),
  }

  let truncated = &good[..good.len() - 3];
  assert_eq!(
    recode_png(truncated, &options).unwrap_err(),
    PngError::UnexpectedEndOfInput { offset: good.len() - 12 }
  );

  let mut trailing = good.clone();
  write_chunk(&mut trailing, PngChunkTy(*b"tEXt"), b"late\0comment");
  assert_eq!(recode_png(&trailing, &options).unwrap_err(), PngError::DataAfterIEND);

  let no_iend = &good[..good.len() - 12];
  assert_eq!(
    recode_png(no_iend, &options).unwrap_err(),
    PngError::MissingChunk(PngChunkTy::IEND)
  );
}

#[test]
fn test_crc_mismatch_message() {
  let mut bytes = fixture("noise_24x8.png");
  let end = bytes.len();
  bytes[end - 1] = 0x83;
  let err = recode_png(&bytes, &RecodeOptions::default()).unwrap_err();
  assert_eq!(
    err.to_string(),
    "PNG chunk CRC mismatch in IEND: chunk CRC = 0xAE426083, calculated CRC = 0xAE426082"
  );
}
