use super::*;

/// What to do when a stream's Adler-32 trailer doesn't match its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChecksumPolicy {
  /// Log a warning, note it in the report, and keep going. The new stream
  /// carries the checksum of the data as decoded.
  #[default]
  Report,
  /// Fail with [`InflateError::ChecksumMismatch`].
  Reject,
}

/// Settings for recoding a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecodeOptions {
  /// Most bytes per stored block.
  pub stored_block_limit: NonZeroU16,
  /// Most bytes per `IDAT` chunk.
  pub idat_chunk_limit: NonZeroU32,
  pub checksum_policy: ChecksumPolicy,
}
impl RecodeOptions {
  pub const DEFAULT_BLOCK_LIMIT: NonZeroU16 = match NonZeroU16::new(65500) {
    Some(limit) => limit,
    None => unreachable!(),
  };

  pub const DEFAULT_IDAT_LIMIT: NonZeroU32 = match NonZeroU32::new(65500) {
    Some(limit) => limit,
    None => unreachable!(),
  };

  #[inline]
  #[must_use]
  pub const fn with_stored_block_limit(self, stored_block_limit: NonZeroU16) -> Self {
    Self { stored_block_limit, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_idat_chunk_limit(self, idat_chunk_limit: NonZeroU32) -> Self {
    Self { idat_chunk_limit, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_checksum_policy(self, checksum_policy: ChecksumPolicy) -> Self {
    Self { checksum_policy, ..self }
  }
}
impl Default for RecodeOptions {
  #[inline]
  fn default() -> Self {
    Self {
      stored_block_limit: Self::DEFAULT_BLOCK_LIMIT,
      idat_chunk_limit: Self::DEFAULT_IDAT_LIMIT,
      checksum_policy: ChecksumPolicy::Report,
    }
  }
}

/// What recoding a stream found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecodeReport {
  pub compressed_len: usize,
  pub decoded_len: usize,
  pub stored_len: usize,
  /// Blocks of the input stream, by kind.
  pub input_blocks: BlockStats,
  /// Stored blocks in the output stream.
  pub output_blocks: usize,
  pub declared_adler: u32,
  pub computed_adler: u32,
}
impl RecodeReport {
  #[inline]
  #[must_use]
  pub const fn checksum_matches(&self) -> bool {
    self.declared_adler == self.computed_adler
  }
}

/// Decodes a zlib stream and re-frames it as stored blocks.
///
/// The header bytes of the input are kept as they are.
pub fn recode_zlib(stream: &[u8], options: &RecodeOptions) -> InflateResult<(Vec<u8>, RecodeReport)> {
  let inflated = inflate_zlib(stream)?;
  if !inflated.checksum_matches() {
    let (declared, computed) = (inflated.declared_adler, inflated.computed_adler);
    match options.checksum_policy {
      ChecksumPolicy::Reject => return Err(InflateError::ChecksumMismatch { declared, computed }),
      ChecksumPolicy::Report => {
        warn!(declared, computed, "Adler-32 mismatch, keeping the decoded data")
      }
    }
  }
  let stored =
    repack_stored(inflated.header.to_bytes(), &inflated.data, options.stored_block_limit);
  let report = RecodeReport {
    compressed_len: stream.len(),
    decoded_len: inflated.data.len(),
    stored_len: stored.len(),
    input_blocks: inflated.blocks,
    output_blocks: inflated.data.len() / usize::from(options.stored_block_limit.get()) + 1,
    declared_adler: inflated.declared_adler,
    computed_adler: inflated.computed_adler,
  };
  debug!(?report, "recoded zlib stream");
  Ok((stored, report))
}

#[test]
fn test_recode_options_builders() {
  let o = RecodeOptions::default();
  assert_eq!(o.stored_block_limit.get(), 65500);
  assert_eq!(o.idat_chunk_limit.get(), 65500);
  assert_eq!(o.checksum_policy, ChecksumPolicy::Report);
  let o = o
    .with_stored_block_limit(NonZeroU16::new(10).unwrap())
    .with_idat_chunk_limit(NonZeroU32::new(8192).unwrap())
    .with_checksum_policy(ChecksumPolicy::Reject);
  assert_eq!(o.stored_block_limit.get(), 10);
  assert_eq!(o.idat_chunk_limit.get(), 8192);
  assert_eq!(o.checksum_policy, ChecksumPolicy::Reject);
}

#[test]
fn test_recode_zlib() {
  let options = RecodeOptions::default().with_stored_block_limit(NonZeroU16::new(50).unwrap());
  let (stored, report) = recode_zlib(&crate::zlib::DYNAMIC_NOISE_ZLIB, &options).unwrap();
  assert_eq!(report.compressed_len, 58);
  assert_eq!(report.decoded_len, 200);
  assert_eq!(report.stored_len, stored.len());
  assert_eq!(report.input_blocks.dynamic, 1);
  // exactly 4 full blocks, then the empty final one
  assert_eq!(report.output_blocks, 5);
  assert_eq!(stored.len(), 2 + 5 * 5 + 200 + 4);
  assert!(report.checksum_matches());
  assert_eq!(&stored[..2], &[0x78, 0xDA]);
  let again = inflate_zlib(&stored).unwrap();
  assert_eq!(again.blocks.stored, report.output_blocks);
}

#[test]
fn test_recode_checksum_policy() {
  let mut bad = crate::zlib::DYNAMIC_NOISE_ZLIB;
  bad[54] ^= 0x01;
  let (stored, report) = recode_zlib(&bad, &RecodeOptions::default()).unwrap();
  assert!(!report.checksum_matches());
  // the new trailer is the checksum of the data itself
  assert_eq!(&stored[stored.len() - 4..], &0x3CA2_629E_u32.to_be_bytes());

  let strict = RecodeOptions::default().with_checksum_policy(ChecksumPolicy::Reject);
  assert_eq!(
    recode_zlib(&bad, &strict),
    Err(InflateError::ChecksumMismatch { declared: 0x3DA2_629E, computed: 0x3CA2_629E })
  );
}
