use anyhow::{Context, Result};
use clap::Parser;
use pngstore::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use std::{
  num::{NonZeroU16, NonZeroU32},
  path::{Path, PathBuf},
  process::ExitCode,
  time::Instant,
};

/// Rewrites PNG files so their image data is stored without compression.
#[derive(Parser, Debug)]
#[command(name = "pngstore", version, about)]
struct Args {
  /// PNG files to recode
  #[arg(required = true)]
  inputs: Vec<PathBuf>,

  /// Where to write the output files (default: next to each input)
  #[arg(short, long)]
  out_dir: Option<PathBuf>,

  /// Added to each input's file stem to name its output
  #[arg(long, default_value = "_stored")]
  suffix: String,

  /// Most bytes per stored DEFLATE block
  #[arg(long, default_value_t = RecodeOptions::DEFAULT_BLOCK_LIMIT)]
  block_size: NonZeroU16,

  /// Most bytes per IDAT chunk
  #[arg(long, default_value_t = RecodeOptions::DEFAULT_IDAT_LIMIT)]
  idat_size: NonZeroU32,

  /// Fail a file whose Adler-32 doesn't match, instead of just warning
  #[arg(long)]
  strict_checksum: bool,

  /// Log each block and chunk
  #[arg(short, long)]
  verbose: bool,
}
impl Args {
  fn options(&self) -> RecodeOptions {
    RecodeOptions::default()
      .with_stored_block_limit(self.block_size)
      .with_idat_chunk_limit(self.idat_size)
      .with_checksum_policy(if self.strict_checksum {
        ChecksumPolicy::Reject
      } else {
        ChecksumPolicy::Report
      })
  }

  fn output_path(&self, input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = format!("{stem}{}.png", self.suffix);
    match &self.out_dir {
      Some(dir) => dir.join(name),
      None => input.with_file_name(name),
    }
  }
}

fn main() -> ExitCode {
  let args = Args::parse();

  let default_level = if args.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

  let options = args.options();
  let mut failures = 0_usize;
  for input in args.inputs.iter() {
    let output = args.output_path(input);
    if let Err(e) = process_a_png_file(input, &output, &options) {
      error!("{}: {e:#}", input.display());
      failures += 1;
    }
  }
  if failures == 0 {
    ExitCode::SUCCESS
  } else {
    error!("{failures} of {} files failed", args.inputs.len());
    ExitCode::FAILURE
  }
}

fn process_a_png_file(input: &Path, output: &Path, options: &RecodeOptions) -> Result<()> {
  let start = Instant::now();
  let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
  let read_time = start.elapsed();

  let start = Instant::now();
  let recoded = recode_png(&bytes, options).context("recoding the image data")?;
  let recode_time = start.elapsed();

  let start = Instant::now();
  std::fs::write(output, &recoded.bytes)
    .with_context(|| format!("writing {}", output.display()))?;
  let write_time = start.elapsed();

  let report = &recoded.report;
  info!(
    "{} -> {}: {}x{}, {} IDAT -> {}, {} -> {} bytes ({} decoded){}",
    input.display(),
    output.display(),
    recoded.ihdr.width,
    recoded.ihdr.height,
    recoded.idat_chunks_in,
    recoded.idat_chunks_out,
    bytes.len(),
    recoded.bytes.len(),
    report.decoded_len,
    if report.checksum_matches() { "" } else { ", Adler-32 mismatch" },
  );
  info!(
    "read {:.3?}, recode {:.3?}, write {:.3?}; blocks in: {} stored, {} fixed, {} dynamic",
    read_time,
    recode_time,
    write_time,
    report.input_blocks.stored,
    report.input_blocks.fixed,
    report.input_blocks.dynamic,
  );
  Ok(())
}
