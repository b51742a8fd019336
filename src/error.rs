use core::fmt;

use thiserror::Error;

#[cfg(feature = "png")]
use crate::png::{PngChunkTy, PngColorType};

/// Which of the three DEFLATE code alphabets a Huffman error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
  /// The 19 symbol "code length" alphabet of a dynamic block header.
  CodeLength,
  /// The literal/length alphabet.
  LitLen,
  /// The distance alphabet.
  Distance,
}
impl fmt::Display for CodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      CodeKind::CodeLength => "code length",
      CodeKind::LitLen => "literal/length",
      CodeKind::Distance => "distance",
    })
  }
}

/// An error from decoding a zlib/DEFLATE stream.
///
/// Every one of these is fatal for the stream being decoded. Nothing is
/// resynchronized and no partial output is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InflateError {
  /// The bit source ran out before a read could complete.
  #[error("stream truncated at bit {bit_position}")]
  TruncatedStream { bit_position: usize },

  /// A stored block's `NLEN` wasn't the one's complement of its `LEN`.
  #[error("corrupt stored-block header: LEN {len:#06X}, NLEN {nlen:#06X}")]
  StoredLengthMismatch { len: u16, nlen: u16 },

  /// Block type `0b11` is reserved.
  #[error("reserved block type 3")]
  ReservedBlockType,

  /// Every code length was 0.
  #[error("{code} code has no symbols")]
  NoCodes { code: CodeKind },

  /// More codes of some length than the bit space allows.
  #[error("{code} code is over-subscribed")]
  OversubscribedCode { code: CodeKind },

  /// The code set leaves bit patterns unused, and isn't the one exempt shape
  /// (a single code of length 1).
  #[error("{code} code is incomplete")]
  IncompleteCode { code: CodeKind },

  /// No symbol matched within 15 bits.
  #[error("invalid {code} code in the bitstream")]
  InvalidCode { code: CodeKind },

  /// A decoded literal/length symbol above 285.
  #[error("invalid length symbol {symbol}")]
  InvalidLengthSymbol { symbol: u16 },

  /// A decoded distance symbol above 29.
  #[error("invalid distance symbol {symbol}")]
  InvalidDistanceSymbol { symbol: u16 },

  /// `HLIT` declared more than 286 literal/length codes.
  #[error("dynamic header declares {count} literal/length codes (max 286)")]
  TooManyLengthCodes { count: usize },

  /// `HDIST` declared more than 30 distance codes.
  #[error("dynamic header declares {count} distance codes (max 30)")]
  TooManyDistanceCodes { count: usize },

  /// Code length symbol 16 appeared before any length was decoded.
  #[error("repeat-previous code length with no previous length")]
  RepeatWithoutPrevious,

  /// A repeat run went past the declared number of code lengths.
  #[error("code length repeat overruns the declared total: {requested} of {declared}")]
  TooManyCodeLengths { declared: usize, requested: usize },

  /// The end-of-block symbol (256) has no code.
  #[error("dynamic block has no end-of-block code")]
  MissingEndOfBlock,

  /// A back-reference reached before the start of the output.
  #[error("back-reference distance {distance} exceeds the {available} bytes decoded so far")]
  DistanceTooFar { distance: usize, available: usize },

  /// Less than the 2 byte header plus 4 byte trailer.
  #[error("zlib stream is only {len} bytes")]
  ZlibTooShort { len: usize },

  /// The zlib `CMF`/`FLG` pair failed the method, window size, or check-bits
  /// test.
  #[error("bad zlib header: CMF {cmf:#04X}, FLG {flg:#04X}")]
  BadZlibHeader { cmf: u8, flg: u8 },

  /// The zlib header asks for a preset dictionary, which PNG never uses.
  #[error("zlib preset dictionaries are not supported")]
  PresetDictionary,

  /// The Adler-32 trailer didn't match the decoded data.
  #[error("Adler-32 mismatch: declared {declared:#010X}, computed {computed:#010X}")]
  ChecksumMismatch { declared: u32, computed: u32 },
}

/// Result alias for the DEFLATE layer.
pub type InflateResult<T> = Result<T, InflateError>;

/// An error from processing a PNG file.
#[cfg(feature = "png")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PngError {
  /// The first eight bytes aren't the PNG signature.
  #[error("PNG signature not found")]
  BadSignature,

  /// A chunk's framing ran past the end of the data.
  #[error("PNG data ends inside a chunk at byte {offset}")]
  UnexpectedEndOfInput { offset: usize },

  /// The CRC stored after a chunk doesn't match its type and data.
  #[error("PNG chunk CRC mismatch in {ty}: chunk CRC = {declared:#010X}, calculated CRC = {actual:#010X}")]
  ChunkCrcMismatch { ty: PngChunkTy, declared: u32, actual: u32 },

  /// The first chunk isn't `IHDR`.
  #[error("first chunk is not IHDR")]
  FirstChunkNotIHDR,

  /// `IHDR` isn't 13 bytes, or holds values the format doesn't allow.
  #[error("malformed IHDR chunk")]
  BadIHDR,

  /// A chunk that may appear once appeared again.
  #[error("{0} chunk encountered more than once")]
  DuplicateChunk(PngChunkTy),

  /// A required chunk never appeared.
  #[error("required chunk {0} missing")]
  MissingChunk(PngChunkTy),

  /// Another chunk sits between two `IDAT` chunks.
  #[error("IDAT chunks are not consecutive")]
  IdatNotConsecutive,

  /// Chunks follow `IEND`.
  #[error("data after the IEND chunk")]
  DataAfterIEND,

  /// `hIST` only makes sense with a palette.
  #[error("cannot have a hIST chunk without a PLTE chunk")]
  HistWithoutPalette,

  /// `tRNS` given for a color type that already has an alpha channel.
  #[error("tRNS chunk encountered, color type {0:?} does not support it")]
  TrnsNotAllowed(PngColorType),

  /// `hIST` needs exactly one entry per palette entry.
  #[error("hIST has {hist} entries but PLTE has {palette}")]
  HistLenMismatch { hist: usize, palette: usize },

  /// A chunk payload longer than the format's 2^31 - 1 limit.
  #[error("chunk payload limit {limit} exceeds 2^31 - 1")]
  ChunkTooLarge { limit: u32 },

  /// The zlib stream in the `IDAT` chunks couldn't be recoded.
  #[error(transparent)]
  Inflate(#[from] InflateError),
}

/// Result alias for the PNG layer.
#[cfg(feature = "png")]
pub type PngResult<T> = Result<T, PngError>;

#[test]
fn test_error_messages_carry_values() {
  use alloc::format;
  let e = InflateError::StoredLengthMismatch { len: 0x0005, nlen: 0x0000 };
  assert_eq!(format!("{e}"), "corrupt stored-block header: LEN 0x0005, NLEN 0x0000");
  let e = InflateError::OversubscribedCode { code: CodeKind::Distance };
  assert_eq!(format!("{e}"), "distance code is over-subscribed");
}
