#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_debug_implementations)]

//! Decodes the DEFLATE stream inside a PNG and stores it again, uncompressed.
//!
//! The output is a valid PNG whose `IDAT` chunks hold a zlib stream made only
//! of stored blocks. Every pixel byte survives unchanged, but none of it is
//! compressed any more, which makes the file easy to diff, patch, or feed to
//! tools that can't inflate.
//!
//! ## Layers
//!
//! * [`BitCursor`] reads the DEFLATE bitstream.
//! * [`HuffmanTable`] builds canonical codes and decodes symbols with them.
//! * [`Inflater`] runs the block state machine (stored, fixed Huffman, and
//!   dynamic Huffman blocks) and expands LZ77 back-references.
//! * [`inflate_zlib`] handles the zlib header and the Adler-32 trailer.
//! * [`repack_stored`] frames decoded bytes as stored blocks again.
//! * [`recode_zlib`] does all of the above under a set of [`RecodeOptions`].
//! * [`png`] (with the `png` feature) does the container side: chunk CRCs,
//!   chunk ordering, and swapping the `IDAT` run.
//!
//! Everything is decoded fully in memory, and any malformed input is an
//! error rather than a partial result.

#[macro_use]
extern crate alloc;
use alloc::vec::Vec;

use core::num::{NonZeroU16, NonZeroU32};

use tracing::{debug, trace, warn};

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod parser_helpers;
pub(crate) use parser_helpers::*;

mod error;
pub use error::*;

mod bit_cursor;
pub use bit_cursor::*;

mod crc32;
pub use crc32::*;

mod adler32;
pub use adler32::*;

mod huffman;
pub use huffman::*;

mod symbol;
pub(crate) use symbol::*;

mod code_lengths;
pub use code_lengths::{MAX_DIST_CODES, MAX_LIT_LEN_CODES};
pub(crate) use code_lengths::*;

mod inflate;
pub use inflate::*;

mod zlib;
pub use zlib::*;

mod repack;
pub use repack::*;

mod recode;
pub use recode::*;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;
#[cfg(feature = "png")]
pub use png::{recode_png, Png, RecodedPng};

#[cfg(test)]
mod bit_packer;
