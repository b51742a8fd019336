use super::*;

use core::ops::Range;

/// Chunks that may appear at most once.
const SINGLETONS: [PngChunkTy; 13] = [
  PngChunkTy::IHDR,
  PngChunkTy::PLTE,
  PngChunkTy::IEND,
  PngChunkTy::cHRM,
  PngChunkTy::gAMA,
  PngChunkTy::iCCP,
  PngChunkTy::sBIT,
  PngChunkTy::sRGB,
  PngChunkTy::bKGD,
  PngChunkTy::hIST,
  PngChunkTy::tRNS,
  PngChunkTy::pHYs,
  PngChunkTy::tIME,
];

/// Tracks the chunk sequence of a PNG as it's read, one chunk at a time.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChunkRules {
  seen: [bool; SINGLETONS.len()],
  count: usize,
  idat: Option<Range<usize>>,
  previous_was_idat: bool,
}
impl ChunkRules {
  /// Accepts the next chunk's type, or says which rule it breaks.
  pub fn see(&mut self, ty: PngChunkTy) -> PngResult<()> {
    if self.count == 0 && ty != PngChunkTy::IHDR {
      return Err(PngError::FirstChunkNotIHDR);
    }
    if self.seen_ty(PngChunkTy::IEND) {
      return Err(PngError::DataAfterIEND);
    }
    if let Some(i) = SINGLETONS.iter().position(|&s| s == ty) {
      if self.seen[i] {
        return Err(PngError::DuplicateChunk(ty));
      }
      self.seen[i] = true;
    }
    let is_idat = ty == PngChunkTy::IDAT;
    if is_idat {
      match self.idat.as_mut() {
        None => self.idat = Some(self.count..self.count + 1),
        Some(run) if self.previous_was_idat => run.end += 1,
        Some(_) => return Err(PngError::IdatNotConsecutive),
      }
    }
    self.previous_was_idat = is_idat;
    self.count += 1;
    Ok(())
  }

  /// Checks what has to hold once every chunk is in, giving the index range
  /// of the `IDAT` run.
  pub fn finish(self) -> PngResult<Range<usize>> {
    if self.count == 0 {
      return Err(PngError::MissingChunk(PngChunkTy::IHDR));
    }
    let idat = self.idat.clone().ok_or(PngError::MissingChunk(PngChunkTy::IDAT))?;
    if !self.seen_ty(PngChunkTy::IEND) {
      return Err(PngError::MissingChunk(PngChunkTy::IEND));
    }
    if self.seen_ty(PngChunkTy::hIST) && !self.seen_ty(PngChunkTy::PLTE) {
      return Err(PngError::HistWithoutPalette);
    }
    Ok(idat)
  }

  fn seen_ty(&self, ty: PngChunkTy) -> bool {
    SINGLETONS.iter().position(|&s| s == ty).is_some_and(|i| self.seen[i])
  }
}

/// Checks the ancillary chunks whose size or presence depends on another
/// chunk's contents.
pub(crate) fn check_ancillary(ihdr: &IHDR, chunks: &[RawPngChunk<'_>]) -> PngResult<()> {
  let find = |ty: PngChunkTy| chunks.iter().find(|chunk| chunk.ty == ty);
  if find(PngChunkTy::tRNS).is_some()
    && matches!(ihdr.color_type, PngColorType::YA | PngColorType::RGBA)
  {
    return Err(PngError::TrnsNotAllowed(ihdr.color_type));
  }
  if let (Some(hist), Some(plte)) = (find(PngChunkTy::hIST), find(PngChunkTy::PLTE)) {
    let (hist, palette) = (hist.data.len() / 2, plte.data.len() / 3);
    if hist != palette {
      return Err(PngError::HistLenMismatch { hist, palette });
    }
  }
  Ok(())
}

#[cfg(test)]
fn run_rules(tys: &[PngChunkTy]) -> PngResult<Range<usize>> {
  let mut rules = ChunkRules::default();
  for &ty in tys {
    rules.see(ty)?;
  }
  rules.finish()
}

#[test]
fn test_chunk_rules() {
  use PngChunkTy as T;
  let text = PngChunkTy(*b"tEXt");
  assert_eq!(run_rules(&[T::IHDR, T::IDAT, T::IEND]), Ok(1..2));
  assert_eq!(run_rules(&[T::IHDR, text, T::IDAT, T::IDAT, T::IDAT, text, T::IEND]), Ok(2..5));
  assert_eq!(run_rules(&[T::PLTE, T::IHDR]), Err(PngError::FirstChunkNotIHDR));
  assert_eq!(run_rules(&[]), Err(PngError::MissingChunk(T::IHDR)));
  assert_eq!(run_rules(&[T::IHDR, T::IHDR]), Err(PngError::DuplicateChunk(T::IHDR)));
  assert_eq!(
    run_rules(&[T::IHDR, T::gAMA, T::gAMA]),
    Err(PngError::DuplicateChunk(T::gAMA))
  );
  assert_eq!(
    run_rules(&[T::IHDR, T::IDAT, text, T::IDAT, T::IEND]),
    Err(PngError::IdatNotConsecutive)
  );
  assert_eq!(run_rules(&[T::IHDR, T::IEND]), Err(PngError::MissingChunk(T::IDAT)));
  assert_eq!(run_rules(&[T::IHDR, T::IDAT]), Err(PngError::MissingChunk(T::IEND)));
  assert_eq!(run_rules(&[T::IHDR, T::IDAT, T::IEND, text]), Err(PngError::DataAfterIEND));
  assert_eq!(
    run_rules(&[T::IHDR, T::hIST, T::IDAT, T::IEND]),
    Err(PngError::HistWithoutPalette)
  );
  assert_eq!(run_rules(&[T::IHDR, T::PLTE, T::hIST, T::IDAT, T::IEND]), Ok(3..4));
}

#[test]
fn test_ancillary_checks() {
  use PngChunkTy as T;
  let chunk = |ty: PngChunkTy, data: &'static [u8]| RawPngChunk { ty, data, declared_crc: 0 };
  let ihdr = |color_type: PngColorType| IHDR {
    width: 1,
    height: 1,
    bit_depth: 8,
    color_type,
    is_interlaced: false,
  };
  let trns: &'static [u8] = &[0, 0];
  for color_type in [PngColorType::Y, PngColorType::RGB, PngColorType::Index] {
    assert_eq!(check_ancillary(&ihdr(color_type), &[chunk(T::tRNS, trns)]), Ok(()));
  }
  for color_type in [PngColorType::YA, PngColorType::RGBA] {
    assert_eq!(
      check_ancillary(&ihdr(color_type), &[chunk(T::tRNS, trns)]),
      Err(PngError::TrnsNotAllowed(color_type))
    );
  }

  let plte: &'static [u8] = &[0; 6];
  let index = ihdr(PngColorType::Index);
  assert_eq!(check_ancillary(&index, &[chunk(T::PLTE, plte), chunk(T::hIST, &[0; 4])]), Ok(()));
  assert_eq!(
    check_ancillary(&index, &[chunk(T::PLTE, plte), chunk(T::hIST, &[0; 10])]),
    Err(PngError::HistLenMismatch { hist: 5, palette: 2 })
  );
}
