//! Deterministic, clock-driven image selection.
//!
//! The active image is a pure function of the local wall-clock minute, so
//! every engine instance (and every restart) rendering the same minute agrees
//! on which image is up.

use chrono::NaiveDateTime;

use crate::error::Error;

/// 2020-01-01T00:00:00, expressed as seconds on the naive (wall-clock) timeline.
const SLIDE_EPOCH_SECS: i64 = 1_577_836_800;
const SECS_PER_BUCKET: i64 = 60;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Walk the folder in order, one image per minute.
    #[default]
    Sequential,
    /// Scramble the minute so consecutive minutes land on unrelated images.
    Shuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub changed: bool,
}

/// Whole minutes elapsed since the slideshow epoch, truncated toward zero.
pub fn time_bucket(now: NaiveDateTime) -> i64 {
    (now.and_utc().timestamp() - SLIDE_EPOCH_SECS) / SECS_PER_BUCKET
}

fn selection_key(bucket: i64, mode: SelectionMode) -> i64 {
    match mode {
        SelectionMode::Sequential => bucket,
        SelectionMode::Shuffle => fnv1a64(bucket.to_string().as_bytes()) as i64,
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Pick the image index for `now` out of `set_size` candidates.
///
/// # Errors
/// Returns [`Error::EmptyImageSet`] when `set_size` is zero.
pub fn select(
    now: NaiveDateTime,
    set_size: usize,
    previous: Option<usize>,
    mode: SelectionMode,
) -> Result<Selection, Error> {
    if set_size == 0 {
        return Err(Error::EmptyImageSet);
    }
    let key = selection_key(time_bucket(now), mode);
    let index = (key.unsigned_abs() % set_size as u64) as usize;
    Ok(Selection {
        index,
        changed: previous != Some(index),
    })
}

/// Remembers the last committed index so callers can tell when the image changes.
#[derive(Debug, Clone)]
pub struct Selector {
    mode: SelectionMode,
    committed: Option<usize>,
}

impl Selector {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            committed: None,
        }
    }

    pub fn committed(&self) -> Option<usize> {
        self.committed
    }

    pub fn select(&self, now: NaiveDateTime, set_size: usize) -> Result<Selection, Error> {
        select(now, set_size, self.committed, self.mode)
    }

    /// Record `index` as on screen. Only call once its raster decoded.
    pub fn commit(&mut self, index: usize) {
        self.committed = Some(index);
    }
}
