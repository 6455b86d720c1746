//! Window generation over a chromosome extent.
//!
//! Windows start at `min_start + k * step` for every `k` whose start is
//! still below `max_end`. Each window is `size` wide, except that the end
//! is clipped to `max_end`: no window reaches past the last record.

use crate::bed::{BedError, Result};
use crate::block::Extent;
use crate::interval::Window;
use std::iter::FusedIterator;
use std::sync::Arc;

/// Lazy, finite sequence of windows for one chromosome.
///
/// A clone continues from the same position as the original.
#[derive(Debug, Clone)]
pub struct WindowGenerator {
    chrom: Arc<str>,
    next_start: u64,
    max_end: u64,
    size: u64,
    step: u64,
    next_index: usize,
    exhausted: bool,
}

impl WindowGenerator {
    /// Create a generator for `extent` with windows of `size` every `step` bases.
    pub fn new(chrom: Arc<str>, extent: Extent, size: u64, step: u64) -> Result<Self> {
        if size == 0 {
            return Err(BedError::InvalidWindowParams(
                "window size must be greater than 0".to_string(),
            ));
        }
        if step == 0 {
            return Err(BedError::InvalidWindowParams(
                "step size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            chrom,
            next_start: extent.min_start,
            max_end: extent.max_end,
            size,
            step,
            next_index: 0,
            exhausted: extent.min_start >= extent.max_end,
        })
    }

    /// Number of windows not yet produced.
    pub fn remaining(&self) -> usize {
        if self.exhausted {
            return 0;
        }
        let span = self.max_end - self.next_start;
        span.div_ceil(self.step) as usize
    }
}

impl Iterator for WindowGenerator {
    type Item = Window;

    #[inline]
    fn next(&mut self) -> Option<Window> {
        if self.exhausted {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.size).min(self.max_end);
        let window = Window {
            chrom: self.chrom.clone(),
            start,
            end,
            index: self.next_index,
        };

        self.next_index += 1;
        match start.checked_add(self.step) {
            Some(next) if next < self.max_end => self.next_start = next,
            _ => self.exhausted = true,
        }

        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for WindowGenerator {}

impl FusedIterator for WindowGenerator {}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(min_start: u64, max_end: u64, size: u64, step: u64) -> Vec<(u64, u64)> {
        WindowGenerator::new(Arc::from("chr1"), Extent { min_start, max_end }, size, step)
            .unwrap()
            .map(|w| (w.start, w.end))
            .collect()
    }

    #[test]
    fn test_non_sliding_tiles_extent() {
        assert_eq!(windows(0, 10, 5, 5), vec![(0, 5), (5, 10)]);

        let tiles = windows(100, 1_050, 100, 100);
        assert_eq!(tiles.len(), 10);
        assert_eq!(tiles.first(), Some(&(100, 200)));
        assert_eq!(tiles.last(), Some(&(1_000, 1_050)));
        for pair in tiles.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "gap or overlap between tiles");
        }
    }

    #[test]
    fn test_sliding_windows() {
        let w = windows(0, 20, 10, 5);
        assert_eq!(w, vec![(0, 10), (5, 15), (10, 20), (15, 20)]);
        for (k, (start, _)) in w.iter().enumerate() {
            assert_eq!(*start, k as u64 * 5);
        }
    }

    #[test]
    fn test_extent_smaller_than_window() {
        assert_eq!(windows(0, 3, 10, 10), vec![(0, 3)]);
        assert_eq!(windows(40, 43, 10, 2), vec![(40, 43), (42, 43)]);
    }

    #[test]
    fn test_step_larger_than_window_leaves_gaps() {
        assert_eq!(windows(0, 25, 5, 10), vec![(0, 5), (10, 15), (20, 25)]);
    }

    #[test]
    fn test_indices_and_exact_size() {
        let gen = WindowGenerator::new(Arc::from("chr2"), Extent::new(0, 95), 10, 10).unwrap();
        assert_eq!(gen.len(), 10);
        let all: Vec<Window> = gen.collect();
        assert_eq!(all.len(), 10);
        assert!(all.iter().enumerate().all(|(i, w)| w.index == i));
        assert!(all.iter().all(|w| &*w.chrom == "chr2"));
    }

    #[test]
    fn test_regeneration_is_identical() {
        assert_eq!(windows(7, 1_234, 100, 33), windows(7, 1_234, 100, 33));
    }

    #[test]
    fn test_near_u64_max_does_not_overflow() {
        let w = windows(u64::MAX - 10, u64::MAX, 8, 8);
        assert_eq!(w, vec![(u64::MAX - 10, u64::MAX - 2), (u64::MAX - 2, u64::MAX)]);
    }

    #[test]
    fn test_invalid_params() {
        let extent = Extent::new(0, 10);
        assert!(matches!(
            WindowGenerator::new(Arc::from("chr1"), extent, 0, 5),
            Err(BedError::InvalidWindowParams(_))
        ));
        assert!(matches!(
            WindowGenerator::new(Arc::from("chr1"), extent, 5, 0),
            Err(BedError::InvalidWindowParams(_))
        ));
    }
}
