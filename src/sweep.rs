//! Overlap Matcher: sweep-line join of windows against records.
//!
//! # Algorithm
//!
//! Both inputs are sorted by start within one chromosome. For each window
//! `w`, in order:
//! 1. Admit every not-yet-admitted record with `start < w.end`. Records are
//!    scanned once and never rewound.
//! 2. Evict every active record with `end <= w.start`. Window starts never
//!    decrease, so such a record cannot overlap `w` or any later window.
//! 3. Every survivor overlaps `w`; emit one pair per survivor.
//!
//! A record is never evicted just because it matched: sliding windows
//! overlap each other, so one record can pair with several windows.
//!
//! # Complexity
//!
//! O(N + M + P) for N records, M windows and P emitted pairs.

use crate::interval::{IntervalRecord, Window};
use crate::streaming::active_set::ActiveSet;
use std::iter::FusedIterator;

/// One (window, record) match. Consumed immediately by the aggregator.
#[derive(Debug, Clone)]
pub struct OverlapPair<'a> {
    pub window: Window,
    pub record: &'a IntervalRecord,
    /// Position of `record` in its chromosome block.
    pub record_index: usize,
}

/// Streams overlap pairs window by window.
///
/// Pairs come out grouped by window, windows in sequence order, and records
/// within a window in input order. Windows without any overlapping record
/// produce no pairs.
#[derive(Debug)]
pub struct OverlapMatcher<'a, W> {
    records: &'a [IntervalRecord],
    windows: W,
    next_record: usize,
    active: ActiveSet<usize>,
    current: Option<Window>,
    cursor: usize,
    windows_visited: usize,
    pairs_emitted: usize,
}

impl<'a, W> OverlapMatcher<'a, W>
where
    W: Iterator<Item = Window>,
{
    /// Join `windows` against `records`; both must be sorted by start.
    pub fn new(records: &'a [IntervalRecord], windows: W) -> Self {
        Self {
            records,
            windows,
            next_record: 0,
            active: ActiveSet::new(),
            current: None,
            cursor: 0,
            windows_visited: 0,
            pairs_emitted: 0,
        }
    }

    /// Move to the next window that has at least one overlapping record.
    ///
    /// Returns false once no later window can match.
    fn advance_window(&mut self) -> bool {
        let records = self.records;
        loop {
            // Everything admitted and expired: remaining windows are empty.
            if self.next_record == records.len() && self.active.is_empty() {
                self.current = None;
                return false;
            }

            let Some(window) = self.windows.next() else {
                self.current = None;
                return false;
            };
            debug_assert!(
                self.current.as_ref().map_or(true, |prev| prev.start <= window.start),
                "windows must be sorted by start"
            );
            self.windows_visited += 1;

            while self.next_record < records.len() && records[self.next_record].start < window.end
            {
                debug_assert!(
                    self.next_record == 0
                        || records[self.next_record - 1].start <= records[self.next_record].start,
                    "records must be sorted by start"
                );
                self.active.push(self.next_record);
                self.next_record += 1;
            }

            self.active.evict_where(|&i| records[i].end <= window.start);

            self.cursor = 0;
            self.current = Some(window);
            if !self.active.is_empty() {
                return true;
            }
        }
    }

    /// Number of windows examined so far.
    pub fn windows_visited(&self) -> usize {
        self.windows_visited
    }

    /// Number of pairs produced so far.
    pub fn pairs_emitted(&self) -> usize {
        self.pairs_emitted
    }

    /// Largest active set seen so far.
    pub fn max_active(&self) -> usize {
        self.active.max_active()
    }
}

impl<'a, W> Iterator for OverlapMatcher<'a, W>
where
    W: Iterator<Item = Window>,
{
    type Item = OverlapPair<'a>;

    #[inline]
    fn next(&mut self) -> Option<OverlapPair<'a>> {
        let records = self.records;
        loop {
            if let Some(ref window) = self.current {
                if let Some(&index) = self.active.get(self.cursor) {
                    self.cursor += 1;
                    self.pairs_emitted += 1;
                    return Some(OverlapPair {
                        window: window.clone(),
                        record: &records[index],
                        record_index: index,
                    });
                }
            }
            if !self.advance_window() {
                return None;
            }
        }
    }
}

impl<'a, W> FusedIterator for OverlapMatcher<'a, W> where W: FusedIterator<Item = Window> {}
