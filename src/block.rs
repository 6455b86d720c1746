//! Chromosome Block Buffer.
//!
//! Holds every record of the chromosome currently being read. Sorted input
//! makes each chromosome contiguous, so one block is resident at a time and
//! memory is bounded by the largest chromosome, not the whole file.
//!
//! The block is an arena: records are addressed by their position in it, and
//! `clear` keeps the allocation for the next chromosome.

use crate::interval::IntervalRecord;
use crate::streaming::buffers::DEFAULT_BLOCK_CAPACITY;
use std::sync::Arc;

/// Bounding box `[min_start, max_end)` of a chromosome's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub min_start: u64,
    pub max_end: u64,
}

impl Extent {
    #[inline]
    pub fn new(min_start: u64, max_end: u64) -> Self {
        Self { min_start, max_end }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.max_end.saturating_sub(self.min_start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_start >= self.max_end
    }
}

/// Records of one chromosome, in input order, with an incrementally tracked extent.
#[derive(Debug)]
pub struct ChromosomeBlock {
    chrom: Option<Arc<str>>,
    records: Vec<IntervalRecord>,
    min_start: u64,
    max_end: u64,
    sealed: bool,
    peak_len: usize,
}

impl Default for ChromosomeBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromosomeBlock {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BLOCK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chrom: None,
            records: Vec::with_capacity(capacity),
            min_start: u64::MAX,
            max_end: 0,
            sealed: false,
            peak_len: 0,
        }
    }

    /// Append a record.
    ///
    /// The record must belong to this block's chromosome and must not start
    /// before the previous record; the parser has already rejected input that
    /// breaks either rule.
    #[inline]
    pub fn push(&mut self, record: IntervalRecord) {
        debug_assert!(!self.sealed, "push into a sealed block");
        debug_assert!(
            self.chrom.as_deref().map_or(true, |c| c == &*record.chrom),
            "record from another chromosome pushed into block"
        );
        debug_assert!(
            self.records.last().map_or(true, |prev| prev.start <= record.start),
            "records within a block must be sorted by start"
        );

        if self.chrom.is_none() {
            self.chrom = Some(record.chrom.clone());
        }
        self.min_start = self.min_start.min(record.start);
        // Ends are not monotonic: a long early record can outlast later ones.
        self.max_end = self.max_end.max(record.end);
        self.records.push(record);
        self.peak_len = self.peak_len.max(self.records.len());
    }

    /// Mark the block read-only; windowing may begin.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Chromosome of this block, if it holds any record.
    #[inline]
    pub fn chrom(&self) -> Option<&Arc<str>> {
        self.chrom.as_ref()
    }

    /// Bounding box of the records, if any.
    #[inline]
    pub fn extent(&self) -> Option<Extent> {
        if self.records.is_empty() {
            None
        } else {
            Some(Extent::new(self.min_start, self.max_end))
        }
    }

    #[inline]
    pub fn records(&self) -> &[IntervalRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest number of records held at once since creation.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    /// Discard the records and reopen the block for the next chromosome.
    pub fn clear(&mut self) {
        self.records.clear();
        self.chrom = None;
        self.min_start = u64::MAX;
        self.max_end = 0;
        self.sealed = false;
    }
}
