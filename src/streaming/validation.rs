//! Inline sort validation for the streaming pipeline.
//!
//! Window aggregation is only correct on sorted input, so order is checked
//! record by record as lines are parsed. A violation is fatal.
//!
//! Sort validation checks that:
//! 1. All records for a chromosome are contiguous (no interleaving)
//! 2. Within a chromosome, start positions are non-decreasing
//!
//! Any consistent chromosome ordering is accepted (lexicographic, genome
//! order, or whatever order the producer used).

use crate::bed::BedError;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Inline sort validator for use within streaming loops.
///
/// Also interns chromosome names: every record of one chromosome shares
/// the same `Arc<str>`.
#[derive(Debug, Default)]
pub struct SortValidator {
    current: Option<Arc<str>>,
    prev_start: u64,
    seen_chroms: FxHashSet<Arc<str>>,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that a record at `line` keeps the input sorted.
    ///
    /// Returns the shared chromosome name on success. On failure the
    /// validator state is left untouched.
    #[inline]
    pub fn validate(&mut self, chrom: &str, start: u64, line: usize) -> Result<Arc<str>, BedError> {
        if let Some(ref current) = self.current {
            if **current == *chrom {
                if start < self.prev_start {
                    return Err(BedError::UnsortedInput {
                        line,
                        message: format!(
                            "position {} comes after {} on {}",
                            start, self.prev_start, chrom
                        ),
                    });
                }
                self.prev_start = start;
                self.record_count += 1;
                return Ok(current.clone());
            }
            // Switching chromosomes - check we haven't seen this one before
            if self.seen_chroms.contains(chrom) {
                return Err(BedError::UnsortedInput {
                    line,
                    message: format!(
                        "chromosome '{}' was seen earlier (chromosomes must be contiguous)",
                        chrom
                    ),
                });
            }
            self.seen_chroms.insert(current.clone());
        }

        let chrom: Arc<str> = Arc::from(chrom);
        self.current = Some(chrom.clone());
        self.prev_start = start;
        self.record_count += 1;
        Ok(chrom)
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of distinct chromosomes accepted so far.
    pub fn chrom_count(&self) -> usize {
        self.seen_chroms.len() + usize::from(self.current.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_validator() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr1", 100, 1).is_ok());
        assert!(validator.validate("chr1", 100, 2).is_ok());
        assert!(validator.validate("chr1", 200, 3).is_ok());
        assert!(validator.validate("chr2", 100, 4).is_ok());
        assert_eq!(validator.record_count(), 4);
        assert_eq!(validator.chrom_count(), 2);
    }

    #[test]
    fn test_sort_validator_shares_chrom_name() {
        let mut validator = SortValidator::new();
        let a = validator.validate("chr1", 1, 1).unwrap();
        let b = validator.validate("chr1", 2, 2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_sort_validator_decreasing_start() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr1", 200, 1).is_ok());
        let err = validator.validate("chr1", 100, 2).unwrap_err();
        assert!(matches!(err, BedError::UnsortedInput { line: 2, .. }));
        assert!(err.to_string().contains("not sorted"));
        // State untouched: a valid follow-up still passes
        assert!(validator.validate("chr1", 200, 3).is_ok());
    }

    #[test]
    fn test_sort_validator_interleaved_chrom() {
        // chr1 appears, then chr2, then chr1 again - this is invalid
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr1", 100, 1).is_ok());
        assert!(validator.validate("chr2", 100, 2).is_ok());
        let err = validator.validate("chr1", 300, 3).unwrap_err();
        assert!(matches!(err, BedError::UnsortedInput { line: 3, .. }));
        assert!(err.to_string().contains("seen earlier"));
    }

    #[test]
    fn test_sort_validator_any_chrom_order() {
        // chr2 before chr1 is valid as long as chromosomes are contiguous
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr2", 500, 1).is_ok());
        assert!(validator.validate("chr1", 100, 2).is_ok());
    }
}
