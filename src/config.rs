//! Runtime configuration for window compression.
//!
//! A `WindowConfig` is built once, validated once, and then read by every
//! stage of the pipeline. Invalid parameters are rejected before any input
//! is consumed.

use crate::aggregate::Operation;
use crate::bed::{BedError, Result};

/// Default 1-based score column (BED5 score).
pub const DEFAULT_SCORE_COLUMN: usize = 5;

/// Default separator for `collapse`.
pub const DEFAULT_DELIMITER: &str = ",";

/// Window compression configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Window width in bases.
    pub window_size: u64,
    /// Distance between consecutive window starts (None = window_size).
    pub step_size: Option<u64>,
    /// 1-based column holding the score.
    pub score_column: usize,
    /// Reduction applied to the scores of each window.
    pub operation: Operation,
    /// Separator used by `collapse`.
    pub delimiter: String,
    /// Fixed number of decimals for float output.
    pub precision: Option<usize>,
    /// Widen zero-length records (start == end) to 1bp instead of rejecting them.
    pub bedtools_compatible: bool,
}

impl WindowConfig {
    /// Create a configuration with non-sliding windows of `window_size`.
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size,
            step_size: None,
            score_column: DEFAULT_SCORE_COLUMN,
            operation: Operation::Sum,
            delimiter: DEFAULT_DELIMITER.to_string(),
            precision: None,
            bedtools_compatible: false,
        }
    }

    /// Set the step between window starts.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step_size = Some(step);
        self
    }

    /// Set the 1-based score column.
    pub fn with_score_column(mut self, column: usize) -> Self {
        self.score_column = column;
        self
    }

    /// Set the reduction operator.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Set the reduction operator by name.
    pub fn with_operation_name(mut self, name: &str) -> Result<Self> {
        self.operation = name.parse()?;
        Ok(self)
    }

    /// Set the `collapse` separator.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Print floats with a fixed number of decimals.
    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    /// Enable bedtools-compatible zero-length handling.
    pub fn with_bedtools_compatible(mut self, enabled: bool) -> Self {
        self.bedtools_compatible = enabled;
        self
    }

    /// Effective step size.
    #[inline]
    pub fn step(&self) -> u64 {
        self.step_size.unwrap_or(self.window_size)
    }

    /// Check the configuration before any processing begins.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(BedError::InvalidWindowParams(
                "window size must be greater than 0".to_string(),
            ));
        }
        if self.step() == 0 {
            return Err(BedError::InvalidWindowParams(
                "step size must be greater than 0".to_string(),
            ));
        }
        if self.score_column < 4 {
            return Err(BedError::InvalidWindowParams(format!(
                "score column must be 4 or greater (columns 1-3 are chrom, start, end), got {}",
                self.score_column
            )));
        }
        Ok(())
    }
}
