//! Streaming BED record parser and the crate error type.

use crate::config::WindowConfig;
use crate::interval::{IntervalRecord, Score};
use crate::streaming::parsing::{
    parse_score, parse_u64_fast, should_skip_line, tab_fields, trim_line_end,
};
use crate::streaming::validation::SortValidator;
use std::io;
use thiserror::Error;

/// Errors that can occur while compressing a BED stream.
///
/// None of these are retried: each one is a deterministic property of the
/// input or configuration.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("Input not sorted at line {line}: {message}")]
    UnsortedInput { line: usize, message: String },

    #[error("Invalid window parameters: {0}")]
    InvalidWindowParams(String),

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Non-numeric score '{value}' in column {column} at line {line}")]
    NonNumericScore {
        line: usize,
        column: usize,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Line-at-a-time record parser.
///
/// Validates shape, coordinates, the score column and sort order. Lines are
/// numbered from 1; skipped header and comment lines still advance the count.
#[derive(Debug)]
pub struct RecordParser {
    score_column: usize,
    numeric_scores: bool,
    bedtools_compatible: bool,
    validator: SortValidator,
    line_number: usize,
}

impl RecordParser {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            score_column: config.score_column,
            numeric_scores: config.operation.requires_numeric(),
            bedtools_compatible: config.bedtools_compatible,
            validator: SortValidator::new(),
            line_number: 0,
        }
    }

    /// Parse one input line.
    ///
    /// Returns `Ok(None)` for blank, comment, `track` and `browser` lines.
    pub fn parse_line(&mut self, line: &[u8]) -> Result<Option<IntervalRecord>> {
        self.line_number += 1;
        let line = trim_line_end(line);
        if should_skip_line(line) {
            return Ok(None);
        }
        self.parse_record(line).map(Some)
    }

    fn parse_record(&mut self, line: &[u8]) -> Result<IntervalRecord> {
        let line = std::str::from_utf8(line)
            .map_err(|_| self.malformed("line is not valid UTF-8".to_string()))?;

        let mut fields = tab_fields(line.as_bytes());
        let (chrom, start, end) = match (fields.next(), fields.next(), fields.next()) {
            (Some(chrom), Some(start), Some(end)) => (chrom, start, end),
            _ => {
                return Err(self.malformed(format!(
                    "expected at least {} fields, got {}",
                    self.min_fields(),
                    tab_fields(line.as_bytes()).count()
                )))
            }
        };

        // Every byte slice here is a sub-slice of a valid &str split on an ASCII tab.
        let extra: Vec<String> = fields
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        let field_count = 3 + extra.len();
        if field_count < self.min_fields() {
            return Err(self.malformed(format!(
                "expected at least {} fields, got {}",
                self.min_fields(),
                field_count
            )));
        }

        let chrom = String::from_utf8_lossy(chrom);
        if chrom.is_empty() {
            return Err(self.malformed("empty chromosome name".to_string()));
        }
        let start = self.parse_position(start, "start")?;
        let mut end = self.parse_position(end, "end")?;

        if self.bedtools_compatible && start == end {
            end = start.saturating_add(1);
        }
        if start >= end {
            return Err(self.malformed(format!(
                "start ({}) must be less than end ({})",
                start, end
            )));
        }

        let raw_score = self
            .score_column
            .checked_sub(4)
            .and_then(|i| extra.get(i))
            .ok_or_else(|| self.malformed(format!("no score column {}", self.score_column)))?;
        let score = if self.numeric_scores {
            match parse_score(raw_score) {
                Some(v) => Score::Numeric(v),
                None => {
                    return Err(BedError::NonNumericScore {
                        line: self.line_number,
                        column: self.score_column,
                        value: raw_score.clone(),
                    })
                }
            }
        } else {
            Score::Text(raw_score.clone())
        };

        let chrom = self.validator.validate(&chrom, start, self.line_number)?;

        Ok(IntervalRecord {
            chrom,
            start,
            end,
            score,
            fields: extra,
            line: self.line_number,
        })
    }

    fn parse_position(&self, s: &[u8], field_name: &str) -> Result<u64> {
        parse_u64_fast(s).ok_or_else(|| {
            self.malformed(format!(
                "invalid {} position: '{}'",
                field_name,
                String::from_utf8_lossy(s)
            ))
        })
    }

    #[inline]
    fn min_fields(&self) -> usize {
        self.score_column.max(3)
    }

    fn malformed(&self, message: String) -> BedError {
        BedError::MalformedRecord {
            line: self.line_number,
            message,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of records accepted so far.
    pub fn records_parsed(&self) -> usize {
        self.validator.record_count()
    }

    /// Number of distinct chromosomes accepted so far.
    pub fn chrom_count(&self) -> usize {
        self.validator.chrom_count()
    }
}

/// Parse every record of an in-memory BED text (useful for testing).
pub fn parse_records(content: &str, config: &WindowConfig) -> Result<Vec<IntervalRecord>> {
    let mut parser = RecordParser::new(config);
    let mut records = Vec::new();
    for line in content.lines() {
        if let Some(record) = parser.parse_line(line.as_bytes())? {
            records.push(record);
        }
    }
    Ok(records)
}
