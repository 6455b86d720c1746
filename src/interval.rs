//! Core record and window types.
//!
//! All coordinates are 0-based, half-open (BED convention).

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::streaming::output::format_float;

/// Half-open overlap test: `[a_start, a_end)` and `[b_start, b_end)` share
/// at least one base. Touching intervals do not overlap.
#[inline(always)]
pub fn overlaps(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Value of the score column for one record.
///
/// Numeric operators get their scores parsed once at ingestion, so the
/// aggregation loop never touches text for them.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Numeric(f64),
    Text(String),
}

impl Score {
    /// Numeric value, if this score was parsed as a number.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Numeric(v) => Some(*v),
            Score::Text(_) => None,
        }
    }

    /// Textual form of the score.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Score::Text(s) => Cow::Borrowed(s.as_str()),
            Score::Numeric(v) => Cow::Owned(format_float(*v, None)),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// One parsed input line.
///
/// The chromosome name is shared with every other record of the same
/// chromosome block.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub chrom: Arc<str>,
    pub start: u64,
    pub end: u64,
    pub score: Score,
    /// Columns after the third, verbatim.
    pub fields: Vec<String>,
    /// 1-based input line the record came from (0 when built in code).
    pub line: usize,
}

impl IntervalRecord {
    pub fn new(chrom: impl Into<Arc<str>>, start: u64, end: u64, score: Score) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            score,
            fields: Vec::new(),
            line: 0,
        }
    }

    /// Check if this record overlaps the given window.
    #[inline]
    pub fn overlaps(&self, window: &Window) -> bool {
        overlaps(self.start, self.end, window.start, window.end)
    }
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)?;
        for field in &self.fields {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

/// A generated window. `index` is the emission order within its chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    pub chrom: Arc<str>,
    pub start: u64,
    pub end: u64,
    pub index: usize,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// Result of a reduction over one window.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Int(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AggregateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateValue::Int(n) => write!(f, "{}", n),
            AggregateValue::Float(v) => f.write_str(&format_float(*v, None)),
            AggregateValue::Text(s) => f.write_str(s),
        }
    }
}

/// One output row: a non-empty window and its aggregated score.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    pub chrom: Arc<str>,
    pub start: u64,
    pub end: u64,
    pub value: AggregateValue,
}

impl fmt::Display for WindowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom, self.start, self.end, self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_overlap() {
        assert!(overlaps(100, 200, 150, 250));
        assert!(!overlaps(100, 200, 200, 300)); // Adjacent, not overlapping
        assert!(!overlaps(200, 300, 100, 200));
        assert!(overlaps(100, 400, 150, 160)); // Contained
    }

    #[test]
    fn test_record_overlaps_window() {
        let rec = IntervalRecord::new("chr1", 3, 8, Score::Numeric(20.0));
        let w0 = Window {
            chrom: rec.chrom.clone(),
            start: 0,
            end: 5,
            index: 0,
        };
        let w1 = Window {
            chrom: rec.chrom.clone(),
            start: 8,
            end: 13,
            index: 1,
        };
        assert!(rec.overlaps(&w0));
        assert!(!rec.overlaps(&w1));
    }

    #[test]
    fn test_record_display_keeps_extra_columns() {
        let mut rec = IntervalRecord::new("chr1", 100, 200, Score::Text("5".into()));
        rec.fields = vec!["gene1".into(), "5".into(), "+".into()];
        assert_eq!(rec.to_string(), "chr1\t100\t200\tgene1\t5\t+");
    }

    #[test]
    fn test_window_result_display() {
        let result = WindowResult {
            chrom: Arc::from("chr1"),
            start: 0,
            end: 5,
            value: AggregateValue::Float(30.0),
        };
        assert_eq!(result.to_string(), "chr1\t0\t5\t30");

        let result = WindowResult {
            value: AggregateValue::Float(2.5),
            ..result
        };
        assert_eq!(result.to_string(), "chr1\t0\t5\t2.5");
    }

    #[test]
    fn test_score_text() {
        assert_eq!(Score::Numeric(7.0).text(), "7");
        assert_eq!(Score::Text("a".into()).text(), "a");
        assert_eq!(Score::Numeric(0.25).as_f64(), Some(0.25));
        assert_eq!(Score::Text("0.25".into()).as_f64(), None);
    }
}
