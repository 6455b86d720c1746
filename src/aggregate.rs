//! Reduction operators and the Streaming Aggregator.
//!
//! The operator is chosen once, at configuration time, as a closed enum.
//! Each window gets a fresh [`Accumulator`] of the matching variant, so the
//! per-record path never looks at operator names.

use crate::bed::{BedError, Result};
use crate::config::WindowConfig;
use crate::interval::{AggregateValue, Score, WindowResult};
use crate::streaming::parsing::parse_score;
use crate::sweep::OverlapPair;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

/// Operations for reducing the scores of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sum,
    Mean,
    Min,
    Max,
    AbsMin,
    AbsMax,
    Count,
    CountDistinct,
    Median,
    Mode,
    Antimode,
    Collapse,
    StdDev,
    SampleStdDev,
    First,
    Last,
}

impl Operation {
    /// Every supported operation.
    pub const ALL: [Operation; 16] = [
        Operation::Sum,
        Operation::Mean,
        Operation::Min,
        Operation::Max,
        Operation::AbsMin,
        Operation::AbsMax,
        Operation::Count,
        Operation::CountDistinct,
        Operation::Median,
        Operation::Mode,
        Operation::Antimode,
        Operation::Collapse,
        Operation::StdDev,
        Operation::SampleStdDev,
        Operation::First,
        Operation::Last,
    ];

    /// Canonical name, as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Sum => "sum",
            Operation::Mean => "mean",
            Operation::Min => "min",
            Operation::Max => "max",
            Operation::AbsMin => "absmin",
            Operation::AbsMax => "absmax",
            Operation::Count => "count",
            Operation::CountDistinct => "distinct",
            Operation::Median => "median",
            Operation::Mode => "mode",
            Operation::Antimode => "antimode",
            Operation::Collapse => "collapse",
            Operation::StdDev => "stddev",
            Operation::SampleStdDev => "sstdev",
            Operation::First => "first",
            Operation::Last => "last",
        }
    }

    /// Whether scores must parse as numbers for this operation.
    pub fn requires_numeric(self) -> bool {
        matches!(
            self,
            Operation::Sum
                | Operation::Mean
                | Operation::Min
                | Operation::Max
                | Operation::AbsMin
                | Operation::AbsMax
                | Operation::Median
                | Operation::StdDev
                | Operation::SampleStdDev
        )
    }
}

impl FromStr for Operation {
    type Err = BedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Operation::Sum),
            "mean" => Ok(Operation::Mean),
            "min" => Ok(Operation::Min),
            "max" => Ok(Operation::Max),
            "absmin" => Ok(Operation::AbsMin),
            "absmax" => Ok(Operation::AbsMax),
            "count" => Ok(Operation::Count),
            "distinct" | "count_distinct" => Ok(Operation::CountDistinct),
            "median" => Ok(Operation::Median),
            "mode" => Ok(Operation::Mode),
            "antimode" => Ok(Operation::Antimode),
            "collapse" => Ok(Operation::Collapse),
            "stddev" | "stdev" => Ok(Operation::StdDev),
            "sstdev" | "sstddev" => Ok(Operation::SampleStdDev),
            "first" => Ok(Operation::First),
            "last" => Ok(Operation::Last),
            _ => Err(BedError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running state of one window's reduction.
#[derive(Debug, Clone)]
pub enum Accumulator {
    Sum(f64),
    Mean { sum: f64, count: u64 },
    Min(Option<f64>),
    Max(Option<f64>),
    AbsMin(Option<f64>),
    AbsMax(Option<f64>),
    Count(u64),
    CountDistinct(FxHashSet<String>),
    Median(Vec<f64>),
    /// Value -> (occurrences, first-seen rank).
    Frequency {
        most: bool,
        counts: FxHashMap<String, (u64, u64)>,
    },
    Collapse(Vec<String>),
    /// Welford running moments.
    StdDev {
        sample: bool,
        count: u64,
        mean: f64,
        m2: f64,
    },
    First(Option<String>),
    Last(Option<String>),
}

impl Accumulator {
    pub fn new(operation: Operation) -> Self {
        match operation {
            Operation::Sum => Accumulator::Sum(0.0),
            Operation::Mean => Accumulator::Mean { sum: 0.0, count: 0 },
            Operation::Min => Accumulator::Min(None),
            Operation::Max => Accumulator::Max(None),
            Operation::AbsMin => Accumulator::AbsMin(None),
            Operation::AbsMax => Accumulator::AbsMax(None),
            Operation::Count => Accumulator::Count(0),
            Operation::CountDistinct => Accumulator::CountDistinct(FxHashSet::default()),
            Operation::Median => Accumulator::Median(Vec::new()),
            Operation::Mode => Accumulator::Frequency {
                most: true,
                counts: FxHashMap::default(),
            },
            Operation::Antimode => Accumulator::Frequency {
                most: false,
                counts: FxHashMap::default(),
            },
            Operation::Collapse => Accumulator::Collapse(Vec::new()),
            Operation::StdDev | Operation::SampleStdDev => Accumulator::StdDev {
                sample: operation == Operation::SampleStdDev,
                count: 0,
                mean: 0.0,
                m2: 0.0,
            },
            Operation::First => Accumulator::First(None),
            Operation::Last => Accumulator::Last(None),
        }
    }

    /// Fold one score into the running state.
    ///
    /// A numeric operation handed a text score that does not parse returns
    /// the offending text as the error.
    #[inline]
    pub fn push(&mut self, score: &Score) -> std::result::Result<(), String> {
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::CountDistinct(seen) => {
                let text = score.text();
                if !seen.contains(&*text) {
                    seen.insert(text.into_owned());
                }
            }
            Accumulator::Frequency { counts, .. } => {
                let rank = counts.len() as u64;
                counts.entry(score.text().into_owned()).or_insert((0, rank)).0 += 1;
            }
            Accumulator::Collapse(values) => values.push(score.text().into_owned()),
            Accumulator::First(first) => {
                if first.is_none() {
                    *first = Some(score.text().into_owned());
                }
            }
            Accumulator::Last(last) => *last = Some(score.text().into_owned()),
            numeric => {
                let x = numeric_value(score)?;
                numeric.push_numeric(x);
            }
        }
        Ok(())
    }

    #[inline]
    fn push_numeric(&mut self, x: f64) {
        match self {
            Accumulator::Sum(sum) => *sum += x,
            Accumulator::Mean { sum, count } => {
                *sum += x;
                *count += 1;
            }
            Accumulator::Min(v) => *v = Some(v.map_or(x, |m| m.min(x))),
            Accumulator::Max(v) => *v = Some(v.map_or(x, |m| m.max(x))),
            Accumulator::AbsMin(v) => {
                if v.map_or(true, |m| x.abs() < m.abs()) {
                    *v = Some(x);
                }
            }
            Accumulator::AbsMax(v) => {
                if v.map_or(true, |m| x.abs() > m.abs()) {
                    *v = Some(x);
                }
            }
            Accumulator::Median(values) => values.push(x),
            Accumulator::StdDev {
                count, mean, m2, ..
            } => {
                *count += 1;
                let delta = x - *mean;
                *mean += delta / *count as f64;
                *m2 += delta * (x - *mean);
            }
            _ => {}
        }
    }

    /// Final value for the window, or `None` when nothing was accumulated.
    pub fn finish(self, delimiter: &str) -> Option<AggregateValue> {
        match self {
            Accumulator::Sum(sum) => Some(AggregateValue::Float(sum)),
            Accumulator::Mean { sum, count } => {
                (count > 0).then(|| AggregateValue::Float(sum / count as f64))
            }
            Accumulator::Min(v)
            | Accumulator::Max(v)
            | Accumulator::AbsMin(v)
            | Accumulator::AbsMax(v) => v.map(AggregateValue::Float),
            Accumulator::Count(n) => Some(AggregateValue::Int(n)),
            Accumulator::CountDistinct(seen) => Some(AggregateValue::Int(seen.len() as u64)),
            Accumulator::Median(mut values) => {
                if values.is_empty() {
                    return None;
                }
                values.sort_unstable_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                let median = if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                };
                Some(AggregateValue::Float(median))
            }
            Accumulator::Frequency { most, counts } => {
                let best = if most {
                    // Highest count wins; ties go to the earliest value
                    counts
                        .into_iter()
                        .min_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)))
                } else {
                    counts
                        .into_iter()
                        .min_by(|a, b| a.1 .0.cmp(&b.1 .0).then(a.1 .1.cmp(&b.1 .1)))
                };
                best.map(|(value, _)| AggregateValue::Text(value))
            }
            Accumulator::Collapse(values) => {
                (!values.is_empty()).then(|| AggregateValue::Text(values.join(delimiter)))
            }
            Accumulator::StdDev {
                sample,
                count,
                m2,
                ..
            } => {
                if count == 0 {
                    return None;
                }
                let variance = if sample {
                    if count < 2 {
                        f64::NAN
                    } else {
                        m2 / (count - 1) as f64
                    }
                } else {
                    m2 / count as f64
                };
                Some(AggregateValue::Float(variance.sqrt()))
            }
            Accumulator::First(v) | Accumulator::Last(v) => v.map(AggregateValue::Text),
        }
    }
}

#[inline]
fn numeric_value(score: &Score) -> std::result::Result<f64, String> {
    match score {
        Score::Numeric(v) if v.is_finite() => Ok(*v),
        Score::Numeric(v) => Err(v.to_string()),
        Score::Text(s) => parse_score(s).ok_or_else(|| s.clone()),
    }
}

/// Folds a window-ordered pair stream into one result per window.
///
/// Only the accumulator of the window currently being matched is open. It
/// is flushed as soon as a pair for a later window arrives, or when the
/// pair stream ends. Windows that never receive a pair produce nothing.
pub struct StreamingAggregator<'a, I> {
    pairs: I,
    operation: Operation,
    delimiter: String,
    score_column: usize,
    open: Option<(OverlapPair<'a>, Accumulator)>,
    windows_emitted: usize,
    failed: bool,
}

impl<'a, I> StreamingAggregator<'a, I>
where
    I: Iterator<Item = OverlapPair<'a>>,
{
    pub fn new(pairs: I, config: &WindowConfig) -> Self {
        Self {
            pairs,
            operation: config.operation,
            delimiter: config.delimiter.clone(),
            score_column: config.score_column,
            open: None,
            windows_emitted: 0,
            failed: false,
        }
    }

    /// Number of window results produced so far.
    pub fn windows_emitted(&self) -> usize {
        self.windows_emitted
    }

    /// Access the pair source (e.g. for matcher statistics).
    pub fn pairs(&self) -> &I {
        &self.pairs
    }

    fn fold_pair(&self, acc: &mut Accumulator, pair: &OverlapPair<'a>) -> Result<()> {
        acc.push(&pair.record.score)
            .map_err(|value| BedError::NonNumericScore {
                line: pair.record.line,
                column: self.score_column,
                value,
            })
    }

    fn flush(&mut self, pair: OverlapPair<'a>, acc: Accumulator) -> Option<WindowResult> {
        let value = acc.finish(&self.delimiter)?;
        self.windows_emitted += 1;
        let window = pair.window;
        Some(WindowResult {
            chrom: window.chrom,
            start: window.start,
            end: window.end,
            value,
        })
    }
}

impl<'a, I> Iterator for StreamingAggregator<'a, I>
where
    I: Iterator<Item = OverlapPair<'a>>,
{
    type Item = Result<WindowResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.pairs.next() {
                Some(pair) => {
                    let same_window = self
                        .open
                        .as_ref()
                        .is_some_and(|(open, _)| open.window.index == pair.window.index);

                    if same_window {
                        if let Some((_, mut acc)) = self.open.take() {
                            let folded = self.fold_pair(&mut acc, &pair);
                            self.open = Some((pair, acc));
                            if let Err(e) = folded {
                                self.failed = true;
                                return Some(Err(e));
                            }
                        }
                        continue;
                    }

                    let mut acc = Accumulator::new(self.operation);
                    if let Err(e) = self.fold_pair(&mut acc, &pair) {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    if let Some((done, done_acc)) = self.open.replace((pair, acc)) {
                        if let Some(result) = self.flush(done, done_acc) {
                            return Some(Ok(result));
                        }
                    }
                }
                None => {
                    let (done, done_acc) = self.open.take()?;
                    if let Some(result) = self.flush(done, done_acc) {
                        return Some(Ok(result));
                    }
                }
            }
        }
    }
}

impl<'a, I> FusedIterator for StreamingAggregator<'a, I> where
    I: FusedIterator<Item = OverlapPair<'a>>
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{IntervalRecord, Window};
    use std::sync::Arc;

    fn reduce(op: Operation, scores: &[&str]) -> Option<AggregateValue> {
        let mut acc = Accumulator::new(op);
        for s in scores {
            let score = if op.requires_numeric() {
                Score::Numeric(s.parse().unwrap())
            } else {
                Score::Text(s.to_string())
            };
            acc.push(&score).unwrap();
        }
        acc.finish(",")
    }

    fn float(op: Operation, scores: &[&str]) -> f64 {
        match reduce(op, scores) {
            Some(AggregateValue::Float(v)) => v,
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!("sum".parse::<Operation>().unwrap(), Operation::Sum);
        assert_eq!("Median".parse::<Operation>().unwrap(), Operation::Median);
        assert_eq!(
            "count_distinct".parse::<Operation>().unwrap(),
            Operation::CountDistinct
        );
        assert_eq!("stdev".parse::<Operation>().unwrap(), Operation::StdDev);
        assert!(matches!(
            "average".parse::<Operation>(),
            Err(BedError::UnknownOperator(_))
        ));
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_numeric_reductions() {
        let scores = ["4", "-7", "1", "10"];
        assert_eq!(float(Operation::Sum, &scores), 8.0);
        assert_eq!(float(Operation::Mean, &scores), 2.0);
        assert_eq!(float(Operation::Min, &scores), -7.0);
        assert_eq!(float(Operation::Max, &scores), 10.0);
        assert_eq!(float(Operation::AbsMin, &scores), 1.0);
        assert_eq!(float(Operation::AbsMax, &scores), 10.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(float(Operation::Median, &["5", "1", "3"]), 3.0);
        assert_eq!(float(Operation::Median, &["4", "1", "3", "2"]), 2.5);
        assert_eq!(float(Operation::Median, &["9"]), 9.0);
    }

    #[test]
    fn test_stddev() {
        let scores = ["2", "4", "4", "4", "5", "5", "7", "9"];
        assert!((float(Operation::StdDev, &scores) - 2.0).abs() < 1e-12);
        let sample = float(Operation::SampleStdDev, &scores);
        assert!((sample - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(float(Operation::SampleStdDev, &["3"]).is_nan());
        assert_eq!(float(Operation::StdDev, &["3"]), 0.0);
    }

    #[test]
    fn test_text_reductions() {
        let scores = ["b", "a", "b", "c", "a", "b"];
        assert_eq!(reduce(Operation::Count, &scores), Some(AggregateValue::Int(6)));
        assert_eq!(
            reduce(Operation::CountDistinct, &scores),
            Some(AggregateValue::Int(3))
        );
        assert_eq!(
            reduce(Operation::Collapse, &["3", "1", "2"]),
            Some(AggregateValue::Text("3,1,2".into()))
        );
        assert_eq!(
            reduce(Operation::First, &scores),
            Some(AggregateValue::Text("b".into()))
        );
        assert_eq!(
            reduce(Operation::Last, &scores),
            Some(AggregateValue::Text("b".into()))
        );
        assert_eq!(
            reduce(Operation::Mode, &scores),
            Some(AggregateValue::Text("b".into()))
        );
        assert_eq!(
            reduce(Operation::Antimode, &scores),
            Some(AggregateValue::Text("c".into()))
        );
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        assert_eq!(
            reduce(Operation::Mode, &["x", "y", "y", "x"]),
            Some(AggregateValue::Text("x".into()))
        );
        assert_eq!(
            reduce(Operation::Antimode, &["q", "p"]),
            Some(AggregateValue::Text("q".into()))
        );
    }

    #[test]
    fn test_empty_accumulators() {
        assert_eq!(Accumulator::new(Operation::Mean).finish(","), None);
        assert_eq!(Accumulator::new(Operation::Median).finish(","), None);
        assert_eq!(Accumulator::new(Operation::Min).finish(","), None);
        assert_eq!(
            Accumulator::new(Operation::Sum).finish(","),
            Some(AggregateValue::Float(0.0))
        );
    }

    #[test]
    fn test_numeric_op_rejects_text_score() {
        let mut acc = Accumulator::new(Operation::Sum);
        assert!(acc.push(&Score::Text("2.5".into())).is_ok());
        assert_eq!(acc.push(&Score::Text("NA".into())), Err("NA".to_string()));
        assert_eq!(acc.push(&Score::Text("inf".into())), Err("inf".to_string()));
        assert_eq!(acc.push(&Score::Numeric(f64::NAN)), Err("NaN".to_string()));
    }

    fn pair<'a>(window: &Window, record: &'a IntervalRecord, idx: usize) -> OverlapPair<'a> {
        OverlapPair {
            window: window.clone(),
            record,
            record_index: idx,
        }
    }

    #[test]
    fn test_streaming_flushes_in_window_order() {
        let chrom: Arc<str> = Arc::from("chr1");
        let w0 = Window {
            chrom: chrom.clone(),
            start: 0,
            end: 5,
            index: 0,
        };
        let w1 = Window {
            chrom: chrom.clone(),
            start: 5,
            end: 8,
            index: 1,
        };
        let r0 = IntervalRecord::new(chrom.clone(), 0, 5, Score::Numeric(10.0));
        let r1 = IntervalRecord::new(chrom.clone(), 3, 8, Score::Numeric(20.0));
        let pairs = vec![pair(&w0, &r0, 0), pair(&w0, &r1, 1), pair(&w1, &r1, 1)];

        let config = WindowConfig::new(5);
        let mut agg = StreamingAggregator::new(pairs.into_iter(), &config);
        let results: Vec<String> = agg
            .by_ref()
            .map(|r| r.unwrap().to_string())
            .collect();
        assert_eq!(results, vec!["chr1\t0\t5\t30", "chr1\t5\t8\t20"]);
        assert_eq!(agg.windows_emitted(), 2);
    }

    #[test]
    fn test_streaming_reports_bad_score_line() {
        let chrom: Arc<str> = Arc::from("chr1");
        let w0 = Window {
            chrom: chrom.clone(),
            start: 0,
            end: 5,
            index: 0,
        };
        let mut bad = IntervalRecord::new(chrom.clone(), 0, 5, Score::Text("oops".into()));
        bad.line = 7;
        let pairs = vec![pair(&w0, &bad, 0)];

        let config = WindowConfig::new(5);
        let mut agg = StreamingAggregator::new(pairs.into_iter(), &config);
        match agg.next() {
            Some(Err(BedError::NonNumericScore { line, value, .. })) => {
                assert_eq!(line, 7);
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.map(|w| w.to_string()))),
        }
        assert!(agg.next().is_none());
    }
}
