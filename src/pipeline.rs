//! Chromosome-boundary orchestration.
//!
//! `WindowCompressor` is the entry point of the library. Records are
//! collected per chromosome; when the chromosome changes (or input ends)
//! the block is sealed, windowed, swept and aggregated, and only then is
//! the next chromosome started:
//!
//! ```text
//! Collecting -> Windowing -> Matching -> Done -> Collecting (next chrom) ...
//! ```
//!
//! At most one chromosome's records are resident at any time.
//!
//! # Example
//!
//! ```
//! use bedcompress::{WindowCompressor, WindowConfig};
//!
//! let config = WindowConfig::new(5).with_score_column(4);
//! let lines = ["chr1\t0\t5\t10", "chr1\t3\t8\t20"];
//! let out: Vec<String> = WindowCompressor::new(config)
//!     .unwrap()
//!     .lines(lines)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(out, vec!["chr1\t0\t5\t30", "chr1\t5\t8\t20"]);
//! ```

use crate::aggregate::StreamingAggregator;
use crate::bed::{RecordParser, Result};
use crate::block::ChromosomeBlock;
use crate::config::WindowConfig;
use crate::interval::WindowResult;
use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER, MMAP_THRESHOLD};
use crate::streaming::output::{format_result, WindowWriter};
use crate::sweep::OverlapMatcher;
use crate::windows::WindowGenerator;
use log::{debug, trace};
use memchr::memchr_iter;
use memmap2::Mmap;
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Processing state of the current chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Buffering records until the chromosome changes or input ends.
    Collecting,
    /// Generating windows from the sealed block's extent.
    Windowing,
    /// Sweeping and aggregating; results are being emitted.
    Matching,
    /// Block flushed and discarded.
    Done,
}

/// Statistics from a window compression run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub lines: usize,
    pub records: usize,
    pub chromosomes: usize,
    pub windows_generated: usize,
    pub windows_emitted: usize,
    pub overlap_pairs: usize,
    pub max_active: usize,
    pub max_block_records: usize,
}

impl fmt::Display for WindowStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lines: {}, Records: {}, Chroms: {}, Windows: {} ({} emitted), Pairs: {}, Max active: {}, Max block: {}",
            self.lines,
            self.records,
            self.chromosomes,
            self.windows_generated,
            self.windows_emitted,
            self.overlap_pairs,
            self.max_active,
            self.max_block_records
        )
    }
}

/// Streaming window compressor for one sorted BED stream.
#[derive(Debug)]
pub struct WindowCompressor {
    config: WindowConfig,
    parser: RecordParser,
    block: ChromosomeBlock,
    phase: Phase,
    stats: WindowStats,
}

impl WindowCompressor {
    /// Create a compressor. The configuration is validated here, before
    /// any input is read.
    pub fn new(config: WindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: RecordParser::new(&config),
            config,
            block: ChromosomeBlock::new(),
            phase: Phase::Collecting,
            stats: WindowStats::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> WindowStats {
        let mut stats = self.stats.clone();
        stats.lines = self.parser.line_number();
        stats.records = self.parser.records_parsed();
        stats.chromosomes = self.parser.chrom_count();
        stats.max_block_records = self.block.peak_len();
        stats
    }

    /// Feed one input line.
    ///
    /// If the line starts a new chromosome, every result of the previous
    /// chromosome is handed to `sink` before the line's record is buffered.
    /// A line that fails to parse produces no output at all.
    pub fn feed_line<F>(&mut self, line: &[u8], mut sink: F) -> Result<()>
    where
        F: FnMut(WindowResult) -> Result<()>,
    {
        let Some(record) = self.parser.parse_line(line)? else {
            return Ok(());
        };

        let chrom_changed = self
            .block
            .chrom()
            .is_some_and(|current| **current != *record.chrom);
        if chrom_changed {
            self.flush_block(&mut sink)?;
        }
        if self.block.is_empty() {
            trace!("collecting {} from line {}", record.chrom, record.line);
        }

        self.phase = Phase::Collecting;
        self.block.push(record);
        Ok(())
    }

    /// Signal end of input and flush the last chromosome.
    pub fn finish<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(WindowResult) -> Result<()>,
    {
        self.flush_block(&mut sink)?;
        self.phase = Phase::Done;
        Ok(())
    }

    /// Seal the current block, window it, sweep it and emit its results.
    fn flush_block<F>(&mut self, sink: &mut F) -> Result<()>
    where
        F: FnMut(WindowResult) -> Result<()>,
    {
        let (Some(chrom), Some(extent)) = (self.block.chrom().cloned(), self.block.extent()) else {
            return Ok(());
        };
        self.block.seal();

        self.phase = Phase::Windowing;
        let windows = WindowGenerator::new(
            chrom.clone(),
            extent,
            self.config.window_size,
            self.config.step(),
        )?;
        let window_count = windows.len();
        debug!(
            "{}: {} records, extent [{}, {}), {} windows",
            chrom,
            self.block.len(),
            extent.min_start,
            extent.max_end,
            window_count
        );

        self.phase = Phase::Matching;
        let matcher = OverlapMatcher::new(self.block.records(), windows);
        let mut aggregator = StreamingAggregator::new(matcher, &self.config);
        for result in aggregator.by_ref() {
            sink(result?)?;
        }

        self.stats.windows_generated += window_count;
        self.stats.windows_emitted += aggregator.windows_emitted();
        self.stats.overlap_pairs += aggregator.pairs().pairs_emitted();
        self.stats.max_active = self.stats.max_active.max(aggregator.pairs().max_active());
        debug!(
            "{}: emitted {} of {} windows",
            chrom,
            aggregator.windows_emitted(),
            window_count
        );

        self.block.clear();
        self.phase = Phase::Done;
        Ok(())
    }

    /// Lazily turn input lines into output lines.
    ///
    /// The iterator stops after the first error.
    pub fn lines<I>(self, lines: I) -> CompressedLines<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        CompressedLines {
            compressor: self,
            lines: lines.into_iter(),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// Compress a buffered reader into `output`.
    pub fn run_reader<R: BufRead, W: Write>(
        mut self,
        mut reader: R,
        output: W,
    ) -> Result<WindowStats> {
        let mut writer = WindowWriter::new(output).with_precision(self.config.precision);
        let mut line = Vec::with_capacity(DEFAULT_LINE_BUFFER);

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.feed_line(&line, |r| writer.write_result(&r))?;
        }
        self.finish(|r| writer.write_result(&r))?;
        writer.flush()?;

        Ok(self.stats())
    }

    /// Compress an in-memory buffer (e.g. a memory-mapped file) into `output`.
    pub fn run_bytes<W: Write>(mut self, data: &[u8], output: W) -> Result<WindowStats> {
        let mut writer = WindowWriter::new(output).with_precision(self.config.precision);

        let mut line_start = 0;
        for newline in memchr_iter(b'\n', data) {
            self.feed_line(&data[line_start..newline], |r| writer.write_result(&r))?;
            line_start = newline + 1;
        }
        if line_start < data.len() {
            self.feed_line(&data[line_start..], |r| writer.write_result(&r))?;
        }
        self.finish(|r| writer.write_result(&r))?;
        writer.flush()?;

        Ok(self.stats())
    }

    /// Compress a BED file into `output`.
    ///
    /// Large files are memory-mapped; small ones go through a BufReader.
    pub fn run_path<P: AsRef<Path>, W: Write>(self, path: P, output: W) -> Result<WindowStats> {
        let file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();

        if file_size >= MMAP_THRESHOLD {
            debug!("memory-mapping {} ({} bytes)", path.as_ref().display(), file_size);
            // SAFETY: the map is read-only and lives only for this call.
            let mmap = unsafe { Mmap::map(&file)? };
            self.run_bytes(&mmap, output)
        } else {
            let reader = BufReader::with_capacity(DEFAULT_INPUT_BUFFER, file);
            self.run_reader(reader, output)
        }
    }

    /// Compress standard input into `output`.
    pub fn run_stdin<W: Write>(self, output: W) -> Result<WindowStats> {
        let stdin = io::stdin();
        self.run_reader(stdin.lock(), output)
    }
}

/// Lazy sequence of formatted output lines. See [`WindowCompressor::lines`].
pub struct CompressedLines<I> {
    compressor: WindowCompressor,
    lines: I,
    ready: VecDeque<WindowResult>,
    done: bool,
}

impl<I> CompressedLines<I> {
    /// Statistics of the underlying compressor.
    pub fn stats(&self) -> WindowStats {
        self.compressor.stats()
    }
}

impl<I> Iterator for CompressedLines<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.ready.pop_front() {
                return Some(Ok(format_result(&result, self.compressor.config.precision)));
            }
            if self.done {
                return None;
            }

            let ready = &mut self.ready;
            let outcome = match self.lines.next() {
                Some(line) => self.compressor.feed_line(line.as_ref(), |r| {
                    ready.push_back(r);
                    Ok(())
                }),
                None => {
                    self.done = true;
                    self.compressor.finish(|r| {
                        ready.push_back(r);
                        Ok(())
                    })
                }
            };

            if let Err(e) = outcome {
                self.done = true;
                self.ready.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Compress in-memory lines into window results (useful for testing).
pub fn compress_lines<I>(config: WindowConfig, lines: I) -> Result<Vec<WindowResult>>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut compressor = WindowCompressor::new(config)?;
    let mut results = Vec::new();
    for line in lines {
        compressor.feed_line(line.as_ref(), |r| {
            results.push(r);
            Ok(())
        })?;
    }
    compressor.finish(|r| {
        results.push(r);
        Ok(())
    })?;
    Ok(results)
}
