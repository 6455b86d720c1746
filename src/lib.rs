//! bedcompress: sliding-window compression of sorted BED files.
//!
//! Sorted interval records are grouped per chromosome, covered by fixed-size
//! windows, joined to those windows with a sweep line and reduced to one
//! score per non-empty window.
//!
//! # Features
//!
//! - **Streaming I/O**: only one chromosome is resident at a time
//! - **Sweep-line join**: no per-window rescans of the record list
//! - **bedtools-style operators**: sum, mean, median, collapse, distinct, ...
//!
//! # Example
//!
//! ```rust,no_run
//! use bedcompress::{Operation, WindowCompressor, WindowConfig};
//!
//! let config = WindowConfig::new(1000)
//!     .with_step(500)
//!     .with_operation(Operation::Mean);
//!
//! let stdout = std::io::stdout();
//! let stats = WindowCompressor::new(config)
//!     .unwrap()
//!     .run_path("sorted.bed", stdout.lock())
//!     .unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod aggregate;
pub mod bed;
pub mod block;
pub mod config;
pub mod interval;
pub mod pipeline;
pub mod streaming;
pub mod sweep;
pub mod windows;

// Re-export commonly used types
pub use aggregate::{Accumulator, Operation, StreamingAggregator};
pub use bed::{parse_records, BedError, RecordParser};
pub use block::{ChromosomeBlock, Extent};
pub use config::WindowConfig;
pub use interval::{AggregateValue, IntervalRecord, Score, Window, WindowResult};
pub use pipeline::{compress_lines, Phase, WindowCompressor, WindowStats};
pub use sweep::{OverlapMatcher, OverlapPair};
pub use windows::WindowGenerator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::aggregate::Operation;
    pub use crate::bed::BedError;
    pub use crate::config::WindowConfig;
    pub use crate::interval::{AggregateValue, IntervalRecord, Score, Window, WindowResult};
    pub use crate::pipeline::{WindowCompressor, WindowStats};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::prelude::*;

        let content = "chr1\t0\t100\t.\t4\nchr1\t50\t150\t.\t6\nchr1\t300\t400\t.\t1\n";
        let config = WindowConfig::new(100).with_operation(Operation::Max);

        let mut output = Vec::new();
        let stats = WindowCompressor::new(config)
            .unwrap()
            .run_reader(content.as_bytes(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "chr1\t0\t100\t6\nchr1\t100\t200\t6\nchr1\t300\t400\t1\n"
        );
        assert_eq!(stats.windows_generated, 4);
        assert_eq!(stats.windows_emitted, 3);
    }

    #[test]
    fn test_manual_stages() {
        use crate::block::ChromosomeBlock;
        use crate::sweep::OverlapMatcher;
        use crate::windows::WindowGenerator;
        use crate::{parse_records, WindowConfig};

        let config = WindowConfig::new(5).with_score_column(4);
        let records = parse_records("chr1\t0\t5\t10\nchr1\t3\t8\t20\n", &config).unwrap();

        let mut block = ChromosomeBlock::new();
        for record in records {
            block.push(record);
        }
        block.seal();

        let chrom = block.chrom().cloned().unwrap();
        let windows = WindowGenerator::new(chrom, block.extent().unwrap(), 5, 5).unwrap();
        let pairs: Vec<_> = OverlapMatcher::new(block.records(), windows)
            .map(|p| (p.window.start, p.record_index))
            .collect();
        assert_eq!(pairs, vec![(0, 0), (0, 1), (5, 1)]);
    }
}
