//! Buffer size constants for streaming operations.
//!
//! These constants control memory usage vs I/O throughput tradeoffs.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default input buffer size (256 KB).
/// Good balance for reading sorted BED files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most BED lines.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Files at least this large are memory-mapped instead of read through a BufReader.
pub const MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Initial capacity of a chromosome block's record arena.
pub const DEFAULT_BLOCK_CAPACITY: usize = 4096;
