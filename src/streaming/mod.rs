//! Low-level streaming utilities shared by the pipeline.
//!
//! - Zero-allocation field splitting and integer parsing
//! - Sort validation with chromosome interning
//! - The sweep's active set
//! - Buffered window output
//!
//! Memory stays O(records of one chromosome + max overlapping records).

pub mod active_set;
pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use active_set::ActiveSet;
pub use output::{format_float, format_result, WindowWriter};
pub use parsing::{parse_u64_fast, should_skip_line, tab_fields};
pub use validation::SortValidator;
