//! Output Emitter for window summaries.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::bed::BedError;
use crate::interval::{AggregateValue, WindowResult};
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::io::{BufWriter, Write};

/// Floats at or above this magnitude (2^53) are not exact integers and are
/// never printed as plain integers.
const INTEGRAL_LIMIT: f64 = 9_007_199_254_740_992.0;

#[inline]
fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < INTEGRAL_LIMIT
}

/// Format a float the way window values are printed.
///
/// With a fixed precision the value gets exactly that many decimals.
/// Otherwise integral values drop the fractional part (`30`, not `30.0`)
/// and everything else uses the shortest round-trip form.
pub fn format_float(value: f64, precision: Option<usize>) -> String {
    if let Some(p) = precision {
        return format!("{:.*}", p, value);
    }
    if is_integral(value) {
        let mut buf = itoa::Buffer::new();
        return buf.format(value as i64).to_owned();
    }
    let mut buf = ryu::Buffer::new();
    buf.format(value).to_owned()
}

/// Format one output row, honoring a fixed float precision.
pub fn format_result(result: &WindowResult, precision: Option<usize>) -> String {
    let value = match &result.value {
        AggregateValue::Float(v) => format_float(*v, precision),
        other => other.to_string(),
    };
    format!("{}\t{}\t{}\t{}", result.chrom, result.start, result.end, value)
}

/// Buffered writer for `<chrom>\t<start>\t<end>\t<value>` lines.
pub struct WindowWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
    precision: Option<usize>,
    lines_written: usize,
}

impl<W: Write> WindowWriter<W> {
    /// Create a new WindowWriter with the default output buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new WindowWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
            precision: None,
            lines_written: 0,
        }
    }

    /// Print floats with a fixed number of decimals.
    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    /// Write one aggregated window followed by newline.
    #[inline]
    pub fn write_result(&mut self, result: &WindowResult) -> Result<(), BedError> {
        self.writer.write_all(result.chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_int(result.start)?;
        self.writer.write_all(b"\t")?;
        self.write_int(result.end)?;
        self.writer.write_all(b"\t")?;
        self.write_value(&result.value)?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    /// Write an aggregated value without surrounding separators.
    #[inline]
    pub fn write_value(&mut self, value: &AggregateValue) -> Result<(), BedError> {
        match value {
            AggregateValue::Int(n) => self.write_int(*n),
            AggregateValue::Float(v) => self.write_float(*v),
            AggregateValue::Text(s) => {
                self.writer.write_all(s.as_bytes())?;
                Ok(())
            }
        }
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), BedError> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a float using ryu, or fixed decimals when a precision is set.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<(), BedError> {
        if let Some(p) = self.precision {
            write!(self.writer, "{:.*}", p, f)?;
        } else if is_integral(f) {
            self.writer.write_all(self.itoa_buf.format(f as i64).as_bytes())?;
        } else {
            self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        }
        Ok(())
    }

    /// Number of lines written so far.
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush()?;
        Ok(())
    }
}
