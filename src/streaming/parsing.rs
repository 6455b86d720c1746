//! Zero-allocation BED field parsing utilities.
//!
//! These functions work on raw line bytes so the record parser only
//! allocates for the columns it keeps.

use memchr::memchr_iter;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters,
/// or does not fit in a u64.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse a numeric score. NaN and infinities are not scores.
#[inline]
pub fn parse_score(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check if a line should be skipped (empty, comment, or header).
///
/// `track` and `browser` only count as whole words, so contigs such as
/// `trackA` are still records.
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty()
        || line[0] == b'#'
        || is_keyword_line(line, b"track")
        || is_keyword_line(line, b"browser")
}

#[inline(always)]
fn is_keyword_line(line: &[u8], keyword: &[u8]) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest[0] == b' ' || rest[0] == b'\t',
        None => false,
    }
}

/// Iterate over the tab-separated fields of a line using memchr.
#[inline]
pub fn tab_fields(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut prev = 0;
    memchr_iter(b'\t', line)
        .chain(std::iter::once(line.len()))
        .map(move |tab| {
            let field = &line[prev..tab];
            prev = tab + 1;
            field
        })
}
