//! Page range selection for split.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A contiguous run of pages, 0-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(Error::Range(format!(
                "inverted range: page {} comes after page {}",
                start + 1,
                end + 1
            )));
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Indices covered by the range.
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Check that the range lies inside a document of `total_pages`.
    pub fn check_bounds(&self, total_pages: usize) -> Result<()> {
        if self.end >= total_pages {
            return Err(Error::Range(format!(
                "page {} is out of bounds for a {}-page document",
                self.end + 1,
                total_pages
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PageRange {
    /// 1-based, the way users type ranges.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start + 1)
        } else {
            write!(f, "{}-{}", self.start + 1, self.end + 1)
        }
    }
}

/// Parse a compact range expression such as `"1-3,5,7-9"`.
///
/// Page numbers are 1-based and each comma-separated part becomes its own
/// range. Bounds are clamped into `[1, total_pages]`. A part that starts past
/// the last page or ends before page 1 is a range error, as are inverted parts
/// and expressions with no parts at all.
pub fn parse_ranges(expr: &str, total_pages: usize) -> Result<Vec<PageRange>> {
    if total_pages == 0 {
        return Err(Error::Range("document has no pages".to_string()));
    }

    let mut ranges = Vec::new();
    for part in expr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start.trim(), part)?.unwrap_or(1);
                let end = parse_page_number(end.trim(), part)?.unwrap_or(total_pages);
                (start, end)
            }
            None => {
                let page = parse_page_number(part, part)?
                    .ok_or_else(|| Error::Range(format!("invalid page range: {}", part)))?;
                (page, page)
            }
        };

        if start > end {
            return Err(Error::Range(format!("inverted range: {}", part)));
        }
        if start > total_pages {
            return Err(Error::Range(format!(
                "range {} starts after the last page ({})",
                part, total_pages
            )));
        }
        if end == 0 {
            return Err(Error::Range(format!(
                "range {} ends before page 1; pages are numbered from 1",
                part
            )));
        }

        let start = start.max(1);
        let end = end.min(total_pages);
        ranges.push(PageRange::new(start - 1, end - 1)?);
    }

    if ranges.is_empty() {
        return Err(Error::Range(format!("empty page range: {:?}", expr)));
    }
    Ok(ranges)
}

/// Parse a list of range expressions, concatenating their ranges in order.
pub fn parse_range_list<S: AsRef<str>>(exprs: &[S], total_pages: usize) -> Result<Vec<PageRange>> {
    let mut ranges = Vec::new();
    for expr in exprs {
        ranges.extend(parse_ranges(expr.as_ref(), total_pages)?);
    }
    if ranges.is_empty() {
        return Err(Error::Range("no page ranges given".to_string()));
    }
    Ok(ranges)
}

fn parse_page_number(s: &str, part: &str) -> Result<Option<usize>> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<usize>()
        .map(Some)
        .map_err(|_| Error::Range(format!("invalid page range: {}", part)))
}

/// Fixed-size chunks covering every page exactly once.
pub fn chunk_ranges(total_pages: usize, pages_per_chunk: usize) -> Result<Vec<PageRange>> {
    if pages_per_chunk == 0 {
        return Err(Error::Range("chunk size must be at least one page".to_string()));
    }
    if total_pages == 0 {
        return Err(Error::Range("document has no pages".to_string()));
    }

    Ok((0..total_pages)
        .step_by(pages_per_chunk)
        .map(|start| PageRange {
            start,
            end: (start + pages_per_chunk).min(total_pages) - 1,
        })
        .collect())
}

/// Chunks sized so each holds roughly `max_bytes` of the source.
///
/// The average page size is `total_bytes / total_pages`, rounded up; every
/// chunk holds at least one page.
pub fn size_ranges(total_pages: usize, total_bytes: usize, max_bytes: usize) -> Result<Vec<PageRange>> {
    if max_bytes == 0 {
        return Err(Error::Range("maximum chunk size must be positive".to_string()));
    }
    if total_pages == 0 {
        return Err(Error::Range("document has no pages".to_string()));
    }

    let average = total_bytes.div_ceil(total_pages).max(1);
    let pages_per_chunk = (max_bytes / average).max(1);
    log::debug!(
        "size split: {} bytes/page on average, {} pages per chunk",
        average,
        pages_per_chunk
    );
    chunk_ranges(total_pages, pages_per_chunk)
}

/// Ranges that start at each bookmarked page and run to the next one.
///
/// Bookmark pages are 0-based and need not be sorted; duplicates collapse.
/// Pages before the first bookmark form their own leading range.
pub fn bookmark_ranges(total_pages: usize, bookmark_pages: &[usize]) -> Vec<PageRange> {
    if total_pages == 0 {
        return Vec::new();
    }

    let mut starts: Vec<usize> = bookmark_pages
        .iter()
        .copied()
        .filter(|&p| p < total_pages)
        .collect();
    starts.push(0);
    starts.sort_unstable();
    starts.dedup();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).map(|next| next - 1).unwrap_or(total_pages - 1);
            PageRange { start, end }
        })
        .collect()
}
