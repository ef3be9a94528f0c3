//! Split one PDF into several.

use lopdf::{Document as LopdfDocument, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::info::{read_metadata, read_outline};
use crate::model::Metadata;

use super::graph::PageGraph;
use super::load_source;
use super::naming::{fragment_name, DEFAULT_NAME_TEMPLATE};
use super::ranges::{bookmark_ranges, chunk_ranges, parse_range_list, size_ranges, PageRange};

/// How pages are grouped into fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SplitMode {
    /// Fixed-size chunks
    Pages { pages_per_chunk: usize },
    /// Caller-supplied range expressions such as `"1-3,5"`
    Ranges { ranges: Vec<String> },
    /// One fragment per top-level outline entry
    Bookmarks,
    /// Chunks of roughly `max_bytes` each
    Size { max_bytes: usize },
}

impl Default for SplitMode {
    fn default() -> Self {
        SplitMode::Pages { pages_per_chunk: 1 }
    }
}

/// Options for [`split`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOptions {
    pub mode: SplitMode,
    /// Copy title, author, subject and creator into every fragment
    pub preserve_metadata: bool,
    /// Fragment naming template
    pub name_template: String,
    /// Source name substituted for `{filename}`
    pub filename: String,
    pub compress: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            mode: SplitMode::default(),
            preserve_metadata: true,
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            filename: "document".to_string(),
            compress: true,
        }
    }
}

impl SplitOptions {
    pub fn every(pages_per_chunk: usize) -> Self {
        Self::default().with_mode(SplitMode::Pages { pages_per_chunk })
    }

    pub fn ranges<S: Into<String>>(ranges: impl IntoIterator<Item = S>) -> Self {
        Self::default().with_mode(SplitMode::Ranges {
            ranges: ranges.into_iter().map(Into::into).collect(),
        })
    }

    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_preserve_metadata(mut self, enabled: bool) -> Self {
        self.preserve_metadata = enabled;
        self
    }

    pub fn with_name_template(mut self, template: impl Into<String>) -> Self {
        self.name_template = template.into();
        self
    }

    /// Source name; any directory and extension are dropped.
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = crate::detect::file_stem(filename).to_string();
        self
    }
}

/// One output of [`split`].
#[derive(Debug, Clone)]
pub struct SplitFragment {
    pub name: String,
    pub data: Vec<u8>,
    pub range: PageRange,
}

impl SplitFragment {
    pub fn page_count(&self) -> usize {
        self.range.len()
    }
}

/// Compute the page ranges a split would produce without writing anything.
pub fn plan_split(data: &[u8], mode: &SplitMode) -> Result<Vec<PageRange>> {
    let source = load_source(data, "source document")?;
    plan(&source, data.len(), mode)
}

/// Split a PDF into fragments, in range order.
pub fn split(data: &[u8], options: &SplitOptions) -> Result<Vec<SplitFragment>> {
    let source = load_source(data, "source document")?;
    let ranges = plan(&source, data.len(), &options.mode)?;
    let page_ids: Vec<ObjectId> = source.get_pages().values().copied().collect();

    let metadata = if options.preserve_metadata {
        let full = read_metadata(&source);
        Metadata {
            title: full.title,
            author: full.author,
            subject: full.subject,
            creator: full.creator,
            ..Default::default()
        }
    } else {
        Metadata::default()
    };

    let mut fragments = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        range.check_bounds(page_ids.len())?;

        let mut graph = PageGraph::new();
        graph.import_pages(&source, &page_ids[range.start..=range.end])?;
        graph.set_metadata(&metadata);

        fragments.push(SplitFragment {
            name: fragment_name(&options.name_template, &options.filename, i + 1, range),
            data: graph.finish(options.compress)?,
            range: *range,
        });
    }

    log::info!("split {} pages into {} fragments", page_ids.len(), fragments.len());
    Ok(fragments)
}

fn plan(source: &LopdfDocument, total_bytes: usize, mode: &SplitMode) -> Result<Vec<PageRange>> {
    let total_pages = source.get_pages().len();

    match mode {
        SplitMode::Pages { pages_per_chunk } => chunk_ranges(total_pages, *pages_per_chunk),
        SplitMode::Ranges { ranges } => parse_range_list(ranges, total_pages),
        SplitMode::Size { max_bytes } => size_ranges(total_pages, total_bytes, *max_bytes),
        SplitMode::Bookmarks => {
            let starts: Vec<usize> = match read_outline(source) {
                Ok(entries) => entries
                    .iter()
                    .filter(|e| e.level == 0)
                    .filter_map(|e| e.page)
                    .map(|page| page as usize - 1)
                    .collect(),
                Err(e) => {
                    log::warn!("cannot read outline, keeping the document whole: {}", e);
                    Vec::new()
                }
            };
            if starts.is_empty() {
                log::debug!("no usable bookmarks; single fragment");
            }
            chunk_or_whole(bookmark_ranges(total_pages, &starts), total_pages)
        }
    }
}

fn chunk_or_whole(ranges: Vec<PageRange>, total_pages: usize) -> Result<Vec<PageRange>> {
    if ranges.is_empty() {
        return chunk_ranges(total_pages, total_pages.max(1));
    }
    Ok(ranges)
}
