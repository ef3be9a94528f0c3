//! Merge several PDFs into one.

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::info::page_size;
use crate::model::Metadata;

use super::graph::PageGraph;
use super::naming::input_title;
use super::stamp::{stamp_page_numbers, PageNumberStyle};
use super::{load_source, Bookmark};

const DEFAULT_MERGE_TITLE: &str = "Merged Document";
/// Input names listed on the title page before it is cut short.
const TITLE_PAGE_LISTING: usize = 30;

/// One document to merge.
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub data: Vec<u8>,
    /// Original file name, used for bookmark titles
    pub filename: Option<String>,
}

impl MergeInput {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: None,
        }
    }

    pub fn named(data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            data,
            filename: Some(filename.into()),
        }
    }
}

/// Options for [`merge`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOptions {
    /// Insert a generated title page before the first input
    pub title_page: bool,
    /// Title of the merged document (title page text and metadata)
    pub title: Option<String>,
    /// Record one bookmark per input and write them as the outline
    pub bookmarks: bool,
    /// Stamp page numbers on every page except the title page
    pub page_numbers: Option<PageNumberStyle>,
    /// Compress content streams of the output
    pub compress: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            title_page: false,
            title: None,
            bookmarks: true,
            page_numbers: None,
            compress: true,
        }
    }
}

impl MergeOptions {
    pub fn with_title_page(mut self, enabled: bool) -> Self {
        self.title_page = enabled;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_bookmarks(mut self, enabled: bool) -> Self {
        self.bookmarks = enabled;
        self
    }

    pub fn with_page_numbers(mut self, style: PageNumberStyle) -> Self {
        self.page_numbers = Some(style);
        self
    }

    pub fn without_compression(mut self) -> Self {
        self.compress = false;
        self
    }
}

/// Output of [`merge`].
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub data: Vec<u8>,
    pub page_count: usize,
    /// Empty unless bookmarks were requested
    pub bookmarks: Vec<Bookmark>,
}

/// Merge inputs in order into a single PDF.
///
/// The output holds every page of every input, plus the title page when
/// requested. Encrypted inputs are rejected.
pub fn merge(inputs: &[MergeInput], options: &MergeOptions) -> Result<MergeResult> {
    if inputs.is_empty() {
        return Err(Error::Input("no documents to merge".to_string()));
    }

    let sources = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let label = input
                .filename
                .clone()
                .unwrap_or_else(|| format!("input #{}", i + 1));
            load_source(&input.data, &label)
        })
        .collect::<Result<Vec<_>>>()?;
    let titles: Vec<String> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| input_title(input.filename.as_deref(), i + 1))
        .collect();

    let mut graph = PageGraph::new();
    let title = options.title.as_deref().unwrap_or(DEFAULT_MERGE_TITLE);

    if options.title_page {
        let size = sources
            .iter()
            .find_map(|doc| doc.get_pages().values().next().map(|&id| page_size(doc, id)))
            .unwrap_or(crate::info::DEFAULT_PAGE_SIZE);
        let summary = format!("{} documents", inputs.len());
        let mut lines: Vec<(f32, &str)> = vec![(24.0, title), (12.0, summary.as_str()), (12.0, "")];
        lines.extend(titles.iter().take(TITLE_PAGE_LISTING).map(|t| (11.0, t.as_str())));
        graph.add_text_page(size, &lines)?;
    }

    let mut bookmarks = Vec::new();
    for (source, title) in sources.iter().zip(&titles) {
        let page_ids: Vec<ObjectId> = source.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            log::warn!("{} has no pages", title);
            continue;
        }
        if options.bookmarks {
            bookmarks.push(Bookmark {
                title: title.clone(),
                page_index: graph.page_count(),
            });
        }
        graph.import_pages(source, &page_ids)?;
    }

    if let Some(style) = &options.page_numbers {
        let skip = usize::from(options.title_page);
        stamp_page_numbers(&mut graph, style, skip)?;
    }

    if !bookmarks.is_empty() {
        graph.set_outline(&bookmarks)?;
    }
    graph.set_metadata(&Metadata {
        title: options.title.clone(),
        ..Default::default()
    });

    let page_count = graph.page_count();
    let data = graph.finish(options.compress)?;
    log::info!(
        "merged {} documents into {} pages ({} bytes)",
        inputs.len(),
        page_count,
        data.len()
    );

    Ok(MergeResult {
        data,
        page_count,
        bookmarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::sample_pdf;
    use crate::assemble::StampPosition;

    fn inputs() -> Vec<MergeInput> {
        vec![
            MergeInput::named(sample_pdf(2, "alpha"), "alpha.pdf"),
            MergeInput::new(sample_pdf(1, "beta")),
            MergeInput::named(sample_pdf(3, "gamma"), "reports/gamma.pdf"),
        ]
    }

    #[test]
    fn test_merge_page_count() {
        let result = merge(&inputs(), &MergeOptions::default()).unwrap();
        assert_eq!(result.page_count, 6);
        let doc = lopdf::Document::load_mem(&result.data).unwrap();
        assert_eq!(doc.get_pages().len(), 6);
    }

    #[test]
    fn test_merge_with_title_page_adds_one() {
        let options = MergeOptions::default().with_title_page(true).with_title("Q3");
        let result = merge(&inputs(), &options).unwrap();
        assert_eq!(result.page_count, 7);
        assert_eq!(result.bookmarks[0].page_index, 1);

        let text = pdf_extract::extract_text_from_mem(&result.data).unwrap();
        assert!(text.contains("Q3"));
    }

    #[test]
    fn test_merge_bookmarks() {
        let result = merge(&inputs(), &MergeOptions::default()).unwrap();
        let titles: Vec<&str> = result.bookmarks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "Document 2", "gamma"]);
        let pages: Vec<usize> = result.bookmarks.iter().map(|b| b.page_index).collect();
        assert_eq!(pages, vec![0, 2, 3]);

        let doc = lopdf::Document::load_mem(&result.data).unwrap();
        let outline = crate::info::read_outline(&doc).unwrap();
        assert_eq!(outline.len(), 3);
        assert_eq!(outline[2].page, Some(4));
    }

    #[test]
    fn test_merge_without_bookmarks() {
        let options = MergeOptions::default().with_bookmarks(false);
        let result = merge(&inputs(), &options).unwrap();
        assert!(result.bookmarks.is_empty());
    }

    #[test]
    fn test_merge_keeps_source_order() {
        let result = merge(&inputs(), &MergeOptions::default()).unwrap();
        let text = pdf_extract::extract_text_from_mem(&result.data).unwrap();
        let alpha = text.find("alpha page 2").unwrap();
        let beta = text.find("beta page 1").unwrap();
        let gamma = text.find("gamma page 3").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn test_merge_stamps_skip_title_page() {
        let one_page: Vec<MergeInput> = (0..3)
            .map(|i| MergeInput::new(sample_pdf(1, &format!("doc{}", i))))
            .collect();
        let options = MergeOptions::default()
            .with_title_page(true)
            .with_page_numbers(PageNumberStyle::at(StampPosition::BottomLeft).with_format("#{n}"))
            .without_compression();
        let result = merge(&one_page, &options).unwrap();
        assert_eq!(result.page_count, 4);

        let pages = pdf_extract::extract_text_from_mem_by_pages(&result.data).unwrap();
        assert_eq!(pages.len(), 4);
        assert!(!pages[0].contains('#'));
        for (i, page) in pages.iter().enumerate().skip(1) {
            assert!(page.contains(&format!("#{}", i)), "page {} lacks its stamp", i + 1);
        }
    }

    #[test]
    fn test_merge_rejects_empty_and_garbage() {
        assert!(matches!(merge(&[], &MergeOptions::default()), Err(Error::Input(_))));

        let bad = vec![
            MergeInput::new(sample_pdf(1, "ok")),
            MergeInput::named(b"not a pdf".to_vec(), "broken.pdf"),
        ];
        let err = merge(&bad, &MergeOptions::default()).unwrap_err();
        assert!(err.message().contains("broken.pdf"));
    }
}
