//! Page-boundary inference.
//!
//! Assigns the text of a whole document to `total_pages` pages, either from
//! explicit page-break markers or by proportional allocation.

use crate::model::PageMapping;

use super::source::PAGE_BREAK;

/// Split `text` into exactly `total_pages` page texts.
///
/// Marker splitting is used only when the number of marker-separated segments
/// matches `total_pages`. Otherwise the text is sliced evenly by character
/// count with every cut moved forward to the next whitespace, and the mapping
/// is reported as [`PageMapping::Proportional`].
pub fn assign_pages(text: &str, total_pages: usize) -> (Vec<String>, PageMapping) {
    if total_pages == 0 {
        return (Vec::new(), PageMapping::Markers);
    }

    if text.contains(PAGE_BREAK) {
        let mut segments: Vec<&str> = text.split(PAGE_BREAK).collect();
        if segments.len() == total_pages + 1
            && segments.last().is_some_and(|s| s.trim().is_empty())
        {
            segments.pop();
        }
        if segments.len() == total_pages {
            let pages = segments.into_iter().map(str::to_string).collect();
            return (pages, PageMapping::Markers);
        }
        log::debug!(
            "{} page markers for {} pages; using proportional allocation",
            segments.len(),
            total_pages
        );
    } else if total_pages == 1 {
        return (vec![text.to_string()], PageMapping::Markers);
    }

    let cleaned = text.replace(PAGE_BREAK, "\n");
    (proportional(&cleaned, total_pages), PageMapping::Proportional)
}

fn proportional(text: &str, total_pages: usize) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();

    let mut pages = Vec::with_capacity(total_pages);
    let mut prev_char = 0;
    let mut prev_byte = 0;

    for i in 1..total_pages {
        let target = i * len / total_pages;
        let mut cut = target.max(prev_char);
        while cut < len && !chars[cut].1.is_whitespace() {
            cut += 1;
        }
        let cut_byte = chars.get(cut).map_or(text.len(), |(b, _)| *b);

        pages.push(text[prev_byte..cut_byte].to_string());
        prev_char = cut;
        prev_byte = cut_byte;
    }
    pages.push(text[prev_byte..].to_string());

    pages
}
