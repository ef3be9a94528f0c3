//! Plain text rendering.

use crate::error::Result;
use crate::model::{Document, Page, Table};

use super::{selected_pages, RenderOptions};

/// Convert a document to plain text.
///
/// Each page starts with a banner line, followed by its paragraphs and then
/// its tables (one pipe-joined line per row), all separated by blank lines.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let pages: Vec<String> = selected_pages(doc, options)
        .into_iter()
        .map(|page| render_page(page, options))
        .collect();

    let mut output = pages.join("\n\n");
    output.push('\n');
    Ok(output)
}

fn render_page(page: &Page, options: &RenderOptions) -> String {
    let mut blocks = vec![format!("=== {} ===", options.heading_for(page.number))];
    blocks.extend(page.paragraphs.iter().map(|p| p.text.trim_end().to_string()));
    blocks.extend(page.tables.iter().map(render_table));
    blocks.join("\n\n")
}

fn render_table(table: &Table) -> String {
    table
        .rows
        .iter()
        .map(|row| row.joined(" | "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, TableRow};

    #[test]
    fn test_to_text() {
        let mut doc = Document::new();
        let mut page = Page::letter(1);
        page.add_paragraph(Paragraph::with_text("Hello, world!"));
        page.add_paragraph(Paragraph::with_text("Second paragraph."));
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["Name", "Age"]));
        table.add_row(TableRow::from_strings(["Bob", "30"]));
        page.add_table(table);
        doc.add_page(page);
        doc.add_page(Page::letter(2));

        let result = to_text(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(
            result,
            "=== Page 1 ===\n\nHello, world!\n\nSecond paragraph.\n\nName | Age\nBob | 30\n\n=== Page 2 ===\n"
        );
    }

    #[test]
    fn test_to_text_empty_document() {
        let result = to_text(&Document::new(), &RenderOptions::default()).unwrap();
        assert_eq!(result, "\n");
    }
}
