//! Format serializers.
//!
//! Every serializer is a pure function from a [`Document`] to output bytes;
//! [`serialize`] is the single dispatch point over [`TargetKind`].

mod docx;
mod json;
mod ooxml;
mod options;
mod pptx;
mod rtf;
mod target;
mod text;
mod xlsx;

pub use docx::to_docx;
pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, RenderOptions, SheetMode};
pub use pptx::{slide_layout, to_pptx, SlideLayout};
pub use rtf::{escape as escape_rtf, to_rtf};
pub use target::TargetKind;
pub use text::to_text;
pub use xlsx::{column_name, layout_sheets, to_xlsx, Sheet, SheetRow};

use crate::error::Result;
use crate::model::{Document, Page};

/// Serialize a document to the given target format.
pub fn serialize(doc: &Document, kind: TargetKind, options: &RenderOptions) -> Result<Vec<u8>> {
    log::debug!("serializing {} pages to {}", doc.page_count(), kind);
    match kind {
        TargetKind::Docx => to_docx(doc, options),
        TargetKind::Xlsx => to_xlsx(doc, options),
        TargetKind::Pptx => to_pptx(doc, options),
        TargetKind::Rtf => to_rtf(doc, options),
        TargetKind::Txt => to_text(doc, options).map(String::into_bytes),
        TargetKind::Json => to_json(doc, options).map(String::into_bytes),
    }
}

/// Pages included by the render options, in document order.
pub(crate) fn selected_pages<'a>(doc: &'a Document, options: &RenderOptions) -> Vec<&'a Page> {
    doc.pages
        .iter()
        .filter(|p| options.page_selection.includes(p.number))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    fn doc() -> Document {
        let mut doc = Document::new();
        for n in 1..=3 {
            let mut page = Page::letter(n);
            page.add_paragraph(Paragraph::with_text(format!("body {}", n)));
            doc.add_page(page);
        }
        doc
    }

    #[test]
    fn test_serialize_every_kind() {
        let doc = doc();
        let options = RenderOptions::default();
        for kind in TargetKind::ALL {
            let bytes = serialize(&doc, kind, &options).unwrap();
            assert!(!bytes.is_empty(), "{} produced no output", kind);
        }
    }

    #[test]
    fn test_serialize_tolerates_empty_document() {
        let empty = Document::new();
        for kind in TargetKind::ALL {
            assert!(serialize(&empty, kind, &RenderOptions::default()).is_ok());
        }
    }

    #[test]
    fn test_page_selection_applies() {
        let options = RenderOptions::default().with_page_range(2..=2);
        let text = String::from_utf8(serialize(&doc(), TargetKind::Txt, &options).unwrap()).unwrap();
        assert!(text.contains("body 2"));
        assert!(!text.contains("body 1"));

        let json = String::from_utf8(serialize(&doc(), TargetKind::Json, &options).unwrap()).unwrap();
        assert!(json.contains("body 2"));
        assert!(!json.contains("body 3"));
    }
}
