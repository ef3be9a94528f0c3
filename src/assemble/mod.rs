//! Page assembly on the PDF object graph.
//!
//! Merge, split, compress, rotate and page-number stamping work on the raw
//! page tree of the input, never on the extracted [`Document`](crate::model::Document)
//! model, so page content survives byte for byte.

mod compress;
mod graph;
mod images;
mod merge;
mod naming;
mod ranges;
mod rotate;
mod split;
mod stamp;

pub use compress::{compress, compression_ratio, CompressOptions, CompressResult};
pub use images::{images_to_pdf, place_image, ImageDocumentOptions, ImagePageSize, ImagePlacement};
pub use merge::{merge, MergeInput, MergeOptions, MergeResult};
pub use naming::{fragment_name, input_title, DEFAULT_NAME_TEMPLATE};
pub use ranges::{
    bookmark_ranges, chunk_ranges, parse_range_list, parse_ranges, size_ranges, PageRange,
};
pub use rotate::rotate;
pub use split::{plan_split, split, SplitFragment, SplitMode, SplitOptions};
pub use stamp::{PageNumberStyle, StampPosition};

use lopdf::Document as LopdfDocument;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named entry point into an assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub title: String,
    /// 0-based index of the first page
    pub page_index: usize,
}

/// Load an assembly input, naming it in any error.
fn load_source(data: &[u8], label: &str) -> Result<LopdfDocument> {
    crate::detect::detect_format_from_bytes(data)
        .map_err(|e| Error::Input(format!("{}: {}", label, e.message())))?;
    let doc = crate::info::load_pdf(data)
        .map_err(|e| Error::Input(format!("{}: {}", label, e.message())))?;
    if doc.is_encrypted() {
        return Err(Error::Input(format!(
            "{} is encrypted; decrypt it first",
            label
        )));
    }
    Ok(doc)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory PDFs for assembly tests.

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

    fn build(pages: usize, label: &str, outline: &[(&str, usize)], compress: bool) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<ObjectId> = Vec::new();
        for n in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 14.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("{} page {}", label, n))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.iter().map(|&id| id.into()).collect::<Vec<Object>>(),
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !outline.is_empty() {
            let outlines_id = doc.new_object_id();
            let item_ids: Vec<ObjectId> = outline.iter().map(|_| doc.new_object_id()).collect();
            for (i, (title, page)) in outline.iter().enumerate() {
                let mut item = dictionary! {
                    "Title" => Object::string_literal(*title),
                    "Parent" => outlines_id,
                    "Dest" => vec![kids[page - 1].into(), "Fit".into()],
                };
                if let Some(&next) = item_ids.get(i + 1) {
                    item.set("Next", next);
                }
                doc.objects.insert(item_ids[i], Object::Dictionary(item));
            }
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => item_ids[0],
                    "Last" => item_ids[item_ids.len() - 1],
                    "Count" => item_ids.len() as i64,
                }),
            );
            catalog.set("Outlines", outlines_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(label),
            "Author" => Object::string_literal("pagesmith tests"),
        });
        doc.trailer.set("Info", info_id);

        if compress {
            doc.compress();
        }
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// A PDF whose page N shows the text `"{label} page N"`; the title is `label`.
    pub fn sample_pdf(pages: usize, label: &str) -> Vec<u8> {
        build(pages, label, &[], true)
    }

    pub fn sample_pdf_uncompressed(pages: usize, label: &str) -> Vec<u8> {
        build(pages, label, &[], false)
    }

    /// Outline entries are `(title, 1-based page)`.
    pub fn sample_pdf_with_outline(pages: usize, outline: &[(&str, usize)]) -> Vec<u8> {
        build(pages, "outlined", outline, true)
    }
}
