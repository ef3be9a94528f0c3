//! Output page graph: a fresh PDF that pages from other documents are copied into.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::info::{encode_pdf_string, format_pdf_date, inherited_attribute};
use crate::model::Metadata;

use super::Bookmark;

/// Resource name of the built-in Helvetica face used for generated text.
pub(crate) const STAMP_FONT: &str = "FStamp";

const PRODUCER: &str = concat!("pagesmith ", env!("CARGO_PKG_VERSION"));

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// A PDF under construction.
///
/// Pages keep their order of insertion. Objects shared between pages of the
/// same source (fonts, images) are copied once per import call.
pub(crate) struct PageGraph {
    doc: LopdfDocument,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    font_id: Option<ObjectId>,
}

impl PageGraph {
    pub fn new() -> Self {
        let mut doc = LopdfDocument::with_version("1.7");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut graph = Self {
            doc,
            pages_id,
            kids: Vec::new(),
            font_id: None,
        };
        graph.sync_page_tree();
        graph
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.kids
    }

    pub fn document(&self) -> &LopdfDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut LopdfDocument {
        &mut self.doc
    }

    /// Copy pages of `source` (in the given order) to the end of the graph.
    ///
    /// References between imported pages are rewired to the copies; references
    /// to pages that are not imported become `null`.
    pub fn import_pages(&mut self, source: &LopdfDocument, page_ids: &[ObjectId]) -> Result<()> {
        let mut importer = Importer {
            source,
            target: &mut self.doc,
            copied: HashMap::new(),
            pages: HashMap::new(),
        };

        let reserved: Vec<ObjectId> = page_ids
            .iter()
            .map(|&id| {
                let new_id = importer.target.new_object_id();
                importer.pages.insert(id, new_id);
                new_id
            })
            .collect();

        for (&source_id, &new_id) in page_ids.iter().zip(&reserved) {
            let mut page = importer.copy_page(source_id)?;
            page.set("Parent", self.pages_id);
            importer.target.objects.insert(new_id, Object::Dictionary(page));
        }

        self.kids.extend(reserved);
        self.sync_page_tree();
        Ok(())
    }

    /// Append a page that only carries centered lines of Helvetica text.
    pub fn add_text_page(&mut self, size: (f32, f32), lines: &[(f32, &str)]) -> Result<ObjectId> {
        let (width, height) = size;
        let font_id = self.font();

        let block_height: f32 = lines.iter().map(|(font_size, _)| font_size * 1.6).sum();
        let mut y = (height + block_height) / 2.0;
        let mut operations = Vec::new();
        for (font_size, text) in lines {
            y -= font_size * 1.6;
            let x = ((width - text_width(text, *font_size)) / 2.0).max(0.0);
            operations.extend(text_operations(text, *font_size, x, y));
        }
        let contents = self.add_content_stream(operations)?;

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => contents,
            "Resources" => dictionary! {
                "Font" => dictionary! { STAMP_FONT => font_id },
            },
        });
        self.kids.push(page_id);
        self.sync_page_tree();
        Ok(page_id)
    }

    /// The shared Helvetica font object, created on first use.
    pub fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    pub fn add_content_stream(&mut self, operations: Vec<Operation>) -> Result<ObjectId> {
        let content = Content { operations };
        let bytes = content
            .encode()
            .map_err(|e| Error::Serialization(format!("content stream: {}", e)))?;
        Ok(self.doc.add_object(Stream::new(dictionary! {}, bytes)))
    }

    /// Write the document information dictionary.
    pub fn set_metadata(&mut self, metadata: &Metadata) {
        let mut info = Dictionary::new();
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, encode_pdf_string(value));
            }
        }
        info.set("Producer", Object::string_literal(PRODUCER));
        let now = chrono::Utc::now();
        let created = metadata.created.unwrap_or(now);
        info.set("CreationDate", Object::string_literal(format_pdf_date(&created)));
        info.set("ModDate", Object::string_literal(format_pdf_date(&now)));

        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);
    }

    /// Write a flat outline with one entry per bookmark.
    pub fn set_outline(&mut self, bookmarks: &[Bookmark]) -> Result<()> {
        let targets: Vec<(String, ObjectId)> = bookmarks
            .iter()
            .filter_map(|b| self.kids.get(b.page_index).map(|&id| (b.title.clone(), id)))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let outlines_id = self.doc.new_object_id();
        let item_ids: Vec<ObjectId> = targets.iter().map(|_| self.doc.new_object_id()).collect();

        for (i, (title, page_id)) in targets.iter().enumerate() {
            let mut item = dictionary! {
                "Title" => encode_pdf_string(title),
                "Parent" => outlines_id,
                "Dest" => vec![(*page_id).into(), "Fit".into()],
            };
            if i > 0 {
                item.set("Prev", item_ids[i - 1]);
            }
            if let Some(&next) = item_ids.get(i + 1) {
                item.set("Next", next);
            }
            self.doc.objects.insert(item_ids[i], Object::Dictionary(item));
        }

        let first = item_ids[0];
        let last = item_ids[item_ids.len() - 1];
        self.doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => first,
                "Last" => last,
                "Count" => item_ids.len() as i64,
            }),
        );

        let catalog = self.doc.catalog_mut()?;
        catalog.set("Outlines", outlines_id);
        catalog.set("PageMode", "UseOutlines");
        Ok(())
    }

    /// Serialize the graph, dropping unreachable objects.
    pub fn finish(mut self, compress: bool) -> Result<Vec<u8>> {
        self.sync_page_tree();
        self.doc.prune_objects();
        if compress {
            self.doc.compress();
        }
        let mut output = Vec::new();
        self.doc.save_to(&mut output)?;
        Ok(output)
    }

    fn sync_page_tree(&mut self) {
        let kids: Vec<Object> = self.kids.iter().map(|&id| id.into()).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );
    }
}

/// Copies objects from one document into another, once each.
struct Importer<'a> {
    source: &'a LopdfDocument,
    target: &'a mut LopdfDocument,
    /// Source object id to its copy
    copied: HashMap<ObjectId, ObjectId>,
    /// Source page id to the id reserved for its copy
    pages: HashMap<ObjectId, ObjectId>,
}

impl Importer<'_> {
    fn copy_page(&mut self, page_id: ObjectId) -> Result<Dictionary> {
        let source = self.source;
        let page = source.get_dictionary(page_id)?;

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value));
        }

        for key in INHERITABLE {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                copy.set(key.to_vec(), self.copy_object(value));
            }
        }

        Ok(copy)
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(value));
        }
        copy
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&page) = self.pages.get(&id) {
            return Object::Reference(page);
        }
        if let Some(&copied) = self.copied.get(&id) {
            return Object::Reference(copied);
        }

        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            log::warn!("dangling reference {:?} replaced with null", id);
            return Object::Null;
        };
        if is_page_tree_node(object) {
            return Object::Null;
        }

        // Reserve the id first so cyclic references resolve to the copy.
        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy_object(object);
        self.target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    dict.get(b"Type")
        .and_then(Object::as_name)
        .map(|name| name == b"Page" || name == b"Pages")
        .unwrap_or(false)
}

/// Approximate advance width of Helvetica text.
pub(crate) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Operations that draw one line of text with the stamp font.
pub(crate) fn text_operations(text: &str, font_size: f32, x: f32, y: f32) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![STAMP_FONT.into(), font_size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::String(win_ansi(text), lopdf::StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// Encode text for a WinAnsi simple font; characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::sample_pdf;

    #[test]
    fn test_import_keeps_order_and_count() {
        let source = LopdfDocument::load_mem(&sample_pdf(3, "src")).unwrap();
        let ids: Vec<ObjectId> = source.get_pages().values().copied().collect();

        let mut graph = PageGraph::new();
        graph.import_pages(&source, &[ids[2], ids[0]]).unwrap();
        assert_eq!(graph.page_count(), 2);

        let bytes = graph.finish(false).unwrap();
        let out = LopdfDocument::load_mem(&bytes).unwrap();
        assert_eq!(out.get_pages().len(), 2);
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        let third = text.find("src page 3").unwrap();
        let first = text.find("src page 1").unwrap();
        assert!(third < first);
    }

    #[test]
    fn test_inherited_media_box_is_materialized() {
        let source = LopdfDocument::load_mem(&sample_pdf(1, "a")).unwrap();
        let ids: Vec<ObjectId> = source.get_pages().values().copied().collect();

        let mut graph = PageGraph::new();
        graph.import_pages(&source, &ids).unwrap();
        let page = graph.document().get_dictionary(graph.page_ids()[0]).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn test_text_page_and_outline() {
        let mut graph = PageGraph::new();
        graph
            .add_text_page((612.0, 792.0), &[(24.0, "Merged"), (12.0, "3 documents")])
            .unwrap();
        graph
            .set_outline(&[Bookmark {
                title: "Cover".to_string(),
                page_index: 0,
            }])
            .unwrap();
        let bytes = graph.finish(true).unwrap();

        let doc = LopdfDocument::load_mem(&bytes).unwrap();
        let outline = crate::info::read_outline(&doc).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Cover");
        assert_eq!(outline[0].page, Some(1));
    }

    #[test]
    fn test_win_ansi_replaces_wide_chars() {
        assert_eq!(win_ansi("é€"), vec![0xE9, b'?']);
    }
}
