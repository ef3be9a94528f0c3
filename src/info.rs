//! PDF document inspection: metadata, page geometry and outline.

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Metadata;

/// US Letter, used when a page carries no readable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Parent chains deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

/// Summary of a PDF file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub metadata: Metadata,
    pub page_count: u32,
    pub encrypted: bool,
    /// Number of top-level outline entries
    pub outline_entries: usize,
    /// Dimensions of the first page in points
    pub first_page_size: Option<(f32, f32)>,
}

/// An outline (bookmark) entry resolved to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Target page (1-indexed), when the destination could be resolved
    pub page: Option<u32>,
    /// Nesting depth (0 for top-level entries)
    pub level: u8,
}

/// Inspect PDF bytes.
pub fn inspect(data: &[u8]) -> Result<PdfInfo> {
    let doc = load_pdf(data)?;
    let page_count = doc.get_pages().len() as u32;
    let mut metadata = read_metadata(&doc);
    metadata.page_count = page_count;

    let outline_entries = read_outline(&doc)
        .map(|entries| entries.iter().filter(|e| e.level == 0).count())
        .unwrap_or(0);
    let first_page_size = doc
        .get_pages()
        .values()
        .next()
        .map(|&id| page_size(&doc, id));

    Ok(PdfInfo {
        encrypted: metadata.encrypted,
        metadata,
        page_count,
        outline_entries,
        first_page_size,
    })
}

/// Load PDF bytes, mapping structural failures to `Error::Input`.
pub(crate) fn load_pdf(data: &[u8]) -> Result<LopdfDocument> {
    LopdfDocument::load_mem(data).map_err(|e| match e {
        lopdf::Error::Decryption(_) => {
            Error::Input("document is encrypted; decrypt it first".to_string())
        }
        other => Error::Input(format!("cannot read PDF structure: {}", other)),
    })
}

/// Read the document information dictionary.
pub fn read_metadata(doc: &LopdfDocument) -> Metadata {
    let mut metadata = Metadata::with_version(doc.version.to_string());

    if let Some(info) = info_dictionary(doc) {
        metadata.title = get_string_from_dict(info, b"Title");
        metadata.author = get_string_from_dict(info, b"Author");
        metadata.subject = get_string_from_dict(info, b"Subject");
        metadata.keywords = get_string_from_dict(info, b"Keywords");
        metadata.creator = get_string_from_dict(info, b"Creator");
        metadata.producer = get_string_from_dict(info, b"Producer");

        if let Some(date_str) = get_string_from_dict(info, b"CreationDate") {
            metadata.created = parse_pdf_date(&date_str);
        }
        if let Some(date_str) = get_string_from_dict(info, b"ModDate") {
            metadata.modified = parse_pdf_date(&date_str);
        }
    }

    metadata.encrypted = doc.is_encrypted();
    metadata
}

fn info_dictionary(doc: &LopdfDocument) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    match info {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Width and height of a page, following inherited MediaBox entries.
pub fn page_size(doc: &LopdfDocument, page_id: ObjectId) -> (f32, f32) {
    let [llx, lly, urx, ury] = media_box(doc, page_id);
    (urx - llx, ury - lly)
}

/// A page's MediaBox as `[llx, lly, urx, ury]`, normalized so the lower-left
/// corner comes first. Pages without a readable box get US Letter.
pub fn media_box(doc: &LopdfDocument, page_id: ObjectId) -> [f32; 4] {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| media_box_rect(doc, obj))
        .unwrap_or([0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1])
}

/// Look up a page attribute, walking `/Parent` links for inheritable keys.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let dict = current?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }

    None
}

fn media_box_rect(doc: &LopdfDocument, obj: &Object) -> Option<[f32; 4]> {
    let (_, obj) = doc.dereference(obj).ok()?;
    let coords: Vec<f32> = obj
        .as_array()
        .ok()?
        .iter()
        .filter_map(|o| o.as_float().ok())
        .collect();
    if coords.len() < 4 {
        return None;
    }
    let rect = [
        coords[0].min(coords[2]),
        coords[1].min(coords[3]),
        coords[0].max(coords[2]),
        coords[1].max(coords[3]),
    ];
    if rect[2] - rect[0] > 0.0 && rect[3] - rect[1] > 0.0 {
        Some(rect)
    } else {
        None
    }
}

/// Read the outline tree in document order.
///
/// Returns an empty list when the catalog has no `/Outlines` entry.
pub fn read_outline(doc: &LopdfDocument) -> Result<Vec<OutlineEntry>> {
    let mut entries = Vec::new();

    let catalog = doc.catalog()?;
    let Ok(outlines) = catalog.get(b"Outlines") else {
        return Ok(entries);
    };
    let (_, outlines) = doc.dereference(outlines)?;
    let outlines = outlines.as_dict()?;

    if let Ok(first) = outlines.get(b"First").and_then(Object::as_reference) {
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        let mut visited = Vec::new();
        collect_outline_items(doc, &pages, first, 0, &mut entries, &mut visited)?;
    }

    Ok(entries)
}

fn collect_outline_items(
    doc: &LopdfDocument,
    pages: &[(u32, ObjectId)],
    first: ObjectId,
    level: u8,
    entries: &mut Vec<OutlineEntry>,
    visited: &mut Vec<ObjectId>,
) -> Result<()> {
    let mut next = Some(first);

    while let Some(item_ref) = next.take() {
        // Broken files sometimes link siblings into a cycle.
        if visited.contains(&item_ref) || level as usize >= MAX_TREE_DEPTH {
            break;
        }
        visited.push(item_ref);

        let item = doc.get_dictionary(item_ref)?;
        entries.push(OutlineEntry {
            title: get_string_from_dict(item, b"Title").unwrap_or_default(),
            page: outline_destination(doc, pages, item),
            level,
        });

        if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
            collect_outline_items(doc, pages, child, level + 1, entries, visited)?;
        }

        next = item.get(b"Next").and_then(Object::as_reference).ok();
    }

    Ok(())
}

fn outline_destination(
    doc: &LopdfDocument,
    pages: &[(u32, ObjectId)],
    item: &Dictionary,
) -> Option<u32> {
    if let Ok(dest) = item.get(b"Dest") {
        return resolve_destination(doc, pages, dest);
    }

    let action = item.get(b"A").ok()?;
    let (_, action) = doc.dereference(action).ok()?;
    let dest = action.as_dict().ok()?.get(b"D").ok()?;
    resolve_destination(doc, pages, dest)
}

fn resolve_destination(
    doc: &LopdfDocument,
    pages: &[(u32, ObjectId)],
    dest: &Object,
) -> Option<u32> {
    let (_, dest) = doc.dereference(dest).ok()?;
    let page_ref = dest.as_array().ok()?.first()?.as_reference().ok()?;
    pages
        .iter()
        .find(|(_, id)| *id == page_ref)
        .map(|(num, _)| *num)
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8, or Latin-1).
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Helper to get a string from a PDF dictionary.
pub(crate) fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Encode text as a PDF text string, using UTF-16BE when it is not ASCII.
pub(crate) fn encode_pdf_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, lopdf::StringFormat::Hexadecimal)
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
pub(crate) fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

/// Format a timestamp as a PDF date string.
pub(crate) fn format_pdf_date(date: &chrono::DateTime<chrono::Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}
