//! Page number stamping.

use std::fmt;
use std::str::FromStr;

use lopdf::content::Operation;
use lopdf::{Dictionary, Object, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::info::{inherited_attribute, media_box};

use super::graph::{text_operations, text_width, PageGraph, STAMP_FONT};

/// Distance between a stamp and the page edges, in points.
const STAMP_MARGIN: f32 = 36.0;

/// Where the page number is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StampPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl StampPosition {
    pub const ALL: [StampPosition; 6] = [
        StampPosition::TopLeft,
        StampPosition::TopCenter,
        StampPosition::TopRight,
        StampPosition::BottomLeft,
        StampPosition::BottomCenter,
        StampPosition::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StampPosition::TopLeft => "top-left",
            StampPosition::TopCenter => "top-center",
            StampPosition::TopRight => "top-right",
            StampPosition::BottomLeft => "bottom-left",
            StampPosition::BottomCenter => "bottom-center",
            StampPosition::BottomRight => "bottom-right",
        }
    }

    /// Baseline origin of a label inside `[llx, lly, urx, ury]`.
    pub fn origin(&self, rect: [f32; 4], label_width: f32, font_size: f32) -> (f32, f32) {
        let [llx, lly, urx, ury] = rect;
        let x = match self {
            StampPosition::TopLeft | StampPosition::BottomLeft => llx + STAMP_MARGIN,
            StampPosition::TopCenter | StampPosition::BottomCenter => {
                (llx + urx - label_width) / 2.0
            }
            StampPosition::TopRight | StampPosition::BottomRight => {
                urx - STAMP_MARGIN - label_width
            }
        };
        let y = match self {
            StampPosition::TopLeft | StampPosition::TopCenter | StampPosition::TopRight => {
                ury - STAMP_MARGIN - font_size
            }
            _ => lly + STAMP_MARGIN,
        };
        (x, y)
    }
}

impl FromStr for StampPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase().replace('_', "-");
        StampPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| Error::Input(format!("unknown page number position: {}", s)))
    }
}

impl fmt::Display for StampPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page number appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNumberStyle {
    pub position: StampPosition,
    /// Label template; `{n}` is the page number, `{total}` the page count
    pub format: String,
    pub font_size: f32,
}

impl Default for PageNumberStyle {
    fn default() -> Self {
        Self {
            position: StampPosition::default(),
            format: "{n}".to_string(),
            font_size: 10.0,
        }
    }
}

impl PageNumberStyle {
    pub fn at(position: StampPosition) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn label(&self, number: usize, total: usize) -> String {
        self.format
            .replace("{n}", &number.to_string())
            .replace("{total}", &total.to_string())
    }
}

/// Stamp page numbers on every page from `skip` onwards.
///
/// Numbering starts at 1 on the first stamped page. The existing content is
/// wrapped in `q`/`Q` so its graphics state cannot leak into the stamp.
pub(crate) fn stamp_page_numbers(
    graph: &mut PageGraph,
    style: &PageNumberStyle,
    skip: usize,
) -> Result<()> {
    let targets: Vec<ObjectId> = graph.page_ids().iter().skip(skip).copied().collect();
    let total = targets.len();
    if total == 0 {
        return Ok(());
    }

    let font_id = graph.font();
    let save_id = graph.add_content_stream(vec![Operation::new("q", vec![])])?;

    for (i, &page_id) in targets.iter().enumerate() {
        let label = style.label(i + 1, total);
        let rect = media_box(graph.document(), page_id);
        let (x, y) = style
            .position
            .origin(rect, text_width(&label, style.font_size), style.font_size);

        let mut operations = vec![Operation::new("Q", vec![])];
        operations.extend(text_operations(&label, style.font_size, x, y));
        let stamp_id = graph.add_content_stream(operations)?;

        let resources = stamp_resources(graph, page_id, font_id);
        let doc = graph.document_mut();
        let existing = existing_contents(doc.get_dictionary(page_id)?);
        let page = doc.get_dictionary_mut(page_id)?;

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(stamp_id));
        page.set("Contents", contents);
        page.set("Resources", resources);
    }

    log::debug!("stamped {} pages at {}", total, style.position);
    Ok(())
}

fn existing_contents(page: &Dictionary) -> Vec<Object> {
    match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        _ => Vec::new(),
    }
}

/// A private copy of the page's resources with the stamp font registered.
///
/// Resource dictionaries may be shared between pages, so they are copied
/// rather than edited in place.
fn stamp_resources(graph: &PageGraph, page_id: ObjectId, font_id: ObjectId) -> Dictionary {
    let doc = graph.document();
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| doc.dereference(obj).ok())
        .and_then(|(_, obj)| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| doc.dereference(obj).ok())
        .and_then(|(_, obj)| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    fonts.set(STAMP_FONT, font_id);
    resources.set("Font", fonts);
    resources
}
