//! Page rotation.

use std::collections::BTreeSet;

use lopdf::Object;

use crate::error::{Error, Result};
use crate::info::inherited_attribute;

use super::load_source;
use super::ranges::parse_ranges;

/// Rotate pages clockwise by a multiple of 90 degrees.
///
/// `pages` is a range expression such as `"1-3,5"`; `None` rotates every
/// page. Rotation adds to any rotation the page already has.
pub fn rotate(data: &[u8], degrees: i32, pages: Option<&str>) -> Result<Vec<u8>> {
    if degrees % 90 != 0 {
        return Err(Error::Input(format!(
            "rotation must be a multiple of 90, got {}",
            degrees
        )));
    }

    let mut doc = load_source(data, "source document")?;
    let page_ids: Vec<_> = doc.get_pages().values().copied().collect();

    let selected: BTreeSet<usize> = match pages {
        Some(expr) => parse_ranges(expr, page_ids.len())?
            .iter()
            .flat_map(|r| r.indices())
            .collect(),
        None => (0..page_ids.len()).collect(),
    };

    for index in selected {
        let page_id = page_ids[index];
        let existing = inherited_attribute(&doc, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        let rotation = (existing + i64::from(degrees)).rem_euclid(360);
        doc.get_dictionary_mut(page_id)?
            .set("Rotate", Object::Integer(rotation));
        log::debug!("page {} rotated {} -> {}", index + 1, existing, rotation);
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}
