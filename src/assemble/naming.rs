//! Output file naming for split fragments.

use super::PageRange;

/// Default template for split fragments.
pub const DEFAULT_NAME_TEMPLATE: &str = "{filename}_part{index}";

/// Expand a naming template for one fragment.
///
/// Tokens: `{filename}` (source stem), `{index}` (1-based, zero-padded to two
/// digits), `{start}` and `{end}` (1-based page numbers). A `.pdf` extension
/// is appended unless the template already ends with one.
pub fn fragment_name(template: &str, filename: &str, index: usize, range: &PageRange) -> String {
    let name = template
        .replace("{filename}", filename)
        .replace("{index}", &format!("{:02}", index))
        .replace("{start}", &(range.start + 1).to_string())
        .replace("{end}", &(range.end + 1).to_string());

    if name.to_ascii_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{}.pdf", name)
    }
}

/// Bookmark title for the nth merge input: its file stem, or `Document N`.
pub fn input_title(filename: Option<&str>, position: usize) -> String {
    filename
        .map(crate::detect::file_stem)
        .filter(|stem| !stem.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Document {}", position))
}
