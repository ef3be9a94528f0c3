//! Source format detection from format hints and magic bytes.

use crate::error::{Error, Result};

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Source document formats the content extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Portable Document Format
    Pdf,
    /// Plain UTF-8 text; form feeds mark page breaks
    PlainText,
}

impl SourceFormat {
    /// Resolve a declared format hint.
    ///
    /// The hint may be a file extension (with or without the leading dot), a
    /// file name, or a MIME content type.
    pub fn from_hint(hint: &str) -> Result<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        let hint = hint.split(';').next().unwrap_or_default().trim();

        let candidate = match hint {
            "application/pdf" | "application/x-pdf" => return Ok(SourceFormat::Pdf),
            "text/plain" => return Ok(SourceFormat::PlainText),
            _ => hint.rsplit('.').next().unwrap_or(hint),
        };

        match candidate {
            "pdf" => Ok(SourceFormat::Pdf),
            "txt" | "text" => Ok(SourceFormat::PlainText),
            "" => Err(Error::Input("empty format hint".to_string())),
            other => Err(Error::Input(format!("unsupported format hint: {}", other))),
        }
    }

    /// MIME type of the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => "application/pdf",
            SourceFormat::PlainText => "text/plain",
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Detect PDF format from bytes.
///
/// Returns `Error::Input` if the data does not start with a valid PDF header.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::Input("not a PDF: missing %PDF- header".to_string()));
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::Input(format!("unsupported PDF version: {}", version)));
    }

    Ok(PdfFormat { version })
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let chars: Vec<char> = version.chars().collect();
    chars.len() == 3 && chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if bytes represent a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Strip the directory and extension from a file name.
///
/// `"reports/q3-summary.pdf"` becomes `"q3-summary"`.
pub fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    }
}
