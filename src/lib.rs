//! # pagesmith
//!
//! Document transformation and PDF page assembly for Rust.
//!
//! Two independent pipelines share this crate:
//!
//! - **Conversion**: source bytes are extracted into a format-agnostic
//!   [`Document`] (pages, paragraphs, tables) and serialized to DOCX, XLSX,
//!   PPTX, RTF, plain text or JSON.
//! - **Assembly and protection**: merge, split, compress, rotate and stamp
//!   PDFs directly on their page-object graph, and encrypt or decrypt them
//!   through an ordered chain of providers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagesmith::{render, TargetKind};
//!
//! fn main() -> pagesmith::Result<()> {
//!     let data = std::fs::read("report.pdf")?;
//!     let doc = pagesmith::extract_bytes(&data, "pdf")?;
//!
//!     let options = render::RenderOptions::default();
//!     let docx = render::serialize(&doc, TargetKind::Docx, &options)?;
//!     std::fs::write("report.docx", docx)?;
//!     Ok(())
//! }
//! ```
//!
//! ```no_run
//! use pagesmith::assemble::{merge, MergeInput, MergeOptions, PageNumberStyle, StampPosition};
//!
//! let inputs = vec![
//!     MergeInput::named(std::fs::read("a.pdf")?, "a.pdf"),
//!     MergeInput::named(std::fs::read("b.pdf")?, "b.pdf"),
//! ];
//! let options = MergeOptions::default()
//!     .with_title_page(true)
//!     .with_page_numbers(PageNumberStyle::at(StampPosition::BottomCenter));
//! let merged = merge(&inputs, &options)?;
//! std::fs::write("merged.pdf", merged.data)?;
//! # Ok::<(), pagesmith::Error>(())
//! ```

pub mod assemble;
pub mod detect;
pub mod error;
pub mod extract;
pub mod info;
pub mod model;
pub mod ops;
pub mod protect;
pub mod render;
pub mod storage;

pub use assemble::{
    Bookmark, CompressOptions, ImageDocumentOptions, MergeInput, MergeOptions, PageNumberStyle,
    PageRange, SplitMode, SplitOptions, StampPosition,
};
pub use detect::{detect_format_from_bytes, is_pdf_bytes, PdfFormat, SourceFormat};
pub use error::{Error, ErrorKind, ErrorReport, Result};
pub use extract::{ContentExtractor, ExtractOptions};
pub use info::{inspect, PdfInfo};
pub use model::{
    Document, Metadata, Orientation, Page, PageMapping, Paragraph, Table, TableCell, TableRow,
    TextStyle,
};
pub use ops::{OperationOutput, Pagesmith, Produced};
pub use protect::{EncryptionLevel, Permissions, ProtectionEngine, ProtectionRequest};
pub use render::{JsonFormat, PageSelection, RenderOptions, SheetMode, TargetKind};
pub use storage::{FsStorage, MemoryStorage, StorageGateway};

use std::path::Path;

/// Extract a structured document from bytes.
///
/// `format_hint` is an extension, file name or MIME type.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("notes.txt").unwrap();
/// let doc = pagesmith::extract_bytes(&data, "txt").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn extract_bytes(data: &[u8], format_hint: &str) -> Result<Document> {
    ContentExtractor::new(ExtractOptions::default()).extract(data, format_hint)
}

/// Extract a structured document from a file, using its extension as hint.
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let hint = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("pdf");
    extract_bytes(&data, hint)
}

/// Convert a file to another format in one call.
///
/// # Example
///
/// ```no_run
/// use pagesmith::{convert_file, TargetKind};
///
/// let xlsx = convert_file("tables.pdf", TargetKind::Xlsx).unwrap();
/// std::fs::write("tables.xlsx", xlsx).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P, target: TargetKind) -> Result<Vec<u8>> {
    let doc = extract_file(path)?;
    render::serialize(&doc, target, &RenderOptions::default())
}

/// Extract plain text from a file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(extract_file(path)?.plain_text())
}
