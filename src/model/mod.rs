//! Structured document model.
//!
//! This module defines the intermediate representation (IR) that bridges
//! content extraction and the format serializers. The model is
//! format-agnostic: every serializer consumes the same [`Document`].

mod document;
mod page;
mod paragraph;
mod table;

pub use document::{Document, Metadata, PageMapping};
pub use page::{Orientation, Page};
pub use paragraph::{Paragraph, TextStyle};
pub use table::{Table, TableCell, TableRow};
