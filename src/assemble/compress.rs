//! Best-effort size reduction.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::load_source;

/// Options for [`compress`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressOptions {
    /// Drop the information dictionary and XMP metadata
    pub strip_metadata: bool,
    /// Ask for a linearized (web-optimized) layout. Recorded only; the writer
    /// always emits a standard layout.
    pub linearize: bool,
}

impl CompressOptions {
    pub fn with_strip_metadata(mut self, enabled: bool) -> Self {
        self.strip_metadata = enabled;
        self
    }

    pub fn with_linearize(mut self, enabled: bool) -> Self {
        self.linearize = enabled;
        self
    }
}

/// Output of [`compress`].
#[derive(Debug, Clone)]
pub struct CompressResult {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub page_count: usize,
    /// `(original - result) / original`; negative when the output grew
    pub ratio: f64,
    pub linearize_requested: bool,
}

/// Re-serialize a PDF with unreachable objects pruned and streams compressed.
///
/// Never fails because the result is larger than the input.
pub fn compress(data: &[u8], options: &CompressOptions) -> Result<CompressResult> {
    let mut doc = load_source(data, "source document")?;
    let page_count = doc.get_pages().len();

    if options.strip_metadata {
        doc.trailer.remove(b"Info");
        if let Ok(catalog) = doc.catalog_mut() {
            catalog.remove(b"Metadata");
        }
    }
    if options.linearize {
        log::debug!("linearization requested; writing a standard layout");
    }

    doc.prune_objects();
    doc.delete_zero_length_streams();
    doc.renumber_objects();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)?;

    let ratio = compression_ratio(data.len(), output.len());
    log::info!(
        "compressed {} -> {} bytes (ratio {:.3})",
        data.len(),
        output.len(),
        ratio
    );

    Ok(CompressResult {
        data: output,
        original_size: data.len(),
        page_count,
        ratio,
        linearize_requested: options.linearize,
    })
}

/// `(original - result) / original`, or 0 for an empty original.
pub fn compression_ratio(original: usize, result: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - result as f64) / original as f64
}
