//! Operation facade.
//!
//! Every operation runs in byte mode (bytes in, [`Produced`] out) and in
//! from-storage mode, where input is read from and output written to a
//! [`StorageGateway`] and only the [`OperationOutput`] summary is returned.

use serde::{Deserialize, Serialize};

use crate::assemble::{
    self, Bookmark, CompressOptions, ImageDocumentOptions, MergeInput, MergeOptions, SplitOptions,
};
use crate::detect::file_stem;
use crate::error::{Error, Result};
use crate::extract::{ContentExtractor, ExtractOptions};
use crate::info::{self, PdfInfo};
use crate::model::Document;
use crate::protect::{DecryptStatus, EncryptionLevel, ProtectionEngine, ProtectionRequest};
use crate::render::{self, RenderOptions, TargetKind};
use crate::storage::StorageGateway;

const PDF_MIME: &str = "application/pdf";

/// Summary returned by every operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutput {
    pub filename: String,
    /// Output size in bytes
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<Vec<Bookmark>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_level: Option<EncryptionLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl OperationOutput {
    fn new(filename: impl Into<String>, size: usize) -> Self {
        Self {
            filename: filename.into(),
            size,
            ..Default::default()
        }
    }
}

/// Output bytes together with their summary.
#[derive(Debug, Clone)]
pub struct Produced {
    pub output: OperationOutput,
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

impl Produced {
    fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            output: OperationOutput::new(filename, data.len()),
            data,
            content_type: PDF_MIME,
        }
    }
}

/// Stateless entry point for every operation.
///
/// Engines are configured once and shared; each call owns its buffers.
pub struct Pagesmith {
    extractor: ContentExtractor,
    protection: ProtectionEngine,
    storage: Option<Box<dyn StorageGateway>>,
}

impl Default for Pagesmith {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagesmith {
    pub fn new() -> Self {
        Self {
            extractor: ContentExtractor::new(ExtractOptions::default()),
            protection: ProtectionEngine::default(),
            storage: None,
        }
    }

    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extractor = ContentExtractor::new(options);
        self
    }

    pub fn with_protection(mut self, protection: ProtectionEngine) -> Self {
        self.protection = protection;
        self
    }

    pub fn with_storage(mut self, storage: impl StorageGateway + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    fn storage(&self) -> Result<&dyn StorageGateway> {
        self.storage
            .as_deref()
            .ok_or_else(|| Error::Storage("no storage gateway configured".to_string()))
    }

    // -- Byte mode ------------------------------------------------------------

    /// Extract the structured model from source bytes.
    pub fn extract(&self, data: &[u8], format_hint: &str) -> Result<Document> {
        self.extractor.extract(data, format_hint)
    }

    /// Extract and re-serialize to another format.
    ///
    /// `filename` names the source; the output keeps its stem.
    pub fn convert(
        &self,
        data: &[u8],
        filename: &str,
        target: TargetKind,
        options: &RenderOptions,
    ) -> Result<Produced> {
        let doc = self.extractor.extract(data, filename)?;
        let bytes = render::serialize(&doc, target, options)?;

        let mut output = OperationOutput::new(
            format!("{}.{}", file_stem(filename), target.extension()),
            bytes.len(),
        );
        output.page_count = Some(doc.page_count() as usize);
        Ok(Produced {
            output,
            data: bytes,
            content_type: target.mime_type(),
        })
    }

    pub fn merge(&self, inputs: &[MergeInput], options: &MergeOptions, filename: &str) -> Result<Produced> {
        let result = assemble::merge(inputs, options)?;
        let mut produced = Produced::pdf(filename, result.data);
        produced.output.page_count = Some(result.page_count);
        if !result.bookmarks.is_empty() {
            produced.output.bookmarks = Some(result.bookmarks);
        }
        Ok(produced)
    }

    pub fn split(&self, data: &[u8], options: &SplitOptions) -> Result<Vec<Produced>> {
        let fragments = assemble::split(data, options)?;
        Ok(fragments
            .into_iter()
            .map(|fragment| {
                let page_count = fragment.page_count();
                let mut produced = Produced::pdf(fragment.name, fragment.data);
                produced.output.page_count = Some(page_count);
                produced
            })
            .collect())
    }

    pub fn compress(&self, data: &[u8], options: &CompressOptions, filename: &str) -> Result<Produced> {
        let result = assemble::compress(data, options)?;
        let mut produced = Produced::pdf(filename, result.data);
        produced.output.page_count = Some(result.page_count);
        produced.output.compression_ratio = Some(result.ratio);
        Ok(produced)
    }

    pub fn rotate(&self, data: &[u8], degrees: i32, pages: Option<&str>, filename: &str) -> Result<Produced> {
        let rotated = assemble::rotate(data, degrees, pages)?;
        Ok(Produced::pdf(filename, rotated))
    }

    pub fn images_to_pdf<B: AsRef<[u8]>>(
        &self,
        images: &[B],
        options: &ImageDocumentOptions,
        filename: &str,
    ) -> Result<Produced> {
        let data = assemble::images_to_pdf(images, options)?;
        let mut produced = Produced::pdf(filename, data);
        produced.output.page_count = Some(images.len());
        Ok(produced)
    }

    pub fn encrypt(&self, data: &[u8], request: &ProtectionRequest, filename: &str) -> Result<Produced> {
        let outcome = self.protection.encrypt(data, request)?;
        let mut produced = Produced::pdf(filename, outcome.data);
        produced.output.encrypted = Some(true);
        produced.output.encryption_level = Some(outcome.level);
        produced.output.permissions = Some(
            outcome
                .permissions
                .granted()
                .into_iter()
                .map(String::from)
                .collect(),
        );
        Ok(produced)
    }

    pub fn decrypt(&self, data: &[u8], password: &str, filename: &str) -> Result<Produced> {
        let outcome = self.protection.decrypt(data, password)?;
        if outcome.status == DecryptStatus::NotEncrypted {
            log::info!("{} was not encrypted", filename);
        }
        let mut produced = Produced::pdf(filename, outcome.data);
        produced.output.encrypted = Some(false);
        Ok(produced)
    }

    pub fn inspect(&self, data: &[u8]) -> Result<PdfInfo> {
        info::inspect(data)
    }

    // -- From-storage mode ----------------------------------------------------

    fn store(&self, path: &str, produced: Produced) -> Result<OperationOutput> {
        self.storage()?.write(path, &produced.data, produced.content_type)?;
        let mut output = produced.output;
        output.filename = path.to_string();
        Ok(output)
    }

    pub fn convert_from_storage(
        &self,
        input_path: &str,
        output_path: &str,
        target: TargetKind,
        options: &RenderOptions,
    ) -> Result<OperationOutput> {
        let data = self.storage()?.read(input_path)?;
        let produced = self.convert(&data, input_path, target, options)?;
        self.store(output_path, produced)
    }

    pub fn merge_from_storage(
        &self,
        input_paths: &[&str],
        output_path: &str,
        options: &MergeOptions,
    ) -> Result<OperationOutput> {
        let storage = self.storage()?;
        let inputs = input_paths
            .iter()
            .map(|path| Ok(MergeInput::named(storage.read(path)?, *path)))
            .collect::<Result<Vec<_>>>()?;
        let produced = self.merge(&inputs, options, output_path)?;
        self.store(output_path, produced)
    }

    /// Fragments are written under `output_dir` with their template names.
    pub fn split_from_storage(
        &self,
        input_path: &str,
        output_dir: &str,
        options: &SplitOptions,
    ) -> Result<Vec<OperationOutput>> {
        let data = self.storage()?.read(input_path)?;
        let mut options = options.clone();
        if options.filename == SplitOptions::default().filename {
            options = options.with_filename(input_path);
        }
        let dir = output_dir.trim_end_matches('/');
        self.split(&data, &options)?
            .into_iter()
            .map(|produced| {
                let path = if dir.is_empty() {
                    produced.output.filename.clone()
                } else {
                    format!("{}/{}", dir, produced.output.filename)
                };
                self.store(&path, produced)
            })
            .collect()
    }

    pub fn compress_from_storage(
        &self,
        input_path: &str,
        output_path: &str,
        options: &CompressOptions,
    ) -> Result<OperationOutput> {
        let data = self.storage()?.read(input_path)?;
        let produced = self.compress(&data, options, output_path)?;
        self.store(output_path, produced)
    }

    pub fn rotate_from_storage(
        &self,
        input_path: &str,
        output_path: &str,
        degrees: i32,
        pages: Option<&str>,
    ) -> Result<OperationOutput> {
        let data = self.storage()?.read(input_path)?;
        let produced = self.rotate(&data, degrees, pages, output_path)?;
        self.store(output_path, produced)
    }

    pub fn images_from_storage(
        &self,
        image_paths: &[&str],
        output_path: &str,
        options: &ImageDocumentOptions,
    ) -> Result<OperationOutput> {
        let storage = self.storage()?;
        let images = image_paths
            .iter()
            .map(|path| storage.read(path))
            .collect::<Result<Vec<_>>>()?;
        let produced = self.images_to_pdf(&images, options, output_path)?;
        self.store(output_path, produced)
    }

    pub fn encrypt_from_storage(
        &self,
        input_path: &str,
        output_path: &str,
        request: &ProtectionRequest,
    ) -> Result<OperationOutput> {
        let data = self.storage()?.read(input_path)?;
        let produced = self.encrypt(&data, request, output_path)?;
        self.store(output_path, produced)
    }

    pub fn decrypt_from_storage(
        &self,
        input_path: &str,
        output_path: &str,
        password: &str,
    ) -> Result<OperationOutput> {
        let data = self.storage()?.read(input_path)?;
        let produced = self.decrypt(&data, password, output_path)?;
        self.store(output_path, produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::sample_pdf;
    use crate::error::ErrorKind;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_output_serializes_camel_case_without_nones() {
        let mut output = OperationOutput::new("out.pdf", 10);
        output.page_count = Some(3);
        output.compression_ratio = Some(-0.25);
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"pageCount\":3"));
        assert!(json.contains("\"compressionRatio\":-0.25"));
        assert!(!json.contains("encrypted"));
    }

    #[test]
    fn test_convert_plain_text() {
        let ops = Pagesmith::new();
        let produced = ops
            .convert(b"alpha\n\nbeta", "notes.txt", TargetKind::Json, &RenderOptions::default())
            .unwrap();
        assert_eq!(produced.output.filename, "notes.json");
        assert_eq!(produced.output.page_count, Some(1));
        assert_eq!(produced.content_type, "application/json");
        assert_eq!(produced.output.size, produced.data.len());
    }

    #[test]
    fn test_storage_mode_requires_gateway() {
        let err = Pagesmith::new()
            .compress_from_storage("a.pdf", "b.pdf", &CompressOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageError);
    }

    #[test]
    fn test_merge_and_split_from_storage() {
        let storage = MemoryStorage::new();
        storage.insert("in/a.pdf", sample_pdf(2, "a"), PDF_MIME).unwrap();
        storage.insert("in/b.pdf", sample_pdf(3, "b"), PDF_MIME).unwrap();

        let ops = Pagesmith::new().with_storage(storage);
        let merged = ops
            .merge_from_storage(&["in/a.pdf", "in/b.pdf"], "out/merged.pdf", &MergeOptions::default())
            .unwrap();
        assert_eq!(merged.filename, "out/merged.pdf");
        assert_eq!(merged.page_count, Some(5));
        let titles: Vec<String> = merged.bookmarks.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["a", "b"]);

        let parts = ops
            .split_from_storage("out/merged.pdf", "parts", &SplitOptions::ranges(["1-2", "3-5"]))
            .unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, vec!["parts/merged_part01.pdf", "parts/merged_part02.pdf"]);
        assert_eq!(parts[1].page_count, Some(3));
    }

    #[test]
    fn test_missing_input_is_storage_error() {
        let ops = Pagesmith::new().with_storage(MemoryStorage::new());
        let err = ops
            .decrypt_from_storage("missing.pdf", "out.pdf", "pw")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageError);
    }

    #[test]
    fn test_decrypt_plain_reports_unencrypted() {
        let plain = sample_pdf(1, "plain");
        let produced = Pagesmith::new().decrypt(&plain, "pw", "plain.pdf").unwrap();
        assert_eq!(produced.output.encrypted, Some(false));
        assert_eq!(produced.data, plain);
    }

    #[test]
    fn test_compress_reports_ratio() {
        let produced = Pagesmith::new()
            .compress(&sample_pdf(2, "c"), &CompressOptions::default(), "c.pdf")
            .unwrap();
        assert!(produced.output.compression_ratio.is_some());
        assert_eq!(produced.output.page_count, Some(2));
    }
}
