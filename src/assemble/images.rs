//! Build a PDF from raster images, one page per image.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MM_PER_INCH: f32 = 25.4;

/// Page size used for image pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImagePageSize {
    #[default]
    A4,
    Letter,
    /// Each page matches its image plus margins
    FitImage,
}

impl ImagePageSize {
    fn dimensions_mm(&self) -> Option<(f32, f32)> {
        match self {
            ImagePageSize::A4 => Some((210.0, 297.0)),
            ImagePageSize::Letter => Some((215.9, 279.4)),
            ImagePageSize::FitImage => None,
        }
    }
}

/// Options for [`images_to_pdf`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDocumentOptions {
    pub page_size: ImagePageSize,
    pub margin_mm: f32,
    /// Resolution images are assumed to have
    pub dpi: f32,
    /// Images smaller than the printable area are enlarged to fill it
    pub upscale: bool,
    pub title: Option<String>,
}

impl Default for ImageDocumentOptions {
    fn default() -> Self {
        Self {
            page_size: ImagePageSize::default(),
            margin_mm: 15.0,
            dpi: 150.0,
            upscale: false,
            title: None,
        }
    }
}

impl ImageDocumentOptions {
    pub fn with_page_size(mut self, page_size: ImagePageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_margin_mm(mut self, margin_mm: f32) -> Self {
        self.margin_mm = margin_mm.max(0.0);
        self
    }

    pub fn with_upscale(mut self, enabled: bool) -> Self {
        self.upscale = enabled;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Where an image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// Scale an image to fit inside the page margins, centered.
pub fn place_image(width_px: u32, height_px: u32, options: &ImageDocumentOptions) -> ImagePlacement {
    let dpi = if options.dpi > 0.0 { options.dpi } else { 150.0 };
    let image_w_mm = width_px as f32 / dpi * MM_PER_INCH;
    let image_h_mm = height_px as f32 / dpi * MM_PER_INCH;
    let margin = options.margin_mm;

    let (page_w, page_h) = options
        .page_size
        .dimensions_mm()
        .unwrap_or((image_w_mm + 2.0 * margin, image_h_mm + 2.0 * margin));

    let usable_w = (page_w - 2.0 * margin).max(1.0);
    let usable_h = (page_h - 2.0 * margin).max(1.0);
    let mut scale = (usable_w / image_w_mm.max(f32::EPSILON)).min(usable_h / image_h_mm.max(f32::EPSILON));
    if !options.upscale {
        scale = scale.min(1.0);
    }

    let rendered_w = image_w_mm * scale;
    let rendered_h = image_h_mm * scale;
    ImagePlacement {
        page_width_mm: page_w,
        page_height_mm: page_h,
        x: Mm(margin + (usable_w - rendered_w) / 2.0).into_pt().0,
        y: Mm(margin + (usable_h - rendered_h) / 2.0).into_pt().0,
        scale,
    }
}

/// Create a PDF with one page per image (JPEG, PNG, or any format the
/// `image` crate decodes), in input order.
pub fn images_to_pdf<B: AsRef<[u8]>>(images: &[B], options: &ImageDocumentOptions) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(Error::Input("no images given".to_string()));
    }

    let title = options.title.as_deref().unwrap_or("Images");
    let mut doc = PdfDocument::new(title);
    let mut pages = Vec::with_capacity(images.len());

    for (i, bytes) in images.iter().enumerate() {
        let decoded = image::load_from_memory(bytes.as_ref())
            .map_err(|e| Error::Input(format!("image #{} cannot be decoded: {}", i + 1, e)))?;
        let (width, height) = (decoded.width(), decoded.height());
        let raw = RawImage {
            pixels: RawImageData::U8(decoded.to_rgb8().into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let placement = place_image(width, height, options);
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.scale),
                scale_y: Some(placement.scale),
                dpi: Some(options.dpi),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(
            Mm(placement.page_width_mm),
            Mm(placement.page_height_mm),
            ops,
        ));
        log::debug!("image #{}: {}x{} px, scale {:.3}", i + 1, width, height, placement.scale);
    }

    doc.with_pages(pages);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("{} warnings while writing image document", warnings.len());
    }
    Ok(output)
}
