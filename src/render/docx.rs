//! Flow-document (DOCX) rendering.

use crate::error::Result;
use crate::model::{Document, Orientation, Page, Paragraph, Table, TextStyle};

use super::ooxml::{
    content_types, core_properties, relationships, root_relationships, Package, XmlPart,
    NS_OFFICE_RELATIONSHIPS,
};
use super::{selected_pages, RenderOptions};

const NS_WORDPROCESSING: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Text width of a Letter page with one-inch margins, in twentieths of a point.
const TEXT_WIDTH_TWIPS: u32 = 9360;

/// Convert a document to a DOCX package.
pub fn to_docx(doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut package = Package::new();

    package.add_part(
        "[Content_Types].xml",
        content_types(&[
            ("/word/document.xml".to_string(), CT_DOCUMENT),
            ("/word/styles.xml".to_string(), CT_STYLES),
        ])?,
    )?;
    package.add_part("_rels/.rels", root_relationships("word/document.xml")?)?;
    package.add_part(
        "word/_rels/document.xml.rels",
        relationships(&[("rId1".to_string(), REL_STYLES, "styles.xml".to_string())])?,
    )?;
    package.add_part("word/styles.xml", styles_part()?)?;
    package.add_part("word/document.xml", document_part(doc, options)?)?;
    package.add_part("docProps/core.xml", core_properties(&doc.metadata)?)?;

    package.finish()
}

fn document_part(doc: &Document, options: &RenderOptions) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "w:document",
        &[("xmlns:w", NS_WORDPROCESSING), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;
    xml.start("w:body", &[])?;

    let pages = selected_pages(doc, options);
    for (idx, page) in pages.iter().enumerate() {
        write_heading(&mut xml, &options.heading_for(page.number), idx > 0)?;

        for paragraph in &page.paragraphs {
            write_paragraph(&mut xml, paragraph, options.preserve_styles)?;
        }
        for table in &page.tables {
            write_table(&mut xml, table)?;
            // Word merges adjacent tables unless a paragraph separates them.
            xml.empty("w:p", &[])?;
        }
    }

    write_section(&mut xml, pages.first().copied())?;
    xml.end("w:body")?;
    xml.end("w:document")?;
    Ok(xml)
}

fn write_heading(xml: &mut XmlPart, text: &str, page_break: bool) -> Result<()> {
    xml.start("w:p", &[])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:pStyle", &[("w:val", "Heading1")])?;
    if page_break {
        xml.empty("w:pageBreakBefore", &[])?;
    }
    xml.end("w:pPr")?;
    write_run(xml, text, None)?;
    xml.end("w:p")
}

fn write_paragraph(xml: &mut XmlPart, paragraph: &Paragraph, preserve_styles: bool) -> Result<()> {
    xml.start("w:p", &[])?;
    let style = preserve_styles.then_some(&paragraph.style);
    write_run(xml, paragraph.text.trim_end(), style)?;
    xml.end("w:p")
}

/// One run; line breaks inside `text` become `w:br`.
fn write_run(xml: &mut XmlPart, text: &str, style: Option<&TextStyle>) -> Result<()> {
    xml.start("w:r", &[])?;
    if let Some(style) = style {
        write_run_properties(xml, style)?;
    }
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            xml.empty("w:br", &[])?;
        }
        xml.element("w:t", &[("xml:space", "preserve")], line)?;
    }
    xml.end("w:r")
}

fn write_run_properties(xml: &mut XmlPart, style: &TextStyle) -> Result<()> {
    xml.start("w:rPr", &[])?;
    xml.empty(
        "w:rFonts",
        &[
            ("w:ascii", style.font_family.as_str()),
            ("w:hAnsi", style.font_family.as_str()),
        ],
    )?;
    if style.bold {
        xml.empty("w:b", &[])?;
    }
    if style.italic {
        xml.empty("w:i", &[])?;
    }
    xml.empty("w:color", &[("w:val", style.hex_color())])?;
    let half_points = ((style.font_size * 2.0).round().max(2.0) as u32).to_string();
    xml.empty("w:sz", &[("w:val", half_points.as_str())])?;
    xml.end("w:rPr")
}

fn write_table(xml: &mut XmlPart, table: &Table) -> Result<()> {
    let columns = table.column_count().max(1);
    let col_width = (TEXT_WIDTH_TWIPS / columns as u32).to_string();

    xml.start("w:tbl", &[])?;
    xml.start("w:tblPr", &[])?;
    xml.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
    xml.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    xml.end("w:tblPr")?;

    xml.start("w:tblGrid", &[])?;
    for _ in 0..columns {
        xml.empty("w:gridCol", &[("w:w", col_width.as_str())])?;
    }
    xml.end("w:tblGrid")?;

    for row in &table.rows {
        xml.start("w:tr", &[])?;
        if row.is_header {
            xml.start("w:trPr", &[])?;
            xml.empty("w:tblHeader", &[])?;
            xml.end("w:trPr")?;
        }
        for col in 0..columns {
            let text = row.cells.get(col).map_or("", |c| c.text.as_str());
            xml.start("w:tc", &[])?;
            xml.start("w:tcPr", &[])?;
            xml.empty("w:tcW", &[("w:w", col_width.as_str()), ("w:type", "dxa")])?;
            xml.end("w:tcPr")?;
            xml.start("w:p", &[])?;
            let header_style = TextStyle {
                bold: true,
                ..Default::default()
            };
            write_run(xml, text, row.is_header.then_some(&header_style))?;
            xml.end("w:p")?;
            xml.end("w:tc")?;
        }
        xml.end("w:tr")?;
    }

    xml.end("w:tbl")
}

fn write_section(xml: &mut XmlPart, first_page: Option<&Page>) -> Result<()> {
    let (width, height, landscape) = match first_page {
        Some(page) => (
            page.width,
            page.height,
            page.orientation() == Orientation::Landscape,
        ),
        None => (612.0, 792.0, false),
    };
    let w = ((width * 20.0).round() as u32).to_string();
    let h = ((height * 20.0).round() as u32).to_string();

    xml.start("w:sectPr", &[])?;
    let mut size = vec![("w:w", w.as_str()), ("w:h", h.as_str())];
    if landscape {
        size.push(("w:orient", "landscape"));
    }
    xml.empty("w:pgSz", &size)?;
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.end("w:sectPr")
}

fn styles_part() -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("w:styles", &[("xmlns:w", NS_WORDPROCESSING)])?;

    let default_size = ((TextStyle::DEFAULT_FONT_SIZE * 2.0) as u32).to_string();
    xml.start("w:docDefaults", &[])?;
    xml.start("w:rPrDefault", &[])?;
    xml.start("w:rPr", &[])?;
    xml.empty(
        "w:rFonts",
        &[
            ("w:ascii", TextStyle::DEFAULT_FONT_FAMILY),
            ("w:hAnsi", TextStyle::DEFAULT_FONT_FAMILY),
        ],
    )?;
    xml.empty("w:sz", &[("w:val", default_size.as_str())])?;
    xml.end("w:rPr")?;
    xml.end("w:rPrDefault")?;
    xml.end("w:docDefaults")?;

    xml.start(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    xml.empty("w:name", &[("w:val", "Normal")])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:spacing", &[("w:after", "160")])?;
    xml.end("w:pPr")?;
    xml.end("w:style")?;

    xml.start("w:style", &[("w:type", "paragraph"), ("w:styleId", "Heading1")])?;
    xml.empty("w:name", &[("w:val", "heading 1")])?;
    xml.empty("w:basedOn", &[("w:val", "Normal")])?;
    xml.empty("w:next", &[("w:val", "Normal")])?;
    xml.start("w:pPr", &[])?;
    xml.empty("w:keepNext", &[])?;
    xml.empty("w:spacing", &[("w:before", "240"), ("w:after", "120")])?;
    xml.empty("w:outlineLvl", &[("w:val", "0")])?;
    xml.end("w:pPr")?;
    xml.start("w:rPr", &[])?;
    xml.empty("w:b", &[])?;
    xml.empty("w:sz", &[("w:val", "32")])?;
    xml.end("w:rPr")?;
    xml.end("w:style")?;

    xml.start("w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
    xml.empty("w:name", &[("w:val", "Table Grid")])?;
    xml.start("w:tblPr", &[])?;
    xml.start("w:tblBorders", &[])?;
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        xml.empty(
            side,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    xml.end("w:tblBorders")?;
    xml.end("w:tblPr")?;
    xml.end("w:style")?;

    xml.end("w:styles")?;
    Ok(xml)
}
