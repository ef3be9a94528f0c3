//! Slide-deck (PPTX) rendering.
//!
//! One slide per page: a title box, one text box per paragraph stacked at a
//! fixed vertical step, then a table graphic frame below the paragraph block.

use crate::error::Result;
use crate::model::{Document, Page, Paragraph, Table};

use super::ooxml::{
    content_types, core_properties, relationships, root_relationships, Package, XmlPart,
    NS_OFFICE_RELATIONSHIPS,
};
use super::{selected_pages, RenderOptions};

const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const URI_TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

// Geometry in EMU (914400 per inch).
const SLIDE_WIDTH: i64 = 9_144_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
const MARGIN: i64 = 457_200;
const TITLE_HEIGHT: i64 = 685_800;
/// Vertical step between paragraph boxes.
const PARAGRAPH_STEP: i64 = 457_200;
const TABLE_GAP: i64 = 228_600;
const TABLE_ROW_HEIGHT: i64 = 370_840;

const TITLE_FONT: &str = "2800";
const BODY_FONT: &str = "1600";
const TABLE_FONT: &str = "1200";

/// Vertical placement of the shapes on one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideLayout {
    /// Top offset of each paragraph box
    pub paragraph_tops: Vec<i64>,
    /// Top offset of each table frame
    pub table_tops: Vec<i64>,
}

/// Compute shape positions for a page.
pub fn slide_layout(page: &Page) -> SlideLayout {
    let body_top = MARGIN + TITLE_HEIGHT;
    let paragraph_tops: Vec<i64> = (0..page.paragraphs.len() as i64)
        .map(|i| body_top + i * PARAGRAPH_STEP)
        .collect();

    let mut next = body_top + page.paragraphs.len() as i64 * PARAGRAPH_STEP;
    let mut table_tops = Vec::with_capacity(page.tables.len());
    for table in &page.tables {
        next += TABLE_GAP;
        table_tops.push(next);
        next += table.row_count() as i64 * TABLE_ROW_HEIGHT;
    }

    SlideLayout {
        paragraph_tops,
        table_tops,
    }
}

/// Convert a document to a PPTX package.
pub fn to_pptx(doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    let pages = selected_pages(doc, options);
    let mut package = Package::new();

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_LAYOUT),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
    ];
    for idx in 1..=pages.len() {
        overrides.push((format!("/ppt/slides/slide{}.xml", idx), CT_SLIDE));
    }
    package.add_part("[Content_Types].xml", content_types(&overrides)?)?;
    package.add_part("_rels/.rels", root_relationships("ppt/presentation.xml")?)?;

    let mut rels = vec![(
        "rId1".to_string(),
        REL_MASTER,
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for idx in 1..=pages.len() {
        rels.push((
            format!("rId{}", idx + 1),
            REL_SLIDE,
            format!("slides/slide{}.xml", idx),
        ));
    }
    rels.push((
        format!("rId{}", pages.len() + 2),
        REL_THEME,
        "theme/theme1.xml".to_string(),
    ));
    package.add_part("ppt/_rels/presentation.xml.rels", relationships(&rels)?)?;
    package.add_part("ppt/presentation.xml", presentation_part(pages.len())?)?;

    package.add_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships(&[
            (
                "rId1".to_string(),
                REL_LAYOUT,
                "../slideLayouts/slideLayout1.xml".to_string(),
            ),
            ("rId2".to_string(), REL_THEME, "../theme/theme1.xml".to_string()),
        ])?,
    )?;
    package.add_part("ppt/slideMasters/slideMaster1.xml", master_part()?)?;
    package.add_part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships(&[(
            "rId1".to_string(),
            REL_MASTER,
            "../slideMasters/slideMaster1.xml".to_string(),
        )])?,
    )?;
    package.add_part("ppt/slideLayouts/slideLayout1.xml", layout_part()?)?;
    package.add_part("ppt/theme/theme1.xml", theme_part()?)?;

    for (idx, page) in pages.iter().enumerate() {
        package.add_part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", idx + 1),
            relationships(&[(
                "rId1".to_string(),
                REL_LAYOUT,
                "../slideLayouts/slideLayout1.xml".to_string(),
            )])?,
        )?;
        package.add_part(
            &format!("ppt/slides/slide{}.xml", idx + 1),
            slide_part(page, options)?,
        )?;
    }
    package.add_part("docProps/core.xml", core_properties(&doc.metadata)?)?;

    package.finish()
}

fn namespaces() -> [(&'static str, &'static str); 3] {
    [
        ("xmlns:a", NS_DRAWING),
        ("xmlns:r", NS_OFFICE_RELATIONSHIPS),
        ("xmlns:p", NS_PRESENTATION),
    ]
}

fn presentation_part(slides: usize) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("p:presentation", &namespaces())?;
    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.end("p:sldMasterIdLst")?;

    if slides > 0 {
        xml.start("p:sldIdLst", &[])?;
        for idx in 0..slides {
            let id = (256 + idx).to_string();
            let rel = format!("rId{}", idx + 2);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
        }
        xml.end("p:sldIdLst")?;
    }

    let cx = SLIDE_WIDTH.to_string();
    let cy = SLIDE_HEIGHT.to_string();
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.empty("p:notesSz", &[("cx", cy.as_str()), ("cy", cx.as_str())])?;
    xml.end("p:presentation")?;
    Ok(xml)
}

fn empty_tree(xml: &mut XmlPart) -> Result<()> {
    xml.start("p:spTree", &[])?;
    write_group_header(xml)?;
    xml.end("p:spTree")
}

fn write_group_header(xml: &mut XmlPart) -> Result<()> {
    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.start("p:grpSpPr", &[])?;
    xml.start("a:xfrm", &[])?;
    xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    xml.end("a:xfrm")?;
    xml.end("p:grpSpPr")
}

fn master_part() -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("p:sldMaster", &namespaces())?;
    xml.start("p:cSld", &[])?;
    empty_tree(&mut xml)?;
    xml.end("p:cSld")?;
    xml.empty(
        "p:clrMap",
        &[
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
            ("accent1", "accent1"),
            ("accent2", "accent2"),
            ("accent3", "accent3"),
            ("accent4", "accent4"),
            ("accent5", "accent5"),
            ("accent6", "accent6"),
            ("hlink", "hlink"),
            ("folHlink", "folHlink"),
        ],
    )?;
    xml.start("p:sldLayoutIdLst", &[])?;
    xml.empty("p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rId1")])?;
    xml.end("p:sldLayoutIdLst")?;
    xml.end("p:sldMaster")?;
    Ok(xml)
}

fn layout_part() -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    let mut attrs = namespaces().to_vec();
    attrs.push(("type", "blank"));
    attrs.push(("preserve", "1"));
    xml.start("p:sldLayout", &attrs)?;
    xml.start("p:cSld", &[("name", "Blank")])?;
    empty_tree(&mut xml)?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sldLayout")?;
    Ok(xml)
}

fn theme_part() -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("a:theme", &[("xmlns:a", NS_DRAWING), ("name", "Office Theme")])?;
    xml.start("a:themeElements", &[])?;

    xml.start("a:clrScheme", &[("name", "Office")])?;
    xml.start("a:dk1", &[])?;
    xml.empty("a:sysClr", &[("val", "windowText"), ("lastClr", "000000")])?;
    xml.end("a:dk1")?;
    xml.start("a:lt1", &[])?;
    xml.empty("a:sysClr", &[("val", "window"), ("lastClr", "FFFFFF")])?;
    xml.end("a:lt1")?;
    for (name, rgb) in [
        ("a:dk2", "1F497D"),
        ("a:lt2", "EEECE1"),
        ("a:accent1", "4F81BD"),
        ("a:accent2", "C0504D"),
        ("a:accent3", "9BBB59"),
        ("a:accent4", "8064A2"),
        ("a:accent5", "4BACC6"),
        ("a:accent6", "F79646"),
        ("a:hlink", "0000FF"),
        ("a:folHlink", "800080"),
    ] {
        xml.start(name, &[])?;
        xml.empty("a:srgbClr", &[("val", rgb)])?;
        xml.end(name)?;
    }
    xml.end("a:clrScheme")?;

    xml.start("a:fontScheme", &[("name", "Office")])?;
    for font in ["a:majorFont", "a:minorFont"] {
        xml.start(font, &[])?;
        xml.empty("a:latin", &[("typeface", "Calibri")])?;
        xml.empty("a:ea", &[("typeface", "")])?;
        xml.empty("a:cs", &[("typeface", "")])?;
        xml.end(font)?;
    }
    xml.end("a:fontScheme")?;

    xml.start("a:fmtScheme", &[("name", "Office")])?;
    xml.start("a:fillStyleLst", &[])?;
    for _ in 0..3 {
        write_placeholder_fill(&mut xml)?;
    }
    xml.end("a:fillStyleLst")?;
    xml.start("a:lnStyleLst", &[])?;
    for width in ["9525", "25400", "38100"] {
        xml.start("a:ln", &[("w", width)])?;
        write_placeholder_fill(&mut xml)?;
        xml.end("a:ln")?;
    }
    xml.end("a:lnStyleLst")?;
    xml.start("a:effectStyleLst", &[])?;
    for _ in 0..3 {
        xml.start("a:effectStyle", &[])?;
        xml.empty("a:effectLst", &[])?;
        xml.end("a:effectStyle")?;
    }
    xml.end("a:effectStyleLst")?;
    xml.start("a:bgFillStyleLst", &[])?;
    for _ in 0..3 {
        write_placeholder_fill(&mut xml)?;
    }
    xml.end("a:bgFillStyleLst")?;
    xml.end("a:fmtScheme")?;

    xml.end("a:themeElements")?;
    xml.end("a:theme")?;
    Ok(xml)
}

fn write_placeholder_fill(xml: &mut XmlPart) -> Result<()> {
    xml.start("a:solidFill", &[])?;
    xml.empty("a:schemeClr", &[("val", "phClr")])?;
    xml.end("a:solidFill")
}

fn slide_part(page: &Page, options: &RenderOptions) -> Result<XmlPart> {
    let layout = slide_layout(page);
    let mut xml = XmlPart::new()?;
    xml.start("p:sld", &namespaces())?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;
    write_group_header(&mut xml)?;

    let mut shape_id = 2u32;
    let width = SLIDE_WIDTH - 2 * MARGIN;

    let title = Paragraph::with_text(options.heading_for(page.number));
    let title_box = TextBox {
        id: shape_id,
        name: "Title",
        top: MARGIN,
        height: TITLE_HEIGHT,
        width,
        size: TITLE_FONT,
        bold: true,
    };
    write_text_box(&mut xml, &title_box, &title)?;

    for (paragraph, &top) in page.paragraphs.iter().zip(&layout.paragraph_tops) {
        shape_id += 1;
        let text_box = TextBox {
            id: shape_id,
            name: "Text",
            top,
            height: PARAGRAPH_STEP,
            width,
            size: BODY_FONT,
            bold: options.preserve_styles && paragraph.style.bold,
        };
        write_text_box(&mut xml, &text_box, paragraph)?;
    }

    for (table, &top) in page.tables.iter().zip(&layout.table_tops) {
        shape_id += 1;
        write_table_frame(&mut xml, shape_id, top, width, table)?;
    }

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml)
}

struct TextBox<'a> {
    id: u32,
    name: &'a str,
    top: i64,
    height: i64,
    width: i64,
    size: &'a str,
    bold: bool,
}

fn write_offset(xml: &mut XmlPart, left: i64, top: i64, width: i64, height: i64) -> Result<()> {
    let (x, y) = (left.to_string(), top.to_string());
    let (cx, cy) = (width.to_string(), height.to_string());
    xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])
}

fn write_text_box(xml: &mut XmlPart, text_box: &TextBox<'_>, paragraph: &Paragraph) -> Result<()> {
    let id = text_box.id.to_string();
    let name = format!("{} {}", text_box.name, text_box.id);

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    xml.start("p:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    write_offset(xml, MARGIN, text_box.top, text_box.width, text_box.height)?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.end("p:spPr")?;

    xml.start("p:txBody", &[])?;
    xml.empty("a:bodyPr", &[("wrap", "square")])?;
    xml.empty("a:lstStyle", &[])?;
    write_text_paragraphs(xml, paragraph.text.trim_end(), text_box.size, text_box.bold)?;
    xml.end("p:txBody")?;
    xml.end("p:sp")
}

fn write_text_paragraphs(xml: &mut XmlPart, text: &str, size: &str, bold: bool) -> Result<()> {
    let mut wrote = false;
    for line in text.lines() {
        wrote = true;
        xml.start("a:p", &[])?;
        xml.start("a:r", &[])?;
        let mut attrs = vec![("lang", "en-US"), ("sz", size)];
        if bold {
            attrs.push(("b", "1"));
        }
        xml.empty("a:rPr", &attrs)?;
        xml.element("a:t", &[], line)?;
        xml.end("a:r")?;
        xml.end("a:p")?;
    }
    if !wrote {
        xml.start("a:p", &[])?;
        xml.empty("a:endParaRPr", &[("lang", "en-US"), ("sz", size)])?;
        xml.end("a:p")?;
    }
    Ok(())
}

fn write_table_frame(
    xml: &mut XmlPart,
    id: u32,
    top: i64,
    width: i64,
    table: &Table,
) -> Result<()> {
    let columns = table.column_count().max(1);
    let col_width = width / columns as i64;
    let id_str = id.to_string();
    let name = format!("Table {}", id);

    xml.start("p:graphicFrame", &[])?;
    xml.start("p:nvGraphicFramePr", &[])?;
    xml.empty("p:cNvPr", &[("id", id_str.as_str()), ("name", name.as_str())])?;
    xml.start("p:cNvGraphicFramePr", &[])?;
    xml.empty("a:graphicFrameLocks", &[("noGrp", "1")])?;
    xml.end("p:cNvGraphicFramePr")?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGraphicFramePr")?;

    xml.start("p:xfrm", &[])?;
    write_offset(
        xml,
        MARGIN,
        top,
        col_width * columns as i64,
        table.row_count() as i64 * TABLE_ROW_HEIGHT,
    )?;
    xml.end("p:xfrm")?;

    xml.start("a:graphic", &[])?;
    xml.start("a:graphicData", &[("uri", URI_TABLE)])?;
    xml.start("a:tbl", &[])?;
    xml.empty("a:tblPr", &[("firstRow", "1"), ("bandRow", "1")])?;
    xml.start("a:tblGrid", &[])?;
    let col_width = col_width.to_string();
    for _ in 0..columns {
        xml.empty("a:gridCol", &[("w", col_width.as_str())])?;
    }
    xml.end("a:tblGrid")?;

    let row_height = TABLE_ROW_HEIGHT.to_string();
    for row in &table.rows {
        xml.start("a:tr", &[("h", row_height.as_str())])?;
        for col in 0..columns {
            let text = row.cells.get(col).map_or("", |c| c.text.as_str());
            xml.start("a:tc", &[])?;
            xml.start("a:txBody", &[])?;
            xml.empty("a:bodyPr", &[])?;
            xml.empty("a:lstStyle", &[])?;
            write_text_paragraphs(xml, text, TABLE_FONT, row.is_header)?;
            xml.end("a:txBody")?;
            xml.empty("a:tcPr", &[])?;
            xml.end("a:tc")?;
        }
        xml.end("a:tr")?;
    }

    xml.end("a:tbl")?;
    xml.end("a:graphicData")?;
    xml.end("a:graphic")?;
    xml.end("p:graphicFrame")
}
