//! Spreadsheet (XLSX) rendering.
//!
//! Pages are laid out as a cell grid first ([`layout_sheets`]) and then
//! written as SpreadsheetML worksheets with inline strings.

use crate::error::Result;
use crate::model::{Document, Page};

use super::ooxml::{
    content_types, core_properties, relationships, root_relationships, Package, XmlPart,
    NS_OFFICE_RELATIONSHIPS,
};
use super::{selected_pages, RenderOptions, SheetMode};

const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME: usize = 31;

/// One populated row of a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row index
    pub index: u32,
    pub cells: Vec<String>,
    pub bold: bool,
}

/// A worksheet laid out as rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            rows: Vec::new(),
        }
    }

    /// Index of the row after the last populated one.
    fn next_row(&self) -> u32 {
        self.rows.last().map_or(1, |r| r.index + 1)
    }

    fn push(&mut self, index: u32, cells: Vec<String>, bold: bool) {
        self.rows.push(SheetRow { index, cells, bold });
    }

    /// Lay out one page: paragraphs one per row in column A, then each table
    /// as a contiguous row range separated from earlier content by one blank
    /// row.
    fn append_page(&mut self, page: &Page) {
        for paragraph in &page.paragraphs {
            let row = self.next_row();
            self.push(row, vec![paragraph.text.trim_end().to_string()], false);
        }

        for table in &page.tables {
            let mut row = if self.rows.is_empty() {
                1
            } else {
                self.next_row() + 1
            };
            for table_row in &table.rows {
                let cells = table_row.cells.iter().map(|c| c.text.clone()).collect();
                self.push(row, cells, table_row.is_header);
                row += 1;
            }
        }
    }
}

/// Compute the worksheet layout for a document.
pub fn layout_sheets(doc: &Document, options: &RenderOptions) -> Vec<Sheet> {
    let pages = selected_pages(doc, options);
    let mut sheets = Vec::new();

    match options.sheet_mode {
        SheetMode::PerPage => {
            for page in pages {
                let mut sheet = Sheet::new(options.heading_for(page.number));
                sheet.append_page(page);
                sheets.push(sheet);
            }
        }
        SheetMode::Single => {
            let mut sheet = Sheet::new("Document".to_string());
            for page in pages {
                let row = if sheet.rows.is_empty() {
                    1
                } else {
                    sheet.next_row() + 1
                };
                sheet.push(row, vec![options.heading_for(page.number)], true);
                sheet.append_page(page);
            }
            sheets.push(sheet);
        }
    }

    // A workbook needs at least one sheet.
    if sheets.is_empty() {
        sheets.push(Sheet::new("Document".to_string()));
    }

    dedupe_names(&mut sheets);
    sheets
}

fn dedupe_names(sheets: &mut [Sheet]) {
    let mut seen: Vec<String> = Vec::new();
    for sheet in sheets.iter_mut() {
        let base = sanitize_sheet_name(&sheet.name);
        let mut name = base.clone();
        let mut n = 2;
        while seen.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
            name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        seen.push(name.clone());
        sheet.name = name;
    }
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '?' | '*' | '[' | ']' | ':' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Column letters for a 0-based column index (0 -> A, 26 -> AA).
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Convert a document to an XLSX package.
pub fn to_xlsx(doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    let sheets = layout_sheets(doc, options);
    let mut package = Package::new();

    let mut overrides = vec![
        ("/xl/workbook.xml".to_string(), CT_WORKBOOK),
        ("/xl/styles.xml".to_string(), CT_STYLES),
    ];
    for idx in 1..=sheets.len() {
        overrides.push((format!("/xl/worksheets/sheet{}.xml", idx), CT_WORKSHEET));
    }
    package.add_part("[Content_Types].xml", content_types(&overrides)?)?;
    package.add_part("_rels/.rels", root_relationships("xl/workbook.xml")?)?;

    let mut rels: Vec<(String, &str, String)> = (1..=sheets.len())
        .map(|idx| {
            (
                format!("rId{}", idx),
                REL_WORKSHEET,
                format!("worksheets/sheet{}.xml", idx),
            )
        })
        .collect();
    rels.push((
        format!("rId{}", sheets.len() + 1),
        REL_STYLES,
        "styles.xml".to_string(),
    ));
    package.add_part("xl/_rels/workbook.xml.rels", relationships(&rels)?)?;
    package.add_part("xl/workbook.xml", workbook_part(&sheets)?)?;
    package.add_part("xl/styles.xml", styles_part()?)?;

    for (idx, sheet) in sheets.iter().enumerate() {
        package.add_part(
            &format!("xl/worksheets/sheet{}.xml", idx + 1),
            worksheet_part(sheet)?,
        )?;
    }
    package.add_part("docProps/core.xml", core_properties(&doc.metadata)?)?;

    package.finish()
}

fn workbook_part(sheets: &[Sheet]) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "workbook",
        &[("xmlns", NS_SPREADSHEET), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;
    xml.start("sheets", &[])?;
    for (idx, sheet) in sheets.iter().enumerate() {
        let id = (idx + 1).to_string();
        let rel = format!("rId{}", idx + 1);
        xml.empty(
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", id.as_str()),
                ("r:id", rel.as_str()),
            ],
        )?;
    }
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml)
}

fn worksheet_part(sheet: &Sheet) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("worksheet", &[("xmlns", NS_SPREADSHEET)])?;
    xml.start("sheetData", &[])?;

    for row in &sheet.rows {
        let row_ref = row.index.to_string();
        xml.start("row", &[("r", row_ref.as_str())])?;
        for (col, text) in row.cells.iter().enumerate() {
            let cell_ref = format!("{}{}", column_name(col), row.index);
            let mut attrs = vec![("r", cell_ref.as_str()), ("t", "inlineStr")];
            if row.bold {
                attrs.push(("s", "1"));
            }
            xml.start("c", &attrs)?;
            xml.start("is", &[])?;
            xml.element("t", &[("xml:space", "preserve")], text)?;
            xml.end("is")?;
            xml.end("c")?;
        }
        xml.end("row")?;
    }

    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml)
}

fn styles_part() -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("styleSheet", &[("xmlns", NS_SPREADSHEET)])?;

    xml.start("fonts", &[("count", "2")])?;
    for bold in [false, true] {
        xml.start("font", &[])?;
        if bold {
            xml.empty("b", &[])?;
        }
        xml.empty("sz", &[("val", "11")])?;
        xml.empty("name", &[("val", "Calibri")])?;
        xml.end("font")?;
    }
    xml.end("fonts")?;

    xml.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        xml.start("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.end("fill")?;
    }
    xml.end("fills")?;

    xml.start("borders", &[("count", "1")])?;
    xml.empty("border", &[])?;
    xml.end("borders")?;

    xml.start("cellStyleXfs", &[("count", "1")])?;
    xml.empty(
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
    )?;
    xml.end("cellStyleXfs")?;

    xml.start("cellXfs", &[("count", "2")])?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
        ],
    )?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "1"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFont", "1"),
        ],
    )?;
    xml.end("cellXfs")?;

    xml.end("styleSheet")?;
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table, TableRow};
    use std::io::{Cursor, Read};

    fn page_with_table(number: u32) -> Page {
        let mut page = Page::letter(number);
        page.add_paragraph(Paragraph::with_text("Intro"));
        page.add_paragraph(Paragraph::with_text("Details"));
        let mut table = Table::new();
        table.add_row(TableRow::header(vec![
            crate::model::TableCell::text("Name"),
            crate::model::TableCell::text("Age"),
        ]));
        table.add_row(TableRow::from_strings(["Bob", "30"]));
        page.add_table(table);
        page
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_per_page_layout() {
        let mut doc = Document::new();
        doc.add_page(page_with_table(1));
        doc.add_page(Page::letter(2));

        let sheets = layout_sheets(&doc, &RenderOptions::default());
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Page 1");

        let indices: Vec<u32> = sheets[0].rows.iter().map(|r| r.index).collect();
        // Two paragraphs, one blank row, then the table.
        assert_eq!(indices, vec![1, 2, 4, 5]);
        assert!(sheets[0].rows[2].bold);
        assert!(!sheets[0].rows[3].bold);
        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_table_only_page_starts_at_top() {
        let mut page = page_with_table(1);
        page.paragraphs.clear();
        let mut doc = Document::new();
        doc.add_page(page);

        let sheets = layout_sheets(&doc, &RenderOptions::default());
        let indices: Vec<u32> = sheets[0].rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_single_sheet_layout() {
        let mut doc = Document::new();
        doc.add_page(page_with_table(1));
        doc.add_page(page_with_table(2));

        let options = RenderOptions::default().with_sheet_mode(SheetMode::Single);
        let sheets = layout_sheets(&doc, &options);
        assert_eq!(sheets.len(), 1);

        let rows = &sheets[0].rows;
        assert_eq!(rows[0].cells, vec!["Page 1"]);
        assert!(rows[0].bold);
        let second_header = rows.iter().find(|r| r.cells == vec!["Page 2"]).unwrap();
        // Page 1 ends on row 6; one blank row separates the next page header.
        assert_eq!(second_header.index, 8);
    }

    #[test]
    fn test_empty_document_still_has_a_sheet() {
        let sheets = layout_sheets(&Document::new(), &RenderOptions::default());
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].rows.is_empty());
    }

    #[test]
    fn test_sheet_names_sanitized_and_unique() {
        let options = RenderOptions::default().with_page_heading("Q1/Q2 [draft]");
        let mut doc = Document::new();
        doc.add_page(Page::letter(1));
        doc.add_page(Page::letter(2));

        let sheets = layout_sheets(&doc, &options);
        assert_eq!(sheets[0].name, "Q1_Q2 _draft_");
        assert_eq!(sheets[1].name, "Q1_Q2 _draft_ (2)");
    }

    #[test]
    fn test_to_xlsx_writes_worksheets() {
        let mut doc = Document::new();
        doc.add_page(page_with_table(1));

        let bytes = to_xlsx(&doc, &RenderOptions::default()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();

        assert!(sheet.contains("<c r=\"A4\" t=\"inlineStr\" s=\"1\">"));
        assert!(sheet.contains("<c r=\"B5\" t=\"inlineStr\"><is><t xml:space=\"preserve\">30</t>"));
        assert!(archive.by_name("xl/styles.xml").is_ok());
    }
}
