//! Rich Text Format rendering.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::model::{Document, Paragraph, Table, TextStyle};

use super::{selected_pages, RenderOptions};

/// Table width in twips (6.5 inches).
const TABLE_WIDTH_TWIPS: u32 = 9360;

/// Convert a document to RTF.
pub fn to_rtf(doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut out = String::new();
    write_document(&mut out, doc, options)
        .map_err(|e| Error::Serialization(format!("RTF: {}", e)))?;
    Ok(out.into_bytes())
}

fn write_document(out: &mut String, doc: &Document, options: &RenderOptions) -> std::fmt::Result {
    out.push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1\n");
    write!(out, "{{\\fonttbl{{\\f0\\fswiss {};}}", TextStyle::DEFAULT_FONT_FAMILY)?;
    let fonts = if options.preserve_styles {
        font_table(doc)
    } else {
        Vec::new()
    };
    for (idx, family) in fonts.iter().enumerate() {
        write!(out, "{{\\f{}\\fnil {};}}", idx + 1, escape(family))?;
    }
    out.push_str("}\n");
    out.push_str("{\\colortbl ;\\red0\\green0\\blue0;}\n");

    if let Some(title) = doc.metadata.title.as_deref() {
        write!(out, "{{\\info{{\\title {}}}", escape(title))?;
        if let Some(author) = doc.metadata.author.as_deref() {
            write!(out, "{{\\author {}}}", escape(author))?;
        }
        out.push_str("}\n");
    }

    let default_half_points = (TextStyle::DEFAULT_FONT_SIZE * 2.0).round() as u32;
    writeln!(out, "\\f0\\fs{}", default_half_points)?;

    for (idx, page) in selected_pages(doc, options).into_iter().enumerate() {
        if idx > 0 {
            out.push_str("\\page\n");
        }
        writeln!(
            out,
            "{{\\pard\\sb240\\sa120\\b\\fs32 {}\\b0\\par}}",
            escape(&options.heading_for(page.number))
        )?;

        for paragraph in &page.paragraphs {
            write_paragraph(out, paragraph, options, &fonts)?;
        }
        for table in &page.tables {
            write_table(out, table)?;
        }
    }

    out.push('}');
    Ok(())
}

fn font_table(doc: &Document) -> Vec<String> {
    let mut fonts: Vec<String> = Vec::new();
    for paragraph in doc.pages.iter().flat_map(|p| &p.paragraphs) {
        let family = &paragraph.style.font_family;
        if family != TextStyle::DEFAULT_FONT_FAMILY && !fonts.contains(family) {
            fonts.push(family.clone());
        }
    }
    fonts
}

fn write_paragraph(
    out: &mut String,
    paragraph: &Paragraph,
    options: &RenderOptions,
    fonts: &[String],
) -> std::fmt::Result {
    out.push_str("{\\pard\\sa120 ");
    if options.preserve_styles {
        let style = &paragraph.style;
        if let Some(pos) = fonts.iter().position(|f| *f == style.font_family) {
            write!(out, "\\f{}", pos + 1)?;
        }
        write!(out, "\\fs{}", (style.font_size * 2.0).round().max(2.0) as u32)?;
        if style.bold {
            out.push_str("\\b");
        }
        if style.italic {
            out.push_str("\\i");
        }
        out.push(' ');
    }
    out.push_str(&escape(paragraph.text.trim_end()));
    out.push_str("\\par}\n");
    Ok(())
}

fn write_table(out: &mut String, table: &Table) -> std::fmt::Result {
    let columns = table.column_count().max(1) as u32;
    let cell_width = TABLE_WIDTH_TWIPS / columns;

    for row in &table.rows {
        out.push_str("\\trowd\\trgaph108");
        for col in 1..=columns {
            write!(
                out,
                "\\clbrdrt\\brdrs\\clbrdrl\\brdrs\\clbrdrb\\brdrs\\clbrdrr\\brdrs\\cellx{}",
                col * cell_width
            )?;
        }
        out.push('\n');
        for col in 0..columns as usize {
            let text = row.cells.get(col).map_or("", |c| c.text.as_str());
            if row.is_header {
                write!(out, "\\pard\\intbl{{\\b {}}}\\cell ", escape(text))?;
            } else {
                write!(out, "\\pard\\intbl {}\\cell ", escape(text))?;
            }
        }
        out.push_str("\\row\n");
    }
    out.push_str("\\pard\\par\n");
    Ok(())
}

/// Escape text for an RTF stream.
///
/// Backslashes, braces and newlines are escaped first; tabs become `\tab`
/// and non-ASCII characters are written as `\uN?` (UTF-16 units, signed).
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\line ");
            }
            '\n' => out.push_str("\\line "),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii_control() => {}
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // RTF reads the \u argument as a signed 16-bit integer.
                    let _ = write!(out, "\\u{}?", *unit as i16);
                }
            }
        }
    }

    out
}
