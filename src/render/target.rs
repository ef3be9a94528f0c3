//! Target format tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Output formats a [`Document`](crate::model::Document) can be serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Flow document (Word)
    Docx,
    /// Spreadsheet (Excel)
    Xlsx,
    /// Slide deck (PowerPoint)
    Pptx,
    /// Rich Text Format
    Rtf,
    /// Plain text
    Txt,
    /// The structured model as JSON
    Json,
}

impl TargetKind {
    pub const ALL: [TargetKind; 6] = [
        TargetKind::Docx,
        TargetKind::Xlsx,
        TargetKind::Pptx,
        TargetKind::Rtf,
        TargetKind::Txt,
        TargetKind::Json,
    ];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetKind::Docx => "docx",
            TargetKind::Xlsx => "xlsx",
            TargetKind::Pptx => "pptx",
            TargetKind::Rtf => "rtf",
            TargetKind::Txt => "txt",
            TargetKind::Json => "json",
        }
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            TargetKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            TargetKind::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            TargetKind::Rtf => "application/rtf",
            TargetKind::Txt => "text/plain; charset=utf-8",
            TargetKind::Json => "application/json",
        }
    }
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match tag.as_str() {
            "docx" | "word" | "flow" => Ok(TargetKind::Docx),
            "xlsx" | "excel" | "spreadsheet" | "sheet" => Ok(TargetKind::Xlsx),
            "pptx" | "powerpoint" | "slides" | "deck" => Ok(TargetKind::Pptx),
            "rtf" | "richtext" | "rich-text" => Ok(TargetKind::Rtf),
            "txt" | "text" | "plain" | "plaintext" | "plain-text" => Ok(TargetKind::Txt),
            "json" => Ok(TargetKind::Json),
            _ => Err(Error::Serialization(format!("unknown target kind: {}", s))),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
