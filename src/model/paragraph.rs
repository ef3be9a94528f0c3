//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// The paragraph text
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl Paragraph {
    /// Create a paragraph with plain text and default style.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a paragraph with an explicit style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Text styling properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points
    pub font_size: f32,

    /// Font family name
    pub font_family: String,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Text color (hex format without '#', e.g., "000000")
    pub color: String,
}

impl TextStyle {
    pub const DEFAULT_FONT_SIZE: f32 = 11.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Calibri";
    pub const DEFAULT_COLOR: &'static str = "000000";

    /// Check if any emphasis is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic
    }

    /// Color as a validated 6-digit hex string, defaulting to black.
    pub fn hex_color(&self) -> &str {
        let c = self.color.trim_start_matches('#');
        if c.len() == 6 && c.chars().all(|ch| ch.is_ascii_hexdigit()) {
            c
        } else {
            Self::DEFAULT_COLOR
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            bold: false,
            italic: false,
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }
}
