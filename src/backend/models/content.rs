// src/backend/models/content.rs
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// Structured rich-document tree produced by the report editor. Opaque to the
/// persistence layer beyond being serializable; the node kinds mirror what the
/// editor emits.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentTree {
    pub nodes: Vec<ContentNode>,
}

impl ContentTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum ContentNode {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    List { ordered: bool, items: Vec<String> },
    Table { rows: Vec<Vec<String>> },
}

/// Design/theme descriptor applied to the rendered report.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DesignTheme {
    pub palette: ColorPalette,
    pub typography: Typography,
    pub layout: LayoutStyle,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: String::from("#1a73e8"),
            secondary: String::from("#34a853"),
            background: String::from("#ffffff"),
            text: String::from("#202124"),
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub base_size_px: u8,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading_font: String::from("Inter"),
            body_font: String::from("Inter"),
            base_size_px: 14,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy, Default)]
pub enum LayoutStyle {
    #[default]
    Standard,
    Compact,
    Wide,
}
