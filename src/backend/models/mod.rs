// src/backend/models/mod.rs
pub mod common;
pub mod content;
pub mod report;
pub mod slide;

pub use common::*;
pub use content::{ColorPalette, ContentNode, ContentTree, DesignTheme, LayoutStyle, Typography};
pub use report::{DateRange, Report, ReportPatch, ReportSummary};
pub use slide::{Slide, SlideInput, SlideLayout};
