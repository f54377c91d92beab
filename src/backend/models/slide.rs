// src/backend/models/slide.rs
use crate::models::common::{ReportId, SlideId, TimestampNs};
use candid::CandidType;
use serde::{Deserialize, Serialize};

/// One ordered unit of visual content belonging to exactly one report.
/// Slides never outlive their report in the persisted store; deleting the
/// report cascades to its slides.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Slide {
    pub id: SlideId,
    pub report_id: ReportId,
    /// Zero-based render position. Rewritten to the array index on every full
    /// save, so it stays contiguous and unique within the report.
    pub order: u32,
    pub layout: SlideLayout,
    /// Layout-specific configuration as a JSON document. Opaque here; the API
    /// layer checks it parses before it is accepted.
    pub body: String,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy, Default)]
pub enum SlideLayout {
    Title,
    #[default]
    Chart,
    Table,
    Text,
}

/// Caller-facing slide payload for saves. `id: None` means "mint a fresh id".
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SlideInput {
    pub id: Option<SlideId>,
    pub layout: SlideLayout,
    pub body: String,
}
