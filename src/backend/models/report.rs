// src/backend/models/report.rs
use crate::models::common::{
    AccountId, CampaignId, ClientId, PrincipalId, ReportId, ReportStatus, SlideId, TimestampNs,
};
use crate::models::content::{ContentTree, DesignTheme};
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

/// The main report document.
///
/// Invariants maintained by the service layer:
/// - `is_password_protected == password_hash.is_some()`
/// - `share_url` is set iff the report has ever been published
/// - `version` strictly increases by 1 on every persisted update
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Report {
    pub id: ReportId,
    pub owner: PrincipalId,
    pub account_id: AccountId,
    pub client_id: Option<ClientId>,
    pub campaign_ids: Vec<CampaignId>,
    pub title: String,
    pub date_range: Option<DateRange>,
    pub content: ContentTree,
    pub design: DesignTheme,
    pub status: ReportStatus,
    pub share_url: Option<String>,
    pub password_hash: Option<String>,
    pub is_password_protected: bool,
    pub published_at: Option<TimestampNs>,
    /// Ids of the report's slides in render order.
    pub slide_ids: Vec<SlideId>,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
    pub version: u64,
    pub last_auto_saved_at: Option<TimestampNs>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            id: String::new(),
            owner: Principal::anonymous(),
            account_id: String::new(),
            client_id: None,
            campaign_ids: Vec::new(),
            title: String::new(),
            date_range: None,
            content: ContentTree::default(),
            design: DesignTheme::default(),
            status: ReportStatus::Draft,
            share_url: None,
            password_hash: None,
            is_password_protected: false,
            published_at: None,
            slide_ids: Vec::new(),
            created_at: 0,
            updated_at: 0,
            version: 0,
            last_auto_saved_at: None,
        }
    }
}

/// Reporting period selected for the report's data.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DateRange {
    /// ISO-8601 date, e.g. "2026-08-01".
    pub start_date: String,
    pub end_date: String,
}

/// List-view projection. Never carries content or slides so the list stays
/// one document per report.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct ReportSummary {
    pub id: ReportId,
    pub owner: PrincipalId,
    pub account_id: AccountId,
    pub client_id: Option<ClientId>,
    pub title: String,
    pub status: ReportStatus,
    pub share_url: Option<String>,
    pub is_password_protected: bool,
    pub slide_count: u32,
    pub created_at: TimestampNs,
    pub updated_at: TimestampNs,
    pub version: u64,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            owner: report.owner,
            account_id: report.account_id.clone(),
            client_id: report.client_id.clone(),
            title: report.title.clone(),
            status: report.status,
            share_url: report.share_url.clone(),
            is_password_protected: report.is_password_protected,
            slide_count: report.slide_ids.len() as u32,
            created_at: report.created_at,
            updated_at: report.updated_at,
            version: report.version,
        }
    }
}

/// Partial update applied to a report document. `None` means "leave the field
/// unchanged"; for nullable fields the inner `Option` distinguishes an
/// explicit clear (`Some(None)`) from "leave unchanged" (`None`). The id,
/// status machinery and slide list are deliberately not expressible here.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ReportPatch {
    pub title: Option<String>,
    pub account_id: Option<AccountId>,
    pub client_id: Option<Option<ClientId>>,
    pub campaign_ids: Option<Vec<CampaignId>>,
    pub date_range: Option<Option<DateRange>>,
    pub content: Option<ContentTree>,
    pub design: Option<DesignTheme>,
}

impl ReportPatch {
    /// Applies the patch to a report's editable fields. Bookkeeping fields
    /// (version, updated_at) are the caller's responsibility.
    pub fn apply_to(&self, report: &mut Report) {
        if let Some(title) = &self.title {
            report.title = title.clone();
        }
        if let Some(account_id) = &self.account_id {
            report.account_id = account_id.clone();
        }
        if let Some(client_id) = &self.client_id {
            report.client_id = client_id.clone();
        }
        if let Some(campaign_ids) = &self.campaign_ids {
            report.campaign_ids = campaign_ids.clone();
        }
        if let Some(date_range) = &self.date_range {
            report.date_range = date_range.clone();
        }
        if let Some(content) = &self.content {
            report.content = content.clone();
        }
        if let Some(design) = &self.design {
            report.design = design.clone();
        }
    }

    /// Folds a newer patch into this one, newer fields winning. Used by the
    /// auto-save controller to coalesce edit bursts.
    pub fn merge(&mut self, newer: ReportPatch) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.account_id.is_some() {
            self.account_id = newer.account_id;
        }
        if newer.client_id.is_some() {
            self.client_id = newer.client_id;
        }
        if newer.campaign_ids.is_some() {
            self.campaign_ids = newer.campaign_ids;
        }
        if newer.date_range.is_some() {
            self.date_range = newer.date_range;
        }
        if newer.content.is_some() {
            self.content = newer.content;
        }
        if newer.design.is_some() {
            self.design = newer.design;
        }
    }
}
