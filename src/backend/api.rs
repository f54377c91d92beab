// src/backend/api.rs
// Candid API endpoint definitions (query/update functions).

use crate::{
    error::{ReportError, ReportResult},
    metrics::ReportMetrics,
    models::{
        common::{EditorKind, PrincipalId, ReportId, SessionId, SlideId},
        report::{DateRange, Report, ReportPatch, ReportSummary},
        slide::SlideInput,
    },
    services::{
        access_cache, autosave,
        autosave::EditorStatus,
        publication_service,
        report_service::{self, CreateReportData, ReportFilter, ReportWithSlides},
    },
    storage,
    utils::{
        guards::{check_authenticated, check_owner},
        rate_limit::rate_guard,
    },
};
use candid::CandidType;
use ic_cdk_macros::{query, update};
use serde::Deserialize;
use validator::Validate;

// --- Helpers ---

fn caller() -> PrincipalId {
    ic_cdk::caller()
}

fn validate_request<T: Validate>(req: &T) -> Result<(), ReportError> {
    req.validate()
        .map_err(|e| ReportError::InvalidInput(e.to_string()))
}

/// Loads a report and checks the caller owns it. The shared gate for every
/// owner-only endpoint.
fn authorize_owner(report_id: &str, caller: PrincipalId) -> ReportResult<Report> {
    let report = storage::reports::get_report(report_id)
        .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;
    check_owner(&report, caller)?;
    Ok(report)
}

// Slide bodies are opaque layout config, but they must at least be JSON.
fn validate_slide_bodies(slides: &[SlideInput]) -> Result<(), ReportError> {
    for slide in slides {
        serde_json::from_str::<serde_json::Value>(&slide.body).map_err(|e| {
            ReportError::InvalidInput(format!("Slide body is not valid JSON: {}", e))
        })?;
    }
    Ok(())
}

// --- Request structs ---

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    #[validate(length(min = 1, max = 64))]
    pub client_id: Option<String>,
    #[validate(length(max = 200))]
    pub title: String,
    pub campaign_ids: Vec<String>,
    pub date_range: Option<DateRange>,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct SaveReportRequest {
    pub report_id: ReportId,
    pub patch: ReportPatch,
    /// The complete slide set. Anything persisted but absent here is deleted.
    pub slides: Vec<SlideInput>,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct UpdateReportRequest {
    pub report_id: ReportId,
    pub patch: ReportPatch,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct UpsertSlideRequest {
    pub report_id: ReportId,
    pub slide: SlideInput,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct DeleteSlideRequest {
    pub report_id: ReportId,
    pub slide_id: SlideId,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct PublishReportRequest {
    pub report_id: ReportId,
    #[validate(length(min = 1, max = 64))]
    pub owner_username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct UnlockReportRequest {
    #[validate(length(min = 1, max = 128))]
    pub session_id: SessionId,
    pub report_id: ReportId,
    pub password: String,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct RecordEditRequest {
    pub report_id: ReportId,
    pub patch: ReportPatch,
    /// Present iff the slide list changed since the last event.
    pub slides: Option<Vec<SlideInput>>,
}

// --- Report CRUD ---

#[update]
fn create_report(req: CreateReportRequest) -> ReportResult<ReportId> {
    let caller = caller();
    check_authenticated(caller)?;
    rate_guard(caller)?;
    validate_request(&req)?;
    report_service::create_report(
        caller,
        CreateReportData {
            account_id: req.account_id,
            client_id: req.client_id,
            title: req.title,
            campaign_ids: req.campaign_ids,
            date_range: req.date_range,
        },
    )
}

#[query]
fn get_report(report_id: ReportId) -> ReportResult<ReportWithSlides> {
    authorize_owner(&report_id, caller())?;
    report_service::get_report_with_slides(&report_id)
}

#[query]
fn list_my_reports(filter: ReportFilter) -> ReportResult<Vec<ReportSummary>> {
    let caller = caller();
    check_authenticated(caller)?;
    Ok(report_service::list_reports_by_owner(caller, filter))
}

/// Full-document save. Diff-destructive: the provided slide list replaces the
/// persisted one.
#[update]
fn save_report(req: SaveReportRequest) -> ReportResult<Vec<SlideId>> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&req.report_id, caller)?;
    validate_slide_bodies(&req.slides)?;
    report_service::replace_all_slides(&req.report_id, req.patch, req.slides)
}

#[update]
fn update_report(req: UpdateReportRequest) -> ReportResult<u64> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&req.report_id, caller)?;
    report_service::update_report(&req.report_id, req.patch)
}

#[update]
fn upsert_slide(req: UpsertSlideRequest) -> ReportResult<SlideId> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&req.report_id, caller)?;
    validate_slide_bodies(std::slice::from_ref(&req.slide))?;
    report_service::upsert_slide(&req.report_id, req.slide)
}

#[update]
fn delete_slide(req: DeleteSlideRequest) -> ReportResult<()> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&req.report_id, caller)?;
    report_service::delete_slide(&req.report_id, &req.slide_id)
}

#[update]
fn delete_report(report_id: ReportId) -> ReportResult<()> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&report_id, caller)?;
    report_service::delete_report(&report_id)
}

#[update]
fn duplicate_report(report_id: ReportId) -> ReportResult<ReportId> {
    let caller = caller();
    rate_guard(caller)?;
    // Ownership is enforced inside the service for this one.
    report_service::duplicate_report(&report_id, caller)
}

#[update]
fn archive_report(report_id: ReportId) -> ReportResult<()> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&report_id, caller)?;
    report_service::archive_report(&report_id)
}

// --- Publication & public viewing ---

#[update]
fn publish_report(req: PublishReportRequest) -> ReportResult<String> {
    let caller = caller();
    rate_guard(caller)?;
    validate_request(&req)?;
    publication_service::publish_report(&req.report_id, caller, &req.owner_username, req.password)
}

/// Anonymous public read: status gate plus the session password gate.
#[query]
fn get_public_report(session_id: SessionId, report_id: ReportId) -> ReportResult<ReportWithSlides> {
    publication_service::get_public_report(&session_id, &report_id)
}

#[query]
fn verify_report_password(report_id: ReportId, password: String) -> ReportResult<bool> {
    publication_service::verify_password(&report_id, &password)
}

#[update]
fn unlock_public_report(req: UnlockReportRequest) -> ReportResult<bool> {
    validate_request(&req)?;
    publication_service::unlock_public_report(&req.session_id, &req.report_id, &req.password)
}

/// Explicit revocation of the session's "already unlocked" markers. With no
/// report id the whole session is cleared.
#[update]
fn revoke_public_access(session_id: SessionId, report_id: Option<ReportId>) {
    match report_id {
        Some(report_id) => access_cache::clear(&session_id, &report_id),
        None => access_cache::clear_all(&session_id),
    }
}

// --- Editor auto-save ---

#[update]
fn open_editor(report_id: ReportId, kind: EditorKind) -> ReportResult<()> {
    let caller = caller();
    authorize_owner(&report_id, caller)?;
    autosave::open_editor(&report_id, kind);
    Ok(())
}

#[update]
fn record_edit(req: RecordEditRequest) -> ReportResult<()> {
    let caller = caller();
    authorize_owner(&req.report_id, caller)?;
    if let Some(slides) = &req.slides {
        validate_slide_bodies(slides)?;
    }
    autosave::record_edit(&req.report_id, req.patch, req.slides);
    Ok(())
}

/// Manual "Save" button: flushes pending edits immediately.
#[update]
fn flush_editor(report_id: ReportId) -> ReportResult<()> {
    let caller = caller();
    rate_guard(caller)?;
    authorize_owner(&report_id, caller)?;
    autosave::flush_editor(&report_id)
}

#[update]
fn close_editor(report_id: ReportId) -> ReportResult<()> {
    let caller = caller();
    authorize_owner(&report_id, caller)?;
    autosave::close_editor(&report_id);
    Ok(())
}

#[query]
fn editor_status(report_id: ReportId) -> ReportResult<Option<EditorStatus>> {
    authorize_owner(&report_id, caller())?;
    Ok(autosave::editor_status(&report_id))
}

// --- Operational ---

#[query]
fn get_metrics() -> ReportMetrics {
    storage::get_metrics()
}

#[query]
fn report_count() -> u64 {
    storage::reports::count_reports()
}
