// src/backend/services/report_service.rs
// Report document CRUD over the stable report/slide maps.

use crate::{
    error::{ReportError, ReportResult},
    metrics,
    models::{
        common::{AccountId, PrincipalId, ReportId, ReportStatus, SlideId},
        report::{DateRange, Report, ReportPatch, ReportSummary},
        slide::{Slide, SlideInput},
    },
    storage::{self, ReportBatch},
    utils::{crypto::new_id, guards::check_owner, time::now_ns},
};
use candid::CandidType;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Initial data for a new report. Shaped by the report builder wizard.
#[derive(Clone, Debug, CandidType, Deserialize)]
pub struct CreateReportData {
    pub account_id: AccountId,
    pub client_id: Option<String>,
    pub title: String,
    pub campaign_ids: Vec<String>,
    pub date_range: Option<DateRange>,
}

/// A report document together with its slides in render order.
#[derive(Clone, Debug, CandidType, Deserialize)]
pub struct ReportWithSlides {
    pub report: Report,
    pub slides: Vec<Slide>,
}

/// Status / account filters for the owner's report list.
#[derive(Clone, Debug, CandidType, Deserialize, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub account_id: Option<AccountId>,
}

fn load_report(report_id: &str) -> ReportResult<Report> {
    storage::reports::get_report(report_id)
        .ok_or_else(|| ReportError::NotFound(report_id.to_string()))
}

/// Creates a new draft report with an empty content tree and no slides.
/// Titles are not unique; creating two reports with the same title is fine.
pub fn create_report(caller: PrincipalId, data: CreateReportData) -> ReportResult<ReportId> {
    let report_id = new_id();
    let current_time = now_ns();

    let report = Report {
        id: report_id.clone(),
        owner: caller,
        account_id: data.account_id,
        client_id: data.client_id,
        campaign_ids: data.campaign_ids,
        title: data.title,
        date_range: data.date_range,
        status: ReportStatus::Draft,
        created_at: current_time,
        updated_at: current_time,
        version: 1,
        ..Report::default()
    };

    if storage::reports::insert_report(&report).is_some() {
        // A random id collided with an existing document; treat as a storage
        // level failure rather than silently overwriting.
        return Err(ReportError::Persistence(format!(
            "Report id collision for {}",
            report_id
        )));
    }

    metrics::record_report_created();
    Ok(report_id)
}

/// Reads a report and all its slides ordered by `order` ascending. Performs
/// no status or ownership filtering; callers decide authorization.
pub fn get_report_with_slides(report_id: &str) -> ReportResult<ReportWithSlides> {
    let report = load_report(report_id)?;
    let slides = storage::slides::get_slides_for_report(report_id);
    Ok(ReportWithSlides { report, slides })
}

/// Public-read variant: identical to `get_report_with_slides` but reports
/// that are not `Published` are indistinguishable from missing ones. Password
/// gating is a separate, additional check (see publication_service).
pub fn get_public_report(report_id: &str) -> ReportResult<ReportWithSlides> {
    let result = get_report_with_slides(report_id)?;
    if result.report.status != ReportStatus::Published {
        return Err(ReportError::NotFound(report_id.to_string()));
    }
    Ok(result)
}

/// Applies a partial field update to the report document. Bumps the version
/// by exactly 1 and stamps `updated_at`. The slide collection is untouched.
pub fn update_report(report_id: &str, patch: ReportPatch) -> ReportResult<u64> {
    let mut report = load_report(report_id)?;
    patch.apply_to(&mut report);
    report.version += 1;
    report.updated_at = now_ns();
    let new_version = report.version;
    storage::reports::insert_report(&report);
    metrics::record_save_committed();
    Ok(new_version)
}

/// Full-document save: replaces the report's slide set with exactly the given
/// list, as one atomic batch.
///
/// This is the diff-destructive contract of the editor's save path: any
/// persisted slide whose id is absent from `slide_inputs` is deleted, and
/// every provided slide is upserted with `order` set to its array index. Use
/// `upsert_slide`/`delete_slide` for partial updates.
pub fn replace_all_slides(
    report_id: &str,
    patch: ReportPatch,
    slide_inputs: Vec<SlideInput>,
) -> ReportResult<Vec<SlideId>> {
    save_full(report_id, patch, slide_inputs, false)?;
    let report = load_report(report_id)?;
    Ok(report.slide_ids)
}

/// Background-save entry point: same writes as a manual save, plus the
/// `last_auto_saved_at` stamp. Callers are expected to log-and-continue on
/// failure instead of surfacing an exception to the editor session.
pub fn autosave_report(
    report_id: &str,
    patch: ReportPatch,
    slide_inputs: Option<Vec<SlideInput>>,
) -> ReportResult<()> {
    match slide_inputs {
        Some(inputs) => save_full(report_id, patch, inputs, true),
        None => {
            let mut report = load_report(report_id)?;
            patch.apply_to(&mut report);
            report.version += 1;
            let current_time = now_ns();
            report.updated_at = current_time;
            report.last_auto_saved_at = Some(current_time);
            storage::reports::insert_report(&report);
            metrics::record_save_committed();
            Ok(())
        }
    }
}

// Shared full-save path. All validation and staging happens before the batch
// commit; a failure anywhere leaves both maps untouched.
fn save_full(
    report_id: &str,
    patch: ReportPatch,
    slide_inputs: Vec<SlideInput>,
    is_autosave: bool,
) -> ReportResult<()> {
    let mut report = load_report(report_id)?;
    let current_time = now_ns();

    // Reject duplicate explicit slide ids up front; they would produce an
    // undefined render order.
    let explicit: Vec<&SlideId> = slide_inputs.iter().filter_map(|s| s.id.as_ref()).collect();
    let unique: BTreeSet<&SlideId> = explicit.iter().copied().collect();
    if unique.len() != explicit.len() {
        return Err(ReportError::InvalidInput(
            "Duplicate slide ids in save payload".to_string(),
        ));
    }

    let persisted_ids: BTreeSet<SlideId> =
        storage::slides::get_slide_ids_for_report(report_id).into_iter().collect();

    let mut batch = ReportBatch::new();
    let mut new_ids: Vec<SlideId> = Vec::with_capacity(slide_inputs.len());

    for (index, input) in slide_inputs.into_iter().enumerate() {
        let slide_id = input.id.unwrap_or_else(new_id);
        let created_at = storage::slides::get_slide(report_id, &slide_id)
            .map(|existing| existing.created_at)
            .unwrap_or(current_time);

        batch.put_slide(Slide {
            id: slide_id.clone(),
            report_id: report_id.to_string(),
            order: index as u32,
            layout: input.layout,
            body: input.body,
            created_at,
            updated_at: current_time,
        });
        new_ids.push(slide_id);
    }

    let kept: BTreeSet<&SlideId> = new_ids.iter().collect();
    for stale_id in persisted_ids.iter().filter(|id| !kept.contains(id)) {
        batch.delete_slide(report_id, stale_id);
    }

    patch.apply_to(&mut report);
    report.slide_ids = new_ids;
    report.version += 1;
    report.updated_at = current_time;
    if is_autosave {
        report.last_auto_saved_at = Some(current_time);
    }
    batch.put_report(report);

    batch.commit();
    metrics::record_save_committed();
    Ok(())
}

/// Deletes the report and every slide under it as one batch.
pub fn delete_report(report_id: &str) -> ReportResult<()> {
    let report = load_report(report_id)?;

    let mut batch = ReportBatch::new();
    for slide_id in storage::slides::get_slide_ids_for_report(report_id) {
        batch.delete_slide(report_id, &slide_id);
    }
    batch.delete_report(&report.id);
    batch.commit();

    metrics::record_report_deleted();
    Ok(())
}

/// Copies a report and its slides under fresh ids. Owner-only. The copy
/// always starts as an unpublished draft regardless of the original's state.
pub fn duplicate_report(report_id: &str, caller: PrincipalId) -> ReportResult<ReportId> {
    let original = load_report(report_id)?;
    check_owner(&original, caller)?;

    let new_report_id = new_id();
    let current_time = now_ns();
    let mut batch = ReportBatch::new();
    let mut new_slide_ids = Vec::new();

    for slide in storage::slides::get_slides_for_report(report_id) {
        let new_slide_id = new_id();
        batch.put_slide(Slide {
            id: new_slide_id.clone(),
            report_id: new_report_id.clone(),
            created_at: current_time,
            updated_at: current_time,
            ..slide
        });
        new_slide_ids.push(new_slide_id);
    }

    batch.put_report(Report {
        id: new_report_id.clone(),
        owner: original.owner,
        account_id: original.account_id.clone(),
        client_id: original.client_id.clone(),
        campaign_ids: original.campaign_ids.clone(),
        title: format!("{} (Copy)", original.title),
        date_range: original.date_range.clone(),
        content: original.content.clone(),
        design: original.design.clone(),
        status: ReportStatus::Draft,
        slide_ids: new_slide_ids,
        created_at: current_time,
        updated_at: current_time,
        version: 1,
        ..Report::default()
    });
    batch.commit();

    metrics::record_report_duplicated();
    Ok(new_report_id)
}

/// Archives the report. The share url, if any, is deliberately left in place;
/// archived reports are still excluded from public reads.
pub fn archive_report(report_id: &str) -> ReportResult<()> {
    let mut report = load_report(report_id)?;
    report.status = ReportStatus::Archived;
    report.version += 1;
    report.updated_at = now_ns();
    storage::reports::insert_report(&report);
    Ok(())
}

/// Lists the caller's reports as summaries, newest-updated first. Slides are
/// never loaded here, so the list stays one document per report.
pub fn list_reports_by_owner(owner: PrincipalId, filter: ReportFilter) -> Vec<ReportSummary> {
    let mut reports = storage::reports::get_reports_by_owner(owner);
    reports.retain(|report| {
        filter.status.map_or(true, |status| report.status == status)
            && filter
                .account_id
                .as_ref()
                .map_or(true, |account| &report.account_id == account)
    });
    reports.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    reports.iter().map(ReportSummary::from).collect()
}

/// Inserts or updates a single slide without touching its siblings. New
/// slides are appended at the end of the render order.
pub fn upsert_slide(report_id: &str, input: SlideInput) -> ReportResult<SlideId> {
    let mut report = load_report(report_id)?;
    let current_time = now_ns();
    let mut batch = ReportBatch::new();

    let slide_id = match input.id {
        Some(id) => match storage::slides::get_slide(report_id, &id) {
            Some(existing) => {
                batch.put_slide(Slide {
                    layout: input.layout,
                    body: input.body,
                    updated_at: current_time,
                    ..existing
                });
                id
            }
            None => {
                return Err(ReportError::NotFound(format!(
                    "Slide {} in report {}",
                    id, report_id
                )))
            }
        },
        None => {
            let id = new_id();
            batch.put_slide(Slide {
                id: id.clone(),
                report_id: report_id.to_string(),
                order: report.slide_ids.len() as u32,
                layout: input.layout,
                body: input.body,
                created_at: current_time,
                updated_at: current_time,
            });
            report.slide_ids.push(id.clone());
            id
        }
    };

    report.version += 1;
    report.updated_at = current_time;
    batch.put_report(report);
    batch.commit();
    metrics::record_save_committed();
    Ok(slide_id)
}

/// Deletes a single slide and closes the gap in the render order.
pub fn delete_slide(report_id: &str, slide_id: &str) -> ReportResult<()> {
    let mut report = load_report(report_id)?;
    if storage::slides::get_slide(report_id, slide_id).is_none() {
        return Err(ReportError::NotFound(format!(
            "Slide {} in report {}",
            slide_id, report_id
        )));
    }
    let current_time = now_ns();

    let mut batch = ReportBatch::new();
    batch.delete_slide(report_id, slide_id);

    // Renumber the survivors so `order` stays contiguous.
    let survivors: Vec<Slide> = storage::slides::get_slides_for_report(report_id)
        .into_iter()
        .filter(|slide| slide.id != slide_id)
        .collect();
    for (index, mut slide) in survivors.into_iter().enumerate() {
        if slide.order != index as u32 {
            slide.order = index as u32;
            slide.updated_at = current_time;
            batch.put_slide(slide);
        }
    }

    report.slide_ids.retain(|id| id != slide_id);
    report.version += 1;
    report.updated_at = current_time;
    batch.put_report(report);
    batch.commit();
    metrics::record_save_committed();
    Ok(())
}
