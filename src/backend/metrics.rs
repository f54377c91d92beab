// src/backend/metrics.rs
use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::storage::update_metrics;

/// Operational counters for the report backend, kept in a stable cell.
#[derive(CandidType, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportMetrics {
    pub reports_created_total: u64,
    pub reports_published_total: u64,
    pub reports_duplicated_total: u64,
    pub reports_deleted_total: u64,
    pub saves_committed_total: u64,
    pub autosave_failures_total: u64,
    pub password_unlocks_total: u64,
}

pub fn record_report_created() {
    bump(|m| m.reports_created_total = m.reports_created_total.saturating_add(1));
}

pub fn record_report_published() {
    bump(|m| m.reports_published_total = m.reports_published_total.saturating_add(1));
}

pub fn record_report_duplicated() {
    bump(|m| m.reports_duplicated_total = m.reports_duplicated_total.saturating_add(1));
}

pub fn record_report_deleted() {
    bump(|m| m.reports_deleted_total = m.reports_deleted_total.saturating_add(1));
}

pub fn record_save_committed() {
    bump(|m| m.saves_committed_total = m.saves_committed_total.saturating_add(1));
}

pub fn record_autosave_failure() {
    bump(|m| m.autosave_failures_total = m.autosave_failures_total.saturating_add(1));
}

pub fn record_password_unlock() {
    bump(|m| m.password_unlocks_total = m.password_unlocks_total.saturating_add(1));
}

// Metrics are best-effort; a failed write is logged and otherwise ignored.
fn bump<F: FnOnce(&mut ReportMetrics)>(mutate: F) {
    if let Err(e) = update_metrics(mutate) {
        ic_cdk::println!("Failed to update metrics: {}", e);
    }
}
