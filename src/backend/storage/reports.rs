// src/backend/storage/reports.rs
use crate::models::common::PrincipalId;
use crate::models::report::Report;
use crate::storage::memory::{get_reports_memory, Memory};
use crate::storage::storable::{Cbor, StorableString};
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorableReport = Cbor<Report>;

thread_local! {
    /// Report documents: Key = report id, Value = Report
    pub static REPORTS: RefCell<StableBTreeMap<StorableString, StorableReport, Memory>> = RefCell::new(
        StableBTreeMap::init(get_reports_memory())
    );
}

/// Inserts or replaces a report document, returning the previous value.
pub fn insert_report(report: &Report) -> Option<Report> {
    let key = Cbor(report.id.clone());
    REPORTS.with(|map_ref| {
        map_ref
            .borrow_mut()
            .insert(key, Cbor(report.clone()))
            .map(|prev| prev.0)
    })
}

/// Retrieves a report document by id.
pub fn get_report(report_id: &str) -> Option<Report> {
    let key = Cbor(report_id.to_string());
    REPORTS.with(|map_ref| map_ref.borrow().get(&key).map(|cbor| cbor.0))
}

/// Removes a report document, returning it if present.
pub fn remove_report(report_id: &str) -> Option<Report> {
    let key = Cbor(report_id.to_string());
    REPORTS.with(|map_ref| map_ref.borrow_mut().remove(&key).map(|cbor| cbor.0))
}

/// Returns all reports owned by `owner`. Full-map scan; the report count per
/// owner is small in practice.
pub fn get_reports_by_owner(owner: PrincipalId) -> Vec<Report> {
    let mut owned = Vec::new();
    REPORTS.with(|map_ref| {
        let map = map_ref.borrow();
        for (_key, value) in map.iter() {
            let report: Report = value.0;
            if report.owner == owner {
                owned.push(report);
            }
        }
    });
    owned
}

pub fn count_reports() -> u64 {
    REPORTS.with(|map_ref| map_ref.borrow().len())
}
