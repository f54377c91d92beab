// src/backend/storage/metrics.rs
use crate::metrics::ReportMetrics;
use crate::storage::memory::{get_metrics_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableCell;
use std::cell::RefCell;

type StorableMetrics = Cbor<ReportMetrics>;

thread_local! {
    static METRICS: RefCell<StableCell<StorableMetrics, Memory>> = RefCell::new(
        StableCell::init(get_metrics_memory(), Cbor(ReportMetrics::default()))
            .expect("Failed to initialize metrics cell")
    );
}

pub fn get_metrics() -> ReportMetrics {
    METRICS.with(|cell_ref| cell_ref.borrow().get().0.clone())
}

/// Applies a mutation to the stored metrics.
pub fn update_metrics<F>(mutate: F) -> Result<(), String>
where
    F: FnOnce(&mut ReportMetrics),
{
    METRICS.with(|cell_ref| {
        let mut cell = cell_ref.borrow_mut();
        let mut metrics = cell.get().0.clone();
        mutate(&mut metrics);
        cell.set(Cbor(metrics))
            .map(|_| ())
            .map_err(|e| format!("Failed to persist metrics: {:?}", e))
    })
}
