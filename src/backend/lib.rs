// src/backend/lib.rs

pub mod api;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use std::time::Duration;

// export_candid! expands here and names the endpoint signature types
// unqualified, so they all have to be in scope in this module.
use api::*;
use error::ReportResult;
use metrics::ReportMetrics;
use models::common::{EditorKind, ReportId, SessionId, SlideId};
use models::report::ReportSummary;
use services::autosave::EditorStatus;
use services::report_service::{ReportFilter, ReportWithSlides};

// Inter-canister calls are not allowed during init, so RNG seeding runs from
// an immediate one-shot timer instead.
fn schedule_rng_seeding() {
    ic_cdk_timers::set_timer(Duration::ZERO, || {
        ic_cdk::spawn(async {
            match ic_cdk::api::management_canister::main::raw_rand().await {
                Ok((bytes,)) if bytes.len() >= 32 => {
                    let mut seed = [0u8; 32];
                    seed.copy_from_slice(&bytes[..32]);
                    utils::rng::seed_rng(seed);
                    ic_cdk::println!("Id RNG seeded from raw_rand.");
                }
                Ok(_) => {
                    ic_cdk::println!("raw_rand returned insufficient bytes for RNG seed");
                }
                Err(e) => {
                    ic_cdk::println!("Failed to fetch raw_rand for RNG seed: {:?}", e);
                }
            }
        });
    });
}

#[ic_cdk::init]
fn init() {
    ic_cdk::println!("Flipika report backend canister initialized.");
    schedule_rng_seeding();
}

#[ic_cdk::post_upgrade]
fn post_upgrade() {
    let upgrade_count = storage::memory::UPGRADES.with(|cell| {
        let mut cell = cell.borrow_mut();
        let next = cell.get() + 1;
        let _ = cell.set(next);
        next
    });
    ic_cdk::println!("Flipika report backend canister upgraded (count: {}).", upgrade_count);
    schedule_rng_seeding();
}

// Export Candid interface
ic_cdk::export_candid!();
