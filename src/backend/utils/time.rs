// src/backend/utils/time.rs
use crate::models::common::TimestampNs;

/// Returns the current Internet Computer time as nanoseconds since epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ns() -> TimestampNs {
    ic_cdk::api::time()
}

/// Native fallback so the service layer can run under `cargo test`.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ns() -> TimestampNs {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
