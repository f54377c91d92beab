// src/backend/storage/mod.rs
// Stable memory management using ic-stable-structures.

pub mod batch;
pub mod memory;
pub mod metrics;
pub mod reports;
pub mod slides;
pub mod storable;

// Re-export key storage structures and functions for easier access
pub use batch::ReportBatch;
pub use memory::Memory;
pub use metrics::{get_metrics, update_metrics};
pub use storable::{Cbor, SlideKey, StorableString};
