// src/backend/services/mod.rs
pub mod access_cache;
pub mod autosave;
pub mod publication_service;
pub mod report_service;
