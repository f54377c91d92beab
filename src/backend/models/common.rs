// src/backend/models/common.rs
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

// Opaque string ids, generated as random 128-bit hex (see utils::crypto).
pub type ReportId = String;   // Unique identifier for a report document
pub type SlideId = String;    // Unique identifier for a slide within a report
pub type AccountId = String;  // Linked ads account
pub type ClientId = String;   // Optional linked client
pub type CampaignId = String; // Selected campaign
pub type SessionId = String;  // Opaque browser-session identifier (client supplied)

pub type PrincipalId = Principal; // Authenticated caller identity

pub type TimestampNs = u64; // Nanoseconds since epoch

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum ReportStatus {
    Draft,     // Initial state, owner-only
    Published, // Publicly reachable via share_url (password gate may apply)
    Archived,  // Hidden from public reads; terminal in the normal flow
}

/// Which editor surface is driving the auto-save loop. The two surfaces use
/// different debounce windows.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Copy)]
pub enum EditorKind {
    Report,
    Template,
}
