// src/backend/storage/storable.rs
use crate::models::common::{ReportId, SlideId};
use ic_stable_structures::{storable::Bound, Storable};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::borrow::Cow;

/// Wraps any Serialize + DeserializeOwned type to make it Storable using CBOR
/// encoding.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct Cbor<T>(pub T)
where
    T: Serialize + DeserializeOwned;

impl<T> Storable for Cbor<T>
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self) -> Cow<[u8]> {
        let mut writer = vec![];
        ciborium::ser::into_writer(&self.0, &mut writer)
            .expect("Failed to serialize value to CBOR for stable storage");
        Cow::Owned(writer)
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        let value: T = ciborium::de::from_reader(bytes.as_ref())
            .expect("Failed to deserialize value from CBOR from stable storage");
        Cbor(value)
    }

    // Unbounded storage; per-type bounds can be added later if needed.
    const BOUND: Bound = Bound::Unbounded;
}

pub type StorableString = Cbor<String>;

/// Composite key for the slide sub-collection. Ordering is (report_id,
/// slide_id), so all slides of one report form a contiguous range and can be
/// scanned with a range query instead of a full-map filter.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SlideKey {
    pub report_id: ReportId,
    pub slide_id: SlideId,
}

impl SlideKey {
    pub fn new(report_id: &str, slide_id: &str) -> Self {
        Self {
            report_id: report_id.to_string(),
            slide_id: slide_id.to_string(),
        }
    }

    /// Smallest possible key for a report; range start for prefix scans.
    pub fn prefix_start(report_id: &str) -> Self {
        Self::new(report_id, "")
    }
}

impl Storable for SlideKey {
    fn to_bytes(&self) -> Cow<[u8]> {
        let mut writer = vec![];
        ciborium::ser::into_writer(&(&self.report_id, &self.slide_id), &mut writer)
            .expect("Failed to serialize slide key to CBOR for stable storage");
        Cow::Owned(writer)
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        let (report_id, slide_id): (String, String) = ciborium::de::from_reader(bytes.as_ref())
            .expect("Failed to deserialize slide key from CBOR from stable storage");
        Self {
            report_id,
            slide_id,
        }
    }

    const BOUND: Bound = Bound::Unbounded;
}
