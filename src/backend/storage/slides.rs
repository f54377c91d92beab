// src/backend/storage/slides.rs
use crate::models::common::SlideId;
use crate::models::slide::Slide;
use crate::storage::memory::{get_slides_memory, Memory};
use crate::storage::storable::{Cbor, SlideKey};
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;
use std::ops::Bound;

type StorableSlide = Cbor<Slide>;

thread_local! {
    /// Slide sub-collection: Key = (report_id, slide_id), Value = Slide.
    /// The composite key keeps each report's slides in one contiguous range.
    pub static SLIDES: RefCell<StableBTreeMap<SlideKey, StorableSlide, Memory>> = RefCell::new(
        StableBTreeMap::init(get_slides_memory())
    );
}

/// Inserts or replaces a slide document, returning the previous value.
pub fn insert_slide(slide: &Slide) -> Option<Slide> {
    let key = SlideKey::new(&slide.report_id, &slide.id);
    SLIDES.with(|map_ref| {
        map_ref
            .borrow_mut()
            .insert(key, Cbor(slide.clone()))
            .map(|prev| prev.0)
    })
}

pub fn get_slide(report_id: &str, slide_id: &str) -> Option<Slide> {
    let key = SlideKey::new(report_id, slide_id);
    SLIDES.with(|map_ref| map_ref.borrow().get(&key).map(|cbor| cbor.0))
}

/// Removes a slide document, returning it if present.
pub fn remove_slide(report_id: &str, slide_id: &str) -> Option<Slide> {
    let key = SlideKey::new(report_id, slide_id);
    SLIDES.with(|map_ref| map_ref.borrow_mut().remove(&key).map(|cbor| cbor.0))
}

/// Returns all slides of a report ordered by `order` ascending. Range scan
/// over the report's key prefix.
pub fn get_slides_for_report(report_id: &str) -> Vec<Slide> {
    let mut slides: Vec<Slide> = SLIDES.with(|map_ref| {
        let map = map_ref.borrow();
        map.range((Bound::Included(SlideKey::prefix_start(report_id)), Bound::Unbounded))
            .take_while(|(key, _)| key.report_id == report_id)
            .map(|(_, value)| value.0)
            .collect()
    });
    slides.sort_by_key(|slide| slide.order);
    slides
}

/// Ids of the slides currently persisted for a report (unsorted).
pub fn get_slide_ids_for_report(report_id: &str) -> Vec<SlideId> {
    SLIDES.with(|map_ref| {
        let map = map_ref.borrow();
        map.range((Bound::Included(SlideKey::prefix_start(report_id)), Bound::Unbounded))
            .take_while(|(key, _)| key.report_id == report_id)
            .map(|(key, _)| key.slide_id)
            .collect()
    })
}
