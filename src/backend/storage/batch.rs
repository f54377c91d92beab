// src/backend/storage/batch.rs
use crate::models::report::Report;
use crate::models::slide::Slide;
use crate::storage::storable::SlideKey;
use crate::storage::{reports, slides};

/// Staged multi-document write set over the report and slide maps.
///
/// All fallible work (loads, validation, id minting) happens while the batch
/// is being staged; `commit` is nothing but map writes and cannot fail
/// part-way. Within one canister message a trap rolls the whole message back,
/// so a committed batch is observable only in its entirety.
#[derive(Default, Debug)]
pub struct ReportBatch {
    report_puts: Vec<Report>,
    report_deletes: Vec<String>,
    slide_puts: Vec<Slide>,
    slide_deletes: Vec<SlideKey>,
}

impl ReportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_report(&mut self, report: Report) -> &mut Self {
        self.report_puts.push(report);
        self
    }

    pub fn delete_report(&mut self, report_id: &str) -> &mut Self {
        self.report_deletes.push(report_id.to_string());
        self
    }

    pub fn put_slide(&mut self, slide: Slide) -> &mut Self {
        self.slide_puts.push(slide);
        self
    }

    pub fn delete_slide(&mut self, report_id: &str, slide_id: &str) -> &mut Self {
        self.slide_deletes.push(SlideKey::new(report_id, slide_id));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.report_puts.is_empty()
            && self.report_deletes.is_empty()
            && self.slide_puts.is_empty()
            && self.slide_deletes.is_empty()
    }

    /// Applies the staged writes. Deletes run before puts so a key that is
    /// both deleted and re-put ends up present.
    pub fn commit(self) {
        for key in &self.slide_deletes {
            slides::remove_slide(&key.report_id, &key.slide_id);
        }
        for report_id in &self.report_deletes {
            reports::remove_report(report_id);
        }
        for slide in &self.slide_puts {
            slides::insert_slide(slide);
        }
        for report in &self.report_puts {
            reports::insert_report(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::SlideLayout;

    fn slide(report_id: &str, slide_id: &str, order: u32) -> Slide {
        Slide {
            id: slide_id.to_string(),
            report_id: report_id.to_string(),
            order,
            layout: SlideLayout::Chart,
            body: "{}".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn staged_writes_apply_together() {
        slides::insert_slide(&slide("batch-r1", "old", 0));

        let mut batch = ReportBatch::new();
        batch.delete_slide("batch-r1", "old");
        batch.put_slide(slide("batch-r1", "new-a", 0));
        batch.put_slide(slide("batch-r1", "new-b", 1));
        batch.put_report(Report {
            id: "batch-r1".to_string(),
            slide_ids: vec!["new-a".to_string(), "new-b".to_string()],
            ..Report::default()
        });
        batch.commit();

        assert!(slides::get_slide("batch-r1", "old").is_none());
        assert!(slides::get_slide("batch-r1", "new-a").is_some());
        assert!(slides::get_slide("batch-r1", "new-b").is_some());
        assert!(reports::get_report("batch-r1").is_some());
    }

    #[test]
    fn dropping_an_uncommitted_batch_applies_nothing() {
        let mut batch = ReportBatch::new();
        batch.put_slide(slide("batch-r2", "phantom", 0));
        batch.delete_report("batch-r2");
        assert!(!batch.is_empty());
        drop(batch);

        assert!(slides::get_slide("batch-r2", "phantom").is_none());
    }

    #[test]
    fn delete_then_put_of_the_same_key_keeps_the_put() {
        slides::insert_slide(&slide("batch-r3", "s", 0));

        let mut batch = ReportBatch::new();
        batch.delete_slide("batch-r3", "s");
        batch.put_slide(slide("batch-r3", "s", 3));
        batch.commit();

        assert_eq!(slides::get_slide("batch-r3", "s").unwrap().order, 3);
    }
}
