// src/backend/services/autosave.rs
// Debounced auto-save: coalesces editor mutation events into periodic saves
// so a burst of keystrokes produces one write, while bounding how much work
// is lost on a crash or navigation.
//
// The controller is a pure state machine over an injected timer, so its
// timing behavior is testable without wall clocks. The canister wiring at the
// bottom drives it with ic-cdk timers.

use crate::{
    error::ReportResult,
    metrics,
    models::{
        common::{EditorKind, ReportId, TimestampNs},
        report::ReportPatch,
        slide::SlideInput,
    },
    services::report_service,
    utils::time::now_ns,
};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Debounce window for the report editor.
pub const REPORT_EDITOR_DEBOUNCE: Duration = Duration::from_millis(3000);
/// Debounce window for the template editor, which saves less eagerly.
pub const TEMPLATE_EDITOR_DEBOUNCE: Duration = Duration::from_millis(5000);

impl EditorKind {
    pub fn debounce_delay(self) -> Duration {
        match self {
            EditorKind::Report => REPORT_EDITOR_DEBOUNCE,
            EditorKind::Template => TEMPLATE_EDITOR_DEBOUNCE,
        }
    }
}

/// Abstract one-shot debounce timer. `schedule` replaces any pending timer.
pub trait DebounceTimer {
    fn schedule(&mut self, delay: Duration);
    fn cancel(&mut self);
}

/// Save lifecycle of one open document.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Dirty,
    Saving,
    Error,
}

/// The in-memory edits waiting to be persisted. `slides: Some(_)` means the
/// slide list changed and the save must go through the full-document path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditSnapshot {
    pub patch: ReportPatch,
    pub slides: Option<Vec<SlideInput>>,
}

impl EditSnapshot {
    /// Coalesces a newer snapshot into this one, newer fields winning.
    fn merge(&mut self, newer: EditSnapshot) {
        self.patch.merge(newer.patch);
        if newer.slides.is_some() {
            self.slides = newer.slides;
        }
    }
}

/// Per-document auto-save state machine: `idle → dirty → saving → {idle |
/// error}`.
///
/// Contract: at most one save is in flight at a time. Edits that arrive while
/// a save is running are buffered and trigger exactly one follow-up cycle
/// after the in-flight save resolves.
pub struct AutosaveController<T: DebounceTimer> {
    state: SaveState,
    timer: T,
    delay: Duration,
    pending: Option<EditSnapshot>,
    /// Copy of the snapshot currently being persisted. Restored into
    /// `pending` if the save fails, so failed edits are never dropped.
    in_flight: Option<EditSnapshot>,
    dirty_while_saving: bool,
    last_saved_at: Option<TimestampNs>,
}

impl<T: DebounceTimer> AutosaveController<T> {
    pub fn new(kind: EditorKind, timer: T) -> Self {
        Self::with_delay(kind.debounce_delay(), timer)
    }

    pub fn with_delay(delay: Duration, timer: T) -> Self {
        Self {
            state: SaveState::Idle,
            timer,
            delay,
            pending: None,
            in_flight: None,
            dirty_while_saving: false,
            last_saved_at: None,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn last_saved_at(&self) -> Option<TimestampNs> {
        self.last_saved_at
    }

    /// A content or title mutation. Pure debounce: every edit while waiting
    /// restarts the window, so only the tail of a burst triggers the save.
    /// Edits during an in-flight save are buffered without starting a timer.
    pub fn record_edit(&mut self, snapshot: EditSnapshot) {
        match &mut self.pending {
            Some(pending) => pending.merge(snapshot),
            None => self.pending = Some(snapshot),
        }

        if self.state == SaveState::Saving {
            self.dirty_while_saving = true;
        } else {
            self.state = SaveState::Dirty;
            self.timer.schedule(self.delay);
        }
    }

    /// Debounce expiry. Returns the snapshot to persist, or `None` for a
    /// stale fire (already saved manually, or shut down).
    pub fn timer_fired(&mut self) -> Option<EditSnapshot> {
        if self.state != SaveState::Dirty {
            return None;
        }
        let snapshot = self.pending.take()?;
        self.in_flight = Some(snapshot.clone());
        self.state = SaveState::Saving;
        Some(snapshot)
    }

    /// Explicit "Save" action: bypasses the debounce window and cancels the
    /// pending timer so the same edit is not written twice. Returns `None`
    /// when there is nothing to save or a save is already in flight.
    pub fn manual_save(&mut self) -> Option<EditSnapshot> {
        if self.state == SaveState::Saving {
            return None;
        }
        self.timer.cancel();
        let snapshot = self.pending.take()?;
        self.in_flight = Some(snapshot.clone());
        self.state = SaveState::Saving;
        Some(snapshot)
    }

    /// The in-flight save resolved successfully. Buffered edits start a
    /// fresh debounce cycle; otherwise the document is clean.
    pub fn save_succeeded(&mut self, now: TimestampNs) {
        self.last_saved_at = Some(now);
        self.in_flight = None;
        if self.dirty_while_saving {
            self.dirty_while_saving = false;
            self.state = SaveState::Dirty;
            self.timer.schedule(self.delay);
        } else {
            self.state = SaveState::Idle;
        }
    }

    /// The in-flight save failed. Surfaced as a status, never an exception.
    /// The attempted snapshot goes back into `pending` (buffered edits merged
    /// on top, newer fields winning), so the failed edits are retried by the
    /// follow-up cycle or the next manual save rather than lost.
    pub fn save_failed(&mut self) {
        if let Some(mut attempted) = self.in_flight.take() {
            if let Some(buffered) = self.pending.take() {
                attempted.merge(buffered);
            }
            self.pending = Some(attempted);
        }
        if self.dirty_while_saving {
            self.dirty_while_saving = false;
            self.state = SaveState::Dirty;
            self.timer.schedule(self.delay);
        } else {
            self.state = SaveState::Error;
        }
    }

    /// The editor went away. Cancels the pending timer and drops unsaved
    /// edits; there is deliberately no flush here, so callers wanting
    /// durability must `manual_save` first.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.pending = None;
        self.in_flight = None;
        self.dirty_while_saving = false;
        self.state = SaveState::Idle;
    }
}

/// Editor status as reported to the UI ("saving…", "save failed" badge).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct EditorStatus {
    pub state: SaveState,
    pub last_saved_at: Option<TimestampNs>,
}

// --- Canister wiring -------------------------------------------------------

/// Debounce timer backed by ic-cdk one-shot timers. Each `schedule` replaces
/// the previous timer, which gives the debounce semantics.
struct IcDebounceTimer {
    report_id: ReportId,
    active: Option<ic_cdk_timers::TimerId>,
}

impl IcDebounceTimer {
    fn new(report_id: ReportId) -> Self {
        Self {
            report_id,
            active: None,
        }
    }
}

impl DebounceTimer for IcDebounceTimer {
    fn schedule(&mut self, delay: Duration) {
        self.cancel();
        let report_id = self.report_id.clone();
        self.active = Some(ic_cdk_timers::set_timer(delay, move || {
            run_autosave(&report_id);
        }));
    }

    fn cancel(&mut self) {
        if let Some(timer_id) = self.active.take() {
            ic_cdk_timers::clear_timer(timer_id);
        }
    }
}

thread_local! {
    // Open editors, keyed by report id. Heap only; an upgrade closes them.
    static EDITORS: RefCell<HashMap<ReportId, AutosaveController<IcDebounceTimer>>> =
        RefCell::new(HashMap::new());
}

/// Opens (or re-opens) an editor session for a report.
pub fn open_editor(report_id: &str, kind: EditorKind) {
    EDITORS.with(|editors| {
        editors
            .borrow_mut()
            .entry(report_id.to_string())
            .or_insert_with(|| {
                AutosaveController::new(kind, IcDebounceTimer::new(report_id.to_string()))
            });
    });
}

/// Feeds one mutation event into the report's auto-save loop. Editors are
/// opened lazily with the report debounce window if needed.
pub fn record_edit(report_id: &str, patch: ReportPatch, slides: Option<Vec<SlideInput>>) {
    open_editor(report_id, EditorKind::Report);
    EDITORS.with(|editors| {
        if let Some(controller) = editors.borrow_mut().get_mut(report_id) {
            controller.record_edit(EditSnapshot { patch, slides });
        }
    });
}

/// Manual save: synchronous, bypasses the debounce window. Errors surface to
/// the caller, unlike the background path.
pub fn flush_editor(report_id: &str) -> ReportResult<()> {
    let snapshot = EDITORS.with(|editors| {
        editors
            .borrow_mut()
            .get_mut(report_id)
            .and_then(|controller| controller.manual_save())
    });

    let Some(snapshot) = snapshot else {
        return Ok(());
    };

    let result = report_service::autosave_report(report_id, snapshot.patch, snapshot.slides);
    EDITORS.with(|editors| {
        if let Some(controller) = editors.borrow_mut().get_mut(report_id) {
            match &result {
                Ok(()) => controller.save_succeeded(now_ns()),
                Err(_) => controller.save_failed(),
            }
        }
    });
    result
}

/// Closes the editor, cancelling any pending debounce timer. Unsaved edits
/// are dropped; this mirrors the navigate-away path in the UI.
pub fn close_editor(report_id: &str) {
    EDITORS.with(|editors| {
        if let Some(mut controller) = editors.borrow_mut().remove(report_id) {
            controller.shutdown();
        }
    });
}

pub fn editor_status(report_id: &str) -> Option<EditorStatus> {
    EDITORS.with(|editors| {
        editors.borrow().get(report_id).map(|controller| EditorStatus {
            state: controller.state(),
            last_saved_at: controller.last_saved_at(),
        })
    })
}

// Timer callback: take the snapshot, persist it, feed the outcome back. The
// EDITORS borrow is released across the store call.
fn run_autosave(report_id: &str) {
    let snapshot = EDITORS.with(|editors| {
        editors
            .borrow_mut()
            .get_mut(report_id)
            .and_then(|controller| controller.timer_fired())
    });

    let Some(snapshot) = snapshot else {
        return;
    };

    let result = report_service::autosave_report(report_id, snapshot.patch, snapshot.slides);
    if let Err(e) = &result {
        // A failed background save must not take down the editor session.
        ic_cdk::println!("Auto-save failed for report {}: {}", report_id, e);
        metrics::record_autosave_failure();
    }

    EDITORS.with(|editors| {
        if let Some(controller) = editors.borrow_mut().get_mut(report_id) {
            match result {
                Ok(()) => controller.save_succeeded(now_ns()),
                Err(_) => controller.save_failed(),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Recording fake timer; `log` holds every schedule/cancel call.
    #[derive(Clone, Default)]
    struct MockTimer {
        log: Rc<RefCell<Vec<TimerCall>>>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TimerCall {
        Schedule(Duration),
        Cancel,
    }

    impl DebounceTimer for MockTimer {
        fn schedule(&mut self, delay: Duration) {
            self.log.borrow_mut().push(TimerCall::Schedule(delay));
        }

        fn cancel(&mut self) {
            self.log.borrow_mut().push(TimerCall::Cancel);
        }
    }

    fn title_edit(title: &str) -> EditSnapshot {
        EditSnapshot {
            patch: ReportPatch {
                title: Some(title.to_string()),
                ..ReportPatch::default()
            },
            slides: None,
        }
    }

    fn controller() -> (AutosaveController<MockTimer>, Rc<RefCell<Vec<TimerCall>>>) {
        let timer = MockTimer::default();
        let log = timer.log.clone();
        (AutosaveController::new(EditorKind::Report, timer), log)
    }

    #[test]
    fn a_burst_of_edits_coalesces_into_one_save_with_the_last_state() {
        let (mut controller, log) = controller();

        // Edits at t=0, 500, 900: each restarts the 3000ms window.
        controller.record_edit(title_edit("draft 1"));
        controller.record_edit(title_edit("draft 2"));
        controller.record_edit(title_edit("draft 3"));
        assert_eq!(controller.state(), SaveState::Dirty);
        assert_eq!(
            *log.borrow(),
            vec![
                TimerCall::Schedule(REPORT_EDITOR_DEBOUNCE),
                TimerCall::Schedule(REPORT_EDITOR_DEBOUNCE),
                TimerCall::Schedule(REPORT_EDITOR_DEBOUNCE),
            ]
        );

        // Only the last timer actually fires (t=900+3000): one save, carrying
        // the state as of the last mutation.
        let snapshot = controller.timer_fired().expect("one save fires");
        assert_eq!(snapshot.patch.title.as_deref(), Some("draft 3"));
        assert_eq!(controller.state(), SaveState::Saving);

        // A stale fire after the save started is a no-op.
        assert!(controller.timer_fired().is_none());

        controller.save_succeeded(42);
        assert_eq!(controller.state(), SaveState::Idle);
        assert_eq!(controller.last_saved_at(), Some(42));
    }

    #[test]
    fn no_second_save_starts_while_one_is_in_flight() {
        let (mut controller, log) = controller();

        controller.record_edit(title_edit("v1"));
        let _in_flight = controller.timer_fired().unwrap();
        let schedules_before = log.borrow().len();

        // Edits during the in-flight save: buffered, no new timer.
        controller.record_edit(title_edit("v2"));
        controller.record_edit(title_edit("v3"));
        assert_eq!(controller.state(), SaveState::Saving);
        assert_eq!(log.borrow().len(), schedules_before);
        assert!(controller.timer_fired().is_none());
        assert!(controller.manual_save().is_none());

        // Exactly one follow-up cycle once the save resolves.
        controller.save_succeeded(1);
        assert_eq!(controller.state(), SaveState::Dirty);
        assert_eq!(log.borrow().len(), schedules_before + 1);

        let followup = controller.timer_fired().unwrap();
        assert_eq!(followup.patch.title.as_deref(), Some("v3"));
        controller.save_succeeded(2);
        assert_eq!(controller.state(), SaveState::Idle);
    }

    #[test]
    fn manual_save_bypasses_the_window_and_cancels_the_timer() {
        let (mut controller, log) = controller();

        controller.record_edit(title_edit("typed"));
        let snapshot = controller.manual_save().expect("manual save flushes");
        assert_eq!(snapshot.patch.title.as_deref(), Some("typed"));
        assert_eq!(controller.state(), SaveState::Saving);
        assert!(log.borrow().contains(&TimerCall::Cancel));

        // The debounced timer firing afterwards must not save again.
        assert!(controller.timer_fired().is_none());

        controller.save_succeeded(7);
        assert_eq!(controller.state(), SaveState::Idle);
        // Nothing left to save.
        assert!(controller.manual_save().is_none());
    }

    #[test]
    fn failed_save_surfaces_as_error_state_and_next_edit_recovers() {
        let (mut controller, _log) = controller();

        controller.record_edit(title_edit("doomed"));
        controller.timer_fired().unwrap();
        controller.save_failed();
        assert_eq!(controller.state(), SaveState::Error);
        assert_eq!(controller.last_saved_at(), None);

        // A new edit from the error state starts a normal cycle.
        controller.record_edit(title_edit("recovered"));
        assert_eq!(controller.state(), SaveState::Dirty);
        let snapshot = controller.timer_fired().unwrap();
        assert_eq!(snapshot.patch.title.as_deref(), Some("recovered"));
        controller.save_succeeded(9);
        assert_eq!(controller.state(), SaveState::Idle);
    }

    #[test]
    fn failed_save_keeps_the_snapshot_for_a_manual_retry() {
        let (mut controller, _log) = controller();

        controller.record_edit(title_edit("must not vanish"));
        controller.timer_fired().unwrap();
        controller.save_failed();
        assert_eq!(controller.state(), SaveState::Error);

        // The failed edits are still there to retry.
        let retry = controller.manual_save().expect("failed edits are retained");
        assert_eq!(retry.patch.title.as_deref(), Some("must not vanish"));
        controller.save_succeeded(11);
        assert_eq!(controller.state(), SaveState::Idle);
        assert!(controller.manual_save().is_none());
    }

    #[test]
    fn failed_save_fields_survive_under_edits_buffered_mid_save() {
        let (mut controller, _log) = controller();

        controller.record_edit(title_edit("failed title"));
        controller.timer_fired().unwrap();
        // A different field changes while the save is in flight.
        controller.record_edit(EditSnapshot {
            patch: ReportPatch {
                account_id: Some("acct-2".to_string()),
                ..ReportPatch::default()
            },
            slides: None,
        });

        controller.save_failed();
        assert_eq!(controller.state(), SaveState::Dirty);

        // The follow-up carries both the failed title and the buffered
        // account change, the buffered (newer) side winning on overlap.
        let followup = controller.timer_fired().unwrap();
        assert_eq!(followup.patch.title.as_deref(), Some("failed title"));
        assert_eq!(followup.patch.account_id.as_deref(), Some("acct-2"));
    }

    #[test]
    fn failed_save_with_buffered_edits_schedules_the_followup() {
        let (mut controller, log) = controller();

        controller.record_edit(title_edit("v1"));
        controller.timer_fired().unwrap();
        controller.record_edit(title_edit("v2"));
        let schedules_before = log.borrow().len();

        controller.save_failed();
        assert_eq!(controller.state(), SaveState::Dirty);
        assert_eq!(log.borrow().len(), schedules_before + 1);
        let retry = controller.timer_fired().unwrap();
        assert_eq!(retry.patch.title.as_deref(), Some("v2"));
    }

    #[test]
    fn shutdown_cancels_the_pending_timer_and_drops_edits() {
        let (mut controller, log) = controller();

        controller.record_edit(title_edit("unsaved"));
        controller.shutdown();
        assert_eq!(controller.state(), SaveState::Idle);
        assert!(log.borrow().contains(&TimerCall::Cancel));

        // The known data-loss window: nothing to flush after shutdown.
        assert!(controller.manual_save().is_none());
        assert!(controller.timer_fired().is_none());
    }

    #[test]
    fn template_editors_use_the_longer_window() {
        let timer = MockTimer::default();
        let log = timer.log.clone();
        let mut controller = AutosaveController::new(EditorKind::Template, timer);

        controller.record_edit(title_edit("template"));
        assert_eq!(
            *log.borrow(),
            vec![TimerCall::Schedule(TEMPLATE_EDITOR_DEBOUNCE)]
        );
    }

    #[test]
    fn slide_changes_ride_along_with_field_edits() {
        let (mut controller, _log) = controller();

        controller.record_edit(title_edit("fields only"));
        controller.record_edit(EditSnapshot {
            patch: ReportPatch::default(),
            slides: Some(vec![]),
        });

        let snapshot = controller.timer_fired().unwrap();
        assert_eq!(snapshot.patch.title.as_deref(), Some("fields only"));
        assert!(snapshot.slides.is_some());
    }
}
