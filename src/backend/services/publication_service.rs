// src/backend/services/publication_service.rs
// Publication state machine and the share-link password gate.

use crate::{
    error::{ReportError, ReportResult},
    metrics,
    models::common::{PrincipalId, ReportStatus, SessionId},
    services::access_cache,
    services::report_service::{self, ReportWithSlides},
    storage,
    utils::{
        crypto::hash_password,
        guards::check_owner,
        time::now_ns,
    },
};

/// Publishes a report, making it reachable at its share url.
///
/// Preconditions (draft → published): the caller owns the report, the title
/// is non-empty, and there is at least one slide or content node to show.
/// Re-publishing an already published report is allowed and replaces the
/// password setting. Archived reports cannot be revived.
///
/// An optional plaintext password protects the public page: it is stored as
/// a SHA-256 hex digest and `is_password_protected` is flipped accordingly.
pub fn publish_report(
    report_id: &str,
    caller: PrincipalId,
    owner_username: &str,
    password: Option<String>,
) -> ReportResult<String> {
    let mut report = report_service::get_report_with_slides(report_id)?.report;
    check_owner(&report, caller)?;

    if report.status == ReportStatus::Archived {
        return Err(ReportError::InvalidInput(
            "Archived reports cannot be published".to_string(),
        ));
    }
    if report.title.trim().is_empty() {
        return Err(ReportError::InvalidInput(
            "A report needs a title before it can be published".to_string(),
        ));
    }
    if report.slide_ids.is_empty() && report.content.is_empty() {
        return Err(ReportError::InvalidInput(
            "A report needs at least one slide or content block before it can be published"
                .to_string(),
        ));
    }
    if owner_username.trim().is_empty() {
        return Err(ReportError::InvalidInput(
            "Publishing requires the owner's username for the share url".to_string(),
        ));
    }

    match password {
        Some(plaintext) => {
            if plaintext.is_empty() {
                return Err(ReportError::InvalidInput(
                    "Share-link password cannot be empty".to_string(),
                ));
            }
            report.password_hash = Some(hash_password(&plaintext));
            report.is_password_protected = true;
        }
        None => {
            report.password_hash = None;
            report.is_password_protected = false;
        }
    }

    let share_url = format!("/{}/reports/{}", owner_username, report_id);
    let current_time = now_ns();
    report.status = ReportStatus::Published;
    report.share_url = Some(share_url.clone());
    report.published_at = Some(current_time);
    report.version += 1;
    report.updated_at = current_time;
    storage::reports::insert_report(&report);

    metrics::record_report_published();
    Ok(share_url)
}

/// Checks a candidate password against the stored digest.
///
/// Returns `false` when the report is not password protected or carries no
/// digest; never errors on a wrong password. The comparison is a plain string
/// equality on the hex digest (not constant-time), which is acceptable for
/// this convenience gate.
pub fn verify_password(report_id: &str, candidate: &str) -> ReportResult<bool> {
    let report = report_service::get_report_with_slides(report_id)?.report;
    if !report.is_password_protected {
        return Ok(false);
    }
    let Some(stored) = report.password_hash else {
        return Ok(false);
    };
    Ok(hash_password(candidate) == stored)
}

/// Public-viewer read: status gate plus the independent password gate.
///
/// A published, unprotected report is returned as-is. A protected one is
/// only returned when the session has already unlocked it (see
/// `unlock_public_report`); otherwise the caller gets `NotAuthorized` and
/// should prompt for the password.
pub fn get_public_report(session: &SessionId, report_id: &str) -> ReportResult<ReportWithSlides> {
    let result = report_service::get_public_report(report_id)?;
    if result.report.is_password_protected && !access_cache::has_access(session, report_id) {
        return Err(ReportError::NotAuthorized(
            "This report is password protected".to_string(),
        ));
    }
    Ok(result)
}

/// Verifies a password and, on success, records the unlock for the session so
/// the visitor is not prompted again. Returns whether the password matched.
pub fn unlock_public_report(
    session: &SessionId,
    report_id: &str,
    candidate: &str,
) -> ReportResult<bool> {
    // The status gate applies before any password handling: drafts and
    // archived reports stay indistinguishable from missing ones.
    report_service::get_public_report(report_id)?;

    if verify_password(report_id, candidate)? {
        access_cache::store(session, report_id);
        metrics::record_password_unlock();
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ReportPatch;
    use crate::models::slide::{SlideInput, SlideLayout};
    use crate::services::report_service::{create_report, CreateReportData};
    use candid::Principal;
    use rstest::rstest;

    fn owner() -> PrincipalId {
        Principal::from_slice(&[3; 8])
    }

    fn publishable_report(title: &str) -> String {
        let id = create_report(
            owner(),
            CreateReportData {
                account_id: "acct-1".to_string(),
                client_id: None,
                title: title.to_string(),
                campaign_ids: vec![],
                date_range: None,
            },
        )
        .unwrap();
        report_service::replace_all_slides(
            &id,
            ReportPatch::default(),
            vec![SlideInput {
                id: None,
                layout: SlideLayout::Chart,
                body: "{}".to_string(),
            }],
        )
        .unwrap();
        id
    }

    #[test]
    fn publish_computes_share_url_and_stamps_metadata() {
        let id = publishable_report("Publishable");
        let url = publish_report(&id, owner(), "agency", None).unwrap();
        assert_eq!(url, format!("/agency/reports/{}", id));

        let report = report_service::get_report_with_slides(&id).unwrap().report;
        assert_eq!(report.status, ReportStatus::Published);
        assert_eq!(report.share_url.as_deref(), Some(url.as_str()));
        assert!(report.published_at.is_some());
        assert!(!report.is_password_protected);
        assert!(report.password_hash.is_none());
    }

    #[test]
    fn publish_requires_title_and_content() {
        let empty_title = publishable_report("  ");
        assert!(matches!(
            publish_report(&empty_title, owner(), "agency", None),
            Err(ReportError::InvalidInput(_))
        ));

        let no_content = create_report(
            owner(),
            CreateReportData {
                account_id: "acct-1".to_string(),
                client_id: None,
                title: "Empty".to_string(),
                campaign_ids: vec![],
                date_range: None,
            },
        )
        .unwrap();
        assert!(matches!(
            publish_report(&no_content, owner(), "agency", None),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[test]
    fn publish_is_owner_only_and_archived_is_terminal() {
        let id = publishable_report("Guarded");
        let stranger = Principal::from_slice(&[4; 8]);
        assert!(matches!(
            publish_report(&id, stranger, "agency", None),
            Err(ReportError::NotAuthorized(_))
        ));

        report_service::archive_report(&id).unwrap();
        assert!(matches!(
            publish_report(&id, owner(), "agency", None),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case::draft(false)]
    #[case::archived(true)]
    fn public_read_hides_non_published(#[case] archived: bool) {
        let id = publishable_report("Gated");
        if archived {
            report_service::archive_report(&id).unwrap();
        }
        assert!(matches!(
            report_service::get_public_report(&id),
            Err(ReportError::NotFound(_))
        ));
    }

    #[test]
    fn public_read_returns_published_regardless_of_password_state() {
        let id = publishable_report("Protected but published");
        publish_report(&id, owner(), "agency", Some("s3cret".to_string())).unwrap();
        // The status gate alone does not consider passwords.
        assert!(report_service::get_public_report(&id).is_ok());
    }

    #[test]
    fn password_round_trip() {
        let id = publishable_report("Locked");
        publish_report(&id, owner(), "agency", Some("hunter2".to_string())).unwrap();

        assert!(verify_password(&id, "hunter2").unwrap());
        assert!(!verify_password(&id, "HUNTER2").unwrap());
        assert!(!verify_password(&id, "").unwrap());

        // Unprotected reports verify false unconditionally.
        let open = publishable_report("Open");
        publish_report(&open, owner(), "agency", None).unwrap();
        assert!(!verify_password(&open, "hunter2").unwrap());
    }

    #[test]
    fn session_gate_requires_unlock_before_viewing() {
        let id = publishable_report("Session gated");
        publish_report(&id, owner(), "agency", Some("pw".to_string())).unwrap();
        let session = "session-a".to_string();

        assert!(matches!(
            get_public_report(&session, &id),
            Err(ReportError::NotAuthorized(_))
        ));
        assert!(!unlock_public_report(&session, &id, "wrong").unwrap());
        assert!(matches!(
            get_public_report(&session, &id),
            Err(ReportError::NotAuthorized(_))
        ));
        assert!(unlock_public_report(&session, &id, "pw").unwrap());
        assert!(get_public_report(&session, &id).is_ok());

        // A different session still has to unlock.
        let other = "session-b".to_string();
        assert!(matches!(
            get_public_report(&other, &id),
            Err(ReportError::NotAuthorized(_))
        ));
    }

    #[test]
    fn archiving_keeps_share_url_but_blocks_public_reads() {
        let id = publishable_report("Archived link");
        let url = publish_report(&id, owner(), "agency", None).unwrap();
        report_service::archive_report(&id).unwrap();

        let report = report_service::get_report_with_slides(&id).unwrap().report;
        assert_eq!(report.share_url.as_deref(), Some(url.as_str()));
        assert!(matches!(
            report_service::get_public_report(&id),
            Err(ReportError::NotFound(_))
        ));
    }
}
