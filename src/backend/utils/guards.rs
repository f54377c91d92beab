// src/backend/utils/guards.rs
use crate::error::ReportError;
use crate::models::common::PrincipalId;
use crate::models::report::Report;
use candid::Principal;

/// Checks that the caller owns the report.
///
/// # Errors
///
/// Returns `ReportError::NotAuthorized` if the caller is not the owner.
pub fn check_owner(report: &Report, caller: PrincipalId) -> Result<(), ReportError> {
    if report.owner == caller {
        Ok(())
    } else {
        Err(ReportError::NotAuthorized(format!(
            "Caller {} is not the owner of report {}",
            caller, report.id
        )))
    }
}

/// Rejects the anonymous principal for owner-only entry points.
pub fn check_authenticated(caller: PrincipalId) -> Result<(), ReportError> {
    if caller == Principal::anonymous() {
        Err(ReportError::NotAuthorized(
            "Anonymous callers cannot perform this operation".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_check_accepts_owner_and_rejects_others() {
        let owner = Principal::from_slice(&[1; 4]);
        let stranger = Principal::from_slice(&[2; 4]);
        let report = Report {
            id: "r1".to_string(),
            owner,
            ..Report::default()
        };

        assert!(check_owner(&report, owner).is_ok());
        assert!(matches!(
            check_owner(&report, stranger),
            Err(ReportError::NotAuthorized(_))
        ));
    }

    #[test]
    fn anonymous_caller_is_rejected() {
        assert!(check_authenticated(Principal::anonymous()).is_err());
        assert!(check_authenticated(Principal::from_slice(&[7; 4])).is_ok());
    }
}
