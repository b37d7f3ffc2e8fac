//! Approval workflow for OD requests.
//!
//! A request starts `pending`. A tutor moves it to `approved_by_tutor` or
//! `rejected`; an HOD then moves an `approved_by_tutor` request to
//! `approved_by_hod` or `rejected`. Every other (role, status) pair is refused.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::model::{
    od_request::{OdRequest, OdStatus},
    user::{Staff, StaffRole},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("comments are required to {0} a request")]
    MissingComments(Decision),

    #[error("a {role} cannot {decision} a request that is {status}")]
    NotPermitted {
        role: StaffRole,
        decision: Decision,
        status: OdStatus,
    },
}

/// True when `role` may act (approve or reject) on a request in `status`.
pub fn can_act(role: StaffRole, status: OdStatus) -> bool {
    matches!(
        (role, status),
        (StaffRole::Tutor, OdStatus::Pending) | (StaffRole::Hod, OdStatus::ApprovedByTutor)
    )
}

pub fn can_approve(request: &OdRequest, staff: &Staff) -> bool {
    can_act(staff.staff_role, request.status)
}

/// Status reached by `decision`, or `None` if the transition is not allowed.
pub fn next_status(role: StaffRole, status: OdStatus, decision: Decision) -> Option<OdStatus> {
    if !can_act(role, status) {
        return None;
    }
    Some(match (role, decision) {
        (StaffRole::Tutor, Decision::Approve) => OdStatus::ApprovedByTutor,
        (StaffRole::Hod, Decision::Approve) => OdStatus::ApprovedByHod,
        (_, Decision::Reject) => OdStatus::Rejected,
    })
}

/// Applies a staff decision to `request`.
///
/// Returns the status the request had before the change. On error the
/// request is left untouched.
pub fn apply(
    request: &mut OdRequest,
    role: StaffRole,
    decision: Decision,
    comments: &str,
) -> Result<OdStatus, WorkflowError> {
    let comments = comments.trim();
    if comments.is_empty() {
        return Err(WorkflowError::MissingComments(decision));
    }

    let previous = request.status;
    let next = next_status(role, previous, decision).ok_or(WorkflowError::NotPermitted {
        role,
        decision,
        status: previous,
    })?;

    request.status = next;
    match role {
        StaffRole::Tutor => request.tutor_comments = Some(comments.to_string()),
        StaffRole::Hod => request.hod_comments = Some(comments.to_string()),
    }
    Ok(previous)
}

/// Read side filter: tutors only see requests still in their queue or just
/// forwarded by them, HODs see everything.
pub fn is_visible_to(role: StaffRole, status: OdStatus) -> bool {
    match role {
        StaffRole::Tutor => matches!(status, OdStatus::Pending | OdStatus::ApprovedByTutor),
        StaffRole::Hod => true,
    }
}

pub fn visible_requests(requests: Vec<OdRequest>, role: StaffRole) -> Vec<OdRequest> {
    requests
        .into_iter()
        .filter(|r| is_visible_to(role, r.status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        od_request::{OdCategory, OdType},
        user::{InstitutionType, Shift},
    };
    use chrono::{NaiveDate, Utc};
    use strum::IntoEnumIterator;

    fn request(status: OdStatus) -> OdRequest {
        let day = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        OdRequest {
            id: 1,
            student_id: 1,
            student_name: "S1".into(),
            title: "Medical Appointment".into(),
            description: "Regular health checkup".into(),
            od_type: OdType::Medical,
            category: OdCategory::Other,
            department: "Computer Science".into(),
            event_name: None,
            date_from: day,
            date_to: day,
            status,
            file_url: None,
            tutor_comments: None,
            hod_comments: None,
            submitted_at: Utc::now(),
        }
    }

    fn staff(role: StaffRole) -> Staff {
        Staff {
            id: 9,
            name: "Staff".into(),
            email: "staff@example.com".into(),
            institution_type: InstitutionType::College,
            staff_id: "STF042".into(),
            department: "Computer Science".into(),
            shift: Shift::Morning,
            staff_role: role,
        }
    }

    const ALLOWED: [(OdStatus, StaffRole, Decision, OdStatus); 4] = [
        (OdStatus::Pending, StaffRole::Tutor, Decision::Approve, OdStatus::ApprovedByTutor),
        (OdStatus::Pending, StaffRole::Tutor, Decision::Reject, OdStatus::Rejected),
        (OdStatus::ApprovedByTutor, StaffRole::Hod, Decision::Approve, OdStatus::ApprovedByHod),
        (OdStatus::ApprovedByTutor, StaffRole::Hod, Decision::Reject, OdStatus::Rejected),
    ];

    #[test]
    fn transition_accepted_iff_listed() {
        for status in OdStatus::iter() {
            for role in StaffRole::iter() {
                for decision in [Decision::Approve, Decision::Reject] {
                    let expected = ALLOWED
                        .iter()
                        .find(|(s, r, d, _)| *s == status && *r == role && *d == decision)
                        .map(|(_, _, _, next)| *next);

                    let mut r = request(status);
                    let outcome = apply(&mut r, role, decision, "noted");
                    match expected {
                        Some(next) => {
                            assert_eq!(outcome, Ok(status));
                            assert_eq!(r.status, next);
                        }
                        None => {
                            assert_eq!(
                                outcome,
                                Err(WorkflowError::NotPermitted { role, decision, status })
                            );
                            assert_eq!(r, request_with_time(status, r.submitted_at));
                        }
                    }
                }
            }
        }
    }

    fn request_with_time(status: OdStatus, at: chrono::DateTime<Utc>) -> OdRequest {
        let mut r = request(status);
        r.submitted_at = at;
        r
    }

    #[test]
    fn can_approve_matches_table() {
        for status in OdStatus::iter() {
            for role in StaffRole::iter() {
                let listed = ALLOWED.iter().any(|(s, r, _, _)| *s == status && *r == role);
                assert_eq!(can_approve(&request(status), &staff(role)), listed);
            }
        }
    }

    #[test]
    fn tutor_then_hod_approval() {
        let mut r = request(OdStatus::Pending);
        assert_eq!(r.student_name, "S1");

        apply(&mut r, StaffRole::Tutor, Decision::Approve, "ok").unwrap();
        assert_eq!(r.status, OdStatus::ApprovedByTutor);
        assert_eq!(r.tutor_comments.as_deref(), Some("ok"));

        apply(&mut r, StaffRole::Hod, Decision::Approve, "confirmed").unwrap();
        assert_eq!(r.status, OdStatus::ApprovedByHod);
        assert_eq!(r.hod_comments.as_deref(), Some("confirmed"));
        assert_eq!(r.tutor_comments.as_deref(), Some("ok"));
    }

    #[test]
    fn tutor_cannot_approve_twice() {
        let mut r = request(OdStatus::ApprovedByTutor);
        let err = apply(&mut r, StaffRole::Tutor, Decision::Approve, "again").unwrap_err();
        assert!(matches!(err, WorkflowError::NotPermitted { .. }));
        assert_eq!(r.status, OdStatus::ApprovedByTutor);
    }

    #[test]
    fn blank_comments_refused_before_any_change() {
        for comments in ["", "   ", "\n\t"] {
            for decision in [Decision::Approve, Decision::Reject] {
                let mut r = request(OdStatus::Pending);
                assert_eq!(
                    apply(&mut r, StaffRole::Tutor, decision, comments),
                    Err(WorkflowError::MissingComments(decision))
                );
                assert_eq!(r.status, OdStatus::Pending);
                assert_eq!(r.tutor_comments, None);
            }
        }
    }

    #[test]
    fn reject_records_comment_of_the_acting_role() {
        let mut r = request(OdStatus::ApprovedByTutor);
        apply(&mut r, StaffRole::Hod, Decision::Reject, "  dates clash  ").unwrap();
        assert_eq!(r.status, OdStatus::Rejected);
        assert_eq!(r.hod_comments.as_deref(), Some("dates clash"));
        assert_eq!(r.tutor_comments, None);
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for status in OdStatus::iter().filter(|s| s.is_terminal()) {
            for role in StaffRole::iter() {
                assert!(!can_act(role, status));
            }
        }
    }

    #[test]
    fn visibility_by_role() {
        let all: Vec<_> = OdStatus::iter().map(request).collect();

        let tutor_view = visible_requests(all.clone(), StaffRole::Tutor);
        let statuses: Vec<_> = tutor_view.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![OdStatus::Pending, OdStatus::ApprovedByTutor]);

        let hod_view = visible_requests(all.clone(), StaffRole::Hod);
        assert_eq!(hod_view.len(), all.len());
    }
}
