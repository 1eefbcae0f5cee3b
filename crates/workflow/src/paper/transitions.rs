//! Paper state machine
//!
//! The full transition table:
//!
//! ```text
//! draft -> submitted -> under_review -> accepted | rejected | revision_requested
//! revision_requested -> submitted        (resubmit, same version)
//! accepted -> published
//! ```
//!
//! `accepted`, `rejected` and `published` are terminal for a version;
//! a new version only exists by forking.

use reviewflow_common::db::models::PaperStatus;
use reviewflow_common::errors::{AppError, Result};

/// Whether `from -> to` is a legal edge of the paper state machine
pub fn is_legal(from: PaperStatus, to: PaperStatus) -> bool {
    use PaperStatus::*;

    matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, UnderReview)
            | (UnderReview, Accepted)
            | (UnderReview, Rejected)
            | (UnderReview, RevisionRequested)
            | (RevisionRequested, Submitted)
            | (Accepted, Published)
    )
}

/// Validate a transition:
/// `ImmutablePaper` when leaving a terminal state (publication excepted),
/// `InvalidState` for any other illegal edge.
pub fn ensure_legal(paper_id: &str, from: PaperStatus, to: PaperStatus) -> Result<()> {
    if is_legal(from, to) {
        return Ok(());
    }

    if from.is_terminal() {
        Err(AppError::ImmutablePaper {
            id: paper_id.to_string(),
            status: from.as_str().to_string(),
        })
    } else {
        Err(AppError::InvalidState {
            status: from.as_str().to_string(),
            message: format!("Cannot transition from '{}' to '{}'", from.as_str(), to.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaperStatus::*;

    const ALL: [PaperStatus; 7] = [
        Draft,
        Submitted,
        UnderReview,
        Accepted,
        Rejected,
        RevisionRequested,
        Published,
    ];

    #[test]
    fn test_happy_path_walk() {
        assert!(is_legal(Draft, Submitted));
        assert!(is_legal(Submitted, UnderReview));
        assert!(is_legal(UnderReview, Accepted));
        assert!(is_legal(Accepted, Published));
    }

    #[test]
    fn test_revision_loop() {
        assert!(is_legal(UnderReview, RevisionRequested));
        assert!(is_legal(RevisionRequested, Submitted));
        assert!(is_legal(Submitted, UnderReview));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!is_legal(Rejected, to), "rejected -> {:?}", to);
            assert!(!is_legal(Published, to), "published -> {:?}", to);
        }
        // accepted's only exit is publication
        for to in ALL {
            assert_eq!(is_legal(Accepted, to), to == Published, "accepted -> {:?}", to);
        }
    }

    #[test]
    fn test_no_skipping_review() {
        assert!(!is_legal(Draft, UnderReview));
        assert!(!is_legal(Draft, Accepted));
        assert!(!is_legal(Submitted, Accepted));
        assert!(!is_legal(Submitted, Published));
    }

    #[test]
    fn test_ensure_legal_errors() {
        let err = ensure_legal("p1", Published, Submitted).unwrap_err();
        assert!(matches!(err, AppError::ImmutablePaper { .. }));

        let err = ensure_legal("p1", Draft, Accepted).unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        assert!(ensure_legal("p1", Draft, Submitted).is_ok());
    }
}
