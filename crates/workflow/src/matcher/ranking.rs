//! Reviewer eligibility and ranking
//!
//! Pure functions over candidate snapshots. The service re-validates
//! eligibility at assignment time; a ranked list is advisory and may be
//! stale by the time an editor acts on it.

use reviewflow_common::db::models::ReviewerProfile;

/// A reviewer profile paired with its derived load
#[derive(Debug, Clone)]
pub struct ReviewerCandidate {
    pub profile: ReviewerProfile,

    /// Active reviews not yet past due
    pub current_load: i64,

    /// Whether this reviewer already holds an active assignment for the
    /// paper being matched, in its current cycle
    pub already_assigned: bool,
}

impl ReviewerCandidate {
    /// Remaining capacity; never negative
    pub fn available_slots(&self) -> i64 {
        (i64::from(self.profile.max_reviews_per_year) - self.current_load).max(0)
    }
}

/// The eligibility filter: willingness, area fit, no duplicate
/// assignment, spare capacity. All must hold.
pub fn is_eligible(candidate: &ReviewerCandidate, research_area: &str) -> bool {
    candidate.profile.willing_to_review
        && candidate.profile.review_areas.matches(research_area)
        && !candidate.already_assigned
        && candidate.available_slots() > 0
}

/// Rank eligible candidates and return the top `max_results`.
///
/// An expertise keyword, when given, narrows the set first. Remaining
/// candidates sort by available slots descending, ties broken in favor of
/// verified reviewers.
pub fn rank(
    candidates: Vec<ReviewerCandidate>,
    research_area: &str,
    expertise_filter: Option<&str>,
    max_results: usize,
) -> Vec<ReviewerCandidate> {
    let mut eligible: Vec<ReviewerCandidate> = candidates
        .into_iter()
        .filter(|c| is_eligible(c, research_area))
        .filter(|c| match expertise_filter {
            Some(keyword) => c.profile.expertise.matches(keyword),
            None => true,
        })
        .collect();

    eligible.sort_by(|a, b| {
        b.available_slots()
            .cmp(&a.available_slots())
            .then_with(|| b.profile.verified.cmp(&a.profile.verified))
    });

    eligible.truncate(max_results);
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reviewflow_common::db::models::StringList;
    use uuid::Uuid;

    fn profile(max_reviews: i32, verified: bool) -> ReviewerProfile {
        let now = Utc::now();
        ReviewerProfile {
            id: Uuid::new_v4(),
            full_name: "Reviewer".to_string(),
            willing_to_review: true,
            review_areas: StringList(vec!["machine learning".to_string()]),
            expertise: StringList(vec!["deep learning".to_string()]),
            max_reviews_per_year: max_reviews,
            verified,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn candidate(max_reviews: i32, load: i64, verified: bool) -> ReviewerCandidate {
        ReviewerCandidate {
            profile: profile(max_reviews, verified),
            current_load: load,
            already_assigned: false,
        }
    }

    #[test]
    fn test_load_capping_excludes_full_reviewer() {
        let full = candidate(3, 3, true);
        assert_eq!(full.available_slots(), 0);
        assert!(!is_eligible(&full, "machine learning"));

        let free = candidate(3, 2, true);
        assert!(is_eligible(&free, "machine learning"));
    }

    #[test]
    fn test_unwilling_reviewer_excluded() {
        let mut c = candidate(5, 0, true);
        c.profile.willing_to_review = false;
        assert!(!is_eligible(&c, "machine learning"));
    }

    #[test]
    fn test_area_mismatch_excluded() {
        let c = candidate(5, 0, true);
        assert!(!is_eligible(&c, "marine biology"));
    }

    #[test]
    fn test_duplicate_assignment_excluded() {
        let mut c = candidate(5, 0, true);
        c.already_assigned = true;
        assert!(!is_eligible(&c, "machine learning"));
    }

    #[test]
    fn test_ranking_by_available_slots() {
        let a = candidate(10, 8, false); // 2 slots
        let b = candidate(10, 3, false); // 7 slots
        let c = candidate(10, 5, false); // 5 slots

        let ranked = rank(vec![a, b, c], "machine learning", None, 3);
        let slots: Vec<i64> = ranked.iter().map(|c| c.available_slots()).collect();
        assert_eq!(slots, vec![7, 5, 2]);
    }

    #[test]
    fn test_verified_breaks_ties() {
        let unverified = candidate(5, 2, false);
        let verified = candidate(5, 2, true);
        let verified_id = verified.profile.id;

        let ranked = rank(
            vec![unverified, verified],
            "machine learning",
            None,
            2,
        );
        assert_eq!(ranked[0].profile.id, verified_id);
    }

    #[test]
    fn test_expertise_filter_narrows() {
        let mut nlp = candidate(5, 0, false);
        nlp.profile.expertise = StringList(vec!["natural language processing".to_string()]);
        let dl = candidate(5, 0, false);

        let ranked = rank(
            vec![nlp.clone(), dl],
            "machine learning",
            Some("language"),
            5,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].profile.id, nlp.profile.id);
    }

    #[test]
    fn test_top_n_truncation() {
        let candidates: Vec<_> = (0..10).map(|i| candidate(20, i, false)).collect();
        let ranked = rank(candidates, "machine learning", None, 3);
        assert_eq!(ranked.len(), 3);
    }
}
