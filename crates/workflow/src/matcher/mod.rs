//! Reviewer Matcher
//!
//! Ranks eligible reviewers for a paper and performs assignments that are
//! safe under concurrent callers: eligibility is re-validated at call
//! time and the storage layer's (paper, reviewer, cycle) unique key
//! arbitrates races.

mod ranking;

pub use ranking::{is_eligible, rank, ReviewerCandidate};

use chrono::{DateTime, Utc};
use reviewflow_common::auth::CallerContext;
use reviewflow_common::db::models::{
    CommentList, PaperActiveModel, PaperStatus, RatingSet, Review, ReviewActiveModel,
    ReviewStatus,
};
use reviewflow_common::db::Repository;
use reviewflow_common::errors::{AppError, Result};
use reviewflow_common::metrics::METRICS_PREFIX;
use reviewflow_common::notify::{NotificationEvent, Notifier};
use sea_orm::Set;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::paper::transitions;

/// Reviewer matching and assignment service
#[derive(Clone)]
pub struct MatcherService {
    repo: Repository,
    notifier: Arc<dyn Notifier>,
    default_max_results: usize,
}

impl MatcherService {
    pub fn new(repo: Repository, notifier: Arc<dyn Notifier>, default_max_results: usize) -> Self {
        Self {
            repo,
            notifier,
            default_max_results,
        }
    }

    /// Build the candidate pool for a paper: willing reviewers with their
    /// derived loads and duplicate-assignment flags.
    async fn candidate_pool(&self, paper_id: Uuid, cycle: i32) -> Result<Vec<ReviewerCandidate>> {
        let now = Utc::now();

        let profiles = self.repo.list_willing_reviewers().await?;
        let loads: HashMap<Uuid, i64> = self
            .repo
            .reviewer_loads(now)
            .await?
            .into_iter()
            .map(|l| (l.reviewer_id, l.active_reviews))
            .collect();

        let assigned: Vec<Uuid> = self
            .repo
            .list_reviews_for_paper(paper_id, Some(cycle))
            .await?
            .into_iter()
            .filter(|r| r.review_status().is_active())
            .map(|r| r.reviewer_id)
            .collect();

        Ok(profiles
            .into_iter()
            .map(|profile| {
                let current_load = loads.get(&profile.id).copied().unwrap_or(0);
                let already_assigned = assigned.contains(&profile.id);
                ReviewerCandidate {
                    profile,
                    current_load,
                    already_assigned,
                }
            })
            .collect())
    }

    /// Rank eligible reviewers for a paper and return the top candidates
    pub async fn match_reviewers(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        expertise_filter: Option<&str>,
        max_results: Option<usize>,
    ) -> Result<Vec<ReviewerCandidate>> {
        caller.require_editor()?;

        let paper = self.repo.get_paper(paper_id).await?;
        let pool = self.candidate_pool(paper.id, paper.review_cycle).await?;
        let max = max_results.unwrap_or(self.default_max_results);

        let ranked = rank(pool, &paper.research_area, expertise_filter, max);

        tracing::debug!(
            paper_id = %paper.id,
            candidates = ranked.len(),
            expertise_filter = expertise_filter.unwrap_or("<none>"),
            "Reviewer candidates ranked"
        );

        Ok(ranked)
    }

    /// Assign a reviewer to a paper.
    ///
    /// Eligibility is checked against live data, not a previously ranked
    /// list. The review insert and the paper-side bookkeeping commit in
    /// one transaction; when two callers race on the same triple, exactly
    /// one review exists afterwards and the loser gets `AlreadyAssigned`.
    pub async fn assign(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        reviewer_id: Uuid,
        due_date: DateTime<Utc>,
        is_blind: bool,
    ) -> Result<Review> {
        caller.require_editor()?;

        let now = Utc::now();
        if due_date <= now {
            return Err(AppError::Validation {
                message: "Due date must be in the future".to_string(),
                field: Some("due_date".to_string()),
            });
        }

        let paper = self.repo.get_paper(paper_id).await?;
        let status = paper.paper_status();
        if !matches!(status, PaperStatus::Submitted | PaperStatus::UnderReview) {
            return Err(AppError::InvalidState {
                status: paper.status.clone(),
                message: "Reviewers can only be assigned to papers in review".to_string(),
            });
        }

        let profile = self.repo.get_reviewer(reviewer_id).await?;

        // Live re-validation of the eligibility filter
        if self
            .repo
            .has_active_assignment(paper.id, reviewer_id, paper.review_cycle)
            .await?
        {
            return Err(AppError::AlreadyAssigned {
                paper_id: paper.id.to_string(),
                reviewer_id: reviewer_id.to_string(),
                cycle: paper.review_cycle,
            });
        }

        let candidate = ReviewerCandidate {
            current_load: self.repo.count_active_reviews(reviewer_id, now).await?,
            already_assigned: false,
            profile,
        };

        if !is_eligible(&candidate, &paper.research_area) {
            return Err(AppError::InvalidState {
                status: "ineligible".to_string(),
                message: format!(
                    "Reviewer {} is not eligible for this paper (slots: {})",
                    reviewer_id,
                    candidate.available_slots()
                ),
            });
        }

        let review_id = Uuid::new_v4();
        let review = ReviewActiveModel {
            id: Set(review_id),
            paper_id: Set(paper.id),
            reviewer_id: Set(reviewer_id),
            assigned_by: Set(caller.caller_id),
            cycle: Set(paper.review_cycle),
            is_blind: Set(is_blind),
            status: Set(ReviewStatus::Assigned.into()),
            assigned_at: Set(now.into()),
            due_date: Set(due_date.into()),
            completed_at: Set(None),
            rating: Set(RatingSet::default()),
            summary: Set(None),
            recommendation: Set(None),
            average_rating: Set(None),
            decline_reason: Set(None),
            comments: Set(CommentList::default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        // First assignment takes the paper from submitted to under_review
        let mut change_log = paper.change_log.clone();
        change_log.push(caller.caller_id, format!("reviewer {} assigned", reviewer_id));

        let mut paper_changes = PaperActiveModel {
            id: Set(paper.id),
            reviews_total: Set(paper.reviews_total + 1),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        if status == PaperStatus::Submitted {
            transitions::ensure_legal(
                &paper.id.to_string(),
                status,
                PaperStatus::UnderReview,
            )?;
            paper_changes.status = Set(PaperStatus::UnderReview.into());
        }

        let result = self
            .repo
            .assign_reviewer(
                review,
                paper.id,
                reviewer_id,
                paper.review_cycle,
                paper.lock_version,
                paper_changes,
            )
            .await;

        let review = match result {
            Ok(review) => review,
            Err(e @ AppError::AlreadyAssigned { .. }) => {
                metrics::counter!(format!("{}_assignment_conflicts_total", METRICS_PREFIX))
                    .increment(1);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        metrics::counter!(format!("{}_reviews_assigned_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            review_id = %review.id,
            paper_id = %paper.id,
            reviewer_id = %reviewer_id,
            cycle = paper.review_cycle,
            is_blind,
            "Reviewer assigned"
        );

        self.notifier
            .send_best_effort(NotificationEvent::ReviewerAssigned {
                paper_id: paper.id,
                reviewer_id,
                due_date,
                is_blind,
            })
            .await;

        Ok(review)
    }

    /// Decline an assignment. Legal only from `assigned`; the review is
    /// withdrawn and the paper-side slot released in one transaction.
    /// Terminal for the (paper, reviewer, cycle) triple.
    pub async fn decline(
        &self,
        caller: &CallerContext,
        review_id: Uuid,
        reason: String,
    ) -> Result<Review> {
        let review = self.repo.get_review(review_id).await?;
        caller.require_self(review.reviewer_id, "review", review.id)?;

        if review.review_status() != ReviewStatus::Assigned {
            return Err(AppError::InvalidState {
                status: review.status.clone(),
                message: "Only assignments that have not been started can be declined".to_string(),
            });
        }

        let now = Utc::now();
        let review_changes = ReviewActiveModel {
            id: Set(review.id),
            status: Set(ReviewStatus::Withdrawn.into()),
            decline_reason: Set(Some(reason.clone())),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let paper = self.repo.get_paper(review.paper_id).await?;

        let mut change_log = paper.change_log.clone();
        change_log.push(
            review.reviewer_id,
            format!("reviewer {} declined", review.reviewer_id),
        );

        let paper_changes = PaperActiveModel {
            id: Set(paper.id),
            reviews_total: Set((paper.reviews_total - 1).max(0)),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let review = self
            .repo
            .withdraw_review(
                review.id,
                review_changes,
                paper.id,
                paper.lock_version,
                paper_changes,
            )
            .await?;

        metrics::counter!(format!("{}_reviews_declined_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            review_id = %review.id,
            paper_id = %review.paper_id,
            reviewer_id = %review.reviewer_id,
            "Assignment declined"
        );

        self.notifier
            .send_best_effort(NotificationEvent::AssignmentDeclined {
                paper_id: review.paper_id,
                reviewer_id: review.reviewer_id,
                reason,
            })
            .await;

        Ok(review)
    }
}
