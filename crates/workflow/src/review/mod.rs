//! Review Lifecycle Manager
//!
//! Owns an individual review's state machine:
//! `assigned -> in_progress -> completed` (terminal), with withdrawal via
//! decline handled by the matcher. Lateness is never a stored transition;
//! see `Review::is_late`.

pub mod rating;

use chrono::Utc;
use rating::{FullRating, ReviewConsolidation};
use reviewflow_common::auth::CallerContext;
use reviewflow_common::db::models::{
    RatingSet, Recommendation, Review, ReviewActiveModel, ReviewComment, ReviewStatus,
};
use reviewflow_common::db::Repository;
use reviewflow_common::errors::{AppError, Result};
use reviewflow_common::metrics::METRICS_PREFIX;
use reviewflow_common::notify::{NotificationEvent, Notifier};
use sea_orm::Set;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::paper::PaperService;

/// Partial fields merged by a draft save
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub rating: RatingSet,
    pub summary: Option<String>,
}

/// Review lifecycle service
#[derive(Clone)]
pub struct ReviewService {
    repo: Repository,
    papers: PaperService,
    notifier: Arc<dyn Notifier>,
}

impl ReviewService {
    pub fn new(repo: Repository, papers: PaperService, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repo,
            papers,
            notifier,
        }
    }

    /// Reject mutation of completed or withdrawn reviews up front; the
    /// repository's guarded update remains the backstop under races.
    fn ensure_active(review: &Review) -> Result<()> {
        match review.review_status() {
            ReviewStatus::Assigned | ReviewStatus::InProgress => Ok(()),
            ReviewStatus::Completed => Err(AppError::ImmutableReview {
                id: review.id.to_string(),
            }),
            ReviewStatus::Withdrawn => Err(AppError::InvalidState {
                status: review.status.clone(),
                message: "Review was withdrawn".to_string(),
            }),
        }
    }

    /// Save partial review fields. The first save moves the review from
    /// `assigned` to `in_progress`.
    pub async fn save_draft(
        &self,
        caller: &CallerContext,
        review_id: Uuid,
        draft: ReviewDraft,
    ) -> Result<Review> {
        let review = self.repo.get_review(review_id).await?;
        caller.require_self(review.reviewer_id, "review", review.id)?;
        Self::ensure_active(&review)?;

        rating::validate_partial(&draft.rating)?;

        let mut merged = review.rating.clone();
        merged.merge(draft.rating);

        let changes = ReviewActiveModel {
            id: Set(review.id),
            status: Set(ReviewStatus::InProgress.into()),
            rating: Set(merged),
            summary: match draft.summary {
                Some(summary) => Set(Some(summary)),
                None => Set(review.summary.clone()),
            },
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.repo.update_review_active(review.id, changes).await
    }

    /// Submit a completed review.
    ///
    /// Requires the full five-category rating, a non-empty summary and a
    /// recommendation. The review update and the paper-side progress
    /// bookkeeping commit in one transaction; a second submission fails
    /// with `AlreadySubmitted` and changes nothing.
    pub async fn submit(
        &self,
        caller: &CallerContext,
        review_id: Uuid,
        full_rating: FullRating,
        summary: String,
        recommendation: Recommendation,
    ) -> Result<Review> {
        let review = self.repo.get_review(review_id).await?;
        caller.require_self(review.reviewer_id, "review", review.id)?;

        match review.review_status() {
            ReviewStatus::Completed => {
                return Err(AppError::AlreadySubmitted {
                    id: review.id.to_string(),
                })
            }
            ReviewStatus::Withdrawn => {
                return Err(AppError::InvalidState {
                    status: review.status.clone(),
                    message: "Review was withdrawn".to_string(),
                })
            }
            _ => {}
        }

        if summary.trim().is_empty() {
            return Err(AppError::MissingField {
                field: "summary".to_string(),
            });
        }
        full_rating.validate()?;
        rating::validate_recommendation(&recommendation)?;

        let rating_set = full_rating.into_set();
        let average = rating_set.average().ok_or_else(|| AppError::Internal {
            message: "Complete rating set produced no average".to_string(),
        })?;

        let now = Utc::now();
        let review_changes = ReviewActiveModel {
            id: Set(review.id),
            status: Set(ReviewStatus::Completed.into()),
            completed_at: Set(Some(now.into())),
            rating: Set(rating_set),
            summary: Set(Some(summary)),
            recommendation: Set(Some(recommendation)),
            average_rating: Set(Some(average)),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let paper = self.repo.get_paper(review.paper_id).await?;
        let paper_changes = self.papers.record_review_completion(&paper, review.id);

        let review = self
            .repo
            .complete_review(
                review.id,
                review_changes,
                paper.id,
                paper.lock_version,
                paper_changes,
            )
            .await?;

        metrics::counter!(format!("{}_reviews_completed_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            review_id = %review.id,
            paper_id = %review.paper_id,
            average_rating = average,
            "Review submitted"
        );

        self.notifier
            .send_best_effort(NotificationEvent::ReviewCompleted {
                paper_id: review.paper_id,
                review_id: review.id,
                reviewer_id: review.reviewer_id,
            })
            .await;

        Ok(review)
    }

    /// Attach an inline comment to a section. Purely additive; no state
    /// change.
    pub async fn add_comment(
        &self,
        caller: &CallerContext,
        review_id: Uuid,
        section: String,
        text: String,
        page_number: Option<u32>,
    ) -> Result<Review> {
        if text.trim().is_empty() {
            return Err(AppError::MissingField {
                field: "text".to_string(),
            });
        }

        let review = self.repo.get_review(review_id).await?;
        caller.require_self(review.reviewer_id, "review", review.id)?;
        Self::ensure_active(&review)?;

        let mut comments = review.comments.clone();
        comments.0.push(ReviewComment {
            section,
            text,
            page_number,
            at: Utc::now(),
        });

        let changes = ReviewActiveModel {
            id: Set(review.id),
            comments: Set(comments),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.repo.update_review_active(review.id, changes).await
    }

    /// Fetch a review, enforcing blind-review visibility: while a review
    /// is blind, only the reviewer, editors and admins see it at all.
    pub async fn get(&self, caller: &CallerContext, review_id: Uuid) -> Result<Review> {
        let review = self.repo.get_review(review_id).await?;

        if review.is_blind
            && !caller.is_admin()
            && caller.caller_id != review.reviewer_id
            && caller.require_editor().is_err()
        {
            return Err(AppError::Forbidden {
                message: "Blind reviews are not visible to authors".to_string(),
            });
        }

        Ok(review)
    }

    /// Consolidated rating/recommendation data for a paper's current
    /// cycle; the editor's input for `decide`.
    pub async fn consolidate_for_paper(
        &self,
        paper_id: Uuid,
        cycle: Option<i32>,
    ) -> Result<ReviewConsolidation> {
        let reviews = self.repo.list_reviews_for_paper(paper_id, cycle).await?;
        Ok(rating::consolidate(&reviews))
    }
}
