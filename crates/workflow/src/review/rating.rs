//! Review Aggregator
//!
//! Per-review rating validation and averaging, plus consolidation of
//! rating/recommendation data across a paper's completed reviews. Pure
//! functions; the lifecycle services call in here before touching storage.

use reviewflow_common::db::models::{
    CategoryScore, RatingSet, Recommendation, RecommendationDecision, Review, ReviewStatus,
};
use reviewflow_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// A complete five-category rating, required for submission
#[derive(Debug, Clone, Deserialize)]
pub struct FullRating {
    pub originality: CategoryScore,
    pub significance: CategoryScore,
    pub technical_quality: CategoryScore,
    pub clarity: CategoryScore,
    pub overall: CategoryScore,
}

impl FullRating {
    /// Validate every score against the 1-5 scale
    pub fn validate(&self) -> Result<()> {
        for (name, category) in [
            ("originality", &self.originality),
            ("significance", &self.significance),
            ("technical_quality", &self.technical_quality),
            ("clarity", &self.clarity),
            ("overall", &self.overall),
        ] {
            if !(1..=5).contains(&category.score) {
                return Err(AppError::Validation {
                    message: format!("Score for '{}' must be between 1 and 5", name),
                    field: Some(name.to_string()),
                });
            }
        }
        Ok(())
    }

    pub fn into_set(self) -> RatingSet {
        RatingSet {
            originality: Some(self.originality),
            significance: Some(self.significance),
            technical_quality: Some(self.technical_quality),
            clarity: Some(self.clarity),
            overall: Some(self.overall),
        }
    }
}

/// Validate a partial rating (draft save): present scores must be in 1-5
pub fn validate_partial(rating: &RatingSet) -> Result<()> {
    if rating.scores_in_bounds() {
        Ok(())
    } else {
        Err(AppError::Validation {
            message: "Rating scores must be between 1 and 5".to_string(),
            field: Some("rating".to_string()),
        })
    }
}

/// Validate a recommendation: confidence shares the 1-5 scale
pub fn validate_recommendation(recommendation: &Recommendation) -> Result<()> {
    if !(1..=5).contains(&recommendation.confidence) {
        return Err(AppError::Validation {
            message: "Recommendation confidence must be between 1 and 5".to_string(),
            field: Some("confidence".to_string()),
        });
    }
    Ok(())
}

/// Consolidated view of a paper's completed reviews, the input an editor
/// takes a decision from
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewConsolidation {
    pub completed: usize,

    /// Mean of the completed reviews' average ratings
    pub average_rating: Option<f64>,

    pub accept: usize,
    pub minor_revision: usize,
    pub major_revision: usize,
    pub reject: usize,
}

/// Consolidate rating and recommendation data over a set of reviews.
/// Reviews that are not completed are ignored.
pub fn consolidate(reviews: &[Review]) -> ReviewConsolidation {
    let mut summary = ReviewConsolidation::default();
    let mut rating_sum = 0.0;
    let mut rated = 0usize;

    for review in reviews {
        if review.review_status() != ReviewStatus::Completed {
            continue;
        }
        summary.completed += 1;

        if let Some(avg) = review.average_rating {
            rating_sum += avg;
            rated += 1;
        }

        if let Some(ref recommendation) = review.recommendation {
            match recommendation.decision {
                RecommendationDecision::Accept => summary.accept += 1,
                RecommendationDecision::MinorRevision => summary.minor_revision += 1,
                RecommendationDecision::MajorRevision => summary.major_revision += 1,
                RecommendationDecision::Reject => summary.reject += 1,
            }
        }
    }

    if rated > 0 {
        summary.average_rating = Some(rating_sum / rated as f64);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reviewflow_common::db::models::CommentList;
    use uuid::Uuid;

    fn category(score: u8) -> CategoryScore {
        CategoryScore {
            score,
            comment: String::new(),
        }
    }

    fn full_rating(score: u8) -> FullRating {
        FullRating {
            originality: category(score),
            significance: category(score),
            technical_quality: category(score),
            clarity: category(score),
            overall: category(score),
        }
    }

    fn completed_review(average: f64, decision: RecommendationDecision) -> Review {
        let now = Utc::now();
        Review {
            id: Uuid::new_v4(),
            paper_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            assigned_by: Uuid::new_v4(),
            cycle: 1,
            is_blind: false,
            status: ReviewStatus::Completed.as_str().to_string(),
            assigned_at: now.into(),
            due_date: now.into(),
            completed_at: Some(now.into()),
            rating: full_rating(4).into_set(),
            summary: Some("solid work".to_string()),
            recommendation: Some(Recommendation {
                decision,
                confidence: 4,
                rationale: String::new(),
            }),
            average_rating: Some(average),
            decline_reason: None,
            comments: CommentList::default(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_full_rating_average() {
        let set = full_rating(4).into_set();
        assert_eq!(set.average(), Some(4.0));
    }

    #[test]
    fn test_full_rating_bounds() {
        assert!(full_rating(5).validate().is_ok());
        assert!(full_rating(0).validate().is_err());
        assert!(full_rating(6).validate().is_err());
    }

    #[test]
    fn test_partial_validation() {
        let partial = RatingSet {
            clarity: Some(category(3)),
            ..Default::default()
        };
        assert!(validate_partial(&partial).is_ok());

        let bad = RatingSet {
            clarity: Some(category(9)),
            ..Default::default()
        };
        assert!(validate_partial(&bad).is_err());
    }

    #[test]
    fn test_recommendation_confidence_bounds() {
        let mut rec = Recommendation {
            decision: RecommendationDecision::Accept,
            confidence: 3,
            rationale: String::new(),
        };
        assert!(validate_recommendation(&rec).is_ok());

        rec.confidence = 0;
        assert!(validate_recommendation(&rec).is_err());
    }

    #[test]
    fn test_consolidation() {
        let reviews = vec![
            completed_review(4.0, RecommendationDecision::Accept),
            completed_review(3.0, RecommendationDecision::Accept),
            completed_review(2.0, RecommendationDecision::MajorRevision),
        ];

        let summary = consolidate(&reviews);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.accept, 2);
        assert_eq!(summary.major_revision, 1);
        assert_eq!(summary.average_rating, Some(3.0));
    }

    #[test]
    fn test_consolidation_skips_active_reviews() {
        let mut active = completed_review(4.0, RecommendationDecision::Accept);
        active.status = ReviewStatus::InProgress.as_str().to_string();

        let summary = consolidate(&[active]);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.average_rating, None);
    }
}
