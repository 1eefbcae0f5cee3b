//! Review entity
//!
//! One row is both the reviewer assignment and the evaluation itself,
//! keyed by (paper_id, reviewer_id, cycle). The storage layer enforces a
//! unique index on that triple; concurrent assignment losers surface as
//! `AlreadyAssigned`.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Review lifecycle status
///
/// `late` is intentionally absent: lateness is derived from `due_date`
/// at query time, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Assigned,
    InProgress,
    Completed,
    Withdrawn,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Assigned => "assigned",
            ReviewStatus::InProgress => "in_progress",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Withdrawn => "withdrawn",
        }
    }

    /// Still counting toward the reviewer's load
    pub fn is_active(&self) -> bool {
        matches!(self, ReviewStatus::Assigned | ReviewStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Completed | ReviewStatus::Withdrawn)
    }
}

impl From<String> for ReviewStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "assigned" => ReviewStatus::Assigned,
            "in_progress" => ReviewStatus::InProgress,
            "completed" => ReviewStatus::Completed,
            "withdrawn" => ReviewStatus::Withdrawn,
            _ => ReviewStatus::Assigned,
        }
    }
}

impl From<ReviewStatus> for String {
    fn from(status: ReviewStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Score and free-text comment for one rating category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// 1-5
    pub score: u8,
    #[serde(default)]
    pub comment: String,
}

/// The five-category rating set stored as JSONB
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct RatingSet {
    pub originality: Option<CategoryScore>,
    pub significance: Option<CategoryScore>,
    pub technical_quality: Option<CategoryScore>,
    pub clarity: Option<CategoryScore>,
    pub overall: Option<CategoryScore>,
}

impl RatingSet {
    /// Iterate over whichever categories are present
    pub fn present(&self) -> impl Iterator<Item = &CategoryScore> {
        [
            self.originality.as_ref(),
            self.significance.as_ref(),
            self.technical_quality.as_ref(),
            self.clarity.as_ref(),
            self.overall.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// All five categories present
    pub fn is_complete(&self) -> bool {
        self.present().count() == crate::RATING_CATEGORY_COUNT
    }

    /// Every present score within 1-5
    pub fn scores_in_bounds(&self) -> bool {
        self.present().all(|c| (1..=5).contains(&c.score))
    }

    /// Mean of the five category scores; defined only for a complete set
    pub fn average(&self) -> Option<f64> {
        if !self.is_complete() {
            return None;
        }
        let sum: u32 = self.present().map(|c| u32::from(c.score)).sum();
        Some(f64::from(sum) / crate::RATING_CATEGORY_COUNT as f64)
    }

    /// Overlay the categories present in `partial` onto this set
    pub fn merge(&mut self, partial: RatingSet) {
        if partial.originality.is_some() {
            self.originality = partial.originality;
        }
        if partial.significance.is_some() {
            self.significance = partial.significance;
        }
        if partial.technical_quality.is_some() {
            self.technical_quality = partial.technical_quality;
        }
        if partial.clarity.is_some() {
            self.clarity = partial.clarity;
        }
        if partial.overall.is_some() {
            self.overall = partial.overall;
        }
    }
}

/// Reviewer's overall recommendation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationDecision {
    Accept,
    MinorRevision,
    MajorRevision,
    Reject,
}

impl RecommendationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationDecision::Accept => "accept",
            RecommendationDecision::MinorRevision => "minor_revision",
            RecommendationDecision::MajorRevision => "major_revision",
            RecommendationDecision::Reject => "reject",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Recommendation {
    pub decision: RecommendationDecision,

    /// Reviewer confidence, 1-5
    pub confidence: u8,

    #[serde(default)]
    pub rationale: String,
}

/// One inline comment attached to a section of the paper
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub section: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Additive comment list stored as JSONB
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CommentList(pub Vec<ReviewComment>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub paper_id: Uuid,

    pub reviewer_id: Uuid,

    pub assigned_by: Uuid,

    /// Matches paper.review_cycle at assignment time
    pub cycle: i32,

    pub is_blind: bool,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub assigned_at: DateTimeWithTimeZone,

    pub due_date: DateTimeWithTimeZone,

    pub completed_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "JsonBinary")]
    pub rating: RatingSet,

    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub recommendation: Option<Recommendation>,

    /// Mean of the five category scores; set on submission
    pub average_rating: Option<f64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub decline_reason: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub comments: CommentList,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the review status as an enum
    pub fn review_status(&self) -> ReviewStatus {
        ReviewStatus::from(self.status.clone())
    }

    /// Derived lateness: active and past due at `now`
    pub fn is_late(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.review_status().is_active() && self.due_date < now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::paper::Entity",
        from = "Column::PaperId",
        to = "super::paper::Column::Id",
        on_delete = "Cascade"
    )]
    Paper,
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Paper.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(n: u8) -> Option<CategoryScore> {
        Some(CategoryScore {
            score: n,
            comment: String::new(),
        })
    }

    #[test]
    fn test_average_requires_complete_set() {
        let mut rating = RatingSet {
            originality: score(4),
            significance: score(4),
            technical_quality: score(4),
            clarity: score(4),
            overall: None,
        };
        assert!(!rating.is_complete());
        assert_eq!(rating.average(), None);

        rating.overall = score(4);
        assert!(rating.is_complete());
        assert_eq!(rating.average(), Some(4.0));
    }

    #[test]
    fn test_average_mixed_scores() {
        let rating = RatingSet {
            originality: score(5),
            significance: score(4),
            technical_quality: score(3),
            clarity: score(4),
            overall: score(4),
        };
        assert_eq!(rating.average(), Some(4.0));
    }

    #[test]
    fn test_merge_overlays_only_present_categories() {
        let mut rating = RatingSet {
            originality: score(2),
            ..Default::default()
        };
        rating.merge(RatingSet {
            originality: score(5),
            clarity: score(3),
            ..Default::default()
        });
        assert_eq!(rating.originality.as_ref().unwrap().score, 5);
        assert_eq!(rating.clarity.as_ref().unwrap().score, 3);
        assert!(rating.significance.is_none());
    }

    #[test]
    fn test_score_bounds() {
        let rating = RatingSet {
            originality: score(6),
            ..Default::default()
        };
        assert!(!rating.scores_in_bounds());
    }

    #[test]
    fn test_lateness_is_derived() {
        let now = chrono::Utc::now();
        let mut review = Model {
            id: Uuid::new_v4(),
            paper_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            assigned_by: Uuid::new_v4(),
            cycle: 1,
            is_blind: false,
            status: ReviewStatus::Assigned.as_str().to_string(),
            assigned_at: now.into(),
            due_date: (now - chrono::Duration::days(1)).into(),
            completed_at: None,
            rating: RatingSet::default(),
            summary: None,
            recommendation: None,
            average_rating: None,
            decline_reason: None,
            comments: CommentList::default(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        assert!(review.is_late(now));

        review.status = ReviewStatus::Completed.as_str().to_string();
        assert!(!review.is_late(now));

        review.status = ReviewStatus::InProgress.as_str().to_string();
        review.due_date = (now + chrono::Duration::days(1)).into();
        assert!(!review.is_late(now));
    }
}
