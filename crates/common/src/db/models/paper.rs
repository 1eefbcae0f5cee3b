//! Paper entity
//!
//! One row is one version of one submission. Forked versions are separate
//! rows linked through `parent_paper_id`; a superseded parent is never
//! mutated again.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Paper lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    RevisionRequested,
    Published,
}

impl PaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStatus::Draft => "draft",
            PaperStatus::Submitted => "submitted",
            PaperStatus::UnderReview => "under_review",
            PaperStatus::Accepted => "accepted",
            PaperStatus::Rejected => "rejected",
            PaperStatus::RevisionRequested => "revision_requested",
            PaperStatus::Published => "published",
        }
    }

    /// Terminal for this version: no further transitions except
    /// accepted -> published
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaperStatus::Accepted | PaperStatus::Rejected | PaperStatus::Published
        )
    }

    /// States in which the owning author may edit or delete the paper
    pub fn is_editable(&self) -> bool {
        matches!(self, PaperStatus::Draft | PaperStatus::RevisionRequested)
    }
}

impl From<String> for PaperStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => PaperStatus::Draft,
            "submitted" => PaperStatus::Submitted,
            "under_review" => PaperStatus::UnderReview,
            "accepted" => PaperStatus::Accepted,
            "rejected" => PaperStatus::Rejected,
            "revision_requested" => PaperStatus::RevisionRequested,
            "published" => PaperStatus::Published,
            _ => PaperStatus::Draft,
        }
    }
}

impl From<PaperStatus> for String {
    fn from(status: PaperStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One entry in the ordered author list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperAuthor {
    pub name: String,

    /// Identity reference when the author has an account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<Uuid>,

    #[serde(default)]
    pub is_corresponding: bool,
}

/// Ordered author list stored as JSONB
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AuthorList(pub Vec<PaperAuthor>);

/// One append-only change-log entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub at: chrono::DateTime<chrono::Utc>,
    pub by: Uuid,
    pub note: String,
}

/// Append-only change log stored as JSONB
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ChangeLog(pub Vec<ChangeLogEntry>);

impl ChangeLog {
    pub fn push(&mut self, by: Uuid, note: impl Into<String>) {
        self.0.push(ChangeLogEntry {
            at: chrono::Utc::now(),
            by,
            note: note.into(),
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub abstract_text: String,

    #[sea_orm(column_type = "Text")]
    pub research_area: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub methodology: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    /// Version number; a forked child is exactly parent.version + 1
    pub version: i32,

    /// Immediately prior version, if any
    pub parent_paper_id: Option<Uuid>,

    /// Set when a newer version has been forked from this row
    pub superseded_by: Option<Uuid>,

    #[sea_orm(column_type = "JsonBinary")]
    pub authors: AuthorList,

    pub corresponding_author_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub conference: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub track: Option<String>,

    pub submission_date: Option<DateTimeWithTimeZone>,

    /// Current review round; bumped on resubmission
    pub review_cycle: i32,

    /// Assignments still counting toward the current cycle
    pub reviews_total: i32,

    /// Completed reviews in the current cycle
    pub reviews_completed: i32,

    pub views: i64,

    pub downloads: i64,

    pub citation_count: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub change_log: ChangeLog,

    pub created_by: Uuid,

    /// Optimistic concurrency guard; bumped on every mutation
    pub lock_version: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the paper status as an enum
    pub fn paper_status(&self) -> PaperStatus {
        PaperStatus::from(self.status.clone())
    }

    /// A superseded paper is immutable regardless of status
    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }

    /// Check whether the owning author may still mutate this row
    pub fn is_editable(&self) -> bool {
        !self.is_superseded() && self.paper_status().is_editable()
    }

    /// Review progress for the current cycle: (completed, total)
    pub fn review_progress(&self) -> (i32, i32) {
        (self.reviews_completed, self.reviews_total)
    }

    /// Progress as a fraction; 0.0 when nothing is assigned
    pub fn progress_fraction(&self) -> f64 {
        if self.reviews_total == 0 {
            0.0
        } else {
            self.reviews_completed as f64 / self.reviews_total as f64
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,

    #[sea_orm(has_many = "super::citation_link::Entity")]
    CitationLinks,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::citation_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CitationLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            PaperStatus::Draft,
            PaperStatus::Submitted,
            PaperStatus::UnderReview,
            PaperStatus::Accepted,
            PaperStatus::Rejected,
            PaperStatus::RevisionRequested,
            PaperStatus::Published,
        ] {
            let text: String = status.into();
            assert_eq!(PaperStatus::from(text), status);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(PaperStatus::Accepted.is_terminal());
        assert!(PaperStatus::Rejected.is_terminal());
        assert!(PaperStatus::Published.is_terminal());
        assert!(!PaperStatus::UnderReview.is_terminal());
        assert!(!PaperStatus::RevisionRequested.is_terminal());
    }

    #[test]
    fn test_editable_states() {
        assert!(PaperStatus::Draft.is_editable());
        assert!(PaperStatus::RevisionRequested.is_editable());
        assert!(!PaperStatus::Submitted.is_editable());
        assert!(!PaperStatus::Published.is_editable());
    }

    #[test]
    fn test_change_log_appends() {
        let mut log = ChangeLog::default();
        let author = Uuid::new_v4();
        log.push(author, "initial draft");
        log.push(author, "revised abstract");
        assert_eq!(log.0.len(), 2);
        assert_eq!(log.0[1].note, "revised abstract");
    }
}
