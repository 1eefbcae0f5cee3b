//! Paper Lifecycle Manager
//!
//! Owns the paper state machine, versioning (forks), and review-progress
//! bookkeeping. Editorial decisions are explicit operations here; nothing
//! advances a paper's status automatically.

pub mod transitions;

use chrono::Utc;
use reviewflow_common::auth::CallerContext;
use reviewflow_common::db::models::{
    AuthorList, ChangeLog, Paper, PaperActiveModel, PaperAuthor, PaperStatus,
};
use reviewflow_common::db::Repository;
use reviewflow_common::errors::{AppError, Result};
use reviewflow_common::metrics::METRICS_PREFIX;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Input for creating the first version of a paper
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaperInput {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(min = 1, max = 50000))]
    pub abstract_text: String,

    #[validate(length(min = 1, max = 200))]
    pub research_area: String,

    pub methodology: Option<String>,

    #[validate(length(min = 1))]
    pub authors: Vec<PaperAuthor>,

    /// Defaults to the caller
    pub corresponding_author_id: Option<Uuid>,
}

/// Partial update applied while a paper is editable
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PaperPatch {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 50000))]
    pub abstract_text: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub research_area: Option<String>,

    pub methodology: Option<String>,

    pub authors: Option<Vec<PaperAuthor>>,
}

impl PaperPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.abstract_text.is_none()
            && self.research_area.is_none()
            && self.methodology.is_none()
            && self.authors.is_none()
    }
}

/// Editorial decision closing a review round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorialDecision {
    Accept,
    Reject,
    RequestRevision,
}

impl EditorialDecision {
    fn target_status(&self) -> PaperStatus {
        match self {
            EditorialDecision::Accept => PaperStatus::Accepted,
            EditorialDecision::Reject => PaperStatus::Rejected,
            EditorialDecision::RequestRevision => PaperStatus::RevisionRequested,
        }
    }
}

/// Paper lifecycle service
#[derive(Clone)]
pub struct PaperService {
    repo: Repository,
}

impl PaperService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Owner gate: the creating author, the corresponding author, or an
    /// admin may mutate a paper.
    fn ensure_owner(caller: &CallerContext, paper: &Paper) -> Result<()> {
        if caller.is_admin()
            || caller.caller_id == paper.created_by
            || caller.caller_id == paper.corresponding_author_id
        {
            Ok(())
        } else {
            Err(AppError::NotOwner {
                caller_id: caller.caller_id.to_string(),
                resource_type: "paper".to_string(),
                id: paper.id.to_string(),
            })
        }
    }

    /// Superseded papers are immutable regardless of status
    fn ensure_not_superseded(paper: &Paper) -> Result<()> {
        if paper.is_superseded() {
            Err(AppError::ImmutablePaper {
                id: paper.id.to_string(),
                status: format!("{} (superseded)", paper.status),
            })
        } else {
            Ok(())
        }
    }

    /// Create version 1 of a new paper in `draft`
    pub async fn create_draft(
        &self,
        caller: &CallerContext,
        input: CreatePaperInput,
    ) -> Result<Paper> {
        input.validate()?;

        let now = Utc::now();
        let paper_id = Uuid::new_v4();
        let corresponding = input.corresponding_author_id.unwrap_or(caller.caller_id);

        let mut change_log = ChangeLog::default();
        change_log.push(caller.caller_id, "created");

        let paper = PaperActiveModel {
            id: Set(paper_id),
            title: Set(input.title),
            abstract_text: Set(input.abstract_text),
            research_area: Set(input.research_area),
            methodology: Set(input.methodology),
            status: Set(PaperStatus::Draft.into()),
            version: Set(1),
            parent_paper_id: Set(None),
            superseded_by: Set(None),
            authors: Set(AuthorList(input.authors)),
            corresponding_author_id: Set(corresponding),
            conference: Set(None),
            track: Set(None),
            submission_date: Set(None),
            review_cycle: Set(1),
            reviews_total: Set(0),
            reviews_completed: Set(0),
            views: Set(0),
            downloads: Set(0),
            citation_count: Set(0),
            change_log: Set(change_log),
            created_by: Set(caller.caller_id),
            lock_version: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let paper = self.repo.insert_paper(paper).await?;

        tracing::info!(
            paper_id = %paper.id,
            caller_id = %caller.caller_id,
            title = %paper.title,
            "Paper draft created"
        );

        Ok(paper)
    }

    /// Submit a paper for review. Resubmission from `revision_requested`
    /// keeps the version but opens a new review cycle.
    pub async fn submit(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        conference: String,
        track: Option<String>,
    ) -> Result<Paper> {
        if conference.trim().is_empty() {
            return Err(AppError::MissingField {
                field: "conference".to_string(),
            });
        }

        let paper = self.repo.get_paper(paper_id).await?;
        Self::ensure_owner(caller, &paper)?;
        Self::ensure_not_superseded(&paper)?;

        let from = paper.paper_status();
        transitions::ensure_legal(&paper.id.to_string(), from, PaperStatus::Submitted)?;

        let now = Utc::now();
        let resubmission = from == PaperStatus::RevisionRequested;

        let mut change_log = paper.change_log.clone();
        change_log.push(
            caller.caller_id,
            format!("submitted to {}", conference),
        );

        let mut changes = PaperActiveModel {
            id: Set(paper.id),
            status: Set(PaperStatus::Submitted.into()),
            conference: Set(Some(conference)),
            track: Set(track),
            submission_date: Set(Some(now.into())),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        if resubmission {
            changes.review_cycle = Set(paper.review_cycle + 1);
            changes.reviews_total = Set(0);
            changes.reviews_completed = Set(0);
        }

        let paper = self
            .repo
            .update_paper_guarded(paper.id, paper.lock_version, changes)
            .await?;

        metrics::counter!(format!("{}_papers_submitted_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            paper_id = %paper.id,
            cycle = paper.review_cycle,
            resubmission,
            "Paper submitted"
        );

        Ok(paper)
    }

    /// Edit an editable paper. `expected_version` is the `lock_version`
    /// the caller last read; a stale value fails with `Conflict`.
    pub async fn edit(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        patch: PaperPatch,
        expected_version: i32,
    ) -> Result<Paper> {
        patch.validate()?;

        if patch.is_empty() {
            return Err(AppError::Validation {
                message: "Patch contains no fields".to_string(),
                field: None,
            });
        }

        let paper = self.repo.get_paper(paper_id).await?;
        Self::ensure_owner(caller, &paper)?;
        Self::ensure_not_superseded(&paper)?;

        let status = paper.paper_status();
        if !status.is_editable() {
            return Err(if status.is_terminal() {
                AppError::ImmutablePaper {
                    id: paper.id.to_string(),
                    status: paper.status.clone(),
                }
            } else {
                AppError::InvalidState {
                    status: paper.status.clone(),
                    message: "Papers cannot be edited while in review".to_string(),
                }
            });
        }

        let mut change_log = paper.change_log.clone();
        change_log.push(caller.caller_id, "edited");

        let changes = PaperActiveModel {
            id: Set(paper.id),
            title: patch.title.map_or(NotSet, Set),
            abstract_text: patch.abstract_text.map_or(NotSet, Set),
            research_area: patch.research_area.map_or(NotSet, Set),
            methodology: patch.methodology.map_or(NotSet, |m| Set(Some(m))),
            authors: patch.authors.map_or(NotSet, |a| Set(AuthorList(a))),
            change_log: Set(change_log),
            lock_version: Set(expected_version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.repo
            .update_paper_guarded(paper.id, expected_version, changes)
            .await
    }

    /// Fork a new version. The parent is marked superseded in the same
    /// transaction and never mutates again; it stays queryable for
    /// provenance.
    pub async fn fork(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        changes_description: String,
    ) -> Result<Paper> {
        if changes_description.trim().is_empty() {
            return Err(AppError::MissingField {
                field: "changes_description".to_string(),
            });
        }

        let parent = self.repo.get_paper(paper_id).await?;
        Self::ensure_owner(caller, &parent)?;
        Self::ensure_not_superseded(&parent)?;

        let status = parent.paper_status();
        if !matches!(status, PaperStatus::Draft | PaperStatus::RevisionRequested) {
            return Err(AppError::InvalidState {
                status: parent.status.clone(),
                message: "Only drafts and revision-requested papers can be forked".to_string(),
            });
        }

        let now = Utc::now();
        let child_id = Uuid::new_v4();

        let mut child_log = ChangeLog::default();
        child_log.push(
            caller.caller_id,
            format!("forked from version {}: {}", parent.version, changes_description),
        );

        let child = PaperActiveModel {
            id: Set(child_id),
            title: Set(parent.title.clone()),
            abstract_text: Set(parent.abstract_text.clone()),
            research_area: Set(parent.research_area.clone()),
            methodology: Set(parent.methodology.clone()),
            status: Set(PaperStatus::Draft.into()),
            version: Set(parent.version + 1),
            parent_paper_id: Set(Some(parent.id)),
            superseded_by: Set(None),
            authors: Set(parent.authors.clone()),
            corresponding_author_id: Set(parent.corresponding_author_id),
            conference: Set(None),
            track: Set(None),
            submission_date: Set(None),
            review_cycle: Set(1),
            reviews_total: Set(0),
            reviews_completed: Set(0),
            views: Set(0),
            downloads: Set(0),
            citation_count: Set(0),
            change_log: Set(child_log),
            created_by: Set(parent.created_by),
            lock_version: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let mut parent_log = parent.change_log.clone();
        parent_log.push(caller.caller_id, format!("superseded by version {}", parent.version + 1));

        let parent_changes = PaperActiveModel {
            id: Set(parent.id),
            superseded_by: Set(Some(child_id)),
            change_log: Set(parent_log),
            lock_version: Set(parent.lock_version + 1),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let child = self
            .repo
            .fork_paper(parent.id, parent.lock_version, parent_changes, child)
            .await?;

        metrics::counter!(format!("{}_papers_forked_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            parent_id = %parent.id,
            child_id = %child.id,
            version = child.version,
            "Paper forked"
        );

        Ok(child)
    }

    /// Delete a paper that has not left the editable states
    pub async fn delete(&self, caller: &CallerContext, paper_id: Uuid) -> Result<()> {
        let paper = self.repo.get_paper(paper_id).await?;
        Self::ensure_owner(caller, &paper)?;

        if paper.is_superseded() || !paper.paper_status().is_editable() {
            return Err(AppError::ImmutablePaper {
                id: paper.id.to_string(),
                status: paper.status.clone(),
            });
        }

        self.repo.delete_paper(paper.id).await?;

        tracing::info!(paper_id = %paper.id, caller_id = %caller.caller_id, "Paper deleted");
        Ok(())
    }

    /// Record an editorial decision on a paper under review. Consumes the
    /// aggregated review data as input; this engine never takes the
    /// decision automatically.
    pub async fn decide(
        &self,
        caller: &CallerContext,
        paper_id: Uuid,
        decision: EditorialDecision,
    ) -> Result<Paper> {
        caller.require_editor()?;

        let paper = self.repo.get_paper(paper_id).await?;
        Self::ensure_not_superseded(&paper)?;

        let target = decision.target_status();
        transitions::ensure_legal(&paper.id.to_string(), paper.paper_status(), target)?;

        let mut change_log = paper.change_log.clone();
        change_log.push(caller.caller_id, format!("decision: {}", target.as_str()));

        let changes = PaperActiveModel {
            id: Set(paper.id),
            status: Set(target.into()),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let paper = self
            .repo
            .update_paper_guarded(paper.id, paper.lock_version, changes)
            .await?;

        metrics::counter!(
            format!("{}_paper_decisions_total", METRICS_PREFIX),
            "decision" => target.as_str()
        )
        .increment(1);

        tracing::info!(paper_id = %paper.id, decision = target.as_str(), "Editorial decision recorded");

        Ok(paper)
    }

    /// Publish an accepted paper
    pub async fn publish(&self, caller: &CallerContext, paper_id: Uuid) -> Result<Paper> {
        caller.require_editor()?;

        let paper = self.repo.get_paper(paper_id).await?;
        Self::ensure_not_superseded(&paper)?;
        transitions::ensure_legal(
            &paper.id.to_string(),
            paper.paper_status(),
            PaperStatus::Published,
        )?;

        let mut change_log = paper.change_log.clone();
        change_log.push(caller.caller_id, "published");

        let changes = PaperActiveModel {
            id: Set(paper.id),
            status: Set(PaperStatus::Published.into()),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.repo
            .update_paper_guarded(paper.id, paper.lock_version, changes)
            .await
    }

    /// Build the paper-side bookkeeping for a completed review. Committed
    /// by the repository in the same transaction as the review update;
    /// deliberately leaves `status` untouched.
    pub fn record_review_completion(&self, paper: &Paper, review_id: Uuid) -> PaperActiveModel {
        let mut change_log = paper.change_log.clone();
        change_log.push(paper.corresponding_author_id, format!("review {} completed", review_id));

        PaperActiveModel {
            id: Set(paper.id),
            reviews_completed: Set(paper.reviews_completed + 1),
            change_log: Set(change_log),
            lock_version: Set(paper.lock_version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
    }

    /// Monotonic view counter, owned here rather than by read paths
    pub async fn record_view(&self, paper_id: Uuid) -> Result<()> {
        self.repo.increment_paper_views(paper_id).await
    }

    /// Monotonic download counter
    pub async fn record_download(&self, paper_id: Uuid) -> Result<()> {
        self.repo.increment_paper_downloads(paper_id).await
    }

    /// Review progress (completed, total) for the paper's current cycle
    pub async fn review_progress(&self, paper_id: Uuid) -> Result<(i32, i32)> {
        let paper = self.repo.get_paper(paper_id).await?;
        Ok(paper.review_progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_targets() {
        assert_eq!(
            EditorialDecision::Accept.target_status(),
            PaperStatus::Accepted
        );
        assert_eq!(
            EditorialDecision::Reject.target_status(),
            PaperStatus::Rejected
        );
        assert_eq!(
            EditorialDecision::RequestRevision.target_status(),
            PaperStatus::RevisionRequested
        );
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(PaperPatch::default().is_empty());
        let patch = PaperPatch {
            title: Some("New title".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
