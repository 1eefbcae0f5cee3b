//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling and transaction support. Cross-aggregate operations
//! (assignment, completion, fork, decline) commit in one transaction;
//! paper mutations are guarded by a `lock_version` compare-and-swap.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Active-review count for one reviewer, derived at query time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerLoad {
    pub reviewer_id: Uuid,
    pub active_reviews: i64,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Insert a new paper row
    pub async fn insert_paper(&self, paper: PaperActiveModel) -> Result<Paper> {
        paper.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find paper by ID
    pub async fn find_paper_by_id(&self, id: Uuid) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find paper by ID or fail with PaperNotFound
    pub async fn get_paper(&self, id: Uuid) -> Result<Paper> {
        self.find_paper_by_id(id)
            .await?
            .ok_or_else(|| AppError::PaperNotFound { id: id.to_string() })
    }

    /// Update a paper conditioned on its last-seen lock_version.
    ///
    /// The active model must carry `lock_version = expected + 1`; zero rows
    /// affected means a concurrent writer got there first.
    pub async fn update_paper_guarded(
        &self,
        paper_id: Uuid,
        expected_version: i32,
        changes: PaperActiveModel,
    ) -> Result<Paper> {
        Self::update_paper_guarded_on(self.write_conn(), paper_id, expected_version, changes)
            .await?;
        self.get_paper(paper_id).await
    }

    async fn update_paper_guarded_on<C: ConnectionTrait>(
        conn: &C,
        paper_id: Uuid,
        expected_version: i32,
        changes: PaperActiveModel,
    ) -> Result<()> {
        let result = PaperEntity::update_many()
            .set(changes)
            .filter(PaperColumn::Id.eq(paper_id))
            .filter(PaperColumn::LockVersion.eq(expected_version))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict {
                message: format!(
                    "Paper {} changed since version {} was read",
                    paper_id, expected_version
                ),
            });
        }

        Ok(())
    }

    /// Delete paper by ID (reviews and links cascade)
    pub async fn delete_paper(&self, id: Uuid) -> Result<bool> {
        let result = PaperEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Fork a paper: insert the child version and mark the parent
    /// superseded in one transaction.
    pub async fn fork_paper(
        &self,
        parent_id: Uuid,
        expected_version: i32,
        parent_changes: PaperActiveModel,
        child: PaperActiveModel,
    ) -> Result<Paper> {
        let txn = self.write_conn().begin().await?;

        let child = child.insert(&txn).await?;
        Self::update_paper_guarded_on(&txn, parent_id, expected_version, parent_changes).await?;

        txn.commit().await?;
        Ok(child)
    }

    /// Atomic view-counter bump; deliberately bypasses the CAS since the
    /// counter is monotonic and touches no other field.
    pub async fn increment_paper_views(&self, paper_id: Uuid) -> Result<()> {
        self.increment_counter("views", paper_id).await
    }

    /// Atomic download-counter bump
    pub async fn increment_paper_downloads(&self, paper_id: Uuid) -> Result<()> {
        self.increment_counter("downloads", paper_id).await
    }

    async fn increment_counter(&self, column: &str, paper_id: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "UPDATE papers SET {col} = {col} + 1, updated_at = NOW() WHERE id = $1",
                col = column
            ),
            vec![paper_id.into()],
        );

        let result = self.write_conn().execute(stmt).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::PaperNotFound {
                id: paper_id.to_string(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Review / Assignment Operations
    // ========================================================================

    /// Create a review (the assignment record) and update the paper's
    /// cycle bookkeeping in one transaction.
    ///
    /// The unique index on (paper_id, reviewer_id, cycle) arbitrates
    /// concurrent callers: the loser's insert is rejected and surfaced as
    /// `AlreadyAssigned` without any partial effect.
    pub async fn assign_reviewer(
        &self,
        review: ReviewActiveModel,
        paper_id: Uuid,
        reviewer_id: Uuid,
        cycle: i32,
        expected_version: i32,
        paper_changes: PaperActiveModel,
    ) -> Result<Review> {
        let txn = self.write_conn().begin().await?;

        let review = review.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyAssigned {
                    paper_id: paper_id.to_string(),
                    reviewer_id: reviewer_id.to_string(),
                    cycle,
                }
            } else {
                e.into()
            }
        })?;

        Self::update_paper_guarded_on(&txn, paper_id, expected_version, paper_changes).await?;

        txn.commit().await?;
        Ok(review)
    }

    /// Mark a review completed and record the completion on the paper in
    /// one transaction.
    ///
    /// The review update is guarded on the active statuses; zero rows
    /// affected means another submission won the race.
    pub async fn complete_review(
        &self,
        review_id: Uuid,
        review_changes: ReviewActiveModel,
        paper_id: Uuid,
        expected_version: i32,
        paper_changes: PaperActiveModel,
    ) -> Result<Review> {
        let txn = self.write_conn().begin().await?;

        let result = ReviewEntity::update_many()
            .set(review_changes)
            .filter(ReviewColumn::Id.eq(review_id))
            .filter(ReviewColumn::Status.is_in([
                ReviewStatus::Assigned.as_str(),
                ReviewStatus::InProgress.as_str(),
            ]))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::AlreadySubmitted {
                id: review_id.to_string(),
            });
        }

        Self::update_paper_guarded_on(&txn, paper_id, expected_version, paper_changes).await?;

        txn.commit().await?;
        self.get_review(review_id).await
    }

    /// Withdraw an assigned review (decline) and release the paper-side
    /// slot in one transaction. Guarded on `assigned`: a declined or
    /// started review cannot be declined again.
    pub async fn withdraw_review(
        &self,
        review_id: Uuid,
        review_changes: ReviewActiveModel,
        paper_id: Uuid,
        expected_version: i32,
        paper_changes: PaperActiveModel,
    ) -> Result<Review> {
        let txn = self.write_conn().begin().await?;

        let result = ReviewEntity::update_many()
            .set(review_changes)
            .filter(ReviewColumn::Id.eq(review_id))
            .filter(ReviewColumn::Status.eq(ReviewStatus::Assigned.as_str()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let current = self.get_review(review_id).await?;
            return Err(AppError::InvalidState {
                status: current.status.clone(),
                message: format!("Review {} is no longer in 'assigned'", review_id),
            });
        }

        Self::update_paper_guarded_on(&txn, paper_id, expected_version, paper_changes).await?;

        txn.commit().await?;
        self.get_review(review_id).await
    }

    /// Update a review while it is still active (draft saves, comments).
    ///
    /// Zero rows affected is classified by re-reading the row: completed
    /// reviews are immutable, withdrawn ones reject with InvalidState.
    pub async fn update_review_active(
        &self,
        review_id: Uuid,
        changes: ReviewActiveModel,
    ) -> Result<Review> {
        let result = ReviewEntity::update_many()
            .set(changes)
            .filter(ReviewColumn::Id.eq(review_id))
            .filter(ReviewColumn::Status.is_in([
                ReviewStatus::Assigned.as_str(),
                ReviewStatus::InProgress.as_str(),
            ]))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            let current = self.get_review(review_id).await?;
            return Err(match current.review_status() {
                ReviewStatus::Completed => AppError::ImmutableReview {
                    id: review_id.to_string(),
                },
                status => AppError::InvalidState {
                    status: status.as_str().to_string(),
                    message: format!("Review {} is not active", review_id),
                },
            });
        }

        self.get_review(review_id).await
    }

    /// Find review by ID
    pub async fn find_review_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        ReviewEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find review by ID or fail with ReviewNotFound
    pub async fn get_review(&self, id: Uuid) -> Result<Review> {
        self.find_review_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound { id: id.to_string() })
    }

    /// Find the review for a (paper, reviewer, cycle) triple
    pub async fn find_review_by_key(
        &self,
        paper_id: Uuid,
        reviewer_id: Uuid,
        cycle: i32,
    ) -> Result<Option<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::PaperId.eq(paper_id))
            .filter(ReviewColumn::ReviewerId.eq(reviewer_id))
            .filter(ReviewColumn::Cycle.eq(cycle))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List reviews for a paper, optionally narrowed to one cycle
    pub async fn list_reviews_for_paper(
        &self,
        paper_id: Uuid,
        cycle: Option<i32>,
    ) -> Result<Vec<Review>> {
        let mut query = ReviewEntity::find().filter(ReviewColumn::PaperId.eq(paper_id));

        if let Some(cycle) = cycle {
            query = query.filter(ReviewColumn::Cycle.eq(cycle));
        }

        query
            .order_by_asc(ReviewColumn::AssignedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Whether the reviewer already holds an active assignment for this
    /// paper and cycle
    pub async fn has_active_assignment(
        &self,
        paper_id: Uuid,
        reviewer_id: Uuid,
        cycle: i32,
    ) -> Result<bool> {
        let count = ReviewEntity::find()
            .filter(ReviewColumn::PaperId.eq(paper_id))
            .filter(ReviewColumn::ReviewerId.eq(reviewer_id))
            .filter(ReviewColumn::Cycle.eq(cycle))
            .filter(ReviewColumn::Status.is_in([
                ReviewStatus::Assigned.as_str(),
                ReviewStatus::InProgress.as_str(),
            ]))
            .count(self.read_conn())
            .await?;

        Ok(count > 0)
    }

    /// Derived reviewer load: active reviews not yet past due
    pub async fn count_active_reviews(
        &self,
        reviewer_id: Uuid,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64> {
        let count = ReviewEntity::find()
            .filter(ReviewColumn::ReviewerId.eq(reviewer_id))
            .filter(ReviewColumn::Status.is_in([
                ReviewStatus::Assigned.as_str(),
                ReviewStatus::InProgress.as_str(),
            ]))
            .filter(ReviewColumn::DueDate.gte(sea_orm::prelude::DateTimeWithTimeZone::from(now)))
            .count(self.read_conn())
            .await?;

        Ok(count as i64)
    }

    /// Derived load for every reviewer with at least one active review
    pub async fn reviewer_loads(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<ReviewerLoad>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT reviewer_id, COUNT(*) AS active_reviews
            FROM reviews
            WHERE status IN ('assigned', 'in_progress')
              AND due_date >= $1
            GROUP BY reviewer_id
            "#,
            vec![sea_orm::prelude::DateTimeWithTimeZone::from(now).into()],
        );

        let loads = self
            .read_conn()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(ReviewerLoad {
                    reviewer_id: row.try_get_by_index::<Uuid>(0).ok()?,
                    active_reviews: row.try_get_by_index::<i64>(1).ok()?,
                })
            })
            .collect();

        Ok(loads)
    }

    /// Active reviews past their due date: the derived "late" view
    pub async fn find_overdue_reviews(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        limit: u64,
    ) -> Result<Vec<Review>> {
        ReviewEntity::find()
            .filter(ReviewColumn::Status.is_in([
                ReviewStatus::Assigned.as_str(),
                ReviewStatus::InProgress.as_str(),
            ]))
            .filter(ReviewColumn::DueDate.lt(sea_orm::prelude::DateTimeWithTimeZone::from(now)))
            .order_by_asc(ReviewColumn::DueDate)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Reviewer Profile Operations
    // ========================================================================

    /// Insert a reviewer profile
    pub async fn insert_reviewer_profile(
        &self,
        profile: ReviewerProfileActiveModel,
    ) -> Result<ReviewerProfile> {
        profile.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find reviewer profile by ID
    pub async fn find_reviewer_by_id(&self, id: Uuid) -> Result<Option<ReviewerProfile>> {
        ReviewerProfileEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find reviewer profile by ID or fail with ReviewerNotFound
    pub async fn get_reviewer(&self, id: Uuid) -> Result<ReviewerProfile> {
        self.find_reviewer_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReviewerNotFound { id: id.to_string() })
    }

    /// The matcher's candidate pool: everyone currently willing to review
    pub async fn list_willing_reviewers(&self) -> Result<Vec<ReviewerProfile>> {
        ReviewerProfileEntity::find()
            .filter(ReviewerProfileColumn::WillingToReview.eq(true))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Citation Operations
    // ========================================================================

    /// Insert a citation; the partial unique indexes on doi/arxiv_id are
    /// the backstop behind the service-level duplicate pre-check.
    pub async fn insert_citation(&self, citation: CitationActiveModel) -> Result<Citation> {
        citation.insert(self.write_conn()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateCitation {
                    message: "A citation with this DOI or arXiv id already exists".to_string(),
                }
            } else {
                e.into()
            }
        })
    }

    /// Find citation by ID
    pub async fn find_citation_by_id(&self, id: Uuid) -> Result<Option<Citation>> {
        CitationEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find citation by ID or fail with CitationNotFound
    pub async fn get_citation(&self, id: Uuid) -> Result<Citation> {
        self.find_citation_by_id(id)
            .await?
            .ok_or_else(|| AppError::CitationNotFound { id: id.to_string() })
    }

    /// Find an existing citation sharing either identifier
    pub async fn find_citation_by_identifiers(
        &self,
        doi: Option<&str>,
        arxiv_id: Option<&str>,
    ) -> Result<Option<Citation>> {
        let mut condition = sea_orm::Condition::any();

        if let Some(doi) = doi {
            condition = condition.add(CitationColumn::Doi.eq(doi));
        }
        if let Some(arxiv_id) = arxiv_id {
            condition = condition.add(CitationColumn::ArxivId.eq(arxiv_id));
        }

        if condition.is_empty() {
            return Ok(None);
        }

        CitationEntity::find()
            .filter(condition)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update citation fields (verification, quality score, metrics)
    pub async fn update_citation(&self, citation: CitationActiveModel) -> Result<Citation> {
        citation.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Link a citation to a paper and bump the paper's citation counter in
    /// one transaction. The (citation_id, paper_id) unique index rejects
    /// the second link for a pair.
    pub async fn link_citation(
        &self,
        link: CitationLinkActiveModel,
        citation_id: Uuid,
        paper_id: Uuid,
    ) -> Result<CitationLink> {
        let txn = self.write_conn().begin().await?;

        let link = link.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateLink {
                    citation_id: citation_id.to_string(),
                    paper_id: paper_id.to_string(),
                }
            } else {
                e.into()
            }
        })?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE papers SET citation_count = citation_count + 1, updated_at = NOW() WHERE id = $1",
            vec![paper_id.into()],
        );
        txn.execute(stmt).await?;

        txn.commit().await?;
        Ok(link)
    }

    /// Links attached to a paper
    pub async fn list_links_for_paper(&self, paper_id: Uuid) -> Result<Vec<CitationLink>> {
        CitationLinkEntity::find()
            .filter(CitationLinkColumn::PaperId.eq(paper_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Links attached to a citation
    pub async fn list_links_for_citation(&self, citation_id: Uuid) -> Result<Vec<CitationLink>> {
        CitationLinkEntity::find()
            .filter(CitationLinkColumn::CitationId.eq(citation_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Citation counts of every paper version authored (as corresponding
    /// author) by the given identity; input for the h-index.
    pub async fn citation_counts_for_author(&self, author_id: Uuid) -> Result<Vec<i32>> {
        let papers = PaperEntity::find()
            .filter(PaperColumn::CorrespondingAuthorId.eq(author_id))
            .all(self.read_conn())
            .await?;

        Ok(papers.into_iter().map(|p| p.citation_count).collect())
    }
}
