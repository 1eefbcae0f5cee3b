//! Citation service
//!
//! Duplicate-gated citation creation and citation-to-paper linking. The
//! duplicate checks run once against the read model and again as unique
//! indexes at the storage layer, so concurrent creators cannot slip a
//! second record through.

use chrono::Utc;
use regex_lite::Regex;
use reviewflow_common::auth::CallerContext;
use reviewflow_common::db::models::{
    Citation, CitationActiveModel, CitationAuthorList, CitationLink, CitationLinkActiveModel,
};
use reviewflow_common::db::Repository;
use reviewflow_common::errors::{AppError, Result};
use reviewflow_common::metrics::METRICS_PREFIX;
use sea_orm::Set;
use serde::Deserialize;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::Validate;

use crate::quality::quality_score;

const CITATION_TYPES: &[&str] = &["journal", "conference", "preprint", "book", "other"];

fn doi_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^10\.\d+(\.\d+)*/\S+$").expect("static pattern"))
}

fn arxiv_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").expect("static pattern"))
}

/// Input for creating a citation record
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCitationInput {
    pub doi: Option<String>,

    pub arxiv_id: Option<String>,

    /// journal | conference | preprint | book | other
    pub citation_type: String,

    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    pub publication_year: Option<i32>,

    #[serde(default)]
    pub total_citations: u32,

    #[serde(default)]
    pub is_verified: bool,

    #[serde(default)]
    pub has_full_text: bool,
}

impl CreateCitationInput {
    fn validate_identifiers(&self) -> Result<()> {
        if let Some(ref doi) = self.doi {
            if !doi_pattern().is_match(doi) {
                return Err(AppError::InvalidFormat {
                    message: format!("'{}' is not a valid DOI", doi),
                });
            }
        }

        if let Some(ref arxiv_id) = self.arxiv_id {
            if !arxiv_pattern().is_match(arxiv_id) {
                return Err(AppError::InvalidFormat {
                    message: format!("'{}' is not a valid arXiv id", arxiv_id),
                });
            }
        }

        if !CITATION_TYPES.contains(&self.citation_type.as_str()) {
            return Err(AppError::Validation {
                message: format!("Unknown citation type '{}'", self.citation_type),
                field: Some("citation_type".to_string()),
            });
        }

        Ok(())
    }
}

/// Citation management service
#[derive(Clone)]
pub struct CitationService {
    repo: Repository,
}

impl CitationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a citation record.
    ///
    /// Rejects with `DuplicateCitation` when an existing record shares a
    /// non-null doi or arxiv_id; the unique indexes catch whatever the
    /// pre-check races past.
    pub async fn create(
        &self,
        caller: &CallerContext,
        input: CreateCitationInput,
    ) -> Result<Citation> {
        input.validate()?;
        input.validate_identifiers()?;

        if let Some(existing) = self
            .repo
            .find_citation_by_identifiers(input.doi.as_deref(), input.arxiv_id.as_deref())
            .await?
        {
            return Err(AppError::DuplicateCitation {
                message: format!(
                    "Citation {} already carries this DOI or arXiv id",
                    existing.id
                ),
            });
        }

        let now = Utc::now();
        let score = quality_score(input.is_verified, input.has_full_text, input.total_citations);

        let citation = CitationActiveModel {
            id: Set(Uuid::new_v4()),
            doi: Set(input.doi),
            arxiv_id: Set(input.arxiv_id),
            citation_type: Set(input.citation_type),
            title: Set(input.title),
            authors: Set(CitationAuthorList(input.authors)),
            publication_year: Set(input.publication_year),
            total_citations: Set(input.total_citations as i32),
            is_verified: Set(input.is_verified),
            has_full_text: Set(input.has_full_text),
            quality_score: Set(i16::from(score)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let citation = self.repo.insert_citation(citation).await?;

        metrics::counter!(format!("{}_citations_created_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            citation_id = %citation.id,
            caller_id = %caller.caller_id,
            title = %citation.title,
            "Citation created"
        );

        Ok(citation)
    }

    /// Link a citation to a paper.
    ///
    /// Rejects with `DuplicateLink` when the pair is already linked; the
    /// link insert and the paper's citation-count bump commit together.
    pub async fn link(
        &self,
        caller: &CallerContext,
        citation_id: Uuid,
        paper_id: Uuid,
        context: Option<String>,
        relevance: Option<String>,
    ) -> Result<CitationLink> {
        // Surface missing entities as NotFound rather than FK errors
        let citation = self.repo.get_citation(citation_id).await?;
        let paper = self.repo.get_paper(paper_id).await?;

        let link = CitationLinkActiveModel {
            id: Set(Uuid::new_v4()),
            citation_id: Set(citation.id),
            paper_id: Set(paper.id),
            context: Set(context),
            relevance: Set(relevance),
            created_at: Set(Utc::now().into()),
        };

        let link = self.repo.link_citation(link, citation.id, paper.id).await?;

        metrics::counter!(format!("{}_citations_linked_total", METRICS_PREFIX)).increment(1);

        tracing::info!(
            citation_id = %citation.id,
            paper_id = %paper.id,
            caller_id = %caller.caller_id,
            "Citation linked to paper"
        );

        Ok(link)
    }

    /// Links attached to a paper (its reference list)
    pub async fn links_for_paper(&self, paper_id: Uuid) -> Result<Vec<CitationLink>> {
        self.repo.list_links_for_paper(paper_id).await
    }

    /// Links attached to a citation (the papers citing it here)
    pub async fn links_for_citation(&self, citation_id: Uuid) -> Result<Vec<CitationLink>> {
        self.repo.list_links_for_citation(citation_id).await
    }

    /// Recompute the stored quality score from the citation's current
    /// verification, full-text and citation-volume fields
    pub async fn refresh_quality(&self, citation_id: Uuid) -> Result<Citation> {
        let citation = self.repo.get_citation(citation_id).await?;

        let score = quality_score(
            citation.is_verified,
            citation.has_full_text,
            citation.total_citations.max(0) as u32,
        );

        let changes = CitationActiveModel {
            id: Set(citation.id),
            quality_score: Set(i16::from(score)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.repo.update_citation(changes).await
    }

    /// h-index over the papers an identity corresponds for
    pub async fn author_h_index(&self, author_id: Uuid) -> Result<usize> {
        let counts: Vec<u32> = self
            .repo
            .citation_counts_for_author(author_id)
            .await?
            .into_iter()
            .map(|c| c.max(0) as u32)
            .collect();

        Ok(crate::hindex::h_index(&counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(doi: Option<&str>, arxiv: Option<&str>) -> CreateCitationInput {
        CreateCitationInput {
            doi: doi.map(String::from),
            arxiv_id: arxiv.map(String::from),
            citation_type: "journal".to_string(),
            title: "An Important Result".to_string(),
            authors: vec!["A. Author".to_string()],
            publication_year: Some(2024),
            total_citations: 12,
            is_verified: true,
            has_full_text: false,
        }
    }

    #[test]
    fn test_doi_shapes() {
        assert!(input(Some("10.1000/xyz123"), None).validate_identifiers().is_ok());
        assert!(input(Some("10.1/x"), None).validate_identifiers().is_ok());
        assert!(input(Some("doi:10.1000/x"), None).validate_identifiers().is_err());
        assert!(input(Some("11.1000/x"), None).validate_identifiers().is_err());
    }

    #[test]
    fn test_arxiv_shapes() {
        assert!(input(None, Some("2401.12345")).validate_identifiers().is_ok());
        assert!(input(None, Some("2401.12345v2")).validate_identifiers().is_ok());
        assert!(input(None, Some("abc.12345")).validate_identifiers().is_err());
    }

    #[test]
    fn test_identifiers_optional() {
        assert!(input(None, None).validate_identifiers().is_ok());
    }

    #[test]
    fn test_citation_type_checked() {
        let mut bad = input(None, None);
        bad.citation_type = "blog".to_string();
        assert!(bad.validate_identifiers().is_err());
    }
}
