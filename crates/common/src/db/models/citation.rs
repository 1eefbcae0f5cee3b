//! Citation entity
//!
//! External bibliographic records. `doi` and `arxiv_id` carry partial
//! unique indexes; duplicate creation surfaces as `DuplicateCitation`.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Cited-work author list stored as JSONB
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CitationAuthorList(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", nullable, unique)]
    pub doi: Option<String>,

    #[sea_orm(column_type = "Text", nullable, unique)]
    pub arxiv_id: Option<String>,

    /// journal | conference | preprint | book | other
    #[sea_orm(column_type = "Text")]
    pub citation_type: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub authors: CitationAuthorList,

    pub publication_year: Option<i32>,

    pub total_citations: i32,

    pub is_verified: bool,

    pub has_full_text: bool,

    /// Bounded 0-100, recomputed from the fields above
    pub quality_score: i16,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::citation_link::Entity")]
    Links,
}

impl Related<super::citation_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
