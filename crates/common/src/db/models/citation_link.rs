//! Citation-to-paper link entity
//!
//! Unique on (citation_id, paper_id); the second link attempt for a pair
//! surfaces as `DuplicateLink`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citation_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub citation_id: Uuid,

    pub paper_id: Uuid,

    /// Sentence or passage where the work is cited
    #[sea_orm(column_type = "Text", nullable)]
    pub context: Option<String>,

    /// Free-text relevance note
    #[sea_orm(column_type = "Text", nullable)]
    pub relevance: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::citation::Entity",
        from = "Column::CitationId",
        to = "super::citation::Column::Id",
        on_delete = "Cascade"
    )]
    Citation,

    #[sea_orm(
        belongs_to = "super::paper::Entity",
        from = "Column::PaperId",
        to = "super::paper::Column::Id",
        on_delete = "Cascade"
    )]
    Paper,
}

impl Related<super::citation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Citation.def()
    }
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Paper.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
