//! Reviewer profile entity
//!
//! Read model of a person willing (or not) to review. `current_load` is
//! never stored here; the repository derives it from active reviews.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// String list stored as JSONB (review areas, expertise keywords)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Case-insensitive containment: exact entry match or entry/needle
    /// substring in either direction.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0.iter().any(|entry| {
            let entry = entry.to_lowercase();
            entry == needle || entry.contains(&needle) || needle.contains(&entry)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviewer_profiles")]
pub struct Model {
    /// Identity-provider reference
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub full_name: String,

    pub willing_to_review: bool,

    #[sea_orm(column_type = "JsonBinary")]
    pub review_areas: StringList,

    #[sea_orm(column_type = "JsonBinary")]
    pub expertise: StringList,

    pub max_reviews_per_year: i32,

    pub verified: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_matching_is_case_insensitive() {
        let areas = StringList(vec![
            "Machine Learning".to_string(),
            "systems".to_string(),
        ]);
        assert!(areas.matches("machine learning"));
        assert!(areas.matches("SYSTEMS"));
        assert!(!areas.matches("biology"));
    }

    #[test]
    fn test_area_matching_substring() {
        let areas = StringList(vec!["distributed systems".to_string()]);
        assert!(areas.matches("systems"));
        assert!(areas.matches("distributed systems and networks"));
    }
}
