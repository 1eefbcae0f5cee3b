//! SeaORM entity models
//!
//! Normalized aggregates for the peer-review workflow: papers and reviews
//! are separate entities joined by the (paper_id, reviewer_id, cycle) key.

mod citation;
mod citation_link;
mod paper;
mod review;
mod reviewer_profile;

pub use paper::{
    Entity as PaperEntity,
    Model as Paper,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
    AuthorList, ChangeLog, ChangeLogEntry, PaperAuthor, PaperStatus,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
    CategoryScore, CommentList, RatingSet, Recommendation, RecommendationDecision,
    ReviewComment, ReviewStatus,
};

pub use reviewer_profile::{
    Entity as ReviewerProfileEntity,
    Model as ReviewerProfile,
    ActiveModel as ReviewerProfileActiveModel,
    Column as ReviewerProfileColumn,
    StringList,
};

pub use citation::{
    Entity as CitationEntity,
    Model as Citation,
    ActiveModel as CitationActiveModel,
    Column as CitationColumn,
    CitationAuthorList,
};

pub use citation_link::{
    Entity as CitationLinkEntity,
    Model as CitationLink,
    ActiveModel as CitationLinkActiveModel,
    Column as CitationLinkColumn,
};
