//! ReviewFlow workflow engine
//!
//! Owns the paper and review state machines, reviewer matching and
//! assignment, and review-score aggregation. Storage guarantees
//! (uniqueness, compare-and-swap, transactions) live in
//! `reviewflow-common::db`; this crate owns the rules about which
//! transitions are legal and who may take them.

pub mod matcher;
pub mod paper;
pub mod review;

pub use matcher::{MatcherService, ReviewerCandidate};
pub use paper::PaperService;
pub use review::ReviewService;
