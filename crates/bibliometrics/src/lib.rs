//! ReviewFlow bibliometrics
//!
//! Pure bibliometric computations (h-index, citation quality scoring) and
//! the citation service: duplicate-gated creation and citation-to-paper
//! linking.

pub mod citations;
pub mod hindex;
pub mod quality;

pub use citations::{CitationService, CreateCitationInput};
pub use hindex::h_index;
pub use quality::quality_score;
