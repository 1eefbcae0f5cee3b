//! Citation quality scoring
//!
//! Aggregates verification status, full-text availability and citation
//! volume into a bounded 0-100 score, monotonic in each input.

/// Points awarded for a verified citation record
const VERIFIED_POINTS: f64 = 20.0;

/// Points awarded when the full text is available
const FULL_TEXT_POINTS: f64 = 15.0;

/// Cap on the citation-volume component
const CITATION_POINTS_MAX: f64 = 65.0;

/// Compute the bounded quality score of a citation.
///
/// The citation component grows with log10(1 + n) so heavily cited works
/// saturate instead of dominating; the three components sum to at most
/// 100.
pub fn quality_score(is_verified: bool, has_full_text: bool, total_citations: u32) -> u8 {
    let mut score = 0.0;

    if is_verified {
        score += VERIFIED_POINTS;
    }
    if has_full_text {
        score += FULL_TEXT_POINTS;
    }

    let citation_component = (f64::from(total_citations) + 1.0).log10() * 26.0;
    score += citation_component.min(CITATION_POINTS_MAX);

    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(quality_score(false, false, 0), 0);
        assert_eq!(quality_score(true, true, u32::MAX), 100);
    }

    #[test]
    fn test_monotonic_in_verification() {
        for citations in [0, 10, 1000] {
            assert!(
                quality_score(true, false, citations) > quality_score(false, false, citations)
            );
        }
    }

    #[test]
    fn test_monotonic_in_full_text() {
        for citations in [0, 10, 1000] {
            assert!(
                quality_score(false, true, citations) > quality_score(false, false, citations)
            );
        }
    }

    #[test]
    fn test_monotonic_in_citations() {
        let mut last = quality_score(false, false, 0);
        for citations in [1, 10, 100, 1000, 100_000] {
            let next = quality_score(false, false, citations);
            assert!(next >= last, "{} citations scored below fewer", citations);
            last = next;
        }
    }

    #[test]
    fn test_citation_component_saturates() {
        // Beyond the cap, more citations stop adding points
        assert_eq!(
            quality_score(false, false, 1_000_000),
            quality_score(false, false, 100_000_000)
        );
    }
}
