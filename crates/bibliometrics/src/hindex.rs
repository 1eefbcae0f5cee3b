//! h-index computation
//!
//! The largest `h` such that the author has at least `h` papers with
//! `h` or more citations each.

/// Compute the h-index of a citation-count list.
///
/// Counts are sorted descending; `h` is the largest 1-indexed position
/// whose count is at least that position. An empty list has index 0.
pub fn h_index(citation_counts: &[u32]) -> usize {
    let mut counts = citation_counts.to_vec();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let mut h = 0;
    for (i, &count) in counts.iter().enumerate() {
        let rank = i + 1;
        if count as usize >= rank {
            h = rank;
        } else {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example() {
        // Papers 1-4 each have at least their rank in citations; the 5th
        // paper's 3 citations fall short of 5.
        assert_eq!(h_index(&[10, 8, 5, 4, 3]), 4);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(h_index(&[]), 0);
    }

    #[test]
    fn test_all_zero() {
        assert_eq!(h_index(&[0, 0, 0]), 0);
    }

    #[test]
    fn test_single_paper() {
        assert_eq!(h_index(&[0]), 0);
        assert_eq!(h_index(&[1]), 1);
        assert_eq!(h_index(&[100]), 1);
    }

    #[test]
    fn test_unsorted_input() {
        assert_eq!(h_index(&[3, 10, 4, 8, 5]), 4);
    }

    #[test]
    fn test_uniform_counts() {
        // Five papers with five citations each
        assert_eq!(h_index(&[5, 5, 5, 5, 5]), 5);
        // Ten papers with five citations each: still 5
        assert_eq!(h_index(&[5; 10]), 5);
    }
}
