//! Set, bag and sequence similarity scores, all in `[0, 1]`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// `|a ∩ b| / |a ∪ b|`; two empty sets are identical.
pub fn jaccard_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Cosine of the angle between two count vectors.
pub fn cosine_similarity<T: Eq + Hash>(a: &HashMap<T, usize>, b: &HashMap<T, usize>) -> f64 {
    let norm = |counts: &HashMap<T, usize>| {
        counts
            .values()
            .map(|&c| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt()
    };
    let (norm_a, norm_b) = (norm(a), norm(b));
    if norm_a == 0.0 && norm_b == 0.0 {
        return 1.0;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(key, &count)| b.get(key).map(|&other| count as f64 * other as f64))
        .sum();
    dot / (norm_a * norm_b)
}

/// Smith-Waterman scoring.
///
/// `deletion` is charged for a truth element missing from the other sequence,
/// `insertion` for an extra element in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentScores {
    pub matched: f64,
    pub mismatch: f64,
    pub deletion: f64,
    pub insertion: f64,
}

impl Default for AlignmentScores {
    fn default() -> Self {
        Self {
            matched: 3.0,
            mismatch: -1.0,
            deletion: -1.0,
            insertion: -1.0,
        }
    }
}

/// Best local alignment score of `other` against `truth`, divided by the score
/// of `truth` aligned with itself.
///
/// Two empty sequences score 1.0; an empty truth against anything else 0.0.
pub fn smith_waterman_distance<T: PartialEq>(
    truth: &[T],
    other: &[T],
    scores: &AlignmentScores,
) -> f64 {
    if truth.is_empty() {
        return if other.is_empty() { 1.0 } else { 0.0 };
    }
    let perfect = scores.matched * truth.len() as f64;
    if perfect <= 0.0 {
        return 0.0;
    }

    let mut previous = vec![0.0f64; other.len() + 1];
    let mut current = vec![0.0f64; other.len() + 1];
    let mut best = 0.0f64;

    for t in truth {
        current[0] = 0.0;
        for (j, o) in other.iter().enumerate() {
            let diagonal = previous[j] + if t == o { scores.matched } else { scores.mismatch };
            let skip_truth = previous[j + 1] + scores.deletion;
            let skip_other = current[j] + scores.insertion;
            let cell = diagonal.max(skip_truth).max(skip_other).max(0.0);
            current[j + 1] = cell;
            best = best.max(cell);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best / perfect).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&'static str]) -> HashSet<&'static str> {
        words.iter().copied().collect()
    }

    fn bag(words: &[&'static str]) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for w in words {
            *counts.entry(*w).or_insert(0) += 1;
        }
        counts
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_jaccard() {
        assert!(close(jaccard_similarity(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0));
        assert!(close(jaccard_similarity(&set(&[]), &set(&[])), 1.0));
        assert!(close(jaccard_similarity(&set(&["a"]), &set(&[])), 0.0));
    }

    #[test]
    fn test_cosine() {
        assert!(close(cosine_similarity(&bag(&["a", "b"]), &bag(&["b", "a"])), 1.0));
        assert!(close(cosine_similarity(&bag(&["a"]), &bag(&["b"])), 0.0));
        // (1*1) / (sqrt(2) * 1)
        assert!(close(
            cosine_similarity(&bag(&["a", "b"]), &bag(&["a"])),
            1.0 / 2f64.sqrt()
        ));
        assert!(close(cosine_similarity(&bag(&[]), &bag(&["a"])), 0.0));
        assert!(close(cosine_similarity::<&str>(&bag(&[]), &bag(&[])), 1.0));
    }

    #[test]
    fn test_smith_waterman_identical() {
        let words = ["the", "quick", "fox"];
        let score = smith_waterman_distance(&words, &words, &AlignmentScores::default());
        assert!(close(score, 1.0));
    }

    #[test]
    fn test_smith_waterman_disjoint() {
        let score = smith_waterman_distance(&["a", "b"], &["c", "d"], &AlignmentScores::default());
        assert!(close(score, 0.0));
    }

    #[test]
    fn test_smith_waterman_partial_match() {
        // Best local alignment is "b c": 6 out of a perfect 12.
        let score = smith_waterman_distance(
            &["a", "b", "c", "d"],
            &["x", "b", "c", "y"],
            &AlignmentScores::default(),
        );
        assert!(close(score, 0.5));
    }

    #[test]
    fn test_smith_waterman_cheap_insertions() {
        let truth = ["a", "b", "c"];
        let noisy = ["a", "junk", "b", "c"];
        let strict = smith_waterman_distance(&truth, &noisy, &AlignmentScores::default());
        let lenient = smith_waterman_distance(
            &truth,
            &noisy,
            &AlignmentScores {
                insertion: -0.5,
                ..AlignmentScores::default()
            },
        );
        assert!(close(strict, 8.0 / 9.0));
        assert!(close(lenient, 8.5 / 9.0));
    }

    #[test]
    fn test_smith_waterman_empty() {
        let empty: [&str; 0] = [];
        let scores = AlignmentScores::default();
        assert!(close(smith_waterman_distance(&empty, &empty, &scores), 1.0));
        assert!(close(smith_waterman_distance(&empty, &["a"], &scores), 0.0));
        assert!(close(smith_waterman_distance(&["a"], &empty, &scores), 0.0));
    }
}
