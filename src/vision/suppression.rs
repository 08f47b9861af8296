//! Category-aware greedy non-maximum suppression

use super::types::MatchCandidate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Strongest first; equal confidence falls back to name then position so output is stable
fn by_confidence(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.name.cmp(&b.name))
        .then(a.bounds.y.cmp(&b.bounds.y))
        .then(a.bounds.x.cmp(&b.bounds.x))
}

fn suppress_group(mut group: Vec<MatchCandidate>, iou_threshold: f64) -> Vec<MatchCandidate> {
    group.sort_by(by_confidence);

    let mut kept: Vec<MatchCandidate> = Vec::new();
    for candidate in group {
        let overlaps = kept
            .iter()
            .any(|k| k.bounds.iou(&candidate.bounds) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

/// Drop candidates overlapping a stronger candidate of the same category.
///
/// A box survives unless its IoU with an already kept box of its category is
/// strictly greater than `iou_threshold`. Boxes of different categories never
/// suppress each other. Output is sorted by confidence, strongest first.
pub fn suppress_overlaps(candidates: Vec<MatchCandidate>, iou_threshold: f64) -> Vec<MatchCandidate> {
    let mut groups: BTreeMap<String, Vec<MatchCandidate>> = BTreeMap::new();
    for candidate in candidates {
        groups
            .entry(candidate.category.clone())
            .or_default()
            .push(candidate);
    }

    let mut result: Vec<MatchCandidate> = groups
        .into_values()
        .flat_map(|group| suppress_group(group, iou_threshold))
        .collect();
    result.sort_by(by_confidence);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::PixelRect;

    fn candidate(name: &str, category: &str, x: u32, y: u32, confidence: f32) -> MatchCandidate {
        MatchCandidate {
            name: name.to_string(),
            category: category.to_string(),
            bounds: PixelRect::new(x, y, 16, 16),
            confidence,
        }
    }

    #[test]
    fn test_overlapping_same_category_keeps_strongest() {
        let kept = suppress_overlaps(
            vec![
                candidate("slime", "monster", 100, 100, 0.85),
                candidate("slime", "monster", 102, 101, 0.93),
                candidate("slime", "monster", 300, 250, 0.90),
            ],
            0.3,
        );

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].bounds.x, 102);
        assert_eq!(kept[1].bounds.x, 300);
    }

    #[test]
    fn test_different_categories_never_suppress_each_other() {
        let kept = suppress_overlaps(
            vec![
                candidate("slime", "monster", 50, 50, 0.9),
                candidate("coin", "item", 50, 50, 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].category, "monster");
    }

    #[test]
    fn test_iou_equal_to_threshold_survives() {
        // 16x16 boxes offset by 8 horizontally: IoU = 128 / 384 = 1/3
        let kept = suppress_overlaps(
            vec![
                candidate("a", "monster", 0, 0, 0.9),
                candidate("b", "monster", 8, 0, 0.8),
            ],
            1.0 / 3.0,
        );
        assert_eq!(kept.len(), 2);

        let kept = suppress_overlaps(
            vec![
                candidate("a", "monster", 0, 0, 0.9),
                candidate("b", "monster", 8, 0, 0.8),
            ],
            0.33,
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(suppress_overlaps(Vec::new(), 0.3).is_empty());
    }
}
