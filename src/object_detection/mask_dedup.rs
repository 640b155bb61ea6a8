use crate::annotations::detection::Detection;
use ndarray::{ArrayView2, Zip};
use thiserror::Error;

/// Mask IoU above which two detections are considered duplicates of the same
/// physical chromosome.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

#[derive(Debug, Error)]
pub enum DedupError {
    /// All masks within one call must share the image's pixel grid.
    #[error(
        "mask shape mismatch: detection {index} has shape {found:?}, expected {expected:?}"
    )]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Intersection-over-union of two binary masks of identical shape.
///
/// Returns 0.0 when the union is empty.
pub fn mask_iou(a: ArrayView2<bool>, b: ArrayView2<bool>) -> f32 {
    let mut intersection = 0u32;
    let mut union = 0u32;
    Zip::from(a).and(b).for_each(|&pa, &pb| {
        if pa && pb {
            intersection += 1;
        }
        if pa || pb {
            union += 1;
        }
    });
    if union > 0 {
        intersection as f32 / union as f32
    } else {
        0.0
    }
}

/// Removes duplicate detections of the same physical chromosome by greedy
/// pairwise suppression on segmentation-mask IoU.
///
/// For every ordered pair (i, j) with i < j where neither side has already
/// been removed, the pair is suppressed when its mask IoU is strictly above
/// `iou_threshold`: the lower-confidence detection loses, and on an exact
/// confidence tie the earlier detection wins. Suppression decisions are final;
/// a detection removed mid-scan is skipped in all later comparisons but
/// earlier removals it caused are not revisited. Survivors keep their
/// relative order.
///
/// Confidence filtering is deliberately not performed here. The confidence
/// threshold is a knob on the detector invocation that produced these
/// detections, not on deduplication.
pub fn deduplicate_by_mask_iou(
    detections: Vec<Detection>,
    iou_threshold: f32,
) -> Result<Vec<Detection>, DedupError> {
    if let Some(first) = detections.first() {
        let expected = first.mask.dim();
        for (index, detection) in detections.iter().enumerate() {
            let found = detection.mask.dim();
            if found != expected {
                return Err(DedupError::ShapeMismatch {
                    index,
                    expected,
                    found,
                });
            }
        }
    }

    let mut removed = vec![false; detections.len()];
    for i in 0..detections.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if removed[i] {
                break;
            }
            if removed[j] {
                continue;
            }
            let iou = mask_iou(detections[i].mask.view(), detections[j].mask.view());
            if iou > iou_threshold {
                if detections[i].confidence >= detections[j].confidence {
                    removed[j] = true;
                } else {
                    removed[i] = true;
                }
            }
        }
    }

    let mut removed_iter = removed.iter();
    let mut survivors = detections;
    survivors.retain(|_| !removed_iter.next().unwrap());
    Ok(survivors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;
    use crate::annotations::chromosome_class::ChromosomeClass;
    use ndarray::Array2;

    /// Builds a detection over a 1x12 grid whose mask covers columns
    /// [start, end).
    fn detection(start: usize, end: usize, confidence: f32) -> Detection {
        let mut mask = Array2::from_elem((1, 12), false);
        for col in start..end {
            mask[[0, col]] = true;
        }
        Detection {
            class: ChromosomeClass::from_index(0).unwrap(),
            confidence,
            bounding_box: BoundingBox::new(start as f32, 0.0, end as f32, 1.0).unwrap(),
            mask,
        }
    }

    fn surviving_confidences(detections: Vec<Detection>) -> Vec<f32> {
        deduplicate_by_mask_iou(detections, DEFAULT_IOU_THRESHOLD)
            .unwrap()
            .iter()
            .map(|d| d.confidence)
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let result = deduplicate_by_mask_iou(Vec::new(), DEFAULT_IOU_THRESHOLD).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn disjoint_masks_are_never_suppressed() {
        // Zero overlap, wildly different confidences.
        let dets = vec![detection(0, 4, 0.99), detection(6, 10, 0.01)];
        assert_eq!(surviving_confidences(dets), vec![0.99, 0.01]);
    }

    #[test]
    fn iou_exactly_at_threshold_is_not_suppressed() {
        // |A| = 10, |B| = 7, B inside A: IoU = 7/10 = 0.7 exactly.
        let dets = vec![detection(0, 10, 0.9), detection(0, 7, 0.2)];
        assert_eq!(surviving_confidences(dets), vec![0.9, 0.2]);
    }

    #[test]
    fn iou_above_threshold_suppresses_lower_confidence() {
        // |A| = 10, |B| = 8, B inside A: IoU = 0.8.
        let dets = vec![detection(0, 10, 0.3), detection(0, 8, 0.9)];
        assert_eq!(surviving_confidences(dets), vec![0.9]);
    }

    #[test]
    fn exact_confidence_tie_keeps_lower_index() {
        // Identical masks and confidences; the classes differ only so the
        // survivor's identity is observable.
        let first = detection(0, 10, 0.5);
        let mut second = detection(0, 10, 0.5);
        second.class = ChromosomeClass::from_index(1).unwrap();
        let survivors =
            deduplicate_by_mask_iou(vec![first, second], DEFAULT_IOU_THRESHOLD).unwrap();
        assert_eq!(survivors.len(), 1);
        // Index 0 wins the tie.
        assert_eq!(survivors[0].class.index(), 0);
    }

    #[test]
    fn removed_detection_is_skipped_in_later_comparisons() {
        // Detection 0 loses to detection 1 in the first comparison; the
        // disjoint detection 2 must be judged against nothing but survivors.
        let dets = vec![
            detection(0, 10, 0.2),
            detection(0, 10, 0.8),
            detection(11, 12, 0.1),
        ];
        assert_eq!(surviving_confidences(dets), vec![0.8, 0.1]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let dets = vec![
            detection(0, 10, 0.2),
            detection(0, 9, 0.8),
            detection(0, 4, 0.5),
            detection(11, 12, 0.9),
        ];
        let first_pass = deduplicate_by_mask_iou(dets, DEFAULT_IOU_THRESHOLD).unwrap();
        let first_confidences: Vec<f32> = first_pass.iter().map(|d| d.confidence).collect();
        let second_pass =
            deduplicate_by_mask_iou(first_pass, DEFAULT_IOU_THRESHOLD).unwrap();
        let second_confidences: Vec<f32> = second_pass.iter().map(|d| d.confidence).collect();
        assert_eq!(first_confidences, second_confidences);
    }

    #[test]
    fn mismatched_mask_shapes_fail_fast() {
        let mut odd = detection(0, 4, 0.5);
        odd.mask = Array2::from_elem((2, 12), false);
        let result = deduplicate_by_mask_iou(vec![detection(0, 4, 0.5), odd], 0.7);
        assert!(matches!(
            result,
            Err(DedupError::ShapeMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn mask_iou_of_empty_masks_is_zero() {
        let a = Array2::from_elem((3, 3), false);
        let b = Array2::from_elem((3, 3), false);
        assert_eq!(mask_iou(a.view(), b.view()), 0.0);
    }
}
