use crate::linear_assignment::DistanceMetricFn;
use crate::{BoundingBox, Detection, Track};
use anyhow::Result;
use ndarray::*;
use std::rc::Rc;

/// Compute intersection over union of one box against a slice of candidates.
///
/// # Parameters
///
/// * `bbox`: The reference bounding box.
/// * `candidates`: Candidate bounding boxes to score against `bbox`.
///
/// # Returns
///
/// The intersection over union in [0.0, 1.0] between `bbox` and each candidate.
pub fn intersection_over_union(bbox: &BoundingBox, candidates: &[BoundingBox]) -> Array1<f32> {
    Array1::from_iter(candidates.iter().map(|candidate| bbox.iou(candidate)))
}

/// Intersection over union distance metric.
///
/// # Returns
///
/// A metric that, given tracks, detections and the index subsets to score,
/// returns the cost matrix where entry (i, j) is
/// `1 - iou(tracks[track_indices[i]], detections[detection_indices[j]])`.
pub fn intersection_over_union_cost() -> DistanceMetricFn {
    Rc::new(
        move |tracks: &[Track],
              detections: &[Detection],
              track_indices: &[usize],
              detection_indices: &[usize]|
              -> Result<Array2<f32>> {
            let candidates = detection_indices
                .iter()
                .map(|&detection_idx| detections[detection_idx].bbox().clone())
                .collect::<Vec<_>>();

            let mut cost_matrix = Array2::<f32>::zeros((track_indices.len(), candidates.len()));
            for (row, &track_idx) in track_indices.iter().enumerate() {
                let iou = intersection_over_union(tracks[track_idx].bbox(), &candidates);
                cost_matrix.row_mut(row).assign(&iou.mapv(|v| 1.0 - v));
            }

            Ok(cost_matrix)
        },
    )
}

#[cfg(test)]
mod tests {
    use crate::*;
    use assert_approx_eq::assert_approx_eq;
    use ndarray::*;

    #[test]
    fn iou_against_candidates() {
        let iou = iou_matching::intersection_over_union(
            &BoundingBox::new(0.0, 0.0, 5.0, 5.0),
            &[
                BoundingBox::new(0.0, 0.0, 5.0, 5.0),
                BoundingBox::new(1.0, 1.0, 6.0, 6.0),
                BoundingBox::new(2.0, 2.0, 7.0, 7.0),
                BoundingBox::new(3.0, 3.0, 8.0, 8.0),
                BoundingBox::new(4.0, 4.0, 9.0, 9.0),
                BoundingBox::new(5.0, 5.0, 10.0, 10.0),
            ],
        );
        let expected =
            arr1::<f32>(&[1.0, 0.35555556, 0.13846155, 0.047058824, 0.00952381, 0.0]);

        for (value, expected) in iou.iter().zip(expected.iter()) {
            assert_approx_eq!(*value, *expected, 1e-6);
        }
    }

    #[test]
    fn iou_with_no_candidates_is_empty() {
        let iou = iou_matching::intersection_over_union(
            &BoundingBox::new(0.0, 0.0, 5.0, 5.0),
            &[],
        );
        assert_eq!(iou.len(), 0);
    }
}
