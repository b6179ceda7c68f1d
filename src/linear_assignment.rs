use crate::{Detection, Track};
use anyhow::Result;
use ndarray::*;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use std::rc::Rc;
use tracing::trace;

/// A distance metric over index subsets of tracks and detections. The metric
/// returns the NxM cost matrix where element (i, j) is the association cost
/// between the i-th indexed track and the j-th indexed detection.
pub type DistanceMetricFn =
    Rc<dyn Fn(&[Track], &[Detection], &[usize], &[usize]) -> Result<Array2<f32>>>;

/// An accepted association between one track and one detection.
#[derive(Debug, Clone)]
pub struct Match {
    track_idx: usize,
    detection_idx: usize,
    distance: f32,
}

impl Match {
    /// Return a new Match
    ///
    /// # Parameters
    ///
    /// * `track_idx`: The match track index.
    /// * `detection_idx`: The match detection index.
    /// * `distance`: Match cost.
    pub fn new(track_idx: usize, detection_idx: usize, distance: f32) -> Match {
        Match {
            track_idx,
            detection_idx,
            distance,
        }
    }

    /// Return the track index of the match
    pub fn track_idx(&self) -> usize {
        self.track_idx
    }

    /// Return the detection index of the match
    pub fn detection_idx(&self) -> usize {
        self.detection_idx
    }

    /// Return the distance of the match
    pub fn distance(&self) -> f32 {
        self.distance
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.track_idx == other.track_idx && self.detection_idx == other.detection_idx
    }
}

/// Solve a minimum-cost bipartite assignment over a numeric cost matrix.
///
/// The solve is independent of track and detection types so the matching
/// algorithm can be exercised in isolation.
///
/// # Parameters
///
/// * `costs`: The cost matrix. Rows and columns need not be square; the
///   smaller side is fully assigned.
///
/// # Returns
///
/// The assigned `(row, column)` pairs in ascending row order. A matrix with
/// zero rows or zero columns yields no pairs without invoking the solver.
pub fn min_cost_assignment(costs: ArrayView2<'_, f32>) -> Vec<(usize, usize)> {
    if costs.nrows() == 0 || costs.ncols() == 0 {
        return vec![];
    }

    // kuhn_munkres requires rows <= columns, so solve the transpose when
    // tracks outnumber detections and swap the pairs back afterwards.
    let (costs, transposed) = if costs.nrows() > costs.ncols() {
        (costs.reversed_axes(), true)
    } else {
        (costs, false)
    };

    // multiply by large constant to convert from f32 [0.0..1.0] to i64 which satisfies Matrix requirements (f32 does not implement `std::cmp::Ord`)
    let cost_vec = costs
        .iter()
        .map(|v| (v * 10_000_000_000.0) as i64)
        .collect::<Vec<i64>>();

    // invoke the kuhn munkres min (aka hungarian) assignment algorithm
    // this is equivalent to `scipy.optimize.linear_sum_assignment(maximise=False)` but where scipy returns two arrays
    // (row_ind and col_ind) `kuhn_munkres_min` returns just the col_ind array leaving row_ind (which is just a row index) to be
    // derived manually.
    let matrix = Matrix::from_vec(costs.nrows(), costs.ncols(), cost_vec).unwrap();
    let (_, col_indices) = kuhn_munkres_min(&matrix);

    let mut pairs = col_indices
        .into_iter()
        .enumerate()
        .map(|(row, col)| if transposed { (col, row) } else { (row, col) })
        .collect::<Vec<_>>();
    pairs.sort_unstable();
    pairs
}

/// Solve linear assignment problem.
///
/// # Parameters
///
/// * `distance_metric`: The distance metric is given a list of tracks and detections as well as a list of N track indices and M detection indices.
///   The metric should return the NxM dimensional cost matrix, where element (i, j) is the association cost between the i-th track in the given track indices and the j-th detection in the given detection_indices.
/// * `max_distance`: Gating threshold. Associations with cost larger than this value are disregarded.
/// * `tracks`: A list of predicted tracks at the current time step.
/// * `detections`: A list of detections at the current time step.
/// * `track_indices`: List of track indices that maps rows in the cost matrix to tracks in `tracks`. Defaults to all tracks.
/// * `detection_indices`: List of detection indices that maps columns in the cost matrix to detections in `detections`. Defaults to all detections.
///
/// # Returns
///
/// A tuple with the following three entries:
///
/// - A list of matched track and detection indices.
/// - A list of unmatched track indices.
/// - A list of unmatched detection indices.
#[allow(clippy::type_complexity)]
pub fn min_cost_matching(
    distance_metric: DistanceMetricFn,
    max_distance: f32,
    tracks: &[Track],
    detections: &[Detection],
    track_indices: Option<Vec<usize>>,
    detection_indices: Option<Vec<usize>>,
) -> Result<(Vec<Match>, Vec<usize>, Vec<usize>)> {
    let track_indices = track_indices.unwrap_or_else(|| (0..tracks.len()).collect());
    let detection_indices = detection_indices.unwrap_or_else(|| (0..detections.len()).collect());

    if track_indices.is_empty() || detection_indices.is_empty() {
        return Ok((vec![], track_indices, detection_indices));
    }

    let cost_matrix = (distance_metric)(tracks, detections, &track_indices, &detection_indices)?
        .mapv(|v| v.min(max_distance + 1e-5));

    let assignment = min_cost_assignment(cost_matrix.view());

    let mut matched_rows = vec![false; track_indices.len()];
    let mut matched_cols = vec![false; detection_indices.len()];
    let mut matches = Vec::with_capacity(assignment.len());

    for (row, col) in assignment {
        let distance = cost_matrix[[row, col]];
        if distance > max_distance {
            trace!(
                track_idx = track_indices[row],
                detection_idx = detection_indices[col],
                distance,
                "assignment rejected by gate"
            );
            continue;
        }
        matched_rows[row] = true;
        matched_cols[col] = true;
        matches.push(Match::new(track_indices[row], detection_indices[col], distance));
    }

    let unmatched_tracks = track_indices
        .iter()
        .enumerate()
        .filter(|(row, _)| !matched_rows[*row])
        .map(|(_, &track_idx)| track_idx)
        .collect::<Vec<_>>();
    let unmatched_detections = detection_indices
        .iter()
        .enumerate()
        .filter(|(col, _)| !matched_cols[*col])
        .map(|(_, &detection_idx)| detection_idx)
        .collect::<Vec<_>>();

    Ok((matches, unmatched_tracks, unmatched_detections))
}
