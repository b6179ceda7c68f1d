use crate::track::TrackState;
use crate::{iou_matching, linear_assignment, Detection, FrameSize, IdAllocator, MotionFilter, Track, TrackRecord};
use anyhow::Result;
use indexmap::IndexMap;
use tracing::debug;

/// Tracker configuration, supplied at construction and immutable thereafter.
/// Each tracker instance owns its configuration, so instances with different
/// tuning can coexist.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum score to spawn a new track or to qualify for first-stage matching.
    pub track_thresh: f32,
    /// Minimum score for a detection to be eligible for second-stage matching at all.
    pub low_score_bound: f32,
    /// Minimum intersection over union to accept a proposed assignment.
    pub match_thresh: f32,
    /// Number of frames a lost track is retained awaiting re-identification.
    pub track_buffer: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            track_thresh: 0.5,
            low_score_bound: 0.1,
            match_thresh: 0.8,
            track_buffer: 30,
        }
    }
}

/// This is the multi-target tracker.
///
/// A tracker instance is stateful and must be driven by sequential calls to
/// [`Tracker::update`], one per frame, in stream order. Concurrent calls on
/// the same instance are a precondition violation and are not detected or
/// handled; run one instance per stream, each touched by a single thread.
///
/// # Examples
///
/// ```
/// use bytetrack_rs::{BoundingBox, Detection, FrameSize, Tracker};
///
/// // instantiate tracker with default parameters
/// let mut tracker = Tracker::default();
///
/// // create a detection
/// let detection = Detection::new(
///     None,
///     BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0),
///     0.9,
///     Some(0),
///     None,
/// );
///
/// // add 0..n detections per frame
/// let tracks = tracker
///     .update(vec![detection], FrameSize::new(640.0, 480.0))
///     .unwrap();
///
/// // print predictions
/// for track in &tracks {
///     println!(
///         "{} {} {:?} {:?}",
///         track.track_id(),
///         track.score(),
///         track.state(),
///         track.bbox().to_tlbr(),
///     );
/// }
/// ```
#[derive(Debug)]
pub struct Tracker {
    /// Immutable matching and retention thresholds.
    config: TrackerConfig,
    /// The motion filter shared by all tracks of this instance.
    filter: MotionFilter,
    /// Live tracks keyed by track id, in creation order.
    tracks: IndexMap<usize, Track>,
    /// Issues identifiers to new tracks.
    ids: IdAllocator,
    /// First run allows tracking from the first frame.
    initial_run: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracker {
    /// Returns a new Tracker
    ///
    /// # Parameters
    ///
    /// * `config`: Matching and retention thresholds. See [`TrackerConfig`].
    pub fn new(config: TrackerConfig) -> Tracker {
        Tracker {
            config,
            filter: MotionFilter::new(),
            tracks: IndexMap::new(),
            ids: IdAllocator::new(),
            initial_run: true,
        }
    }

    /// Return the tracker configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Return the live track with the given identifier, if any
    pub fn track(&self, track_id: usize) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Return the live tracks in creation order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.values()
    }

    /// Perform measurement update and track management for one frame.
    ///
    /// Must be called exactly once per frame, in frame order.
    ///
    /// # Parameters
    ///
    /// * `detections`: The detections of the current frame, in detector order.
    /// * `frame`: The pixel bounds of the current frame.
    ///
    /// # Returns
    ///
    /// A by-value snapshot of every track currently tracked or lost, in
    /// creation order. The snapshot shares no state with the tracker.
    pub fn update(
        &mut self,
        detections: Vec<Detection>,
        frame: FrameSize,
    ) -> Result<Vec<TrackRecord>> {
        // Retire tracks that outlived the retention window; they are no
        // longer eligible for recovery this frame.
        let track_buffer = self.config.track_buffer;
        self.tracks.retain(|_, track| {
            let expired = track.is_lost() && track.time_since_update() > track_buffer;
            if expired {
                debug!(track_id = track.track_id(), "retiring expired track");
            }
            !expired
        });

        // Drop malformed detections; the frame continues with the remainder.
        let detections = detections
            .into_iter()
            .filter(|detection| {
                let valid = detection.is_valid();
                if !valid {
                    debug!(detection_id = %detection.id(), "dropping malformed detection");
                }
                valid
            })
            .collect::<Vec<_>>();

        // Split detections into high and low confidence. Detections below the
        // low score bound never participate.
        let (high_detections, low_detections): (Vec<Detection>, Vec<Detection>) = detections
            .into_iter()
            .filter(|detection| detection.confidence() >= self.config.low_score_bound)
            .partition(|detection| detection.confidence() >= self.config.track_thresh);

        let mut tracks = std::mem::take(&mut self.tracks)
            .into_iter()
            .map(|(_, track)| track)
            .collect::<Vec<_>>();

        // Advance every live track to this frame.
        for track in tracks.iter_mut() {
            track.predict(&self.filter, &frame);
        }

        let pool = tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| track.is_tracked() || track.is_lost())
            .map(|(track_idx, _)| track_idx)
            .collect::<Vec<_>>();
        let unconfirmed = tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| track.is_tentative())
            .map(|(track_idx, _)| track_idx)
            .collect::<Vec<_>>();

        let max_distance = 1.0 - self.config.match_thresh;

        // Step 1
        // Associate high confidence detections with tracked and lost tracks.
        let (matches, unmatched_pool, unmatched_high) = linear_assignment::min_cost_matching(
            iou_matching::intersection_over_union_cost(),
            max_distance,
            &tracks,
            &high_detections,
            Some(pool),
            None,
        )?;
        for iou_match in matches {
            let detection = high_detections[iou_match.detection_idx()].clone();
            let track = &mut tracks[iou_match.track_idx()];
            if track.is_lost() {
                track.re_activate(&self.filter, detection, &frame);
            } else {
                track.update(&self.filter, detection, &frame);
            }
        }

        // Step 2
        // Low confidence detections reinforce tracks that are still tracked.
        // They must not revive tracks that have already gone unseen.
        let stage_two = unmatched_pool
            .iter()
            .copied()
            .filter(|&track_idx| tracks[track_idx].is_tracked())
            .collect::<Vec<_>>();
        let (matches, unmatched_stage_two, _unmatched_low) =
            linear_assignment::min_cost_matching(
                iou_matching::intersection_over_union_cost(),
                max_distance,
                &tracks,
                &low_detections,
                Some(stage_two),
                None,
            )?;
        for iou_match in matches {
            let detection = low_detections[iou_match.detection_idx()].clone();
            tracks[iou_match.track_idx()].update(&self.filter, detection, &frame);
        }

        // Tracked tracks missed by both stages go lost.
        for &track_idx in &unmatched_stage_two {
            tracks[track_idx].mark_lost();
        }

        // Step 3
        // Associate the remaining high confidence detections with tentative tracks.
        let (matches, unmatched_unconfirmed, unmatched_high) =
            linear_assignment::min_cost_matching(
                iou_matching::intersection_over_union_cost(),
                max_distance,
                &tracks,
                &high_detections,
                Some(unconfirmed),
                Some(unmatched_high),
            )?;
        for iou_match in matches {
            let detection = high_detections[iou_match.detection_idx()].clone();
            tracks[iou_match.track_idx()].update(&self.filter, detection, &frame);
        }

        // A tentative track given no immediate confirmation is discarded.
        for &track_idx in &unmatched_unconfirmed {
            debug!(
                track_id = tracks[track_idx].track_id(),
                "discarding unconfirmed track"
            );
            tracks[track_idx].mark_removed();
        }

        // Step 4
        // Initialize new tracks from the remaining high confidence detections.
        for detection_idx in unmatched_high {
            let detection = high_detections[detection_idx].clone();
            let state = if self.initial_run {
                TrackState::Tracked
            } else {
                TrackState::Tentative
            };
            let mean = self.filter.initiate(detection.bbox());
            let track_id = self.ids.next_id();
            debug!(track_id, ?state, "spawning track");
            tracks.push(Track::new(state, mean, track_id, detection, &frame));
        }

        // Step 5
        // Rebuild the live set. Removed tracks are dropped; their ids are
        // never reissued.
        self.tracks = tracks
            .into_iter()
            .filter(|track| !track.is_removed())
            .map(|track| (track.track_id(), track))
            .collect();

        // cannot be initial run anymore
        self.initial_run = false;

        Ok(self
            .tracks
            .values()
            .filter(|track| track.is_tracked() || track.is_lost())
            .map(Track::to_record)
            .collect())
    }
}
