use crate::{BoundingBox, Detection, FrameSize, MotionFilter};
use ndarray::*;

/// Enumeration type for the single target track state:
///
/// - Newly created tracks are classified as `Tentative` until a following frame confirms them.
/// - A confirmed track is `Tracked` while it keeps matching detections.
/// - A `Tracked` track that misses a frame becomes `Lost` and is retained for the retention window.
/// - Tracks that are no longer alive are classified as `Removed` to mark them for removal from the set of active tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Tracked,
    Lost,
    Removed,
}

/// A single target track with state space `(x, y, a, h)` and associated velocities, where `(x, y)` is the center of the bounding box, `a` is the aspect ratio and `h` is the height.
pub struct Track {
    /// The current track state.
    state: TrackState,
    /// Mean vector of the motion state.
    mean: Array1<f32>,
    /// Current box estimate, clipped to the frame.
    bbox: BoundingBox,
    /// A unique track identifier.
    track_id: usize,
    /// The last detection matched to this track
    detection: Detection,
    /// Class identifier, sticky from the first confident association.
    class_id: Option<usize>,
    /// Confidence score of the last matched detection.
    score: f32,
    /// Total number of measurement updates.
    hits: usize,
    /// Total number of frames since first occurance.
    age: usize,
    /// Total number of frames since last measurement update.
    time_since_update: usize,
    /// Number of consecutive frames with a measurement update.
    hit_streak: usize,
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("state", &self.state)
            .field("track_id", &self.track_id)
            .field("bbox", &self.bbox)
            .field("class_id", &self.class_id)
            .field("score", &self.score)
            .field("hits", &self.hits)
            .field("age", &self.age)
            .field("time_since_update", &self.time_since_update)
            .field("hit_streak", &self.hit_streak)
            .finish()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}

impl Eq for Track {}

impl Track {
    /// Returns a new Track
    ///
    /// # Parameters
    ///
    /// * `state`: The initial track state.
    /// * `mean`: Mean vector of the initial motion state.
    /// * `track_id`: A unique track identifier.
    /// * `detection`: The detection this track originates from.
    /// * `frame`: Pixel bounds to clip the reported box against.
    pub(crate) fn new(
        state: TrackState,
        mean: Array1<f32>,
        track_id: usize,
        detection: Detection,
        frame: &FrameSize,
    ) -> Track {
        let bbox = Self::bbox_from_mean(&mean).clip(frame);
        let class_id = detection.class_id();
        let score = detection.confidence();
        Track {
            state,
            mean,
            bbox,
            track_id,
            detection,
            class_id,
            score,
            hits: 1,
            age: 1,
            time_since_update: 0,
            hit_streak: 0,
        }
    }

    /// Return the identifier of the track
    pub fn track_id(&self) -> usize {
        self.track_id
    }

    /// Return the TrackState of the track
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Return the current box estimate of the track
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Return the detection associated with the latest update
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Return the class identifier of the track
    pub fn class_id(&self) -> Option<usize> {
        self.class_id
    }

    /// Return the confidence score of the latest update
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Return the total number of measurement updates
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Return the number of frames since the track was created
    pub fn age(&self) -> usize {
        self.age
    }

    /// Return the time since update of the track
    pub fn time_since_update(&self) -> usize {
        self.time_since_update
    }

    /// Return the number of consecutive matched frames
    pub fn hit_streak(&self) -> usize {
        self.hit_streak
    }

    /// Return the mean of the track
    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    /// Propagate the motion state to the current time step.
    ///
    /// Applied to every live track exactly once per frame, before association.
    ///
    /// # Parameters
    ///
    /// * `filter`: The motion filter.
    /// * `frame`: Pixel bounds to clip the predicted box against.
    pub(crate) fn predict(&mut self, filter: &MotionFilter, frame: &FrameSize) {
        if !self.is_tracked() {
            // a coasting box keeps its last observed height
            self.mean[7] = 0.0;
        }
        self.mean = filter.predict(&self.mean);
        self.bbox = Self::bbox_from_mean(&self.mean).clip(frame);
        self.age += 1;
        if self.time_since_update > 0 {
            self.hit_streak = 0;
        }
        self.time_since_update += 1;
    }

    /// Perform the measurement update step for a matched detection.
    ///
    /// # Parameters
    ///
    /// * `filter`: The motion filter.
    /// * `detection`: The associated detection.
    /// * `frame`: Pixel bounds to clip the corrected box against.
    pub(crate) fn update(&mut self, filter: &MotionFilter, detection: Detection, frame: &FrameSize) {
        self.mean = filter.update(&self.mean, &detection.bbox().to_xyah());
        self.bbox = Self::bbox_from_mean(&self.mean).clip(frame);

        self.class_id = self.class_id.or(detection.class_id());
        self.score = detection.confidence();
        self.detection = detection;
        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;
        self.state = TrackState::Tracked;
    }

    /// Recover a lost track from a matched detection.
    ///
    /// # Parameters
    ///
    /// * `filter`: The motion filter.
    /// * `detection`: The associated detection.
    /// * `frame`: Pixel bounds to clip the corrected box against.
    pub(crate) fn re_activate(
        &mut self,
        filter: &MotionFilter,
        detection: Detection,
        frame: &FrameSize,
    ) {
        self.mean = filter.update(&self.mean, &detection.bbox().to_xyah());
        self.bbox = Self::bbox_from_mean(&self.mean).clip(frame);

        self.class_id = self.class_id.or(detection.class_id());
        self.score = detection.confidence();
        self.detection = detection;
        self.hits += 1;
        self.hit_streak = 1;
        self.time_since_update = 0;
        self.state = TrackState::Tracked;
    }

    /// Mark this track as missed.
    pub(crate) fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    /// Mark this track as dead.
    pub(crate) fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    /// Returns true if this track is tentative (unconfirmed).
    pub fn is_tentative(&self) -> bool {
        matches!(self.state, TrackState::Tentative)
    }

    /// Returns true if this track is confirmed and currently matched or recently matched.
    pub fn is_tracked(&self) -> bool {
        matches!(self.state, TrackState::Tracked)
    }

    /// Returns true if this track is lost.
    pub fn is_lost(&self) -> bool {
        matches!(self.state, TrackState::Lost)
    }

    /// Returns true if this track is dead and should be removed.
    pub fn is_removed(&self) -> bool {
        matches!(self.state, TrackState::Removed)
    }

    /// Returns an immutable by-value snapshot of the track.
    pub fn to_record(&self) -> TrackRecord {
        TrackRecord {
            track_id: self.track_id,
            bbox: self.bbox.clone(),
            score: self.score,
            class_id: self.class_id,
            state: self.state,
            time_since_update: self.time_since_update,
        }
    }

    fn bbox_from_mean(mean: &Array1<f32>) -> BoundingBox {
        BoundingBox::from_xyah(mean[0], mean[1], mean[2], mean[3])
    }
}

/// TrackRecord is the per-frame, by-value view of a track returned to callers.
/// It shares no state with the tracker that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    track_id: usize,
    bbox: BoundingBox,
    score: f32,
    class_id: Option<usize>,
    state: TrackState,
    time_since_update: usize,
}

impl TrackRecord {
    /// Return the identifier of the track
    pub fn track_id(&self) -> usize {
        self.track_id
    }

    /// Return the box estimate of the track
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Return the confidence score of the latest update
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Return the class identifier of the track
    pub fn class_id(&self) -> Option<usize> {
        self.class_id
    }

    /// Return the TrackState of the track
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Return the time since update of the track
    pub fn time_since_update(&self) -> usize {
        self.time_since_update
    }
}

#[cfg(test)]
mod tests {
    use crate::track::TrackState;
    use crate::*;
    use assert_approx_eq::assert_approx_eq;

    fn frame() -> FrameSize {
        FrameSize::new(640.0, 480.0)
    }

    fn detection(bbox: BoundingBox, confidence: f32) -> Detection {
        Detection::new(None, bbox, confidence, Some(2), None)
    }

    fn track(bbox: BoundingBox) -> Track {
        let filter = MotionFilter::new();
        let mean = filter.initiate(&bbox);
        Track::new(
            TrackState::Tracked,
            mean,
            1,
            detection(bbox, 0.9),
            &frame(),
        )
    }

    #[test]
    fn new_track_reports_its_detection_box() {
        let track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));

        assert_eq!(track.bbox(), &BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));
        assert_eq!(track.age(), 1);
        assert_eq!(track.hits(), 1);
        assert_eq!(track.time_since_update(), 0);
        assert_eq!(track.class_id(), Some(2));
    }

    #[test]
    fn predict_ages_the_track() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));

        track.predict(&filter, &frame());

        assert_eq!(track.age(), 2);
        assert_eq!(track.time_since_update(), 1);
        // zero velocity leaves the box where it was
        assert_eq!(track.bbox(), &BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn update_corrects_toward_measurement() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));

        track.predict(&filter, &frame());
        track.update(
            &filter,
            detection(BoundingBox::from_tlbr(12.0, 11.0, 52.0, 51.0), 0.85),
            &frame(),
        );

        // center moved 0.7 of the (2, 1) residual
        assert_approx_eq!(track.bbox().x(), 11.4, 1e-4);
        assert_approx_eq!(track.bbox().y(), 10.7, 1e-4);
        assert_eq!(track.time_since_update(), 0);
        assert_eq!(track.hits(), 2);
        assert_eq!(track.hit_streak(), 1);
        assert_approx_eq!(track.score(), 0.85);
    }

    #[test]
    fn miss_resets_hit_streak() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));

        track.predict(&filter, &frame());
        track.update(
            &filter,
            detection(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0), 0.9),
            &frame(),
        );
        assert_eq!(track.hit_streak(), 1);

        // two missed frames
        track.predict(&filter, &frame());
        track.predict(&filter, &frame());
        assert_eq!(track.hit_streak(), 0);
        assert_eq!(track.time_since_update(), 2);
    }

    #[test]
    fn re_activate_recovers_a_lost_track() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));

        track.predict(&filter, &frame());
        track.mark_lost();
        assert!(track.is_lost());

        track.re_activate(
            &filter,
            detection(BoundingBox::from_tlbr(11.0, 10.0, 51.0, 50.0), 0.9),
            &frame(),
        );

        assert!(track.is_tracked());
        assert_eq!(track.track_id(), 1);
        assert_eq!(track.time_since_update(), 0);
        assert_eq!(track.hit_streak(), 1);
    }

    #[test]
    fn class_id_is_sticky() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));
        assert_eq!(track.class_id(), Some(2));

        track.predict(&filter, &frame());
        let relabelled = Detection::new(
            None,
            BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0),
            0.9,
            Some(7),
            None,
        );
        track.update(&filter, relabelled, &frame());

        assert_eq!(track.class_id(), Some(2));
    }

    #[test]
    fn predicted_box_is_clipped_to_frame() {
        let filter = MotionFilter::new();
        // learn a leftward velocity, then coast past the frame edge
        let mut track = track(BoundingBox::from_tlbr(2.0, 10.0, 42.0, 50.0));
        for step in 1..=3 {
            track.predict(&filter, &frame());
            let shift = 4.0 * step as f32;
            track.update(
                &filter,
                detection(
                    BoundingBox::from_tlbr(2.0 - shift, 10.0, 42.0 - shift, 50.0),
                    0.9,
                ),
                &frame(),
            );
        }

        for _ in 0..4 {
            track.predict(&filter, &frame());
        }

        assert_eq!(track.bbox().x(), 0.0);
        assert!(track.bbox().width() < 40.0);
    }

    #[test]
    fn record_is_detached_from_the_track() {
        let filter = MotionFilter::new();
        let mut track = track(BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));
        let record = track.to_record();

        track.predict(&filter, &frame());
        track.mark_lost();

        assert_eq!(record.state(), TrackState::Tracked);
        assert_eq!(record.time_since_update(), 0);
        assert_eq!(record.bbox(), &BoundingBox::from_tlbr(10.0, 10.0, 50.0, 50.0));
    }
}
