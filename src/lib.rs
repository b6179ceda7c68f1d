mod bounding_box;
mod detection;
mod id_allocator;
pub mod iou_matching;
pub mod linear_assignment;
mod motion_filter;
mod track;
mod tracker;

pub use bounding_box::{BoundingBox, FrameSize};
pub use detection::Detection;
pub use id_allocator::IdAllocator;
pub use linear_assignment::{DistanceMetricFn, Match};
pub use motion_filter::MotionFilter;
pub use track::{Track, TrackRecord, TrackState};
pub use tracker::{Tracker, TrackerConfig};
