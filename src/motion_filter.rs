use crate::BoundingBox;
use ndarray::*;

/**
A constant-velocity motion filter for tracking bounding boxes in image space.

The 8-dimensional state space:
    x, y, a, h, vx, vy, va, vh
contains the bounding box center position (x, y), aspect ratio a, height h, and their respective velocities.

Prediction advances the position terms by the stored velocities. The measurement
update blends the predicted position toward the observed box with a fixed
position gain and recomputes the velocities from the position residual with a
fixed velocity gain.
*/
#[derive(Debug, Clone)]
pub struct MotionFilter {
    motion_mat: Array2<f32>,
    position_gain: f32,
    velocity_gain: f32,
}

impl Default for MotionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionFilter {
    /// Returns a new MotionFilter
    pub fn new() -> MotionFilter {
        let ndim = 4;

        // Constant velocity model: position terms advance by one velocity step per frame.
        let mut motion_mat = Array2::from_diag(&Array1::<f32>::ones(2 * ndim));
        for i in 0..ndim {
            motion_mat[[i, ndim + i]] = 1.0;
        }

        // How far a measurement pulls the estimate, and how much of the residual
        // feeds back into velocity, per update.
        let position_gain = 0.7;
        let velocity_gain = 0.3;

        MotionFilter {
            motion_mat,
            position_gain,
            velocity_gain,
        }
    }

    /// Create track state from an unassociated measurement.
    ///
    /// # Arguments
    ///
    /// - `bbox`: Bounding box object of the new measurement.
    ///
    /// # Returns
    ///
    /// The mean vector (8 dimensional) of the new track. Unobserved velocities
    /// are initialized to 0.
    pub fn initiate(&self, bbox: &BoundingBox) -> Array1<f32> {
        let mean_pos = bbox.to_xyah();
        let mean_vel = Array1::<f32>::zeros(mean_pos.raw_dim());
        concatenate![Axis(0), mean_pos, mean_vel]
    }

    /// Run the prediction step.
    ///
    /// # Arguments
    ///
    /// - `mean`: The 8 dimensional mean vector of the object state at the previous time step.
    ///
    /// # Returns
    ///
    /// The mean vector (8 dimensional) of the predicted state.
    pub fn predict(&self, mean: &Array1<f32>) -> Array1<f32> {
        self.motion_mat.dot(mean)
    }

    /// Run the measurement correction step.
    ///
    /// # Arguments
    ///
    /// - `mean`: The state's mean vector (8 dimensional array).
    /// - `measurement`: The 4 dimensional measurement vector (x, y, a, h), where (x, y) is the center position, a the aspect ratio, and h the height of the bounding box.
    ///
    /// # Returns
    ///
    /// The mean vector (8 dimensional) of the measurement-corrected state.
    pub fn update(&self, mean: &Array1<f32>, measurement: &Array1<f32>) -> Array1<f32> {
        let predicted = mean.slice(s![..4]).to_owned();
        let velocity = mean.slice(s![4..]).to_owned();

        let residual = measurement - &predicted;
        let position = &predicted + &residual.mapv(|v| v * self.position_gain);
        let velocity = &velocity + &residual.mapv(|v| v * self.velocity_gain);

        concatenate![Axis(0), position, velocity]
    }
}
