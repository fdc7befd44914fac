use serde::{Deserialize, Serialize};

/// Gaze direction target: pitch (`theta1`) and yaw (`theta2`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeAngles {
    pub theta1: f32,
    pub theta2: f32,
}

impl GazeAngles {
    pub fn new(theta1: f32, theta2: f32) -> Self {
        Self { theta1, theta2 }
    }
}

/// One row of `gaze/labels.csv`. Image paths are relative to the gaze dataset directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeLabelRow {
    pub left_image: String,
    pub right_image: String,
    pub theta1: f32,
    pub theta2: f32,
}

/// A gaze record as stored in the `training_data` table
#[derive(Debug, Clone)]
pub struct GazeRecord {
    pub rowid: i64,
    pub left_frame: String,
    pub right_frame: String,
    pub theta1: Option<f64>,
    pub theta2: Option<f64>,
}

/// An openness record as stored in the `training_data` table
#[derive(Debug, Clone)]
pub struct OpennessRecord {
    pub rowid: i64,
    pub left_frame: String,
    pub right_frame: String,
    pub openness: Option<f64>,
}

/// Target size for eye crops, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of a left+right pair laid side by side
    pub fn combined_width(&self) -> u32 {
        self.width * 2
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self { width: 128, height: 128 }
    }
}
