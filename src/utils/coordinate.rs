use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Number of points in the landmark scheme.
pub const NUM_LANDMARKS: usize = 68;

/// Number of coordinate channels per point (x, y).
pub const NUM_COORDS: usize = 2;

/// Inner-lip corners (one-based 61 and 65), used for mouth width.
pub const MOUTH_CORNER_RIGHT: usize = 60;
pub const MOUTH_CORNER_LEFT: usize = 64;

/// Inner upper lip (one-based 62, 63, 64) paired with the inner lower lip
/// point directly below it (one-based 68, 67, 66). This differs on purpose
/// from pairing the points in index order (61-65, 62-66, 63-67), which
/// measures diagonally across the mouth.
pub const INNER_LIP_PAIRS: [(usize, usize); 3] = [(61, 67), (62, 66), (63, 65)];

/// A 2-D landmark coordinate. A point with a NaN coordinate carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub const SENTINEL: LandmarkPoint = LandmarkPoint {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub const fn new(x: f64, y: f64) -> Self {
        LandmarkPoint { x, y }
    }

    pub fn is_missing(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite())
    }

    /// Euclidean distance, `None` when either point is missing.
    pub fn distance(&self, other: &LandmarkPoint) -> Option<f64> {
        if self.is_missing() || other.is_missing() {
            return None;
        }
        Some((self.x - other.x).hypot(self.y - other.y))
    }
}

/// Anatomical regions of the 68-point scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkRegion {
    Jaw,
    EyebrowRight,
    EyebrowLeft,
    Nose,
    EyeRight,
    EyeLeft,
    LipsOuter,
    LipsInner,
    Mouth,
    Full,
}

impl LandmarkRegion {
    pub fn range(&self) -> Range<usize> {
        match self {
            LandmarkRegion::Jaw => 0..17,
            LandmarkRegion::EyebrowRight => 17..22,
            LandmarkRegion::EyebrowLeft => 22..27,
            LandmarkRegion::Nose => 27..36,
            LandmarkRegion::EyeRight => 36..42,
            LandmarkRegion::EyeLeft => 42..48,
            LandmarkRegion::LipsOuter => 48..60,
            LandmarkRegion::LipsInner => 60..68,
            LandmarkRegion::Mouth => 48..68,
            LandmarkRegion::Full => 0..NUM_LANDMARKS,
        }
    }
}
