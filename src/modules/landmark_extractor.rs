use anyhow::Result;
use tracing::warn;

use crate::series::series::LandmarkFrame;
use crate::utils::coordinate::{LandmarkPoint, NUM_LANDMARKS};

/// Per-frame landmark extraction. Total by contract: a frame without a usable
/// face yields `LandmarkFrame::sentinel()`, never an error.
pub trait LandmarkExtractor {
    fn extract(&mut self, frame_index: usize) -> LandmarkFrame;
}

impl<F> LandmarkExtractor for F
where
    F: FnMut(usize) -> LandmarkFrame,
{
    fn extract(&mut self, frame_index: usize) -> LandmarkFrame {
        self(frame_index)
    }
}

/// A fallible detector, e.g. a face detector followed by a shape predictor.
/// `Ok(None)` means no face was found.
pub trait LandmarkDetector {
    fn detect(&mut self, frame_index: usize) -> Result<Option<Vec<LandmarkPoint>>>;
}

/// Adapts a `LandmarkDetector` into a total extractor.
#[derive(Debug, Clone)]
pub struct SentinelOnFailure<D> {
    detector: D,
}

impl<D: LandmarkDetector> SentinelOnFailure<D> {
    pub fn new(detector: D) -> Self {
        SentinelOnFailure { detector }
    }

    pub fn into_inner(self) -> D {
        self.detector
    }
}

impl<D: LandmarkDetector> LandmarkExtractor for SentinelOnFailure<D> {
    fn extract(&mut self, frame_index: usize) -> LandmarkFrame {
        let points = match self.detector.detect(frame_index) {
            Ok(Some(points)) => points,
            Ok(None) => return LandmarkFrame::sentinel(),
            Err(e) => {
                warn!(frame_index, error = %e, "landmark detection failed");
                return LandmarkFrame::sentinel();
            }
        };
        if points.len() != NUM_LANDMARKS {
            warn!(frame_index, found = points.len(), "unexpected landmark count");
            return LandmarkFrame::sentinel();
        }
        LandmarkFrame::from_points(&points).unwrap_or_else(|_| LandmarkFrame::sentinel())
    }
}
