use rayon::prelude::*;
use tracing::debug;

use crate::config::config::ClosedMouthConfig;
use crate::error::{Error, Result};
use crate::series::series::LandmarkSeries;
use crate::utils::coordinate::{INNER_LIP_PAIRS, MOUTH_CORNER_LEFT, MOUTH_CORNER_RIGHT};
use crate::utils::utils::{nan_argmin, nan_zscore};

/// Distance between the inner mouth corners of every frame.
pub fn mouth_widths(series: &LandmarkSeries) -> Vec<Option<f64>> {
    (0..series.len())
        .into_par_iter()
        .map(|idx| {
            series
                .point(idx, MOUTH_CORNER_RIGHT)
                .distance(&series.point(idx, MOUTH_CORNER_LEFT))
        })
        .collect()
}

/// Summed distance between facing inner upper and lower lip points.
pub fn lip_gap(series: &LandmarkSeries, frame: usize) -> Option<f64> {
    INNER_LIP_PAIRS
        .iter()
        .map(|&(top, bottom)| series.point(frame, top).distance(&series.point(frame, bottom)))
        .sum()
}

/// Frames whose mouth width z-score lies strictly inside `zscore_threshold`.
///
/// Fails with `DegenerateSeries` when no frame has a measurable width.
pub fn candidate_frames(series: &LandmarkSeries, zscore_threshold: f64) -> Result<Vec<usize>> {
    let widths = mouth_widths(series);
    if widths.iter().all(Option::is_none) {
        return Err(Error::DegenerateSeries);
    }
    Ok(nan_zscore(&widths)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, z)| z.filter(|z| z.abs() < zscore_threshold).map(|_| idx))
        .collect())
}

/// find_closed_mouth_frame picks the frame with the smallest inner lip gap
/// among frames with an unremarkable mouth width.
pub fn find_closed_mouth_frame(series: &LandmarkSeries, zscore_threshold: f64) -> Result<usize> {
    let candidates = candidate_frames(series, zscore_threshold)?;
    let gaps: Vec<Option<f64>> = candidates
        .par_iter()
        .map(|&idx| lip_gap(series, idx))
        .collect();
    let best = nan_argmin(&gaps).ok_or(Error::EmptyCandidateSet {
        threshold: zscore_threshold,
    })?;
    let frame = candidates[best];
    debug!(
        frames = series.len(),
        candidates = candidates.len(),
        frame,
        "found closed mouth frame"
    );
    Ok(frame)
}

#[derive(Debug, Clone, Default)]
pub struct ClosedMouthDetector {
    config: ClosedMouthConfig,
}

impl ClosedMouthDetector {
    pub fn new(config: ClosedMouthConfig) -> Self {
        ClosedMouthDetector { config }
    }

    /// Uses the configured z-score threshold.
    pub fn detect(&self, series: &LandmarkSeries) -> Result<usize> {
        find_closed_mouth_frame(series, self.config.zscore_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::series::LandmarkFrame;
    use crate::utils::coordinate::{LandmarkPoint, NUM_LANDMARKS};

    /// A mouth with the given corner distance and lip opening.
    fn mouth(width: f64, gap: f64) -> LandmarkFrame {
        let mut points = vec![LandmarkPoint::new(0.0, 0.0); NUM_LANDMARKS];
        points[MOUTH_CORNER_RIGHT] = LandmarkPoint::new(0.0, 0.0);
        points[MOUTH_CORNER_LEFT] = LandmarkPoint::new(width, 0.0);
        for (k, &(top, bottom)) in INNER_LIP_PAIRS.iter().enumerate() {
            let x = width * (k + 1) as f64 / 4.0;
            points[top] = LandmarkPoint::new(x, -gap / 2.0);
            points[bottom] = LandmarkPoint::new(x, gap / 2.0);
        }
        LandmarkFrame::from_points(&points).unwrap()
    }

    #[test]
    fn test_lip_gap_sums_pairs() {
        let series = LandmarkSeries::from_frames(&[mouth(20.0, 2.0)]);
        assert!((lip_gap(&series, 0).unwrap() - 6.0).abs() < 1e-12);
        assert_eq!(mouth_widths(&series), vec![Some(20.0)]);
    }

    #[test]
    fn test_wide_outlier_excluded_from_candidates() {
        let mut frames: Vec<LandmarkFrame> = (0..9).map(|i| mouth(20.0, 3.0 + i as f64)).collect();
        // widest mouth also has the smallest gap; it must not win
        frames.push(mouth(40.0, 0.0));
        let series = LandmarkSeries::from_frames(&frames);

        let candidates = candidate_frames(&series, 1.3).unwrap();
        assert_eq!(candidates, (0..9).collect::<Vec<_>>());
        assert_eq!(find_closed_mouth_frame(&series, 1.3).unwrap(), 0);
    }

    #[test]
    fn test_picks_minimum_gap() {
        let gaps = [5.0, 4.0, 0.5, 3.0, 0.5, 6.0];
        let frames: Vec<LandmarkFrame> = gaps
            .iter()
            .enumerate()
            .map(|(i, &g)| mouth(20.0 + (i % 2) as f64, g))
            .collect();
        let series = LandmarkSeries::from_frames(&frames);
        assert_eq!(find_closed_mouth_frame(&series, 1.3).unwrap(), 2);
        // deterministic
        for _ in 0..5 {
            assert_eq!(ClosedMouthDetector::default().detect(&series).unwrap(), 2);
        }
    }

    #[test]
    fn test_sentinel_frames_never_chosen() {
        let series = LandmarkSeries::from_frames(&[
            mouth(20.0, 4.0),
            LandmarkFrame::sentinel(),
            mouth(21.0, 1.0),
            LandmarkFrame::sentinel(),
        ]);
        assert_eq!(candidate_frames(&series, 1.3).unwrap(), vec![0, 2]);
        assert_eq!(find_closed_mouth_frame(&series, 1.3).unwrap(), 2);
    }

    #[test]
    fn test_threshold_near_zero_is_empty_candidate_set() {
        let mut frames: Vec<LandmarkFrame> = (0..5).map(|_| mouth(20.0, 2.0)).collect();
        frames.push(mouth(60.0, 2.0));
        let series = LandmarkSeries::from_frames(&frames);
        let err = find_closed_mouth_frame(&series, 1e-6).unwrap_err();
        assert!(matches!(err, Error::EmptyCandidateSet { .. }));
    }

    #[test]
    fn test_all_sentinel_is_degenerate() {
        let series = LandmarkSeries::from_frames(&vec![LandmarkFrame::sentinel(); 4]);
        assert!(matches!(find_closed_mouth_frame(&series, 1.3), Err(Error::DegenerateSeries)));
        assert!(matches!(
            find_closed_mouth_frame(&LandmarkSeries::empty(), 1.3),
            Err(Error::DegenerateSeries)
        ));
    }

    #[test]
    fn test_constant_width_keeps_every_frame() {
        let frames: Vec<LandmarkFrame> = [3.0, 1.0, 2.0].iter().map(|&g| mouth(20.0, g)).collect();
        let series = LandmarkSeries::from_frames(&frames);
        assert_eq!(candidate_frames(&series, 1.3).unwrap(), vec![0, 1, 2]);
        assert_eq!(find_closed_mouth_frame(&series, 1.3).unwrap(), 1);
    }
}
