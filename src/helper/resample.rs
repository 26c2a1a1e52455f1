use ndarray::{Array3, Axis};
use tracing::debug;

use crate::config::config::ResampleConfig;
use crate::error::{Error, Result};
use crate::series::series::LandmarkSeries;
use crate::utils::coordinate::{NUM_COORDS, NUM_LANDMARKS};

/// Number of frames after converting `n_frames` from `old_rate` to `new_rate`.
pub fn resampled_len(n_frames: usize, old_rate: f64, new_rate: f64) -> usize {
    (n_frames as f64 * new_rate / old_rate).round() as usize
}

/// `count` evenly spaced positions from 0 to `n_frames - 1`, both ends included.
fn sample_axis(n_frames: usize, count: usize) -> Vec<f64> {
    let last = n_frames.saturating_sub(1) as f64;
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = last / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { last } else { i as f64 * step })
                .collect()
        }
    }
}

/// Linear interpolation of `values` (sampled at 0, 1, .., len-1) at `t`.
///
/// A position on a grid index returns that value as is; otherwise a missing
/// neighbour makes the result missing. Positions outside the grid clamp.
fn interp(values: &[f64], t: f64) -> f64 {
    let last = values.len() - 1;
    if t <= 0.0 {
        return values[0];
    }
    if t >= last as f64 {
        return values[last];
    }
    let lo = t.floor() as usize;
    let frac = t - lo as f64;
    if frac == 0.0 {
        return values[lo];
    }
    values[lo] + (values[lo + 1] - values[lo]) * frac
}

/// resample converts a series between frame rates by interpolating every
/// coordinate channel independently over the frame-index axis.
pub fn resample(series: &LandmarkSeries, old_rate: f64, new_rate: f64) -> Result<LandmarkSeries> {
    let valid_rate = |r: f64| r.is_finite() && r > 0.0;
    if !valid_rate(old_rate) || !valid_rate(new_rate) {
        return Err(Error::InvalidRate {
            old: old_rate,
            new: new_rate,
        });
    }

    let n_frames = series.len();
    let count = if n_frames == 0 {
        0
    } else {
        resampled_len(n_frames, old_rate, new_rate)
    };
    let axis = sample_axis(n_frames, count);
    let mut lmarks = Array3::<f64>::zeros((count, NUM_LANDMARKS, NUM_COORDS));

    let src = series.as_array();
    for point in 0..NUM_LANDMARKS {
        for coord in 0..NUM_COORDS {
            let channel: Vec<f64> = src
                .index_axis(Axis(2), coord)
                .index_axis(Axis(1), point)
                .to_vec();
            for (out, &t) in axis.iter().enumerate() {
                lmarks[[out, point, coord]] = interp(&channel, t);
            }
        }
    }
    debug!(from = n_frames, to = count, old_rate, new_rate, "resampled series");
    LandmarkSeries::new(lmarks)
}

/// Resampler bound to a configured source and target rate.
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    config: ResampleConfig,
}

impl Resampler {
    pub fn new(config: ResampleConfig) -> Self {
        Resampler { config }
    }

    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    pub fn resample(&self, series: &LandmarkSeries) -> Result<LandmarkSeries> {
        resample(series, self.config.source_rate, self.config.target_rate)
    }
}
