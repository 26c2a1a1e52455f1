use std::ops::Range;

use nalgebra::{Matrix2, Vector2};
use ndarray::{s, Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::config::AlignmentConfig;
use crate::error::{Error, Result};
use crate::series::series::{LandmarkFrame, LandmarkSeries};
use crate::utils::coordinate::{LandmarkRegion, NUM_COORDS, NUM_LANDMARKS};

const SVD_MAX_ITERATIONS: usize = 1000;

/// Result of aligning a series onto its mean shape.
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    /// Fitted frames in the standardized mean shape's coordinates (centred,
    /// unit Frobenius norm). Slots outside `subset` and unfit frames are NaN.
    pub series: LandmarkSeries,
    /// Coordinate-wise mean of the valid input frames, in input coordinates.
    pub mean_shape: LandmarkFrame,
    /// Residual sum of squares per frame, `None` where no fit was made.
    pub disparities: Vec<Option<f64>>,
    pub subset: Range<usize>,
}

impl AlignedSeries {
    /// True when no input frame could be used, so nothing was aligned.
    pub fn is_degenerate(&self) -> bool {
        self.disparities.iter().all(Option::is_none)
    }

    pub fn into_series(self) -> LandmarkSeries {
        self.series
    }
}

/// Centred, unit-norm copy of a (k, 2) point set, `None` if all points coincide
/// or any point is missing.
fn standardize(points: ArrayView2<f64>) -> Option<Array2<f64>> {
    if points.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let centroid = points.mean_axis(Axis(0))?;
    let centred = &points - &centroid;
    let norm = centred.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm <= f64::EPSILON {
        return None;
    }
    Some(centred / norm)
}

/// Rotates and scales a standardized frame onto the standardized reference.
///
/// Returns the fitted points and the residual sum of squares.
fn fit(reference: &Array2<f64>, frame: &Array2<f64>, idx: usize) -> Result<(Array2<f64>, f64)> {
    let mut m = Matrix2::<f64>::zeros();
    for (r, f) in reference.outer_iter().zip(frame.outer_iter()) {
        m += Vector2::new(r[0], r[1]) * Vector2::new(f[0], f[1]).transpose();
    }

    let svd = m
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(Error::AlignmentDiverged { frame: idx })?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(Error::AlignmentDiverged { frame: idx }),
    };
    let rotation = u * v_t;
    let scale = svd.singular_values.sum();

    let mut fitted = Array2::<f64>::zeros(frame.raw_dim());
    for (mut out, f) in fitted.outer_iter_mut().zip(frame.outer_iter()) {
        let p = rotation * Vector2::new(f[0], f[1]) * scale;
        out[0] = p.x;
        out[1] = p.y;
    }
    let disparity = (reference - &fitted).iter().map(|v| v * v).sum();
    Ok((fitted, disparity))
}

/// Ordinary Procrustes superimposition of every frame onto the mean shape.
#[derive(Debug, Clone, Default)]
pub struct ShapeAligner {
    config: AlignmentConfig,
}

impl ShapeAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        ShapeAligner { config }
    }

    /// Aligns with the subset chosen by the configuration.
    pub fn align_configured(&self, series: &LandmarkSeries) -> Result<AlignedSeries> {
        let subset = self.config.lips_only.then(|| LandmarkRegion::Mouth.range());
        self.align(series, subset)
    }

    /// align fits each valid frame onto the mean of the valid frames.
    ///
    /// `subset` narrows the fit to a point range; other slots of the output
    /// are NaN. Sentinel input frames come out as sentinel frames.
    pub fn align(&self, series: &LandmarkSeries, subset: Option<Range<usize>>) -> Result<AlignedSeries> {
        let subset = subset.unwrap_or(0..NUM_LANDMARKS);
        if subset.is_empty() || subset.end > NUM_LANDMARKS {
            return Err(Error::InvalidShape {
                found: vec![subset.start, subset.end],
                expected: "a non-empty point range within 0..68",
            });
        }

        let n_frames = series.len();
        let mean_shape = series.mean_shape(&subset);
        let mut lmarks = Array3::from_elem((n_frames, NUM_LANDMARKS, NUM_COORDS), f64::NAN);
        let mut disparities = vec![None; n_frames];

        let reference = standardize(mean_shape.view().slice(s![subset.clone(), ..]));
        let Some(reference) = reference else {
            warn!(frames = n_frames, "no usable mean shape, aligned series is empty");
            return Ok(AlignedSeries {
                series: LandmarkSeries::new(lmarks)?,
                mean_shape,
                disparities,
                subset,
            });
        };

        let fit_frame = |idx: usize| -> Result<Option<(Array2<f64>, f64)>> {
            if !series.is_valid_in(idx, &subset) {
                return Ok(None);
            }
            match standardize(series.frame_view(idx).slice(s![subset.clone(), ..])) {
                Some(frame) => fit(&reference, &frame, idx).map(Some),
                None => {
                    warn!(frame_index = idx, "frame cannot be standardized, left missing");
                    Ok(None)
                }
            }
        };

        let fits: Vec<Option<(Array2<f64>, f64)>> = if self.config.parallel {
            (0..n_frames).into_par_iter().map(fit_frame).collect::<Result<_>>()?
        } else {
            (0..n_frames).map(fit_frame).collect::<Result<_>>()?
        };

        for (idx, fitted) in fits.into_iter().enumerate() {
            if let Some((points, disparity)) = fitted {
                lmarks.slice_mut(s![idx, subset.clone(), ..]).assign(&points);
                disparities[idx] = Some(disparity);
            }
        }
        debug!(
            frames = n_frames,
            aligned = disparities.iter().flatten().count(),
            "aligned series to mean shape"
        );

        Ok(AlignedSeries {
            series: LandmarkSeries::new(lmarks)?,
            mean_shape,
            disparities,
            subset,
        })
    }
}
