use std::ops::Range;

use ndarray::{s, Array2, Array3, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::utils::coordinate::{LandmarkPoint, NUM_COORDS, NUM_LANDMARKS};

/// One frame of 68 landmark points, stored as a (68, 2) array.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: Array2<f64>,
}

impl LandmarkFrame {
    pub fn new(points: Array2<f64>) -> Result<Self> {
        if points.dim() != (NUM_LANDMARKS, NUM_COORDS) {
            return Err(Error::InvalidShape {
                found: points.shape().to_vec(),
                expected: "(68, 2)",
            });
        }
        Ok(LandmarkFrame { points })
    }

    pub fn from_points(points: &[LandmarkPoint]) -> Result<Self> {
        let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
        let arr = Array2::from_shape_vec((points.len(), NUM_COORDS), flat).map_err(|_| {
            Error::InvalidShape {
                found: vec![points.len(), NUM_COORDS],
                expected: "(68, 2)",
            }
        })?;
        Self::new(arr)
    }

    /// The "no detection" frame: every point missing.
    pub fn sentinel() -> Self {
        LandmarkFrame {
            points: Array2::from_elem((NUM_LANDMARKS, NUM_COORDS), f64::NAN),
        }
    }

    pub fn point(&self, idx: usize) -> LandmarkPoint {
        LandmarkPoint::new(self.points[[idx, 0]], self.points[[idx, 1]])
    }

    pub fn points(&self) -> impl Iterator<Item = LandmarkPoint> + '_ {
        (0..NUM_LANDMARKS).map(|idx| self.point(idx))
    }

    pub fn is_sentinel(&self) -> bool {
        self.points.iter().all(|v| v.is_nan())
    }

    pub fn has_missing(&self) -> bool {
        self.points().any(|p| p.is_missing())
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    pub fn into_array(self) -> Array2<f64> {
        self.points
    }
}

/// Frame-ordered landmark sets with shape (N, 68, 2). Missing points are NaN.
///
/// The frame rate is not stored here; callers track it next to the series.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSeries {
    lmarks: Array3<f64>,
}

impl LandmarkSeries {
    pub fn new(lmarks: Array3<f64>) -> Result<Self> {
        let (_, points, coords) = lmarks.dim();
        if points != NUM_LANDMARKS || coords != NUM_COORDS {
            return Err(Error::InvalidShape {
                found: lmarks.shape().to_vec(),
                expected: "(N, 68, 2)",
            });
        }
        Ok(LandmarkSeries { lmarks })
    }

    pub fn empty() -> Self {
        LandmarkSeries {
            lmarks: Array3::zeros((0, NUM_LANDMARKS, NUM_COORDS)),
        }
    }

    pub fn from_frames(frames: &[LandmarkFrame]) -> Self {
        let mut lmarks = Array3::from_elem((frames.len(), NUM_LANDMARKS, NUM_COORDS), f64::NAN);
        for (mut dst, frame) in lmarks.axis_iter_mut(Axis(0)).zip(frames) {
            dst.assign(&frame.points);
        }
        LandmarkSeries { lmarks }
    }

    pub fn len(&self) -> usize {
        self.lmarks.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame(&self, idx: usize) -> LandmarkFrame {
        LandmarkFrame {
            points: self.lmarks.index_axis(Axis(0), idx).to_owned(),
        }
    }

    pub fn frame_view(&self, idx: usize) -> ArrayView2<'_, f64> {
        self.lmarks.index_axis(Axis(0), idx)
    }

    pub fn frames(&self) -> impl Iterator<Item = LandmarkFrame> + '_ {
        (0..self.len()).map(|idx| self.frame(idx))
    }

    pub fn point(&self, frame: usize, idx: usize) -> LandmarkPoint {
        LandmarkPoint::new(self.lmarks[[frame, idx, 0]], self.lmarks[[frame, idx, 1]])
    }

    /// A frame counts as valid when the first point of `range` is present.
    pub fn is_valid_in(&self, frame: usize, range: &Range<usize>) -> bool {
        !self.point(frame, range.start).is_missing()
    }

    pub fn is_valid(&self, frame: usize) -> bool {
        self.is_valid_in(frame, &(0..NUM_LANDMARKS))
    }

    pub fn valid_frame_count(&self) -> usize {
        (0..self.len()).filter(|&idx| self.is_valid(idx)).count()
    }

    /// Coordinate-wise mean over the frames valid in `range`.
    ///
    /// Each coordinate averages only the frames where it is present. Slots
    /// outside `range`, and slots no valid frame provides, are NaN.
    pub fn mean_shape(&self, range: &Range<usize>) -> LandmarkFrame {
        let mut mean = Array2::from_elem((NUM_LANDMARKS, NUM_COORDS), f64::NAN);
        let mut sum = Array2::<f64>::zeros((range.len(), NUM_COORDS));
        let mut count = Array2::<usize>::zeros((range.len(), NUM_COORDS));
        for idx in (0..self.len()).filter(|&idx| self.is_valid_in(idx, range)) {
            let frame = self.lmarks.slice(s![idx, range.clone(), ..]);
            for ((acc, c), &v) in sum.iter_mut().zip(count.iter_mut()).zip(frame.iter()) {
                if v.is_finite() {
                    *acc += v;
                    *c += 1;
                }
            }
        }
        let mut dst = mean.slice_mut(s![range.clone(), ..]);
        for ((m, &acc), &c) in dst.iter_mut().zip(sum.iter()).zip(count.iter()) {
            if c > 0 {
                *m = acc / c as f64;
            }
        }
        LandmarkFrame { points: mean }
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.lmarks
    }

    pub fn into_array(self) -> Array3<f64> {
        self.lmarks
    }

    /// Translates every frame by `target - reference`.
    pub fn offset_by(&self, reference: &LandmarkFrame, target: &LandmarkFrame) -> LandmarkSeries {
        let delta = &target.points - &reference.points;
        let mut lmarks = self.lmarks.clone();
        for mut frame in lmarks.axis_iter_mut(Axis(0)) {
            frame += &delta;
        }
        LandmarkSeries { lmarks }
    }
}
