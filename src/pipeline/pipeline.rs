use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::config::{PipelineConfig, ResampleConfig};
use crate::error::Result;
use crate::helper::closed_mouth::find_closed_mouth_frame;
use crate::helper::procrustes::{AlignedSeries, ShapeAligner};
use crate::helper::resample::Resampler;
use crate::modules::frame_source::FrameSource;
use crate::modules::landmark_extractor::LandmarkExtractor;
use crate::series::cache::load_or_extract;
use crate::series::series::{LandmarkFrame, LandmarkSeries};
use crate::utils::npy::{read_template, write_series};

/// Output of `IdentityNormalizer::remove_identity`.
#[derive(Debug, Clone)]
pub struct IdentityRemoved {
    /// Resampled series translated onto the template.
    pub series: LandmarkSeries,
    /// Index of the closed mouth frame in `series`.
    pub closed_mouth_frame: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityNormalizer {
    resampler: Resampler,
}

impl IdentityNormalizer {

    /// new initializes new instance of the identity normalizer
    ///
    /// # Arguments
    /// * `resample` - Source and canonical target frame rates
    pub fn new(resample: ResampleConfig) -> Self {
        IdentityNormalizer {
            resampler: Resampler::new(resample),
        }
    }

    /// remove_identity resamples the series to the target rate and translates
    /// every frame by `template - closed_mouth_frame`.
    ///
    /// The closed mouth frame of the output equals the template.
    ///
    /// # Arguments
    /// * `series` - Landmarks at the source frame rate, usually already aligned
    /// * `template` - Canonical closed-mouth pose
    /// * `zscore_threshold` - Mouth width band for closed mouth candidates
    ///
    /// # Returns
    /// * `Result<IdentityRemoved>`
    pub fn remove_identity(
        &self,
        series: &LandmarkSeries,
        template: &LandmarkFrame,
        zscore_threshold: f64,
    ) -> Result<IdentityRemoved> {
        let resampled = self.resampler.resample(series)?;
        let closed_mouth_frame = find_closed_mouth_frame(&resampled, zscore_threshold)?;
        let reference = resampled.frame(closed_mouth_frame);
        info!(
            frames = resampled.len(),
            closed_mouth_frame,
            "removing identity offset"
        );
        Ok(IdentityRemoved {
            series: resampled.offset_by(&reference, template),
            closed_mouth_frame,
        })
    }

    /// remove_identity_to runs `remove_identity` and persists the result.
    ///
    /// # Arguments
    /// * `file_out` - Destination `.npy`, parent directories are created
    ///
    /// # Returns
    /// * `Result<IdentityRemoved>`
    pub fn remove_identity_to(
        &self,
        series: &LandmarkSeries,
        template: &LandmarkFrame,
        zscore_threshold: f64,
        file_out: &Path,
    ) -> Result<IdentityRemoved> {
        let removed = self.remove_identity(series, template, zscore_threshold)?;
        write_series(file_out, &removed.series)?;
        info!(path = %file_out.display(), "saved identity removed landmarks");
        Ok(removed)
    }
}

/// Everything produced by one `LandmarkPipeline::run`.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub raw: LandmarkSeries,
    pub aligned: AlignedSeries,
    pub normalized: IdentityRemoved,
    pub output_path: Option<PathBuf>,
}

/// Extraction, alignment and identity removal driven by a `PipelineConfig`.
#[derive(Debug, Clone)]
pub struct LandmarkPipeline {
    config: PipelineConfig,
    aligner: ShapeAligner,
    normalizer: IdentityNormalizer,
}

impl LandmarkPipeline {

    /// new initializes new instance of the pipeline
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration
    pub fn new(config: PipelineConfig) -> Self {
        LandmarkPipeline {
            aligner: ShapeAligner::new(config.alignment.clone()),
            normalizer: IdentityNormalizer::new(config.resample.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// run loads or extracts landmarks, aligns them to their mean shape and
    /// removes the identity offset against the configured template.
    ///
    /// # Arguments
    /// * `frame_source` - Frames to extract from on a cache miss
    /// * `extractor` - Per-frame landmark extractor
    ///
    /// # Returns
    /// * `Result<PipelineOutput>`
    pub fn run<S, E>(&self, frame_source: &S, extractor: &mut E) -> Result<PipelineOutput>
    where
        S: FrameSource + ?Sized,
        E: LandmarkExtractor + ?Sized,
    {
        let raw = load_or_extract(
            &self.config.cache.path,
            frame_source,
            extractor,
            self.config.cache.force_extract,
        )?;
        let template = read_template(&self.config.template_path)?;
        self.normalize(raw, &template)
    }

    /// normalize runs alignment and identity removal on an in-memory series.
    pub fn normalize(&self, raw: LandmarkSeries, template: &LandmarkFrame) -> Result<PipelineOutput> {
        let aligned = self.aligner.align_configured(&raw)?;
        let zscore = self.config.identity.zscore_threshold;
        let normalized = match &self.config.output_path {
            Some(path) => self.normalizer.remove_identity_to(&aligned.series, template, zscore, path)?,
            None => self.normalizer.remove_identity(&aligned.series, template, zscore)?,
        };
        Ok(PipelineOutput {
            raw,
            aligned,
            normalized,
            output_path: self.config.output_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::utils::coordinate::{LandmarkPoint, INNER_LIP_PAIRS, MOUTH_CORNER_LEFT, MOUTH_CORNER_RIGHT, NUM_LANDMARKS};
    use crate::utils::npy::read_series;

    fn face(shift: f64, width: f64, gap: f64) -> LandmarkFrame {
        let mut points: Vec<LandmarkPoint> = (0..NUM_LANDMARKS)
            .map(|i| LandmarkPoint::new(shift + (i % 9) as f64 * 4.0, shift * 0.5 + (i / 9) as f64 * 5.0))
            .collect();
        points[MOUTH_CORNER_RIGHT] = LandmarkPoint::new(shift, 50.0);
        points[MOUTH_CORNER_LEFT] = LandmarkPoint::new(shift + width, 50.0);
        for (k, &(top, bottom)) in INNER_LIP_PAIRS.iter().enumerate() {
            let x = shift + width * (k + 1) as f64 / 4.0;
            points[top] = LandmarkPoint::new(x, 50.0 - gap / 2.0);
            points[bottom] = LandmarkPoint::new(x, 50.0 + gap / 2.0);
        }
        LandmarkFrame::from_points(&points).unwrap()
    }

    fn template() -> LandmarkFrame {
        let points: Vec<LandmarkPoint> = (0..NUM_LANDMARKS)
            .map(|i| LandmarkPoint::new(i as f64 * 0.01, -(i as f64) * 0.02))
            .collect();
        LandmarkFrame::from_points(&points).unwrap()
    }

    fn talking_series(n: usize) -> LandmarkSeries {
        let frames: Vec<LandmarkFrame> = (0..n)
            .map(|i| {
                let phase = i as f64 * 0.7;
                face(i as f64 * 0.3, 20.0 + phase.sin(), 1.0 + 4.0 * phase.cos().abs())
            })
            .collect();
        LandmarkSeries::from_frames(&frames)
    }

    #[test]
    fn test_closed_mouth_frame_matches_template() {
        let normalizer = IdentityNormalizer::default();
        let series = talking_series(30);
        let out = normalizer.remove_identity(&series, &template(), 1.3).unwrap();

        assert_eq!(out.series.len(), 25);
        let closed = out.series.frame(out.closed_mouth_frame);
        for (a, b) in closed.view().iter().zip(template().view().iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_offset_is_rigid_translation() {
        let normalizer = IdentityNormalizer::new(ResampleConfig {
            source_rate: 25.0,
            target_rate: 25.0,
        });
        let series = talking_series(12);
        let out = normalizer.remove_identity(&series, &template(), 1.3).unwrap();
        let c = out.closed_mouth_frame;
        for f in 0..series.len() {
            for p in [0, 30, 66] {
                let before = series.point(f, p).x - series.point(c, p).x;
                let after = out.series.point(f, p).x - out.series.point(c, p).x;
                assert!((before - after).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_sentinel_frames_stay_missing() {
        let mut frames: Vec<LandmarkFrame> = talking_series(10).frames().collect();
        frames[4] = LandmarkFrame::sentinel();
        let series = LandmarkSeries::from_frames(&frames);
        let normalizer = IdentityNormalizer::new(ResampleConfig {
            source_rate: 30.0,
            target_rate: 30.0,
        });
        let out = normalizer.remove_identity(&series, &template(), 1.3).unwrap();
        assert_ne!(out.closed_mouth_frame, 4);
        assert!(out.series.frame(4).is_sentinel());
    }

    #[test]
    fn test_degenerate_series_is_reported() {
        let series = LandmarkSeries::from_frames(&vec![LandmarkFrame::sentinel(); 6]);
        let err = IdentityNormalizer::default()
            .remove_identity(&series, &template(), 1.3)
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateSeries));
    }

    #[test]
    fn test_remove_identity_to_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity_removed").join("clip.ir.npy");
        let out = IdentityNormalizer::default()
            .remove_identity_to(&talking_series(30), &template(), 1.3, &path)
            .unwrap();
        assert_eq!(read_series(&path).unwrap(), out.series);
    }

    #[test]
    fn test_pipeline_normalize_in_memory() {
        let mut config = PipelineConfig::new("unused.npy", "unused.npy");
        config.identity.zscore_threshold = 1.3;
        let pipeline = LandmarkPipeline::new(config);
        let out = pipeline.normalize(talking_series(30), &template()).unwrap();
        assert_eq!(out.raw.len(), 30);
        assert_eq!(out.aligned.series.len(), 30);
        assert_eq!(out.normalized.series.len(), 25);
        assert!(out.output_path.is_none());
    }
}
