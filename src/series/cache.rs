use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::modules::frame_source::FrameSource;
use crate::modules::landmark_extractor::LandmarkExtractor;
use crate::series::series::{LandmarkFrame, LandmarkSeries};
use crate::utils::npy::{read_series, write_series};

/// load_or_extract returns the cached series at `cache_path` when present,
/// otherwise extracts every available frame and persists the result.
///
/// # Arguments
/// * `cache_path` - `.npy` file holding an (N, 68, 2) array
/// * `frame_source` - Lists frame indices, asked to acquire frames if it has none
/// * `extractor` - Called once per frame index, in ascending order
/// * `force_extract` - Ignore an existing cache and extract again
///
/// # Returns
/// * `Result<LandmarkSeries>`
pub fn load_or_extract<S, E>(
    cache_path: &Path,
    frame_source: &S,
    extractor: &mut E,
    force_extract: bool,
) -> Result<LandmarkSeries>
where
    S: FrameSource + ?Sized,
    E: LandmarkExtractor + ?Sized,
{
    if !force_extract && cache_path.is_file() {
        let series = read_series(cache_path)?;
        info!(path = %cache_path.display(), frames = series.len(), "loaded cached landmarks");
        return Ok(series);
    }

    let series = extract_all(frame_source, extractor)?;
    write_series(cache_path, &series)?;
    info!(
        path = %cache_path.display(),
        frames = series.len(),
        valid = series.valid_frame_count(),
        "cached extracted landmarks"
    );
    Ok(series)
}

/// extract_all runs the extractor over every frame of the source.
pub fn extract_all<S, E>(frame_source: &S, extractor: &mut E) -> Result<LandmarkSeries>
where
    S: FrameSource + ?Sized,
    E: LandmarkExtractor + ?Sized,
{
    let mut indices = frame_source.frame_indices()?;
    if indices.is_empty() {
        info!(location = %frame_source.location().display(), "no frames found, acquiring");
        frame_source.acquire_frames()?;
        indices = frame_source.frame_indices()?;
    }
    if indices.is_empty() {
        return Err(Error::NoFrames(frame_source.location()));
    }

    let mut frames = Vec::with_capacity(indices.len());
    for idx in indices {
        debug!(frame_index = idx, "extracting landmarks");
        let mut frame = extractor.extract(idx);
        if !frame.is_sentinel() && frame.has_missing() {
            warn!(frame_index = idx, "partial detection stored as missing frame");
            frame = LandmarkFrame::sentinel();
        }
        frames.push(frame);
    }
    Ok(LandmarkSeries::from_frames(&frames))
}
