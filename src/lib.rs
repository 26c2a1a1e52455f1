pub mod config;
pub mod error;
pub mod helper;
pub mod modules;
pub mod pipeline;
pub mod series;
pub mod utils;

pub use error::{Error, Result};
pub use helper::closed_mouth::{find_closed_mouth_frame, ClosedMouthDetector};
pub use helper::procrustes::{AlignedSeries, ShapeAligner};
pub use helper::resample::{resample, Resampler};
pub use pipeline::pipeline::{IdentityNormalizer, IdentityRemoved, LandmarkPipeline, PipelineOutput};
pub use series::cache::load_or_extract;
pub use series::series::{LandmarkFrame, LandmarkSeries};
pub use utils::coordinate::{LandmarkPoint, LandmarkRegion};
