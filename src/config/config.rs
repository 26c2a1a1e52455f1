use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Fit the mouth points (48..68) only.
    pub lips_only: bool,
    /// Fit frames on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            lips_only: false,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResampleConfig {
    pub source_rate: f64,
    pub target_rate: f64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        ResampleConfig {
            source_rate: 30.0,
            target_rate: 25.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClosedMouthConfig {
    pub zscore_threshold: f64,
}

impl Default for ClosedMouthConfig {
    fn default() -> Self {
        ClosedMouthConfig {
            zscore_threshold: 1.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    pub zscore_threshold: f64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            zscore_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub force_extract: bool,
}

impl CacheConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CacheConfig {
            path: path.into(),
            force_extract: false,
        }
    }
}

/// Everything `LandmarkPipeline::run` needs. Paths have no defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub template_path: PathBuf,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl PipelineConfig {
    pub fn new(cache_path: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            cache: CacheConfig::new(cache_path),
            template_path: template_path.into(),
            output_path: None,
            alignment: AlignmentConfig::default(),
            resample: ResampleConfig::default(),
            identity: IdentityConfig::default(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
