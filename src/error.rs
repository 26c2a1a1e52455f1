use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, WriteNpyError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no candidate frames with |z-score| below {threshold}")]
    EmptyCandidateSet { threshold: f64 },

    #[error("series contains no valid frames")]
    DegenerateSeries,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read array from {path}: {source}")]
    NpyRead {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },

    #[error("failed to write array to {path}: {source}")]
    NpyWrite {
        path: PathBuf,
        #[source]
        source: WriteNpyError,
    },

    #[error("invalid landmark array shape {found:?}, expected {expected}")]
    InvalidShape {
        found: Vec<usize>,
        expected: &'static str,
    },

    #[error("invalid frame rate conversion {old} -> {new}")]
    InvalidRate { old: f64, new: f64 },

    #[error("no frames available in {0}")]
    NoFrames(PathBuf),

    #[error("Procrustes fit did not converge for frame {frame}")]
    AlignmentDiverged { frame: usize },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
