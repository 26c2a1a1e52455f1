use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{s, Array2, Array3};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::series::series::{LandmarkFrame, LandmarkSeries};
use crate::utils::coordinate::{NUM_COORDS, NUM_LANDMARKS};

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::io(path, e))
}

/// read_series loads an (N, 68, 2) float64 array as a landmark series.
pub fn read_series(path: &Path) -> Result<LandmarkSeries> {
    let arr = Array3::<f64>::read_npy(open(path)?).map_err(|source| Error::NpyRead {
        path: path.to_path_buf(),
        source,
    })?;
    LandmarkSeries::new(arr)
}

/// write_series persists the series so that the target path either keeps its
/// previous content or holds the complete new array.
pub fn write_series(path: &Path, series: &LandmarkSeries) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let mut writer = BufWriter::new(tmp);
    series
        .as_array()
        .write_npy(&mut writer)
        .map_err(|source| Error::NpyWrite {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    let tmp = writer
        .into_inner()
        .map_err(|e| Error::io(path, e.into_error()))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// read_template loads a template pose. The file may be float64 or float32
/// and hold extra points and channels; only the first 68 rows and the x, y
/// columns are kept.
pub fn read_template(path: &Path) -> Result<LandmarkFrame> {
    let arr = match Array2::<f64>::read_npy(open(path)?) {
        Ok(arr) => arr,
        Err(ReadNpyError::WrongDescriptor(_)) => Array2::<f32>::read_npy(open(path)?)
            .map_err(|source| Error::NpyRead {
                path: path.to_path_buf(),
                source,
            })?
            .mapv(f64::from),
        Err(source) => {
            return Err(Error::NpyRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let (rows, cols) = arr.dim();
    if rows < NUM_LANDMARKS || cols < NUM_COORDS {
        return Err(Error::InvalidShape {
            found: vec![rows, cols],
            expected: "(>=68, >=2)",
        });
    }
    LandmarkFrame::new(arr.slice(s![..NUM_LANDMARKS, ..NUM_COORDS]).to_owned())
}
