pub mod dataset;
pub mod metadata;
pub mod usv;

use std::path::{Path, PathBuf};
use std::{fmt, io};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("missing required file: {0}")]
    MissingFile(String),
    #[error("{file} is missing required column: {column}")]
    MissingColumn { file: String, column: String },
    #[error("invalid CSV row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
    #[error("file has no header row: {0}")]
    EmptyFile(PathBuf),
    #[error("no data was aggregated from any USV file listed in {0}")]
    NoData(String),
    #[error("unsupported gzip input without feature enabled: {0}")]
    GzipNotEnabled(PathBuf),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub fn open_reader(path: &Path) -> Result<Box<dyn io::BufRead>, InputError> {
    let file = std::fs::File::open(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        #[cfg(feature = "gz")]
        {
            let decoder = flate2::read::GzDecoder::new(file);
            return Ok(Box::new(io::BufReader::new(decoder)));
        }
        #[cfg(not(feature = "gz"))]
        {
            return Err(InputError::GzipNotEnabled(path.to_path_buf()));
        }
    }
    Ok(Box::new(io::BufReader::new(file)))
}

/// CSV reader over `open_reader` with trimmed cells and ragged rows allowed.
pub fn csv_reader(path: &Path) -> Result<csv::Reader<Box<dyn io::BufRead>>, InputError> {
    let reader = open_reader(path)?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader))
}

pub fn path_display(path: &Path) -> impl fmt::Display + '_ {
    path.to_string_lossy()
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/mod.rs"]
mod tests;
