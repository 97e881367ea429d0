use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::input::InputError;
use crate::input::dataset::{SkippedFile, load_dataset};
use crate::model::dataset::{Dataset, Factor};

#[derive(Debug, Error)]
pub enum Stage1Error {
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("input folder does not exist: {0}")]
    MissingFolder(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AnalysisCtx {
    pub input_dir: PathBuf,
    pub metadata_path: PathBuf,
    pub dataset: Dataset,
    pub skipped: Vec<SkippedFile>,
    pub metadata_rows: usize,
    pub n_animals: usize,
    pub factors: Vec<Factor>,
    pub metrics: Vec<String>,
}

pub fn run_stage1(input_dir: &Path, metadata_name: &str) -> Result<AnalysisCtx, Stage1Error> {
    if !input_dir.is_dir() {
        return Err(Stage1Error::MissingFolder(input_dir.to_path_buf()));
    }
    let loaded = load_dataset(input_dir, metadata_name)?;
    if !loaded.skipped.is_empty() {
        warn!(
            skipped = loaded.skipped.len(),
            listed = loaded.metadata_rows,
            "some USV files were not aggregated"
        );
    }

    let dataset = loaded.dataset;
    let metrics: Vec<String> = dataset
        .available_metrics()
        .into_iter()
        .map(str::to_string)
        .collect();
    let factors = dataset.factors.clone();
    let n_animals = dataset.animal_count();
    info!(
        animals = n_animals,
        recordings = dataset.records.len(),
        metrics = metrics.len(),
        "dataset aggregated"
    );

    Ok(AnalysisCtx {
        input_dir: input_dir.to_path_buf(),
        metadata_path: input_dir.join(metadata_name),
        dataset,
        skipped: loaded.skipped,
        metadata_rows: loaded.metadata_rows,
        n_animals,
        factors,
        metrics,
    })
}

impl AnalysisCtx {
    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m == name)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_load.rs"]
mod tests;
