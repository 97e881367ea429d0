use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::input::metadata::read_metadata;
use crate::input::usv::{FileMetrics, SkipReason, aggregate_usv_file, base_metric_names};
use crate::input::{InputError, path_display};
use crate::model::dataset::{AnimalRecord, Dataset, Factor};

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub animal_id: String,
    pub timepoint: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub skipped: Vec<SkippedFile>,
    pub metadata_rows: usize,
}

/// Reads the metadata table in `folder` and aggregates every listed file.
pub fn load_dataset(folder: &Path, metadata_name: &str) -> Result<LoadedDataset, InputError> {
    let metadata_path = folder.join(metadata_name);
    let metadata = read_metadata(&metadata_path)?;
    let covariates = metadata.covariates();

    let mut metric_names = base_metric_names();
    let mut pending: Vec<(usize, FileMetrics)> = Vec::new();
    let mut skipped = Vec::new();

    for (idx, row) in metadata.rows.iter().enumerate() {
        let path = folder.join(&row.filename);
        match aggregate_usv_file(&path) {
            Ok(metrics) => {
                debug!(file = %path_display(&path), calls = ?metrics.first().and_then(|m| m.1), "aggregated");
                for (name, _) in &metrics {
                    if !metric_names.contains(name) {
                        metric_names.push(name.clone());
                    }
                }
                pending.push((idx, metrics));
            }
            Err(reason) => {
                warn!(file = %path_display(&path), %reason, "skipping USV file");
                skipped.push(SkippedFile {
                    path,
                    animal_id: row.animal_id.clone(),
                    timepoint: row.timepoint.clone(),
                    reason,
                });
            }
        }
    }

    if pending.is_empty() {
        return Err(InputError::NoData(path_display(&metadata_path).to_string()));
    }

    let records = pending
        .into_iter()
        .map(|(idx, metrics)| {
            let row = &metadata.rows[idx];
            let (sex, genotype) = covariates
                .get(&(row.animal_id.as_str(), row.timepoint.as_str()))
                .copied()
                .unwrap_or((None, None));
            let values = metric_names
                .iter()
                .map(|name| match metrics.iter().find(|(n, _)| n == name) {
                    Some((_, v)) => *v,
                    // label counts a file never saw are zero
                    None if name.starts_with("Label_") => Some(0.0),
                    None => None,
                })
                .collect();
            AnimalRecord {
                animal_id: row.animal_id.clone(),
                timepoint: row.timepoint.clone(),
                sex: sex.map(str::to_string),
                genotype: genotype.map(str::to_string),
                metrics: values,
            }
        })
        .collect();

    let mut factors = Vec::with_capacity(3);
    if metadata.has_sex {
        factors.push(Factor::Sex);
    }
    if metadata.has_genotype {
        factors.push(Factor::Genotype);
    }
    factors.push(Factor::Timepoint);

    Ok(LoadedDataset {
        dataset: Dataset {
            metric_names,
            records,
            factors,
        },
        skipped,
        metadata_rows: metadata.rows.len(),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/dataset.rs"]
mod tests;
