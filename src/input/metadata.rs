use std::collections::HashMap;
use std::path::Path;

use crate::input::{InputError, csv_reader, path_display};

pub const REQUIRED_COLUMNS: [&str; 3] = ["Filename", "animal_id", "Timepoint"];

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub filename: String,
    pub animal_id: String,
    pub timepoint: String,
    pub sex: Option<String>,
    pub genotype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub rows: Vec<MetadataRow>,
    pub has_sex: bool,
    pub has_genotype: bool,
}

impl Metadata {
    /// Sex and genotype keyed by `(animal_id, timepoint)`, first row wins.
    pub fn covariates(&self) -> HashMap<(&str, &str), (Option<&str>, Option<&str>)> {
        let mut out = HashMap::new();
        for row in &self.rows {
            out.entry((row.animal_id.as_str(), row.timepoint.as_str()))
                .or_insert((row.sex.as_deref(), row.genotype.as_deref()));
        }
        out
    }
}

pub fn read_metadata(path: &Path) -> Result<Metadata, InputError> {
    if !path.exists() {
        return Err(InputError::MissingFile(path_display(path).to_string()));
    }
    let mut reader = csv_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(InputError::EmptyFile(path.to_path_buf()));
    }
    let column = |name: &str| headers.iter().position(|h| h == name);
    let mut required = [0usize; 3];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name).ok_or_else(|| InputError::MissingColumn {
            file: path_display(path).to_string(),
            column: name.to_string(),
        })?;
    }
    let [file_idx, animal_idx, time_idx] = required;
    let sex_idx = column("Sex");
    let genotype_idx = column("Genotype");

    let mut meta = Metadata {
        rows: Vec::new(),
        has_sex: sex_idx.is_some(),
        has_genotype: genotype_idx.is_some(),
    };
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let optional = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let row = MetadataRow {
            filename: cell(file_idx),
            animal_id: cell(animal_idx),
            timepoint: cell(time_idx),
            sex: optional(sex_idx),
            genotype: optional(genotype_idx),
        };
        for (value, name) in [
            (&row.filename, REQUIRED_COLUMNS[0]),
            (&row.animal_id, REQUIRED_COLUMNS[1]),
            (&row.timepoint, REQUIRED_COLUMNS[2]),
        ] {
            if value.is_empty() {
                return Err(InputError::InvalidRow {
                    line,
                    reason: format!("empty {name}"),
                });
            }
        }
        meta.rows.push(row);
    }
    Ok(meta)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/metadata.rs"]
mod tests;
