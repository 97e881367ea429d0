use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::dataset::SkippedFile;
use crate::input::path_display;
use crate::model::dataset::{Dataset, Factor};

/// One row per (animal, timepoint) recording with every metric column.
pub fn write_aggregated_csv(path: &Path, dataset: &Dataset) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["animal_id", "Timepoint"];
    if dataset.has_factor(Factor::Sex) {
        header.push("Sex");
    }
    if dataset.has_factor(Factor::Genotype) {
        header.push("Genotype");
    }
    header.extend(dataset.metric_names.iter().map(String::as_str));
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row = vec![record.animal_id.clone(), record.timepoint.clone()];
        if dataset.has_factor(Factor::Sex) {
            row.push(record.sex.clone().unwrap_or_default());
        }
        if dataset.has_factor(Factor::Genotype) {
            row.push(record.genotype.clone().unwrap_or_default());
        }
        row.extend(record.metrics.iter().map(|v| match v {
            Some(v) if v.is_finite() => v.to_string(),
            _ => String::new(),
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_skipped_tsv(path: &Path, skipped: &[SkippedFile]) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    writer.write_all(b"file\tanimal_id\tTimepoint\treason\n")?;
    for s in skipped {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            path_display(&s.path),
            s.animal_id,
            s.timepoint,
            s.reason
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/tables.rs"]
mod tests;
