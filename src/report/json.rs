use std::path::{Path, PathBuf};

use crate::pipeline::stage5_report::RunSummary;

pub type Summary = RunSummary;

pub fn write_summary(out_dir: &Path, summary: &Summary) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let json = serde_json::to_string_pretty(summary)?;
    let path = out_dir.join("summary.json");
    std::fs::write(&path, json)?;
    Ok(path)
}
