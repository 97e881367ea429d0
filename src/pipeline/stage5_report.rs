use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::{Settings, ViolationPolicy};
use crate::model::dataset::Factor;
use crate::model::results::{AnalysisLog, StatResult};
use crate::pipeline::stage1_load::AnalysisCtx;
use crate::pipeline::stage2_describe::DescribeCtx;
use crate::pipeline::stage3_infer::{Design, InferenceCtx};
use crate::pipeline::stage4_plot::PlotCtx;

#[derive(Debug, Error)]
pub enum Stage5Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: ToolSummary,
    pub input: InputSummary,
    pub metrics: Vec<MetricReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub input_dir: PathBuf,
    pub metadata: PathBuf,
    pub n_animals: usize,
    pub n_recordings: usize,
    pub skipped_files: usize,
    pub primary: Factor,
    pub secondary: Option<Factor>,
    pub alpha: f64,
    pub violation_policy: ViolationPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub test_type: String,
    pub comparison: String,
    pub p_value: f64,
    pub significance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub metric: String,
    pub design: Design,
    pub n_observations: usize,
    pub results: usize,
    pub significant: Vec<Finding>,
    pub files: Vec<PathBuf>,
    pub plot_error: Option<String>,
}

pub fn run_stage5(
    describe: &DescribeCtx,
    inference: &InferenceCtx,
    plot: Result<&PlotCtx, String>,
    settings: &Settings,
    out_dir: &Path,
) -> Result<MetricReport, Stage5Error> {
    let results_dir = out_dir.join(&settings.results_dir);
    std::fs::create_dir_all(&results_dir)?;
    let stem = describe.frame.metric.replace([' ', '/'], "_");
    let mut files = Vec::new();

    if !inference.results.is_empty() {
        let path = results_dir.join(format!("statistical_results_{stem}.csv"));
        write_results_csv(&path, &inference.results)?;
        files.push(path);
    }

    let path = results_dir.join(format!("descriptive_statistics_{stem}.csv"));
    write_descriptive_csv(&path, describe)?;
    files.push(path);

    let mut log = AnalysisLog::default();
    log.extend(describe.log.clone());
    log.extend(inference.log.clone());
    let plot_error = match plot {
        Ok(ctx) => {
            log.extend(ctx.log.clone());
            files.push(ctx.files.svg.clone());
            files.push(ctx.files.png.clone());
            None
        }
        Err(reason) => {
            log.line(format!("Plot could not be generated: {reason}"));
            Some(reason)
        }
    };
    let path = results_dir.join(format!("analysis_log_{stem}.txt"));
    std::fs::write(&path, log.render())?;
    files.push(path);

    let significant = inference
        .results
        .iter()
        .filter(|r| r.is_significant(settings.alpha))
        .filter_map(|r| {
            Some(Finding {
                test_type: r.test_type.clone(),
                comparison: r.comparison.clone(),
                p_value: r.p_value?,
                significance: r.significance.clone(),
            })
        })
        .collect();

    Ok(MetricReport {
        metric: describe.frame.metric.clone(),
        design: inference.design,
        n_observations: describe.frame.observations.len(),
        results: inference.results.len(),
        significant,
        files,
        plot_error,
    })
}

pub fn build_summary(
    ctx: &AnalysisCtx,
    primary: Factor,
    secondary: Option<Factor>,
    settings: &Settings,
    metrics: Vec<MetricReport>,
) -> RunSummary {
    RunSummary {
        tool: ToolSummary {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputSummary {
            input_dir: ctx.input_dir.clone(),
            metadata: ctx.metadata_path.clone(),
            n_animals: ctx.n_animals,
            n_recordings: ctx.dataset.records.len(),
            skipped_files: ctx.skipped.len(),
            primary,
            secondary,
            alpha: settings.alpha,
            violation_policy: settings.violation_policy,
        },
        metrics,
    }
}

fn write_results_csv(path: &Path, results: &[StatResult]) -> Result<(), Stage5Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in results {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_descriptive_csv(path: &Path, describe: &DescribeCtx) -> Result<(), Stage5Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let frame = &describe.frame;
    let mut header: Vec<&str> = vec![frame.primary.name()];
    if let Some(s) = frame.secondary {
        header.push(s.name());
    }
    header.extend(["count", "mean", "std", "min", "max", "median", "sem"]);
    writer.write_record(&header)?;

    for row in &describe.table {
        let s = &row.summary;
        let mut record = row.groups.clone();
        record.push(s.count.to_string());
        record.extend([s.mean, s.std, s.min, s.max, s.median, s.sem].map(cell));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_report.rs"]
mod tests;
