use serde::Serialize;
use thiserror::Error;

use crate::config::Settings;
use crate::model::dataset::Factor;
use crate::model::frame::{MetricFrame, build_frame};
use crate::model::results::{AnalysisLog, fmt3};
use crate::pipeline::stage1_load::AnalysisCtx;
use crate::stats::descriptive::{Summary, round_to, summarize};

#[derive(Debug, Error, PartialEq)]
pub enum Stage2Error {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("factor {0} is not available in the dataset")]
    UnavailableFactor(Factor),
    #[error("primary and secondary factor are both {0}")]
    SameFactor(Factor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub metric: String,
    pub primary: Factor,
    pub secondary: Option<Factor>,
}

impl Selection {
    pub fn factors(&self) -> impl Iterator<Item = Factor> + '_ {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveRow {
    pub groups: Vec<String>,
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct DescribeCtx {
    pub frame: MetricFrame,
    pub table: Vec<DescriptiveRow>,
    pub overall: Summary,
    pub log: AnalysisLog,
}

pub fn run_stage2(
    ctx: &AnalysisCtx,
    selection: &Selection,
    settings: &Settings,
) -> Result<DescribeCtx, Stage2Error> {
    if selection.secondary == Some(selection.primary) {
        return Err(Stage2Error::SameFactor(selection.primary));
    }
    if let Some(missing) = selection.factors().find(|f| !ctx.dataset.has_factor(*f)) {
        return Err(Stage2Error::UnavailableFactor(missing));
    }
    let frame = build_frame(
        &ctx.dataset,
        &selection.metric,
        selection.primary,
        selection.secondary,
        settings,
    )
    .ok_or_else(|| Stage2Error::UnknownMetric(selection.metric.clone()))?;

    let table = describe(&frame);
    let all: Vec<f64> = frame.observations.iter().map(|o| o.value).collect();
    let overall = rounded(summarize(&all));

    let mut log = AnalysisLog::default();
    log.line(format!("\n--- Descriptive Statistics for '{}' ---", frame.metric));
    let by = selection
        .factors()
        .map(Factor::name)
        .collect::<Vec<_>>()
        .join(", ");
    log.line(format!("\nDescriptive Statistics by {by}:"));
    log.line(format!(
        "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "group", "count", "mean", "std", "min", "max", "median", "sem"
    ));
    for row in &table {
        log.line(render_row(&row.groups.join(" / "), &row.summary));
    }
    log.line(render_row("(all)", &overall));
    log.line("\n--- Descriptive Statistics Complete ---");

    Ok(DescribeCtx {
        frame,
        table,
        overall,
        log,
    })
}

pub fn describe(frame: &MetricFrame) -> Vec<DescriptiveRow> {
    match frame.secondary {
        None => frame
            .groups(frame.primary)
            .into_iter()
            .map(|(level, values)| DescriptiveRow {
                groups: vec![level],
                summary: rounded(summarize(&values)),
            })
            .collect(),
        Some(_) => frame
            .cells()
            .into_iter()
            .map(|(p, s, values)| DescriptiveRow {
                groups: vec![p, s],
                summary: rounded(summarize(&values)),
            })
            .collect(),
    }
}

fn rounded(s: Summary) -> Summary {
    Summary {
        count: s.count,
        mean: round_to(s.mean, 3),
        std: round_to(s.std, 3),
        min: round_to(s.min, 3),
        max: round_to(s.max, 3),
        median: round_to(s.median, 3),
        sem: round_to(s.sem, 3),
    }
}

fn render_row(label: &str, s: &Summary) -> String {
    format!(
        "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        label,
        s.count,
        fmt3(s.mean),
        fmt3(s.std),
        fmt3(s.min),
        fmt3(s.max),
        fmt3(s.median),
        fmt3(s.sem)
    )
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_describe.rs"]
mod tests;
