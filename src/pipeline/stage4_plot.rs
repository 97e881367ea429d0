use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::config::Settings;
use crate::model::frame::MetricFrame;
use crate::model::results::{AnalysisLog, Annotation};
use crate::plot::dotplot::{build_dot_plot, plot_stem};
use crate::plot::{PlotError, PlotFiles, write_plot};

#[derive(Debug, Error)]
pub enum Stage4Error {
    #[error("plot error: {0}")]
    Plot(#[from] PlotError),
}

#[derive(Debug, Clone)]
pub struct PlotCtx {
    pub files: PlotFiles,
    pub bars: usize,
    pub skipped: usize,
    pub log: AnalysisLog,
}

pub fn run_stage4(
    frame: &MetricFrame,
    annotations: &[Annotation],
    settings: &Settings,
    out_dir: &Path,
) -> Result<PlotCtx, Stage4Error> {
    let plot = build_dot_plot(frame, annotations, settings)?;
    let mut log = AnalysisLog::default();
    for ann in &plot.skipped {
        warn!(
            metric = frame.metric.as_str(),
            a = %ann.a,
            b = %ann.b,
            "annotation has no plotted position"
        );
        log.line(format!(
            "Skipping annotation {} vs {}: no matching plotted group.",
            ann.a, ann.b
        ));
    }

    let files = write_plot(&plot.to_svg(), &out_dir.join(&settings.plots_dir), &plot_stem(frame))?;
    log.line(format!("Plot saved to {}", files.png.display()));
    Ok(PlotCtx {
        files,
        bars: plot.bars.len(),
        skipped: plot.skipped.len(),
        log,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_plot.rs"]
mod tests;
