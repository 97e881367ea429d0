use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::{info, warn};

use crate::config::{ViolationPolicy, load_config};
use crate::model::dataset::Factor;
use crate::pipeline::stage1_load::run_stage1;
use crate::pipeline::stage2_describe::{Selection, run_stage2};
use crate::pipeline::stage3_infer::run_stage3;
use crate::pipeline::stage4_plot::run_stage4;
use crate::pipeline::stage5_report::{build_summary, run_stage5};
use crate::report::json::write_summary;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Folder with the metadata table and USV files
    #[arg(long)]
    pub(crate) input: PathBuf,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub(crate) out: PathBuf,

    /// Primary grouping factor (Sex, Genotype or Timepoint)
    #[arg(long)]
    pub(crate) primary: Factor,

    /// Optional secondary grouping factor
    #[arg(long)]
    pub(crate) secondary: Option<Factor>,

    /// Metric to analyse; repeat for several, omit for all
    #[arg(long = "metric")]
    pub(crate) metrics: Vec<String>,

    /// Test family to use when assumptions are violated
    #[arg(long, value_enum)]
    pub(crate) violation_policy: Option<PolicyArg>,

    /// Optional TOML settings file
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Metadata file name inside the input folder
    #[arg(long)]
    pub(crate) metadata: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    Nonparametric,
    Parametric,
}

impl From<PolicyArg> for ViolationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Nonparametric => ViolationPolicy::Nonparametric,
            PolicyArg::Parametric => ViolationPolicy::Parametric,
        }
    }
}

pub fn handle(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut settings = load_config(args.config.as_deref())?;
    if let Some(policy) = args.violation_policy {
        settings.violation_policy = policy.into();
    }
    let metadata = args.metadata.clone().unwrap_or_else(|| settings.metadata_file.clone());

    let start = Instant::now();
    info!(stage = "stage1_load", "starting stage");
    let ctx = run_stage1(&args.input, &metadata)?;
    info!(
        stage = "stage1_load",
        elapsed_ms = start.elapsed().as_millis(),
        animals = ctx.n_animals,
        "finished stage"
    );

    if args.secondary == Some(args.primary) {
        anyhow::bail!("primary and secondary factor must differ");
    }
    for factor in std::iter::once(args.primary).chain(args.secondary) {
        if !ctx.dataset.has_factor(factor) {
            anyhow::bail!("factor {factor} is not available in this dataset");
        }
    }
    let metrics = if args.metrics.is_empty() {
        ctx.metrics.clone()
    } else {
        if let Some(unknown) = args.metrics.iter().find(|m| !ctx.has_metric(m)) {
            anyhow::bail!("unknown metric: {unknown}");
        }
        args.metrics.clone()
    };
    if metrics.is_empty() {
        anyhow::bail!("the dataset has no metric with observed values");
    }

    let mut reports = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let selection = Selection {
            metric,
            primary: args.primary,
            secondary: args.secondary,
        };

        let start = Instant::now();
        info!(stage = "stage2_describe", metric = selection.metric.as_str(), "starting stage");
        let described = run_stage2(&ctx, &selection, &settings)?;
        info!(
            stage = "stage2_describe",
            metric = selection.metric.as_str(),
            elapsed_ms = start.elapsed().as_millis(),
            observations = described.frame.observations.len(),
            dropped = described.frame.dropped,
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage3_infer", metric = selection.metric.as_str(), "starting stage");
        let inferred = run_stage3(&described.frame, &settings);
        info!(
            stage = "stage3_infer",
            metric = selection.metric.as_str(),
            elapsed_ms = start.elapsed().as_millis(),
            design = ?inferred.design,
            results = inferred.results.len(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage4_plot", metric = selection.metric.as_str(), "starting stage");
        let plot = run_stage4(&described.frame, &inferred.annotations, &settings, &args.out);
        match &plot {
            Ok(p) => info!(
                stage = "stage4_plot",
                metric = selection.metric.as_str(),
                elapsed_ms = start.elapsed().as_millis(),
                bars = p.bars,
                "finished stage"
            ),
            Err(err) => warn!(
                stage = "stage4_plot",
                metric = selection.metric.as_str(),
                error = %err,
                "plot failed"
            ),
        }

        let start = Instant::now();
        info!(stage = "stage5_report", metric = selection.metric.as_str(), "starting stage");
        let report = run_stage5(
            &described,
            &inferred,
            plot.as_ref().map_err(|e| e.to_string()),
            &settings,
            &args.out,
        )?;
        info!(
            stage = "stage5_report",
            metric = selection.metric.as_str(),
            elapsed_ms = start.elapsed().as_millis(),
            files = report.files.len(),
            "finished stage"
        );

        println!(
            "{}: {} result rows, {} significant",
            report.metric,
            report.results,
            report.significant.len()
        );
        reports.push(report);
    }

    let summary = build_summary(&ctx, args.primary, args.secondary, &settings, reports);
    let path = write_summary(&args.out.join(&settings.results_dir), &summary)?;
    info!(path = %path.display(), "summary written");
    Ok(())
}
