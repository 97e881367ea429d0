use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::info;

use crate::config::load_config;
use crate::pipeline::stage1_load::run_stage1;
use crate::report::tables::{write_aggregated_csv, write_skipped_tsv};
use crate::report::text::render_report;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Folder with the metadata table and USV files
    #[arg(long)]
    pub(crate) input: PathBuf,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub(crate) out: PathBuf,

    /// Metadata file name inside the input folder
    #[arg(long)]
    pub(crate) metadata: Option<String>,

    /// Optional TOML settings file
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

pub fn handle(args: ReportArgs) -> anyhow::Result<()> {
    let settings = load_config(args.config.as_deref())?;
    let metadata = args.metadata.unwrap_or_else(|| settings.metadata_file.clone());

    let start = Instant::now();
    info!(stage = "stage1_load", "starting stage");
    let ctx = run_stage1(&args.input, &metadata)?;
    info!(
        stage = "stage1_load",
        elapsed_ms = start.elapsed().as_millis(),
        animals = ctx.n_animals,
        "finished stage"
    );

    let report = render_report(&ctx);
    print!("{report}");

    let results_dir = args.out.join(&settings.results_dir);
    std::fs::create_dir_all(&results_dir)?;
    std::fs::write(results_dir.join("dataset_report.txt"), &report)?;
    write_aggregated_csv(&results_dir.join("aggregated_data.csv"), &ctx.dataset)?;
    write_skipped_tsv(&results_dir.join("skipped_files.tsv"), &ctx.skipped)?;
    info!(dir = %results_dir.display(), "dataset report written");
    Ok(())
}
