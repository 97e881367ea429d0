use super::*;
use crate::model::dataset::{AnimalRecord, Dataset, Factor};
use crate::model::frame::build_frame;
use crate::model::results::GroupKey;
use tempfile::tempdir;

fn frame() -> MetricFrame {
    let records = [("a1", "F", 2.0), ("a2", "F", 3.0), ("a3", "M", 8.0), ("a4", "M", 9.0)]
        .into_iter()
        .map(|(id, sex, v)| AnimalRecord {
            animal_id: id.to_string(),
            timepoint: "P4".to_string(),
            sex: Some(sex.to_string()),
            genotype: None,
            metrics: vec![Some(v)],
        })
        .collect();
    let dataset = Dataset {
        metric_names: vec!["Total_USVs_Count".to_string()],
        records,
        factors: vec![Factor::Sex, Factor::Timepoint],
    };
    build_frame(&dataset, "Total_USVs_Count", Factor::Sex, None, &Settings::default()).expect("frame")
}

#[test]
fn writes_plot_files_under_plots_dir() {
    let dir = tempdir().expect("tempdir");
    let annotations = vec![
        Annotation::new(
            GroupKey::level(Factor::Sex, "Females"),
            GroupKey::level(Factor::Sex, "Males"),
            0.002,
        ),
        Annotation::new(
            GroupKey::level(Factor::Timepoint, "P4"),
            GroupKey::level(Factor::Timepoint, "P6"),
            0.002,
        ),
    ];
    let ctx = run_stage4(&frame(), &annotations, &Settings::default(), dir.path()).expect("stage4");
    assert_eq!(ctx.bars, 1);
    assert_eq!(ctx.skipped, 1);
    assert_eq!(
        ctx.files.svg,
        dir.path().join("plots").join("Total_USVs_Count_by_Sex_mean_sd_plot.svg")
    );
    assert!(ctx.files.png.is_file());
    assert!(ctx.log.lines().iter().any(|l| l.starts_with("Skipping annotation P4 vs P6")));
}

#[test]
fn empty_frame_fails_without_writing() {
    let dir = tempdir().expect("tempdir");
    let mut empty = frame();
    empty.observations.clear();
    let err = run_stage4(&empty, &[], &Settings::default(), dir.path()).expect_err("no data");
    assert!(matches!(err, Stage4Error::Plot(PlotError::NoData(_))));
    assert!(!dir.path().join("plots").exists());
}
