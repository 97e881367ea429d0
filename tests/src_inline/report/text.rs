use super::*;
use crate::input::dataset::SkippedFile;
use crate::input::usv::SkipReason;
use crate::model::dataset::{Dataset, Factor};

fn ctx(skipped: Vec<SkippedFile>) -> AnalysisCtx {
    AnalysisCtx {
        input_dir: "in".into(),
        metadata_path: "in/animal_metadata.csv".into(),
        dataset: Dataset::default(),
        skipped,
        metadata_rows: 5,
        n_animals: 4,
        factors: vec![Factor::Sex, Factor::Timepoint],
        metrics: vec!["Total_USVs_Count".to_string(), "Label_FM_Count".to_string()],
    }
}

#[test]
fn lists_animals_variables_and_metrics() {
    let report = render_report(&ctx(Vec::new()));
    assert_eq!(
        report,
        "Your dataset contains data for 4 animals.\n\n\
         Identified variables:\n  - Sex\n  - Timepoint\n\n\
         Available metrics:\n  - Total_USVs_Count\n  - Label_FM_Count\n"
    );
}

#[test]
fn appends_skipped_files() {
    let report = render_report(&ctx(vec![SkippedFile {
        path: "in/a9.csv".into(),
        animal_id: "a9".to_string(),
        timepoint: "P6".to_string(),
        reason: SkipReason::Empty,
    }]));
    assert!(report.contains("Skipped files (1 of 5 listed):\n  - in/a9.csv (a9, P6): empty file\n"));
}
