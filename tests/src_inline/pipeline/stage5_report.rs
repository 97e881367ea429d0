use super::*;
use crate::model::dataset::{AnimalRecord, Dataset};
use crate::model::results::AnalysisLog;
use crate::pipeline::stage2_describe::{Selection, run_stage2};
use crate::pipeline::stage3_infer::run_stage3;
use tempfile::tempdir;

fn analysis_ctx() -> AnalysisCtx {
    let values = [
        ("a1", "F", 1.0),
        ("a2", "F", 2.0),
        ("a3", "F", 3.0),
        ("a4", "F", 2.5),
        ("a5", "M", 11.0),
        ("a6", "M", 12.0),
        ("a7", "M", 13.0),
        ("a8", "M", 12.5),
    ];
    let records: Vec<AnimalRecord> = values
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
    AnalysisCtx {
        input_dir: "in".into(),
        metadata_path: "in/animal_metadata.csv".into(),
        n_animals: dataset.animal_count(),
        factors: dataset.factors.clone(),
        metrics: vec!["Total_USVs_Count".to_string()],
        dataset,
        skipped: vec![],
        metadata_rows: 8,
    }
}

fn describe(ctx: &AnalysisCtx) -> DescribeCtx {
    let selection = Selection {
        metric: "Total_USVs_Count".to_string(),
        primary: Factor::Sex,
        secondary: None,
    };
    run_stage2(ctx, &selection, &Settings::default()).expect("stage2")
}

#[test]
fn writes_result_descriptive_and_log_files() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::default();
    let ctx = analysis_ctx();
    let described = describe(&ctx);
    let inferred = run_stage3(&described.frame, &settings);
    assert!(!inferred.results.is_empty());

    let report = run_stage5(&described, &inferred, Err("no fonts".to_string()), &settings, dir.path())
        .expect("stage5");
    let results_dir = dir.path().join("analysis_results");
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.results, inferred.results.len());
    assert_eq!(report.n_observations, 8);
    assert_eq!(report.plot_error.as_deref(), Some("no fonts"));
    assert!(!report.significant.is_empty());

    let results = std::fs::read_to_string(results_dir.join("statistical_results_Total_USVs_Count.csv"))
        .expect("results csv");
    assert!(results.starts_with(
        "Metric,Test_Type,Comparison,F_Statistic,P_Value,Effect_Size,Significance,Details"
    ));

    let descriptive =
        std::fs::read_to_string(results_dir.join("descriptive_statistics_Total_USVs_Count.csv"))
            .expect("descriptive csv");
    let mut lines = descriptive.lines();
    assert_eq!(lines.next(), Some("Sex,count,mean,std,min,max,median,sem"));
    assert!(lines.next().expect("first row").starts_with("Females,4,2.125,"));

    let log = std::fs::read_to_string(results_dir.join("analysis_log_Total_USVs_Count.txt"))
        .expect("log");
    assert!(log.contains("--- Descriptive Statistics for 'Total_USVs_Count' ---"));
    assert!(log.contains("Plot could not be generated: no fonts"));
}

#[test]
fn no_results_file_without_rows() {
    let dir = tempdir().expect("tempdir");
    let settings = Settings::default();
    let ctx = analysis_ctx();
    let described = describe(&ctx);
    let inferred = InferenceCtx {
        design: Design::NoData,
        results: Vec::new(),
        annotations: Vec::new(),
        log: AnalysisLog::default(),
    };
    let report = run_stage5(&described, &inferred, Err("skipped".to_string()), &settings, dir.path())
        .expect("stage5");
    assert_eq!(report.files.len(), 2);
    assert!(
        !dir.path()
            .join("analysis_results/statistical_results_Total_USVs_Count.csv")
            .exists()
    );
}

#[test]
fn summary_carries_tool_and_inputs() {
    let settings = Settings::default();
    let ctx = analysis_ctx();
    let summary = build_summary(&ctx, Factor::Sex, None, &settings, Vec::new());
    assert_eq!(summary.tool.name, env!("CARGO_PKG_NAME"));
    assert_eq!(summary.input.n_animals, 8);
    let json = serde_json::to_value(&summary).expect("json");
    assert_eq!(json["input"]["primary"], "Sex");
    assert_eq!(json["input"]["violation_policy"], "nonparametric");
}
