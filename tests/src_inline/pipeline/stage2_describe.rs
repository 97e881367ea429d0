use super::*;
use crate::model::dataset::{AnimalRecord, Dataset};

fn ctx(records: Vec<(&str, &str, &str, f64)>) -> AnalysisCtx {
    let records: Vec<AnimalRecord> = records
        .into_iter()
        .map(|(id, tp, sex, v)| AnimalRecord {
            animal_id: id.to_string(),
            timepoint: tp.to_string(),
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
        metadata_rows: 0,
    }
}

fn selection(primary: Factor, secondary: Option<Factor>) -> Selection {
    Selection {
        metric: "Total_USVs_Count".to_string(),
        primary,
        secondary,
    }
}

#[test]
fn groups_by_label_in_level_order() {
    let ctx = ctx(vec![
        ("a1", "P4", "M", 10.0),
        ("a2", "P4", "F", 1.0),
        ("a3", "P4", "F", 2.0),
        ("a4", "P4", "M", 20.0),
        ("a5", "P4", "F", 4.0),
    ]);
    let out = run_stage2(&ctx, &selection(Factor::Sex, None), &Settings::default()).expect("stage2");
    assert_eq!(out.table.len(), 2);
    assert_eq!(out.table[0].groups, vec!["Females"]);
    assert_eq!(out.table[0].summary.count, 3);
    assert_eq!(out.table[0].summary.mean, 2.333);
    assert_eq!(out.table[0].summary.std, 1.528);
    assert_eq!(out.table[0].summary.median, 2.0);
    assert_eq!(out.table[1].groups, vec!["Males"]);
    assert_eq!(out.table[1].summary.mean, 15.0);
    assert_eq!(out.overall.count, 5);
    assert!(out.log.render().contains("Descriptive Statistics by Sex:"));
}

#[test]
fn two_factors_describe_cells() {
    let ctx = ctx(vec![
        ("a1", "P6", "M", 1.0),
        ("a1", "P4", "M", 2.0),
        ("a2", "P4", "F", 3.0),
    ]);
    let out = run_stage2(
        &ctx,
        &selection(Factor::Timepoint, Some(Factor::Sex)),
        &Settings::default(),
    )
    .expect("stage2");
    let groups: Vec<Vec<String>> = out.table.iter().map(|r| r.groups.clone()).collect();
    assert_eq!(
        groups,
        vec![
            vec!["P4".to_string(), "Females".to_string()],
            vec!["P4".to_string(), "Males".to_string()],
            vec!["P6".to_string(), "Males".to_string()],
        ]
    );
    assert!(out.table[0].summary.std.is_nan());
}

#[test]
fn rejects_bad_selections() {
    let ctx = ctx(vec![("a1", "P4", "M", 1.0)]);
    let settings = Settings::default();
    assert_eq!(
        run_stage2(&ctx, &selection(Factor::Sex, Some(Factor::Sex)), &settings).expect_err("same"),
        Stage2Error::SameFactor(Factor::Sex)
    );
    assert_eq!(
        run_stage2(&ctx, &selection(Factor::Genotype, None), &settings).expect_err("factor"),
        Stage2Error::UnavailableFactor(Factor::Genotype)
    );
    let mut unknown = selection(Factor::Sex, None);
    unknown.metric = "Nope".to_string();
    assert_eq!(
        run_stage2(&ctx, &unknown, &settings).expect_err("metric"),
        Stage2Error::UnknownMetric("Nope".to_string())
    );
}
