use super::*;
use crate::input::usv::SkipReason;
use crate::model::dataset::AnimalRecord;
use tempfile::tempdir;

#[test]
fn aggregated_csv_has_factor_and_metric_columns() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("aggregated_data.csv");
    let dataset = Dataset {
        metric_names: vec!["Total_USVs_Count".to_string(), "Mean_Duration_s".to_string()],
        records: vec![AnimalRecord {
            animal_id: "a1".to_string(),
            timepoint: "P4".to_string(),
            sex: Some("F".to_string()),
            genotype: None,
            metrics: vec![Some(12.0), None],
        }],
        factors: vec![Factor::Sex, Factor::Timepoint],
    };
    write_aggregated_csv(&path, &dataset).expect("write");
    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(
        text,
        "animal_id,Timepoint,Sex,Total_USVs_Count,Mean_Duration_s\na1,P4,F,12,\n"
    );
}

#[test]
fn skipped_tsv_lists_reasons() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("skipped_files.tsv");
    let skipped = vec![SkippedFile {
        path: "in/a2.csv".into(),
        animal_id: "a2".to_string(),
        timepoint: "P6".to_string(),
        reason: SkipReason::Missing,
    }];
    write_skipped_tsv(&path, &skipped).expect("write");
    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(
        text,
        "file\tanimal_id\tTimepoint\treason\nin/a2.csv\ta2\tP6\tfile not found\n"
    );
}
