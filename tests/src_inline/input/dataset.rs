use super::*;
use std::fs;
use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write file");
}

#[test]
fn loads_and_joins_covariates() {
    let dir = tempdir().expect("tempdir");
    write_file(
        &dir.path().join("animal_metadata.csv"),
        "Filename,animal_id,Timepoint,Sex,Genotype\n\
         a1.csv,a1,P4,F,WT\n\
         a2.csv,a2,P4,M,MUT\n\
         missing.csv,a3,P4,F,WT\n",
    );
    write_file(
        &dir.path().join("a1.csv"),
        "Accepted,Label\nTrue,Flat\nTrue,Trill\n",
    );
    write_file(&dir.path().join("a2.csv"), "Accepted,Label\nTrue,Flat\n");

    let loaded = load_dataset(dir.path(), "animal_metadata.csv").expect("load");
    let ds = &loaded.dataset;
    assert_eq!(loaded.metadata_rows, 3);
    assert_eq!(ds.records.len(), 2);
    assert_eq!(ds.factors, vec![Factor::Sex, Factor::Genotype, Factor::Timepoint]);
    assert_eq!(ds.records[1].sex.as_deref(), Some("M"));

    let trill = ds.metric_index("Label_Trill_Count").expect("trill column");
    assert_eq!(ds.records[0].metrics[trill], Some(1.0));
    assert_eq!(ds.records[1].metrics[trill], Some(0.0));

    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].animal_id, "a3");
    assert_eq!(loaded.skipped[0].reason, SkipReason::Missing);
}

#[test]
fn no_aggregated_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    write_file(
        &dir.path().join("meta.csv"),
        "Filename,animal_id,Timepoint\nnone.csv,a1,P4\n",
    );
    let err = load_dataset(dir.path(), "meta.csv").expect_err("no data");
    assert!(matches!(err, InputError::NoData(_)));
}

#[test]
fn timepoint_is_always_a_factor() {
    let dir = tempdir().expect("tempdir");
    write_file(
        &dir.path().join("meta.csv"),
        "Filename,animal_id,Timepoint\na1.csv,a1,P4\n",
    );
    write_file(&dir.path().join("a1.csv"), "Accepted\n1\n");
    let loaded = load_dataset(dir.path(), "meta.csv").expect("load");
    assert_eq!(loaded.dataset.factors, vec![Factor::Timepoint]);
}
