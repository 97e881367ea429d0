use super::*;

fn record(id: &str, tp: &str, sex: Option<&str>, values: Vec<Option<f64>>) -> AnimalRecord {
    AnimalRecord {
        animal_id: id.to_string(),
        timepoint: tp.to_string(),
        sex: sex.map(str::to_string),
        genotype: None,
        metrics: values,
    }
}

#[test]
fn factor_parsing_is_case_insensitive() {
    assert_eq!("sex".parse::<Factor>(), Ok(Factor::Sex));
    assert_eq!(" Timepoint ".parse::<Factor>(), Ok(Factor::Timepoint));
    assert!("Age".parse::<Factor>().is_err());
    assert_eq!(Factor::Genotype.to_string(), "Genotype");
}

#[test]
fn empty_factor_value_counts_as_missing() {
    let r = record("a1", "P4", Some(""), vec![]);
    assert_eq!(r.factor(Factor::Sex), None);
    assert_eq!(r.factor(Factor::Timepoint), Some("P4"));
}

#[test]
fn dataset_queries() {
    let ds = Dataset {
        metric_names: vec!["Total_USVs_Count".into(), "Tonality_Mean".into()],
        records: vec![
            record("a1", "P4", Some("F"), vec![Some(3.0), None]),
            record("a1", "P6", Some("F"), vec![Some(5.0), None]),
            record("a2", "P4", Some("M"), vec![Some(1.0), None]),
        ],
        factors: vec![Factor::Sex, Factor::Timepoint],
    };
    assert_eq!(ds.animal_count(), 2);
    assert_eq!(ds.metric_index("Tonality_Mean"), Some(1));
    assert_eq!(ds.available_metrics(), vec!["Total_USVs_Count"]);
    assert!(ds.has_factor(Factor::Sex));
    assert!(!ds.has_factor(Factor::Genotype));
}
