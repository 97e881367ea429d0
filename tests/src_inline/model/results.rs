use super::*;

#[test]
fn builder_drops_non_finite_numbers() {
    let row = StatResult::new("Total_USVs_Count", "One-Way ANOVA", "Sex")
        .statistic(f64::NAN)
        .p_value(0.004)
        .effect_size(f64::INFINITY)
        .details("x");
    assert_eq!(row.statistic, None);
    assert_eq!(row.p_value, Some(0.004));
    assert_eq!(row.effect_size, None);
    assert_eq!(row.significance, "**");
    assert!(row.is_significant(0.05));
    assert!(!row.is_significant(0.001));
}

#[test]
fn missing_p_value_is_not_significant() {
    let row = StatResult::new("m", "t", "c").p_value(f64::NAN);
    assert_eq!(row.significance, "ns");
    assert!(!row.is_significant(0.05));
}

#[test]
fn csv_leaves_missing_numbers_empty() {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .serialize(StatResult::new("m", "Kruskal-Wallis H-test", "Sex").statistic(7.2).p_value(0.0273))
        .expect("serialize");
    let text = String::from_utf8(writer.into_inner().expect("flush")).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Metric,Test_Type,Comparison,F_Statistic,P_Value,Effect_Size,Significance,Details")
    );
    assert_eq!(lines.next(), Some("m,Kruskal-Wallis H-test,Sex,7.2,0.0273,,*,"));
}

#[test]
fn group_keys_display() {
    assert_eq!(GroupKey::level(Factor::Sex, "Males").to_string(), "Males");
    assert_eq!(GroupKey::cell("P4", "Mutant").to_string(), "(P4, Mutant)");
    let a = Annotation::new(GroupKey::level(Factor::Sex, "Females"), GroupKey::level(Factor::Sex, "Males"), 0.0004);
    assert_eq!(a.label, "***");
}

#[test]
fn log_renders_lines() {
    let mut log = AnalysisLog::default();
    log.line("a");
    log.line(String::from("b"));
    assert_eq!(log.render(), "a\nb\n");
    assert_eq!(fmt3(0.12345), "0.123");
    assert_eq!(fmt3(f64::NAN), "nan");
}
