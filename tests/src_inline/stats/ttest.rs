use super::*;

const LOW: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
const HIGH: [f64; 5] = [6.0, 7.0, 8.0, 9.0, 10.0];

#[test]
fn student_t_reference() {
    let res = ttest_ind(&LOW, &HIGH, true).expect("ttest");
    assert!((res.t + 5.0).abs() < 1e-12);
    assert_eq!(res.df, 8.0);
    assert!((res.p_value - 0.001_052_825_793).abs() < 1e-8);
}

#[test]
fn welch_equals_student_for_equal_variances() {
    let welch = ttest_ind(&LOW, &HIGH, false).expect("welch");
    assert!((welch.t + 5.0).abs() < 1e-12);
    assert!((welch.df - 8.0).abs() < 1e-9);
}

#[test]
fn welch_df_shrinks_with_unequal_variances() {
    let a = [1.0, 1.1, 0.9, 1.0];
    let b = [0.0, 10.0, 20.0, 5.0, 15.0];
    let res = ttest_ind(&a, &b, false).expect("welch");
    assert!(res.df < 5.0);
}

#[test]
fn constant_samples_are_degenerate() {
    let err = ttest_ind(&[2.0, 2.0], &[2.0, 2.0], true).expect_err("zero variance");
    assert!(matches!(err, StatsError::Degenerate { .. }));
}

#[test]
fn paired_reference() {
    let before = [10.0, 12.0, 9.0, 11.0];
    let after = [12.0, 15.0, 10.0, 14.0];
    // differences -2, -3, -1, -3: mean -2.25, sd 0.9574
    let res = ttest_paired(&before, &after).expect("paired");
    let expected_t = -2.25 / (0.957_427_107_756_338_2 / 2.0);
    assert!((res.t - expected_t).abs() < 1e-9);
    assert_eq!(res.df, 3.0);
    assert!(res.p_value < 0.05);
}

#[test]
fn cohens_d_uses_pooled_sd() {
    let d = cohens_d(&LOW, &HIGH);
    assert!((d + 5.0 / 2.5f64.sqrt()).abs() < 1e-12);
    assert_eq!(cohens_d(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    assert!(cohens_d(&[], &HIGH).is_nan());
}
