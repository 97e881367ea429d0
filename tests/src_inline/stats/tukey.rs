use super::*;

#[test]
fn tukey_three_groups() {
    let pairs = tukey_hsd(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]], 0.05)
        .expect("tukey");
    assert_eq!(pairs.len(), 3);
    let first = &pairs[0];
    assert_eq!((first.a, first.b), (0, 1));
    assert!((first.mean_diff - 3.0).abs() < 1e-12);
    // se = sqrt(1/3), q(0.95; 3, 6) ~ 4.339
    let half_width = 4.339 * (1.0f64 / 3.0).sqrt();
    assert!((first.lower - (3.0 - half_width)).abs() < 0.01);
    assert!((first.upper - (3.0 + half_width)).abs() < 0.01);
    assert!(first.p_value < 0.05);
    assert!(pairs[1].p_value < first.p_value);
}

#[test]
fn tukey_two_overlapping_groups_not_significant() {
    let pairs = tukey_hsd(&[&[1.0, 2.0, 3.0, 4.0], &[1.5, 2.5, 3.5, 4.5]], 0.05).expect("tukey");
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].p_value > 0.05);
    assert!(pairs[0].lower < 0.0 && pairs[0].upper > 0.0);
}

#[test]
fn tukey_rejects_empty_group() {
    let err = tukey_hsd(&[&[1.0, 2.0], &[]], 0.05).expect_err("empty");
    assert!(matches!(err, StatsError::Degenerate { .. }));
}
