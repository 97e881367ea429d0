use super::*;

#[test]
fn one_way_reference() {
    let res = one_way_anova(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])
        .expect("anova");
    assert!((res.effect.ss - 54.0).abs() < 1e-10);
    assert!((res.effect.f - 27.0).abs() < 1e-10);
    assert_eq!(res.effect.df, 2.0);
    assert_eq!(res.df_error, 6.0);
    assert!((res.effect.p_value - 0.001).abs() < 1e-9);
    assert!((res.effect.partial_eta_sq - 0.9).abs() < 1e-12);
}

#[test]
fn one_way_skips_empty_groups() {
    let res = one_way_anova(&[&[1.0, 2.0, 3.0], &[], &[4.0, 5.0, 6.0]]).expect("anova");
    assert_eq!(res.effect.df, 1.0);
}

#[test]
fn two_way_balanced_reference() {
    // cells A1B1 [1,2], A1B2 [3,4], A2B1 [5,6], A2B2 [9,10]
    let a = [0, 0, 0, 0, 1, 1, 1, 1];
    let b = [0, 0, 1, 1, 0, 0, 1, 1];
    let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 9.0, 10.0];
    let res = two_way_anova(&a, &b, &y).expect("two-way");
    assert!((res.a.ss - 50.0).abs() < 1e-9);
    assert!((res.b.ss - 18.0).abs() < 1e-9);
    let inter = res.interaction.expect("interaction");
    assert!((inter.ss - 2.0).abs() < 1e-9);
    assert!((res.ss_error - 2.0).abs() < 1e-9);
    assert_eq!(res.df_error, 4.0);
    assert!((res.a.f - 100.0).abs() < 1e-8);
    assert!((res.b.f - 36.0).abs() < 1e-8);
    assert!((inter.f - 4.0).abs() < 1e-8);
    assert!(res.a.p_value < res.b.p_value);
    assert!(inter.p_value > 0.05);
}

#[test]
fn two_way_missing_cell_drops_interaction_df() {
    let a = [0, 0, 0, 0, 1, 1];
    let b = [0, 0, 1, 1, 0, 0];
    let y = [1.0, 2.0, 4.0, 5.0, 7.0, 9.0];
    let res = two_way_anova(&a, &b, &y).expect("two-way");
    assert!(res.interaction.is_none());
    assert_eq!(res.a.df, 1.0);
    assert_eq!(res.b.df, 1.0);
}

#[test]
fn two_way_needs_two_levels_each() {
    let err = two_way_anova(&[0, 0], &[0, 1], &[1.0, 2.0]).expect_err("one level");
    assert!(matches!(err, StatsError::TooFewGroups { .. }));
}
