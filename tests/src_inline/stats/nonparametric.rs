use super::*;

#[test]
fn mann_whitney_exact_for_separated_samples() {
    let res = mann_whitney_u(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0])
        .expect("mwu");
    assert!(res.exact);
    assert_eq!(res.u, 0.0);
    assert!((res.p_value - 2.0 / 252.0).abs() < 1e-12);
    assert_eq!(res.rank_biserial, 1.0);
}

#[test]
fn mann_whitney_is_symmetric() {
    let a = [1.2, 3.4, 2.2, 5.1];
    let b = [2.5, 4.4, 6.0, 7.1, 3.9];
    let ab = mann_whitney_u(&a, &b).expect("mwu");
    let ba = mann_whitney_u(&b, &a).expect("mwu");
    assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    assert_eq!(ab.u + ba.u, 20.0);
}

#[test]
fn mann_whitney_falls_back_to_normal_with_ties() {
    let a = [1.0, 2.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let b = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0];
    let res = mann_whitney_u(&a, &b).expect("mwu");
    assert!(!res.exact);
    assert!(res.p_value > 0.0 && res.p_value < 0.05);
}

#[test]
fn kruskal_wallis_reference() {
    let res = kruskal_wallis(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])
        .expect("kruskal");
    assert!((res.statistic - 7.2).abs() < 1e-12);
    assert_eq!(res.df, 2.0);
    assert!((res.p_value - (-3.6f64).exp()).abs() < 1e-10);
}

#[test]
fn kruskal_wallis_rejects_all_ties() {
    let err = kruskal_wallis(&[&[1.0, 1.0], &[1.0, 1.0]]).expect_err("tied");
    assert!(matches!(err, StatsError::Degenerate { .. }));
}

#[test]
fn dunn_orders_pairs_and_adjusts() {
    let pairs = dunn(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]).expect("dunn");
    assert_eq!(pairs.len(), 3);
    assert_eq!((pairs[0].a, pairs[0].b), (0, 1));
    assert_eq!((pairs[2].a, pairs[2].b), (1, 2));
    // mean ranks 2, 5, 8; variance term 9*10/12 = 7.5; se = sqrt(7.5 * 2/3)
    let expected_z = -3.0 / 5f64.sqrt();
    assert!((pairs[0].z - expected_z).abs() < 1e-12);
    assert!((pairs[0].p_adjusted - (pairs[0].p_raw * 3.0).min(1.0)).abs() < 1e-12);
    assert!(pairs[1].p_raw < pairs[0].p_raw);
}

#[test]
fn wilcoxon_exact_all_positive() {
    let a = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
    let b = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let res = wilcoxon_signed_rank(&a, &b).expect("wilcoxon");
    assert!(res.exact);
    assert_eq!(res.statistic, 0.0);
    assert!((res.p_value - 2.0 / 64.0).abs() < 1e-12);
}

#[test]
fn wilcoxon_drops_zero_differences() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [1.0, 1.0, 1.0, 1.0];
    let res = wilcoxon_signed_rank(&a, &b).expect("wilcoxon");
    assert_eq!(res.n_used, 3);
}

#[test]
fn wilcoxon_all_zero_is_degenerate() {
    let err = wilcoxon_signed_rank(&[1.0, 2.0], &[1.0, 2.0]).expect_err("zero diffs");
    assert!(matches!(err, StatsError::Degenerate { .. }));
}

#[test]
fn friedman_consistent_ordering() {
    let rows = vec![
        vec![1.0, 2.0, 3.0],
        vec![2.0, 3.0, 4.0],
        vec![0.5, 1.5, 9.0],
    ];
    let res = friedman(&rows).expect("friedman");
    assert!((res.statistic - 6.0).abs() < 1e-12);
    assert!((res.p_value - (-3.0f64).exp()).abs() < 1e-10);
}

#[test]
fn friedman_needs_three_conditions() {
    let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    assert!(matches!(
        friedman(&rows),
        Err(StatsError::TooFewGroups { needed: 3, .. })
    ));
}
