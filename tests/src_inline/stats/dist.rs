use super::*;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn ln_gamma_matches_factorials() {
    assert!(close(ln_gamma(1.0), 0.0, 1e-12));
    assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
    assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
}

#[test]
fn normal_cdf_and_quantile_agree() {
    assert!(close(normal_cdf(0.0), 0.5, 1e-12));
    assert!(close(normal_cdf(1.959_963_984_540_054), 0.975, 1e-9));
    assert!(close(normal_quantile(0.975), 1.959_963_984_540_054, 1e-9));
    assert!(close(normal_quantile(0.5), 0.0, 1e-12));
    assert!(close(normal_quantile(1e-10), -6.361_340_902_404_056, 1e-7));
    assert!(close(normal_sf(3.0) + normal_cdf(3.0), 1.0, 1e-12));
}

#[test]
fn normal_quantile_covers_every_region() {
    assert!(close(normal_quantile(0.1), -1.281_551_565_544_601, 1e-9));
    assert!(close(normal_quantile(0.999), 3.090_232_306_167_813, 1e-9));
    assert!(close(normal_quantile(1e-12), -7.034_483_825_777_18, 1e-5));
    assert!(close(normal_quantile(1.0 - 1e-12), 7.034_483_825_777_18, 1e-3));
}

#[test]
fn chi2_with_two_df_is_exponential() {
    for x in [0.5, 2.0, 7.2, 12.0] {
        assert!(close(chi2_sf(x, 2.0), (-x / 2.0).exp(), 1e-10));
    }
    assert_eq!(chi2_sf(-1.0, 3.0), 1.0);
}

#[test]
fn f_with_two_numerator_df_has_closed_form() {
    // sf(F; 2, d2) = (1 + 2F/d2)^(-d2/2)
    let p = f_sf(27.0, 2.0, 6.0);
    assert!(close(p, 0.001, 1e-9));
    let p = f_sf(48.0, 2.0, 6.0);
    assert!(close(p, 17f64.powi(-3), 1e-10));
}

#[test]
fn student_t_two_sided_reference() {
    assert!(close(student_t_two_sided(0.0, 10.0), 1.0, 1e-12));
    // one degree of freedom is Cauchy: P(|T| > 1) = 0.5
    assert!(close(student_t_two_sided(1.0, 1.0), 0.5, 1e-10));
    assert!(close(student_t_two_sided(-5.0, 8.0), 0.001_052_825_793_405_487, 1e-8));
}

#[test]
fn studentized_range_critical_values() {
    assert!(close(qtukey(0.95, 3.0, 6.0), 4.339, 0.01));
    assert!(close(qtukey(0.95, 2.0, 10.0), 3.151, 0.01));
    let p = ptukey(4.339, 3.0, 6.0);
    assert!(close(p, 0.95, 0.002));
}

#[test]
fn studentized_range_large_df() {
    assert!(close(qtukey(0.95, 10.0, 60.0), 4.646, 0.01));
    assert!(close(qtukey(0.95, 3.0, 120.0), 3.356, 0.01));
    assert!(close(qtukey(0.95, 3.0, 1000.0), 3.319, 0.01));
}

#[test]
fn studentized_range_with_two_groups_matches_t() {
    // q = sqrt(2) * |t| when k = 2
    let t: f64 = 2.5;
    let df = 12.0;
    let p_t = student_t_two_sided(t, df);
    let p_q = ptukey_sf(std::f64::consts::SQRT_2 * t, 2.0, df);
    assert!(close(p_t, p_q, 1e-4));
}

#[test]
fn tails_are_monotone() {
    assert!(ptukey_sf(2.0, 4.0, 20.0) > ptukey_sf(4.0, 4.0, 20.0));
    assert!(f_sf(1.0, 3.0, 20.0) > f_sf(5.0, 3.0, 20.0));
    assert!(normal_two_sided(1.0) > normal_two_sided(2.0));
}
