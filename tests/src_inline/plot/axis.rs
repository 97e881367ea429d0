use super::*;

#[test]
fn maps_linearly_and_widens_a_point_domain() {
    let s = LinearScale::new((0.0, 10.0), (100.0, 0.0));
    assert!((s.map(5.0) - 50.0).abs() < 1e-12);
    let flat = LinearScale::new((3.0, 3.0), (0.0, 100.0));
    assert_eq!(flat.domain(), (2.5, 3.5));
    assert!((flat.map(3.0) - 50.0).abs() < 1e-12);
}

#[test]
fn ticks_land_on_round_steps() {
    assert_eq!(nice_ticks(0.0, 10.0, 6), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    let fractional: Vec<String> = nice_ticks(0.0, 1.0, 6).into_iter().map(tick_label).collect();
    assert_eq!(fractional, vec!["0", "0.2", "0.4", "0.6", "0.8", "1"]);
    assert_eq!(nice_ticks(4.0, 4.0, 6), vec![4.0]);
}

#[test]
fn labels_drop_float_noise() {
    assert_eq!(tick_label(0.1 + 0.2), "0.3");
    assert_eq!(tick_label(-0.0), "0");
    assert_eq!(tick_label(1500.0), "1500");
}
