use super::*;

fn percents(plan: &SplitPlan) -> Vec<f64> {
    plan.shares.iter().map(|s| s.percent).collect()
}

fn close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
}

#[test]
fn even_split_divides_total() {
    let plan = even_split(90.0, 3).expect("plan");
    assert_eq!(plan.shares.len(), 3);
    assert!(plan.shares.iter().all(|s| s.amount == 30.0));
    assert_eq!(
        plan.render(),
        "Total expense: \u{20ac}90.00\nNumber of people: 3\nEach person pays: \u{20ac}30.00\n"
    );
}

#[test]
fn rejects_bad_totals_and_head_counts() {
    assert!(matches!(even_split(0.0, 2), Err(ToolError::InvalidInput(_))));
    assert!(matches!(even_split(-5.0, 2), Err(ToolError::InvalidInput(_))));
    assert!(matches!(even_split(10.0, 0), Err(ToolError::InvalidInput(_))));
    assert!(matches!(custom_split(10.0, 1, &[], false), Err(ToolError::InvalidInput(_))));
    assert!(matches!(
        custom_split(10.0, 3, &[10.0], false),
        Err(ToolError::InvalidInput(_))
    ));
}

#[test]
fn last_person_takes_the_remainder() {
    let plan = custom_split(200.0, 3, &[50.0, 30.0], false).expect("plan");
    assert!(close(&percents(&plan), &[50.0, 30.0, 20.0]));
    let amounts: Vec<f64> = plan.shares.iter().map(|s| s.amount).collect();
    assert!(close(&amounts, &[100.0, 60.0, 40.0]));
    assert!(plan.render().contains("Person 3 pays (20.00%): \u{20ac}40.00\n"));
}

#[test]
fn remainder_is_clamped_and_overshoot_rejected() {
    match custom_split(100.0, 3, &[70.0, 40.0], false) {
        Err(ToolError::PercentagesDontSum(sum)) => assert!((sum - 110.0).abs() < 1e-9),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn full_percentages_must_total_100() {
    assert!(custom_split(100.0, 2, &[60.0, 40.005], false).is_ok());
    assert!(matches!(
        custom_split(100.0, 3, &[50.0, 30.0, 30.0], false),
        Err(ToolError::PercentagesDontSum(_))
    ));
}

#[test]
fn rebalance_scales_others_around_last() {
    let plan = custom_split(100.0, 3, &[50.0, 30.0, 30.0], true).expect("plan");
    assert!(close(&percents(&plan), &[43.75, 26.25, 30.0]));

    let from_zero = custom_split(100.0, 3, &[0.0, 0.0, 40.0], true).expect("plan");
    assert!(close(&percents(&from_zero), &[30.0, 30.0, 40.0]));
}

#[test]
fn negative_percentage_names_the_person() {
    match custom_split(100.0, 3, &[50.0, -5.0], false) {
        Err(ToolError::PercentageOutOfRange { person, value }) => {
            assert_eq!(person, 2);
            assert_eq!(value, -5.0);
        }
        other => panic!("unexpected: {other:?}"),
    }
}
