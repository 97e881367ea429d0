use crate::stats::StatsError;
use crate::stats::descriptive::{mean, variance};
use crate::stats::dist::student_t_two_sided;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Independent two-sample t-test; `equal_var = false` gives Welch's test.
pub fn ttest_ind(a: &[f64], b: &[f64], equal_var: bool) -> Result<TTest, StatsError> {
    let test = if equal_var { "t-test" } else { "Welch t-test" };
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return Err(StatsError::TooFewObservations {
            test,
            needed: 2,
            got: n1.min(n2),
        });
    }
    let (n1, n2) = (n1 as f64, n2 as f64);
    let (v1, v2) = (variance(a), variance(b));
    let diff = mean(a) - mean(b);

    let (se, df) = if equal_var {
        let df = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
        ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
    } else {
        let q1 = v1 / n1;
        let q2 = v2 / n2;
        let df = (q1 + q2) * (q1 + q2) / (q1 * q1 / (n1 - 1.0) + q2 * q2 / (n2 - 1.0));
        ((q1 + q2).sqrt(), df)
    };
    if se == 0.0 || !se.is_finite() {
        return Err(StatsError::degenerate(test, "both samples have zero variance"));
    }
    let t = diff / se;
    Ok(TTest {
        t,
        df,
        p_value: student_t_two_sided(t, df),
    })
}

pub fn ttest_paired(a: &[f64], b: &[f64]) -> Result<TTest, StatsError> {
    if a.len() != b.len() {
        return Err(StatsError::degenerate(
            "paired t-test",
            format!("unequal sample sizes {} and {}", a.len(), b.len()),
        ));
    }
    if a.len() < 2 {
        return Err(StatsError::TooFewObservations {
            test: "paired t-test",
            needed: 2,
            got: a.len(),
        });
    }
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len() as f64;
    let sd = variance(&diffs).sqrt();
    if sd == 0.0 {
        return Err(StatsError::degenerate(
            "paired t-test",
            "differences have zero variance",
        ));
    }
    let t = mean(&diffs) / (sd / n.sqrt());
    let df = n - 1.0;
    Ok(TTest {
        t,
        df,
        p_value: student_t_two_sided(t, df),
    })
}

pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 || n1 + n2 < 3 {
        return f64::NAN;
    }
    let v1 = if n1 > 1 { variance(a) } else { 0.0 };
    let v2 = if n2 > 1 { variance(b) } else { 0.0 };
    let (n1, n2) = (n1 as f64, n2 as f64);
    let pooled = (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled
}

/// Cohen's d for paired samples, standardised by the average variance.
pub fn paired_cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return f64::NAN;
    }
    let denom = ((variance(a) + variance(b)) / 2.0).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / denom
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/ttest.rs"]
mod tests;
