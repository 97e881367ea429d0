use crate::stats::StatsError;
use crate::stats::descriptive::{mean, sum_sq_dev};
use crate::stats::dist::f_sf;
use crate::stats::linalg::{LeastSquares, least_squares};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaTerm {
    pub ss: f64,
    pub df: f64,
    pub f: f64,
    pub p_value: f64,
    pub partial_eta_sq: f64,
}

impl AnovaTerm {
    pub(crate) fn new(ss: f64, df: f64, ss_error: f64, df_error: f64) -> Self {
        let ms_error = ss_error / df_error;
        let f = if ms_error > 0.0 {
            (ss / df) / ms_error
        } else {
            f64::NAN
        };
        let p_value = if f.is_nan() {
            f64::NAN
        } else {
            f_sf(f, df, df_error)
        };
        let denom = ss + ss_error;
        Self {
            ss,
            df,
            f,
            p_value,
            partial_eta_sq: if denom > 0.0 { ss / denom } else { f64::NAN },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneWayAnova {
    pub effect: AnovaTerm,
    pub ss_error: f64,
    pub df_error: f64,
}

pub fn one_way_anova(groups: &[&[f64]]) -> Result<OneWayAnova, StatsError> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            test: "one-way ANOVA",
            needed: 2,
            got: k,
        });
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Err(StatsError::TooFewObservations {
            test: "one-way ANOVA",
            needed: k + 1,
            got: n,
        });
    }
    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand = mean(&all);
    let ss_between: f64 = groups
        .iter()
        .map(|g| {
            let d = mean(g) - grand;
            g.len() as f64 * d * d
        })
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_sq_dev(g)).sum();
    if ss_within == 0.0 {
        return Err(StatsError::degenerate(
            "one-way ANOVA",
            "zero within-group variance",
        ));
    }
    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    Ok(OneWayAnova {
        effect: AnovaTerm::new(ss_between, df_between, ss_within, df_within),
        ss_error: ss_within,
        df_error: df_within,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoWayAnova {
    pub a: AnovaTerm,
    pub b: AnovaTerm,
    /// Absent when the design has no estimable interaction.
    pub interaction: Option<AnovaTerm>,
    pub ss_error: f64,
    pub df_error: f64,
}

fn dummies(codes: &[usize], levels: usize) -> Vec<Vec<f64>> {
    (1..levels)
        .map(|l| {
            codes
                .iter()
                .map(|&c| if c == l { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Two-way ANOVA with type-II sums of squares.
///
/// `a` and `b` are level codes (0-based) per observation. Each term's sum of
/// squares is the drop in residual sum of squares when it is added to the
/// model containing every term that does not contain it.
pub fn two_way_anova(a: &[usize], b: &[usize], y: &[f64]) -> Result<TwoWayAnova, StatsError> {
    let n = y.len();
    if a.len() != n || b.len() != n {
        return Err(StatsError::degenerate(
            "two-way ANOVA",
            "factor codes and values differ in length",
        ));
    }
    let la = a.iter().max().map_or(0, |m| m + 1);
    let lb = b.iter().max().map_or(0, |m| m + 1);
    if la < 2 || lb < 2 {
        return Err(StatsError::TooFewGroups {
            test: "two-way ANOVA",
            needed: 2,
            got: la.min(lb),
        });
    }

    let intercept = vec![1.0; n];
    let da = dummies(a, la);
    let db = dummies(b, lb);
    let mut dab = Vec::with_capacity(da.len() * db.len());
    for ca in &da {
        for cb in &db {
            dab.push(ca.iter().zip(cb).map(|(x, y)| x * y).collect::<Vec<f64>>());
        }
    }

    let fit = |blocks: &[&[Vec<f64>]]| -> LeastSquares {
        let mut cols = vec![intercept.clone()];
        for block in blocks {
            cols.extend(block.iter().cloned());
        }
        least_squares(&cols, y)
    };
    let fit_a = fit(&[da.as_slice()]);
    let fit_b = fit(&[db.as_slice()]);
    let fit_ab = fit(&[da.as_slice(), db.as_slice()]);
    let fit_full = fit(&[da.as_slice(), db.as_slice(), dab.as_slice()]);

    let df_error = n as f64 - fit_full.rank as f64;
    if df_error <= 0.0 {
        return Err(StatsError::degenerate(
            "two-way ANOVA",
            "no residual degrees of freedom",
        ));
    }
    let ss_error = fit_full.rss;
    if ss_error <= 0.0 {
        return Err(StatsError::degenerate(
            "two-way ANOVA",
            "zero residual variance",
        ));
    }

    let term = |ss: f64, df: usize| AnovaTerm::new(ss.max(0.0), df as f64, ss_error, df_error);
    let df_a = fit_ab.rank - fit_b.rank;
    let df_b = fit_ab.rank - fit_a.rank;
    let df_inter = fit_full.rank - fit_ab.rank;
    Ok(TwoWayAnova {
        a: term(fit_b.rss - fit_ab.rss, df_a),
        b: term(fit_a.rss - fit_ab.rss, df_b),
        interaction: (df_inter > 0).then(|| term(fit_ab.rss - fit_full.rss, df_inter)),
        ss_error,
        df_error,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/anova.rs"]
mod tests;
