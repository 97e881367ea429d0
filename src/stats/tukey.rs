use crate::stats::StatsError;
use crate::stats::descriptive::{mean, sum_sq_dev};
use crate::stats::dist::{ptukey_sf, qtukey};

#[derive(Debug, Clone, PartialEq)]
pub struct TukeyPair {
    pub a: usize,
    pub b: usize,
    /// `mean(b) - mean(a)`.
    pub mean_diff: f64,
    pub lower: f64,
    pub upper: f64,
    pub p_value: f64,
}

/// Tukey's honestly significant difference (Tukey–Kramer for unequal sizes).
///
/// Pairs are emitted in the order the groups are given, `a < b`.
pub fn tukey_hsd(groups: &[&[f64]], alpha: f64) -> Result<Vec<TukeyPair>, StatsError> {
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            test: "Tukey HSD",
            needed: 2,
            got: k,
        });
    }
    if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
        return Err(StatsError::degenerate(
            "Tukey HSD",
            format!("group {empty} is empty"),
        ));
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Err(StatsError::TooFewObservations {
            test: "Tukey HSD",
            needed: k + 1,
            got: n,
        });
    }
    let df = (n - k) as f64;
    let mse = groups.iter().map(|g| sum_sq_dev(g)).sum::<f64>() / df;
    if mse == 0.0 {
        return Err(StatsError::degenerate(
            "Tukey HSD",
            "zero within-group variance",
        ));
    }
    let kf = k as f64;
    let q_crit = qtukey(1.0 - alpha, kf, df);
    let means: Vec<f64> = groups.iter().map(|g| mean(g)).collect();

    let mut out = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let (ni, nj) = (groups[i].len() as f64, groups[j].len() as f64);
            let se = (mse / 2.0 * (1.0 / ni + 1.0 / nj)).sqrt();
            let diff = means[j] - means[i];
            out.push(TukeyPair {
                a: i,
                b: j,
                mean_diff: diff,
                lower: diff - q_crit * se,
                upper: diff + q_crit * se,
                p_value: ptukey_sf(diff.abs() / se, kf, df),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/tukey.rs"]
mod tests;
