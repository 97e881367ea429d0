use crate::stats::StatsError;
use crate::stats::descriptive::{mean, median};
use crate::stats::dist::f_sf;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levene {
    pub statistic: f64,
    pub p_value: f64,
}

/// Levene's test centred on group medians (Brown–Forsythe).
pub fn levene(groups: &[&[f64]]) -> Result<Levene, StatsError> {
    if groups.len() < 2 {
        return Err(StatsError::TooFewGroups {
            test: "Levene",
            needed: 2,
            got: groups.len(),
        });
    }
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let centre = median(g);
            g.iter().map(|v| (v - centre).abs()).collect()
        })
        .collect();

    let total: usize = deviations.iter().map(Vec::len).sum();
    let k = deviations.len();
    if total <= k {
        return Err(StatsError::TooFewObservations {
            test: "Levene",
            needed: k + 1,
            got: total,
        });
    }
    let grand = deviations.iter().flatten().sum::<f64>() / total as f64;

    let mut between = 0.0;
    let mut within = 0.0;
    for z in &deviations {
        if z.is_empty() {
            continue;
        }
        let zbar = mean(z);
        between += z.len() as f64 * (zbar - grand) * (zbar - grand);
        within += z.iter().map(|v| (v - zbar) * (v - zbar)).sum::<f64>();
    }
    let df1 = (k - 1) as f64;
    let df2 = (total - k) as f64;
    if within == 0.0 {
        return Err(StatsError::degenerate(
            "Levene",
            "absolute deviations have zero spread",
        ));
    }
    let statistic = (df2 / df1) * between / within;
    Ok(Levene {
        statistic,
        p_value: f_sf(statistic, df1, df2),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/variance.rs"]
mod tests;
