//! Within-subject designs. Every function takes subjects as rows and the
//! levels of the within factor as columns; rows must be complete.

use crate::stats::StatsError;
use crate::stats::anova::AnovaTerm;
use crate::stats::dist::{chi2_sf, f_sf};
use crate::stats::linalg::{covariance, determinant, helmert_contrasts, project};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphericity {
    pub w: f64,
    pub chi2: f64,
    pub dof: f64,
    pub p_value: f64,
}

impl Sphericity {
    pub fn holds(&self, alpha: f64) -> bool {
        self.p_value.is_nan() || self.p_value >= alpha
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmAnova {
    pub effect: AnovaTerm,
    pub ss_error: f64,
    pub df_error: f64,
    pub epsilon_gg: f64,
    pub p_gg: f64,
    /// `None` when Mauchly's test is undefined for the data.
    pub sphericity: Option<Sphericity>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedAnova {
    pub between: AnovaTerm,
    pub within: AnovaTerm,
    pub interaction: AnovaTerm,
    pub epsilon_gg: f64,
    pub within_p_gg: f64,
    pub interaction_p_gg: f64,
    pub sphericity: Option<Sphericity>,
}

fn shape(rows: &[Vec<f64>], test: &'static str) -> Result<(usize, usize), StatsError> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            test,
            needed: 2,
            got: k,
        });
    }
    if rows.iter().any(|r| r.len() != k) {
        return Err(StatsError::degenerate(test, "ragged subject rows"));
    }
    if n < 2 {
        return Err(StatsError::TooFewObservations {
            test,
            needed: 2,
            got: n,
        });
    }
    Ok((n, k))
}

fn contrast_covariance(rows: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    project(&covariance(rows), &helmert_contrasts(k))
}

pub fn mauchly(rows: &[Vec<f64>]) -> Result<Sphericity, StatsError> {
    let (n, k) = shape(rows, "Mauchly")?;
    if k == 2 {
        return Ok(Sphericity {
            w: 1.0,
            chi2: 0.0,
            dof: 0.0,
            p_value: 1.0,
        });
    }
    let p = k - 1;
    if n <= p {
        return Err(StatsError::TooFewObservations {
            test: "Mauchly",
            needed: p + 1,
            got: n,
        });
    }
    let t = contrast_covariance(rows, k);
    let trace: f64 = (0..p).map(|i| t[i][i]).sum();
    if trace <= 0.0 {
        return Err(StatsError::degenerate("Mauchly", "zero variance"));
    }
    let d = p as f64;
    let w = determinant(&t) / (trace / d).powi(p as i32);
    if w <= 0.0 {
        return Err(StatsError::degenerate(
            "Mauchly",
            "singular contrast covariance",
        ));
    }
    let f = 1.0 - (2.0 * d * d + d + 2.0) / (6.0 * d * (n as f64 - 1.0));
    let chi2 = -(n as f64 - 1.0) * f * w.ln();
    let dof = d * (d + 1.0) / 2.0 - 1.0;
    Ok(Sphericity {
        w,
        chi2,
        dof,
        p_value: chi2_sf(chi2, dof),
    })
}

/// Greenhouse–Geisser epsilon, bounded to `[1/(k-1), 1]`.
pub fn greenhouse_geisser(rows: &[Vec<f64>]) -> Result<f64, StatsError> {
    let (_, k) = shape(rows, "Greenhouse-Geisser")?;
    if k == 2 {
        return Ok(1.0);
    }
    let p = k - 1;
    let t = contrast_covariance(rows, k);
    let trace: f64 = (0..p).map(|i| t[i][i]).sum();
    let sq: f64 = t.iter().flatten().map(|v| v * v).sum();
    if sq == 0.0 {
        return Err(StatsError::degenerate("Greenhouse-Geisser", "zero variance"));
    }
    let eps = trace * trace / (p as f64 * sq);
    Ok(eps.clamp(1.0 / p as f64, 1.0))
}

pub fn rm_anova(rows: &[Vec<f64>]) -> Result<RmAnova, StatsError> {
    let (n, k) = shape(rows, "repeated-measures ANOVA")?;
    let (fn_, fk) = (n as f64, k as f64);
    let grand = rows.iter().flatten().sum::<f64>() / (fn_ * fk);

    let ss_effect: f64 = (0..k)
        .map(|j| {
            let m = rows.iter().map(|r| r[j]).sum::<f64>() / fn_;
            fn_ * (m - grand) * (m - grand)
        })
        .sum();
    let ss_subject: f64 = rows
        .iter()
        .map(|r| {
            let m = r.iter().sum::<f64>() / fk;
            fk * (m - grand) * (m - grand)
        })
        .sum();
    let ss_total: f64 = rows.iter().flatten().map(|v| (v - grand) * (v - grand)).sum();
    let ss_error = ss_total - ss_effect - ss_subject;
    if ss_error <= 1e-12 * ss_total.max(f64::MIN_POSITIVE) {
        return Err(StatsError::degenerate(
            "repeated-measures ANOVA",
            "zero residual variance",
        ));
    }

    let df_effect = fk - 1.0;
    let df_error = (fk - 1.0) * (fn_ - 1.0);
    let effect = AnovaTerm::new(ss_effect, df_effect, ss_error, df_error);
    let epsilon_gg = greenhouse_geisser(rows).unwrap_or(1.0);
    let p_gg = f_sf(effect.f, df_effect * epsilon_gg, df_error * epsilon_gg);

    Ok(RmAnova {
        effect,
        ss_error,
        df_error,
        epsilon_gg,
        p_gg,
        sphericity: mauchly(rows).ok(),
    })
}

/// Mixed ANOVA with one between factor and one within factor.
///
/// `groups[g]` holds the subject rows of between level `g`.
pub fn mixed_anova(groups: &[Vec<Vec<f64>>]) -> Result<MixedAnova, StatsError> {
    const TEST: &str = "mixed ANOVA";
    let groups: Vec<&Vec<Vec<f64>>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let g = groups.len();
    if g < 2 {
        return Err(StatsError::TooFewGroups {
            test: TEST,
            needed: 2,
            got: g,
        });
    }
    let all_rows: Vec<Vec<f64>> = groups.iter().flat_map(|rows| rows.iter().cloned()).collect();
    let (n, k) = shape(&all_rows, TEST)?;
    if n <= g {
        return Err(StatsError::TooFewObservations {
            test: TEST,
            needed: g + 1,
            got: n,
        });
    }
    let (fn_, fk) = (n as f64, k as f64);
    let grand = all_rows.iter().flatten().sum::<f64>() / (fn_ * fk);
    let level_means: Vec<f64> = (0..k)
        .map(|j| all_rows.iter().map(|r| r[j]).sum::<f64>() / fn_)
        .collect();

    let mut ss_between = 0.0;
    let mut ss_subjects = 0.0;
    let mut ss_interaction = 0.0;
    for rows in &groups {
        let ng = rows.len() as f64;
        let group_mean = rows.iter().flatten().sum::<f64>() / (ng * fk);
        ss_between += fk * ng * (group_mean - grand) * (group_mean - grand);
        for r in rows.iter() {
            let m = r.iter().sum::<f64>() / fk;
            ss_subjects += fk * (m - group_mean) * (m - group_mean);
        }
        for (j, level_mean) in level_means.iter().enumerate() {
            let cell = rows.iter().map(|r| r[j]).sum::<f64>() / ng;
            let dev = cell - group_mean - level_mean + grand;
            ss_interaction += ng * dev * dev;
        }
    }
    let ss_within: f64 = level_means
        .iter()
        .map(|m| fn_ * (m - grand) * (m - grand))
        .sum();
    let ss_total: f64 = all_rows
        .iter()
        .flatten()
        .map(|v| (v - grand) * (v - grand))
        .sum();
    let ss_error = ss_total - ss_between - ss_subjects - ss_within - ss_interaction;

    let fg = g as f64;
    let df_subjects = fn_ - fg;
    let df_error = (fn_ - fg) * (fk - 1.0);
    if ss_subjects <= 0.0 || ss_error <= 1e-12 * ss_total.max(f64::MIN_POSITIVE) {
        return Err(StatsError::degenerate(TEST, "zero residual variance"));
    }

    let between = AnovaTerm::new(ss_between, fg - 1.0, ss_subjects, df_subjects);
    let within = AnovaTerm::new(ss_within, fk - 1.0, ss_error, df_error);
    let interaction = AnovaTerm::new(ss_interaction, (fg - 1.0) * (fk - 1.0), ss_error, df_error);
    let epsilon_gg = greenhouse_geisser(&all_rows).unwrap_or(1.0);

    Ok(MixedAnova {
        between,
        within,
        interaction,
        epsilon_gg,
        within_p_gg: f_sf(within.f, within.df * epsilon_gg, df_error * epsilon_gg),
        interaction_p_gg: f_sf(
            interaction.f,
            interaction.df * epsilon_gg,
            df_error * epsilon_gg,
        ),
        sphericity: mauchly(&all_rows).ok(),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/repeated.rs"]
mod tests;
