//! Rank-based tests used when the parametric assumptions do not hold.

use crate::stats::dist::{chi2_sf, normal_sf, normal_two_sided};
use crate::stats::rank::{average_ranks, has_ties, tie_term};
use crate::stats::{StatsError, bonferroni};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitney {
    pub u: f64,
    pub p_value: f64,
    pub rank_biserial: f64,
    pub exact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankTest {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DunnPair {
    pub a: usize,
    pub b: usize,
    pub z: f64,
    pub p_raw: f64,
    pub p_adjusted: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wilcoxon {
    pub statistic: f64,
    pub p_value: f64,
    pub n_used: usize,
    pub exact: bool,
}

const MWU_EXACT_LIMIT: usize = 8;
const WILCOXON_EXACT_LIMIT: usize = 50;

pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<MannWhitney, StatsError> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return Err(StatsError::TooFewObservations {
            test: "Mann-Whitney U",
            needed: 1,
            got: n1.min(n2),
        });
    }
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranks = average_ranks(&pooled);
    let r1: f64 = ranks[..n1].iter().sum();
    let (f1, f2) = (n1 as f64, n2 as f64);
    let u1 = r1 - f1 * (f1 + 1.0) / 2.0;
    let u2 = f1 * f2 - u1;
    let u_big = u1.max(u2);

    let exact = n1.min(n2) <= MWU_EXACT_LIMIT && !has_ties(&pooled);
    let p_value = if exact {
        let counts = rank_sum_counts(n1.min(n2), n1 + n2);
        let total: f64 = counts.iter().sum();
        let start = u_big.round() as usize;
        let upper: f64 = counts.iter().skip(start).sum();
        (2.0 * upper / total).min(1.0)
    } else {
        let n = f1 + f2;
        let tie_adj = tie_term(&pooled) / (n * (n - 1.0));
        let sigma = (f1 * f2 / 12.0 * ((n + 1.0) - tie_adj)).sqrt();
        if sigma == 0.0 {
            return Err(StatsError::degenerate(
                "Mann-Whitney U",
                "all observations are tied",
            ));
        }
        let z = (u_big - f1 * f2 / 2.0 - 0.5) / sigma;
        (2.0 * normal_sf(z)).min(1.0)
    };

    Ok(MannWhitney {
        u: u1,
        p_value,
        rank_biserial: 1.0 - 2.0 * u1 / (f1 * f2),
        exact,
    })
}

fn rank_sum_counts(m: usize, n: usize) -> Vec<f64> {
    let max_u = m * (n - m);
    // dp[j][u]: subsets of size j with shifted sum u among ranks seen so far
    let mut dp = vec![vec![0.0f64; max_u + 1]; m + 1];
    dp[0][0] = 1.0;
    for rank in 1..=n {
        for j in (1..=m.min(rank)).rev() {
            // choosing `rank` as the j-th smallest adds rank - j to the shifted sum
            let shift = rank - j;
            if shift > max_u {
                continue;
            }
            for u in (shift..=max_u).rev() {
                let prev = dp[j - 1][u - shift];
                if prev != 0.0 {
                    dp[j][u] += prev;
                }
            }
        }
    }
    dp.swap_remove(m)
}

pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<RankTest, StatsError> {
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            test: "Kruskal-Wallis",
            needed: 2,
            got: k,
        });
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(StatsError::TooFewObservations {
            test: "Kruskal-Wallis",
            needed: 1,
            got: 0,
        });
    }
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = pooled.len() as f64;
    let ranks = average_ranks(&pooled);

    let mut offset = 0usize;
    let mut h = 0.0;
    for g in groups {
        let r: f64 = ranks[offset..offset + g.len()].iter().sum();
        h += r * r / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_term(&pooled) / (n * n * n - n);
    if correction <= 0.0 {
        return Err(StatsError::degenerate(
            "Kruskal-Wallis",
            "all observations are tied",
        ));
    }
    h /= correction;
    let df = (k - 1) as f64;
    Ok(RankTest {
        statistic: h,
        df,
        p_value: chi2_sf(h, df),
    })
}

/// Dunn's pairwise test on pooled ranks with Bonferroni adjustment.
pub fn dunn(groups: &[&[f64]]) -> Result<Vec<DunnPair>, StatsError> {
    let k = groups.len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            test: "Dunn",
            needed: 2,
            got: k,
        });
    }
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = pooled.len() as f64;
    if n < 2.0 {
        return Err(StatsError::TooFewObservations {
            test: "Dunn",
            needed: 2,
            got: pooled.len(),
        });
    }
    let ranks = average_ranks(&pooled);

    let mut mean_ranks = Vec::with_capacity(k);
    let mut offset = 0usize;
    for g in groups {
        let len = g.len();
        let r: f64 = ranks[offset..offset + len].iter().sum();
        mean_ranks.push(if len == 0 { f64::NAN } else { r / len as f64 });
        offset += len;
    }

    let base = n * (n + 1.0) / 12.0 - tie_term(&pooled) / (12.0 * (n - 1.0));
    let comparisons = k * (k - 1) / 2;
    let mut out = Vec::with_capacity(comparisons);
    for i in 0..k {
        for j in (i + 1)..k {
            let (ni, nj) = (groups[i].len() as f64, groups[j].len() as f64);
            let se = (base * (1.0 / ni + 1.0 / nj)).sqrt();
            let z = if se > 0.0 {
                (mean_ranks[i] - mean_ranks[j]) / se
            } else {
                f64::NAN
            };
            let p_raw = if z.is_nan() { f64::NAN } else { normal_two_sided(z) };
            out.push(DunnPair {
                a: i,
                b: j,
                z,
                p_raw,
                p_adjusted: bonferroni(p_raw, comparisons),
            });
        }
    }
    Ok(out)
}

/// Wilcoxon signed-rank test on `a[i] - b[i]`, zero differences dropped.
pub fn wilcoxon_signed_rank(a: &[f64], b: &[f64]) -> Result<Wilcoxon, StatsError> {
    if a.len() != b.len() {
        return Err(StatsError::degenerate(
            "Wilcoxon",
            format!("unequal sample sizes {} and {}", a.len(), b.len()),
        ));
    }
    let diffs: Vec<f64> = a
        .iter()
        .zip(b)
        .map(|(x, y)| x - y)
        .filter(|d| *d != 0.0)
        .collect();
    let n = diffs.len();
    if n == 0 {
        return Err(StatsError::degenerate(
            "Wilcoxon",
            "all paired differences are zero",
        ));
    }
    let magnitudes: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);
    let r_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let fnn = n as f64;
    let r_minus = fnn * (fnn + 1.0) / 2.0 - r_plus;
    let t = r_plus.min(r_minus);

    let exact = n <= WILCOXON_EXACT_LIMIT && !has_ties(&magnitudes);
    let p_value = if exact {
        let counts = signed_rank_counts(n);
        let total: f64 = counts.iter().sum();
        let limit = t.round() as usize;
        let lower: f64 = counts.iter().take(limit + 1).sum();
        (2.0 * lower / total).min(1.0)
    } else {
        let mean_t = fnn * (fnn + 1.0) / 4.0;
        let var_t = fnn * (fnn + 1.0) * (2.0 * fnn + 1.0) / 24.0 - tie_term(&magnitudes) / 48.0;
        if var_t <= 0.0 {
            return Err(StatsError::degenerate("Wilcoxon", "zero variance"));
        }
        normal_two_sided((t - mean_t) / var_t.sqrt())
    };

    Ok(Wilcoxon {
        statistic: t,
        p_value,
        n_used: n,
        exact,
    })
}

fn signed_rank_counts(n: usize) -> Vec<f64> {
    let max = n * (n + 1) / 2;
    let mut dp = vec![0.0f64; max + 1];
    dp[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max).rev() {
            dp[s] += dp[s - rank];
        }
    }
    dp
}

/// Friedman test; `rows` holds one row per subject, one column per condition.
pub fn friedman(rows: &[Vec<f64>]) -> Result<RankTest, StatsError> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    if k < 3 {
        return Err(StatsError::TooFewGroups {
            test: "Friedman",
            needed: 3,
            got: k,
        });
    }
    if n < 2 {
        return Err(StatsError::TooFewObservations {
            test: "Friedman",
            needed: 2,
            got: n,
        });
    }
    if rows.iter().any(|r| r.len() != k) {
        return Err(StatsError::degenerate("Friedman", "ragged subject rows"));
    }

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for row in rows {
        for (sum, r) in rank_sums.iter_mut().zip(average_ranks(row)) {
            *sum += r;
        }
        ties += tie_term(row);
    }
    let (fn_, fk) = (n as f64, k as f64);
    let ssr: f64 = rank_sums.iter().map(|r| r * r).sum();
    let mut chi2 = 12.0 / (fn_ * fk * (fk + 1.0)) * ssr - 3.0 * fn_ * (fk + 1.0);
    let correction = 1.0 - ties / (fn_ * fk * (fk * fk - 1.0));
    if correction <= 0.0 {
        return Err(StatsError::degenerate(
            "Friedman",
            "every subject is tied across conditions",
        ));
    }
    chi2 /= correction;
    let df = fk - 1.0;
    Ok(RankTest {
        statistic: chi2,
        df,
        p_value: chi2_sf(chi2, df),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/nonparametric.rs"]
mod tests;
