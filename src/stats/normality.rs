//! Shapiro–Wilk test (Royston 1995, algorithm AS R94).

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::stats::StatsError;
use crate::stats::dist::{normal_quantile, normal_sf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];
const G: [f64; 2] = [-2.273, 0.459];

fn poly(coef: &[f64], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk, StatsError> {
    let n = values.len();
    if n < 3 {
        return Err(StatsError::TooFewObservations {
            test: "Shapiro-Wilk",
            needed: 3,
            got: n,
        });
    }
    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let range = x[n - 1] - x[0];
    if range <= 0.0 {
        return Ok(ShapiroWilk {
            w: 1.0,
            p_value: 1.0,
        });
    }

    let half = n / 2;
    let an = n as f64;
    let mut a = vec![0.0; half];
    if n == 3 {
        a[0] = FRAC_1_SQRT_2;
    } else {
        let an25 = an + 0.25;
        let m: Vec<f64> = (1..=half)
            .map(|i| normal_quantile((i as f64 - 0.375) / an25))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - m[0] / ssumm2;

        let (first_free, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for i in first_free..half {
            a[i] = -m[i] / fac;
        }
    }

    // antisymmetric coefficient vector over the sorted sample
    let coef: Vec<f64> = (0..n)
        .map(|i| {
            let mirror = n - 1 - i;
            if i < mirror {
                -a[i]
            } else if i > mirror {
                a[mirror]
            } else {
                0.0
            }
        })
        .collect();

    let scaled: Vec<f64> = x.iter().map(|v| v / range).collect();
    let mean_a = coef.iter().sum::<f64>() / an;
    let mean_x = scaled.iter().sum::<f64>() / an;
    let mut ssa = 0.0;
    let mut ssx = 0.0;
    let mut sax = 0.0;
    for (ca, cx) in coef.iter().zip(&scaled) {
        let da = ca - mean_a;
        let dx = cx - mean_x;
        ssa += da * da;
        ssx += dx * dx;
        sax += da * dx;
    }
    let ssassx = (ssa * ssx).sqrt();
    let w1 = (ssassx - sax) * (ssassx + sax) / (ssa * ssx);
    let w = 1.0 - w1;

    if n == 3 {
        let p = (6.0 / PI) * (w.sqrt().asin() - PI / 3.0);
        return Ok(ShapiroWilk {
            w,
            p_value: p.clamp(0.0, 1.0),
        });
    }

    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(ShapiroWilk { w, p_value: 1e-99 });
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    Ok(ShapiroWilk {
        w,
        p_value: normal_sf((y - m) / s),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/normality.rs"]
mod tests;
