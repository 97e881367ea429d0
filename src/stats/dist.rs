//! Special functions and the distribution tails used by the hypothesis tests.
//!
//! Everything here works in `f64`. Survival functions return the upper-tail
//! probability directly so small p-values keep their precision.

use std::f64::consts::{PI, SQRT_2};

const EPS: f64 = 3.0e-16;
const FPMIN: f64 = 1.0e-300;
const MAX_ITER: usize = 1000;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        (PI / (PI * x).sin()).abs().ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + LANCZOS_G + 0.5;
        let mut a = LANCZOS[0];
        for (i, c) in LANCZOS.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}

/// Regularized incomplete beta function `I_x(a, b)`.
pub fn beta_reg(a: f64, b: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_cf(a, b, x) / a
    } else {
        1.0 - front * beta_cf(b, a, 1.0 - x) / b
    }
}

fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized lower incomplete gamma function `P(a, x)`.
pub fn gamma_p(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        gamma_series(a, x)
    } else {
        1.0 - gamma_cf(a, x)
    }
}

pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_series(a, x)
    } else {
        gamma_cf(a, x)
    }
}

fn gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_cf(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITER {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

pub fn erfc(x: f64) -> f64 {
    if x >= 0.0 {
        gamma_q(0.5, x * x)
    } else {
        1.0 + gamma_p(0.5, x * x)
    }
}

pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

pub fn normal_two_sided(z: f64) -> f64 {
    (2.0 * normal_sf(z.abs())).min(1.0)
}

/// Inverse standard normal CDF (Wichura's AS 241, PPND16).
pub fn normal_quantile(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180_625 - q * q;
        let num = ((((((2.509_080_928_730_122_7e3 * r + 3.343_057_558_358_813e4) * r
            + 6.726_577_092_700_87e4)
            * r
            + 4.592_195_393_154_987e4)
            * r
            + 1.373_169_376_550_946e4)
            * r
            + 1.971_590_950_306_551_3e3)
            * r
            + 1.331_416_678_917_843_8e2)
            * r
            + 3.387_132_872_796_366_5;
        let den = ((((((5.226_495_278_852_545e3 * r + 2.872_908_573_572_194_3e4) * r
            + 3.930_789_580_009_271e4)
            * r
            + 2.121_379_430_158_659_7e4)
            * r
            + 5.394_196_021_424_751e3)
            * r
            + 6.871_870_074_920_579e2)
            * r
            + 4.231_333_070_160_091e1)
            * r
            + 1.0;
        return q * num / den;
    }

    let tail = if q < 0.0 { p } else { 1.0 - p };
    let mut r = (-tail.ln()).sqrt();
    let value = if r <= 5.0 {
        r -= 1.6;
        let num = ((((((7.745_450_142_783_414e-4 * r + 2.272_384_498_926_918_4e-2) * r
            + 2.417_807_251_774_506e-1)
            * r
            + 1.270_458_252_452_368_4)
            * r
            + 3.647_848_324_763_204_5)
            * r
            + 5.769_497_221_460_691)
            * r
            + 4.630_337_846_156_545)
            * r
            + 1.423_437_110_749_683_5;
        let den = ((((((1.050_750_071_644_416_9e-9 * r + 5.475_938_084_995_345e-4) * r
            + 1.519_866_656_361_645_7e-2)
            * r
            + 1.481_039_764_274_800_8e-1)
            * r
            + 6.897_673_349_851e-1)
            * r
            + 1.676_384_830_183_803_8)
            * r
            + 2.053_191_626_637_759)
            * r
            + 1.0;
        num / den
    } else {
        r -= 5.0;
        let num = ((((((2.010_334_399_292_288_1e-7 * r + 2.711_555_568_743_487_6e-5) * r
            + 1.242_660_947_388_078_4e-3)
            * r
            + 2.653_218_952_657_612_4e-2)
            * r
            + 2.965_605_718_285_048_7e-1)
            * r
            + 1.784_826_539_917_291_3)
            * r
            + 5.463_784_911_164_114)
            * r
            + 6.657_904_643_501_103;
        let den = ((((((2.044_263_103_389_939_7e-15 * r + 1.421_511_758_316_445_9e-7) * r
            + 1.846_318_317_510_054_8e-5)
            * r
            + 7.868_691_311_456_133e-4)
            * r
            + 1.487_536_129_085_061_5e-2)
            * r
            + 1.369_298_809_227_358e-1)
            * r
            + 5.998_322_065_558_879e-1)
            * r
            + 1.0;
        num / den
    };
    if q < 0.0 { -value } else { value }
}

pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    beta_reg(0.5 * df, 0.5, df / (df + t * t))
}

pub fn f_sf(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || df1 <= 0.0 || df2 <= 0.0 {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    beta_reg(0.5 * df2, 0.5 * df1, df2 / (df2 + df1 * f))
}

pub fn chi2_sf(x: f64, df: f64) -> f64 {
    if x.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(0.5 * df, 0.5 * x)
}

const GAUSS_X12: [f64; 6] = [
    0.981_560_634_246_719_3,
    0.904_117_256_370_474_9,
    0.769_902_674_194_304_7,
    0.587_317_954_286_617_4,
    0.367_831_498_998_180_2,
    0.125_233_408_511_468_9,
];
const GAUSS_W12: [f64; 6] = [
    0.047_175_336_386_511_83,
    0.106_939_325_995_318_43,
    0.160_078_328_543_346_23,
    0.203_167_426_723_065_92,
    0.233_492_536_538_354_8,
    0.249_147_045_813_402_8,
];
const GAUSS_X16: [f64; 8] = [
    0.989_400_934_991_649_9,
    0.944_575_023_073_232_6,
    0.865_631_202_387_831_7,
    0.755_404_408_355_003,
    0.617_876_244_402_643_7,
    0.458_016_777_657_227_4,
    0.281_603_550_779_258_9,
    0.095_012_509_837_637_44,
];
const GAUSS_W16: [f64; 8] = [
    0.027_152_459_411_754_095,
    0.062_253_523_938_647_89,
    0.095_158_511_682_492_78,
    0.124_628_971_255_533_87,
    0.149_595_988_816_576_73,
    0.169_156_519_395_002_54,
    0.182_603_415_044_923_6,
    0.189_450_610_455_068_5,
];

fn range_prob(w: f64, k: f64) -> f64 {
    const UPPER: f64 = 8.0;
    let half = 0.5 * w;
    if half >= UPPER {
        return 1.0;
    }

    let mut pr_w = 2.0 * normal_cdf(half) - 1.0;
    pr_w = if pr_w >= (-50.0 / k).exp() {
        pr_w.powf(k)
    } else {
        0.0
    };

    let intervals = if w > 3.0 { 2.0 } else { 3.0 };
    let step = (UPPER - half) / intervals;
    let mut lower = half;
    let mut upper = half + step;
    let k1 = k - 1.0;
    let mut integral = 0.0;

    let mut wi = 1.0;
    while wi <= intervals {
        let mid = 0.5 * (upper + lower);
        let rad = 0.5 * (upper - lower);
        let mut sum = 0.0;
        for jj in 0..12 {
            let (j, node) = if jj < 6 {
                (jj, -GAUSS_X12[jj])
            } else {
                (11 - jj, GAUSS_X12[11 - jj])
            };
            let ac = mid + rad * node;
            let qexpo = ac * ac;
            if qexpo > 60.0 {
                break;
            }
            let inner = normal_cdf(ac) - normal_cdf(ac - w);
            if inner >= (-30.0 / k1).exp() {
                sum += GAUSS_W12[j] * (-0.5 * qexpo).exp() * inner.powf(k1);
            }
        }
        integral += sum * (2.0 * rad * k) / (2.0 * PI).sqrt();
        lower = upper;
        upper += step;
        wi += 1.0;
    }

    pr_w += integral;
    if pr_w <= (-30.0f64).exp() {
        return 0.0;
    }
    pr_w.min(1.0)
}

/// CDF of the studentized range distribution for `k` means and `df` error
/// degrees of freedom (Copenhaver & Holland quadrature).
pub fn ptukey(q: f64, k: f64, df: f64) -> f64 {
    if q.is_nan() || k < 2.0 || df < 2.0 {
        return f64::NAN;
    }
    if q <= 0.0 {
        return 0.0;
    }
    if q.is_infinite() {
        return 1.0;
    }
    if df > 25_000.0 {
        return range_prob(q, k);
    }

    let f2 = 0.5 * df;
    let f21 = f2 - 1.0;
    let ff4 = 0.25 * df;
    let ulen: f64 = if df <= 100.0 {
        1.0
    } else if df <= 800.0 {
        0.5
    } else if df <= 5000.0 {
        0.25
    } else {
        0.125
    };
    let lead = f2 * df.ln() - df * std::f64::consts::LN_2 - ln_gamma(f2) + ulen.ln();

    let mut total = 0.0;
    for i in 1..=50 {
        let mut interval_sum = 0.0;
        let twa1 = (2 * i - 1) as f64 * ulen;
        for jj in 0..16 {
            let (j, offset) = if jj < 8 {
                (jj, -GAUSS_X16[jj] * ulen)
            } else {
                (jj - 8, GAUSS_X16[jj - 8] * ulen)
            };
            let u = twa1 + offset;
            let t1 = lead + f21 * u.ln() - u * ff4;
            if t1 >= -30.0 {
                let qsqz = q * (0.5 * u).sqrt();
                interval_sum += range_prob(qsqz, k) * GAUSS_W16[j] * t1.exp();
            }
        }
        if i as f64 * ulen >= 1.0 && interval_sum <= 1.0e-14 {
            break;
        }
        total += interval_sum;
    }
    total.min(1.0)
}

pub fn ptukey_sf(q: f64, k: f64, df: f64) -> f64 {
    (1.0 - ptukey(q, k, df)).clamp(0.0, 1.0)
}

/// Quantile of the studentized range distribution, found by bisection.
pub fn qtukey(p: f64, k: f64, df: f64) -> f64 {
    if !(0.0..1.0).contains(&p) || k < 2.0 || df < 2.0 {
        return f64::NAN;
    }
    let mut lo = 0.0;
    let mut hi = 1.0;
    while ptukey(hi, k, df) < p {
        hi *= 2.0;
        if hi > 1.0e4 {
            return f64::NAN;
        }
    }
    for _ in 0..80 {
        let mid = 0.5 * (lo + hi);
        if ptukey(mid, k, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1.0e-9 {
            break;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/dist.rs"]
mod tests;
