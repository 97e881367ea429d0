/// Linear map from a data interval onto a pixel interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (mut d0, mut d1) = domain;
        if !(d1 - d0).is_finite() || d1 == d0 {
            d0 -= 0.5;
            d1 += 0.5;
        }
        Self {
            d0,
            d1,
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn map(&self, v: f64) -> f64 {
        self.r0 + (v - self.d0) / (self.d1 - self.d0) * (self.r1 - self.r0)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.d0, self.d1)
    }
}

/// Round tick positions covering `[lo, hi]`, about `target` of them.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo || target < 2 {
        return if lo.is_finite() { vec![lo] } else { Vec::new() };
    }
    let step = nice_step((hi - lo) / (target - 1) as f64);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn nice_step(raw: f64) -> f64 {
    let exp = raw.log10().floor();
    let base = 10f64.powf(exp);
    let f = raw / base;
    let nf = if f < 1.5 {
        1.0
    } else if f < 3.0 {
        2.0
    } else if f < 7.0 {
        5.0
    } else {
        10.0
    };
    nf * base
}

/// Tick label without trailing noise (`0.30000000000000004` -> `0.3`).
pub fn tick_label(v: f64) -> String {
    let rounded = (v * 1e6).round() / 1e6;
    let s = format!("{rounded}");
    if s == "-0" { "0".to_string() } else { s }
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/axis.rs"]
mod tests;
