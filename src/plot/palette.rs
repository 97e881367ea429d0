/// Viridis sampled at 0.0, 0.1, ..., 1.0.
const VIRIDIS: [(u8, u8, u8); 11] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x24, 0x75),
    (0x41, 0x44, 0x87),
    (0x35, 0x5f, 0x8d),
    (0x2a, 0x78, 0x8e),
    (0x21, 0x91, 0x8c),
    (0x22, 0xa8, 0x84),
    (0x44, 0xbf, 0x70),
    (0x7a, 0xd1, 0x51),
    (0xbd, 0xdf, 0x26),
    (0xfd, 0xe7, 0x25),
];

pub const FALLBACK_COLOR: &str = "gray";

/// `n` colours spaced evenly inside the viridis map, endpoints excluded.
pub fn viridis(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| viridis_at(i as f64 / (n + 1) as f64))
        .collect()
}

/// Colour at position `t` in `[0, 1]`, linearly interpolated.
pub fn viridis_at(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS[lo];
    let (r1, g1, b1) = VIRIDIS[hi];
    format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/palette.rs"]
mod tests;
