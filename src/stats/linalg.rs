//! Small dense linear algebra for the ANOVA fits.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquares {
    pub rss: f64,
    pub rank: usize,
}

const RANK_TOL: f64 = 1e-10;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Ordinary least squares of `y` on the given design columns.
///
/// Columns that are linearly dependent on earlier ones are skipped, so the
/// returned rank is the dimension of the column space actually fitted.
pub fn least_squares(columns: &[Vec<f64>], y: &[f64]) -> LeastSquares {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(columns.len());
    for col in columns {
        let original = dot(col, col).sqrt();
        if original == 0.0 {
            continue;
        }
        let mut v = col.clone();
        // two passes of modified Gram-Schmidt keep the basis orthogonal
        for _ in 0..2 {
            for q in &basis {
                let r = dot(q, &v);
                axpy(-r, q, &mut v);
            }
        }
        let norm = dot(&v, &v).sqrt();
        if norm <= RANK_TOL * original {
            continue;
        }
        v.iter_mut().for_each(|x| *x /= norm);
        basis.push(v);
    }

    let mut resid = y.to_vec();
    for q in &basis {
        let r = dot(q, &resid);
        axpy(-r, q, &mut resid);
    }
    LeastSquares {
        rss: dot(&resid, &resid),
        rank: basis.len(),
    }
}

pub fn determinant(matrix: &[Vec<f64>]) -> f64 {
    let n = matrix.len();
    let mut m: Vec<Vec<f64>> = matrix.to_vec();
    let mut det = 1.0;
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            for c in col..n {
                m[row][c] -= factor * m[col][c];
            }
        }
    }
    det
}

/// Orthonormal Helmert contrasts: `k` rows, `k - 1` columns.
pub fn helmert_contrasts(k: usize) -> Vec<Vec<f64>> {
    let mut c = vec![vec![0.0; k.saturating_sub(1)]; k];
    for j in 1..k {
        let norm = ((j * (j + 1)) as f64).sqrt();
        for row in c.iter_mut().take(j) {
            row[j - 1] = 1.0 / norm;
        }
        c[j][j - 1] = -(j as f64) / norm;
    }
    c
}

pub fn covariance(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    let means: Vec<f64> = (0..k)
        .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
        .collect();
    let mut cov = vec![vec![0.0; k]; k];
    for r in rows {
        for i in 0..k {
            for j in 0..k {
                cov[i][j] += (r[i] - means[i]) * (r[j] - means[j]);
            }
        }
    }
    let denom = n.saturating_sub(1).max(1) as f64;
    cov.iter_mut()
        .for_each(|row| row.iter_mut().for_each(|v| *v /= denom));
    cov
}

/// `C^T S C` for a contrast matrix `C` (k x p) and a k x k matrix `S`.
pub fn project(s: &[Vec<f64>], c: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = c.len();
    let p = c.first().map_or(0, Vec::len);
    let mut out = vec![vec![0.0; p]; p];
    for a in 0..p {
        for b in 0..p {
            let mut acc = 0.0;
            for i in 0..k {
                for j in 0..k {
                    acc += c[i][a] * s[i][j] * c[j][b];
                }
            }
            out[a][b] = acc;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/linalg.rs"]
mod tests;
