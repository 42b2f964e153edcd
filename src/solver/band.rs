/// Solve the per-cell scattering system across all angles in O(N).
///
/// Unknowns are `x[m] = w[m] * I[m]`. Row `m` reads
/// `ma[m][0] * x[m] + ma[m][1] * x[m] / w[m] + ma[m][2] * sum(x) = rhs[m]`,
/// i.e. a diagonal plus a rank-one coupling through the shared sum.
/// `ma` is flat with three entries per row, `diag` is scratch of length N.
///
/// On success `rhs` holds `x` and the shared sum is returned.
/// Returns `None` if a diagonal entry vanishes, or if the coupling denominator
/// is lost in the roundoff of the terms that form it.
pub fn special_matrix_solve(ma: &[f64], weights: &[f64], rhs: &mut [f64], diag: &mut [f64]) -> Option<f64> {
    let n = rhs.len();
    debug_assert_eq!(ma.len(), 3 * n);
    debug_assert_eq!(weights.len(), n);
    debug_assert!(diag.len() >= n);

    // Eliminate each row's diagonal, accumulating the reduced equation for sum(x)
    let mut rhs_sum = 0.0;
    let mut coupling = 1.0;
    let mut scale = 1.0;
    for (m, row) in ma.chunks_exact(3).enumerate() {
        let d = row[0] + row[1] / weights[m];
        if d == 0.0 || !d.is_finite() {
            return None;
        }
        diag[m] = d;
        rhs_sum += rhs[m] / d;
        coupling += row[2] / d;
        scale += (row[2] / d).abs();
    }
    if !coupling.is_finite() || !(coupling.abs() > f64::EPSILON * scale) {
        return None;
    }
    let shared = rhs_sum / coupling;

    for (m, row) in ma.chunks_exact(3).enumerate() {
        rhs[m] = (rhs[m] - row[2] * shared) / diag[m];
    }
    Some(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dense Gaussian elimination with partial pivoting.
    fn dense_solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
        let n = b.len();
        for col in 0..n {
            let piv = (col..n)
                .max_by(|&r, &s| a[r][col].abs().partial_cmp(&a[s][col].abs()).unwrap())
                .unwrap();
            a.swap(col, piv);
            b.swap(col, piv);
            for r in (col + 1)..n {
                let f = a[r][col] / a[col][col];
                for c in col..n {
                    a[r][c] -= f * a[col][c];
                }
                b[r] -= f * b[col];
            }
        }
        let mut x = vec![0.0; n];
        for r in (0..n).rev() {
            let s: f64 = ((r + 1)..n).map(|c| a[r][c] * x[c]).sum();
            x[r] = (b[r] - s) / a[r][r];
        }
        x
    }

    fn sample_system(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let weights: Vec<f64> = (0..n).map(|m| 1.0 + 0.1 * m as f64).collect();
        let wsum: f64 = weights.iter().sum();
        let weights: Vec<f64> = weights.iter().map(|w| w / wsum).collect();
        let mut ma = Vec::with_capacity(3 * n);
        for m in 0..n {
            let t = m as f64;
            ma.push((2.0 + 0.3 * t.sin()) / weights[m]);
            ma.push(0.05 * t.cos());
            ma.push(-0.4 - 0.02 * t);
        }
        let rhs: Vec<f64> = (0..n).map(|m| 1.0 + 0.5 * (m as f64 * 0.7).cos()).collect();
        (ma, weights, rhs)
    }

    #[test]
    fn test_matches_dense_elimination() {
        let n = 24;
        let (ma, weights, rhs) = sample_system(n);
        let mut dense = vec![vec![0.0; n]; n];
        for m in 0..n {
            for k in 0..n {
                dense[m][k] = ma[3 * m + 2];
            }
            dense[m][m] += ma[3 * m] + ma[3 * m + 1] / weights[m];
        }
        let expected = dense_solve(dense, rhs.clone());

        let mut x = rhs.clone();
        let mut diag = vec![0.0; n];
        let shared = special_matrix_solve(&ma, &weights, &mut x, &mut diag).unwrap();
        for m in 0..n {
            assert!(
                (x[m] - expected[m]).abs() < 1e-12 * expected[m].abs().max(1.0),
                "row {}: special {} vs dense {}",
                m, x[m], expected[m]
            );
        }
        let sum: f64 = x.iter().sum();
        assert!((shared - sum).abs() < 1e-12, "shared sum {} vs {}", shared, sum);
    }

    #[test]
    fn test_no_coupling_is_diagonal_solve() {
        let n = 8;
        let weights = vec![1.0 / n as f64; n];
        let mut ma = Vec::new();
        for m in 0..n {
            ma.extend_from_slice(&[2.0 + m as f64, 0.0, 0.0]);
        }
        let rhs: Vec<f64> = (0..n).map(|m| 3.0 * m as f64 + 1.0).collect();
        let mut x = rhs.clone();
        let mut diag = vec![0.0; n];
        special_matrix_solve(&ma, &weights, &mut x, &mut diag).unwrap();
        for m in 0..n {
            assert_eq!(x[m], rhs[m] / ma[3 * m], "row {} should be a plain diagonal solve", m);
        }
    }

    #[test]
    fn test_isotropic_scattering_conserves_sum() {
        // Zero-velocity scattering rows: (1 + a)/w x - a sum(x) = I_prev
        let n = 8;
        let a = 37.5;
        let weights = vec![1.0 / n as f64; n];
        let mut ma = Vec::new();
        for m in 0..n {
            ma.extend_from_slice(&[(1.0 + a) / weights[m], 0.0, -a]);
        }
        let prev: Vec<f64> = (0..n).map(|m| (m as f64).powi(2)).collect();
        let j_prev: f64 = prev.iter().zip(&weights).map(|(i, w)| i * w).sum();
        let mut x = prev.clone();
        let mut diag = vec![0.0; n];
        let j_new = special_matrix_solve(&ma, &weights, &mut x, &mut diag).unwrap();
        assert!((j_new - j_prev).abs() < 1e-12 * j_prev, "J should be conserved: {} vs {}", j_new, j_prev);
    }

    #[test]
    fn test_thick_isotropic_system_not_singular() {
        // Coupling is 1 / (1 + a): small, but far above roundoff
        let n = 8;
        let a = 1e6;
        let weights = vec![1.0 / n as f64; n];
        let mut ma = Vec::new();
        for m in 0..n {
            ma.extend_from_slice(&[(1.0 + a) / weights[m], 0.0, -a]);
        }
        let mut x = vec![1e18; n];
        let mut diag = vec![0.0; n];
        let shared = special_matrix_solve(&ma, &weights, &mut x, &mut diag).expect("well-posed thick system");
        assert!((shared - 1e18).abs() < 1e-8 * 1e18, "sum(x) should stay 1e18, got {}", shared);
        for m in 0..n {
            assert!((x[m] - 1.25e17).abs() < 1e-8 * 1.25e17, "row {}: {}", m, x[m]);
        }
    }

    #[test]
    fn test_singular_diagonal_detected() {
        let weights = vec![0.5, 0.5];
        let ma = vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let mut x = vec![1.0, 1.0];
        let mut diag = vec![0.0; 2];
        assert!(special_matrix_solve(&ma, &weights, &mut x, &mut diag).is_none());
    }

    #[test]
    fn test_singular_coupling_detected() {
        // d = 1 per row, coupling 1 + 2 * (-0.5) = 0
        let weights = vec![0.5, 0.5];
        let ma = vec![1.0, 0.0, -0.5, 1.0, 0.0, -0.5];
        let mut x = vec![1.0, 2.0];
        let mut diag = vec![0.0; 2];
        assert!(special_matrix_solve(&ma, &weights, &mut x, &mut diag).is_none());
    }
}
