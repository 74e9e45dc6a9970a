//! Ordinary least squares with coefficient standard errors.
//!
//! Solves `min ‖Xβ − y‖²` through a Householder QR factorisation `X = QR`
//! rather than forming and inverting `XᵀX`:
//!
//! ```text
//! β        = R⁻¹ Qᵀy
//! σ²       = ‖y − Xβ‖² / (n − p)
//! (XᵀX)⁻¹  = R⁻¹ R⁻ᵀ
//! se_j     = sqrt(σ² · [(XᵀX)⁻¹]_jj)
//! ```
//!
//! Rank is judged column by column: after the earlier columns have been
//! projected out, a column whose remaining norm is below `rank_tolerance`
//! times its original norm is declared dependent and the fit is rejected.

use crate::error::{RegressionError, Result, SingularReason};
use ndarray::{Array1, Array2, s};

/// Output of one least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Coefficients in column order (intercept first)
    pub coefficients: Array1<f64>,
    /// Standard errors, parallel to `coefficients`
    pub standard_errors: Array1<f64>,
    /// Residual variance estimate σ²
    pub residual_variance: f64,
    /// Centred R-squared
    pub r_squared: f64,
    /// Number of observations used
    pub observations: usize,
}

impl OlsFit {
    /// Residual degrees of freedom (n − p).
    pub fn residual_dof(&self) -> usize {
        self.observations - self.coefficients.len()
    }
}

/// Fit `y ≈ Xβ` by least squares.
///
/// # Errors
///
/// Returns [`RegressionError::DimensionMismatch`] if `y` and `x` disagree on the
/// number of rows or `x` has no columns, and
/// [`RegressionError::SingularDesignMatrix`] if `x` has no more rows than
/// columns or is rank deficient.
pub fn solve_ols(x: &Array2<f64>, y: &Array1<f64>, rank_tolerance: f64) -> Result<OlsFit> {
    let (n, p) = x.dim();
    if y.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if p == 0 {
        return Err(RegressionError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }
    if n <= p {
        return Err(RegressionError::SingularDesignMatrix(
            SingularReason::NoResidualDegreesOfFreedom {
                observations: n,
                parameters: p,
            },
        ));
    }

    let (r, qty) = householder_qr(x, y, rank_tolerance)?;

    let coefficients = back_substitute(&r, &qty.slice(s![..p]).to_owned());
    let r_inv = upper_triangular_inverse(&r);

    let residuals = y - &x.dot(&coefficients);
    let rss = residuals.dot(&residuals);
    let residual_variance = rss / (n - p) as f64;

    let standard_errors = (0..p)
        .map(|j| {
            let row = r_inv.row(j);
            (residual_variance * row.dot(&row)).sqrt()
        })
        .collect();

    let y_mean = y.mean().unwrap_or(0.0);
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    Ok(OlsFit {
        coefficients,
        standard_errors,
        residual_variance,
        r_squared,
        observations: n,
    })
}

/// Householder QR of `x`, applying the same reflections to `y`.
///
/// Returns the p x p upper-triangular `R` and the full-length `Qᵀy`.
fn householder_qr(
    x: &Array2<f64>,
    y: &Array1<f64>,
    rank_tolerance: f64,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let (_, p) = x.dim();
    let column_norms: Vec<f64> = x.columns().into_iter().map(|c| c.dot(&c).sqrt()).collect();

    let mut a = x.to_owned();
    let mut qty = y.to_owned();

    for k in 0..p {
        let head = a.slice(s![k.., k]);
        let norm = head.dot(&head).sqrt();
        if norm == 0.0 || norm <= rank_tolerance * column_norms[k] {
            return Err(RegressionError::SingularDesignMatrix(
                SingularReason::RankDeficient { column: k },
            ));
        }

        // Reflect onto -sign(a_kk)·‖a_k‖·e_1 to avoid cancellation.
        let alpha = if a[[k, k]] >= 0.0 { -norm } else { norm };
        let mut v = head.to_owned();
        v[0] -= alpha;
        let v_norm_sq = v.dot(&v);

        for j in k..p {
            let mut col = a.slice_mut(s![k.., j]);
            let scale = 2.0 * v.dot(&col) / v_norm_sq;
            col.scaled_add(-scale, &v);
        }
        let mut tail = qty.slice_mut(s![k..]);
        let scale = 2.0 * v.dot(&tail) / v_norm_sq;
        tail.scaled_add(-scale, &v);
    }

    let r = a.slice(s![..p, ..p]).to_owned();
    Ok((r, qty))
}

/// Solve `Rz = b` for upper-triangular `R` with non-zero diagonal.
fn back_substitute(r: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let p = r.nrows();
    let mut z = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut acc = b[i];
        for j in (i + 1)..p {
            acc -= r[[i, j]] * z[j];
        }
        z[i] = acc / r[[i, i]];
    }
    z
}

/// Inverse of an upper-triangular matrix, column by column.
fn upper_triangular_inverse(r: &Array2<f64>) -> Array2<f64> {
    let p = r.nrows();
    let mut inv = Array2::<f64>::zeros((p, p));
    for c in 0..p {
        let mut e = Array1::<f64>::zeros(p);
        e[c] = 1.0;
        inv.column_mut(c).assign(&back_substitute(r, &e));
    }
    inv
}
