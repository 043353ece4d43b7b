//! Linear least squares for design-matrix regression
//!
//! Solves `(XᵀX + λI) β = Xᵀy` by Gaussian elimination with partial pivoting.
//! The intercept column (if any) is regularized like every other column, so
//! callers should keep `ridge` small.

use crate::{MathError, Result};

/// Fit coefficients for the rows of `x` against `y`.
///
/// Every row must have the same width. `ridge` must be non-negative.
pub fn least_squares(x: &[Vec<f64>], y: &[f64], ridge: f64) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            x.len(),
            y.len()
        )));
    }
    if ridge < 0.0 || !ridge.is_finite() {
        return Err(MathError::InvalidInput(
            "Ridge penalty must be a finite non-negative number".to_string(),
        ));
    }

    let width = x[0].len();
    if width == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if x.iter().any(|row| row.len() != width) {
        return Err(MathError::InvalidInput(
            "Design matrix rows have inconsistent widths".to_string(),
        ));
    }

    // Normal equations
    let mut gram = vec![vec![0.0; width]; width];
    let mut rhs = vec![0.0; width];
    for (row, &target) in x.iter().zip(y) {
        for i in 0..width {
            rhs[i] += row[i] * target;
            for j in i..width {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..width {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
        gram[i][i] += ridge;
    }

    solve(gram, rhs)
}

/// Evaluate a fitted linear model on one row.
pub fn predict_linear(coefficients: &[f64], row: &[f64]) -> Result<f64> {
    if coefficients.len() != row.len() {
        return Err(MathError::InvalidInput(format!(
            "Expected {} features, got {}",
            coefficients.len(),
            row.len()
        )));
    }

    Ok(coefficients.iter().zip(row).map(|(c, v)| c * v).sum())
}

fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Singular system: features are linearly dependent".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares solution is not finite".to_string(),
        ));
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_recovers_exact_line() {
        // y = 2 + 3x
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * i as f64).collect();

        let beta = least_squares(&x, &y, 0.0).unwrap();
        assert_abs_diff_eq!(beta[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(beta[1], 3.0, epsilon = 1e-9);

        let next = predict_linear(&beta, &[1.0, 5.0]).unwrap();
        assert_abs_diff_eq!(next, 17.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_system_is_rejected() {
        // Two identical columns
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64, i as f64]).collect();
        let y = vec![0.0, 1.0, 2.0, 3.0];

        let result = least_squares(&x, &y, 0.0);
        assert!(matches!(result, Err(MathError::CalculationError(_))));

        // A ridge penalty makes it solvable
        assert!(least_squares(&x, &y, 1e-3).is_ok());
    }

    #[test]
    fn test_shape_validation() {
        assert!(least_squares(&[], &[], 0.0).is_err());
        assert!(least_squares(&[vec![1.0]], &[1.0, 2.0], 0.0).is_err());
        assert!(least_squares(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0], 0.0).is_err());
        assert!(least_squares(&[vec![1.0]], &[1.0], -1.0).is_err());
        assert!(predict_linear(&[1.0, 2.0], &[1.0]).is_err());
    }
}
