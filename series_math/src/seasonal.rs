//! Fourier seasonality features

use std::f64::consts::PI;

/// Fourier terms `[sin(2πkt/p), cos(2πkt/p)]` for `k = 1..=order`.
///
/// `t` and `period` must share a unit (e.g. days).
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(order * 2);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fourier_terms_repeat_every_period() {
        let a = fourier_terms(1.5, 7.0, 3);
        let b = fourier_terms(8.5, 7.0, 3);

        assert_eq!(a.len(), 6);
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_order_is_empty() {
        assert!(fourier_terms(3.0, 7.0, 0).is_empty());
    }
}
