//! Arithmetic on natural-logarithm scores.

use num_traits::Float;

/// Computes `log(Σ exp(a_k + b_k))` over pairs `(a_k, b_k)`.
///
/// The sum is shifted by the largest finite `b_k` before exponentiation, so that the
/// accumulated values (typically the previous column of a DP matrix) cannot underflow.
/// If no `b_k` is finite, the shift is zero and the result is negative infinity.
pub fn log_sum_exp<F: Float>(terms: impl Iterator<Item = (F, F)> + Clone) -> F {
    let shift = terms
        .clone()
        .map(|(_, accumulated)| accumulated)
        .filter(|accumulated| accumulated.is_finite())
        .fold(None, |maximum: Option<F>, accumulated| {
            Some(maximum.map_or(accumulated, |maximum| maximum.max(accumulated)))
        })
        .unwrap_or_else(F::zero);

    let sum = terms.fold(F::zero(), |sum, (score, accumulated)| {
        sum + (score + accumulated - shift).exp()
    });

    sum.ln() + shift
}

#[cfg(test)]
mod tests {
    use super::log_sum_exp;

    #[test]
    fn sums_in_probability_space() {
        let terms = [(0.5f64.ln(), 0.0), (0.25f64.ln(), 0.0), (0.0, 0.25f64.ln())];
        let result = log_sum_exp(terms.iter().copied());
        assert!((result - 1.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn survives_tiny_values() {
        let terms = [(0.0, -2000.0), (0.0, -2000.0)];
        let result: f64 = log_sum_exp(terms.iter().copied());
        assert!((result - (-2000.0 + 2.0f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn all_impossible() {
        let terms = [(0.0, f64::NEG_INFINITY), (-1.0, f64::NEG_INFINITY)];
        assert_eq!(log_sum_exp(terms.iter().copied()), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(std::iter::empty::<(f64, f64)>()),
            f64::NEG_INFINITY
        );
    }
}
