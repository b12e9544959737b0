//! Two-sample Kolmogorov–Smirnov test, used to compare chain output with reference draws.

use num_traits::Float;

use crate::error::{as_f64, MetropolisError};

/// Outcome of a two-sample KS test at significance `level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub is_rejected: bool,
    pub statistic: f64,
    pub p_value: f64,
    pub level: f64,
}

/// Tests whether `sample_1` and `sample_2` come from the same continuous distribution.
///
/// The null hypothesis is rejected when the asymptotic p-value falls below `level`.
/// Both samples are assumed independent; thin autocorrelated chains before testing.
pub fn two_sample_ks_test<T: Float>(
    sample_1: &[T],
    sample_2: &[T],
    level: f64,
) -> Result<TestResult, MetropolisError> {
    if !(0.0..=1.0).contains(&level) {
        return Err(MetropolisError::invalid(format!(
            "significance level must lie in [0, 1], got {level}"
        )));
    }
    let statistic = ks_statistic(sample_1, sample_2)?;
    let (n, m) = (sample_1.len() as f64, sample_2.len() as f64);
    let n_eff = (n * m / (n + m)).sqrt();
    let p_value = kolmogorov_q((n_eff + 0.12 + 0.11 / n_eff) * statistic);
    Ok(TestResult {
        is_rejected: p_value < level,
        statistic,
        p_value,
        level,
    })
}

fn sorted<T: Float>(sample: &[T]) -> Result<Vec<f64>, MetropolisError> {
    let mut xs: Vec<f64> = sample.iter().map(|&x| as_f64(x)).collect();
    if xs.iter().any(|x| x.is_nan()) {
        return Err(MetropolisError::stats("KS test sample contains NaN"));
    }
    xs.sort_unstable_by(f64::total_cmp);
    Ok(xs)
}

/// Largest vertical distance between the two empirical CDFs.
pub fn ks_statistic<T: Float>(sample_1: &[T], sample_2: &[T]) -> Result<f64, MetropolisError> {
    if sample_1.is_empty() || sample_2.is_empty() {
        return Err(MetropolisError::stats("KS test needs two non-empty samples"));
    }
    let a = sorted(sample_1)?;
    let b = sorted(sample_2)?;
    let (n, m) = (a.len() as f64, b.len() as f64);

    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    Ok(d)
}

/// Complementary CDF of the Kolmogorov distribution,
/// `Q(λ) = 2 Σ_{k≥1} (-1)^{k-1} exp(-2 k² λ²)`.
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.0;
    }
    let a = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let k = k as f64;
        let term = sign * (a * k * k).exp();
        sum += term;
        if term.abs() < 1e-12 * sum.abs() {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn draws(mean: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Normal::new(mean, 1.0)
            .unwrap()
            .sample_iter(&mut rng)
            .take(n)
            .collect()
    }

    #[test]
    fn disjoint_samples_have_statistic_one() {
        let d = ks_statistic(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_abs_diff_eq!(d, 1.0);
    }

    #[test]
    fn identical_samples_have_statistic_zero() {
        let xs = [0.3, -1.0, 2.5, 0.0];
        assert_abs_diff_eq!(ks_statistic(&xs, &xs).unwrap(), 0.0);
    }

    #[test]
    fn interleaved_samples() {
        // ECDFs differ by at most 1/4 at every jump.
        let d = ks_statistic(&[1.0, 3.0, 5.0, 7.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert_abs_diff_eq!(d, 0.25);
    }

    #[test]
    fn same_distribution_is_not_rejected() {
        let a = draws(0.0, 2_000, 1);
        let b = draws(0.0, 2_000, 2);
        let result = two_sample_ks_test(&a, &b, 0.01).unwrap();
        assert!(!result.is_rejected, "{result:?}");
    }

    #[test]
    fn shifted_distribution_is_rejected() {
        let a = draws(0.0, 2_000, 1);
        let b = draws(0.5, 2_000, 2);
        let result = two_sample_ks_test(&a, &b, 0.01).unwrap();
        assert!(result.is_rejected, "{result:?}");
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn kolmogorov_q_reference_values() {
        assert_abs_diff_eq!(kolmogorov_q(0.0), 1.0);
        // Q(1.36) ~ 0.049, the classical 5% critical value.
        assert_abs_diff_eq!(kolmogorov_q(1.36), 0.0494, epsilon = 1e-3);
        assert!(kolmogorov_q(3.0) < 1e-6);
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(ks_statistic::<f64>(&[], &[1.0]).is_err());
        assert!(ks_statistic(&[f64::NAN], &[1.0]).is_err());
        assert!(two_sample_ks_test(&[1.0], &[2.0], 1.5).is_err());
    }
}
