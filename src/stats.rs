//! Chain statistics and the post-processing a caller applies to raw output:
//! running summaries, convergence diagnostics, thinning, angle wrapping and histograms.

use ndarray::prelude::*;
use ndarray::s;
use ndarray_stats::QuantileExt;
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::distributions::lit;
use crate::error::{as_f64, MetropolisError};

/// Streaming summary of a single chain.
///
/// A step counts as accepted when the new state differs from the previous one. For
/// continuous proposals this matches the sampler's own bookkeeping except for the
/// (measure zero) case of proposing the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTracker<T> {
    n: u64,
    n_moved: u64,
    mean: f64,
    m2: f64,
    last_state: T,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainStats {
    pub n: u64,
    pub p_accept: f64,
    pub mean: f64,
    /// Unbiased sample variance; NaN until two states have been seen.
    pub variance: f64,
}

impl<T: Float> ChainTracker<T> {
    pub fn new(initial_state: T) -> Self {
        Self {
            n: 0,
            n_moved: 0,
            mean: 0.0,
            m2: 0.0,
            last_state: initial_state,
        }
    }

    pub fn step(&mut self, x: T) {
        self.n += 1;
        if x != self.last_state {
            self.n_moved += 1;
        }
        self.last_state = x;

        // Welford
        let x = as_f64(x);
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn p_accept(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.n_moved as f64 / self.n as f64
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            f64::NAN
        } else {
            self.m2 / (self.n - 1) as f64
        }
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            n: self.n,
            p_accept: self.p_accept(),
            mean: self.mean,
            variance: self.variance(),
        }
    }
}

/// Split-chain potential scale reduction factor (R-hat).
///
/// `samples` has shape `[n_chains, n_samples]`. Each chain is split into two halves
/// (the middle draw is dropped when `n_samples` is odd) and the usual between/within
/// variance comparison is applied to the halves. Values close to 1 indicate the chains
/// agree; values well above 1 indicate they have not mixed.
pub fn split_rhat<T: Float>(samples: &Array2<T>) -> Result<f64, MetropolisError> {
    let (n_chains, n_samples) = samples.dim();
    if n_chains == 0 || n_samples < 4 {
        return Err(MetropolisError::stats(format!(
            "split R-hat needs at least one chain of length 4, got shape [{n_chains}, {n_samples}]"
        )));
    }
    let half = n_samples / 2;
    let x = samples.mapv(as_f64);
    let halves = ndarray::concatenate(
        Axis(0),
        &[
            x.slice(s![.., ..half]),
            x.slice(s![.., n_samples - half..]),
        ],
    )
    .map_err(|e| MetropolisError::stats(format!("splitting chains failed: {e}")))?;

    let n = half as f64;
    let chain_means = halves
        .mean_axis(Axis(1))
        .ok_or_else(|| MetropolisError::stats("empty chains"))?;
    let within = halves.var_axis(Axis(1), 1.0).mean().unwrap_or(f64::NAN);
    let between = n * chain_means.var(1.0);

    if !(within > 0.0) {
        return Err(MetropolisError::stats(
            "within-chain variance is zero; chains are constant",
        ));
    }
    let var_plus = (n - 1.0) / n * within + between / n;
    Ok((var_plus / within).sqrt())
}

/// Normalized autocorrelation of `samples` at lags `0..samples.len()`, via FFT.
pub fn autocorrelation<T: Float>(samples: &[T]) -> Result<Vec<f64>, MetropolisError> {
    let n = samples.len();
    if n < 2 {
        return Err(MetropolisError::stats(
            "autocorrelation needs at least two samples",
        ));
    }
    let mean = samples.iter().map(|&x| as_f64(x)).sum::<f64>() / n as f64;
    let size = (2 * n).next_power_of_two();
    let mut buf: Vec<Complex<f64>> = samples
        .iter()
        .map(|&x| Complex::new(as_f64(x) - mean, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(size).process(&mut buf);
    for c in buf.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(size).process(&mut buf);

    let c0 = buf[0].re;
    if !(c0 > 0.0) {
        return Err(MetropolisError::stats(
            "autocorrelation is undefined for a constant sequence",
        ));
    }
    Ok(buf[..n].iter().map(|c| c.re / c0).collect())
}

/// Effective sample size from Geyer's initial monotone positive sequence estimator.
pub fn effective_sample_size<T: Float>(samples: &[T]) -> Result<f64, MetropolisError> {
    let n = samples.len();
    if n < 4 {
        return Err(MetropolisError::stats(
            "effective sample size needs at least four samples",
        ));
    }
    let rho = autocorrelation(samples)?;

    let mut sum = 0.0;
    let mut prev = f64::INFINITY;
    for pair in rho.chunks_exact(2) {
        let p = pair[0] + pair[1];
        if p <= 0.0 {
            break;
        }
        let p = p.min(prev);
        sum += p;
        prev = p;
    }
    let tau = (2.0 * sum - 1.0).max(f64::EPSILON);
    Ok(n as f64 / tau)
}

/// Keeps every `every`-th sample, starting with the first.
pub fn thin<T: Copy>(samples: &[T], every: usize) -> Result<Vec<T>, MetropolisError> {
    if every == 0 {
        return Err(MetropolisError::invalid("thinning interval must be at least 1"));
    }
    Ok(samples.iter().step_by(every).copied().collect())
}

/// Wraps an angle into `[-π, π)`.
pub fn wrap_angle<T: Float>(x: T) -> T {
    let pi = lit::<T>(PI);
    let two_pi = pi + pi;
    x - two_pi * ((x + pi) / two_pi).floor()
}

/// One histogram bin over `[lo, hi)`; the last bin of a histogram is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    /// `count / (total * width)`, where `total` counts every sample including those
    /// outside the histogram range.
    pub density: f64,
}

impl Bin {
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }
}

/// Equal-width histogram of `samples` on `[lo, hi]` with empirical density per bin.
pub fn histogram<T: Float>(
    samples: &[T],
    bins: usize,
    lo: f64,
    hi: f64,
) -> Result<Vec<Bin>, MetropolisError> {
    if bins == 0 {
        return Err(MetropolisError::invalid("histogram needs at least one bin"));
    }
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
        return Err(MetropolisError::invalid(format!(
            "histogram range must satisfy lo < hi, got [{lo}, {hi}]"
        )));
    }
    if samples.is_empty() {
        return Err(MetropolisError::stats("histogram of an empty sample"));
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for x in samples.iter().map(|&x| as_f64(x)) {
        if x < lo || x > hi || x.is_nan() {
            continue;
        }
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = samples.len() as f64;
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            count,
            density: count as f64 / (total * width),
        })
        .collect())
}

/// Summary of a finished set of draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize<T: Float>(samples: &[T]) -> Result<Summary, MetropolisError> {
    if samples.len() < 2 {
        return Err(MetropolisError::stats("summary needs at least two samples"));
    }
    let x = Array1::from_iter(samples.iter().map(|&x| as_f64(x)));
    let min = *x
        .min()
        .map_err(|e| MetropolisError::stats(format!("minimum: {e}")))?;
    let max = *x
        .max()
        .map_err(|e| MetropolisError::stats(format!("maximum: {e}")))?;
    Ok(Summary {
        n: x.len(),
        mean: x.mean().unwrap_or(f64::NAN),
        std: x.std(1.0),
        min,
        max,
    })
}
