/*!
Target densities and proposal mechanisms for one-dimensional random-walk samplers.

This module is generic over the floating-point precision (e.g., `f32` or `f64`) using
the [`num_traits::Float`] trait. It defines three traits:

- [`Target`] for unnormalized densities we want to sample from,
- [`Normalized`] for densities that can also report a fully normalized value
  (useful for overlaying the theoretical curve on a histogram),
- [`Proposal`] for symmetric random-walk proposals.

Any closure `Fn(T) -> T` is a [`Target`], so an ad-hoc density needs no wrapper type.

# Examples

```rust
use walkabout::distributions::{GaussianWalk, Proposal, Target, VonMises};
use rand::rngs::SmallRng;
use rand::SeedableRng;

// Closures are targets.
let f = |x: f64| (10.0 * x.cos()).exp();
assert!(f.unnorm_density(0.0) > f.unnorm_density(1.0));

// So are the provided densities.
let vm = VonMises::new(0.0, 10.0).unwrap();
assert!(vm.unnorm_density(0.0) > vm.unnorm_density(1.0));

// Proposals draw from an explicitly passed generator.
let mut rng = SmallRng::seed_from_u64(42);
let proposal = GaussianWalk::new(0.25).unwrap();
let candidate: f64 = proposal.sample(0.5, &mut rng);
assert!(candidate.is_finite());
```
*/

use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, Open01, Standard, StandardNormal};
use std::f64::consts::PI;

use crate::error::{as_f64, MetropolisError};

/// Converts an `f64` constant into `T`.
pub(crate) fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/// A continuous target distribution known up to a normalizing constant.
pub trait Target<T: Float> {
    /// Returns a non-negative weight proportional to the density at `x`.
    fn unnorm_density(&self, x: T) -> T;
}

impl<T: Float, F> Target<T> for F
where
    F: Fn(T) -> T,
{
    fn unnorm_density(&self, x: T) -> T {
        self(x)
    }
}

/// A distribution that can evaluate its fully normalized density.
pub trait Normalized<T: Float> {
    fn pdf(&self, x: T) -> T;
}

/// A symmetric proposal: the probability of proposing `b` from `a` equals that of
/// proposing `a` from `b`, so no correction enters the acceptance ratio.
pub trait Proposal<T: Float> {
    /// Draws one candidate next state given the current state.
    fn sample<R: Rng + ?Sized>(&self, current: T, rng: &mut R) -> T;

    /// Draws `n` independent candidates around the same current state.
    fn sample_n<R: Rng + ?Sized>(&self, n: usize, current: T, rng: &mut R) -> Vec<T> {
        (0..n).map(|_| self.sample(current, rng)).collect()
    }
}

fn check_positive<T: Float>(name: &str, value: T) -> Result<(), MetropolisError> {
    if value.is_finite() && value > T::zero() {
        Ok(())
    } else {
        Err(MetropolisError::invalid(format!(
            "{name} must be finite and strictly positive, got {}",
            as_f64(value)
        )))
    }
}

/**
A Gaussian random walk: the candidate is `current + sigma * z` with `z ~ N(0, 1)`.

# Examples

```rust
use walkabout::distributions::{GaussianWalk, Proposal};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut rng = SmallRng::seed_from_u64(1);
let walk = GaussianWalk::new(0.25).unwrap();
let candidates = walk.sample_n(3, 0.0f64, &mut rng);
assert_eq!(candidates.len(), 3);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianWalk<T> {
    pub sigma: T,
}

impl<T: Float> GaussianWalk<T> {
    /// Creates a Gaussian walk with standard deviation `sigma`.
    pub fn new(sigma: T) -> Result<Self, MetropolisError> {
        check_positive("sigma", sigma)?;
        Ok(Self { sigma })
    }
}

impl<T: Float> Proposal<T> for GaussianWalk<T>
where
    StandardNormal: Distribution<T>,
{
    fn sample<R: Rng + ?Sized>(&self, current: T, rng: &mut R) -> T {
        let z: T = rng.sample(StandardNormal);
        current + self.sigma * z
    }
}

/// A uniform random walk on `[current - half_width, current + half_width)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWalk<T> {
    pub half_width: T,
}

impl<T: Float> UniformWalk<T> {
    pub fn new(half_width: T) -> Result<Self, MetropolisError> {
        check_positive("half_width", half_width)?;
        Ok(Self { half_width })
    }
}

impl<T: Float> Proposal<T> for UniformWalk<T>
where
    Standard: Distribution<T>,
{
    fn sample<R: Rng + ?Sized>(&self, current: T, rng: &mut R) -> T {
        let u: T = rng.sample(Standard);
        current + self.half_width * (lit::<T>(2.0) * u - T::one())
    }
}

/**
A von Mises random walk: the step is an angle drawn from a von Mises distribution
with mean 0 and concentration `kappa`, added to the current (unwrapped) state.

Steps are drawn with the Best–Fisher rejection algorithm, so each call consumes a
variable number of uniforms from the generator (but the same number for the same
generator state). Concentrations too small or too large for the rejection envelope
fall back to a uniform or normal step, which match the von Mises law to working
precision.

Drawing from `current = 0` gives direct von Mises draws, which is handy as a
reference sample when checking a chain.

# Examples

```rust
use walkabout::distributions::{Proposal, VonMisesWalk};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut rng = SmallRng::seed_from_u64(3);
let walk = VonMisesWalk::new(4.0).unwrap();
let step = walk.sample(0.0f64, &mut rng);
assert!(step.abs() <= std::f64::consts::PI);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VonMisesWalk<T> {
    pub kappa: T,
    method: StepMethod<T>,
}

/// How a von Mises step is drawn for a given concentration.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StepMethod<T> {
    /// `kappa` is below machine epsilon: the step is uniform on `(-π, π)` to working precision.
    Uniform,
    /// Best–Fisher rejection with envelope parameter `r`.
    BestFisher { r: T },
    /// `kappa` is so large that `r` rounds to 1; the step is normal with variance `1 / kappa`.
    Normal { std: T },
}

impl<T: Float> VonMisesWalk<T> {
    pub fn new(kappa: T) -> Result<Self, MetropolisError> {
        check_positive("kappa", kappa)?;
        let one = T::one();
        let two = lit::<T>(2.0);
        let method = if kappa < T::epsilon() {
            StepMethod::Uniform
        } else if kappa > lit::<T>(0.25) / T::epsilon() {
            StepMethod::Normal {
                std: kappa.sqrt().recip(),
            }
        } else {
            // rho = (tau - sqrt(2 tau)) / (2 kappa), rearranged so small kappa does not cancel.
            let tau = one + one.hypot(two * kappa);
            let rho = two * kappa / (tau + (two * tau).sqrt());
            StepMethod::BestFisher {
                r: (one + rho * rho) / (two * rho),
            }
        };
        Ok(Self { kappa, method })
    }
}

impl<T: Float> Proposal<T> for VonMisesWalk<T>
where
    Open01: Distribution<T>,
    StandardNormal: Distribution<T>,
{
    fn sample<R: Rng + ?Sized>(&self, current: T, rng: &mut R) -> T {
        let one = T::one();
        let two = lit::<T>(2.0);
        let half = lit::<T>(0.5);
        let pi = lit::<T>(PI);
        let r = match self.method {
            StepMethod::Uniform => {
                let u: T = rng.sample(Open01);
                return current + pi * (two * u - one);
            }
            StepMethod::Normal { std } => {
                let z: T = rng.sample(StandardNormal);
                return current + std * z;
            }
            StepMethod::BestFisher { r } => r,
        };
        loop {
            let u1: T = rng.sample(Open01);
            let u2: T = rng.sample(Open01);
            let u3: T = rng.sample(Open01);
            let z = (pi * u1).cos();
            let f = (one + r * z) / (r + z);
            let c = self.kappa * (r - f);
            if c * (two - c) - u2 > T::zero() || (c / u2).ln() + one - c >= T::zero() {
                let theta = f.max(-one).min(one).acos();
                let step = if u3 > half { theta } else { -theta };
                return current + step;
            }
        }
    }
}

/// The degenerate proposal: always proposes the current state. The resulting
/// chain never moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stay;

impl<T: Float> Proposal<T> for Stay {
    fn sample<R: Rng + ?Sized>(&self, current: T, _rng: &mut R) -> T {
        current
    }
}

/// Modified Bessel function of the first kind, order zero.
pub fn bessel_i0(x: f64) -> f64 {
    bessel_i0e(x) * x.abs().exp()
}

/// Exponentially scaled `I0(x) * exp(-|x|)`, finite for every finite `x`.
///
/// Power series below `|x| = 30`, Hankel asymptotic expansion above.
pub fn bessel_i0e(x: f64) -> f64 {
    let x = x.abs();
    if x < 30.0 {
        let q = 0.25 * x * x;
        let mut term = 1.0;
        let mut sum = 1.0;
        let mut k = 1.0;
        while term > sum * f64::EPSILON {
            term *= q / (k * k);
            sum += term;
            k += 1.0;
        }
        return sum * (-x).exp();
    }
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term.abs() > sum * f64::EPSILON && k < 60.0 {
        let odd = 2.0 * k - 1.0;
        term *= odd * odd / (8.0 * k * x);
        sum += term;
        k += 1.0;
    }
    sum / (2.0 * PI * x).sqrt()
}

/**
The von Mises distribution on the circle with location `mu` and concentration `kappa`.

The unnormalized density is `exp(kappa * (cos(x - mu) - 1))`, which is proportional to
the textbook `exp(kappa * cos(x - mu))` but does not overflow for large `kappa`.

# Examples

```rust
use walkabout::distributions::{Normalized, VonMises};

let vm = VonMises::new(0.0f64, 0.0).unwrap();
// kappa = 0 is the uniform distribution on the circle.
let p = vm.pdf(1.0);
assert!((p - 1.0 / (2.0 * std::f64::consts::PI)).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VonMises<T> {
    pub mu: T,
    pub kappa: T,
}

impl<T: Float> VonMises<T> {
    pub fn new(mu: T, kappa: T) -> Result<Self, MetropolisError> {
        if !mu.is_finite() || !kappa.is_finite() || kappa < T::zero() {
            return Err(MetropolisError::invalid(format!(
                "von Mises needs finite mu and finite kappa >= 0, got mu={} kappa={}",
                as_f64(mu),
                as_f64(kappa)
            )));
        }
        Ok(Self { mu, kappa })
    }
}

impl<T: Float> Target<T> for VonMises<T> {
    fn unnorm_density(&self, x: T) -> T {
        (self.kappa * ((x - self.mu).cos() - T::one())).exp()
    }
}

impl<T: Float> Normalized<T> for VonMises<T> {
    fn pdf(&self, x: T) -> T {
        let kappa = as_f64(self.kappa);
        let norm = 2.0 * PI * bessel_i0e(kappa);
        self.unnorm_density(x) / lit::<T>(norm)
    }
}

/// A univariate normal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian<T> {
    pub mean: T,
    pub std: T,
}

impl<T: Float> Gaussian<T> {
    pub fn new(mean: T, std: T) -> Result<Self, MetropolisError> {
        check_positive("std", std)?;
        if !mean.is_finite() {
            return Err(MetropolisError::invalid("mean must be finite"));
        }
        Ok(Self { mean, std })
    }
}

impl<T: Float> Target<T> for Gaussian<T> {
    fn unnorm_density(&self, x: T) -> T {
        let z = (x - self.mean) / self.std;
        (-lit::<T>(0.5) * z * z).exp()
    }
}

impl<T: Float> Normalized<T> for Gaussian<T> {
    fn pdf(&self, x: T) -> T {
        self.unnorm_density(x) / (self.std * lit::<T>((2.0 * PI).sqrt()))
    }
}
