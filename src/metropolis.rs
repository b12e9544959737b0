/*!
# Random-walk Metropolis sampler

A single-chain Metropolis sampler for one-dimensional targets known up to a
normalizing constant. Each transition:

1. draws a candidate `x'` from a symmetric [`Proposal`] around the current state `x`,
2. computes the acceptance ratio `r = f(x') / f(x)`,
3. draws `u ~ Uniform(0, 1)` and moves to `x'` iff `u <= r`, otherwise stays at `x`.

Every transition consumes exactly one proposal draw and one acceptance draw, whether
or not the candidate is accepted, so a fixed seed reproduces a chain bit for bit.
The uniform is drawn from the open interval, so a candidate with zero density is
never accepted and the density of the current state stays strictly positive.

Two entry points are provided:

- [`metropolis_sample`]: a pure function that takes an explicit random source and
  returns the whole sequence. Element `i` of the output is the state after `i`
  transitions, so the output always starts with the initial state.
- [`MetropolisChain`] / [`Metropolis`]: stateful chains owning seeded generators,
  driven through [`crate::core::ChainRunner`] for burn-in and parallel chains.

## Example

```rust
use walkabout::distributions::GaussianWalk;
use walkabout::metropolis::metropolis_sample;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let target = |x: f64| (10.0 * x.cos()).exp();
let proposal = GaussianWalk::new(0.25).unwrap();
let mut rng = SmallRng::seed_from_u64(42);

let samples = metropolis_sample(&target, 0.5, &proposal, 2_000, &mut rng).unwrap();
assert_eq!(samples.len(), 2_000);
assert_eq!(samples[0], 0.5);
```
*/

use num_traits::Float;
use rand::prelude::*;
use rand_distr::{Distribution, Open01};

use crate::core::{HasChains, MarkovChain};
use crate::distributions::{Proposal, Target};
use crate::error::{as_f64, MetropolisError};

/// Density at a state the chain may start from: finite and strictly positive.
fn initial_density<T, D>(target: &D, state: T) -> Result<T, MetropolisError>
where
    T: Float,
    D: Target<T> + ?Sized,
{
    let density = target.unnorm_density(state);
    if density.is_finite() && density > T::zero() {
        Ok(density)
    } else {
        Err(MetropolisError::Domain {
            state: as_f64(state),
            density: as_f64(density),
        })
    }
}

/// One accept/reject transition. Returns the next state, its density and whether the
/// candidate was accepted.
fn transition<T, D, Q, R>(
    target: &D,
    proposal: &Q,
    current: T,
    current_density: T,
    rng: &mut R,
) -> Result<(T, T, bool), MetropolisError>
where
    T: Float,
    D: Target<T> + ?Sized,
    Q: Proposal<T>,
    R: Rng + ?Sized,
    Open01: Distribution<T>,
{
    let candidate = proposal.sample(current, rng);
    let u: T = rng.sample(Open01);

    if !candidate.is_finite() {
        return Err(MetropolisError::NonFiniteProposal {
            current: as_f64(current),
            candidate: as_f64(candidate),
        });
    }
    let candidate_density = target.unnorm_density(candidate);
    if !candidate_density.is_finite() || candidate_density < T::zero() {
        return Err(MetropolisError::InvalidDensity {
            state: as_f64(candidate),
            density: as_f64(candidate_density),
        });
    }

    let ratio = candidate_density / current_density;
    if u <= ratio {
        Ok((candidate, candidate_density, true))
    } else {
        Ok((current, current_density, false))
    }
}

/**
Draws `num_samples` states from a random-walk Metropolis chain started at `initial_state`.

The output starts with `initial_state` and element `i` is the state after `i`
transitions; `num_samples = 1` therefore returns `[initial_state]` without touching
the generator. No burn-in or thinning is applied.

# Errors

- [`MetropolisError::InvalidArgument`] if `num_samples` is zero.
- [`MetropolisError::Domain`] if the density at `initial_state` is zero, negative or
  not finite.
- [`MetropolisError::NonFiniteProposal`] if the proposal produces a NaN or infinity.
- [`MetropolisError::InvalidDensity`] if the density at a candidate is negative or
  not finite.

# Examples

```rust
use walkabout::distributions::Stay;
use walkabout::metropolis::metropolis_sample;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut rng = SmallRng::seed_from_u64(0);
let flat = |_x: f64| 1.0;
let samples = metropolis_sample(&flat, 2.0, &Stay, 5, &mut rng).unwrap();
assert_eq!(samples, vec![2.0; 5]);
```
*/
pub fn metropolis_sample<T, D, Q, R>(
    target: &D,
    initial_state: T,
    proposal: &Q,
    num_samples: usize,
    rng: &mut R,
) -> Result<Vec<T>, MetropolisError>
where
    T: Float,
    D: Target<T> + ?Sized,
    Q: Proposal<T>,
    R: Rng + ?Sized,
    Open01: Distribution<T>,
{
    if num_samples < 1 {
        return Err(MetropolisError::invalid("num_samples must be at least 1"));
    }
    let mut density = initial_density(target, initial_state)?;

    let mut samples = Vec::with_capacity(num_samples);
    let mut current = initial_state;
    samples.push(current);
    let mut accepted = 0usize;
    for _ in 1..num_samples {
        let (next, next_density, moved) = transition(target, proposal, current, density, rng)?;
        current = next;
        density = next_density;
        accepted += moved as usize;
        samples.push(current);
    }

    if num_samples > 1 {
        log::debug!(
            "metropolis_sample: {} transitions, acceptance rate {:.3}",
            num_samples - 1,
            accepted as f64 / (num_samples - 1) as f64
        );
    }
    Ok(samples)
}

/**
The Metropolis sampler over several independent chains sharing one target and one proposal.

Each chain owns its own [`SmallRng`]. [`Metropolis::set_seed`] seeds chain `i` with
`seed + i`, making a multi-chain run reproducible even though the chains run in parallel.

# Examples

```rust
use walkabout::core::ChainRunner;
use walkabout::distributions::{GaussianWalk, VonMises};
use walkabout::metropolis::Metropolis;

let target = VonMises::new(0.0, 10.0).unwrap();
let proposal = GaussianWalk::new(0.25).unwrap();
let mut sampler = Metropolis::new(target, proposal, 0.5, 4).unwrap().set_seed(42);

// Keep 1,000 states per chain after discarding 100 as burn-in.
let samples = sampler.run(1_000, 100).unwrap();
assert_eq!(samples.shape(), &[4, 1_000]);
```
*/
#[derive(Debug, Clone)]
pub struct Metropolis<T, D, Q> {
    pub chains: Vec<MetropolisChain<T, D, Q>>,
    /// The global random seed.
    pub seed: u64,
}

/// A single random-walk Metropolis chain.
///
/// Stores its own copy of the target and proposal, the current state with its cached
/// density, and a chain-specific random number generator.
#[derive(Debug, Clone)]
pub struct MetropolisChain<T, D, Q> {
    pub target: D,
    pub proposal: Q,
    pub current_state: T,
    current_density: T,
    pub seed: u64,
    pub rng: SmallRng,
    n_steps: u64,
    n_accepted: u64,
}

impl<T, D, Q> Metropolis<T, D, Q>
where
    T: Float,
    D: Target<T> + Clone,
    Q: Proposal<T> + Clone,
{
    /// Builds `n_chains` chains, all starting at `initial_state`.
    pub fn new(
        target: D,
        proposal: Q,
        initial_state: T,
        n_chains: usize,
    ) -> Result<Self, MetropolisError> {
        if n_chains == 0 {
            return Err(MetropolisError::invalid("n_chains must be at least 1"));
        }
        let chains = (0..n_chains)
            .map(|_| MetropolisChain::new(target.clone(), proposal.clone(), initial_state))
            .collect::<Result<Vec<_>, _>>()?;
        let seed = thread_rng().gen::<u64>();

        Ok(Self { chains, seed })
    }

    /// Sets the global seed; chain `i` is reseeded with `seed + i`.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        for (i, chain) in self.chains.iter_mut().enumerate() {
            let chain_seed = seed.wrapping_add(i as u64);
            chain.seed = chain_seed;
            chain.rng = SmallRng::seed_from_u64(chain_seed);
        }
        self
    }
}

impl<T, D, Q> HasChains<T> for Metropolis<T, D, Q>
where
    T: Float + Send,
    D: Target<T> + Clone + Send,
    Q: Proposal<T> + Clone + Send,
    Open01: Distribution<T>,
{
    type Chain = MetropolisChain<T, D, Q>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

impl<T, D, Q> MetropolisChain<T, D, Q>
where
    T: Float,
    D: Target<T>,
    Q: Proposal<T>,
{
    /// Creates a chain at `initial_state` with a randomly drawn seed.
    ///
    /// Fails with [`MetropolisError::Domain`] if the target density at `initial_state`
    /// is not finite and strictly positive.
    pub fn new(target: D, proposal: Q, initial_state: T) -> Result<Self, MetropolisError> {
        let current_density = initial_density(&target, initial_state)?;
        let seed = thread_rng().gen::<u64>();
        Ok(Self {
            target,
            proposal,
            current_state: initial_state,
            current_density,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            n_steps: 0,
            n_accepted: 0,
        })
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    pub fn n_accepted(&self) -> u64 {
        self.n_accepted
    }
}

impl<T, D, Q> MarkovChain<T> for MetropolisChain<T, D, Q>
where
    T: Float,
    D: Target<T>,
    Q: Proposal<T>,
    Open01: Distribution<T>,
{
    fn step(&mut self) -> Result<T, MetropolisError> {
        let (next, density, accepted) = transition(
            &self.target,
            &self.proposal,
            self.current_state,
            self.current_density,
            &mut self.rng,
        )?;
        self.current_state = next;
        self.current_density = density;
        self.n_steps += 1;
        self.n_accepted += accepted as u64;
        Ok(next)
    }

    fn current_state(&self) -> T {
        self.current_state
    }

    fn acceptance_rate(&self) -> Option<f64> {
        (self.n_steps > 0).then(|| self.n_accepted as f64 / self.n_steps as f64)
    }
}
