//! # walkabout
//!
//! A compact random-walk Metropolis sampler for one-dimensional densities known up to
//! a normalizing constant, together with the proposals, chain drivers and diagnostics
//! needed to use it.
//!
//! ```rust
//! use walkabout::distributions::GaussianWalk;
//! use walkabout::metropolis_sample;
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let target = |x: f64| (10.0 * x.cos()).exp();
//! let proposal = GaussianWalk::new(0.25).unwrap();
//! let mut rng = SmallRng::seed_from_u64(42);
//! let samples = metropolis_sample(&target, 0.5, &proposal, 2_000, &mut rng).unwrap();
//! assert_eq!(samples.len(), 2_000);
//! ```

pub mod core;
pub mod distributions;
pub mod error;
pub mod io;
pub mod ks_test;
pub mod metropolis;
pub mod stats;

pub use error::MetropolisError;
pub use metropolis::metropolis_sample;
