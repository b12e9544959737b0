//! The [`MarkovChain`] abstraction and helpers for driving one or many chains.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use ndarray::Array2;
use num_traits::Float;
use rayon::prelude::*;

use crate::error::MetropolisError;

pub trait MarkovChain<T> {
    /// Does one transition of the chain, returning the new current state.
    fn step(&mut self) -> Result<T, MetropolisError>;

    fn current_state(&self) -> T;

    /// Fraction of transitions that accepted their candidate, if the chain tracks it.
    fn acceptance_rate(&self) -> Option<f64> {
        None
    }
}

/// Runs `n_steps` transitions and records the state after each one.
///
/// The current state before the first transition is not recorded.
pub fn run_chain<T, M>(chain: &mut M, n_steps: usize) -> Result<Vec<T>, MetropolisError>
where
    M: MarkovChain<T>,
{
    let mut out = Vec::with_capacity(n_steps);
    for _ in 0..n_steps {
        out.push(chain.step()?);
    }
    Ok(out)
}

pub fn run_chain_progress<T, M>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<Vec<T>, MetropolisError>
where
    M: MarkovChain<T>,
{
    let mut out = Vec::with_capacity(n_steps);
    pb.set_length(n_steps as u64);

    for _ in 0..n_steps {
        out.push(chain.step()?);
        pb.inc(1);
    }

    Ok(out)
}

/// Anything that owns several independent Markov chains.
pub trait HasChains<T> {
    type Chain: MarkovChain<T> + Send;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

fn report_acceptance<T, M: MarkovChain<T>>(i: usize, chain: &M) {
    if let Some(rate) = chain.acceptance_rate() {
        log::debug!("chain {i}: acceptance rate {rate:.3}");
        if !(0.05..=0.95).contains(&rate) {
            log::warn!(
                "chain {i}: acceptance rate {rate:.3} is extreme; consider rescaling the proposal"
            );
        }
    }
}

fn stack_after_burnin<T: Float>(
    runs: Vec<Vec<T>>,
    n_collect: usize,
    discard: usize,
) -> Result<Array2<T>, MetropolisError> {
    let n_chains = runs.len();
    let flat: Vec<T> = runs
        .into_iter()
        .flat_map(|run| run.into_iter().skip(discard))
        .collect();
    Array2::from_shape_vec((n_chains, n_collect), flat)
        .map_err(|e| MetropolisError::stats(format!("stacking chain outputs failed: {e}")))
}

pub trait ChainRunner<T>: HasChains<T>
where
    T: Float + Send,
{
    /// Runs all chains in parallel for `discard + n_collect` steps each, dropping the
    /// first `discard` states as burn-in.
    ///
    /// Returns an array of shape `[n_chains, n_collect]`.
    fn run(&mut self, n_collect: usize, discard: usize) -> Result<Array2<T>, MetropolisError> {
        let n_steps = n_collect + discard;
        let runs = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| -> Result<Vec<T>, MetropolisError> {
                let samples = run_chain::<T, _>(chain, n_steps)?;
                report_acceptance::<T, _>(i, &*chain);
                Ok(samples)
            })
            .collect::<Result<Vec<_>, MetropolisError>>()?;

        stack_after_burnin(runs, n_collect, discard)
    }

    /// Like [`ChainRunner::run`], drawing one progress bar per chain.
    fn run_progress(
        &mut self,
        n_collect: usize,
        discard: usize,
    ) -> Result<Array2<T>, MetropolisError> {
        let n_steps = n_collect + discard;
        let multi = MultiProgress::new();
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map_err(|e| MetropolisError::invalid(format!("bad progress template: {e}")))?
            .progress_chars("##-");

        let runs = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| -> Result<Vec<T>, MetropolisError> {
                let pb = multi.add(ProgressBar::new(n_steps as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(pb_style.clone());

                let samples = run_chain_progress::<T, _>(chain, n_steps, &pb)?;

                match MarkovChain::<T>::acceptance_rate(&*chain) {
                    Some(rate) => pb.finish_with_message(format!("accept {rate:.2}")),
                    None => pb.finish_with_message("Done!"),
                }
                report_acceptance::<T, _>(i, &*chain);
                Ok(samples)
            })
            .collect::<Result<Vec<_>, MetropolisError>>()?;

        stack_after_burnin(runs, n_collect, discard)
    }
}

impl<T: Float + Send, H: HasChains<T>> ChainRunner<T> for H {}
