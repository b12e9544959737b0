//! End-to-end checks of the sampler against a von Mises target (mu = 0, kappa = 10).
//!
//! The statistical assertions use fixed seeds, so they are deterministic; the
//! tolerances are several standard errors wide.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use walkabout::core::ChainRunner;
use walkabout::distributions::{GaussianWalk, Proposal, Stay, VonMises, VonMisesWalk};
use walkabout::ks_test::two_sample_ks_test;
use walkabout::metropolis::{metropolis_sample, Metropolis};
use walkabout::stats::{split_rhat, thin, wrap_angle, ChainTracker};

fn textbook_target(x: f64) -> f64 {
    (10.0 * x.cos()).exp()
}

#[test]
fn example_scenario() {
    let proposal = GaussianWalk::new(0.25).unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    let samples = metropolis_sample(&textbook_target, 0.5, &proposal, 2_000, &mut rng).unwrap();

    assert_eq!(samples.len(), 2_000);
    assert_eq!(samples[0], 0.5);

    let mut tracker = ChainTracker::new(samples[0]);
    for &x in &samples[1..] {
        tracker.step(wrap_angle(x));
    }
    let stats = tracker.stats();
    assert!(
        (0.3..0.95).contains(&stats.p_accept),
        "acceptance rate {} out of range",
        stats.p_accept
    );
    assert!(stats.mean.abs() < 0.15, "mean {} too far from 0", stats.mean);
    // Var of von Mises(kappa = 10) on the line is roughly 1 / kappa.
    assert!((0.05..0.2).contains(&stats.variance), "variance {}", stats.variance);
}

#[test]
fn sample_mean_converges_to_zero() {
    const SAMPLE_SIZE: usize = 5_000;
    const BURNIN: usize = 500;

    let target = VonMises::new(0.0, 10.0).unwrap();
    let proposal = GaussianWalk::new(0.5).unwrap();
    let mut rng = SmallRng::seed_from_u64(2024);
    let samples =
        metropolis_sample(&target, 0.5, &proposal, SAMPLE_SIZE + BURNIN, &mut rng).unwrap();

    let kept: Vec<f64> = samples[BURNIN..].iter().map(|&x| wrap_angle(x)).collect();
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    assert!(mean.abs() < 0.05, "sample mean {mean} not within 0.05 of 0");
}

#[test]
fn chain_matches_direct_draws() {
    const N_KEEP: usize = 100_000;
    const THIN: usize = 25;
    const SEED: u64 = 7;

    let target = VonMises::new(0.0, 10.0).unwrap();
    let proposal = GaussianWalk::new(0.5).unwrap();
    let mut rng = SmallRng::seed_from_u64(SEED);
    let samples = metropolis_sample(&target, 0.0, &proposal, N_KEEP + 1_000, &mut rng).unwrap();
    let chain: Vec<f64> = thin(&samples[1_000..], THIN)
        .unwrap()
        .into_iter()
        .map(wrap_angle)
        .collect();

    let direct = VonMisesWalk::new(10.0)
        .unwrap()
        .sample_n(chain.len(), 0.0, &mut SmallRng::seed_from_u64(SEED + 1));

    let result = two_sample_ks_test(&chain, &direct, 0.001).unwrap();
    assert!(!result.is_rejected, "chain differs from von Mises: {result:?}");
}

#[test]
fn wrong_target_is_detected() {
    // A chain targeting kappa = 2 must not look like kappa = 10.
    let target = VonMises::new(0.0, 2.0).unwrap();
    let proposal = VonMisesWalk::new(2.0).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);
    let samples = metropolis_sample(&target, 0.0, &proposal, 20_001, &mut rng).unwrap();
    let chain: Vec<f64> = thin(&samples[1..], 5)
        .unwrap()
        .into_iter()
        .map(wrap_angle)
        .collect();

    let direct = VonMisesWalk::new(10.0)
        .unwrap()
        .sample_n(chain.len(), 0.0, &mut SmallRng::seed_from_u64(12));

    let result = two_sample_ks_test(&chain, &direct, 0.001).unwrap();
    assert!(result.is_rejected, "{result:?}");
}

#[test]
fn parallel_chains_agree() {
    let target = VonMises::new(0.0, 10.0).unwrap();
    let proposal = GaussianWalk::new(0.5).unwrap();
    let mut mh = Metropolis::new(target, proposal, 0.5, 4).unwrap().set_seed(42);
    let samples = mh.run(5_000, 500).unwrap().mapv(wrap_angle);
    assert_eq!(samples.shape(), &[4, 5_000]);
    let rhat = split_rhat(&samples).unwrap();
    assert!(rhat < 1.05, "rhat = {rhat}");
}

#[test]
fn degenerate_proposal_gives_degenerate_chain() {
    let mut mh = Metropolis::new(VonMises::new(0.0, 10.0).unwrap(), Stay, 1.25, 2)
        .unwrap()
        .set_seed(3);
    let samples = mh.run(100, 10).unwrap();
    assert!(samples.iter().all(|&x| x == 1.25));
}

#[test]
fn f32_chains_work() {
    let target = VonMises::new(0.0f32, 10.0).unwrap();
    let proposal = GaussianWalk::new(0.25f32).unwrap();
    let mut rng = SmallRng::seed_from_u64(5);
    let samples = metropolis_sample(&target, 0.5f32, &proposal, 1_000, &mut rng).unwrap();
    assert_eq!(samples.len(), 1_000);
    assert!(samples.iter().all(|x| x.is_finite()));
}
