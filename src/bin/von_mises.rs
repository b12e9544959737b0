//! Samples a von Mises distribution (mu = 0, kappa = 10) with a Gaussian random walk and
//! prints the numbers a trace plot and a density histogram would be drawn from.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;

use walkabout::core::ChainRunner;
use walkabout::distributions::{GaussianWalk, Normalized, VonMises};
use walkabout::metropolis::{metropolis_sample, Metropolis};
use walkabout::stats::{effective_sample_size, histogram, split_rhat, summarize, wrap_angle};

#[cfg(feature = "csv")]
use walkabout::io::csv::{save_histogram, save_trace};

fn main() -> Result<(), Box<dyn Error>> {
    const SAMPLE_SIZE: usize = 2_000;
    const SEED: u64 = 42;
    const N_CHAINS: usize = 4;
    const BURNIN: usize = 500;

    let target = VonMises::new(0.0, 10.0)?;
    let proposal = GaussianWalk::new(0.25)?;

    // Single chain, exactly as the textbook loop would do it.
    let mut rng = SmallRng::seed_from_u64(SEED);
    let samples = metropolis_sample(&target, 0.5, &proposal, SAMPLE_SIZE, &mut rng)?;
    let wrapped: Vec<f64> = samples.iter().map(|&x| wrap_angle(x)).collect();

    let summary = summarize(&wrapped)?;
    println!("Generated {} samples", summary.n);
    println!(
        "mean {:.4}  std {:.4}  range [{:.3}, {:.3}]",
        summary.mean, summary.std, summary.min, summary.max
    );
    println!("effective sample size {:.1}", effective_sample_size(&samples)?);

    let bins = histogram(&wrapped, 24, -std::f64::consts::PI, std::f64::consts::PI)?;
    println!("{:>8} {:>10} {:>12}", "bin", "empirical", "theoretical");
    for bin in &bins {
        println!(
            "{:>8.3} {:>10.4} {:>12.4}",
            bin.midpoint(),
            bin.density,
            target.pdf(bin.midpoint())
        );
    }

    // Several chains for a convergence check.
    let mut mh = Metropolis::new(target, proposal, 0.5, N_CHAINS)?.set_seed(SEED);
    let chains = mh.run_progress(SAMPLE_SIZE, BURNIN)?;
    println!("split R-hat over {N_CHAINS} chains: {:.4}", split_rhat(&chains)?);

    #[cfg(feature = "csv")]
    {
        save_trace(&chains, "von_mises_trace.csv")?;
        save_histogram(&bins, &target, "von_mises_histogram.csv")?;
        println!("Saved von_mises_trace.csv and von_mises_histogram.csv");
    }

    Ok(())
}
