/*!
# CSV export of traces and histograms

Writes sampler output in a shape a plotting layer can consume directly: a long-format
trace (one row per chain and sample) and a histogram table with the theoretical
density evaluated at each bin midpoint. Enable via the `csv` feature.
*/

use ndarray::{Array2, Axis};
use num_traits::Float;
use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::distributions::{lit, Normalized};
use crate::error::{as_f64, MetropolisError};
use crate::stats::Bin;

/**
Saves a trace of shape `[n_chains, n_samples]` as CSV with header `chain,sample,value`.

# Examples

```rust
use walkabout::io::csv::save_trace;
use ndarray::arr2;

let trace = arr2(&[[0.1, 0.2], [0.3, 0.4]]);
let path = std::env::temp_dir().join("walkabout_trace_doc.csv");
save_trace(&trace, &path).expect("Expecting saving the trace to succeed");
```
*/
pub fn save_trace<T: Float>(
    samples: &Array2<T>,
    path: impl AsRef<Path>,
) -> Result<(), MetropolisError> {
    let mut wtr = Writer::from_writer(File::create(path)?);
    wtr.write_record(["chain", "sample", "value"])?;

    for (chain_idx, chain) in samples.axis_iter(Axis(0)).enumerate() {
        for (sample_idx, value) in chain.iter().enumerate() {
            wtr.write_record(&[
                chain_idx.to_string(),
                sample_idx.to_string(),
                as_f64(*value).to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Saves histogram bins next to the theoretical density of `reference` at each bin
/// midpoint, with header `lo,hi,count,density,theoretical`.
pub fn save_histogram<T, P>(
    bins: &[Bin],
    reference: &P,
    path: impl AsRef<Path>,
) -> Result<(), MetropolisError>
where
    T: Float,
    P: Normalized<T>,
{
    let mut wtr = Writer::from_writer(File::create(path)?);
    wtr.write_record(["lo", "hi", "count", "density", "theoretical"])?;

    for bin in bins {
        let theoretical = as_f64(reference.pdf(lit::<T>(bin.midpoint())));
        wtr.write_record(&[
            bin.lo.to_string(),
            bin.hi.to_string(),
            bin.count.to_string(),
            bin.density.to_string(),
            theoretical.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
