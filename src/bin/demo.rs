//! A small demo: slice-sample a correlated 2D Gaussian and print summary
//! statistics of the draws.

use ndarray::{arr1, arr2, Axis};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slice_mcmc::core::run_with_rng;
use slice_mcmc::distributions::Gaussian2D;
use slice_mcmc::slice::ComponentWiseSlice;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_STEPS: usize = 100_000;
    const SEED: u64 = 42;

    let target = Gaussian2D {
        mean: arr1(&[0.0, 0.0]),
        cov: arr2(&[[2.0, 1.0], [1.0, 2.0]]),
    };
    let initial_state = [10.0, 12.0];

    let mut sampler = ComponentWiseSlice::new().set_ntune(100);
    let samples = run_with_rng(
        &mut sampler,
        |x: &[f64]| target.unnorm_logp(x),
        &initial_state,
        N_STEPS,
        SmallRng::seed_from_u64(SEED),
    )?;
    println!("Generated {} samples", samples.nrows());
    println!("Tuned widths: {:?}", sampler.widths.unwrap());

    let mean = samples.mean_axis(Axis(0)).unwrap();
    let var = samples.var_axis(Axis(0), 1.0);
    println!("Mean: ({:.2}, {:.2})", mean[0], mean[1]);
    println!("Variance: ({:.2}, {:.2})", var[0], var[1]);

    Ok(())
}
