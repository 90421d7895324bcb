//! Chain abstractions, the random-source contract, and the drivers that turn
//! a chain into a dense matrix of samples.

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, ArrayView1};
use num_traits::Zero;
use rand::distributions::{Distribution, Standard};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;
use thiserror::Error;

/// Configuration problems reported by [`Sampler::sample`] before any random
/// draw or log-density evaluation takes place.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial state must have at least one dimension")]
    EmptyInitialState,

    #[error("expected {expected} interval widths, got {got}")]
    WidthDimensionMismatch { expected: usize, got: usize },

    #[error("interval width for dimension {index} must be positive, got {width}")]
    NonPositiveWidth { index: usize, width: f64 },
}

/// The random-source contract: i.i.d. Uniform[0,1) and Exponential(1) draws.
///
/// An identical seed must give an identical sequence of draws, which in turn
/// gives bit-identical sampler output for otherwise identical inputs. Any
/// `rand` generator satisfies the contract through [`RngSource`].
pub trait RandomSource<T> {
    /// A draw from Uniform[0, 1).
    fn uniform(&mut self) -> T;

    /// A draw from Exponential(rate = 1).
    fn exponential(&mut self) -> T;
}

/// Adapts any [`rand::Rng`] to the [`RandomSource`] contract, drawing
/// uniforms from `Standard` and exponentials from `Exp1`.
pub struct RngSource<R>(pub R);

impl<T, R> RandomSource<T> for RngSource<R>
where
    R: Rng,
    Standard: Distribution<T>,
    Exp1: Distribution<T>,
{
    fn uniform(&mut self) -> T {
        self.0.sample(Standard)
    }

    fn exponential(&mut self) -> T {
        self.0.sample(Exp1)
    }
}

pub trait MarkovChain<S> {
    /// Does one elementary update of the chain, returning the new current
    /// state.
    fn step(&mut self) -> &Vec<S>;

    /// The current state without stepping.
    fn current_state(&self) -> &Vec<S>;
}

/// The sampler capability: one operation that binds a target log-density, an
/// initial state, and a random source into an unbounded chain of states.
///
/// The returned chain never terminates on its own; the consumer decides how
/// many states to pull. Any side effect of `sample` is confined to the
/// sampler instance itself (e.g. width tuning in
/// [`crate::slice::ComponentWiseSlice`]).
pub trait Sampler<T, D, R> {
    type Chain: MarkovChain<T>;

    /// Validates the configuration against `init` and returns the chain.
    ///
    /// Fails fast with a [`ConfigError`] before any random draw or
    /// log-density evaluation.
    fn sample(&mut self, target: D, init: &[T], source: R) -> Result<Self::Chain, ConfigError>;
}

/// Pulls exactly `n_steps` states from `chain` into an `(n_steps, dim)`
/// matrix, one state per row.
pub fn run_chain<S, M>(chain: &mut M, n_steps: usize) -> Array2<S>
where
    M: MarkovChain<S>,
    S: Clone + Zero,
{
    let dim = chain.current_state().len();
    let mut out = Array2::<S>::zeros((n_steps, dim));

    for i in 0..n_steps {
        let state = chain.step();
        out.row_mut(i).assign(&ArrayView1::from(&state[..]));
    }

    out
}

/// Same as [`run_chain`], updating `pb` once per pulled state.
pub fn run_chain_with_progress<S, M>(chain: &mut M, n_steps: usize, pb: &ProgressBar) -> Array2<S>
where
    M: MarkovChain<S>,
    S: Clone + Zero,
{
    let dim = chain.current_state().len();
    let mut out = Array2::<S>::zeros((n_steps, dim));

    pb.set_length(n_steps as u64);

    for i in 0..n_steps {
        let state = chain.step();
        out.row_mut(i).assign(&ArrayView1::from(&state[..]));
        pb.inc(1);
    }

    out
}

/// Runs `sampler` against `target` for exactly `n_steps` elementary states,
/// starting from `init`, with a random source seeded from process entropy.
///
/// `n_steps` counts coordinate updates, not full sweeps: each returned row
/// differs from the previous one in a single coordinate. The sampler instance
/// stays usable afterwards, including any widths it tuned during this run.
/// For reproducible output, seed the source yourself and call
/// [`run_with_rng`].
///
/// # Examples
///
/// ```rust
/// use slice_mcmc::core::run;
/// use slice_mcmc::slice::ComponentWiseSlice;
///
/// let mut sampler = ComponentWiseSlice::new();
/// let logp = |x: &[f64]| -0.5 * (x[0] * x[0] + x[1] * x[1]);
/// let samples = run(&mut sampler, logp, &[0.0f64, 0.0], 100).unwrap();
/// assert_eq!(samples.shape(), &[100, 2]);
/// ```
pub fn run<T, D, S>(
    sampler: &mut S,
    target: D,
    init: &[T],
    n_steps: usize,
) -> Result<Array2<T>, ConfigError>
where
    S: Sampler<T, D, RngSource<SmallRng>>,
    T: Clone + Zero,
{
    run_with_rng(sampler, target, init, n_steps, SmallRng::from_entropy())
}

/// Runs `sampler` with a caller-supplied random generator.
///
/// Identical configuration, initial state, and seed give bit-identical
/// output.
pub fn run_with_rng<T, D, S, R>(
    sampler: &mut S,
    target: D,
    init: &[T],
    n_steps: usize,
    rng: R,
) -> Result<Array2<T>, ConfigError>
where
    R: Rng,
    S: Sampler<T, D, RngSource<R>>,
    T: Clone + Zero,
{
    let mut chain = sampler.sample(target, init, RngSource(rng))?;
    Ok(run_chain(&mut chain, n_steps))
}

/// Entropy-seeded [`run`] with an indicatif progress bar.
pub fn run_progress<T, D, S>(
    sampler: &mut S,
    target: D,
    init: &[T],
    n_steps: usize,
) -> Result<Array2<T>, ConfigError>
where
    S: Sampler<T, D, RngSource<SmallRng>>,
    T: Clone + Zero,
{
    let pb = ProgressBar::new(n_steps as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut chain = sampler.sample(target, init, RngSource(SmallRng::from_entropy()))?;
    let out = run_chain_with_progress(&mut chain, n_steps, &pb);
    pb.finish_with_message("Done!");
    Ok(out)
}
