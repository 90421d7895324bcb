//! A component-wise slice sampler.
//!
//! The sampler considers each dimension in turn and runs a univariate slice
//! sampling update on it (Neal 2003): draw an auxiliary height under the
//! log-density at the current point, grow a trial interval by whole widths
//! until it covers the slice ("step out"), then shrink it around rejected
//! candidates until one lands inside the slice. Every accepted coordinate
//! update emits one state, so a chain of `n` states covers `n / D` full
//! sweeps over a `D`-dimensional target.
//!
//! An optional adaptive stage calibrates the per-dimension interval widths
//! from the average absolute move of the chain before any state is exposed
//! to the caller; see [`ComponentWiseSlice::set_ntune`].
//!
//! # Examples
//!
//! ```rust
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//! use slice_mcmc::core::run_with_rng;
//! use slice_mcmc::slice::ComponentWiseSlice;
//!
//! let logp = |x: &[f64]| -0.5 * (x[0] * x[0] + x[1] * x[1]);
//! let mut sampler = ComponentWiseSlice::new().set_ntune(100);
//! let rng = SmallRng::seed_from_u64(42);
//! let samples = run_with_rng(&mut sampler, logp, &[0.0f64, 0.0], 1000, rng).unwrap();
//! assert_eq!(samples.shape(), &[1000, 2]);
//! ```
//!
//! References: Neal R (2003). "Slice Sampling (with Discussion)." Annals of
//! Statistics, 31(3), 705-767.

use num_traits::Float;

use crate::core::{ConfigError, MarkovChain, RandomSource, Sampler};
use crate::distributions::Target;

/// Configuration of a component-wise slice sampler.
///
/// The widths should be roughly the size of a slice through the target;
/// overestimating is generally better than underestimating, and either way
/// the sampler expands and shrinks intervals at runtime. With `ntune > 0`
/// the first call to [`Sampler::sample`] runs that many adaptive sweeps and
/// stores the tuned widths back on this struct, so they carry over to later
/// runs of the same instance.
#[derive(Clone, Debug)]
pub struct ComponentWiseSlice<T> {
    /// Interval widths per dimension. `None` until first use, where it
    /// defaults to all ones with the dimension taken from the initial state.
    /// Holds the adapted widths after a tuned run.
    pub widths: Option<Vec<T>>,

    /// Number of adaptive sweeps (one elementary update per dimension each)
    /// to run before real sampling begins. Tuning states are discarded.
    pub ntune: usize,
}

impl<T: Float> ComponentWiseSlice<T> {
    /// Creates a sampler with default widths (all 1.0, resolved at first
    /// use) and no adaptive stage.
    pub fn new() -> Self {
        Self {
            widths: None,
            ntune: 0,
        }
    }

    /// Sets explicit interval widths, one per dimension of the target.
    pub fn set_widths(mut self, widths: Vec<T>) -> Self {
        self.widths = Some(widths);
        self
    }

    /// Sets the number of adaptive sweeps run before sampling.
    pub fn set_ntune(mut self, ntune: usize) -> Self {
        self.ntune = ntune;
        self
    }
}

impl<T: Float> Default for ComponentWiseSlice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D, R> Sampler<T, D, R> for ComponentWiseSlice<T>
where
    T: Float,
    D: Target<T>,
    R: RandomSource<T>,
{
    type Chain = SliceChain<T, D, R>;

    fn sample(&mut self, target: D, init: &[T], source: R) -> Result<Self::Chain, ConfigError> {
        if init.is_empty() {
            return Err(ConfigError::EmptyInitialState);
        }
        let widths = match &self.widths {
            Some(configured) => {
                if configured.len() != init.len() {
                    return Err(ConfigError::WidthDimensionMismatch {
                        expected: init.len(),
                        got: configured.len(),
                    });
                }
                for (index, &w) in configured.iter().enumerate() {
                    // Also rejects NaN widths.
                    if !(w > T::zero()) {
                        return Err(ConfigError::NonPositiveWidth {
                            index,
                            width: w.to_f64().unwrap_or(f64::NAN),
                        });
                    }
                }
                configured.clone()
            }
            None => vec![T::one(); init.len()],
        };

        let mut chain = SliceChain::new(target, init, widths, source);

        // Adaptive pre-run: the absolute move of each coordinate update feeds
        // an exponential moving average of that dimension's width. The states
        // visited here are never exposed to the caller.
        let (gain, decay) = (T::from(0.1).unwrap(), T::from(0.9).unwrap());
        for _ in 0..self.ntune {
            for d in 0..init.len() {
                let before = chain.x[d];
                chain.step();
                let delta = (chain.x[d] - before).abs();
                chain.widths[d] = gain * delta + decay * chain.widths[d];
            }
        }

        // Widths persist on the sampler instance: tuned once, reused by
        // later runs. Frozen from here on.
        self.widths = Some(chain.widths.clone());

        Ok(chain)
    }
}

/// The resumable state of one slice-sampling chain.
///
/// Produced by [`ComponentWiseSlice`] via [`Sampler::sample`]; each
/// [`MarkovChain::step`] performs one elementary update (a single coordinate)
/// and the cursor cycles through the dimensions. Also usable as an unbounded
/// [`Iterator`] over state snapshots.
pub struct SliceChain<T, D, R> {
    target: D,

    /// Current state of the chain, mutated in place.
    x: Vec<T>,

    /// Interval widths, frozen for the lifetime of the chain.
    widths: Vec<T>,

    /// Log-density at `x`, cached between steps. `None` until the first
    /// step, so constructing a chain evaluates nothing.
    logp: Option<T>,

    /// Dimension updated by the next step.
    cursor: usize,

    /// Slice height of the most recent elementary step.
    logy: T,

    source: R,
}

impl<T: Float, D, R> SliceChain<T, D, R> {
    fn new(target: D, init: &[T], widths: Vec<T>, source: R) -> Self {
        Self {
            target,
            x: init.to_vec(),
            widths,
            logp: None,
            cursor: 0,
            logy: T::nan(),
            source,
        }
    }

    /// The interval widths this chain samples with.
    pub fn widths(&self) -> &[T] {
        &self.widths
    }

    /// The slice height (`logy`) of the most recent elementary step, or NaN
    /// before the first step. The log-density at the current state always
    /// strictly exceeds this value.
    pub fn slice_height(&self) -> T {
        self.logy
    }
}

impl<T, D, R> MarkovChain<T> for SliceChain<T, D, R>
where
    T: Float,
    D: Target<T>,
    R: RandomSource<T>,
{
    /// Performs one univariate slice-sampling update on the cursor
    /// coordinate: draw the slice height, position and step out the trial
    /// interval, then shrink it until a candidate is accepted.
    fn step(&mut self) -> &Vec<T> {
        let d = self.cursor;
        let width = self.widths[d];

        let x_logp = match self.logp {
            Some(lp) => lp,
            None => self.target.unnorm_logp(&self.x),
        };

        // 'Height' of the slice. The epsilon guards against ties with the
        // log-density at the current point.
        let e = self.source.exponential();
        let logy = x_logp - e - T::from(1e-9).unwrap();
        self.logy = logy;

        // Trial interval [a, b) of length `width`, randomly positioned over
        // the current coordinate.
        let u = self.source.uniform();
        let x_prev = self.x[d];
        let mut a = x_prev - u * width;
        let mut b = a + width;

        // Step out until both endpoints leave the slice. Deliberately
        // unbounded: capping the expansion would change the stationary
        // distribution. NaN or -inf evaluations compare as "outside".
        self.x[d] = a;
        while self.target.unnorm_logp(&self.x) > logy {
            self.x[d] = self.x[d] - width;
        }
        a = self.x[d];

        self.x[d] = b;
        while self.target.unnorm_logp(&self.x) > logy {
            self.x[d] = self.x[d] + width;
        }
        b = self.x[d];

        // Shrink by rejection sampling: every rejected candidate becomes the
        // new interval endpoint on its side of the pre-step coordinate, so
        // the interval measure strictly decreases.
        loop {
            let v = self.source.uniform();
            self.x[d] = a + v * (b - a);
            let candidate_logp = self.target.unnorm_logp(&self.x);

            if candidate_logp > logy {
                self.logp = Some(candidate_logp);
                break;
            } else if self.x[d] < x_prev {
                a = self.x[d];
            } else {
                b = self.x[d];
            }
        }

        self.cursor = (self.cursor + 1) % self.x.len();
        &self.x
    }

    fn current_state(&self) -> &Vec<T> {
        &self.x
    }
}

impl<T, D, R> Iterator for SliceChain<T, D, R>
where
    T: Float,
    D: Target<T>,
    R: RandomSource<T>,
{
    type Item = Vec<T>;

    /// Never returns `None`; the consumer decides how many states to pull.
    fn next(&mut self) -> Option<Vec<T>> {
        Some(self.step().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{run_with_rng, RngSource};
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// A standard Cauchy product target; heavy tails exercise step-out.
    fn cauchy(position: &[f64]) -> f64 {
        -position.iter().map(|&x| (1.0 + x * x).ln()).sum::<f64>()
    }

    fn std_normal(position: &[f64]) -> f64 {
        -0.5 * position.iter().map(|&x| x * x).sum::<f64>()
    }

    fn seeded(seed: u64) -> RngSource<SmallRng> {
        RngSource(SmallRng::seed_from_u64(seed))
    }

    /// Replays a fixed script of uniform and exponential draws, panicking if
    /// the sampler asks for more than the script contains.
    #[derive(Clone)]
    struct ScriptedSource {
        uniforms: Rc<RefCell<VecDeque<f64>>>,
        exps: Rc<RefCell<VecDeque<f64>>>,
    }

    impl ScriptedSource {
        fn new(uniforms: &[f64], exps: &[f64]) -> Self {
            Self {
                uniforms: Rc::new(RefCell::new(uniforms.iter().copied().collect())),
                exps: Rc::new(RefCell::new(exps.iter().copied().collect())),
            }
        }

        fn exhausted(&self) -> bool {
            self.uniforms.borrow().is_empty() && self.exps.borrow().is_empty()
        }
    }

    impl RandomSource<f64> for ScriptedSource {
        fn uniform(&mut self) -> f64 {
            self.uniforms
                .borrow_mut()
                .pop_front()
                .expect("uniform script exhausted")
        }

        fn exponential(&mut self) -> f64 {
            self.exps
                .borrow_mut()
                .pop_front()
                .expect("exponential script exhausted")
        }
    }

    #[test]
    fn recorded_reference_sequence_is_reproduced() {
        // Laplace target logp(x) = -|x|, width 1, started at 0, with every
        // draw scripted. The expected states follow from the update rule by
        // hand:
        //
        // step 1: e=0.5, logy=-0.500000001; u=0.5 places [-0.5, 0.5), both
        //   sides step out once to [-1.5, 1.5); candidates 1.2 (rejected,
        //   b=1.2), -1.23 (rejected, a=-1.23), -0.015 (accepted).
        // step 2: e=0.2, logy=-0.215000001; u=0.0 places [-0.015, 0.985),
        //   left steps out to -1.015, right stays; candidate 0.185 accepted.
        // step 3: e=1.0, logy=-1.185000001; u=0.25 places [-0.065, 0.935),
        //   left steps out twice to -2.065, right once to 1.935; candidate
        //   0.935 accepted.
        let source = ScriptedSource::new(
            &[0.5, 0.9, 0.1, 0.5, 0.0, 0.6, 0.25, 0.75],
            &[0.5, 0.2, 1.0],
        );
        let mut sampler = ComponentWiseSlice::new().set_widths(vec![1.0]);
        let mut chain = sampler
            .sample(|x: &[f64]| -x[0].abs(), &[0.0], source.clone())
            .unwrap();

        for expected in [-0.015, 0.185, 0.935] {
            let state = chain.step()[0];
            assert_abs_diff_eq!(state, expected, epsilon = 1e-9);
        }

        // Every scripted draw was consumed: the draw order and count are
        // part of the reference.
        assert!(source.exhausted());
    }

    #[test]
    fn accepted_states_lie_strictly_inside_the_slice() {
        let mut sampler = ComponentWiseSlice::new();
        let mut chain = sampler.sample(std_normal, &[0.5, -0.5], seeded(1)).unwrap();

        for _ in 0..200 {
            chain.step();
            assert!(
                std_normal(chain.current_state()) > chain.slice_height(),
                "accepted state fell outside the slice"
            );
        }
    }

    #[test]
    fn consecutive_states_differ_in_one_cycling_coordinate() {
        let mut sampler = ComponentWiseSlice::new();
        let samples = run_with_rng(
            &mut sampler,
            std_normal,
            &[0.0, 0.0],
            5,
            SmallRng::seed_from_u64(42),
        )
        .unwrap();
        assert_eq!(samples.shape(), &[5, 2]);

        let mut prev = vec![0.0, 0.0];
        for (i, row) in samples.rows().into_iter().enumerate() {
            let n_changed = row.iter().zip(&prev).filter(|&(a, b)| a != b).count();
            assert_eq!(n_changed, 1, "row {i} changed {n_changed} coordinates");
            // The untouched coordinate is the one the cursor was not on.
            let untouched = 1 - (i % 2);
            assert_eq!(row[untouched], prev[untouched]);
            prev = row.to_vec();
        }
    }

    #[test]
    fn seeded_chains_are_deterministic() {
        let chain_of = |seed: u64| {
            let mut sampler = ComponentWiseSlice::new().set_ntune(3);
            let mut chain = sampler
                .sample(cauchy, &[1.0, 2.0, 3.0], seeded(seed))
                .unwrap();
            (0..50).map(|_| chain.step().clone()).collect::<Vec<_>>()
        };
        assert_eq!(chain_of(7), chain_of(7));
        assert_ne!(chain_of(7), chain_of(8));
    }

    #[test]
    fn iterator_interface_matches_step() {
        let make = |seed| {
            ComponentWiseSlice::new()
                .sample(cauchy, &[0.0], seeded(seed))
                .unwrap()
        };
        let via_iter: Vec<Vec<f64>> = make(3).take(10).collect();

        let mut chain = make(3);
        let via_step: Vec<Vec<f64>> = (0..10).map(|_| chain.step().clone()).collect();

        assert_eq!(via_iter, via_step);
    }

    #[test]
    fn default_widths_are_ones_resolved_at_first_use() {
        let mut sampler = ComponentWiseSlice::<f64>::new();
        assert!(sampler.widths.is_none());
        sampler
            .sample(std_normal, &[0.0, 0.0, 0.0], seeded(0))
            .unwrap();
        assert_eq!(sampler.widths, Some(vec![1.0, 1.0, 1.0]));
    }

    #[test]
    fn untuned_widths_stay_as_configured() {
        let mut sampler = ComponentWiseSlice::new().set_widths(vec![2.5, 0.5]);
        run_with_rng(
            &mut sampler,
            std_normal,
            &[0.0, 0.0],
            50,
            SmallRng::seed_from_u64(7),
        )
        .unwrap();
        assert_eq!(sampler.widths, Some(vec![2.5, 0.5]));
    }

    #[test]
    fn tuning_grows_widths_toward_the_target_scale() {
        // Interval width 1 is far too small for a std-5 Gaussian; the
        // adaptive stage should widen it.
        let wide = |x: &[f64]| -0.5 * (x[0] * x[0] + x[1] * x[1]) / 25.0;
        let mut sampler = ComponentWiseSlice::new().set_ntune(50);
        sampler.sample(wide, &[0.0, 0.0], seeded(11)).unwrap();
        let widths = sampler.widths.clone().unwrap();
        assert!(widths.iter().all(|&w| w > 1.0), "widths: {widths:?}");
    }

    #[test]
    fn tuned_widths_stay_positive() {
        for seed in 0..5 {
            let mut sampler = ComponentWiseSlice::new()
                .set_widths(vec![0.05, 10.0])
                .set_ntune(50);
            let chain = sampler.sample(cauchy, &[0.0, 0.0], seeded(seed)).unwrap();
            assert!(chain.widths().iter().all(|&w| w > 0.0));
            assert!(sampler.widths.unwrap().iter().all(|&w| w > 0.0));
        }
    }

    #[test]
    fn zero_steps_zero_tuning_evaluates_nothing() {
        let count = Cell::new(0);
        let counting = |x: &[f64]| {
            count.set(count.get() + 1);
            std_normal(x)
        };
        let mut sampler = ComponentWiseSlice::new();
        let samples = run_with_rng(
            &mut sampler,
            counting,
            &[0.0, 0.0],
            0,
            SmallRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(samples.shape(), &[0, 2]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn empty_initial_state_fails_before_any_evaluation() {
        let count = Cell::new(0);
        let counting = |x: &[f64]| {
            count.set(count.get() + 1);
            std_normal(x)
        };
        let mut sampler = ComponentWiseSlice::new();
        let err = sampler.sample(counting, &[], seeded(0)).err().unwrap();
        assert_eq!(err, ConfigError::EmptyInitialState);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn mismatched_widths_fail_before_any_evaluation() {
        let count = Cell::new(0);
        let counting = |x: &[f64]| {
            count.set(count.get() + 1);
            std_normal(x)
        };
        let mut sampler = ComponentWiseSlice::new().set_widths(vec![1.0]);
        let err = sampler
            .sample(counting, &[0.0, 0.0], seeded(0))
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigError::WidthDimensionMismatch {
                expected: 2,
                got: 1
            }
        );
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn non_positive_and_nan_widths_are_rejected() {
        for bad in [0.0, -1.0, f64::NAN] {
            let count = Cell::new(0);
            let counting = |x: &[f64]| {
                count.set(count.get() + 1);
                std_normal(x)
            };
            let mut sampler = ComponentWiseSlice::new().set_widths(vec![1.0, bad]);
            let err = sampler
                .sample(counting, &[0.0, 0.0], seeded(0))
                .err()
                .unwrap();
            match err {
                ConfigError::NonPositiveWidth { index, .. } => assert_eq!(index, 1),
                other => panic!("expected NonPositiveWidth, got {other:?}"),
            }
            assert_eq!(count.get(), 0);
        }
    }

    #[test]
    fn bounded_support_targets_terminate() {
        // Uniform on (-1, 1): -inf outside drives shrinkage like any
        // ordinary rejection.
        let unit_interval = |x: &[f64]| {
            if x[0].abs() < 1.0 {
                0.0
            } else {
                f64::NEG_INFINITY
            }
        };

        let mut sampler = ComponentWiseSlice::new().set_widths(vec![10.0]);
        let mut chain = sampler.sample(unit_interval, &[0.0], seeded(5)).unwrap();
        for _ in 0..100 {
            let state = chain.step();
            assert!(state[0].abs() < 1.0);
        }
    }
}
