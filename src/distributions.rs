/*!
Target distributions for slice sampling.

The sampler only ever sees a target through the [`Target`] trait: an ordered
sequence of coordinates in, the log of a value proportional to the density
out. The log-density may be unnormalized and is allowed to return `-inf` or
`NaN` for points outside the support; the sampler treats both as "not in the
slice".

Any plain function or closure `Fn(&[T]) -> T` is already a target, so the
usual way to supply a density is to pass one directly. The concrete
distributions in this module expose their log-density as an inherent
`unnorm_logp` method; wrap it in a closure to sample from it.

This module is generic over the floating-point precision (`f32` or `f64`)
via [`num_traits::Float`].

# Examples

```rust
use ndarray::{arr1, arr2};
use slice_mcmc::distributions::{Gaussian2D, IsotropicGaussian, Target};

// A closure is a target as-is.
let logp = |x: &[f64]| -0.5 * x[0] * x[0];
assert_eq!(logp.unnorm_logp(&[1.0]), -0.5);

let iso: IsotropicGaussian<f64> = IsotropicGaussian::new(1.0);
println!("logp at origin: {}", iso.unnorm_logp(&[0.0, 0.0]));

let gauss = Gaussian2D {
    mean: arr1(&[0.0, 0.0]),
    cov: arr2(&[[1.0, 0.0], [0.0, 1.0]]),
};
println!("logp: {}", gauss.unnorm_logp(&[0.5, -0.5]));
```
*/

use ndarray::{Array1, Array2};
use num_traits::Float;

/// A continuous target distribution from which we want to sample.
///
/// Implementations must be pure: the same `position` always gives the same
/// value. The sampler may evaluate a target an unbounded number of times per
/// returned sample, at arbitrary points reached by step-out and shrinkage.
pub trait Target<T: Float> {
    /// Returns the log of the unnormalized density at `position`.
    fn unnorm_logp(&self, position: &[T]) -> T;
}

/// Every pure function of the position is a target, so log-densities can be
/// passed as plain closures or `fn` items.
impl<T: Float, F: Fn(&[T]) -> T> Target<T> for F {
    fn unnorm_logp(&self, position: &[T]) -> T {
        self(position)
    }
}

/**
A 2D Gaussian distribution parameterized by a mean vector and a 2×2
covariance matrix.

# Examples

```rust
use ndarray::{arr1, arr2};
use slice_mcmc::distributions::Gaussian2D;

let gauss = Gaussian2D {
    mean: arr1(&[0.0, 0.0]),
    cov: arr2(&[[4.0, 2.0], [2.0, 3.0]]),
};
let lp = gauss.unnorm_logp(&[0.5, -0.5]);
assert!(lp < 0.0);
```
*/
#[derive(Clone, Debug)]
pub struct Gaussian2D<T: Float> {
    pub mean: Array1<T>,
    pub cov: Array2<T>,
}

impl<T: Float> Gaussian2D<T> {
    /// The log of the unnormalized density at `position`. Pass
    /// `|x| gauss.unnorm_logp(x)` to the sampler to use it as a target.
    pub fn unnorm_logp(&self, position: &[T]) -> T {
        let (a, b, c, d) = (
            self.cov[[0, 0]],
            self.cov[[0, 1]],
            self.cov[[1, 0]],
            self.cov[[1, 1]],
        );
        let det = a * d - b * c;
        let dx = position[0] - self.mean[0];
        let dy = position[1] - self.mean[1];
        // diff' * cov^-1 * diff with the closed-form 2x2 inverse.
        let quad = (d * dx * dx - (b + c) * dx * dy + a * dy * dy) / det;
        -T::from(0.5).unwrap() * quad
    }
}

/// An isotropic Gaussian centered at the origin with standard deviation
/// `std` in every dimension, in any number of dimensions.
#[derive(Clone, Copy, Debug)]
pub struct IsotropicGaussian<T: Float> {
    pub std: T,
}

impl<T: Float> IsotropicGaussian<T> {
    pub fn new(std: T) -> Self {
        Self { std }
    }

    /// The log of the unnormalized density at `position`. Pass
    /// `|x| iso.unnorm_logp(x)` to the sampler to use it as a target.
    pub fn unnorm_logp(&self, position: &[T]) -> T {
        let mut sum = T::zero();
        for &x in position {
            sum = sum + x * x;
        }
        -T::from(0.5).unwrap() * sum / (self.std * self.std)
    }
}
