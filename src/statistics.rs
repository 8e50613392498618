//! Statistical tools over the metrics of a batch of chains.

use std::collections::BTreeMap;
use std::ops::{Div, Mul, Sub};

use num_traits::Zero;
use rayon::prelude::*;

use crate::dynamics::BatchTransition;
use crate::Real;

/// Compute the mean from a [`rayon::iter::IndexedParallelIterator`] by value.
///
/// # Example
/// ```
/// use lattice_l2hmc::statistics::mean_par_iter_val;
/// use rayon::prelude::*;
///
/// let acc = vec![1_f64, 0.5_f64, 0_f64, 0.5_f64];
/// assert_eq!(mean_par_iter_val(acc.par_iter().copied()), 0.5_f64);
/// ```
pub fn mean_par_iter_val<It, T>(data: It) -> T
where
    T: Div<f64, Output = T> + std::iter::Sum<T> + std::iter::Sum<It::Item> + Send,
    It: IndexedParallelIterator<Item = T>,
{
    let len = data.len();
    let mean: T = data.sum();
    #[allow(clippy::cast_precision_loss)]
    let len = len as f64;
    mean / len
}

/// Compute the mean and the unbiased variance from a
/// [`rayon::iter::IndexedParallelIterator`] by value, consuming it once.
///
/// The variance of fewer than two values is zero.
///
/// # Example
/// ```
/// use lattice_l2hmc::statistics::mean_and_variance_par_iter_val;
/// use rayon::prelude::*;
///
/// let sumlogdet = vec![1_f64, 2_f64, 3_f64, 4_f64];
/// let [mean, variance] = mean_and_variance_par_iter_val(sumlogdet.par_iter().copied());
/// assert_eq!(mean, 2.5_f64);
/// assert!((variance - 5_f64 / 3_f64).abs() < 1E-12_f64);
/// ```
pub fn mean_and_variance_par_iter_val<It, T>(data: It) -> [T; 2]
where
    T: Clone + Div<f64, Output = T> + Send + Sub<T, Output = T> + Mul<T, Output = T> + Zero,
    It: IndexedParallelIterator<Item = T>,
{
    let len = data.len();
    let (sum, sum_squared) = data
        .map(|el| (el.clone(), el.clone() * el))
        .reduce(|| (T::zero(), T::zero()), |a, b| (a.0 + b.0, a.1 + b.1));
    #[allow(clippy::cast_precision_loss)]
    let len_f = len as f64;
    if len < 2 {
        return [sum / len_f.max(1_f64), T::zero()];
    }
    #[allow(clippy::cast_precision_loss)]
    let variance = (sum_squared - sum.clone() * sum.clone() / len_f) / (len - 1) as f64;
    [sum / len_f, variance]
}

/// Mean and statistical error `sqrt(variance / len)` of a set of values.
///
/// # Example
/// ```
/// use lattice_l2hmc::statistics::mean_with_error;
///
/// let [mean, error] = mean_with_error(&[1_f64, 1_f64, 1_f64]);
/// assert_eq!(mean, 1_f64);
/// assert_eq!(error, 0_f64);
/// ```
#[must_use]
pub fn mean_with_error(data: &[Real]) -> [Real; 2] {
    let [mean, variance] = mean_and_variance_par_iter_val(data.par_iter().copied());
    #[allow(clippy::cast_precision_loss)]
    let len = data.len().max(1) as Real;
    [mean, (variance / len).sqrt()]
}

/// Mean and statistical error of one metric over a batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSummary {
    mean: Real,
    error: Real,
}

impl MetricSummary {
    /// Summarize a set of values, see [`mean_with_error`].
    #[must_use]
    pub fn new(data: &[Real]) -> Self {
        let [mean, error] = mean_with_error(data);
        Self { mean, error }
    }

    getter_copy!(
        /// The mean over the chains.
        pub const,
        mean,
        Real
    );

    getter_copy!(
        /// The statistical error on the mean.
        pub const,
        error,
        Real
    );
}

/// [`MetricSummary`] of every metric of the batch, keyed by name.
#[must_use]
pub fn summarize(batch: &BatchTransition) -> BTreeMap<&'static str, MetricSummary> {
    batch
        .metrics()
        .into_iter()
        .map(|(name, values)| (name, MetricSummary::new(&values)))
        .collect()
}
