//! Categorical sampling for stochastic production tie-breaks.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Tolerance used when checking that a set of probabilities sums to 1.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Returns true when `weights` sum to 1 within [`PROBABILITY_EPSILON`].
pub fn weights_sum_to_one(weights: impl IntoIterator<Item = f64>) -> bool {
    let total: f64 = weights.into_iter().sum();
    (total - 1.0).abs() <= PROBABILITY_EPSILON
}

/// Picks one item with probability proportional to its weight.
///
/// Makes exactly one draw from `rng`. Returns `None` when `items` is empty or
/// no weight is positive, in which case nothing is drawn.
pub fn pick_weighted<'a, T, R>(items: &'a [(T, f64)], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let dist = WeightedIndex::new(items.iter().map(|(_, w)| *w)).ok()?;
    Some(&items[dist.sample(rng)].0)
}
