use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::{
    assert_interval,
    decay::{self, Decay},
    error::{Error, Result},
    util::argmax,
};

/// Action probabilities of the epsilon greedy rule for a single state
///
/// Every action receives `epsilon / n`, and the first action holding the maximum value receives
/// an extra `1 - epsilon`.
///
/// ```
/// let probs = deepq::exploration::epsilon_greedy(&[1.0, 5.0, 2.0], 0.1).unwrap();
/// assert!((probs[1] - 0.9333).abs() < 1e-4);
/// ```
pub fn epsilon_greedy(q_values: &[f32], epsilon: f32) -> Result<Vec<f32>> {
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(Error::InvalidEpsilon(epsilon));
    }
    let best = argmax(q_values).ok_or(Error::NoActions)?;

    let n = q_values.len() as f32;
    let mut probs = vec![epsilon / n; q_values.len()];
    probs[best] += 1.0 - epsilon;
    Ok(probs)
}

/// Epsilon greedy exploration policy with a time-decaying epsilon
///
/// The default schedule interpolates linearly from `epsilon_start` to `epsilon_end` over a fixed
/// number of steps and holds the final value afterwards.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay = decay::Linear> {
    epsilon: D,
    /// Last step at which the schedule still changes
    horizon: u64,
}

impl EpsilonGreedy<decay::Linear> {
    /// Linear schedule from `start` to `end` over `decay_steps` steps
    ///
    /// **Panics** if `start` or `end` is not in the interval `[0,1]`, or if `decay_steps` is zero
    pub fn linear(start: f32, end: f32, decay_steps: usize) -> Self {
        assert_interval!(start, 0.0, 1.0);
        assert_interval!(end, 0.0, 1.0);
        let schedule = decay::Linear::from_steps(start, end, decay_steps)
            .unwrap_or_else(|e| panic!("Invalid epsilon schedule: {e}"));
        Self {
            horizon: decay_steps as u64 - 1,
            ..Self::new(schedule)
        }
    }
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self {
            epsilon: decay,
            horizon: u64::MAX,
        }
    }

    /// Exploration rate at `step`
    pub fn epsilon(&self, step: u64) -> f32 {
        self.epsilon.evaluate(step.min(self.horizon) as f32)
    }

    /// Action probabilities for the given action values at `step`
    pub fn probabilities(&self, q_values: &[f32], step: u64) -> Result<Vec<f32>> {
        epsilon_greedy(q_values, self.epsilon(step))
    }

    /// Sample an action index for the given action values at `step`
    pub fn choose(&self, q_values: &[f32], step: u64, rng: &mut impl Rng) -> Result<usize> {
        let probs = self.probabilities(q_values, step)?;
        let dist = WeightedIndex::new(&probs).map_err(|_| Error::NoActions)?;
        Ok(dist.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn distribution_is_valid_for_all_epsilons() {
        let q_values = [0.3, -2.0, 7.5, 7.4, 0.0];
        for i in 0..=20 {
            let epsilon = i as f32 / 20.0;
            let probs = epsilon_greedy(&q_values, epsilon).unwrap();
            assert!(probs.iter().all(|&p| p >= 0.0), "non-negative at {epsilon}");
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sums to one at {epsilon}");
        }
    }

    #[test]
    fn greedy_when_epsilon_zero() {
        let probs = epsilon_greedy(&[0.1, 0.2, 3.0, -1.0], 0.0).unwrap();
        assert_eq!(probs, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn uniform_when_epsilon_one() {
        let probs = epsilon_greedy(&[10.0, -4.0, 0.5, 2.0], 1.0).unwrap();
        assert_eq!(probs, [0.25; 4]);
    }

    #[test]
    fn known_distribution() {
        let probs = epsilon_greedy(&[1.0, 5.0, 2.0], 0.1).unwrap();
        assert_close(&probs, &[0.0333, 0.9333, 0.0333]);
    }

    #[test]
    fn ties_go_to_first_action() {
        let probs = epsilon_greedy(&[4.0, 1.0, 4.0], 0.0).unwrap();
        assert_eq!(probs, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(epsilon_greedy(&[], 0.5), Err(Error::NoActions));
        assert_eq!(
            epsilon_greedy(&[1.0], 1.5),
            Err(Error::InvalidEpsilon(1.5))
        );
        assert_eq!(
            epsilon_greedy(&[1.0], -0.1),
            Err(Error::InvalidEpsilon(-0.1))
        );
    }

    #[test]
    fn linear_schedule_indexing() {
        let policy = EpsilonGreedy::linear(1.0, 0.1, 10);
        assert_eq!(policy.epsilon(0), 1.0);
        assert!((policy.epsilon(9) - 0.1).abs() < 1e-6);
        assert!((policy.epsilon(1000) - 0.1).abs() < 1e-6, "clamped to last value");
        assert!(policy.epsilon(3) < policy.epsilon(2));
    }

    #[test]
    fn linear_schedule_holds_end_value_for_huge_steps() {
        let policy = EpsilonGreedy::linear(1.0, 0.1, 30_000_000);
        assert!((policy.epsilon(29_999_999) - 0.1).abs() < 1e-6);
        assert_eq!(policy.epsilon(u64::MAX), policy.epsilon(29_999_999));
        assert_eq!(policy.epsilon(1 << 40), policy.epsilon(29_999_999));

        let constant = EpsilonGreedy::new(decay::Constant::new(0.3));
        assert_eq!(constant.epsilon(u64::MAX), 0.3);
    }

    #[test]
    fn choose_greedy_is_deterministic() {
        let policy = EpsilonGreedy::new(decay::Constant::new(0.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(policy.choose(&[0.0, 2.0, 1.0], 0, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn choose_explores_every_action() {
        let policy = EpsilonGreedy::new(decay::Constant::new(1.0));
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            counts[policy.choose(&[0.0, 2.0, 1.0], 0, &mut rng).unwrap()] += 1;
        }
        assert!(counts.iter().all(|&c| c > 800), "roughly uniform: {counts:?}");
    }

    #[test]
    #[should_panic(expected = "Invalid value for `start`")]
    fn linear_rejects_out_of_range() {
        EpsilonGreedy::linear(1.5, 0.1, 10);
    }
}
