// Counter → per-second rate conversion from two successive observations.

use std::time::{Duration, Instant};

/// Intervals shorter than this are treated as clock jitter.
const MIN_ELAPSED_SECS: f64 = 0.1;

/// Per-second rate between two counter readings.
///
/// `previous == 0` means "no baseline yet" and always yields 0. Elapsed times below
/// 0.1 s are replaced by `fallback_secs`. A counter that went backwards yields 0.
pub fn per_second(previous: u64, current: u64, elapsed_secs: f64, fallback_secs: f64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let elapsed = if elapsed_secs < MIN_ELAPSED_SECS {
        fallback_secs
    } else {
        elapsed_secs
    };
    current.saturating_sub(previous) as f64 / elapsed
}

/// Last observation of a family of `N` counters sampled together (e.g. rx/tx bytes).
#[derive(Debug, Clone)]
pub struct RateState<const N: usize> {
    last: [u64; N],
    last_at: Option<Instant>,
    fallback: Duration,
}

impl<const N: usize> RateState<N> {
    /// `fallback` is the nominal cycle period used when the measured interval is too short.
    pub fn new(fallback: Duration) -> Self {
        Self {
            last: [0; N],
            last_at: None,
            fallback,
        }
    }

    /// Records `current` taken at `now` and returns the per-second rate of each counter
    /// since the previous observation.
    pub fn observe(&mut self, current: [u64; N], now: Instant) -> [f64; N] {
        let fallback_secs = self.fallback.as_secs_f64();
        let elapsed_secs = self
            .last_at
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(fallback_secs);

        let mut rates = [0.0; N];
        for (i, rate) in rates.iter_mut().enumerate() {
            *rate = per_second(self.last[i], current[i], elapsed_secs, fallback_secs);
        }

        self.last = current;
        self.last_at = Some(now);
        rates
    }

    pub fn last_counts(&self) -> [u64; N] {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_baseline_reports_zero() {
        assert_eq!(per_second(0, 10_000, 2.0, 2.0), 0.0);
    }

    #[test]
    fn computes_rate_over_elapsed_time() {
        assert_eq!(per_second(1_000, 3_000, 4.0, 2.0), 500.0);
    }

    #[test]
    fn jitter_interval_uses_fallback() {
        assert_eq!(per_second(1_000, 3_000, 0.05, 2.0), 1_000.0);
        assert_eq!(per_second(1_000, 3_000, 0.0, 2.0), 1_000.0);
    }

    #[test]
    fn counter_going_backwards_is_not_negative() {
        assert_eq!(per_second(5_000, 1_000, 2.0, 2.0), 0.0);
    }

    #[test]
    fn first_observation_of_family_is_zero() {
        let mut state = RateState::<2>::new(Duration::from_secs(2));
        let t0 = Instant::now();
        assert_eq!(state.observe([1_000_000, 500], t0), [0.0, 0.0]);
        assert_eq!(state.last_counts(), [1_000_000, 500]);
    }

    #[test]
    fn second_observation_uses_measured_interval() {
        let mut state = RateState::<2>::new(Duration::from_secs(2));
        let t0 = Instant::now();
        state.observe([1_000, 2_000], t0);
        let rates = state.observe([5_000, 2_000], t0 + Duration::from_secs(4));
        assert_eq!(rates, [1_000.0, 0.0]);
    }

    #[test]
    fn back_to_back_observations_fall_back_to_nominal_period() {
        let mut state = RateState::<1>::new(Duration::from_secs(2));
        let t0 = Instant::now();
        state.observe([100], t0);
        let rates = state.observe([300], t0 + Duration::from_millis(10));
        assert_eq!(rates, [100.0]);
    }

    #[test]
    fn non_decreasing_sequences_never_yield_negative_rates() {
        let mut state = RateState::<1>::new(Duration::from_secs(2));
        let t0 = Instant::now();
        let counts = [0u64, 0, 7, 7, 19, 1_000, 1_000, 123_456];
        for (i, c) in counts.iter().enumerate() {
            let [rate] = state.observe([*c], t0 + Duration::from_millis(500 * i as u64));
            assert!(rate >= 0.0, "negative rate at step {i}");
            if i == 0 {
                assert_eq!(rate, 0.0);
            }
        }
    }
}
